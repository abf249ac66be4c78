use std::iter::FusedIterator;
use std::slice;

use crate::file::FileEntry;
use crate::folder::FolderEntry;

/// One item produced by [`Entries`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Entry<'a> {
    /// A folder, yielded just before the first file stored in it.
    Folder(&'a FolderEntry),
    /// A file.
    File(&'a FileEntry),
}

/// A lazy, single-pass walk over a cabinet's file table, optionally
/// interleaved with the folders the files live in.
///
/// In interleaved mode, a folder is yielded just before the first file that
/// refers to it, and only if its index is higher than that of every folder
/// yielded so far, so no folder is ever yielded twice.  A file whose folder
/// index is out of range, or goes back to an earlier folder, is yielded
/// without a folder.
#[derive(Clone)]
pub struct Entries<'a> {
    folders: &'a [FolderEntry],
    files: slice::Iter<'a, FileEntry>,
    with_folders: bool,
    last_folder: Option<u16>,
    pending: Option<&'a FileEntry>,
}

impl<'a> Entries<'a> {
    pub(crate) fn new(
        folders: &'a [FolderEntry],
        files: &'a [FileEntry],
        with_folders: bool,
    ) -> Entries<'a> {
        Entries {
            folders,
            files: files.iter(),
            with_folders,
            last_folder: None,
            pending: None,
        }
    }
}

impl<'a> Iterator for Entries<'a> {
    type Item = Entry<'a>;

    fn next(&mut self) -> Option<Entry<'a>> {
        if let Some(file) = self.pending.take() {
            return Some(Entry::File(file));
        }
        let file = self.files.next()?;
        let index = file.folder_index();
        let is_new = self.last_folder.map_or(true, |last| index > last);
        if self.with_folders && is_new {
            if let Some(folder) = self.folders.get(index as usize) {
                self.last_folder = Some(index);
                self.pending = Some(file);
                return Some(Entry::Folder(folder));
            }
        }
        Some(Entry::File(file))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let files = self.files.len() + self.pending.map_or(0, |_| 1);
        if self.with_folders {
            (files, Some(files.saturating_mul(2)))
        } else {
            (files, Some(files))
        }
    }
}

impl<'a> FusedIterator for Entries<'a> {}
