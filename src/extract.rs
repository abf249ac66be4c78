use std::io::Read;

use tracing::{debug, warn};

use crate::decompressor::{Decompressor, Sink};
use crate::error::Result;
use crate::file::FileEntry;
use crate::folder::FolderEntry;
use crate::sink::SinkProvider;
use crate::source::ByteSource;

/// Drives a [`Decompressor`] across a cabinet's folders, handing each wanted
/// file's bytes to a [`SinkProvider`].
///
/// Files are visited in file-table order.  A folder's decompressor is
/// positioned and initialized lazily, the first time a wanted file in that
/// folder is reached, and at most once.  Bytes belonging to skipped files
/// that sit between wanted files are decompressed and discarded; bytes after
/// the last wanted file of a folder are never decompressed at all.
///
/// A file whose folder index is out of range, or lower than the folder of
/// the file before it, fails the extraction with
/// [`Error::CorruptFormat`](crate::Error::CorruptFormat).  Files already
/// delivered before such a failure stay delivered.
pub struct ExtractionEngine<'a> {
    folders: &'a [FolderEntry],
    current_folder: Option<usize>,
    bytes_delivered: u64,
    bytes_required: u64,
    initialized: bool,
}

impl<'a> ExtractionEngine<'a> {
    /// Creates an engine for a cabinet with the given folder table.
    pub fn new(folders: &'a [FolderEntry]) -> ExtractionEngine<'a> {
        ExtractionEngine {
            folders,
            current_folder: None,
            bytes_delivered: 0,
            bytes_required: 0,
            initialized: false,
        }
    }

    /// Extracts `files` (normally the whole file table) from `source`.
    pub fn extract<R, D, P>(
        &mut self,
        source: &mut ByteSource<R>,
        files: &[FileEntry],
        decompressor: &mut D,
        provider: &mut P,
    ) -> Result<()>
    where
        R: Read,
        D: Decompressor,
        P: SinkProvider + ?Sized,
    {
        for entry in files {
            self.process_file(source, entry, decompressor, provider)?;
        }
        Ok(())
    }

    fn process_file<R, D, P>(
        &mut self,
        source: &mut ByteSource<R>,
        entry: &FileEntry,
        decompressor: &mut D,
        provider: &mut P,
    ) -> Result<()>
    where
        R: Read,
        D: Decompressor,
        P: SinkProvider + ?Sized,
    {
        let folder_index = entry.folder_index() as usize;
        if self.current_folder != Some(folder_index) {
            self.enter_folder(folder_index, source.position(), entry)?;
        }
        if entry.uncompressed_offset() as u64 != self.bytes_required {
            warn!(
                name = entry.name(),
                offset = entry.uncompressed_offset(),
                expected = self.bytes_required,
                "File offset does not follow the previous file in its folder"
            );
        }
        let size = entry.uncompressed_size() as u64;
        if let Some(mut writer) = provider.open_sink(entry)? {
            if !self.initialized {
                let folder = &self.folders[folder_index];
                source.seek(folder.first_data_block_offset() as u64)?;
                decompressor.initialize(folder)?;
                self.initialized = true;
            }
            if self.bytes_delivered != self.bytes_required {
                let gap = self.bytes_required - self.bytes_delivered;
                debug!(folder = folder_index, bytes = gap, "Skipping ahead");
                decompressor.read(source, gap, Sink::Discard)?;
                self.bytes_delivered = self.bytes_required;
            }
            debug!(name = entry.name(), size, "Extracting file");
            decompressor.read(source, size, Sink::Write(&mut writer))?;
            provider.close_sink(writer, entry)?;
            self.bytes_delivered += size;
        }
        self.bytes_required += size;
        Ok(())
    }

    fn enter_folder(
        &mut self,
        folder_index: usize,
        offset: u64,
        entry: &FileEntry,
    ) -> Result<()> {
        if folder_index >= self.folders.len() {
            corrupt!(
                offset,
                "File {:?} refers to folder {}, but the cabinet has only {} \
                 folders",
                entry.name(),
                folder_index,
                self.folders.len()
            );
        }
        if let Some(current) = self.current_folder {
            if folder_index < current {
                corrupt!(
                    offset,
                    "File {:?} goes back to folder {} from folder {}",
                    entry.name(),
                    folder_index,
                    current
                );
            }
        }
        debug!(folder = folder_index, "Entering folder");
        self.current_folder = Some(folder_index);
        self.bytes_delivered = 0;
        self.bytes_required = 0;
        self.initialized = false;
        Ok(())
    }
}
