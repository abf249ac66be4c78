use std::io::Read;
use std::slice;

use crate::ctype::CompressionType;
use crate::error::Result;
use crate::file::{FileEntries, FileEntry};
use crate::source::ByteSource;

/// An iterator over the folder entries in a cabinet.
#[derive(Clone)]
pub struct FolderEntries<'a> {
    pub(crate) iter: slice::Iter<'a, FolderEntry>,
}

/// Metadata about one folder in a cabinet.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FolderEntry {
    first_data_block_offset: u32,
    num_data_blocks: u16,
    compression_type: CompressionType,
    reserve_data: Vec<u8>,
}

impl<'a> Iterator for FolderEntries<'a> {
    type Item = &'a FolderEntry;

    fn next(&mut self) -> Option<&'a FolderEntry> {
        self.iter.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.iter.size_hint()
    }
}

impl<'a> ExactSizeIterator for FolderEntries<'a> {}

impl FolderEntry {
    #[cfg(test)]
    pub(crate) fn new(
        first_data_block_offset: u32,
        num_data_blocks: u16,
        compression_type: CompressionType,
    ) -> FolderEntry {
        FolderEntry {
            first_data_block_offset,
            num_data_blocks,
            compression_type,
            reserve_data: Vec::new(),
        }
    }

    /// Returns the absolute offset of this folder's first data block.
    pub fn first_data_block_offset(&self) -> u32 {
        self.first_data_block_offset
    }

    /// Returns the scheme used to compress this folder's data.
    pub fn compression_type(&self) -> CompressionType {
        self.compression_type
    }

    /// Returns the number of data blocks used to store this folder's data.
    pub fn num_data_blocks(&self) -> u16 {
        self.num_data_blocks
    }

    /// Returns the application-defined reserve data for this folder.
    pub fn reserve_data(&self) -> &[u8] {
        &self.reserve_data
    }
}

/// Returns an iterator over the entries in `files` that belong to the folder
/// at `folder_index`.
pub(crate) fn files_in_folder(
    files: &[FileEntry],
    folder_index: usize,
) -> FileEntries<'_> {
    // Files for one folder are stored contiguously.
    let start = files
        .iter()
        .position(|file| file.folder_index() as usize == folder_index)
        .unwrap_or(files.len());
    let count = files[start..]
        .iter()
        .take_while(|file| file.folder_index() as usize == folder_index)
        .count();
    FileEntries { iter: files[start..start + count].iter() }
}

pub(crate) fn parse_folder_entry<R: Read>(
    source: &mut ByteSource<R>,
    reserve_size: usize,
) -> Result<FolderEntry> {
    let first_data_offset = source.read_u32()?;
    let num_data_blocks = source.read_u16()?;
    let compression_offset = source.position();
    let compression_bits = source.read_u16()?;
    let compression_type =
        CompressionType::from_bitfield(compression_bits, compression_offset)?;
    let mut folder_reserve_data = vec![0u8; reserve_size];
    if reserve_size > 0 {
        source.read_full(&mut folder_reserve_data)?;
    }
    let entry = FolderEntry {
        first_data_block_offset: first_data_offset,
        num_data_blocks,
        compression_type,
        reserve_data: folder_reserve_data,
    };
    Ok(entry)
}

/// Parses `count` consecutive folder entries.
pub(crate) fn parse_folder_table<R: Read>(
    source: &mut ByteSource<R>,
    count: u16,
    reserve_size: usize,
) -> Result<Vec<FolderEntry>> {
    let mut folders = Vec::with_capacity(count as usize);
    for _ in 0..count {
        folders.push(parse_folder_entry(source, reserve_size)?);
    }
    Ok(folders)
}
