use std::io::Read;
use std::slice;

use time::PrimitiveDateTime;

use crate::consts;
use crate::datetime::datetime_from_bits;
use crate::error::{Error, Result};
use crate::source::ByteSource;
use crate::string::read_null_terminated_string;

/// An iterator over file entries.
#[derive(Clone)]
pub struct FileEntries<'a> {
    pub(crate) iter: slice::Iter<'a, FileEntry>,
}

/// Metadata about one file stored in a cabinet.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct FileEntry {
    name: String,
    date_bits: u16,
    time_bits: u16,
    datetime: Option<PrimitiveDateTime>,
    uncompressed_size: u32,
    uncompressed_offset: u32,
    folder_index: u16,
    attributes: u16,
}

impl<'a> Iterator for FileEntries<'a> {
    type Item = &'a FileEntry;

    fn next(&mut self) -> Option<&'a FileEntry> {
        self.iter.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.iter.size_hint()
    }
}

impl<'a> ExactSizeIterator for FileEntries<'a> {}

impl FileEntry {
    /// Returns the name of file.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the datetime for this file.  This is usually the "last
    /// modified" time in local time, but cabinet writers are free to store
    /// whatever they like here.
    ///
    /// Note that this will return [`None`] if the datetime in the cabinet file
    /// was not a valid date/time.
    pub fn datetime(&self) -> Option<PrimitiveDateTime> {
        self.datetime
    }

    /// Returns the packed DOS `(date, time)` fields as stored.
    pub fn datetime_bits(&self) -> (u16, u16) {
        (self.date_bits, self.time_bits)
    }

    /// Returns the total size of the file when decompressed, in bytes.
    pub fn uncompressed_size(&self) -> u32 {
        self.uncompressed_size
    }

    /// Returns the offset of this file's first byte within its folder's
    /// uncompressed stream.
    pub fn uncompressed_offset(&self) -> u32 {
        self.uncompressed_offset
    }

    /// Returns the index of the folder holding this file's data.
    pub fn folder_index(&self) -> u16 {
        self.folder_index
    }

    /// Returns the raw attribute bits.
    pub fn attributes(&self) -> u16 {
        self.attributes
    }

    /// Returns true if this file has the "read-only" attribute set.
    pub fn is_read_only(&self) -> bool {
        (self.attributes & consts::ATTR_READ_ONLY) != 0
    }

    /// Returns true if this file has the "hidden" attribute set.
    pub fn is_hidden(&self) -> bool {
        (self.attributes & consts::ATTR_HIDDEN) != 0
    }

    /// Returns true if this file has the "system file" attribute set.
    pub fn is_system(&self) -> bool {
        (self.attributes & consts::ATTR_SYSTEM) != 0
    }

    /// Returns true if this file has the "archive" (modified since last
    /// backup) attribute set.
    pub fn is_archive(&self) -> bool {
        (self.attributes & consts::ATTR_ARCH) != 0
    }

    /// Returns true if this file has the "execute after extraction" attribute
    /// set.
    pub fn is_exec(&self) -> bool {
        (self.attributes & consts::ATTR_EXEC) != 0
    }

    /// Returns true if this file has the "name is UTF" attribute set.
    pub fn is_name_utf(&self) -> bool {
        (self.attributes & consts::ATTR_NAME_IS_UTF) != 0
    }
}

#[cfg(test)]
impl FileEntry {
    pub(crate) fn new(
        name: &str,
        folder_index: u16,
        uncompressed_offset: u32,
        uncompressed_size: u32,
    ) -> FileEntry {
        FileEntry {
            name: name.to_string(),
            date_bits: 0,
            time_bits: 0,
            datetime: None,
            uncompressed_size,
            uncompressed_offset,
            folder_index,
            attributes: 0,
        }
    }
}

pub(crate) fn parse_file_entry<R: Read>(
    source: &mut ByteSource<R>,
) -> Result<FileEntry> {
    let uncompressed_size = source.read_u32()?;
    let uncompressed_offset = source.read_u32()?;
    let folder_index = source.read_u16()?;
    let date_bits = source.read_u16()?;
    let time_bits = source.read_u16()?;
    let datetime = datetime_from_bits(date_bits, time_bits);
    let attributes = source.read_u16()?;
    let is_utf8 = (attributes & consts::ATTR_NAME_IS_UTF) != 0;
    let name = read_null_terminated_string(source, is_utf8)?;
    let entry = FileEntry {
        name,
        date_bits,
        time_bits,
        datetime,
        uncompressed_size,
        uncompressed_offset,
        folder_index,
        attributes,
    };
    Ok(entry)
}

/// Parses `count` consecutive file entries.  A file entry cut short by the
/// end of the data is reported as corrupt.
pub(crate) fn parse_file_table<R: Read>(
    source: &mut ByteSource<R>,
    count: u16,
) -> Result<Vec<FileEntry>> {
    let mut files = Vec::with_capacity(count as usize);
    for index in 0..count {
        let entry = parse_file_entry(source).map_err(|error| match error {
            Error::UnexpectedEndOfData { offset } => Error::CorruptFormat {
                offset,
                reason: format!("File entry {} is truncated", index),
            },
            other => other,
        })?;
        files.push(entry);
    }
    Ok(files)
}
