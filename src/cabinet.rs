use std::io::Read;

use tracing::debug;

use crate::decompressor::{Decompressor, FolderDecompressor};
use crate::entries::Entries;
use crate::error::Result;
use crate::extract::ExtractionEngine;
use crate::file::{parse_file_table, FileEntries, FileEntry};
use crate::folder::{
    files_in_folder, parse_folder_table, FolderEntries, FolderEntry,
};
use crate::header::{CabinetHeader, ReserveHandler, SkipReserve};
use crate::sink::{MemorySinks, SinkProvider};
use crate::source::ByteSource;

/// A structure for reading a cabinet file.
///
/// Opening a cabinet parses its header, folder table and file table; the
/// data blocks are only read when files are extracted.  Since the underlying
/// reader is consumed front to back, a cabinet can be extracted once.  To
/// extract again, [mark](ByteSource::mark) the source before the first
/// extraction and [reset](ByteSource::reset) it afterwards.
pub struct Cabinet<R> {
    source: ByteSource<R>,
    header: CabinetHeader,
    folders: Vec<FolderEntry>,
    files: Vec<FileEntry>,
}

impl<R: Read> Cabinet<R> {
    /// Open an existing cabinet file, skipping any header reserve data.
    pub fn new(reader: R) -> Result<Cabinet<R>> {
        Cabinet::with_reserve_handler(reader, &mut SkipReserve)
    }

    /// Open an existing cabinet file, offering the header reserve data (if
    /// any) to `reserve_handler`.
    pub fn with_reserve_handler<H: ReserveHandler + ?Sized>(
        reader: R,
        reserve_handler: &mut H,
    ) -> Result<Cabinet<R>> {
        let mut source = ByteSource::new(reader);
        let header = CabinetHeader::parse(&mut source, reserve_handler)?;
        let folders = parse_folder_table(
            &mut source,
            header.num_folders(),
            header.folder_reserve_size() as usize,
        )?;
        source.seek(header.first_file_offset() as u64)?;
        let files = parse_file_table(&mut source, header.num_files())?;
        debug!(
            folders = folders.len(),
            files = files.len(),
            position = source.position(),
            "Parsed cabinet tables"
        );
        Ok(Cabinet { source, header, folders, files })
    }

    /// Returns the parsed cabinet header.
    pub fn header(&self) -> &CabinetHeader {
        &self.header
    }

    /// Returns the cabinet set ID for this cabinet (an arbitrary number used
    /// to group together a set of cabinets).
    pub fn cabinet_set_id(&self) -> u16 {
        self.header.cabinet_set_id()
    }

    /// Returns this cabinet's (zero-based) index within its cabinet set.
    pub fn cabinet_set_index(&self) -> u16 {
        self.header.cabinet_set_index()
    }

    /// Returns the folder table.
    pub fn folders(&self) -> &[FolderEntry] {
        &self.folders
    }

    /// Returns the file table, in the order files are stored.
    pub fn files(&self) -> &[FileEntry] {
        &self.files
    }

    /// Returns an iterator over the folder entries in this cabinet.
    pub fn folder_entries(&self) -> FolderEntries<'_> {
        FolderEntries { iter: self.folders.iter() }
    }

    /// Returns an iterator over the file entries in this cabinet.
    pub fn file_entries(&self) -> FileEntries<'_> {
        FileEntries { iter: self.files.iter() }
    }

    /// Returns an iterator over the file entries stored in the folder at
    /// `folder_index`.
    pub fn files_in_folder(&self, folder_index: usize) -> FileEntries<'_> {
        files_in_folder(&self.files, folder_index)
    }

    /// Returns the entry for the file with the given name, if any.
    pub fn get_file_entry(&self, name: &str) -> Option<&FileEntry> {
        self.files.iter().find(|file| file.name() == name)
    }

    /// Walks the file table in order.
    pub fn entries(&self) -> Entries<'_> {
        Entries::new(&self.folders, &self.files, false)
    }

    /// Walks the file table in order, yielding each folder just before the
    /// first of its files.
    pub fn entries_with_folders(&self) -> Entries<'_> {
        Entries::new(&self.folders, &self.files, true)
    }

    /// Extracts the files chosen by `provider` using the built-in
    /// decompressor.
    pub fn extract<P: SinkProvider + ?Sized>(
        &mut self,
        provider: &mut P,
    ) -> Result<()> {
        let mut decompressor =
            FolderDecompressor::new(self.header.data_reserve_size());
        self.extract_with(provider, &mut decompressor)
    }

    /// Extracts the files chosen by `provider` using the given decompressor.
    pub fn extract_with<P, D>(
        &mut self,
        provider: &mut P,
        decompressor: &mut D,
    ) -> Result<()>
    where
        P: SinkProvider + ?Sized,
        D: Decompressor,
    {
        ExtractionEngine::new(&self.folders).extract(
            &mut self.source,
            &self.files,
            decompressor,
            provider,
        )
    }

    /// Extracts the first file whose name matches `name`, ignoring case.
    /// Returns `None` if the cabinet has no such file.
    pub fn extract_file(&mut self, name: &str) -> Result<Option<Vec<u8>>> {
        let wanted = name.to_lowercase();
        let target = match self
            .files
            .iter()
            .find(|file| file.name().to_lowercase() == wanted)
        {
            Some(file) => file.name().to_string(),
            None => return Ok(None),
        };
        let mut sinks =
            MemorySinks::with_filter(|file: &FileEntry| file.name() == target);
        self.extract(&mut sinks)?;
        Ok(sinks.into_files().into_iter().next().map(|(_, data)| data))
    }

    /// Returns the byte source, e.g. to mark or reset it.
    pub fn source_mut(&mut self) -> &mut ByteSource<R> {
        &mut self.source
    }

    /// Consumes the cabinet, returning the byte source.
    pub fn into_source(self) -> ByteSource<R> {
        self.source
    }
}
