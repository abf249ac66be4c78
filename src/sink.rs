use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::Result;
use crate::file::FileEntry;

/// Decides which files an extraction materializes, and where their bytes go.
///
/// For every file entry, in file-table order, the extraction engine calls
/// [`open_sink`](SinkProvider::open_sink).  Returning `None` skips the file;
/// its bytes are still decompressed (folder streams can only be read front
/// to back) but are never handed to anyone.  Returning a writer causes the
/// file's bytes to be written to it, after which the writer is given back
/// through [`close_sink`](SinkProvider::close_sink).
pub trait SinkProvider {
    /// The writer type that receives a file's bytes.
    type Writer: Write;

    /// Returns a writer for `entry`, or `None` to skip it.
    fn open_sink(&mut self, entry: &FileEntry) -> Result<Option<Self::Writer>>;

    /// Called once `entry`'s bytes have all been written to `writer`.
    fn close_sink(
        &mut self,
        writer: Self::Writer,
        entry: &FileEntry,
    ) -> Result<()>;
}

/// A [`SinkProvider`] that buffers extracted files in memory.
///
/// ```no_run
/// # fn demo(cab: &mut cabextract::Cabinet<std::fs::File>) -> cabextract::Result<()> {
/// use cabextract::{FileEntry, MemorySinks};
///
/// let mut sinks =
///     MemorySinks::with_filter(|entry: &FileEntry| entry.name().ends_with(".txt"));
/// cab.extract(&mut sinks)?;
/// for (entry, data) in sinks.into_files() {
///     println!("{}: {} bytes", entry.name(), data.len());
/// }
/// # Ok(())
/// # }
/// ```
pub struct MemorySinks<F = fn(&FileEntry) -> bool> {
    filter: F,
    files: Vec<(FileEntry, Vec<u8>)>,
}

fn accept_all(_entry: &FileEntry) -> bool {
    true
}

impl MemorySinks {
    /// Creates a provider that keeps every file.
    pub fn new() -> MemorySinks {
        MemorySinks { filter: accept_all, files: Vec::new() }
    }
}

impl Default for MemorySinks {
    fn default() -> MemorySinks {
        MemorySinks::new()
    }
}

impl<F: FnMut(&FileEntry) -> bool> MemorySinks<F> {
    /// Creates a provider that keeps only the files for which `filter`
    /// returns true.
    pub fn with_filter(filter: F) -> MemorySinks<F> {
        MemorySinks { filter, files: Vec::new() }
    }

    /// Returns the files collected so far, in extraction order.
    pub fn files(&self) -> &[(FileEntry, Vec<u8>)] {
        &self.files
    }

    /// Consumes the provider, returning the collected files.
    pub fn into_files(self) -> Vec<(FileEntry, Vec<u8>)> {
        self.files
    }
}

impl<F: FnMut(&FileEntry) -> bool> SinkProvider for MemorySinks<F> {
    type Writer = Vec<u8>;

    fn open_sink(&mut self, entry: &FileEntry) -> Result<Option<Vec<u8>>> {
        if (self.filter)(entry) {
            Ok(Some(Vec::with_capacity(entry.uncompressed_size() as usize)))
        } else {
            Ok(None)
        }
    }

    fn close_sink(&mut self, writer: Vec<u8>, entry: &FileEntry) -> Result<()> {
        self.files.push((entry.clone(), writer));
        Ok(())
    }
}

/// A [`SinkProvider`] that writes extracted files below a directory.
///
/// Names are split on both `\` and `/`, and each part becomes one level of
/// directory.  Empty parts, `.` and `..` and anything containing a `:` are
/// dropped, so every file lands inside the root no matter what the cabinet
/// says.  Files whose names sanitize to nothing are skipped.
pub struct DirectorySinks<F = fn(&FileEntry) -> bool> {
    root: PathBuf,
    filter: F,
    extracted: Vec<PathBuf>,
}

impl DirectorySinks {
    /// Creates a provider that writes every file below `root`.
    pub fn new<P: Into<PathBuf>>(root: P) -> DirectorySinks {
        DirectorySinks {
            root: root.into(),
            filter: accept_all,
            extracted: Vec::new(),
        }
    }
}

impl<F: FnMut(&FileEntry) -> bool> DirectorySinks<F> {
    /// Creates a provider that writes below `root` only the files for which
    /// `filter` returns true.
    pub fn with_filter<P: Into<PathBuf>>(
        root: P,
        filter: F,
    ) -> DirectorySinks<F> {
        DirectorySinks { root: root.into(), filter, extracted: Vec::new() }
    }

    /// Returns the root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the paths written so far, in extraction order.
    pub fn extracted(&self) -> &[PathBuf] {
        &self.extracted
    }
}

impl<F: FnMut(&FileEntry) -> bool> SinkProvider for DirectorySinks<F> {
    type Writer = BufWriter<File>;

    fn open_sink(
        &mut self,
        entry: &FileEntry,
    ) -> Result<Option<BufWriter<File>>> {
        if !(self.filter)(entry) {
            return Ok(None);
        }
        let relative = match sanitize_name(entry.name()) {
            Some(relative) => relative,
            None => {
                warn!(name = entry.name(), "Skipping file with unusable name");
                return Ok(None);
            }
        };
        let path = self.root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        debug!(path = %path.display(), "Creating file");
        let file = File::create(&path)?;
        self.extracted.push(path);
        Ok(Some(BufWriter::new(file)))
    }

    fn close_sink(
        &mut self,
        mut writer: BufWriter<File>,
        _entry: &FileEntry,
    ) -> Result<()> {
        writer.flush()?;
        Ok(())
    }
}

/// Turns a stored file name into a relative path that cannot leave the
/// extraction root.
fn sanitize_name(name: &str) -> Option<PathBuf> {
    let path: PathBuf = name
        .split(|c: char| c == '\\' || c == '/')
        .filter(|part| {
            !part.is_empty()
                && *part != "."
                && *part != ".."
                && !part.contains(':')
        })
        .collect();
    if path.as_os_str().is_empty() {
        None
    } else {
        Some(path)
    }
}
