//! A forward-only reader for [Windows
//! cabinet](https://en.wikipedia.org/wiki/Cabinet_(file_format)) (CAB) files.
//!
//! A [`Cabinet`] parses the header, folder table and file table up front and
//! then extracts files in a single pass over the underlying reader, which
//! only needs to implement [`std::io::Read`].  Which files are extracted,
//! and where their bytes go, is decided by a [`SinkProvider`]:
//!
//! ```no_run
//! use cabextract::{Cabinet, MemorySinks};
//!
//! # fn main() -> cabextract::Result<()> {
//! let file = std::fs::File::open("setup.cab")?;
//! let mut cabinet = Cabinet::new(std::io::BufReader::new(file))?;
//! for entry in cabinet.file_entries() {
//!     println!("{} ({} bytes)", entry.name(), entry.uncompressed_size());
//! }
//! let mut sinks = MemorySinks::new();
//! cabinet.extract(&mut sinks)?;
//! # Ok(())
//! # }
//! ```
//!
//! Stored, MSZIP and LZX folders are supported.  Cabinets that span several
//! volumes are rejected.

#![warn(missing_docs)]

#[macro_use]
mod macros;

mod cabinet;
mod checksum;
mod consts;
mod ctype;
mod datablock;
mod datetime;
mod decompressor;
mod entries;
mod error;
mod extract;
mod file;
mod folder;
mod header;
mod mszip;
mod sink;
mod source;
mod string;

pub use crate::cabinet::Cabinet;
pub use crate::ctype::CompressionType;
pub use crate::datablock::DataBlock;
pub use crate::decompressor::{Decompressor, FolderDecompressor, Sink};
pub use crate::entries::{Entries, Entry};
pub use crate::error::{Error, Result};
pub use crate::extract::ExtractionEngine;
pub use crate::file::{FileEntries, FileEntry};
pub use crate::folder::{FolderEntries, FolderEntry};
pub use crate::header::{CabinetHeader, ReserveHandler, SkipReserve};
pub use crate::sink::{DirectorySinks, MemorySinks, SinkProvider};
pub use crate::source::ByteSource;
