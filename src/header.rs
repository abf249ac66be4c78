use std::io::Read;

use tracing::{debug, warn};

use crate::consts;
use crate::error::{Error, Result};
use crate::source::ByteSource;

/// Receives the application-defined reserve data stored in a cabinet header.
///
/// When a cabinet carries a non-empty per-cabinet reserved area, the header
/// parser first asks [`accept_reserve`](ReserveHandler::accept_reserve)
/// whether the handler wants it.  If so, the bytes are read and passed to
/// [`save_reserve`](ReserveHandler::save_reserve); otherwise they are
/// skipped.
pub trait ReserveHandler {
    /// Returns true if the handler wants the `len` bytes of reserve data.
    fn accept_reserve(&mut self, len: usize) -> bool;

    /// Receives the reserve data previously accepted.
    fn save_reserve(&mut self, data: Vec<u8>);
}

/// A [`ReserveHandler`] that declines all reserve data.
#[derive(Clone, Copy, Debug, Default)]
pub struct SkipReserve;

impl ReserveHandler for SkipReserve {
    fn accept_reserve(&mut self, _len: usize) -> bool {
        false
    }

    fn save_reserve(&mut self, _data: Vec<u8>) {}
}

impl ReserveHandler for Vec<u8> {
    fn accept_reserve(&mut self, _len: usize) -> bool {
        true
    }

    fn save_reserve(&mut self, data: Vec<u8>) {
        *self = data;
    }
}

/// The fixed-layout header at the start of a cabinet file.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CabinetHeader {
    reserved1: u32,
    total_size: u32,
    reserved2: u32,
    first_file_offset: u32,
    reserved3: u32,
    minor_version: u8,
    major_version: u8,
    num_folders: u16,
    num_files: u16,
    flags: u16,
    cabinet_set_id: u16,
    cabinet_set_index: u16,
    header_reserve_size: u16,
    folder_reserve_size: u8,
    data_reserve_size: u8,
}

impl CabinetHeader {
    /// Parses a header from the start of `source`, leaving the source
    /// positioned at the first folder entry.
    pub fn parse<R: Read, H: ReserveHandler + ?Sized>(
        source: &mut ByteSource<R>,
        reserve_handler: &mut H,
    ) -> Result<CabinetHeader> {
        let signature_offset = source.position();
        let mut signature = [0u8; 4];
        match source.read_full(&mut signature) {
            Ok(()) => {}
            Err(Error::UnexpectedEndOfData { .. }) => {
                corrupt!(signature_offset, "Too short to hold a signature")
            }
            Err(error) => return Err(error),
        }
        if u32::from_le_bytes(signature) != consts::FILE_SIGNATURE {
            corrupt!(signature_offset, "bad signature {:02x?}", signature);
        }
        let reserved1 = source.read_u32()?;
        let total_size = source.read_u32()?;
        let reserved2 = source.read_u32()?;
        let first_file_offset = source.read_u32()?;
        let reserved3 = source.read_u32()?;
        let minor_version = source.read_u8()?;
        let major_version = source.read_u8()?;
        let num_folders = source.read_u16()?;
        let num_files = source.read_u16()?;
        let flags = source.read_u16()?;
        let cabinet_set_id = source.read_u16()?;
        let cabinet_set_index = source.read_u16()?;
        let mut header_reserve_size = 0u16;
        let mut folder_reserve_size = 0u8;
        let mut data_reserve_size = 0u8;
        if (flags & consts::FLAG_RESERVE_PRESENT) != 0 {
            header_reserve_size = source.read_u16()?;
            folder_reserve_size = source.read_u8()?;
            data_reserve_size = source.read_u8()?;
        }
        if (flags & (consts::FLAG_PREV_CABINET | consts::FLAG_NEXT_CABINET))
            != 0
        {
            return Err(Error::UnsupportedSpanning { flags });
        }
        if reserved1 != 0 || reserved2 != 0 || reserved3 != 0 {
            warn!(
                reserved1,
                reserved2, reserved3, "Non-zero reserved header fields"
            );
        }
        if major_version != consts::VERSION_MAJOR
            || minor_version != consts::VERSION_MINOR
        {
            warn!(
                "Cabinet format version {}.{} (expected {}.{})",
                major_version,
                minor_version,
                consts::VERSION_MAJOR,
                consts::VERSION_MINOR
            );
        }
        if header_reserve_size > 0 {
            let len = header_reserve_size as usize;
            if reserve_handler.accept_reserve(len) {
                let mut data = vec![0u8; len];
                source.read_full(&mut data)?;
                reserve_handler.save_reserve(data);
            } else {
                source.skip(len as u64)?;
            }
        }
        debug!(
            num_folders,
            num_files,
            first_file_offset,
            total_size,
            "Parsed cabinet header"
        );
        Ok(CabinetHeader {
            reserved1,
            total_size,
            reserved2,
            first_file_offset,
            reserved3,
            minor_version,
            major_version,
            num_folders,
            num_files,
            flags,
            cabinet_set_id,
            cabinet_set_index,
            header_reserve_size,
            folder_reserve_size,
            data_reserve_size,
        })
    }

    /// Returns the three reserved header fields, which are expected (but not
    /// required) to be zero.
    pub fn reserved_fields(&self) -> [u32; 3] {
        [self.reserved1, self.reserved2, self.reserved3]
    }

    /// Returns the total size of the cabinet file, in bytes, as recorded in
    /// the header.
    pub fn total_size(&self) -> u32 {
        self.total_size
    }

    /// Returns the absolute offset of the first file entry.
    pub fn first_file_offset(&self) -> u32 {
        self.first_file_offset
    }

    /// Returns the format version as `(major, minor)`.
    pub fn version(&self) -> (u8, u8) {
        (self.major_version, self.minor_version)
    }

    /// Returns the number of folder entries.
    pub fn num_folders(&self) -> u16 {
        self.num_folders
    }

    /// Returns the number of file entries.
    pub fn num_files(&self) -> u16 {
        self.num_files
    }

    /// Returns the raw option flags.
    pub fn flags(&self) -> u16 {
        self.flags
    }

    /// Returns the cabinet set ID (an arbitrary number used to group together
    /// a set of cabinets).
    pub fn cabinet_set_id(&self) -> u16 {
        self.cabinet_set_id
    }

    /// Returns this cabinet's (zero-based) index within its cabinet set.
    pub fn cabinet_set_index(&self) -> u16 {
        self.cabinet_set_index
    }

    /// Returns true if the header declares reserved areas.
    pub fn has_reserve(&self) -> bool {
        (self.flags & consts::FLAG_RESERVE_PRESENT) != 0
    }

    /// Size of the per-cabinet reserved area.
    pub fn header_reserve_size(&self) -> u16 {
        self.header_reserve_size
    }

    /// Size of the reserved area following each folder entry.
    pub fn folder_reserve_size(&self) -> u8 {
        self.folder_reserve_size
    }

    /// Size of the reserved area in each data block header.
    pub fn data_reserve_size(&self) -> u8 {
        self.data_reserve_size
    }
}
