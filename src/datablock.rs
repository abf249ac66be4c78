use std::io::Read;

use tracing::trace;

use crate::checksum;
use crate::error::Result;
use crate::source::ByteSource;

/// Header of one data block within a folder's compressed stream.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DataBlock {
    checksum: u32,
    compressed_size: u16,
    uncompressed_size: u16,
    data_offset: u64,
}

impl DataBlock {
    /// Reads a block header, skipping `reserve_size` bytes of per-block
    /// reserve data, and leaves `source` positioned at the payload.
    ///
    /// Fails with [`Error::CorruptFormat`](crate::Error::CorruptFormat) if
    /// the payload would not fit in a working buffer of `max_compressed_size`
    /// bytes.
    pub fn parse<R: Read>(
        source: &mut ByteSource<R>,
        reserve_size: u8,
        max_compressed_size: usize,
    ) -> Result<DataBlock> {
        let offset = source.position();
        let checksum = source.read_u32()?;
        let compressed_size = source.read_u16()?;
        let uncompressed_size = source.read_u16()?;
        if compressed_size as usize > max_compressed_size {
            corrupt!(
                offset,
                "Data block too large ({} bytes; max is {} bytes)",
                compressed_size,
                max_compressed_size
            );
        }
        if reserve_size > 0 {
            source.skip(reserve_size as u64)?;
        }
        let data_offset = source.position();
        trace!(
            offset,
            compressed_size,
            uncompressed_size,
            "Read data block header"
        );
        Ok(DataBlock {
            checksum,
            compressed_size,
            uncompressed_size,
            data_offset,
        })
    }

    /// Reads this block's compressed payload from `source`.
    pub fn read_payload<R: Read>(
        &self,
        source: &mut ByteSource<R>,
    ) -> Result<Vec<u8>> {
        let mut payload = vec![0u8; self.compressed_size as usize];
        source.read_full(&mut payload)?;
        Ok(payload)
    }

    /// The checksum stored in the block header (zero if none was computed).
    pub fn checksum(&self) -> u32 {
        self.checksum
    }

    /// Number of compressed payload bytes.
    pub fn compressed_size(&self) -> u16 {
        self.compressed_size
    }

    /// Number of bytes the payload decodes to.
    pub fn uncompressed_size(&self) -> u16 {
        self.uncompressed_size
    }

    /// Absolute offset of the payload in the cabinet.
    pub fn data_offset(&self) -> u64 {
        self.data_offset
    }

    /// Recomputes the checksum over the two size fields and `payload`.
    pub fn compute_checksum(&self, payload: &[u8]) -> u32 {
        let sizes = (self.compressed_size as u32)
            | ((self.uncompressed_size as u32) << 16);
        let seed = checksum::calculate(&sizes.to_le_bytes(), 0);
        checksum::calculate(payload, seed)
    }

    /// Returns true if `payload` matches the stored checksum.  A stored
    /// checksum of zero means none was computed, and always matches.
    pub fn validate_checksum(&self, payload: &[u8]) -> bool {
        self.checksum == 0 || self.compute_checksum(payload) == self.checksum
    }
}
