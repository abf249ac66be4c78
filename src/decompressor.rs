use std::io::{Read, Write};

use tracing::{debug, trace};

use crate::ctype::{Codec, CompressionType};
use crate::datablock::DataBlock;
use crate::error::{Error, Result};
use crate::folder::FolderEntry;
use crate::source::ByteSource;

/// Where a [`Decompressor`] should put the bytes it produces.
pub enum Sink<'a> {
    /// Write the bytes to the given writer.
    Write(&'a mut dyn Write),
    /// Produce the bytes and throw them away.  Used to advance past files
    /// that are not being extracted.
    Discard,
}

/// Turns a folder's data blocks back into the folder's uncompressed stream.
///
/// The extraction engine positions the byte source at the folder's first
/// data block, calls [`initialize`](Decompressor::initialize) once, and then
/// asks for the folder's bytes in order with [`read`](Decompressor::read).
pub trait Decompressor {
    /// Prepares to decode a new folder using the folder's compression method
    /// and window size.  Any state left over from a previous folder is
    /// dropped.
    fn initialize(&mut self, folder: &FolderEntry) -> Result<()>;

    /// Produces exactly `count` more bytes of the folder's uncompressed
    /// stream into `sink`, reading data blocks from `source` as needed.  A
    /// count of zero does nothing.
    fn read<R: Read>(
        &mut self,
        source: &mut ByteSource<R>,
        count: u64,
        sink: Sink<'_>,
    ) -> Result<()>;
}

/// The built-in [`Decompressor`], supporting stored, MSZIP and LZX folders.
pub struct FolderDecompressor {
    data_reserve_size: u8,
    verify_checksums: bool,
    compression_type: Option<CompressionType>,
    codec: Option<Codec>,
    blocks_remaining: u16,
    block_index: usize,
    block_data: Vec<u8>,
    offset_within_block: usize,
}

impl FolderDecompressor {
    /// Creates a decompressor for a cabinet whose data blocks carry
    /// `data_reserve_size` bytes of reserve data each (see
    /// [`CabinetHeader::data_reserve_size`](crate::CabinetHeader::data_reserve_size)).
    pub fn new(data_reserve_size: u8) -> FolderDecompressor {
        FolderDecompressor {
            data_reserve_size,
            verify_checksums: false,
            compression_type: None,
            codec: None,
            blocks_remaining: 0,
            block_index: 0,
            block_data: Vec::new(),
            offset_within_block: 0,
        }
    }

    /// Sets whether data block checksums are checked.  Off by default; when
    /// on, a mismatch fails the read with [`Error::ChecksumMismatch`].
    pub fn verify_checksums(mut self, verify: bool) -> FolderDecompressor {
        self.verify_checksums = verify;
        self
    }

    fn load_block<R: Read>(
        &mut self,
        source: &mut ByteSource<R>,
    ) -> Result<()> {
        let offset = source.position();
        let codec = match self.codec {
            Some(ref mut codec) => codec,
            None => return Err(Error::DecompressorNotInitialized),
        };
        if self.blocks_remaining == 0 {
            corrupt!(offset, "Folder data ended before all files were read");
        }
        let block = DataBlock::parse(
            source,
            self.data_reserve_size,
            codec.max_compressed_size(),
        )?;
        let payload = block.read_payload(source)?;
        if self.verify_checksums && !block.validate_checksum(&payload) {
            return Err(Error::ChecksumMismatch {
                block: self.block_index,
                expected: block.checksum(),
                actual: block.compute_checksum(&payload),
            });
        }
        trace!(block = self.block_index, offset, "Decompressing data block");
        self.block_data = codec.decompress(
            payload,
            block.uncompressed_size() as usize,
            block.data_offset(),
        )?;
        self.offset_within_block = 0;
        self.blocks_remaining -= 1;
        self.block_index += 1;
        Ok(())
    }
}

impl Decompressor for FolderDecompressor {
    fn initialize(&mut self, folder: &FolderEntry) -> Result<()> {
        let compression_type = folder.compression_type();
        match self.codec {
            Some(ref mut codec)
                if self.compression_type == Some(compression_type) =>
            {
                codec.reset();
            }
            _ => {
                self.codec = Some(compression_type.into_codec()?);
                self.compression_type = Some(compression_type);
            }
        }
        debug!(
            ?compression_type,
            num_data_blocks = folder.num_data_blocks(),
            "Initialized folder decompressor"
        );
        self.blocks_remaining = folder.num_data_blocks();
        self.block_index = 0;
        self.block_data.clear();
        self.offset_within_block = 0;
        Ok(())
    }

    fn read<R: Read>(
        &mut self,
        source: &mut ByteSource<R>,
        count: u64,
        mut sink: Sink<'_>,
    ) -> Result<()> {
        let mut remaining = count;
        while remaining > 0 {
            if self.offset_within_block == self.block_data.len() {
                self.load_block(source)?;
                continue;
            }
            let available = &self.block_data[self.offset_within_block..];
            let num_bytes = (available.len() as u64).min(remaining) as usize;
            if let Sink::Write(ref mut writer) = sink {
                writer.write_all(&available[..num_bytes])?;
            }
            self.offset_within_block += num_bytes;
            remaining -= num_bytes as u64;
        }
        Ok(())
    }
}
