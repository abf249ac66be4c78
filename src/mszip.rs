use byteorder::{LittleEndian, WriteBytesExt};

use crate::error::Result;

const MSZIP_SIGNATURE: u16 = 0x4B43; // "CK" stored little-endian
const MSZIP_SIGNATURE_LEN: usize = 2;
const DEFLATE_MAX_DICT_LEN: usize = 0x8000;

/// Decoder for MSZIP blocks.  Each block is an independent DEFLATE stream
/// prefixed with "CK", but may refer back into the previous 32 KiB of output
/// from the same folder.
pub struct MsZipDecompressor {
    decompressor: flate2::Decompress,
    dictionary: Vec<u8>,
}

impl MsZipDecompressor {
    pub fn new() -> MsZipDecompressor {
        MsZipDecompressor {
            decompressor: flate2::Decompress::new(false),
            dictionary: Vec::with_capacity(DEFLATE_MAX_DICT_LEN),
        }
    }

    pub fn reset(&mut self) {
        self.decompressor.reset(false);
        self.dictionary = Vec::with_capacity(DEFLATE_MAX_DICT_LEN);
    }

    /// Decodes one block's payload.  `offset` is the absolute position of
    /// the payload in the cabinet, for error reporting.
    pub fn decompress_block(
        &mut self,
        data: &[u8],
        uncompressed_size: usize,
        offset: u64,
    ) -> Result<Vec<u8>> {
        // Check signature:
        if data.len() < MSZIP_SIGNATURE_LEN
            || ((data[0] as u16) | ((data[1] as u16) << 8)) != MSZIP_SIGNATURE
        {
            corrupt!(
                offset,
                "MSZIP decompression failed: Invalid block signature"
            );
        }
        let data = &data[MSZIP_SIGNATURE_LEN..];
        // Reset decompressor with appropriate dictionary:
        self.decompressor.reset(false);
        if !self.dictionary.is_empty() {
            // Feed the dictionary through as a stored block so that
            // back-references into the previous block resolve.
            debug_assert!(self.dictionary.len() <= DEFLATE_MAX_DICT_LEN);
            let length = self.dictionary.len() as u16;
            let mut chunk: Vec<u8> = vec![0];
            chunk.write_u16::<LittleEndian>(length)?;
            chunk.write_u16::<LittleEndian>(!length)?;
            chunk.extend_from_slice(&self.dictionary);
            let mut out = Vec::with_capacity(self.dictionary.len());
            let flush = flate2::FlushDecompress::Sync;
            if let Err(error) =
                self.decompressor.decompress_vec(&chunk, &mut out, flush)
            {
                corrupt!(offset, "MSZIP dictionary priming failed: {}", error);
            }
        }
        // Decompress data, leaving room for one extra byte so that a block
        // inflating past its declared size is caught below:
        let mut out = Vec::<u8>::with_capacity(uncompressed_size + 1);
        let flush = flate2::FlushDecompress::Finish;
        if let Err(error) =
            self.decompressor.decompress_vec(data, &mut out, flush)
        {
            corrupt!(offset, "MSZIP decompression failed: {}", error);
        }
        if out.len() != uncompressed_size {
            corrupt!(
                offset,
                "MSZIP decompression failed: Incorrect uncompressed size \
                 (expected {}, was actually {})",
                uncompressed_size,
                out.len()
            );
        }
        // Update dictionary for next block:
        if out.len() >= DEFLATE_MAX_DICT_LEN {
            let start = out.len() - DEFLATE_MAX_DICT_LEN;
            self.dictionary = out[start..].to_vec();
        } else {
            let total = self.dictionary.len() + out.len();
            if total > DEFLATE_MAX_DICT_LEN {
                self.dictionary.drain(..(total - DEFLATE_MAX_DICT_LEN));
            }
            self.dictionary.extend_from_slice(&out);
        }
        Ok(out)
    }
}
