use lzxd::Lzxd;

use crate::consts;
use crate::error::{Error, Result};
use crate::mszip::MsZipDecompressor;

const QUANTUM_LEVEL_MIN: u16 = 1;
const QUANTUM_LEVEL_MAX: u16 = 7;
const QUANTUM_MEMORY_MIN: u16 = 10;
const QUANTUM_MEMORY_MAX: u16 = 21;

/// A scheme for compressing data within the cabinet.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub enum CompressionType {
    /// No compression.
    None,
    /// MSZIP compression.  MSZIP is described further in
    /// [MS-MCI](https://msdn.microsoft.com/en-us/library/cc483131.aspx).
    MsZip,
    /// Quantum compression with the given level and memory.
    Quantum(u16, u16),
    /// LZX compression with the given window size.  The LZX compression scheme
    /// is described further in
    /// [MS-PATCH](https://msdn.microsoft.com/en-us/library/cc483133.aspx).
    Lzx(lzxd::WindowSize),
}

impl CompressionType {
    /// Decodes a folder's 16-bit compression field.  `offset` is where the
    /// field was read, for error reporting.
    pub(crate) fn from_bitfield(
        bits: u16,
        offset: u64,
    ) -> Result<CompressionType> {
        let ctype = bits & 0x000f;
        if ctype == consts::CTYPE_NONE {
            Ok(CompressionType::None)
        } else if ctype == consts::CTYPE_MSZIP {
            Ok(CompressionType::MsZip)
        } else if ctype == consts::CTYPE_QUANTUM {
            let level = (bits & 0x00f0) >> 4;
            if !(QUANTUM_LEVEL_MIN..=QUANTUM_LEVEL_MAX).contains(&level) {
                corrupt!(offset, "Invalid Quantum level: 0x{:02x}", level);
            }
            let memory = (bits & 0x1f00) >> 8;
            if !(QUANTUM_MEMORY_MIN..=QUANTUM_MEMORY_MAX).contains(&memory) {
                corrupt!(offset, "Invalid Quantum memory: 0x{:02x}", memory);
            }
            Ok(CompressionType::Quantum(level, memory))
        } else if ctype == consts::CTYPE_LZX {
            let window = (bits & 0x1f00) >> 8;
            let window = match window {
                15 => lzxd::WindowSize::KB32,
                16 => lzxd::WindowSize::KB64,
                17 => lzxd::WindowSize::KB128,
                18 => lzxd::WindowSize::KB256,
                19 => lzxd::WindowSize::KB512,
                20 => lzxd::WindowSize::MB1,
                21 => lzxd::WindowSize::MB2,
                22 => lzxd::WindowSize::MB4,
                23 => lzxd::WindowSize::MB8,
                24 => lzxd::WindowSize::MB16,
                25 => lzxd::WindowSize::MB32,
                _ => corrupt!(offset, "Invalid LZX window: 0x{:02x}", window),
            };
            Ok(CompressionType::Lzx(window))
        } else {
            corrupt!(offset, "Invalid compression type: 0x{:04x}", bits);
        }
    }

    /// Re-encodes this compression type as a 16-bit folder field.
    pub fn to_bitfield(self) -> u16 {
        match self {
            CompressionType::None => consts::CTYPE_NONE,
            CompressionType::MsZip => consts::CTYPE_MSZIP,
            CompressionType::Quantum(level, memory) => {
                consts::CTYPE_QUANTUM
                    | (level.clamp(QUANTUM_LEVEL_MIN, QUANTUM_LEVEL_MAX) << 4)
                    | (memory.clamp(QUANTUM_MEMORY_MIN, QUANTUM_MEMORY_MAX)
                        << 8)
            }
            CompressionType::Lzx(window_size) => {
                consts::CTYPE_LZX | (lzx_window_bits(window_size) << 8)
            }
        }
    }

    /// Returns the window-size parameter embedded in the compression field
    /// (zero for methods without one).
    pub fn window_param(self) -> u16 {
        (self.to_bitfield() & 0x1f00) >> 8
    }

    pub(crate) fn into_codec(self) -> Result<Codec> {
        match self {
            CompressionType::None => Ok(Codec::Uncompressed),
            CompressionType::MsZip => {
                Ok(Codec::MsZip(Box::new(MsZipDecompressor::new())))
            }
            CompressionType::Quantum(_, _) => {
                let method = self.to_bitfield();
                Err(Error::UnsupportedCompression { method })
            }
            CompressionType::Lzx(window_size) => {
                Ok(Codec::Lzx(Box::new(Lzxd::new(window_size))))
            }
        }
    }
}

fn lzx_window_bits(window_size: lzxd::WindowSize) -> u16 {
    match window_size {
        lzxd::WindowSize::KB32 => 15,
        lzxd::WindowSize::KB64 => 16,
        lzxd::WindowSize::KB128 => 17,
        lzxd::WindowSize::KB256 => 18,
        lzxd::WindowSize::KB512 => 19,
        lzxd::WindowSize::MB1 => 20,
        lzxd::WindowSize::MB2 => 21,
        lzxd::WindowSize::MB4 => 22,
        lzxd::WindowSize::MB8 => 23,
        lzxd::WindowSize::MB16 => 24,
        lzxd::WindowSize::MB32 => 25,
    }
}

/// Per-block decoder for one folder's compression method.
pub(crate) enum Codec {
    Uncompressed,
    MsZip(Box<MsZipDecompressor>),
    Lzx(Box<Lzxd>),
}

impl Codec {
    /// Largest compressed payload a data block may carry for this method.
    pub(crate) fn max_compressed_size(&self) -> usize {
        consts::MAX_BLOCK_SIZE
            + match self {
                Codec::Uncompressed => 0,
                Codec::MsZip(_) => consts::MSZIP_MAX_GROWTH,
                Codec::Lzx(_) => consts::LZX_MAX_GROWTH,
            }
    }

    pub(crate) fn reset(&mut self) {
        match self {
            Codec::Uncompressed => {}
            Codec::MsZip(d) => d.reset(),
            Codec::Lzx(d) => d.reset(),
        }
    }

    /// Decodes one block's payload, read from absolute offset `offset`.
    pub(crate) fn decompress(
        &mut self,
        data: Vec<u8>,
        uncompressed_size: usize,
        offset: u64,
    ) -> Result<Vec<u8>> {
        match self {
            Codec::Uncompressed => {
                if data.len() != uncompressed_size {
                    corrupt!(
                        offset,
                        "Stored block size mismatch \
                         (compressed {}, uncompressed {})",
                        data.len(),
                        uncompressed_size
                    );
                }
                Ok(data)
            }
            Codec::MsZip(decompressor) => {
                decompressor.decompress_block(&data, uncompressed_size, offset)
            }
            Codec::Lzx(decompressor) => {
                match decompressor.decompress_next(&data, uncompressed_size) {
                    Ok(out) => Ok(out.to_vec()),
                    Err(error) => {
                        corrupt!(offset, "LZX decompression failed: {}", error)
                    }
                }
            }
        }
    }
}
