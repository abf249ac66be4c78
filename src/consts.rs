pub const FILE_SIGNATURE: u32 = 0x4643534d; // "MSCF" stored little-endian

pub const VERSION_MAJOR: u8 = 1;
pub const VERSION_MINOR: u8 = 3;

// Name buffers hold at most this many bytes, terminator included:
pub const MAX_NAME_BUFFER_SIZE: usize = 256;

// Header flags:
pub const FLAG_PREV_CABINET: u16 = 0x1;
pub const FLAG_NEXT_CABINET: u16 = 0x2;
pub const FLAG_RESERVE_PRESENT: u16 = 0x4;

// File attributes:
pub const ATTR_READ_ONLY: u16 = 0x01;
pub const ATTR_HIDDEN: u16 = 0x02;
pub const ATTR_SYSTEM: u16 = 0x04;
pub const ATTR_ARCH: u16 = 0x20;
pub const ATTR_EXEC: u16 = 0x40;
pub const ATTR_NAME_IS_UTF: u16 = 0x80;

// Compression method ids (low bits of the folder's compression field):
pub const CTYPE_NONE: u16 = 0;
pub const CTYPE_MSZIP: u16 = 1;
pub const CTYPE_QUANTUM: u16 = 2;
pub const CTYPE_LZX: u16 = 3;

// Data blocks never decode to more than this many bytes:
pub const MAX_BLOCK_SIZE: usize = 0x8000;

// How far a compressed block may exceed MAX_BLOCK_SIZE, per method:
pub const MSZIP_MAX_GROWTH: usize = 28;
pub const LZX_MAX_GROWTH: usize = 6144;
