use std::io::Read;

use encoding_rs::WINDOWS_1252;

use crate::consts;
use crate::error::Result;
use crate::source::ByteSource;

/// Reads a null-terminated file name and decodes it.
///
/// The buffer, terminator included, may not exceed
/// [`consts::MAX_NAME_BUFFER_SIZE`] bytes.  UTF-8 names must be valid UTF-8
/// (no overlong forms, no stray continuation bytes); other names are decoded
/// as Windows-1252 and right-trimmed of whitespace and control characters.
pub(crate) fn read_null_terminated_string<R: Read>(
    source: &mut ByteSource<R>,
    is_utf8: bool,
) -> Result<String> {
    let start = source.position();
    let mut bytes = Vec::<u8>::with_capacity(consts::MAX_NAME_BUFFER_SIZE);
    loop {
        let byte = source.read_u8()?;
        if byte == 0 {
            break;
        } else if bytes.len() + 1 == consts::MAX_NAME_BUFFER_SIZE {
            corrupt!(
                start,
                "Name not terminated within {} bytes",
                consts::MAX_NAME_BUFFER_SIZE
            );
        }
        bytes.push(byte);
    }
    if is_utf8 {
        match String::from_utf8(bytes) {
            Ok(string) => Ok(string),
            Err(error) => corrupt!(
                start,
                "Invalid UTF-8 name (bad byte at index {})",
                error.utf8_error().valid_up_to()
            ),
        }
    } else {
        let (decoded, _) = WINDOWS_1252.decode_without_bom_handling(&bytes);
        Ok(decoded.trim_end_matches(|c: char| c <= ' ').to_string())
    }
}
