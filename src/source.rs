use std::io::{self, Read, Seek, SeekFrom};

use byteorder::{LittleEndian, ReadBytesExt};

use crate::error::{Error, Result};

/// A forward-only view of a byte stream that keeps track of its absolute
/// position.
///
/// Cabinets are consumed strictly front to back, so the underlying reader
/// only needs to implement [`Read`].  Seeking forward is done by skipping
/// bytes; seeking backward is always an error.  If the underlying reader also
/// implements [`Seek`], a position can be [marked](ByteSource::mark) and
/// [returned to](ByteSource::reset) later.
pub struct ByteSource<R> {
    inner: R,
    position: u64,
    mark: Option<(u64, u64)>,
}

impl<R: Read> ByteSource<R> {
    /// Wraps `inner`, treating its current position as offset zero.
    pub fn new(inner: R) -> ByteSource<R> {
        ByteSource { inner, position: 0, mark: None }
    }

    /// Returns the absolute offset of the next byte to be read.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Returns a reference to the underlying reader.
    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    /// Unwraps this source, returning the underlying reader.
    pub fn into_inner(self) -> R {
        self.inner
    }

    pub(crate) fn read_u8(&mut self) -> Result<u8> {
        let offset = self.position;
        ReadBytesExt::read_u8(self).map_err(|error| eof_at(error, offset))
    }

    pub(crate) fn read_u16(&mut self) -> Result<u16> {
        let offset = self.position;
        ReadBytesExt::read_u16::<LittleEndian>(self)
            .map_err(|error| eof_at(error, offset))
    }

    pub(crate) fn read_u32(&mut self) -> Result<u32> {
        let offset = self.position;
        ReadBytesExt::read_u32::<LittleEndian>(self)
            .map_err(|error| eof_at(error, offset))
    }

    /// Fills `buf` completely, or fails with
    /// [`Error::UnexpectedEndOfData`].
    pub fn read_full(&mut self, buf: &mut [u8]) -> Result<()> {
        let offset = self.position;
        self.read_exact(buf).map_err(|error| eof_at(error, offset))
    }

    /// Reads and discards exactly `count` bytes.
    pub fn skip(&mut self, count: u64) -> Result<()> {
        let offset = self.position;
        let mut limited = self.by_ref().take(count);
        let skipped = io::copy(&mut limited, &mut io::sink())?;
        if skipped < count {
            return Err(Error::UnexpectedEndOfData { offset });
        }
        Ok(())
    }

    /// Moves forward to the absolute offset `target`.
    ///
    /// Fails with [`Error::InvalidSeek`] if `target` is behind the current
    /// position, and with [`Error::UnexpectedEndOfData`] if the data ends
    /// before `target` is reached.
    pub fn seek(&mut self, target: u64) -> Result<()> {
        if target < self.position {
            return Err(Error::InvalidSeek { position: self.position, target });
        }
        self.skip(target - self.position)
    }
}

impl<R: Read + Seek> ByteSource<R> {
    /// Remembers the current position so that [`reset`](ByteSource::reset)
    /// can return to it.
    pub fn mark(&mut self) -> Result<()> {
        let inner_position = self.inner.stream_position()?;
        self.mark = Some((self.position, inner_position));
        Ok(())
    }

    /// Returns to the most recently marked position.
    pub fn reset(&mut self) -> Result<()> {
        match self.mark {
            Some((position, inner_position)) => {
                self.inner.seek(SeekFrom::Start(inner_position))?;
                self.position = position;
                Ok(())
            }
            None => Err(Error::MarkNotSet),
        }
    }
}

impl<R: Read> Read for ByteSource<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let bytes_read = self.inner.read(buf)?;
        self.position += bytes_read as u64;
        Ok(bytes_read)
    }
}

fn eof_at(error: io::Error, offset: u64) -> Error {
    if error.kind() == io::ErrorKind::UnexpectedEof {
        Error::UnexpectedEndOfData { offset }
    } else {
        Error::Io(error)
    }
}
