//! Random-access reader over a file, stream or in-memory buffer.

use crate::error::{Error, Result};
use crate::ids::{FourCC, Guid};
use crate::primitives::Endian;
use crate::text::{decode_latin1, decode_utf16};
use byteorder::ByteOrder;
use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek, SeekFrom};
use std::path::Path;

/// Anything the cursor can read from.
pub trait Source: Read + Seek {}
impl<T: Read + Seek> Source for T {}

/// A seekable reader with one mutable position and an optional read limit.
///
/// Positions are absolute. A cursor built with [`ByteCursor::from_bytes_at`]
/// reports positions starting at `base`, so a transformed copy of a file
/// region (e.g. an ID3v2 body after undoing unsynchronisation) keeps
/// file-relative offsets.
pub struct ByteCursor {
    inner: Box<dyn Source>,
    base: u64,
    end: u64,
    pos: u64,
    limit: u64,
    inner_pos: Option<u64>,
}

impl ByteCursor {
    pub fn new<R: Read + Seek + 'static>(mut inner: R) -> Result<Self> {
        let end = inner.seek(SeekFrom::End(0))?;
        inner.seek(SeekFrom::Start(0))?;
        Ok(Self {
            inner: Box::new(inner),
            base: 0,
            end,
            pos: 0,
            limit: end,
            inner_pos: Some(0),
        })
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::new(BufReader::new(File::open(path)?))
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self::from_bytes_at(bytes, 0)
    }

    pub fn from_bytes_at(bytes: Vec<u8>, base: u64) -> Self {
        let end = base + bytes.len() as u64;
        Self {
            inner: Box::new(Cursor::new(bytes)),
            base,
            end,
            pos: base,
            limit: end,
            inner_pos: Some(0),
        }
    }

    /// Absolute end of the source.
    pub fn len(&self) -> u64 {
        self.end
    }

    pub fn is_empty(&self) -> bool {
        self.end == self.base
    }

    pub fn base(&self) -> u64 {
        self.base
    }

    pub fn tell(&self) -> u64 {
        self.pos
    }

    /// Bytes readable before the current limit.
    pub fn remaining(&self) -> u64 {
        self.limit.saturating_sub(self.pos)
    }

    pub fn has_remaining(&self) -> bool {
        self.remaining() > 0
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    /// Restricts reads to end at `limit` (clamped to the source end).
    pub fn set_limit(&mut self, limit: u64) {
        self.limit = limit.min(self.end);
    }

    /// Re-reads the source length after the underlying file changed size.
    pub fn refresh(&mut self) -> Result<()> {
        let len = self.inner.seek(SeekFrom::End(0))?;
        self.inner_pos = None;
        self.end = self.base + len;
        self.limit = self.end;
        self.pos = self.pos.min(self.end);
        Ok(())
    }

    /// Seeks to `offset`; negative values count back from the end of the source.
    pub fn seek(&mut self, offset: i64) -> Result<u64> {
        let target = if offset < 0 {
            let back = offset.unsigned_abs();
            let span = self.end - self.base;
            if back > span {
                return Err(Error::TruncatedInput {
                    offset: self.base,
                    needed: back,
                    available: span,
                });
            }
            self.end - back
        } else {
            offset as u64
        };
        self.seek_to(target)
    }

    pub fn seek_to(&mut self, pos: u64) -> Result<u64> {
        if pos < self.base || pos > self.end {
            return Err(Error::TruncatedInput {
                offset: pos,
                needed: pos.saturating_sub(self.end),
                available: 0,
            });
        }
        self.pos = pos;
        Ok(pos)
    }

    /// Moves relative to the current position.
    pub fn skip(&mut self, delta: i64) -> Result<u64> {
        let target = self
            .pos
            .checked_add_signed(delta)
            .ok_or_else(|| Error::layout(format!("skip {delta} from {}", self.pos)))?;
        if target > self.limit {
            return Err(Error::TruncatedInput {
                offset: self.pos,
                needed: delta.unsigned_abs(),
                available: self.remaining(),
            });
        }
        self.seek_to(target)
    }

    fn fill(&mut self, buf: &mut [u8]) -> Result<()> {
        let n = buf.len() as u64;
        if n > self.remaining() {
            return Err(Error::TruncatedInput {
                offset: self.pos,
                needed: n,
                available: self.remaining(),
            });
        }
        let local = self.pos - self.base;
        if self.inner_pos != Some(local) {
            self.inner.seek(SeekFrom::Start(local))?;
        }
        self.inner.read_exact(buf)?;
        self.pos += n;
        self.inner_pos = Some(local + n);
        Ok(())
    }

    /// Reads exactly `n` bytes or fails with `TruncatedInput`.
    pub fn read(&mut self, n: u64) -> Result<Vec<u8>> {
        if n > self.remaining() {
            return Err(Error::TruncatedInput {
                offset: self.pos,
                needed: n,
                available: self.remaining(),
            });
        }
        let mut buf = vec![0u8; n as usize];
        self.fill(&mut buf)?;
        Ok(buf)
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut buf = [0u8; N];
        self.fill(&mut buf)?;
        Ok(buf)
    }

    /// Everything between the position and the limit.
    pub fn read_to_limit(&mut self) -> Result<Vec<u8>> {
        self.read(self.remaining())
    }

    /// Reads `len` bytes at `offset` without disturbing position or limit.
    pub fn read_at(&mut self, offset: u64, len: u64) -> Result<Vec<u8>> {
        let (pos, limit) = (self.pos, self.limit);
        self.limit = self.end;
        let out = self.seek_to(offset).and_then(|_| self.read(len));
        self.pos = pos;
        self.limit = limit;
        out
    }

    pub fn peek(&mut self, n: u64) -> Result<Vec<u8>> {
        let pos = self.pos;
        let out = self.read(n);
        self.pos = pos;
        out
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_array::<1>()?[0])
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(self.read_u8()? as i8)
    }

    pub fn read_u16<B: ByteOrder>(&mut self) -> Result<u16> {
        Ok(B::read_u16(&self.read_array::<2>()?))
    }

    pub fn read_i16<B: ByteOrder>(&mut self) -> Result<i16> {
        Ok(B::read_i16(&self.read_array::<2>()?))
    }

    pub fn read_u24<B: ByteOrder>(&mut self) -> Result<u32> {
        Ok(B::read_u24(&self.read_array::<3>()?))
    }

    pub fn read_u32<B: ByteOrder>(&mut self) -> Result<u32> {
        Ok(B::read_u32(&self.read_array::<4>()?))
    }

    pub fn read_i32<B: ByteOrder>(&mut self) -> Result<i32> {
        Ok(B::read_i32(&self.read_array::<4>()?))
    }

    pub fn read_u64<B: ByteOrder>(&mut self) -> Result<u64> {
        Ok(B::read_u64(&self.read_array::<8>()?))
    }

    pub fn read_i64<B: ByteOrder>(&mut self) -> Result<i64> {
        Ok(B::read_i64(&self.read_array::<8>()?))
    }

    /// Reads an unsigned integer of 1 to 8 bytes.
    pub fn read_uint<B: ByteOrder>(&mut self, nbytes: usize) -> Result<u64> {
        if !(1..=8).contains(&nbytes) {
            return Err(Error::layout(format!("unsupported integer width {nbytes}")));
        }
        let buf = self.read(nbytes as u64)?;
        Ok(B::read_uint(&buf, nbytes))
    }

    pub fn read_fourcc(&mut self) -> Result<FourCC> {
        Ok(FourCC(self.read_array::<4>()?))
    }

    pub fn read_guid(&mut self) -> Result<Guid> {
        Ok(Guid(self.read_array::<16>()?))
    }

    /// Fixed-length Latin-1 string with trailing NULs removed.
    pub fn read_string(&mut self, n: u64) -> Result<String> {
        let bytes = self.read(n)?;
        Ok(decode_latin1(&bytes).trim_end_matches('\0').to_string())
    }

    /// Bytes up to (not including) the next NUL, consuming the NUL. Without a
    /// terminator before the limit the rest of the readable range is returned.
    pub fn read_cstring(&mut self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        while self.has_remaining() {
            match self.read_u8()? {
                0 => break,
                b => out.push(b),
            }
        }
        Ok(out)
    }

    /// `n` bytes of UTF-16, BOM-detected, otherwise in `default` order.
    pub fn read_utf16(&mut self, n: u64, default: Endian) -> Result<String> {
        let bytes = self.read(n)?;
        Ok(decode_utf16(&bytes, default))
    }
}

impl std::fmt::Debug for ByteCursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ByteCursor")
            .field("base", &self.base)
            .field("end", &self.end)
            .field("pos", &self.pos)
            .field("limit", &self.limit)
            .finish()
    }
}
