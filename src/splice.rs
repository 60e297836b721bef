//! In-place file surgery: moving the tail of a file forwards or backwards
//! in fixed-size blocks.

use crate::error::{Error, Result};
use log::debug;
use std::fs::File;
use std::io::{Cursor, Read, Seek, SeekFrom, Write};

/// Default move granularity.
pub const BLOCK_SIZE: usize = 1024;

/// Storage whose length can be changed.
pub trait Resize {
    fn resize_to(&mut self, len: u64) -> std::io::Result<()>;
}

impl Resize for File {
    fn resize_to(&mut self, len: u64) -> std::io::Result<()> {
        self.set_len(len)
    }
}

impl Resize for Cursor<Vec<u8>> {
    fn resize_to(&mut self, len: u64) -> std::io::Result<()> {
        let len = usize::try_from(len).map_err(std::io::Error::other)?;
        self.get_mut().resize(len, 0);
        Ok(())
    }
}

/// Moves every byte from `at` to the end of the storage by `delta` and
/// resizes it accordingly. Growing leaves the `delta` bytes at `at`
/// unspecified; the caller overwrites them. Returns the new length.
///
/// Growing extends first and copies back-to-front; shrinking copies
/// front-to-back and truncates last, so no source block is overwritten
/// before it has been read.
pub fn shift_tail<S>(s: &mut S, at: u64, delta: i64, block: usize) -> Result<u64>
where
    S: Read + Write + Seek + Resize,
{
    let len = s.seek(SeekFrom::End(0))?;
    if at > len {
        return Err(Error::layout(format!("splice point {at} beyond end {len}")));
    }
    let new_len = len
        .checked_add_signed(delta)
        .ok_or_else(|| Error::layout(format!("shrinking {len} bytes by {}", delta.unsigned_abs())))?;
    let block = block.max(1) as u64;
    let mut buf = vec![0u8; block as usize];

    if delta > 0 {
        let d = delta as u64;
        s.resize_to(new_len)?;
        let mut end = len;
        while end > at {
            let start = end.saturating_sub(block).max(at);
            let n = (end - start) as usize;
            s.seek(SeekFrom::Start(start))?;
            s.read_exact(&mut buf[..n])?;
            s.seek(SeekFrom::Start(start + d))?;
            s.write_all(&buf[..n])?;
            end = start;
        }
    } else if delta < 0 {
        let d = delta.unsigned_abs();
        if d > at {
            return Err(Error::layout(format!("cannot move data at {at} back by {d}")));
        }
        let mut start = at;
        while start < len {
            let end = (start + block).min(len);
            let n = (end - start) as usize;
            s.seek(SeekFrom::Start(start))?;
            s.read_exact(&mut buf[..n])?;
            s.seek(SeekFrom::Start(start - d))?;
            s.write_all(&buf[..n])?;
            start = end;
        }
        s.resize_to(new_len)?;
    }
    if delta != 0 {
        debug!("moved {} bytes at {at} by {delta}", len - at);
    }
    Ok(new_len)
}

pub fn write_at<S: Write + Seek>(s: &mut S, offset: u64, bytes: &[u8]) -> Result<()> {
    s.seek(SeekFrom::Start(offset))?;
    s.write_all(bytes)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage(len: usize) -> Cursor<Vec<u8>> {
        Cursor::new((0..len).map(|i| (i % 251) as u8).collect())
    }

    #[test]
    fn grow_moves_tail_forward() {
        let mut s = storage(5000);
        let before = s.get_ref().clone();
        assert_eq!(shift_tail(&mut s, 100, 150, 64).unwrap(), 5150);
        let after = s.get_ref();
        assert_eq!(&after[..100], &before[..100]);
        assert_eq!(&after[250..], &before[100..]);
    }

    #[test]
    fn shrink_moves_tail_back() {
        let mut s = storage(3000);
        let before = s.get_ref().clone();
        assert_eq!(shift_tail(&mut s, 1000, -300, BLOCK_SIZE).unwrap(), 2700);
        let after = s.get_ref();
        assert_eq!(&after[..700], &before[..700]);
        assert_eq!(&after[700..], &before[1000..]);
    }

    #[test]
    fn zero_delta_is_a_no_op() {
        let mut s = storage(10);
        let before = s.get_ref().clone();
        assert_eq!(shift_tail(&mut s, 3, 0, BLOCK_SIZE).unwrap(), 10);
        assert_eq!(s.get_ref(), &before);
    }

    #[test]
    fn rejects_moves_before_start() {
        let mut s = storage(10);
        assert!(matches!(shift_tail(&mut s, 2, -5, BLOCK_SIZE), Err(Error::InvalidLayout(_))));
        assert!(matches!(shift_tail(&mut s, 20, 1, BLOCK_SIZE), Err(Error::InvalidLayout(_))));
    }
}
