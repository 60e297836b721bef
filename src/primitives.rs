//! Pure fixed-width integer codecs.
//!
//! Every decode is a function of a byte slice; every encode is its exact
//! inverse for widths of 1 to 8 bytes in either byte order.

use crate::error::{Error, Result};
use byteorder::{BigEndian, ByteOrder, LittleEndian};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Endian {
    Big,
    Little,
}

fn check_width(width: usize) -> Result<()> {
    if (1..=8).contains(&width) {
        Ok(())
    } else {
        Err(Error::layout(format!("unsupported integer width {width}")))
    }
}

pub fn decode_uint(bytes: &[u8], endian: Endian) -> Result<u64> {
    check_width(bytes.len())?;
    Ok(match endian {
        Endian::Big => BigEndian::read_uint(bytes, bytes.len()),
        Endian::Little => LittleEndian::read_uint(bytes, bytes.len()),
    })
}

/// Sign-extending counterpart of [`decode_uint`].
pub fn decode_int(bytes: &[u8], endian: Endian) -> Result<i64> {
    check_width(bytes.len())?;
    Ok(match endian {
        Endian::Big => BigEndian::read_int(bytes, bytes.len()),
        Endian::Little => LittleEndian::read_int(bytes, bytes.len()),
    })
}

pub fn encode_uint(value: u64, width: usize, endian: Endian) -> Result<Vec<u8>> {
    check_width(width)?;
    if width < 8 && value >> (width * 8) != 0 {
        return Err(Error::layout(format!(
            "{value} does not fit in {width} bytes"
        )));
    }
    let mut buf = vec![0u8; width];
    match endian {
        Endian::Big => BigEndian::write_uint(&mut buf, value, width),
        Endian::Little => LittleEndian::write_uint(&mut buf, value, width),
    }
    Ok(buf)
}

pub fn encode_int(value: i64, width: usize, endian: Endian) -> Result<Vec<u8>> {
    check_width(width)?;
    if width < 8 {
        let bits = width as u32 * 8;
        let min = -(1i64 << (bits - 1));
        let max = (1i64 << (bits - 1)) - 1;
        if value < min || value > max {
            return Err(Error::layout(format!(
                "{value} does not fit in {width} signed bytes"
            )));
        }
    }
    let mut buf = vec![0u8; width];
    match endian {
        Endian::Big => BigEndian::write_int(&mut buf, value, width),
        Endian::Little => LittleEndian::write_int(&mut buf, value, width),
    }
    Ok(buf)
}
