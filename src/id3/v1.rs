//! The fixed 128-byte ID3v1 / v1.1 trailer at the end of an audio file.
//!
//! It has no nested structure, so it is read and written directly rather
//! than through a node tree. In an ID3v2 tree it is part of the trailing
//! audio node.

use super::genres::genre_name;
use crate::cursor::ByteCursor;
use crate::error::{Error, Result};
use crate::splice;
use crate::text::{decode_latin1, encode_latin1};
use log::debug;
use serde::Serialize;
use std::fs::OpenOptions;
use std::io::{Seek, SeekFrom};
use std::path::Path;

pub const V1_LEN: u64 = 128;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Id3v1 {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub year: String,
    pub comment: String,
    /// v1.1 track number, stored in the last two comment bytes.
    pub track: Option<u8>,
    pub genre: u8,
}

fn field(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    decode_latin1(&bytes[..end]).trim_end().to_string()
}

fn put(out: &mut Vec<u8>, s: &str, width: usize) -> Result<()> {
    let mut bytes = encode_latin1(s)?;
    if bytes.len() > width {
        return Err(Error::InvalidText(format!("{s:?} exceeds the {width}-byte ID3v1 field")));
    }
    bytes.resize(width, 0);
    out.extend_from_slice(&bytes);
    Ok(())
}

impl Id3v1 {
    /// Decodes a trailer; `None` unless it starts with `TAG`.
    pub fn parse(bytes: &[u8; 128]) -> Option<Self> {
        if &bytes[..3] != b"TAG" {
            return None;
        }
        let comment = &bytes[97..127];
        let track = (comment[28] == 0 && comment[29] != 0).then_some(comment[29]);
        let comment = if track.is_some() { &comment[..28] } else { comment };
        Some(Self {
            title: field(&bytes[3..33]),
            artist: field(&bytes[33..63]),
            album: field(&bytes[63..93]),
            year: field(&bytes[93..97]),
            comment: field(comment),
            track,
            genre: bytes[127],
        })
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(V1_LEN as usize);
        out.extend_from_slice(b"TAG");
        put(&mut out, &self.title, 30)?;
        put(&mut out, &self.artist, 30)?;
        put(&mut out, &self.album, 30)?;
        put(&mut out, &self.year, 4)?;
        match self.track {
            Some(t) => {
                put(&mut out, &self.comment, 28)?;
                out.push(0);
                out.push(t);
            }
            None => put(&mut out, &self.comment, 30)?,
        }
        out.push(self.genre);
        Ok(out)
    }

    pub fn genre_name(&self) -> &'static str {
        genre_name(self.genre as usize)
    }
}

/// Reads the trailer of the source, if it has one.
pub fn read_v1(cur: &mut ByteCursor) -> Result<Option<Id3v1>> {
    let len = cur.len() - cur.base();
    if len < V1_LEN {
        return Ok(None);
    }
    let bytes = cur.read_at(cur.len() - V1_LEN, V1_LEN)?;
    let mut arr = [0u8; 128];
    arr.copy_from_slice(&bytes);
    Ok(Id3v1::parse(&arr))
}

/// Replaces the trailer of the file at `path`, appending one if absent.
pub fn write_v1(path: impl AsRef<Path>, tag: &Id3v1) -> Result<()> {
    let path = path.as_ref();
    let existing = read_v1(&mut ByteCursor::open(path)?)?.is_some();
    let mut file = OpenOptions::new()
        .read(true)
        .write(true)
        .open(path)
        .map_err(|e| Error::NotWritable(format!("{}: {e}", path.display())))?;
    let end = file.seek(SeekFrom::End(0))?;
    let at = if existing { end - V1_LEN } else { end };
    debug!("id3v1: writing trailer at {at}");
    splice::write_at(&mut file, at, &tag.encode()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn v11_track_number() {
        let tag = Id3v1 {
            title: "Song".into(),
            artist: "Band".into(),
            comment: "hi".into(),
            track: Some(7),
            genre: 17,
            ..Default::default()
        };
        let bytes = tag.encode().unwrap();
        assert_eq!(bytes.len(), 128);
        let arr: [u8; 128] = bytes.try_into().unwrap();
        let back = Id3v1::parse(&arr).unwrap();
        assert_eq!(back, tag);
        assert_eq!(back.genre_name(), "Rock");
    }

    #[test]
    fn genre_past_table() {
        let tag = Id3v1 {
            genre: 255,
            ..Default::default()
        };
        assert_eq!(tag.genre_name(), "Unknown");
    }

    #[test]
    fn rejects_long_fields() {
        let tag = Id3v1 {
            year: "19999".into(),
            ..Default::default()
        };
        assert!(tag.encode().is_err());
    }
}
