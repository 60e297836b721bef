#![allow(dead_code)]

use mediabox::Guid;
use std::io::Write;
use tempfile::NamedTempFile;

pub fn be32(values: &[u32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_be_bytes()).collect()
}

pub fn mp4_box(typ: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut v = Vec::new();
    v.extend_from_slice(&(8 + payload.len() as u32).to_be_bytes());
    v.extend_from_slice(typ);
    v.extend_from_slice(payload);
    v
}

pub fn full_box(typ: &[u8; 4], version: u8, flags: u32, payload: &[u8]) -> Vec<u8> {
    let mut p = vec![version];
    p.extend_from_slice(&flags.to_be_bytes()[1..]);
    p.extend_from_slice(payload);
    mp4_box(typ, &p)
}

pub fn ftyp() -> Vec<u8> {
    // major brand "isom", minor version 512, compatible "isom" "iso2"
    let mut p = b"isom".to_vec();
    p.extend_from_slice(&512u32.to_be_bytes());
    p.extend_from_slice(b"isomiso2");
    mp4_box(b"ftyp", &p)
}

/// `moov/trak/mdia/minf/stbl` holding `stsd`, `stsz` and an `stco` with
/// one chunk at `chunk_offset`.
pub fn movie(chunk_offset: u32) -> Vec<u8> {
    let stsd = full_box(b"stsd", 0, 0, &be32(&[0]));
    let stsz = full_box(b"stsz", 0, 0, &be32(&[0, 4, 10, 10, 10, 10]));
    let stco = full_box(b"stco", 0, 0, &be32(&[1, chunk_offset]));
    let stbl = mp4_box(b"stbl", &[stsd, stsz, stco].concat());
    let minf = mp4_box(b"minf", &stbl);
    let mdia = mp4_box(b"mdia", &minf);
    let trak = mp4_box(b"trak", &mdia);
    mp4_box(b"moov", &trak)
}

pub fn media_payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

/// `ftyp`, `moov` and a 40-byte `mdat` whose payload the chunk offset points at.
pub fn sample_mp4() -> Vec<u8> {
    let ftyp = ftyp();
    let offset = (ftyp.len() + movie(0).len() + 8) as u32;
    [ftyp, movie(offset), mp4_box(b"mdat", &media_payload(40))].concat()
}

pub fn synchsafe(n: u32) -> [u8; 4] {
    [
        ((n >> 21) & 0x7F) as u8,
        ((n >> 14) & 0x7F) as u8,
        ((n >> 7) & 0x7F) as u8,
        (n & 0x7F) as u8,
    ]
}

pub fn id3_frame_v3(id: &[u8; 4], flags: u16, payload: &[u8]) -> Vec<u8> {
    let mut v = id.to_vec();
    v.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    v.extend_from_slice(&flags.to_be_bytes());
    v.extend_from_slice(payload);
    v
}

pub fn id3_frame_v4(id: &[u8; 4], flags: u16, payload: &[u8]) -> Vec<u8> {
    let mut v = id.to_vec();
    v.extend_from_slice(&synchsafe(payload.len() as u32));
    v.extend_from_slice(&flags.to_be_bytes());
    v.extend_from_slice(payload);
    v
}

pub fn id3_tag(major: u8, flags: u8, frames: &[u8], padding: usize) -> Vec<u8> {
    let mut v = b"ID3".to_vec();
    v.extend_from_slice(&[major, 0, flags]);
    v.extend_from_slice(&synchsafe((frames.len() + padding) as u32));
    v.extend_from_slice(frames);
    v.resize(v.len() + padding, 0);
    v
}

/// Latin-1 text frame payload.
pub fn latin1_text(s: &str) -> Vec<u8> {
    let mut v = vec![0];
    v.extend_from_slice(s.as_bytes());
    v
}

/// Latin-1 `COMM` payload.
pub fn comment(lang: &[u8; 3], desc: &str, text: &str) -> Vec<u8> {
    let mut v = vec![0];
    v.extend_from_slice(lang);
    v.extend_from_slice(desc.as_bytes());
    v.push(0);
    v.extend_from_slice(text.as_bytes());
    v
}

pub fn asf_object(guid: &Guid, payload: &[u8]) -> Vec<u8> {
    let mut v = guid.0.to_vec();
    v.extend_from_slice(&(24 + payload.len() as u64).to_le_bytes());
    v.extend_from_slice(payload);
    v
}

pub fn utf16z(s: &str) -> Vec<u8> {
    let mut v: Vec<u8> = s.encode_utf16().flat_map(|u| u.to_le_bytes()).collect();
    v.extend_from_slice(&[0, 0]);
    v
}

pub fn write_temp(bytes: &[u8]) -> NamedTempFile {
    let mut f = NamedTempFile::new().expect("temp file");
    f.write_all(bytes).expect("write temp file");
    f.flush().expect("flush temp file");
    f
}
