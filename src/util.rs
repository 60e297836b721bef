use std::fmt::Write;

/// Classic 16-bytes-per-row dump: offset, hex column, printable ASCII.
pub fn hex_dump(bytes: &[u8], start_offset: u64) -> String {
    let mut out = String::with_capacity(bytes.len() / 16 * 80 + 80);
    let mut offset = start_offset;
    for row in bytes.chunks(16) {
        let mut cols = String::with_capacity(48);
        for b in row {
            let _ = write!(cols, "{b:02x} ");
        }
        let ascii: String = row
            .iter()
            .map(|&c| if c.is_ascii_graphic() || c == b' ' { c as char } else { '.' })
            .collect();
        let _ = writeln!(out, "{offset:08x}  {cols:<48}  |{ascii}|");
        offset += row.len() as u64;
    }
    out
}

pub(crate) fn serialize_hex<S: serde::Serializer, T: AsRef<[u8]>>(bytes: T, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&hex::encode(bytes))
}

pub(crate) fn serialize_hex_opt<S: serde::Serializer>(bytes: &Option<Vec<u8>>, s: S) -> Result<S::Ok, S::Error> {
    match bytes {
        Some(b) => s.serialize_some(&hex::encode(b)),
        None => s.serialize_none(),
    }
}
