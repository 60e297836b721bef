use super::boxes::BoxKey;

/// Human-readable names of common ISO-14496 / QuickTime boxes.
///
/// Anything not in this table is reported without a name.
const NAMES: &[(&[u8; 4], &str)] = &[
    (b"ftyp", "File Type Box"),
    (b"styp", "Segment Type Box"),
    (b"moov", "Movie Box"),
    (b"mdat", "Media Data Box"),
    (b"free", "Free Space Box"),
    (b"skip", "Free Space Box"),
    (b"wide", "Wide Box"),
    (b"meta", "Meta Box"),
    (b"pssh", "Protection System Specific Header Box"),
    (b"sidx", "Segment Index Box"),
    (b"emsg", "Event Message Box"),
    (b"mfra", "Movie Fragment Random Access Box"),
    (b"mfro", "Movie Fragment Random Access Offset Box"),
    (b"mvhd", "Movie Header Box"),
    (b"trak", "Track Box"),
    (b"mvex", "Movie Extends Box"),
    (b"udta", "User Data Box"),
    (b"tkhd", "Track Header Box"),
    (b"edts", "Edit Box"),
    (b"elst", "Edit List Box"),
    (b"mdia", "Media Box"),
    (b"tref", "Track Reference Box"),
    (b"mdhd", "Media Header Box"),
    (b"hdlr", "Handler Reference Box"),
    (b"minf", "Media Information Box"),
    (b"vmhd", "Video Media Header Box"),
    (b"smhd", "Sound Media Header Box"),
    (b"hmhd", "Hint Media Header Box"),
    (b"nmhd", "Null Media Header Box"),
    (b"dinf", "Data Information Box"),
    (b"dref", "Data Reference Box"),
    (b"url ", "Data Entry URL Box"),
    (b"stbl", "Sample Table Box"),
    (b"stsd", "Sample Description Box"),
    (b"stts", "Decoding Time to Sample Box"),
    (b"ctts", "Composition Time to Sample Box"),
    (b"stsc", "Sample To Chunk Box"),
    (b"stsz", "Sample Size Box"),
    (b"stz2", "Compact Sample Size Box"),
    (b"stco", "Chunk Offset Box"),
    (b"co64", "64-bit Chunk Offset Box"),
    (b"stss", "Sync Sample Box"),
    (b"sdtp", "Independent and Disposable Samples Box"),
    (b"sgpd", "Sample Group Description Box"),
    (b"sbgp", "Sample To Group Box"),
    (b"mehd", "Movie Extends Header Box"),
    (b"trex", "Track Extends Box"),
    (b"moof", "Movie Fragment Box"),
    (b"mfhd", "Movie Fragment Header Box"),
    (b"traf", "Track Fragment Box"),
    (b"tfhd", "Track Fragment Header Box"),
    (b"tfdt", "Track Fragment Decode Time Box"),
    (b"trun", "Track Fragment Run Box"),
    (b"tfra", "Track Fragment Random Access Box"),
    (b"ilst", "Metadata Item List Box"),
    (b"data", "Metadata Value Box"),
    (b"mean", "Metadata Mean Box"),
    (b"name", "Metadata Name Box"),
    (b"sinf", "Protection Scheme Information Box"),
    (b"schm", "Scheme Type Box"),
    (b"schi", "Scheme Information Box"),
    (b"tenc", "Track Encryption Box"),
    (b"frma", "Original Format Box"),
    (b"avc1", "AVC Sample Entry"),
    (b"avc3", "AVC Sample Entry"),
    (b"hvc1", "HEVC Sample Entry"),
    (b"hev1", "HEVC Sample Entry"),
    (b"av01", "AV1 Sample Entry"),
    (b"vp08", "VP8 Sample Entry"),
    (b"vp09", "VP9 Sample Entry"),
    (b"mp4v", "MPEG-4 Visual Sample Entry"),
    (b"avcC", "AVC Configuration Box"),
    (b"hvcC", "HEVC Configuration Box"),
    (b"pasp", "Pixel Aspect Ratio Box"),
    (b"colr", "Colour Information Box"),
    (b"btrt", "Bit Rate Box"),
    (b"mp4a", "MPEG-4 Audio Sample Entry"),
    (b"esds", "Elementary Stream Descriptor Box"),
    (b"alac", "Apple Lossless Sample Entry"),
    (b"ac-3", "AC-3 Sample Entry"),
    (b"ec-3", "Enhanced AC-3 Sample Entry"),
    (b"Opus", "Opus Sample Entry"),
    (b"fLaC", "FLAC Sample Entry"),
    (b"cprt", "Copyright Box"),
    (b"chpl", "Chapter List Box"),
];

pub fn full_name(key: &BoxKey) -> Option<&'static str> {
    match key {
        BoxKey::Uuid(_) => Some("User Extension Box"),
        BoxKey::FourCC(cc) => NAMES.iter().find(|(k, _)| **k == cc.0).map(|(_, n)| *n),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_common_boxes() {
        assert_eq!(full_name(&BoxKey::cc(b"moov")), Some("Movie Box"));
        assert_eq!(full_name(&BoxKey::cc(b"stco")), Some("Chunk Offset Box"));
        assert_eq!(full_name(&BoxKey::cc(b"zzzz")), None);
    }
}
