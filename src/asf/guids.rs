//! Object identifiers of the ASF top-level, header and extension objects.

use crate::ids::Guid;

const fn g(d1: u32, d2: u16, d3: u16, d4: [u8; 8]) -> Guid {
    Guid::from_fields(d1, d2, d3, d4)
}

pub const HEADER: Guid = g(0x75B22630, 0x668E, 0x11CF, [0xA6, 0xD9, 0x00, 0xAA, 0x00, 0x62, 0xCE, 0x6C]);
pub const DATA: Guid = g(0x75B22636, 0x668E, 0x11CF, [0xA6, 0xD9, 0x00, 0xAA, 0x00, 0x62, 0xCE, 0x6C]);
pub const SIMPLE_INDEX: Guid = g(0x33000890, 0xE5B1, 0x11CF, [0x89, 0xF4, 0x00, 0xA0, 0xC9, 0x03, 0x49, 0xCB]);
pub const INDEX: Guid = g(0xD6E229D3, 0x35DA, 0x11D1, [0x90, 0x34, 0x00, 0xA0, 0xC9, 0x03, 0x49, 0xBE]);

pub const FILE_PROPERTIES: Guid = g(0x8CABDCA1, 0xA947, 0x11CF, [0x8E, 0xE4, 0x00, 0xC0, 0x0C, 0x20, 0x53, 0x65]);
pub const STREAM_PROPERTIES: Guid = g(0xB7DC0791, 0xA9B7, 0x11CF, [0x8E, 0xE6, 0x00, 0xC0, 0x0C, 0x20, 0x53, 0x65]);
pub const HEADER_EXTENSION: Guid = g(0x5FBF03B5, 0xA92E, 0x11CF, [0x8E, 0xE3, 0x00, 0xC0, 0x0C, 0x20, 0x53, 0x65]);
pub const CODEC_LIST: Guid = g(0x86D15240, 0x311D, 0x11D0, [0xA3, 0xA4, 0x00, 0xA0, 0xC9, 0x03, 0x48, 0xF6]);
pub const CONTENT_DESCRIPTION: Guid = g(0x75B22633, 0x668E, 0x11CF, [0xA6, 0xD9, 0x00, 0xAA, 0x00, 0x62, 0xCE, 0x6C]);
pub const EXTENDED_CONTENT_DESCRIPTION: Guid =
    g(0xD2D0A440, 0xE307, 0x11D2, [0x97, 0xF0, 0x00, 0xA0, 0xC9, 0x5E, 0xA8, 0x50]);
pub const STREAM_BITRATE_PROPERTIES: Guid =
    g(0x7BF875CE, 0x468D, 0x11D1, [0x8D, 0x82, 0x00, 0x60, 0x97, 0xC9, 0xA2, 0xB2]);
pub const PADDING: Guid = g(0x1806D474, 0xCADF, 0x4509, [0xA4, 0xBA, 0x9A, 0xAB, 0xCB, 0x96, 0xAA, 0xE8]);

pub const METADATA: Guid = g(0xC5F8CBEA, 0x5BAF, 0x4877, [0x84, 0x67, 0xAA, 0x8C, 0x44, 0xFA, 0x4C, 0xCA]);
pub const METADATA_LIBRARY: Guid = g(0x44231C94, 0x9498, 0x49D1, [0xA1, 0x41, 0x1D, 0x13, 0x4E, 0x45, 0x70, 0x54]);
pub const LANGUAGE_LIST: Guid = g(0x7C4346A9, 0xEFE0, 0x4BFC, [0xB2, 0x29, 0x39, 0x3E, 0xDE, 0x41, 0x5C, 0x85]);
pub const STREAM_PRIORITIZATION: Guid =
    g(0xD4FED15B, 0x88D3, 0x454F, [0x81, 0xF0, 0xED, 0x5C, 0x45, 0x99, 0x9E, 0x24]);
pub const EXTENDED_STREAM_PROPERTIES: Guid =
    g(0x14E6A5CB, 0xC672, 0x4332, [0x83, 0x99, 0xA9, 0x69, 0x52, 0x06, 0x5B, 0x5A]);

/// Value of the first reserved field of the header extension object.
pub const RESERVED_1: Guid = g(0xABD3D211, 0xA9BA, 0x11CF, [0x8E, 0xE6, 0x00, 0xC0, 0x0C, 0x20, 0x53, 0x65]);

pub const AUDIO_MEDIA: Guid = g(0xF8699E40, 0x5B4D, 0x11CF, [0xA8, 0xFD, 0x00, 0x80, 0x5F, 0x5C, 0x44, 0x2B]);
pub const VIDEO_MEDIA: Guid = g(0xBC19EFC0, 0x5B4D, 0x11CF, [0xA8, 0xFD, 0x00, 0x80, 0x5F, 0x5C, 0x44, 0x2B]);

const NAMES: &[(Guid, &str)] = &[
    (HEADER, "Header Object"),
    (DATA, "Data Object"),
    (SIMPLE_INDEX, "Simple Index Object"),
    (INDEX, "Index Object"),
    (FILE_PROPERTIES, "File Properties Object"),
    (STREAM_PROPERTIES, "Stream Properties Object"),
    (HEADER_EXTENSION, "Header Extension Object"),
    (CODEC_LIST, "Codec List Object"),
    (CONTENT_DESCRIPTION, "Content Description Object"),
    (EXTENDED_CONTENT_DESCRIPTION, "Extended Content Description Object"),
    (STREAM_BITRATE_PROPERTIES, "Stream Bitrate Properties Object"),
    (PADDING, "Padding Object"),
    (METADATA, "Metadata Object"),
    (METADATA_LIBRARY, "Metadata Library Object"),
    (LANGUAGE_LIST, "Language List Object"),
    (STREAM_PRIORITIZATION, "Stream Prioritization Object"),
    (EXTENDED_STREAM_PROPERTIES, "Extended Stream Properties Object"),
];

pub fn name_of(guid: &Guid) -> Option<&'static str> {
    NAMES.iter().find(|(g, _)| g == guid).map(|(_, n)| *n)
}
