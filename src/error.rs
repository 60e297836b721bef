//! Error taxonomy shared by every format family.

use thiserror::Error;

/// Errors produced while decoding, querying or writing back a node tree.
#[derive(Debug, Error)]
pub enum Error {
    /// An error from the underlying byte source or host file.
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    /// Fewer bytes are available than a header or field declares.
    #[error("truncated input at offset {offset}: needed {needed} bytes, {available} available")]
    TruncatedInput {
        offset: u64,
        needed: u64,
        available: u64,
    },

    /// A record declares a version the decoder set does not understand.
    #[error("unsupported {what} version {version}")]
    UnsupportedVersion { what: &'static str, version: u32 },

    /// A record uses a feature (compression, encryption, ...) that is not decoded.
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// A header is internally inconsistent (e.g. smaller than its own fixed width).
    #[error("invalid header at offset {offset}: {reason}")]
    InvalidHeader { offset: u64, reason: String },

    /// A string field could not be decoded or encoded.
    #[error("invalid text: {0}")]
    InvalidText(String),

    /// A wildcard pattern could not be compiled.
    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// A symbolic or query lookup matched nothing.
    #[error("not found: {0}")]
    NotFound(String),

    /// Write-back was requested on a tree that cannot be written.
    #[error("not writable: {0}")]
    NotWritable(String),

    /// A mutation or splice would produce an impossible file layout.
    #[error("invalid layout: {0}")]
    InvalidLayout(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn layout(msg: impl Into<String>) -> Self {
        Error::InvalidLayout(msg.into())
    }

    pub(crate) fn header(offset: u64, reason: impl Into<String>) -> Self {
        Error::InvalidHeader {
            offset,
            reason: reason.into(),
        }
    }
}
