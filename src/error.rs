// Error types for container parsing
//
// FormatMismatch is the only "soft" failure: it tells the dispatch layer to
// try the next registered format. Everything else ends the open attempt.

use crate::host::CodecInitError;

/// Error returned by every `open` entry point
#[derive(thiserror::Error, Debug)]
pub enum ParseError {
    /// Magic, extension, secondary tag or size formula did not match
    #[error("not a {0} container")]
    FormatMismatch(&'static str),

    /// Container version/type tag outside the accepted set
    #[error("unsupported container version {0:#x}")]
    UnsupportedVersion(u32),

    /// Requested subsong does not exist
    #[error("subsong {requested} out of range (container has {total})")]
    SubsongOutOfRange { requested: u32, total: i32 },

    /// Internal inconsistency in the container headers
    #[error("malformed header: {0}")]
    MalformedHeader(String),

    /// Codec id that cannot be decoded; `known` separates ids that are
    /// recognized but have no decoder from ids never seen before
    #[error("unsupported codec {codec:#x}{}", known_suffix(.known))]
    UnsupportedCodec { codec: u32, known: bool },

    /// Failure reported by the decoder host
    #[error("codec initialization failed: {0}")]
    CodecInit(#[from] CodecInitError),

    /// Read error from the byte source
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ParseError {
    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        ParseError::MalformedHeader(msg.into())
    }

    /// True when the dispatch layer should try another format
    pub fn is_format_mismatch(&self) -> bool {
        matches!(self, ParseError::FormatMismatch(_))
    }
}

fn known_suffix(known: &bool) -> &'static str {
    if *known {
        " (recognized, no decoder)"
    } else {
        ""
    }
}

/// Result type for parsing operations
pub type Result<T> = std::result::Result<T, ParseError>;
