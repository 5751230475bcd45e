// Decoder host interface
//
// The parsers never decode. For codecs handled by an external decoder they
// build a DelegateSetup and ask the host to initialize it; at the end of
// every successful parse the host is asked to bind the descriptor to its
// byte range.

use std::any::Any;
use std::fmt;

use base64::Engine;
use serde::{Serialize, Serializer};

use crate::descriptor::StreamDescriptor;
use crate::utils::io::ByteSource;

/// Failure reported by a decoder host
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("{family}: {reason}")]
pub struct CodecInitError {
    pub family: &'static str,
    pub reason: String,
}

impl CodecInitError {
    pub fn new(family: &'static str, reason: impl Into<String>) -> Self {
        CodecInitError { family, reason: reason.into() }
    }
}

fn serialize_base64<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&base64::engine::general_purpose::STANDARD.encode(bytes))
}

/// Configuration for a codec decoded outside the pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum DelegateSetup {
    /// XMA2 wrapped in a synthetic RIFF header
    Xma {
        #[serde(serialize_with = "serialize_base64")]
        header: Vec<u8>,
    },
    /// xWMA wrapped in a synthetic RIFF header
    Xwma {
        #[serde(serialize_with = "serialize_base64")]
        header: Vec<u8>,
    },
    /// FSB-framed MPEG; frames are padded to `fsb_padding` bytes
    Mpeg { fsb_padding: u32 },
    /// FSB Vorbis, codebooks selected by `setup_id`
    Vorbis { setup_id: u32, channels: u32, sample_rate: u32 },
    Atrac9 { config_data: u32, channels: u32 },
}

impl DelegateSetup {
    pub fn family(&self) -> &'static str {
        match self {
            DelegateSetup::Xma { .. } => "XMA2",
            DelegateSetup::Xwma { .. } => "xWMA",
            DelegateSetup::Mpeg { .. } => "MPEG",
            DelegateSetup::Vorbis { .. } => "Vorbis",
            DelegateSetup::Atrac9 { .. } => "ATRAC9",
        }
    }

    /// Synthetic container header to prepend to the stream bytes, if any
    pub fn wrapper_header(&self) -> Option<&[u8]> {
        match self {
            DelegateSetup::Xma { header } | DelegateSetup::Xwma { header } => Some(header),
            _ => None,
        }
    }
}

/// Opaque decoder state owned by the descriptor
pub struct DelegateHandle {
    family: &'static str,
    inner: Box<dyn Any + Send + Sync>,
}

impl DelegateHandle {
    pub fn new<T: Any + Send + Sync>(family: &'static str, inner: T) -> Self {
        DelegateHandle { family, inner: Box::new(inner) }
    }

    pub fn family(&self) -> &'static str {
        self.family
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }
}

impl fmt::Debug for DelegateHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DelegateHandle").field("family", &self.family).finish_non_exhaustive()
    }
}

/// External decoding pipeline the parsers hand off to
pub trait DecoderHost {
    /// Initialize a delegated decoder over `size` bytes at `start`
    fn init_delegate(
        &mut self,
        source: &dyn ByteSource,
        setup: &DelegateSetup,
        start: u64,
        size: u64,
    ) -> Result<DelegateHandle, CodecInitError>;

    /// Bind a finished descriptor to its byte range
    fn open_stream(
        &mut self,
        source: &dyn ByteSource,
        descriptor: &StreamDescriptor,
    ) -> Result<(), CodecInitError>;
}

/// Host for inspection only: records delegate setups without decoding and
/// checks that byte ranges are readable.
#[derive(Debug, Default)]
pub struct InspectHost;

impl DecoderHost for InspectHost {
    fn init_delegate(
        &mut self,
        source: &dyn ByteSource,
        setup: &DelegateSetup,
        start: u64,
        size: u64,
    ) -> Result<DelegateHandle, CodecInitError> {
        check_range(source, setup.family(), start, size)?;
        Ok(DelegateHandle::new(setup.family(), setup.clone()))
    }

    fn open_stream(
        &mut self,
        source: &dyn ByteSource,
        descriptor: &StreamDescriptor,
    ) -> Result<(), CodecInitError> {
        check_range(source, "stream", descriptor.start_offset, descriptor.stream_size)
    }
}

fn check_range(
    source: &dyn ByteSource,
    family: &'static str,
    start: u64,
    size: u64,
) -> Result<(), CodecInitError> {
    match start.checked_add(size) {
        Some(end) if end <= source.size() => Ok(()),
        _ => Err(CodecInitError::new(
            family,
            format!("range {start:#x}+{size:#x} beyond source size {:#x}", source.size()),
        )),
    }
}
