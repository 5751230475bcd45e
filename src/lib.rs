//! vgmeta - stream descriptors for game audio containers
//!
//! Parses FSB5 sound banks and SWAV waves into a [`StreamDescriptor`]: the
//! channel layout, sample counts, loop points, byte range and codec setup a
//! decoding pipeline needs to play one subsong. Nothing here decodes audio.

use std::fmt;

use serde::Serialize;

pub mod descriptor;
pub mod error;
pub mod fsb5;
pub mod host;
pub mod riff;
pub mod swav;
pub mod utils;

pub use descriptor::{ChannelState, CodecConfig, Coding, Layout, StreamDescriptor};
pub use error::{ParseError, Result};
pub use host::{CodecInitError, DecoderHost, DelegateHandle, DelegateSetup, InspectHost};
pub use utils::io::{ByteSource, FileSource, MemorySource};

/// Supported container formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerFormat {
    Fsb5,
    Swav,
}

impl ContainerFormat {
    /// Probe order used by [`open_with`]
    pub const ALL: [ContainerFormat; 2] = [ContainerFormat::Fsb5, ContainerFormat::Swav];

    pub fn name(&self) -> &'static str {
        match self {
            ContainerFormat::Fsb5 => "FSB5",
            ContainerFormat::Swav => "SWAV",
        }
    }

    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            ContainerFormat::Fsb5 => fsb5::FSB5_EXTENSIONS,
            ContainerFormat::Swav => swav::SWAV_EXTENSIONS,
        }
    }

    /// Open with this format's parser only
    pub fn open(
        &self,
        source: &dyn ByteSource,
        options: &OpenOptions,
        host: &mut dyn DecoderHost,
    ) -> Result<StreamDescriptor> {
        match self {
            ContainerFormat::Fsb5 => fsb5::open(source, options, host),
            ContainerFormat::Swav => swav::open(source, options, host),
        }
    }

    /// Magic bytes only, no extension or size checks
    pub fn probe(&self, source: &dyn ByteSource) -> bool {
        match self {
            ContainerFormat::Fsb5 => source.check_signature(0x00, fsb5::FSB5_MAGIC),
            ContainerFormat::Swav => {
                source.check_signature(0x00, swav::SWAV_MAGIC) && source.check_signature(0x10, swav::SWAV_DATA_TAG)
            }
        }
    }

    /// Run the container validator without walking any subsong
    pub fn validate(&self, source: &dyn ByteSource, check_extension: bool) -> Result<()> {
        match self {
            ContainerFormat::Fsb5 => fsb5::ContainerHeader::read(source, check_extension).map(|_| ()),
            ContainerFormat::Swav => swav::SwavHeader::read(source, check_extension).map(|_| ()),
        }
    }
}

impl fmt::Display for ContainerFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Options for opening a stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenOptions {
    /// 1-based subsong index; 0 selects the first subsong
    pub subsong: u32,
    /// Reject files whose extension doesn't belong to the format
    pub check_extension: bool,
}

impl Default for OpenOptions {
    fn default() -> Self {
        OpenOptions { subsong: 0, check_extension: true }
    }
}

impl OpenOptions {
    pub fn subsong(mut self, subsong: u32) -> Self {
        self.subsong = subsong;
        self
    }

    pub fn check_extension(mut self, check: bool) -> Self {
        self.check_extension = check;
        self
    }
}

/// Open one subsong with the inspection host
pub fn open(source: &dyn ByteSource, subsong: u32) -> Result<StreamDescriptor> {
    open_with(source, &OpenOptions::default().subsong(subsong), &mut InspectHost)
}

/// Try each format in turn. A format mismatch moves on to the next parser;
/// any other error means the format matched and the file is bad.
pub fn open_with(
    source: &dyn ByteSource,
    options: &OpenOptions,
    host: &mut dyn DecoderHost,
) -> Result<StreamDescriptor> {
    for format in ContainerFormat::ALL {
        match format.open(source, options, host) {
            Err(err) if err.is_format_mismatch() => {
                tracing::trace!("{} rejected {:?}", format, source.file_name());
                continue;
            }
            result => return result,
        }
    }
    Err(ParseError::FormatMismatch("any supported format"))
}

/// First format whose validator accepts the source
pub fn detect(source: &dyn ByteSource) -> Option<ContainerFormat> {
    ContainerFormat::ALL
        .into_iter()
        .find(|format| format.validate(source, true).is_ok())
}

/// Number of subsongs in the container. The FSB5 count must fit in the
/// sample header region.
pub fn count_subsongs(source: &dyn ByteSource, check_extension: bool) -> Result<u32> {
    match fsb5::ContainerHeader::read(source, check_extension) {
        Ok(header) => return header.subsong_count(),
        Err(err) if err.is_format_mismatch() => {}
        Err(err) => return Err(err),
    }
    swav::SwavHeader::read(source, check_extension).map(|_| 1)
}
