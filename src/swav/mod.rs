// SWAV (Nintendo DS SDK wave) support
//
// SWAV File Structure (little-endian):
// - 0x00: "SWAV"
// - 0x08: file size (as written for one channel)
// - 0x10: "DATA"
// - 0x14: data block size (0x14 bytes of block header included)
// - 0x18: codec number (0 = PCM8, 1 = PCM16, 2 = IMA ADPCM)
// - 0x19: loop flag
// - 0x1A: sample rate (u16)
// - 0x1E: loop start, in 32-bit words (u16)
// - 0x20: loop length, in 32-bit words (u32)
// - 0x24: sample data
//
// Stereo files are two mono files' worth of data interleaved byte by byte,
// which is only visible through the file size. IMA data starts with a
// 4-byte state block per channel (history, step index).

use tracing::debug;

use crate::descriptor::{CodecConfig, Coding, Layout, StreamDescriptor};
use crate::error::{ParseError, Result};
use crate::host::DecoderHost;
use crate::utils::io::ByteSource;
use crate::{ContainerFormat, OpenOptions};

pub const SWAV_MAGIC: &[u8; 4] = b"SWAV";
pub const SWAV_DATA_TAG: &[u8; 4] = b"DATA";
/// `.adpcm` is used by some games for the same format
pub const SWAV_EXTENSIONS: &[&str] = &["swav", "adpcm"];

const HEADER_SIZE: u64 = 0x24;
const IMA_STATE_SIZE: u64 = 0x04;

/// SWAV codec numbers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwavCodec {
    Pcm8,
    Pcm16,
    ImaAdpcm,
}

impl SwavCodec {
    pub fn from_number(value: u8) -> Option<Self> {
        match value {
            0 => Some(SwavCodec::Pcm8),
            1 => Some(SwavCodec::Pcm16),
            2 => Some(SwavCodec::ImaAdpcm),
            _ => None,
        }
    }

    pub fn bits_per_sample(&self) -> u32 {
        match self {
            SwavCodec::Pcm8 => 8,
            SwavCodec::Pcm16 => 16,
            SwavCodec::ImaAdpcm => 4,
        }
    }

    fn coding(&self) -> Coding {
        match self {
            SwavCodec::Pcm8 => Coding::Pcm8,
            SwavCodec::Pcm16 => Coding::Pcm16Le,
            SwavCodec::ImaAdpcm => Coding::ImaInterleaved,
        }
    }

    /// Samples in one 32-bit word
    fn samples_per_word(&self) -> u32 {
        32 / self.bits_per_sample()
    }
}

/// Fixed header fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwavHeader {
    pub codec_number: u8,
    pub loop_flag: bool,
    pub channels: u32,
    pub data_size: i32,
    pub sample_rate: u16,
    pub loop_start_words: u16,
    pub loop_length_words: i32,
}

impl SwavHeader {
    /// Validate the container and read the fixed header
    pub fn read(source: &dyn ByteSource, check_extension: bool) -> Result<Self> {
        if check_extension && !source.check_extensions(SWAV_EXTENSIONS) {
            return Err(ParseError::FormatMismatch("SWAV"));
        }
        if !source.check_signature(0x00, SWAV_MAGIC) || !source.check_signature(0x10, SWAV_DATA_TAG) {
            return Err(ParseError::FormatMismatch("SWAV"));
        }

        let declared = source.read_i32_le(0x08)? as i64;
        let file_size = source.size() as i64;
        let channels = if file_size == declared {
            1
        } else if file_size == (declared - HEADER_SIZE as i64) * 2 + HEADER_SIZE as i64 {
            2
        } else {
            return Err(ParseError::FormatMismatch("SWAV"));
        };

        Ok(SwavHeader {
            codec_number: source.read_u8(0x18)?,
            loop_flag: source.read_u8(0x19)? != 0,
            channels,
            data_size: source.read_i32_le(0x14)?,
            sample_rate: source.read_u16_le(0x1A)?,
            loop_start_words: source.read_u16_le(0x1E)?,
            loop_length_words: source.read_i32_le(0x20)?,
        })
    }
}

fn sample_value(value: i64, what: &str) -> Result<u32> {
    u32::try_from(value).map_err(|_| ParseError::malformed(format!("SWAV {what} out of range ({value})")))
}

/// Open an SWAV file; it has exactly one subsong
pub fn open(source: &dyn ByteSource, options: &OpenOptions, host: &mut dyn DecoderHost) -> Result<StreamDescriptor> {
    let header = SwavHeader::read(source, options.check_extension)?;
    if options.subsong > 1 {
        return Err(ParseError::SubsongOutOfRange { requested: options.subsong, total: 1 });
    }
    let codec = SwavCodec::from_number(header.codec_number).ok_or(ParseError::UnsupportedCodec {
        codec: header.codec_number as u32,
        known: false,
    })?;
    debug!("SWAV: {:?}, {} channel(s), loop {}", codec, header.channels, header.loop_flag);

    let bits = codec.bits_per_sample() as i64;
    let mut num_samples = (header.data_size as i64 - 0x14) * 8 / bits;
    let (mut loop_start, mut loop_end) = (0i64, 0i64);
    if header.loop_flag {
        loop_start = header.loop_start_words as i64 * 32 / bits;
        loop_end = header.loop_length_words as i64 * 32 / bits + loop_start;
    }

    let mut descriptor = StreamDescriptor::allocate(ContainerFormat::Swav, header.channels, header.loop_flag)
        .ok_or_else(|| ParseError::malformed("SWAV with no channels"))?;
    let mut start_offset = HEADER_SIZE;

    if codec == SwavCodec::ImaAdpcm {
        // the state block takes one word of each channel's data
        let frame = codec.samples_per_word() as i64;
        num_samples -= frame;
        if header.loop_flag {
            loop_start -= frame;
            loop_end -= frame;
        }

        for (ch, state) in descriptor.channel_state.iter_mut().enumerate() {
            let base = start_offset + IMA_STATE_SIZE * ch as u64;
            state.adpcm_history = source.read_i16_le(base)? as i32;
            state.adpcm_step_index = source.read_i16_le(base + 0x02)? as i32;
        }
        start_offset += IMA_STATE_SIZE * header.channels as u64;
    }

    descriptor.sample_rate = header.sample_rate as u32;
    descriptor.num_samples = sample_value(num_samples, "sample count")?;
    descriptor.loop_start = sample_value(loop_start, "loop start")?;
    descriptor.loop_end = sample_value(loop_end, "loop end")?;
    descriptor.start_offset = start_offset;
    descriptor.stream_size = source.size().saturating_sub(start_offset);
    let layout = if header.channels == 2 {
        Layout::Interleave { block_size: 1 }
    } else {
        Layout::None
    };
    descriptor.codec = CodecConfig::native(codec.coding(), layout);

    host.open_stream(source, &descriptor)?;
    Ok(descriptor)
}
