// FSB5 subsong header walker
//
// Each subsong header is two little-endian words ("sample mode") followed
// by an optional chain of extra-flag entries:
//
//   word1: bits 31..7 data offset (low 25 bits, in 32-byte units)
//          bits  6..5 channel class
//          bits  4..1 sample rate class
//          bit      0 extra flags follow
//   word2: bits 31..2 sample count
//          bits  1..0 data offset (high 2 bits)
//
//   extra flag entry: bits 31..25 type, bits 24..1 payload size, bit 0 more
//
// Headers are variable-sized, so subsong N is only reachable by walking
// 1..N-1 first.

use tracing::{debug, warn};

use crate::error::{ParseError, Result};
use crate::fsb5::header::ContainerHeader;
use crate::utils::io::ByteSource;

const SAMPLE_RATES: [u32; 11] = [
    4000, 8000, 11000, 11025, 16000, 22050, 24000, 32000, 44100, 48000, 96000,
];
const CHANNEL_COUNTS: [u32; 4] = [1, 2, 6, 8];

/// Samples in the subsong, bits 31..2 of word2
pub fn sample_count(word2: u32) -> u32 {
    (word2 >> 2) & 0x3FFF_FFFF
}

/// Offset of the subsong inside the sample data region. The two low bits
/// of word2 sit above the 25 bits from word1 and the result counts 32-byte
/// units.
pub fn data_start(word1: u32, word2: u32) -> u64 {
    let units = (((word2 & 0x03) as u64) << 25) | ((word1 >> 7) & 0x01FF_FFFF) as u64;
    units << 5
}

/// Raw channel class, bits 6..5 of word1
pub fn channel_class(word1: u32) -> u32 {
    (word1 >> 5) & 0x03
}

/// Raw sample rate class, bits 4..1 of word1
pub fn sample_rate_class(word1: u32) -> u32 {
    (word1 >> 1) & 0x0F
}

pub fn has_extra_flags(word1: u32) -> bool {
    word1 & 0x01 != 0
}

/// Channel count for a class; counts outside the table use class 0 plus
/// a channel override flag
pub fn channels_for_class(class: u32) -> Option<u32> {
    CHANNEL_COUNTS.get(class as usize).copied()
}

/// Sample rate for a class; classes 11-15 are reserved
pub fn sample_rate_for_class(class: u32) -> Option<u32> {
    SAMPLE_RATES.get(class as usize).copied()
}

/// Extra flag entry type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtraFlagKind {
    Channels,
    SampleRate,
    Loop,
    Comment,
    XmaSeekTable,
    DspCoefs,
    Atrac9Config,
    XwmaConfig,
    VorbisSetup,
    Unknown(u8),
}

impl ExtraFlagKind {
    pub fn from_type(value: u8) -> Self {
        match value {
            0x01 => ExtraFlagKind::Channels,
            0x02 => ExtraFlagKind::SampleRate,
            0x03 => ExtraFlagKind::Loop,
            0x04 => ExtraFlagKind::Comment,
            0x06 => ExtraFlagKind::XmaSeekTable,
            0x07 => ExtraFlagKind::DspCoefs,
            0x09 => ExtraFlagKind::Atrac9Config,
            0x0A => ExtraFlagKind::XwmaConfig,
            0x0B => ExtraFlagKind::VorbisSetup,
            other => ExtraFlagKind::Unknown(other),
        }
    }

    /// Payload is codec configuration consumed by the codec resolver
    pub fn is_codec_setup(&self) -> bool {
        matches!(
            self,
            ExtraFlagKind::DspCoefs
                | ExtraFlagKind::Atrac9Config
                | ExtraFlagKind::XwmaConfig
                | ExtraFlagKind::VorbisSetup
        )
    }
}

/// One decoded extra flag entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtraFlag {
    pub kind: ExtraFlagKind,
    /// Offset of the entry word; the payload follows it
    pub offset: u64,
    pub size: u32,
    pub more: bool,
}

impl ExtraFlag {
    pub fn decode(offset: u64, word: u32) -> Self {
        ExtraFlag {
            kind: ExtraFlagKind::from_type(((word >> 25) & 0x7F) as u8),
            offset,
            size: (word >> 1) & 0x00FF_FFFF,
            more: word & 0x01 != 0,
        }
    }

    pub fn payload_offset(&self) -> u64 {
        self.offset + 0x04
    }

    /// Bytes taken by the entry word plus its payload
    pub fn total_size(&self) -> u64 {
        0x04 + self.size as u64
    }
}

/// Iterator over an extra flag chain. Entries must stay inside the sample
/// header region; a chain that runs past it yields MalformedHeader once.
pub struct ExtraFlags<'a> {
    source: &'a dyn ByteSource,
    cursor: u64,
    limit: u64,
    done: bool,
}

impl<'a> ExtraFlags<'a> {
    pub fn new(source: &'a dyn ByteSource, start: u64, limit: u64) -> Self {
        ExtraFlags { source, cursor: start, limit, done: false }
    }

    fn next_entry(&mut self) -> Result<ExtraFlag> {
        if self.cursor + 0x04 > self.limit {
            return Err(ParseError::malformed(format!(
                "extra flag chain runs past sample headers at {:#x}",
                self.cursor
            )));
        }
        let flag = ExtraFlag::decode(self.cursor, self.source.read_u32_le(self.cursor)?);
        if flag.offset + flag.total_size() > self.limit {
            return Err(ParseError::malformed(format!(
                "extra flag at {:#x} (size {:#x}) runs past sample headers",
                flag.offset, flag.size
            )));
        }
        self.cursor += flag.total_size();
        Ok(flag)
    }
}

impl Iterator for ExtraFlags<'_> {
    type Item = Result<ExtraFlag>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let entry = self.next_entry();
        match &entry {
            Ok(flag) => self.done = !flag.more,
            Err(_) => self.done = true,
        }
        Some(entry)
    }
}

/// Codec setup payload captured from the extra flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetupBlob {
    pub kind: ExtraFlagKind,
    pub offset: u64,
    pub size: u32,
}

/// Decoded subsong header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubsongRecord {
    pub num_samples: u32,
    /// Offset inside the sample data region
    pub data_start: u64,
    pub channels: u32,
    pub sample_rate: u32,
    pub loop_flag: bool,
    pub loop_start: u32,
    pub loop_end: u32,
    pub setup: Option<SetupBlob>,
    /// Fixed words plus the whole extra flag chain
    pub header_size: u64,
}

impl SubsongRecord {
    /// Decode the record at `offset`; `limit` is the end of the sample
    /// header region
    pub fn read(source: &dyn ByteSource, offset: u64, limit: u64) -> Result<Self> {
        if offset + 0x08 > limit {
            return Err(ParseError::malformed(format!("subsong header at {offset:#x} past sample headers")));
        }
        let word1 = source.read_u32_le(offset)?;
        let word2 = source.read_u32_le(offset + 0x04)?;

        let channels = channels_for_class(channel_class(word1)).ok_or_else(|| {
            ParseError::malformed(format!("channel class {} at {offset:#x}", channel_class(word1)))
        })?;
        let sample_rate = sample_rate_for_class(sample_rate_class(word1)).ok_or_else(|| {
            ParseError::malformed(format!("reserved sample rate class {} at {offset:#x}", sample_rate_class(word1)))
        })?;

        let mut record = SubsongRecord {
            num_samples: sample_count(word2),
            data_start: data_start(word1, word2),
            channels,
            sample_rate,
            loop_flag: false,
            loop_start: 0,
            loop_end: 0,
            setup: None,
            header_size: 0x08,
        };

        if has_extra_flags(word1) {
            for flag in ExtraFlags::new(source, offset + 0x08, limit) {
                let flag = flag?;
                record.apply(source, &flag)?;
                record.header_size += flag.total_size();
            }
        }

        Ok(record)
    }

    fn apply(&mut self, source: &dyn ByteSource, flag: &ExtraFlag) -> Result<()> {
        let payload = flag.payload_offset();
        match flag.kind {
            ExtraFlagKind::Channels => {
                self.channels = source.read_u8(payload)? as u32;
            }
            ExtraFlagKind::SampleRate => {
                self.sample_rate = source.read_u32_le(payload)?;
            }
            ExtraFlagKind::Loop => {
                self.loop_start = source.read_u32_le(payload)?;
                if flag.size > 0x04 {
                    self.loop_end = source.read_u32_le(payload + 0x04)?;
                }
                // start 0 means "replay from the top", not a real loop
                self.loop_flag = self.loop_start != 0;
            }
            ExtraFlagKind::Comment | ExtraFlagKind::XmaSeekTable => {}
            kind if kind.is_codec_setup() => {
                self.setup = Some(SetupBlob { kind, offset: payload, size: flag.size });
            }
            kind => {
                warn!(
                    "FSB5: unknown extra flag {:?} at {:#x} (size {:#x})",
                    kind, flag.offset, flag.size
                );
            }
        }
        Ok(())
    }
}

/// Target subsong with its absolute byte range
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedSubsong {
    pub index: u32,
    pub record: SubsongRecord,
    pub start_offset: u64,
    pub stream_size: u64,
}

/// Walk subsong headers up to `target` (1-based, already range-checked)
pub fn locate(source: &dyn ByteSource, header: &ContainerHeader, target: u32) -> Result<LocatedSubsong> {
    let limit = header.sample_header_end();
    let total = header.total_subsongs.max(0) as u32;
    let mut cursor = header.sample_header_start();

    for index in 1..=total {
        let record = SubsongRecord::read(source, cursor, limit)?;
        debug!(
            "FSB5: subsong {} at {:#x}: header {:#x} bytes, data +{:#x}",
            index, cursor, record.header_size, record.data_start
        );

        if index != target {
            cursor += record.header_size;
            continue;
        }

        let stream_end = if index == total {
            header.sample_data_size as u64
        } else {
            let next = cursor + record.header_size;
            if next + 0x08 > limit {
                return Err(ParseError::malformed(format!("subsong {} header past sample headers", index + 1)));
            }
            data_start(source.read_u32_le(next)?, source.read_u32_le(next + 0x04)?)
        };

        let stream_size = stream_end
            .checked_sub(record.data_start)
            .filter(|&size| size > 0)
            .ok_or_else(|| {
                ParseError::malformed(format!(
                    "subsong {index} has no data (start {:#x}, end {stream_end:#x})",
                    record.data_start
                ))
            })?;
        let start_offset = header.data_start() + record.data_start;

        return Ok(LocatedSubsong { index, record, start_offset, stream_size });
    }

    Err(ParseError::malformed(format!("subsong {target} not found")))
}

/// Absolute offset of the subsong's name, from the name table's offset
/// array. None when the bank has no name table or the entry points outside it.
pub fn name_offset(source: &dyn ByteSource, header: &ContainerHeader, index: u32) -> Result<Option<u64>> {
    if header.name_table_size == 0 {
        return Ok(None);
    }
    let table = header.name_table_start();
    let table_end = table + header.name_table_size as u64;
    let entry = table + 0x04 * (index as u64 - 1);
    if entry + 0x04 > table_end {
        warn!("FSB5: name table has no entry for subsong {}", index);
        return Ok(None);
    }

    let offset = table + source.read_u32_le(entry)? as u64;
    if offset >= table_end {
        warn!("FSB5: name for subsong {} points outside the name table", index);
        return Ok(None);
    }
    Ok(Some(offset))
}
