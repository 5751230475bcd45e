// FSB5 codec resolution
//
// The bank-wide codec id picks one policy per codec family. Parameters
// that depend on the subsong (interleave size, setup blob, synthetic
// wrapper headers) are derived next to the variant that needs them.

use tracing::warn;

use crate::descriptor::{CodecConfig, Coding, Layout};
use crate::error::{ParseError, Result};
use crate::fsb5::walker::SetupBlob;
use crate::host::DelegateSetup;
use crate::riff::{make_riff_xma2, make_riff_xwma, Xma2Params, XwmaParams};
use crate::utils::io::ByteSource;

/// Flags bit 0: 16-bit PCM is big-endian
pub const FLAG_PCM_BIG_ENDIAN: u32 = 0x01;
/// Flags bit 1: channels stored one after another instead of interleaved
pub const FLAG_NON_INTERLEAVED: u32 = 0x02;

const XMA_BLOCK_SIZE: u64 = 0x8000;
const DSP_COEF_SPACING: u64 = 0x2E;

/// FMOD sound formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsbCodec {
    None,
    Pcm8,
    Pcm16,
    Pcm24,
    Pcm32,
    PcmFloat,
    GcAdpcm,
    ImaAdpcm,
    Vag,
    Hevag,
    Xma,
    Mpeg,
    Celt,
    Atrac9,
    Xwma,
    Vorbis,
    Fadpcm,
}

impl FsbCodec {
    const TABLE: [FsbCodec; 17] = [
        FsbCodec::None,
        FsbCodec::Pcm8,
        FsbCodec::Pcm16,
        FsbCodec::Pcm24,
        FsbCodec::Pcm32,
        FsbCodec::PcmFloat,
        FsbCodec::GcAdpcm,
        FsbCodec::ImaAdpcm,
        FsbCodec::Vag,
        FsbCodec::Hevag,
        FsbCodec::Xma,
        FsbCodec::Mpeg,
        FsbCodec::Celt,
        FsbCodec::Atrac9,
        FsbCodec::Xwma,
        FsbCodec::Vorbis,
        FsbCodec::Fadpcm,
    ];

    pub fn from_id(id: u32) -> Option<Self> {
        Self::TABLE.get(id as usize).copied()
    }

    pub fn name(&self) -> &'static str {
        match self {
            FsbCodec::None => "NONE",
            FsbCodec::Pcm8 => "PCM8",
            FsbCodec::Pcm16 => "PCM16",
            FsbCodec::Pcm24 => "PCM24",
            FsbCodec::Pcm32 => "PCM32",
            FsbCodec::PcmFloat => "PCMFLOAT",
            FsbCodec::GcAdpcm => "GCADPCM",
            FsbCodec::ImaAdpcm => "IMAADPCM",
            FsbCodec::Vag => "VAG",
            FsbCodec::Hevag => "HEVAG",
            FsbCodec::Xma => "XMA",
            FsbCodec::Mpeg => "MPEG",
            FsbCodec::Celt => "CELT",
            FsbCodec::Atrac9 => "AT9",
            FsbCodec::Xwma => "XWMA",
            FsbCodec::Vorbis => "VORBIS",
            FsbCodec::Fadpcm => "FADPCM",
        }
    }
}

/// Everything the resolver needs about the target subsong
#[derive(Debug, Clone, Copy)]
pub struct CodecContext {
    pub codec_id: u32,
    pub flags: u32,
    pub channels: u32,
    pub sample_rate: u32,
    pub num_samples: u32,
    pub stream_size: u64,
    pub setup: Option<SetupBlob>,
}

/// Decode configuration plus per-channel DSP tables when the codec has them
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedCodec {
    pub config: CodecConfig,
    pub dsp_coefs: Option<Vec<[i16; 16]>>,
}

impl From<CodecConfig> for ResolvedCodec {
    fn from(config: CodecConfig) -> Self {
        ResolvedCodec { config, dsp_coefs: None }
    }
}

impl CodecContext {
    fn setup_blob(&self, codec: FsbCodec) -> Result<SetupBlob> {
        self.setup.ok_or_else(|| {
            ParseError::malformed(format!("{} subsong without codec setup flag", codec.name()))
        })
    }

    /// Stream size for a 32-bit RIFF data chunk
    fn riff_data_size(&self, codec: FsbCodec) -> Result<u32> {
        u32::try_from(self.stream_size).map_err(|_| {
            ParseError::malformed(format!("{} stream of {:#x} bytes", codec.name(), self.stream_size))
        })
    }

    /// Split channels into blocks of their own: stream size / channels
    fn per_channel_block(&self) -> u64 {
        self.stream_size / self.channels.max(1) as u64
    }
}

fn unsupported(codec: FsbCodec, id: u32) -> ParseError {
    warn!("FSB5: {} codec found, no decoder available", codec.name());
    ParseError::UnsupportedCodec { codec: id, known: true }
}

/// Map the bank codec id to a decode configuration
pub fn resolve(source: &dyn ByteSource, ctx: &CodecContext) -> Result<ResolvedCodec> {
    let Some(codec) = FsbCodec::from_id(ctx.codec_id) else {
        warn!("FSB5: unknown codec {:#x}", ctx.codec_id);
        return Err(ParseError::UnsupportedCodec { codec: ctx.codec_id, known: false });
    };
    let non_interleaved = ctx.flags & FLAG_NON_INTERLEAVED != 0;

    let resolved: ResolvedCodec = match codec {
        FsbCodec::None | FsbCodec::Pcm24 | FsbCodec::Pcm32 | FsbCodec::Celt => {
            return Err(unsupported(codec, ctx.codec_id));
        }

        FsbCodec::Pcm8 => {
            CodecConfig::native(Coding::Pcm8Unsigned, Layout::for_channels(ctx.channels, 0x01)).into()
        }
        FsbCodec::Pcm16 => {
            let coding = if ctx.flags & FLAG_PCM_BIG_ENDIAN != 0 {
                Coding::Pcm16Be
            } else {
                Coding::Pcm16Le
            };
            CodecConfig::native(coding, Layout::for_channels(ctx.channels, 0x02)).into()
        }
        FsbCodec::PcmFloat => {
            CodecConfig::native(Coding::PcmFloat, Layout::for_channels(ctx.channels, 0x04)).into()
        }

        FsbCodec::GcAdpcm => {
            let config = if non_interleaved {
                CodecConfig::native(
                    Coding::NgcDsp,
                    Layout::Interleave { block_size: ctx.per_channel_block() },
                )
            } else {
                CodecConfig::native(Coding::NgcDspSubint, Layout::None)
            };
            let blob = ctx.setup_blob(codec)?;
            ResolvedCodec {
                config,
                dsp_coefs: Some(read_dsp_coefs(source, blob.offset, ctx.channels)?),
            }
        }

        FsbCodec::ImaAdpcm => {
            let coding = if ctx.channels > 2 { Coding::FsbIma } else { Coding::XboxIma };
            CodecConfig::native(coding, Layout::None).into()
        }
        FsbCodec::Vag => {
            let block_size = if non_interleaved { ctx.per_channel_block() } else { 0x10 };
            CodecConfig::native(Coding::Psx, Layout::Interleave { block_size }).into()
        }
        FsbCodec::Hevag => {
            CodecConfig::native(Coding::Hevag, Layout::Interleave { block_size: 0x10 }).into()
        }
        FsbCodec::Fadpcm => {
            CodecConfig::native(Coding::Fadpcm, Layout::Interleave { block_size: 0x8C }).into()
        }

        FsbCodec::Xma => {
            let block_count = u16::try_from(ctx.stream_size.div_ceil(XMA_BLOCK_SIZE)).map_err(|_| {
                ParseError::malformed(format!("XMA stream of {:#x} bytes has too many blocks", ctx.stream_size))
            })?;
            let header = make_riff_xma2(&Xma2Params {
                num_samples: ctx.num_samples,
                data_size: ctx.riff_data_size(codec)?,
                channels: ctx.channels as u16,
                sample_rate: ctx.sample_rate,
                block_count,
                block_size: XMA_BLOCK_SIZE as u32,
            });
            delegated(DelegateSetup::Xma { header })
        }
        FsbCodec::Xwma => {
            let blob = ctx.setup_blob(codec)?;
            let header = make_riff_xwma(&XwmaParams {
                format_tag: source.read_u16_be(blob.offset)?,
                data_size: ctx.riff_data_size(codec)?,
                channels: ctx.channels as u16,
                sample_rate: ctx.sample_rate,
                avg_bytes_per_sec: source.read_u32_be(blob.offset + 0x04)?,
                block_align: source.read_u16_be(blob.offset + 0x02)?,
            });
            delegated(DelegateSetup::Xwma { header })
        }
        FsbCodec::Mpeg => {
            let fsb_padding = if ctx.channels > 2 { 16 } else { 4 };
            delegated(DelegateSetup::Mpeg { fsb_padding })
        }
        FsbCodec::Vorbis => {
            let blob = ctx.setup_blob(codec)?;
            delegated(DelegateSetup::Vorbis {
                setup_id: source.read_u32_le(blob.offset)?,
                channels: ctx.channels,
                sample_rate: ctx.sample_rate,
            })
        }
        FsbCodec::Atrac9 => {
            let blob = ctx.setup_blob(codec)?;
            let config_data = match blob.size {
                0x04 => source.read_u32_be(blob.offset)?,
                // first word repeats the superframe size
                0x08 => source.read_u32_be(blob.offset + 0x04)?,
                other => {
                    warn!("FSB5: unknown ATRAC9 config size {:#x}", other);
                    return Err(ParseError::UnsupportedCodec { codec: ctx.codec_id, known: true });
                }
            };
            delegated(DelegateSetup::Atrac9 { config_data, channels: ctx.channels })
        }
    };

    Ok(resolved)
}

fn delegated(setup: DelegateSetup) -> ResolvedCodec {
    CodecConfig::Delegated { setup }.into()
}

/// Big-endian DSP coefficient tables, one per channel
fn read_dsp_coefs(source: &dyn ByteSource, offset: u64, channels: u32) -> Result<Vec<[i16; 16]>> {
    (0..channels as u64)
        .map(|ch| {
            let mut coefs = [0i16; 16];
            for (i, coef) in coefs.iter_mut().enumerate() {
                *coef = source.read_i16_be(offset + ch * DSP_COEF_SPACING + i as u64 * 2)?;
            }
            Ok(coefs)
        })
        .collect()
}
