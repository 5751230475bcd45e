// Normalized stream descriptor handed to the decoding pipeline

use serde::Serialize;

use crate::host::{DelegateHandle, DelegateSetup};
use crate::ContainerFormat;

/// Sample coding scheme for codecs decoded in-pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Coding {
    Pcm8,
    Pcm8Unsigned,
    Pcm16Le,
    Pcm16Be,
    PcmFloat,
    /// GameCube DSP ADPCM, one channel per interleave block
    NgcDsp,
    /// GameCube DSP ADPCM, sub-interleaved in 2-byte units
    NgcDspSubint,
    XboxIma,
    FsbIma,
    /// 4-bit IMA with per-channel state header, interleaved by byte
    ImaInterleaved,
    Psx,
    Hevag,
    Fadpcm,
}

impl Coding {
    pub fn as_str(&self) -> &'static str {
        match self {
            Coding::Pcm8 => "PCM8",
            Coding::Pcm8Unsigned => "PCM8 (unsigned)",
            Coding::Pcm16Le => "PCM16LE",
            Coding::Pcm16Be => "PCM16BE",
            Coding::PcmFloat => "PCM float",
            Coding::NgcDsp => "GC DSP ADPCM",
            Coding::NgcDspSubint => "GC DSP ADPCM (subinterleave)",
            Coding::XboxIma => "Xbox IMA ADPCM",
            Coding::FsbIma => "FSB IMA ADPCM",
            Coding::ImaInterleaved => "IMA ADPCM (interleaved)",
            Coding::Psx => "PlayStation ADPCM",
            Coding::Hevag => "HEVAG",
            Coding::Fadpcm => "FMOD FADPCM",
        }
    }
}

/// How channel data is laid out in the byte range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Layout {
    None,
    Interleave { block_size: u64 },
}

impl Layout {
    /// Mono streams never interleave
    pub fn for_channels(channels: u32, block_size: u64) -> Self {
        if channels == 1 {
            Layout::None
        } else {
            Layout::Interleave { block_size }
        }
    }
}

/// Resolved decode configuration
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CodecConfig {
    Native { coding: Coding, layout: Layout },
    Delegated { setup: DelegateSetup },
}

impl CodecConfig {
    pub fn native(coding: Coding, layout: Layout) -> Self {
        CodecConfig::Native { coding, layout }
    }

    /// Short label for listings
    pub fn label(&self) -> String {
        match self {
            CodecConfig::Native { coding, .. } => coding.as_str().to_string(),
            CodecConfig::Delegated { setup } => setup.family().to_string(),
        }
    }
}

/// Per-channel decoder state captured from the headers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChannelState {
    /// DSP ADPCM coefficient table
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dsp_coefs: Option<[i16; 16]>,
    pub adpcm_history: i32,
    pub adpcm_step_index: i32,
}

/// Everything the pipeline needs to open one subsong
#[derive(Debug, Serialize)]
pub struct StreamDescriptor {
    pub format: ContainerFormat,
    pub channels: u32,
    pub sample_rate: u32,
    pub num_samples: u32,
    pub loop_flag: bool,
    pub loop_start: u32,
    pub loop_end: u32,
    /// 1-based index of this subsong
    pub subsong: u32,
    pub total_subsongs: u32,
    pub start_offset: u64,
    pub stream_size: u64,
    pub codec: CodecConfig,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub channel_state: Vec<ChannelState>,
    pub name: Option<String>,
    /// Handle returned by the decoder host for delegated codecs
    #[serde(skip)]
    pub delegate: Option<DelegateHandle>,
}

impl StreamDescriptor {
    /// Allocate an empty descriptor; zero channels cannot be decoded
    pub(crate) fn allocate(format: ContainerFormat, channels: u32, loop_flag: bool) -> Option<Self> {
        if channels == 0 {
            return None;
        }

        Some(StreamDescriptor {
            format,
            channels,
            sample_rate: 0,
            num_samples: 0,
            loop_flag,
            loop_start: 0,
            loop_end: 0,
            subsong: 1,
            total_subsongs: 1,
            start_offset: 0,
            stream_size: 0,
            codec: CodecConfig::native(Coding::Pcm16Le, Layout::None),
            channel_state: vec![ChannelState::default(); channels as usize],
            name: None,
            delegate: None,
        })
    }

    /// Duration in seconds, when the sample rate is known
    pub fn duration_secs(&self) -> Option<f64> {
        (self.sample_rate > 0).then(|| self.num_samples as f64 / self.sample_rate as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_rejects_zero_channels() {
        assert!(StreamDescriptor::allocate(ContainerFormat::Fsb5, 0, false).is_none());
        let desc = StreamDescriptor::allocate(ContainerFormat::Fsb5, 2, true).unwrap();
        assert_eq!(desc.channel_state.len(), 2);
        assert!(desc.loop_flag);
    }

    #[test]
    fn test_layout_for_channels() {
        assert_eq!(Layout::for_channels(1, 2), Layout::None);
        assert_eq!(Layout::for_channels(2, 2), Layout::Interleave { block_size: 2 });
    }

    #[test]
    fn test_serialized_shape() {
        let mut desc = StreamDescriptor::allocate(ContainerFormat::Swav, 1, false).unwrap();
        desc.codec = CodecConfig::native(Coding::Pcm8, Layout::None);
        let json = serde_json::to_value(&desc).unwrap();
        assert_eq!(json["format"], "swav");
        assert_eq!(json["codec"]["kind"], "native");
        assert_eq!(json["codec"]["coding"], "pcm8");
        assert_eq!(json["codec"]["layout"]["type"], "none");
        assert!(json.get("delegate").is_none());
    }
}
