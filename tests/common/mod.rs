// Shared builders for integration tests
#![allow(dead_code)]

use vgmeta::MemorySource;

/// One subsong of a synthetic FSB5 bank
#[derive(Debug, Clone)]
pub struct Subsong {
    pub channel_class: u32,
    pub rate_class: u32,
    pub num_samples: u32,
    pub data: Vec<u8>,
    /// (type, payload) extra flag entries, chained in order
    pub extra: Vec<(u8, Vec<u8>)>,
    pub name: Option<String>,
}

impl Subsong {
    /// Stereo 44100 Hz with `data_len` bytes of data
    pub fn new(data_len: usize) -> Self {
        Subsong {
            channel_class: 1,
            rate_class: 8,
            num_samples: 0x1000,
            data: (0..data_len).map(|i| i as u8).collect(),
            extra: Vec::new(),
            name: None,
        }
    }

    pub fn channel_class(mut self, class: u32) -> Self {
        self.channel_class = class;
        self
    }

    pub fn rate_class(mut self, class: u32) -> Self {
        self.rate_class = class;
        self
    }

    pub fn samples(mut self, num_samples: u32) -> Self {
        self.num_samples = num_samples;
        self
    }

    pub fn flag(mut self, kind: u8, payload: Vec<u8>) -> Self {
        self.extra.push((kind, payload));
        self
    }

    pub fn loop_points(self, start: u32, end: u32) -> Self {
        let mut payload = start.to_le_bytes().to_vec();
        payload.extend_from_slice(&end.to_le_bytes());
        self.flag(0x03, payload)
    }

    pub fn named(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }
}

pub fn extra_flag_word(kind: u8, size: u32, more: bool) -> u32 {
    ((kind as u32) << 25) | ((size & 0x00FF_FFFF) << 1) | more as u32
}

pub fn sample_words(data_offset: u64, channel_class: u32, rate_class: u32, extra: bool, num_samples: u32) -> [u32; 2] {
    let units = (data_offset >> 5) as u32;
    let word1 = ((units & 0x01FF_FFFF) << 7) | (channel_class << 5) | (rate_class << 1) | extra as u32;
    let word2 = (num_samples << 2) | ((units >> 25) & 0x03);
    [word1, word2]
}

/// Synthetic FSB5 bank (version 1 unless changed)
#[derive(Debug, Clone)]
pub struct Fsb5Builder {
    pub version: u32,
    pub codec: u32,
    pub flags: u32,
    pub subsongs: Vec<Subsong>,
    /// Overrides the declared subsong count
    pub declared_subsongs: Option<i32>,
}

impl Fsb5Builder {
    pub fn new(codec: u32) -> Self {
        Fsb5Builder { version: 1, codec, flags: 0, subsongs: Vec::new(), declared_subsongs: None }
    }

    pub fn version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    pub fn flags(mut self, flags: u32) -> Self {
        self.flags = flags;
        self
    }

    pub fn subsong(mut self, subsong: Subsong) -> Self {
        self.subsongs.push(subsong);
        self
    }

    /// Byte offsets of each subsong inside the data region
    pub fn data_offsets(&self) -> Vec<u64> {
        let mut offset = 0u64;
        self.subsongs
            .iter()
            .map(|s| {
                let start = offset;
                offset += padded_len(s.data.len()) as u64;
                start
            })
            .collect()
    }

    pub fn base_header_size(&self) -> usize {
        if self.version == 0 { 0x40 } else { 0x3C }
    }

    pub fn sample_headers(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for (subsong, offset) in self.subsongs.iter().zip(self.data_offsets()) {
            let words = sample_words(
                offset,
                subsong.channel_class,
                subsong.rate_class,
                !subsong.extra.is_empty(),
                subsong.num_samples,
            );
            out.extend_from_slice(&words[0].to_le_bytes());
            out.extend_from_slice(&words[1].to_le_bytes());
            for (i, (kind, payload)) in subsong.extra.iter().enumerate() {
                let more = i + 1 < subsong.extra.len();
                out.extend_from_slice(&extra_flag_word(*kind, payload.len() as u32, more).to_le_bytes());
                out.extend_from_slice(payload);
            }
        }
        out
    }

    pub fn name_table(&self) -> Vec<u8> {
        if self.subsongs.iter().all(|s| s.name.is_none()) {
            return Vec::new();
        }
        let mut offsets = Vec::new();
        let mut names = Vec::new();
        let table_len = 4 * self.subsongs.len();
        for subsong in &self.subsongs {
            offsets.extend_from_slice(&((table_len + names.len()) as u32).to_le_bytes());
            names.extend_from_slice(subsong.name.as_deref().unwrap_or("").as_bytes());
            names.push(0);
        }
        offsets.extend_from_slice(&names);
        offsets
    }

    pub fn build(&self) -> Vec<u8> {
        let headers = self.sample_headers();
        let names = self.name_table();
        let mut data = Vec::new();
        for subsong in &self.subsongs {
            data.extend_from_slice(&subsong.data);
            data.resize(padded_len(data.len()), 0);
        }

        let mut out = vec![0u8; self.base_header_size()];
        out[0..4].copy_from_slice(b"FSB5");
        out[0x04..0x08].copy_from_slice(&self.version.to_le_bytes());
        let declared = self.declared_subsongs.unwrap_or(self.subsongs.len() as i32);
        out[0x08..0x0C].copy_from_slice(&declared.to_le_bytes());
        out[0x0C..0x10].copy_from_slice(&(headers.len() as u32).to_le_bytes());
        out[0x10..0x14].copy_from_slice(&(names.len() as u32).to_le_bytes());
        out[0x14..0x18].copy_from_slice(&(data.len() as u32).to_le_bytes());
        out[0x18..0x1C].copy_from_slice(&self.codec.to_le_bytes());
        if self.version == 1 {
            out[0x20..0x24].copy_from_slice(&self.flags.to_le_bytes());
        }
        out.extend_from_slice(&headers);
        out.extend_from_slice(&names);
        out.extend_from_slice(&data);
        out
    }

    pub fn source(&self) -> MemorySource {
        MemorySource::new("bank.fsb", self.build())
    }
}

fn padded_len(len: usize) -> usize {
    len.div_ceil(0x20) * 0x20
}

/// Synthetic SWAV file
#[derive(Debug, Clone)]
pub struct SwavBuilder {
    pub codec: u8,
    pub loop_flag: bool,
    pub sample_rate: u16,
    pub loop_start_words: u16,
    pub loop_length_words: u32,
    pub stereo: bool,
    /// Per-channel data bytes (IMA state block included)
    pub channel_data: usize,
    /// IMA (history, step index) per channel
    pub ima_state: Vec<(i16, i16)>,
}

impl SwavBuilder {
    pub fn new(codec: u8, channel_data: usize) -> Self {
        SwavBuilder {
            codec,
            loop_flag: false,
            sample_rate: 32728,
            loop_start_words: 0,
            loop_length_words: 0,
            stereo: false,
            channel_data,
            ima_state: Vec::new(),
        }
    }

    pub fn looped(mut self, start_words: u16, length_words: u32) -> Self {
        self.loop_flag = true;
        self.loop_start_words = start_words;
        self.loop_length_words = length_words;
        self
    }

    pub fn stereo(mut self) -> Self {
        self.stereo = true;
        self
    }

    pub fn ima_state(mut self, state: Vec<(i16, i16)>) -> Self {
        self.ima_state = state;
        self
    }

    pub fn build(&self) -> Vec<u8> {
        // size fields describe a single channel
        let mono_size = 0x24 + self.channel_data as u32;
        let mut out = vec![0u8; 0x24];
        out[0..4].copy_from_slice(b"SWAV");
        out[0x08..0x0C].copy_from_slice(&mono_size.to_le_bytes());
        out[0x10..0x14].copy_from_slice(b"DATA");
        out[0x14..0x18].copy_from_slice(&(mono_size - 0x10).to_le_bytes());
        out[0x18] = self.codec;
        out[0x19] = self.loop_flag as u8;
        out[0x1A..0x1C].copy_from_slice(&self.sample_rate.to_le_bytes());
        out[0x1E..0x20].copy_from_slice(&self.loop_start_words.to_le_bytes());
        out[0x20..0x24].copy_from_slice(&self.loop_length_words.to_le_bytes());

        for (history, step) in &self.ima_state {
            out.extend_from_slice(&history.to_le_bytes());
            out.extend_from_slice(&step.to_le_bytes());
        }
        let channels = if self.stereo { 2 } else { 1 };
        out.resize(0x24 + self.channel_data * channels, 0x55);
        out
    }

    pub fn source(&self, name: &str) -> MemorySource {
        MemorySource::new(name, self.build())
    }
}
