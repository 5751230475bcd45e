// FSB5 (FMOD Studio sound bank) support
//
// File structure:
// - Base header (0x3C or 0x40 bytes, see header.rs)
// - Sample headers: one variable-size record per subsong (see walker.rs)
// - Name table: u32 offset per subsong, then nul-terminated names
// - Sample data: subsong data, 32-byte aligned
//
// The four regions must cover the file exactly.

pub mod codec;
pub mod header;
pub mod walker;

pub use codec::{FsbCodec, FLAG_NON_INTERLEAVED, FLAG_PCM_BIG_ENDIAN};
pub use header::{ContainerHeader, FSB5_EXTENSIONS, FSB5_MAGIC};
pub use walker::{ExtraFlag, ExtraFlagKind, ExtraFlags, LocatedSubsong, SetupBlob, SubsongRecord};

use tracing::debug;

use crate::descriptor::{CodecConfig, StreamDescriptor};
use crate::error::{ParseError, Result};
use crate::host::DecoderHost;
use crate::utils::encoding::decode_name;
use crate::utils::io::ByteSource;
use crate::{ContainerFormat, OpenOptions};

/// Longest stream name kept, in bytes
const STREAM_NAME_SIZE: usize = 255;

/// Open one subsong of an FSB5 bank
pub fn open(source: &dyn ByteSource, options: &OpenOptions, host: &mut dyn DecoderHost) -> Result<StreamDescriptor> {
    let header = ContainerHeader::read(source, options.check_extension)?;
    let target = header.resolve_subsong(options.subsong)?;
    debug!(
        "FSB5 v{}: {} subsongs, codec {:#x}, opening {}",
        header.version, header.total_subsongs, header.codec, target
    );

    let located = walker::locate(source, &header, target)?;
    let name = read_name(source, &header, target)?;
    let record = &located.record;

    let mut descriptor = StreamDescriptor::allocate(ContainerFormat::Fsb5, record.channels, record.loop_flag)
        .ok_or_else(|| ParseError::malformed(format!("subsong {target} has zero channels")))?;
    descriptor.sample_rate = record.sample_rate;
    descriptor.num_samples = record.num_samples;
    if record.loop_flag {
        descriptor.loop_start = record.loop_start;
        descriptor.loop_end = record.loop_end;
    }
    descriptor.subsong = target;
    descriptor.total_subsongs = header.total_subsongs as u32;
    descriptor.start_offset = located.start_offset;
    descriptor.stream_size = located.stream_size;
    descriptor.name = name;

    let resolved = codec::resolve(
        source,
        &codec::CodecContext {
            codec_id: header.codec,
            flags: header.flags,
            channels: record.channels,
            sample_rate: record.sample_rate,
            num_samples: record.num_samples,
            stream_size: located.stream_size,
            setup: record.setup,
        },
    )?;
    if let Some(tables) = resolved.dsp_coefs {
        for (state, coefs) in descriptor.channel_state.iter_mut().zip(tables) {
            state.dsp_coefs = Some(coefs);
        }
    }
    descriptor.codec = resolved.config;

    if let CodecConfig::Delegated { setup } = &descriptor.codec {
        let handle = host.init_delegate(source, setup, located.start_offset, located.stream_size)?;
        descriptor.delegate = Some(handle);
    }
    host.open_stream(source, &descriptor)?;

    Ok(descriptor)
}

fn read_name(source: &dyn ByteSource, header: &ContainerHeader, target: u32) -> Result<Option<String>> {
    let Some(offset) = walker::name_offset(source, header, target)? else {
        return Ok(None);
    };
    let table_end = header.name_table_start() + header.name_table_size as u64;
    let max_len = ((table_end - offset) as usize).min(STREAM_NAME_SIZE);
    let bytes = source.read_c_string(offset, max_len)?;
    Ok(Some(decode_name(&bytes)))
}
