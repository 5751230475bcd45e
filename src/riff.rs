// Synthetic RIFF headers for delegated decoders
//
// Some external decoders only accept XMA2/xWMA inside a RIFF container.
// These builders produce the minimal header; the caller feeds it followed
// by the raw stream bytes.

const WAVE_FORMAT_XMA2: u16 = 0x0166;

/// RIFF + fmt (XMA2WAVEFORMATEX) + data chunk header
pub const XMA2_HEADER_SIZE: usize = 0x0C + 0x08 + 0x34 + 0x08;
/// RIFF + fmt (WAVEFORMATEX) + data chunk header
pub const XWMA_HEADER_SIZE: usize = 0x0C + 0x08 + 0x12 + 0x08;

fn put_u16(buf: &mut Vec<u8>, v: u16) {
    buf.extend_from_slice(&v.to_le_bytes());
}

fn put_u32(buf: &mut Vec<u8>, v: u32) {
    buf.extend_from_slice(&v.to_le_bytes());
}

/// Speaker mask and XMA stream count for a channel count
fn xma2_channel_layout(channels: u16) -> (u16, u32) {
    match channels {
        1 => (1, 0x04),
        2 => (1, 0x01 | 0x02),
        3 => (2, 0x01 | 0x02 | 0x04),
        4 => (2, 0x01 | 0x02 | 0x10 | 0x20),
        5 => (3, 0x01 | 0x02 | 0x04 | 0x10 | 0x20),
        6 => (3, 0x01 | 0x02 | 0x04 | 0x08 | 0x10 | 0x20),
        _ => (channels.div_ceil(2), 0),
    }
}

/// Parameters for an XMA2 wrapper header
#[derive(Debug, Clone, Copy)]
pub struct Xma2Params {
    pub num_samples: u32,
    pub data_size: u32,
    pub channels: u16,
    pub sample_rate: u32,
    pub block_count: u16,
    pub block_size: u32,
}

/// Build a RIFF/XMA2 header for `data_size` bytes of XMA2 packets
pub fn make_riff_xma2(p: &Xma2Params) -> Vec<u8> {
    let (streams, speakers) = xma2_channel_layout(p.channels);
    let bytes_per_sample = 2u32;
    let mut buf = Vec::with_capacity(XMA2_HEADER_SIZE);

    buf.extend_from_slice(b"RIFF");
    put_u32(&mut buf, (XMA2_HEADER_SIZE as u32 - 8).wrapping_add(p.data_size));
    buf.extend_from_slice(b"WAVE");

    buf.extend_from_slice(b"fmt ");
    put_u32(&mut buf, 0x34);
    put_u16(&mut buf, WAVE_FORMAT_XMA2);
    put_u16(&mut buf, p.channels);
    put_u32(&mut buf, p.sample_rate);
    put_u32(&mut buf, p.sample_rate.wrapping_mul(p.channels as u32 * bytes_per_sample));
    put_u16(&mut buf, (p.channels as u32 * bytes_per_sample) as u16);
    put_u16(&mut buf, 16);
    put_u16(&mut buf, 0x22);
    put_u16(&mut buf, streams);
    put_u32(&mut buf, speakers);
    put_u32(&mut buf, p.num_samples); // samples encoded
    put_u32(&mut buf, p.block_size);
    put_u32(&mut buf, 0); // play begin
    put_u32(&mut buf, p.num_samples); // play length
    put_u32(&mut buf, 0); // loop begin
    put_u32(&mut buf, 0); // loop length
    buf.push(0); // loop count
    buf.push(4); // encoder version
    put_u16(&mut buf, p.block_count);

    buf.extend_from_slice(b"data");
    put_u32(&mut buf, p.data_size);

    debug_assert_eq!(buf.len(), XMA2_HEADER_SIZE);
    buf
}

/// Parameters for an xWMA wrapper header
#[derive(Debug, Clone, Copy)]
pub struct XwmaParams {
    pub format_tag: u16,
    pub data_size: u32,
    pub channels: u16,
    pub sample_rate: u32,
    pub avg_bytes_per_sec: u32,
    pub block_align: u16,
}

/// Build a RIFF/XWMA header for `data_size` bytes of WMA packets
pub fn make_riff_xwma(p: &XwmaParams) -> Vec<u8> {
    let mut buf = Vec::with_capacity(XWMA_HEADER_SIZE);

    buf.extend_from_slice(b"RIFF");
    put_u32(&mut buf, (XWMA_HEADER_SIZE as u32 - 8).wrapping_add(p.data_size));
    buf.extend_from_slice(b"XWMA");

    buf.extend_from_slice(b"fmt ");
    put_u32(&mut buf, 0x12);
    put_u16(&mut buf, p.format_tag);
    put_u16(&mut buf, p.channels);
    put_u32(&mut buf, p.sample_rate);
    put_u32(&mut buf, p.avg_bytes_per_sec);
    put_u16(&mut buf, p.block_align);
    put_u16(&mut buf, 16);
    put_u16(&mut buf, 0);

    buf.extend_from_slice(b"data");
    put_u32(&mut buf, p.data_size);

    debug_assert_eq!(buf.len(), XWMA_HEADER_SIZE);
    buf
}
