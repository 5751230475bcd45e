// SWAV integration tests

mod common;

use common::SwavBuilder;
use vgmeta::{swav, CodecConfig, Coding, InspectHost, Layout, MemorySource, OpenOptions, ParseError, StreamDescriptor};

const PCM8: u8 = 0;
const PCM16: u8 = 1;
const IMA: u8 = 2;

fn open(source: &MemorySource) -> Result<StreamDescriptor, ParseError> {
    swav::open(source, &OpenOptions::default(), &mut InspectHost)
}

#[test]
fn test_pcm16_mono() {
    let desc = open(&SwavBuilder::new(PCM16, 0x100).source("a.swav")).unwrap();
    assert_eq!(desc.channels, 1);
    assert_eq!(desc.sample_rate, 32728);
    assert_eq!(desc.num_samples, 0x80);
    assert!(!desc.loop_flag);
    assert_eq!((desc.loop_start, desc.loop_end), (0, 0));
    assert_eq!(desc.start_offset, 0x24);
    assert_eq!(desc.stream_size, 0x100);
    assert_eq!((desc.subsong, desc.total_subsongs), (1, 1));
    assert_eq!(desc.codec, CodecConfig::native(Coding::Pcm16Le, Layout::None));
}

#[test]
fn test_pcm8_stereo_loop() {
    let desc = open(&SwavBuilder::new(PCM8, 0x80).stereo().looped(4, 8).source("a.swav")).unwrap();
    assert_eq!(desc.channels, 2);
    assert_eq!(desc.num_samples, 0x80);
    assert!(desc.loop_flag);
    // loop fields count 32-bit words
    assert_eq!(desc.loop_start, 16);
    assert_eq!(desc.loop_end, 48);
    assert_eq!(desc.stream_size, 0x100);
    assert_eq!(desc.codec, CodecConfig::native(Coding::Pcm8, Layout::Interleave { block_size: 1 }));
}

#[test]
fn test_ima_stereo_state() {
    let source = SwavBuilder::new(IMA, 0x40)
        .stereo()
        .looped(2, 4)
        .ima_state(vec![(100, 5), (-3, 88)])
        .source("a.swav");
    let desc = open(&source).unwrap();

    // the state word of each channel holds no samples
    assert_eq!(desc.num_samples, 0x40 * 2 - 8);
    assert_eq!(desc.loop_start, 2 * 8 - 8);
    assert_eq!(desc.loop_end, 4 * 8 + 2 * 8 - 8);
    assert_eq!(desc.start_offset, 0x24 + 8);
    assert_eq!(desc.channel_state[0].adpcm_history, 100);
    assert_eq!(desc.channel_state[0].adpcm_step_index, 5);
    assert_eq!(desc.channel_state[1].adpcm_history, -3);
    assert_eq!(desc.channel_state[1].adpcm_step_index, 88);
    assert_eq!(desc.codec, CodecConfig::native(Coding::ImaInterleaved, Layout::Interleave { block_size: 1 }));
}

#[test]
fn test_ima_without_loop() {
    let desc = open(&SwavBuilder::new(IMA, 0x20).ima_state(vec![(0, 0)]).source("a.swav")).unwrap();
    assert_eq!(desc.num_samples, 0x20 * 2 - 8);
    assert!(!desc.loop_flag);
    assert_eq!((desc.loop_start, desc.loop_end), (0, 0));
    assert_eq!(desc.start_offset, 0x28);
    assert_eq!(desc.codec, CodecConfig::native(Coding::ImaInterleaved, Layout::None));
}

#[test]
fn test_size_mismatch_is_not_swav() {
    let mut bytes = SwavBuilder::new(PCM16, 0x40).build();
    bytes.push(0);
    assert!(matches!(open(&MemorySource::new("a.swav", bytes)), Err(ParseError::FormatMismatch(_))));
}

#[test]
fn test_unknown_codec() {
    assert!(matches!(
        open(&SwavBuilder::new(3, 0x40).source("a.swav")),
        Err(ParseError::UnsupportedCodec { codec: 3, known: false })
    ));
}

#[test]
fn test_extensions() {
    let builder = SwavBuilder::new(PCM16, 0x40);
    assert!(open(&builder.source("b.adpcm")).is_ok());
    assert!(open(&builder.source("B.SWAV")).is_ok());
    assert!(matches!(open(&builder.source("a.wav")), Err(ParseError::FormatMismatch(_))));

    let options = OpenOptions::default().check_extension(false);
    assert!(swav::open(&builder.source("a.wav"), &options, &mut InspectHost).is_ok());
}

#[test]
fn test_single_subsong() {
    let source = SwavBuilder::new(PCM16, 0x40).source("a.swav");
    for subsong in [0, 1] {
        let options = OpenOptions::default().subsong(subsong);
        assert!(swav::open(&source, &options, &mut InspectHost).is_ok());
    }
    assert!(matches!(
        swav::open(&source, &OpenOptions::default().subsong(2), &mut InspectHost),
        Err(ParseError::SubsongOutOfRange { requested: 2, total: 1 })
    ));
}
