//! Round-trip and chunking properties of the stream adapters.
//!
//! Covers:
//! 1. Round trips across sizes that straddle the staging buffer capacity
//! 2. Independence of the compressed output from how input was split
//! 3. Decoding with arbitrarily small read buffers

use compress::{
    CodecStatus, CompressionLevel, DeflateStream, FinishState, InflateStream, MemorySink,
    MemorySource, StreamFormat, StreamOptions,
};
use proptest::prelude::*;

const CAPACITY: usize = 64;

fn options() -> StreamOptions {
    StreamOptions::default().with_buffer_capacity(CAPACITY)
}

fn sample(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8 ^ (i / 7) as u8).collect()
}

fn compress_chunks(chunks: &[&[u8]], options: StreamOptions) -> Vec<u8> {
    let mut stream = DeflateStream::with_options(MemorySink::new(), options).unwrap();
    for chunk in chunks {
        let mut offset = 0;
        while offset < chunk.len() {
            let accepted = stream.write(&chunk[offset..]).unwrap();
            assert!(accepted > 0, "unbounded sink must keep accepting");
            offset += accepted;
        }
    }
    assert_eq!(stream.finish().unwrap(), FinishState::Complete);
    assert_eq!(stream.status(), CodecStatus::AtEnd);
    let (sink, forwarded) = stream.finish_into_inner().unwrap();
    assert_eq!(forwarded as usize, sink.data().len());
    sink.into_inner()
}

fn decompress_with(compressed: Vec<u8>, options: StreamOptions, read_size: usize) -> Vec<u8> {
    let mut stream = InflateStream::with_options(MemorySource::new(compressed), options).unwrap();
    let mut plain = Vec::new();
    let mut buf = vec![0u8; read_size];
    loop {
        let n = stream.read(&mut buf).unwrap();
        if n == 0 {
            break;
        }
        plain.extend_from_slice(&buf[..n]);
    }
    assert_eq!(stream.status(), CodecStatus::AtEnd);
    assert_eq!(stream.read(&mut buf).unwrap(), 0);
    plain
}

// =============================================================================
// SECTION 1: Buffer boundary sizes
// =============================================================================

#[test]
fn round_trip_across_buffer_boundaries() {
    let sizes = [
        0,
        1,
        CAPACITY - 1,
        CAPACITY,
        CAPACITY + 1,
        2 * CAPACITY,
        3 * CAPACITY + 5,
        16 * CAPACITY,
        100 * CAPACITY + 17,
    ];
    for size in sizes {
        let payload = sample(size);
        let compressed = compress_chunks(&[&payload], options());
        let plain = decompress_with(compressed, options(), CAPACITY / 2 + 3);
        assert_eq!(plain, payload, "size {size}");
    }
}

#[test]
fn round_trip_with_default_buffers_and_large_payload() {
    let payload = sample(5 * compress::DEFAULT_BUFFER_CAPACITY + 3);
    let compressed = compress_chunks(&[&payload], StreamOptions::default());
    let plain = decompress_with(compressed, StreamOptions::default(), 4096);
    assert_eq!(plain, payload);
}

#[test]
fn raw_format_round_trips() {
    let payload = sample(3 * CAPACITY);
    let raw = options().with_format(StreamFormat::Raw);
    let compressed = compress_chunks(&[&payload], raw);
    assert_ne!(compressed[0] & 0x0f, 8, "raw deflate carries no zlib header");
    assert_eq!(decompress_with(compressed, raw, 50), payload);
}

#[test]
fn every_level_round_trips() {
    let payload = b"levels trade speed for ratio ".repeat(40);
    for numeric in CompressionLevel::MIN..=CompressionLevel::MAX {
        let level = CompressionLevel::from_numeric(numeric).unwrap();
        let compressed = compress_chunks(&[&payload], options().with_compression_level(level));
        assert_eq!(decompress_with(compressed, options(), 100), payload, "level {numeric}");
    }
}

#[test]
fn hello_at_level_six() {
    let level = CompressionLevel::from_numeric(6).unwrap();
    let compressed = compress_chunks(&[b"hello"], StreamOptions::default().with_compression_level(level));
    let plain = decompress_with(compressed, StreamOptions::default(), 16);
    assert_eq!(plain, b"hello");
}

#[test]
fn empty_input_reaches_end_on_first_read() {
    let compressed = compress_chunks(&[], StreamOptions::default());
    let mut stream = InflateStream::from_compressed_data(compressed);
    let mut buf = [0u8; 16];
    assert_eq!(stream.read(&mut buf).unwrap(), 0);
    assert_eq!(stream.status(), CodecStatus::AtEnd);
    assert!(stream.error().is_none());
}

// =============================================================================
// SECTION 2: Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn decompress_inverts_compress(
        payload in proptest::collection::vec(any::<u8>(), 0..4096),
        read_size in 1usize..200,
    ) {
        let compressed = compress_chunks(&[&payload], options());
        prop_assert_eq!(decompress_with(compressed, options(), read_size), payload);
    }

    #[test]
    fn chunked_writes_match_single_write(
        payload in proptest::collection::vec(0u8..8, 0..4096),
        cuts in proptest::collection::vec(1usize..97, 1..64),
    ) {
        let whole = compress_chunks(&[&payload], options());

        let mut chunks: Vec<&[u8]> = Vec::new();
        let mut rest: &[u8] = &payload;
        for cut in cuts.iter().cycle() {
            if rest.is_empty() {
                break;
            }
            let (head, tail) = rest.split_at((*cut).min(rest.len()));
            chunks.push(head);
            rest = tail;
        }
        let pieces = compress_chunks(&chunks, options());
        prop_assert_eq!(pieces, whole);
    }
}
