//! Lifecycle, backpressure and error handling of the stream adapters.

use std::io::{self, Read, Write};
use std::thread;

use compress::{
    BufferKind, CodecError, CodecStatus, CompressionLevel, DeflateStream, ErrorCode, FinishState,
    InflateStream, IoSink, IoSource, MemorySink, StreamOptions, compress_to_vec,
};

// =============================================================================
// SECTION 1: Backpressure
// =============================================================================

#[test]
fn never_writable_sink_stops_accepting_input() {
    let mut sink = MemorySink::new();
    sink.set_writable(false);
    let options = StreamOptions::default().with_buffer_capacity(128);
    let mut stream = DeflateStream::with_options(sink, options).unwrap();

    let mut seed = 7u32;
    let mut accepted_total = 0usize;
    let mut zero_seen = false;
    for _ in 0..200_000 {
        let chunk: Vec<u8> = (0..64)
            .map(|_| {
                seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
                (seed >> 16) as u8
            })
            .collect();
        let accepted = stream.write(&chunk).unwrap();
        accepted_total += accepted;
        if accepted == 0 {
            zero_seen = true;
            break;
        }
    }
    assert!(zero_seen, "accepted {accepted_total} bytes into a blocked sink");
    assert_eq!(stream.status(), CodecStatus::Open);
    assert!(stream.error().is_none());
    assert_eq!(stream.write(b"more").unwrap(), 0);
}

#[test]
fn finish_progresses_as_sink_frees_room() {
    let payload = b"trailer bytes trickle out one small window at a time".repeat(20);
    let mut stream = DeflateStream::with_options(
        MemorySink::with_limit(3),
        StreamOptions::default().with_buffer_capacity(32),
    )
    .unwrap();

    let mut offset = 0;
    let mut limit = 3;
    while offset < payload.len() {
        let accepted = stream.write(&payload[offset..]).unwrap();
        offset += accepted;
        if accepted == 0 {
            limit += 3;
            stream.get_mut().set_limit(Some(limit));
        }
    }

    let mut state = stream.finish().unwrap();
    let mut turns = 0;
    while state == FinishState::Pending {
        limit += 3;
        stream.get_mut().set_limit(Some(limit));
        state = stream.poll_finish().unwrap();
        turns += 1;
        assert!(turns < 10_000, "finish never completed");
    }
    assert_eq!(stream.status(), CodecStatus::AtEnd);
    let (sink, _) = stream.finish_into_inner().unwrap();
    assert_eq!(compress::decompress_to_vec(sink.data()).unwrap(), payload);
}

// =============================================================================
// SECTION 2: End of stream and sticky errors
// =============================================================================

#[test]
fn end_is_reached_once_all_bytes_are_served() {
    let payload = b"every byte before the end".repeat(5);
    let compressed = compress_to_vec(&payload, CompressionLevel::Default).unwrap();
    let mut stream = InflateStream::from_compressed_data(compressed);

    let mut served = 0;
    let mut buf = [0u8; 10];
    loop {
        let n = stream.read(&mut buf).unwrap();
        if n == 0 {
            break;
        }
        served += n;
        if served < payload.len() {
            assert_eq!(stream.status(), CodecStatus::Open);
        }
    }
    assert_eq!(served, payload.len());
    assert_eq!(stream.status(), CodecStatus::AtEnd);
    for _ in 0..3 {
        assert_eq!(stream.read(&mut buf).unwrap(), 0);
    }
    assert!(stream.error().is_none());
}

#[test]
fn malformed_input_error_is_sticky() {
    let mut compressed = compress_to_vec(&b"corrupted later".repeat(30), CompressionLevel::Best).unwrap();
    let middle = compressed.len() / 2;
    for byte in &mut compressed[2..middle] {
        *byte ^= 0xa5;
    }
    let mut stream = InflateStream::from_compressed_data(compressed);
    let mut buf = [0u8; 32];
    let err = loop {
        match stream.read(&mut buf) {
            Ok(0) => panic!("corrupted stream reported a clean end"),
            Ok(_) => {}
            Err(err) => break err,
        }
    };
    assert_eq!(err.code(), ErrorCode::TransformDataError);
    assert_eq!(stream.status(), CodecStatus::Error);
    for _ in 0..3 {
        assert_eq!(stream.read(&mut buf), Err(err.clone()));
    }
    assert_eq!(stream.error(), Some(err));
}

#[test]
fn closing_discards_and_terminates() {
    let compressed = compress_to_vec(&[0u8; 4096], CompressionLevel::Default).unwrap();
    let mut stream = InflateStream::from_compressed_data(compressed);
    let mut buf = [0u8; 8];
    assert_eq!(stream.read(&mut buf).unwrap(), 8);
    stream.close();
    assert_eq!(stream.status(), CodecStatus::Closed);
    assert!(!stream.has_bytes_available());
    assert_eq!(stream.read(&mut buf), Err(CodecError::OperationAfterClose));

    let mut deflate = DeflateStream::new(MemorySink::new());
    deflate.write(b"abc").unwrap();
    deflate.close();
    assert_eq!(deflate.write(b"abc"), Err(CodecError::OperationAfterClose));
    assert_eq!(deflate.finish(), Err(CodecError::OperationAfterClose));
}

// =============================================================================
// SECTION 3: Configuration
// =============================================================================

#[test]
fn zero_capacity_fails_construction() {
    let err = DeflateStream::with_options(
        MemorySink::new(),
        StreamOptions::default().with_input_buffer_capacity(0),
    )
    .unwrap_err();
    assert_eq!(
        err,
        CodecError::BufferCapacityInvalid {
            buffer: BufferKind::Input,
            requested: 0
        }
    );
}

#[test]
fn configuration_errors_leave_status_untouched() {
    let mut stream = DeflateStream::new(MemorySink::new());
    assert!(stream.set_compression_level(-2).is_err());
    assert!(stream.set_input_buffer_capacity(0).is_err());
    assert_eq!(stream.status(), CodecStatus::NotOpen);

    stream.write(b"open now").unwrap();
    assert_eq!(stream.set_output_buffer_capacity(1024), Err(CodecError::OptionsLocked));
    assert_eq!(stream.status(), CodecStatus::Open);
    assert!(stream.error().is_none());
}

// =============================================================================
// SECTION 4: Monitor and std::io integration
// =============================================================================

#[test]
fn monitor_cancels_from_another_thread() {
    let compressed = compress_to_vec(&[1u8; 10_000], CompressionLevel::Fast).unwrap();
    let mut stream = InflateStream::from_compressed_data(compressed);
    let mut buf = [0u8; 100];
    stream.read(&mut buf).unwrap();

    let monitor = stream.monitor();
    assert_eq!(monitor.status(), CodecStatus::Open);
    assert!(monitor.totals().total_out >= 100);
    let cancelled = thread::spawn(move || monitor.cancel()).join().unwrap();
    assert!(cancelled);

    assert_eq!(stream.status(), CodecStatus::Closed);
    assert_eq!(stream.read(&mut buf), Err(CodecError::OperationAfterClose));
}

#[test]
fn io_traits_compose_with_std() {
    let payload = b"std::io adapters wrap the codec streams".repeat(50);
    let mut deflate = DeflateStream::new(IoSink::new(Vec::new()));
    deflate.write_all(&payload).unwrap();
    Write::flush(&mut deflate).unwrap();
    let (sink, forwarded) = deflate.finish_into_inner().unwrap();
    let compressed = sink.into_inner();
    assert_eq!(forwarded as usize, compressed.len());

    let mut inflate = InflateStream::new(IoSource::new(io::Cursor::new(compressed)));
    let mut plain = Vec::new();
    inflate.read_to_end(&mut plain).unwrap();
    assert_eq!(plain, payload);
}

#[test]
fn truncated_input_surfaces_as_invalid_data() {
    let compressed = compress_to_vec(&b"cut short".repeat(100), CompressionLevel::Default).unwrap();
    let cut = compressed[..compressed.len() - 4].to_vec();
    let mut inflate = InflateStream::new(IoSource::new(io::Cursor::new(cut)));
    let mut plain = Vec::new();
    let err = inflate.read_to_end(&mut plain).unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::InvalidData);
}
