//! # Overview
//!
//! One-shot zlib helpers built on the stream adapters. They suit payloads
//! that already sit in memory; anything larger or arriving incrementally
//! should drive [`DeflateStream`] or [`InflateStream`] directly.
//!
//! # Examples
//!
//! ```
//! use compress::CompressionLevel;
//! use compress::zlib::{compress_to_vec, decompress_to_vec};
//!
//! let data = b"highly compressible payload";
//! let compressed = compress_to_vec(data, CompressionLevel::Best).unwrap();
//! let decoded = decompress_to_vec(&compressed).unwrap();
//! assert_eq!(decoded, data);
//! ```

use std::io;

use crate::deflate::DeflateStream;
use crate::error::CodecError;
use crate::inflate::InflateStream;
use crate::level::CompressionLevel;
use crate::options::{DEFAULT_BUFFER_CAPACITY, StreamOptions};
use crate::transport::MemorySink;

/// Compresses `input` into a new zlib stream.
pub fn compress_to_vec(input: &[u8], level: CompressionLevel) -> Result<Vec<u8>, CodecError> {
    let options = StreamOptions::default().with_compression_level(level);
    let mut stream = DeflateStream::with_options(MemorySink::new(), options)?;
    let mut offset = 0;
    while offset < input.len() {
        let accepted = stream.write(&input[offset..])?;
        if accepted == 0 {
            let stalled = io::Error::new(io::ErrorKind::WriteZero, "compressor stopped accepting input");
            return Err(CodecError::transport_write(&stalled));
        }
        offset += accepted;
    }
    let (sink, _) = stream.finish_into_inner()?;
    Ok(sink.into_inner())
}

/// Decompresses the zlib stream in `input` into a new [`Vec`].
///
/// # Errors
///
/// [`CodecError::TransformDataError`] when `input` is malformed or ends
/// before the stream's end marker.
pub fn decompress_to_vec(input: &[u8]) -> Result<Vec<u8>, CodecError> {
    let mut stream = InflateStream::from_compressed_data(input.to_vec());
    let mut output = Vec::with_capacity(input.len().saturating_mul(2));
    let mut chunk = vec![0u8; DEFAULT_BUFFER_CAPACITY];
    loop {
        let read = stream.read(&mut chunk)?;
        if read == 0 {
            return Ok(output);
        }
        output.extend_from_slice(&chunk[..read]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn helper_functions_round_trip() {
        let payload = b"The quick brown fox jumps over the lazy dog".repeat(8);
        let compressed = compress_to_vec(&payload, CompressionLevel::Default).expect("compress");
        assert!(compressed.len() < payload.len());
        assert_eq!(decompress_to_vec(&compressed).expect("decompress"), payload);
    }

    #[test]
    fn output_matches_flate2_one_shot() {
        use std::io::Write;

        let payload = b"matching bytes across encoders".repeat(32);
        let mut reference = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::new(6));
        reference.write_all(&payload).expect("reference write");
        let reference = reference.finish().expect("reference finish");
        let level = CompressionLevel::from_numeric(6).expect("level");
        assert_eq!(compress_to_vec(&payload, level).expect("compress"), reference);
    }

    #[test]
    fn empty_input_round_trips() {
        let compressed = compress_to_vec(b"", CompressionLevel::None).expect("compress");
        assert!(!compressed.is_empty());
        assert!(decompress_to_vec(&compressed).expect("decompress").is_empty());
    }

    #[test]
    fn garbage_is_rejected() {
        let err = decompress_to_vec(b"\x00\x01\x02\x03").expect_err("garbage");
        assert!(matches!(err, CodecError::TransformDataError { .. }));
    }
}
