//! Whole-file gzip adapters against real files.

use std::fs;
use std::io::{Read, Write};

use compress::{
    CodecError, CodecStatus, CompressionLevel, GzipFileReader, GzipFileWriter, StreamOptions,
};
use flate2::read::GzDecoder;
use tempfile::tempdir;

fn read_all(reader: &mut GzipFileReader) -> Vec<u8> {
    let mut plain = Vec::new();
    let mut buf = [0u8; 333];
    loop {
        let n = reader.read(&mut buf).unwrap();
        if n == 0 {
            return plain;
        }
        plain.extend_from_slice(&buf[..n]);
    }
}

#[test]
fn file_round_trip_with_small_buffers() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("payload.gz");
    let payload: Vec<u8> = (0..50_000u32).map(|i| (i % 97) as u8).collect();
    let options = StreamOptions::default()
        .with_buffer_capacity(512)
        .with_compression_level(CompressionLevel::Best);

    let mut writer = GzipFileWriter::with_options(&path, options).unwrap();
    for chunk in payload.chunks(1000) {
        writer.write_all(chunk).unwrap();
    }
    let size = writer.finish().unwrap();
    assert_eq!(writer.status(), CodecStatus::AtEnd);
    assert_eq!(writer.total_in(), payload.len() as u64);
    assert!(size < payload.len() as u64);

    let mut reader = GzipFileReader::with_options(&path, options).unwrap();
    assert_eq!(read_all(&mut reader), payload);
    assert_eq!(reader.status(), CodecStatus::AtEnd);
    assert_eq!(reader.total_out(), payload.len() as u64);
}

#[test]
fn written_files_are_standard_gzip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("standard.gz");
    let mut writer = GzipFileWriter::new(&path);
    writer.set_file_name("standard.txt").unwrap();
    writer.write_all(b"readable by any gzip decoder").unwrap();
    writer.finish().unwrap();

    let bytes = fs::read(&path).unwrap();
    assert_eq!(&bytes[..2], &[0x1f, 0x8b]);
    let mut decoder = GzDecoder::new(&bytes[..]);
    let mut plain = String::new();
    decoder.read_to_string(&mut plain).unwrap();
    assert_eq!(plain, "readable by any gzip decoder");
    assert_eq!(
        decoder.header().and_then(|header| header.filename()),
        Some(&b"standard.txt"[..])
    );
}

#[test]
fn concatenated_members_are_read_in_sequence() {
    let dir = tempdir().unwrap();
    let first = dir.path().join("first.gz");
    let second = dir.path().join("second.gz");
    for (path, text) in [(&first, &b"first member, "[..]), (&second, &b"second member"[..])] {
        let mut writer = GzipFileWriter::new(path);
        writer.write_all(text).unwrap();
        writer.finish().unwrap();
    }
    let joined = dir.path().join("joined.gz");
    let mut bytes = fs::read(&first).unwrap();
    bytes.extend(fs::read(&second).unwrap());
    fs::write(&joined, bytes).unwrap();

    let mut reader = GzipFileReader::new(&joined);
    assert_eq!(read_all(&mut reader), b"first member, second member");
}

#[test]
fn corrupted_trailer_is_a_data_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("corrupt.gz");
    let mut writer = GzipFileWriter::new(&path);
    writer.write_all(&b"checksummed".repeat(20)).unwrap();
    writer.finish().unwrap();

    let mut bytes = fs::read(&path).unwrap();
    let crc_offset = bytes.len() - 8;
    bytes[crc_offset] ^= 0xff;
    fs::write(&path, bytes).unwrap();

    let mut reader = GzipFileReader::new(&path);
    let mut buf = [0u8; 1024];
    let err = loop {
        match reader.read(&mut buf) {
            Ok(0) => panic!("corrupted trailer accepted"),
            Ok(_) => {}
            Err(err) => break err,
        }
    };
    assert!(matches!(err, CodecError::TransformDataError { .. }));
    assert_eq!(reader.status(), CodecStatus::Error);
    assert_eq!(reader.read(&mut buf), Err(err));
}

#[test]
fn unwritable_location_is_an_init_failure() {
    let dir = tempdir().unwrap();
    let mut writer = GzipFileWriter::new(dir.path().join("missing").join("out.gz"));
    let err = writer.open().unwrap_err();
    assert!(matches!(err, CodecError::TransformInitFailed { .. }));
    assert_eq!(writer.status(), CodecStatus::Error);
    assert_eq!(writer.write(b"x"), Err(err));
}

#[test]
fn reader_close_is_terminal() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("close.gz");
    let mut writer = GzipFileWriter::new(&path);
    writer.write(b"close me").unwrap();
    writer.close().unwrap();
    assert_eq!(writer.status(), CodecStatus::Closed);

    let mut reader = GzipFileReader::new(&path);
    reader.open().unwrap();
    assert_eq!(reader.set_input_buffer_capacity(10), Err(CodecError::OptionsLocked));
    reader.close();
    assert_eq!(reader.read(&mut [0u8; 4]), Err(CodecError::OperationAfterClose));
}

#[test]
fn empty_file_still_exposes_header() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("empty.gz");
    let mut writer = GzipFileWriter::new(&path);
    writer.set_file_name("empty.txt").unwrap();
    writer.set_mtime(1_234_567).unwrap();
    let size = writer.finish().unwrap();

    let mut reader = GzipFileReader::new(&path);
    assert_eq!(reader.read(&mut [0u8; 16]).unwrap(), 0);
    assert_eq!(reader.status(), CodecStatus::AtEnd);
    let header = reader.header().expect("header of an empty member");
    assert_eq!(header.file_name(), Some(&b"empty.txt"[..]));
    assert_eq!(header.mtime(), 1_234_567);
    assert_eq!(reader.total_out(), 0);
    assert_eq!(reader.total_in(), size);
}
