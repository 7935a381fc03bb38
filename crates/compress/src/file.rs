//! # Overview
//!
//! Whole-file gzip adapters. [`GzipFileReader`] and [`GzipFileWriter`] open
//! the file themselves and hand the framing (magic bytes, flags, timestamp,
//! CRC-32 and length trailer) to `flate2`'s gzip codec, so there is no
//! buffer pumping here. The lifecycle and the error taxonomy match the stream
//! adapters.
//!
//! # Errors
//!
//! Failing to open or create the file is reported as
//! [`CodecError::TransformInitFailed`]. Corrupt or truncated gzip data is a
//! [`CodecError::TransformDataError`]; any other I/O failure is a transport
//! error carrying the original [`io::ErrorKind`].
//!
//! # Examples
//!
//! ```
//! use compress::{GzipFileReader, GzipFileWriter};
//!
//! let dir = std::env::temp_dir().join(format!("gzstream-doc-{}", std::process::id()));
//! std::fs::create_dir_all(&dir).unwrap();
//! let path = dir.join("greeting.gz");
//!
//! let mut writer = GzipFileWriter::new(&path);
//! writer.set_file_name("greeting.txt").unwrap();
//! writer.write(b"hello from a gzip file").unwrap();
//! writer.finish().unwrap();
//!
//! let mut reader = GzipFileReader::new(&path);
//! let mut plain = Vec::new();
//! let mut buf = [0u8; 64];
//! loop {
//!     let n = reader.read(&mut buf).unwrap();
//!     if n == 0 {
//!         break;
//!     }
//!     plain.extend_from_slice(&buf[..n]);
//! }
//! assert_eq!(plain, b"hello from a gzip file");
//! assert_eq!(reader.header().unwrap().file_name(), Some(&b"greeting.txt"[..]));
//! std::fs::remove_dir_all(&dir).unwrap();
//! ```

use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use flate2::{GzBuilder, GzHeader};
use logging::trace_file;

use crate::counting::{CountingReader, CountingWriter};
use crate::error::CodecError;
use crate::level::CompressionLevel;
use crate::options::{BufferKind, StreamOptions, validate_capacity};
use crate::status::{CodecStatus, Shared};

/// Metadata carried in a gzip member header.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct GzipHeader {
    mtime: u32,
    file_name: Option<Vec<u8>>,
    comment: Option<Vec<u8>>,
    operating_system: u8,
}

impl GzipHeader {
    /// Modification time in seconds since the Unix epoch; zero when absent.
    #[must_use]
    pub const fn mtime(&self) -> u32 {
        self.mtime
    }

    /// Original file name, if recorded.
    #[must_use]
    pub fn file_name(&self) -> Option<&[u8]> {
        self.file_name.as_deref()
    }

    /// Free-form comment, if recorded.
    #[must_use]
    pub fn comment(&self) -> Option<&[u8]> {
        self.comment.as_deref()
    }

    /// Operating system byte of the producer.
    #[must_use]
    pub const fn operating_system(&self) -> u8 {
        self.operating_system
    }
}

impl From<&GzHeader> for GzipHeader {
    fn from(header: &GzHeader) -> Self {
        Self {
            mtime: header.mtime(),
            file_name: header.filename().map(<[u8]>::to_vec),
            comment: header.comment().map(<[u8]>::to_vec),
            operating_system: header.operating_system(),
        }
    }
}

fn open_failure(path: &Path, err: &io::Error) -> CodecError {
    CodecError::TransformInitFailed {
        message: format!("{}: {err}", path.display()),
    }
}

fn read_failure(err: &io::Error) -> CodecError {
    match err.kind() {
        io::ErrorKind::InvalidData | io::ErrorKind::InvalidInput | io::ErrorKind::UnexpectedEof => {
            CodecError::data(err.to_string())
        }
        io::ErrorKind::OutOfMemory => CodecError::TransformMemoryError {
            message: err.to_string(),
        },
        _ => CodecError::transport_read(err),
    }
}

fn write_failure(err: &io::Error) -> CodecError {
    match err.kind() {
        io::ErrorKind::OutOfMemory => CodecError::TransformMemoryError {
            message: err.to_string(),
        },
        _ => CodecError::transport_write(err),
    }
}

fn check_header_field(field: &str, value: &[u8]) -> Result<(), CodecError> {
    if value.contains(&0) {
        return Err(CodecError::TransformInitFailed {
            message: format!("gzip {field} must not contain NUL bytes"),
        });
    }
    Ok(())
}

type FileDecoder = BufReader<MultiGzDecoder<BufReader<CountingReader<File>>>>;

/// Reads the plain bytes of a gzip file, including concatenated members.
pub struct GzipFileReader {
    path: PathBuf,
    options: StreamOptions,
    shared: Shared,
    decoder: Option<FileDecoder>,
    header: Option<GzipHeader>,
    total_out: u64,
}

impl fmt::Debug for GzipFileReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GzipFileReader")
            .field("path", &self.path)
            .field("status", &self.shared.status)
            .field("total_out", &self.total_out)
            .finish_non_exhaustive()
    }
}

impl GzipFileReader {
    /// Creates a reader for `path` with default options. The file is opened
    /// by [`open`](Self::open) or the first [`read`](Self::read).
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self::build(path.as_ref(), StreamOptions::default())
    }

    /// Creates a reader for `path`, validating `options` first.
    pub fn with_options(path: impl AsRef<Path>, options: StreamOptions) -> Result<Self, CodecError> {
        options.validate()?;
        Ok(Self::build(path.as_ref(), options))
    }

    fn build(path: &Path, options: StreamOptions) -> Self {
        Self {
            path: path.to_path_buf(),
            options,
            shared: Shared::default(),
            decoder: None,
            header: None,
            total_out: 0,
        }
    }

    /// Sets the read-ahead buffer used for compressed bytes.
    pub fn set_input_buffer_capacity(&mut self, capacity: usize) -> Result<(), CodecError> {
        self.ensure_configurable()?;
        validate_capacity(BufferKind::Input, capacity)?;
        self.options.input_buffer_capacity = capacity;
        Ok(())
    }

    /// Sets the buffer used for plain bytes.
    pub fn set_output_buffer_capacity(&mut self, capacity: usize) -> Result<(), CodecError> {
        self.ensure_configurable()?;
        validate_capacity(BufferKind::Output, capacity)?;
        self.options.output_buffer_capacity = capacity;
        Ok(())
    }

    fn ensure_configurable(&self) -> Result<(), CodecError> {
        if self.shared.status.is_configurable() {
            Ok(())
        } else {
            Err(CodecError::OptionsLocked)
        }
    }

    /// Opens the file. Opening an already open reader does nothing.
    pub fn open(&mut self) -> Result<(), CodecError> {
        if let Some(err) = self.shared.terminal_error() {
            return Err(err);
        }
        if !self.shared.transition(CodecStatus::Opening) {
            return Ok(());
        }
        trace_file!(path = %self.path.display(), "opening gzip file for reading");
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(err) => return Err(self.shared.fail(open_failure(&self.path, &err))),
        };
        let compressed = BufReader::with_capacity(
            self.options.input_buffer_capacity,
            CountingReader::new(file),
        );
        self.decoder = Some(BufReader::with_capacity(
            self.options.output_buffer_capacity,
            MultiGzDecoder::new(compressed),
        ));
        self.shared.transition(CodecStatus::Open);
        Ok(())
    }

    /// Reads plain bytes into `buf`; `Ok(0)` marks the end of the file.
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize, CodecError> {
        if let Some(err) = self.shared.terminal_error() {
            return Err(err);
        }
        if self.shared.status == CodecStatus::NotOpen {
            self.open()?;
        }
        if self.shared.status == CodecStatus::AtEnd || buf.is_empty() {
            return Ok(0);
        }
        let Some(decoder) = self.decoder.as_mut() else {
            return Err(CodecError::OperationAfterClose);
        };
        match decoder.read(buf) {
            Ok(0) => {
                self.capture_progress();
                trace_file!(
                    path = %self.path.display(),
                    total_out = self.total_out,
                    "gzip file fully read"
                );
                self.shared.transition(CodecStatus::AtEnd);
                self.decoder = None;
                Ok(0)
            }
            Ok(read) => {
                self.total_out += read as u64;
                self.shared.totals.total_out = self.total_out;
                self.capture_progress();
                Ok(read)
            }
            Err(err) => {
                let err = self.shared.fail(read_failure(&err));
                self.decoder = None;
                Err(err)
            }
        }
    }

    fn capture_progress(&mut self) {
        let Some(decoder) = self.decoder.as_ref() else {
            return;
        };
        if self.header.is_none() {
            self.header = decoder.get_ref().header().map(GzipHeader::from);
        }
        self.shared.totals.total_in = decoder.get_ref().get_ref().get_ref().bytes_read();
    }

    /// Header of the first gzip member, available after the first read.
    pub const fn header(&self) -> Option<&GzipHeader> {
        self.header.as_ref()
    }

    /// Returns the current status.
    pub const fn status(&self) -> CodecStatus {
        self.shared.status
    }

    /// Returns the sticky error, if any.
    pub fn error(&self) -> Option<CodecError> {
        self.shared.error.clone()
    }

    /// Compressed bytes read from the file so far.
    pub const fn total_in(&self) -> u64 {
        self.shared.totals.total_in
    }

    /// Plain bytes served so far.
    pub const fn total_out(&self) -> u64 {
        self.total_out
    }

    /// Closes the file.
    pub fn close(&mut self) {
        if self.shared.transition(CodecStatus::Closed) {
            trace_file!(path = %self.path.display(), "gzip reader closed");
        }
        self.decoder = None;
    }
}

impl Read for GzipFileReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Self::read(self, buf).map_err(io::Error::from)
    }
}

type FileEncoder = BufWriter<GzEncoder<BufWriter<CountingWriter<File>>>>;

/// Writes a gzip file from plain bytes.
///
/// The header records a modification time (the current time unless set with
/// [`set_mtime`](Self::set_mtime)) and optionally the original file name and
/// a comment.
pub struct GzipFileWriter {
    path: PathBuf,
    options: StreamOptions,
    shared: Shared,
    file_name: Option<Vec<u8>>,
    comment: Option<Vec<u8>>,
    mtime: Option<u32>,
    encoder: Option<FileEncoder>,
    finished: bool,
}

impl fmt::Debug for GzipFileWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GzipFileWriter")
            .field("path", &self.path)
            .field("status", &self.shared.status)
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}

impl GzipFileWriter {
    /// Creates a writer for `path` with default options. The file is created
    /// by [`open`](Self::open) or the first [`write`](Self::write).
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self::build(path.as_ref(), StreamOptions::default())
    }

    /// Creates a writer for `path`, validating `options` first.
    pub fn with_options(path: impl AsRef<Path>, options: StreamOptions) -> Result<Self, CodecError> {
        options.validate()?;
        Ok(Self::build(path.as_ref(), options))
    }

    fn build(path: &Path, options: StreamOptions) -> Self {
        Self {
            path: path.to_path_buf(),
            options,
            shared: Shared::default(),
            file_name: None,
            comment: None,
            mtime: None,
            encoder: None,
            finished: false,
        }
    }

    fn ensure_configurable(&self) -> Result<(), CodecError> {
        if self.shared.status.is_configurable() {
            Ok(())
        } else {
            Err(CodecError::OptionsLocked)
        }
    }

    /// Sets the compression level; accepted only before the file is created.
    pub fn set_compression_level<L>(&mut self, level: L) -> Result<(), CodecError>
    where
        L: TryInto<CompressionLevel>,
        CodecError: From<L::Error>,
    {
        self.ensure_configurable()?;
        self.options.compression_level = level.try_into()?;
        Ok(())
    }

    /// Sets the buffer used for plain bytes.
    pub fn set_input_buffer_capacity(&mut self, capacity: usize) -> Result<(), CodecError> {
        self.ensure_configurable()?;
        validate_capacity(BufferKind::Input, capacity)?;
        self.options.input_buffer_capacity = capacity;
        Ok(())
    }

    /// Sets the buffer used for compressed bytes.
    pub fn set_output_buffer_capacity(&mut self, capacity: usize) -> Result<(), CodecError> {
        self.ensure_configurable()?;
        validate_capacity(BufferKind::Output, capacity)?;
        self.options.output_buffer_capacity = capacity;
        Ok(())
    }

    /// Records the original file name in the header.
    pub fn set_file_name(&mut self, name: impl Into<Vec<u8>>) -> Result<(), CodecError> {
        self.ensure_configurable()?;
        let name = name.into();
        check_header_field("file name", &name)?;
        self.file_name = Some(name);
        Ok(())
    }

    /// Records a comment in the header.
    pub fn set_comment(&mut self, comment: impl Into<Vec<u8>>) -> Result<(), CodecError> {
        self.ensure_configurable()?;
        let comment = comment.into();
        check_header_field("comment", &comment)?;
        self.comment = Some(comment);
        Ok(())
    }

    /// Overrides the modification time recorded in the header.
    pub fn set_mtime(&mut self, mtime: u32) -> Result<(), CodecError> {
        self.ensure_configurable()?;
        self.mtime = Some(mtime);
        Ok(())
    }

    /// Creates the file and writes nothing yet. Opening an already open
    /// writer does nothing.
    pub fn open(&mut self) -> Result<(), CodecError> {
        if let Some(err) = self.shared.terminal_error() {
            return Err(err);
        }
        if !self.shared.transition(CodecStatus::Opening) {
            return Ok(());
        }
        trace_file!(
            path = %self.path.display(),
            level = self.options.compression_level.numeric(),
            "creating gzip file"
        );
        let file = match File::create(&self.path) {
            Ok(file) => file,
            Err(err) => return Err(self.shared.fail(open_failure(&self.path, &err))),
        };
        let mtime = self.mtime.unwrap_or_else(|| {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .ok()
                .and_then(|elapsed| u32::try_from(elapsed.as_secs()).ok())
                .unwrap_or(0)
        });
        let mut builder = GzBuilder::new().mtime(mtime);
        if let Some(name) = &self.file_name {
            builder = builder.filename(name.clone());
        }
        if let Some(comment) = &self.comment {
            builder = builder.comment(comment.clone());
        }
        let compressed = BufWriter::with_capacity(
            self.options.output_buffer_capacity,
            CountingWriter::new(file),
        );
        let encoder = builder.write(compressed, self.options.compression_level.into());
        self.encoder = Some(BufWriter::with_capacity(
            self.options.input_buffer_capacity,
            encoder,
        ));
        self.shared.transition(CodecStatus::Open);
        Ok(())
    }

    /// Compresses `data` into the file and returns the number of bytes
    /// accepted, which is zero once [`finish`](Self::finish) ran.
    pub fn write(&mut self, data: &[u8]) -> Result<usize, CodecError> {
        if let Some(err) = self.shared.terminal_error() {
            return Err(err);
        }
        if self.shared.status == CodecStatus::NotOpen {
            self.open()?;
        }
        let Some(encoder) = self.encoder.as_mut() else {
            return Ok(0);
        };
        match encoder.write(data) {
            Ok(written) => {
                self.shared.totals.total_in += written as u64;
                Ok(written)
            }
            Err(err) => {
                self.encoder = None;
                Err(self.shared.fail(write_failure(&err)))
            }
        }
    }

    /// Writes the trailer, flushes the file and returns the size of the
    /// compressed file.
    ///
    /// # Errors
    ///
    /// [`CodecError::FinishCalledTwice`] on any call after the first.
    pub fn finish(&mut self) -> Result<u64, CodecError> {
        if let Some(err) = self.shared.terminal_error() {
            return Err(err);
        }
        if self.finished {
            return Err(CodecError::FinishCalledTwice);
        }
        if self.shared.status == CodecStatus::NotOpen {
            self.open()?;
        }
        self.finished = true;
        let Some(encoder) = self.encoder.take() else {
            return Err(CodecError::OperationAfterClose);
        };
        let written = encoder
            .into_inner()
            .map_err(|err| write_failure(err.error()))
            .and_then(|gz| gz.finish().map_err(|err| write_failure(&err)))
            .and_then(|file| file.into_inner().map_err(|err| write_failure(err.error())));
        match written {
            Ok(counting) => {
                let total = counting.bytes_written();
                if let Err(err) = counting.into_inner().sync_all() {
                    return Err(self.shared.fail(write_failure(&err)));
                }
                self.shared.totals.total_out = total;
                self.shared.transition(CodecStatus::AtEnd);
                trace_file!(
                    path = %self.path.display(),
                    total_in = self.shared.totals.total_in,
                    total_out = total,
                    "gzip file finished"
                );
                Ok(total)
            }
            Err(err) => Err(self.shared.fail(err)),
        }
    }

    /// Returns the current status.
    pub const fn status(&self) -> CodecStatus {
        self.shared.status
    }

    /// Returns the sticky error, if any.
    pub fn error(&self) -> Option<CodecError> {
        self.shared.error.clone()
    }

    /// Plain bytes accepted so far.
    pub const fn total_in(&self) -> u64 {
        self.shared.totals.total_in
    }

    /// Size of the compressed file, known once finished.
    pub const fn total_out(&self) -> u64 {
        self.shared.totals.total_out
    }

    /// Finishes a pending file and closes the writer.
    ///
    /// Closing an open writer writes the trailer, so the file is complete;
    /// an error from that final write is returned after the writer closed.
    pub fn close(&mut self) -> Result<(), CodecError> {
        let pending = matches!(self.shared.status, CodecStatus::Opening | CodecStatus::Open)
            && !self.finished;
        let result = if pending { self.finish().map(|_| ()) } else { Ok(()) };
        if self.shared.transition(CodecStatus::Closed) {
            trace_file!(path = %self.path.display(), "gzip writer closed");
        }
        self.encoder = None;
        result
    }
}

impl Write for GzipFileWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Self::write(self, buf).map_err(io::Error::from)
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.encoder.as_mut() {
            Some(encoder) => encoder.flush().map_err(|err| {
                io::Error::from(self.shared.fail(write_failure(&err)))
            }),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_an_init_failure() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut reader = GzipFileReader::new(dir.path().join("absent.gz"));
        let err = reader.read(&mut [0u8; 8]).expect_err("missing file");
        assert!(matches!(err, CodecError::TransformInitFailed { .. }));
        assert_eq!(reader.status(), CodecStatus::Error);
        assert_eq!(reader.read(&mut [0u8; 8]), Err(err));
    }

    #[test]
    fn plain_file_is_a_data_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("plain.gz");
        std::fs::write(&path, b"this file was never compressed").expect("write");
        let mut reader = GzipFileReader::new(&path);
        let err = reader.read(&mut [0u8; 64]).expect_err("not gzip");
        assert!(matches!(err, CodecError::TransformDataError { .. }));
    }

    #[test]
    fn header_fields_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("header.gz");
        let mut writer = GzipFileWriter::new(&path);
        writer.set_file_name("original.txt").expect("name");
        writer.set_comment("written by a test").expect("comment");
        writer.set_mtime(1_700_000_000).expect("mtime");
        writer.write(b"payload").expect("write");
        let size = writer.finish().expect("finish");
        assert_eq!(size, std::fs::metadata(&path).expect("metadata").len());

        let mut reader = GzipFileReader::new(&path);
        let mut buf = [0u8; 16];
        assert_eq!(reader.read(&mut buf).expect("read"), 7);
        let header = reader.header().expect("header parsed");
        assert_eq!(header.mtime(), 1_700_000_000);
        assert_eq!(header.file_name(), Some(&b"original.txt"[..]));
        assert_eq!(header.comment(), Some(&b"written by a test"[..]));
        assert_eq!(reader.read(&mut buf).expect("end"), 0);
        assert_eq!(reader.status(), CodecStatus::AtEnd);
        assert_eq!(reader.total_in(), size);
    }

    #[test]
    fn nul_in_file_name_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut writer = GzipFileWriter::new(dir.path().join("nul.gz"));
        assert!(matches!(
            writer.set_file_name(&b"bad\0name"[..]),
            Err(CodecError::TransformInitFailed { .. })
        ));
        assert_eq!(writer.status(), CodecStatus::NotOpen);
    }

    #[test]
    fn writer_lifecycle_is_enforced() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut writer = GzipFileWriter::new(dir.path().join("lifecycle.gz"));
        writer.set_compression_level(1).expect("level");
        writer.write(b"abc").expect("write");
        assert_eq!(writer.set_compression_level(9), Err(CodecError::OptionsLocked));
        writer.finish().expect("finish");
        assert_eq!(writer.finish(), Err(CodecError::FinishCalledTwice));
        assert_eq!(writer.write(b"late").expect("after finish"), 0);
        writer.close().expect("close");
        assert_eq!(writer.write(b"late"), Err(CodecError::OperationAfterClose));
    }

    #[test]
    fn close_completes_an_unfinished_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("closed.gz");
        let mut writer = GzipFileWriter::new(&path);
        writer.write(b"closed without finish").expect("write");
        writer.close().expect("close");

        let mut reader = GzipFileReader::new(&path);
        let mut plain = Vec::new();
        io::Read::read_to_end(&mut reader, &mut plain).expect("read");
        assert_eq!(plain, b"closed without finish");
    }
}
