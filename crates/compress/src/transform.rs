//! # Overview
//!
//! Seam between the codec engine and the external deflate implementation.
//! [`Deflater`] and [`Inflater`] wrap `flate2`'s low-level [`Compress`] and
//! [`Decompress`] state machines; the engine only ever sees the [`Transform`]
//! trait, so tests and alternative backends can plug in their own state
//! machine.
//!
//! # Invariants
//!
//! A transform never retains the slices it is handed. Progress is measured by
//! the change in [`Transform::total_in`] and [`Transform::total_out`] across a
//! call to [`Transform::run`].

use std::fmt;

use flate2::{Compress, Compression, Decompress, FlushCompress, FlushDecompress, Status};

use crate::error::CodecError;
use crate::level::CompressionLevel;
use crate::options::StreamFormat;

/// Return code of one transform call.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TransformStatus {
    /// Progress was made, or may be made with more room.
    Ok,
    /// No progress was possible with the buffers supplied.
    BufError,
    /// The logical end of the stream was reached.
    StreamEnd,
}

impl From<Status> for TransformStatus {
    fn from(status: Status) -> Self {
        match status {
            Status::Ok => Self::Ok,
            Status::BufError => Self::BufError,
            Status::StreamEnd => Self::StreamEnd,
        }
    }
}

/// Flush request passed to a transform call.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum TransformFlush {
    /// Let the transform buffer as it sees fit.
    #[default]
    None,
    /// Emit everything consumed so far, aligned to a byte boundary.
    Sync,
    /// Emit everything and terminate the stream.
    Finish,
}

/// Category of a transform failure.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FailureKind {
    /// Malformed or inconsistent data.
    Data,
    /// The transform could not allocate working memory.
    Memory,
}

/// Failure reported by a transform, carrying its diagnostic message.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TransformFailure {
    /// Category of the failure.
    pub kind: FailureKind,
    /// Diagnostic message produced by the transform.
    pub message: String,
}

impl TransformFailure {
    /// Classifies a diagnostic message produced by the backend.
    #[must_use]
    pub fn from_message(message: impl Into<String>) -> Self {
        let message = message.into();
        let kind = if message.contains("memory") {
            FailureKind::Memory
        } else {
            FailureKind::Data
        };
        Self { kind, message }
    }
}

impl fmt::Display for TransformFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for TransformFailure {}

impl From<TransformFailure> for CodecError {
    fn from(failure: TransformFailure) -> Self {
        match failure.kind {
            FailureKind::Data => Self::TransformDataError {
                message: failure.message,
            },
            FailureKind::Memory => Self::TransformMemoryError {
                message: failure.message,
            },
        }
    }
}

/// Incremental byte transform driven by the codec engine.
pub trait Transform: Send {
    /// Runs the transform once over `input`, writing into `output`.
    fn run(
        &mut self,
        input: &[u8],
        output: &mut [u8],
        flush: TransformFlush,
    ) -> Result<TransformStatus, TransformFailure>;

    /// Total bytes consumed since creation.
    fn total_in(&self) -> u64;

    /// Total bytes produced since creation.
    fn total_out(&self) -> u64;

    /// Short name used in log records.
    fn kind(&self) -> &'static str;
}

/// Compressing transform backed by [`flate2::Compress`].
pub struct Deflater {
    inner: Compress,
}

impl Deflater {
    /// Creates a compressor for `format` at `level`.
    #[must_use]
    pub fn new(level: CompressionLevel, format: StreamFormat) -> Self {
        Self {
            inner: Compress::new(Compression::from(level), format.has_zlib_header()),
        }
    }
}

impl fmt::Debug for Deflater {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deflater")
            .field("total_in", &self.inner.total_in())
            .field("total_out", &self.inner.total_out())
            .finish()
    }
}

impl Transform for Deflater {
    fn run(
        &mut self,
        input: &[u8],
        output: &mut [u8],
        flush: TransformFlush,
    ) -> Result<TransformStatus, TransformFailure> {
        let flush = match flush {
            TransformFlush::None => FlushCompress::None,
            TransformFlush::Sync => FlushCompress::Sync,
            TransformFlush::Finish => FlushCompress::Finish,
        };
        self.inner
            .compress(input, output, flush)
            .map(TransformStatus::from)
            .map_err(|err| TransformFailure::from_message(err.to_string()))
    }

    fn total_in(&self) -> u64 {
        self.inner.total_in()
    }

    fn total_out(&self) -> u64 {
        self.inner.total_out()
    }

    fn kind(&self) -> &'static str {
        "deflate"
    }
}

/// Decompressing transform backed by [`flate2::Decompress`].
///
/// Flush requests are ignored; the inflater always consumes as much input as
/// the output room allows.
pub struct Inflater {
    inner: Decompress,
}

impl Inflater {
    /// Creates a decompressor for `format`.
    #[must_use]
    pub fn new(format: StreamFormat) -> Self {
        Self {
            inner: Decompress::new(format.has_zlib_header()),
        }
    }
}

impl fmt::Debug for Inflater {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Inflater")
            .field("total_in", &self.inner.total_in())
            .field("total_out", &self.inner.total_out())
            .finish()
    }
}

impl Transform for Inflater {
    fn run(
        &mut self,
        input: &[u8],
        output: &mut [u8],
        _flush: TransformFlush,
    ) -> Result<TransformStatus, TransformFailure> {
        self.inner
            .decompress(input, output, FlushDecompress::None)
            .map(TransformStatus::from)
            .map_err(|err| TransformFailure::from_message(err.to_string()))
    }

    fn total_in(&self) -> u64 {
        self.inner.total_in()
    }

    fn total_out(&self) -> u64 {
        self.inner.total_out()
    }

    fn kind(&self) -> &'static str {
        "inflate"
    }
}
