//! Error taxonomy shared by every adapter in the crate.
//!
//! Errors are `Clone` so an adapter can keep the first failure as a sticky
//! value and hand the same error back on every later call.

use std::convert::Infallible;
use std::fmt;
use std::io;

use thiserror::Error;

use crate::options::BufferKind;

/// Fieldless discriminant of [`CodecError`], convenient for comparisons.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ErrorCode {
    /// See [`CodecError::TransformInitFailed`].
    TransformInitFailed,
    /// See [`CodecError::TransformDataError`].
    TransformDataError,
    /// See [`CodecError::TransformMemoryError`].
    TransformMemoryError,
    /// See [`CodecError::TransportReadError`].
    TransportReadError,
    /// See [`CodecError::TransportWriteError`].
    TransportWriteError,
    /// See [`CodecError::BufferCapacityInvalid`].
    BufferCapacityInvalid,
    /// See [`CodecError::InvalidCompressionLevel`].
    InvalidCompressionLevel,
    /// See [`CodecError::OptionsLocked`].
    OptionsLocked,
    /// See [`CodecError::FinishCalledTwice`].
    FinishCalledTwice,
    /// See [`CodecError::OperationAfterClose`].
    OperationAfterClose,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Errors reported by the codec engine and its adapters.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum CodecError {
    /// The transform (or the gzip file behind it) could not be set up.
    #[error("failed to initialise the transform: {message}")]
    TransformInitFailed {
        /// Diagnostic from the failing call.
        message: String,
    },
    /// The compressed input is malformed or truncated.
    #[error("malformed compressed data: {message}")]
    TransformDataError {
        /// Diagnostic reported by the transform.
        message: String,
    },
    /// The transform ran out of memory.
    #[error("transform ran out of memory: {message}")]
    TransformMemoryError {
        /// Diagnostic reported by the transform.
        message: String,
    },
    /// The upstream transport failed while being read.
    #[error("transport read failed: {message}")]
    TransportReadError {
        /// Kind of the underlying I/O error.
        kind: io::ErrorKind,
        /// Message of the underlying I/O error.
        message: String,
    },
    /// The downstream transport failed while being written.
    #[error("transport write failed: {message}")]
    TransportWriteError {
        /// Kind of the underlying I/O error.
        kind: io::ErrorKind,
        /// Message of the underlying I/O error.
        message: String,
    },
    /// A configured buffer capacity is not positive.
    #[error("{buffer} buffer capacity must be positive, got {requested}")]
    BufferCapacityInvalid {
        /// Buffer the capacity was requested for.
        buffer: BufferKind,
        /// Rejected capacity.
        requested: usize,
    },
    /// A compression level outside `-1..=9` was requested.
    #[error("compression level {level} is outside the supported range -1..=9")]
    InvalidCompressionLevel {
        /// Rejected level.
        level: i32,
    },
    /// Options were changed after the stream left `NotOpen`.
    #[error("stream options can only be changed before the stream is opened")]
    OptionsLocked,
    /// `finish` was requested a second time.
    #[error("finish was already requested for this stream")]
    FinishCalledTwice,
    /// The stream was used after it had been closed.
    #[error("the stream has already been closed")]
    OperationAfterClose,
}

impl CodecError {
    /// Returns the fieldless code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::TransformInitFailed { .. } => ErrorCode::TransformInitFailed,
            Self::TransformDataError { .. } => ErrorCode::TransformDataError,
            Self::TransformMemoryError { .. } => ErrorCode::TransformMemoryError,
            Self::TransportReadError { .. } => ErrorCode::TransportReadError,
            Self::TransportWriteError { .. } => ErrorCode::TransportWriteError,
            Self::BufferCapacityInvalid { .. } => ErrorCode::BufferCapacityInvalid,
            Self::InvalidCompressionLevel { .. } => ErrorCode::InvalidCompressionLevel,
            Self::OptionsLocked => ErrorCode::OptionsLocked,
            Self::FinishCalledTwice => ErrorCode::FinishCalledTwice,
            Self::OperationAfterClose => ErrorCode::OperationAfterClose,
        }
    }

    /// Wraps an upstream transport failure.
    #[must_use]
    pub fn transport_read(err: &io::Error) -> Self {
        Self::TransportReadError {
            kind: err.kind(),
            message: err.to_string(),
        }
    }

    /// Wraps a downstream transport failure.
    #[must_use]
    pub fn transport_write(err: &io::Error) -> Self {
        Self::TransportWriteError {
            kind: err.kind(),
            message: err.to_string(),
        }
    }

    /// Builds a [`CodecError::TransformDataError`].
    pub fn data(message: impl Into<String>) -> Self {
        Self::TransformDataError {
            message: message.into(),
        }
    }

    /// Reports whether the failure came from a transport rather than the
    /// transform, which is the case where retrying may make sense.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::TransportReadError { .. } | Self::TransportWriteError { .. }
        )
    }

    /// Reports whether the error is a configuration error that never
    /// changes the stream's status.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::BufferCapacityInvalid { .. }
                | Self::InvalidCompressionLevel { .. }
                | Self::OptionsLocked
        )
    }
}

impl From<Infallible> for CodecError {
    fn from(never: Infallible) -> Self {
        match never {}
    }
}

impl From<CodecError> for io::Error {
    fn from(err: CodecError) -> Self {
        let kind = match &err {
            CodecError::TransformDataError { .. } => io::ErrorKind::InvalidData,
            CodecError::TransformMemoryError { .. } => io::ErrorKind::OutOfMemory,
            CodecError::TransformInitFailed { .. } => io::ErrorKind::Other,
            CodecError::TransportReadError { kind, .. }
            | CodecError::TransportWriteError { kind, .. } => *kind,
            CodecError::BufferCapacityInvalid { .. }
            | CodecError::InvalidCompressionLevel { .. }
            | CodecError::OptionsLocked
            | CodecError::FinishCalledTwice => io::ErrorKind::InvalidInput,
            CodecError::OperationAfterClose => io::ErrorKind::BrokenPipe,
        };
        Self::new(kind, err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_errors_keep_io_kind() {
        let source = io::Error::new(io::ErrorKind::ConnectionReset, "peer went away");
        let err = CodecError::transport_read(&source);
        assert_eq!(err.code(), ErrorCode::TransportReadError);
        assert!(err.is_transport());
        let back: io::Error = err.into();
        assert_eq!(back.kind(), io::ErrorKind::ConnectionReset);
    }

    #[test]
    fn data_errors_map_to_invalid_data() {
        let err: io::Error = CodecError::data("bad block").into();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        assert!(err.to_string().contains("bad block"));
    }

    #[test]
    fn configuration_errors_are_flagged() {
        assert!(CodecError::OptionsLocked.is_configuration());
        assert!(
            CodecError::BufferCapacityInvalid {
                buffer: BufferKind::Input,
                requested: 0
            }
            .is_configuration()
        );
        assert!(!CodecError::FinishCalledTwice.is_configuration());
    }

    #[test]
    fn display_names_buffer() {
        let err = CodecError::BufferCapacityInvalid {
            buffer: BufferKind::Output,
            requested: 0,
        };
        assert_eq!(err.to_string(), "output buffer capacity must be positive, got 0");
    }

    #[test]
    fn closed_stream_maps_to_broken_pipe() {
        let err: io::Error = CodecError::OperationAfterClose.into();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }
}
