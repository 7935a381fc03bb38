//! crates/compress/src/status.rs
//!
//! Lifecycle status shared between an adapter and the threads observing it.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use logging::{trace_status, warn_codec};

use crate::error::CodecError;

/// Lifecycle of an engine or adapter.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum CodecStatus {
    /// Constructed; options may still change.
    #[default]
    NotOpen,
    /// The transport is being opened.
    Opening,
    /// The transform is initialised and bytes flow.
    Open,
    /// The transform signalled the logical end and every output byte drained.
    AtEnd,
    /// Closed explicitly; buffers and transform state were released.
    Closed,
    /// A transform or transport failure stopped the stream.
    Error,
}

impl CodecStatus {
    /// Reports whether no further bytes can ever be accepted or produced.
    #[must_use]
    pub const fn is_terminated(self) -> bool {
        matches!(self, Self::Closed | Self::Error)
    }

    /// Reports whether options can still be changed.
    #[must_use]
    pub const fn is_configurable(self) -> bool {
        matches!(self, Self::NotOpen)
    }

    const fn name(self) -> &'static str {
        match self {
            Self::NotOpen => "not-open",
            Self::Opening => "opening",
            Self::Open => "open",
            Self::AtEnd => "at-end",
            Self::Closed => "closed",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for CodecStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Running byte counters of a transform.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Totals {
    /// Bytes consumed by the transform.
    pub total_in: u64,
    /// Bytes produced by the transform.
    pub total_out: u64,
}

/// State guarded by the engine mutex.
#[derive(Debug, Default)]
pub(crate) struct Shared {
    pub(crate) status: CodecStatus,
    pub(crate) error: Option<CodecError>,
    pub(crate) totals: Totals,
}

impl Shared {
    /// Moves to `to` if the lifecycle allows it and reports whether it did.
    pub(crate) fn transition(&mut self, to: CodecStatus) -> bool {
        use CodecStatus::{AtEnd, Closed, Error, NotOpen, Open, Opening};

        let from = self.status;
        let allowed = match (from, to) {
            (NotOpen, Opening) | (Opening, Open) | (Open, AtEnd) => true,
            (Closed, Closed) => false,
            (_, Closed) => true,
            (Closed | Error, _) => false,
            (_, Error) => true,
            _ => false,
        };
        if allowed {
            trace_status!(from = %from, to = %to, "status transition");
            self.status = to;
        }
        allowed
    }

    /// Records `err` and moves to `Error`, keeping an earlier error if one
    /// was already recorded. Returns the error callers should report.
    pub(crate) fn fail(&mut self, err: CodecError) -> CodecError {
        if let Some(existing) = &self.error {
            return existing.clone();
        }
        if self.status == CodecStatus::Closed {
            return CodecError::OperationAfterClose;
        }
        warn_codec!(code = %err.code(), error = %err, "stream failed");
        self.transition(CodecStatus::Error);
        self.error = Some(err.clone());
        err
    }

    /// Error returned to callers once the stream has terminated.
    pub(crate) fn terminal_error(&self) -> Option<CodecError> {
        match self.status {
            CodecStatus::Error => Some(
                self.error
                    .clone()
                    .unwrap_or(CodecError::OperationAfterClose),
            ),
            CodecStatus::Closed => Some(CodecError::OperationAfterClose),
            _ => None,
        }
    }
}

/// Shared handle to the engine's guarded state.
#[derive(Clone, Debug, Default)]
pub(crate) struct StatusCell(Arc<Mutex<Shared>>);

impl StatusCell {
    pub(crate) fn lock(&self) -> MutexGuard<'_, Shared> {
        self.0.lock().expect("codec status mutex poisoned")
    }
}

/// Thread-safe view of a running engine.
///
/// Monitors are handed out by [`InflateStream::monitor`](crate::InflateStream::monitor)
/// and [`DeflateStream::monitor`](crate::DeflateStream::monitor). They observe
/// status, the sticky error and the running totals from any thread, and can
/// cancel the stream. Cancellation takes the same mutex that serialises pumps,
/// so it never interleaves with a transform call; the owning adapter releases
/// its buffers on its next operation.
#[derive(Clone, Debug)]
pub struct EngineMonitor {
    cell: StatusCell,
}

impl EngineMonitor {
    pub(crate) const fn new(cell: StatusCell) -> Self {
        Self { cell }
    }

    /// Returns the current status.
    #[must_use]
    pub fn status(&self) -> CodecStatus {
        self.cell.lock().status
    }

    /// Returns the sticky error, if any.
    #[must_use]
    pub fn error(&self) -> Option<CodecError> {
        self.cell.lock().error.clone()
    }

    /// Returns the running transform totals.
    #[must_use]
    pub fn totals(&self) -> Totals {
        self.cell.lock().totals
    }

    /// Moves the stream to `Closed`. Returns `false` when it was already closed.
    pub fn cancel(&self) -> bool {
        self.cell.lock().transition(CodecStatus::Closed)
    }
}
