//! crates/events/src/event.rs
//!
//! Readiness events posted by adapters to their observers.

use std::fmt;

/// Notification emitted by a stream adapter.
///
/// The error payload is generic so the scheduling layer stays independent of
/// the codec error taxonomy.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum StreamEvent<E> {
    /// The stream finished opening its transport and transform.
    OpenCompleted,
    /// Plain bytes can be read without waiting.
    HasBytesAvailable,
    /// The stream can accept more bytes without waiting.
    HasSpaceAvailable,
    /// The stream reached its logical end.
    EndEncountered,
    /// The stream failed; no further events other than this one follow.
    ErrorOccurred(E),
}

impl<E> StreamEvent<E> {
    /// Returns a short name used in diagnostics.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::OpenCompleted => "open-completed",
            Self::HasBytesAvailable => "has-bytes-available",
            Self::HasSpaceAvailable => "has-space-available",
            Self::EndEncountered => "end-encountered",
            Self::ErrorOccurred(_) => "error-occurred",
        }
    }

    /// Reports whether this event ends the stream's event sequence.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::EndEncountered | Self::ErrorOccurred(_))
    }

    /// Reports whether `other` is the same kind of event, ignoring payloads.
    #[must_use]
    pub fn same_kind(&self, other: &Self) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

impl<E> fmt::Display for StreamEvent<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
