//! crates/logging/src/tracing_macros.rs
//! Convenience macros for gzstream-specific tracing.
//!
//! Each macro pins the target and level for one subsystem; the arguments are
//! forwarded verbatim to the matching `tracing` macro, so structured fields
//! work as usual. Callers must depend on `tracing` themselves.

/// Emit a per-pump transform trace.
///
/// # Example
/// ```ignore
/// trace_engine!(consumed, produced, "pump");
/// ```
#[macro_export]
macro_rules! trace_engine {
    ($($arg:tt)*) => {
        ::tracing::trace!(target: "gzstream::engine", $($arg)*);
    };
}

/// Emit a codec status transition.
///
/// # Example
/// ```ignore
/// trace_status!(from = %old, to = %new, "status change");
/// ```
#[macro_export]
macro_rules! trace_status {
    ($($arg:tt)*) => {
        ::tracing::debug!(target: "gzstream::status", $($arg)*);
    };
}

/// Emit a decompression adapter trace.
///
/// # Example
/// ```ignore
/// trace_inflate!(bytes = n, "served plain bytes");
/// ```
#[macro_export]
macro_rules! trace_inflate {
    ($($arg:tt)*) => {
        ::tracing::debug!(target: "gzstream::inflate", $($arg)*);
    };
}

/// Emit a compression adapter trace.
///
/// # Example
/// ```ignore
/// trace_deflate!(bytes = n, "forwarded compressed bytes");
/// ```
#[macro_export]
macro_rules! trace_deflate {
    ($($arg:tt)*) => {
        ::tracing::debug!(target: "gzstream::deflate", $($arg)*);
    };
}

/// Emit a whole-file gzip trace.
///
/// # Example
/// ```ignore
/// trace_file!(path = %path.display(), "opened gzip file");
/// ```
#[macro_export]
macro_rules! trace_file {
    ($($arg:tt)*) => {
        ::tracing::debug!(target: "gzstream::file", $($arg)*);
    };
}

/// Emit a readiness/scheduling trace.
///
/// # Example
/// ```ignore
/// trace_events!(source = %id, "source scheduled");
/// ```
#[macro_export]
macro_rules! trace_events {
    ($($arg:tt)*) => {
        ::tracing::trace!(target: "gzstream::events", $($arg)*);
    };
}

/// Emit a codec failure warning.
///
/// # Example
/// ```ignore
/// warn_codec!(error = %err, "transform failed");
/// ```
#[macro_export]
macro_rules! warn_codec {
    ($($arg:tt)*) => {
        ::tracing::warn!(target: "gzstream::error", $($arg)*);
    };
}
