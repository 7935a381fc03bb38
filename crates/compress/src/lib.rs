#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `compress` adapts an incremental deflate engine to byte-stream shaped
//! interfaces. [`InflateStream`] pulls compressed bytes from a
//! [`ByteSource`] and serves plain bytes; [`DeflateStream`] accepts plain
//! bytes and pushes compressed bytes into a [`ByteSink`]. Both reconcile the
//! pace of their caller, the pace of their transport and the pace of the
//! transform without blocking.
//!
//! # Design
//!
//! - A single generic [`CodecEngine`] owns the transform (`flate2`'s
//!   low-level [`Compress`](flate2::Compress) and
//!   [`Decompress`](flate2::Decompress) state machines behind the
//!   [`Transform`] trait), the input and output staging buffers, and the
//!   cursors into them. Each adapter composes one engine and implements only
//!   its half of the contract.
//! - Status, the sticky error and the running totals sit behind a mutex so an
//!   [`EngineMonitor`] on another thread can inspect or cancel the stream.
//!   Buffer contents are only touched by the owning adapter.
//! - Both adapters implement [`events::RunLoopSource`], so they can be
//!   scheduled on an [`events::RunLoop`] and report readiness to an observer
//!   kept in the run loop's registry.
//! - [`GzipFileReader`] and [`GzipFileWriter`] cover standalone `.gz` files
//!   through `flate2`'s gzip codec.
//!
//! # Invariants
//!
//! - Bytes reach the transform in the order they were offered and leave it in
//!   the order they were produced.
//! - `Closed` and `Error` are terminal. After `Error` every operation returns
//!   the first error; after `Closed` it returns
//!   [`CodecError::OperationAfterClose`].
//! - Configuration is accepted only while a stream is `NotOpen`.
//!
//! # Errors
//!
//! Operations return [`CodecError`]. Transform failures and transport
//! failures are distinct variants so callers can decide whether retrying the
//! transport makes sense. The [`std::io::Read`] and [`std::io::Write`]
//! implementations convert them into [`std::io::Error`].
//!
//! # Examples
//!
//! ```
//! use compress::{CodecStatus, DeflateStream, FinishState, InflateStream, MemorySink};
//!
//! let mut deflate = DeflateStream::new(MemorySink::new());
//! deflate.write(b"hello").unwrap();
//! assert_eq!(deflate.finish().unwrap(), FinishState::Complete);
//! let (sink, _) = deflate.finish_into_inner().unwrap();
//!
//! let mut inflate = InflateStream::from_compressed_data(sink.into_inner());
//! let mut plain = [0u8; 16];
//! let n = inflate.read(&mut plain).unwrap();
//! assert_eq!(&plain[..n], b"hello");
//! assert_eq!(inflate.read(&mut plain).unwrap(), 0);
//! assert_eq!(inflate.status(), CodecStatus::AtEnd);
//! ```

mod counting;
mod deflate;
mod engine;
mod error;
pub mod file;
mod inflate;
mod level;
mod options;
mod status;
pub mod transform;
pub mod transport;
pub mod zlib;

pub use deflate::{DeflateStream, FinishState};
pub use engine::{CodecEngine, PumpOutcome};
pub use error::{CodecError, ErrorCode};
pub use file::{GzipFileReader, GzipFileWriter, GzipHeader};
pub use inflate::InflateStream;
pub use level::{CompressionLevel, CompressionLevelError};
pub use options::{BufferKind, DEFAULT_BUFFER_CAPACITY, StreamFormat, StreamOptions};
pub use status::{CodecStatus, EngineMonitor, Totals};
pub use transform::{Deflater, Inflater, Transform, TransformFlush, TransformStatus};
pub use transport::{
    ByteSink, ByteSource, IoSink, IoSource, MemorySink, MemorySource, PipeReader, PipeWriter, pipe,
};
pub use zlib::{compress_to_vec, decompress_to_vec};
