#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `gzstream` bundles the workspace crates behind one dependency:
//!
//! - [`compress`] holds the codec engine, the streaming
//!   [`InflateStream`]/[`DeflateStream`] adapters, the byte transports and
//!   the whole-file gzip reader and writer.
//! - [`events`] holds the readiness events, the per-stream notifier and the
//!   cooperative [`RunLoop`] that delivers events to observers.
//! - [`logging`] holds the tracing targets and subscriber setup.
//!
//! The most common types are re-exported at the crate root.
//!
//! # Examples
//!
//! Decoding a compressed stream on a run loop:
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use std::time::Duration;
//!
//! use gzstream::{
//!     CompressionLevel, InflateStream, MemorySource, RunLoop, StreamObserver, compress_to_vec,
//! };
//!
//! struct Collect(Rc<RefCell<(Vec<u8>, bool)>>);
//!
//! impl StreamObserver<InflateStream<MemorySource>> for Collect {
//!     fn on_readable(&mut self, stream: &mut InflateStream<MemorySource>) {
//!         let mut buf = [0u8; 64];
//!         while let Ok(n @ 1..) = stream.read(&mut buf) {
//!             self.0.borrow_mut().0.extend_from_slice(&buf[..n]);
//!         }
//!     }
//!
//!     fn on_end(&mut self, _stream: &mut InflateStream<MemorySource>) {
//!         self.0.borrow_mut().1 = true;
//!     }
//! }
//!
//! let compressed = compress_to_vec(b"scheduled", CompressionLevel::Default).unwrap();
//! let state = Rc::new(RefCell::new((Vec::new(), false)));
//! let mut run_loop = RunLoop::new();
//! run_loop.schedule(
//!     InflateStream::from_compressed_data(compressed),
//!     Collect(Rc::clone(&state)),
//! );
//! assert!(run_loop.run_until(Duration::from_secs(5), |_| state.borrow().1));
//! assert_eq!(state.borrow().0, b"scheduled");
//! ```

pub use compress;
pub use events;
pub use logging;

pub use compress::{
    ByteSink, ByteSource, CodecError, CodecStatus, CompressionLevel, DeflateStream, EngineMonitor,
    ErrorCode, FinishState, GzipFileReader, GzipFileWriter, GzipHeader, InflateStream, IoSink,
    IoSource, MemorySink, MemorySource, PipeReader, PipeWriter, StreamFormat, StreamOptions,
    compress_to_vec, decompress_to_vec, pipe,
};
pub use events::{FnObserver, RunLoop, RunLoopSource, StreamEvent, StreamObserver, Token, Turn};
pub use logging::{VerbosityConfig, init_tracing};
