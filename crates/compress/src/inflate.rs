//! crates/compress/src/inflate.rs
//!
//! Decompression adapter: pulls compressed bytes from a [`ByteSource`] and
//! serves the plain bytes to its consumer.

use std::io;

use events::{EventNotifier, NotifierState, RunLoopSource, StreamEvent, Turn, WakeHandle};
use logging::trace_inflate;

use crate::engine::{CodecEngine, PumpOutcome};
use crate::error::CodecError;
use crate::options::{BufferKind, StreamFormat, StreamOptions, validate_capacity};
use crate::status::{CodecStatus, EngineMonitor};
use crate::transform::{Inflater, TransformFlush};
use crate::transport::{ByteSource, MemorySource};

/// Pull stream of plain bytes decoded from a compressed [`ByteSource`].
///
/// Reads never block on the transport: when the source has nothing ready,
/// [`read`](Self::read) returns `Ok(0)` while [`status`](Self::status) stays
/// `Open`. A return of `Ok(0)` with status `AtEnd` marks the end of the plain
/// stream. The [`std::io::Read`] implementation reports the first case as
/// [`io::ErrorKind::WouldBlock`].
///
/// # Examples
///
/// ```
/// use compress::{CodecStatus, CompressionLevel, InflateStream, compress_to_vec};
///
/// let compressed = compress_to_vec(b"inflate me", CompressionLevel::Default).unwrap();
/// let mut stream = InflateStream::from_compressed_data(compressed);
/// let mut plain = [0u8; 32];
/// let n = stream.read(&mut plain).unwrap();
/// assert_eq!(&plain[..n], b"inflate me");
/// assert_eq!(stream.read(&mut plain).unwrap(), 0);
/// assert_eq!(stream.status(), CodecStatus::AtEnd);
/// ```
#[derive(Debug)]
pub struct InflateStream<S> {
    source: S,
    engine: CodecEngine<Inflater>,
    options: StreamOptions,
    notifier: EventNotifier<CodecError>,
    source_eof: bool,
    source_closed: bool,
}

impl InflateStream<MemorySource> {
    /// Creates a stream decoding an owned buffer of compressed bytes.
    #[must_use]
    pub fn from_compressed_data(data: Vec<u8>) -> Self {
        Self::new(MemorySource::new(data))
    }
}

impl<S: ByteSource> InflateStream<S> {
    /// Creates a stream over `source` with default options.
    pub fn new(source: S) -> Self {
        Self::build(source, StreamOptions::default())
    }

    /// Creates a stream over `source`, validating `options` first.
    pub fn with_options(source: S, options: StreamOptions) -> Result<Self, CodecError> {
        options.validate()?;
        Ok(Self::build(source, options))
    }

    fn build(source: S, options: StreamOptions) -> Self {
        Self {
            source,
            engine: CodecEngine::new(),
            options,
            notifier: EventNotifier::new(),
            source_eof: false,
            source_closed: false,
        }
    }

    /// Returns the configured options.
    pub const fn options(&self) -> &StreamOptions {
        &self.options
    }

    /// Sets the capacity of the compressed staging buffer.
    pub fn set_input_buffer_capacity(&mut self, capacity: usize) -> Result<(), CodecError> {
        self.engine.ensure_configurable()?;
        validate_capacity(BufferKind::Input, capacity)?;
        self.options.input_buffer_capacity = capacity;
        Ok(())
    }

    /// Sets the capacity of the plain staging buffer.
    pub fn set_output_buffer_capacity(&mut self, capacity: usize) -> Result<(), CodecError> {
        self.engine.ensure_configurable()?;
        validate_capacity(BufferKind::Output, capacity)?;
        self.options.output_buffer_capacity = capacity;
        Ok(())
    }

    /// Selects the framing of the compressed stream.
    pub fn set_format(&mut self, format: StreamFormat) -> Result<(), CodecError> {
        self.engine.ensure_configurable()?;
        self.options.format = format;
        Ok(())
    }

    /// Opens the transport and initialises the transform.
    ///
    /// Opening an already open stream does nothing. [`read`](Self::read)
    /// opens the stream on first use.
    pub fn open(&mut self) -> Result<(), CodecError> {
        if let Some(err) = self.engine.terminal_error() {
            return Err(err);
        }
        if !self.engine.begin_open() {
            return Ok(());
        }
        trace_inflate!(
            input_capacity = self.options.input_buffer_capacity,
            output_capacity = self.options.output_buffer_capacity,
            "opening decompression stream"
        );
        if let Err(err) = self.source.open() {
            return Err(self.raise(CodecError::transport_read(&err)));
        }
        let transform = Inflater::new(self.options.format);
        if let Err(err) = self.engine.initialize(
            transform,
            self.options.input_buffer_capacity,
            self.options.output_buffer_capacity,
        ) {
            return Err(self.raise(err));
        }
        self.notifier.post(StreamEvent::OpenCompleted);
        Ok(())
    }

    /// Reads plain bytes into `buf`.
    ///
    /// Returns `Ok(0)` at the end of the stream and when the transport has
    /// nothing ready; [`status`](Self::status) tells them apart. Once the
    /// stream failed every call returns the same error; once it was closed
    /// every call returns [`CodecError::OperationAfterClose`].
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize, CodecError> {
        if let Some(err) = self.engine.terminal_error() {
            return Err(err);
        }
        if self.engine.status() == CodecStatus::NotOpen {
            self.open()?;
        }
        if buf.is_empty() {
            return Ok(0);
        }
        loop {
            let served = self.engine.read_output(buf);
            if served > 0 {
                self.engine.settle();
                self.notifier.wake();
                return Ok(served);
            }
            if self.engine.settle() {
                return Ok(0);
            }
            if !self.step()? {
                return Ok(0);
            }
        }
    }

    /// Reports whether [`read`](Self::read) can return bytes without waiting.
    pub fn has_bytes_available(&self) -> bool {
        if self.engine.output_available() > 0 {
            return true;
        }
        let live = matches!(
            self.engine.status(),
            CodecStatus::NotOpen | CodecStatus::Opening | CodecStatus::Open
        );
        live && !self.engine.is_finished() && self.source.has_bytes_available()
    }

    /// Returns the current status.
    pub fn status(&self) -> CodecStatus {
        self.engine.status()
    }

    /// Returns the sticky error, if any.
    pub fn error(&self) -> Option<CodecError> {
        self.engine.error()
    }

    /// Returns a thread-safe view of this stream's engine.
    pub fn monitor(&self) -> EngineMonitor {
        self.engine.monitor()
    }

    /// Compressed bytes consumed so far.
    pub fn total_in(&self) -> u64 {
        self.engine.totals().total_in
    }

    /// Plain bytes produced so far.
    pub fn total_out(&self) -> u64 {
        self.engine.totals().total_out
    }

    /// Closes the stream and its transport, discarding buffered bytes.
    pub fn close(&mut self) {
        if self.engine.close() {
            trace_inflate!(total_in = self.total_in(), "decompression stream closed");
        }
        if !self.source_closed {
            self.source_closed = true;
            self.source.close();
        }
        self.notifier.clear();
        self.notifier.detach_waker();
    }

    /// Returns a reference to the transport.
    pub const fn get_ref(&self) -> &S {
        &self.source
    }

    /// Returns a mutable reference to the transport.
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Returns the transport, dropping the engine.
    pub fn into_inner(self) -> S {
        self.source
    }

    /// Pulls one batch from the transport and pumps once. Returns whether
    /// anything moved.
    fn step(&mut self) -> Result<bool, CodecError> {
        if self.engine.is_finished() {
            return Ok(false);
        }
        let mut progressed = false;
        if !self.source_eof {
            let slot = self.engine.input_slot();
            if !slot.is_empty() {
                match self.source.read(slot) {
                    Ok(0) => {
                        trace_inflate!("transport reached end of stream");
                        self.source_eof = true;
                        progressed = true;
                    }
                    Ok(read) => {
                        self.engine.commit_input(read);
                        progressed = true;
                    }
                    Err(err)
                        if matches!(
                            err.kind(),
                            io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
                        ) => {}
                    Err(err) => return Err(self.raise(CodecError::transport_read(&err))),
                }
            }
        }
        match self.engine.pump(TransformFlush::None) {
            Ok(PumpOutcome::Progress) => Ok(true),
            Ok(PumpOutcome::StreamEnd) => {
                trace_inflate!(total_out = self.total_out(), "transform reached end of stream");
                Ok(true)
            }
            Ok(PumpOutcome::OutputFull) => Ok(progressed),
            Ok(PumpOutcome::NeedsInput) if self.source_eof => Err(self.raise(CodecError::data(
                "compressed stream ended before its end marker",
            ))),
            Ok(PumpOutcome::NeedsInput) => Ok(progressed),
            Err(err) => Err(self.raise(err)),
        }
    }

    fn raise(&mut self, err: CodecError) -> CodecError {
        let err = self.engine.fail(err);
        self.notifier.post(StreamEvent::ErrorOccurred(err.clone()));
        err
    }
}

impl<S: ByteSource> io::Read for InflateStream<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match Self::read(self, buf) {
            Ok(0) if !buf.is_empty() && self.engine.status() != CodecStatus::AtEnd => {
                Err(io::ErrorKind::WouldBlock.into())
            }
            Ok(read) => Ok(read),
            Err(err) => Err(err.into()),
        }
    }
}

impl<S: ByteSource> RunLoopSource for InflateStream<S> {
    type Error = CodecError;

    fn perform(&mut self) -> Turn {
        match self.engine.status() {
            CodecStatus::Closed | CodecStatus::Error => return Turn::Idle,
            CodecStatus::AtEnd => {
                self.notifier.post(StreamEvent::EndEncountered);
                self.notifier.set_state(NotifierState::Idle);
                return Turn::Idle;
            }
            CodecStatus::NotOpen => {
                if self.open().is_err() {
                    return Turn::Idle;
                }
            }
            CodecStatus::Opening | CodecStatus::Open => {}
        }
        if self.engine.terminal_error().is_some() {
            return Turn::Idle;
        }

        let progressed = if self.engine.output_available() > 0 {
            false
        } else {
            match self.step() {
                Ok(progressed) => progressed,
                Err(_) => return Turn::Idle,
            }
        };

        if self.engine.output_available() > 0 {
            self.notifier.post(StreamEvent::HasBytesAvailable);
            self.notifier.set_state(NotifierState::Idle);
            Turn::Idle
        } else if self.engine.settle() {
            self.notifier.post(StreamEvent::EndEncountered);
            self.notifier.set_state(NotifierState::Idle);
            Turn::Idle
        } else if progressed {
            Turn::Again
        } else {
            self.notifier
                .set_state(NotifierState::WaitingForTransportReadable);
            Turn::Idle
        }
    }

    fn attach_waker(&mut self, waker: WakeHandle) {
        self.source.set_waker(waker.clone());
        self.notifier.attach_waker(waker);
    }

    fn detach_waker(&mut self) {
        self.notifier.detach_waker();
    }

    fn take_events(&mut self) -> Vec<StreamEvent<CodecError>> {
        self.notifier.take_pending()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::CompressionLevel;
    use crate::zlib::compress_to_vec;

    fn read_all<S: ByteSource>(stream: &mut InflateStream<S>, chunk: usize) -> Vec<u8> {
        let mut plain = Vec::new();
        let mut buf = vec![0u8; chunk];
        loop {
            let n = stream.read(&mut buf).expect("read");
            if n == 0 {
                assert_eq!(stream.status(), CodecStatus::AtEnd);
                return plain;
            }
            plain.extend_from_slice(&buf[..n]);
        }
    }

    #[test]
    fn decodes_with_tiny_buffers() {
        let payload = b"tiny staging buffers still decode everything".repeat(20);
        let compressed = compress_to_vec(&payload, CompressionLevel::Best).expect("compress");
        let options = StreamOptions::default().with_buffer_capacity(3);
        let mut stream =
            InflateStream::with_options(MemorySource::new(compressed), options).expect("options");
        assert_eq!(read_all(&mut stream, 5), payload);
        assert_eq!(stream.total_out(), payload.len() as u64);
    }

    #[test]
    fn end_is_reported_repeatedly_without_error() {
        let compressed = compress_to_vec(b"", CompressionLevel::Default).expect("compress");
        let mut stream = InflateStream::from_compressed_data(compressed);
        let mut buf = [0u8; 8];
        assert_eq!(stream.read(&mut buf).expect("first read"), 0);
        assert_eq!(stream.status(), CodecStatus::AtEnd);
        assert_eq!(stream.read(&mut buf).expect("second read"), 0);
        assert!(stream.error().is_none());
    }

    #[test]
    fn truncated_input_is_a_data_error() {
        let compressed =
            compress_to_vec(&b"truncated stream".repeat(10), CompressionLevel::Default)
                .expect("compress");
        let cut = compressed[..compressed.len() / 2].to_vec();
        let mut stream = InflateStream::from_compressed_data(cut);
        let mut buf = [0u8; 512];
        let err = loop {
            match stream.read(&mut buf) {
                Ok(0) => panic!("truncated stream reported a clean end"),
                Ok(_) => {}
                Err(err) => break err,
            }
        };
        assert!(matches!(err, CodecError::TransformDataError { .. }));
        assert_eq!(stream.status(), CodecStatus::Error);
        assert_eq!(stream.read(&mut buf), Err(err));
    }

    #[test]
    fn options_lock_once_open() {
        let mut stream = InflateStream::from_compressed_data(Vec::new());
        stream.set_input_buffer_capacity(64).expect("configurable");
        assert!(matches!(
            stream.set_output_buffer_capacity(0),
            Err(CodecError::BufferCapacityInvalid { buffer: BufferKind::Output, .. })
        ));
        stream.open().expect("open");
        assert_eq!(stream.status(), CodecStatus::Open);
        assert_eq!(stream.set_input_buffer_capacity(32), Err(CodecError::OptionsLocked));
        assert_eq!(stream.status(), CodecStatus::Open);
    }

    #[test]
    fn read_after_close_is_rejected() {
        let compressed = compress_to_vec(b"closing", CompressionLevel::Fast).expect("compress");
        let mut stream = InflateStream::from_compressed_data(compressed);
        stream.close();
        assert_eq!(stream.status(), CodecStatus::Closed);
        assert_eq!(
            stream.read(&mut [0u8; 4]),
            Err(CodecError::OperationAfterClose)
        );
    }

    #[test]
    fn transport_failures_keep_their_kind() {
        struct Broken;

        impl ByteSource for Broken {
            fn has_bytes_available(&self) -> bool {
                true
            }

            fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset"))
            }
        }

        let mut stream = InflateStream::new(Broken);
        let err = stream.read(&mut [0u8; 4]).expect_err("transport failure");
        assert!(err.is_transport());
        assert!(matches!(
            err,
            CodecError::TransportReadError { kind: io::ErrorKind::ConnectionReset, .. }
        ));
    }

    #[test]
    fn io_read_reports_would_block_for_idle_transport() {
        let (_writer, reader) = crate::transport::pipe(16);
        let mut stream = InflateStream::new(reader);
        let err = io::Read::read(&mut stream, &mut [0u8; 4]).expect_err("nothing ready");
        assert_eq!(err.kind(), io::ErrorKind::WouldBlock);
        assert_eq!(stream.status(), CodecStatus::Open);
    }
}
