//! crates/compress/src/deflate.rs
//!
//! Compression adapter: accepts plain bytes from a producer and forwards the
//! compressed bytes to a [`ByteSink`].

use std::io;

use events::{EventNotifier, NotifierState, RunLoopSource, StreamEvent, Turn, WakeHandle};
use logging::trace_deflate;

use crate::engine::{CodecEngine, PumpOutcome};
use crate::error::CodecError;
use crate::level::CompressionLevel;
use crate::options::{BufferKind, StreamFormat, StreamOptions, validate_capacity};
use crate::status::{CodecStatus, EngineMonitor};
use crate::transform::{Deflater, TransformFlush};
use crate::transport::ByteSink;

/// Progress of a [`DeflateStream::finish`] request.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FinishState {
    /// Trailing bytes are still waiting for the sink; call
    /// [`DeflateStream::poll_finish`] once it has room.
    Pending,
    /// Every compressed byte reached the sink and the stream is `AtEnd`.
    Complete,
}

/// Progress of a sync flush requested through [`DeflateStream::flush`].
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
enum SyncPhase {
    #[default]
    Idle,
    /// `Sync` is issued until the transform has taken every staged byte.
    Requested,
    /// The sync point is inside the transform and is pulled out with plain
    /// pumps. A further `Sync` call would emit another empty block.
    Draining,
    /// The transform holds nothing back; the sink still has to flush.
    Drained,
}

/// Push stream compressing plain bytes into a [`ByteSink`].
///
/// The transform runs only when the sink can take its output, or when the
/// input staging buffer is full and output room remains. With a sink that
/// stays blocked, writes stop being accepted once both buffers are full:
/// [`write`](Self::write) then returns `Ok(0)` instead of buffering without
/// bound.
///
/// # Examples
///
/// ```
/// use compress::{DeflateStream, FinishState, MemorySink, decompress_to_vec};
///
/// let mut stream = DeflateStream::new(MemorySink::new());
/// assert_eq!(stream.write(b"deflate me").unwrap(), 10);
/// assert_eq!(stream.finish().unwrap(), FinishState::Complete);
/// let (sink, _) = stream.finish_into_inner().unwrap();
/// assert_eq!(decompress_to_vec(sink.data()).unwrap(), b"deflate me");
/// ```
#[derive(Debug)]
pub struct DeflateStream<K> {
    sink: K,
    engine: CodecEngine<Deflater>,
    options: StreamOptions,
    notifier: EventNotifier<CodecError>,
    finishing: bool,
    sync: SyncPhase,
    sink_closed: bool,
    bytes_forwarded: u64,
}

impl<K: ByteSink> DeflateStream<K> {
    /// Creates a stream over `sink` with default options.
    pub fn new(sink: K) -> Self {
        Self::build(sink, StreamOptions::default())
    }

    /// Creates a stream over `sink`, validating `options` first.
    pub fn with_options(sink: K, options: StreamOptions) -> Result<Self, CodecError> {
        options.validate()?;
        Ok(Self::build(sink, options))
    }

    fn build(sink: K, options: StreamOptions) -> Self {
        Self {
            sink,
            engine: CodecEngine::new(),
            options,
            notifier: EventNotifier::new(),
            finishing: false,
            sync: SyncPhase::Idle,
            sink_closed: false,
            bytes_forwarded: 0,
        }
    }

    /// Returns the configured options.
    pub const fn options(&self) -> &StreamOptions {
        &self.options
    }

    /// Sets the capacity of the plain staging buffer.
    pub fn set_input_buffer_capacity(&mut self, capacity: usize) -> Result<(), CodecError> {
        self.engine.ensure_configurable()?;
        validate_capacity(BufferKind::Input, capacity)?;
        self.options.input_buffer_capacity = capacity;
        Ok(())
    }

    /// Sets the capacity of the compressed staging buffer.
    pub fn set_output_buffer_capacity(&mut self, capacity: usize) -> Result<(), CodecError> {
        self.engine.ensure_configurable()?;
        validate_capacity(BufferKind::Output, capacity)?;
        self.options.output_buffer_capacity = capacity;
        Ok(())
    }

    /// Sets the compression level from a [`CompressionLevel`] or a zlib
    /// numeric level in `-1..=9`.
    ///
    /// # Errors
    ///
    /// [`CodecError::InvalidCompressionLevel`] for an out-of-range number and
    /// [`CodecError::OptionsLocked`] once the stream left `NotOpen`.
    pub fn set_compression_level<L>(&mut self, level: L) -> Result<(), CodecError>
    where
        L: TryInto<CompressionLevel>,
        CodecError: From<L::Error>,
    {
        self.engine.ensure_configurable()?;
        self.options.compression_level = level.try_into()?;
        Ok(())
    }

    /// Selects the framing of the compressed stream.
    pub fn set_format(&mut self, format: StreamFormat) -> Result<(), CodecError> {
        self.engine.ensure_configurable()?;
        self.options.format = format;
        Ok(())
    }

    /// Opens the transport and initialises the transform with the configured
    /// level. Opening an already open stream does nothing.
    pub fn open(&mut self) -> Result<(), CodecError> {
        if let Some(err) = self.engine.terminal_error() {
            return Err(err);
        }
        if !self.engine.begin_open() {
            return Ok(());
        }
        trace_deflate!(
            level = self.options.compression_level.numeric(),
            input_capacity = self.options.input_buffer_capacity,
            output_capacity = self.options.output_buffer_capacity,
            "opening compression stream"
        );
        if let Err(err) = self.sink.open() {
            return Err(self.raise(CodecError::transport_write(&err)));
        }
        let transform = Deflater::new(self.options.compression_level, self.options.format);
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

    /// Stages a prefix of `data` and forwards whatever compressed output the
    /// sink accepts. Returns the number of plain bytes accepted, which is zero
    /// once `finish` was requested or both buffers are full.
    pub fn write(&mut self, data: &[u8]) -> Result<usize, CodecError> {
        if let Some(err) = self.engine.terminal_error() {
            return Err(err);
        }
        if self.engine.status() == CodecStatus::NotOpen {
            self.open()?;
        }
        if self.finishing || data.is_empty() {
            return Ok(0);
        }
        let mut accepted = 0;
        loop {
            let staged = self.engine.write_input(&data[accepted..]);
            accepted += staged;
            let progressed = self.drive()?;
            if accepted == data.len() || (staged == 0 && !progressed) {
                break;
            }
        }
        if accepted > 0 {
            self.sync = match self.sync {
                SyncPhase::Draining => SyncPhase::Requested,
                SyncPhase::Drained => SyncPhase::Idle,
                phase => phase,
            };
            self.notifier.wake();
        }
        Ok(accepted)
    }

    /// Reports whether [`write`](Self::write) would accept at least one byte.
    pub fn has_space_available(&self) -> bool {
        if self.finishing {
            return false;
        }
        match self.engine.status() {
            CodecStatus::NotOpen => true,
            _ => self.engine.input_room() > 0,
        }
    }

    /// Emits every byte written so far, aligned to a byte boundary, without
    /// ending the stream.
    ///
    /// Returns `true` once the flushed bytes reached the sink; `false` means
    /// the sink pushed back and `flush` should be called again when it has
    /// room.
    pub fn flush(&mut self) -> Result<bool, CodecError> {
        if let Some(err) = self.engine.terminal_error() {
            return Err(err);
        }
        if self.engine.status() == CodecStatus::NotOpen {
            self.open()?;
        }
        if self.finishing {
            return Ok(self.poll_finish()? == FinishState::Complete);
        }
        if self.sync == SyncPhase::Idle {
            self.sync = SyncPhase::Requested;
        }
        self.drive()?;
        if self.sync != SyncPhase::Drained || self.engine.output_available() > 0 {
            return Ok(false);
        }
        match self.sink.flush() {
            Ok(()) => {
                self.sync = SyncPhase::Idle;
                Ok(true)
            }
            Err(err) if err.kind() == io::ErrorKind::WouldBlock => Ok(false),
            Err(err) => Err(self.raise(CodecError::transport_write(&err))),
        }
    }

    /// Stops accepting input and starts emitting the trailing bytes.
    ///
    /// Returns [`FinishState::Pending`] when the sink pushed back; drive the
    /// rest with [`poll_finish`](Self::poll_finish).
    ///
    /// # Errors
    ///
    /// [`CodecError::FinishCalledTwice`] on any call after the first, and the
    /// sticky error once the stream failed.
    pub fn finish(&mut self) -> Result<FinishState, CodecError> {
        if let Some(err) = self.engine.terminal_error() {
            return Err(err);
        }
        if self.finishing {
            return Err(CodecError::FinishCalledTwice);
        }
        if self.engine.status() == CodecStatus::NotOpen {
            self.open()?;
        }
        trace_deflate!(total_in = self.total_in(), "finish requested");
        self.finishing = true;
        self.sync = SyncPhase::Idle;
        self.poll_finish()
    }

    /// Continues a finish started by [`finish`](Self::finish). Safe to call
    /// repeatedly; returns `Complete` once the stream is `AtEnd`.
    pub fn poll_finish(&mut self) -> Result<FinishState, CodecError> {
        if let Some(err) = self.engine.terminal_error() {
            return Err(err);
        }
        if self.engine.status() == CodecStatus::AtEnd {
            return Ok(FinishState::Complete);
        }
        if !self.finishing {
            return self.finish();
        }
        self.drive()?;
        if !self.engine.is_finished() || self.engine.output_available() > 0 {
            return Ok(FinishState::Pending);
        }
        match self.sink.flush() {
            Ok(()) => {}
            Err(err) if err.kind() == io::ErrorKind::WouldBlock => {
                return Ok(FinishState::Pending);
            }
            Err(err) => return Err(self.raise(CodecError::transport_write(&err))),
        }
        self.engine.settle();
        trace_deflate!(
            total_in = self.total_in(),
            total_out = self.bytes_forwarded,
            "compression stream complete"
        );
        self.notifier.post(StreamEvent::EndEncountered);
        Ok(FinishState::Complete)
    }

    /// Finishes the stream against a sink that is always ready and returns
    /// the sink together with the number of compressed bytes it received.
    ///
    /// # Errors
    ///
    /// Besides the sticky error, a sink that stops accepting bytes before the
    /// trailer is written yields a [`CodecError::TransportWriteError`] of kind
    /// [`io::ErrorKind::WouldBlock`].
    pub fn finish_into_inner(mut self) -> Result<(K, u64), CodecError> {
        let mut state = if self.finishing {
            self.poll_finish()?
        } else {
            self.finish()?
        };
        while state == FinishState::Pending {
            let before = self.progress_marker();
            state = self.poll_finish()?;
            if state == FinishState::Pending && self.progress_marker() == before {
                let stalled = io::Error::new(
                    io::ErrorKind::WouldBlock,
                    "sink stopped accepting bytes before the stream finished",
                );
                return Err(self.raise(CodecError::transport_write(&stalled)));
            }
        }
        Ok((self.sink, self.bytes_forwarded))
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

    /// Plain bytes consumed by the transform so far.
    pub fn total_in(&self) -> u64 {
        self.engine.totals().total_in
    }

    /// Compressed bytes produced by the transform so far.
    pub fn total_out(&self) -> u64 {
        self.engine.totals().total_out
    }

    /// Compressed bytes the sink accepted so far.
    pub const fn bytes_forwarded(&self) -> u64 {
        self.bytes_forwarded
    }

    /// Closes the stream and its transport, discarding unsent output.
    pub fn close(&mut self) {
        if self.engine.close() {
            trace_deflate!(
                total_in = self.total_in(),
                forwarded = self.bytes_forwarded,
                "compression stream closed"
            );
        }
        if !self.sink_closed {
            self.sink_closed = true;
            self.sink.close();
        }
        self.notifier.clear();
        self.notifier.detach_waker();
    }

    /// Returns a reference to the transport.
    pub const fn get_ref(&self) -> &K {
        &self.sink
    }

    /// Returns a mutable reference to the transport.
    pub fn get_mut(&mut self) -> &mut K {
        &mut self.sink
    }

    /// Returns the transport without finishing the stream.
    pub fn into_inner(self) -> K {
        self.sink
    }

    fn progress_marker(&self) -> (u64, u64) {
        (self.bytes_forwarded, self.total_out())
    }

    /// Forwards buffered output and pumps while the sink keeps up. Returns
    /// whether any byte moved.
    fn drive(&mut self) -> Result<bool, CodecError> {
        let mut progressed = false;
        let mut output_blocked = false;
        loop {
            let drained = self.drain_output()?;
            progressed |= drained;
            if output_blocked && !drained {
                break;
            }
            output_blocked = false;
            if self.engine.is_finished() {
                break;
            }
            let flush = if self.finishing {
                TransformFlush::Finish
            } else if self.sync == SyncPhase::Requested {
                TransformFlush::Sync
            } else if self.sync == SyncPhase::Draining || self.engine.pending_input() > 0 {
                TransformFlush::None
            } else {
                break;
            };
            if !self.sink.has_space_available() && self.engine.input_room() > 0 {
                break;
            }
            match self.engine.pump(flush) {
                Ok(PumpOutcome::Progress) => {
                    progressed = true;
                    if flush == TransformFlush::Sync && self.engine.pending_input() == 0 {
                        self.sync = SyncPhase::Draining;
                    }
                }
                Ok(PumpOutcome::StreamEnd) => progressed = true,
                Ok(PumpOutcome::OutputFull) => output_blocked = true,
                Ok(PumpOutcome::NeedsInput) => {
                    if matches!(self.sync, SyncPhase::Requested | SyncPhase::Draining)
                        && self.engine.pending_input() == 0
                    {
                        self.sync = SyncPhase::Drained;
                    }
                    break;
                }
                Err(err) => return Err(self.raise(err)),
            }
        }
        Ok(progressed)
    }

    fn drain_output(&mut self) -> Result<bool, CodecError> {
        let mut drained = false;
        while self.engine.output_available() > 0 && self.sink.has_space_available() {
            match self.sink.write(self.engine.output_slice()) {
                Ok(0) => break,
                Ok(written) => {
                    self.engine.consume_output(written);
                    self.bytes_forwarded += written as u64;
                    drained = true;
                }
                Err(err)
                    if matches!(
                        err.kind(),
                        io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
                    ) =>
                {
                    break;
                }
                Err(err) => return Err(self.raise(CodecError::transport_write(&err))),
            }
        }
        Ok(drained)
    }

    fn raise(&mut self, err: CodecError) -> CodecError {
        let err = self.engine.fail(err);
        self.notifier.post(StreamEvent::ErrorOccurred(err.clone()));
        err
    }
}

impl<K: ByteSink> io::Write for DeflateStream<K> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match Self::write(self, buf) {
            Ok(0) if !buf.is_empty() => Err(io::ErrorKind::WouldBlock.into()),
            Ok(accepted) => Ok(accepted),
            Err(err) => Err(err.into()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match Self::flush(self) {
            Ok(true) => Ok(()),
            Ok(false) => Err(io::ErrorKind::WouldBlock.into()),
            Err(err) => Err(err.into()),
        }
    }
}

impl<K: ByteSink> RunLoopSource for DeflateStream<K> {
    type Error = CodecError;

    fn perform(&mut self) -> Turn {
        match self.engine.status() {
            CodecStatus::Closed | CodecStatus::Error => return Turn::Idle,
            CodecStatus::AtEnd => {
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

        let before = self.progress_marker();
        let outcome = if self.finishing {
            self.poll_finish().map(|_| ())
        } else {
            self.drive().map(|_| ())
        };
        if outcome.is_err() || self.engine.status() == CodecStatus::AtEnd {
            self.notifier.set_state(NotifierState::Idle);
            return Turn::Idle;
        }
        if self.has_space_available() {
            self.notifier.post(StreamEvent::HasSpaceAvailable);
        }
        if self.progress_marker() != before {
            Turn::Again
        } else {
            self.notifier
                .set_state(NotifierState::WaitingForTransportWritable);
            Turn::Idle
        }
    }

    fn attach_waker(&mut self, waker: WakeHandle) {
        self.sink.set_waker(waker.clone());
        self.notifier.attach_waker(waker);
    }

    fn detach_waker(&mut self) {
        self.notifier.detach_waker();
    }

    fn take_events(&mut self) -> Vec<StreamEvent<CodecError>> {
        self.notifier.take_pending()
    }
}
