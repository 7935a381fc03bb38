//! # Overview
//!
//! [`CodecEngine`] owns a [`Transform`] together with two fixed-capacity
//! staging buffers and the cursors into them. Both stream adapters are built
//! by composing an engine: the decompression side stages compressed bytes in
//! the input buffer and serves plain bytes from the output buffer, the
//! compression side does the opposite.
//!
//! # Design
//!
//! The lifecycle status, the sticky error and the running totals live behind
//! a mutex shared with [`EngineMonitor`] handles. [`CodecEngine::pump`] holds
//! that mutex for the duration of the transform call, which serialises a
//! cancellation from another thread against an in-flight pump. Buffer bytes
//! are only ever touched by the owning adapter and stay outside the mutex.
//!
//! # Invariants
//!
//! - `input_start <= write_offset <= input.len()` and
//!   `read_offset <= output_end <= output.len()`.
//! - Once the status is `Closed` or `Error` no byte is accepted or produced.
//! - Bytes reach the transform in the order they were written and leave it
//!   in the order they were produced.

use logging::trace_engine;

use crate::error::CodecError;
use crate::status::{CodecStatus, EngineMonitor, StatusCell, Totals};
use crate::transform::{Transform, TransformFlush, TransformStatus};

/// Result of one [`CodecEngine::pump`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PumpOutcome {
    /// The transform consumed or produced bytes.
    Progress,
    /// The output buffer is full; drain it before pumping again.
    OutputFull,
    /// Nothing moved; the transform needs more input.
    NeedsInput,
    /// The transform reached the logical end of the stream.
    StreamEnd,
}

/// Transform state plus staging buffers shared by the stream adapters.
#[derive(Debug)]
pub struct CodecEngine<T> {
    transform: Option<T>,
    input: Vec<u8>,
    input_start: usize,
    write_offset: usize,
    output: Vec<u8>,
    read_offset: usize,
    output_end: usize,
    finished: bool,
    cell: StatusCell,
}

impl<T> Default for CodecEngine<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> CodecEngine<T> {
    /// Creates an engine in `NotOpen` with no buffers allocated.
    #[must_use]
    pub fn new() -> Self {
        Self {
            transform: None,
            input: Vec::new(),
            input_start: 0,
            write_offset: 0,
            output: Vec::new(),
            read_offset: 0,
            output_end: 0,
            finished: false,
            cell: StatusCell::default(),
        }
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

    /// Returns a thread-safe view of this engine.
    #[must_use]
    pub fn monitor(&self) -> EngineMonitor {
        EngineMonitor::new(self.cell.clone())
    }

    /// Fails with [`CodecError::OptionsLocked`] once the engine left `NotOpen`.
    pub fn ensure_configurable(&self) -> Result<(), CodecError> {
        if self.status().is_configurable() {
            Ok(())
        } else {
            Err(CodecError::OptionsLocked)
        }
    }

    /// Moves `NotOpen` to `Opening`; returns `false` from any other status.
    pub fn begin_open(&self) -> bool {
        self.cell.lock().transition(CodecStatus::Opening)
    }

    /// Installs `transform`, allocates the staging buffers and moves to `Open`.
    pub fn initialize(
        &mut self,
        transform: T,
        input_capacity: usize,
        output_capacity: usize,
    ) -> Result<(), CodecError> {
        let cell = self.cell.clone();
        let mut shared = cell.lock();
        if shared.status == CodecStatus::NotOpen {
            shared.transition(CodecStatus::Opening);
        }
        if shared.status != CodecStatus::Opening {
            return Err(shared.terminal_error().unwrap_or_else(|| {
                CodecError::TransformInitFailed {
                    message: format!("engine is already {}", shared.status),
                }
            }));
        }
        self.transform = Some(transform);
        self.input = vec![0; input_capacity];
        self.output = vec![0; output_capacity];
        self.input_start = 0;
        self.write_offset = 0;
        self.read_offset = 0;
        self.output_end = 0;
        shared.transition(CodecStatus::Open);
        Ok(())
    }

    /// Records `err` as the sticky error and returns the error to report.
    pub fn fail(&mut self, err: CodecError) -> CodecError {
        let err = self.cell.lock().fail(err);
        self.release();
        err
    }

    /// Returns the error every operation reports once the engine terminated.
    ///
    /// Buffers are released here when another thread cancelled the engine.
    pub fn terminal_error(&mut self) -> Option<CodecError> {
        let err = self.cell.lock().terminal_error();
        if err.is_some() {
            self.release();
        }
        err
    }

    /// Closes the engine, discarding buffered bytes. Returns `false` when it
    /// was already closed.
    pub fn close(&mut self) -> bool {
        let closed = self.cell.lock().transition(CodecStatus::Closed);
        self.release();
        closed
    }

    /// Reports whether the transform signalled the logical end.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.finished
    }

    fn accepts_bytes(&self) -> bool {
        self.status() == CodecStatus::Open && !self.finished
    }

    /// Bytes staged but not yet consumed by the transform.
    #[must_use]
    pub const fn pending_input(&self) -> usize {
        self.write_offset - self.input_start
    }

    /// Room left in the input buffer; zero unless the engine is open.
    #[must_use]
    pub fn input_room(&self) -> usize {
        if self.accepts_bytes() {
            self.input.len() - self.pending_input()
        } else {
            0
        }
    }

    /// Produced bytes waiting to be read; zero once the engine terminated.
    #[must_use]
    pub fn output_available(&self) -> usize {
        if self.status().is_terminated() {
            0
        } else {
            self.output_end - self.read_offset
        }
    }

    /// Free room left in the output buffer.
    #[must_use]
    pub fn output_room(&self) -> usize {
        self.output.len() - (self.output_end - self.read_offset)
    }

    /// Copies as much of `data` as fits into the input buffer.
    pub fn write_input(&mut self, data: &[u8]) -> usize {
        let slot = self.input_slot();
        let count = slot.len().min(data.len());
        slot[..count].copy_from_slice(&data[..count]);
        self.commit_input(count);
        count
    }

    /// Returns the free tail of the input buffer for a transport to fill.
    ///
    /// Call [`commit_input`](Self::commit_input) with the number of bytes
    /// written. The slot is empty unless the engine is open.
    pub fn input_slot(&mut self) -> &mut [u8] {
        if !self.accepts_bytes() {
            return &mut [];
        }
        self.compact_input();
        &mut self.input[self.write_offset..]
    }

    /// Marks `count` bytes of the input slot as staged.
    pub fn commit_input(&mut self, count: usize) {
        debug_assert!(self.write_offset + count <= self.input.len());
        self.write_offset += count;
    }

    /// Copies produced bytes into `buf`, returning how many were copied.
    ///
    /// Zero means either that the transform needs more input or that nothing
    /// is left; consult [`status`](Self::status) to tell them apart.
    pub fn read_output(&mut self, buf: &mut [u8]) -> usize {
        let available = self.output_slice();
        let count = available.len().min(buf.len());
        buf[..count].copy_from_slice(&available[..count]);
        self.consume_output(count);
        count
    }

    /// Returns the produced bytes not yet consumed.
    #[must_use]
    pub fn output_slice(&self) -> &[u8] {
        if self.output_available() == 0 {
            return &[];
        }
        &self.output[self.read_offset..self.output_end]
    }

    /// Marks `count` produced bytes as consumed.
    pub fn consume_output(&mut self, count: usize) {
        debug_assert!(self.read_offset + count <= self.output_end);
        self.read_offset += count;
        if self.read_offset == self.output_end {
            self.read_offset = 0;
            self.output_end = 0;
        }
    }

    /// Moves to `AtEnd` once the transform finished and the output drained.
    pub fn settle(&mut self) -> bool {
        if self.finished && self.output_end == self.read_offset {
            let mut shared = self.cell.lock();
            shared.transition(CodecStatus::AtEnd);
            return shared.status == CodecStatus::AtEnd;
        }
        false
    }

    fn compact_input(&mut self) {
        if self.input_start > 0 {
            self.input.copy_within(self.input_start..self.write_offset, 0);
            self.write_offset -= self.input_start;
            self.input_start = 0;
        }
    }

    fn compact_output(&mut self) {
        if self.read_offset > 0 {
            self.output.copy_within(self.read_offset..self.output_end, 0);
            self.output_end -= self.read_offset;
            self.read_offset = 0;
        }
    }

    fn release(&mut self) {
        self.transform = None;
        self.input = Vec::new();
        self.output = Vec::new();
        self.input_start = 0;
        self.write_offset = 0;
        self.read_offset = 0;
        self.output_end = 0;
    }
}

impl<T: Transform> CodecEngine<T> {
    /// Runs the transform once over the staged input and free output room.
    ///
    /// A transform failure moves the engine to `Error` and is returned on
    /// this and every later call.
    pub fn pump(&mut self, flush: TransformFlush) -> Result<PumpOutcome, CodecError> {
        let cell = self.cell.clone();
        let mut shared = cell.lock();
        if let Some(err) = shared.terminal_error() {
            drop(shared);
            self.release();
            return Err(err);
        }
        match shared.status {
            CodecStatus::AtEnd => return Ok(PumpOutcome::StreamEnd),
            CodecStatus::NotOpen | CodecStatus::Opening => return Ok(PumpOutcome::NeedsInput),
            _ => {}
        }
        if self.finished {
            return Ok(PumpOutcome::StreamEnd);
        }
        self.compact_output();
        let Some(transform) = self.transform.as_mut() else {
            return Ok(PumpOutcome::NeedsInput);
        };
        if self.output_end == self.output.len() {
            return Ok(PumpOutcome::OutputFull);
        }

        let before_in = transform.total_in();
        let before_out = transform.total_out();
        let result = transform.run(
            &self.input[self.input_start..self.write_offset],
            &mut self.output[self.output_end..],
            flush,
        );
        let consumed = usize::try_from(transform.total_in() - before_in).unwrap_or(usize::MAX);
        let produced = usize::try_from(transform.total_out() - before_out).unwrap_or(usize::MAX);
        self.input_start += consumed;
        self.output_end += produced;
        if self.input_start == self.write_offset {
            self.input_start = 0;
            self.write_offset = 0;
        }
        shared.totals = Totals {
            total_in: transform.total_in(),
            total_out: transform.total_out(),
        };
        trace_engine!(
            transform = transform.kind(),
            consumed,
            produced,
            flush = ?flush,
            "pump"
        );

        match result {
            Err(failure) => {
                let err = shared.fail(failure.into());
                drop(shared);
                self.release();
                Err(err)
            }
            Ok(TransformStatus::StreamEnd) => {
                self.finished = true;
                Ok(PumpOutcome::StreamEnd)
            }
            Ok(_) if consumed > 0 || produced > 0 => Ok(PumpOutcome::Progress),
            Ok(_) if self.output_end == self.output.len() => Ok(PumpOutcome::OutputFull),
            Ok(_) => Ok(PumpOutcome::NeedsInput),
        }
    }
}
