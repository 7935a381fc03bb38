//! Bounded in-memory pipe whose halves may live on different threads.
//!
//! Writing wakes the reader's registered [`WakeHandle`] and reading wakes the
//! writer's, so a run loop owning one half learns about progress made on the
//! other half without polling.

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard};

use events::WakeHandle;

use super::{ByteSink, ByteSource};

#[derive(Debug)]
struct PipeState {
    buffer: VecDeque<u8>,
    capacity: usize,
    writer_closed: bool,
    reader_closed: bool,
    reader_waker: Option<WakeHandle>,
    writer_waker: Option<WakeHandle>,
}

#[derive(Debug)]
struct Shared(Mutex<PipeState>);

impl Shared {
    fn lock(&self) -> MutexGuard<'_, PipeState> {
        self.0.lock().expect("pipe mutex poisoned")
    }
}

fn wake(waker: Option<WakeHandle>) {
    if let Some(waker) = waker {
        waker.wake();
    }
}

/// Creates a pipe buffering at most `capacity` bytes.
///
/// A capacity of zero is raised to one.
#[must_use]
pub fn pipe(capacity: usize) -> (PipeWriter, PipeReader) {
    let shared = Arc::new(Shared(Mutex::new(PipeState {
        buffer: VecDeque::with_capacity(capacity.max(1)),
        capacity: capacity.max(1),
        writer_closed: false,
        reader_closed: false,
        reader_waker: None,
        writer_waker: None,
    })));
    (
        PipeWriter {
            shared: Arc::clone(&shared),
        },
        PipeReader { shared },
    )
}

/// Writing half of a [`pipe`]. Dropping it signals end of stream.
#[derive(Debug)]
pub struct PipeWriter {
    shared: Arc<Shared>,
}

impl PipeWriter {
    /// Signals end of stream to the reader.
    pub fn close(&self) {
        let waker = {
            let mut state = self.shared.lock();
            if state.writer_closed {
                return;
            }
            state.writer_closed = true;
            state.reader_waker.clone()
        };
        wake(waker);
    }

    /// Bytes currently buffered.
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.shared.lock().buffer.len()
    }
}

impl ByteSink for PipeWriter {
    fn has_space_available(&self) -> bool {
        let state = self.shared.lock();
        state.reader_closed || state.buffer.len() < state.capacity
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let (count, waker) = {
            let mut state = self.shared.lock();
            if state.reader_closed {
                return Err(io::ErrorKind::BrokenPipe.into());
            }
            if state.writer_closed {
                return Err(io::Error::new(
                    io::ErrorKind::BrokenPipe,
                    "pipe writer already closed",
                ));
            }
            if buf.is_empty() {
                return Ok(0);
            }
            let count = (state.capacity - state.buffer.len()).min(buf.len());
            if count == 0 {
                return Err(io::ErrorKind::WouldBlock.into());
            }
            state.buffer.extend(&buf[..count]);
            (count, state.reader_waker.clone())
        };
        wake(waker);
        Ok(count)
    }

    fn close(&mut self) {
        PipeWriter::close(self);
    }

    fn set_waker(&mut self, waker: WakeHandle) {
        self.shared.lock().writer_waker = Some(waker);
    }
}

impl io::Write for PipeWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        ByteSink::write(self, buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for PipeWriter {
    fn drop(&mut self) {
        PipeWriter::close(self);
    }
}

/// Reading half of a [`pipe`]. Dropping it makes later writes fail.
#[derive(Debug)]
pub struct PipeReader {
    shared: Arc<Shared>,
}

impl PipeReader {
    fn shut(&self) {
        let waker = {
            let mut state = self.shared.lock();
            if state.reader_closed {
                return;
            }
            state.reader_closed = true;
            state.buffer.clear();
            state.writer_waker.clone()
        };
        wake(waker);
    }
}

impl ByteSource for PipeReader {
    fn has_bytes_available(&self) -> bool {
        let state = self.shared.lock();
        state.writer_closed || !state.buffer.is_empty()
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let (count, waker) = {
            let mut state = self.shared.lock();
            if state.buffer.is_empty() {
                if state.writer_closed || state.reader_closed {
                    return Ok(0);
                }
                return Err(io::ErrorKind::WouldBlock.into());
            }
            let count = state.buffer.len().min(buf.len());
            for (slot, byte) in buf.iter_mut().zip(state.buffer.drain(..count)) {
                *slot = byte;
            }
            (count, state.writer_waker.clone())
        };
        wake(waker);
        Ok(count)
    }

    fn close(&mut self) {
        self.shut();
    }

    fn set_waker(&mut self, waker: WakeHandle) {
        self.shared.lock().reader_waker = Some(waker);
    }
}

impl Drop for PipeReader {
    fn drop(&mut self) {
        self.shut();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_flow_in_order_and_end_on_close() {
        let (mut writer, mut reader) = pipe(4);
        assert_eq!(ByteSink::write(&mut writer, b"abcdef").expect("write"), 4);
        let err = ByteSink::write(&mut writer, b"ef").expect_err("full");
        assert_eq!(err.kind(), io::ErrorKind::WouldBlock);

        let mut buf = [0u8; 3];
        assert_eq!(reader.read(&mut buf).expect("read"), 3);
        assert_eq!(&buf, b"abc");
        assert_eq!(ByteSink::write(&mut writer, b"ef").expect("write"), 2);
        drop(writer);

        let mut rest = [0u8; 8];
        assert_eq!(reader.read(&mut rest).expect("read"), 3);
        assert_eq!(&rest[..3], b"def");
        assert_eq!(reader.read(&mut rest).expect("eof"), 0);
    }

    #[test]
    fn empty_open_pipe_would_block() {
        let (_writer, mut reader) = pipe(8);
        assert!(!reader.has_bytes_available());
        let err = reader.read(&mut [0u8; 4]).expect_err("nothing yet");
        assert_eq!(err.kind(), io::ErrorKind::WouldBlock);
    }

    #[test]
    fn writes_after_reader_drop_fail() {
        let (mut writer, reader) = pipe(8);
        drop(reader);
        let err = ByteSink::write(&mut writer, b"x").expect_err("broken");
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }

    #[test]
    fn halves_cross_threads() {
        let (mut writer, mut reader) = pipe(16);
        let producer = std::thread::spawn(move || {
            let payload = b"cross-thread payload";
            let mut offset = 0;
            while offset < payload.len() {
                match ByteSink::write(&mut writer, &payload[offset..]) {
                    Ok(n) => offset += n,
                    Err(err) if err.kind() == io::ErrorKind::WouldBlock => {
                        std::thread::yield_now();
                    }
                    Err(err) => panic!("unexpected pipe error: {err}"),
                }
            }
        });
        let mut received = Vec::new();
        let mut buf = [0u8; 5];
        loop {
            match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => received.extend_from_slice(&buf[..n]),
                Err(err) if err.kind() == io::ErrorKind::WouldBlock => std::thread::yield_now(),
                Err(err) => panic!("unexpected pipe error: {err}"),
            }
        }
        producer.join().expect("producer thread");
        assert_eq!(received, b"cross-thread payload");
    }
}
