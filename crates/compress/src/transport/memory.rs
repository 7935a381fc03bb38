//! In-memory transports.

use std::io;

use events::WakeHandle;

use super::{ByteSink, ByteSource};

/// Serves an owned buffer of compressed bytes.
#[derive(Clone, Debug, Default)]
pub struct MemorySource {
    data: Vec<u8>,
    position: usize,
}

impl MemorySource {
    /// Serves `data` from the beginning.
    #[must_use]
    pub const fn new(data: Vec<u8>) -> Self {
        Self { data, position: 0 }
    }

    /// Bytes not yet read.
    #[must_use]
    pub fn remaining(&self) -> &[u8] {
        &self.data[self.position..]
    }
}

impl ByteSource for MemorySource {
    fn has_bytes_available(&self) -> bool {
        true
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let remaining = self.remaining();
        let count = remaining.len().min(buf.len());
        buf[..count].copy_from_slice(&remaining[..count]);
        self.position += count;
        Ok(count)
    }
}

/// Collects written bytes into a `Vec<u8>`.
///
/// A sink can be capped with [`with_limit`](Self::with_limit) and switched
/// off with [`set_writable`](Self::set_writable); either makes writes fail
/// with `WouldBlock`, which is how backpressure is simulated.
#[derive(Debug)]
pub struct MemorySink {
    data: Vec<u8>,
    limit: Option<usize>,
    writable: bool,
    waker: Option<WakeHandle>,
}

impl Default for MemorySink {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySink {
    /// Creates an unbounded, writable sink.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            data: Vec::new(),
            limit: None,
            writable: true,
            waker: None,
        }
    }

    /// Creates a sink that accepts at most `limit` bytes in total.
    #[must_use]
    pub const fn with_limit(limit: usize) -> Self {
        Self {
            data: Vec::new(),
            limit: Some(limit),
            writable: true,
            waker: None,
        }
    }

    /// Enables or disables writes. Enabling wakes the registered waker.
    pub fn set_writable(&mut self, writable: bool) {
        self.writable = writable;
        if writable && let Some(waker) = &self.waker {
            waker.wake();
        }
    }

    /// Raises the total byte limit, or removes it with `None`.
    pub fn set_limit(&mut self, limit: Option<usize>) {
        self.limit = limit;
        if let Some(waker) = &self.waker {
            waker.wake();
        }
    }

    /// Bytes written so far.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Returns the collected bytes.
    #[must_use]
    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }

    fn room(&self) -> usize {
        if !self.writable {
            return 0;
        }
        self.limit
            .map_or(usize::MAX, |limit| limit.saturating_sub(self.data.len()))
    }
}

impl ByteSink for MemorySink {
    fn has_space_available(&self) -> bool {
        self.room() > 0
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let count = self.room().min(buf.len());
        if count == 0 {
            return Err(io::ErrorKind::WouldBlock.into());
        }
        self.data.extend_from_slice(&buf[..count]);
        Ok(count)
    }

    fn set_waker(&mut self, waker: WakeHandle) {
        self.waker = Some(waker);
    }
}
