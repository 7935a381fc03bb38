//! # Overview
//!
//! Non-blocking byte transports the adapters pull compressed bytes from or
//! push compressed bytes into. The adapters are agnostic to what sits behind
//! a transport: a file, a socket or an in-memory buffer.
//!
//! # Contract
//!
//! - [`ByteSource::read`] returns `Ok(0)` only at the end of the stream and
//!   fails with [`std::io::ErrorKind::WouldBlock`] when no bytes are ready.
//! - [`ByteSink::write`] fails with [`std::io::ErrorKind::WouldBlock`] when it
//!   has no room.
//! - A transport that can become ready later wakes the [`WakeHandle`] handed
//!   to it through `set_waker`, so a run loop resumes the adapter.
//!
//! An adapter generic over `S` owns its transport. The blanket
//! implementations for `&mut S` and `Box<S>` let a caller lend a transport it
//! keeps owning instead.

use std::io;

use events::WakeHandle;

mod io_adapter;
mod memory;
mod pipe;

pub use io_adapter::{IoSink, IoSource};
pub use memory::{MemorySink, MemorySource};
pub use pipe::{PipeReader, PipeWriter, pipe};

/// Upstream transport offering compressed bytes.
pub trait ByteSource {
    /// Opens the transport. The default does nothing.
    fn open(&mut self) -> io::Result<()> {
        Ok(())
    }

    /// Reports whether [`read`](Self::read) would return without
    /// `WouldBlock`, which includes the end of the stream.
    fn has_bytes_available(&self) -> bool;

    /// Reads available bytes into `buf`.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Closes the transport. The default does nothing.
    fn close(&mut self) {}

    /// Registers the handle woken when bytes arrive. The default drops it.
    fn set_waker(&mut self, waker: WakeHandle) {
        let _ = waker;
    }
}

/// Downstream transport accepting compressed bytes.
pub trait ByteSink {
    /// Opens the transport. The default does nothing.
    fn open(&mut self) -> io::Result<()> {
        Ok(())
    }

    /// Reports whether [`write`](Self::write) would accept at least one byte.
    fn has_space_available(&self) -> bool;

    /// Writes a prefix of `buf`, returning its length.
    fn write(&mut self, buf: &[u8]) -> io::Result<usize>;

    /// Flushes buffered bytes. The default does nothing.
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }

    /// Closes the transport. The default does nothing.
    fn close(&mut self) {}

    /// Registers the handle woken when room frees up. The default drops it.
    fn set_waker(&mut self, waker: WakeHandle) {
        let _ = waker;
    }
}

macro_rules! forward_source {
    ($ty:ty) => {
        impl<S: ByteSource + ?Sized> ByteSource for $ty {
            fn open(&mut self) -> io::Result<()> {
                (**self).open()
            }

            fn has_bytes_available(&self) -> bool {
                (**self).has_bytes_available()
            }

            fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
                (**self).read(buf)
            }

            fn close(&mut self) {
                (**self).close();
            }

            fn set_waker(&mut self, waker: WakeHandle) {
                (**self).set_waker(waker);
            }
        }
    };
}

macro_rules! forward_sink {
    ($ty:ty) => {
        impl<K: ByteSink + ?Sized> ByteSink for $ty {
            fn open(&mut self) -> io::Result<()> {
                (**self).open()
            }

            fn has_space_available(&self) -> bool {
                (**self).has_space_available()
            }

            fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
                (**self).write(buf)
            }

            fn flush(&mut self) -> io::Result<()> {
                (**self).flush()
            }

            fn close(&mut self) {
                (**self).close();
            }

            fn set_waker(&mut self, waker: WakeHandle) {
                (**self).set_waker(waker);
            }
        }
    };
}

forward_source!(&mut S);
forward_source!(Box<S>);
forward_sink!(&mut K);
forward_sink!(Box<K>);
