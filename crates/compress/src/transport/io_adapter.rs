//! Blocking `std::io` readers and writers presented as always-ready transports.

use std::io::{self, Read, Write};

use super::{ByteSink, ByteSource};

/// Presents a blocking [`Read`] as a [`ByteSource`].
///
/// The reader is always considered ready; a read that blocks stalls the
/// adapter driving it.
#[derive(Debug, Default)]
pub struct IoSource<R> {
    inner: R,
}

impl<R: Read> IoSource<R> {
    /// Wraps `inner`.
    pub const fn new(inner: R) -> Self {
        Self { inner }
    }

    /// Returns a reference to the wrapped reader.
    pub const fn get_ref(&self) -> &R {
        &self.inner
    }

    /// Returns a mutable reference to the wrapped reader.
    pub fn get_mut(&mut self) -> &mut R {
        &mut self.inner
    }

    /// Returns the wrapped reader.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> ByteSource for IoSource<R> {
    fn has_bytes_available(&self) -> bool {
        true
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            match self.inner.read(buf) {
                Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
                other => return other,
            }
        }
    }
}

/// Presents a blocking [`Write`] as a [`ByteSink`].
#[derive(Debug, Default)]
pub struct IoSink<W> {
    inner: W,
}

impl<W: Write> IoSink<W> {
    /// Wraps `inner`.
    pub const fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Returns a reference to the wrapped writer.
    pub const fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Returns a mutable reference to the wrapped writer.
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.inner
    }

    /// Returns the wrapped writer.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> ByteSink for IoSink<W> {
    fn has_space_available(&self) -> bool {
        true
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        loop {
            match self.inner.write(buf) {
                Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
                other => return other,
            }
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
