//! Byte-counting wrappers around `std::io` readers and writers.

use std::io::{self, Read, Write};

/// Reader that records how many bytes passed through it.
#[derive(Debug)]
pub(crate) struct CountingReader<R> {
    inner: R,
    bytes: u64,
}

impl<R> CountingReader<R> {
    pub(crate) const fn new(inner: R) -> Self {
        Self { inner, bytes: 0 }
    }

    pub(crate) const fn bytes_read(&self) -> u64 {
        self.bytes
    }
}

impl<R: Read> Read for CountingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let read = self.inner.read(buf)?;
        self.bytes = self.bytes.saturating_add(read as u64);
        Ok(read)
    }
}

/// Writer that records how many bytes the wrapped writer accepted.
#[derive(Debug)]
pub(crate) struct CountingWriter<W> {
    inner: W,
    bytes: u64,
}

impl<W> CountingWriter<W> {
    pub(crate) const fn new(inner: W) -> Self {
        Self { inner, bytes: 0 }
    }

    pub(crate) const fn bytes_written(&self) -> u64 {
        self.bytes
    }

    pub(crate) fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let written = self.inner.write(buf)?;
        self.bytes = self.bytes.saturating_add(written as u64);
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_bytes_read() {
        let mut reader = CountingReader::new(&b"counted input"[..]);
        let mut sink = Vec::new();
        io::copy(&mut reader, &mut sink).expect("copy");
        assert_eq!(reader.bytes_read(), 13);
    }

    #[test]
    fn counts_bytes_written() {
        let mut writer = CountingWriter::new(Vec::new());
        writer.write_all(b"counted").expect("write");
        writer.write_all(b" output").expect("write");
        assert_eq!(writer.bytes_written(), 14);
        assert_eq!(writer.into_inner(), b"counted output");
    }
}
