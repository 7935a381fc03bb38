//! Construction-time configuration shared by the stream and file adapters.

use std::fmt;

use crate::error::CodecError;
use crate::level::CompressionLevel;

/// Default capacity of each staging buffer (16 KiB).
pub const DEFAULT_BUFFER_CAPACITY: usize = 16 * 1024;

/// Framing of an embedded compressed stream.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StreamFormat {
    /// zlib header and Adler-32 trailer around the deflate data.
    #[default]
    Zlib,
    /// Bare deflate blocks.
    Raw,
}

impl StreamFormat {
    /// Reports whether the format carries a zlib header.
    #[must_use]
    pub const fn has_zlib_header(self) -> bool {
        matches!(self, Self::Zlib)
    }
}

/// Identifies one of the two staging buffers.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BufferKind {
    /// Buffer holding bytes waiting to be transformed.
    Input,
    /// Buffer holding transformed bytes waiting to be consumed.
    Output,
}

impl fmt::Display for BufferKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Input => "input",
            Self::Output => "output",
        })
    }
}

/// Options fixed before a stream is opened.
///
/// # Examples
///
/// ```
/// use compress::{CompressionLevel, StreamFormat, StreamOptions};
///
/// let options = StreamOptions::default()
///     .with_input_buffer_capacity(4096)
///     .with_compression_level(CompressionLevel::Best)
///     .with_format(StreamFormat::Raw);
/// assert!(options.validate().is_ok());
/// assert!(StreamOptions::default().with_output_buffer_capacity(0).validate().is_err());
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StreamOptions {
    /// Capacity of the input staging buffer in bytes.
    pub input_buffer_capacity: usize,
    /// Capacity of the output staging buffer in bytes.
    pub output_buffer_capacity: usize,
    /// Level applied by compressing adapters; ignored when decompressing.
    pub compression_level: CompressionLevel,
    /// Framing of embedded streams; ignored by the gzip file adapters.
    pub format: StreamFormat,
}

impl Default for StreamOptions {
    fn default() -> Self {
        Self {
            input_buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            output_buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            compression_level: CompressionLevel::Default,
            format: StreamFormat::Zlib,
        }
    }
}

impl StreamOptions {
    /// Sets the input buffer capacity.
    #[must_use]
    pub const fn with_input_buffer_capacity(mut self, capacity: usize) -> Self {
        self.input_buffer_capacity = capacity;
        self
    }

    /// Sets the output buffer capacity.
    #[must_use]
    pub const fn with_output_buffer_capacity(mut self, capacity: usize) -> Self {
        self.output_buffer_capacity = capacity;
        self
    }

    /// Sets both buffer capacities.
    #[must_use]
    pub const fn with_buffer_capacity(self, capacity: usize) -> Self {
        self.with_input_buffer_capacity(capacity)
            .with_output_buffer_capacity(capacity)
    }

    /// Sets the compression level.
    #[must_use]
    pub const fn with_compression_level(mut self, level: CompressionLevel) -> Self {
        self.compression_level = level;
        self
    }

    /// Sets the stream framing.
    #[must_use]
    pub const fn with_format(mut self, format: StreamFormat) -> Self {
        self.format = format;
        self
    }

    /// Checks that both capacities are positive.
    pub fn validate(&self) -> Result<(), CodecError> {
        validate_capacity(BufferKind::Input, self.input_buffer_capacity)?;
        validate_capacity(BufferKind::Output, self.output_buffer_capacity)
    }
}

/// Rejects a zero capacity for `buffer`.
pub(crate) fn validate_capacity(buffer: BufferKind, requested: usize) -> Result<(), CodecError> {
    if requested == 0 {
        return Err(CodecError::BufferCapacityInvalid { buffer, requested });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let options = StreamOptions::default();
        assert_eq!(options.input_buffer_capacity, DEFAULT_BUFFER_CAPACITY);
        assert_eq!(options.format, StreamFormat::Zlib);
        options.validate().expect("default options validate");
    }

    #[test]
    fn zero_input_capacity_is_reported_first() {
        let err = StreamOptions::default()
            .with_buffer_capacity(0)
            .validate()
            .expect_err("zero capacities rejected");
        assert_eq!(
            err,
            CodecError::BufferCapacityInvalid {
                buffer: BufferKind::Input,
                requested: 0
            }
        );
    }

    #[test]
    fn one_byte_buffers_are_allowed() {
        StreamOptions::default()
            .with_buffer_capacity(1)
            .validate()
            .expect("tiny buffers are legal");
    }
}
