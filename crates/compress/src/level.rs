//! Compression levels accepted by the deflate side of the crate.

use std::fmt;
use std::num::NonZeroU8;

use flate2::Compression;

use crate::error::CodecError;

/// Compression levels recognised by the deflate transform.
///
/// Numeric values follow zlib: `-1` selects the engine default, `0` stores
/// without compressing, and `1..=9` trade speed for ratio.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CompressionLevel {
    /// Use the engine's default balance between speed and ratio (`-1`).
    #[default]
    Default,
    /// Store blocks without compression (`0`).
    None,
    /// Favour speed over compression ratio (`1`).
    Fast,
    /// Favour the best possible compression ratio (`9`).
    Best,
    /// Use an explicit level in the range `1..=9`.
    Precise(NonZeroU8),
}

impl CompressionLevel {
    /// Lowest accepted numeric level.
    pub const MIN: i32 = -1;
    /// Highest accepted numeric level.
    pub const MAX: i32 = 9;

    /// Creates a level from its zlib numeric value.
    ///
    /// `-1` and `0` map to [`CompressionLevel::Default`] and
    /// [`CompressionLevel::None`]; `1..=9` map to
    /// [`CompressionLevel::Precise`].
    pub fn from_numeric(level: i32) -> Result<Self, CompressionLevelError> {
        match level {
            -1 => Ok(Self::Default),
            0 => Ok(Self::None),
            1..=9 => NonZeroU8::new(level as u8)
                .map(Self::Precise)
                .ok_or(CompressionLevelError { level }),
            _ => Err(CompressionLevelError { level }),
        }
    }

    /// Returns the zlib numeric value of this level.
    #[must_use]
    pub const fn numeric(self) -> i32 {
        match self {
            Self::Default => -1,
            Self::None => 0,
            Self::Fast => 1,
            Self::Best => 9,
            Self::Precise(value) => value.get() as i32,
        }
    }

    /// Returns the level the engine actually applies, resolving `Default`.
    #[must_use]
    pub fn effective(self) -> u32 {
        Compression::from(self).level()
    }
}

impl From<CompressionLevel> for Compression {
    fn from(level: CompressionLevel) -> Self {
        match level {
            CompressionLevel::Default => Compression::default(),
            CompressionLevel::None => Compression::none(),
            CompressionLevel::Fast => Compression::fast(),
            CompressionLevel::Best => Compression::best(),
            CompressionLevel::Precise(value) => Compression::new(u32::from(value.get())),
        }
    }
}

impl TryFrom<i32> for CompressionLevel {
    type Error = CompressionLevelError;

    fn try_from(level: i32) -> Result<Self, Self::Error> {
        Self::from_numeric(level)
    }
}

impl fmt::Display for CompressionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.numeric())
    }
}

/// Error returned when a requested level falls outside `-1..=9`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct CompressionLevelError {
    level: i32,
}

impl CompressionLevelError {
    /// Returns the rejected level.
    #[must_use]
    pub const fn level(&self) -> i32 {
        self.level
    }
}

impl fmt::Display for CompressionLevelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "compression level {} is outside the supported range -1..=9",
            self.level
        )
    }
}

impl std::error::Error for CompressionLevelError {}

impl From<CompressionLevelError> for CodecError {
    fn from(err: CompressionLevelError) -> Self {
        Self::InvalidCompressionLevel { level: err.level }
    }
}
