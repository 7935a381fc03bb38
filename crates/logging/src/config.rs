//! crates/logging/src/config.rs
//! Verbosity configuration expressed as per-target level ceilings.

use std::fmt::Write as _;

use tracing::Level;

/// Tracing targets used across the workspace.
pub mod targets {
    /// Transform invocations and byte counts.
    pub const ENGINE: &str = "gzstream::engine";
    /// Status transitions of engines and adapters.
    pub const STATUS: &str = "gzstream::status";
    /// Decompression adapter activity.
    pub const INFLATE: &str = "gzstream::inflate";
    /// Compression adapter activity.
    pub const DEFLATE: &str = "gzstream::deflate";
    /// Whole-file gzip adapter activity.
    pub const FILE: &str = "gzstream::file";
    /// Run loop scheduling and event delivery.
    pub const EVENTS: &str = "gzstream::events";
    /// Codec failures.
    pub const ERROR: &str = "gzstream::error";

    /// Every target, in the order directives are rendered.
    pub const ALL: [&str; 7] = [ERROR, STATUS, INFLATE, DEFLATE, FILE, EVENTS, ENGINE];
}

/// Per-target level ceilings; `None` silences a target.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VerbosityConfig {
    /// Ceiling for [`targets::ERROR`].
    pub error: Option<String>,
    /// Ceiling for [`targets::STATUS`].
    pub status: Option<String>,
    /// Ceiling for [`targets::INFLATE`].
    pub inflate: Option<String>,
    /// Ceiling for [`targets::DEFLATE`].
    pub deflate: Option<String>,
    /// Ceiling for [`targets::FILE`].
    pub file: Option<String>,
    /// Ceiling for [`targets::EVENTS`].
    pub events: Option<String>,
    /// Ceiling for [`targets::ENGINE`].
    pub engine: Option<String>,
}

impl Default for VerbosityConfig {
    fn default() -> Self {
        Self::from_verbose_level(0)
    }
}

impl VerbosityConfig {
    /// Builds the configuration for a verbosity level.
    ///
    /// - 0: failures only
    /// - 1: plus adapter lifecycle
    /// - 2: plus status transitions
    /// - 3: plus scheduling
    /// - 4 and above: plus per-pump transform traces
    #[must_use]
    pub fn from_verbose_level(level: u8) -> Self {
        let at = |threshold: u8, lvl: Level| (level >= threshold).then(|| lvl.to_string().to_ascii_lowercase());
        Self {
            error: at(0, Level::WARN),
            status: at(2, Level::DEBUG),
            inflate: at(1, Level::DEBUG),
            deflate: at(1, Level::DEBUG),
            file: at(1, Level::DEBUG),
            events: at(3, Level::TRACE),
            engine: at(4, Level::TRACE),
        }
    }

    /// Returns the ceiling configured for `target`, if enabled.
    #[must_use]
    pub fn level_for(&self, target: &str) -> Option<&str> {
        let slot = match target {
            targets::ERROR => &self.error,
            targets::STATUS => &self.status,
            targets::INFLATE => &self.inflate,
            targets::DEFLATE => &self.deflate,
            targets::FILE => &self.file,
            targets::EVENTS => &self.events,
            targets::ENGINE => &self.engine,
            _ => return None,
        };
        slot.as_deref()
    }

    /// Overrides the ceiling for `target`.
    pub fn set(&mut self, target: &str, level: Option<Level>) -> Result<(), String> {
        let slot = match target {
            targets::ERROR => &mut self.error,
            targets::STATUS => &mut self.status,
            targets::INFLATE => &mut self.inflate,
            targets::DEFLATE => &mut self.deflate,
            targets::FILE => &mut self.file,
            targets::EVENTS => &mut self.events,
            targets::ENGINE => &mut self.engine,
            other => return Err(format!("unknown logging target: {other}")),
        };
        *slot = level.map(|lvl| lvl.to_string().to_ascii_lowercase());
        Ok(())
    }

    /// Renders the configuration as `EnvFilter` directives.
    ///
    /// Disabled targets are rendered as `target=off` so a broader default
    /// cannot re-enable them.
    #[must_use]
    pub fn directives(&self) -> String {
        let mut out = String::from("warn");
        for target in targets::ALL {
            let level = self.level_for(target).unwrap_or("off");
            let _ = write!(out, ",{target}={level}");
        }
        out
    }
}
