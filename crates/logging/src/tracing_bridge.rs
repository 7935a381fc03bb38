//! crates/logging/src/tracing_bridge.rs
//! Subscriber installation for binaries and tests embedding gzstream.

use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::config::VerbosityConfig;

/// Environment variable whose value replaces the configured directives.
pub const LOG_ENV_VAR: &str = "GZSTREAM_LOG";

/// Errors returned by [`init_tracing`].
#[derive(Debug, Error)]
pub enum InitError {
    /// The directives could not be parsed.
    #[error("invalid log filter {directives:?}: {message}")]
    InvalidFilter {
        /// Directives that failed to parse.
        directives: String,
        /// Parser diagnostic.
        message: String,
    },
    /// A global subscriber was already installed.
    #[error("a global tracing subscriber is already installed: {0}")]
    AlreadyInstalled(String),
}

/// Builds the filter for `config`, preferring [`LOG_ENV_VAR`] when set.
pub fn build_filter(config: &VerbosityConfig) -> Result<EnvFilter, InitError> {
    let directives = std::env::var(LOG_ENV_VAR)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| config.directives());
    EnvFilter::try_new(&directives).map_err(|err| InitError::InvalidFilter {
        directives,
        message: err.to_string(),
    })
}

/// Installs a global fmt subscriber filtered by `config`.
///
/// # Usage
///
/// ```rust,ignore
/// use logging::{VerbosityConfig, init_tracing};
///
/// init_tracing(&VerbosityConfig::from_verbose_level(2))?;
/// tracing::debug!(target: "gzstream::status", "visible at level 2");
/// ```
pub fn init_tracing(config: &VerbosityConfig) -> Result<(), InitError> {
    let filter = build_filter(config)?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .map_err(|err| InitError::AlreadyInstalled(err.to_string()))
}
