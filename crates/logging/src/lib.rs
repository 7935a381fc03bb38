#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `logging` centralises the diagnostics conventions of the gzstream
//! workspace. Every crate logs through the [`tracing`] facade using one of the
//! subsystem targets listed in [`targets`], via the macros exported here, so a
//! single filter string can enable or silence a whole subsystem.
//!
//! # Design
//!
//! - [`VerbosityConfig`] maps a numeric verbosity (0-4) to per-target
//!   [`tracing::Level`] ceilings and renders them as `EnvFilter` directives.
//! - [`init_tracing`] installs a `tracing-subscriber` fmt subscriber using
//!   those directives unless the `GZSTREAM_LOG` environment variable provides
//!   its own.
//! - The `trace_*` macros fix the target and level per subsystem so call sites
//!   stay short.
//!
//! # Examples
//!
//! ```
//! use logging::VerbosityConfig;
//!
//! let config = VerbosityConfig::from_verbose_level(2);
//! assert!(config.directives().contains("gzstream::status=debug"));
//! ```

mod config;
mod tracing_bridge;
mod tracing_macros;

pub use config::{VerbosityConfig, targets};
pub use tracing_bridge::{InitError, LOG_ENV_VAR, build_filter, init_tracing};
