//! # Core Runtime Module
//!
//! Foundational runtime infrastructure for the album-index core:
//! - Configuration management with fail-fast validation
//! - Logging and tracing setup
//!
//! ## Overview
//!
//! This crate contains the runtime utilities the other core crates depend
//! on. It establishes the configuration and logging conventions used
//! throughout the workspace; the synchronization machinery itself lives in
//! `core-albums` and `core-browse`.

pub mod config;
pub mod error;
pub mod logging;

pub use config::{BrowseConfig, BrowseConfigBuilder};
pub use error::{Error, Result};
pub use logging::{init_logging, LogFormat, LoggingConfig};
