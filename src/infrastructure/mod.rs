//! Infrastructure layer
//!
//! This module contains configuration, logging and the adapters around the
//! engines: workflow loading, licensing and remediation hints.

pub mod config;
pub mod github_actions;
pub mod license;
mod logging;
pub mod quickfix;

pub use config::{Config, ConfigError};
pub use logging::init_logging;
