//! Configuration utilities.

/// Environment-driven configuration.
pub mod config;

pub use config::{Config, LogFormat, VectorBackend};
