//! marginalia-common — shared plumbing for the marginalia workspace.
//! Currently just the environment-backed service configuration.

pub mod config;

pub use config::{Config, ConfigError};
