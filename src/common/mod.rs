//! Common utilities shared by the sweep stages and the CLI

pub mod config;
pub mod error;
pub mod logging;
pub mod paths;

pub use config::{Config, ConfigOverrides, SweepConfig};
pub use error::{Error, Result};
