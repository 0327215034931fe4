//! Error types for the sweep driver
//!
//! Every error carries enough context (file, line, row, parameter name,
//! executable) for the operator to find the offending input without
//! re-running the sweep.

use std::io;
use std::path::Path;
use thiserror::Error;

use crate::sweep::Role;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the sweep driver
#[derive(Error, Debug)]
pub enum Error {
    // === Parameter Table Errors ===
    #[error("Cannot read parameter table '{path}': {source}")]
    ConfigIo {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("Malformed parameter table '{path}' at line {line}: {message}")]
    ConfigFormat {
        path: String,
        line: usize,
        message: String,
    },

    #[error("Row {row} has no value for parameter '{name}'")]
    MissingField { row: usize, name: String },

    // === Process Errors ===
    #[error("Failed to spawn {role} '{program}': {source}")]
    Spawn {
        role: Role,
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("{role} executable '{program}' not found. Set it with --{role} or in the config file")]
    ExecutableNotFound { role: Role, program: String },

    #[error("Sweep interrupted")]
    Interrupted,

    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a table I/O error for `path`
    pub fn config_io(path: &Path, source: io::Error) -> Self {
        Self::ConfigIo {
            path: path.display().to_string(),
            source,
        }
    }

    /// Create a table format error at a 1-based source line
    pub fn config_format(path: &Path, line: usize, message: impl Into<String>) -> Self {
        Self::ConfigFormat {
            path: path.display().to_string(),
            line,
            message: message.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(row: usize, name: &str) -> Self {
        Self::MissingField {
            row,
            name: name.to_string(),
        }
    }

    /// Create a spawn error for one side of the process pair
    pub fn spawn(role: Role, program: &Path, source: io::Error) -> Self {
        Self::Spawn {
            role,
            program: program.display().to_string(),
            source,
        }
    }

    /// Whether this error concerns a single table row rather than the run
    pub fn is_row_error(&self) -> bool {
        matches!(self, Error::MissingField { .. } | Error::ConfigFormat { .. })
    }

    /// Process exit code the CLI reports for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Interrupted => 130,
            _ => 1,
        }
    }
}
