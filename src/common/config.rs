//! Configuration file handling
//!
//! The sweep is driven by a small TOML file. Every field has a default
//! matching the stock ElGamal evaluation, so running without a config file
//! reproduces that setup. The file form ([`Config`]) is validated into a
//! [`SweepConfig`] once at startup and then passed by reference to every
//! stage of the sweep.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::paths::{config_path, is_bare_command};
use super::{Error, Result};
use crate::sweep::Role;

/// Main configuration structure, as read from disk
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Tab-separated parameter table, one configuration per row
    #[serde(default = "default_table")]
    pub table: PathBuf,

    /// Column delimiter of the parameter table (a single ASCII character)
    #[serde(default = "default_delimiter")]
    pub delimiter: String,

    /// Server executable
    #[serde(default = "default_server")]
    pub server: PathBuf,

    /// Client executable
    #[serde(default = "default_client")]
    pub client: PathBuf,

    /// How many server/client cycles to run for each row
    #[serde(default = "default_runs")]
    pub runs_per_config: u32,

    /// Algorithm-selection flags placed before the swept parameters
    #[serde(default = "default_prefix")]
    pub prefix: Vec<String>,

    /// Swept parameter names, in the order they are passed on the command line
    #[serde(default = "default_parameters")]
    pub parameters: Vec<String>,

    /// Timeout settings
    #[serde(default)]
    pub timeouts: Timeouts,

    /// Failure handling
    #[serde(default)]
    pub policy: Policy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            table: default_table(),
            delimiter: default_delimiter(),
            server: default_server(),
            client: default_client(),
            runs_per_config: default_runs(),
            prefix: default_prefix(),
            parameters: default_parameters(),
            timeouts: Timeouts::default(),
            policy: Policy::default(),
        }
    }
}

fn default_table() -> PathBuf {
    PathBuf::from("Parameters1.txt")
}
fn default_delimiter() -> String {
    "\t".to_string()
}
fn default_server() -> PathBuf {
    PathBuf::from("../build/src/ServerMain")
}
fn default_client() -> PathBuf {
    PathBuf::from("../build/src/ClientMain")
}
fn default_runs() -> u32 {
    10
}

/// Standard ElGamal: 128-bit items, export performance measures
fn default_prefix() -> Vec<String> {
    ["-B", "128", "--perf"].iter().map(|s| s.to_string()).collect()
}

fn default_parameters() -> Vec<String> {
    [
        "clientSetSize",
        "serverSetSize",
        "intersectionSetSize",
        "nSimpleHF",
        "eachSimpleTableSize",
        "eachCuckooTableSize",
        "maxPP",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Timeout settings
#[derive(Debug, Deserialize)]
pub struct Timeouts {
    /// Upper bound on a single client run in seconds (0 waits forever)
    #[serde(default)]
    pub client_secs: u64,

    /// How long the server may keep running after its client has finished
    #[serde(default = "default_server_grace")]
    pub server_grace_ms: u64,

    /// Pause between starting the server and starting the client
    #[serde(default)]
    pub settle_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            client_secs: 0,
            server_grace_ms: default_server_grace(),
            settle_ms: 0,
        }
    }
}

fn default_server_grace() -> u64 {
    2000
}

/// Failure handling policies
#[derive(Debug, Deserialize, Default)]
pub struct Policy {
    /// What to do with a row that lacks a swept parameter
    #[serde(default)]
    pub on_missing_field: MissingFieldPolicy,

    /// What to do when the server cannot be spawned
    #[serde(default)]
    pub on_spawn_error: SpawnPolicy,
}

/// Reaction to a row that cannot be turned into an invocation
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum MissingFieldPolicy {
    /// Report the row and continue with the next one
    #[default]
    SkipRow,
    /// Stop the whole sweep
    Abort,
}

/// Reaction to a server that cannot be spawned
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SpawnPolicy {
    /// Stop the whole sweep
    #[default]
    Abort,
    /// Drop this cycle and try the next repeat
    SkipCycle,
    /// Drop the remaining repeats of this row
    SkipRow,
}

/// Command-line values that take precedence over the config file
#[derive(Debug, Default, Clone)]
pub struct ConfigOverrides {
    pub table: Option<PathBuf>,
    pub server: Option<PathBuf>,
    pub client: Option<PathBuf>,
    pub runs_per_config: Option<u32>,
    pub client_timeout_secs: Option<u64>,
}

impl Config {
    /// Load configuration
    ///
    /// An explicit path must exist. Without one, the default config file is
    /// used when present, otherwise the built-in defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        if let Some(path) = config_path() {
            if path.exists() {
                return Self::from_file(&path);
            }
        }
        Ok(Self::default())
    }

    fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        tracing::debug!("Loaded configuration from {}", path.display());
        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::ConfigParse(e.to_string()))
    }

    /// Apply command-line overrides
    pub fn apply(&mut self, overrides: ConfigOverrides) {
        if let Some(table) = overrides.table {
            self.table = table;
        }
        if let Some(server) = overrides.server {
            self.server = server;
        }
        if let Some(client) = overrides.client {
            self.client = client;
        }
        if let Some(runs) = overrides.runs_per_config {
            self.runs_per_config = runs;
        }
        if let Some(secs) = overrides.client_timeout_secs {
            self.timeouts.client_secs = secs;
        }
    }

    /// Validate and convert into the value the sweep runs with
    pub fn into_sweep_config(self) -> Result<SweepConfig> {
        let delimiter = match self.delimiter.as_bytes() {
            [byte] => *byte,
            _ => {
                return Err(Error::Config(format!(
                    "delimiter must be a single ASCII character, got {:?}",
                    self.delimiter
                )))
            }
        };

        if self.runs_per_config == 0 {
            return Err(Error::Config("runs_per_config must be at least 1".to_string()));
        }

        if self.parameters.is_empty() {
            return Err(Error::Config("parameters must not be empty".to_string()));
        }
        for (i, name) in self.parameters.iter().enumerate() {
            if name.trim().is_empty() {
                return Err(Error::Config(format!("parameter #{} is empty", i + 1)));
            }
            if self.parameters[..i].contains(name) {
                return Err(Error::Config(format!("parameter '{}' is listed twice", name)));
            }
        }

        Ok(SweepConfig {
            table: self.table,
            delimiter,
            server: self.server,
            client: self.client,
            runs_per_config: self.runs_per_config,
            prefix: self.prefix,
            parameters: self.parameters,
            client_timeout: match self.timeouts.client_secs {
                0 => None,
                secs => Some(Duration::from_secs(secs)),
            },
            server_grace: Duration::from_millis(self.timeouts.server_grace_ms),
            settle: Duration::from_millis(self.timeouts.settle_ms),
            on_missing_field: self.policy.on_missing_field,
            on_spawn_error: self.policy.on_spawn_error,
        })
    }
}

/// Validated, immutable settings for one sweep
#[derive(Debug, Clone)]
pub struct SweepConfig {
    pub table: PathBuf,
    pub delimiter: u8,
    pub server: PathBuf,
    pub client: PathBuf,
    pub runs_per_config: u32,
    pub prefix: Vec<String>,
    pub parameters: Vec<String>,
    pub client_timeout: Option<Duration>,
    pub server_grace: Duration,
    pub settle: Duration,
    pub on_missing_field: MissingFieldPolicy,
    pub on_spawn_error: SpawnPolicy,
}

impl Default for SweepConfig {
    fn default() -> Self {
        let timeouts = Timeouts::default();
        Self {
            table: default_table(),
            delimiter: b'\t',
            server: default_server(),
            client: default_client(),
            runs_per_config: default_runs(),
            prefix: default_prefix(),
            parameters: default_parameters(),
            client_timeout: None,
            server_grace: Duration::from_millis(timeouts.server_grace_ms),
            settle: Duration::ZERO,
            on_missing_field: MissingFieldPolicy::default(),
            on_spawn_error: SpawnPolicy::default(),
        }
    }
}

/// Resolve an executable for one side of the pair
///
/// Bare names are searched on `PATH`; anything else must exist as given.
pub fn resolve_executable(role: Role, program: &Path) -> Result<PathBuf> {
    let not_found = || Error::ExecutableNotFound {
        role,
        program: program.display().to_string(),
    };

    if is_bare_command(program) {
        return which::which(program).map_err(|_| not_found());
    }
    if program.is_file() {
        Ok(program.to_path_buf())
    } else {
        Err(not_found())
    }
}
