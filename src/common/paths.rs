//! Configuration file locations
//!
//! Uses the directories crate for platform-appropriate locations:
//! - Linux: `~/.config/psi-sweep/`
//! - macOS: `~/Library/Application Support/psi-sweep/`
//! - Windows: `%APPDATA%\psi-sweep\`

use std::path::{Path, PathBuf};

/// Application name used for config directories
const APP_NAME: &str = "psi-sweep";

/// Get the configuration directory path
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the default configuration file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.toml"))
}

/// Whether a program name should be looked up on `PATH`
///
/// Anything with a path separator (`./ServerMain`, `../build/src/ClientMain`)
/// is taken relative to the working directory instead.
pub fn is_bare_command(program: &Path) -> bool {
    program.components().count() == 1 && !program.is_absolute()
}
