//! Configuration for the family network core.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::family::StaticDirectory;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Core configuration, usually loaded from TOML.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// SQLite database file
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    /// Emit notifications on request creation, acceptance and rejection
    #[serde(default = "default_true")]
    pub notifications_enabled: bool,

    /// Fallback display names, consulted after the user directory
    #[serde(default)]
    pub directory: Vec<DirectoryEntry>,
}

/// A static email → display name entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DirectoryEntry {
    pub email: String,
    pub name: String,
}

fn default_database_path() -> PathBuf {
    PathBuf::from("swasthyalink.db")
}

fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            notifications_enabled: true,
            directory: Vec::new(),
        }
    }
}

impl Config {
    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Build the static name directory.
    pub fn static_directory(&self) -> StaticDirectory {
        StaticDirectory::new(
            self.directory
                .iter()
                .map(|entry| (entry.email.clone(), entry.name.clone())),
        )
    }
}
