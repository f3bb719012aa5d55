use std::path::PathBuf;
use thiserror::Error;

use crate::source::join_key;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// Raised when a field is read and neither a source nor the schema
    /// default can supply it.
    #[error(
        "required configuration value not found.\n \
         please provide {key} as a commandline argument\n \
         or add {} to your config file\n \
         or add {env_var} to your Environment",
        join_key(Some(.path.as_str()), .key)
    )]
    MissingValue {
        key: String,
        path: String,
        env_var: String,
    },

    #[error("'{key}' under '{path}' is a configuration section, not a value")]
    NotAValue { key: String, path: String },

    #[error("'{key}' under '{path}' is not a configuration section")]
    NotASection { key: String, path: String },

    #[error("Config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse {format} file {path}: {reason}")]
    Parse {
        path: PathBuf,
        format: &'static str,
        reason: String,
    },

    #[error("Invalid file_format: {0} (expected environments, sections or flat)")]
    InvalidFormat(String),

    #[error("Invalid missing file option: {0} (expected warn, ignore or error)")]
    InvalidMissingFilePolicy(String),

    #[error("Invalid CLI strategy: {0} (expected last-segment or full-path)")]
    InvalidCliStrategy(String),

    #[error("Config Environment \"{env}\" not found in {path}")]
    UnknownEnvironment { env: String, path: PathBuf },

    #[error(
        "No config environment selected for {path}: pass one explicitly \
         or declare [batconf] default_env in the file"
    )]
    NoDefaultEnvironment { path: PathBuf },

    #[error("Unsupported config file type: {path} (expected .ini, .toml or .yaml)")]
    UnsupportedFileType { path: PathBuf },

    #[error("Failed to flatten CLI overrides: {0}")]
    Overrides(#[from] serde_json::Error),
}

impl ConfigError {
    /// True for the access-time error raised when a value cannot be resolved.
    pub fn is_missing_value(&self) -> bool {
        matches!(self, ConfigError::MissingValue { .. })
    }
}
