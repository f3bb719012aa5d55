use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::ConfigError;

/// How a config file organizes its keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FileFormat {
    /// Top-level partitions keyed by environment name; one is selected when
    /// the source is opened and every lookup is scoped to it.
    #[default]
    Environments,
    /// `section.path` → option, the section being everything before the last dot.
    Sections,
    /// A single unsectioned map; keys are matched literally, dots included.
    Flat,
}

impl FromStr for FileFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "environments" => Ok(FileFormat::Environments),
            "sections" => Ok(FileFormat::Sections),
            "flat" => Ok(FileFormat::Flat),
            other => Err(ConfigError::InvalidFormat(other.to_string())),
        }
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FileFormat::Environments => "environments",
            FileFormat::Sections => "sections",
            FileFormat::Flat => "flat",
        })
    }
}

/// What to do when a config file does not exist.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MissingFilePolicy {
    /// Log a warning and continue with an empty source.
    #[default]
    Warn,
    /// Continue with an empty source.
    Ignore,
    /// Fail when the source is opened.
    Error,
}

impl FromStr for MissingFilePolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "warn" => Ok(MissingFilePolicy::Warn),
            "ignore" => Ok(MissingFilePolicy::Ignore),
            "error" => Ok(MissingFilePolicy::Error),
            other => Err(ConfigError::InvalidMissingFilePolicy(other.to_string())),
        }
    }
}

/// How CLI-supplied values are matched against a `(key, path)` lookup.
///
/// `LastSegment` matches on the final dotted segment of the key only, so two
/// options with the same name in different sections share one value.
/// `FullPath` matches on the complete `path.key` string.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CliStrategy {
    #[default]
    LastSegment,
    FullPath,
}

impl FromStr for CliStrategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "last-segment" => Ok(CliStrategy::LastSegment),
            "full-path" => Ok(CliStrategy::FullPath),
            other => Err(ConfigError::InvalidCliStrategy(other.to_string())),
        }
    }
}

/// Where to search for a config file when none is given explicitly.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchPath {
    /// Platform config directory (XDG on Linux, ~/Library/Application Support on macOS).
    Platform,
    /// A subdirectory under the user's home directory, e.g. `Home(".myapp")`.
    Home(&'static str),
    /// Current working directory.
    Cwd,
    /// An explicit directory.
    Path(PathBuf),
}

/// Per-file settings shared by the INI, TOML and YAML sources.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileOptions {
    pub format: FileFormat,
    /// Environment to select in [`FileFormat::Environments`] mode. `None`
    /// uses the default declared by the file.
    pub config_env: Option<String>,
    pub missing: MissingFilePolicy,
}

impl FileOptions {
    pub fn format(mut self, format: FileFormat) -> Self {
        self.format = format;
        self
    }

    pub fn config_env(mut self, env: impl Into<String>) -> Self {
        self.config_env = Some(env.into());
        self
    }

    pub fn missing(mut self, policy: MissingFilePolicy) -> Self {
        self.missing = policy;
        self
    }
}
