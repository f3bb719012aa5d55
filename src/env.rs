use std::collections::HashMap;
use std::ffi::OsString;

use crate::source::Source;

/// Root prefix used when a lookup carries no namespace path.
pub const DEFAULT_ENV_PREFIX: &str = "BAT";

/// Derive the environment variable name for `key` under `module`.
///
/// The dotted module path (or `prefix` when there is none) and the dotted key
/// are split into segments, joined with `_` and uppercased:
///
/// | module            | key      | variable                   |
/// |-------------------|----------|----------------------------|
/// | `bat.module.path` | `to.key` | `BAT_MODULE_PATH_TO_KEY`   |
/// | *(none)*          | `key`    | `BAT_KEY`                  |
pub fn env_var_name(key: &str, module: Option<&str>, prefix: &str) -> String {
    let head = match module {
        Some(m) if !m.is_empty() => m,
        _ => prefix,
    };
    head.split('.')
        .chain(key.split('.'))
        .collect::<Vec<_>>()
        .join("_")
        .to_uppercase()
}

/// Name of the variable that may point at a config file, e.g. `BAT_CONFIG_FILE`.
pub fn config_file_var(prefix: &str) -> String {
    format!("{}_CONFIG_FILE", prefix.to_uppercase())
}

/// Environment variables as a configuration source.
///
/// The variables are captured when the source is built; later changes to the
/// process environment are not observed. Empty values count as absent.
#[derive(Debug, Clone)]
pub struct EnvSource {
    prefix: String,
    vars: HashMap<String, String>,
}

impl EnvSource {
    /// Snapshot the current process environment. Variables whose name or
    /// value is not valid UTF-8 are skipped.
    pub fn from_env() -> Self {
        Self::from_vars(utf8_vars(std::env::vars_os()))
    }

    /// Build from explicit pairs, so tests can pass synthetic data instead of
    /// `std::env::vars()`.
    pub fn from_vars(vars: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            prefix: DEFAULT_ENV_PREFIX.to_string(),
            vars: vars.into_iter().filter(|(_, v)| !v.is_empty()).collect(),
        }
    }

    /// Replace the root prefix used for lookups without a namespace path.
    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.prefix = prefix.to_string();
        self
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn env_name(&self, key: &str, module: Option<&str>) -> String {
        env_var_name(key, module, &self.prefix)
    }

    /// Raw access to a captured variable by its full name.
    pub fn var(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }
}

impl Source for EnvSource {
    fn get(&self, key: &str, path: Option<&str>) -> Option<String> {
        self.vars.get(&self.env_name(key, path)).cloned()
    }
}

fn utf8_vars(
    vars: impl IntoIterator<Item = (OsString, OsString)>,
) -> impl Iterator<Item = (String, String)> {
    vars.into_iter()
        .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
}
