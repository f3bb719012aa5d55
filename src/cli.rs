//! Clap adapter for batconf.
//!
//! Compiled only when the `clap` Cargo feature is enabled (on by default).
//! [`ConfigArgs`] is a clap derive type you flatten into your own
//! `#[derive(Parser)]` struct to get the standard configuration flags:
//!
//! ```text
//! -c, --config-file <PATH>        config file to load
//!     --config-env <ENV>          environment to select in the file
//!     --set <KEY=VALUE>           override one value (repeatable)
//!     --cli-strategy <STRATEGY>   last-segment | full-path
//! ```
//!
//! The parsed flags reach the core through [`ConfigArgs::apply`], which feeds
//! them to a [`BatconfBuilder`]. Nothing else in the crate depends on clap.

use std::path::PathBuf;

use clap::Args;

use crate::args::cli_source;
use crate::builder::BatconfBuilder;
use crate::source::Source;
use crate::types::CliStrategy;

/// Clap-derived configuration flags.
///
/// ```ignore
/// #[derive(Parser)]
/// struct Cli {
///     #[command(flatten)]
///     config: ConfigArgs,
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Args)]
pub struct ConfigArgs {
    /// Config file to load, instead of searching for one.
    #[arg(short = 'c', long = "config-file", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    /// Environment to select in an `environments`-format config file.
    #[arg(long = "config-env", value_name = "ENV")]
    pub config_env: Option<String>,

    /// Override a configuration value. May be given more than once.
    #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_key_val)]
    pub set: Vec<(String, String)>,

    /// How `--set` keys match configuration fields.
    #[arg(long = "cli-strategy", value_name = "STRATEGY")]
    pub cli_strategy: Option<CliStrategy>,
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{s}'"))?;
    if key.is_empty() {
        return Err(format!("empty key in '{s}'"));
    }
    Ok((key.to_string(), value.to_string()))
}

impl ConfigArgs {
    /// The `--set` values as a standalone source, or `None` if there are none.
    ///
    /// Keys are matched as given; unlike [`apply`](Self::apply), no root path
    /// is prepended.
    pub fn override_source(&self) -> Option<Box<dyn Source>> {
        cli_source(self.cli_strategy.unwrap_or_default(), self.set.iter().cloned())
    }

    /// Feed the parsed flags into `builder`. Flags that were not given leave
    /// the builder's settings untouched.
    pub fn apply(&self, mut builder: BatconfBuilder) -> BatconfBuilder {
        if let Some(path) = &self.config_file {
            builder = builder.config_file(path);
        }
        if let Some(env) = &self.config_env {
            builder = builder.config_env(Some(env));
        }
        if let Some(strategy) = self.cli_strategy {
            builder = builder.cli_strategy(strategy);
        }
        for (key, value) in &self.set {
            builder = builder.cli_override(key, Some(value));
        }
        builder
    }
}
