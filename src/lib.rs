//! Hierarchical configuration for Rust applications. Describe the shape once,
//! then read any value from the first source that has it.
//!
//! ```ignore
//! let tree = Batconf::builder(Schema::of::<ProjectConfig>())
//!     .root_path("project")
//!     .load()?;
//! let key = tree.root().get_path("submodule.client.key1")?;
//! ```
//!
//! That call snapshots the environment, finds `config.yaml` in the working
//! directory, and builds a tree mirroring `ProjectConfig`. Values are looked
//! up lazily: nothing fails until a field that no source can supply is read.
//!
//! # Design: the tree is the namespace
//!
//! A [`Schema`] describes one configuration level: primitive fields (with or
//! without a default) and nested schemas. [`ConfigTree::build`] walks it once
//! and gives every nested schema a node with a dotted path, starting from the
//! root path you pick:
//!
//! ```text
//! project                    ProjectConfig
//! project.submodule          SubmoduleConfig
//! project.submodule.client   ClientConfig { key1, key2 = "default" }
//! ```
//!
//! Reading `key1` on the client node asks the source list for
//! `("key1", "project.submodule.client")`. Each source maps that pair onto
//! its own naming scheme, so a subsystem's configuration can be moved or
//! reused by mounting the same schema under a different path.
//!
//! Schemas can be written by hand, supplied per type through
//! [`DescribeSchema`], or derived from a `#[derive(confique::Config)]` struct
//! with [`Schema::of`].
//!
//! # Source precedence
//!
//! A [`SourceList`] is an ordered chain; the first source returning a
//! non-empty value wins and later sources are never consulted. The
//! [`BatconfBuilder`] assembles the usual chain:
//!
//! ```text
//! CLI overrides         --set key=value, clap flags
//!        ↓ then
//! Extra sources         .source(...)
//!        ↓ then
//! Environment vars      PROJECT_SUBMODULE_CLIENT_KEY1
//!        ↓ then
//! Config file           INI / TOML / YAML
//!        ↓ then
//! Schema defaults
//! ```
//!
//! Any type implementing [`Source`] can take part, and a `SourceList` can be
//! built by hand for full control.
//!
//! # Environment variables
//!
//! The node path and the key are split on dots, joined with `_` and
//! uppercased:
//!
//! | Lookup                                | Env var                         |
//! |---------------------------------------|---------------------------------|
//! | `key1` at `project.submodule.client`  | `PROJECT_SUBMODULE_CLIENT_KEY1` |
//! | `key` with no path                    | `BAT_KEY`                       |
//!
//! The environment is captured once when the source is built.
//! `{PREFIX}_CONFIG_FILE` (default `BAT_CONFIG_FILE`) names the config file
//! when none is given explicitly.
//!
//! # Config files
//!
//! File sources share three settings, grouped in [`FileOptions`]:
//!
//! - **Format** ([`FileFormat`]): `environments` (default) keeps one
//!   top-level group per deployment environment (`[dev.project.submodule]`),
//!   `sections` uses the namespace directly (`[project.submodule]`), `flat`
//!   looks up `project.submodule.key` as a literal key.
//! - **Environment**: which group to read in `environments` format. Without
//!   one, the file's own `[batconf] default_env` is used.
//! - **Missing file policy** ([`MissingFilePolicy`]): `warn` (default) logs
//!   and continues, `ignore` continues silently, `error` fails construction.
//!
//! INI support is behind the `ini` feature and YAML behind `yaml`, both on
//! by default. TOML is always available.
//!
//! # CLI values
//!
//! With [`CliStrategy::LastSegment`] (default) a CLI value matches by the
//! last segment of the key, so `--key1` answers `key1` in every section.
//! [`CliStrategy::FullPath`] matches the full dotted namespace instead. The
//! optional [`ConfigArgs`] (feature `clap`) provides `--config-file`,
//! `--config-env`, `--set KEY=VALUE` and `--cli-strategy` flags.
//!
//! # Errors
//!
//! Construction errors (unreadable or malformed file, unknown environment,
//! missing file under the `error` policy) surface from
//! [`BatconfBuilder::load`] or the source constructors. Reading a value that
//! nothing supplies returns [`ConfigError::MissingValue`], whose message
//! lists every way to provide it. Values are memoized per field, and the tree
//! can be shared freely between threads.

pub mod error;
pub mod ops;
pub mod types;

mod args;
mod builder;
#[cfg(feature = "clap")]
mod cli;
mod defaults;
mod env;
mod file;
#[cfg(feature = "ini")]
mod ini_file;
mod schema;
mod source;
mod toml_file;
mod tree;
#[cfg(feature = "yaml")]
mod yaml_file;

#[cfg(test)]
mod fixtures;

pub use args::{ArgsSource, NamespaceSource, cli_source, flatten_serialize};
pub use builder::{Batconf, BatconfBuilder, DEFAULT_CONFIG_FILE_NAME, open_file_source};
#[cfg(feature = "clap")]
pub use cli::ConfigArgs;
pub use defaults::DefaultsSource;
pub use env::{DEFAULT_ENV_PREFIX, EnvSource, config_file_var, env_var_name};
pub use error::ConfigError;
pub use file::{locate_config_file, read_config_file, resolve_search_path};
#[cfg(feature = "ini")]
pub use ini_file::IniSource;
pub use ops::ConfigResult;
pub use schema::{DescribeSchema, Field, FieldType, Schema};
pub use source::{Source, SourceList, join_key};
pub use toml_file::TomlSource;
pub use tree::{ConfigTree, Configuration, Entry};
pub use types::{CliStrategy, FileFormat, FileOptions, MissingFilePolicy, SearchPath};
#[cfg(feature = "yaml")]
pub use yaml_file::YamlSource;
