//! # batconf demo application
//!
//! A sample CLI tool showing how an application wires batconf together. It
//! exists to demonstrate and manually verify the resolution chain.
//!
//! ## Running
//!
//! ```sh
//! cargo run --example batconf_demo -- list
//! cargo run --example batconf_demo -- get submodule.client.key2
//! ```
//!
//! ## Features demonstrated
//!
//! | Feature               | How to exercise it                                                              |
//! |-----------------------|---------------------------------------------------------------------------------|
//! | Schema defaults       | `cargo run --example batconf_demo -- list`                                      |
//! | Missing value message | `cargo run --example batconf_demo -- get submodule.client.key1`                 |
//! | Env var               | `PROJECT_SUBMODULE_CLIENT_KEY1=hi cargo run --example batconf_demo -- list`     |
//! | Config file           | `cargo run --example batconf_demo -- -c demo.ini list`                          |
//! | File environment      | `cargo run --example batconf_demo -- -c demo.ini --config-env prod list`        |
//! | CLI flag              | `cargo run --example batconf_demo -- --key1 hi list`                            |
//! | Generic override      | `cargo run --example batconf_demo -- --set key2=other list`                     |
//! | Logging               | `RUST_LOG=batconf=debug cargo run --example batconf_demo -- list`               |

mod config;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use batconf::ops::{get_value, list_values};
use batconf::{Batconf, BatconfBuilder, ConfigArgs, Schema, SearchPath};

use config::DemoConfig;

// ---------------------------------------------------------------------------
// CLI definitions
// ---------------------------------------------------------------------------

/// batconf demo: resolve a nested configuration from CLI, env, file and defaults.
#[derive(Parser, Debug)]
#[command(name = "batconf-demo")]
struct Cli {
    #[command(flatten)]
    config: ConfigArgs,

    /// Override submodule.client.key1.
    #[arg(long, global = true)]
    key1: Option<String>,

    /// Print the tree structure before running the command.
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print every configuration value.
    List,
    /// Print one value by dotted key, e.g. `submodule.client.key2`.
    Get { key: String },
}

/// Flags forwarded to the builder by name. Non-config flags are dropped by
/// `cli_overrides_from`, so `verbose` can ride along harmlessly.
#[derive(Serialize)]
struct CliOverrides {
    key1: Option<String>,
    verbose: bool,
}

// ---------------------------------------------------------------------------
// Builder setup
// ---------------------------------------------------------------------------

/// Root path `project`, env prefix `BAT` (so `BAT_CONFIG_FILE` can name the
/// file), INI `environments` format, search paths `~/.batconf-demo/` then cwd.
fn make_builder(cli: &Cli) -> Result<BatconfBuilder, batconf::ConfigError> {
    let overrides = CliOverrides {
        key1: cli.key1.clone(),
        verbose: cli.verbose,
    };

    let builder = Batconf::builder(Schema::of::<DemoConfig>())
        .root_path("project")
        .env_prefix("BAT")
        .config_file_name("demo.ini")
        .search_paths(vec![SearchPath::Home(".batconf-demo"), SearchPath::Cwd])
        .cli_overrides_from(&overrides)?;
    Ok(cli.config.apply(builder))
}

fn print_sections(section: batconf::Configuration<'_>, depth: usize) {
    println!("{:indent$}[{}] {}", "", section.path(), section.schema().name(), indent = depth * 2);
    for (_, child) in section.sections() {
        print_sections(child, depth + 1);
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let tree = make_builder(&cli)
        .and_then(BatconfBuilder::load)
        .unwrap_or_else(|e| {
            eprintln!("Failed to load config:\n{e}");
            std::process::exit(1);
        });
    let root = tree.root();

    if cli.verbose {
        print_sections(root, 0);
        println!();
    }

    let result = match &cli.command {
        Commands::List => list_values(&root),
        Commands::Get { key } => get_value(&root, key),
    };
    match result {
        Ok(output) => println!("{output}"),
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}
