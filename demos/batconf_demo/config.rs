//! Configuration schema for the batconf demo application.
//!
//! The root [`DemoConfig`] plugs in a `submodule` section, which itself holds
//! a `client` section. With the root path `project`, a client field `key1`
//! is looked up under the namespace `project.submodule.client`:
//!
//! | Source      | Name                                            |
//! |-------------|-------------------------------------------------|
//! | env var     | `PROJECT_SUBMODULE_CLIENT_KEY1`                 |
//! | INI file    | `[{env}.project.submodule.client]` `key1 = ...` |
//! | CLI         | `--key1 ...` or `--set key1=...`                |

use confique::Config;

/// Root configuration for the demo application.
#[derive(Config, Debug)]
#[allow(dead_code)]
pub struct DemoConfig {
    /// Human-readable name printed in the banner.
    #[config(default = "batconf-demo")]
    pub name: String,

    /// Submodule settings (nested config).
    #[config(nested)]
    pub submodule: SubmoduleConfig,
}

#[derive(Config, Debug)]
#[allow(dead_code)]
pub struct SubmoduleConfig {
    /// Client settings (nested config).
    #[config(nested)]
    pub client: ClientConfig,
}

#[derive(Config, Debug)]
#[allow(dead_code)]
pub struct ClientConfig {
    /// Required; no default.
    pub key1: String,

    #[config(default = "client default for key2")]
    pub key2: String,

    /// Request timeout in seconds.
    #[config(default = 30)]
    pub timeout: u32,
}
