//! INI files as a configuration source.
//!
//! Parsing is delegated to `rust-ini`. Option names are case-insensitive
//! (stored lowercased); section names are case-sensitive. Values in a
//! `[DEFAULT]` section are visible from every other section that exists.
//!
//! | format         | lookup of `get("token", Some("project.database"))`     |
//! |----------------|---------------------------------------------------------|
//! | `environments` | section `{env}.project.database`, option `token`        |
//! | `sections`     | section `project.database`, option `token`              |
//! | `flat`         | unsectioned option `project.database.token`             |

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use ini::{Ini, ParseOption};

use crate::error::ConfigError;
use crate::file::{read_config_file, select_environment};
use crate::source::{Source, join_key};
use crate::types::{FileFormat, FileOptions};

const DEFAULT_SECTION: &str = "DEFAULT";

type Options = HashMap<String, String>;

#[derive(Debug, Clone, Default)]
struct IniData {
    general: Options,
    sections: HashMap<String, Options>,
}

impl IniData {
    fn parse(content: &str, path: &Path) -> Result<Self, ConfigError> {
        let opt = ParseOption {
            enabled_quote: false,
            enabled_escape: false,
            ..ParseOption::default()
        };
        let ini = Ini::load_from_str_opt(content, opt).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            format: "INI",
            reason: e.to_string(),
        })?;

        let mut data = IniData::default();
        for (section, props) in ini.iter() {
            let target = match section {
                Some(name) => data.sections.entry(name.to_string()).or_default(),
                None => &mut data.general,
            };
            for (option, value) in props.iter() {
                target.insert(option.to_lowercase(), value.to_string());
            }
        }
        Ok(data)
    }

    fn has_section(&self, name: &str) -> bool {
        self.sections.contains_key(name)
    }

    /// An environment exists if it is a section itself or prefixes one.
    fn has_environment(&self, env: &str) -> bool {
        let nested = format!("{env}.");
        self.sections
            .keys()
            .any(|name| name == env || name.starts_with(&nested))
    }

    fn option(&self, section: Option<&str>, option: &str) -> Option<String> {
        let option = option.to_lowercase();
        let value = match section {
            None => self.general.get(&option),
            Some(name) => {
                let options = self.sections.get(name)?;
                options.get(&option).or_else(|| {
                    self.sections
                        .get(DEFAULT_SECTION)
                        .and_then(|defaults| defaults.get(&option))
                })
            }
        };
        value.filter(|v| !v.is_empty()).cloned()
    }
}

/// A configuration source backed by an INI file.
#[derive(Debug, Clone)]
pub struct IniSource {
    path: PathBuf,
    format: FileFormat,
    env: Option<String>,
    // `None` when the file was missing and the policy allowed continuing.
    data: Option<IniData>,
}

impl IniSource {
    /// Open and parse `path`. Missing files follow `options.missing`.
    pub fn open(path: impl AsRef<Path>, options: &FileOptions) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        match read_config_file(path, options.missing)? {
            Some(content) => Self::from_str(&content, options, path),
            None => Ok(Self {
                path: path.to_path_buf(),
                format: options.format,
                env: None,
                data: None,
            }),
        }
    }

    /// Parse already-loaded INI text. `origin` is used in error messages.
    pub fn from_str(
        content: &str,
        options: &FileOptions,
        origin: impl AsRef<Path>,
    ) -> Result<Self, ConfigError> {
        let path = origin.as_ref();
        let data = IniData::parse(content, path)?;

        let env = match options.format {
            FileFormat::Environments => {
                let declared = data.option(Some("batconf"), "default_env");
                let env = select_environment(
                    options.config_env.as_deref(),
                    declared.as_deref(),
                    path,
                )?;
                if !data.has_environment(&env) {
                    return Err(ConfigError::UnknownEnvironment {
                        env,
                        path: path.to_path_buf(),
                    });
                }
                tracing::debug!(path = %path.display(), env = %env, "config environment selected");
                Some(env)
            }
            FileFormat::Sections | FileFormat::Flat => None,
        };

        Ok(Self {
            path: path.to_path_buf(),
            format: options.format,
            env,
            data: Some(data),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The selected environment (`environments` format only).
    pub fn environment(&self) -> Option<&str> {
        self.env.as_deref()
    }

    /// Whether the file was loaded, as opposed to missing and skipped.
    pub fn is_loaded(&self) -> bool {
        self.data.is_some()
    }

    pub fn has_section(&self, name: &str) -> bool {
        self.data.as_ref().is_some_and(|d| d.has_section(name))
    }
}

impl Source for IniSource {
    fn get(&self, key: &str, path: Option<&str>) -> Option<String> {
        let data = self.data.as_ref()?;
        let full = join_key(path, key);
        match self.format {
            FileFormat::Environments => {
                let env = self.env.as_deref()?;
                match full.rsplit_once('.') {
                    Some((section, option)) => {
                        data.option(Some(format!("{env}.{section}").as_str()), option)
                    }
                    None => data.option(Some(env), &full),
                }
            }
            FileFormat::Sections => match full.rsplit_once('.') {
                Some((section, option)) => data.option(Some(section), option),
                None => data.option(None, &full),
            },
            FileFormat::Flat => data.option(None, &full),
        }
    }
}
