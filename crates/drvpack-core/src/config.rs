use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default config file name looked up next to the manifest.
pub const CONFIG_FILE_NAME: &str = "drvpack.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    ParseToml(#[from] toml::de::Error),
    #[error("missing config value '{0}'")]
    MissingField(&'static str),
}

/// Contents of `drvpack.toml`.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct DrvpackConfig {
    #[serde(default)]
    pub rules: RulesSection,
    #[serde(default)]
    pub output: OutputSection,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RulesSection {
    /// Category document; without one every entry is mismatched.
    #[serde(default)]
    pub categories: Option<PathBuf>,
    #[serde(default)]
    pub overrides: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct OutputSection {
    #[serde(default)]
    pub root: Option<PathBuf>,
    /// Shell variable holding the output root, used when no `prefix` override applies.
    #[serde(default = "default_prefix")]
    pub prefix: String,
    /// Directory below the output root, used when no `dir` override applies.
    #[serde(default = "default_dir")]
    pub dir: String,
    /// Variable reassigned when sourcing a compat32 script.
    #[serde(default = "default_compat32_variable")]
    pub compat32_variable: String,
    #[serde(default = "default_compat32_value")]
    pub compat32_value: String,
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            root: None,
            prefix: default_prefix(),
            dir: default_dir(),
            compat32_variable: default_compat32_variable(),
            compat32_value: default_compat32_value(),
        }
    }
}

fn default_prefix() -> String {
    "!outputLib".to_owned()
}

fn default_dir() -> String {
    "/lib".to_owned()
}

fn default_compat32_variable() -> String {
    "outputLib".to_owned()
}

fn default_compat32_value() -> String {
    "lib32".to_owned()
}

impl DrvpackConfig {
    pub fn parse_str(input: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(input)?)
    }

    /// Load a config file. Relative paths inside it are resolved against the
    /// file's directory.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let mut config = Self::parse_str(&content)?;
        if let Some(base) = path.parent() {
            config.resolve_relative_to(base);
        }
        Ok(config)
    }

    fn resolve_relative_to(&mut self, base: &Path) {
        for path in [
            &mut self.rules.categories,
            &mut self.rules.overrides,
            &mut self.output.root,
        ]
        .into_iter()
        .flatten()
        {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }
}
