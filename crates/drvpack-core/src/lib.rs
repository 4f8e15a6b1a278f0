//! Install plan generation for drvpack.
//!
//! Ties the manifest reader and the rule classifier together into the
//! `Engine`: entries are classified, split into installable and mismatched
//! sets, and rendered into per-category shell scripts below an output root.

pub mod config;
pub mod deps;
pub mod engine;
pub mod installable;
pub mod layout;
pub mod partition;
pub mod script;

pub use config::{ConfigError, DrvpackConfig, OutputSection, RulesSection, CONFIG_FILE_NAME};
pub use deps::dependency_block;
pub use engine::{ConvertReport, Engine, Plan};
pub use installable::{InstallableEntry, Placement, PlacementDefaults};
pub use layout::OutputLayout;
pub use partition::{partition, Partition};
pub use script::{Compat32Redirect, GeneratedFile, ScriptGenerator};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("manifest error: {0}")]
    Manifest(#[from] drvpack_schema::ManifestError),
    #[error("rule error: {0}")]
    Rules(#[from] drvpack_rules::RuleError),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
