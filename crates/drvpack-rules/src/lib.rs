//! Rule documents and entry classification for drvpack.
//!
//! Category documents compile into a flattened tree of predicates
//! (`CategoryTable`), override documents into an ordered list of
//! `OverrideRule`s. The `Classifier` evaluates both against parsed manifest
//! entries. Attribute names are checked while compiling, so a bad document
//! fails before any entry is looked at.

pub mod attribute;
pub mod classify;
pub mod compile;
pub mod pattern;
pub mod predicate;

pub use attribute::{Attribute, AttributeValue};
pub use classify::{Classification, Classifier};
pub use compile::{
    compile_categories, compile_overrides, compile_predicate, CategoryRule, CategoryTable,
    OverrideRule, ROOT_CATEGORY,
};
pub use pattern::GlobPattern;
pub use predicate::Predicate;

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("failed to read rule document {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse rule document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid rule at '{at}': {reason}")]
    InvalidRule { at: String, reason: String },
}
