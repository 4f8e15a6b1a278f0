use crate::compile::{compile_categories, compile_overrides, CategoryTable, OverrideRule};
use crate::RuleError;
use drvpack_schema::{CategoryName, ParsedLine};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

/// Result of classifying one entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    /// Every category whose predicate matched, in table order.
    pub categories: Vec<CategoryName>,
    pub overrides: BTreeMap<String, String>,
}

/// Compiled category tree and override rules.
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    categories: CategoryTable,
    overrides: Vec<OverrideRule>,
}

impl Classifier {
    pub fn new(categories: CategoryTable, overrides: Vec<OverrideRule>) -> Self {
        Self {
            categories,
            overrides,
        }
    }

    pub fn from_documents(categories: &Value, overrides: &Value) -> Result<Self, RuleError> {
        let categories = compile_categories(categories)?;
        let overrides = compile_overrides(overrides)?;
        debug!(
            "compiled {} categories and {} override rules",
            categories.len(),
            overrides.len()
        );
        Ok(Self::new(categories, overrides))
    }

    /// Load both documents; a missing path means an empty document.
    pub fn load(
        categories_path: Option<&Path>,
        overrides_path: Option<&Path>,
    ) -> Result<Self, RuleError> {
        let categories = match categories_path {
            Some(path) => load_json(path)?,
            None => Value::Object(serde_json::Map::new()),
        };
        let overrides = match overrides_path {
            Some(path) => load_json(path)?,
            None => Value::Array(Vec::new()),
        };
        let classifier = Self::from_documents(&categories, &overrides)?;
        info!(
            "loaded {} categories, {} override rules",
            classifier.categories.len(),
            classifier.overrides.len()
        );
        Ok(classifier)
    }

    pub fn categories(&self) -> &CategoryTable {
        &self.categories
    }

    pub fn overrides(&self) -> &[OverrideRule] {
        &self.overrides
    }

    /// Each category with its prerequisites (its immediate sub-categories).
    pub fn dependencies(&self) -> impl Iterator<Item = (&CategoryName, &[CategoryName])> {
        self.categories
            .iter()
            .map(|rule| (&rule.name, rule.children.as_slice()))
    }

    pub fn classify(&self, line: &ParsedLine) -> Classification {
        let categories = self
            .categories
            .iter()
            .filter(|rule| rule.predicate.as_ref().is_some_and(|p| p.evaluate(line)))
            .map(|rule| rule.name.clone())
            .collect();

        let mut overrides = BTreeMap::new();
        for rule in self.overrides.iter().filter(|r| r.check.evaluate(line)) {
            for (key, value) in &rule.values {
                overrides.insert(key.clone(), value.clone());
            }
        }

        Classification {
            categories,
            overrides,
        }
    }
}

fn load_json(path: &Path) -> Result<Value, RuleError> {
    let content = std::fs::read_to_string(path).map_err(|source| RuleError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&content)?)
}
