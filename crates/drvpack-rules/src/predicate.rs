use crate::attribute::{Attribute, AttributeValue};
use crate::pattern::GlobPattern;
use drvpack_schema::ParsedLine;

/// Compiled boolean rule over a single manifest entry.
#[derive(Debug, Clone)]
pub enum Predicate {
    /// True if the attribute matches any of the patterns.
    Match {
        attribute: Attribute,
        patterns: Vec<GlobPattern>,
    },
    Not(Box<Predicate>),
    /// Vacuously true when empty.
    All(Vec<Predicate>),
    /// Vacuously false when empty.
    Any(Vec<Predicate>),
}

impl Predicate {
    pub fn evaluate(&self, line: &ParsedLine) -> bool {
        match self {
            Self::Match {
                attribute,
                patterns,
            } => match attribute.resolve(line) {
                None => false,
                Some(AttributeValue::Text(value)) => {
                    patterns.iter().any(|p| p.matches_text(&value))
                }
                Some(AttributeValue::Path(value)) => {
                    patterns.iter().any(|p| p.matches_path(&value))
                }
            },
            Self::Not(inner) => !inner.evaluate(line),
            Self::All(items) => items.iter().all(|p| p.evaluate(line)),
            Self::Any(items) => items.iter().any(|p| p.evaluate(line)),
        }
    }
}
