//! Compile JSON rule documents into predicate ASTs.
//!
//! A category document is a tree: objects map category names to sub-trees and
//! leaves are predicate objects. Flattening turns it into one
//! [`CategoryRule`] per node, named by its dotted path. The root is `_all`.

use crate::attribute::Attribute;
use crate::pattern::GlobPattern;
use crate::predicate::Predicate;
use crate::RuleError;
use drvpack_schema::CategoryName;
use serde_json::{Map, Value};
use std::collections::HashSet;

/// Name of the category for the document root.
pub const ROOT_CATEGORY: &str = "_all";

/// One flattened node of the category tree.
#[derive(Debug, Clone)]
pub struct CategoryRule {
    pub name: CategoryName,
    /// Inner nodes have no predicate and never match.
    pub predicate: Option<Predicate>,
    /// Immediate sub-categories, in document order.
    pub children: Vec<CategoryName>,
}

/// Flattened category tree, children listed before their parents.
#[derive(Debug, Clone, Default)]
pub struct CategoryTable {
    rules: Vec<CategoryRule>,
}

impl CategoryTable {
    pub fn iter(&self) -> impl Iterator<Item = &CategoryRule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&CategoryRule> {
        self.rules.iter().find(|r| r.name == name)
    }
}

/// An override rule: when `check` holds, `values` are merged into the entry's
/// override map.
#[derive(Debug, Clone)]
pub struct OverrideRule {
    pub check: Predicate,
    pub values: Vec<(String, String)>,
}

fn invalid(at: &str, reason: impl Into<String>) -> RuleError {
    RuleError::InvalidRule {
        at: if at.is_empty() {
            ROOT_CATEGORY.to_owned()
        } else {
            at.to_owned()
        },
        reason: reason.into(),
    }
}

fn category_name(path: &[&str]) -> CategoryName {
    if path.is_empty() {
        CategoryName::new(ROOT_CATEGORY)
    } else {
        CategoryName::new(path.join("."))
    }
}

/// Category names become directory names under `c/`. Keys with a `/` or an
/// empty dot-separated part (`""`, `.`, `..`, `a.`) are rejected.
fn is_valid_key(key: &str) -> bool {
    !key.contains('/') && key.split('.').all(|part| !part.is_empty())
}

/// Whether a JSON value is a predicate rather than a category node.
fn is_predicate(value: &Value) -> bool {
    let Value::Object(map) = value else {
        return false;
    };
    if map.len() == 2 && map.contains_key("op") && map.contains_key("args") {
        return true;
    }
    map.len() == 1
        && map
            .iter()
            .all(|(k, v)| (k == "all" || k == "any") && v.is_array())
}

struct Frame<'a> {
    path: Vec<&'a str>,
    value: &'a Value,
    expanded: bool,
}

/// Flatten a category document into a [`CategoryTable`].
///
/// Uses an explicit stack; the emitted order is a post-order walk in document
/// order, so every category appears after all of its sub-categories.
pub fn compile_categories(doc: &Value) -> Result<CategoryTable, RuleError> {
    let mut rules = Vec::new();
    let mut seen = HashSet::new();
    let mut stack = vec![Frame {
        path: Vec::new(),
        value: doc,
        expanded: false,
    }];

    while let Some(frame) = stack.pop() {
        let name = category_name(&frame.path);
        let rule = if is_predicate(frame.value) {
            CategoryRule {
                predicate: Some(compile_predicate(frame.value, &name)?),
                name,
                children: Vec::new(),
            }
        } else if let Value::Object(map) = frame.value {
            if frame.expanded {
                let children = map
                    .keys()
                    .map(|k| {
                        let mut path = frame.path.clone();
                        path.push(k.as_str());
                        category_name(&path)
                    })
                    .collect();
                CategoryRule {
                    name,
                    predicate: None,
                    children,
                }
            } else {
                stack.push(Frame {
                    path: frame.path.clone(),
                    value: frame.value,
                    expanded: true,
                });
                for (key, value) in map.iter().rev() {
                    if !is_valid_key(key) {
                        return Err(invalid(
                            &name,
                            format!("invalid category key '{key}'"),
                        ));
                    }
                    let mut path = frame.path.clone();
                    path.push(key.as_str());
                    stack.push(Frame {
                        path,
                        value,
                        expanded: false,
                    });
                }
                continue;
            }
        } else {
            return Err(invalid(
                &name,
                "expected a category object or a predicate",
            ));
        };

        if !seen.insert(rule.name.clone()) {
            return Err(invalid(&rule.name, "duplicate category name"));
        }
        rules.push(rule);
    }

    Ok(CategoryTable { rules })
}

/// Compile a single predicate object. `at` names its location for errors.
pub fn compile_predicate(value: &Value, at: &str) -> Result<Predicate, RuleError> {
    let Value::Object(map) = value else {
        return Err(invalid(at, format!("expected a predicate object, found {value}")));
    };

    if map.len() == 1 {
        if let Some(args) = map.get("all") {
            return compile_list(args, at).map(Predicate::All);
        }
        if let Some(args) = map.get("any") {
            return compile_list(args, at).map(Predicate::Any);
        }
    }

    if map.len() != 2 || !map.contains_key("args") {
        return Err(invalid(at, "predicate must have exactly 'op' and 'args'"));
    }
    let Some(op) = map.get("op").and_then(Value::as_str) else {
        return Err(invalid(at, "'op' must be a string"));
    };
    let args = &map["args"];

    match op {
        "match" => compile_match(args, at),
        "not" => Ok(Predicate::Not(Box::new(compile_predicate(args, at)?))),
        "all" => compile_list(args, at).map(Predicate::All),
        "any" => compile_list(args, at).map(Predicate::Any),
        other => Err(invalid(at, format!("unknown operator '{other}'"))),
    }
}

fn compile_match(args: &Value, at: &str) -> Result<Predicate, RuleError> {
    let Value::Object(args) = args else {
        return Err(invalid(at, "'match' arguments must be an object"));
    };
    if let Some(unknown) = args.keys().find(|k| *k != "variable" && *k != "pattern") {
        return Err(invalid(at, format!("unknown 'match' argument '{unknown}'")));
    }

    let Some(variable) = args.get("variable").and_then(Value::as_str) else {
        return Err(invalid(at, "'match' needs a string 'variable'"));
    };
    let attribute = Attribute::from_name(variable).ok_or_else(|| {
        invalid(
            at,
            format!(
                "unknown attribute '{variable}', expected one of: {}",
                Attribute::names().collect::<Vec<_>>().join(", ")
            ),
        )
    })?;

    let raw_patterns: Vec<&str> = match args.get("pattern") {
        Some(Value::String(p)) => vec![p.as_str()],
        Some(Value::Array(items)) => items
            .iter()
            .map(|v| {
                v.as_str()
                    .ok_or_else(|| invalid(at, "'pattern' entries must be strings"))
            })
            .collect::<Result<_, _>>()?,
        _ => return Err(invalid(at, "'match' needs a 'pattern' string or list")),
    };
    let patterns = raw_patterns
        .into_iter()
        .map(|p| GlobPattern::new(p).map_err(|reason| invalid(at, reason)))
        .collect::<Result<_, _>>()?;

    Ok(Predicate::Match {
        attribute,
        patterns,
    })
}

/// Arguments of `all`/`any`: a list, or an object whose values are used in order.
fn compile_list(args: &Value, at: &str) -> Result<Vec<Predicate>, RuleError> {
    match args {
        Value::Array(items) => items.iter().map(|v| compile_predicate(v, at)).collect(),
        Value::Object(map) => map.values().map(|v| compile_predicate(v, at)).collect(),
        _ => Err(invalid(at, "combinator arguments must be a list or an object")),
    }
}

/// Compile an override document: an ordered list of objects with a `check`
/// predicate and string-valued overrides.
pub fn compile_overrides(doc: &Value) -> Result<Vec<OverrideRule>, RuleError> {
    let Value::Array(items) = doc else {
        return Err(invalid("overrides", "override document must be a list"));
    };

    items
        .iter()
        .enumerate()
        .map(|(i, item)| compile_override(item, &format!("overrides[{i}]")))
        .collect()
}

fn compile_override(item: &Value, at: &str) -> Result<OverrideRule, RuleError> {
    let Value::Object(map) = item else {
        return Err(invalid(at, "override rule must be an object"));
    };
    let check = map
        .get("check")
        .ok_or_else(|| invalid(at, "override rule needs a 'check' predicate"))?;
    let check = compile_predicate(check, &format!("{at}.check"))?;
    let values = override_values(map, at)?;
    Ok(OverrideRule { check, values })
}

fn override_values(map: &Map<String, Value>, at: &str) -> Result<Vec<(String, String)>, RuleError> {
    map.iter()
        .filter(|(k, _)| *k != "check")
        .map(|(k, v)| match v {
            Value::String(s) => Ok((k.clone(), s.clone())),
            other => Err(invalid(
                at,
                format!("override '{k}' must be a string, found {other}"),
            )),
        })
        .collect()
}
