//! The fixed set of entry attributes rule documents may refer to.

use drvpack_schema::{ParsedLine, RelPath};
use std::borrow::Cow;

/// An entry attribute addressable from a `match` predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attribute {
    FilePath,
    Mode,
    Type,
    Path,
    LnTarget,
    Architecture,
    TlsClass,
    GlvndVariant,
    Module,
    RawEntry,
    Extra,
    TargetPath,
    SrcPath,
}

/// Rule-document names, checked when a document is compiled.
const ATTRIBUTES: &[(&str, Attribute)] = &[
    ("file_path", Attribute::FilePath),
    ("mode", Attribute::Mode),
    ("type", Attribute::Type),
    ("path", Attribute::Path),
    ("ln_target", Attribute::LnTarget),
    ("architecture", Attribute::Architecture),
    ("tls_class", Attribute::TlsClass),
    ("glvnd_variant", Attribute::GlvndVariant),
    ("module", Attribute::Module),
    ("raw_entry", Attribute::RawEntry),
    ("extra", Attribute::Extra),
    ("target_path", Attribute::TargetPath),
    ("src_path", Attribute::SrcPath),
];

/// A resolved attribute value; paths and strings glob differently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeValue<'a> {
    Text(Cow<'a, str>),
    Path(Cow<'a, RelPath>),
}

impl Attribute {
    pub fn from_name(name: &str) -> Option<Self> {
        ATTRIBUTES
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, attr)| *attr)
    }

    pub fn name(self) -> &'static str {
        ATTRIBUTES
            .iter()
            .find(|(_, attr)| *attr == self)
            .map_or("", |(n, _)| n)
    }

    /// All attribute names, in table order.
    pub fn names() -> impl Iterator<Item = &'static str> {
        ATTRIBUTES.iter().map(|(n, _)| *n)
    }

    /// Look the attribute up on an entry. `None` never matches any pattern.
    pub fn resolve(self, line: &ParsedLine) -> Option<AttributeValue<'_>> {
        let entry = &line.entry;
        let text = |s: &'static str| AttributeValue::Text(Cow::Borrowed(s));
        match self {
            Self::FilePath => Some(AttributeValue::Path(Cow::Borrowed(&entry.file_path))),
            Self::Mode => Some(AttributeValue::Text(Cow::Borrowed(entry.mode.as_str()))),
            Self::Type => Some(AttributeValue::Text(Cow::Borrowed(entry.file_type.as_str()))),
            Self::Path => Some(AttributeValue::Path(Cow::Borrowed(&entry.path))),
            Self::LnTarget => entry
                .ln_target
                .as_ref()
                .map(|t| AttributeValue::Path(Cow::Borrowed(t))),
            Self::Architecture => entry.architecture.map(|a| text(a.as_str())),
            Self::TlsClass => entry.tls_class.map(|t| text(t.as_str())),
            Self::GlvndVariant => entry.glvnd_variant.map(|g| text(g.as_str())),
            Self::Module => entry
                .module
                .as_deref()
                .map(|m| AttributeValue::Text(Cow::Borrowed(m))),
            Self::RawEntry => Some(AttributeValue::Text(Cow::Borrowed(line.raw_entry.as_str()))),
            Self::Extra => entry.extra().map(text),
            Self::TargetPath => Some(AttributeValue::Path(Cow::Owned(entry.target_path()))),
            Self::SrcPath => Some(AttributeValue::Path(Cow::Owned(entry.src_path()))),
        }
    }
}
