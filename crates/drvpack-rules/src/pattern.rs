//! Glob patterns for `match` predicates.
//!
//! String attributes match the whole value, with `*` crossing `/`. Path
//! attributes match from the right, one segment at a time, so `*.so` matches
//! `lib/libGL.so` and `tls/*.so` matches `lib/tls/libnvidia-tls.so`.

use drvpack_schema::RelPath;
use glob::Pattern;

#[derive(Debug, Clone)]
pub struct GlobPattern {
    raw: String,
    whole: Pattern,
    segments: Vec<Pattern>,
    anchored: bool,
}

impl GlobPattern {
    pub fn new(raw: &str) -> Result<Self, String> {
        if raw.is_empty() {
            return Err("empty pattern".to_owned());
        }
        let whole = Pattern::new(raw).map_err(|e| format!("invalid pattern '{raw}': {e}"))?;
        let segments = raw
            .split('/')
            .filter(|s| !s.is_empty() && *s != ".")
            .map(|s| Pattern::new(s).map_err(|e| format!("invalid pattern '{raw}': {e}")))
            .collect::<Result<Vec<_>, _>>()?;
        if segments.is_empty() {
            return Err(format!("pattern '{raw}' has no path segments"));
        }
        Ok(Self {
            raw: raw.to_owned(),
            whole,
            segments,
            anchored: raw.starts_with('/'),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn matches_text(&self, value: &str) -> bool {
        self.whole.matches(value)
    }

    /// Right-anchored segment match. Anchored patterns never match, since
    /// every manifest path is relative.
    pub fn matches_path(&self, path: &RelPath) -> bool {
        if self.anchored || self.segments.len() > path.len() {
            return false;
        }
        self.segments
            .iter()
            .rev()
            .zip(path.segments().rev())
            .all(|(pattern, segment)| pattern.matches(segment))
    }
}
