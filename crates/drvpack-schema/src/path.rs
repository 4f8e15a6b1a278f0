//! POSIX relative paths as they appear in installer manifests.
//!
//! Manifest paths are always interpreted relative to the unpacked driver tree,
//! so a leading `/` is stripped rather than preserved. Paths compare segment by
//! segment, which keeps `lib/x` ahead of `lib-extra/x` when sorting.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A normalized relative path: no root, no empty or `.` segments.
///
/// The empty path is the current directory and displays as `.`.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct RelPath {
    segments: Vec<String>,
}

impl RelPath {
    pub fn new(raw: &str) -> Self {
        let segments = raw
            .split('/')
            .filter(|s| !s.is_empty() && *s != ".")
            .map(str::to_owned)
            .collect();
        Self { segments }
    }

    /// The current directory, `.`.
    pub fn current() -> Self {
        Self::default()
    }

    pub fn is_current(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> impl DoubleEndedIterator<Item = &str> + ExactSizeIterator {
        self.segments.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    #[must_use]
    pub fn join(&self, other: &RelPath) -> RelPath {
        let mut segments = self.segments.clone();
        segments.extend(other.segments.iter().cloned());
        RelPath { segments }
    }

    /// Parent directory; the parent of `.` or of a single segment is `.`.
    #[must_use]
    pub fn parent(&self) -> RelPath {
        let keep = self.segments.len().saturating_sub(1);
        RelPath {
            segments: self.segments[..keep].to_vec(),
        }
    }

    /// Last segment, or the empty string for `.`.
    pub fn file_name(&self) -> &str {
        self.segments.last().map_or("", String::as_str)
    }

    /// Drop the first `n` segments.
    #[must_use]
    pub fn skip(&self, n: usize) -> RelPath {
        RelPath {
            segments: self.segments.iter().skip(n).cloned().collect(),
        }
    }

    pub fn starts_with(&self, prefix: &RelPath) -> bool {
        self.segments.starts_with(&prefix.segments)
    }

    /// The remainder below `prefix`, if this path lies under it.
    pub fn strip_prefix(&self, prefix: &RelPath) -> Option<RelPath> {
        if self.starts_with(prefix) {
            Some(self.skip(prefix.segments.len()))
        } else {
            None
        }
    }
}

impl fmt::Display for RelPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            f.write_str(".")
        } else {
            f.write_str(&self.segments.join("/"))
        }
    }
}

impl From<&str> for RelPath {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for RelPath {
    fn from(raw: String) -> Self {
        Self::new(&raw)
    }
}

impl From<RelPath> for String {
    fn from(path: RelPath) -> Self {
        path.to_string()
    }
}

/// Join a rendered base directory (which may be absolute or carry shell
/// variables) with a relative path.
pub fn join_display(base: &str, rel: &RelPath) -> String {
    if rel.is_current() {
        return base.to_owned();
    }
    let trimmed = base.trim_end_matches('/');
    if trimmed.is_empty() && base.starts_with('/') {
        format!("/{rel}")
    } else if trimmed.is_empty() || trimmed == "." {
        rel.to_string()
    } else {
        format!("{trimmed}/{rel}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_root_and_dot_segments() {
        assert_eq!(RelPath::new("/usr/lib/").to_string(), "usr/lib");
        assert_eq!(RelPath::new("./a//b/./c").to_string(), "a/b/c");
        assert_eq!(RelPath::new("/").to_string(), ".");
        assert_eq!(RelPath::new("").to_string(), ".");
    }

    #[test]
    fn keeps_parent_segments() {
        assert_eq!(RelPath::new("../README").to_string(), "../README");
    }

    #[test]
    fn parent_and_file_name() {
        let p = RelPath::new("kernel/nvidia/nv.c");
        assert_eq!(p.parent().to_string(), "kernel/nvidia");
        assert_eq!(p.file_name(), "nv.c");
        assert_eq!(RelPath::new("README").parent().to_string(), ".");
        assert_eq!(RelPath::current().parent().to_string(), ".");
        assert_eq!(RelPath::current().file_name(), "");
    }

    #[test]
    fn join_ignores_current_dir() {
        let dir = RelPath::current();
        assert_eq!(dir.join(&RelPath::new("README")).to_string(), "README");
        assert_eq!(
            RelPath::new("GL").join(&RelPath::new("gl.h")).to_string(),
            "GL/gl.h"
        );
    }

    #[test]
    fn strip_prefix_is_segment_wise() {
        let p = RelPath::new("lib64/tls/libnvidia-tls.so");
        assert_eq!(
            p.strip_prefix(&RelPath::new("lib64")).unwrap().to_string(),
            "tls/libnvidia-tls.so"
        );
        assert!(p.strip_prefix(&RelPath::new("lib")).is_none());
        assert_eq!(
            RelPath::new("lib")
                .strip_prefix(&RelPath::new("lib/"))
                .unwrap()
                .to_string(),
            "."
        );
    }

    #[test]
    fn skip_drops_leading_segments() {
        let p = RelPath::new("kernel/nvidia-uvm/uvm.c");
        assert_eq!(p.skip(1).to_string(), "nvidia-uvm/uvm.c");
        assert_eq!(p.skip(5).to_string(), ".");
    }

    #[test]
    fn ordering_is_segment_wise() {
        let a = RelPath::new("lib/x");
        let b = RelPath::new("lib-extra/x");
        assert!(a < b, "segment comparison puts 'lib' before 'lib-extra'");
    }

    #[test]
    fn serializes_as_string() {
        let p = RelPath::new("/share/doc");
        assert_eq!(serde_json::to_string(&p).unwrap(), "\"share/doc\"");
        let back: RelPath = serde_json::from_str("\"./share/doc/\"").unwrap();
        assert_eq!(back, p);
    }

    #[test]
    fn join_display_handles_roots() {
        let rel = RelPath::new("lib/libGL.so");
        assert_eq!(join_display("${!outputLib}", &rel), "${!outputLib}/lib/libGL.so");
        assert_eq!(join_display("/run/opengl/", &rel), "/run/opengl/lib/libGL.so");
        assert_eq!(join_display("/", &rel), "/lib/libGL.so");
        assert_eq!(join_display(".", &rel), "lib/libGL.so");
        assert_eq!(join_display("${out}", &RelPath::current()), "${out}");
    }
}
