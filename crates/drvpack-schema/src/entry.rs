//! Grammar for a single manifest entry line.
//!
//! The leading `file_path mode type` triple never moved across installer
//! releases, while optional tags were appended at the end over time. The parser
//! therefore walks the token list from both ends with [`TokenCursor`], in a
//! fixed order that must not be rearranged.

use crate::path::RelPath;
use crate::types::{Architecture, FileType, GlvndVariant, Mode, TlsClass};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const MODULE_TAG: &str = "MODULE";
const INHERIT_PATH_DEPTH_TAG: &str = "INHERIT_PATH_DEPTH";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EntryError {
    #[error("malformed manifest entry ({reason}): '{line}'")]
    MalformedEntry { line: String, reason: String },
}

impl EntryError {
    fn malformed(line: &str, reason: impl Into<String>) -> Self {
        Self::MalformedEntry {
            line: line.to_owned(),
            reason: reason.into(),
        }
    }
}

/// One installer manifest line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub file_path: RelPath,
    pub mode: Mode,
    #[serde(rename = "type")]
    pub file_type: FileType,
    /// Install subdirectory below the category's output root.
    pub path: RelPath,
    pub ln_target: Option<RelPath>,
    pub architecture: Option<Architecture>,
    pub tls_class: Option<TlsClass>,
    pub glvnd_variant: Option<GlvndVariant>,
    pub module: Option<String>,
}

/// Which end of the token buffer the next pop reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Front,
    Back,
}

/// Token buffer consumed from either end through a pair of cursors.
///
/// `front..back` is the unconsumed window.
#[derive(Debug)]
pub struct TokenCursor<'a> {
    tokens: Vec<&'a str>,
    front: usize,
    back: usize,
    direction: Direction,
}

impl<'a> TokenCursor<'a> {
    pub fn new(line: &'a str) -> Self {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let back = tokens.len();
        Self {
            tokens,
            front: 0,
            back,
            direction: Direction::Front,
        }
    }

    pub fn len(&self) -> usize {
        self.back - self.front
    }

    pub fn is_empty(&self) -> bool {
        self.front == self.back
    }

    /// Switch between front and back consumption.
    pub fn flip(&mut self) {
        self.direction = match self.direction {
            Direction::Front => Direction::Back,
            Direction::Back => Direction::Front,
        };
    }

    pub fn peek(&self) -> Option<&'a str> {
        if self.is_empty() {
            return None;
        }
        match self.direction {
            Direction::Front => Some(self.tokens[self.front]),
            Direction::Back => Some(self.tokens[self.back - 1]),
        }
    }

    pub fn pop(&mut self) -> Option<&'a str> {
        let token = self.peek()?;
        match self.direction {
            Direction::Front => self.front += 1,
            Direction::Back => self.back -= 1,
        }
        Some(token)
    }

    /// Pop the next token only if `test` accepts it.
    pub fn pop_if<R>(&mut self, test: impl FnOnce(&'a str) -> Option<R>) -> Option<R> {
        let result = test(self.peek()?)?;
        self.pop();
        Some(result)
    }

    /// Tokens not yet consumed, in line order.
    pub fn remaining(&self) -> &[&'a str] {
        &self.tokens[self.front..self.back]
    }
}

/// Value of a `TAG:value` token; exactly one colon is allowed.
fn tag_value<'a>(tag: &str, token: &'a str) -> Option<&'a str> {
    let (name, value) = token.split_once(':')?;
    if name == tag && !value.contains(':') {
        Some(value)
    } else {
        None
    }
}

impl ManifestEntry {
    pub fn parse(line: &str) -> Result<Self, EntryError> {
        let mut q = TokenCursor::new(line);

        let file_path = RelPath::new(
            q.pop()
                .ok_or_else(|| EntryError::malformed(line, "missing file path"))?,
        );
        let mode = Mode::new(
            q.pop()
                .ok_or_else(|| EntryError::malformed(line, "missing mode"))?,
        );
        let file_type = FileType::new(
            q.pop()
                .ok_or_else(|| EntryError::malformed(line, "missing file type"))?,
        );

        let architecture = q.pop_if(Architecture::from_token);
        let tls_class = q.pop_if(TlsClass::from_token);

        // Tags added by later releases are always appended, so read them from the back.
        q.flip();
        let module = q.pop_if(|t| tag_value(MODULE_TAG, t).map(str::to_owned));
        let glvnd_variant = q.pop_if(GlvndVariant::from_token);

        let ln_target = if file_type.is_systemd_unit_symlink() {
            // The installer never records where these point; it only lists the
            // `.requires` directory. Linking to the parent entry matches what it
            // leaves on disk.
            Some(RelPath::new("..").join(&RelPath::new(file_path.file_name())))
        } else if mode.is_link_sentinel() {
            let target = q
                .pop()
                .ok_or_else(|| EntryError::malformed(line, "symlink without target"))?;
            Some(RelPath::new(target))
        } else {
            None
        };

        q.flip();
        let inherit_depth = q.pop_if(|t| tag_value(INHERIT_PATH_DEPTH_TAG, t));
        let path = if let Some(depth) = inherit_depth {
            let depth: usize = depth.parse().map_err(|_| {
                EntryError::malformed(line, format!("invalid {INHERIT_PATH_DEPTH_TAG} '{depth}'"))
            })?;
            file_path.parent().skip(depth)
        } else if let Some(dir) = q.pop() {
            RelPath::new(dir)
        } else {
            RelPath::current()
        };

        if !q.is_empty() {
            return Err(EntryError::malformed(
                line,
                format!("unhandled tokens {:?}", q.remaining()),
            ));
        }

        Ok(Self {
            file_path,
            mode,
            file_type,
            path,
            ln_target,
            architecture,
            tls_class,
            glvnd_variant,
            module,
        })
    }

    /// The GLVND variant, else the TLS class, as the installer's "extra" column.
    pub fn extra(&self) -> Option<&'static str> {
        self.glvnd_variant
            .map(GlvndVariant::as_str)
            .or_else(|| self.tls_class.map(TlsClass::as_str))
    }

    /// File name the entry is installed under.
    pub fn target_path(&self) -> RelPath {
        self.path.join(&RelPath::new(self.file_path.file_name()))
    }

    /// What gets copied, or for symlinks, what the link points at.
    pub fn src_path(&self) -> RelPath {
        match &self.ln_target {
            Some(target) => self.path.join(target),
            None => self.file_path.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_consumes_from_both_ends() {
        let mut q = TokenCursor::new("a b c d");
        assert_eq!(q.pop(), Some("a"));
        q.flip();
        assert_eq!(q.pop(), Some("d"));
        assert_eq!(q.pop_if(|t| (t == "x").then_some(t)), None);
        assert_eq!(q.remaining(), &["b", "c"]);
        q.flip();
        assert_eq!(q.pop(), Some("b"));
        assert_eq!(q.len(), 1);
        assert_eq!(q.pop(), Some("c"));
        assert!(q.is_empty());
        assert_eq!(q.pop(), None);
    }

    #[test]
    fn tag_value_requires_single_colon() {
        assert_eq!(tag_value("MODULE", "MODULE:vdpau"), Some("vdpau"));
        assert_eq!(tag_value("MODULE", "MODULE:a:b"), None);
        assert_eq!(tag_value("MODULE", "MODULES:a"), None);
        assert_eq!(tag_value("MODULE", "MODULE"), None);
    }

    #[test]
    fn documentation_defaults_to_current_dir() {
        let e = ManifestEntry::parse("doc/README 0644 DOCUMENTATION").unwrap();
        assert_eq!(e.file_path.to_string(), "doc/README");
        assert_eq!(e.mode, "0644");
        assert_eq!(e.file_type, "DOCUMENTATION");
        assert!(e.path.is_current());
        assert!(e.ln_target.is_none());
        assert_eq!(e.target_path().to_string(), "README");
    }

    #[test]
    fn zero_mode_pops_link_target() {
        let e = ManifestEntry::parse("lib/libfoo.so 0000 SOME_TYPE libfoo.so.1").unwrap();
        assert_eq!(e.ln_target.unwrap().to_string(), "libfoo.so.1");
        assert!(e.path.is_current());
    }

    #[test]
    fn symlink_with_directory() {
        let e = ManifestEntry::parse(
            "libGL.so.1 0000 GLX_CLIENT_SYMLINK NATIVE libGL.so.1.7.0 GLVND MODULE:opengl",
        )
        .unwrap();
        assert_eq!(e.architecture, Some(Architecture::Native));
        assert_eq!(e.module.as_deref(), Some("opengl"));
        assert_eq!(e.glvnd_variant, Some(GlvndVariant::Glvnd));
        assert_eq!(e.ln_target.unwrap().to_string(), "libGL.so.1.7.0");
        assert!(e.path.is_current());
    }

    #[test]
    fn symlink_target_is_taken_from_the_back() {
        let e = ManifestEntry::parse("libcuda.so 0000 CUDA_SYMLINK NATIVE /lib64 libcuda.so.1")
            .unwrap();
        assert_eq!(e.ln_target.unwrap().to_string(), "libcuda.so.1");
        assert_eq!(e.path.to_string(), "lib64");
    }

    #[test]
    fn systemd_unit_symlink_synthesizes_parent_target() {
        let e = ManifestEntry::parse(
            "systemd/system/systemd-hibernate.service.requires/nvidia-hibernate.service 0644 SYSTEMD_UNIT_SYMLINK",
        )
        .unwrap();
        assert_eq!(
            e.ln_target.unwrap().to_string(),
            "../nvidia-hibernate.service"
        );
    }

    #[test]
    fn systemd_unit_symlink_keeps_trailing_dir() {
        let e = ManifestEntry::parse(
            "nvidia-suspend.service 0000 SYSTEMD_UNIT_SYMLINK systemd/system/systemd-suspend.service.requires",
        )
        .unwrap();
        assert_eq!(e.ln_target.unwrap().to_string(), "../nvidia-suspend.service");
        assert_eq!(
            e.path.to_string(),
            "systemd/system/systemd-suspend.service.requires"
        );
    }

    #[test]
    fn inherit_path_depth_drops_leading_segments() {
        let e = ManifestEntry::parse(
            "kernel/nvidia-uvm/uvm_common.c 0644 UVM_MODULE_SRC INHERIT_PATH_DEPTH:1 MODULE:uvm",
        )
        .unwrap();
        assert_eq!(e.path.to_string(), "nvidia-uvm");
        assert_eq!(e.module.as_deref(), Some("uvm"));
    }

    #[test]
    fn explicit_directory_is_made_relative() {
        let e = ManifestEntry::parse("nvidia-settings.1.gz 0644 MANPAGE /share/man/man1").unwrap();
        assert_eq!(e.path.to_string(), "share/man/man1");
    }

    #[test]
    fn tls_and_arch_front_tags() {
        let e = ManifestEntry::parse("tls/libnvidia-tls.so.340 0644 TLS_LIB COMPAT32 NEW /lib/tls")
            .unwrap();
        assert_eq!(e.architecture, Some(Architecture::Compat32));
        assert_eq!(e.tls_class, Some(TlsClass::New));
        assert_eq!(e.extra(), Some("NEW"));
        assert_eq!(e.path.to_string(), "lib/tls");
    }

    #[test]
    fn leftover_tokens_are_malformed() {
        let line = "libfoo.so 0644 SOME_LIB dir1 dir2";
        let err = ManifestEntry::parse(line).unwrap_err();
        let EntryError::MalformedEntry { line: raw, reason } = err;
        assert_eq!(raw, line);
        assert!(reason.contains("dir2"), "{reason}");
    }

    #[test]
    fn missing_mandatory_tokens_are_malformed() {
        assert!(ManifestEntry::parse("libfoo.so 0644").is_err());
        assert!(ManifestEntry::parse("").is_err());
    }

    #[test]
    fn sentinel_mode_without_target_is_malformed() {
        assert!(ManifestEntry::parse("libfoo.so 0000 SOME_SYMLINK").is_err());
    }

    #[test]
    fn non_numeric_inherit_depth_is_malformed() {
        assert!(
            ManifestEntry::parse("kernel/a.c 0644 KERNEL_MODULE_SRC INHERIT_PATH_DEPTH:x").is_err()
        );
    }

    #[test]
    fn src_path_follows_link_target() {
        let e = ManifestEntry::parse("libGL.so 0000 GLX_SYMLINK GL libGL.so.1").unwrap();
        assert_eq!(e.src_path().to_string(), "GL/libGL.so.1");
        assert_eq!(e.target_path().to_string(), "GL/libGL.so");

        let f = ManifestEntry::parse("bin/nvidia-smi 0755 UTILITY_BINARY").unwrap();
        assert_eq!(f.src_path().to_string(), "bin/nvidia-smi");
    }

    #[test]
    fn serializes_type_field_name() {
        let e = ManifestEntry::parse("doc/README 0644 DOCUMENTATION").unwrap();
        let json = serde_json::to_value(&e).unwrap();
        assert_eq!(json["type"], "DOCUMENTATION");
        assert_eq!(json["path"], ".");
        assert!(json["ln_target"].is_null());
    }
}
