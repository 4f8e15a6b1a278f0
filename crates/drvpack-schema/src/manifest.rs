use crate::entry::{EntryError, ManifestEntry};
use crate::header::{HeaderError, ManifestHeader};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("manifest not found: {}", .0.display())]
    InputNotFound(PathBuf),
    #[error("failed to read manifest file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse manifest header: {0}")]
    Header(#[from] HeaderError),
    #[error("failed to parse manifest: {0}")]
    Entry(#[from] EntryError),
}

/// A normalized entry together with the manifest line it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedLine {
    pub raw_entry: String,
    pub entry: ManifestEntry,
}

impl ParsedLine {
    /// Parse and normalize one entry line.
    pub fn parse(raw: &str, header: &ManifestHeader) -> Result<Self, EntryError> {
        let raw_entry = raw.trim_end().to_owned();
        let mut entry = ManifestEntry::parse(&raw_entry)?;
        entry.normalize(&header.kernel_module_build_dir);
        Ok(Self { raw_entry, entry })
    }
}

/// A fully parsed installer manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub header: ManifestHeader,
    pub entries: Vec<ParsedLine>,
}

/// Parse a complete manifest.
///
/// Any malformed entry fails the whole manifest: a plan missing one file is
/// worse than no plan.
pub fn parse_manifest_str(input: &str) -> Result<Manifest, ManifestError> {
    let mut lines = input.lines();
    let header = ManifestHeader::parse(&mut lines)?;
    debug!(
        "manifest header: {} (build dir {})",
        header.version, header.kernel_module_build_dir
    );

    let entries = lines
        .filter(|line| !line.trim().is_empty())
        .map(|line| ParsedLine::parse(line, &header))
        .collect::<Result<Vec<_>, _>>()?;

    debug!("parsed {} manifest entries", entries.len());
    Ok(Manifest { header, entries })
}

pub fn parse_manifest_file(path: impl AsRef<Path>) -> Result<Manifest, ManifestError> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(ManifestError::InputNotFound(path.to_path_buf()));
    }
    let content = fs::read_to_string(path)?;
    parse_manifest_str(&content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Architecture;

    const MANIFEST: &str = "NVIDIA Accelerated Graphics Driver for Linux-x86_64 470.239.06
470.239.06
kernel/nv-kernel.o_binary
nvidia nvidia-uvm nvidia-modeset nvidia-drm
nvidia-frontend
nvidia-frontend.ko
kernel
kernel/precompiled
LICENSE 0644 DOCUMENTATION
README.txt 0644 DOCUMENTATION
libGL.so.1.7.0 0755 GLVND_LIB NATIVE
libGL.so.1 0000 GLVND_SYMLINK NATIVE libGL.so.1.7.0
32/libGL.so.1.7.0 0755 GLVND_LIB COMPAT32

kernel/nvidia/nv.c 0644 KERNEL_MODULE_SRC INHERIT_PATH_DEPTH:1 MODULE:nvidia
";

    #[test]
    fn parses_full_manifest() {
        let manifest = parse_manifest_str(MANIFEST).unwrap();
        assert_eq!(manifest.header.version, "470.239.06");
        assert_eq!(manifest.entries.len(), 6, "blank lines are skipped");
        assert_eq!(manifest.entries[0].raw_entry, "LICENSE 0644 DOCUMENTATION");
        assert_eq!(
            manifest.entries[4].entry.architecture,
            Some(Architecture::Compat32)
        );
        assert_eq!(manifest.entries[5].entry.path.to_string(), "nvidia");
    }

    #[test]
    fn malformed_entry_fails_whole_manifest() {
        let input = format!("{MANIFEST}libbroken.so 0644 LIB a b\n");
        let err = parse_manifest_str(&input).unwrap_err();
        assert!(matches!(err, ManifestError::Entry(_)));
        assert!(err.to_string().contains("libbroken.so"));
    }

    #[test]
    fn short_header_fails_before_entries() {
        let err = parse_manifest_str("desc\n1.0\n").unwrap_err();
        assert!(matches!(
            err,
            ManifestError::Header(HeaderError::UnexpectedEndOfInput { .. })
        ));
    }

    #[test]
    fn raw_entry_is_right_trimmed() {
        let input = MANIFEST.replace("LICENSE 0644 DOCUMENTATION", "LICENSE 0644 DOCUMENTATION  \t");
        let manifest = parse_manifest_str(&input).unwrap();
        assert_eq!(manifest.entries[0].raw_entry, "LICENSE 0644 DOCUMENTATION");
    }

    #[test]
    fn missing_file_is_input_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = parse_manifest_file(dir.path().join(".manifest")).unwrap_err();
        assert!(matches!(err, ManifestError::InputNotFound(_)));
    }

    #[test]
    fn reads_manifest_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".manifest");
        std::fs::write(&path, MANIFEST).unwrap();
        let manifest = parse_manifest_file(&path).unwrap();
        assert_eq!(manifest.entries.len(), 6);
    }

    #[test]
    fn parsed_lines_serialize_like_entry_dump() {
        let manifest = parse_manifest_str(MANIFEST).unwrap();
        let json = serde_json::to_value(&manifest.entries[2]).unwrap();
        assert_eq!(json["raw_entry"], "libGL.so.1.7.0 0755 GLVND_LIB NATIVE");
        assert_eq!(json["entry"]["architecture"], "NATIVE");
    }
}
