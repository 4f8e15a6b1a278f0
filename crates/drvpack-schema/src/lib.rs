//! Installer manifest parsing and normalization for drvpack.
//!
//! This crate defines the schema layer: the fixed-position manifest header
//! (`ManifestHeader`), the entry grammar (`ManifestEntry::parse`) that recovers
//! fields from a dozen historical line formats, release-specific normalization
//! fixups, and the relative path type (`RelPath`) every manifest path is
//! expressed in.

pub mod entry;
pub mod header;
pub mod manifest;
pub mod normalize;
pub mod path;
pub mod types;

pub use entry::{EntryError, ManifestEntry, TokenCursor};
pub use header::{HeaderError, ManifestHeader};
pub use manifest::{parse_manifest_file, parse_manifest_str, Manifest, ManifestError, ParsedLine};
pub use path::{join_display, RelPath};
pub use types::{Architecture, CategoryName, FileType, GlvndVariant, Mode, TlsClass};
