use drvpack_rules::Classification;
use drvpack_schema::{join_display, Architecture, CategoryName, ManifestEntry, ParsedLine, RelPath};
use serde::Serialize;
use std::cell::OnceCell;
use std::collections::BTreeMap;

/// Override key selecting the shell variable that holds the output root.
pub const OVERRIDE_PREFIX: &str = "prefix";
/// Override key selecting the directory below the output root.
pub const OVERRIDE_DIR: &str = "dir";
/// Override key replacing the install directory as the base of link sources.
pub const OVERRIDE_LN: &str = "ln_override";

/// Fallbacks for the `prefix` and `dir` overrides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacementDefaults {
    pub prefix: String,
    pub dir: String,
}

impl Default for PlacementDefaults {
    fn default() -> Self {
        Self {
            prefix: "!outputLib".to_owned(),
            dir: "/lib".to_owned(),
        }
    }
}

/// Where an entry comes from and where it lands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub target_path: RelPath,
    pub src_path: RelPath,
    pub install_directory: String,
    pub install_path: String,
    pub link_path: String,
}

/// A classified manifest entry.
#[derive(Debug, Clone, Serialize)]
pub struct InstallableEntry {
    pub raw_entry: String,
    pub entry: ManifestEntry,
    pub categories: Vec<CategoryName>,
    pub overrides: BTreeMap<String, String>,
    #[serde(skip)]
    defaults: PlacementDefaults,
    #[serde(skip)]
    placement: OnceCell<Placement>,
}

impl InstallableEntry {
    pub fn new(line: ParsedLine, classification: Classification, defaults: PlacementDefaults) -> Self {
        Self {
            raw_entry: line.raw_entry,
            entry: line.entry,
            categories: classification.categories,
            overrides: classification.overrides,
            defaults,
            placement: OnceCell::new(),
        }
    }

    /// Exactly one category matched.
    pub fn is_installable(&self) -> bool {
        self.categories.len() == 1
    }

    /// The single category of an installable entry.
    pub fn category(&self) -> Option<&CategoryName> {
        match self.categories.as_slice() {
            [only] => Some(only),
            _ => None,
        }
    }

    pub fn is_compat32(&self) -> bool {
        self.entry.architecture == Some(Architecture::Compat32)
    }

    pub fn placement(&self) -> &Placement {
        self.placement.get_or_init(|| self.compute_placement())
    }

    pub fn install_directory(&self) -> &str {
        &self.placement().install_directory
    }

    pub fn install_path(&self) -> &str {
        &self.placement().install_path
    }

    pub fn link_path(&self) -> &str {
        &self.placement().link_path
    }

    /// Parent directory of the install path.
    pub fn install_parent(&self) -> String {
        let placement = self.placement();
        join_display(&placement.install_directory, &placement.target_path.parent())
    }

    /// Install path split into segments, for segment-wise ordering.
    pub fn install_path_segments(&self) -> impl Iterator<Item = &str> {
        self.install_path().split('/').filter(|s| !s.is_empty())
    }

    fn override_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.overrides.get(key).map_or(default, String::as_str)
    }

    fn compute_placement(&self) -> Placement {
        let prefix = self.override_or(OVERRIDE_PREFIX, &self.defaults.prefix);
        let dir = RelPath::new(self.override_or(OVERRIDE_DIR, &self.defaults.dir));
        let install_directory = join_display(&format!("${{{prefix}}}"), &dir);

        let target_path = self.entry.target_path();
        let src_path = self.entry.src_path();
        let install_path = join_display(&install_directory, &target_path);
        let link_base = self.override_or(OVERRIDE_LN, &install_directory);
        let link_path = join_display(link_base, &src_path);

        Placement {
            target_path,
            src_path,
            install_directory,
            install_path,
            link_path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(raw: &str, categories: &[&str], overrides: &[(&str, &str)]) -> InstallableEntry {
        let line = ParsedLine {
            raw_entry: raw.to_owned(),
            entry: ManifestEntry::parse(raw).unwrap(),
        };
        let classification = Classification {
            categories: categories.iter().map(|c| CategoryName::from(*c)).collect(),
            overrides: overrides
                .iter()
                .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
                .collect(),
        };
        InstallableEntry::new(line, classification, PlacementDefaults::default())
    }

    #[test]
    fn default_placement() {
        let e = entry("libGLX.so.0 0755 GLX_CLIENT_LIB NATIVE", &["gl"], &[]);
        assert_eq!(e.install_directory(), "${!outputLib}/lib");
        assert_eq!(e.install_path(), "${!outputLib}/lib/libGLX.so.0");
        assert_eq!(e.placement().src_path.to_string(), "libGLX.so.0");
    }

    #[test]
    fn overrides_change_install_directory() {
        let e = entry(
            "nvidia-smi 0755 UTILITY_BINARY",
            &["bin"],
            &[("prefix", "out"), ("dir", "/bin")],
        );
        assert_eq!(e.install_directory(), "${out}/bin");
        assert_eq!(e.install_path(), "${out}/bin/nvidia-smi");
    }

    #[test]
    fn readme_in_current_directory() {
        let e = entry("doc/README 0644 DOCUMENTATION", &["docs"], &[("dir", "/")]);
        assert!(e.entry.path.is_current());
        assert_eq!(e.install_directory(), "${!outputLib}");
        assert_eq!(e.install_path(), "${!outputLib}/README");
    }

    #[test]
    fn link_path_uses_ln_override() {
        let e = entry("lib/libfoo.so 0000 SOME_TYPE libfoo.so.1", &["libs"], &[]);
        assert_eq!(e.link_path(), "${!outputLib}/lib/libfoo.so.1");

        let e = entry(
            "lib/libfoo.so 0000 SOME_TYPE libfoo.so.1",
            &["libs"],
            &[("ln_override", "/usr/lib")],
        );
        assert_eq!(e.link_path(), "/usr/lib/libfoo.so.1");
    }

    #[test]
    fn installable_needs_exactly_one_category() {
        assert!(entry("a 0644 T", &["x"], &[]).is_installable());
        assert!(!entry("a 0644 T", &[], &[]).is_installable());
        let both = entry("a 0644 T", &["x", "y"], &[]);
        assert!(!both.is_installable());
        assert!(both.category().is_none());
    }

    #[test]
    fn install_parent_and_segments() {
        let e = entry("sub/libx.so 0755 T dir/sub", &["x"], &[]);
        assert_eq!(e.install_path(), "${!outputLib}/lib/dir/sub/libx.so");
        assert_eq!(e.install_parent(), "${!outputLib}/lib/dir/sub");
        let segments: Vec<&str> = e.install_path_segments().collect();
        assert_eq!(segments, vec!["${!outputLib}", "lib", "dir", "sub", "libx.so"]);
    }

    #[test]
    fn serializes_without_cached_fields() {
        let e = entry("a 0644 T", &["x"], &[]);
        let _ = e.install_path();
        let value = serde_json::to_value(&e).unwrap();
        assert_eq!(value["raw_entry"], "a 0644 T");
        assert_eq!(value["categories"][0], "x");
        assert!(value.get("placement").is_none());
    }
}
