use crate::CoreError;
use drvpack_schema::CategoryName;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

const CATEGORIES_DIR: &str = "c";
const SCRIPT_FILE: &str = "install.sh";
const COMPAT32_SCRIPT_FILE: &str = "install-compat32.sh";
const MISMATCH_FILE: &str = "mismatched.txt";

/// Directory layout of a generated install plan.
///
/// ```text
/// <root>/install.sh                      dispatcher
/// <root>/mismatched.txt                  entries left out of every script
/// <root>/c/<category>/install.sh
/// <root>/c/<category>/install-compat32.sh
/// ```
#[derive(Debug, Clone)]
pub struct OutputLayout {
    root: PathBuf,
}

impl OutputLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[inline]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[inline]
    pub fn categories_dir(&self) -> PathBuf {
        self.root.join(CATEGORIES_DIR)
    }

    #[inline]
    pub fn category_dir(&self, category: &CategoryName) -> PathBuf {
        self.categories_dir().join(category.as_str())
    }

    #[inline]
    pub fn category_script(&self, category: &CategoryName) -> PathBuf {
        self.category_dir(category).join(SCRIPT_FILE)
    }

    #[inline]
    pub fn compat32_script(&self, category: &CategoryName) -> PathBuf {
        self.category_dir(category).join(COMPAT32_SCRIPT_FILE)
    }

    #[inline]
    pub fn dispatcher(&self) -> PathBuf {
        self.root.join(SCRIPT_FILE)
    }

    #[inline]
    pub fn mismatch_report(&self) -> PathBuf {
        self.root.join(MISMATCH_FILE)
    }

    /// Remove everything a previous run generated. Files the plan never
    /// writes are left alone.
    pub fn reset(&self) -> Result<(), CoreError> {
        let categories = self.categories_dir();
        if categories.exists() {
            fs::remove_dir_all(&categories)?;
        }
        for file in [self.dispatcher(), self.mismatch_report()] {
            if file.exists() {
                fs::remove_file(&file)?;
            }
        }
        fs::create_dir_all(&self.root)?;
        Ok(())
    }

    /// Write a file through a temporary sibling and rename it into place.
    pub fn write_atomic(&self, path: &Path, content: &str) -> Result<(), CoreError> {
        let dir = path.parent().unwrap_or(&self.root);
        fs::create_dir_all(dir)?;
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| CoreError::Io(e.error))?;
        fsync_dir(dir)?;
        Ok(())
    }

    /// Path relative to the output root, with `/` separators.
    pub fn relative(&self, path: &Path) -> String {
        let rel = path.strip_prefix(&self.root).unwrap_or(path);
        rel.components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }
}

fn fsync_dir(dir: &Path) -> Result<(), std::io::Error> {
    let f = fs::File::open(dir)?;
    f.sync_all()
}
