use crate::path::RelPath;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Object-file suffix that marks the legacy five-line kernel preamble.
const LEGACY_OBJECT_SUFFIX: &str = ".o";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum HeaderError {
    #[error("unexpected end of input while reading manifest header field '{field}'")]
    UnexpectedEndOfInput { field: &'static str },
    #[error("manifest header field '{field}' is empty")]
    EmptyField { field: &'static str },
}

/// Fixed-position preamble of an installer manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestHeader {
    pub description: String,
    pub version: String,
    /// Only present in old manifests, which list the prebuilt module object.
    pub kernel_module_file: Option<RelPath>,
    pub kernel_interface_file: Option<RelPath>,
    pub kernel_module_names: Vec<String>,
    /// Modules to unload before a new kernel module is installed.
    pub module_names_to_uninstall: Vec<String>,
    pub module_files_to_uninstall: Vec<RelPath>,
    pub kernel_module_build_dir: RelPath,
    pub precompiled_kernel_dir: RelPath,
}

impl ManifestHeader {
    /// Read the header from the front of a line stream.
    ///
    /// Lines are right-trimmed before use. The stream is left positioned at
    /// the first entry line.
    pub fn parse<'a, I>(lines: &mut I) -> Result<Self, HeaderError>
    where
        I: Iterator<Item = &'a str>,
    {
        let mut next = |field: &'static str| {
            lines
                .next()
                .map(str::trim_end)
                .ok_or(HeaderError::UnexpectedEndOfInput { field })
        };

        let description = next("description")?.to_owned();
        let version = next("version")?.to_owned();

        let mut kernel_module_file = None;
        let mut kernel_interface_file = first_path(next("kernel interface file")?);

        // Newer manifests dropped the module object line; its suffix tells them apart.
        let mut line = next("kernel module names")?;
        if line.ends_with(LEGACY_OBJECT_SUFFIX) {
            kernel_module_file = kernel_interface_file.take();
            kernel_interface_file = first_path(line);
            line = next("kernel module names")?;
        }
        let kernel_module_names = split_words(line);

        let module_names_to_uninstall = split_words(next("module names to uninstall")?);
        let module_files_to_uninstall = next("module files to uninstall")?
            .split_whitespace()
            .map(RelPath::new)
            .collect();

        let field = "kernel module build directory";
        let kernel_module_build_dir =
            first_path(next(field)?).ok_or(HeaderError::EmptyField { field })?;
        let field = "precompiled kernel directory";
        let precompiled_kernel_dir =
            first_path(next(field)?).ok_or(HeaderError::EmptyField { field })?;

        Ok(Self {
            description,
            version,
            kernel_module_file,
            kernel_interface_file,
            kernel_module_names,
            module_names_to_uninstall,
            module_files_to_uninstall,
            kernel_module_build_dir,
            precompiled_kernel_dir,
        })
    }
}

fn first_path(line: &str) -> Option<RelPath> {
    line.split_whitespace().next().map(RelPath::new)
}

fn split_words(line: &str) -> Vec<String> {
    line.split_whitespace().map(str::to_owned).collect()
}
