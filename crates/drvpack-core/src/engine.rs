use crate::config::{ConfigError, DrvpackConfig, OutputSection};
use crate::installable::{InstallableEntry, PlacementDefaults};
use crate::layout::OutputLayout;
use crate::partition::partition;
use crate::script::{Compat32Redirect, GeneratedFile, ScriptGenerator};
use crate::CoreError;
use drvpack_rules::Classifier;
use drvpack_schema::{parse_manifest_file, Manifest, ParsedLine};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Everything a run would write, computed without touching the disk.
#[derive(Debug)]
pub struct Plan {
    pub files: Vec<GeneratedFile>,
    pub entries: usize,
    pub installable: usize,
    pub mismatched: Vec<InstallableEntry>,
    pub categories: usize,
}

/// Summary of a completed conversion.
#[derive(Debug, Clone, Serialize)]
pub struct ConvertReport {
    pub output_root: PathBuf,
    pub entries: usize,
    pub installable: usize,
    pub mismatched: usize,
    pub categories: usize,
    pub files_written: usize,
    /// blake3 over every written file, in path order.
    pub digest: String,
}

/// Turns parsed manifests into install plans.
pub struct Engine {
    classifier: Classifier,
    layout: OutputLayout,
    defaults: PlacementDefaults,
    compat32: Compat32Redirect,
}

impl Engine {
    pub fn new(classifier: Classifier, output_root: impl Into<PathBuf>, output: &OutputSection) -> Self {
        Self {
            classifier,
            layout: OutputLayout::new(output_root),
            defaults: PlacementDefaults {
                prefix: output.prefix.clone(),
                dir: output.dir.clone(),
            },
            compat32: Compat32Redirect {
                variable: output.compat32_variable.clone(),
                value: output.compat32_value.clone(),
            },
        }
    }

    /// Load the rule documents named by the config. The output root must be set.
    pub fn from_config(config: &DrvpackConfig) -> Result<Self, CoreError> {
        let root = config
            .output
            .root
            .clone()
            .ok_or(ConfigError::MissingField("output.root"))?;
        let classifier = Classifier::load(
            config.rules.categories.as_deref(),
            config.rules.overrides.as_deref(),
        )?;
        Ok(Self::new(classifier, root, &config.output))
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub fn layout(&self) -> &OutputLayout {
        &self.layout
    }

    /// Attach categories and overrides to every entry.
    pub fn classify(&self, lines: Vec<ParsedLine>) -> Vec<InstallableEntry> {
        lines
            .into_iter()
            .map(|line| {
                let classification = self.classifier.classify(&line);
                InstallableEntry::new(line, classification, self.defaults.clone())
            })
            .collect()
    }

    pub fn plan(&self, manifest: Manifest) -> Result<Plan, CoreError> {
        let entries = manifest.entries.len();
        let split = partition(self.classify(manifest.entries));
        debug!(
            "{} installable, {} mismatched",
            split.installable.len(),
            split.mismatched.len()
        );

        let mut generator = ScriptGenerator::new(self.layout.clone(), self.compat32.clone());
        let mut categories = 0;
        for (category, dependencies) in self.classifier.dependencies() {
            generator.add_dependencies(category, dependencies);
            categories += 1;
        }
        generator.consume_entries(&split.installable);
        let mut files = generator.finish();

        if !split.mismatched.is_empty() {
            warn!("{} manifest entries mismatched", split.mismatched.len());
            let mut report = serde_json::to_string_pretty(&split.mismatched)?;
            report.push('\n');
            files.push(GeneratedFile {
                path: self.layout.mismatch_report(),
                content: report,
            });
        }
        files.sort_by(|a, b| a.path.cmp(&b.path));

        Ok(Plan {
            files,
            entries,
            installable: split.installable.len(),
            mismatched: split.mismatched,
            categories,
        })
    }

    /// Replace the output tree with the plan's files.
    pub fn write(&self, plan: &Plan) -> Result<ConvertReport, CoreError> {
        self.layout.reset()?;
        for file in &plan.files {
            debug!("writing {}", file.path.display());
            self.layout.write_atomic(&file.path, &file.content)?;
        }

        let report = ConvertReport {
            output_root: self.layout.root().to_path_buf(),
            entries: plan.entries,
            installable: plan.installable,
            mismatched: plan.mismatched.len(),
            categories: plan.categories,
            files_written: plan.files.len(),
            digest: plan.digest(&self.layout),
        };
        info!(
            "wrote {} files to {} (digest {})",
            report.files_written,
            report.output_root.display(),
            report.digest
        );
        Ok(report)
    }

    /// Parse, classify, and write in one go.
    pub fn convert(&self, manifest_path: &Path) -> Result<ConvertReport, CoreError> {
        let manifest = parse_manifest_file(manifest_path)?;
        info!(
            "read manifest '{}' version {} with {} entries",
            manifest.header.description,
            manifest.header.version,
            manifest.entries.len()
        );
        let plan = self.plan(manifest)?;
        self.write(&plan)
    }
}

impl Plan {
    /// Fingerprint of the generated tree. Paths are hashed relative to the
    /// output root.
    pub fn digest(&self, layout: &OutputLayout) -> String {
        let mut hasher = blake3::Hasher::new();
        for file in &self.files {
            hasher.update(layout.relative(&file.path).as_bytes());
            hasher.update(&[0]);
            hasher.update(file.content.as_bytes());
            hasher.update(&[0]);
        }
        hasher.finalize().to_hex().to_string()
    }
}
