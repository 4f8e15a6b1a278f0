//! Shell script emission for installable entries.

use crate::deps::dependency_block;
use crate::installable::InstallableEntry;
use crate::layout::OutputLayout;
use drvpack_schema::CategoryName;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::debug;

/// How the primary script sources its compat32 half.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Compat32Redirect {
    pub variable: String,
    pub value: String,
}

impl Default for Compat32Redirect {
    fn default() -> Self {
        Self {
            variable: "outputLib".to_owned(),
            value: "lib32".to_owned(),
        }
    }
}

/// A rendered output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub path: PathBuf,
    pub content: String,
}

/// Accumulates script lines per output file.
#[derive(Debug)]
pub struct ScriptGenerator {
    layout: OutputLayout,
    compat32: Compat32Redirect,
    scripts: BTreeMap<PathBuf, Vec<String>>,
}

impl ScriptGenerator {
    pub fn new(layout: OutputLayout, compat32: Compat32Redirect) -> Self {
        Self {
            layout,
            compat32,
            scripts: BTreeMap::new(),
        }
    }

    pub fn layout(&self) -> &OutputLayout {
        &self.layout
    }

    fn output(&mut self, path: PathBuf) -> &mut Vec<String> {
        self.scripts.entry(path).or_default()
    }

    /// Start the category script with its prerequisites. Called for every
    /// category, so each one gets a script even without entries.
    pub fn add_dependencies(&mut self, category: &CategoryName, dependencies: &[CategoryName]) {
        let lines = dependency_block(&self.layout, dependencies);
        let path = self.layout.category_script(category);
        self.output(path).extend(lines);
    }

    /// Append install instructions. Entries without exactly one category are
    /// skipped.
    pub fn consume_entries<'a>(&mut self, entries: impl IntoIterator<Item = &'a InstallableEntry>) {
        let mut sorted: Vec<(&CategoryName, &InstallableEntry)> = entries
            .into_iter()
            .filter_map(|e| e.category().map(|c| (c, e)))
            .collect();
        // Two stable passes: install path first, then category.
        sorted.sort_by(|(_, a), (_, b)| a.install_path_segments().cmp(b.install_path_segments()));
        sorted.sort_by(|(a, _), (b, _)| a.cmp(b));

        for run in sorted.chunk_by(|(a, _), (b, _)| a == b) {
            let category = run[0].0;
            let (compat32, native): (Vec<&InstallableEntry>, Vec<&InstallableEntry>) =
                run.iter().map(|(_, e)| *e).partition(|e| e.is_compat32());
            debug!(
                "{category}: {} native, {} compat32 entries",
                native.len(),
                compat32.len()
            );

            let primary = self.layout.category_script(category);
            self.output(primary.clone()).extend(shellcode(&native));

            if !compat32.is_empty() {
                let compat_file = self.layout.compat32_script(category);
                self.output(compat_file.clone()).extend(shellcode(&compat32));
                let source = format!(
                    "{}={} source {}",
                    self.compat32.variable,
                    self.compat32.value,
                    compat_file.display()
                );
                self.output(primary).push(source);
            }
        }
    }

    /// Render every script plus the dispatcher.
    pub fn finish(self) -> Vec<GeneratedFile> {
        let mut files: Vec<GeneratedFile> = self
            .scripts
            .into_iter()
            .map(|(path, mut lines)| {
                if lines.is_empty() {
                    let category = path
                        .parent()
                        .and_then(|p| p.file_name())
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_default();
                    lines.push(format!("echo \"{category}: no files to install\""));
                }
                GeneratedFile {
                    content: render(&lines),
                    path,
                }
            })
            .collect();

        files.push(GeneratedFile {
            path: self.layout.dispatcher(),
            content: render(&[
                "# usage: $manifest/install.sh $source \"matcher-name\"".to_owned(),
                format!(
                    "cd $1 && source {}/c/$2/install.sh",
                    self.layout.root().display()
                ),
            ]),
        });
        files
    }
}

fn render(lines: &[String]) -> String {
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// Install instructions for one sub-run, one `mkdir -p` per directory.
fn shellcode(entries: &[&InstallableEntry]) -> Vec<String> {
    let mut groups: Vec<(String, Vec<&InstallableEntry>)> = Vec::new();
    for &entry in entries {
        let dir = entry.install_parent();
        match groups.iter_mut().find(|(d, _)| *d == dir) {
            Some((_, members)) => members.push(entry),
            None => groups.push((dir, vec![entry])),
        }
    }

    let mut lines = Vec::new();
    for (dir, members) in groups {
        lines.push(format!("mkdir -p {dir}"));
        for entry in members {
            lines.push(format!("# {}", entry.raw_entry));
            if entry.entry.ln_target.is_some() {
                lines.push("ln -s -r \\".to_owned());
                lines.push("  -b -S \"~collision\" \\".to_owned());
                lines.push(format!("  -T {} \\", entry.link_path()));
            } else {
                // Special bits never reach the installed tree.
                lines.push(format!(
                    "install -D -m {} \\",
                    entry.entry.mode.permission_bits()
                ));
                lines.push(format!("  -T {} \\", entry.placement().src_path));
            }
            lines.push(format!("  {}", entry.install_path()));
        }
    }
    lines
}
