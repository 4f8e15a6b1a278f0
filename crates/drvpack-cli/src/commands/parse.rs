use super::{json_pretty, write_output, EXIT_SUCCESS};
use drvpack_schema::parse_manifest_file;
use std::fmt::Write;
use std::path::Path;

pub fn run(manifest: &Path, entries_out: Option<&Path>, header_out: Option<&Path>) -> Result<u8, String> {
    let manifest = parse_manifest_file(manifest).map_err(|e| format!("manifest error: {e}"))?;

    let header = json_pretty(&manifest.header)?;
    let mut entries = String::new();
    for line in &manifest.entries {
        let json = serde_json::to_string(line)
            .map_err(|e| format!("JSON serialization failed: {e}"))?;
        let _ = writeln!(entries, "{json}");
    }

    match header_out {
        Some(path) => write_output(path, &format!("{header}\n"))?,
        None => println!("{header}"),
    }
    match entries_out {
        Some(path) => write_output(path, &entries)?,
        None => print!("{entries}"),
    }
    Ok(EXIT_SUCCESS)
}
