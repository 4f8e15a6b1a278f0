use super::{colorize_count, json_pretty, spin_fail, spin_ok, spinner, EXIT_SUCCESS};
use drvpack_core::{ConfigError, CoreError, DrvpackConfig, Engine};
use std::path::Path;

pub fn run(config: &DrvpackConfig, manifest: &Path, json: bool) -> Result<u8, String> {
    let engine = Engine::from_config(config).map_err(|e| match e {
        CoreError::Config(ConfigError::MissingField("output.root")) => {
            "no output directory: pass --outpath or set output.root in the config".to_owned()
        }
        other => other.to_string(),
    })?;

    let pb = if json {
        None
    } else {
        Some(spinner("converting manifest..."))
    };
    let report = match engine.convert(manifest) {
        Ok(r) => {
            if let Some(ref pb) = pb {
                spin_ok(pb, "install scripts written");
            }
            r
        }
        Err(e) => {
            if let Some(ref pb) = pb {
                spin_fail(pb, "conversion failed");
            }
            return Err(e.to_string());
        }
    };

    if json {
        println!("{}", json_pretty(&report)?);
    } else {
        println!(
            "wrote {} files for {} categories to {}",
            report.files_written,
            report.categories,
            report.output_root.display()
        );
        println!("installable entries: {}/{}", report.installable, report.entries);
        if report.mismatched > 0 {
            println!(
                "{} manifest entries mismatched (see {})",
                colorize_count(report.mismatched),
                engine.layout().mismatch_report().display()
            );
        }
        println!("digest: {}", report.digest);
    }
    Ok(EXIT_SUCCESS)
}
