mod commands;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use commands::{EXIT_FAILURE, EXIT_MANIFEST_ERROR, EXIT_RULE_ERROR};
use drvpack_core::{DrvpackConfig, CONFIG_FILE_NAME};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "drvpack",
    version,
    about = "Turn legacy driver installer manifests into deterministic install scripts"
)]
struct Cli {
    /// Config file. Defaults to drvpack.toml in the working directory, if present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output results as structured JSON.
    #[arg(long, default_value_t = false, global = true)]
    json: bool,

    /// Enable verbose (debug) logging output.
    #[arg(short, long, default_value_t = false, global = true)]
    verbose: bool,

    /// Enable trace-level logging (more detailed than --verbose).
    #[arg(long, default_value_t = false, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Rule document locations, overriding the config file.
#[derive(Debug, Args)]
struct RuleArgs {
    /// Category rule document (JSON).
    #[arg(long)]
    matchers: Option<PathBuf>,
    /// Override rule document (JSON).
    #[arg(long)]
    locations: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Classify a manifest and write per-category install scripts.
    Convert {
        /// Path to the installer manifest.
        manifest: PathBuf,
        #[command(flatten)]
        rules: RuleArgs,
        /// Output directory for the generated scripts.
        #[arg(long)]
        outpath: Option<PathBuf>,
        /// Shell variable used as install prefix when no override applies.
        #[arg(long)]
        prefix: Option<String>,
        /// Install directory used when no override applies.
        #[arg(long)]
        dir: Option<String>,
    },
    /// Parse a manifest and print its header and normalized entries.
    Parse {
        /// Path to the installer manifest.
        manifest: PathBuf,
        /// Write entries (one JSON object per line) to this file instead of stdout.
        #[arg(long)]
        entries: Option<PathBuf>,
        /// Write the header (JSON) to this file instead of stdout.
        #[arg(long)]
        header: Option<PathBuf>,
    },
    /// Compile rule documents and list the resulting categories.
    CheckRules {
        #[command(flatten)]
        rules: RuleArgs,
    },
    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
    /// Generate man pages.
    ManPages {
        /// Output directory for man pages.
        #[arg(default_value = "man")]
        dir: PathBuf,
    },
}

fn main() -> ExitCode {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let msg = info.to_string();
        if msg.contains("Broken pipe")
            || msg.contains("broken pipe")
            || msg.contains("os error 32")
            || msg.contains("failed printing to stdout")
        {
            std::process::exit(0);
        }
        default_hook(info);
    }));

    let cli = Cli::parse();

    let default_level = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("DRVPACK_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let json_output = cli.json;
    let result = match cli.command {
        Commands::Convert {
            manifest,
            rules,
            outpath,
            prefix,
            dir,
        } => load_config(cli.config.as_deref()).and_then(|mut config| {
            apply_rule_args(&mut config, rules);
            if outpath.is_some() {
                config.output.root = outpath;
            }
            if let Some(prefix) = prefix {
                config.output.prefix = prefix;
            }
            if let Some(dir) = dir {
                config.output.dir = dir;
            }
            commands::convert::run(&config, &manifest, json_output)
        }),
        Commands::Parse {
            manifest,
            entries,
            header,
        } => commands::parse::run(&manifest, entries.as_deref(), header.as_deref()),
        Commands::CheckRules { rules } => {
            load_config(cli.config.as_deref()).and_then(|mut config| {
                apply_rule_args(&mut config, rules);
                commands::check_rules::run(&config, json_output)
            })
        }
        Commands::Completions { shell } => commands::completions::run::<Cli>(shell),
        Commands::ManPages { dir } => commands::man_pages::run::<Cli>(&dir),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(msg) => {
            eprintln!("error: {msg}");
            let code = if msg.starts_with("manifest error:")
                || msg.starts_with("failed to parse manifest")
                || msg.starts_with("manifest not found")
            {
                EXIT_MANIFEST_ERROR
            } else if msg.starts_with("rule error:") {
                EXIT_RULE_ERROR
            } else {
                EXIT_FAILURE
            };
            ExitCode::from(code)
        }
    }
}

/// An explicit `--config` must exist; the implicit one is optional.
fn load_config(explicit: Option<&Path>) -> Result<DrvpackConfig, String> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let implicit = PathBuf::from(CONFIG_FILE_NAME);
            if !implicit.is_file() {
                return Ok(DrvpackConfig::default());
            }
            implicit
        }
    };
    DrvpackConfig::load(&path).map_err(|e| format!("config error: {}: {e}", path.display()))
}

fn apply_rule_args(config: &mut DrvpackConfig, rules: RuleArgs) {
    if rules.matchers.is_some() {
        config.rules.categories = rules.matchers;
    }
    if rules.locations.is_some() {
        config.rules.overrides = rules.locations;
    }
}
