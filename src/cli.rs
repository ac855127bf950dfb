//! CLI interface for stitchoptix.
//!
//! Each subcommand is non-interactive: arguments in, structured output out.
//! The JSON report is written to `--out` (if given) or stdout, and a short
//! human-readable summary is printed to stderr.

mod format;

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use serde::Serialize;

use crate::config::Config;
use crate::pipeline::{self, Settings};

use format::{format_batch, format_inspection, format_reduction};

/// stitchoptix: thin out embroidery stitches shorter than a minimum length.
#[derive(Debug, Parser)]
#[command(name = "stitchoptix", version, after_long_help = WORKFLOW_HELP)]
pub struct Cli {
    /// Log progress at info level. `RUST_LOG` takes precedence.
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

const WORKFLOW_HELP: &str = r"Workflow:
  1. stitchoptix inspect design.dst
     → stitch count, size and preview_design.png
  2. stitchoptix optimize design.dst --min-length 15
     → optimized_<timestamp>_design.dst and a .png preview
  3. stitchoptix batch ./designs --out report.json

Minimum length is in tenths of a millimeter (15 = 1.5 mm). It is taken from
--min-length, then STITCHOPTIX_MIN_LENGTH, then ~/.stitchoptix/config.toml.";

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Remove stitches shorter than the minimum length from a DST file.
    ///
    /// Colour changes, jumps, trims and other commands are always kept.
    Optimize {
        /// The DST file to optimize.
        input: PathBuf,

        /// Where to write the result.
        /// Defaults to `optimized_<timestamp>_<name>` next to the input.
        #[arg(long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        options: ReduceArgs,
    },

    /// Describe a DST file and render a preview, without changing it.
    Inspect {
        /// The DST file to inspect.
        input: PathBuf,

        /// Skip rendering `preview_<name>.png`.
        #[arg(long)]
        no_preview: bool,

        /// Write the JSON report to this file instead of stdout.
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Optimize every DST file under a directory, in parallel.
    ///
    /// Respects `.gitignore` and skips files named `optimized_*`.
    Batch {
        /// Directory to search.
        root: PathBuf,

        #[command(flatten)]
        options: ReduceArgs,
    },
}

/// Options shared by the commands that write optimized files.
#[derive(Debug, clap::Args)]
pub struct ReduceArgs {
    /// Shortest stitch to keep, in tenths of a millimeter.
    #[arg(long)]
    min_length: Option<u32>,

    /// Skip rendering PNG previews.
    #[arg(long)]
    no_preview: bool,

    /// Write the JSON report to this file instead of stdout.
    #[arg(long)]
    out: Option<PathBuf>,
}

impl ReduceArgs {
    fn settings(&self, config: &Config) -> Result<Settings, String> {
        let min_length = config.resolve_min_length(self.min_length)?;
        let preview = (config.preview && !self.no_preview).then(|| config.preview_options());
        Ok(Settings {
            min_length,
            preview,
        })
    }
}

/// Run a parsed command, returning an error message on failure.
pub fn run(cli: Cli, config: &Config) -> Result<(), String> {
    match cli.command {
        Command::Optimize {
            input,
            output,
            options,
        } => cmd_optimize(config, &input, output.as_deref(), &options),
        Command::Inspect {
            input,
            no_preview,
            out,
        } => cmd_inspect(config, &input, no_preview, out.as_deref()),
        Command::Batch { root, options } => cmd_batch(config, &root, &options),
    }
}

fn cmd_optimize(
    config: &Config,
    input: &Path,
    output: Option<&Path>,
    options: &ReduceArgs,
) -> Result<(), String> {
    let settings = options.settings(config)?;
    let report = pipeline::optimize(input, output, &settings);

    emit(&report, options.out.as_deref())?;
    eprintln!("{}", format_reduction(&report));

    if report.is_success() {
        Ok(())
    } else {
        Err(report.message)
    }
}

fn cmd_inspect(
    config: &Config,
    input: &Path,
    no_preview: bool,
    out: Option<&Path>,
) -> Result<(), String> {
    let preview = (config.preview && !no_preview).then(|| config.preview_options());
    let report = pipeline::inspect(input, preview);

    emit(&report, out)?;
    eprintln!("{}", format_inspection(&report));

    if report.is_success() {
        Ok(())
    } else {
        Err(report.message)
    }
}

fn cmd_batch(config: &Config, root: &Path, options: &ReduceArgs) -> Result<(), String> {
    let settings = options.settings(config)?;
    let reports = pipeline::batch(root, &settings).map_err(|e| e.to_string())?;

    emit(&reports, options.out.as_deref())?;
    eprintln!("{}", format_batch(&reports));

    let failed = reports.iter().filter(|r| !r.is_success()).count();
    if failed == 0 {
        Ok(())
    } else {
        Err(format!("{failed} file(s) failed"))
    }
}

/// Write `value` as pretty JSON to `out`, or to stdout when `out` is `None`.
fn emit<T: Serialize>(value: &T, out: Option<&Path>) -> Result<(), String> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| format!("failed to serialize report: {e}"))?;

    match out {
        Some(path) => {
            fs::write(path, &json)
                .map_err(|e| format!("failed to write {}: {e}", path.display()))?;
            eprintln!("Report → {}", path.display());
        }
        None => println!("{json}"),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use clap::CommandFactory;
    use tempfile::TempDir;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_optimize_with_options() {
        let cli = Cli::try_parse_from([
            "stitchoptix",
            "optimize",
            "rose.dst",
            "--min-length",
            "20",
            "--no-preview",
            "-v",
        ])
        .unwrap();

        assert!(cli.verbose);
        let Command::Optimize { input, options, .. } = cli.command else {
            panic!("expected optimize");
        };
        assert_eq!(input, PathBuf::from("rose.dst"));
        assert_eq!(options.min_length, Some(20));
        assert!(options.no_preview);
    }

    #[test]
    fn flag_disables_configured_preview() {
        let args = ReduceArgs {
            min_length: Some(10),
            no_preview: true,
            out: None,
        };
        let settings = args.settings(&Config::default()).unwrap();

        assert_eq!(settings.min_length, 10);
        assert!(settings.preview.is_none());
    }

    #[test]
    fn config_can_disable_preview() {
        let args = ReduceArgs {
            min_length: Some(10),
            no_preview: false,
            out: None,
        };
        let config = Config {
            preview: false,
            ..Config::default()
        };

        assert!(args.settings(&config).unwrap().preview.is_none());
        assert!(args.settings(&Config::default()).unwrap().preview.is_some());
    }

    #[test]
    fn emit_writes_json_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.json");

        emit(&vec![1, 2, 3], Some(&path)).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value, serde_json::json!([1, 2, 3]));
    }

    #[test]
    fn optimize_missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let args = ReduceArgs {
            min_length: Some(15),
            no_preview: true,
            out: Some(dir.path().join("report.json")),
        };

        let err = cmd_optimize(
            &Config::default(),
            &dir.path().join("gone.dst"),
            None,
            &args,
        )
        .unwrap_err();
        assert!(err.contains("was not found"));
        assert!(dir.path().join("report.json").is_file());
    }
}
