//! `rmerge merge` / `rmerge validate` - reconcile per-source contact files.

use std::path::{Path, PathBuf};

use clap::Args;
use rostermerge_recon::config::SourceFile;
use rostermerge_recon::{persist, reconcile, render_text, MergeConfig, ReconError};

use crate::exit_codes::{EXIT_MERGE_INVALID_CONFIG, EXIT_MERGE_RUNTIME};
use crate::CliError;

#[derive(Args)]
pub struct MergeArgs {
    /// Merge config (.toml). Without it, --source pairs or the built-in
    /// four-source layout in the current directory are used.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Source as NAME=FILE (repeatable, in report order)
    #[arg(long = "source", value_name = "NAME=FILE", conflicts_with = "config")]
    pub sources: Vec<String>,

    /// Merged contact file to write (overrides config)
    #[arg(long)]
    pub merged: Option<PathBuf>,

    /// Text report to write (overrides config)
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Print the report as JSON to stdout instead of text
    #[arg(long)]
    pub json: bool,

    /// Also write the JSON report to this file
    #[arg(long)]
    pub output: Option<PathBuf>,
}

fn merge_err(code: u8, msg: impl Into<String>) -> CliError {
    CliError { code, message: msg.into(), hint: None }
}

fn config_err(err: ReconError) -> CliError {
    match err {
        ReconError::ConfigParse(_) | ReconError::ConfigValidation(_) => {
            merge_err(EXIT_MERGE_INVALID_CONFIG, err.to_string())
        }
        other => merge_err(EXIT_MERGE_RUNTIME, other.to_string()),
    }
}

/// Load a merge config and resolve its paths against the file's directory.
fn load_config_file(path: &Path) -> Result<MergeConfig, CliError> {
    let config_str = std::fs::read_to_string(path).map_err(|e| {
        merge_err(EXIT_MERGE_RUNTIME, format!("cannot read config {}: {e}", path.display()))
    })?;
    let config = MergeConfig::from_toml(&config_str).map_err(config_err)?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    Ok(config.resolve_paths(base_dir))
}

fn parse_source_pair(pair: &str) -> Result<SourceFile, CliError> {
    match pair.split_once('=') {
        Some((name, file)) if !name.trim().is_empty() && !file.trim().is_empty() => {
            Ok(SourceFile::new(name.trim(), file.trim()))
        }
        _ => Err(CliError::args(format!("invalid --source '{pair}'"))
            .with_hint("expected NAME=FILE, e.g. --source wwjs=group_contacts_wwjs.csv")),
    }
}

fn build_config(args: &MergeArgs) -> Result<MergeConfig, CliError> {
    let mut config = if let Some(path) = &args.config {
        load_config_file(path)?
    } else if !args.sources.is_empty() {
        let sources = args
            .sources
            .iter()
            .map(|pair| parse_source_pair(pair))
            .collect::<Result<Vec<_>, _>>()?;
        let config = MergeConfig {
            sources,
            ..MergeConfig::default()
        };
        config.validate().map_err(config_err)?;
        config
    } else {
        MergeConfig::default()
    };

    if let Some(merged) = &args.merged {
        config.output.merged = merged.clone();
    }
    if let Some(report) = &args.report {
        config.output.report = report.clone();
    }
    if let Some(output) = &args.output {
        config.output.json = Some(output.clone());
    }
    Ok(config)
}

pub fn cmd_merge(args: MergeArgs) -> Result<(), CliError> {
    let config = build_config(&args)?;

    let report = reconcile(&config).map_err(|e| merge_err(EXIT_MERGE_RUNTIME, e.to_string()))?;
    persist(&report).map_err(|e| merge_err(EXIT_MERGE_RUNTIME, e.to_string()))?;

    if args.json {
        let json_str = serde_json::to_string_pretty(&report).map_err(|e| {
            merge_err(EXIT_MERGE_RUNTIME, format!("JSON serialization error: {e}"))
        })?;
        println!("{json_str}");
    } else {
        print!("{}", render_text(&report));
    }

    eprintln!(
        "merged {} unique contact(s) from {} source(s) -> {}",
        report.merged_total,
        report.sources.len(),
        report.outputs.merged.display(),
    );
    Ok(())
}

pub fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let config = load_config_file(&config_path)?;
    eprintln!(
        "valid: merge '{}' with {} source(s)",
        config.name,
        config.sources.len(),
    );
    Ok(())
}
