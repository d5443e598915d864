// rostermerge CLI - roster extraction and multi-source contact merging

mod exit_codes;
mod extract;
mod inspect;
mod merge;
mod sources;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use rostermerge_config::{ConfigError, Settings};
use tracing_subscriber::EnvFilter;

use exit_codes::{EXIT_ERROR, EXIT_IO, EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "rmerge")]
#[command(about = "Extract group rosters from messaging sources and merge them into one contact list")]
#[command(version, long_version = long_version())]
struct Cli {
    /// Settings file (default: $ROSTERMERGE_CONFIG, then ~/.config/rostermerge/config.toml)
    #[arg(long, global = true, value_name = "FILE")]
    settings: Option<PathBuf>,

    /// Only log warnings and errors
    #[arg(long, short = 'q', global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Log per-participant detail
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract group rosters into per-source contact files
    #[command(after_help = "\
Examples:
  rmerge extract bridge
  rmerge extract --all --parallel
  rmerge extract --snapshot venom-export.json --name venom-bot --out group_contacts_venom.csv
  rmerge extract --endpoint http://localhost:8002 --token-env BRIDGE_TOKEN --name wwjs")]
    Extract(extract::ExtractArgs),

    /// Merge per-source contact files and write a comparison report
    #[command(after_help = "\
Examples:
  rmerge merge
  rmerge merge --config merge.toml
  rmerge merge --source wwjs=group_contacts_wwjs.csv --source baileys=group_contacts_baileys.csv
  rmerge merge --config merge.toml --json --output report.json")]
    Merge(merge::MergeArgs),

    /// Show raw participant records and how each one normalizes
    #[command(after_help = "\
Examples:
  rmerge inspect bridge
  rmerge inspect bridge --group 'MLIMANI' --out group_contacts_debug.csv
  rmerge inspect bridge --json")]
    Inspect(inspect::InspectArgs),

    /// List configured sources
    Sources {
        /// Output JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Validate a merge config without running it
    #[command(after_help = "\
Examples:
  rmerge validate merge.toml")]
    Validate {
        /// Path to the merge .toml file
        config: PathBuf,
    },
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("GIT_COMMIT_HASH"), ")",
        "\ntarget:  ", env!("TARGET"),
    )
}

fn init_logging(quiet: bool, verbose: bool) {
    let default = if quiet {
        "warn"
    } else if verbose {
        "debug"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_settings(path: Option<&std::path::Path>) -> Result<Settings, CliError> {
    let (settings, from) = Settings::load(path).map_err(CliError::config)?;
    match from {
        Some(path) => tracing::debug!("settings loaded from {}", path.display()),
        None => tracing::debug!("no settings file, using defaults"),
    }
    Ok(settings)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.quiet, cli.verbose);

    let settings_path = cli.settings.as_deref();
    let result = match cli.command {
        Commands::Extract(args) => {
            load_settings(settings_path).and_then(|s| extract::cmd_extract(&s, args))
        }
        Commands::Merge(args) => merge::cmd_merge(args),
        Commands::Inspect(args) => {
            load_settings(settings_path).and_then(|s| inspect::cmd_inspect(&s, args))
        }
        Commands::Sources { json } => load_settings(settings_path).and_then(|s| cmd_sources(&s, json)),
        Commands::Validate { config } => merge::cmd_validate(config),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn args(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: EXIT_IO, message: msg.into(), hint: None }
    }

    /// Settings that cannot be read are IO errors; settings that do not
    /// parse or validate are usage errors.
    pub fn config(err: ConfigError) -> Self {
        match err {
            ConfigError::Read { .. } => Self::io(err.to_string()),
            ConfigError::Parse { .. } | ConfigError::Invalid(_) => Self::args(err.to_string())
                .with_hint(format!("check {}", Settings::config_path().display())),
        }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

// ============================================================================
// sources
// ============================================================================

fn cmd_sources(settings: &Settings, json: bool) -> Result<(), CliError> {
    if json {
        let out = serde_json::to_string_pretty(&settings.sources).map_err(|e| CliError {
            code: EXIT_ERROR,
            message: format!("JSON serialization error: {e}"),
            hint: None,
        })?;
        println!("{out}");
        return Ok(());
    }

    if settings.sources.is_empty() {
        eprintln!("no sources configured");
        eprintln!("hint:  add [[sources]] to {}", Settings::config_path().display());
        return Ok(());
    }

    println!("{:<24} {:<9} {:<40} OUTPUT", "NAME", "KIND", "LOCATION");
    for source in &settings.sources {
        let location = match (&source.endpoint, &source.file) {
            (Some(endpoint), _) => endpoint.clone(),
            (None, Some(file)) => file.display().to_string(),
            (None, None) => "-".to_string(),
        };
        println!(
            "{:<24} {:<9} {:<40} {}",
            source.name,
            source.kind.to_string(),
            location,
            source.output_path().display()
        );
    }
    Ok(())
}
