//! `rmerge extract` - run one or more sources and write their contact files.

use std::path::{Path, PathBuf};

use clap::Args;
use rostermerge_config::{Settings, SourceKind, SourceSettings};
use rostermerge_core::{extract_to_file, ExtractError, ExtractOptions, ExtractionOutcome};

use crate::exit_codes::extract_exit_code;
use crate::sources::{build_source, BoxedSource};
use crate::CliError;

#[derive(Args)]
pub struct ExtractArgs {
    /// Configured source names to run (see `rmerge sources`)
    pub sources: Vec<String>,

    /// Run every configured source
    #[arg(long, conflicts_with = "sources")]
    pub all: bool,

    /// Run sources concurrently, one thread each
    #[arg(long)]
    pub parallel: bool,

    /// Extract from an exported JSON snapshot instead of a configured source
    #[arg(long, conflicts_with_all = ["sources", "all", "endpoint"])]
    pub snapshot: Option<PathBuf>,

    /// Extract from an HTTP session bridge instead of a configured source
    #[arg(long, conflicts_with_all = ["sources", "all"])]
    pub endpoint: Option<String>,

    /// Environment variable holding the bridge's bearer token (with --endpoint)
    #[arg(long, requires = "endpoint")]
    pub token_env: Option<String>,

    /// Source name for --snapshot / --endpoint runs
    #[arg(long, default_value = "adhoc")]
    pub name: String,

    /// Contact file to write for --snapshot / --endpoint runs
    #[arg(long)]
    pub out: Option<PathBuf>,
}

impl ExtractArgs {
    fn ad_hoc_source(&self) -> Option<SourceSettings> {
        let kind = match (&self.snapshot, &self.endpoint) {
            (Some(_), _) => SourceKind::Snapshot,
            (None, Some(_)) => SourceKind::Http,
            (None, None) => return None,
        };
        Some(SourceSettings {
            name: self.name.clone(),
            kind,
            endpoint: self.endpoint.clone(),
            file: self.snapshot.clone(),
            token_env: self.token_env.clone(),
            output: self.out.clone(),
        })
    }
}

/// Pick the sources this invocation runs, in configured order for --all and
/// in argument order otherwise.
fn select_sources(settings: &Settings, args: &ExtractArgs) -> Result<Vec<SourceSettings>, CliError> {
    if let Some(source) = args.ad_hoc_source() {
        return Ok(vec![source]);
    }

    if args.all {
        if settings.sources.is_empty() {
            return Err(CliError::args("no sources configured")
                .with_hint("add [[sources]] to the settings file, or use --snapshot/--endpoint"));
        }
        return Ok(settings.sources.clone());
    }

    if args.sources.is_empty() {
        return Err(CliError::args("nothing to extract")
            .with_hint("name a source, pass --all, or use --snapshot/--endpoint"));
    }

    args.sources
        .iter()
        .map(|name| {
            settings.source(name).cloned().ok_or_else(|| {
                CliError::args(format!("unknown source '{name}'"))
                    .with_hint("run `rmerge sources` to list configured sources")
            })
        })
        .collect()
}

fn extract_err(err: ExtractError) -> CliError {
    let code = extract_exit_code(&err);
    let hint = match &err {
        ExtractError::Connect { .. } if !err.is_permanent() => {
            Some("is the source reachable and its session ready?")
        }
        ExtractError::Connect { .. } | ExtractError::Aborted { .. } => {
            Some("check the source's credentials or session")
        }
        ExtractError::Persist(_) => None,
    };
    CliError {
        code,
        message: err.to_string(),
        hint: hint.map(String::from),
    }
}

fn run_one(
    source: &BoxedSource,
    options: &ExtractOptions,
    out: &Path,
) -> Result<ExtractionOutcome, ExtractError> {
    extract_to_file(source, options, out)
}

fn print_outcome(outcome: &ExtractionOutcome, out: &Path) {
    eprintln!(
        "{}: {} contact(s) from {} group(s), {} group(s) skipped, {} participant(s) unusable -> {}",
        outcome.source,
        outcome.total_contacts,
        outcome.processed_groups,
        outcome.skipped_groups,
        outcome.participant_failures.total(),
        out.display(),
    );
}

pub fn cmd_extract(settings: &Settings, args: ExtractArgs) -> Result<(), CliError> {
    let selected = select_sources(settings, &args)?;

    // Build every adapter up front so a config mistake fails before any run.
    let mut jobs: Vec<(BoxedSource, PathBuf)> = Vec::with_capacity(selected.len());
    for source in &selected {
        jobs.push((build_source(source)?, source.output_path()));
    }

    let options = settings.extract_options();

    let results: Vec<Result<ExtractionOutcome, ExtractError>> = if args.parallel && jobs.len() > 1 {
        std::thread::scope(|scope| {
            let handles: Vec<_> = jobs
                .iter()
                .map(|(source, out)| {
                    let options = &options;
                    scope.spawn(move || run_one(source, options, out))
                })
                .collect();
            handles
                .into_iter()
                .zip(&jobs)
                .map(|(handle, (source, _))| {
                    handle.join().unwrap_or_else(|_| {
                        Err(ExtractError::Connect {
                            source_name: source.name().to_string(),
                            error: rostermerge_core::AdapterError::Transient(
                                "extraction thread panicked".into(),
                            ),
                        })
                    })
                })
                .collect()
        })
    } else {
        jobs.iter()
            .map(|(source, out)| run_one(source, &options, out))
            .collect()
    };

    let total = results.len();
    let mut first_err: Option<CliError> = None;
    let mut failed = 0;
    for (result, (_, out)) in results.into_iter().zip(&jobs) {
        match result {
            Ok(outcome) => print_outcome(&outcome, out),
            Err(err) => {
                failed += 1;
                if total > 1 {
                    tracing::error!("{err}");
                }
                if first_err.is_none() {
                    first_err = Some(extract_err(err));
                }
            }
        }
    }

    match first_err {
        None => Ok(()),
        Some(err) if total > 1 => {
            let message = format!("{failed} of {total} source(s) failed; first: {}", err.message);
            Err(CliError { message, ..err })
        }
        Some(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exit_codes::EXIT_USAGE;
    use clap::Parser;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        args: ExtractArgs,
    }

    fn parse(argv: &[&str]) -> ExtractArgs {
        let mut full = vec!["extract"];
        full.extend_from_slice(argv);
        Harness::try_parse_from(full).unwrap().args
    }

    fn configured() -> Settings {
        Settings::from_toml(
            r#"
[[sources]]
name = "one"
kind = "snapshot"
file = "one.json"

[[sources]]
name = "two"
kind = "snapshot"
file = "two.json"
"#,
        )
        .unwrap()
    }

    #[test]
    fn select_named_in_argument_order() {
        let picked = select_sources(&configured(), &parse(&["two", "one"])).unwrap();
        let names: Vec<_> = picked.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["two", "one"]);
    }

    #[test]
    fn select_all() {
        let picked = select_sources(&configured(), &parse(&["--all"])).unwrap();
        assert_eq!(picked.len(), 2);
    }

    #[test]
    fn unknown_source_is_usage_error() {
        let err = select_sources(&configured(), &parse(&["three"])).unwrap_err();
        assert_eq!(err.code, EXIT_USAGE);
        assert!(err.message.contains("unknown source 'three'"));
    }

    #[test]
    fn nothing_selected_is_usage_error() {
        let err = select_sources(&configured(), &parse(&[])).unwrap_err();
        assert_eq!(err.code, EXIT_USAGE);
        let err = select_sources(&Settings::default(), &parse(&["--all"])).unwrap_err();
        assert!(err.message.contains("no sources configured"));
    }

    #[test]
    fn ad_hoc_snapshot() {
        let picked = select_sources(
            &Settings::default(),
            &parse(&["--snapshot", "x.json", "--name", "venom-bot", "--out", "v.csv"]),
        )
        .unwrap();
        assert_eq!(picked[0].kind, SourceKind::Snapshot);
        assert_eq!(picked[0].name, "venom-bot");
        assert_eq!(picked[0].output_path(), PathBuf::from("v.csv"));
    }

    #[test]
    fn ad_hoc_conflicts_with_names() {
        assert!(Harness::try_parse_from(["extract", "one", "--snapshot", "x.json"]).is_err());
    }
}
