//! `rmerge inspect` - dump raw participant records and how each normalizes.
//!
//! Used to diagnose new record shapes: for every participant it shows the
//! strategy that matched (if any), the resulting phone or failure kind, and
//! the record's field names.

use std::path::{Path, PathBuf};

use clap::Args;
use rostermerge_config::Settings;
use rostermerge_core::normalize::shape_of;
use rostermerge_core::{AdapterError, PhoneNormalizer, RawParticipant, SourceAdapter, ThreadSleeper};
use serde::Serialize;

use crate::exit_codes::{EXIT_EXTRACT_CONNECT, EXIT_EXTRACT_PERMANENT};
use crate::sources::build_source;
use crate::CliError;

/// Placeholder phone in the debug CSV for records that did not normalize.
const NO_PHONE: &str = "NO_PHONE_FOUND";

#[derive(Args)]
pub struct InspectArgs {
    /// Configured source name
    pub source: String,

    /// Only groups whose name contains this text
    #[arg(long)]
    pub group: Option<String>,

    /// Output JSON to stdout instead of a table
    #[arg(long)]
    pub json: bool,

    /// Write a debug CSV (group, phone, member_data)
    #[arg(long)]
    pub out: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct InspectRow {
    group: String,
    index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    failure: Option<String>,
    shape: Vec<String>,
    raw: RawParticipant,
}

fn inspect_participant(
    normalizer: &PhoneNormalizer,
    group: &str,
    index: usize,
    raw: RawParticipant,
) -> InspectRow {
    let method = normalizer.probe(&raw).map(|(strategy, _)| strategy.to_string());
    let (phone, failure) = match normalizer.normalize(&raw) {
        Ok(n) => (Some(n.phone), None),
        Err(f) => (None, Some(f.to_string())),
    };
    InspectRow {
        group: group.to_string(),
        index,
        method,
        phone,
        failure,
        shape: shape_of(&raw),
        raw,
    }
}

fn adapter_err(err: AdapterError) -> CliError {
    let code = match err {
        AdapterError::Permanent(_) => EXIT_EXTRACT_PERMANENT,
        _ => EXIT_EXTRACT_CONNECT,
    };
    CliError { code, message: format!("cannot list groups: {err}"), hint: None }
}

fn collect_rows<A: SourceAdapter + ?Sized>(
    source: &A,
    settings: &Settings,
    pattern: Option<&str>,
) -> Result<Vec<InspectRow>, CliError> {
    let options = settings.extract_options();
    let groups = options
        .group_retry
        .run(&ThreadSleeper, "list groups", || source.list_groups())
        .map_err(adapter_err)?;

    let selected: Vec<_> = groups
        .iter()
        .filter(|g| pattern.map_or(true, |p| g.display_name.contains(p)))
        .collect();
    if selected.is_empty() {
        return Err(match pattern {
            Some(p) => CliError::args(format!("no group name contains '{p}'")),
            None => CliError::args(format!("{} has no groups", source.name())),
        });
    }

    let mut rows = Vec::new();
    for group in selected {
        if !group.has_usable_id() {
            tracing::warn!(group = %group.display_name, "group has no usable id");
            continue;
        }
        let participants = match options.participant_retry.run(
            &ThreadSleeper,
            "list participants",
            || source.list_participants(&group.id),
        ) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(group = %group.display_name, "cannot list participants: {e}");
                continue;
            }
        };
        for (i, raw) in participants.into_iter().enumerate() {
            rows.push(inspect_participant(&options.normalizer, &group.display_name, i + 1, raw));
        }
    }
    Ok(rows)
}

fn write_debug_csv(path: &Path, rows: &[InspectRow]) -> Result<(), CliError> {
    let io_err = |e: &dyn std::fmt::Display| CliError::io(format!("cannot write {}: {e}", path.display()));

    let mut writer = csv::Writer::from_path(path).map_err(|e| io_err(&e))?;
    writer
        .write_record(["group", "phone", "member_data"])
        .map_err(|e| io_err(&e))?;
    for row in rows {
        let phone = row.phone.as_deref().unwrap_or(NO_PHONE);
        let member_data = row.raw.to_string();
        writer
            .write_record([row.group.as_str(), phone, member_data.as_str()])
            .map_err(|e| io_err(&e))?;
    }
    writer.flush().map_err(|e| io_err(&e))
}

fn print_table(rows: &[InspectRow]) {
    let mut current: Option<&str> = None;
    for row in rows {
        if current != Some(row.group.as_str()) {
            println!("{}", row.group);
            current = Some(row.group.as_str());
        }
        let method = row.method.as_deref().unwrap_or("-");
        let result = match (&row.phone, &row.failure) {
            (Some(phone), _) => phone.clone(),
            (None, Some(failure)) => failure.clone(),
            (None, None) => String::new(),
        };
        println!(
            "  #{:<4} {:<14} {:<40} fields: {}",
            row.index,
            method,
            result,
            row.shape.join(", ")
        );
    }
}

pub fn cmd_inspect(settings: &Settings, args: InspectArgs) -> Result<(), CliError> {
    let source_settings = settings.source(&args.source).ok_or_else(|| {
        CliError::args(format!("unknown source '{}'", args.source))
            .with_hint("run `rmerge sources` to list configured sources")
    })?;
    let source = build_source(source_settings)?;

    let rows = collect_rows(&source, settings, args.group.as_deref())?;

    if let Some(path) = &args.out {
        write_debug_csv(path, &rows)?;
        eprintln!("wrote {}", path.display());
    }

    if args.json {
        let json = serde_json::to_string_pretty(&rows)
            .map_err(|e| CliError::io(format!("JSON serialization error: {e}")))?;
        println!("{json}");
    } else {
        print_table(&rows);
    }

    let usable = rows.iter().filter(|r| r.phone.is_some()).count();
    eprintln!("{} participant(s), {} with a usable phone", rows.len(), usable);
    Ok(())
}
