use std::collections::HashSet;

use rostermerge_core::contacts::read_contacts_file;
use rostermerge_core::{ContactKey, ContactRecord};

use crate::config::MergeConfig;
use crate::error::ReconError;
use crate::evidence::{best_source, coverage_pct, key_set, merged_keys, unique_counts};
use crate::model::{
    OutputPaths, ReconInput, ReconMeta, ReconciliationReport, SourceContacts, SourceSummary,
};

/// Load and reconcile every source listed in `config`. Nothing is written.
pub fn reconcile(config: &MergeConfig) -> Result<ReconciliationReport, ReconError> {
    let input = load_sources(config)?;
    run(config, &input)
}

/// Read each configured contact file. A missing file contributes nothing and
/// is logged; any other read failure stops the run.
pub fn load_sources(config: &MergeConfig) -> Result<ReconInput, ReconError> {
    let mut sources = Vec::with_capacity(config.sources.len());

    for source in &config.sources {
        let loaded = read_contacts_file(&source.file).map_err(|error| ReconError::Source {
            name: source.name.clone(),
            error,
        })?;

        match loaded {
            Some(records) => {
                tracing::info!(
                    source = %source.name,
                    file = %source.file.display(),
                    records = records.len(),
                    "loaded contacts"
                );
                sources.push(SourceContacts {
                    name: source.name.clone(),
                    file: source.file.clone(),
                    found: true,
                    records,
                });
            }
            None => {
                tracing::warn!(
                    source = %source.name,
                    file = %source.file.display(),
                    "contact file not found, contributing no contacts"
                );
                sources.push(SourceContacts::missing(&source.name, &source.file));
            }
        }
    }

    Ok(ReconInput { sources })
}

/// Reconcile pre-loaded sources. Pure apart from the run timestamp.
pub fn run(config: &MergeConfig, input: &ReconInput) -> Result<ReconciliationReport, ReconError> {
    let sets: Vec<HashSet<ContactKey>> = input.sources.iter().map(|s| key_set(&s.records)).collect();
    let unique = unique_counts(&input.sources, &sets);

    let merged: Vec<ContactRecord> = merged_keys(&sets)
        .into_iter()
        .map(ContactRecord::from)
        .collect();
    let merged_total = merged.len();

    let sources = input
        .sources
        .iter()
        .zip(&sets)
        .zip(unique)
        .map(|((source, set), unique)| SourceSummary {
            name: source.name.clone(),
            file: source.file.clone(),
            found: source.found,
            records: source.records.len(),
            distinct: set.len(),
            unique,
            coverage_pct: coverage_pct(set.len(), merged_total),
        })
        .collect();

    let best_source = best_source(&input.sources);

    tracing::info!(
        sources = input.sources.len(),
        merged = merged_total,
        best = best_source.as_ref().map(|b| b.name.as_str()).unwrap_or("-"),
        "reconciled"
    );

    Ok(ReconciliationReport {
        meta: ReconMeta {
            config_name: config.name.clone(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
        },
        sources,
        merged_total,
        best_source,
        outputs: OutputPaths {
            merged: config.output.merged.clone(),
            report: config.output.report.clone(),
            json: config.output.json.clone(),
        },
        merged,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
