use std::path::PathBuf;

use rostermerge_core::ContactRecord;
use serde::Serialize;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// One source's contact file after loading.
#[derive(Debug, Clone)]
pub struct SourceContacts {
    pub name: String,
    pub file: PathBuf,
    /// False when the file did not exist. `records` is then empty.
    pub found: bool,
    pub records: Vec<ContactRecord>,
}

impl SourceContacts {
    pub fn new(name: impl Into<String>, records: Vec<ContactRecord>) -> Self {
        Self {
            name: name.into(),
            file: PathBuf::new(),
            found: true,
            records,
        }
    }

    pub fn missing(name: impl Into<String>, file: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            file: file.into(),
            found: false,
            records: Vec::new(),
        }
    }
}

/// Pre-loaded records, in configured source order.
#[derive(Debug)]
pub struct ReconInput {
    pub sources: Vec<SourceContacts>,
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct SourceSummary {
    pub name: String,
    pub file: PathBuf,
    pub found: bool,
    /// Raw rows, duplicates included.
    pub records: usize,
    /// Distinct (group, phone) keys.
    pub distinct: usize,
    /// Raw rows whose key no other source has.
    pub unique: usize,
    pub coverage_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BestSource {
    pub name: String,
    pub records: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct OutputPaths {
    pub merged: PathBuf,
    pub report: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconMeta {
    pub config_name: String,
    pub engine_version: String,
    pub run_at: String,
}

/// Read-only result of one reconciliation run.
#[derive(Debug, Clone, Serialize)]
pub struct ReconciliationReport {
    pub meta: ReconMeta,
    pub sources: Vec<SourceSummary>,
    pub merged_total: usize,
    pub best_source: Option<BestSource>,
    pub outputs: OutputPaths,
    /// Deduplicated union, sorted by (group, phone).
    #[serde(skip)]
    pub merged: Vec<ContactRecord>,
}
