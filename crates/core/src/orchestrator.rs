//! Per-source extraction run.
//!
//! ```text
//! Connecting ─► GroupsListed ─► (Listing ─► Normalizing ─► Accumulated)* ─► Finalized
//! ```
//!
//! Failure isolation, smallest unit first:
//! - participant: normalization failure → participant skipped, counted
//! - group: blank id, malformed listing, or listing retries exhausted → group skipped, counted
//! - source: group listing exhausted, or any permanent adapter failure → run aborted, nothing written
//!
//! Groups are processed one at a time with a pacing pause between them. Do not
//! parallelize: the pause exists to keep request volume against the upstream
//! backend low.

use std::path::Path;
use std::time::Duration;

use crate::adapter::{AdapterError, SourceAdapter};
use crate::contacts::{self, ContactFileError};
use crate::model::{ContactRecord, ExtractionOutcome, Group, ParticipantFailures};
use crate::normalize::{NormalizationFailure, PhoneNormalizer};
use crate::retry::{RetryPolicy, Sleeper, ThreadSleeper};

/// Pause after connecting, before the first listing call.
pub const SETTLE_DELAY: Duration = Duration::from_millis(5000);
/// Pause between consecutive groups.
pub const PACING_DELAY: Duration = Duration::from_millis(2000);

// ── Options ─────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ExtractOptions {
    pub settle_delay: Duration,
    pub pacing_delay: Duration,
    pub group_retry: RetryPolicy,
    pub participant_retry: RetryPolicy,
    pub normalizer: PhoneNormalizer,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            settle_delay: SETTLE_DELAY,
            pacing_delay: PACING_DELAY,
            group_retry: RetryPolicy::group_listing(),
            participant_retry: RetryPolicy::participant_listing(),
            normalizer: PhoneNormalizer::default(),
        }
    }
}

// ── Errors ──────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// Groups could not be listed. Nothing was extracted.
    #[error("{source_name}: cannot list groups: {error}")]
    Connect {
        source_name: String,
        #[source]
        error: AdapterError,
    },
    /// A permanent adapter failure mid-run. Partial results are discarded.
    #[error("{source_name}: aborted at group '{group}': {error}")]
    Aborted {
        source_name: String,
        group: String,
        #[source]
        error: AdapterError,
    },
    #[error(transparent)]
    Persist(#[from] ContactFileError),
}

impl ExtractError {
    /// True when the upstream rejected us outright (auth, revoked session)
    /// rather than being unreachable.
    pub fn is_permanent(&self) -> bool {
        match self {
            Self::Connect { error, .. } | Self::Aborted { error, .. } => {
                matches!(error, AdapterError::Permanent(_))
            }
            Self::Persist(_) => false,
        }
    }
}

// ── Run ─────────────────────────────────────────────────────────────

enum GroupStatus {
    Processed { participants: usize, contacts: usize },
    Skipped(String),
}

/// Run one source to completion and return its outcome.
pub fn run_extraction<A: SourceAdapter + ?Sized>(
    adapter: &A,
    options: &ExtractOptions,
) -> Result<ExtractionOutcome, ExtractError> {
    run_extraction_with(adapter, options, &ThreadSleeper)
}

/// [`run_extraction`] with an explicit sleeper.
pub fn run_extraction_with<A: SourceAdapter + ?Sized>(
    adapter: &A,
    options: &ExtractOptions,
    sleeper: &dyn Sleeper,
) -> Result<ExtractionOutcome, ExtractError> {
    let source_name = adapter.name().to_string();
    let span = tracing::info_span!("extract", source = %source_name);
    let _enter = span.enter();

    // Connecting
    sleeper.sleep(options.settle_delay);

    let groups = options
        .group_retry
        .run(sleeper, "list groups", || adapter.list_groups())
        .map_err(|error| ExtractError::Connect {
            source_name: source_name.clone(),
            error,
        })?;

    // GroupsListed
    tracing::info!(groups = groups.len(), "found {} group(s)", groups.len());

    let mut outcome = ExtractionOutcome {
        source: source_name.clone(),
        processed_groups: 0,
        skipped_groups: 0,
        total_contacts: 0,
        participant_failures: ParticipantFailures::default(),
        records: Vec::new(),
    };

    for (index, group) in groups.iter().enumerate() {
        tracing::info!(group = %group.display_name, "processing group");

        match process_group(adapter, options, sleeper, group, &mut outcome)? {
            GroupStatus::Processed { participants, contacts } => {
                outcome.processed_groups += 1;
                tracing::info!(
                    group = %group.display_name,
                    participants,
                    contacts,
                    "extracted {contacts} valid contact(s) from {participants} participant(s)",
                );
                if index + 1 < groups.len() {
                    sleeper.sleep(options.pacing_delay);
                }
            }
            GroupStatus::Skipped(reason) => {
                outcome.skipped_groups += 1;
                tracing::warn!(group = %group.display_name, "skipping group: {reason}");
            }
        }
    }

    // Finalized
    outcome.total_contacts = outcome.records.len();
    tracing::info!(
        processed_groups = outcome.processed_groups,
        skipped_groups = outcome.skipped_groups,
        contacts = outcome.total_contacts,
        skipped_participants = outcome.participant_failures.total(),
        "extraction finished",
    );

    Ok(outcome)
}

fn process_group<A: SourceAdapter + ?Sized>(
    adapter: &A,
    options: &ExtractOptions,
    sleeper: &dyn Sleeper,
    group: &Group,
    outcome: &mut ExtractionOutcome,
) -> Result<GroupStatus, ExtractError> {
    if !group.has_usable_id() {
        return Ok(GroupStatus::Skipped("no usable group id".into()));
    }

    let listed = options
        .participant_retry
        .run(sleeper, "list participants", || adapter.list_participants(&group.id));

    let participants = match listed {
        Ok(participants) => participants,
        Err(error @ AdapterError::Permanent(_)) => {
            return Err(ExtractError::Aborted {
                source_name: outcome.source.clone(),
                group: group.display_name.clone(),
                error,
            });
        }
        Err(AdapterError::Malformed(msg)) => {
            return Ok(GroupStatus::Skipped(format!("invalid participants data: {msg}")));
        }
        Err(error) => {
            return Ok(GroupStatus::Skipped(format!(
                "participant listing failed after {} attempt(s): {error}",
                options.participant_retry.max_attempts.max(1),
            )));
        }
    };

    let mut contacts = 0;
    for raw in &participants {
        match options.normalizer.normalize(raw) {
            Ok(normalized) => {
                tracing::trace!(method = %normalized.method, "participant normalized");
                outcome
                    .records
                    .push(ContactRecord::new(&group.display_name, normalized.phone));
                contacts += 1;
            }
            Err(failure) => {
                let counts = &mut outcome.participant_failures;
                match failure {
                    NormalizationFailure::NoIdentifiableField { .. } => {
                        counts.no_identifiable_field += 1
                    }
                    NormalizationFailure::EmptyAfterCleaning { .. } => {
                        counts.empty_after_cleaning += 1
                    }
                    NormalizationFailure::TooShort { .. } => counts.too_short += 1,
                }
                tracing::warn!(
                    group = %group.display_name,
                    kind = failure.kind(),
                    "skipping participant: {failure}",
                );
                tracing::debug!(record = %raw, "unusable participant record");
            }
        }
    }

    Ok(GroupStatus::Processed {
        participants: participants.len(),
        contacts,
    })
}

/// Run one source and write its records to `out`. On any error the file is
/// not created.
pub fn extract_to_file<A: SourceAdapter + ?Sized>(
    adapter: &A,
    options: &ExtractOptions,
    out: &Path,
) -> Result<ExtractionOutcome, ExtractError> {
    extract_to_file_with(adapter, options, out, &ThreadSleeper)
}

pub fn extract_to_file_with<A: SourceAdapter + ?Sized>(
    adapter: &A,
    options: &ExtractOptions,
    out: &Path,
    sleeper: &dyn Sleeper,
) -> Result<ExtractionOutcome, ExtractError> {
    let outcome = run_extraction_with(adapter, options, sleeper)?;
    contacts::write_contacts_file(out, &outcome.records)?;
    tracing::info!(
        source = %outcome.source,
        entries = outcome.records.len(),
        "saved contacts to {}",
        out.display(),
    );
    Ok(outcome)
}

// ── Tests ───────────────────────────────────────────────────────────
