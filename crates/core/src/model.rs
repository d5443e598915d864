use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// One group member exactly as the source returned it. The shape is owned by
/// the backend, so it stays an untyped JSON value until normalization.
pub type RawParticipant = serde_json::Value;

/// A group as listed by a source adapter.
///
/// `id` is the adapter's handle for listing participants. `display_name` is
/// what ends up in contact files and in the merge key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub id: String,
    pub display_name: String,
}

impl Group {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
        }
    }

    /// A blank id cannot be passed back to the adapter.
    pub fn has_usable_id(&self) -> bool {
        !self.id.trim().is_empty()
    }
}

// ---------------------------------------------------------------------------
// Contacts
// ---------------------------------------------------------------------------

/// The persisted unit: one row of a contact file.
///
/// Field order is the CSV column order (`group,phone`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContactRecord {
    pub group: String,
    pub phone: String,
}

impl ContactRecord {
    pub fn new(group: impl Into<String>, phone: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            phone: phone.into(),
        }
    }

    pub fn key(&self) -> ContactKey {
        ContactKey {
            group: self.group.clone(),
            phone: self.phone.clone(),
        }
    }
}

/// Dedup identity for a contact. Kept as two fields rather than a joined
/// string so no separator can collide with group names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ContactKey {
    pub group: String,
    pub phone: String,
}

impl From<ContactKey> for ContactRecord {
    fn from(key: ContactKey) -> Self {
        ContactRecord {
            group: key.group,
            phone: key.phone,
        }
    }
}

impl std::fmt::Display for ContactKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} / {}", self.group, self.phone)
    }
}

// ---------------------------------------------------------------------------
// Extraction outcome
// ---------------------------------------------------------------------------

/// Participants skipped during a run, by failure kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ParticipantFailures {
    pub no_identifiable_field: usize,
    pub empty_after_cleaning: usize,
    pub too_short: usize,
}

impl ParticipantFailures {
    pub fn total(&self) -> usize {
        self.no_identifiable_field + self.empty_after_cleaning + self.too_short
    }
}

/// Summary of one source run. Built by the orchestrator, never mutated after
/// it is returned.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionOutcome {
    pub source: String,
    pub processed_groups: usize,
    pub skipped_groups: usize,
    pub total_contacts: usize,
    pub participant_failures: ParticipantFailures,
    #[serde(skip)]
    pub records: Vec<ContactRecord>,
}
