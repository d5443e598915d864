//! Snapshot source: an exported JSON file standing in for a live session.
//!
//! ```json
//! { "groups": [ { "id": "120363@g.us", "name": "Choir", "participants": [ ... ] } ] }
//! ```
//!
//! The file is read once, on first use. An unreadable or unparsable file is a
//! permanent failure.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use rostermerge_core::{AdapterError, Group, RawParticipant, SourceAdapter};

use super::common::{parse_groups, participants_of};

struct Snapshot {
    groups: Vec<Group>,
    participants: HashMap<String, serde_json::Value>,
}

pub struct SnapshotSource {
    name: String,
    path: PathBuf,
    loaded: OnceLock<Result<Snapshot, AdapterError>>,
}

impl SnapshotSource {
    pub fn new(name: &str, path: &Path) -> Self {
        Self {
            name: name.to_string(),
            path: path.to_path_buf(),
            loaded: OnceLock::new(),
        }
    }

    fn snapshot(&self) -> Result<&Snapshot, AdapterError> {
        self.loaded
            .get_or_init(|| load(&self.path))
            .as_ref()
            .map_err(Clone::clone)
    }
}

fn load(path: &Path) -> Result<Snapshot, AdapterError> {
    let data = std::fs::read_to_string(path)
        .map_err(|e| AdapterError::Permanent(format!("cannot read {}: {e}", path.display())))?;
    let body: serde_json::Value = serde_json::from_str(&data)
        .map_err(|e| AdapterError::Permanent(format!("invalid JSON in {}: {e}", path.display())))?;

    let groups = parse_groups(&body).map_err(|e| {
        AdapterError::Permanent(format!("{}: {e}", path.display()))
    })?;

    // parse_groups accepted the shape, so this is the same array
    let items = body
        .as_array()
        .or_else(|| body["groups"].as_array())
        .map(Vec::as_slice)
        .unwrap_or_default();

    let mut participants = HashMap::new();
    for (group, item) in groups.iter().zip(items) {
        if group.has_usable_id() {
            participants
                .entry(group.id.clone())
                .or_insert_with(|| item["participants"].clone());
        }
    }

    Ok(Snapshot {
        groups,
        participants,
    })
}

impl SourceAdapter for SnapshotSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn list_groups(&self) -> Result<Vec<Group>, AdapterError> {
        Ok(self.snapshot()?.groups.clone())
    }

    fn list_participants(&self, group_id: &str) -> Result<Vec<RawParticipant>, AdapterError> {
        let snapshot = self.snapshot()?;
        let value = snapshot.participants.get(group_id).ok_or_else(|| {
            AdapterError::Permanent(format!("group '{group_id}' is not in {}", self.path.display()))
        })?;
        participants_of(value)
    }
}
