//! Group and participant JSON shared by the HTTP and snapshot sources.
//!
//! Backends disagree on field names, so a group accepts:
//! - `id` as a plain string or an object carrying `_serialized`
//! - a display name from `name`, `subject`, `displayName` or
//!   `formattedTitle`, in that order, falling back to `Unknown`

use rostermerge_core::{AdapterError, Group, RawParticipant};

pub(crate) const UNKNOWN_GROUP: &str = "Unknown";

const NAME_FIELDS: &[&str] = &["name", "subject", "displayName", "formattedTitle"];

fn group_id(value: &serde_json::Value) -> String {
    match &value["id"] {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Object(obj) => obj
            .get("_serialized")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string(),
        _ => String::new(),
    }
}

fn group_name(value: &serde_json::Value) -> String {
    NAME_FIELDS
        .iter()
        .filter_map(|field| value[*field].as_str())
        .map(str::trim)
        .find(|name| !name.is_empty())
        .unwrap_or(UNKNOWN_GROUP)
        .to_string()
}

/// Parse one group object. A missing id yields an empty id; the orchestrator
/// counts such groups as skipped rather than failing the listing.
pub(crate) fn parse_group(value: &serde_json::Value) -> Group {
    Group::new(group_id(value), group_name(value))
}

/// Parse a group listing. Accepts a bare array or `{ "groups": [...] }`.
pub(crate) fn parse_groups(body: &serde_json::Value) -> Result<Vec<Group>, AdapterError> {
    let items = body
        .as_array()
        .or_else(|| body["groups"].as_array())
        .ok_or_else(|| AdapterError::Malformed("group listing is not an array".into()))?;
    Ok(items.iter().map(parse_group).collect())
}

/// Participants must be a JSON array. Accepts a bare array or
/// `{ "participants": [...] }`.
pub(crate) fn participants_of(
    body: &serde_json::Value,
) -> Result<Vec<RawParticipant>, AdapterError> {
    body.as_array()
        .or_else(|| body["participants"].as_array())
        .cloned()
        .ok_or_else(|| AdapterError::Malformed("participants are not an array".into()))
}
