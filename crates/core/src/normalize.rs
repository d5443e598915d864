//! Phone extraction from raw participant records.
//!
//! Sources disagree on where a member's number lives. Each known shape is one
//! entry in [`STRATEGIES`], probed in order; the first entry whose field is
//! present wins and no later entry is consulted, even if validation of the
//! winning candidate then fails.
//!
//! | #  | Strategy        | Field             | Suffix stripping |
//! |----|-----------------|-------------------|------------------|
//! | 1  | `id_string`     | `id` (string)     | yes              |
//! | 2  | `id_serialized` | `id._serialized`  | yes              |
//! | 3  | `id_user`       | `id.user`         | no               |
//! | 4  | `contact_id`    | `contact.id`      | yes              |
//! | 5  | `phone`         | `phone`           | no               |
//! | 6  | `number`        | `number`          | no               |

use serde::Serialize;
use serde_json::Value;

use crate::model::RawParticipant;

/// Addressing suffixes for individual (`@c.us`) and group (`@g.us`) ids.
pub const DEFAULT_SUFFIXES: &[&str] = &["@c.us", "@g.us"];

/// Fewer digits than this cannot be a dialable number.
pub const MIN_PHONE_DIGITS: usize = 7;

// ── Strategies ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    IdString,
    IdSerialized,
    IdUser,
    ContactId,
    Phone,
    Number,
}

impl Strategy {
    /// Dotted path of the field the strategy reads.
    pub fn field_path(&self) -> &'static str {
        match self {
            Self::IdString => "id",
            Self::IdSerialized => "id._serialized",
            Self::IdUser => "id.user",
            Self::ContactId => "contact.id",
            Self::Phone => "phone",
            Self::Number => "number",
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IdString => write!(f, "id_string"),
            Self::IdSerialized => write!(f, "id_serialized"),
            Self::IdUser => write!(f, "id_user"),
            Self::ContactId => write!(f, "contact_id"),
            Self::Phone => write!(f, "phone"),
            Self::Number => write!(f, "number"),
        }
    }
}

type ExtractFn = fn(&RawParticipant, &PhoneNormalizer) -> Option<String>;

/// Priority order. Supporting a new record shape means appending here.
const STRATEGIES: &[(Strategy, ExtractFn)] = &[
    (Strategy::IdString, extract_id_string),
    (Strategy::IdSerialized, extract_id_serialized),
    (Strategy::IdUser, extract_id_user),
    (Strategy::ContactId, extract_contact_id),
    (Strategy::Phone, extract_phone),
    (Strategy::Number, extract_number),
];

fn extract_id_string(raw: &RawParticipant, n: &PhoneNormalizer) -> Option<String> {
    raw.get("id")
        .and_then(non_empty_str)
        .map(|s| n.strip_suffixes(s))
}

fn extract_id_serialized(raw: &RawParticipant, n: &PhoneNormalizer) -> Option<String> {
    raw.get("id")?
        .as_object()?
        .get("_serialized")
        .and_then(non_empty_str)
        .map(|s| n.strip_suffixes(s))
}

fn extract_id_user(raw: &RawParticipant, _: &PhoneNormalizer) -> Option<String> {
    raw.get("id")?.as_object()?.get("user").and_then(text_of)
}

fn extract_contact_id(raw: &RawParticipant, n: &PhoneNormalizer) -> Option<String> {
    raw.get("contact")?
        .as_object()?
        .get("id")
        .and_then(non_empty_str)
        .map(|s| n.strip_suffixes(s))
}

fn extract_phone(raw: &RawParticipant, _: &PhoneNormalizer) -> Option<String> {
    raw.get("phone").and_then(text_of)
}

fn extract_number(raw: &RawParticipant, _: &PhoneNormalizer) -> Option<String> {
    raw.get("number").and_then(text_of)
}

fn non_empty_str(v: &Value) -> Option<&str> {
    v.as_str().filter(|s| !s.is_empty())
}

/// A non-empty string, or a non-negative integer rendered in decimal.
fn text_of(v: &Value) -> Option<String> {
    match v {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => n.as_u64().map(|u| u.to_string()),
        _ => None,
    }
}

// ── Results ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized {
    /// Digits only, at least `min_digits` long.
    pub phone: String,
    /// Diagnostic only; never written to contact files.
    pub method: Strategy,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NormalizationFailure {
    /// No strategy applied. `shape` lists the record's field names so new
    /// shapes can be diagnosed from logs.
    #[error("no identifiable phone field (fields: [{}])", .shape.join(", "))]
    NoIdentifiableField { shape: Vec<String> },
    #[error("{strategy} held no digits")]
    EmptyAfterCleaning { strategy: Strategy },
    #[error("{strategy} yielded {} digit(s) ({digits}), need at least {min}", .digits.len())]
    TooShort {
        strategy: Strategy,
        digits: String,
        min: usize,
    },
}

impl NormalizationFailure {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NoIdentifiableField { .. } => "no_identifiable_field",
            Self::EmptyAfterCleaning { .. } => "empty_after_cleaning",
            Self::TooShort { .. } => "too_short",
        }
    }
}

// ── Normalizer ──────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct PhoneNormalizer {
    suffixes: Vec<String>,
    min_digits: usize,
}

impl Default for PhoneNormalizer {
    fn default() -> Self {
        Self {
            suffixes: DEFAULT_SUFFIXES.iter().map(|s| s.to_string()).collect(),
            min_digits: MIN_PHONE_DIGITS,
        }
    }
}

impl PhoneNormalizer {
    pub fn new(suffixes: Vec<String>, min_digits: usize) -> Self {
        Self {
            suffixes: suffixes.into_iter().filter(|s| !s.is_empty()).collect(),
            min_digits,
        }
    }

    pub fn min_digits(&self) -> usize {
        self.min_digits
    }

    /// Extract and validate a phone number from one raw participant.
    pub fn normalize(&self, raw: &RawParticipant) -> Result<Normalized, NormalizationFailure> {
        let (strategy, candidate) = self
            .probe(raw)
            .ok_or_else(|| NormalizationFailure::NoIdentifiableField {
                shape: shape_of(raw),
            })?;

        let digits: String = candidate
            .trim()
            .chars()
            .filter(|c| c.is_ascii_digit())
            .collect();

        if digits.is_empty() {
            return Err(NormalizationFailure::EmptyAfterCleaning { strategy });
        }
        if digits.len() < self.min_digits {
            return Err(NormalizationFailure::TooShort {
                strategy,
                digits,
                min: self.min_digits,
            });
        }

        Ok(Normalized {
            phone: digits,
            method: strategy,
        })
    }

    /// First strategy whose field is present, with its unvalidated candidate.
    pub fn probe(&self, raw: &RawParticipant) -> Option<(Strategy, String)> {
        STRATEGIES
            .iter()
            .find_map(|(strategy, extract)| extract(raw, self).map(|c| (*strategy, c)))
    }

    /// Remove addressing suffixes from the end, repeatedly, so stacked
    /// suffixes like `123@g.us@c.us` are fully removed.
    fn strip_suffixes(&self, s: &str) -> String {
        let mut rest = s.trim_end();
        loop {
            let before = rest.len();
            for suffix in &self.suffixes {
                if let Some(stripped) = rest.strip_suffix(suffix.as_str()) {
                    rest = stripped;
                }
            }
            if rest.len() == before {
                return rest.to_string();
            }
        }
    }
}

/// Field names of a raw record, one level deep (`id`, `id.user`, …), sorted.
/// Non-object records have no shape.
pub fn shape_of(raw: &RawParticipant) -> Vec<String> {
    let Some(obj) = raw.as_object() else {
        return Vec::new();
    };

    let mut shape = Vec::new();
    for (key, value) in obj {
        shape.push(key.clone());
        if let Some(inner) = value.as_object() {
            shape.extend(inner.keys().map(|k| format!("{key}.{k}")));
        }
    }
    shape.sort();
    shape
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{prop_assert, prop_assert_eq, proptest};
    use serde_json::json;

    fn normalize(raw: Value) -> Result<Normalized, NormalizationFailure> {
        PhoneNormalizer::default().normalize(&raw)
    }

    #[test]
    fn id_string_strips_individual_suffix() {
        let n = normalize(json!({ "id": "255712345678@c.us" })).unwrap();
        assert_eq!(n.phone, "255712345678");
        assert_eq!(n.method, Strategy::IdString);
    }

    #[test]
    fn id_string_strips_group_suffix() {
        let n = normalize(json!({ "id": "255712345678@g.us" })).unwrap();
        assert_eq!(n.phone, "255712345678");
    }

    #[test]
    fn id_serialized() {
        let n = normalize(json!({
            "id": { "server": "c.us", "user": "255700000000", "_serialized": "255711111111@c.us" }
        }))
        .unwrap();
        // _serialized outranks user
        assert_eq!(n.phone, "255711111111");
        assert_eq!(n.method, Strategy::IdSerialized);
    }

    #[test]
    fn id_user_used_verbatim() {
        let n = normalize(json!({ "id": { "user": "255798765432" } })).unwrap();
        assert_eq!(n.phone, "255798765432");
        assert_eq!(n.method, Strategy::IdUser);
    }

    #[test]
    fn contact_id() {
        let n = normalize(json!({ "contact": { "id": "255787654321@c.us" } })).unwrap();
        assert_eq!(n.phone, "255787654321");
        assert_eq!(n.method, Strategy::ContactId);
    }

    #[test]
    fn phone_field_is_cleaned() {
        let n = normalize(json!({ "phone": "+255 71 234 5678" })).unwrap();
        assert_eq!(n.phone, "255712345678");
        assert_eq!(n.method, Strategy::Phone);
    }

    #[test]
    fn number_field() {
        let n = normalize(json!({ "number": "(255) 744-123456" })).unwrap();
        assert_eq!(n.phone, "255744123456");
        assert_eq!(n.method, Strategy::Number);
    }

    #[test]
    fn integer_fields_accepted() {
        let n = normalize(json!({ "phone": 255712345678u64 })).unwrap();
        assert_eq!(n.phone, "255712345678");
    }

    #[test]
    fn first_matching_strategy_wins() {
        // id string present → phone never consulted
        let n = normalize(json!({ "id": "255700000001@c.us", "phone": "255799999999" })).unwrap();
        assert_eq!(n.phone, "255700000001");
        assert_eq!(n.method, Strategy::IdString);

        // winner fails validation → no fallback to a later strategy
        let err = normalize(json!({ "id": "123@c.us", "phone": "255799999999" })).unwrap_err();
        assert!(matches!(err, NormalizationFailure::TooShort { strategy: Strategy::IdString, .. }));
    }

    #[test]
    fn empty_string_fields_fall_through() {
        let n = normalize(json!({ "id": "", "phone": "", "number": "0712345678" })).unwrap();
        assert_eq!(n.method, Strategy::Number);
        assert_eq!(n.phone, "0712345678");
    }

    #[test]
    fn number_too_short() {
        let err = normalize(json!({ "number": "12345" })).unwrap_err();
        assert_eq!(
            err,
            NormalizationFailure::TooShort {
                strategy: Strategy::Number,
                digits: "12345".into(),
                min: 7,
            }
        );
        assert_eq!(err.kind(), "too_short");
    }

    #[test]
    fn no_identifiable_field_keeps_shape() {
        let err = normalize(json!({ "name": "Alice", "isAdmin": false })).unwrap_err();
        assert_eq!(
            err,
            NormalizationFailure::NoIdentifiableField {
                shape: vec!["isAdmin".into(), "name".into()],
            }
        );
        assert!(err.to_string().contains("isAdmin, name"));
    }

    #[test]
    fn absent_record() {
        let err = normalize(Value::Null).unwrap_err();
        assert_eq!(err, NormalizationFailure::NoIdentifiableField { shape: vec![] });
    }

    #[test]
    fn whitespace_only_is_empty_after_cleaning() {
        let err = normalize(json!({ "phone": "   " })).unwrap_err();
        assert_eq!(err, NormalizationFailure::EmptyAfterCleaning { strategy: Strategy::Phone });
    }

    #[test]
    fn bare_suffix_is_empty_after_cleaning() {
        let err = normalize(json!({ "id": "@c.us" })).unwrap_err();
        assert_eq!(err.kind(), "empty_after_cleaning");
    }

    #[test]
    fn stacked_and_custom_suffixes() {
        let n = PhoneNormalizer::new(vec!["@s.whatsapp.net".into(), "@c.us".into()], 7);
        let out = n.normalize(&json!({ "id": "255712345678@s.whatsapp.net" })).unwrap();
        assert_eq!(out.phone, "255712345678");

        let out = PhoneNormalizer::default()
            .normalize(&json!({ "id": "255712345678@g.us@c.us" }))
            .unwrap();
        assert_eq!(out.phone, "255712345678");
    }

    #[test]
    fn shape_includes_nested_fields() {
        let shape = shape_of(&json!({ "id": { "user": "1", "server": "c.us" }, "isAdmin": true }));
        assert_eq!(shape, vec!["id", "id.server", "id.user", "isAdmin"]);
    }

    #[test]
    fn object_phone_field_is_not_a_candidate() {
        let err = normalize(json!({ "phone": { "e164": "+255712345678" } })).unwrap_err();
        assert!(matches!(err, NormalizationFailure::NoIdentifiableField { .. }));
    }

    proptest! {
        #[test]
        fn output_is_digits_and_long_enough(s in "\\PC{0,40}") {
            if let Ok(n) = normalize(json!({ "phone": s })) {
                prop_assert!(n.phone.chars().all(|c| c.is_ascii_digit()));
                prop_assert!(n.phone.len() >= MIN_PHONE_DIGITS);
            }
        }

        #[test]
        fn formatting_does_not_change_digits(digits in "[0-9]{7,15}") {
            let spaced: String = digits.chars().flat_map(|c| [c, ' ']).collect();
            let n = normalize(json!({ "phone": format!("+{spaced}") })).unwrap();
            prop_assert_eq!(n.phone, digits);
        }
    }
}
