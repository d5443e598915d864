use crate::model::{Group, RawParticipant};
use crate::retry::Retryable;

/// Failure reported by a source adapter.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AdapterError {
    /// Network hiccup, timeout, rate limit, upstream 5xx. Worth retrying.
    #[error("transient failure: {0}")]
    Transient(String),
    /// Auth rejected, session gone, bad request. Retrying cannot help.
    #[error("permanent failure: {0}")]
    Permanent(String),
    /// The call succeeded but the payload is not the expected shape
    /// (e.g. participants are not a list).
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl Retryable for AdapterError {
    fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

/// One messaging backend, already connected.
///
/// Session setup, pairing and teardown belong to the implementor.
pub trait SourceAdapter {
    /// Label used in logs and as the default report name.
    fn name(&self) -> &str;

    fn list_groups(&self) -> Result<Vec<Group>, AdapterError>;

    fn list_participants(&self, group_id: &str) -> Result<Vec<RawParticipant>, AdapterError>;
}

impl<A: SourceAdapter + ?Sized> SourceAdapter for Box<A> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn list_groups(&self) -> Result<Vec<Group>, AdapterError> {
        (**self).list_groups()
    }

    fn list_participants(&self, group_id: &str) -> Result<Vec<RawParticipant>, AdapterError> {
        (**self).list_participants(group_id)
    }
}
