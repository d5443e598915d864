//! Concrete source adapters and their construction from settings.

mod common;
pub mod http;
pub mod snapshot;

use rostermerge_config::{SourceKind, SourceSettings};
use rostermerge_core::SourceAdapter;

use crate::CliError;

pub use http::HttpSource;
pub use snapshot::SnapshotSource;

pub type BoxedSource = Box<dyn SourceAdapter + Send + Sync>;

/// Read the bearer token from the named environment variable, if any.
/// A configured but unset variable is a usage error.
fn resolve_token(source: &SourceSettings) -> Result<Option<String>, CliError> {
    let Some(var) = source.token_env.as_deref() else {
        return Ok(None);
    };
    match std::env::var(var) {
        Ok(token) if !token.trim().is_empty() => Ok(Some(token.trim().to_string())),
        _ => Err(CliError::args(format!(
            "source '{}': token variable {var} is not set",
            source.name
        ))
        .with_hint(format!("export {var}=<token>"))),
    }
}

pub fn build_source(source: &SourceSettings) -> Result<BoxedSource, CliError> {
    match source.kind {
        SourceKind::Http => {
            let endpoint = source.endpoint.as_deref().unwrap_or_default();
            let token = resolve_token(source)?;
            let http = HttpSource::new(&source.name, endpoint, token)
                .map_err(|e| CliError::args(format!("source '{}': {e}", source.name)))?;
            Ok(Box::new(http))
        }
        SourceKind::Snapshot => {
            let file = source.file.as_deref().ok_or_else(|| {
                CliError::args(format!("source '{}': snapshot sources need a file", source.name))
            })?;
            Ok(Box::new(SnapshotSource::new(&source.name, file)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exit_codes::EXIT_USAGE;

    fn settings(kind: SourceKind) -> SourceSettings {
        SourceSettings {
            name: "s".into(),
            kind,
            endpoint: None,
            file: None,
            token_env: None,
            output: None,
        }
    }

    #[test]
    fn builds_snapshot_source() {
        let mut s = settings(SourceKind::Snapshot);
        s.file = Some("export.json".into());
        assert_eq!(build_source(&s).unwrap().name(), "s");
    }

    #[test]
    fn http_with_unset_token_env_is_usage_error() {
        let mut s = settings(SourceKind::Http);
        s.endpoint = Some("http://localhost:8002".into());
        s.token_env = Some("ROSTERMERGE_TEST_TOKEN_NEVER_SET".into());
        let err = build_source(&s).err().unwrap();
        assert_eq!(err.code, EXIT_USAGE);
        assert!(err.message.contains("ROSTERMERGE_TEST_TOKEN_NEVER_SET"));
    }

    #[test]
    fn http_with_bad_endpoint_is_usage_error() {
        let mut s = settings(SourceKind::Http);
        s.endpoint = Some("::nope".into());
        assert_eq!(build_source(&s).err().unwrap().code, EXIT_USAGE);
    }
}
