// Application settings
// Loaded from --settings, $ROSTERMERGE_CONFIG, or ~/.config/rostermerge/config.toml

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rostermerge_core::normalize::{DEFAULT_SUFFIXES, MIN_PHONE_DIGITS};
use rostermerge_core::orchestrator::{PACING_DELAY, SETTLE_DELAY};
use rostermerge_core::{ExtractOptions, PhoneNormalizer, RetryPolicy};
use serde::{Deserialize, Serialize};

/// Environment variable naming a settings file.
pub const CONFIG_ENV: &str = "ROSTERMERGE_CONFIG";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid TOML in {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },
    #[error("invalid settings: {0}")]
    Invalid(String),
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// Retry overrides for one call site. Keys left out keep that call site's
/// own attempts and delay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempts: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay_ms: Option<u64>,
}

impl RetrySettings {
    pub fn policy(&self, fallback: RetryPolicy) -> RetryPolicy {
        RetryPolicy::new(
            self.attempts.unwrap_or(fallback.max_attempts),
            self.delay_ms.map(Duration::from_millis).unwrap_or(fallback.delay),
        )
    }
}

/// Delays and retry policies for extraction runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractSettings {
    /// Pause before the first listing call
    pub settle_ms: u64,
    /// Pause between groups
    pub pacing_ms: u64,
    pub group_retry: RetrySettings,
    pub participant_retry: RetrySettings,
}

impl Default for ExtractSettings {
    fn default() -> Self {
        Self {
            settle_ms: SETTLE_DELAY.as_millis() as u64,
            pacing_ms: PACING_DELAY.as_millis() as u64,
            group_retry: RetrySettings::default(),
            participant_retry: RetrySettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeSettings {
    /// Addressing suffixes stripped from id-like fields
    pub suffixes: Vec<String>,
    pub min_digits: usize,
}

impl Default for NormalizeSettings {
    fn default() -> Self {
        Self {
            suffixes: DEFAULT_SUFFIXES.iter().map(|s| s.to_string()).collect(),
            min_digits: MIN_PHONE_DIGITS,
        }
    }
}

/// How a source is reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// JSON session bridge over HTTP
    Http,
    /// Exported JSON file
    Snapshot,
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceKind::Http => write!(f, "http"),
            SourceKind::Snapshot => write!(f, "snapshot"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSettings {
    pub name: String,
    pub kind: SourceKind,
    /// Base URL (http only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Snapshot path (snapshot only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
    /// Environment variable holding a bearer token (http only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_env: Option<String>,
    /// Contact file to write. Defaults to `group_contacts_<name>.csv`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
}

impl SourceSettings {
    pub fn output_path(&self) -> PathBuf {
        match &self.output {
            Some(path) => path.clone(),
            None => PathBuf::from(format!("group_contacts_{}.csv", file_stem(&self.name))),
        }
    }
}

/// Lowercased name with anything outside [a-z0-9] collapsed to `_`.
fn file_stem(name: &str) -> String {
    let mut stem = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            stem.push(c.to_ascii_lowercase());
        } else if !stem.ends_with('_') {
            stem.push('_');
        }
    }
    let trimmed = stem.trim_matches('_');
    if trimmed.is_empty() {
        "source".to_string()
    } else {
        trimmed.to_string()
    }
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub extract: ExtractSettings,
    pub normalize: NormalizeSettings,
    pub sources: Vec<SourceSettings>,
}

impl Settings {
    /// Default settings file location
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("rostermerge")
            .join("config.toml")
    }

    /// Load settings. An explicit path must exist. The environment and
    /// default locations are optional; when absent, built-in defaults apply.
    ///
    /// Returns the settings and the file they came from, if any.
    pub fn load(explicit: Option<&Path>) -> Result<(Self, Option<PathBuf>), ConfigError> {
        let from_env = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        Self::load_from(explicit, from_env, Self::config_path())
    }

    fn load_from(
        explicit: Option<&Path>,
        from_env: Option<PathBuf>,
        default_path: PathBuf,
    ) -> Result<(Self, Option<PathBuf>), ConfigError> {
        let (path, required) = match (explicit, from_env) {
            (Some(path), _) => (path.to_path_buf(), true),
            (None, Some(path)) => (path, true),
            (None, None) => (default_path, false),
        };

        match fs::read_to_string(&path) {
            Ok(contents) => {
                let settings = Self::from_toml(&contents).map_err(|e| match e {
                    ConfigError::Parse { message, .. } => ConfigError::Parse {
                        path: path.clone(),
                        message,
                    },
                    other => other,
                })?;
                Ok((settings, Some(path)))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound && !required => {
                Ok((Self::default(), None))
            }
            Err(source) => Err(ConfigError::Read { path, source }),
        }
    }

    pub fn from_toml(input: &str) -> Result<Self, ConfigError> {
        let settings: Settings = toml::from_str(input).map_err(|e| ConfigError::Parse {
            path: PathBuf::new(),
            message: e.to_string(),
        })?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (label, retry) in [
            ("extract.group_retry", &self.extract.group_retry),
            ("extract.participant_retry", &self.extract.participant_retry),
        ] {
            if retry.attempts == Some(0) {
                return Err(ConfigError::Invalid(format!(
                    "{label}.attempts must be at least 1"
                )));
            }
        }

        if self.normalize.min_digits == 0 {
            return Err(ConfigError::Invalid(
                "normalize.min_digits must be at least 1".into(),
            ));
        }

        let mut seen = HashSet::new();
        for source in &self.sources {
            if source.name.trim().is_empty() {
                return Err(ConfigError::Invalid("source name must not be empty".into()));
            }
            if !seen.insert(source.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate source name '{}'",
                    source.name
                )));
            }
            match source.kind {
                SourceKind::Http if source.endpoint.as_deref().map_or(true, str::is_empty) => {
                    return Err(ConfigError::Invalid(format!(
                        "source '{}': http sources need an endpoint",
                        source.name
                    )));
                }
                SourceKind::Snapshot if source.file.is_none() => {
                    return Err(ConfigError::Invalid(format!(
                        "source '{}': snapshot sources need a file",
                        source.name
                    )));
                }
                _ => {}
            }
        }

        Ok(())
    }

    pub fn source(&self, name: &str) -> Option<&SourceSettings> {
        self.sources.iter().find(|s| s.name == name)
    }

    pub fn normalizer(&self) -> PhoneNormalizer {
        PhoneNormalizer::new(self.normalize.suffixes.clone(), self.normalize.min_digits)
    }

    pub fn extract_options(&self) -> ExtractOptions {
        ExtractOptions {
            settle_delay: Duration::from_millis(self.extract.settle_ms),
            pacing_delay: Duration::from_millis(self.extract.pacing_ms),
            group_retry: self.extract.group_retry.policy(RetryPolicy::group_listing()),
            participant_retry: self
                .extract
                .participant_retry
                .policy(RetryPolicy::participant_listing()),
            normalizer: self.normalizer(),
        }
    }
}
