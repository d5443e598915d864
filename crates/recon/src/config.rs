use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ReconError;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Which contact files to merge, in order, and where results go.
///
/// Source order matters: it is the report order and breaks best-source ties.
#[derive(Debug, Clone, Deserialize)]
pub struct MergeConfig {
    #[serde(default = "default_name")]
    pub name: String,
    pub sources: Vec<SourceFile>,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SourceFile {
    pub name: String,
    pub file: PathBuf,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, file: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            file: file.into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_merged")]
    pub merged: PathBuf,
    #[serde(default = "default_report")]
    pub report: PathBuf,
    #[serde(default)]
    pub json: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            merged: default_merged(),
            report: default_report(),
            json: None,
        }
    }
}

fn default_name() -> String {
    "contact merge".into()
}

fn default_merged() -> PathBuf {
    PathBuf::from("group_contacts_merged.csv")
}

fn default_report() -> PathBuf {
    PathBuf::from("extraction_comparison_report.txt")
}

// ---------------------------------------------------------------------------
// Built-in layout
// ---------------------------------------------------------------------------

/// The four extraction backends and file names used when no config is given.
pub const DEFAULT_SOURCES: &[(&str, &str)] = &[
    ("@open-wa/wa-automate", "group_contacts.csv"),
    ("whatsapp-web.js", "group_contacts_wwjs.csv"),
    ("Baileys", "group_contacts_baileys.csv"),
    ("venom-bot", "group_contacts_venom.csv"),
];

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            sources: DEFAULT_SOURCES
                .iter()
                .map(|(name, file)| SourceFile::new(*name, *file))
                .collect(),
            output: OutputConfig::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl MergeConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: MergeConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        if self.sources.is_empty() {
            return Err(ReconError::ConfigValidation(
                "at least 1 source is required".into(),
            ));
        }

        let mut seen = HashSet::new();
        for source in &self.sources {
            if source.name.trim().is_empty() {
                return Err(ReconError::ConfigValidation(
                    "source name must not be empty".into(),
                ));
            }
            if source.file.as_os_str().is_empty() {
                return Err(ReconError::ConfigValidation(format!(
                    "source '{}': file must not be empty",
                    source.name
                )));
            }
            if !seen.insert(source.name.as_str()) {
                return Err(ReconError::ConfigValidation(format!(
                    "duplicate source name '{}'",
                    source.name
                )));
            }
        }

        Ok(())
    }

    /// Resolve relative source and output paths against `base_dir`
    /// (usually the config file's directory).
    pub fn resolve_paths(mut self, base_dir: &Path) -> Self {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base_dir.join(&*p);
            }
        };
        for source in &mut self.sources {
            resolve(&mut source.file);
        }
        resolve(&mut self.output.merged);
        resolve(&mut self.output.report);
        if let Some(json) = self.output.json.as_mut() {
            resolve(json);
        }
        self
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"
name = "Weekly roster"

[[sources]]
name = "wwjs"
file = "group_contacts_wwjs.csv"

[[sources]]
name = "baileys"
file = "out/group_contacts_baileys.csv"

[output]
merged = "merged.csv"
report = "report.txt"
json = "report.json"
"#;

    #[test]
    fn parse_valid() {
        let config = MergeConfig::from_toml(VALID).unwrap();
        assert_eq!(config.name, "Weekly roster");
        assert_eq!(config.sources.len(), 2);
        assert_eq!(config.sources[0], SourceFile::new("wwjs", "group_contacts_wwjs.csv"));
        assert_eq!(config.output.merged, PathBuf::from("merged.csv"));
        assert_eq!(config.output.json, Some(PathBuf::from("report.json")));
    }

    #[test]
    fn output_defaults() {
        let config = MergeConfig::from_toml(
            r#"
[[sources]]
name = "a"
file = "a.csv"
"#,
        )
        .unwrap();
        assert_eq!(config.name, "contact merge");
        assert_eq!(config.output.merged, PathBuf::from("group_contacts_merged.csv"));
        assert_eq!(config.output.report, PathBuf::from("extraction_comparison_report.txt"));
        assert!(config.output.json.is_none());
    }

    #[test]
    fn builtin_layout_order() {
        let config = MergeConfig::default();
        let names: Vec<_> = config.sources.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            ["@open-wa/wa-automate", "whatsapp-web.js", "Baileys", "venom-bot"]
        );
        config.validate().unwrap();
    }

    #[test]
    fn reject_no_sources() {
        let err = MergeConfig::from_toml("sources = []").unwrap_err();
        assert!(err.to_string().contains("at least 1 source"));
    }

    #[test]
    fn reject_duplicate_names() {
        let input = r#"
[[sources]]
name = "a"
file = "a.csv"

[[sources]]
name = "a"
file = "b.csv"
"#;
        let err = MergeConfig::from_toml(input).unwrap_err();
        assert!(err.to_string().contains("duplicate source name 'a'"));
    }

    #[test]
    fn reject_missing_file_key() {
        let input = r#"
[[sources]]
name = "a"
"#;
        let err = MergeConfig::from_toml(input).unwrap_err();
        assert!(matches!(err, ReconError::ConfigParse(_)));
    }

    #[test]
    fn resolve_relative_paths_only() {
        let config = MergeConfig::from_toml(VALID)
            .unwrap()
            .resolve_paths(Path::new("/data/run1"));
        assert_eq!(
            config.sources[1].file,
            PathBuf::from("/data/run1/out/group_contacts_baileys.csv")
        );
        assert_eq!(config.output.report, PathBuf::from("/data/run1/report.txt"));
        assert_eq!(config.output.json, Some(PathBuf::from("/data/run1/report.json")));

        let mut abs = MergeConfig::default();
        abs.sources[0].file = PathBuf::from("/abs/x.csv");
        let abs = abs.resolve_paths(Path::new("/elsewhere"));
        assert_eq!(abs.sources[0].file, PathBuf::from("/abs/x.csv"));
    }
}
