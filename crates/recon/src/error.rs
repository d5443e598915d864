use rostermerge_core::contacts::ContactFileError;

#[derive(Debug, thiserror::Error)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    #[error("config parse error: {0}")]
    ConfigParse(String),
    /// Config validation error (no sources, duplicate names, empty paths).
    #[error("config validation error: {0}")]
    ConfigValidation(String),
    /// A source file exists but could not be read.
    #[error("source '{name}': {error}")]
    Source {
        name: String,
        #[source]
        error: ContactFileError,
    },
    /// Writing merged output or the report failed.
    #[error("IO error: {0}")]
    Io(String),
}
