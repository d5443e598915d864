// Configuration loading

pub mod settings;

pub use settings::{
    ConfigError, ExtractSettings, NormalizeSettings, RetrySettings, Settings, SourceKind,
    SourceSettings, CONFIG_ENV,
};
