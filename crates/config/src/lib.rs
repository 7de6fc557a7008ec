// Configuration loading

pub mod error;
pub mod settings;

pub use error::ConfigError;
pub use settings::{LogFormat, LoggingSettings, ReportSettings, ServerSettings, Settings};
