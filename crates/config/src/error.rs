use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read settings file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML in {origin}: {message}")]
    Parse { origin: String, message: String },

    #[error("invalid settings: {0}")]
    Invalid(String),
}
