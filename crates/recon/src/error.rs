use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReconError {
    /// The input grid has no rows, so there is no header to read.
    #[error("input is not tabular: no header row found")]
    NoHeader,
    /// TOML parse / deserialization error.
    #[error("config parse error: {0}")]
    ConfigParse(String),
    /// Config validation error (empty alias list, bad official layout, etc.).
    #[error("config validation error: {0}")]
    ConfigValidation(String),
}
