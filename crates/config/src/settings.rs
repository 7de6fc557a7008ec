// Application settings
// Loaded from <config dir>/invaudit/settings.toml

use std::fmt;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use invaudit_recon::LoaderConfig;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// 25 MiB
const DEFAULT_MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerSettings {
    /// Listen address, `host:port`.
    pub bind: String,
    /// Request body cap for multipart uploads.
    pub max_upload_bytes: usize,
    /// Browser origins allowed by CORS.
    pub allowed_origins: Vec<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8000".to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            // Vite dev server
            allowed_origins: vec![
                "http://localhost:5173".to_string(),
                "http://127.0.0.1:5173".to_string(),
            ],
        }
    }
}

impl ServerSettings {
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind
            .parse()
            .map_err(|e| ConfigError::Invalid(format!("server.bind '{}': {e}", self.bind)))
    }
}

/// Log output style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Multi-line, colored (terminal)
    #[default]
    Pretty,
    /// One line per event
    Compact,
    /// One JSON object per event (log shippers)
    Json,
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pretty => write!(f, "pretty"),
            Self::Compact => write!(f, "compact"),
            Self::Json => write!(f, "json"),
        }
    }
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format '{other}' (pretty, compact, json)")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingSettings {
    /// Default filter when neither `-v` nor `RUST_LOG` is given.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReportSettings {
    /// Worksheet name of generated workbooks.
    pub sheet_name: String,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            sheet_name: "Relatorio".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub loader: LoaderConfig,
    pub report: ReportSettings,
}

impl Settings {
    /// Get the settings file path
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("invaudit");
        config_dir.join("settings.toml")
    }

    /// Load an explicit settings file, or the default one if it exists.
    /// A missing default file means defaults; a missing explicit file is an error.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::load_from(path),
            None => {
                let path = Self::config_path();
                if path.exists() {
                    Self::load_from(&path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&contents, &path.display().to_string())
    }

    pub fn from_toml(input: &str) -> Result<Self, ConfigError> {
        Self::parse(input, "settings")
    }

    fn parse(input: &str, origin: &str) -> Result<Self, ConfigError> {
        let settings: Settings = toml::from_str(input).map_err(|e| ConfigError::Parse {
            origin: origin.to_string(),
            message: e.to_string(),
        })?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.bind_addr()?;
        if self.server.max_upload_bytes == 0 {
            return Err(ConfigError::Invalid(
                "server.max_upload_bytes must be greater than 0".into(),
            ));
        }
        if self.logging.level.trim().is_empty() {
            return Err(ConfigError::Invalid("logging.level must not be empty".into()));
        }
        if self.report.sheet_name.trim().is_empty() {
            return Err(ConfigError::Invalid("report.sheet_name must not be empty".into()));
        }
        self.loader
            .validate()
            .map_err(|e| ConfigError::Invalid(format!("loader: {e}")))?;
        Ok(())
    }

    /// Get the config file path for display
    pub fn config_path_display() -> String {
        Self::config_path().to_string_lossy().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
[server]
bind = "0.0.0.0:9000"
max_upload_bytes = 1048576
allowed_origins = ["https://inventario.example.com"]

[logging]
level = "debug"
format = "json"

[loader]
skip_blank_rows = false

[loader.aliases]
quantidade = ["quantidade", "contado"]

[loader.official]
header_row = 3

[report]
sheet_name = "Auditoria"
"#;

    #[test]
    fn empty_file_is_defaults() {
        let settings = Settings::from_toml("").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.server.bind, "127.0.0.1:8000");
        assert_eq!(settings.server.max_upload_bytes, 25 * 1024 * 1024);
        assert_eq!(settings.report.sheet_name, "Relatorio");
        assert_eq!(settings.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn parse_all_sections() {
        let settings = Settings::from_toml(FULL).unwrap();
        assert_eq!(settings.server.bind_addr().unwrap().port(), 9000);
        assert_eq!(settings.server.allowed_origins.len(), 1);
        assert_eq!(settings.logging.level, "debug");
        assert_eq!(settings.logging.format, LogFormat::Json);
        assert!(!settings.loader.skip_blank_rows);
        assert_eq!(settings.loader.aliases.quantidade, vec!["quantidade", "contado"]);
        assert_eq!(settings.loader.aliases.cod, vec!["cod", "codigo", "material", "sku"]);
        assert_eq!(settings.loader.official.header_row, 3);
        assert_eq!(settings.report.sheet_name, "Auditoria");
    }

    #[test]
    fn reject_bad_bind() {
        let err = Settings::from_toml("[server]\nbind = \"localhost\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        assert!(err.to_string().contains("server.bind"));
    }

    #[test]
    fn reject_zero_upload_limit() {
        let err = Settings::from_toml("[server]\nmax_upload_bytes = 0\n").unwrap_err();
        assert!(err.to_string().contains("max_upload_bytes"));
    }

    #[test]
    fn reject_empty_alias_list() {
        let err = Settings::from_toml("[loader.aliases]\ncod = []\n").unwrap_err();
        assert!(err.to_string().contains("loader"));
        assert!(err.to_string().contains("aliases.cod"));
    }

    #[test]
    fn reject_unknown_section() {
        let err = Settings::from_toml("[servr]\nbind = \"127.0.0.1:1\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn log_format_from_str() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert!("xml".parse::<LogFormat>().is_err());
        assert_eq!(LogFormat::Compact.to_string(), "compact");
    }

    #[test]
    fn load_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(&path, FULL).unwrap();
        let settings = Settings::load(Some(&path)).unwrap();
        assert_eq!(settings.report.sheet_name, "Auditoria");
    }

    #[test]
    fn load_missing_explicit_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = Settings::load(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn config_path_ends_with_app_dir() {
        let path = Settings::config_path();
        assert!(path.ends_with("invaudit/settings.toml"));
    }
}
