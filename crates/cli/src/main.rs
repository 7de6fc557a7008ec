// invaudit CLI - WMS export vs physical count reconciliation

mod audit;
mod exit_codes;
mod logging;

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use invaudit_config::{ConfigError, LogFormat, Settings};
use invaudit_io::{IoError, XlsxOptions};
use invaudit_recon::{Auditor, ReconError};
use invaudit_server::ServerError;

use audit::{CompareArgs, ReportFormat};
use exit_codes::{
    EXIT_ERROR, EXIT_INVALID_CONFIG, EXIT_INVALID_FILE, EXIT_IO, EXIT_SERVE, EXIT_SUCCESS, EXIT_USAGE,
};
use logging::{init_logging, LogConfig};

#[derive(Parser)]
#[command(name = "invaudit")]
#[command(about = "Reconcile a WMS stock export against a physical count")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// Settings file (default: <config dir>/invaudit/settings.toml)
    #[arg(long, global = true, env = "INVAUDIT_SETTINGS")]
    settings: Option<PathBuf>,

    /// More logging (-v debug, -vv trace with module paths)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Log output style: pretty, compact or json
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,

    /// Plain log output without ANSI colors
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile the WMS export against the physical count
    #[command(after_help = "\
Exit code 10 (with --fail-on-divergence) means at least one row is not OK.

Examples:
  invaudit compare wms.xlsx contagem.xlsx
  invaudit compare wms.xlsx contagem.csv -o auditoria.csv
  invaudit compare wms.xlsx contagem.xlsx --json | jq .summary
  invaudit compare wms.xlsx contagem.xlsx --fail-on-divergence")]
    Compare {
        /// Official WMS export
        official: PathBuf,

        /// Physical count sheet
        physical: PathBuf,

        /// Report file (default: relatorio_auditoria_comparacao.xlsx)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Report format (inferred from the output extension if not specified)
        #[arg(long, short = 'f', value_enum)]
        format: Option<ReportFormat>,

        /// Print the full report as JSON to stdout (no file unless -o is given)
        #[arg(long)]
        json: bool,

        /// Exit non-zero when any row is not OK
        #[arg(long)]
        fail_on_divergence: bool,
    },

    /// Map a sheet onto the six canonical columns
    #[command(after_help = "\
Examples:
  invaudit normalize wms.xlsx
  invaudit normalize contagem.csv -o contagem_normalizada.xlsx
  invaudit normalize wms.xlsx --format json")]
    Normalize {
        input: PathBuf,

        /// Output file (omit for stdout)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        #[arg(long, short = 'f', value_enum)]
        format: Option<ReportFormat>,
    },

    /// Counting sheet from the WMS export, quantities blanked
    Blank {
        official: PathBuf,

        /// Output file (default: relatorio_em_branco.xlsx)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// One empty row per distinct bin of the WMS export
    Bins {
        official: PathBuf,

        /// Output file (default: relatorio_gavetas.xlsx)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Parse and validate a settings file without running anything
    ValidateConfig {
        path: PathBuf,
    },

    /// Start the HTTP service
    Serve {
        /// Listen address (overrides [server] bind)
        #[arg(long)]
        bind: Option<SocketAddr>,
    },
}

fn long_version() -> &'static str {
    if cfg!(debug_assertions) {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nengine:  invaudit-recon ", env!("CARGO_PKG_VERSION"),
            "\nbuild:   debug",
            "\ntarget:  ", env!("TARGET"),
        )
    } else {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nengine:  invaudit-recon ", env!("CARGO_PKG_VERSION"),
            "\nbuild:   release",
            "\ntarget:  ", env!("TARGET"),
        )
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    // validate-config must not depend on the ambient settings file
    if let Commands::ValidateConfig { path } = &cli.command {
        return cmd_validate_config(path);
    }

    let settings = Settings::load(cli.settings.as_deref()).map_err(CliError::from_config)?;

    let log_format = cli.log_format.unwrap_or(settings.logging.format);
    init_logging(
        &LogConfig::from_verbosity(cli.verbose, &settings.logging.level)
            .with_format(log_format)
            .with_target(cli.verbose >= 2)
            .with_ansi(!cli.no_color),
    );

    let auditor = Auditor::new(&settings.loader)
        .map_err(|e| CliError { code: EXIT_INVALID_CONFIG, message: format!("loader: {e}"), hint: None })?;
    let xlsx = XlsxOptions {
        sheet_name: settings.report.sheet_name.clone(),
        ..XlsxOptions::default()
    };

    match cli.command {
        Commands::Compare { official, physical, output, format, json, fail_on_divergence } => {
            audit::cmd_compare(
                &auditor,
                &xlsx,
                CompareArgs { official, physical, output, format, json, fail_on_divergence },
            )
        }
        Commands::Normalize { input, output, format } => {
            audit::cmd_normalize(&auditor, &xlsx, input, output, format)
        }
        Commands::Blank { official, output } => audit::cmd_blank(&auditor, &xlsx, official, output),
        Commands::Bins { official, output } => audit::cmd_bins(&auditor, &xlsx, official, output),
        Commands::Serve { bind } => cmd_serve(&settings, bind),
        Commands::ValidateConfig { .. } => Ok(()),
    }
}

// ============================================================================
// validate-config
// ============================================================================

fn cmd_validate_config(path: &Path) -> Result<(), CliError> {
    let settings = Settings::load_from(path).map_err(CliError::from_config)?;
    eprintln!(
        "valid: bind {}, {} origin(s), official layout {}, header row {}",
        settings.server.bind,
        settings.server.allowed_origins.len(),
        if settings.loader.official.enabled { "on" } else { "off" },
        settings.loader.official.header_row,
    );
    Ok(())
}

// ============================================================================
// serve
// ============================================================================

fn cmd_serve(settings: &Settings, bind: Option<SocketAddr>) -> Result<(), CliError> {
    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| CliError { code: EXIT_ERROR, message: format!("cannot start runtime: {e}"), hint: None })?;
    runtime
        .block_on(invaudit_server::serve(settings, bind))
        .map_err(CliError::from_server)
}

// ============================================================================
// errors
// ============================================================================

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn args(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: EXIT_IO, message: msg.into(), hint: None }
    }

    pub fn from_io(err: IoError) -> Self {
        match err {
            IoError::Unsupported { .. } => Self::args(err.to_string())
                .with_hint("inputs: xlsx, xlsm, xls, xlsb, ods, csv, txt, tsv; outputs: xlsx, csv, json"),
            IoError::Open { .. } | IoError::Write(_) => Self::io(err.to_string()),
            IoError::Read(_) | IoError::EmptyWorkbook => {
                Self { code: EXIT_INVALID_FILE, message: err.to_string(), hint: None }
            }
        }
    }

    pub fn from_recon(err: ReconError, path: &Path) -> Self {
        let hint = match &err {
            ReconError::NoHeader => Some(
                "the first row must hold column names (gaveta, cod, produto, lote, quantidade, observacao)"
                    .to_string(),
            ),
            _ => None,
        };
        Self {
            code: EXIT_INVALID_FILE,
            message: format!("{}: {err}", path.display()),
            hint,
        }
    }

    pub fn from_config(err: ConfigError) -> Self {
        let hint = match &err {
            ConfigError::Read { .. } => Some(format!(
                "settings are read from --settings or {}",
                Settings::config_path_display()
            )),
            _ => None,
        };
        Self { code: EXIT_INVALID_CONFIG, message: err.to_string(), hint }
    }

    pub fn from_server(err: ServerError) -> Self {
        match err {
            ServerError::Config(e) => Self::from_config(e),
            ServerError::Loader(e) => {
                Self { code: EXIT_INVALID_CONFIG, message: format!("loader: {e}"), hint: None }
            }
            ServerError::Bind { .. } => Self { code: EXIT_SERVE, message: err.to_string(), hint: None }
                .with_hint("is another process listening? try --bind 127.0.0.1:0"),
            ServerError::Origin(_) | ServerError::Serve(_) => {
                Self { code: EXIT_SERVE, message: err.to_string(), hint: None }
            }
        }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}
