//! `invaudit compare | normalize | blank | bins`: file-based audit commands.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use invaudit_io::{read_table, render_table, write_table, OutputFormat, XlsxOptions};
use invaudit_recon::{Auditor, Table};
use tracing::info;

use crate::exit_codes::EXIT_RECON_DIVERGENT;
use crate::CliError;

pub const COMPARE_DEFAULT_OUTPUT: &str = "relatorio_auditoria_comparacao.xlsx";
pub const BLANK_DEFAULT_OUTPUT: &str = "relatorio_em_branco.xlsx";
pub const BINS_DEFAULT_OUTPUT: &str = "relatorio_gavetas.xlsx";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Xlsx,
    Csv,
    Json,
}

impl From<ReportFormat> for OutputFormat {
    fn from(format: ReportFormat) -> Self {
        match format {
            ReportFormat::Xlsx => OutputFormat::Xlsx,
            ReportFormat::Csv => OutputFormat::Csv,
            ReportFormat::Json => OutputFormat::Json,
        }
    }
}

/// Explicit `--format` wins, otherwise the output file extension decides.
pub fn resolve_format(explicit: Option<ReportFormat>, output: &Path) -> Result<OutputFormat, CliError> {
    match explicit {
        Some(format) => Ok(format.into()),
        None => OutputFormat::from_path(output).map_err(|e| {
            CliError::from_io(e).with_hint("use --format xlsx|csv|json or an .xlsx/.csv/.json output name")
        }),
    }
}

fn load(auditor: &Auditor, path: &Path) -> Result<Table, CliError> {
    let raw = read_table(path).map_err(CliError::from_io)?;
    auditor
        .normalize(&raw)
        .map_err(|e| CliError::from_recon(e, path))
}

fn save(table: &Table, output: &Path, format: OutputFormat, xlsx: &XlsxOptions) -> Result<(), CliError> {
    write_table(table, output, format, xlsx).map_err(CliError::from_io)?;
    eprintln!("wrote {}", output.display());
    Ok(())
}

// ============================================================================
// compare
// ============================================================================

pub struct CompareArgs {
    pub official: PathBuf,
    pub physical: PathBuf,
    pub output: Option<PathBuf>,
    pub format: Option<ReportFormat>,
    pub json: bool,
    pub fail_on_divergence: bool,
}

pub fn cmd_compare(auditor: &Auditor, xlsx: &XlsxOptions, args: CompareArgs) -> Result<(), CliError> {
    let official = load(auditor, &args.official)?;
    let physical = load(auditor, &args.physical)?;
    let report = auditor.reconcile(&official, &physical);

    // --json alone keeps the report on stdout and skips the file
    if !(args.json && args.output.is_none()) {
        let output = args
            .output
            .unwrap_or_else(|| PathBuf::from(COMPARE_DEFAULT_OUTPUT));
        let format = resolve_format(args.format, &output)?;
        if format == OutputFormat::Json {
            let bytes = invaudit_io::json::write_bytes(&report).map_err(CliError::from_io)?;
            std::fs::write(&output, bytes)
                .map_err(|e| CliError::io(format!("cannot write {}: {e}", output.display())))?;
            eprintln!("wrote {}", output.display());
        } else {
            save(&report.to_table(), &output, format, xlsx)?;
        }
    }

    if args.json {
        let json = serde_json::to_string_pretty(&report)
            .map_err(|e| CliError::io(format!("JSON serialization error: {e}")))?;
        println!("{json}");
    }

    let s = &report.summary;
    info!(rows = s.total_rows, keys = ?report.keys, "compare finished");
    eprintln!(
        "compare: {} rows, {} ok, {} divergent (quantidade {}, lote {}, observacao {}), \
         {} ausente_no_fisico, {} ausente_no_wms",
        s.total_rows,
        s.ok,
        s.divergent,
        s.quantidade_divergences,
        s.lote_divergences,
        s.observacao_divergences,
        s.ausente_no_fisico,
        s.ausente_no_wms,
    );

    if args.fail_on_divergence && !s.is_clean() {
        return Err(CliError {
            code: EXIT_RECON_DIVERGENT,
            message: format!("{} of {} rows are not OK", s.total_rows - s.ok, s.total_rows),
            hint: None,
        });
    }
    Ok(())
}

// ============================================================================
// normalize
// ============================================================================

/// Without `-o` the canonical table goes to stdout (CSV unless `--format json`).
pub fn cmd_normalize(
    auditor: &Auditor,
    xlsx: &XlsxOptions,
    input: PathBuf,
    output: Option<PathBuf>,
    format: Option<ReportFormat>,
) -> Result<(), CliError> {
    let table = load(auditor, &input)?;
    info!(rows = table.len(), input = %input.display(), "normalized");

    match output {
        Some(path) => {
            let format = resolve_format(format, &path)?;
            save(&table, &path, format, xlsx)
        }
        None => {
            let format = format.map(OutputFormat::from).unwrap_or(OutputFormat::Csv);
            if format == OutputFormat::Xlsx {
                return Err(CliError::args("refusing to write xlsx to stdout")
                    .with_hint("pass -o FILE.xlsx"));
            }
            let bytes = render_table(&table, format, xlsx).map_err(CliError::from_io)?;
            io::stdout()
                .lock()
                .write_all(&bytes)
                .map_err(|e| CliError::io(e.to_string()))
        }
    }
}

// ============================================================================
// blank / bins
// ============================================================================

pub fn cmd_blank(auditor: &Auditor, xlsx: &XlsxOptions, input: PathBuf, output: Option<PathBuf>) -> Result<(), CliError> {
    let raw = read_table(&input).map_err(CliError::from_io)?;
    let table = auditor
        .blind_template(&raw)
        .map_err(|e| CliError::from_recon(e, &input))?;
    let output = output.unwrap_or_else(|| PathBuf::from(BLANK_DEFAULT_OUTPUT));
    let format = resolve_format(None, &output)?;
    save(&table, &output, format, xlsx)?;
    eprintln!("blank: {} rows", table.len());
    Ok(())
}

pub fn cmd_bins(auditor: &Auditor, xlsx: &XlsxOptions, input: PathBuf, output: Option<PathBuf>) -> Result<(), CliError> {
    let raw = read_table(&input).map_err(CliError::from_io)?;
    let table = auditor
        .bin_template(&raw)
        .map_err(|e| CliError::from_recon(e, &input))?;
    let output = output.unwrap_or_else(|| PathBuf::from(BINS_DEFAULT_OUTPUT));
    let format = resolve_format(None, &output)?;
    save(&table, &output, format, xlsx)?;
    eprintln!("bins: {} distinct", table.len());
    Ok(())
}
