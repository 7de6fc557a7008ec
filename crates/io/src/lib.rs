// Spreadsheet I/O: files and uploads into raw grids, tables out as bytes.

pub mod csv;
pub mod error;
pub mod json;
pub mod xlsx;

use std::path::Path;

use invaudit_recon::{RawTable, Table};

pub use error::IoError;
pub use xlsx::XlsxOptions;

/// Input formats, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    /// xlsx, xlsm, xls, xlsb, ods (calamine)
    Workbook,
    /// Delimiter sniffed from content.
    Csv,
    Tsv,
}

impl InputFormat {
    pub fn from_extension(ext: &str) -> Result<Self, IoError> {
        match ext.to_ascii_lowercase().as_str() {
            "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => Ok(Self::Workbook),
            "csv" | "txt" => Ok(Self::Csv),
            "tsv" => Ok(Self::Tsv),
            other => Err(IoError::Unsupported {
                extension: other.to_string(),
            }),
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, IoError> {
        Self::from_extension(&extension_of(path))
    }
}

/// Output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Xlsx,
    Csv,
    Json,
}

impl OutputFormat {
    pub fn from_extension(ext: &str) -> Result<Self, IoError> {
        match ext.to_ascii_lowercase().as_str() {
            "xlsx" => Ok(Self::Xlsx),
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            other => Err(IoError::Unsupported {
                extension: other.to_string(),
            }),
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, IoError> {
        Self::from_extension(&extension_of(path))
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Xlsx => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            Self::Csv => "text/csv; charset=utf-8",
            Self::Json => "application/json",
        }
    }
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_string()
}

/// Read a spreadsheet file into a raw grid.
pub fn read_table(path: &Path) -> Result<RawTable, IoError> {
    match InputFormat::from_path(path)? {
        InputFormat::Workbook => {
            if !path.exists() {
                return Err(IoError::Open {
                    path: path.to_path_buf(),
                    source: std::io::Error::from(std::io::ErrorKind::NotFound),
                });
            }
            xlsx::read(path)
        }
        InputFormat::Csv => csv::read(path),
        InputFormat::Tsv => csv::read_tsv(path),
    }
}

/// Read uploaded content. The file name picks the reader; a missing or
/// unknown extension is tried as a workbook.
pub fn read_table_from_bytes(bytes: &[u8], file_name: Option<&str>) -> Result<RawTable, IoError> {
    let format = file_name
        .map(|name| InputFormat::from_path(Path::new(name)))
        .and_then(Result::ok)
        .unwrap_or(InputFormat::Workbook);
    match format {
        InputFormat::Workbook => xlsx::read_bytes(bytes),
        InputFormat::Csv | InputFormat::Tsv => csv::read_bytes(bytes),
    }
}

/// Render a table in the requested format.
pub fn render_table(table: &Table, format: OutputFormat, options: &XlsxOptions) -> Result<Vec<u8>, IoError> {
    match format {
        OutputFormat::Xlsx => xlsx::write_bytes(table, options),
        OutputFormat::Csv => csv::write_bytes(table),
        OutputFormat::Json => json::write_bytes(table),
    }
}

/// Render and write to `path`.
pub fn write_table(table: &Table, path: &Path, format: OutputFormat, options: &XlsxOptions) -> Result<(), IoError> {
    let bytes = render_table(table, format, options)?;
    std::fs::write(path, bytes).map_err(|e| IoError::Write(format!("{}: {e}", path.display())))
}
