// Excel import (xlsx, xls, xlsb, ods) and export (xlsx only)
//
// Import: first sheet only, every cell rendered to text. Position matters
//         (the official WMS report puts its header on a fixed row), so the
//         range start offset is honoured and leading blank rows are kept.
// Export: one sheet, every cell centered with wrap, widths sized to content.

use std::io::Cursor;
use std::path::Path;

use calamine::{open_workbook_auto, open_workbook_auto_from_rs, Data, Range, Reader, Sheets};
use invaudit_recon::{RawTable, Table};
use rust_xlsxwriter::{Format, FormatAlign, Workbook, Worksheet};
use tracing::debug;

use crate::error::IoError;

/// Row cap for a single import. Inventory exports are far below this.
const MAX_ROWS: usize = 1_048_576;
const MAX_COLS: usize = 16_384;

const MIN_COLUMN_WIDTH: f64 = 12.0;
const MAX_COLUMN_WIDTH: f64 = 60.0;

// ---------------------------------------------------------------------------
// Import
// ---------------------------------------------------------------------------

/// Read the first sheet of a workbook file.
pub fn read(path: &Path) -> Result<RawTable, IoError> {
    let workbook = open_workbook_auto(path).map_err(|e| IoError::Read(e.to_string()))?;
    first_sheet(workbook)
}

/// Read the first sheet of an in-memory workbook (format sniffed from content).
pub fn read_bytes(bytes: &[u8]) -> Result<RawTable, IoError> {
    let workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| IoError::Read(e.to_string()))?;
    first_sheet(workbook)
}

fn first_sheet<RS>(mut workbook: Sheets<RS>) -> Result<RawTable, IoError>
where
    RS: std::io::Read + std::io::Seek,
{
    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or(IoError::EmptyWorkbook)?;
    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| IoError::Read(format!("sheet '{sheet_name}': {e}")))?;
    let raw = range_to_raw(&range);
    debug!(sheet = %sheet_name, rows = raw.len(), cols = raw.width(), "xlsx sheet read");
    Ok(raw)
}

fn range_to_raw(range: &Range<Data>) -> RawTable {
    let (height, width) = range.get_size();
    if height == 0 || width == 0 {
        return RawTable::default();
    }

    // Range start offset (data may not begin at A1)
    let (start_row, start_col) = range.start().unwrap_or((0, 0));
    let start_row = start_row as usize;
    let start_col = start_col as usize;

    let total_rows = (start_row + height).min(MAX_ROWS);
    let total_cols = (start_col + width).min(MAX_COLS);
    let mut cells = vec![vec![String::new(); total_cols]; total_rows];

    for (row_idx, row) in range.rows().enumerate() {
        let target_row = start_row + row_idx;
        if target_row >= total_rows {
            break;
        }
        for (col_idx, cell) in row.iter().enumerate() {
            let target_col = start_col + col_idx;
            if target_col >= total_cols {
                break;
            }
            cells[target_row][target_col] = cell_text(cell);
        }
    }

    RawTable::new(cells)
}

/// Render one cell as text the way a user reading the sheet would see it.
pub fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        // Format nicely: integers without decimals
        Data::Float(n) => {
            if n.fract() == 0.0 && n.abs() < 1e15 {
                format!("{}", *n as i64)
            } else {
                format!("{}", n)
            }
        }
        Data::Int(n) => format!("{}", n),
        Data::Bool(b) => (if *b { "TRUE" } else { "FALSE" }).to_string(),
        Data::Error(e) => format!("#{:?}", e),
        // Serial number; the calamine `dates` feature is not enabled.
        Data::DateTime(dt) => format!("{}", dt.as_f64()),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
    }
}

// ---------------------------------------------------------------------------
// Export
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct XlsxOptions {
    pub sheet_name: String,
    /// Columns whose parseable values are written as numbers, not text.
    pub numeric_columns: Vec<String>,
}

impl Default for XlsxOptions {
    fn default() -> Self {
        Self {
            sheet_name: "Relatorio".to_string(),
            numeric_columns: vec!["diferenca".to_string()],
        }
    }
}

/// Column width for the longest value in a column:
/// `min(max(12, floor(max_len * 1.2)), 60)`.
pub fn column_width(max_len: usize) -> f64 {
    let scaled = (max_len as f64 * 1.2).floor();
    scaled.max(MIN_COLUMN_WIDTH).min(MAX_COLUMN_WIDTH)
}

/// Write a table as a single-sheet workbook and return the file bytes.
pub fn write_bytes(table: &Table, options: &XlsxOptions) -> Result<Vec<u8>, IoError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook
        .add_worksheet()
        .set_name(&options.sheet_name)
        .map_err(|e| IoError::Write(format!("sheet name '{}': {e}", options.sheet_name)))?;

    write_sheet(worksheet, table, options)?;

    workbook
        .save_to_buffer()
        .map_err(|e| IoError::Write(format!("failed to save XLSX: {e}")))
}

fn write_sheet(worksheet: &mut Worksheet, table: &Table, options: &XlsxOptions) -> Result<(), IoError> {
    let body = Format::new()
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::VerticalCenter)
        .set_text_wrap();
    let header = body.clone().set_bold();

    let numeric: Vec<bool> = table
        .columns
        .iter()
        .map(|c| options.numeric_columns.iter().any(|n| n == c))
        .collect();
    let mut max_len: Vec<usize> = table.columns.iter().map(|c| c.chars().count()).collect();

    for (col, name) in table.columns.iter().enumerate() {
        worksheet
            .write_string_with_format(0, col as u16, name, &header)
            .map_err(|e| IoError::Write(e.to_string()))?;
    }

    for (row_idx, row) in table.rows.iter().enumerate() {
        let row32 = (row_idx + 1) as u32;
        for (col, value) in row.iter().enumerate() {
            let col16 = col as u16;
            max_len[col] = max_len[col].max(value.chars().count());
            if value.is_empty() {
                worksheet
                    .write_blank(row32, col16, &body)
                    .map_err(|e| IoError::Write(e.to_string()))?;
                continue;
            }
            match value.parse::<f64>() {
                Ok(n) if numeric[col] && n.is_finite() => {
                    worksheet
                        .write_number_with_format(row32, col16, n, &body)
                        .map_err(|e| IoError::Write(e.to_string()))?;
                }
                _ => {
                    worksheet
                        .write_string_with_format(row32, col16, value, &body)
                        .map_err(|e| IoError::Write(e.to_string()))?;
                }
            }
        }
    }

    for (col, len) in max_len.iter().enumerate() {
        worksheet
            .set_column_width(col as u16, column_width(*len))
            .map_err(|e| IoError::Write(e.to_string()))?;
    }

    Ok(())
}
