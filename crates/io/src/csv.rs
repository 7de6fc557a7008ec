// CSV/TSV import/export

use std::path::Path;

use invaudit_recon::{RawTable, Table};
use tracing::debug;

use crate::error::IoError;

pub fn read(path: &Path) -> Result<RawTable, IoError> {
    let bytes = std::fs::read(path).map_err(|source| IoError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    read_bytes(&bytes)
}

pub fn read_tsv(path: &Path) -> Result<RawTable, IoError> {
    let bytes = std::fs::read(path).map_err(|source| IoError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    read_with_delimiter(&decode(bytes), b'\t')
}

/// Decode, sniff the delimiter and parse every record (no header handling).
pub fn read_bytes(bytes: &[u8]) -> Result<RawTable, IoError> {
    let content = decode(bytes.to_vec());
    let delimiter = sniff_delimiter(&content);
    read_with_delimiter(&content, delimiter)
}

/// Detect the most likely field delimiter by checking consistency across the first few lines.
///
/// For each candidate (tab, semicolon, comma, pipe), count fields per line. Lines with a
/// single field (report titles, blank lines) are ignored; the candidate whose most common
/// multi-field count repeats most, weighted by that count, wins.
fn sniff_delimiter(content: &str) -> u8 {
    let candidates: &[u8] = &[b'\t', b';', b',', b'|'];
    let sample_lines: Vec<&str> = content.lines().take(10).collect();

    if sample_lines.is_empty() {
        return b',';
    }

    let mut best = b',';
    let mut best_score = 0u64;

    for &delim in candidates {
        let counts: Vec<usize> = sample_lines
            .iter()
            .map(|line| {
                csv::ReaderBuilder::new()
                    .delimiter(delim)
                    .has_headers(false)
                    .flexible(true)
                    .from_reader(line.as_bytes())
                    .records()
                    .next()
                    .and_then(|r| r.ok())
                    .map(|r| r.len())
                    .unwrap_or(1)
            })
            .filter(|&c| c > 1)
            .collect();

        // Most frequent field count; wider wins a tie
        let Some((consistent, target)) = counts
            .iter()
            .map(|&c| (counts.iter().filter(|&&o| o == c).count(), c))
            .max()
        else {
            continue;
        };
        let score = consistent as u64 * target as u64;

        if score > best_score {
            best_score = score;
            best = delim;
        }
    }

    best
}

/// UTF-8 when valid (BOM stripped), otherwise Windows-1252, which is what
/// Excel writes for "CSV" on Portuguese-locale Windows.
fn decode(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(s) => match s.strip_prefix('\u{feff}') {
            Some(stripped) => stripped.to_string(),
            None => s,
        },
        Err(e) => {
            let bytes = e.into_bytes();
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            decoded.into_owned()
        }
    }
}

fn read_with_delimiter(content: &str, delimiter: u8) -> Result<RawTable, IoError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut cells = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| IoError::Read(e.to_string()))?;
        cells.push(record.iter().map(str::to_string).collect());
    }

    let raw = RawTable::new(cells);
    debug!(delimiter = %(delimiter as char).escape_default(), rows = raw.len(), "csv read");
    Ok(raw)
}

/// Header line plus one record per row, comma-separated UTF-8.
pub fn write_bytes(table: &Table) -> Result<Vec<u8>, IoError> {
    let mut writer = csv::WriterBuilder::new().from_writer(Vec::new());
    writer
        .write_record(&table.columns)
        .map_err(|e| IoError::Write(e.to_string()))?;
    for row in &table.rows {
        writer
            .write_record(row)
            .map_err(|e| IoError::Write(e.to_string()))?;
    }
    writer
        .into_inner()
        .map_err(|e| IoError::Write(e.to_string()))
}
