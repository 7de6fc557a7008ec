use std::fmt;

use serde::{Serialize, Serializer};

// ---------------------------------------------------------------------------
// Canonical schema
// ---------------------------------------------------------------------------

/// One of the six canonical inventory columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    Gaveta,
    Cod,
    Produto,
    Lote,
    Quantidade,
    Observacao,
}

impl CanonicalField {
    /// Canonical column order.
    pub const ALL: [CanonicalField; 6] = [
        Self::Gaveta,
        Self::Cod,
        Self::Produto,
        Self::Lote,
        Self::Quantidade,
        Self::Observacao,
    ];

    /// Join-key candidates, in priority order.
    pub const KEY_CANDIDATES: [CanonicalField; 3] = [Self::Gaveta, Self::Cod, Self::Produto];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gaveta => "gaveta",
            Self::Cod => "cod",
            Self::Produto => "produto",
            Self::Lote => "lote",
            Self::Quantidade => "quantidade",
            Self::Observacao => "observacao",
        }
    }

    /// Position of this field in [`CanonicalField::ALL`].
    pub fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn canonical_columns() -> Vec<String> {
    CanonicalField::ALL.iter().map(|f| f.as_str().to_string()).collect()
}

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// Rectangular grid of string cells exactly as read from a spreadsheet.
///
/// No row is special: the loader decides where the header sits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    pub cells: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(cells: Vec<Vec<String>>) -> Self {
        Self { cells }
    }

    /// Build a grid from anything string-like. Handy in tests and adapters.
    pub fn from_rows<R, S>(rows: impl IntoIterator<Item = R>) -> Self
    where
        R: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            cells: rows
                .into_iter()
                .map(|r| r.into_iter().map(Into::into).collect())
                .collect(),
        }
    }

    pub fn row(&self, idx: usize) -> Option<&[String]> {
        self.cells.get(idx).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Widest row length.
    pub fn width(&self) -> usize {
        self.cells.iter().map(Vec::len).max().unwrap_or(0)
    }
}

// ---------------------------------------------------------------------------
// Table
// ---------------------------------------------------------------------------

/// Named-column string table. Rows are always `columns.len()` wide.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Empty table with the six canonical columns.
    pub fn canonical() -> Self {
        Self::new(canonical_columns())
    }

    pub fn with_rows(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let mut table = Self::new(columns);
        for row in rows {
            table.push_row(row);
        }
        table
    }

    /// Append a row, padding with empty cells or truncating to the column count.
    pub fn push_row(&mut self, mut row: Vec<String>) {
        row.resize(self.columns.len(), String::new());
        self.rows.push(row);
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn value(&self, row: usize, column: &str) -> Option<&str> {
        let col = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.get(col)).map(String::as_str)
    }

    /// All values of one column; empty strings when the column is absent.
    pub fn column_values(&self, column: &str) -> Vec<&str> {
        match self.column_index(column) {
            Some(col) => self.rows.iter().map(|r| r[col].as_str()).collect(),
            None => vec![""; self.rows.len()],
        }
    }

    /// Add `name` as an all-empty column if it is missing.
    /// Index of `name`, appending it as an all-empty column when absent.
    pub fn ensure_column(&mut self, name: &str) -> usize {
        if let Some(index) = self.column_index(name) {
            return index;
        }
        self.columns.push(name.to_string());
        for row in &mut self.rows {
            row.push(String::new());
        }
        self.columns.len() - 1
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Header row followed by data rows, as a raw grid.
    pub fn to_raw(&self) -> RawTable {
        let mut cells = Vec::with_capacity(self.rows.len() + 1);
        cells.push(self.columns.clone());
        cells.extend(self.rows.iter().cloned());
        RawTable { cells }
    }
}

// ---------------------------------------------------------------------------
// Reconciliation output
// ---------------------------------------------------------------------------

pub const STATUS_COLUMN: &str = "Status";
pub const PRESENCE_COLUMN: &str = "presenca";

/// Value columns of the report, between the keys and `Status`.
pub const REPORT_VALUE_COLUMNS: [&str; 7] = [
    "quantidade_wms",
    "quantidade_fisico",
    "diferenca",
    "lote_wms",
    "lote_fisico",
    "observacao_wms",
    "observacao_fisico",
];

/// Which side(s) of the outer join a report row came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Presence {
    Both,
    LeftOnly,
    RightOnly,
}

impl Presence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Both => "both",
            Self::LeftOnly => "left_only",
            Self::RightOnly => "right_only",
        }
    }
}

impl fmt::Display for Presence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A compared dimension that can diverge on a matched row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Quantidade,
    Lote,
    Observacao,
}

impl Dimension {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Quantidade => "quantidade",
            Self::Lote => "lote",
            Self::Observacao => "observacao",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Ok,
    /// Matched row with at least one failing dimension, in check order.
    Divergent(Vec<Dimension>),
    /// Official row with no physical counterpart.
    MissingInPhysical,
    /// Physical row with no official counterpart.
    MissingInWms,
}

impl Status {
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => f.write_str("OK"),
            Self::Divergent(dims) => {
                for (i, d) in dims.iter().enumerate() {
                    if i > 0 {
                        f.write_str(";")?;
                    }
                    f.write_str(d.as_str())?;
                }
                Ok(())
            }
            Self::MissingInPhysical => f.write_str("ausente_no_fisico"),
            Self::MissingInWms => f.write_str("ausente_no_wms"),
        }
    }
}

impl Serialize for Status {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportRow {
    /// Key values, aligned with [`ReconReport::keys`].
    pub keys: Vec<String>,
    pub quantidade_wms: String,
    pub quantidade_fisico: String,
    pub diferenca: String,
    pub lote_wms: String,
    pub lote_fisico: String,
    pub observacao_wms: String,
    pub observacao_fisico: String,
    pub status: Status,
    pub presence: Presence,
}

impl ReportRow {
    fn value_cells(&self) -> [&str; 7] {
        [
            self.quantidade_wms.as_str(),
            self.quantidade_fisico.as_str(),
            self.diferenca.as_str(),
            self.lote_wms.as_str(),
            self.lote_fisico.as_str(),
            self.observacao_wms.as_str(),
            self.observacao_fisico.as_str(),
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconSummary {
    pub total_rows: usize,
    pub ok: usize,
    pub divergent: usize,
    pub quantidade_divergences: usize,
    pub lote_divergences: usize,
    pub observacao_divergences: usize,
    pub ausente_no_fisico: usize,
    pub ausente_no_wms: usize,
}

impl ReconSummary {
    /// True when every row is `OK`.
    pub fn is_clean(&self) -> bool {
        self.ok == self.total_rows
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportMeta {
    pub engine_version: String,
    pub run_at: String,
    pub official_rows: usize,
    pub physical_rows: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconReport {
    pub meta: ReportMeta,
    /// Join keys actually used, in priority order.
    pub keys: Vec<CanonicalField>,
    pub summary: ReconSummary,
    pub rows: Vec<ReportRow>,
}

impl ReconReport {
    /// Report column names: keys, value columns, `Status`, presence marker.
    pub fn columns(&self) -> Vec<String> {
        let mut columns: Vec<String> = self.keys.iter().map(|k| k.as_str().to_string()).collect();
        columns.extend(REPORT_VALUE_COLUMNS.iter().map(|c| c.to_string()));
        columns.push(STATUS_COLUMN.to_string());
        columns.push(PRESENCE_COLUMN.to_string());
        columns
    }

    /// Render the report as a flat string table in output column order.
    pub fn to_table(&self) -> Table {
        let mut table = Table::new(self.columns());
        for row in &self.rows {
            let mut cells: Vec<String> = row.keys.clone();
            cells.extend(row.value_cells().iter().map(|c| c.to_string()));
            cells.push(row.status.to_string());
            cells.push(row.presence.as_str().to_string());
            table.push_row(cells);
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_order() {
        assert_eq!(
            canonical_columns(),
            vec!["gaveta", "cod", "produto", "lote", "quantidade", "observacao"]
        );
        assert_eq!(CanonicalField::Quantidade.index(), 4);
    }

    #[test]
    fn status_display() {
        assert_eq!(Status::Ok.to_string(), "OK");
        assert_eq!(
            Status::Divergent(vec![Dimension::Quantidade, Dimension::Observacao]).to_string(),
            "quantidade;observacao"
        );
        assert_eq!(Status::MissingInPhysical.to_string(), "ausente_no_fisico");
        assert_eq!(Status::MissingInWms.to_string(), "ausente_no_wms");
    }

    #[test]
    fn push_row_pads_and_truncates() {
        let mut t = Table::new(vec!["a".into(), "b".into()]);
        t.push_row(vec!["1".into()]);
        t.push_row(vec!["1".into(), "2".into(), "3".into()]);
        assert_eq!(t.rows[0], vec!["1", ""]);
        assert_eq!(t.rows[1], vec!["1", "2"]);
    }

    #[test]
    fn ensure_column_appends_empty() {
        let mut t = Table::with_rows(vec!["cod".into()], vec![vec!["1".into()]]);
        assert_eq!(t.ensure_column("lote"), 1);
        assert_eq!(t.ensure_column("cod"), 0);
        assert_eq!(t.columns, vec!["cod", "lote"]);
        assert_eq!(t.value(0, "lote"), Some(""));
    }

    #[test]
    fn column_values_missing_column_is_empty() {
        let t = Table::with_rows(vec!["cod".into()], vec![vec!["1".into()], vec!["2".into()]]);
        assert_eq!(t.column_values("lote"), vec!["", ""]);
        assert_eq!(t.column_values("cod"), vec!["1", "2"]);
    }
}
