//! Layout detection: find the header row of a raw grid and map its columns
//! onto the canonical fields.
//!
//! Detectors are tried in order; the first one returning
//! [`Detection::Detected`] wins. [`AliasHeaderDetector`] always detects and
//! belongs at the end of the list.

use std::fmt;

use crate::config::{AliasTable, OfficialLayout};
use crate::model::{CanonicalField, RawTable};
use crate::text::{header_key, header_key_upper};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Detection {
    Detected { header_row: usize, data_start: usize },
    NotDetected,
}

/// Source column index for each canonical field, `None` when absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMap {
    sources: [Option<usize>; 6],
}

impl ColumnMap {
    pub fn get(&self, field: CanonicalField) -> Option<usize> {
        self.sources[field.index()]
    }

    pub fn set(&mut self, field: CanonicalField, column: usize) {
        self.sources[field.index()] = Some(column);
    }

    /// Number of canonical fields that resolved to a source column.
    pub fn resolved(&self) -> usize {
        self.sources.iter().filter(|s| s.is_some()).count()
    }
}

pub trait LayoutDetector: fmt::Debug + Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Decide whether `raw` has this layout. Must not fail: anything
    /// unexpected is `NotDetected`.
    fn detect(&self, raw: &RawTable) -> Detection;

    /// Map header cells onto canonical fields.
    fn resolve(&self, header: &[String]) -> ColumnMap;
}

// ---------------------------------------------------------------------------
// Official report
// ---------------------------------------------------------------------------

/// WMS report with title lines above the header and fixed column names.
#[derive(Debug, Clone)]
pub struct OfficialReportDetector {
    layout: OfficialLayout,
}

impl OfficialReportDetector {
    pub fn new(layout: OfficialLayout) -> Self {
        Self { layout }
    }

    fn header_present(header: &[String], wanted: &str) -> bool {
        let wanted_raw = wanted.trim();
        let wanted_norm = header_key_upper(wanted);
        header
            .iter()
            .any(|cell| cell.trim() == wanted_raw || header_key_upper(cell) == wanted_norm)
    }
}

impl LayoutDetector for OfficialReportDetector {
    fn name(&self) -> &'static str {
        "official_report"
    }

    fn detect(&self, raw: &RawTable) -> Detection {
        if !self.layout.enabled {
            return Detection::NotDetected;
        }
        let Some(header) = raw.row(self.layout.header_row) else {
            return Detection::NotDetected;
        };
        let all_present = self
            .layout
            .required_headers
            .iter()
            .all(|wanted| Self::header_present(header, wanted));
        if all_present {
            Detection::Detected {
                header_row: self.layout.header_row,
                data_start: self.layout.header_row + 1,
            }
        } else {
            Detection::NotDetected
        }
    }

    fn resolve(&self, header: &[String]) -> ColumnMap {
        let mut map = ColumnMap::default();
        for field in CanonicalField::ALL {
            let Some(name) = self.layout.columns.for_field(field) else {
                continue;
            };
            let name = name.trim();
            if let Some(col) = header.iter().position(|cell| cell.trim() == name) {
                map.set(field, col);
            }
        }
        map
    }
}

// ---------------------------------------------------------------------------
// Alias header (fallback)
// ---------------------------------------------------------------------------

/// First row is the header; columns are matched against per-field synonym
/// lists after accent/case/space normalization.
#[derive(Debug, Clone)]
pub struct AliasHeaderDetector {
    /// Normalized aliases, indexed like [`CanonicalField::ALL`].
    keys: Vec<Vec<String>>,
}

impl AliasHeaderDetector {
    pub fn new(aliases: &AliasTable) -> Self {
        let keys = CanonicalField::ALL
            .iter()
            .map(|f| aliases.for_field(*f).iter().map(|a| header_key(a)).collect())
            .collect();
        Self { keys }
    }
}

impl LayoutDetector for AliasHeaderDetector {
    fn name(&self) -> &'static str {
        "alias_header"
    }

    fn detect(&self, _raw: &RawTable) -> Detection {
        Detection::Detected {
            header_row: 0,
            data_start: 1,
        }
    }

    fn resolve(&self, header: &[String]) -> ColumnMap {
        let normalized: Vec<String> = header.iter().map(|h| header_key(h)).collect();
        let mut map = ColumnMap::default();
        for field in CanonicalField::ALL {
            // Alias order decides, not column order.
            let found = self.keys[field.index()]
                .iter()
                .find_map(|alias| normalized.iter().position(|h| h == alias));
            if let Some(col) = found {
                map.set(field, col);
            }
        }
        map
    }
}
