use tracing::{debug, trace};

use crate::config::LoaderConfig;
use crate::error::ReconError;
use crate::layout::{AliasHeaderDetector, ColumnMap, Detection, LayoutDetector, OfficialReportDetector};
use crate::model::{CanonicalField, RawTable, Table};
use crate::text::extract_bin;

/// Turns raw grids into canonical six-column tables.
#[derive(Debug)]
pub struct Loader {
    detectors: Vec<Box<dyn LayoutDetector>>,
    skip_blank_rows: bool,
}

impl Loader {
    /// Official report detector first, alias header fallback last.
    pub fn new(config: &LoaderConfig) -> Self {
        Self::with_detectors(
            vec![
                Box::new(OfficialReportDetector::new(config.official.clone())),
                Box::new(AliasHeaderDetector::new(&config.aliases)),
            ],
            config.skip_blank_rows,
        )
    }

    pub fn with_detectors(detectors: Vec<Box<dyn LayoutDetector>>, skip_blank_rows: bool) -> Self {
        Self {
            detectors,
            skip_blank_rows,
        }
    }

    pub fn normalize(&self, raw: &RawTable) -> Result<Table, ReconError> {
        if raw.is_empty() {
            return Err(ReconError::NoHeader);
        }

        for detector in &self.detectors {
            let (header_row, data_start) = match detector.detect(raw) {
                Detection::Detected {
                    header_row,
                    data_start,
                } => (header_row, data_start),
                Detection::NotDetected => {
                    trace!(detector = detector.name(), "layout not detected");
                    continue;
                }
            };
            let Some(header) = raw.row(header_row) else {
                continue;
            };

            let map = detector.resolve(header);
            debug!(
                detector = detector.name(),
                header_row,
                data_start,
                resolved = map.resolved(),
                "layout detected"
            );
            for field in CanonicalField::ALL {
                match map.get(field) {
                    Some(col) => debug!(field = %field, source = %header[col], "column resolved"),
                    None => debug!(field = %field, "column missing, filled with empty values"),
                }
            }

            let (table, dropped) = self.project(raw, data_start, &map);
            if dropped > 0 {
                debug!(dropped, "rows with data only in unmapped columns skipped");
            }
            debug!(rows = table.len(), "normalized");
            return Ok(table);
        }

        Err(ReconError::NoHeader)
    }

    /// Copy mapped cells into canonical order: trimmed, empty when unmapped,
    /// `gaveta` reduced to its bin identifier. Also returns how many skipped
    /// rows still had text in unmapped columns.
    fn project(&self, raw: &RawTable, data_start: usize, map: &ColumnMap) -> (Table, usize) {
        let mut table = Table::canonical();
        let mut dropped = 0;
        for (offset, source) in raw.cells.iter().enumerate().skip(data_start) {
            let row: Vec<String> = CanonicalField::ALL
                .iter()
                .map(|field| {
                    let cell = map
                        .get(*field)
                        .and_then(|col| source.get(col))
                        .map(|v| v.trim())
                        .unwrap_or("");
                    match field {
                        CanonicalField::Gaveta => extract_bin(cell),
                        _ => cell.to_string(),
                    }
                })
                .collect();
            if self.skip_blank_rows && row.iter().all(String::is_empty) {
                if source.iter().any(|c| !c.trim().is_empty()) {
                    dropped += 1;
                    debug!(row = offset, "row has no mapped values, skipped");
                } else {
                    trace!(row = offset, "blank row skipped");
                }
                continue;
            }
            table.push_row(row);
        }
        (table, dropped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loader() -> Loader {
        Loader::new(&LoaderConfig::default())
    }

    #[test]
    fn official_layout_end_to_end() {
        let raw = RawTable::from_rows(vec![
            vec!["Relatório", "", "", "", ""],
            vec!["", "", "", "", ""],
            vec!["GAVETA (YX-Desc.)", "MATERIAL", "DESCRIÇÃO", "LOTE", "QTD.GAVETA"],
            vec!["2ZG-G61b", " 123 ", "Widget", "L1", "10"],
            vec!["NOHYPHEN", "124", "Gadget", "", "5kg"],
        ]);
        let table = loader().normalize(&raw).unwrap();
        assert_eq!(table.columns, crate::model::canonical_columns());
        assert_eq!(table.rows[0], vec!["G61b", "123", "Widget", "L1", "10", ""]);
        assert_eq!(table.rows[1], vec!["NOHYPHEN", "124", "Gadget", "", "5kg", ""]);
    }

    #[test]
    fn official_without_occupation_leaves_gaveta_empty() {
        let raw = RawTable::from_rows(vec![
            vec!["t"],
            vec!["t"],
            vec!["MATERIAL", "DESCRIÇÃO", "QTD.GAVETA"],
            vec!["1", "A", "2"],
        ]);
        let table = loader().normalize(&raw).unwrap();
        assert_eq!(table.rows, vec![vec!["", "1", "A", "", "2", ""]]);
    }

    #[test]
    fn clean_layout_uses_aliases() {
        let raw = RawTable::from_rows(vec![
            vec!["Ocupação", "SKU", "Nome", "Qtd", "Obs"],
            vec!["2ZG-A2b", "9", "X", "3", " conferido "],
        ]);
        let table = loader().normalize(&raw).unwrap();
        assert_eq!(table.rows, vec![vec!["A2b", "9", "X", "", "3", "conferido"]]);
    }

    #[test]
    fn duplicates_preserved() {
        let raw = RawTable::from_rows(vec![
            vec!["gaveta", "cod"],
            vec!["A1", "1"],
            vec!["A1", "1"],
        ]);
        assert_eq!(loader().normalize(&raw).unwrap().len(), 2);
    }

    #[test]
    fn quantities_keep_raw_text() {
        let raw = RawTable::from_rows(vec![vec!["cod", "quantidade"], vec!["1", "1.250,5"]]);
        let table = loader().normalize(&raw).unwrap();
        assert_eq!(table.value(0, "quantidade"), Some("1.250,5"));
    }

    #[test]
    fn ragged_rows_are_padded() {
        let raw = RawTable::from_rows(vec![vec!["cod", "produto", "lote"], vec!["1"]]);
        let table = loader().normalize(&raw).unwrap();
        assert_eq!(table.rows[0], vec!["", "1", "", "", "", ""]);
    }

    #[test]
    fn blank_rows_skipped_by_default() {
        let raw = RawTable::from_rows(vec![
            vec!["cod", "foo"],
            vec!["", "ignored column"],
            vec!["  ", ""],
            vec!["7", ""],
        ]);
        assert_eq!(loader().normalize(&raw).unwrap().len(), 1);

        let keep = Loader::new(&LoaderConfig {
            skip_blank_rows: false,
            ..LoaderConfig::default()
        });
        assert_eq!(keep.normalize(&raw).unwrap().len(), 3);
    }

    #[test]
    fn unmapped_only_rows_are_counted_when_skipped() {
        let raw = RawTable::from_rows(vec![
            vec!["cod", "total"],
            vec!["1", ""],
            vec!["", "Total geral: 40"],
            vec!["", ""],
        ]);
        let map = AliasHeaderDetector::new(&LoaderConfig::default().aliases)
            .resolve(raw.row(0).unwrap());
        let (table, dropped) = loader().project(&raw, 1, &map);
        assert_eq!(table.len(), 1);
        assert_eq!(dropped, 1);
    }

    #[test]
    fn header_only_gives_empty_table() {
        let raw = RawTable::from_rows(vec![vec!["cod"]]);
        let table = loader().normalize(&raw).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.columns.len(), 6);
    }

    #[test]
    fn empty_grid_is_not_tabular() {
        let err = loader().normalize(&RawTable::default()).unwrap_err();
        assert!(matches!(err, ReconError::NoHeader));
    }

    #[test]
    fn no_fallback_detector_means_no_header() {
        let only_official = Loader::with_detectors(
            vec![Box::new(OfficialReportDetector::new(Default::default()))],
            true,
        );
        let raw = RawTable::from_rows(vec![vec!["cod"], vec!["1"]]);
        assert!(matches!(only_official.normalize(&raw), Err(ReconError::NoHeader)));
    }
}
