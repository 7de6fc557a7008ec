use std::collections::HashMap;

use tracing::{debug, trace};

use crate::bin_key::{BinKey, BinKeyStrategy, StrictBinKey};
use crate::evidence::compute_summary;
use crate::model::{
    CanonicalField, Dimension, Presence, ReconReport, ReportMeta, ReportRow, Status, Table,
};
use crate::quantity::{format_difference, QuantityParser};

/// Join keys: the subset of `gaveta, cod, produto` present in both tables,
/// in that order. Falls back to `cod` alone.
pub fn select_keys(official: &Table, physical: &Table) -> Vec<CanonicalField> {
    let keys: Vec<CanonicalField> = CanonicalField::KEY_CANDIDATES
        .iter()
        .copied()
        .filter(|k| official.has_column(k.as_str()) && physical.has_column(k.as_str()))
        .collect();
    if keys.is_empty() {
        vec![CanonicalField::Cod]
    } else {
        keys
    }
}

// ---------------------------------------------------------------------------
// Side view
// ---------------------------------------------------------------------------

/// One input table, widened with any missing key or value column, with the
/// columns the join reads resolved up front.
struct Side {
    table: Table,
    keys: Vec<usize>,
    lote: usize,
    quantidade: usize,
    observacao: usize,
}

impl Side {
    fn new(table: &Table, keys: &[CanonicalField]) -> Self {
        let mut table = table.clone();
        let keys = keys.iter().map(|k| table.ensure_column(k.as_str())).collect();
        let lote = table.ensure_column(CanonicalField::Lote.as_str());
        let quantidade = table.ensure_column(CanonicalField::Quantidade.as_str());
        let observacao = table.ensure_column(CanonicalField::Observacao.as_str());
        Self {
            table,
            keys,
            lote,
            quantidade,
            observacao,
        }
    }

    fn key(&self, row: usize) -> Vec<&str> {
        let cells = &self.table.rows[row];
        self.keys.iter().map(|&c| cells[c].as_str()).collect()
    }

    fn cell(&self, row: usize, col: usize) -> &str {
        &self.table.rows[row][col]
    }
}

// ---------------------------------------------------------------------------
// Sort key
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum SortPart {
    Bin(BinKey),
    Text(String),
}

// ---------------------------------------------------------------------------
// Reconciler
// ---------------------------------------------------------------------------

/// Outer-joins an official table with a physical count and classifies rows.
#[derive(Debug, Clone, Default)]
pub struct Reconciler {
    quantity: QuantityParser,
    bins: StrictBinKey,
}

impl Reconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reconcile(&self, official: &Table, physical: &Table) -> ReconReport {
        let keys = select_keys(official, physical);
        let left = Side::new(official, &keys);
        let right = Side::new(physical, &keys);
        let rows = self.sorted(self.join(&left, &right), &keys);
        let summary = compute_summary(&rows);

        debug!(
            keys = ?keys.iter().map(|k| k.as_str()).collect::<Vec<_>>(),
            official_rows = official.len(),
            physical_rows = physical.len(),
            report_rows = rows.len(),
            ok = summary.ok,
            divergent = summary.divergent,
            "reconciled"
        );

        ReconReport {
            meta: ReportMeta {
                engine_version: env!("CARGO_PKG_VERSION").to_string(),
                run_at: chrono::Utc::now().to_rfc3339(),
                official_rows: official.len(),
                physical_rows: physical.len(),
            },
            keys,
            summary,
            rows,
        }
    }

    /// Official rows in input order (each expanded over its physical
    /// matches), then unmatched physical rows in input order.
    fn join(&self, left: &Side, right: &Side) -> Vec<ReportRow> {
        let mut index: HashMap<Vec<&str>, Vec<usize>> = HashMap::new();
        for r in 0..right.table.len() {
            index.entry(right.key(r)).or_default().push(r);
        }

        let mut matched_right = vec![false; right.table.len()];
        let mut rows = Vec::with_capacity(left.table.len().max(right.table.len()));

        for l in 0..left.table.len() {
            let key = left.key(l);
            match index.get(&key) {
                Some(partners) => {
                    for &r in partners {
                        matched_right[r] = true;
                        rows.push(self.both(left, l, right, r));
                    }
                }
                None => rows.push(self.one_sided(left, l, Presence::LeftOnly)),
            }
        }

        for (r, matched) in matched_right.iter().enumerate() {
            if !matched {
                rows.push(self.one_sided(right, r, Presence::RightOnly));
            }
        }

        rows
    }

    fn both(&self, left: &Side, l: usize, right: &Side, r: usize) -> ReportRow {
        let q_wms = left.cell(l, left.quantidade);
        let q_fis = right.cell(r, right.quantidade);
        let lote_wms = left.cell(l, left.lote);
        let lote_fis = right.cell(r, right.lote);
        let obs_wms = left.cell(l, left.observacao);
        let obs_fis = right.cell(r, right.observacao);

        let n_wms = self.quantity.parse(q_wms);
        let n_fis = self.quantity.parse(q_fis);

        let mut failing = Vec::new();
        // Two sides without a number agree; exactly one missing does not.
        match (n_wms, n_fis) {
            (None, None) => {}
            (Some(a), Some(b)) if a == b => {}
            _ => failing.push(Dimension::Quantidade),
        }
        if !same_text(lote_wms, lote_fis) {
            failing.push(Dimension::Lote);
        }
        if !same_text(obs_wms, obs_fis) {
            failing.push(Dimension::Observacao);
        }
        let status = if failing.is_empty() {
            Status::Ok
        } else {
            trace!(
                key = ?left.key(l),
                quantidade_wms = q_wms,
                quantidade_fisico = q_fis,
                failing = ?failing,
                "divergent row"
            );
            Status::Divergent(failing)
        };

        ReportRow {
            keys: left.key(l).into_iter().map(str::to_string).collect(),
            quantidade_wms: q_wms.to_string(),
            quantidade_fisico: q_fis.to_string(),
            diferenca: difference(n_wms, n_fis),
            lote_wms: lote_wms.to_string(),
            lote_fisico: lote_fis.to_string(),
            observacao_wms: obs_wms.to_string(),
            observacao_fisico: obs_fis.to_string(),
            status,
            presence: Presence::Both,
        }
    }

    fn one_sided(&self, side: &Side, row: usize, presence: Presence) -> ReportRow {
        let quantidade = side.cell(row, side.quantidade).to_string();
        let lote = side.cell(row, side.lote).to_string();
        let observacao = side.cell(row, side.observacao).to_string();
        let keys = side.key(row).into_iter().map(str::to_string).collect();

        match presence {
            Presence::RightOnly => ReportRow {
                keys,
                quantidade_wms: String::new(),
                quantidade_fisico: quantidade,
                diferenca: String::new(),
                lote_wms: String::new(),
                lote_fisico: lote,
                observacao_wms: String::new(),
                observacao_fisico: observacao,
                status: Status::MissingInWms,
                presence,
            },
            _ => ReportRow {
                keys,
                quantidade_wms: quantidade,
                quantidade_fisico: String::new(),
                diferenca: String::new(),
                lote_wms: lote,
                lote_fisico: String::new(),
                observacao_wms: observacao,
                observacao_fisico: String::new(),
                status: Status::MissingInPhysical,
                presence: Presence::LeftOnly,
            },
        }
    }

    /// Stable sort by keys; `gaveta` by strict bin decomposition, the rest
    /// lexically.
    fn sorted(&self, mut rows: Vec<ReportRow>, keys: &[CanonicalField]) -> Vec<ReportRow> {
        rows.sort_by_cached_key(|row| {
            keys.iter()
                .zip(&row.keys)
                .map(|(field, value)| match field {
                    CanonicalField::Gaveta => SortPart::Bin(self.bins.key(value)),
                    _ => SortPart::Text(value.clone()),
                })
                .collect::<Vec<_>>()
        });
        rows
    }
}

fn same_text(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

fn difference(official: Option<f64>, physical: Option<f64>) -> String {
    match (official, physical) {
        (Some(o), Some(p)) => format_difference(p - o),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canonical(rows: &[[&str; 6]]) -> Table {
        Table::with_rows(
            crate::model::canonical_columns(),
            rows.iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect(),
        )
    }

    fn table(columns: &[&str], rows: &[&[&str]]) -> Table {
        Table::with_rows(
            columns.iter().map(|s| s.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect(),
        )
    }

    #[test]
    fn quantity_divergence() {
        let o = canonical(&[["G61b", "123", "Widget", "L1", "10", ""]]);
        let p = canonical(&[["G61b", "123", "Widget", "L1", "8", ""]]);
        let report = Reconciler::new().reconcile(&o, &p);
        assert_eq!(report.rows.len(), 1);
        let row = &report.rows[0];
        assert_eq!(row.quantidade_wms, "10");
        assert_eq!(row.quantidade_fisico, "8");
        assert_eq!(row.diferenca, "-2");
        assert_eq!(row.status.to_string(), "quantidade");
        assert_eq!(row.presence, Presence::Both);
    }

    #[test]
    fn matching_row_is_ok_ignoring_case_and_units() {
        let o = canonical(&[["A1", "1", "X", "l1", "5kg", "Conferido"]]);
        let p = canonical(&[["A1", "1", "X", " L1 ", "5", "conferido "]]);
        let report = Reconciler::new().reconcile(&o, &p);
        assert_eq!(report.rows[0].status, Status::Ok);
        assert_eq!(report.rows[0].diferenca, "0");
    }

    #[test]
    fn all_dimensions_in_order() {
        let o = canonical(&[["A1", "1", "X", "L1", "5", "a"]]);
        let p = canonical(&[["A1", "1", "X", "L2", "6", "b"]]);
        let report = Reconciler::new().reconcile(&o, &p);
        assert_eq!(report.rows[0].status.to_string(), "quantidade;lote;observacao");
    }

    #[test]
    fn unparseable_on_both_sides_is_ok() {
        let o = canonical(&[["A1", "1", "X", "", "n/a", ""]]);
        let p = canonical(&[["A1", "1", "X", "", "n/a", ""]]);
        let report = Reconciler::new().reconcile(&o, &p);
        assert_eq!(report.rows[0].status.to_string(), "OK");
        assert_eq!(report.rows[0].diferenca, "");
    }

    #[test]
    fn empty_quantity_on_both_sides_is_ok() {
        let o = canonical(&[["A1", "1", "X", "L", "", ""]]);
        let p = canonical(&[["A1", "1", "X", "L", "", ""]]);
        let report = Reconciler::new().reconcile(&o, &p);
        assert_eq!(report.rows[0].status, Status::Ok);
        assert_eq!(report.summary.quantidade_divergences, 0);
    }

    #[test]
    fn empty_quantity_on_one_side_diverges() {
        let o = canonical(&[["A1", "1", "X", "L", "4", ""]]);
        let p = canonical(&[["A1", "1", "X", "L", "", ""]]);
        let report = Reconciler::new().reconcile(&o, &p);
        assert_eq!(report.rows[0].status.to_string(), "quantidade");
        assert_eq!(report.rows[0].diferenca, "");

        let report = Reconciler::new().reconcile(&p, &o);
        assert_eq!(report.rows[0].status.to_string(), "quantidade");
    }

    #[test]
    fn presence_only_rows() {
        let o = canonical(&[["", "999", "", "", "3", ""]]);
        let p = canonical(&[["", "555", "", "", "4", ""]]);
        let report = Reconciler::new().reconcile(&o, &p);
        assert_eq!(report.rows.len(), 2);

        let left = report.rows.iter().find(|r| r.keys[1] == "999").unwrap();
        assert_eq!(left.status.to_string(), "ausente_no_fisico");
        assert_eq!(left.presence, Presence::LeftOnly);
        assert_eq!(left.quantidade_fisico, "");
        assert_eq!(left.lote_fisico, "");
        assert_eq!(left.observacao_fisico, "");
        assert_eq!(left.diferenca, "");

        let right = report.rows.iter().find(|r| r.keys[1] == "555").unwrap();
        assert_eq!(right.status.to_string(), "ausente_no_wms");
        assert_eq!(right.quantidade_wms, "");
        assert_eq!(right.quantidade_fisico, "4");
    }

    #[test]
    fn duplicate_keys_cross_product() {
        let o = canonical(&[
            ["A1", "1", "X", "", "1", ""],
            ["A1", "1", "X", "", "2", ""],
        ]);
        let p = canonical(&[
            ["A1", "1", "X", "", "1", ""],
            ["A1", "1", "X", "", "3", ""],
            ["A1", "1", "X", "", "4", ""],
        ]);
        let report = Reconciler::new().reconcile(&o, &p);
        assert_eq!(report.rows.len(), 6);
        assert!(report.rows.iter().all(|r| r.presence == Presence::Both));
        // Stable: join order survives the sort on equal keys.
        let pairs: Vec<(&str, &str)> = report
            .rows
            .iter()
            .map(|r| (r.quantidade_wms.as_str(), r.quantidade_fisico.as_str()))
            .collect();
        assert_eq!(
            pairs,
            vec![("1", "1"), ("1", "3"), ("1", "4"), ("2", "1"), ("2", "3"), ("2", "4")]
        );
    }

    #[test]
    fn sorted_by_strict_bin_then_lexical() {
        let o = canonical(&[
            ["A10", "1", "X", "", "1", ""],
            ["A2", "2", "X", "", "1", ""],
            ["B1", "1", "X", "", "1", ""],
            ["??", "1", "X", "", "1", ""],
            ["A2", "1", "X", "", "1", ""],
        ]);
        let report = Reconciler::new().reconcile(&o, &Table::canonical());
        let order: Vec<(&str, &str)> = report
            .rows
            .iter()
            .map(|r| (r.keys[0].as_str(), r.keys[1].as_str()))
            .collect();
        assert_eq!(
            order,
            vec![("??", "1"), ("A2", "1"), ("A2", "2"), ("A10", "1"), ("B1", "1")]
        );
    }

    #[test]
    fn keys_restricted_to_common_columns() {
        let o = table(&["cod", "produto", "quantidade"], &[&["1", "X", "2"]]);
        let p = table(&["gaveta", "cod", "quantidade"], &[&["A1", "1", "2"]]);
        assert_eq!(select_keys(&o, &p), vec![CanonicalField::Cod]);

        let report = Reconciler::new().reconcile(&o, &p);
        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.rows[0].status, Status::Ok);
        assert_eq!(
            report.columns()[..2],
            ["cod".to_string(), "quantidade_wms".to_string()]
        );
    }

    #[test]
    fn falls_back_to_cod_when_no_common_key() {
        let o = table(&["gaveta", "quantidade"], &[&["A1", "2"]]);
        let p = table(&["produto", "quantidade"], &[&["X", "2"]]);
        assert_eq!(select_keys(&o, &p), vec![CanonicalField::Cod]);

        // Both sides get an empty `cod`, so they join on "".
        let report = Reconciler::new().reconcile(&o, &p);
        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.rows[0].keys, vec![""]);
        assert_eq!(report.rows[0].status, Status::Ok);
    }

    #[test]
    fn missing_value_columns_are_injected() {
        let o = table(&["cod"], &[&["1"]]);
        let p = table(&["cod", "quantidade"], &[&["1", "3"]]);
        let report = Reconciler::new().reconcile(&o, &p);
        assert_eq!(report.rows[0].status.to_string(), "quantidade");
        assert_eq!(report.rows[0].quantidade_fisico, "3");
    }

    #[test]
    fn empty_inputs() {
        let report = Reconciler::new().reconcile(&Table::canonical(), &Table::canonical());
        assert!(report.rows.is_empty());
        assert!(report.summary.is_clean());
        assert_eq!(report.keys.len(), 3);
    }

    #[test]
    fn report_table_columns() {
        let o = canonical(&[["A1", "1", "X", "", "1", ""]]);
        let report = Reconciler::new().reconcile(&o, &o);
        let t = report.to_table();
        assert_eq!(
            t.columns,
            vec![
                "gaveta",
                "cod",
                "produto",
                "quantidade_wms",
                "quantidade_fisico",
                "diferenca",
                "lote_wms",
                "lote_fisico",
                "observacao_wms",
                "observacao_fisico",
                "Status",
                "presenca",
            ]
        );
        assert_eq!(t.rows[0][10], "OK");
        assert_eq!(t.rows[0][11], "both");
    }
}
