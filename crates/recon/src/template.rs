// Counting templates built from the official table.

use std::collections::HashSet;

use crate::bin_key::{BinKeyStrategy, TolerantBinKey};
use crate::model::{canonical_columns, CanonicalField, Table};

/// Official rows in canonical order with `quantidade` blanked for a blind
/// count. Notes are kept.
pub fn blind_template(official: &Table) -> Table {
    let mut out = Table::canonical();
    let columns: Vec<Option<usize>> = CanonicalField::ALL
        .iter()
        .map(|f| official.column_index(f.as_str()))
        .collect();

    for source in &official.rows {
        let row = CanonicalField::ALL
            .iter()
            .zip(&columns)
            .map(|(field, col)| match (field, col) {
                (CanonicalField::Quantidade, _) | (_, None) => String::new(),
                (_, Some(c)) => source[*c].clone(),
            })
            .collect();
        out.push_row(row);
    }
    out
}

/// One row per distinct non-empty `gaveta`, ordered by the tolerant bin key
/// (raw text breaks ties). Every other column is empty.
pub fn bin_template(official: &Table, strategy: &TolerantBinKey) -> Table {
    let mut seen = HashSet::new();
    let mut bins: Vec<String> = official
        .column_values(CanonicalField::Gaveta.as_str())
        .into_iter()
        .map(str::trim)
        .filter(|b| !b.is_empty() && seen.insert(*b))
        .map(str::to_string)
        .collect();
    bins.sort_by_cached_key(|b| (strategy.key(b), b.clone()));

    let width = canonical_columns().len();
    let mut out = Table::canonical();
    for bin in bins {
        let mut row = vec![String::new(); width];
        row[CanonicalField::Gaveta.index()] = bin;
        out.push_row(row);
    }
    out
}
