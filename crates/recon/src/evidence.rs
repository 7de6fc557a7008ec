use crate::model::{Dimension, ReconSummary, ReportRow, Status};

/// Compute summary statistics from classified report rows.
pub fn compute_summary(rows: &[ReportRow]) -> ReconSummary {
    let mut summary = ReconSummary {
        total_rows: rows.len(),
        ..ReconSummary::default()
    };

    for row in rows {
        match &row.status {
            Status::Ok => summary.ok += 1,
            Status::Divergent(dims) => {
                summary.divergent += 1;
                for dim in dims {
                    match dim {
                        Dimension::Quantidade => summary.quantidade_divergences += 1,
                        Dimension::Lote => summary.lote_divergences += 1,
                        Dimension::Observacao => summary.observacao_divergences += 1,
                    }
                }
            }
            Status::MissingInPhysical => summary.ausente_no_fisico += 1,
            Status::MissingInWms => summary.ausente_no_wms += 1,
        }
    }

    summary
}
