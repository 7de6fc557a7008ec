use std::sync::Arc;

use invaudit_config::ReportSettings;
use invaudit_io::XlsxOptions;
use invaudit_recon::Auditor;

/// Shared, read-only request state.
#[derive(Clone)]
pub struct AppState {
    pub auditor: Arc<Auditor>,
    pub xlsx: Arc<XlsxOptions>,
}

impl AppState {
    pub fn new(auditor: Auditor, report: &ReportSettings) -> Self {
        Self {
            auditor: Arc::new(auditor),
            xlsx: Arc::new(XlsxOptions {
                sheet_name: report.sheet_name.clone(),
                ..XlsxOptions::default()
            }),
        }
    }
}
