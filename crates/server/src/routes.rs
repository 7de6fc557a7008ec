use axum::{
    extract::{Multipart, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use invaudit_io::{read_table_from_bytes, render_table, OutputFormat};
use invaudit_recon::{RawTable, Table};
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::error::ApiError;
use crate::state::AppState;

pub const COMPARE_FILE_NAME: &str = "relatorio_auditoria_comparacao.xlsx";
pub const BLANK_FILE_NAME: &str = "relatorio_em_branco.xlsx";
pub const BINS_FILE_NAME: &str = "relatorio_gavetas.xlsx";

/// Form field for the WMS export, then its older alias.
const OFFICIAL_FIELDS: [&str; 2] = ["planilha_oficial", "wms"];
/// Form field for the physical count, then its older alias.
const PHYSICAL_FIELDS: [&str; 2] = ["planilha_divergente", "fisico"];

// ---------------------------------------------------------------------------
// Upload form
// ---------------------------------------------------------------------------

struct Upload {
    field: String,
    file_name: Option<String>,
    bytes: Vec<u8>,
}

/// Every file part of the request, in memory.
struct UploadForm {
    uploads: Vec<Upload>,
}

impl UploadForm {
    async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut uploads = Vec::new();
        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            let file_name = field.file_name().map(str::to_string);
            let bytes = field.bytes().await?.to_vec();
            debug!(field = %name, file_name = ?file_name, bytes = bytes.len(), "upload received");
            uploads.push(Upload {
                field: name,
                file_name,
                bytes,
            });
        }
        Ok(Self { uploads })
    }

    /// First upload under any of `names`, in name priority order, as a raw grid.
    fn table(&self, names: &[&'static str; 2]) -> Result<RawTable, ApiError> {
        let primary = names[0];
        let upload = names
            .iter()
            .find_map(|n| self.uploads.iter().find(|u| u.field == *n))
            .ok_or(ApiError::MissingField(primary))?;
        read_table_from_bytes(&upload.bytes, upload.file_name.as_deref())
            .map_err(|source| ApiError::InvalidFile {
                field: primary,
                source,
            })
    }
}

/// Runs parsing, matching and rendering off the async workers.
async fn blocking<T, F>(work: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work).await?
}

fn render_xlsx(state: &AppState, table: &Table) -> Result<Vec<u8>, ApiError> {
    render_table(table, OutputFormat::Xlsx, &state.xlsx).map_err(ApiError::Render)
}

fn xlsx_attachment(bytes: Vec<u8>, file_name: &str) -> Response {
    let headers = [
        (header::CONTENT_TYPE, OutputFormat::Xlsx.content_type().to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{file_name}\""),
        ),
    ];
    (headers, bytes).into_response()
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// `POST /compare`: WMS export + physical count → reconciliation workbook.
pub async fn compare(State(state): State<AppState>, multipart: Multipart) -> Result<Response, ApiError> {
    let form = UploadForm::read(multipart).await?;
    let bytes = blocking(move || {
        let official_raw = form.table(&OFFICIAL_FIELDS)?;
        let physical_raw = form.table(&PHYSICAL_FIELDS)?;

        let official = state
            .auditor
            .normalize(&official_raw)
            .map_err(|source| ApiError::Normalize {
                field: OFFICIAL_FIELDS[0],
                source,
            })?;
        let physical = state
            .auditor
            .normalize(&physical_raw)
            .map_err(|source| ApiError::Normalize {
                field: PHYSICAL_FIELDS[0],
                source,
            })?;

        let report = state.auditor.reconcile(&official, &physical);
        info!(
            rows = report.summary.total_rows,
            ok = report.summary.ok,
            divergent = report.summary.divergent,
            ausente_no_fisico = report.summary.ausente_no_fisico,
            ausente_no_wms = report.summary.ausente_no_wms,
            "compare"
        );
        render_xlsx(&state, &report.to_table())
    })
    .await?;
    Ok(xlsx_attachment(bytes, COMPARE_FILE_NAME))
}

/// `POST /blank` and `POST /blind-template`: counting sheet with quantities blanked.
pub async fn blind_template(State(state): State<AppState>, multipart: Multipart) -> Result<Response, ApiError> {
    let form = UploadForm::read(multipart).await?;
    let bytes = blocking(move || {
        let raw = form.table(&OFFICIAL_FIELDS)?;
        let table = state
            .auditor
            .blind_template(&raw)
            .map_err(|source| ApiError::Normalize {
                field: OFFICIAL_FIELDS[0],
                source,
            })?;
        info!(rows = table.len(), "blind template");
        render_xlsx(&state, &table)
    })
    .await?;
    Ok(xlsx_attachment(bytes, BLANK_FILE_NAME))
}

/// `POST /bin-template`: one empty row per distinct bin.
pub async fn bin_template(State(state): State<AppState>, multipart: Multipart) -> Result<Response, ApiError> {
    let form = UploadForm::read(multipart).await?;
    let bytes = blocking(move || {
        let raw = form.table(&OFFICIAL_FIELDS)?;
        let table = state
            .auditor
            .bin_template(&raw)
            .map_err(|source| ApiError::Normalize {
                field: OFFICIAL_FIELDS[0],
                source,
            })?;
        info!(bins = table.len(), "bin template");
        render_xlsx(&state, &table)
    })
    .await?;
    Ok(xlsx_attachment(bytes, BINS_FILE_NAME))
}

/// `GET /health`
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
