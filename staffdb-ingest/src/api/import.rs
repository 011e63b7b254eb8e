//! CSV import endpoint
//!
//! POST /import accepts `multipart/form-data` with the CSV in `csvfile` and
//! an optional `skip` flag (form field or query parameter).

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Multipart, Query, State},
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use std::path::Path;
use tracing::info;

use crate::{
    error::{ApiError, ApiResult},
    import::{ImportOptions, ImportPipeline, ImportSummary},
    AppState,
};

/// Largest accepted request body
pub const UPLOAD_LIMIT_BYTES: usize = 16 * 1024 * 1024;

/// File name the latest upload is archived under
pub const ARCHIVE_FILE_NAME: &str = "csvfile.csv";

/// Query parameters for POST /import
#[derive(Debug, Default, Deserialize)]
pub struct ImportQuery {
    pub skip: Option<String>,
}

/// Interpret a boolean-like form value
///
/// Absent and empty values, `0`, `false`, `off` and `no` are false; any
/// other value (an HTML checkbox sends `on`) is true.
pub fn parse_skip_flag(value: &str) -> bool {
    let value = value.trim();
    !(value.is_empty()
        || ["0", "false", "off", "no"]
            .iter()
            .any(|falsy| value.eq_ignore_ascii_case(falsy)))
}

/// POST /import
pub async fn import_csv(
    State(state): State<AppState>,
    Query(query): Query<ImportQuery>,
    mut multipart: Multipart,
) -> ApiResult<Json<ImportSummary>> {
    let mut payload: Option<Bytes> = None;
    let mut skip = query.skip.as_deref().map(parse_skip_flag).unwrap_or(false);

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("csvfile") => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read csvfile: {}", e)))?;
                payload = Some(bytes);
            }
            Some("skip") => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read skip: {}", e)))?;
                skip = parse_skip_flag(&value);
            }
            _ => {}
        }
    }

    let payload =
        payload.ok_or_else(|| ApiError::BadRequest("Missing 'csvfile' field".to_string()))?;

    if let Some(dir) = &state.uploads_dir {
        archive_upload(dir, &payload).await?;
    }

    let options = ImportOptions {
        skip_existing: skip,
    };
    let summary = ImportPipeline::sqlite(&state.db)
        .run(&payload, options)
        .await?;

    info!(
        bytes = payload.len(),
        skip_existing = skip,
        processed = summary.processed,
        total = summary.total,
        errors = summary.errors.len(),
        skipped = summary.skipped,
        "CSV import finished"
    );

    Ok(Json(summary))
}

/// Write the raw upload to `<dir>/csvfile.csv`, replacing the previous one
async fn archive_upload(dir: &Path, payload: &[u8]) -> ApiResult<()> {
    tokio::fs::create_dir_all(dir).await?;
    tokio::fs::write(dir.join(ARCHIVE_FILE_NAME), payload).await?;
    Ok(())
}

/// Build import routes
pub fn import_routes() -> Router<AppState> {
    Router::new()
        .route("/import", post(import_csv))
        .layer(DefaultBodyLimit::max(UPLOAD_LIMIT_BYTES))
}
