//! staffdb-ingest library interface
//!
//! Upload form, CSV import endpoint and reference-data bootstrap for the
//! employee store. Exposed as a library so integration tests can drive the
//! router directly.

pub mod api;
pub mod error;
pub mod import;
pub mod reference;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use sqlx::SqlitePool;
use std::path::PathBuf;
use tower_http::trace::TraceLayer;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Where raw upload payloads are archived; `None` disables archiving
    pub uploads_dir: Option<PathBuf>,
}

impl AppState {
    pub fn new(db: SqlitePool) -> Self {
        Self {
            db,
            uploads_dir: None,
        }
    }

    pub fn with_uploads_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.uploads_dir = Some(dir.into());
        self
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::ui_routes())
        .merge(api::import_routes())
        .merge(api::status_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
