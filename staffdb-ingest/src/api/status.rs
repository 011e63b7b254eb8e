//! Liveness and build identification endpoints

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;
use staffdb_common::db::EmployeeRepository;
use tracing::warn;

use crate::AppState;

const SERVICE_NAME: &str = "staffdb-ingest";

/// `GET /health` body
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub module: &'static str,
    pub version: &'static str,
    /// Employees currently stored; absent when the store is unreachable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employees: Option<i64>,
}

/// Build identification captured by `build.rs`
#[derive(Debug, Clone, Copy, Serialize)]
pub struct BuildInfo {
    pub version: &'static str,
    pub git_hash: &'static str,
    pub build_timestamp: &'static str,
    pub build_profile: &'static str,
}

impl BuildInfo {
    pub const fn current() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION"),
            git_hash: env!("GIT_HASH"),
            build_timestamp: env!("BUILD_TIMESTAMP"),
            build_profile: env!("BUILD_PROFILE"),
        }
    }
}

/// GET /health
///
/// Reports 503 when the employee store cannot be queried.
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthStatus>) {
    let (code, status, employees) = match EmployeeRepository::new(state.db).count().await {
        Ok(count) => (StatusCode::OK, "ok", Some(count)),
        Err(e) => {
            warn!("Health check could not reach the store: {}", e);
            (StatusCode::SERVICE_UNAVAILABLE, "unavailable", None)
        }
    };

    (
        code,
        Json(HealthStatus {
            status,
            module: SERVICE_NAME,
            version: env!("CARGO_PKG_VERSION"),
            employees,
        }),
    )
}

/// GET /api/buildinfo
pub async fn build_info() -> Json<BuildInfo> {
    Json(BuildInfo::current())
}

pub fn status_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/buildinfo", get(build_info))
}
