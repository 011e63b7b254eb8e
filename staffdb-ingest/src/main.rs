//! staffdb-ingest - Employee CSV import service
//!
//! Serves the upload form on `/` and the import endpoint on `/import`.
//! Reference tables are loaded from `departments.csv` and `jobs.csv` before
//! the listener starts.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use staffdb_common::config::{CompiledDefaults, ConfigOverrides, ServiceConfig, TomlConfig};
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use staffdb_ingest::api::BuildInfo;
use staffdb_ingest::{build_router, reference, AppState};

/// Command-line arguments for staffdb-ingest
#[derive(Parser, Debug)]
#[command(name = "staffdb-ingest")]
#[command(about = "Employee CSV import service")]
#[command(version)]
struct Args {
    /// TOML config file
    #[arg(short, long, env = "STAFFDB_CONFIG")]
    config: Option<PathBuf>,

    /// SQLite database file
    #[arg(short, long, env = "STAFFDB_DATABASE")]
    database: Option<PathBuf>,

    /// Directory containing departments.csv and jobs.csv
    #[arg(long, env = "STAFFDB_REFERENCE_DIR")]
    reference_dir: Option<PathBuf>,

    /// Directory where uploads are archived
    #[arg(long, env = "STAFFDB_UPLOADS_DIR")]
    uploads_dir: Option<PathBuf>,

    /// Address to bind
    #[arg(long, env = "STAFFDB_HOST")]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "STAFFDB_PORT")]
    port: Option<u16>,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            database: self.database.clone(),
            reference_dir: self.reference_dir.clone(),
            uploads_dir: self.uploads_dir.clone(),
            host: self.host.clone(),
            port: self.port,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "staffdb_ingest=info,staffdb_common=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let build = BuildInfo::current();
    info!(
        "Starting staffdb-ingest v{} [{}] built {} ({})",
        build.version, build.git_hash, build.build_timestamp, build.build_profile
    );

    let args = Args::parse();
    let file_config = TomlConfig::load_optional(args.config.as_deref())?;
    let config = ServiceConfig::resolve(
        args.overrides(),
        file_config,
        CompiledDefaults::for_current_platform(),
    );

    info!("Database path: {}", config.database.display());
    let pool = staffdb_common::db::init_database(&config.database)
        .await
        .context("Failed to open database")?;

    let report = reference::bootstrap_reference_data(&pool, &config)
        .await
        .context("Failed to load reference data")?;
    info!(
        departments = report.departments,
        jobs = report.jobs,
        "Reference data ready"
    );

    let state = AppState::new(pool).with_uploads_dir(config.uploads_dir.clone());
    let app = build_router(state);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
