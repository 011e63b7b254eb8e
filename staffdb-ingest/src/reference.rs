//! Reference data bootstrap
//!
//! Loads `departments.csv` and `jobs.csv` (`id,name`, no header) into the
//! store at startup. Only ids not already present are inserted, each table
//! in one transaction, so running the loader again changes nothing.

use sqlx::SqlitePool;
use staffdb_common::config::ServiceConfig;
use staffdb_common::db::{Department, Job, ReferenceEntity, ReferenceRepository};
use staffdb_common::{Error, Result};
use std::io::Read;
use std::path::Path;
use tracing::info;

/// Rows inserted per table by one bootstrap run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReferenceLoadReport {
    pub departments: usize,
    pub jobs: usize,
}

/// Parse `id,name` rows from a reader
///
/// `source` names the input in error messages.
pub fn parse_reference_csv<T: ReferenceEntity, R: Read>(reader: R, source: &str) -> Result<Vec<T>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut rows = Vec::new();
    for (index, result) in reader.records().enumerate() {
        let record = result?;
        let line = index + 1;

        let (Some(id), Some(name)) = (record.get(0), record.get(1)) else {
            return Err(Error::InvalidInput(format!(
                "{} record {}: expected id,name",
                source, line
            )));
        };
        let id = id.trim().parse::<i64>().map_err(|_| {
            Error::InvalidInput(format!("{} record {}: invalid id '{}'", source, line, id))
        })?;

        rows.push(T::new(id, name.to_string()));
    }

    Ok(rows)
}

/// Load one reference file into its table; returns rows inserted
pub async fn load_reference_table<T: ReferenceEntity>(pool: &SqlitePool, path: &Path) -> Result<usize> {
    let file = std::fs::File::open(path).map_err(|e| {
        Error::Config(format!("Cannot open reference file {}: {}", path.display(), e))
    })?;
    let rows: Vec<T> = parse_reference_csv(file, &path.display().to_string())?;

    let inserted = ReferenceRepository::<T>::new(pool.clone())
        .insert_missing(&rows)
        .await?;

    info!(
        table = T::TABLE,
        read = rows.len(),
        inserted,
        "Reference table loaded from {}",
        path.display()
    );

    Ok(inserted)
}

/// Load departments then jobs from the configured reference directory
pub async fn bootstrap_reference_data(pool: &SqlitePool, config: &ServiceConfig) -> Result<ReferenceLoadReport> {
    let departments = load_reference_table::<Department>(pool, &config.departments_csv()).await?;
    let jobs = load_reference_table::<Job>(pool, &config.jobs_csv()).await?;

    Ok(ReferenceLoadReport { departments, jobs })
}
