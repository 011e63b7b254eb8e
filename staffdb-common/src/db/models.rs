//! Database models

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Job reference row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Job {
    pub id: i64,
    pub name: String,
}

/// Department reference row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Department {
    pub id: i64,
    pub name: String,
}

/// Employee imported from an uploaded CSV
///
/// `hired_at` carries no timezone; it is stored exactly as parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Employee {
    pub id: i64,
    pub name: String,
    pub hired_at: NaiveDateTime,
    pub department_id: i64,
    pub job_id: i64,
}
