//! # staffdb Common Library
//!
//! Shared code for the staffdb services:
//! - Database initialization and schema
//! - Entity models (jobs, departments, employees)
//! - Repository interface and SQLite repositories
//! - Configuration resolution

pub mod config;
pub mod db;
pub mod error;

pub use error::{Error, Result};
