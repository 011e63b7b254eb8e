//! HTTP API handlers for staffdb-ingest

pub mod import;
pub mod status;
pub mod ui;

pub use import::import_routes;
pub use status::{status_routes, BuildInfo};
pub use ui::ui_routes;
