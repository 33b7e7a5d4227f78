//! Shared helpers for the Diesel adapter suites.
//!
//! Integration tests compile as separate crates under `backend/tests/`, so
//! the embedded cluster plumbing lives here and each suite pulls it in with
//! `mod support;`. The HTTP suite includes `report_app.rs` directly instead.

pub mod cluster;
pub mod embedded_postgres;

pub use cluster::handle_cluster_setup_failure;
pub use embedded_postgres::{count_rows, execute_sql, provision_template_database};

/// Render a `postgres` error with its SQLSTATE and server message.
///
/// `postgres::Error`'s `Display` collapses database errors to `db error`.
pub fn format_postgres_error(error: &postgres::Error) -> String {
    let Some(db_error) = error.as_db_error() else {
        return error.to_string();
    };

    let mut summary = format!(
        "postgres error {:?}: {}",
        db_error.code(),
        db_error.message()
    );
    if let Some(detail) = db_error.detail() {
        summary.push_str("; detail: ");
        summary.push_str(detail);
    }
    summary
}
