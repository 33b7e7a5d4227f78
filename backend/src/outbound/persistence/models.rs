//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use super::schema::{report_idempotency_keys, reports};

/// Row struct for reading from the reports table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = reports)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ReportRow {
    pub id: i64,
    pub reporter: String,
    pub report_type: String,
    pub payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Insertable struct for new reports. `id` and `created_at` come from
/// column defaults.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = reports)]
pub(crate) struct NewReportRow<'a> {
    pub reporter: &'a str,
    pub report_type: &'a str,
    pub payload: serde_json::Value,
}

// ---------------------------------------------------------------------------
// Idempotency key models
// ---------------------------------------------------------------------------

/// Row struct for reading from the report_idempotency_keys table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = report_idempotency_keys)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct IdempotencyKeyRow {
    pub key: Uuid,
    pub payload_hash: Vec<u8>,
    pub response_snapshot: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Insertable struct for idempotency records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = report_idempotency_keys)]
pub(crate) struct NewIdempotencyKeyRow<'a> {
    pub key: Uuid,
    pub payload_hash: &'a [u8],
    pub response_snapshot: &'a serde_json::Value,
    pub created_at: DateTime<Utc>,
}
