//! Driven port for report persistence.
//!
//! Adapters implement [`ReportRepository`] on top of durable storage. Every
//! method maps to a single statement, except
//! [`ReportRepository::replace_by_type_and_date`] and
//! [`ReportRepository::insert_with_idempotency_key`], which run inside one
//! transaction each.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{IdempotencyKey, NewReport, PayloadHash, Report, ReportDate, ReportType};

use super::define_port_error;

define_port_error! {
    /// Errors raised by report repository adapters.
    pub enum ReportRepositoryError {
        /// No connection could be checked out, or the connection dropped.
        Connection { message: String } => "report repository connection failed: {message}",
        /// A statement failed during execution.
        Query { message: String } => "report repository query failed: {message}",
        /// A live idempotency record already holds the key.
        DuplicateKey { message: String } => "idempotency key already stored: {message}",
    }
}

/// Idempotency key to record in the same transaction as a new report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdempotencyClaim {
    pub key: IdempotencyKey,
    pub payload_hash: PayloadHash,
    /// A record for the same key created before this instant is expired and
    /// is overwritten instead of conflicting.
    pub expired_before: DateTime<Utc>,
}

/// Port for report storage.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReportRepository: Send + Sync {
    /// Insert one row and return it with its server-assigned fields.
    async fn insert(&self, report: &NewReport) -> Result<Report, ReportRepositoryError>;

    /// Insert one row and store the idempotency record that replays it, both
    /// or neither.
    ///
    /// # Errors
    ///
    /// Returns [`ReportRepositoryError::DuplicateKey`] when an unexpired
    /// record already holds `claim.key`; no report row is left behind.
    async fn insert_with_idempotency_key(
        &self,
        report: &NewReport,
        claim: &IdempotencyClaim,
    ) -> Result<Report, ReportRepositoryError>;

    /// Most recent reports first (`created_at` then `id`, both descending),
    /// optionally filtered by exact type.
    async fn list_recent(
        &self,
        report_type: Option<ReportType>,
        limit: i64,
    ) -> Result<Vec<Report>, ReportRepositoryError>;

    /// Delete every row whose type matches exactly and whose
    /// `payload.reportDate` is the same JSON string.
    ///
    /// Returns the number of removed rows; zero is not an error.
    async fn delete_by_type_and_date(
        &self,
        report_type: &ReportType,
        report_date: &ReportDate,
    ) -> Result<u64, ReportRepositoryError>;

    /// Atomically delete the rows matching `(report.type, report_date)` and
    /// insert `report`.
    ///
    /// Returns the inserted row and the number of rows it replaced.
    async fn replace_by_type_and_date(
        &self,
        report: &NewReport,
        report_date: &ReportDate,
    ) -> Result<(Report, u64), ReportRepositoryError>;
}
