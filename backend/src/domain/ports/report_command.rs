//! Driving port for report mutations.
//!
//! HTTP handlers validate request bodies into domain types and then call
//! [`ReportCommand`]. Implementations coordinate the report and idempotency
//! repositories and translate their failures into domain [`Error`]s.

use async_trait::async_trait;

use crate::domain::{Error, IdempotencyKey, NewReport, Report, ReportDate, ReportType};

/// Request to store a new report.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateReportRequest {
    pub report: NewReport,
    /// Optional key making retries safe.
    pub idempotency_key: Option<IdempotencyKey>,
}

/// Outcome of [`ReportCommand::create`].
#[derive(Debug, Clone, PartialEq)]
pub struct CreateReportResponse {
    pub report: Report,
    /// `true` when the report was replayed from an earlier request with the
    /// same idempotency key.
    pub replayed: bool,
}

/// Filter identifying the rows removed by delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteReportsRequest {
    pub report_type: ReportType,
    pub report_date: ReportDate,
}

/// Outcome of [`ReportCommand::upsert`].
#[derive(Debug, Clone, PartialEq)]
pub struct UpsertReportResponse {
    pub report: Report,
    /// Rows with the same type and `reportDate` removed by the upsert.
    pub replaced: u64,
}

/// Driving port for report mutations.
///
/// # Idempotency
///
/// When `idempotency_key` is set on a create request:
/// 1. A stored record with the same body hash replays its report with
///    `replayed: true` and inserts nothing.
/// 2. A stored record with a different hash fails with a conflict.
/// 3. Otherwise the report is inserted and the record stored.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReportCommand: Send + Sync {
    /// Insert one report.
    async fn create(&self, request: CreateReportRequest) -> Result<CreateReportResponse, Error>;

    /// Delete every report matching the filter and return how many went.
    async fn delete_by_type_and_date(&self, request: DeleteReportsRequest) -> Result<u64, Error>;

    /// Replace the reports sharing this report's type and `reportDate`.
    async fn upsert(&self, report: NewReport) -> Result<UpsertReportResponse, Error>;
}
