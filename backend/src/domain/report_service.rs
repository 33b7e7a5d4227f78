//! Report store domain service.
//!
//! Implements the driving ports on top of the report and idempotency
//! repositories. Storage connectivity failures surface as
//! `service_unavailable`; every other storage failure is `internal`.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::{debug, info, warn};

use crate::domain::ports::{
    CreateReportRequest, CreateReportResponse, DeleteReportsRequest, IdempotencyClaim,
    IdempotencyRepository, IdempotencyRepositoryError, ReportCommand, ReportQuery,
    ReportRepository, ReportRepositoryError, UpsertReportResponse,
};
use crate::domain::{
    Error, IdempotencyKey, IdempotencyLookupResult, IdempotencyRecord, IdempotencyTtl, NewReport,
    PayloadHash, Report, ReportType, canonicalize_and_hash,
};

/// Maximum number of reports returned by a list call.
pub const LIST_LIMIT: i64 = 50;

/// Report service implementing [`ReportCommand`] and [`ReportQuery`].
#[derive(Clone)]
pub struct ReportService<R, I> {
    reports: Arc<R>,
    idempotency: Arc<I>,
    idempotency_ttl: IdempotencyTtl,
}

impl<R, I> ReportService<R, I> {
    /// Create a new service with the given repositories and the default
    /// idempotency retention.
    pub fn new(reports: Arc<R>, idempotency: Arc<I>) -> Self {
        Self {
            reports,
            idempotency,
            idempotency_ttl: IdempotencyTtl::default(),
        }
    }

    /// Forget idempotency keys older than `ttl`.
    #[must_use]
    pub fn with_idempotency_ttl(mut self, ttl: IdempotencyTtl) -> Self {
        self.idempotency_ttl = ttl;
        self
    }
}

impl<R, I> ReportService<R, I>
where
    R: ReportRepository,
    I: IdempotencyRepository,
{
    fn map_report_error(error: ReportRepositoryError) -> Error {
        match error {
            ReportRepositoryError::Connection { message } => {
                Error::service_unavailable(format!("report repository unavailable: {message}"))
            }
            ReportRepositoryError::Query { message } => {
                Error::internal(format!("report repository error: {message}"))
            }
            ReportRepositoryError::DuplicateKey { message } => {
                Error::internal(format!("unexpected idempotency key conflict: {message}"))
            }
        }
    }

    fn map_idempotency_error(error: IdempotencyRepositoryError) -> Error {
        match error {
            IdempotencyRepositoryError::Connection { message } => {
                Error::service_unavailable(format!("idempotency repository unavailable: {message}"))
            }
            IdempotencyRepositoryError::Query { message } => {
                Error::internal(format!("idempotency repository error: {message}"))
            }
        }
    }

    fn key_reuse_conflict(key: &IdempotencyKey) -> Error {
        Error::conflict("idempotency key already used with different payload").with_details(
            json!({
                "idempotencyKey": key.to_string(),
                "code": "idempotency_key_reused",
            }),
        )
    }

    /// Hash of the normalised request body.
    ///
    /// The reporter is hashed after defaulting, so omitting it and sending
    /// `"anonymous"` are the same request.
    pub(crate) fn request_hash(report: &NewReport) -> Result<PayloadHash, Error> {
        let body = json!({
            "reporter": report.reporter.as_str(),
            "type": report.report_type.as_str(),
            "payload": report.payload.fields(),
        });
        canonicalize_and_hash(&body)
            .map_err(|err| Error::internal(format!("failed to hash request payload: {err}")))
    }

    fn replay(record: IdempotencyRecord) -> Result<CreateReportResponse, Error> {
        let report: Report = serde_json::from_value(record.response_snapshot)
            .map_err(|err| Error::internal(format!("failed to deserialize report: {err}")))?;
        debug!(report_id = %report.id, key = %record.key, "replaying idempotent create");
        Ok(CreateReportResponse {
            report,
            replayed: true,
        })
    }

    fn log_created(stored: &Report) {
        info!(
            report_id = %stored.id,
            report_type = %stored.report_type,
            "report created"
        );
    }

    async fn insert(&self, report: &NewReport) -> Result<Report, Error> {
        let stored = self
            .reports
            .insert(report)
            .await
            .map_err(Self::map_report_error)?;
        Self::log_created(&stored);
        Ok(stored)
    }

    async fn lookup(
        &self,
        key: &IdempotencyKey,
        payload_hash: &PayloadHash,
        expired_before: DateTime<Utc>,
    ) -> Result<IdempotencyLookupResult, Error> {
        self.idempotency
            .lookup(key, payload_hash, expired_before)
            .await
            .map_err(Self::map_idempotency_error)
    }

    async fn resolve_duplicate_key_race(
        &self,
        claim: &IdempotencyClaim,
    ) -> Result<CreateReportResponse, Error> {
        let key = &claim.key;
        let retry = self
            .lookup(key, &claim.payload_hash, claim.expired_before)
            .await?;

        match retry {
            IdempotencyLookupResult::MatchingPayload(record) => Self::replay(record),
            IdempotencyLookupResult::ConflictingPayload(_) => Err(Self::key_reuse_conflict(key)),
            IdempotencyLookupResult::NotFound => Err(Error::internal(
                "idempotency record disappeared during race resolution",
            )),
        }
    }

    async fn create_idempotent(
        &self,
        report: NewReport,
        key: IdempotencyKey,
    ) -> Result<CreateReportResponse, Error> {
        let claim = IdempotencyClaim {
            key,
            payload_hash: Self::request_hash(&report)?,
            expired_before: self.idempotency_ttl.cutoff(Utc::now()),
        };

        match self
            .lookup(&claim.key, &claim.payload_hash, claim.expired_before)
            .await?
        {
            IdempotencyLookupResult::MatchingPayload(record) => Self::replay(record),
            IdempotencyLookupResult::ConflictingPayload(_) => {
                Err(Self::key_reuse_conflict(&claim.key))
            }
            IdempotencyLookupResult::NotFound => {
                match self
                    .reports
                    .insert_with_idempotency_key(&report, &claim)
                    .await
                {
                    Ok(stored) => {
                        Self::log_created(&stored);
                        Ok(CreateReportResponse {
                            report: stored,
                            replayed: false,
                        })
                    }
                    Err(ReportRepositoryError::DuplicateKey { .. }) => {
                        warn!(key = %claim.key, "idempotency key stored concurrently; resolving race");
                        self.resolve_duplicate_key_race(&claim).await
                    }
                    Err(err) => Err(Self::map_report_error(err)),
                }
            }
        }
    }

    /// Remove idempotency records older than the configured retention.
    pub async fn purge_expired_idempotency_keys(&self) -> Result<u64, Error> {
        let ttl = self.idempotency_ttl;
        let purged = self
            .idempotency
            .cleanup_expired(ttl.cutoff(Utc::now()))
            .await
            .map_err(Self::map_idempotency_error)?;
        info!(purged, ttl_hours = ttl.hours(), "expired idempotency keys purged");
        Ok(purged)
    }
}

#[async_trait]
impl<R, I> ReportQuery for ReportService<R, I>
where
    R: ReportRepository,
    I: IdempotencyRepository,
{
    async fn list(&self, report_type: Option<ReportType>) -> Result<Vec<Report>, Error> {
        self.reports
            .list_recent(report_type, LIST_LIMIT)
            .await
            .map_err(Self::map_report_error)
    }
}

#[async_trait]
impl<R, I> ReportCommand for ReportService<R, I>
where
    R: ReportRepository,
    I: IdempotencyRepository,
{
    async fn create(&self, request: CreateReportRequest) -> Result<CreateReportResponse, Error> {
        let CreateReportRequest {
            report,
            idempotency_key,
        } = request;

        match idempotency_key {
            Some(key) => self.create_idempotent(report, key).await,
            None => Ok(CreateReportResponse {
                report: self.insert(&report).await?,
                replayed: false,
            }),
        }
    }

    async fn delete_by_type_and_date(&self, request: DeleteReportsRequest) -> Result<u64, Error> {
        let deleted = self
            .reports
            .delete_by_type_and_date(&request.report_type, &request.report_date)
            .await
            .map_err(Self::map_report_error)?;
        info!(
            report_type = %request.report_type,
            report_date = %request.report_date,
            deleted,
            "reports deleted"
        );
        Ok(deleted)
    }

    async fn upsert(&self, report: NewReport) -> Result<UpsertReportResponse, Error> {
        let report_date = report.require_report_date()?;
        let (stored, replaced) = self
            .reports
            .replace_by_type_and_date(&report, &report_date)
            .await
            .map_err(Self::map_report_error)?;
        info!(
            report_id = %stored.id,
            report_type = %stored.report_type,
            report_date = %report_date,
            replaced,
            "report upserted"
        );
        Ok(UpsertReportResponse {
            report: stored,
            replaced,
        })
    }
}

#[cfg(test)]
#[path = "report_service_tests.rs"]
mod tests;
