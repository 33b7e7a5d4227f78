//! PostgreSQL-backed `ReportRepository` implementation using Diesel ORM.
//!
//! Payloads are stored as `jsonb` without reshaping. Matching on the
//! business date uses `payload ->> 'reportDate'`, which the
//! `(type, (payload->>'reportDate'))` index covers, restricted to rows whose
//! `reportDate` is a JSON string. A numeric `20240501` never matches the
//! date `"20240501"`.

use async_trait::async_trait;
use diesel::dsl::sql;
use diesel::prelude::*;
use diesel::result::Error as DieselError;
use diesel::sql_types::{Bool, Nullable, Text};
use diesel_async::scoped_futures::ScopedFutureExt as _;
use diesel_async::{AsyncConnection, RunQueryDsl};
use tracing::debug;

use crate::domain::ports::{IdempotencyClaim, ReportRepository, ReportRepositoryError};
use crate::domain::{
    IdempotencyRecord, NewReport, Report, ReportDate, ReportId, ReportPayload, ReportType,
    Reporter,
};

use super::diesel_error_mapping::{map_diesel_error, map_pool_error, row_count};
use super::models::{NewIdempotencyKeyRow, NewReportRow, ReportRow};
use super::pool::DbPool;
use super::schema::{report_idempotency_keys, reports};

/// SQL fragment extracting the business date from the payload.
const REPORT_DATE_SQL: &str = "payload ->> 'reportDate'";
const REPORT_DATE_IS_STRING_SQL: &str = "jsonb_typeof(payload -> 'reportDate') = 'string'";

/// Diesel-backed implementation of the `ReportRepository` port.
#[derive(Clone)]
pub struct DieselReportRepository {
    pool: DbPool,
}

impl DieselReportRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn report_date_column() -> diesel::expression::SqlLiteral<Nullable<Text>> {
    sql::<Nullable<Text>>(REPORT_DATE_SQL)
}

fn report_date_is_string() -> diesel::expression::SqlLiteral<Bool> {
    sql::<Bool>(REPORT_DATE_IS_STRING_SQL)
}

/// Failures inside the keyed insert transaction.
enum KeyedInsertError {
    Database(DieselError),
    Snapshot(ReportRepositoryError),
}

impl From<DieselError> for KeyedInsertError {
    fn from(error: DieselError) -> Self {
        Self::Database(error)
    }
}

fn new_row(report: &NewReport) -> NewReportRow<'_> {
    NewReportRow {
        reporter: report.reporter.as_str(),
        report_type: report.report_type.as_str(),
        payload: report.payload.clone().into_value(),
    }
}

/// Convert a row into the domain type, rejecting data that could not have
/// been written through the service.
fn row_to_report(row: ReportRow) -> Result<Report, ReportRepositoryError> {
    let report_type = ReportType::new(row.report_type).map_err(|err| {
        ReportRepositoryError::query(format!("invalid report type in database: {err}"))
    })?;
    let payload = ReportPayload::try_from_value(row.payload).map_err(|err| {
        ReportRepositoryError::query(format!("invalid payload in database: {err}"))
    })?;

    Ok(Report {
        id: ReportId::new(row.id),
        reporter: Reporter::from_optional(Some(row.reporter)),
        report_type,
        payload,
        created_at: row.created_at,
    })
}

#[async_trait]
impl ReportRepository for DieselReportRepository {
    async fn insert(&self, report: &NewReport) -> Result<Report, ReportRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row = diesel::insert_into(reports::table)
            .values(new_row(report))
            .returning(ReportRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        row_to_report(row)
    }

    async fn insert_with_idempotency_key(
        &self,
        report: &NewReport,
        claim: &IdempotencyClaim,
    ) -> Result<Report, ReportRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = new_row(report);
        let key = *claim.key.as_uuid();

        conn.transaction::<_, KeyedInsertError, _>(|conn| {
            async move {
                diesel::delete(
                    report_idempotency_keys::table
                        .find(key)
                        .filter(report_idempotency_keys::created_at.lt(claim.expired_before)),
                )
                .execute(conn)
                .await?;

                let inserted = diesel::insert_into(reports::table)
                    .values(row)
                    .returning(ReportRow::as_returning())
                    .get_result(conn)
                    .await?;
                let stored = row_to_report(inserted).map_err(KeyedInsertError::Snapshot)?;
                let record =
                    IdempotencyRecord::for_report(claim.key, claim.payload_hash.clone(), &stored)
                        .map_err(|err| {
                            KeyedInsertError::Snapshot(ReportRepositoryError::query(format!(
                                "failed to snapshot report: {err}"
                            )))
                        })?;

                diesel::insert_into(report_idempotency_keys::table)
                    .values(NewIdempotencyKeyRow {
                        key,
                        payload_hash: record.payload_hash.as_bytes(),
                        response_snapshot: &record.response_snapshot,
                        created_at: record.created_at,
                    })
                    .execute(conn)
                    .await?;

                Ok(stored)
            }
            .scope_boxed()
        })
        .await
        .map_err(|err| match err {
            KeyedInsertError::Database(err) => map_diesel_error(err),
            KeyedInsertError::Snapshot(err) => err,
        })
    }

    async fn list_recent(
        &self,
        report_type: Option<ReportType>,
        limit: i64,
    ) -> Result<Vec<Report>, ReportRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let mut query = reports::table
            .select(ReportRow::as_select())
            .order((reports::created_at.desc(), reports::id.desc()))
            .limit(limit)
            .into_boxed();
        if let Some(report_type) = report_type {
            query = query.filter(reports::report_type.eq(String::from(report_type)));
        }

        let rows: Vec<ReportRow> = query.load(&mut conn).await.map_err(map_diesel_error)?;
        rows.into_iter().map(row_to_report).collect()
    }

    async fn delete_by_type_and_date(
        &self,
        report_type: &ReportType,
        report_date: &ReportDate,
    ) -> Result<u64, ReportRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let deleted = diesel::delete(
            reports::table
                .filter(reports::report_type.eq(report_type.as_str()))
                .filter(report_date_is_string())
                .filter(report_date_column().eq(report_date.as_str())),
        )
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;

        debug!(deleted, report_type = %report_type, report_date = %report_date, "deleted reports");
        Ok(row_count(deleted))
    }

    async fn replace_by_type_and_date(
        &self,
        report: &NewReport,
        report_date: &ReportDate,
    ) -> Result<(Report, u64), ReportRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = new_row(report);
        let report_type = report.report_type.as_str();
        let date = report_date.as_str();

        let (inserted, replaced) = conn
            .transaction::<_, diesel::result::Error, _>(|conn| {
                async move {
                    let replaced = diesel::delete(
                        reports::table
                            .filter(reports::report_type.eq(report_type))
                            .filter(report_date_is_string())
                            .filter(report_date_column().eq(date)),
                    )
                    .execute(conn)
                    .await?;

                    let inserted = diesel::insert_into(reports::table)
                        .values(row)
                        .returning(ReportRow::as_returning())
                        .get_result(conn)
                        .await?;

                    Ok((inserted, replaced))
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;

        Ok((row_to_report(inserted)?, row_count(replaced)))
    }
}
