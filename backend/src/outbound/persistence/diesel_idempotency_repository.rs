//! PostgreSQL-backed `IdempotencyRepository` implementation using Diesel ORM.
//!
//! Lookups ignore rows older than the caller's cutoff, so a key stops
//! replaying as soon as it expires. `cleanup_expired` reclaims the rows
//! themselves; the server runs it at boot. Records are written by
//! `DieselReportRepository` in the same transaction as their report.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tracing::debug;

use crate::domain::ports::{IdempotencyRepository, IdempotencyRepositoryError};
use crate::domain::{IdempotencyKey, IdempotencyLookupResult, IdempotencyRecord, PayloadHash};

use super::diesel_error_mapping::{map_diesel_error, map_pool_error, row_count};
use super::models::IdempotencyKeyRow;
use super::pool::DbPool;
use super::schema::report_idempotency_keys;

/// Diesel-backed implementation of the `IdempotencyRepository` port.
#[derive(Clone)]
pub struct DieselIdempotencyRepository {
    pool: DbPool,
}

impl DieselIdempotencyRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_record(row: IdempotencyKeyRow) -> Result<IdempotencyRecord, IdempotencyRepositoryError> {
    let payload_hash = PayloadHash::try_from_bytes(&row.payload_hash).map_err(|err| {
        IdempotencyRepositoryError::query(format!("corrupted payload hash in database: {err}"))
    })?;

    Ok(IdempotencyRecord {
        key: IdempotencyKey::from_uuid(row.key),
        payload_hash,
        response_snapshot: row.response_snapshot,
        created_at: row.created_at,
    })
}

#[async_trait]
impl IdempotencyRepository for DieselIdempotencyRepository {
    async fn lookup(
        &self,
        key: &IdempotencyKey,
        payload_hash: &PayloadHash,
        expired_before: DateTime<Utc>,
    ) -> Result<IdempotencyLookupResult, IdempotencyRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<IdempotencyKeyRow> = report_idempotency_keys::table
            .find(*key.as_uuid())
            .filter(report_idempotency_keys::created_at.ge(expired_before))
            .select(IdempotencyKeyRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        let record = row.map(row_to_record).transpose()?;
        Ok(IdempotencyLookupResult::classify(record, payload_hash))
    }

    async fn cleanup_expired(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, IdempotencyRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let deleted = diesel::delete(
            report_idempotency_keys::table.filter(report_idempotency_keys::created_at.lt(cutoff)),
        )
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;

        debug!(deleted, cutoff = %cutoff, "cleaned up expired idempotency records");
        Ok(row_count(deleted))
    }
}
