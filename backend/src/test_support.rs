//! In-memory port implementations for tests.
//!
//! Compiled with the `test-support` feature so integration tests under
//! `tests/` can drive the real service and HTTP adapter without PostgreSQL.
//! The doubles follow the ordering and matching rules of the Diesel
//! adapters.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::ports::{
    ConnectivityProbe, ConnectivityProbeError, IdempotencyClaim, IdempotencyRepository,
    IdempotencyRepositoryError, ReportRepository, ReportRepositoryError,
};
use crate::domain::{
    IdempotencyKey, IdempotencyLookupResult, IdempotencyRecord, NewReport, PayloadHash, Report,
    ReportDate, ReportId, ReportType,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Default)]
struct ReportTable {
    last_id: i64,
    rows: Vec<Report>,
}

impl ReportTable {
    fn insert(&mut self, report: &NewReport) -> Report {
        self.last_id += 1;
        let row = Report {
            id: ReportId::new(self.last_id),
            reporter: report.reporter.clone(),
            report_type: report.report_type.clone(),
            payload: report.payload.clone(),
            created_at: Utc::now(),
        };
        self.rows.push(row.clone());
        row
    }

    fn delete_matching(&mut self, report_type: &ReportType, report_date: &ReportDate) -> u64 {
        let before = self.rows.len();
        self.rows.retain(|row| {
            !(row.report_type == *report_type
                && row.payload.report_date().as_ref() == Some(report_date))
        });
        u64::try_from(before - self.rows.len()).unwrap_or(u64::MAX)
    }
}

/// Vector-backed report storage with an availability switch.
///
/// Keyed inserts write into the shared [`InMemoryIdempotencyRepository`]
/// under the same locks as the report row, so both land or neither does.
///
/// # Examples
/// ```
/// use std::sync::Arc;
///
/// use report_store::test_support::{InMemoryIdempotencyRepository, InMemoryReportRepository};
///
/// let keys = Arc::new(InMemoryIdempotencyRepository::default());
/// let repo = InMemoryReportRepository::with_idempotency(keys.clone());
/// repo.set_available(false);
/// assert!(repo.snapshot().is_empty());
/// assert!(keys.is_empty());
/// ```
#[derive(Debug)]
pub struct InMemoryReportRepository {
    table: Mutex<ReportTable>,
    keys: Arc<InMemoryIdempotencyRepository>,
    available: AtomicBool,
    fail_next_keyed_insert: AtomicBool,
}

impl Default for InMemoryReportRepository {
    fn default() -> Self {
        Self::with_idempotency(Arc::default())
    }
}

impl InMemoryReportRepository {
    /// Repository whose keyed inserts record into `keys`.
    pub fn with_idempotency(keys: Arc<InMemoryIdempotencyRepository>) -> Self {
        Self {
            table: Mutex::new(ReportTable::default()),
            keys,
            available: AtomicBool::new(true),
            fail_next_keyed_insert: AtomicBool::new(false),
        }
    }

    /// Make subsequent calls fail as if no connection could be checked out.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Drop the connection during the next keyed insert. The transaction
    /// rolls back, so neither the report nor the key is kept.
    pub fn fail_next_keyed_insert(&self) {
        self.fail_next_keyed_insert.store(true, Ordering::SeqCst);
    }

    /// Every stored row in insertion order.
    pub fn snapshot(&self) -> Vec<Report> {
        lock(&self.table).rows.clone()
    }

    fn ensure_available(&self) -> Result<(), ReportRepositoryError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(ReportRepositoryError::connection("in-memory store offline"))
        }
    }
}

#[async_trait]
impl ReportRepository for InMemoryReportRepository {
    async fn insert(&self, report: &NewReport) -> Result<Report, ReportRepositoryError> {
        self.ensure_available()?;
        Ok(lock(&self.table).insert(report))
    }

    async fn insert_with_idempotency_key(
        &self,
        report: &NewReport,
        claim: &IdempotencyClaim,
    ) -> Result<Report, ReportRepositoryError> {
        self.ensure_available()?;
        let mut records = lock(&self.keys.records);
        let live = records
            .get(claim.key.as_uuid())
            .is_some_and(|record| record.created_at >= claim.expired_before);
        if live {
            return Err(ReportRepositoryError::duplicate_key(claim.key.to_string()));
        }
        if self.fail_next_keyed_insert.swap(false, Ordering::SeqCst) {
            return Err(ReportRepositoryError::connection(
                "server closed the connection unexpectedly",
            ));
        }

        let stored = lock(&self.table).insert(report);
        let record = IdempotencyRecord::for_report(claim.key, claim.payload_hash.clone(), &stored)
            .map_err(|err| ReportRepositoryError::query(err.to_string()))?;
        records.insert(*claim.key.as_uuid(), record);
        Ok(stored)
    }

    async fn list_recent(
        &self,
        report_type: Option<ReportType>,
        limit: i64,
    ) -> Result<Vec<Report>, ReportRepositoryError> {
        self.ensure_available()?;
        let mut rows: Vec<Report> = lock(&self.table)
            .rows
            .iter()
            .filter(|row| report_type.as_ref().is_none_or(|t| row.report_type == *t))
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.get().cmp(&a.id.get()))
        });
        rows.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(rows)
    }

    async fn delete_by_type_and_date(
        &self,
        report_type: &ReportType,
        report_date: &ReportDate,
    ) -> Result<u64, ReportRepositoryError> {
        self.ensure_available()?;
        Ok(lock(&self.table).delete_matching(report_type, report_date))
    }

    async fn replace_by_type_and_date(
        &self,
        report: &NewReport,
        report_date: &ReportDate,
    ) -> Result<(Report, u64), ReportRepositoryError> {
        self.ensure_available()?;
        let mut table = lock(&self.table);
        let replaced = table.delete_matching(&report.report_type, report_date);
        Ok((table.insert(report), replaced))
    }
}

/// Map-backed idempotency storage keyed by UUID.
#[derive(Debug, Default)]
pub struct InMemoryIdempotencyRepository {
    records: Mutex<HashMap<Uuid, IdempotencyRecord>>,
}

impl InMemoryIdempotencyRepository {
    pub fn len(&self) -> usize {
        lock(&self.records).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Seed a record directly, bypassing the service.
    pub fn insert_record(&self, record: IdempotencyRecord) {
        lock(&self.records).insert(*record.key.as_uuid(), record);
    }
}

#[async_trait]
impl IdempotencyRepository for InMemoryIdempotencyRepository {
    async fn lookup(
        &self,
        key: &IdempotencyKey,
        payload_hash: &PayloadHash,
        expired_before: DateTime<Utc>,
    ) -> Result<IdempotencyLookupResult, IdempotencyRepositoryError> {
        let record = lock(&self.records)
            .get(key.as_uuid())
            .filter(|record| record.created_at >= expired_before)
            .cloned();
        Ok(IdempotencyLookupResult::classify(record, payload_hash))
    }

    async fn cleanup_expired(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, IdempotencyRepositoryError> {
        let mut records = lock(&self.records);
        let before = records.len();
        records.retain(|_, record| record.created_at >= cutoff);
        Ok(u64::try_from(before - records.len()).unwrap_or(u64::MAX))
    }
}

/// Connectivity probe whose answer can be flipped at runtime.
#[derive(Debug)]
pub struct SwitchableConnectivityProbe {
    reachable: AtomicBool,
}

impl SwitchableConnectivityProbe {
    pub fn new(reachable: bool) -> Self {
        Self {
            reachable: AtomicBool::new(reachable),
        }
    }

    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }
}

impl Default for SwitchableConnectivityProbe {
    fn default() -> Self {
        Self::new(true)
    }
}

#[async_trait]
impl ConnectivityProbe for SwitchableConnectivityProbe {
    async fn ping(&self) -> Result<(), ConnectivityProbeError> {
        if self.reachable.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(ConnectivityProbeError::unavailable("connection refused"))
        }
    }
}
