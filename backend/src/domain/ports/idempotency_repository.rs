//! Port abstraction for idempotency key persistence.
//!
//! Records survive restarts so a client retrying across a deploy still gets
//! its original report back instead of a duplicate row. Records are written
//! together with their report through
//! [`ReportRepository::insert_with_idempotency_key`](super::ReportRepository::insert_with_idempotency_key);
//! this port only reads and expires them.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{IdempotencyKey, IdempotencyLookupResult, PayloadHash};

use super::define_port_error;

define_port_error! {
    /// Errors raised by idempotency repository adapters.
    pub enum IdempotencyRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "idempotency repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "idempotency repository query failed: {message}",
    }
}

/// Port for idempotency record retrieval and expiry.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdempotencyRepository: Send + Sync {
    /// Look up `key` and compare its stored hash with `payload_hash`.
    ///
    /// Records created before `expired_before` are treated as absent even
    /// if they have not been purged yet.
    async fn lookup(
        &self,
        key: &IdempotencyKey,
        payload_hash: &PayloadHash,
        expired_before: DateTime<Utc>,
    ) -> Result<IdempotencyLookupResult, IdempotencyRepositoryError>;

    /// Remove records created before `cutoff`, returning how many were
    /// deleted.
    async fn cleanup_expired(&self, cutoff: DateTime<Utc>)
    -> Result<u64, IdempotencyRepositoryError>;
}

/// Repository that never remembers anything.
///
/// Every lookup is a miss, so requests behave as if no key had been sent.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureIdempotencyRepository;

#[async_trait]
impl IdempotencyRepository for FixtureIdempotencyRepository {
    async fn lookup(
        &self,
        _key: &IdempotencyKey,
        _payload_hash: &PayloadHash,
        _expired_before: DateTime<Utc>,
    ) -> Result<IdempotencyLookupResult, IdempotencyRepositoryError> {
        Ok(IdempotencyLookupResult::NotFound)
    }

    async fn cleanup_expired(
        &self,
        _cutoff: DateTime<Utc>,
    ) -> Result<u64, IdempotencyRepositoryError> {
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::canonicalize_and_hash;
    use serde_json::json;

    #[tokio::test]
    async fn fixture_lookup_always_misses() {
        let repo = FixtureIdempotencyRepository;
        let hash = canonicalize_and_hash(&json!({"type": "returns"})).expect("hash");
        let result = repo
            .lookup(&IdempotencyKey::random(), &hash, Utc::now())
            .await
            .expect("fixture lookup");
        assert_eq!(result, IdempotencyLookupResult::NotFound);
    }

    #[tokio::test]
    async fn fixture_cleanup_removes_nothing() {
        let deleted = FixtureIdempotencyRepository
            .cleanup_expired(Utc::now())
            .await
            .expect("fixture cleanup");
        assert_eq!(deleted, 0);
    }
}
