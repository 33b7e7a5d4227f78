//! Shared translation of pool and Diesel failures into port errors.
//!
//! Connection-class failures (checkout timeouts, closed connections) map to
//! the port's connection variant so the domain can report them as
//! retryable. Everything else becomes a query error. The raw Diesel cause is
//! only logged at `debug`.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::debug;

use crate::domain::ports::{
    ConnectivityProbeError, IdempotencyRepositoryError, ReportRepositoryError,
};

use super::pool::PoolError;

/// Port errors that distinguish connection failures from query failures.
pub(crate) trait PersistenceError: Sized {
    fn connection_failure(message: String) -> Self;
    fn query_failure(message: String) -> Self;

    /// Hook for adapters that treat unique violations specially.
    fn unique_violation() -> Self {
        Self::query_failure("unique constraint violated".to_owned())
    }
}

/// The only unique constraint a report write can trip is the idempotency
/// key, so unique violations become [`ReportRepositoryError::DuplicateKey`].
impl PersistenceError for ReportRepositoryError {
    fn connection_failure(message: String) -> Self {
        Self::connection(message)
    }

    fn query_failure(message: String) -> Self {
        Self::query(message)
    }

    fn unique_violation() -> Self {
        Self::duplicate_key("concurrent insert detected")
    }
}

impl PersistenceError for IdempotencyRepositoryError {
    fn connection_failure(message: String) -> Self {
        Self::connection(message)
    }

    fn query_failure(message: String) -> Self {
        Self::query(message)
    }
}

impl PersistenceError for ConnectivityProbeError {
    fn connection_failure(message: String) -> Self {
        Self::unavailable(message)
    }

    fn query_failure(message: String) -> Self {
        Self::unavailable(message)
    }
}

pub(crate) fn map_pool_error<E: PersistenceError>(error: PoolError) -> E {
    E::connection_failure(error.into_message())
}

pub(crate) fn map_diesel_error<E: PersistenceError>(error: DieselError) -> E {
    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        other => debug!(error = %other, "diesel operation failed"),
    }

    match error {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => E::unique_violation(),
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _)
        | DieselError::BrokenTransactionManager => {
            E::connection_failure("database connection error".to_owned())
        }
        DieselError::NotFound => E::query_failure("record not found".to_owned()),
        DieselError::QueryBuilderError(_) => E::query_failure("database query error".to_owned()),
        DieselError::DeserializationError(_) => E::query_failure("unreadable row".to_owned()),
        _ => E::query_failure("database error".to_owned()),
    }
}

/// Convert a Diesel affected-row count.
pub(crate) fn row_count(rows: usize) -> u64 {
    u64::try_from(rows).unwrap_or(u64::MAX)
}
