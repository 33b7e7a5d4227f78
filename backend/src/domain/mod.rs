//! Domain primitives, services and ports.
//!
//! Purpose: define the report store's strongly typed entities and the
//! hexagonal ports the adapters plug into. Nothing here depends on Actix or
//! Diesel.
//!
//! Public surface:
//! - [`Report`], [`NewReport`] and their newtypes: the stored document and
//!   its validated input.
//! - [`ReportKind`]: registry of known report types with payload shapes.
//! - [`ReportService`]: implementation of the driving ports.
//! - [`Error`] / [`ErrorCode`]: transport-agnostic failure payload.
//! - Idempotency primitives for safe create retries.

pub mod error;
pub mod idempotency;
pub mod ports;
pub mod report;
pub mod report_kind;
pub mod report_service;
pub mod trace_id;

pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::idempotency::{
    DEFAULT_IDEMPOTENCY_TTL_HOURS, IdempotencyKey, IdempotencyKeyValidationError,
    IdempotencyLookupResult, IdempotencyRecord, IdempotencyTtl, PayloadHash, PayloadHashError,
    canonicalize_and_hash,
};
pub use self::report::{
    ANONYMOUS_REPORTER, INVALID_PAYLOAD_MESSAGE, NewReport, REPORT_DATE_FIELD, Report, ReportDate,
    ReportId, ReportPayload, ReportType, ReportValidationError, Reporter,
};
pub use self::report_kind::ReportKind;
pub use self::report_service::{LIST_LIMIT, ReportService};
pub use self::trace_id::TraceId;

/// HTTP header name used to propagate trace identifiers.
pub const TRACE_ID_HEADER: &str = "trace-id";

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use report_store::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::not_found("no such report"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
