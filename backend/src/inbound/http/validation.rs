//! Shared validation helpers for inbound HTTP adapters.
//!
//! Extractor failures (malformed JSON, wrong content type, bad query
//! strings) are routed through these helpers so every rejection uses the
//! same envelope as domain validation failures.

use actix_web::HttpRequest;
use actix_web::error::{JsonPayloadError, QueryPayloadError};
use serde_json::json;
use tracing::debug;

use crate::domain::{Error, INVALID_PAYLOAD_MESSAGE};

/// Newtype wrapper for HTTP field names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub(crate) fn as_str(&self) -> &'static str {
        self.0
    }
}

/// Error for one or more absent query parameters.
pub(crate) fn missing_fields_error(message: &str, missing: &[FieldName]) -> Error {
    let fields: Vec<&str> = missing.iter().map(FieldName::as_str).collect();
    Error::invalid_request(message).with_details(json!({
        "fields": fields,
        "code": "missing_field",
    }))
}

/// Treat empty strings as absent.
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|raw| !raw.is_empty())
}

/// `JsonConfig` error handler turning body extraction failures into
/// `400 invalid payload`.
pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    debug!(error = %err, "rejected request body");
    Error::invalid_request(INVALID_PAYLOAD_MESSAGE)
        .with_details(json!({ "field": "body", "reason": err.to_string() }))
        .into()
}

/// `QueryConfig` error handler for malformed query strings.
pub fn query_error_handler(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    debug!(error = %err, "rejected query string");
    Error::invalid_request("invalid query string")
        .with_details(json!({ "reason": err.to_string() }))
        .into()
}
