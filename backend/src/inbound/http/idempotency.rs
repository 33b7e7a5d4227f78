//! Helpers for parsing idempotency headers in HTTP handlers.

use actix_web::http::header::HeaderMap;

use crate::domain::{Error, IdempotencyKey, IdempotencyKeyValidationError};

/// HTTP header carrying the client's idempotency key.
pub const IDEMPOTENCY_KEY_HEADER: &str = "x-idempotency-key";

/// Response header set to `true` when a create was replayed.
pub const REPLAYED_HEADER: &str = "idempotent-replayed";

/// Extract the idempotency key from request headers.
///
/// An absent header yields `Ok(None)`.
pub fn extract_idempotency_key(
    headers: &HeaderMap,
) -> Result<Option<IdempotencyKey>, IdempotencyKeyValidationError> {
    let Some(header_value) = headers.get(IDEMPOTENCY_KEY_HEADER) else {
        return Ok(None);
    };

    let key_str = header_value
        .to_str()
        .map_err(|_| IdempotencyKeyValidationError::InvalidKey)?;

    IdempotencyKey::new(key_str).map(Some)
}

/// Map idempotency key validation errors to domain errors.
pub fn map_idempotency_key_error(err: IdempotencyKeyValidationError) -> Error {
    let message = match err {
        IdempotencyKeyValidationError::EmptyKey => "x-idempotency-key header must not be empty",
        IdempotencyKeyValidationError::InvalidKey => {
            "x-idempotency-key header must be a valid uuid"
        }
    };
    Error::invalid_request(message).with_details(serde_json::json!({
        "field": IDEMPOTENCY_KEY_HEADER,
    }))
}
