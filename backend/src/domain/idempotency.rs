//! Idempotency primitives for safe report-creation retries.
//!
//! Clients send a UUID in the `X-Idempotency-Key` header. The first request
//! stores the hash of its canonicalised body together with a snapshot of the
//! created report; retries with the same key either replay that snapshot or
//! conflict when the body differs.
//!
//! Payloads are canonicalised before hashing so key order and whitespace do
//! not matter:
//!
//! 1. JSON objects have their keys sorted recursively.
//! 2. The result is serialised to compact JSON.
//! 3. SHA-256 is computed over the resulting bytes.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use super::report::Report;

/// Default retention for stored idempotency records.
pub const DEFAULT_IDEMPOTENCY_TTL_HOURS: u64 = 24;

/// Validation errors for [`IdempotencyKey`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdempotencyKeyValidationError {
    /// The key string was empty.
    EmptyKey,
    /// The key string was not a valid UUID.
    InvalidKey,
}

impl fmt::Display for IdempotencyKeyValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyKey => write!(f, "idempotency key must not be empty"),
            Self::InvalidKey => write!(f, "idempotency key must be a valid UUID"),
        }
    }
}

impl std::error::Error for IdempotencyKeyValidationError {}

/// Client-provided idempotency key.
///
/// # Examples
/// ```
/// use report_store::domain::IdempotencyKey;
///
/// let key = IdempotencyKey::new("550e8400-e29b-41d4-a716-446655440000").unwrap();
/// assert_eq!(key.to_string(), "550e8400-e29b-41d4-a716-446655440000");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IdempotencyKey(Uuid);

impl IdempotencyKey {
    /// Validate and construct a key from its textual form.
    ///
    /// Surrounding whitespace is rejected rather than trimmed.
    pub fn new(key: impl AsRef<str>) -> Result<Self, IdempotencyKeyValidationError> {
        let key = key.as_ref();
        if key.is_empty() {
            return Err(IdempotencyKeyValidationError::EmptyKey);
        }
        if key.trim() != key {
            return Err(IdempotencyKeyValidationError::InvalidKey);
        }
        Uuid::parse_str(key)
            .map(Self)
            .map_err(|_| IdempotencyKeyValidationError::InvalidKey)
    }

    /// Wrap an already validated UUID, e.g. one loaded from storage.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Generate a random key. Mostly useful in tests.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for IdempotencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<IdempotencyKey> for String {
    fn from(value: IdempotencyKey) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for IdempotencyKey {
    type Error = IdempotencyKeyValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Validation errors for [`PayloadHash`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadHashError {
    /// The byte slice had an incorrect length.
    InvalidLength { expected: usize, actual: usize },
    /// Failed to serialise the canonical JSON payload.
    Serialization { message: String },
}

impl fmt::Display for PayloadHashError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidLength { expected, actual } => {
                write!(f, "payload hash must be {expected} bytes, got {actual}")
            }
            Self::Serialization { message } => {
                write!(f, "failed to serialise canonical JSON payload: {message}")
            }
        }
    }
}

impl std::error::Error for PayloadHashError {}

/// SHA-256 hash of a canonicalised request body.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PayloadHash([u8; 32]);

impl PayloadHash {
    /// Construct a hash from raw bytes loaded from storage.
    pub fn try_from_bytes(bytes: &[u8]) -> Result<Self, PayloadHashError> {
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| PayloadHashError::InvalidLength {
                expected: 32,
                actual: bytes.len(),
            })?;
        Ok(Self(arr))
    }

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for PayloadHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

/// Canonicalise a JSON value and compute its SHA-256 hash.
///
/// # Examples
/// ```
/// use report_store::domain::canonicalize_and_hash;
/// use serde_json::json;
///
/// let a = canonicalize_and_hash(&json!({"type": "returns", "payload": {"b": 2, "a": 1}})).unwrap();
/// let b = canonicalize_and_hash(&json!({"payload": {"a": 1, "b": 2}, "type": "returns"})).unwrap();
/// assert_eq!(a, b);
/// ```
pub fn canonicalize_and_hash(value: &Value) -> Result<PayloadHash, PayloadHashError> {
    let bytes = serde_json::to_vec(&canonicalize(value)).map_err(|err| {
        PayloadHashError::Serialization {
            message: err.to_string(),
        }
    })?;
    Ok(PayloadHash::from_bytes(Sha256::digest(&bytes).into()))
}

fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by_key(|(k, _)| k.as_str());
            Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.clone(), canonicalize(v)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

/// Stored record linking a key to the request hash and the created report.
#[derive(Debug, Clone, PartialEq)]
pub struct IdempotencyRecord {
    pub key: IdempotencyKey,
    pub payload_hash: PayloadHash,
    /// Serialised report returned by the original request.
    pub response_snapshot: Value,
    pub created_at: DateTime<Utc>,
}

impl IdempotencyRecord {
    /// Record that replays `report`, stamped with the report's creation time.
    pub fn for_report(
        key: IdempotencyKey,
        payload_hash: PayloadHash,
        report: &Report,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            key,
            payload_hash,
            response_snapshot: serde_json::to_value(report)?,
            created_at: report.created_at,
        })
    }
}

/// Outcome of looking up an idempotency key.
#[derive(Debug, Clone, PartialEq)]
pub enum IdempotencyLookupResult {
    /// No record exists for this key.
    NotFound,
    /// A record exists and the payload hash matches.
    MatchingPayload(IdempotencyRecord),
    /// A record exists but the payload hash differs.
    ConflictingPayload(IdempotencyRecord),
}

impl IdempotencyLookupResult {
    /// Classify a stored record against the hash of the incoming request.
    pub fn classify(record: Option<IdempotencyRecord>, incoming: &PayloadHash) -> Self {
        match record {
            None => Self::NotFound,
            Some(record) if &record.payload_hash == incoming => Self::MatchingPayload(record),
            Some(record) => Self::ConflictingPayload(record),
        }
    }
}

/// Retention window for idempotency records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdempotencyTtl {
    hours: u64,
}

impl IdempotencyTtl {
    /// Build a TTL, clamping zero to one hour.
    pub fn from_hours(hours: u64) -> Self {
        Self {
            hours: hours.max(1),
        }
    }

    pub fn hours(&self) -> u64 {
        self.hours
    }

    /// Records created before the returned instant are expired.
    pub fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let hours = i64::try_from(self.hours).unwrap_or(i64::MAX);
        Duration::try_hours(hours)
            .and_then(|ttl| now.checked_sub_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

impl Default for IdempotencyTtl {
    fn default() -> Self {
        Self::from_hours(DEFAULT_IDEMPOTENCY_TTL_HOURS)
    }
}
