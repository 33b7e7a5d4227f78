//! Report documents: the single entity held by the store.
//!
//! A report is a free-form JSON object tagged with a `type` discriminator.
//! Rows are immutable once inserted; the only ways they leave the store are
//! delete-by-(type, reportDate) and the transactional replace used by upsert.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use super::report_kind::ReportKind;

/// Reporter recorded when the client omits one or sends a blank value.
pub const ANONYMOUS_REPORTER: &str = "anonymous";

/// Payload field holding the soft business date of a report.
pub const REPORT_DATE_FIELD: &str = "reportDate";

/// Server-assigned report identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReportId(i64);

impl ReportId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for ReportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Validation failures for report inputs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReportValidationError {
    #[error("type is required")]
    MissingType,
    #[error("type must not be blank")]
    BlankType,
    #[error("payload is required")]
    MissingPayload,
    #[error("payload must be a JSON object")]
    PayloadNotObject,
    #[error("payload.reportDate must be a non-empty string")]
    MissingReportDate,
    #[error("payload does not match the {kind} shape: {reason}")]
    PayloadShape { kind: ReportKind, reason: String },
}

impl ReportValidationError {
    /// Name of the request field the failure refers to.
    pub fn field(&self) -> &'static str {
        match self {
            Self::MissingType | Self::BlankType => "type",
            Self::MissingPayload | Self::PayloadNotObject | Self::PayloadShape { .. } => "payload",
            Self::MissingReportDate => "payload.reportDate",
        }
    }
}

impl From<ReportValidationError> for super::Error {
    fn from(err: ReportValidationError) -> Self {
        super::Error::invalid_request(INVALID_PAYLOAD_MESSAGE).with_details(json!({
            "field": err.field(),
            "reason": err.to_string(),
        }))
    }
}

/// Client-facing message for every report body validation failure.
pub const INVALID_PAYLOAD_MESSAGE: &str = "invalid payload";

/// Report type discriminator.
///
/// Case-sensitive and stored exactly as received; whitespace-only values are
/// rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ReportType(String);

impl ReportType {
    pub fn new(value: impl Into<String>) -> Result<Self, ReportValidationError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(ReportValidationError::BlankType);
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Registered kind for this type, if any.
    pub fn kind(&self) -> Option<ReportKind> {
        ReportKind::from_type(&self.0)
    }
}

impl AsRef<str> for ReportType {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<ReportType> for String {
    fn from(value: ReportType) -> Self {
        value.0
    }
}

impl TryFrom<String> for ReportType {
    type Error = ReportValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Free-text author of a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Reporter(String);

impl Reporter {
    /// Build a reporter, substituting [`ANONYMOUS_REPORTER`] for absent or
    /// blank input.
    pub fn from_optional(value: Option<String>) -> Self {
        match value {
            Some(name) if !name.trim().is_empty() => Self(name),
            _ => Self::anonymous(),
        }
    }

    pub fn anonymous() -> Self {
        Self(ANONYMOUS_REPORTER.to_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Reporter {
    fn default() -> Self {
        Self::anonymous()
    }
}

/// Soft business key used by delete and upsert.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReportDate(String);

impl ReportDate {
    /// Wrap a date string. Empty values are rejected; the content is not
    /// parsed as a calendar date.
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        (!value.is_empty()).then_some(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReportDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Report body: always a JSON object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReportPayload(Map<String, Value>);

impl ReportPayload {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Accept only JSON objects.
    pub fn try_from_value(value: Value) -> Result<Self, ReportValidationError> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            _ => Err(ReportValidationError::PayloadNotObject),
        }
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    /// `reportDate` field when it is a non-empty string.
    pub fn report_date(&self) -> Option<ReportDate> {
        self.0
            .get(REPORT_DATE_FIELD)
            .and_then(Value::as_str)
            .and_then(ReportDate::new)
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

/// Stored report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub id: ReportId,
    pub reporter: Reporter,
    #[serde(rename = "type")]
    pub report_type: ReportType,
    pub payload: ReportPayload,
    pub created_at: DateTime<Utc>,
}

/// Validated input for a new report row.
///
/// # Examples
/// ```
/// use report_store::domain::NewReport;
/// use serde_json::json;
///
/// let report = NewReport::try_new(None, Some("returns".into()), Some(json!({
///     "reportDate": "2024-05-01",
///     "items": [{"sku": "A1", "qty": 2}],
/// })))
/// .unwrap();
/// assert_eq!(report.reporter.as_str(), "anonymous");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct NewReport {
    pub reporter: Reporter,
    pub report_type: ReportType,
    pub payload: ReportPayload,
}

impl NewReport {
    /// Validate raw request fields.
    ///
    /// Known report kinds additionally check their payload shape; unknown
    /// types accept any JSON object.
    pub fn try_new(
        reporter: Option<String>,
        report_type: Option<String>,
        payload: Option<Value>,
    ) -> Result<Self, ReportValidationError> {
        let report_type = ReportType::new(report_type.ok_or(ReportValidationError::MissingType)?)?;
        let payload = match payload {
            None | Some(Value::Null) => return Err(ReportValidationError::MissingPayload),
            Some(value) => ReportPayload::try_from_value(value)?,
        };
        if let Some(kind) = report_type.kind() {
            kind.validate(payload.fields())?;
        }
        Ok(Self {
            reporter: Reporter::from_optional(reporter),
            report_type,
            payload,
        })
    }

    /// Business date required by the replace operation.
    pub fn require_report_date(&self) -> Result<ReportDate, ReportValidationError> {
        self.payload
            .report_date()
            .ok_or(ReportValidationError::MissingReportDate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case(None, ReportValidationError::MissingType)]
    #[case(Some(""), ReportValidationError::BlankType)]
    #[case(Some("   "), ReportValidationError::BlankType)]
    fn rejects_missing_or_blank_type(
        #[case] report_type: Option<&str>,
        #[case] expected: ReportValidationError,
    ) {
        let err = NewReport::try_new(None, report_type.map(str::to_owned), Some(json!({})))
            .expect_err("type must be rejected");
        assert_eq!(err, expected);
        assert_eq!(err.field(), "type");
    }

    #[rstest]
    #[case(None, ReportValidationError::MissingPayload)]
    #[case(Some(json!(null)), ReportValidationError::MissingPayload)]
    #[case(Some(json!([1, 2])), ReportValidationError::PayloadNotObject)]
    #[case(Some(json!("text")), ReportValidationError::PayloadNotObject)]
    #[case(Some(json!(3)), ReportValidationError::PayloadNotObject)]
    fn rejects_non_object_payloads(
        #[case] payload: Option<Value>,
        #[case] expected: ReportValidationError,
    ) {
        let err = NewReport::try_new(None, Some("custom".into()), payload)
            .expect_err("payload must be rejected");
        assert_eq!(err, expected);
    }

    #[rstest]
    #[case(None)]
    #[case(Some(""))]
    #[case(Some("  "))]
    fn blank_reporter_becomes_anonymous(#[case] reporter: Option<&str>) {
        let report = NewReport::try_new(
            reporter.map(str::to_owned),
            Some("custom".into()),
            Some(json!({})),
        )
        .expect("valid report");
        assert_eq!(report.reporter.as_str(), ANONYMOUS_REPORTER);
    }

    #[rstest]
    fn type_is_kept_verbatim() {
        let report = NewReport::try_new(None, Some(" Returns ".into()), Some(json!({"a": 1})))
            .expect("unknown types accept any object");
        assert_eq!(report.report_type.as_str(), " Returns ");
        assert!(report.report_type.kind().is_none());
    }

    #[rstest]
    fn known_kind_payload_is_checked() {
        let err = NewReport::try_new(None, Some("returns".into()), Some(json!({"items": []})))
            .expect_err("returns requires reportDate");
        assert!(matches!(
            err,
            ReportValidationError::PayloadShape {
                kind: ReportKind::Returns,
                ..
            }
        ));
    }

    #[rstest]
    #[case(json!({"reportDate": "2024-05-01"}), Some("2024-05-01"))]
    #[case(json!({"reportDate": ""}), None)]
    #[case(json!({"reportDate": 20240501}), None)]
    #[case(json!({}), None)]
    fn report_date_requires_non_empty_string(#[case] payload: Value, #[case] expected: Option<&str>) {
        let payload = ReportPayload::try_from_value(payload).expect("object payload");
        assert_eq!(
            payload.report_date().as_ref().map(ReportDate::as_str),
            expected
        );
    }

    #[rstest]
    fn validation_errors_become_invalid_payload() {
        let err: crate::domain::Error = ReportValidationError::MissingPayload.into();
        assert_eq!(err.code(), crate::domain::ErrorCode::InvalidRequest);
        assert_eq!(err.message(), INVALID_PAYLOAD_MESSAGE);
        assert_eq!(
            err.details(),
            Some(&json!({"field": "payload", "reason": "payload is required"}))
        );
    }

    #[rstest]
    fn report_serialises_with_wire_field_names() {
        let report = Report {
            id: ReportId::new(7),
            reporter: Reporter::anonymous(),
            report_type: ReportType::new("returns").expect("valid type"),
            payload: ReportPayload::new(Map::new()),
            created_at: DateTime::<Utc>::UNIX_EPOCH,
        };
        let value = serde_json::to_value(&report).expect("serialise report");
        assert_eq!(
            value,
            json!({
                "id": 7,
                "reporter": "anonymous",
                "type": "returns",
                "payload": {},
                "created_at": "1970-01-01T00:00:00Z",
            })
        );
        let back: Report = serde_json::from_value(value).expect("deserialise report");
        assert_eq!(back, report);
    }
}
