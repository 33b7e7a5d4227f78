//! Registry of known report types and their payload shapes.
//!
//! Each kind deserialises the payload into a typed struct to check required
//! fields. The struct is discarded afterwards; the stored payload keeps every
//! field verbatim, including ones the struct does not declare.

use std::fmt;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::report::ReportValidationError;

/// Report types with a registered payload shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportKind {
    Returns,
    ProdCleaningChecklist,
    QcsCorrectiveAction,
    MaintenanceRequest,
    OhcRecord,
    PosDailyInspection,
    TrainingRecord,
}

impl ReportKind {
    pub const ALL: [Self; 7] = [
        Self::Returns,
        Self::ProdCleaningChecklist,
        Self::QcsCorrectiveAction,
        Self::MaintenanceRequest,
        Self::OhcRecord,
        Self::PosDailyInspection,
        Self::TrainingRecord,
    ];

    /// Wire value of the `type` discriminator.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Returns => "returns",
            Self::ProdCleaningChecklist => "prod_cleaning_checklist",
            Self::QcsCorrectiveAction => "qcs_corrective_action",
            Self::MaintenanceRequest => "maintenance_request",
            Self::OhcRecord => "ohc_record",
            Self::PosDailyInspection => "pos_daily_inspection",
            Self::TrainingRecord => "training_record",
        }
    }

    /// Exact, case-sensitive lookup.
    pub fn from_type(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == value)
    }

    /// Check that `payload` carries the fields this kind requires.
    pub fn validate(self, payload: &Map<String, Value>) -> Result<(), ReportValidationError> {
        match self {
            Self::Returns => check::<ReturnsPayload>(self, payload),
            Self::ProdCleaningChecklist => check::<ChecklistPayload>(self, payload),
            Self::QcsCorrectiveAction => check::<CorrectiveActionPayload>(self, payload),
            Self::MaintenanceRequest => check::<MaintenanceRequestPayload>(self, payload),
            Self::OhcRecord => check::<OhcRecordPayload>(self, payload),
            Self::PosDailyInspection => check::<BranchInspectionPayload>(self, payload),
            Self::TrainingRecord => check::<TrainingRecordPayload>(self, payload),
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn check<T: DeserializeOwned>(
    kind: ReportKind,
    payload: &Map<String, Value>,
) -> Result<(), ReportValidationError> {
    serde_json::from_value::<T>(Value::Object(payload.clone()))
        .map(drop)
        .map_err(|err| ReportValidationError::PayloadShape {
            kind,
            reason: err.to_string(),
        })
}

/// String field that must contain something other than whitespace.
#[derive(Debug, Deserialize)]
#[serde(try_from = "String")]
struct NonBlank(#[expect(dead_code, reason = "only the blank check matters")] String);

impl TryFrom<String> for NonBlank {
    type Error = &'static str;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.trim().is_empty() {
            Err("value must not be blank")
        } else {
            Ok(Self(value))
        }
    }
}

#[expect(dead_code, reason = "fields are only checked during deserialisation")]
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReturnsPayload {
    report_date: NonBlank,
    items: Vec<ReturnLine>,
}

#[expect(dead_code, reason = "fields are only checked during deserialisation")]
#[derive(Debug, Deserialize)]
struct ReturnLine {
    sku: NonBlank,
    qty: f64,
}

#[expect(dead_code, reason = "fields are only checked during deserialisation")]
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChecklistPayload {
    report_date: NonBlank,
    items: Vec<Value>,
}

#[expect(dead_code, reason = "fields are only checked during deserialisation")]
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CorrectiveActionPayload {
    report_date: NonBlank,
}

#[expect(dead_code, reason = "fields are only checked during deserialisation")]
#[derive(Debug, Deserialize)]
struct MaintenanceRequestPayload {
    branch: NonBlank,
    description: NonBlank,
}

#[expect(dead_code, reason = "fields are only checked during deserialisation")]
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OhcRecordPayload {
    employee_name: NonBlank,
    expiry_date: NonBlank,
}

#[expect(dead_code, reason = "fields are only checked during deserialisation")]
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BranchInspectionPayload {
    branch: NonBlank,
    report_date: NonBlank,
}

#[expect(dead_code, reason = "fields are only checked during deserialisation")]
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TrainingRecordPayload {
    trainee_name: NonBlank,
    report_date: NonBlank,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[rstest]
    fn lookup_is_exact_and_case_sensitive() {
        for kind in ReportKind::ALL {
            assert_eq!(ReportKind::from_type(kind.as_str()), Some(kind));
        }
        assert_eq!(ReportKind::from_type("Returns"), None);
        assert_eq!(ReportKind::from_type("returns "), None);
    }

    #[rstest]
    #[case(ReportKind::Returns, json!({"reportDate": "2024-05-01", "items": [{"sku": "A1", "qty": 2}]}))]
    #[case(ReportKind::Returns, json!({"reportDate": "2024-05-01", "items": [], "note": "extra"}))]
    #[case(ReportKind::ProdCleaningChecklist, json!({"reportDate": "2024-05-01", "items": [{"area": "oven", "done": true}]}))]
    #[case(ReportKind::QcsCorrectiveAction, json!({"reportDate": "2024-05-01", "image": "data:image/png;base64,AAAA"}))]
    #[case(ReportKind::MaintenanceRequest, json!({"branch": "QCS", "description": "Leaking tap"}))]
    #[case(ReportKind::OhcRecord, json!({"employeeName": "Sara", "expiryDate": "2025-01-31"}))]
    #[case(ReportKind::PosDailyInspection, json!({"branch": "POS 10", "reportDate": "2024-05-01"}))]
    #[case(ReportKind::TrainingRecord, json!({"traineeName": "Ali", "reportDate": "2024-05-01"}))]
    fn accepts_well_formed_payloads(#[case] kind: ReportKind, #[case] payload: Value) {
        kind.validate(&object(payload)).expect("payload should validate");
    }

    #[rstest]
    #[case(ReportKind::Returns, json!({"items": []}))]
    #[case(ReportKind::Returns, json!({"reportDate": "2024-05-01", "items": [{"sku": "A1", "qty": "2"}]}))]
    #[case(ReportKind::Returns, json!({"reportDate": "2024-05-01", "items": [{"qty": 2}]}))]
    #[case(ReportKind::ProdCleaningChecklist, json!({"reportDate": "2024-05-01"}))]
    #[case(ReportKind::QcsCorrectiveAction, json!({"reportDate": "  "}))]
    #[case(ReportKind::MaintenanceRequest, json!({"branch": "QCS"}))]
    #[case(ReportKind::OhcRecord, json!({"employeeName": "Sara"}))]
    #[case(ReportKind::PosDailyInspection, json!({"reportDate": "2024-05-01"}))]
    #[case(ReportKind::TrainingRecord, json!({"traineeName": 5, "reportDate": "2024-05-01"}))]
    fn rejects_malformed_payloads(#[case] kind: ReportKind, #[case] payload: Value) {
        let err = kind.validate(&object(payload)).expect_err("payload should fail");
        assert!(
            matches!(err, ReportValidationError::PayloadShape { kind: k, .. } if k == kind),
            "unexpected error: {err:?}"
        );
    }
}
