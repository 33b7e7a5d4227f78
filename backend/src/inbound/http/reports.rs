//! Report store HTTP handlers.
//!
//! ```text
//! GET    /api/reports?type=...
//! POST   /api/reports
//! PUT    /api/reports
//! DELETE /api/reports?type=...&reportDate=...
//! ```

use actix_web::{HttpRequest, HttpResponse, delete, get, post, put, web};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};

use crate::domain::ports::{CreateReportRequest, DeleteReportsRequest};
use crate::domain::{Error, NewReport, Report, ReportDate, ReportType};
use crate::inbound::http::ApiResult;
use crate::inbound::http::error::ErrorEnvelope;
use crate::inbound::http::idempotency::{
    REPLAYED_HEADER, extract_idempotency_key, map_idempotency_key_error,
};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, missing_fields_error, non_empty};

const TYPE_FIELD: FieldName = FieldName::new("type");
const REPORT_DATE_FIELD: FieldName = FieldName::new("reportDate");

/// Message returned when delete is missing a filter.
pub const DELETE_FILTER_REQUIRED: &str = "type and reportDate are required";

/// Body accepted by create and upsert.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct ReportRequest {
    /// Author; defaults to `anonymous` when absent or blank.
    pub reporter: Option<String>,
    /// Report type discriminator.
    #[serde(rename = "type")]
    pub report_type: Option<String>,
    /// Report body; must be a JSON object.
    #[schema(value_type = Option<Object>)]
    pub payload: Option<Value>,
}

impl ReportRequest {
    fn into_new_report(self) -> Result<NewReport, Error> {
        NewReport::try_new(self.reporter, self.report_type, self.payload).map_err(Error::from)
    }
}

/// Stored report as returned to clients.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReportResponse {
    pub id: i64,
    pub reporter: String,
    #[serde(rename = "type")]
    pub report_type: String,
    #[schema(value_type = Object)]
    pub payload: Value,
    /// RFC 3339 insertion timestamp.
    pub created_at: String,
}

impl From<Report> for ReportResponse {
    fn from(value: Report) -> Self {
        Self {
            id: value.id.get(),
            reporter: value.reporter.as_str().to_owned(),
            report_type: value.report_type.into(),
            payload: value.payload.into_value(),
            created_at: value.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListReportsResponse {
    pub ok: bool,
    pub data: Vec<ReportResponse>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreateReportResponseBody {
    pub ok: bool,
    pub report: ReportResponse,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UpsertReportResponseBody {
    pub ok: bool,
    pub report: ReportResponse,
    /// Rows with the same type and `reportDate` that were removed.
    pub replaced: u64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DeleteReportsResponse {
    pub ok: bool,
    pub deleted: u64,
}

/// Query accepted by list.
#[derive(Debug, Deserialize, IntoParams)]
pub struct ListReportsQuery {
    /// Exact, case-sensitive type filter. Empty means no filter.
    #[serde(rename = "type")]
    pub report_type: Option<String>,
}

/// Query accepted by delete.
#[derive(Debug, Deserialize, IntoParams)]
pub struct DeleteReportsQuery {
    #[serde(rename = "type")]
    pub report_type: Option<String>,
    #[serde(rename = "reportDate")]
    pub report_date: Option<String>,
}

/// Filter for list.
#[derive(Debug, PartialEq, Eq)]
enum ListFilter {
    All,
    Type(ReportType),
    /// Whitespace-only type: no stored report can match.
    Nothing,
}

fn parse_list_filter(query: ListReportsQuery) -> ListFilter {
    match non_empty(query.report_type).map(ReportType::new) {
        None => ListFilter::All,
        Some(Ok(report_type)) => ListFilter::Type(report_type),
        Some(Err(_)) => ListFilter::Nothing,
    }
}

fn parse_delete_filter(query: DeleteReportsQuery) -> Result<DeleteReportsRequest, Error> {
    let report_type = non_empty(query.report_type);
    let report_date = non_empty(query.report_date).and_then(ReportDate::new);

    match (report_type, report_date) {
        (Some(report_type), Some(report_date)) => Ok(DeleteReportsRequest {
            report_type: ReportType::new(report_type)
                .map_err(|_| missing_fields_error(DELETE_FILTER_REQUIRED, &[TYPE_FIELD]))?,
            report_date,
        }),
        (report_type, report_date) => {
            let mut missing = Vec::with_capacity(2);
            if report_type.is_none() {
                missing.push(TYPE_FIELD);
            }
            if report_date.is_none() {
                missing.push(REPORT_DATE_FIELD);
            }
            Err(missing_fields_error(DELETE_FILTER_REQUIRED, &missing))
        }
    }
}

/// List the most recent reports.
#[utoipa::path(
    get,
    path = "/api/reports",
    params(ListReportsQuery),
    responses(
        (status = 200, description = "Up to 50 reports, newest first", body = ListReportsResponse),
        (status = 503, description = "Storage unavailable", body = ErrorEnvelope),
        (status = 500, description = "Internal server error", body = ErrorEnvelope)
    ),
    tags = ["reports"],
    operation_id = "listReports"
)]
#[get("/reports")]
pub async fn list_reports(
    state: web::Data<HttpState>,
    query: web::Query<ListReportsQuery>,
) -> ApiResult<web::Json<ListReportsResponse>> {
    let reports = match parse_list_filter(query.into_inner()) {
        ListFilter::All => state.reports_query.list(None).await?,
        ListFilter::Type(report_type) => state.reports_query.list(Some(report_type)).await?,
        ListFilter::Nothing => Vec::new(),
    };
    Ok(web::Json(ListReportsResponse {
        ok: true,
        data: reports.into_iter().map(ReportResponse::from).collect(),
    }))
}

/// Store a new report.
#[utoipa::path(
    post,
    path = "/api/reports",
    request_body = ReportRequest,
    params(
        ("X-Idempotency-Key" = Option<String>, Header, description = "UUID making retries safe")
    ),
    responses(
        (
            status = 201,
            description = "Report stored (or replayed)",
            headers(("Idempotent-Replayed" = String, description = "`true` when replayed")),
            body = CreateReportResponseBody
        ),
        (status = 400, description = "Invalid payload", body = ErrorEnvelope),
        (status = 409, description = "Idempotency key reused with a different body", body = ErrorEnvelope),
        (status = 503, description = "Storage unavailable", body = ErrorEnvelope)
    ),
    tags = ["reports"],
    operation_id = "createReport"
)]
#[post("/reports")]
pub async fn create_report(
    state: web::Data<HttpState>,
    request: HttpRequest,
    payload: web::Json<ReportRequest>,
) -> ApiResult<HttpResponse> {
    let idempotency_key =
        extract_idempotency_key(request.headers()).map_err(map_idempotency_key_error)?;
    let report = payload.into_inner().into_new_report()?;

    let response = state
        .reports
        .create(CreateReportRequest {
            report,
            idempotency_key,
        })
        .await?;

    let mut builder = HttpResponse::Created();
    if response.replayed {
        builder.insert_header((REPLAYED_HEADER, "true"));
    }
    Ok(builder.json(CreateReportResponseBody {
        ok: true,
        report: ReportResponse::from(response.report),
    }))
}

/// Replace the reports sharing a type and `payload.reportDate`.
#[utoipa::path(
    put,
    path = "/api/reports",
    request_body = ReportRequest,
    responses(
        (status = 200, description = "Report stored", body = UpsertReportResponseBody),
        (status = 400, description = "Invalid payload", body = ErrorEnvelope),
        (status = 503, description = "Storage unavailable", body = ErrorEnvelope)
    ),
    tags = ["reports"],
    operation_id = "upsertReport"
)]
#[put("/reports")]
pub async fn upsert_report(
    state: web::Data<HttpState>,
    payload: web::Json<ReportRequest>,
) -> ApiResult<web::Json<UpsertReportResponseBody>> {
    let report = payload.into_inner().into_new_report()?;
    let response = state.reports.upsert(report).await?;
    Ok(web::Json(UpsertReportResponseBody {
        ok: true,
        report: ReportResponse::from(response.report),
        replaced: response.replaced,
    }))
}

/// Delete every report with the given type and `payload.reportDate`.
#[utoipa::path(
    delete,
    path = "/api/reports",
    params(DeleteReportsQuery),
    responses(
        (status = 200, description = "Rows removed (may be zero)", body = DeleteReportsResponse),
        (status = 400, description = "Missing filter", body = ErrorEnvelope),
        (status = 503, description = "Storage unavailable", body = ErrorEnvelope)
    ),
    tags = ["reports"],
    operation_id = "deleteReports"
)]
#[delete("/reports")]
pub async fn delete_reports(
    state: web::Data<HttpState>,
    query: web::Query<DeleteReportsQuery>,
) -> ApiResult<web::Json<DeleteReportsResponse>> {
    let request = parse_delete_filter(query.into_inner())?;
    let deleted = state.reports.delete_by_type_and_date(request).await?;
    Ok(web::Json(DeleteReportsResponse { ok: true, deleted }))
}
