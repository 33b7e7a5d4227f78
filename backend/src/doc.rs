//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every HTTP endpoint from the inbound layer together
//! with the request, response and error envelope schemas. The document is
//! served by Swagger UI in debug builds and exported by
//! `cargo run --bin openapi-dump`.

use utoipa::OpenApi;

use crate::inbound::http::error::ErrorEnvelope;
use crate::inbound::http::health::DbHealthResponse;
use crate::inbound::http::reports::{
    CreateReportResponseBody, DeleteReportsResponse, ListReportsResponse, ReportRequest,
    ReportResponse, UpsertReportResponseBody,
};
use crate::inbound::http::schemas::ErrorCodeSchema;

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Report store API",
        description = "Stores operational reports submitted by browser forms and lists them back."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    paths(
        crate::inbound::http::reports::list_reports,
        crate::inbound::http::reports::create_report,
        crate::inbound::http::reports::upsert_report,
        crate::inbound::http::reports::delete_reports,
        crate::inbound::http::health::root,
        crate::inbound::http::health::db_health,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        ReportRequest,
        ReportResponse,
        ListReportsResponse,
        CreateReportResponseBody,
        UpsertReportResponseBody,
        DeleteReportsResponse,
        DbHealthResponse,
        ErrorEnvelope,
        ErrorCodeSchema
    )),
    tags(
        (name = "reports", description = "Report submission and retrieval"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
