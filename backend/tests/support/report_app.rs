//! In-process report store app wired to in-memory adapters.
//!
//! Each call to [`ReportApp::send`] builds a fresh Actix service over the
//! same shared repositories, so state persists across requests within a test
//! without naming the service type.

use std::sync::Arc;

use actix_web::body::MessageBody;
use actix_web::http::StatusCode;
use actix_web::http::header::HeaderMap;
use actix_web::web::Bytes;
use actix_web::{App, test, web};
use report_store::Trace;
use report_store::domain::ReportService;
use report_store::inbound::http::configure;
use report_store::inbound::http::cors::{CorsPolicy, build_cors};
use report_store::inbound::http::health::HealthState;
use report_store::inbound::http::state::HttpState;
use report_store::test_support::{
    InMemoryIdempotencyRepository, InMemoryReportRepository, SwitchableConnectivityProbe,
};
use serde_json::Value;

pub struct ReportApp {
    pub reports: Arc<InMemoryReportRepository>,
    pub idempotency: Arc<InMemoryIdempotencyRepository>,
    pub probe: Arc<SwitchableConnectivityProbe>,
    pub health: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
}

impl ReportApp {
    pub fn new() -> Self {
        let idempotency = Arc::new(InMemoryIdempotencyRepository::default());
        let reports = Arc::new(InMemoryReportRepository::with_idempotency(
            idempotency.clone(),
        ));
        let probe = Arc::new(SwitchableConnectivityProbe::default());
        let service = Arc::new(ReportService::new(reports.clone(), idempotency.clone()));
        let http_state = web::Data::new(HttpState::new(
            service.clone(),
            service,
            probe.clone(),
        ));
        Self {
            reports,
            idempotency,
            probe,
            health: web::Data::new(HealthState::new()),
            http_state,
        }
    }

    pub async fn send(&self, request: test::TestRequest) -> CapturedResponse {
        let app = test::init_service(
            App::new()
                .app_data(self.health.clone())
                .app_data(self.http_state.clone())
                .wrap(build_cors(CorsPolicy::default()))
                .wrap(Trace)
                .configure(configure),
        )
        .await;
        let response = test::call_service(&app, request.to_request()).await;
        let status = response.status();
        let headers = response.headers().clone();
        let body = read_body(response.into_body()).await;
        CapturedResponse {
            status,
            headers,
            body,
        }
    }
}

async fn read_body<B: MessageBody>(body: B) -> Bytes {
    match actix_web::body::to_bytes(body).await {
        Ok(bytes) => bytes,
        Err(_) => panic!("response body should be readable"),
    }
}

/// Status, headers and body of a finished request.
pub struct CapturedResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl CapturedResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("JSON body")
    }

    pub fn text(&self) -> String {
        String::from_utf8(self.body.to_vec()).expect("UTF-8 body")
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }
}
