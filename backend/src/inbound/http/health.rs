//! Health endpoints: orchestration probes, the database check and the
//! plain-text banner.
//!
//! `/health/ready` and `/health/live` read process flags only. `/health/db`
//! performs exactly one storage round-trip through the connectivity port and
//! never retries.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};

use actix_web::{HttpResponse, get, http::header, web};
use serde::Serialize;
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::domain::Error;
use crate::inbound::http::ApiResult;
use crate::inbound::http::state::HttpState;

/// Text served at `/`.
pub const BANNER: &str = "report-store is running";

/// Track readiness and whether the process should report itself as alive.
pub struct HealthState {
    ready: AtomicBool,
    live: AtomicBool,
}

impl Default for HealthState {
    fn default() -> Self {
        Self {
            ready: AtomicBool::new(false),
            live: AtomicBool::new(true),
        }
    }
}

impl HealthState {
    /// Create a new health state starting as not ready but live.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the service as ready once the listener is bound.
    pub fn mark_ready(&self) {
        self.ready.store(true, Ordering::Release);
    }

    /// Flag the service as draining so liveness checks fail fast.
    pub fn mark_unhealthy(&self) {
        self.live.store(false, Ordering::Release);
    }

    /// Wait for `shutdown`, then mark the process as draining.
    ///
    /// In-flight requests keep being served; only `/health/live` changes.
    pub async fn drain_on<F>(&self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        shutdown.await;
        self.mark_unhealthy();
        info!("shutdown requested; liveness probe now failing");
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    pub fn is_alive(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }

    fn probe_response(probe_ok: bool) -> HttpResponse {
        let mut response = if probe_ok {
            HttpResponse::Ok()
        } else {
            HttpResponse::ServiceUnavailable()
        };

        response
            .insert_header((header::CACHE_CONTROL, "no-store"))
            .finish()
    }
}

/// Body returned by a successful database check.
#[derive(Debug, Serialize, ToSchema)]
pub struct DbHealthResponse {
    pub ok: bool,
    #[schema(example = "connected")]
    pub db: &'static str,
}

/// Readiness probe.
#[utoipa::path(
    get,
    path = "/health/ready",
    tags = ["health"],
    responses(
        (status = 200, description = "Server is ready to handle traffic"),
        (status = 503, description = "Server is not ready")
    )
)]
#[get("/health/ready")]
pub async fn ready(state: web::Data<HealthState>) -> HttpResponse {
    HealthState::probe_response(state.is_ready())
}

/// Liveness probe. Returns 503 once the process is draining.
#[utoipa::path(
    get,
    path = "/health/live",
    tags = ["health"],
    responses(
        (status = 200, description = "Server is alive"),
        (status = 503, description = "Server is shutting down")
    )
)]
#[get("/health/live")]
pub async fn live(state: web::Data<HealthState>) -> HttpResponse {
    HealthState::probe_response(state.is_alive())
}

/// Database connectivity check: one trivial query through the pool.
#[utoipa::path(
    get,
    path = "/health/db",
    tags = ["health"],
    responses(
        (status = 200, description = "Database reachable", body = DbHealthResponse),
        (status = 503, description = "Database unreachable", body = crate::inbound::http::error::ErrorEnvelope)
    )
)]
#[get("/health/db")]
pub async fn db_health(state: web::Data<HttpState>) -> ApiResult<HttpResponse> {
    state.connectivity.ping().await.map_err(|err| {
        warn!(error = %err, "database health check failed");
        Error::service_unavailable("database unavailable")
    })?;
    Ok(HttpResponse::Ok()
        .insert_header((header::CACHE_CONTROL, "no-store"))
        .json(DbHealthResponse {
            ok: true,
            db: "connected",
        }))
}

/// Plain-text liveness banner.
#[utoipa::path(
    get,
    path = "/",
    tags = ["health"],
    responses((status = 200, description = "Service banner", body = String, content_type = "text/plain"))
)]
#[get("/")]
pub async fn root() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body(BANNER)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::{App, http::StatusCode, test};
    use rstest::rstest;
    use serde_json::{Value, json};

    use super::*;
    use crate::domain::ports::{
        ConnectivityProbeError, FixtureConnectivityProbe, MockConnectivityProbe,
        MockReportCommand, MockReportQuery,
    };

    fn http_state(probe: Arc<dyn crate::domain::ports::ConnectivityProbe>) -> HttpState {
        HttpState::new(
            Arc::new(MockReportCommand::new()),
            Arc::new(MockReportQuery::new()),
            probe,
        )
    }

    #[rstest]
    #[case(false, StatusCode::SERVICE_UNAVAILABLE)]
    #[case(true, StatusCode::OK)]
    #[actix_web::test]
    async fn readiness_follows_flag(#[case] mark: bool, #[case] expected: StatusCode) {
        let health = web::Data::new(HealthState::new());
        if mark {
            health.mark_ready();
        }
        let app = test::init_service(App::new().app_data(health).service(ready)).await;
        let res = test::call_service(&app, test::TestRequest::get().uri("/health/ready").to_request())
            .await;
        assert_eq!(res.status(), expected);
        assert_eq!(
            res.headers().get(header::CACHE_CONTROL).and_then(|v| v.to_str().ok()),
            Some("no-store")
        );
    }

    #[actix_web::test]
    async fn liveness_fails_once_draining() {
        let health = web::Data::new(HealthState::new());
        health.mark_unhealthy();
        let app = test::init_service(App::new().app_data(health).service(live)).await;
        let res =
            test::call_service(&app, test::TestRequest::get().uri("/health/live").to_request())
                .await;
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[actix_web::test]
    async fn liveness_flips_when_shutdown_is_signalled() {
        let health = web::Data::new(HealthState::new());
        let (signal, shutdown) = tokio::sync::oneshot::channel::<()>();
        let draining = actix_web::rt::spawn({
            let health = health.clone();
            async move {
                health
                    .drain_on(async {
                        let _ = shutdown.await;
                    })
                    .await;
            }
        });
        let app = test::init_service(App::new().app_data(health.clone()).service(live)).await;

        let before =
            test::call_service(&app, test::TestRequest::get().uri("/health/live").to_request())
                .await;
        assert_eq!(before.status(), StatusCode::OK);

        signal.send(()).expect("drain task is waiting");
        draining.await.expect("drain task completes");

        let after =
            test::call_service(&app, test::TestRequest::get().uri("/health/live").to_request())
                .await;
        assert_eq!(after.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[actix_web::test]
    async fn db_health_reports_connected() {
        let state = web::Data::new(http_state(Arc::new(FixtureConnectivityProbe)));
        let app = test::init_service(App::new().app_data(state).service(db_health)).await;
        let res =
            test::call_service(&app, test::TestRequest::get().uri("/health/db").to_request()).await;
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body, json!({"ok": true, "db": "connected"}));
    }

    #[actix_web::test]
    async fn db_health_pings_once_and_reports_unavailable() {
        let mut probe = MockConnectivityProbe::new();
        probe
            .expect_ping()
            .times(1)
            .returning(|| Err(ConnectivityProbeError::unavailable("connection refused")));
        let state = web::Data::new(http_state(Arc::new(probe)));
        let app = test::init_service(App::new().app_data(state).service(db_health)).await;
        let res =
            test::call_service(&app, test::TestRequest::get().uri("/health/db").to_request()).await;
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["ok"], json!(false));
        assert_eq!(body["code"], json!("service_unavailable"));
    }

    #[actix_web::test]
    async fn root_serves_plain_text_banner() {
        let app = test::init_service(App::new().service(root)).await;
        let res = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
        assert_eq!(res.status(), StatusCode::OK);
        let body = test::read_body(res).await;
        assert_eq!(body.as_ref(), BANNER.as_bytes());
    }
}
