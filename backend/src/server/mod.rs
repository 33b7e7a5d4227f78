//! Server construction and middleware wiring.

mod config;

pub use config::{ServerConfig, ServerSettings};

use std::sync::Arc;

use actix_web::dev::Server;
use actix_web::{App, HttpServer, web};
use tracing::info;

use report_store::Trace;
#[cfg(debug_assertions)]
use report_store::doc::ApiDoc;
use report_store::domain::{IdempotencyTtl, ReportService};
use report_store::inbound::http::configure;
use report_store::inbound::http::cors::build_cors;
use report_store::inbound::http::health::HealthState;
use report_store::inbound::http::state::HttpState;
use report_store::outbound::persistence::{
    DbPool, DieselConnectivityProbe, DieselIdempotencyRepository, DieselReportRepository,
};
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

/// Report service backed by the Diesel adapters.
pub type DieselReportService = ReportService<DieselReportRepository, DieselIdempotencyRepository>;

/// Wire the domain service onto the pool.
pub fn build_report_service(
    pool: &DbPool,
    idempotency_ttl: IdempotencyTtl,
) -> Arc<DieselReportService> {
    Arc::new(
        ReportService::new(
            Arc::new(DieselReportRepository::new(pool.clone())),
            Arc::new(DieselIdempotencyRepository::new(pool.clone())),
        )
        .with_idempotency_ttl(idempotency_ttl),
    )
}

fn build_http_state(service: Arc<DieselReportService>, pool: DbPool) -> web::Data<HttpState> {
    web::Data::new(HttpState::new(
        service.clone(),
        service,
        Arc::new(DieselConnectivityProbe::new(pool)),
    ))
}

/// Construct an Actix HTTP server using the provided health state and
/// configuration.
///
/// # Errors
/// Propagates [`std::io::Error`] when binding the socket fails.
pub fn create_server(
    health_state: web::Data<HealthState>,
    service: Arc<DieselReportService>,
    config: ServerConfig,
) -> std::io::Result<Server> {
    let ServerConfig {
        bind_addr,
        cors,
        db_pool,
    } = config;
    let http_state = build_http_state(service, db_pool);
    let server_health_state = health_state.clone();

    let server = HttpServer::new(move || {
        let app = App::new()
            .app_data(server_health_state.clone())
            .app_data(http_state.clone())
            .wrap(build_cors(cors.clone()))
            .wrap(Trace)
            .configure(configure);

        #[cfg(debug_assertions)]
        let app =
            app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));

        app
    })
    .bind(bind_addr)?
    .run();

    info!(%bind_addr, "report store listening");
    health_state.mark_ready();
    Ok(server)
}
