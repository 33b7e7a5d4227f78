//! HTTP inbound adapter exposing the report store endpoints.
//!
//! Handlers translate requests into driving-port calls and never touch
//! storage directly. [`configure`] mounts every route; the server and the
//! integration tests share it so both see the same surface.

pub mod cors;
pub mod error;
pub mod health;
pub mod idempotency;
pub mod reports;
pub mod schemas;
pub mod state;
pub mod validation;

use actix_web::web;

pub use error::ApiResult;

/// Register routes and extractor configuration.
///
/// Expects `web::Data<state::HttpState>` and `web::Data<health::HealthState>`
/// to be registered on the app.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(health::root)
        .service(health::db_health)
        .service(health::ready)
        .service(health::live)
        .service(
            web::scope("/api")
                .app_data(web::JsonConfig::default().error_handler(validation::json_error_handler))
                .app_data(
                    web::QueryConfig::default().error_handler(validation::query_error_handler),
                )
                .service(reports::list_reports)
                .service(reports::create_report)
                .service(reports::upsert_report)
                .service(reports::delete_reports),
        );
}
