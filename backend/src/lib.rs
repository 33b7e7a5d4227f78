//! Report store library modules.
//!
//! A small HTTP service that stores operational reports as JSON documents
//! in PostgreSQL. The crate follows a hexagonal layout: [`domain`] holds
//! the types, services and ports; [`inbound`] and [`outbound`] hold the
//! Actix and Diesel adapters.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
#[cfg(feature = "test-support")]
pub mod test_support;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use domain::TraceId;
pub use middleware::Trace;
