//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Concrete implementations of the driven ports backed by PostgreSQL via
//! `diesel-async` and `bb8` pooling.
//!
//! - **Thin adapters**: repositories only translate between Diesel rows and
//!   domain types. Validation lives in the domain.
//! - **Internal models**: row structs (`models.rs`) and table definitions
//!   (`schema.rs`) never leave this module.
//! - **Typed errors**: pool and Diesel failures are mapped onto port errors;
//!   driver messages are only logged.
//!
//! # Example
//!
//! ```no_run
//! use report_store::outbound::persistence::{DbPool, DieselReportRepository, PoolConfig};
//!
//! # async fn wire() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/reports")).await?;
//! let reports = DieselReportRepository::new(pool);
//! # let _ = reports;
//! # Ok(())
//! # }
//! ```

mod diesel_connectivity_probe;
mod diesel_error_mapping;
mod diesel_idempotency_repository;
mod diesel_report_repository;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_connectivity_probe::DieselConnectivityProbe;
pub use diesel_idempotency_repository::DieselIdempotencyRepository;
pub use diesel_report_repository::DieselReportRepository;
pub use migrations::{MigrationError, run_pending_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
