//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driving ports ([`ReportCommand`], [`ReportQuery`]) are consumed by inbound
//! adapters. Driven ports ([`ReportRepository`], [`IdempotencyRepository`],
//! [`ConnectivityProbe`]) are implemented by outbound adapters and expose
//! typed errors rather than adapter-specific ones.

mod macros;
pub(crate) use macros::define_port_error;

mod connectivity_probe;
mod idempotency_repository;
mod report_command;
mod report_query;
mod report_repository;

#[cfg(test)]
pub use connectivity_probe::MockConnectivityProbe;
pub use connectivity_probe::{
    ConnectivityProbe, ConnectivityProbeError, FixtureConnectivityProbe,
};
#[cfg(test)]
pub use idempotency_repository::MockIdempotencyRepository;
pub use idempotency_repository::{
    FixtureIdempotencyRepository, IdempotencyRepository, IdempotencyRepositoryError,
};
#[cfg(test)]
pub use report_command::MockReportCommand;
pub use report_command::{
    CreateReportRequest, CreateReportResponse, DeleteReportsRequest, ReportCommand,
    UpsertReportResponse,
};
#[cfg(test)]
pub use report_query::MockReportQuery;
pub use report_query::ReportQuery;
#[cfg(test)]
pub use report_repository::MockReportRepository;
pub use report_repository::{IdempotencyClaim, ReportRepository, ReportRepositoryError};
