//! Shared HTTP adapter state.
//!
//! Handlers accept this state via `actix_web::web::Data` so they only depend
//! on domain ports and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{ConnectivityProbe, ReportCommand, ReportQuery};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub reports: Arc<dyn ReportCommand>,
    pub reports_query: Arc<dyn ReportQuery>,
    pub connectivity: Arc<dyn ConnectivityProbe>,
}

impl HttpState {
    /// Construct state from port implementations.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    ///
    /// use report_store::domain::ReportService;
    /// use report_store::domain::ports::FixtureConnectivityProbe;
    /// use report_store::inbound::http::state::HttpState;
    /// use report_store::test_support::{InMemoryIdempotencyRepository, InMemoryReportRepository};
    ///
    /// let service = Arc::new(ReportService::new(
    ///     Arc::new(InMemoryReportRepository::default()),
    ///     Arc::new(InMemoryIdempotencyRepository::default()),
    /// ));
    /// let state = HttpState::new(service.clone(), service, Arc::new(FixtureConnectivityProbe));
    /// let _reports = state.reports.clone();
    /// ```
    pub fn new(
        reports: Arc<dyn ReportCommand>,
        reports_query: Arc<dyn ReportQuery>,
        connectivity: Arc<dyn ConnectivityProbe>,
    ) -> Self {
        Self {
            reports,
            reports_query,
            connectivity,
        }
    }
}
