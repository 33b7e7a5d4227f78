//! Driving port for report reads.

use async_trait::async_trait;

use crate::domain::{Error, Report, ReportType};

/// Read side of the report store.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReportQuery: Send + Sync {
    /// Newest reports first, capped at the service list limit, optionally
    /// restricted to one type.
    async fn list(&self, report_type: Option<ReportType>) -> Result<Vec<Report>, Error>;
}
