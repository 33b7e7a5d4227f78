//! Driven port for checking that storage answers a trivial round-trip.

use async_trait::async_trait;

use super::define_port_error;

define_port_error! {
    /// Errors raised when storage cannot be reached.
    pub enum ConnectivityProbeError {
        Unavailable { message: String } => "storage unavailable: {message}",
    }
}

/// Performs one round-trip against storage, without retries.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConnectivityProbe: Send + Sync {
    async fn ping(&self) -> Result<(), ConnectivityProbeError>;
}

/// Probe that always succeeds.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureConnectivityProbe;

#[async_trait]
impl ConnectivityProbe for FixtureConnectivityProbe {
    async fn ping(&self) -> Result<(), ConnectivityProbeError> {
        Ok(())
    }
}
