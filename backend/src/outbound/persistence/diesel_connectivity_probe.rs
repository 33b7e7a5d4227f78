//! `SELECT 1` round-trip backing the database health endpoint.

use async_trait::async_trait;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{ConnectivityProbe, ConnectivityProbeError};

use super::diesel_error_mapping::{map_diesel_error, map_pool_error};
use super::pool::DbPool;

/// Probe that checks out a pooled connection and runs a trivial statement.
#[derive(Clone)]
pub struct DieselConnectivityProbe {
    pool: DbPool,
}

impl DieselConnectivityProbe {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ConnectivityProbe for DieselConnectivityProbe {
    async fn ping(&self) -> Result<(), ConnectivityProbeError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::sql_query("SELECT 1")
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }
}
