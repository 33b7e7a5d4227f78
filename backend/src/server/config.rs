//! Server settings loaded via OrthoConfig, and the builder handed to
//! [`super::create_server`].
//!
//! Every setting can come from the command line, a configuration file or a
//! `REPORT_STORE_*` environment variable.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;

use report_store::domain::{DEFAULT_IDEMPOTENCY_TTL_HOURS, IdempotencyTtl};
use report_store::inbound::http::cors::{
    CorsPolicy, DEFAULT_DEV_ORIGIN, DEFAULT_STATIC_HOST_DOMAIN,
};
use report_store::outbound::persistence::{DbPool, PoolConfig};

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_POOL_MAX_SIZE: u32 = 10;
const DEFAULT_POOL_TIMEOUT_SECS: u64 = 30;

/// Raised when required settings are absent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    #[error("database URL is required (set REPORT_STORE_DATABASE_URL)")]
    MissingDatabaseUrl,
}

/// Runtime settings for the report store.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "REPORT_STORE")]
pub struct ServerSettings {
    /// PostgreSQL connection string. Required.
    pub database_url: Option<String>,
    /// Interface to bind.
    pub host: Option<IpAddr>,
    pub port: Option<u16>,
    /// Maximum pooled connections.
    pub pool_max_size: Option<u32>,
    /// Seconds to wait for a pooled connection before failing a request.
    pub pool_timeout_secs: Option<u64>,
    /// Origin of the local form development server.
    pub dev_origin: Option<String>,
    /// Domain whose HTTPS subdomains host the deployed forms.
    pub static_host_domain: Option<String>,
    /// Age after which idempotency keys are forgotten.
    pub idempotency_ttl_hours: Option<u64>,
}

impl ServerSettings {
    /// Return the database URL, rejecting blank values.
    pub fn database_url(&self) -> Result<&str, SettingsError> {
        self.database_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .ok_or(SettingsError::MissingDatabaseUrl)
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(
            self.host.unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED)),
            self.port.unwrap_or(DEFAULT_PORT),
        )
    }

    /// Pool settings for `database_url`.
    pub fn pool_config(&self, database_url: &str) -> PoolConfig {
        PoolConfig::new(database_url)
            .with_max_size(self.pool_max_size.unwrap_or(DEFAULT_POOL_MAX_SIZE))
            .with_connection_timeout(Duration::from_secs(
                self.pool_timeout_secs.unwrap_or(DEFAULT_POOL_TIMEOUT_SECS),
            ))
    }

    pub fn cors_policy(&self) -> CorsPolicy {
        CorsPolicy::new(
            self.dev_origin.as_deref().unwrap_or(DEFAULT_DEV_ORIGIN),
            self.static_host_domain
                .as_deref()
                .unwrap_or(DEFAULT_STATIC_HOST_DOMAIN),
        )
    }

    pub fn idempotency_ttl(&self) -> IdempotencyTtl {
        IdempotencyTtl::from_hours(
            self.idempotency_ttl_hours
                .unwrap_or(DEFAULT_IDEMPOTENCY_TTL_HOURS),
        )
    }
}

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) bind_addr: SocketAddr,
    pub(crate) cors: CorsPolicy,
    pub(crate) db_pool: DbPool,
}

impl ServerConfig {
    pub fn new(bind_addr: SocketAddr, db_pool: DbPool) -> Self {
        Self {
            bind_addr,
            cors: CorsPolicy::default(),
            db_pool,
        }
    }

    #[must_use]
    pub fn with_cors(mut self, cors: CorsPolicy) -> Self {
        self.cors = cors;
        self
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for settings parsing.

    use super::*;
    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    const VARS: [&str; 8] = [
        "REPORT_STORE_DATABASE_URL",
        "REPORT_STORE_HOST",
        "REPORT_STORE_PORT",
        "REPORT_STORE_POOL_MAX_SIZE",
        "REPORT_STORE_POOL_TIMEOUT_SECS",
        "REPORT_STORE_DEV_ORIGIN",
        "REPORT_STORE_STATIC_HOST_DOMAIN",
        "REPORT_STORE_IDEMPOTENCY_TTL_HOURS",
    ];

    fn load_from_empty_args() -> ServerSettings {
        ServerSettings::load_from_iter([OsString::from("report-store")])
            .expect("config should load")
    }

    #[rstest]
    fn defaults_apply_when_unset() {
        let _guard = lock_env(VARS.map(|name| (name, None::<String>)));

        let settings = load_from_empty_args();
        assert_eq!(
            settings.database_url(),
            Err(SettingsError::MissingDatabaseUrl)
        );
        assert_eq!(settings.bind_addr(), "0.0.0.0:8080".parse().expect("addr"));
        let pool = settings.pool_config("postgres://localhost/reports");
        assert_eq!(pool.max_size(), 10);
        assert_eq!(pool.connection_timeout(), Duration::from_secs(30));
        assert_eq!(settings.idempotency_ttl().hours(), 24);
        assert_eq!(settings.cors_policy(), CorsPolicy::default());
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let _guard = lock_env([
            (
                "REPORT_STORE_DATABASE_URL",
                Some("postgres://db/reports".to_owned()),
            ),
            ("REPORT_STORE_HOST", Some("127.0.0.1".to_owned())),
            ("REPORT_STORE_PORT", Some("9090".to_owned())),
            ("REPORT_STORE_POOL_MAX_SIZE", Some("3".to_owned())),
            ("REPORT_STORE_POOL_TIMEOUT_SECS", Some("5".to_owned())),
            (
                "REPORT_STORE_DEV_ORIGIN",
                Some("http://localhost:3000".to_owned()),
            ),
            (
                "REPORT_STORE_STATIC_HOST_DOMAIN",
                Some("pages.example".to_owned()),
            ),
            ("REPORT_STORE_IDEMPOTENCY_TTL_HOURS", Some("6".to_owned())),
        ]);

        let settings = load_from_empty_args();
        assert_eq!(settings.database_url(), Ok("postgres://db/reports"));
        assert_eq!(settings.bind_addr(), "127.0.0.1:9090".parse().expect("addr"));
        let pool = settings.pool_config("postgres://db/reports");
        assert_eq!(pool.max_size(), 3);
        assert_eq!(pool.connection_timeout(), Duration::from_secs(5));
        assert_eq!(settings.idempotency_ttl().hours(), 6);
        let cors = settings.cors_policy();
        assert!(cors.allows("http://localhost:3000"));
        assert!(cors.allows("https://forms.pages.example"));
        assert!(!cors.allows("https://forms.netlify.app"));
    }

    #[rstest]
    fn blank_database_url_counts_as_missing() {
        let _guard = lock_env([("REPORT_STORE_DATABASE_URL", Some("   ".to_owned()))]);
        assert_eq!(
            load_from_empty_args().database_url(),
            Err(SettingsError::MissingDatabaseUrl)
        );
    }
}
