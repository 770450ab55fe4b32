//! Connection pool construction (deadpool-postgres).

use std::time::Duration;

use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod, Runtime};
use tokio_postgres::NoTls;

use crate::error::{QueryError, QueryResult};

/// Connection settings for building a pool programmatically.
#[derive(Clone, Debug)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: Option<String>,
    /// Maximum number of pooled connections.
    pub pool_size: usize,
    /// TCP connect timeout for new connections.
    pub connect_timeout: Option<Duration>,
    /// How long a checkout may wait for a free connection before failing
    /// with [`QueryError::PoolTimeout`]. `None` waits indefinitely.
    pub wait_timeout: Option<Duration>,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            database: "postgres".to_string(),
            user: "postgres".to_string(),
            password: None,
            pool_size: 16,
            connect_timeout: Some(Duration::from_secs(10)),
            wait_timeout: Some(Duration::from_secs(30)),
        }
    }
}

/// Build a pool from a [`ConnectionConfig`].
pub fn pool_from_config(cfg: &ConnectionConfig) -> QueryResult<Pool> {
    let mut pg_config = tokio_postgres::Config::new();
    pg_config
        .host(&cfg.host)
        .port(cfg.port)
        .dbname(&cfg.database)
        .user(&cfg.user);
    if let Some(password) = &cfg.password {
        pg_config.password(password);
    }
    if let Some(timeout) = cfg.connect_timeout {
        pg_config.connect_timeout(timeout);
    }

    let manager = Manager::from_config(
        pg_config,
        NoTls,
        ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        },
    );

    Pool::builder(manager)
        .max_size(cfg.pool_size)
        .wait_timeout(cfg.wait_timeout)
        .runtime(Runtime::Tokio1)
        .build()
        .map_err(|e| QueryError::Connection(e.to_string()))
}

/// Build a pool from a `postgres://` connection URL.
pub fn pool_from_url(url: &str, max_size: usize) -> QueryResult<Pool> {
    let pg_config: tokio_postgres::Config = url
        .parse()
        .map_err(|e: tokio_postgres::Error| QueryError::Connection(e.to_string()))?;

    let manager = Manager::from_config(
        pg_config,
        NoTls,
        ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        },
    );

    Pool::builder(manager)
        .max_size(max_size)
        .runtime(Runtime::Tokio1)
        .build()
        .map_err(|e| QueryError::Connection(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_local() {
        let cfg = ConnectionConfig::default();
        assert_eq!(cfg.host, "localhost");
        assert_eq!(cfg.port, 5432);
        assert_eq!(cfg.pool_size, 16);
    }

    #[test]
    fn bad_url_is_a_connection_error() {
        let err = pool_from_url("not-a-url", 4).unwrap_err();
        assert!(matches!(err, QueryError::Connection(_)));
    }

    #[tokio::test]
    async fn checkout_against_unreachable_server_fails() {
        let cfg = ConnectionConfig {
            port: 1,
            pool_size: 1,
            connect_timeout: Some(Duration::from_secs(1)),
            wait_timeout: Some(Duration::from_millis(200)),
            ..Default::default()
        };
        let pool = pool_from_config(&cfg).unwrap();
        assert!(pool.get().await.is_err());
    }
}
