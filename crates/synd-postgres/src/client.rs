//! Pooled async Postgres client.

use std::sync::Arc;

use diesel_async::AsyncPgConnection;
use diesel_async::RunQueryDsl;
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::pooled_connection::deadpool::{Object, Pool};

use crate::{Error, PgConfig, Result, TRACING_TARGET_CONNECTION};

/// A connection checked out of the pool.
pub type PooledConnection = Object<AsyncPgConnection>;

struct PgClientInner {
    pool: Pool<AsyncPgConnection>,
    config: PgConfig,
}

/// High-level database client managing the connection pool.
#[derive(Clone)]
pub struct PgClient {
    inner: Arc<PgClientInner>,
}

impl std::fmt::Debug for PgClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgClient")
            .field("url", &self.inner.config.database_url_masked())
            .finish_non_exhaustive()
    }
}

impl PgClient {
    /// Builds the connection pool. Connections are established lazily.
    ///
    /// # Errors
    ///
    /// [`Error::PoolBuild`] when the pool configuration is invalid.
    pub fn new(config: PgConfig) -> Result<Self> {
        tracing::info!(
            target: TRACING_TARGET_CONNECTION,
            database_url = %config.database_url_masked(),
            max_connections = config.postgres_max_connections,
            "Initializing database client"
        );

        let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(&config.postgres_url);
        let pool = Pool::builder(manager)
            .max_size(config.postgres_max_connections as usize)
            .wait_timeout(config.connection_timeout())
            .create_timeout(config.connection_timeout())
            .recycle_timeout(config.idle_timeout())
            .runtime(deadpool::Runtime::Tokio1)
            .build()
            .map_err(|err| Error::pool_build(err.to_string()))?;

        Ok(Self {
            inner: Arc::new(PgClientInner { pool, config }),
        })
    }

    /// Checks one connection out of the pool.
    pub async fn conn(&self) -> Result<PooledConnection> {
        self.inner
            .pool
            .get()
            .await
            .map_err(|err| Error::checkout(err.to_string()))
    }

    /// Round-trips a trivial query; used by the health surface.
    pub async fn ping(&self) -> Result<String> {
        let mut conn = self.conn().await?;
        diesel::sql_query("SELECT 1").execute(&mut conn).await?;
        Ok("OK".to_string())
    }
}
