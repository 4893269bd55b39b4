use anyhow::Result;
use sea_orm::{DatabaseConnection, SqlxPostgresConnector};
use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::config::DbConfig;

pub type DbPool = PgPool;
pub type OrmConn = DatabaseConnection;

/// Connect to Postgres, retrying a bounded number of times.
///
/// Only used at startup: containers often come up before the database
/// accepts connections. Request handlers never retry.
pub async fn create_pool(config: &DbConfig) -> Result<DbPool> {
    let attempts = config.connect_max_retries.max(1);
    let mut attempt = 1;
    loop {
        let result = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.url)
            .await;

        match result {
            Ok(pool) => {
                tracing::info!(attempt, "database connection established");
                return Ok(pool);
            }
            Err(err) if attempt < attempts => {
                tracing::warn!(
                    attempt,
                    max_attempts = attempts,
                    error = %err,
                    "database connection failed, retrying"
                );
                tokio::time::sleep(config.connect_retry_delay).await;
                attempt += 1;
            }
            Err(err) => {
                tracing::error!(attempt, error = %err, "database connection failed, giving up");
                return Err(err.into());
            }
        }
    }
}

/// Wrap an existing pool in a SeaORM connection so both share connections.
pub fn create_orm_conn(pool: DbPool) -> OrmConn {
    SqlxPostgresConnector::from_sqlx_postgres_pool(pool)
}

/// Apply the SQL migrations embedded from `migrations/`.
pub async fn run_migrations(pool: &DbPool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    tracing::info!("migrations applied");
    Ok(())
}
