use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

/// Builds the Postgres pool, retrying at startup: in docker-compose the
/// database may take a few seconds to accept connections, and a boot-time
/// crash loop helps nobody.
pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    let mut last_err: Option<sqlx::Error> = None;

    for attempt in 1..=30 {
        match PgPoolOptions::new()
            .max_connections(10)
            .min_connections(1)
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url)
            .await
        {
            Ok(pool) => return Ok(pool),
            Err(err) => {
                tracing::warn!(attempt, error = %err, "db connect failed; retrying");
                last_err = Some(err);
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
        }
    }

    Err(last_err.unwrap_or(sqlx::Error::PoolClosed))
}
