use std::time::Duration;

use sqlx::postgres::{PgConnection, PgPool, PgPoolOptions};

use crate::config::DatabaseConfig;

/// Shared handle to the crash store
pub type DbPool = PgPool;

/// Session settings applied to every new connection.
///
/// Timestamps are compared in UTC, and any single statement is cancelled by
/// the server after `statement_timeout` so an ingestion never hangs on a
/// stuck round trip.
pub fn session_settings(statement_timeout: Duration) -> [String; 2] {
    [
        "SET timezone = 'UTC'".to_string(),
        format!("SET statement_timeout = {}", statement_timeout.as_millis()),
    ]
}

async fn prepare_session(
    conn: &mut PgConnection,
    statement_timeout: Duration,
) -> Result<(), sqlx::Error> {
    for statement in session_settings(statement_timeout) {
        sqlx::query(&statement).execute(&mut *conn).await?;
    }
    Ok(())
}

/// Opens the crash store pool
pub async fn create_pool(config: &DatabaseConfig) -> Result<DbPool, sqlx::Error> {
    log::info!("Connecting to crash store...");

    let statement_timeout = config.statement_timeout;
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(config.acquire_timeout)
        .idle_timeout(Some(config.idle_timeout))
        .max_lifetime(Some(config.max_lifetime))
        .after_connect(move |conn, _meta| {
            Box::pin(async move { prepare_session(conn, statement_timeout).await })
        })
        .connect(&config.url)
        .await?;

    log::info!(
        "Crash store ready (max: {}, min: {}, statement timeout: {}ms)",
        config.max_connections,
        config.min_connections,
        statement_timeout.as_millis()
    );

    Ok(pool)
}

/// Applies the crash_reports and crash_feedback schema
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await?;

    log::info!("Crash store schema is up to date");
    Ok(())
}

/// Readiness probe: true when a trivial statement round-trips
pub async fn health_check(pool: &DbPool) -> bool {
    sqlx::query("SELECT 1").execute(pool).await.is_ok()
}
