//! Crash status state machine.
//!
//! Operators may move an aggregate between any two statuses. The only
//! automatic transition is regression: a `resolved` aggregate that receives a
//! new occurrence becomes `regressed`.

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{CrashAggregate, CrashStatus};

/// Status an aggregate takes when a new occurrence is merged into it
pub fn status_after_reoccurrence(current: CrashStatus) -> CrashStatus {
    match current {
        CrashStatus::Resolved => CrashStatus::Regressed,
        other => other,
    }
}

/// Parses an operator-supplied status token
pub fn parse_status(token: Option<&str>) -> AppResult<CrashStatus> {
    let token = token.ok_or_else(|| AppError::Validation("status is required".to_string()))?;

    token
        .parse::<CrashStatus>()
        .map_err(|e| AppError::Validation(e.to_string()))
}

pub struct LifecycleService;

impl LifecycleService {
    /// Applies an explicit operator transition from a raw status token.
    ///
    /// The token is validated before the store is touched.
    pub async fn transition_to_token(
        pool: &PgPool,
        id: Uuid,
        token: Option<&str>,
    ) -> AppResult<CrashAggregate> {
        let status = parse_status(token)?;
        Self::transition(pool, id, status).await
    }

    /// Moves an aggregate to `status`. Any status may follow any other.
    ///
    /// `last_seen_at` is left alone; only `updated_at` moves.
    pub async fn transition(
        pool: &PgPool,
        id: Uuid,
        status: CrashStatus,
    ) -> AppResult<CrashAggregate> {
        let crash = sqlx::query_as::<_, CrashAggregate>(
            r#"
            UPDATE crash_reports
            SET status = $2, updated_at = $3
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(status)
        .bind(Utc::now())
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Crash {} not found", id)))?;

        log::info!("Crash {} moved to {}", crash.id, crash.status);

        Ok(crash)
    }
}
