use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{Feedback, SubmitFeedback};
use crate::services::validation::{
    check_max_chars, check_payload, check_text, required, MAX_ID_CHARS,
};

/// Checks a feedback submission, returning the required app id and message.
///
/// `crashId` has no length limit; only NUL is refused, as for all text.
pub fn validate_feedback(input: &SubmitFeedback) -> AppResult<(&str, &str)> {
    let app_id = required(input.app_id.as_deref(), "appId")?;
    let message = required(input.message.as_deref(), "message")?;

    check_max_chars("appId", Some(app_id), MAX_ID_CHARS)?;
    check_max_chars("userId", input.user_id.as_deref(), MAX_ID_CHARS)?;

    check_text("appId", Some(app_id))?;
    check_text("message", Some(message))?;
    check_text("userId", input.user_id.as_deref())?;
    check_text("crashId", input.crash_id.as_deref())?;
    check_payload(input.payload.as_ref())?;

    Ok((app_id, message))
}

pub struct FeedbackService;

impl FeedbackService {
    /// Stores a feedback entry.
    ///
    /// `crash_id` is kept verbatim and never looked up, so feedback is
    /// accepted even when it points at an unknown crash.
    pub async fn submit(pool: &PgPool, input: &SubmitFeedback) -> AppResult<Feedback> {
        let (app_id, message) = validate_feedback(input)?;

        let feedback = sqlx::query_as::<_, Feedback>(
            r#"
            INSERT INTO crash_feedback (id, crash_id, app_id, user_id, message, payload, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&input.crash_id)
        .bind(app_id)
        .bind(&input.user_id)
        .bind(message)
        .bind(&input.payload)
        .bind(Utc::now())
        .fetch_one(pool)
        .await?;

        log::info!(
            "Stored feedback {} (app {}, crash {})",
            feedback.id,
            feedback.app_id,
            feedback.crash_id.as_deref().unwrap_or("-")
        );

        Ok(feedback)
    }

    /// Lists feedback attached to a crash, newest first
    pub async fn list_for_crash(pool: &PgPool, crash_id: &str) -> AppResult<Vec<Feedback>> {
        let feedback = sqlx::query_as::<_, Feedback>(
            r#"
            SELECT * FROM crash_feedback
            WHERE crash_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(crash_id)
        .fetch_all(pool)
        .await?;

        Ok(feedback)
    }
}
