use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Free-text feedback from an application user
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    pub id: Uuid,
    /// Weak reference to a crash aggregate, stored verbatim
    pub crash_id: Option<String>,
    pub app_id: String,
    pub user_id: Option<String>,
    pub message: String,
    pub payload: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

/// DTO for submitting feedback
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitFeedback {
    pub app_id: Option<String>,
    pub message: Option<String>,
    pub user_id: Option<String>,
    pub crash_id: Option<String>,
    pub payload: Option<serde_json::Value>,
}

/// Response for a stored feedback entry
#[derive(Debug, Serialize)]
pub struct FeedbackCreated {
    pub id: Uuid,
}
