use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;
use uuid::Uuid;

// =============================================================================
// Crash Status Enum
// =============================================================================

/// Resolution state of a crash aggregate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "varchar", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CrashStatus {
    New,
    Triaged,
    InProgress,
    Resolved,
    Ignored,
    Regressed,
}

impl CrashStatus {
    pub const ALL: [CrashStatus; 6] = [
        CrashStatus::New,
        CrashStatus::Triaged,
        CrashStatus::InProgress,
        CrashStatus::Resolved,
        CrashStatus::Ignored,
        CrashStatus::Regressed,
    ];

    /// Statuses shown in the pending (needs attention) listing
    pub const PENDING: [CrashStatus; 2] = [CrashStatus::New, CrashStatus::Regressed];

    pub fn as_str(&self) -> &'static str {
        match self {
            CrashStatus::New => "new",
            CrashStatus::Triaged => "triaged",
            CrashStatus::InProgress => "in_progress",
            CrashStatus::Resolved => "resolved",
            CrashStatus::Ignored => "ignored",
            CrashStatus::Regressed => "regressed",
        }
    }
}

impl std::fmt::Display for CrashStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A status token outside the closed set
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown status '{0}', expected one of: new, triaged, in_progress, resolved, ignored, regressed")]
pub struct UnknownStatus(pub String);

impl FromStr for CrashStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CrashStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

// =============================================================================
// Crash Aggregate Model
// =============================================================================

/// All occurrences sharing one (app_id, fingerprint) pair
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CrashAggregate {
    pub id: Uuid,
    pub app_id: String,
    pub fingerprint: String,
    // Overwritten by the latest occurrence
    pub platform: Option<String>,
    pub app_version: Option<String>,
    pub build_number: Option<String>,
    pub os_version: Option<String>,
    pub device_model: Option<String>,
    pub user_id: Option<String>,
    // Fixed at creation
    pub title: Option<String>,
    pub reason: Option<String>,
    pub stack_trace: Option<String>,
    pub payload: Option<serde_json::Value>,
    pub status: CrashStatus,
    pub occurrence_count: i32,
    pub first_seen_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Request / Response DTOs
// =============================================================================

/// Normalized crash report as sent by client applications.
///
/// `app_id` is optional at the type level so a missing value is reported as a
/// validation error rather than a deserialization failure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrashReport {
    pub app_id: Option<String>,
    pub platform: Option<String>,
    pub app_version: Option<String>,
    pub build_number: Option<String>,
    pub os_version: Option<String>,
    pub device_model: Option<String>,
    pub user_id: Option<String>,
    pub title: Option<String>,
    pub reason: Option<String>,
    pub stack_trace: Option<String>,
    pub payload: Option<serde_json::Value>,
}

/// Result of ingesting one report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IngestOutcome {
    pub id: Uuid,
    pub created: bool,
}

/// Request to move an aggregate to another status
#[derive(Debug, Deserialize)]
pub struct UpdateCrashStatus {
    pub status: Option<String>,
}

/// Query for the pending listing
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPendingQuery {
    pub app_id: Option<String>,
    pub limit: Option<i64>,
}

impl ListPendingQuery {
    pub const DEFAULT_LIMIT: i64 = 20;
    pub const MAX_LIMIT: i64 = 100;

    /// Requested limit clamped to `1..=MAX_LIMIT`
    pub fn effective_limit(&self) -> i64 {
        self.limit
            .unwrap_or(Self::DEFAULT_LIMIT)
            .clamp(1, Self::MAX_LIMIT)
    }

    /// App filter, treating a blank value as absent
    pub fn app_filter(&self) -> Option<&str> {
        self.app_id.as_deref().filter(|a| !a.trim().is_empty())
    }
}

/// Response for the pending listing
#[derive(Debug, Serialize)]
pub struct CrashListResponse {
    pub crashes: Vec<CrashAggregate>,
}
