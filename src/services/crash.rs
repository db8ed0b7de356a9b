use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{CrashAggregate, CrashReport, CrashStatus};
use crate::services::fingerprint::fingerprint_report;
use crate::services::lifecycle::status_after_reoccurrence;
use crate::services::validation::{
    check_max_chars, check_payload, check_text, required, MAX_ID_CHARS,
};

/// Name of the unique constraint over (app_id, fingerprint)
const AGGREGATE_KEY_CONSTRAINT: &str = "crash_reports_app_fingerprint_key";

/// Merge/insert rounds before giving up on a contended key
const MAX_INGEST_ATTEMPTS: usize = 3;

/// Column limits enforced before the report reaches the store
const FIELD_LIMITS: [(&str, usize); 7] = [
    ("appId", MAX_ID_CHARS),
    ("platform", 64),
    ("appVersion", 128),
    ("buildNumber", 128),
    ("osVersion", 128),
    ("deviceModel", MAX_ID_CHARS),
    ("userId", MAX_ID_CHARS),
];

/// Checks a report against the ingestion schema.
///
/// Rejects a missing or blank `appId`, descriptive values longer than their
/// columns, and NUL characters anywhere in the text or payload.
pub fn validate_report(report: &CrashReport) -> AppResult<()> {
    let app_id = required(report.app_id.as_deref(), "appId")?;

    let descriptive = [
        Some(app_id),
        report.platform.as_deref(),
        report.app_version.as_deref(),
        report.build_number.as_deref(),
        report.os_version.as_deref(),
        report.device_model.as_deref(),
        report.user_id.as_deref(),
    ];

    for ((field, max), value) in FIELD_LIMITS.iter().zip(descriptive) {
        check_max_chars(field, value, *max)?;
        check_text(field, value)?;
    }

    check_text("title", report.title.as_deref())?;
    check_text("reason", report.reason.as_deref())?;
    check_text("stackTrace", report.stack_trace.as_deref())?;
    check_payload(report.payload.as_ref())
}

/// True when the error is the (app_id, fingerprint) uniqueness constraint firing
fn is_aggregate_key_conflict(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(e) => {
            e.is_unique_violation() && e.constraint() == Some(AGGREGATE_KEY_CONSTRAINT)
        }
        _ => false,
    }
}

pub struct CrashService;

impl CrashService {
    /// Records one occurrence of a crash.
    ///
    /// Finds the aggregate for `(app_id, fingerprint)` and merges into it, or
    /// creates it. Concurrent first occurrences are arbitrated by the unique
    /// constraint alone: the losing insert turns into a merge. Returns the
    /// aggregate and whether this call created it.
    pub async fn ingest(pool: &PgPool, report: &CrashReport) -> AppResult<(CrashAggregate, bool)> {
        Self::ingest_at(pool, report, Utc::now()).await
    }

    /// Same as [`CrashService::ingest`] with an explicit ingestion time
    pub async fn ingest_at(
        pool: &PgPool,
        report: &CrashReport,
        now: DateTime<Utc>,
    ) -> AppResult<(CrashAggregate, bool)> {
        validate_report(report)?;

        let app_id = report.app_id.as_deref().unwrap_or("");
        let fingerprint = fingerprint_report(report);

        for attempt in 1..=MAX_INGEST_ATTEMPTS {
            if let Some(crash) = Self::merge(pool, app_id, &fingerprint, report, now).await? {
                log::info!(
                    "Merged occurrence into crash {} (app {}, count {}, status {})",
                    crash.id,
                    crash.app_id,
                    crash.occurrence_count,
                    crash.status
                );
                return Ok((crash, false));
            }

            match Self::insert(pool, app_id, &fingerprint, report, now).await {
                Ok(Some(crash)) => {
                    log::info!("Created crash {} (app {})", crash.id, crash.app_id);
                    return Ok((crash, true));
                }
                Ok(None) => {}
                Err(AppError::Database(ref e)) if is_aggregate_key_conflict(e) => {}
                Err(e) => return Err(e),
            }

            log::debug!(
                "Lost creation race for fingerprint {} (app {}), retrying as merge (attempt {})",
                fingerprint,
                app_id,
                attempt
            );
        }

        Err(AppError::Internal(format!(
            "Could not record crash for fingerprint {} after {} attempts",
            fingerprint, MAX_INGEST_ATTEMPTS
        )))
    }

    /// Merges an occurrence into the existing aggregate, if there is one.
    ///
    /// Lookup and mutation are a single statement, so concurrent merges each
    /// count exactly once.
    async fn merge(
        pool: &PgPool,
        app_id: &str,
        fingerprint: &str,
        report: &CrashReport,
        now: DateTime<Utc>,
    ) -> AppResult<Option<CrashAggregate>> {
        let crash = sqlx::query_as::<_, CrashAggregate>(
            r#"
            UPDATE crash_reports
            SET occurrence_count = occurrence_count + 1,
                last_seen_at = GREATEST(last_seen_at, $3),
                updated_at = GREATEST(last_seen_at, $3),
                platform = $4,
                app_version = $5,
                build_number = $6,
                os_version = $7,
                device_model = $8,
                user_id = $9,
                status = CASE WHEN status = $10 THEN $11 ELSE status END
            WHERE app_id = $1 AND fingerprint = $2
            RETURNING *
            "#,
        )
        .bind(app_id)
        .bind(fingerprint)
        .bind(now)
        .bind(&report.platform)
        .bind(&report.app_version)
        .bind(&report.build_number)
        .bind(&report.os_version)
        .bind(&report.device_model)
        .bind(&report.user_id)
        .bind(CrashStatus::Resolved)
        .bind(status_after_reoccurrence(CrashStatus::Resolved))
        .fetch_optional(pool)
        .await?;

        Ok(crash)
    }

    /// Inserts a new aggregate unless one already exists for the key.
    ///
    /// Returns `None` when another writer created it first.
    async fn insert(
        pool: &PgPool,
        app_id: &str,
        fingerprint: &str,
        report: &CrashReport,
        now: DateTime<Utc>,
    ) -> AppResult<Option<CrashAggregate>> {
        let crash = sqlx::query_as::<_, CrashAggregate>(
            r#"
            INSERT INTO crash_reports (
                id, app_id, platform, app_version, build_number, os_version,
                device_model, user_id, fingerprint, title, reason, stack_trace,
                payload, status, occurrence_count,
                first_seen_at, last_seen_at, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, 1, $15, $15, $15, $15)
            ON CONFLICT (app_id, fingerprint) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(app_id)
        .bind(&report.platform)
        .bind(&report.app_version)
        .bind(&report.build_number)
        .bind(&report.os_version)
        .bind(&report.device_model)
        .bind(&report.user_id)
        .bind(fingerprint)
        .bind(&report.title)
        .bind(&report.reason)
        .bind(&report.stack_trace)
        .bind(&report.payload)
        .bind(CrashStatus::New)
        .bind(now)
        .fetch_optional(pool)
        .await?;

        Ok(crash)
    }

    /// Gets a crash aggregate by ID
    pub async fn get_by_id(pool: &PgPool, id: Uuid) -> AppResult<CrashAggregate> {
        let crash =
            sqlx::query_as::<_, CrashAggregate>("SELECT * FROM crash_reports WHERE id = $1")
                .bind(id)
                .fetch_optional(pool)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Crash {} not found", id)))?;

        Ok(crash)
    }

    /// Lists aggregates awaiting attention (new or regressed), most recent first
    pub async fn list_pending(
        pool: &PgPool,
        app_id: Option<&str>,
        limit: i64,
    ) -> AppResult<Vec<CrashAggregate>> {
        let [first, second] = CrashStatus::PENDING;

        let crashes = match app_id {
            Some(app_id) => {
                sqlx::query_as::<_, CrashAggregate>(
                    r#"
                    SELECT * FROM crash_reports
                    WHERE status IN ($1, $2) AND app_id = $3
                    ORDER BY last_seen_at DESC, id DESC
                    LIMIT $4
                    "#,
                )
                .bind(first)
                .bind(second)
                .bind(app_id)
                .bind(limit)
                .fetch_all(pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, CrashAggregate>(
                    r#"
                    SELECT * FROM crash_reports
                    WHERE status IN ($1, $2)
                    ORDER BY last_seen_at DESC, id DESC
                    LIMIT $3
                    "#,
                )
                .bind(first)
                .bind(second)
                .bind(limit)
                .fetch_all(pool)
                .await?
            }
        };

        Ok(crashes)
    }
}
