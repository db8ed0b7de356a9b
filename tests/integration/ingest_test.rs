//! Integration tests for crash ingestion
//!
//! Exercises find-or-create and merge semantics against a real PostgreSQL.

use chrono::{Duration, TimeZone, Utc};
use crashdesk::error::AppError;
use crashdesk::models::CrashStatus;
use crashdesk::services::{fingerprint_report, CrashService, LifecycleService};
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::common::{ReportBuilder, TestDb};

// =============================================================================
// Create / Merge
// =============================================================================

#[actix_web::test]
async fn test_first_ingest_creates_aggregate() {
    let db = TestDb::new().await;
    let report = ReportBuilder::minimal("app1", "NullRef", "nil", "frameA").build();

    let (crash, created) = CrashService::ingest(&db.pool, &report)
        .await
        .expect("ingest failed");

    assert!(created);
    assert_eq!(crash.occurrence_count, 1);
    assert_eq!(crash.status, CrashStatus::New);
    assert_eq!(crash.app_id, "app1");
    assert_eq!(crash.fingerprint, fingerprint_report(&report));
    assert_eq!(crash.title.as_deref(), Some("NullRef"));
    assert_eq!(crash.platform, None);
}

#[actix_web::test]
async fn test_identical_reports_merge_into_one_aggregate() {
    let db = TestDb::new().await;
    let report = ReportBuilder::new().build();

    let (first, first_created) = CrashService::ingest(&db.pool, &report).await.unwrap();
    let (second, second_created) = CrashService::ingest(&db.pool, &report).await.unwrap();

    assert!(first_created);
    assert!(!second_created);
    assert_eq!(first.id, second.id);
    assert_eq!(second.occurrence_count, 2);
    assert_eq!(db.crash_count("app1").await, 1);
}

#[actix_web::test]
async fn test_repeated_ingest_counts_every_occurrence() {
    let db = TestDb::new().await;
    let report = ReportBuilder::new().build();

    let mut last = None;
    for _ in 0..7 {
        let (crash, _) = CrashService::ingest(&db.pool, &report).await.unwrap();
        last = Some(crash);
    }

    assert_eq!(last.unwrap().occurrence_count, 7);
    assert_eq!(db.crash_count("app1").await, 1);
}

#[actix_web::test]
async fn test_stack_trace_change_creates_distinct_aggregate() {
    let db = TestDb::new().await;
    let a = ReportBuilder::new().stack_trace("frameA\nframeB").build();
    let b = ReportBuilder::new().stack_trace("frameA\nframeC").build();

    let (crash_a, created_a) = CrashService::ingest(&db.pool, &a).await.unwrap();
    let (crash_b, created_b) = CrashService::ingest(&db.pool, &b).await.unwrap();

    assert!(created_a);
    assert!(created_b);
    assert_ne!(crash_a.id, crash_b.id);
    assert_ne!(crash_a.fingerprint, crash_b.fingerprint);
    assert_eq!(db.crash_count("app1").await, 2);
}

#[actix_web::test]
async fn test_same_fault_in_different_apps_is_not_merged() {
    let db = TestDb::new().await;
    let report = ReportBuilder::new();

    let (a, _) = CrashService::ingest(&db.pool, &report.clone().app_id("app-a").build())
        .await
        .unwrap();
    let (b, created) = CrashService::ingest(&db.pool, &report.app_id("app-b").build())
        .await
        .unwrap();

    assert!(created);
    assert_ne!(a.id, b.id);
}

#[actix_web::test]
async fn test_version_and_device_do_not_split_aggregate() {
    let db = TestDb::new().await;
    let old = ReportBuilder::new()
        .app_version("1.0.0")
        .device_model("iPhone12,1")
        .build();
    let new = ReportBuilder::new()
        .app_version("2.3.1")
        .device_model("iPad13,4")
        .user_id("user-42")
        .build();

    let (first, _) = CrashService::ingest(&db.pool, &old).await.unwrap();
    let (merged, created) = CrashService::ingest(&db.pool, &new).await.unwrap();

    assert!(!created);
    assert_eq!(first.id, merged.id);
    assert_eq!(merged.occurrence_count, 2);
    // Descriptive fields follow the latest occurrence
    assert_eq!(merged.app_version.as_deref(), Some("2.3.1"));
    assert_eq!(merged.device_model.as_deref(), Some("iPad13,4"));
    assert_eq!(merged.user_id.as_deref(), Some("user-42"));
}

#[actix_web::test]
async fn test_fault_identity_fields_are_fixed_at_creation() {
    let db = TestDb::new().await;
    let first = ReportBuilder::new()
        .payload(json!({"breadcrumbs": ["launch"]}))
        .build();
    let second = ReportBuilder::new()
        .payload(json!({"breadcrumbs": ["launch", "tap"]}))
        .build();

    CrashService::ingest(&db.pool, &first).await.unwrap();
    let (merged, _) = CrashService::ingest(&db.pool, &second).await.unwrap();

    assert_eq!(merged.payload, Some(json!({"breadcrumbs": ["launch"]})));
    assert_eq!(merged.title.as_deref(), Some("NullRef"));
    assert_eq!(merged.reason.as_deref(), Some("nil"));
    assert_eq!(merged.stack_trace.as_deref(), Some("frameA"));
}

// =============================================================================
// Timestamps
// =============================================================================

#[actix_web::test]
async fn test_merge_timestamps() {
    let db = TestDb::new().await;
    let report = ReportBuilder::new().build();
    let t0 = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
    let t1 = t0 + Duration::minutes(5);

    let (created, _) = CrashService::ingest_at(&db.pool, &report, t0).await.unwrap();
    assert_eq!(created.first_seen_at, t0);
    assert_eq!(created.created_at, t0);
    assert_eq!(created.last_seen_at, t0);
    assert_eq!(created.updated_at, t0);

    let (merged, _) = CrashService::ingest_at(&db.pool, &report, t1).await.unwrap();
    assert_eq!(merged.first_seen_at, t0);
    assert_eq!(merged.created_at, t0);
    assert_eq!(merged.last_seen_at, t1);
    assert_eq!(merged.updated_at, t1);
}

#[actix_web::test]
async fn test_late_arriving_occurrence_does_not_move_last_seen_backwards() {
    let db = TestDb::new().await;
    let report = ReportBuilder::new().build();
    let t0 = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
    let earlier = t0 - Duration::seconds(2);

    CrashService::ingest_at(&db.pool, &report, t0).await.unwrap();
    let (merged, _) = CrashService::ingest_at(&db.pool, &report, earlier)
        .await
        .unwrap();

    assert_eq!(merged.occurrence_count, 2);
    assert_eq!(merged.last_seen_at, t0);
    assert_eq!(merged.updated_at, merged.last_seen_at);
    assert!(merged.first_seen_at <= merged.last_seen_at);
}

// =============================================================================
// Validation
// =============================================================================

#[actix_web::test]
async fn test_missing_app_id_is_rejected_without_writing() {
    let db = TestDb::new().await;

    let missing = ReportBuilder::new().without_app_id().build();
    let blank = ReportBuilder::new().app_id("   ").build();

    for report in [missing, blank] {
        let err = CrashService::ingest(&db.pool, &report).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)), "got {:?}", err);
    }

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM crash_reports")
        .fetch_one(&db.pool)
        .await
        .unwrap();
    assert_eq!(total, 0);
}

#[actix_web::test]
async fn test_oversized_descriptive_field_is_rejected() {
    let db = TestDb::new().await;
    let report = ReportBuilder::new().platform(&"x".repeat(65)).build();

    let err = CrashService::ingest(&db.pool, &report).await.unwrap_err();

    assert!(matches!(err, AppError::Validation(_)));
    assert_eq!(db.crash_count("app1").await, 0);
}

// =============================================================================
// End-to-end scenario
// =============================================================================

#[actix_web::test]
async fn test_create_merge_resolve_regress_scenario() {
    let db = TestDb::new().await;
    let report = ReportBuilder::minimal("app1", "NullRef", "nil", "frameA").build();

    let (crash, created) = CrashService::ingest(&db.pool, &report).await.unwrap();
    assert!(created);
    assert_eq!(crash.occurrence_count, 1);
    assert_eq!(crash.status, CrashStatus::New);

    let (again, created) = CrashService::ingest(&db.pool, &report).await.unwrap();
    assert!(!created);
    assert_eq!(again.id, crash.id);
    assert_eq!(again.occurrence_count, 2);

    let resolved = LifecycleService::transition(&db.pool, crash.id, CrashStatus::Resolved)
        .await
        .unwrap();
    assert_eq!(resolved.status, CrashStatus::Resolved);

    let (regressed, created) = CrashService::ingest(&db.pool, &report).await.unwrap();
    assert!(!created);
    assert_eq!(regressed.id, crash.id);
    assert_eq!(regressed.status, CrashStatus::Regressed);
    assert_eq!(regressed.occurrence_count, 3);
}
