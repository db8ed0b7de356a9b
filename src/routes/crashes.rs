use actix_web::{web, HttpResponse};
use uuid::Uuid;

use crate::auth::ApiKeyAuth;
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::{
    CrashListResponse, CrashReport, IngestOutcome, ListPendingQuery, UpdateCrashStatus,
};
use crate::services::{parse_status, CrashService, FeedbackService, LifecycleService};

/// Parses a crash id from the path; ids that cannot exist are reported as not found
fn parse_crash_id(raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::NotFound(format!("Crash {} not found", raw)))
}

/// POST /v1/crashes
/// Records a crash occurrence: 201 when a new aggregate was created, 200 on merge
pub async fn ingest_crash(
    _auth: ApiKeyAuth,
    pool: web::Data<DbPool>,
    body: web::Json<CrashReport>,
) -> AppResult<HttpResponse> {
    let (crash, created) = CrashService::ingest(pool.get_ref(), &body).await?;

    let outcome = IngestOutcome {
        id: crash.id,
        created,
    };

    if created {
        Ok(HttpResponse::Created().json(outcome))
    } else {
        Ok(HttpResponse::Ok().json(outcome))
    }
}

/// GET /v1/crashes/new
/// Lists new and regressed crashes, most recently seen first
pub async fn list_pending(
    _auth: ApiKeyAuth,
    pool: web::Data<DbPool>,
    query: web::Query<ListPendingQuery>,
) -> AppResult<HttpResponse> {
    let crashes =
        CrashService::list_pending(pool.get_ref(), query.app_filter(), query.effective_limit())
            .await?;

    Ok(HttpResponse::Ok().json(CrashListResponse { crashes }))
}

/// GET /v1/crashes/{crash_id}
pub async fn get_crash(
    _auth: ApiKeyAuth,
    pool: web::Data<DbPool>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let crash_id = parse_crash_id(&path)?;
    let crash = CrashService::get_by_id(pool.get_ref(), crash_id).await?;

    Ok(HttpResponse::Ok().json(crash))
}

/// POST /v1/crashes/{crash_id}/status
/// Explicit operator transition
pub async fn update_status(
    _auth: ApiKeyAuth,
    pool: web::Data<DbPool>,
    path: web::Path<String>,
    body: web::Json<UpdateCrashStatus>,
) -> AppResult<HttpResponse> {
    // An invalid token is rejected before the id is even looked at
    let status = parse_status(body.status.as_deref())?;
    let crash_id = parse_crash_id(&path)?;

    let crash = LifecycleService::transition(pool.get_ref(), crash_id, status).await?;

    Ok(HttpResponse::Ok().json(crash))
}

/// GET /v1/crashes/{crash_id}/feedback
/// Feedback entries that reference this crash
pub async fn list_feedback(
    _auth: ApiKeyAuth,
    pool: web::Data<DbPool>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let feedback = FeedbackService::list_for_crash(pool.get_ref(), &path).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "feedback": feedback })))
}

/// Configure crash routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/v1/crashes")
            .route("", web::post().to(ingest_crash))
            // Registered before /{crash_id} so "new" is not read as an id
            .route("/new", web::get().to(list_pending))
            .route("/{crash_id}", web::get().to(get_crash))
            .route("/{crash_id}/status", web::post().to(update_status))
            .route("/{crash_id}/feedback", web::get().to(list_feedback)),
    );
}
