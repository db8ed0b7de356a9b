use actix_web::{web, HttpResponse};

use crate::auth::ApiKeyAuth;
use crate::db::DbPool;
use crate::error::AppResult;
use crate::models::{FeedbackCreated, SubmitFeedback};
use crate::services::FeedbackService;

/// POST /v1/feedback
pub async fn submit_feedback(
    _auth: ApiKeyAuth,
    pool: web::Data<DbPool>,
    body: web::Json<SubmitFeedback>,
) -> AppResult<HttpResponse> {
    let feedback = FeedbackService::submit(pool.get_ref(), &body).await?;

    Ok(HttpResponse::Created().json(FeedbackCreated { id: feedback.id }))
}

/// Configure feedback routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/v1/feedback", web::post().to(submit_feedback));
}
