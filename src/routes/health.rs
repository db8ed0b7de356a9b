use actix_web::{http::StatusCode, web, HttpResponse};
use serde::Serialize;

use crate::db::{self, DbPool};

#[derive(Serialize)]
pub struct HealthResponse {
    ok: bool,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    database: Option<&'static str>,
}

/// Liveness check, answers as long as the process is serving requests
pub async fn liveness() -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        ok: true,
        status: "ok",
        database: None,
    })
}

/// Readiness check: 200 when the crash store is reachable, 503 otherwise
pub async fn readiness(pool: web::Data<DbPool>) -> HttpResponse {
    let db_healthy = db::health_check(pool.get_ref()).await;

    let (response, http_status) = if db_healthy {
        (
            HealthResponse {
                ok: true,
                status: "ready",
                database: Some("ok"),
            },
            StatusCode::OK,
        )
    } else {
        log::warn!("Readiness check failed: database unreachable");
        (
            HealthResponse {
                ok: false,
                status: "not_ready",
                database: Some("error"),
            },
            StatusCode::SERVICE_UNAVAILABLE,
        )
    };

    HttpResponse::build(http_status).json(response)
}

/// Configure health routes (no authentication)
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/health")
            .route("", web::get().to(liveness))
            .route("/ready", web::get().to(readiness)),
    );
}
