pub mod crashes;
pub mod feedback;
pub mod health;

use actix_web::{error::JsonPayloadError, error::QueryPayloadError, web, HttpRequest};

use crate::error::AppError;

/// JSON body settings: size limit plus structured errors for rejected bodies
pub fn json_config(limit: usize) -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(limit)
        .error_handler(move |err: JsonPayloadError, _req: &HttpRequest| {
            let error = match &err {
                JsonPayloadError::OverflowKnownLength { .. } | JsonPayloadError::Overflow { .. } => {
                    AppError::PayloadTooLarge(format!("request body exceeds {} bytes", limit))
                }
                other => AppError::Validation(format!("malformed request body: {}", other)),
            };
            error.into()
        })
}

/// Query string settings: structured 400s for malformed parameters
pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err: QueryPayloadError, _req: &HttpRequest| {
        AppError::Validation(format!("malformed query string: {}", err)).into()
    })
}

/// Registers every route of the service
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.configure(health::configure)
        .configure(crashes::configure)
        .configure(feedback::configure);
}
