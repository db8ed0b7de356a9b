use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use std::future::{ready, Ready};

use crate::config::Config;
use crate::error::AppError;

/// Header carrying the shared API key
pub const API_KEY_HEADER: &str = "x-api-key";

/// Extractor for API key authentication (`/v1` endpoints)
///
/// Usage in handlers:
/// ```ignore
/// async fn my_handler(_auth: ApiKeyAuth) -> HttpResponse {
///     // request carried the configured x-api-key
/// }
/// ```
pub struct ApiKeyAuth;

impl FromRequest for ApiKeyAuth {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let config = match req.app_data::<web::Data<Config>>() {
            Some(config) => config,
            None => {
                return ready(Err(AppError::Internal(
                    "Configuration not available".to_string(),
                )));
            }
        };

        let provided = req
            .headers()
            .get(API_KEY_HEADER)
            .and_then(|h| h.to_str().ok());

        let result = match provided {
            None => Err(AppError::Unauthorized(format!(
                "Missing {} header",
                API_KEY_HEADER
            ))),
            Some(key) if key == config.security.api_key => Ok(ApiKeyAuth),
            Some(_) => Err(AppError::Unauthorized("Invalid API key".to_string())),
        };

        ready(result)
    }
}
