use actix_web::{HttpRequest, HttpResponse, Responder, error, web};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::services::{CheckError, GeofenceService};

/// Request body limit for the check endpoint.
pub const MAX_BODY_SIZE: usize = 64 * 1024;

/// POST /api/v1/check 请求体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckRequest {
    pub ip: String,
    pub allowed_countries: Vec<String>,
}

/// POST /api/v1/check 响应体
///
/// `error` is empty on success; `allowed` is false and `country` empty on failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResponse {
    pub allowed: bool,
    pub country: String,
    pub error: String,
}

impl CheckResponse {
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            allowed: false,
            country: String::new(),
            error: error.into(),
        }
    }
}

pub struct CheckService;

impl CheckService {
    pub async fn check(
        service: web::Data<GeofenceService>,
        body: web::Json<CheckRequest>,
    ) -> impl Responder {
        let req = body.into_inner();
        debug!(ip = %req.ip, allowed_countries = ?req.allowed_countries, "check request received");

        match service.check(&req.ip, &req.allowed_countries) {
            Ok(outcome) => HttpResponse::Ok().json(CheckResponse {
                allowed: outcome.allowed,
                country: outcome.country.into_string(),
                error: String::new(),
            }),
            Err(e @ (CheckError::MissingIp | CheckError::MissingAllowedCountries)) => {
                HttpResponse::BadRequest().json(CheckResponse::failure(format!("invalid request: {}", e)))
            }
            Err(e @ CheckError::InvalidIp(_)) => {
                HttpResponse::BadRequest().json(CheckResponse::failure(e.to_string()))
            }
            Err(e @ CheckError::Lookup(_)) => {
                HttpResponse::InternalServerError().json(CheckResponse::failure(e.to_string()))
            }
        }
    }
}

/// JSON extractor config: body limit, and body errors reported as a `CheckResponse`.
pub fn check_json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(MAX_BODY_SIZE)
        .error_handler(|err, _req: &HttpRequest| {
            let body = CheckResponse::failure(format!("invalid request: {}", err));
            error::InternalError::from_response(err, HttpResponse::BadRequest().json(body)).into()
        })
}

/// Check 路由配置
pub fn check_routes() -> actix_web::Scope {
    web::scope("/api/v1")
        .app_data(check_json_config())
        .route("/check", web::post().to(CheckService::check))
}
