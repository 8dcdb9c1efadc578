use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use tracing::{error, trace};

use crate::services::ReadinessProbe;

/// 健康检查响应体
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HealthStatus {
    fn new(status: &str) -> Self {
        Self {
            status: status.to_string(),
            error: None,
        }
    }
}

/// Health Service
///
/// - /health: 进程存活即返回 200
/// - /ready: 对探针地址做一次真实查询，失败返回 503
pub struct HealthService;

impl HealthService {
    pub async fn liveness_check() -> impl Responder {
        trace!("Received liveness check request");
        HttpResponse::Ok().json(HealthStatus::new("ok"))
    }

    pub async fn readiness_check(probe: web::Data<ReadinessProbe>) -> impl Responder {
        trace!("Received readiness check request");

        match probe.probe() {
            Ok(_) => HttpResponse::Ok().json(HealthStatus::new("ready")),
            Err(e) => {
                error!(probe_ip = %probe.ip(), error = %e, "readiness probe failed");
                HttpResponse::ServiceUnavailable().json(HealthStatus {
                    status: "not ready".to_string(),
                    error: Some(e.to_string()),
                })
            }
        }
    }
}

/// Health 路由配置
pub fn health_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(HealthService::liveness_check))
        .route("/health", web::head().to(HealthService::liveness_check))
        .route("/ready", web::get().to(HealthService::readiness_check))
        .route("/ready", web::head().to(HealthService::readiness_check));
}
