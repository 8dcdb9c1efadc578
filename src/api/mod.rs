//! HTTP API
//!
//! - `POST /api/v1/check`: geofence check
//! - `GET|HEAD /health`, `GET|HEAD /ready`: probes

pub mod middleware;
pub mod services;

use actix_web::web;

/// Register every route on an app.
///
/// The app must carry `web::Data<GeofenceService>` and `web::Data<ReadinessProbe>`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(services::check_routes())
        .configure(services::health_routes);
}
