pub mod check;
pub mod health;

pub use check::{CheckRequest, CheckResponse, CheckService, check_json_config, check_routes};
pub use health::{HealthService, HealthStatus, health_routes};
