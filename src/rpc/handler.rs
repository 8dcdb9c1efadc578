//! RPC request handler
//!
//! Maps requests onto the geofence service and service errors onto statuses.

use std::time::Instant;
use tracing::debug;

use super::types::{RpcRequest, RpcResponse, RpcStatus};
use crate::services::{CheckError, GeofenceService};

pub struct RpcHandler {
    service: GeofenceService,
    started: Instant,
}

impl RpcHandler {
    pub fn new(service: GeofenceService) -> Self {
        Self {
            service,
            started: Instant::now(),
        }
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started.elapsed().as_secs()
    }

    /// Handle one request and build its response
    pub fn handle(&self, req: RpcRequest) -> RpcResponse {
        match req {
            RpcRequest::Ping => RpcResponse::Pong {
                version: env!("CARGO_PKG_VERSION").to_string(),
                uptime_secs: self.uptime_secs(),
            },
            RpcRequest::Check {
                ip,
                allowed_countries,
            } => self.check(&ip, &allowed_countries),
        }
    }

    fn check(&self, ip: &str, allowed_countries: &[String]) -> RpcResponse {
        debug!(ip, ?allowed_countries, "RPC check request received");

        match self.service.check(ip, allowed_countries) {
            Ok(outcome) => RpcResponse::Check {
                allowed: outcome.allowed,
                country: outcome.country.into_string(),
                error: String::new(),
            },
            Err(e @ CheckError::Lookup(_)) => RpcResponse::error(RpcStatus::Internal, e.to_string()),
            Err(e) => RpcResponse::error(RpcStatus::InvalidArgument, e.to_string()),
        }
    }
}
