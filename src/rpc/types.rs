//! RPC message types
//!
//! - `RpcRequest`: sent from client to server
//! - `RpcResponse`: sent from server to client
//! - `RpcError`: client-side call errors

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;

/// Requests sent from client to server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RpcRequest {
    /// Heartbeat check
    Ping,

    /// Geofence check
    Check {
        ip: String,
        allowed_countries: Vec<String>,
    },
}

/// Status carried by an error response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RpcStatus {
    /// The request was malformed or failed validation
    InvalidArgument,
    /// The server failed to answer a valid request
    Internal,
}

impl fmt::Display for RpcStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RpcStatus::InvalidArgument => write!(f, "InvalidArgument"),
            RpcStatus::Internal => write!(f, "Internal"),
        }
    }
}

/// Responses sent from server to client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RpcResponse {
    /// Heartbeat response
    Pong {
        /// Server version
        version: String,
        /// Server uptime in seconds
        uptime_secs: u64,
    },

    /// Geofence check result
    Check {
        allowed: bool,
        country: String,
        /// Always empty; kept for parity with the HTTP response body
        error: String,
    },

    /// Error response
    Error { status: RpcStatus, message: String },
}

impl RpcResponse {
    pub fn error(status: RpcStatus, message: impl Into<String>) -> Self {
        RpcResponse::Error {
            status,
            message: message.into(),
        }
    }
}

/// Successful check answer, as seen by the client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckReply {
    pub allowed: bool,
    pub country: String,
}

/// RPC call errors
#[derive(Debug)]
pub enum RpcError {
    /// Nothing is listening at the address
    ServerNotRunning,
    /// Connect or read timed out
    Timeout,
    /// Framing error, or an unexpected response kind
    ProtocolError(String),
    /// The server answered with an error status
    Status { status: RpcStatus, message: String },
    /// IO error during communication
    IoError(io::Error),
}

impl RpcError {
    pub fn status(&self) -> Option<RpcStatus> {
        match self {
            RpcError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl fmt::Display for RpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RpcError::ServerNotRunning => write!(f, "Server is not running"),
            RpcError::Timeout => write!(f, "Connection timeout"),
            RpcError::ProtocolError(msg) => write!(f, "Protocol error: {}", msg),
            RpcError::Status { status, message } => write!(f, "{}: {}", status, message),
            RpcError::IoError(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for RpcError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RpcError::IoError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for RpcError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::ConnectionRefused | io::ErrorKind::NotFound => {
                RpcError::ServerNotRunning
            }
            _ => RpcError::IoError(err),
        }
    }
}
