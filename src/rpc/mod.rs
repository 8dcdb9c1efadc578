//! Binary RPC
//!
//! Length-prefixed JSON frames over TCP, served next to the HTTP API.
//!
//! - **types.rs**: request, response and error types
//! - **protocol.rs**: frame encoding/decoding
//! - **handler.rs**: request handling on top of the geofence service
//! - **server.rs**: TCP listener and per-connection loop
//! - **client.rs**: client for the CLI and tests

pub mod client;
pub mod handler;
pub mod protocol;
pub mod server;
pub mod types;

pub use client::RpcClient;
pub use handler::RpcHandler;
pub use protocol::{MAX_MESSAGE_SIZE, ProtocolError};
pub use server::RpcServer;
pub use types::{CheckReply, RpcError, RpcRequest, RpcResponse, RpcStatus};
