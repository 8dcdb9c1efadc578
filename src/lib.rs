//! Geofence - IP country allow-list service
//!
//! Answers "is this IP address in one of these countries?" over HTTP and a
//! framed binary RPC, using a MaxMind database that is hot-reloaded when the
//! file on disk is replaced.
//!
//! # Architecture
//! - `geoip`: lookup engine and reload supervisor
//! - `services`: check logic shared by the transports
//! - `api`: HTTP services and middleware
//! - `rpc`: binary RPC server and client
//! - `config`: configuration management
//! - `runtime`: application lifecycle and execution modes
//! - `system`: logging and signal handling

pub mod api;
pub mod cli;
pub mod config;
pub mod errors;
pub mod geoip;
pub mod rpc;
pub mod runtime;
pub mod services;
pub mod system;
