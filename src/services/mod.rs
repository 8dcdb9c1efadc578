//! Service layer for business logic
//!
//! Check logic shared between the HTTP API, the RPC server and the CLI.

mod geofence;

pub use geofence::{CheckError, CheckOutcome, GeofenceService, ReadinessProbe, is_allowed, parse_ip};
