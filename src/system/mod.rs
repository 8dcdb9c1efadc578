//! System-level modules
//!
//! - Logging initialization
//! - Shutdown signal handling

pub mod logging;
pub mod signal;

pub use logging::init_logging;
pub use signal::shutdown_signal;
