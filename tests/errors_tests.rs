use geofence::errors::{GeofenceError, Result};
use geofence::geoip::{CloseError, LookupError, MmdbEngine};
use geofence::rpc::{RpcError, RpcStatus};

#[cfg(test)]
mod error_creation_tests {
    use super::*;

    #[test]
    fn test_config_error() {
        let error = GeofenceError::config("MMDB_PATH is required");

        assert!(matches!(error, GeofenceError::Config(_)));
        assert_eq!(error.code(), "E001");
        assert!(error.to_string().contains("Configuration Error"));
        assert!(error.to_string().contains("MMDB_PATH is required"));
    }

    #[test]
    fn test_database_open_error() {
        let error = GeofenceError::database_open("invalid MMDB file");

        assert!(matches!(error, GeofenceError::DatabaseOpen(_)));
        assert_eq!(error.code(), "E002");
        assert_eq!(error.error_type(), "Database Open Error");
    }

    #[test]
    fn test_rpc_error() {
        let error = GeofenceError::rpc("connection refused");

        assert!(matches!(error, GeofenceError::Rpc(_)));
        assert_eq!(error.message(), "connection refused");
    }
}

#[cfg(test)]
mod error_conversion_tests {
    use super::*;

    #[test]
    fn test_from_open_error() {
        let open = MmdbEngine::open("/nonexistent/geofence/GeoLite2-Country.mmdb").unwrap_err();
        let error: GeofenceError = open.into();

        assert!(matches!(error, GeofenceError::DatabaseOpen(_)));
        assert!(error.message().contains("GeoLite2-Country.mmdb"));
    }

    #[test]
    fn test_from_lookup_error() {
        let error: GeofenceError = LookupError::Closed.into();
        assert!(matches!(error, GeofenceError::Lookup(_)));
        assert_eq!(error.message(), "lookup engine is closed");
    }

    #[test]
    fn test_from_close_error() {
        let error: GeofenceError = CloseError::AlreadyClosed.into();
        assert!(matches!(error, GeofenceError::Shutdown(_)));
    }

    #[test]
    fn test_from_rpc_status() {
        let error: GeofenceError = RpcError::Status {
            status: RpcStatus::InvalidArgument,
            message: "invalid IP address".to_string(),
        }
        .into();
        assert!(matches!(error, GeofenceError::Rpc(_)));
        assert_eq!(error.message(), "InvalidArgument: invalid IP address");
    }

    #[test]
    fn test_from_serde_error() {
        let bad = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let error: GeofenceError = bad.into();
        assert!(matches!(error, GeofenceError::Serialization(_)));
    }

    #[test]
    fn test_question_mark_propagation() {
        fn open_missing() -> Result<()> {
            MmdbEngine::open("/nonexistent/db.mmdb")?;
            Ok(())
        }

        let err = open_missing().unwrap_err();
        assert_eq!(err.code(), "E002");
    }
}

#[cfg(test)]
mod error_format_tests {
    use super::*;

    #[test]
    fn test_simple_format() {
        let error = GeofenceError::file_operation("config.toml already exists");
        assert_eq!(
            error.format_simple(),
            "File Operation Error: config.toml already exists"
        );
    }

    #[test]
    fn test_colored_format() {
        let error = GeofenceError::signal("failed to install handler");
        let out = error.format_colored();
        assert!(out.contains("E009"));
        assert!(out.contains("failed to install handler"));
    }
}
