use std::net::IpAddr;
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::StaticConfig;
use crate::errors::{GeofenceError, Result};
use crate::geoip::{CountryLookup, MmdbEngine};
use crate::services::{GeofenceService, ReadinessProbe};

pub struct StartupContext {
    pub engine: Arc<MmdbEngine>,
    pub service: GeofenceService,
    pub probe: ReadinessProbe,
}

/// Resolve the database path from configuration
pub fn mmdb_path(config: &StaticConfig) -> Result<&str> {
    config
        .geoip
        .mmdb_path
        .as_deref()
        .filter(|p| !p.trim().is_empty())
        .ok_or_else(|| {
            GeofenceError::config("MMDB_PATH is required (set geoip.mmdb_path or MMDB_PATH)")
        })
}

/// 准备服务器启动的上下文
///
/// Opening the database is fatal on failure; a watcher that fails to start
/// only disables hot-reload.
pub fn prepare_server_startup(config: &StaticConfig) -> Result<StartupContext> {
    let start_time = std::time::Instant::now();
    debug!("Starting pre-startup processing...");

    let path = mmdb_path(config)?;
    let probe_ip: IpAddr = config.geoip.ready_probe_ip.parse().map_err(|_| {
        GeofenceError::config(format!(
            "geoip.ready_probe_ip is not an IP address: '{}'",
            config.geoip.ready_probe_ip
        ))
    })?;

    let engine = Arc::new(MmdbEngine::open_with_reload(path, config.geoip.hot_reload)?);
    let lookup: Arc<dyn CountryLookup> = engine.clone();

    let service = GeofenceService::new(Arc::clone(&lookup));
    let probe = ReadinessProbe::new(lookup, probe_ip);

    info!(
        "Pre-startup completed in {} ms (hot_reload: {}, watching: {})",
        start_time.elapsed().as_millis(),
        config.geoip.hot_reload,
        engine.is_watching()
    );

    Ok(StartupContext {
        engine,
        service,
        probe,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mmdb_path_required() {
        let mut config = StaticConfig::default();
        assert!(matches!(mmdb_path(&config), Err(GeofenceError::Config(_))));

        config.geoip.mmdb_path = Some("  ".to_string());
        assert!(mmdb_path(&config).is_err());

        config.geoip.mmdb_path = Some("/data/db.mmdb".to_string());
        assert_eq!(mmdb_path(&config).unwrap(), "/data/db.mmdb");
    }

    #[test]
    fn test_missing_database_is_fatal() {
        let mut config = StaticConfig::default();
        config.geoip.mmdb_path = Some("/nonexistent/GeoLite2-Country.mmdb".to_string());
        let err = prepare_server_startup(&config).err().unwrap();
        assert!(matches!(err, GeofenceError::DatabaseOpen(_)));
    }
}
