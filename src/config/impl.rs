use std::sync::{Arc, OnceLock};

use arc_swap::ArcSwap;

use super::StaticConfig;
use crate::errors::Result;

static CONFIG: OnceLock<ArcSwap<StaticConfig>> = OnceLock::new();

fn global() -> &'static ArcSwap<StaticConfig> {
    CONFIG.get_or_init(|| ArcSwap::from_pointee(StaticConfig::default()))
}

/// Get the global configuration instance
///
/// Returns an Arc pointer to the configuration, which is cheap to clone
/// and doesn't hold any locks. Before `init_config` runs this is the
/// built-in default configuration.
pub fn get_config() -> Arc<StaticConfig> {
    global().load_full()
}

/// Initialize the global configuration
///
/// Loads `path` if given, otherwise the optional "config.toml" in the current
/// directory, then applies environment overrides.
///
/// # Examples
/// ```no_run
/// use geofence::config::init_config;
/// init_config(None).unwrap();
/// ```
pub fn init_config(path: Option<&str>) -> Result<Arc<StaticConfig>> {
    let config = Arc::new(StaticConfig::load(path)?);
    global().store(Arc::clone(&config));
    Ok(config)
}
