use std::net::IpAddr;

use serde::{Deserialize, Serialize};

use crate::errors::{GeofenceError, Result};

/// Flat deployment variables and the keys they override.
///
/// These win over both `config.toml` and `GEOFENCE__*` variables.
pub const FLAT_ENV_OVERRIDES: &[(&str, &str)] = &[
    ("MMDB_PATH", "geoip.mmdb_path"),
    ("PORT", "server.port"),
    ("GRPC_PORT", "rpc.port"),
    ("LOG_LEVEL", "logging.level"),
];

/// 静态配置（从 TOML 加载，启动时使用）
///
/// 包含：
/// - server: HTTP 监听地址、端口、worker 数量
/// - rpc: 二进制 RPC 监听配置
/// - geoip: MMDB 文件路径与热重载开关
/// - logging: 日志配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StaticConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub rpc: RpcConfig,
    #[serde(default)]
    pub geoip: GeoIpConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl StaticConfig {
    /// 从 TOML 文件和环境变量加载配置
    ///
    /// 优先级：扁平变量 (MMDB_PATH 等) > GEOFENCE__* > TOML 文件 > 默认值
    /// ENV 前缀：GEOFENCE，分隔符：__
    /// 示例：GEOFENCE__SERVER__PORT=9999
    ///
    /// `path` 为 None 时读取当前目录下可选的 `config.toml`；
    /// 显式指定的文件必须存在。
    pub fn load(path: Option<&str>) -> Result<Self> {
        let overrides: Vec<(&str, Option<String>)> = FLAT_ENV_OVERRIDES
            .iter()
            .map(|(var, key)| (*key, std::env::var(var).ok().filter(|v| !v.is_empty())))
            .collect();
        Self::load_with_overrides(path, &overrides)
    }

    /// Same as [`StaticConfig::load`], with the flat overrides supplied by the caller.
    pub fn load_with_overrides(path: Option<&str>, overrides: &[(&str, Option<String>)]) -> Result<Self> {
        use config::{Config, Environment, File};

        let (file, required) = match path {
            Some(p) => (p, true),
            None => ("config.toml", false),
        };

        let mut builder = Config::builder()
            // 1. 从 TOML 文件加载
            .add_source(File::with_name(file).required(required))
            // 2. 从环境变量覆盖，前缀 GEOFENCE，分隔符 __
            .add_source(
                Environment::with_prefix("GEOFENCE")
                    .separator("__")
                    .try_parsing(true),
            );

        // 3. 扁平变量最高优先级
        for (key, value) in overrides {
            builder = builder.set_override_option(*key, value.clone())?;
        }

        let config: StaticConfig = builder.build()?.try_deserialize()?;
        config.validate()?;

        if std::path::Path::new(file).exists() {
            eprintln!("[INFO] Configuration loaded from: {}", file);
        }
        Ok(config)
    }

    /// Reject values that would only fail later at startup.
    pub fn validate(&self) -> Result<()> {
        if self.geoip.ready_probe_ip.parse::<IpAddr>().is_err() {
            return Err(GeofenceError::config(format!(
                "geoip.ready_probe_ip is not an IP address: '{}'",
                self.geoip.ready_probe_ip
            )));
        }
        if !matches!(self.logging.format.as_str(), "json" | "text") {
            return Err(GeofenceError::config(format!(
                "logging.format must be 'json' or 'text', got '{}'",
                self.logging.format
            )));
        }
        if self.server.workers == 0 {
            return Err(GeofenceError::config("server.workers must be at least 1"));
        }
        Ok(())
    }

    /// 生成示例 TOML 配置文件
    pub fn generate_sample_config() -> String {
        let mut sample_config = Self::default();
        sample_config.geoip.mmdb_path = Some("/data/GeoLite2-Country.mmdb".to_string());
        toml::to_string_pretty(&sample_config)
            .unwrap_or_else(|e| format!("Error generating sample config: {}", e))
    }
}

/// HTTP 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_host")]
    pub host: String,
    #[serde(default = "default_server_port")]
    pub port: u16,
    #[serde(default = "default_workers")]
    pub workers: usize,
    #[serde(default = "default_shutdown_timeout_secs")]
    pub shutdown_timeout_secs: u64,
}

/// RPC 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcConfig {
    #[serde(default = "default_rpc_enabled")]
    pub enabled: bool,
    #[serde(default = "default_server_host")]
    pub host: String,
    #[serde(default = "default_rpc_port")]
    pub port: u16,
}

/// GeoIP 数据库配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeoIpConfig {
    /// MaxMind 数据库文件路径（启动服务时必填）
    #[serde(default)]
    pub mmdb_path: Option<String>,
    /// readiness 探针查询的地址
    #[serde(default = "default_ready_probe_ip")]
    pub ready_probe_ip: String,
    #[serde(default = "default_hot_reload")]
    pub hot_reload: bool,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default = "default_enable_rotation")]
    pub enable_rotation: bool,
    #[serde(default = "default_max_backups")]
    pub max_backups: u32,
}

// ============================================================
// Default value functions
// ============================================================

fn default_server_host() -> String {
    "0.0.0.0".to_string()
}

fn default_server_port() -> u16 {
    8080
}

fn default_workers() -> usize {
    num_cpus::get()
}

fn default_shutdown_timeout_secs() -> u64 {
    30
}

fn default_rpc_enabled() -> bool {
    true
}

fn default_rpc_port() -> u16 {
    50051
}

fn default_ready_probe_ip() -> String {
    "8.8.8.8".to_string()
}

fn default_hot_reload() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

fn default_enable_rotation() -> bool {
    true
}

fn default_max_backups() -> u32 {
    5
}

// ============================================================
// Default implementations
// ============================================================

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
            workers: default_workers(),
            shutdown_timeout_secs: default_shutdown_timeout_secs(),
        }
    }
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            enabled: default_rpc_enabled(),
            host: default_server_host(),
            port: default_rpc_port(),
        }
    }
}

impl Default for GeoIpConfig {
    fn default() -> Self {
        Self {
            mmdb_path: None,
            ready_probe_ip: default_ready_probe_ip(),
            hot_reload: default_hot_reload(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
            enable_rotation: default_enable_rotation(),
            max_backups: default_max_backups(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = StaticConfig::default();
        assert_eq!(cfg.server.host, "0.0.0.0");
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.server.shutdown_timeout_secs, 30);
        assert!(cfg.server.workers >= 1);
        assert!(cfg.rpc.enabled);
        assert_eq!(cfg.rpc.port, 50051);
        assert_eq!(cfg.geoip.mmdb_path, None);
        assert_eq!(cfg.geoip.ready_probe_ip, "8.8.8.8");
        assert!(cfg.geoip.hot_reload);
        assert_eq!(cfg.logging.format, "json");
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_probe_ip() {
        let mut cfg = StaticConfig::default();
        cfg.geoip.ready_probe_ip = "not-an-ip".to_string();
        let err = cfg.validate().unwrap_err();
        assert!(err.message().contains("ready_probe_ip"));
    }

    #[test]
    fn test_validate_rejects_unknown_log_format() {
        let mut cfg = StaticConfig::default();
        cfg.logging.format = "xml".to_string();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_sample_config_parses_back() {
        let sample = StaticConfig::generate_sample_config();
        assert!(sample.contains("[geoip]"));
        let parsed: StaticConfig = toml::from_str(&sample).unwrap();
        assert_eq!(
            parsed.geoip.mmdb_path.as_deref(),
            Some("/data/GeoLite2-Country.mmdb")
        );
        assert_eq!(parsed.rpc.port, 50051);
    }
}
