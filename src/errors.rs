use std::fmt;

use crate::geoip::{CloseError, LookupError, OpenError};
use crate::rpc::{ProtocolError, RpcError};

#[derive(Debug, Clone)]
pub enum GeofenceError {
    Config(String),
    DatabaseOpen(String),
    Lookup(String),
    Shutdown(String),
    FileOperation(String),
    Validation(String),
    Serialization(String),
    Rpc(String),
    Signal(String),
}

impl GeofenceError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            GeofenceError::Config(_) => "E001",
            GeofenceError::DatabaseOpen(_) => "E002",
            GeofenceError::Lookup(_) => "E003",
            GeofenceError::Shutdown(_) => "E004",
            GeofenceError::FileOperation(_) => "E005",
            GeofenceError::Validation(_) => "E006",
            GeofenceError::Serialization(_) => "E007",
            GeofenceError::Rpc(_) => "E008",
            GeofenceError::Signal(_) => "E009",
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            GeofenceError::Config(_) => "Configuration Error",
            GeofenceError::DatabaseOpen(_) => "Database Open Error",
            GeofenceError::Lookup(_) => "Lookup Error",
            GeofenceError::Shutdown(_) => "Shutdown Error",
            GeofenceError::FileOperation(_) => "File Operation Error",
            GeofenceError::Validation(_) => "Validation Error",
            GeofenceError::Serialization(_) => "Serialization Error",
            GeofenceError::Rpc(_) => "RPC Error",
            GeofenceError::Signal(_) => "Signal Error",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> &str {
        match self {
            GeofenceError::Config(msg)
            | GeofenceError::DatabaseOpen(msg)
            | GeofenceError::Lookup(msg)
            | GeofenceError::Shutdown(msg)
            | GeofenceError::FileOperation(msg)
            | GeofenceError::Validation(msg)
            | GeofenceError::Serialization(msg)
            | GeofenceError::Rpc(msg)
            | GeofenceError::Signal(msg) => msg,
        }
    }

    /// 格式化为彩色输出（用于 Server 模式的致命错误）
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        format!(
            "{} {} {}\n  {}",
            "[ERROR]".red().bold(),
            self.code().yellow(),
            self.error_type().red(),
            self.message().white()
        )
    }

    /// 格式化为简洁输出（用于 CLI 子命令）
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for GeofenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for GeofenceError {}

// 便捷的构造函数
impl GeofenceError {
    pub fn config<T: Into<String>>(msg: T) -> Self {
        GeofenceError::Config(msg.into())
    }

    pub fn database_open<T: Into<String>>(msg: T) -> Self {
        GeofenceError::DatabaseOpen(msg.into())
    }

    pub fn lookup<T: Into<String>>(msg: T) -> Self {
        GeofenceError::Lookup(msg.into())
    }

    pub fn shutdown<T: Into<String>>(msg: T) -> Self {
        GeofenceError::Shutdown(msg.into())
    }

    pub fn file_operation<T: Into<String>>(msg: T) -> Self {
        GeofenceError::FileOperation(msg.into())
    }

    pub fn validation<T: Into<String>>(msg: T) -> Self {
        GeofenceError::Validation(msg.into())
    }

    pub fn serialization<T: Into<String>>(msg: T) -> Self {
        GeofenceError::Serialization(msg.into())
    }

    pub fn rpc<T: Into<String>>(msg: T) -> Self {
        GeofenceError::Rpc(msg.into())
    }

    pub fn signal<T: Into<String>>(msg: T) -> Self {
        GeofenceError::Signal(msg.into())
    }
}

impl From<OpenError> for GeofenceError {
    fn from(err: OpenError) -> Self {
        GeofenceError::DatabaseOpen(err.to_string())
    }
}

impl From<LookupError> for GeofenceError {
    fn from(err: LookupError) -> Self {
        GeofenceError::Lookup(err.to_string())
    }
}

impl From<CloseError> for GeofenceError {
    fn from(err: CloseError) -> Self {
        GeofenceError::Shutdown(err.to_string())
    }
}

impl From<RpcError> for GeofenceError {
    fn from(err: RpcError) -> Self {
        GeofenceError::Rpc(err.to_string())
    }
}

impl From<ProtocolError> for GeofenceError {
    fn from(err: ProtocolError) -> Self {
        GeofenceError::Rpc(err.to_string())
    }
}

impl From<std::io::Error> for GeofenceError {
    fn from(err: std::io::Error) -> Self {
        GeofenceError::FileOperation(err.to_string())
    }
}

impl From<serde_json::Error> for GeofenceError {
    fn from(err: serde_json::Error) -> Self {
        GeofenceError::Serialization(err.to_string())
    }
}

impl From<config::ConfigError> for GeofenceError {
    fn from(err: config::ConfigError) -> Self {
        GeofenceError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, GeofenceError>;
