//! GeoIP 核心错误类型
//!
//! - `OpenError`: 构造时数据库不可用（致命）
//! - `LookupError`: 单次查询失败（调用方可恢复）
//! - `ReloadError`: 热重载内部错误，只记录日志，不向查询方传播
//! - `CloseError`: 关闭时的资源释放错误

use std::fmt;
use std::io;
use std::net::IpAddr;
use std::path::{Path, PathBuf};

use maxminddb::MaxMindDbError;

/// Database could not be opened at construction time.
#[derive(Debug)]
pub enum OpenError {
    /// The file is missing or unreadable
    Io { path: PathBuf, source: io::Error },
    /// The file was read but is not a valid MaxMind database
    Invalid {
        path: PathBuf,
        source: MaxMindDbError,
    },
}

impl OpenError {
    pub fn path(&self) -> &Path {
        match self {
            OpenError::Io { path, .. } | OpenError::Invalid { path, .. } => path,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, OpenError::Io { source, .. } if source.kind() == io::ErrorKind::NotFound)
    }
}

impl fmt::Display for OpenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OpenError::Io { path, source } => {
                write!(f, "failed to read MMDB file {}: {}", path.display(), source)
            }
            OpenError::Invalid { path, source } => {
                write!(f, "invalid MMDB file {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for OpenError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            OpenError::Io { source, .. } => Some(source),
            OpenError::Invalid { source, .. } => Some(source),
        }
    }
}

/// A single country lookup failed.
///
/// Every variant is an operational failure; transports report them as
/// internal errors, never as client errors.
#[derive(Debug)]
pub enum LookupError {
    /// The database reader returned an error
    Query(MaxMindDbError),
    /// No record for the address
    NotFound(IpAddr),
    /// A record exists but carries no country code
    EmptyCountry(IpAddr),
    /// The engine has been closed
    Closed,
}

impl fmt::Display for LookupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupError::Query(e) => write!(f, "country lookup failed: {}", e),
            LookupError::NotFound(ip) => write!(f, "no record found for {}", ip),
            LookupError::EmptyCountry(ip) => write!(f, "lookup returned empty country for {}", ip),
            LookupError::Closed => write!(f, "lookup engine is closed"),
        }
    }
}

impl std::error::Error for LookupError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LookupError::Query(e) => Some(e),
            _ => None,
        }
    }
}

impl From<MaxMindDbError> for LookupError {
    fn from(err: MaxMindDbError) -> Self {
        LookupError::Query(err)
    }
}

/// Hot-reload failure. Internal to the supervisor.
#[derive(Debug)]
pub enum ReloadError {
    /// Directory watch could not be established
    Watch(notify::Error),
    /// The database path has no file name component
    InvalidPath(PathBuf),
    /// The watcher thread could not be spawned
    Spawn(io::Error),
    /// The replacement file failed to open
    Open(OpenError),
    /// The engine was closed while the reload was in flight
    Closed,
}

impl fmt::Display for ReloadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReloadError::Watch(e) => write!(f, "failed to watch mmdb directory: {}", e),
            ReloadError::InvalidPath(p) => write!(f, "not a file path: {}", p.display()),
            ReloadError::Spawn(e) => write!(f, "failed to spawn watcher thread: {}", e),
            ReloadError::Open(e) => write!(f, "failed to open new MMDB file: {}", e),
            ReloadError::Closed => write!(f, "engine closed during reload"),
        }
    }
}

impl std::error::Error for ReloadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReloadError::Watch(e) => Some(e),
            ReloadError::Spawn(e) => Some(e),
            ReloadError::Open(e) => Some(e),
            _ => None,
        }
    }
}

/// Shutdown failure, returned once to the caller of `close`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseError {
    /// `close` was already called on this engine
    AlreadyClosed,
}

impl fmt::Display for CloseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CloseError::AlreadyClosed => write!(f, "lookup engine already closed"),
        }
    }
}

impl std::error::Error for CloseError {}
