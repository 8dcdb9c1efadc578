//! GeoIP 查询模块
//!
//! 基于 MaxMind 数据库的国家查询，支持：
//! - 多线程并发无锁查询
//! - 数据库文件被替换时自动热重载
//! - 新文件无效时保留旧句柄继续服务

mod database;
mod engine;
mod error;
mod lookup;
mod watcher;

// Fixture writer shared with the integration tests
#[cfg(test)]
#[allow(dead_code)]
#[path = "../../tests/common/mmdb.rs"]
pub(crate) mod test_mmdb;

pub use database::{DatabaseInfo, GeoDatabase};
pub use engine::MmdbEngine;
pub use error::{CloseError, LookupError, OpenError, ReloadError};
pub use lookup::{CountryCode, CountryLookup};
pub use watcher::{FileChange, classify, relevant_change, watch_dir};
