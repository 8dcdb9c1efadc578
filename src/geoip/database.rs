//! MaxMind 数据库句柄
//!
//! 一个 `GeoDatabase` 打开后即不可变，整个文件读入内存。
//! 替换文件不会影响已打开的句柄。

use std::net::IpAddr;
use std::path::{Path, PathBuf};

use maxminddb::Reader;
use serde::{Deserialize, Serialize};
use tracing::trace;

use super::error::{LookupError, OpenError};
use super::lookup::CountryCode;

/// Country portion of a GeoIP2/GeoLite2 record. Other fields are skipped.
#[derive(Deserialize)]
struct CountryRecord<'a> {
    #[serde(borrow)]
    country: Option<RecordCountry<'a>>,
}

#[derive(Deserialize)]
struct RecordCountry<'a> {
    #[serde(borrow)]
    iso_code: Option<&'a str>,
}

/// Metadata of an opened database, for logs and status output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatabaseInfo {
    pub database_type: String,
    pub build_epoch: u64,
    pub ip_version: u16,
    pub node_count: u32,
}

/// An opened, read-only geolocation database.
pub struct GeoDatabase {
    reader: Reader<Vec<u8>>,
    path: PathBuf,
}

impl GeoDatabase {
    /// Read and validate the database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, OpenError> {
        let path = path.as_ref().to_path_buf();
        let bytes = std::fs::read(&path).map_err(|source| OpenError::Io {
            path: path.clone(),
            source,
        })?;
        let reader = Reader::from_source(bytes).map_err(|source| OpenError::Invalid {
            path: path.clone(),
            source,
        })?;
        Ok(Self { reader, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn info(&self) -> DatabaseInfo {
        let meta = &self.reader.metadata;
        DatabaseInfo {
            database_type: meta.database_type.clone(),
            build_epoch: meta.build_epoch,
            ip_version: meta.ip_version,
            node_count: meta.node_count,
        }
    }

    /// Look up the ISO country code for `ip`.
    pub fn country(&self, ip: IpAddr) -> Result<CountryCode, LookupError> {
        let result = self.reader.lookup(ip)?;
        let record: CountryRecord<'_> = result.decode()?.ok_or(LookupError::NotFound(ip))?;

        let code = record
            .country
            .and_then(|c| c.iso_code)
            .and_then(CountryCode::new)
            .ok_or(LookupError::EmptyCountry(ip))?;

        trace!("MaxMind lookup for {}: country={}", ip, code);
        Ok(code)
    }
}

impl std::fmt::Debug for GeoDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeoDatabase")
            .field("path", &self.path)
            .field("database_type", &self.reader.metadata.database_type)
            .finish()
    }
}
