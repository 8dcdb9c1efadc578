//! 国家查询能力抽象
//!
//! 传输层（HTTP / RPC）只依赖这里的 trait，不关心底层是哪种数据源。

use std::fmt;
use std::net::IpAddr;

use serde::{Serialize, Serializer};

use super::error::{CloseError, LookupError};

/// ISO 3166-1 alpha-2 国家代码 (e.g., "GB", "US")
///
/// Never empty: an empty code from the database is a lookup failure.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CountryCode(String);

impl CountryCode {
    /// Returns `None` for an empty or whitespace-only code.
    pub fn new(code: &str) -> Option<Self> {
        let code = code.trim();
        if code.is_empty() {
            None
        } else {
            Some(Self(code.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for CountryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CountryCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for CountryCode {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for CountryCode {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl Serialize for CountryCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

/// IP → 国家代码查询 trait
///
/// Implementations must be safe to call from any number of threads at once.
pub trait CountryLookup: Send + Sync {
    /// 返回 IP 地址对应的 ISO 国家代码
    fn lookup_country(&self, ip: IpAddr) -> Result<CountryCode, LookupError>;

    /// 释放底层资源并停止后台任务
    fn close(&self) -> Result<(), CloseError>;
}
