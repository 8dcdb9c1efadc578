//! Shared helpers for integration tests
//!
//! - `mmdb`: MaxMind DB writer for fixture databases
//! - `MockLookup`: in-memory `CountryLookup`

#![allow(dead_code)]

pub mod mmdb;

use std::collections::HashMap;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use geofence::geoip::{CloseError, CountryCode, CountryLookup, LookupError};

pub use mmdb::MmdbWriter;

pub const GB_IP: &str = "2.125.160.216";
pub const US_IP: &str = "216.160.83.56";
pub const JP_IP: &str = "2001:218::";
pub const PROBE_IP: &str = "8.8.8.8";
/// Has a record, but the record carries no country
pub const NO_COUNTRY_IP: &str = "10.1.2.3";
/// Not in any fixture network
pub const UNKNOWN_IP: &str = "1.1.1.1";

/// The standard fixture database
pub fn country_db() -> MmdbWriter {
    let mut w = MmdbWriter::new("GeoIP2-Country-Test");
    w.insert_country("2.125.160.216/29", "GB")
        .insert_country("216.160.83.56/29", "US")
        .insert_country("8.8.8.0/24", "US")
        .insert_country("2001:218::/32", "JP")
        .insert_without_country("10.0.0.0/8");
    w
}

/// Same networks, but `GB_IP` now resolves to FR
pub fn alternate_country_db() -> MmdbWriter {
    let mut w = MmdbWriter::new("GeoIP2-Country-Test").build_epoch(1_800_000_000);
    w.insert_country("2.125.160.216/29", "FR")
        .insert_country("216.160.83.56/29", "US")
        .insert_country("8.8.8.0/24", "US")
        .insert_country("2001:218::/32", "JP")
        .insert_without_country("10.0.0.0/8");
    w
}

/// Write the standard fixture into `dir` and return its path
pub fn write_country_db(dir: &Path) -> PathBuf {
    let path = dir.join("GeoLite2-Country.mmdb");
    country_db().write_to(&path);
    path
}

/// Replace `dest` the way database updaters do: write beside it, then rename
pub fn replace_atomically(dest: &Path, bytes: &[u8]) {
    let staging = dest.with_extension("mmdb.tmp");
    std::fs::write(&staging, bytes).expect("failed to write staging file");
    std::fs::rename(&staging, dest).expect("failed to rename staging file");
}

/// Poll `cond` until it holds or `timeout` passes
pub fn wait_until(timeout: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(25));
    }
    cond()
}

pub fn ip(s: &str) -> IpAddr {
    s.parse().expect("bad test IP")
}

pub fn codes(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

/// In-memory lookup with a fixed table
pub struct MockLookup {
    table: HashMap<IpAddr, String>,
    failing: bool,
    closed: AtomicBool,
    calls: AtomicUsize,
}

impl MockLookup {
    pub fn new(entries: &[(&str, &str)]) -> Self {
        Self {
            table: entries
                .iter()
                .map(|(i, c)| (ip(i), c.to_string()))
                .collect(),
            failing: false,
            closed: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        }
    }

    /// Every lookup fails
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::new(&[])
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl CountryLookup for MockLookup {
    fn lookup_country(&self, ip: IpAddr) -> Result<CountryCode, LookupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.closed.load(Ordering::SeqCst) {
            return Err(LookupError::Closed);
        }
        if self.failing {
            return Err(LookupError::NotFound(ip));
        }
        match self.table.get(&ip) {
            Some(code) => CountryCode::new(code).ok_or(LookupError::EmptyCountry(ip)),
            None => Err(LookupError::NotFound(ip)),
        }
    }

    fn close(&self) -> Result<(), CloseError> {
        if self.closed.swap(true, Ordering::SeqCst) {
            Err(CloseError::AlreadyClosed)
        } else {
            Ok(())
        }
    }
}
