//! Geofence check service
//!
//! Validation and allow-list matching shared by the HTTP and RPC transports.

use std::fmt;
use std::net::IpAddr;
use std::sync::Arc;

use tracing::{debug, error};

use crate::geoip::{CountryCode, CountryLookup, LookupError};

/// Result of a successful check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOutcome {
    pub allowed: bool,
    pub country: CountryCode,
}

/// Why a check could not be answered.
#[derive(Debug)]
pub enum CheckError {
    /// `ip` was empty
    MissingIp,
    /// `allowed_countries` was empty
    MissingAllowedCountries,
    /// `ip` is not an IPv4 or IPv6 literal
    InvalidIp(String),
    /// The lookup engine failed
    Lookup(LookupError),
}

impl CheckError {
    /// Client errors are reported as bad requests; lookup failures are not.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, CheckError::Lookup(_))
    }
}

impl fmt::Display for CheckError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckError::MissingIp => write!(f, "ip is required"),
            CheckError::MissingAllowedCountries => write!(f, "allowed_countries is required"),
            CheckError::InvalidIp(_) => write!(f, "invalid IP address"),
            CheckError::Lookup(_) => write!(f, "lookup failed"),
        }
    }
}

impl std::error::Error for CheckError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CheckError::Lookup(e) => Some(e),
            _ => None,
        }
    }
}

/// Parse an IP literal and fold IPv4-mapped IPv6 addresses to IPv4.
pub fn parse_ip(raw: &str) -> Option<IpAddr> {
    raw.parse::<IpAddr>().ok().map(|ip| ip.to_canonical())
}

/// Exact, case-sensitive membership of `country` in `allowed`.
pub fn is_allowed(country: &CountryCode, allowed: &[String]) -> bool {
    allowed.iter().any(|c| country == c.as_str())
}

/// Geofence service
///
/// Transports hold it behind an `Arc`; it is cheap to clone.
#[derive(Clone)]
pub struct GeofenceService {
    lookup: Arc<dyn CountryLookup>,
}

impl GeofenceService {
    pub fn new(lookup: Arc<dyn CountryLookup>) -> Self {
        Self { lookup }
    }

    pub fn lookup(&self) -> &Arc<dyn CountryLookup> {
        &self.lookup
    }

    /// Decide whether `ip` resolves to one of `allowed`.
    pub fn check(&self, ip: &str, allowed: &[String]) -> Result<CheckOutcome, CheckError> {
        if ip.is_empty() {
            return Err(CheckError::MissingIp);
        }
        if allowed.is_empty() {
            return Err(CheckError::MissingAllowedCountries);
        }

        let addr = parse_ip(ip).ok_or_else(|| CheckError::InvalidIp(ip.to_string()))?;

        let country = self.lookup.lookup_country(addr).map_err(|e| {
            error!(ip = %addr, error = %e, "country lookup failed");
            CheckError::Lookup(e)
        })?;

        let allowed = is_allowed(&country, allowed);
        debug!(ip = %addr, country = %country, allowed, "check completed");

        Ok(CheckOutcome { allowed, country })
    }
}

impl fmt::Debug for GeofenceService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeofenceService").finish_non_exhaustive()
    }
}

/// Readiness probe: one lookup of a well-known address.
#[derive(Clone)]
pub struct ReadinessProbe {
    lookup: Arc<dyn CountryLookup>,
    ip: IpAddr,
}

impl ReadinessProbe {
    pub fn new(lookup: Arc<dyn CountryLookup>, ip: IpAddr) -> Self {
        Self { lookup, ip }
    }

    pub fn ip(&self) -> IpAddr {
        self.ip
    }

    pub fn probe(&self) -> Result<CountryCode, LookupError> {
        self.lookup.lookup_country(self.ip)
    }
}
