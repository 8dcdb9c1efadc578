//! CLI mode
//!
//! One-shot commands: offline lookups, RPC checks and config generation.

use std::path::Path;

use tracing::debug;

use crate::cli::{Commands, ConfigCommands};
use crate::config::{StaticConfig, get_config};
use crate::errors::{GeofenceError, Result};
use crate::geoip::MmdbEngine;
use crate::rpc::RpcClient;
use crate::runtime::lifetime::startup::mmdb_path;
use crate::services::parse_ip;

/// Run a CLI command
pub async fn run_cli(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Lookup { db, ips } => lookup(db, &ips),
        Commands::Check { addr, ip, allow } => check(&addr, &ip, &allow).await,
        Commands::Config {
            action: ConfigCommands::Generate { output_path, force },
        } => config_generate(output_path, force),
        Commands::Serve => Err(GeofenceError::validation("serve is not a CLI command")),
    }
}

fn lookup(db: Option<String>, ips: &[String]) -> Result<()> {
    let path = match db {
        Some(p) => p,
        None => mmdb_path(&get_config())?.to_string(),
    };
    let engine = MmdbEngine::open_static(&path)?;

    let mut failed = 0usize;
    for raw in ips {
        match parse_ip(raw) {
            Some(ip) => match engine.lookup_country(ip) {
                Ok(country) => println!("{}\t{}", raw, country),
                Err(e) => {
                    failed += 1;
                    eprintln!("{}\terror: {}", raw, e);
                }
            },
            None => {
                failed += 1;
                eprintln!("{}\terror: invalid IP address", raw);
            }
        }
    }
    if let Err(e) = engine.close() {
        debug!("Lookup engine close: {}", e);
    }

    if failed > 0 {
        return Err(GeofenceError::lookup(format!(
            "{} of {} lookups failed",
            failed,
            ips.len()
        )));
    }
    Ok(())
}

async fn check(addr: &str, ip: &str, allow: &[String]) -> Result<()> {
    let mut client = RpcClient::connect(addr).await?;
    let reply = client.check(ip, allow).await?;
    println!(
        "allowed={} country={}",
        reply.allowed, reply.country
    );
    Ok(())
}

fn config_generate(output_path: Option<String>, force: bool) -> Result<()> {
    let sample = StaticConfig::generate_sample_config();

    let Some(path) = output_path else {
        print!("{}", sample);
        return Ok(());
    };

    if Path::new(&path).exists() && !force {
        return Err(GeofenceError::validation(format!(
            "{} already exists (use --force to overwrite)",
            path
        )));
    }
    std::fs::write(&path, sample)?;
    println!("Sample configuration written to {}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_generate_refuses_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "existing").unwrap();
        let path_str = path.to_string_lossy().into_owned();

        let err = config_generate(Some(path_str.clone()), false).unwrap_err();
        assert!(matches!(err, GeofenceError::Validation(_)));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "existing");

        config_generate(Some(path_str), true).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("[server]"));
    }

    #[test]
    fn test_lookup_reports_failed_addresses() {
        use crate::geoip::test_mmdb::MmdbWriter;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.mmdb");
        let mut w = MmdbWriter::new("GeoIP2-Country-Test");
        w.insert_country("2.125.160.216/29", "GB");
        w.write_to(&path);
        let db = path.to_string_lossy().into_owned();

        lookup(Some(db.clone()), &["2.125.160.216".to_string()]).unwrap();

        let err = lookup(
            Some(db),
            &["2.125.160.216".to_string(), "1.1.1.1".to_string(), "bogus".to_string()],
        )
        .unwrap_err();
        assert!(matches!(err, GeofenceError::Lookup(_)));
        assert!(err.message().contains("2 of 3"));
    }

    #[test]
    fn test_lookup_with_missing_db_fails() {
        let err = lookup(Some("/nonexistent/db.mmdb".to_string()), &["1.1.1.1".to_string()])
            .unwrap_err();
        assert!(matches!(err, GeofenceError::DatabaseOpen(_)));
    }
}
