//! Command-line interface definitions using clap
//!
//! This module defines the CLI structure for geofence using clap's derive macros.

use clap::{Parser, Subcommand};

/// Geofence - IP country allow-list service
#[derive(Parser, Debug)]
#[command(name = "geofence")]
#[command(version)]
#[command(about = "Checks whether an IP address belongs to a set of permitted countries", long_about = None)]
pub struct Cli {
    /// Configuration file (default: ./config.toml if present)
    #[arg(long, short = 'c', global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP and RPC servers (default)
    Serve,

    /// Look up the country of one or more addresses offline
    Lookup {
        /// MaxMind database file (default: geoip.mmdb_path from config)
        #[arg(long)]
        db: Option<String>,

        /// Addresses to look up
        #[arg(required = true)]
        ips: Vec<String>,
    },

    /// Run a check against a running server over RPC
    Check {
        /// RPC server address
        #[arg(long, default_value = "127.0.0.1:50051")]
        addr: String,

        /// Address to check
        #[arg(long)]
        ip: String,

        /// Allowed country codes, comma separated (e.g. GB,US)
        #[arg(long, value_delimiter = ',', required = true)]
        allow: Vec<String>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

/// Configuration management commands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print a sample configuration file
    Generate {
        /// Write to this path instead of stdout
        output_path: Option<String>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}
