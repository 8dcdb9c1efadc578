use std::process::ExitCode;

use clap::Parser;

use geofence::cli::{Cli, Commands};
use geofence::config::init_config;
use geofence::runtime::modes::{run_cli, run_server};
use geofence::system::init_logging;

#[actix_web::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = match init_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e.format_colored());
            return ExitCode::FAILURE;
        }
    };

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            // Guard must outlive the server so buffered log lines are flushed
            let _guard = match init_logging(&config.logging) {
                Ok(guard) => guard,
                Err(e) => {
                    eprintln!("{}", e.format_colored());
                    return ExitCode::FAILURE;
                }
            };

            if let Err(e) = run_server().await {
                tracing::error!("{}", e);
                eprintln!("{}", e.format_colored());
                return ExitCode::FAILURE;
            }
        }
        cmd => {
            if let Err(e) = run_cli(cmd).await {
                eprintln!("{}", e.format_simple());
                return ExitCode::FAILURE;
            }
        }
    }

    ExitCode::SUCCESS
}
