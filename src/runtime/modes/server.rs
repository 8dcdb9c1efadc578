//! Server mode
//!
//! Starts the HTTP and RPC servers over one lookup engine and tears them
//! down in order on SIGINT / SIGTERM.

use actix_web::{App, HttpServer, web};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::api;
use crate::api::middleware::{AccessLogMiddleware, RequestIdMiddleware};
use crate::config::get_config;
use crate::errors::{GeofenceError, Result};
use crate::rpc::{RpcHandler, RpcServer};
use crate::runtime::lifetime::{self, shutdown::RpcTask};
use crate::system::shutdown_signal;

/// Run the HTTP and RPC servers
///
/// This function:
/// 1. Opens the lookup engine (fatal on failure)
/// 2. Starts the RPC server, if enabled
/// 3. Starts the HTTP server
/// 4. Waits for a shutdown signal, then stops RPC, HTTP and the engine
///
/// **Note**: Configuration and logging must be initialized before calling this function
pub async fn run_server() -> Result<()> {
    let config = get_config();

    let startup = lifetime::startup::prepare_server_startup(&config).map_err(|e| {
        error!("Server startup failed: {}", e);
        e
    })?;
    let engine = startup.engine.clone();

    let rpc = if config.rpc.enabled {
        let bind_address = format!("{}:{}", config.rpc.host, config.rpc.port);
        let server = RpcServer::bind(bind_address.as_str(), RpcHandler::new(startup.service.clone()))
            .await
            .map_err(|e| GeofenceError::rpc(format!("failed to bind {}: {}", bind_address, e)))?;
        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(server.serve(rx));
        Some(RpcTask {
            shutdown: tx,
            handle,
        })
    } else {
        warn!("RPC server disabled by configuration");
        None
    };

    let workers = config.server.workers.clamp(1, 64);
    let grace = Duration::from_secs(config.server.shutdown_timeout_secs);
    let service = startup.service.clone();
    let probe = startup.probe.clone();

    let bind_address = format!("{}:{}", config.server.host, config.server.port);
    info!("Starting HTTP server at http://{} ({} workers)", bind_address, workers);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(AccessLogMiddleware)
            .wrap(RequestIdMiddleware) // 最外层，access log 落在 request span 内
            .app_data(web::Data::new(service.clone()))
            .app_data(web::Data::new(probe.clone()))
            .configure(api::configure)
    })
    .workers(workers)
    .shutdown_timeout(grace.as_secs())
    .disable_signals()
    .bind(&bind_address)
    .map_err(|e| GeofenceError::config(format!("failed to bind {}: {}", bind_address, e)))?
    .run();

    let handle = server.handle();
    tokio::pin!(server);

    // Wait for server or shutdown signal
    let exited = tokio::select! {
        res = &mut server => Some(res),
        _ = shutdown_signal() => None,
    };

    if let Some(rpc) = rpc {
        lifetime::shutdown::stop_rpc(rpc).await;
    }

    match exited {
        Some(res) => {
            if let Err(e) = res {
                error!("HTTP server exited with error: {}", e);
            }
        }
        None => lifetime::shutdown::stop_http(handle, server.as_mut(), grace).await,
    }

    lifetime::shutdown::close_engine(&engine);
    warn!("Graceful shutdown: all tasks completed");
    Ok(())
}
