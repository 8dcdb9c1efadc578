use std::time::Duration;

use actix_web::dev::{Server, ServerHandle};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{error, info, warn};

use crate::geoip::{CountryLookup, MmdbEngine};

/// 单个任务超时时间（秒）
const TASK_TIMEOUT_SECS: u64 = 10;

/// A running RPC server task and the switch that stops it
pub struct RpcTask {
    pub shutdown: watch::Sender<bool>,
    pub handle: JoinHandle<()>,
}

/// Stop accepting RPC connections and wait for the accept loop to exit
pub async fn stop_rpc(rpc: RpcTask) {
    let _ = rpc.shutdown.send(true);
    match timeout(Duration::from_secs(TASK_TIMEOUT_SECS), rpc.handle).await {
        Ok(Ok(())) => info!("RPC server shut down"),
        Ok(Err(e)) => error!("RPC server task failed: {}", e),
        Err(_) => warn!(
            "RPC server did not stop within {} seconds",
            TASK_TIMEOUT_SECS
        ),
    }
}

/// Stop the HTTP server, letting in-flight requests finish within `grace`
pub async fn stop_http(handle: ServerHandle, server: std::pin::Pin<&mut Server>, grace: Duration) {
    // Workers get `grace` to drain; allow a little extra for the join itself.
    let deadline = grace + Duration::from_secs(1);
    match timeout(deadline, async {
        let (_, result) = tokio::join!(handle.stop(true), server);
        result
    })
    .await
    {
        Ok(Ok(())) => info!("HTTP server shut down"),
        Ok(Err(e)) => error!("HTTP server exited with error: {}", e),
        Err(_) => error!(
            "HTTP server did not stop within {} seconds",
            deadline.as_secs()
        ),
    }
}

/// Close the lookup engine; closing twice is only logged
pub fn close_engine(engine: &MmdbEngine) {
    if let Err(e) = CountryLookup::close(engine) {
        warn!("Lookup engine close: {}", e);
    }
}
