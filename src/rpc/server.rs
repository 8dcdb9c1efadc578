//! RPC server
//!
//! Runs alongside the HTTP server. Each connection is served on its own task
//! and may carry any number of sequential requests.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::BytesMut;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use super::handler::RpcHandler;
use super::protocol::{decode, encode};
use super::types::{RpcRequest, RpcResponse, RpcStatus};

pub struct RpcServer {
    listener: TcpListener,
    handler: Arc<RpcHandler>,
}

impl RpcServer {
    pub async fn bind(addr: impl ToSocketAddrs, handler: RpcHandler) -> io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self {
            listener,
            handler: Arc::new(handler),
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept connections until `shutdown` flips or its sender is dropped.
    ///
    /// Open connections are closed once their current request completes.
    pub async fn serve(self, mut shutdown: watch::Receiver<bool>) {
        match self.local_addr() {
            Ok(addr) => info!("RPC server listening on {}", addr),
            Err(_) => info!("RPC server listening"),
        }

        loop {
            tokio::select! {
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        debug!("New RPC connection from {}", peer);
                        tokio::spawn(handle_connection(
                            stream,
                            Arc::clone(&self.handler),
                            shutdown.clone(),
                        ));
                    }
                    Err(e) => {
                        warn!("Failed to accept RPC connection: {}", e);
                    }
                },
                _ = shutdown.changed() => break,
            }
        }

        info!("RPC server stopped");
    }
}

/// Send a single response frame
async fn send_response<S>(stream: &mut S, response: &RpcResponse) -> Result<(), ()>
where
    S: tokio::io::AsyncWrite + Unpin,
{
    let data = match encode(response) {
        Ok(data) => data,
        Err(e) => {
            error!("Failed to encode RPC response: {}", e);
            return Err(());
        }
    };
    if let Err(e) = stream.write_all(&data).await {
        debug!("Failed to send RPC response: {}", e);
        return Err(());
    }
    if let Err(e) = stream.flush().await {
        debug!("Failed to flush RPC response: {}", e);
        return Err(());
    }
    Ok(())
}

/// Handle a single RPC connection
async fn handle_connection(
    mut stream: TcpStream,
    handler: Arc<RpcHandler>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut buf = BytesMut::with_capacity(4096);
    let mut read_buf = [0u8; 4096];

    loop {
        // Answer every complete frame already buffered
        loop {
            match decode::<RpcRequest>(&mut buf) {
                Ok(Some(req)) => {
                    let response = handler.handle(req);
                    if send_response(&mut stream, &response).await.is_err() {
                        return;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    warn!("RPC protocol error: {}", e);
                    // Send error response and close connection
                    let response = RpcResponse::error(RpcStatus::InvalidArgument, e.to_string());
                    let _ = send_response(&mut stream, &response).await;
                    return;
                }
            }
        }

        let n = tokio::select! {
            read = stream.read(&mut read_buf) => match read {
                Ok(0) => {
                    debug!("RPC client disconnected");
                    return;
                }
                Ok(n) => n,
                Err(e) => {
                    debug!("RPC read error: {}", e);
                    return;
                }
            },
            _ = shutdown.changed() => {
                debug!("Closing RPC connection for shutdown");
                return;
            }
        };
        buf.extend_from_slice(&read_buf[..n]);
    }
}
