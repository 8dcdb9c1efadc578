//! RPC client
//!
//! Used by the `check` CLI command and by tests.

use bytes::BytesMut;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio::time::timeout;

use super::protocol::{decode, encode};
use super::types::{CheckReply, RpcError, RpcRequest, RpcResponse};

/// Default timeout for RPC operations
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// A connection to an RPC server. Requests are sent one at a time.
pub struct RpcClient {
    stream: TcpStream,
    buf: BytesMut,
    timeout: Duration,
}

impl RpcClient {
    pub async fn connect(addr: impl ToSocketAddrs) -> Result<Self, RpcError> {
        let stream = timeout(DEFAULT_TIMEOUT, TcpStream::connect(addr))
            .await
            .map_err(|_| RpcError::Timeout)??;
        Ok(Self {
            stream,
            buf: BytesMut::with_capacity(4096),
            timeout: DEFAULT_TIMEOUT,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Send a request and wait for its response
    pub async fn call(&mut self, req: &RpcRequest) -> Result<RpcResponse, RpcError> {
        let data = encode(req).map_err(|e| RpcError::ProtocolError(e.to_string()))?;
        self.stream.write_all(&data).await.map_err(RpcError::IoError)?;
        self.stream.flush().await.map_err(RpcError::IoError)?;

        let mut read_buf = [0u8; 4096];
        loop {
            if let Some(response) = decode::<RpcResponse>(&mut self.buf)
                .map_err(|e| RpcError::ProtocolError(e.to_string()))?
            {
                return Ok(response);
            }

            let n = timeout(self.timeout, self.stream.read(&mut read_buf))
                .await
                .map_err(|_| RpcError::Timeout)?
                .map_err(RpcError::IoError)?;

            if n == 0 {
                return Err(RpcError::ProtocolError(
                    "Connection closed before receiving response".to_string(),
                ));
            }

            self.buf.extend_from_slice(&read_buf[..n]);
        }
    }

    /// Send a ping and return `(version, uptime_secs)`
    pub async fn ping(&mut self) -> Result<(String, u64), RpcError> {
        match self.call(&RpcRequest::Ping).await? {
            RpcResponse::Pong {
                version,
                uptime_secs,
            } => Ok((version, uptime_secs)),
            other => Err(unexpected(other)),
        }
    }

    /// Ask whether `ip` is in one of `allowed_countries`
    pub async fn check(
        &mut self,
        ip: &str,
        allowed_countries: &[String],
    ) -> Result<CheckReply, RpcError> {
        let req = RpcRequest::Check {
            ip: ip.to_string(),
            allowed_countries: allowed_countries.to_vec(),
        };
        match self.call(&req).await? {
            RpcResponse::Check {
                allowed, country, ..
            } => Ok(CheckReply { allowed, country }),
            other => Err(unexpected(other)),
        }
    }
}

fn unexpected(response: RpcResponse) -> RpcError {
    match response {
        RpcResponse::Error { status, message } => RpcError::Status { status, message },
        other => RpcError::ProtocolError(format!("Unexpected response: {:?}", other)),
    }
}
