//! Transport abstraction towards the VirtualHub gateway.
//!
//! The reader only needs two primitives: a GET-style download returning raw
//! body bytes, and an upload pushing a binary body to a device-scoped target
//! path. [`VirtualHub`] implements both over plain HTTP; tests substitute a
//! scripted mock.

use crate::error::{Result, RfidError};
use log::debug;
use std::future::Future;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(3);

/// Communication backend for a hub-attached RFID function.
pub trait HubTransport: Send + Sync + 'static {
    /// Performs a GET-style request for `path` and returns the response body.
    fn request(&self, path: &str) -> impl Future<Output = Result<Vec<u8>>> + Send;

    /// Uploads `body` to the device-scoped `target` path (e.g.
    /// `Rfid:t=<tag>&b=<block>&n=<count>`) and returns the response body.
    fn upload(&self, target: &str, body: &[u8]) -> impl Future<Output = Result<Vec<u8>>> + Send;
}

/// HTTP client for a VirtualHub gateway process.
///
/// The hub speaks plain HTTP/1.x with one request per connection. Every
/// round-trip is bounded by a configurable timeout; a hub that stops
/// responding surfaces as [`RfidError::Timeout`] instead of hanging the
/// calling task.
#[derive(Debug, Clone)]
pub struct VirtualHub {
    addr: String,
    request_timeout: Duration,
}

impl VirtualHub {
    /// Creates a client for the hub at `addr` (`host:port`), with the
    /// default 3-second request timeout.
    pub fn new<A: Into<String>>(addr: A) -> Self {
        Self {
            addr: addr.into(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Same as [`new`](Self::new) with an explicit per-request timeout.
    pub fn with_timeout<A: Into<String>>(addr: A, request_timeout: Duration) -> Self {
        Self {
            addr: addr.into(),
            request_timeout,
        }
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    async fn roundtrip(&self, head: String, body: Option<&[u8]>) -> Result<Vec<u8>> {
        let mut stream = timeout(self.request_timeout, TcpStream::connect(&self.addr))
            .await
            .map_err(|_| RfidError::Timeout)?
            .map_err(RfidError::from)?;

        let mut raw = head.into_bytes();
        if let Some(b) = body {
            raw.extend_from_slice(b);
        }
        timeout(self.request_timeout, stream.write_all(&raw))
            .await
            .map_err(|_| RfidError::Timeout)?
            .map_err(RfidError::from)?;

        // Connection: close is requested, so the body ends at EOF.
        let mut response = Vec::new();
        timeout(self.request_timeout, stream.read_to_end(&mut response))
            .await
            .map_err(|_| RfidError::Timeout)?
            .map_err(RfidError::from)?;

        split_body(&response)
    }
}

impl HubTransport for VirtualHub {
    async fn request(&self, path: &str) -> Result<Vec<u8>> {
        debug!("GET {}", path);
        let head = format!(
            "GET {} HTTP/1.1\r\nHost: {}\r\nConnection: close\r\n\r\n",
            path, self.addr
        );
        self.roundtrip(head, None).await
    }

    async fn upload(&self, target: &str, body: &[u8]) -> Result<Vec<u8>> {
        debug!("POST /{} ({} bytes)", target, body.len());
        let head = format!(
            "POST /{} HTTP/1.1\r\nHost: {}\r\nContent-Type: application/octet-stream\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            target,
            self.addr,
            body.len()
        );
        self.roundtrip(head, Some(body)).await
    }
}

/// Validates the status line and strips the headers from a raw HTTP
/// response, returning the body.
fn split_body(raw: &[u8]) -> Result<Vec<u8>> {
    let header_end = raw
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .ok_or_else(|| RfidError::Http("truncated response (no header terminator)".to_string()))?;

    let head = String::from_utf8_lossy(&raw[..header_end]);
    let status_line = head.lines().next().unwrap_or("");
    let code = status_line.split_whitespace().nth(1).unwrap_or("");
    if code != "200" {
        return Err(RfidError::Http(status_line.to_string()));
    }

    Ok(raw[header_end + 4..].to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_body_extracts_payload() {
        let raw = b"HTTP/1.1 200 OK\r\nContent-Type: application/json\r\n\r\n{\"err\":0}";
        assert_eq!(split_body(raw).unwrap(), b"{\"err\":0}");
    }

    #[test]
    fn split_body_rejects_non_200() {
        let raw = b"HTTP/1.1 404 Not Found\r\n\r\n";
        assert!(matches!(split_body(raw), Err(RfidError::Http(_))));
    }

    #[test]
    fn split_body_rejects_truncated_header() {
        assert!(matches!(
            split_body(b"HTTP/1.1 200 OK\r\n"),
            Err(RfidError::Http(_))
        ));
    }

    #[test]
    fn split_body_allows_empty_body() {
        let raw = b"HTTP/1.1 200 OK\r\n\r\n";
        assert_eq!(split_body(raw).unwrap(), Vec::<u8>::new());
    }
}
