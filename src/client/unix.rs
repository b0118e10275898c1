// ABOUTME: ResourceClient over the local LXD Unix socket.
// ABOUTME: Speaks HTTP/1.1 with hyper, one connection per request.

use super::error::ClientError;
use super::response::Response;
use super::ResourceClient;
use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::Method;
use hyper::header::{CONTENT_TYPE, ETAG, HOST, IF_MATCH};
use hyper_util::rt::TokioIo;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::net::UnixStream;

/// API version prefix for every request path.
pub const API_VERSION: &str = "1.0";

/// Client for an LXD daemon reachable through a Unix socket.
#[derive(Debug, Clone)]
pub struct UnixSocketClient {
    socket_path: PathBuf,
}

impl UnixSocketClient {
    pub fn new(socket_path: impl Into<PathBuf>) -> Self {
        Self {
            socket_path: socket_path.into(),
        }
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    fn uri(path: &str) -> String {
        format!("/{}/{}", API_VERSION, path.trim_start_matches('/'))
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        etag: Option<&str>,
    ) -> Result<Response, ClientError> {
        let uri = Self::uri(path);
        tracing::debug!(%method, %uri, "lxd request");

        let stream = UnixStream::connect(&self.socket_path)
            .await
            .map_err(|e| ClientError::Connect {
                endpoint: self.socket_path.display().to_string(),
                reason: e.to_string(),
            })?;

        let io = TokioIo::new(stream);

        let (mut sender, conn) = hyper::client::conn::http1::handshake(io)
            .await
            .map_err(|e| ClientError::Http(format!("handshake failed: {}", e)))?;

        tokio::spawn(async move {
            if let Err(e) = conn.await {
                tracing::warn!("lxd connection error: {}", e);
            }
        });

        let payload = match body {
            Some(value) => Bytes::from(serde_json::to_vec(value).map_err(ClientError::Encode)?),
            None => Bytes::new(),
        };

        let mut builder = hyper::Request::builder()
            .method(method)
            .uri(&uri)
            .header(HOST, "lxd");
        if body.is_some() {
            builder = builder.header(CONTENT_TYPE, "application/json");
        }
        if let Some(tag) = etag {
            builder = builder.header(IF_MATCH, tag);
        }

        let req = builder
            .body(Full::new(payload))
            .map_err(|e| ClientError::Http(format!("failed to build request: {}", e)))?;

        let resp = sender
            .send_request(req)
            .await
            .map_err(|e| ClientError::Http(format!("request failed: {}", e)))?;

        let etag = resp
            .headers()
            .get(ETAG)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let collected = resp
            .into_body()
            .collect()
            .await
            .map_err(|e| ClientError::Http(format!("failed to read response: {}", e)))?;
        let body_bytes = collected.to_bytes();

        // LXD reports failures in the body envelope, so the HTTP status is not consulted.
        let mut decoded: Response = serde_json::from_slice(&body_bytes)
            .map_err(|source| ClientError::Decode { path: uri, source })?;
        decoded.etag = etag;
        Ok(decoded)
    }
}

#[async_trait]
impl ResourceClient for UnixSocketClient {
    async fn get(&self, path: &str) -> Result<Response, ClientError> {
        self.send(Method::GET, path, None, None).await
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Response, ClientError> {
        self.send(Method::POST, path, Some(body), None).await
    }

    async fn put(&self, path: &str, body: &Value) -> Result<Response, ClientError> {
        self.send(Method::PUT, path, Some(body), None).await
    }

    async fn put_if_match(
        &self,
        path: &str,
        body: &Value,
        etag: Option<&str>,
    ) -> Result<Response, ClientError> {
        self.send(Method::PUT, path, Some(body), etag).await
    }

    async fn delete(&self, path: &str) -> Result<Response, ClientError> {
        self.send(Method::DELETE, path, None, None).await
    }
}
