// ABOUTME: The ResourceClient seam between the container proxy and the LXD API.
// ABOUTME: Exposes the trait, response envelope, Unix socket transport and socket detection.

mod detection;
mod error;
mod response;
mod unix;

pub use detection::{DEFAULT_SOCKET, DetectionError, SNAP_SOCKET, SOCKET_ENV, detect_socket};
pub use error::ClientError;
pub use response::{Response, ResponseType};
pub use unix::{API_VERSION, UnixSocketClient};

use async_trait::async_trait;
use serde_json::Value;

/// Collection root for containers.
pub const CONTAINERS: &str = "containers";

/// Collection root for background operations.
pub const OPERATIONS: &str = "operations";

/// Verbs against the remote API.
///
/// Paths are relative to the API root (`containers/web1`, `operations/<id>`).
/// Error envelopes issued by the server, including the not-found sentinel, are
/// returned as `Ok(Response)`; `Err` is reserved for failures to reach the server
/// or to decode what it sent.
#[async_trait]
pub trait ResourceClient: Send + Sync {
    async fn get(&self, path: &str) -> Result<Response, ClientError>;

    async fn post(&self, path: &str, body: &Value) -> Result<Response, ClientError>;

    async fn put(&self, path: &str, body: &Value) -> Result<Response, ClientError>;

    /// PUT guarded by an `If-Match` ETag.
    ///
    /// The default ignores the ETag and forwards to `put`, so clients that
    /// keep it get no optimistic concurrency and never see `StaleState`.
    async fn put_if_match(
        &self,
        path: &str,
        body: &Value,
        _etag: Option<&str>,
    ) -> Result<Response, ClientError> {
        self.put(path, body).await
    }

    async fn delete(&self, path: &str) -> Result<Response, ClientError>;
}

/// Last non-empty segment of a resource URL, percent-decoded.
///
/// `/1.0/containers/web1` yields `web1`. Query strings are ignored.
pub fn last_segment(url: &str) -> Option<String> {
    let path = url.split('?').next().unwrap_or(url);
    let segment = path.rsplit('/').find(|s| !s.is_empty())?;
    let decoded = urlencoding::decode(segment)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| segment.to_string());
    Some(decoded)
}
