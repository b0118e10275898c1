// ABOUTME: Decoded LXD response envelope.
// ABOUTME: Distinguishes sync, async (operation) and error responses, including the not-found sentinel.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Envelope discriminator reported in the `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    Sync,
    Async,
    Error,
}

/// A decoded response body plus the headers the proxy cares about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    #[serde(rename = "type")]
    pub kind: ResponseType,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub status_code: u16,
    #[serde(default)]
    pub operation: String,
    #[serde(default)]
    pub error: String,
    #[serde(default)]
    pub error_code: u16,
    #[serde(default)]
    pub metadata: Value,
    /// `ETag` response header, when the server sent one.
    #[serde(skip)]
    pub etag: Option<String>,
}

impl Response {
    pub const NOT_FOUND_MESSAGE: &'static str = "not found";
    pub const NOT_FOUND_CODE: u16 = 404;

    pub fn sync(metadata: Value) -> Self {
        Self {
            kind: ResponseType::Sync,
            status: "Success".to_string(),
            status_code: 200,
            operation: String::new(),
            error: String::new(),
            error_code: 0,
            metadata,
            etag: None,
        }
    }

    /// An async envelope pointing at a background operation.
    pub fn operation(url: impl Into<String>, metadata: Value) -> Self {
        Self {
            kind: ResponseType::Async,
            status: "Operation created".to_string(),
            status_code: 100,
            operation: url.into(),
            error: String::new(),
            error_code: 0,
            metadata,
            etag: None,
        }
    }

    pub fn error(code: u16, message: impl Into<String>) -> Self {
        Self {
            kind: ResponseType::Error,
            status: String::new(),
            status_code: 0,
            operation: String::new(),
            error: message.into(),
            error_code: code,
            metadata: Value::Null,
            etag: None,
        }
    }

    /// The sentinel the server returns for a resource that does not exist.
    pub fn not_found() -> Self {
        Self::error(Self::NOT_FOUND_CODE, Self::NOT_FOUND_MESSAGE)
    }

    pub fn with_etag(mut self, etag: impl Into<String>) -> Self {
        self.etag = Some(etag.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.kind == ResponseType::Error
    }

    /// True only for the exact not-found sentinel.
    ///
    /// Other 404s (for example an unknown API route with a different message) and
    /// any other error envelope are not treated as absence.
    pub fn is_not_found(&self) -> bool {
        self.kind == ResponseType::Error
            && self.error_code == Self::NOT_FOUND_CODE
            && self.error == Self::NOT_FOUND_MESSAGE
            && self.metadata.is_null()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sentinel_decodes_from_wire_shape() {
        let raw = json!({"error": "not found", "error_code": 404, "type": "error"});
        let response: Response = serde_json::from_value(raw).unwrap();
        assert!(response.is_not_found());
        assert_eq!(response, Response::not_found());
    }

    #[test]
    fn other_errors_are_not_the_sentinel() {
        assert!(!Response::error(404, "Container not found on this cluster member").is_not_found());
        assert!(!Response::error(500, "not found").is_not_found());
        assert!(!Response::error(403, "forbidden").is_not_found());

        let mut with_body = Response::not_found();
        with_body.metadata = json!({"detail": "x"});
        assert!(!with_body.is_not_found());
    }

    #[test]
    fn sync_responses_are_not_errors() {
        let response = Response::sync(json!({"name": "web1"}));
        assert!(!response.is_error());
        assert!(!response.is_not_found());
    }

    #[test]
    fn async_envelope_decodes() {
        let raw = json!({
            "type": "async",
            "status": "Operation created",
            "status_code": 100,
            "operation": "/1.0/operations/b8d84888",
            "metadata": {"id": "b8d84888", "status_code": 103}
        });
        let response: Response = serde_json::from_value(raw).unwrap();
        assert_eq!(response.kind, ResponseType::Async);
        assert_eq!(response.operation, "/1.0/operations/b8d84888");
    }
}
