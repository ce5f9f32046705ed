//! Request and response types for the db shim.

use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

/// HTTP methods the shim dispatches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// Read a key.
    Get,
    /// Store a value under a key.
    Post,
}

/// A transport-agnostic request, as a concrete HTTP server would hand it
/// to the shim.
#[derive(Debug, Clone)]
pub struct ShimRequest {
    /// Request method.
    pub method: Method,
    /// Request path, e.g. `/db/my-key`.
    pub path: String,
    /// Decoded query parameters in order of appearance.
    pub query: Vec<(String, String)>,
    /// Raw request body.
    pub body: Vec<u8>,
}

impl ShimRequest {
    /// Builds a GET request for the given path.
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            path: path.into(),
            query: Vec::new(),
            body: Vec::new(),
        }
    }

    /// Builds a POST request with a body.
    #[must_use]
    pub fn post(path: impl Into<String>, body: Vec<u8>) -> Self {
        Self {
            method: Method::Post,
            path: path.into(),
            query: Vec::new(),
            body,
        }
    }

    /// Adds a query parameter.
    #[must_use]
    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    /// Returns the first value of the named query parameter.
    #[must_use]
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(param, _)| param == name)
            .map(|(_, value)| value.as_str())
    }
}

/// A transport-agnostic response carrying status, content type, and body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShimResponse {
    /// HTTP status code.
    pub status: u16,
    /// Content type of the body.
    pub content_type: &'static str,
    /// Response body bytes.
    pub body: Vec<u8>,
}

impl ShimResponse {
    /// A plain-text response.
    #[must_use]
    pub fn text(status: u16, message: &str) -> Self {
        Self {
            status,
            content_type: "text/plain",
            body: message.as_bytes().to_vec(),
        }
    }

    /// An empty response carrying only a status code.
    #[must_use]
    pub fn empty(status: u16) -> Self {
        Self {
            status,
            content_type: "text/plain",
            body: Vec::new(),
        }
    }

    /// A JSON response; serialization failure degrades to a 500.
    pub fn json<T: Serialize>(status: u16, body: &T) -> Self {
        match serde_json::to_vec(body) {
            Ok(bytes) => Self {
                status,
                content_type: "application/json",
                body: bytes,
            },
            Err(err) => {
                tracing::error!(%err, "response serialization failed");
                Self::text(500, "Internal server error")
            }
        }
    }
}

/// Body of a successful `GET /db/{key}` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetResponse {
    /// The requested key.
    pub key: String,
    /// The stored value, as raw JSON text.
    pub value: String,
}

/// Body of a `POST /db/{key}` request.
///
/// The raw JSON text of `value` is stored verbatim as the record value,
/// so a string value keeps its quotes and a number stays a bare literal.
#[derive(Debug, Deserialize)]
pub struct PutRequest {
    /// The value to store.
    pub value: Box<RawValue>,
}

/// Body of the frontend's `/api/v1/some-data` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SomeDataResponse {
    /// The requested key.
    pub key: String,
    /// The value relayed from the db service.
    pub value: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_param_lookup() {
        let request = ShimRequest::get("/db/k").with_query("type", "int64");
        assert_eq!(request.query_param("type"), Some("int64"));
        assert_eq!(request.query_param("other"), None);
    }

    #[test]
    fn put_request_keeps_raw_json() {
        let request: PutRequest = serde_json::from_slice(br#"{"value": "2024-05-01"}"#).unwrap();
        assert_eq!(request.value.get(), r#""2024-05-01""#);

        let request: PutRequest = serde_json::from_slice(br#"{"value": 42}"#).unwrap();
        assert_eq!(request.value.get(), "42");
    }

    #[test]
    fn json_response_round_trip() {
        let body = GetResponse {
            key: "k".into(),
            value: "\"v\"".into(),
        };
        let response = ShimResponse::json(200, &body);
        assert_eq!(response.status, 200);
        assert_eq!(response.content_type, "application/json");

        let decoded: GetResponse = serde_json::from_slice(&response.body).unwrap();
        assert_eq!(decoded, body);
    }
}
