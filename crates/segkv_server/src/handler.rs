//! The db shim: HTTP semantics over [`Store`].
//!
//! The handler is transport-agnostic. A concrete HTTP server translates
//! incoming requests into [`ShimRequest`] values and writes the returned
//! [`ShimResponse`] back out; tests drive the handler directly.

use crate::types::{GetResponse, Method, PutRequest, ShimRequest, ShimResponse};
use segkv_core::{Store, StoreError};
use tracing::{error, info};

/// Path prefix for key operations.
const DB_PREFIX: &str = "/db/";

/// Serves `GET /db/{key}`, `POST /db/{key}`, and `GET /health` against a
/// [`Store`].
#[derive(Clone)]
pub struct DbHandler {
    store: Store,
}

impl DbHandler {
    /// Creates a handler over an open store.
    #[must_use]
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Dispatches a request to the matching endpoint.
    pub fn handle(&self, request: &ShimRequest) -> ShimResponse {
        if request.path == "/health" {
            return self.handle_health();
        }
        if request.path == "/db" {
            return ShimResponse::text(400, "Invalid path. Use /db/<key>");
        }
        if let Some(key) = request.path.strip_prefix(DB_PREFIX) {
            return match request.method {
                Method::Get => self.handle_get(key, request.query_param("type")),
                Method::Post => self.handle_put(key, &request.body),
            };
        }
        ShimResponse::empty(404)
    }

    /// `GET /health` always reports the shim as up.
    #[must_use]
    pub fn handle_health(&self) -> ShimResponse {
        ShimResponse::text(200, "OK")
    }

    /// `GET /db/{key}`: 200 with `{key, value}`, 404 when absent, 400
    /// when `value_type` is `int64` and the stored value does not parse.
    pub fn handle_get(&self, key: &str, value_type: Option<&str>) -> ShimResponse {
        if key.is_empty() {
            return ShimResponse::text(400, "Key is required for /db/<key>");
        }

        match self.store.get(key) {
            Ok(value) => {
                if value_type == Some("int64") && value.parse::<i64>().is_err() {
                    info!(key, "stored value failed int64 validation");
                    return ShimResponse::text(400, "Value cannot be parsed as int64");
                }
                ShimResponse::json(
                    200,
                    &GetResponse {
                        key: key.to_string(),
                        value,
                    },
                )
            }
            Err(StoreError::NotFound) => {
                info!(key, "key not found");
                ShimResponse::empty(404)
            }
            Err(err) => {
                error!(%err, key, "get failed");
                ShimResponse::text(500, "Internal server error")
            }
        }
    }

    /// `POST /db/{key}`: stores the raw JSON of the body's `value` field
    /// and answers 201.
    pub fn handle_put(&self, key: &str, body: &[u8]) -> ShimResponse {
        if key.is_empty() {
            return ShimResponse::text(400, "Key is required for /db/<key>");
        }

        let request: PutRequest = match serde_json::from_slice(body) {
            Ok(request) => request,
            Err(err) => {
                info!(%err, key, "malformed put body");
                return ShimResponse::text(400, "Invalid request body");
            }
        };

        match self.store.put(key, request.value.get()) {
            Ok(()) => ShimResponse::empty(201),
            Err(err) => {
                error!(%err, key, "put failed");
                ShimResponse::text(500, "Internal server error")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use segkv_core::Store;
    use tempfile::tempdir;

    fn handler(dir: &std::path::Path) -> DbHandler {
        DbHandler::new(Store::open(dir, 1024).unwrap())
    }

    #[test]
    fn health_is_ok() {
        let temp = tempdir().unwrap();
        let response = handler(temp.path()).handle(&ShimRequest::get("/health"));
        assert_eq!(response.status, 200);
        assert_eq!(response.body, b"OK");
    }

    #[test]
    fn put_then_get_round_trip() {
        let temp = tempdir().unwrap();
        let handler = handler(temp.path());

        let put = ShimRequest::post("/db/k1", br#"{"value": "v1"}"#.to_vec());
        assert_eq!(handler.handle(&put).status, 201);

        let get = handler.handle(&ShimRequest::get("/db/k1"));
        assert_eq!(get.status, 200);
        let body: GetResponse = serde_json::from_slice(&get.body).unwrap();
        assert_eq!(body.key, "k1");
        assert_eq!(body.value, r#""v1""#);
    }

    #[test]
    fn missing_key_is_404() {
        let temp = tempdir().unwrap();
        let response = handler(temp.path()).handle(&ShimRequest::get("/db/absent"));
        assert_eq!(response.status, 404);
    }

    #[test]
    fn int64_validation() {
        let temp = tempdir().unwrap();
        let handler = handler(temp.path());

        handler.handle(&ShimRequest::post("/db/num", br#"{"value": 42}"#.to_vec()));
        handler.handle(&ShimRequest::post("/db/text", br#"{"value": "abc"}"#.to_vec()));

        let ok = handler.handle(&ShimRequest::get("/db/num").with_query("type", "int64"));
        assert_eq!(ok.status, 200);

        let bad = handler.handle(&ShimRequest::get("/db/text").with_query("type", "int64"));
        assert_eq!(bad.status, 400);
    }

    #[test]
    fn empty_key_is_400() {
        let temp = tempdir().unwrap();
        let handler = handler(temp.path());

        assert_eq!(handler.handle(&ShimRequest::get("/db/")).status, 400);
        assert_eq!(handler.handle(&ShimRequest::get("/db")).status, 400);
    }

    #[test]
    fn malformed_body_is_400() {
        let temp = tempdir().unwrap();
        let handler = handler(temp.path());

        let response = handler.handle(&ShimRequest::post("/db/k", b"not json".to_vec()));
        assert_eq!(response.status, 400);

        let response = handler.handle(&ShimRequest::post("/db/k", br#"{"other": 1}"#.to_vec()));
        assert_eq!(response.status, 400);
    }

    #[test]
    fn unknown_path_is_404() {
        let temp = tempdir().unwrap();
        let response = handler(temp.path()).handle(&ShimRequest::get("/unknown"));
        assert_eq!(response.status, 404);
    }
}
