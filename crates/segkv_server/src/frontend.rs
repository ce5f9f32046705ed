//! The frontend service handler.
//!
//! Frontends are stateless: they read through to the db shim over a
//! [`DbClient`] and relay `{key, value}` pairs. On startup each frontend
//! stores the current date under its own service name, so the router's
//! integration checks have a known key to probe.

use crate::error::{ServerError, ServerResult};
use crate::handler::DbHandler;
use crate::types::{GetResponse, ShimRequest, ShimResponse, SomeDataResponse};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{error, info};

/// Client seam to the db shim.
///
/// Implementations provide the actual HTTP transport; tests use
/// [`LoopbackDbClient`] to call a [`DbHandler`] in-process.
pub trait DbClient: Send + Sync {
    /// Performs `GET /db/{key}`.
    fn get(&self, key: &str) -> ServerResult<ShimResponse>;

    /// Performs `POST /db/{key}` with the given JSON body.
    fn put(&self, key: &str, body: &[u8]) -> ServerResult<ShimResponse>;
}

/// A client that calls a [`DbHandler`] directly, without a network.
#[derive(Clone)]
pub struct LoopbackDbClient {
    handler: DbHandler,
}

impl LoopbackDbClient {
    /// Creates a loopback client over the given handler.
    #[must_use]
    pub fn new(handler: DbHandler) -> Self {
        Self { handler }
    }
}

impl DbClient for LoopbackDbClient {
    fn get(&self, key: &str) -> ServerResult<ShimResponse> {
        Ok(self.handler.handle(&ShimRequest::get(format!("/db/{key}"))))
    }

    fn put(&self, key: &str, body: &[u8]) -> ServerResult<ShimResponse> {
        Ok(self
            .handler
            .handle(&ShimRequest::post(format!("/db/{key}"), body.to_vec())))
    }
}

/// Serves `/api/v1/some-data` and `/health` for one named frontend.
pub struct FrontendHandler<C: DbClient> {
    service_name: String,
    client: C,
    health_failure: AtomicBool,
}

impl<C: DbClient> FrontendHandler<C> {
    /// Creates a frontend handler for the given service name.
    pub fn new(service_name: impl Into<String>, client: C) -> Self {
        Self {
            service_name: service_name.into(),
            client,
            health_failure: AtomicBool::new(false),
        }
    }

    /// Stores `date` in the db under this frontend's service name.
    ///
    /// Called once at startup; a failure here is fatal for the service.
    pub fn register_startup(&self, date: &str) -> ServerResult<()> {
        let body = serde_json::to_vec(&serde_json::json!({ "value": date }))?;
        let response = self.client.put(&self.service_name, &body)?;
        if response.status != 200 && response.status != 201 {
            return Err(ServerError::UnexpectedStatus {
                status: response.status,
            });
        }
        info!(service = %self.service_name, date, "registered startup date");
        Ok(())
    }

    /// `GET /health`; reports failure while the toggle is set.
    pub fn handle_health(&self) -> ShimResponse {
        if self.health_failure.load(Ordering::Relaxed) {
            ShimResponse::text(500, "FAILURE")
        } else {
            ShimResponse::text(200, "OK")
        }
    }

    /// Forces the health endpoint to report failure (router testing).
    pub fn set_health_failure(&self, fail: bool) {
        self.health_failure.store(fail, Ordering::Relaxed);
    }

    /// `GET /api/v1/some-data?key=...`: relays the db shim's answer.
    pub fn handle_some_data(&self, key: Option<&str>) -> ShimResponse {
        let Some(key) = key else {
            return ShimResponse::text(400, "Query parameter 'key' is required");
        };

        let response = match self.client.get(key) {
            Ok(response) => response,
            Err(err) => {
                error!(%err, key, "db request failed");
                return ShimResponse::text(500, "Internal server error: DB communication failed");
            }
        };

        match response.status {
            404 => ShimResponse::empty(404),
            200 => match serde_json::from_slice::<GetResponse>(&response.body) {
                Ok(body) => ShimResponse::json(
                    200,
                    &SomeDataResponse {
                        key: body.key,
                        value: body.value,
                    },
                ),
                Err(err) => {
                    error!(%err, key, "invalid db response body");
                    ShimResponse::text(500, "Internal server error: Invalid DB response format")
                }
            },
            status => {
                error!(status, key, "unexpected db response");
                ShimResponse::text(500, "Internal server error: Unexpected DB response")
            }
        }
    }
}
