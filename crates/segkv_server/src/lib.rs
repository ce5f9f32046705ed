//! # segkv server
//!
//! Transport-agnostic HTTP handlers over the segkv store.
//!
//! Two services live here, mirroring a typical deployment:
//!
//! - [`DbHandler`] - the db shim: `GET`/`POST /db/{key}` plus `/health`,
//!   directly over an open [`segkv_core::Store`].
//! - [`FrontendHandler`] - a stateless frontend that reads through to the
//!   db shim via the [`DbClient`] seam and serves `/api/v1/some-data`.
//!
//! Handlers consume [`ShimRequest`] and produce [`ShimResponse`]; a
//! concrete HTTP server mounts them, and tests drive them in-process.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod frontend;
mod handler;
mod types;

pub use error::{ServerError, ServerResult};
pub use frontend::{DbClient, FrontendHandler, LoopbackDbClient};
pub use handler::DbHandler;
pub use types::{GetResponse, Method, PutRequest, ShimRequest, ShimResponse, SomeDataResponse};
