//! Synchronous client core for the Apache Guacamole REST API.
//!
//! # Overview
//! Authenticates against the token endpoint, then lists connections,
//! connection groups and users, and fetches connection details. The core
//! builds `HttpRequest` values and parses `HttpResponse` values without
//! touching the network (host-does-IO pattern). A host either executes
//! requests itself or supplies a `Transport`.
//!
//! # Design
//! - `GuacamoleClient` is stateless: base URL plus the TLS-verification flag.
//! - Each operation is split into `build_*` (produces request) and `parse_*`
//!   (consumes response), with one-shot methods over a `Transport` on top.
//! - Server-owned objects (connections, users, details) stay opaque JSON
//!   objects in server order.
//! - Every failure is an `ApiError` naming the requested URL.

pub mod client;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod http;
pub mod types;

pub use client::GuacamoleClient;
pub use config::{ClientConfig, ConfigError};
pub use endpoint::{Endpoint, ROOT_GROUP};
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport, TransportError};
pub use types::{AuthToken, ChildGroup, Connection, ConnectionDetails, ConnectionTree, Users};
