//! JSON-over-HTTP request client with bearer-token headers.
//!
//! # Overview
//! `RequestClient` builds GET/POST/PUT/DELETE requests with JSON headers and
//! an `authorization: Bearer <token>` header, hands each one to a pluggable
//! [`Transport`] for a single round-trip, and turns the response into raw
//! bytes or a decoded value.
//!
//! # Design
//! - No global state: the transport, token provider, log sink and 401 hook
//!   are injected when the client is built.
//! - Each operation is split into `build_*` (produces an `HttpRequest`) and
//!   `parse_*` (consumes an `HttpResponse`), joined by an async method that
//!   performs exactly one round-trip. Nothing is retried.
//! - Every outcome is a `Result`; callbacks are available through the
//!   `spawn_*` methods in [`dispatch`].
//! - [`UreqTransport`] is the bundled network transport;
//!   [`CachingTransport`] adds a response cache driven by [`CachePolicy`].

pub mod client;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod http;
pub mod log;
pub mod token;
pub mod transport;

pub use client::{GetOptions, RequestClient, RequestClientBuilder, UnauthorizedHook};
pub use config::ClientConfig;
pub use dispatch::dispatch;
pub use error::{ConfigError, RequestError, TransportError};
pub use http::{CachePolicy, HttpMethod, HttpRequest, HttpResponse};
pub use log::{LogSink, LogState, TracingSink};
pub use token::{KeyValueStore, MemoryStore, StaticToken, StoredToken, TokenProvider, TOKEN_KEY};
pub use transport::{CachingTransport, Transport};
#[cfg(feature = "ureq")]
pub use transport::UreqTransport;
