//! Transports execute one [`HttpRequest`] and return its [`HttpResponse`].
//!
//! The client never talks to the network itself. Any HTTP library can be
//! plugged in by implementing [`Transport`]; tests script responses with a
//! fake implementation.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::TransportError;
use crate::http::{HttpRequest, HttpResponse};

mod caching;
#[cfg(feature = "ureq")]
mod ureq_transport;

pub use caching::{CachingTransport, DEFAULT_CAPACITY};
#[cfg(feature = "ureq")]
pub use ureq_transport::UreqTransport;

/// A single HTTP round-trip.
///
/// Implementations must return `Ok` for every HTTP response they receive,
/// whatever its status. `Err` is reserved for failures where no response
/// exists (DNS, connect, TLS, timeout).
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).execute(request).await
    }
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Box<T> {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).execute(request).await
    }
}
