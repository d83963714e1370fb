//! Error types for `RequestClient` and its transports.
//!
//! # Design
//! Every failure ends the call and is reported through the returned
//! `Result`. No operation drops a request without reporting it: a PUT or
//! DELETE with a rejected status, an empty body or a non-object body all
//! produce an error value.

use thiserror::Error;

/// Failures raised by a [`Transport`](crate::transport::Transport) before any
/// HTTP response was received.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// Connection could not be established (DNS, refused, TLS, reset).
    #[error("connection error: {0}")]
    Connection(String),

    /// The request did not complete within the configured timeout.
    #[error("request timeout")]
    Timeout,

    /// `ReturnCacheDontLoad` was requested and nothing was stored.
    #[error("no cached response available")]
    CacheMiss,

    #[error("{0}")]
    Other(String),
}

/// Errors returned by `RequestClient` operations.
#[derive(Debug, Error)]
pub enum RequestError {
    /// The URL string is not an absolute URI.
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    /// The request parameters could not be encoded as JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The round-trip failed before an HTTP response was received.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The body was not a JSON object, or could not be decoded into the
    /// requested type.
    #[error("bad server response: {0}")]
    BadServerResponse(String),

    /// A PUT or DELETE was answered with a status outside the accepted range.
    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// A PUT or DELETE response carried no body.
    #[error("response carried no body")]
    EmptyBody,
}

impl RequestError {
    /// Status code of the response that caused this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            RequestError::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Errors raised while reading [`ClientConfig`](crate::config::ClientConfig).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
}
