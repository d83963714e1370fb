//! Request and response descriptors exchanged with a [`Transport`].
//!
//! # Design
//! Requests and responses are plain data. `RequestClient` builds an
//! `HttpRequest`, a transport turns it into an `HttpResponse`, and the
//! client interprets the response. Keeping the descriptors free of any
//! transport type lets tests script responses without a network.
//!
//! [`Transport`]: crate::transport::Transport

/// `accept` header name.
pub const ACCEPT: &str = "accept";
/// `content-type` header name.
pub const CONTENT_TYPE: &str = "content-type";
/// `authorization` header name.
pub const AUTHORIZATION: &str = "authorization";
/// Media type sent in `accept` and `content-type`.
pub const APPLICATION_JSON: &str = "application/json";

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    /// The method token as it appears on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a GET may be answered from a locally stored response.
///
/// Only [`CachingTransport`](crate::transport::CachingTransport) acts on the
/// policy; other transports always perform the round-trip.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CachePolicy {
    /// Always hit the network and never read a stored response.
    #[default]
    ReloadIgnoringLocalCache,
    /// Use a stored response if one exists, otherwise load it.
    ReturnCacheElseLoad,
    /// Use a stored response; fail if none exists.
    ReturnCacheDontLoad,
}

/// An HTTP request described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
    pub cache_policy: CachePolicy,
}

impl HttpRequest {
    /// Look up a header value by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

/// An HTTP response described as plain data.
///
/// `body` holds whatever bytes the server sent; an empty vector means the
/// response carried no body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Build a response with no headers.
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    /// `true` for any 2xx status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Look up a header value by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}
