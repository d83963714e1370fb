//! Ureq-based transport.
//!
//! ureq is blocking, so each request runs on tokio's blocking pool and the
//! calling task only awaits the join handle.

use std::time::Duration;

use async_trait::async_trait;

use crate::config::ClientConfig;
use crate::error::TransportError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::transport::Transport;

/// A [`Transport`] backed by a [`ureq::Agent`].
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    /// Create a transport with an optional global timeout.
    pub fn new(timeout: Option<Duration>) -> Self {
        let agent = ureq::Agent::config_builder()
            .timeout_global(timeout)
            // Status codes are interpreted by the client, not the agent.
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.timeout)
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new(None)
    }
}

#[async_trait]
impl Transport for UreqTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let agent = self.agent.clone();
        let method = request.method;
        let url = request.url.clone();
        tracing::debug!(%method, %url, "sending request");

        let result = tokio::task::spawn_blocking(move || run(&agent, request))
            .await
            .map_err(|e| TransportError::Other(e.to_string()))?;

        match &result {
            Ok(response) => {
                tracing::debug!(%method, %url, status = response.status, "response received")
            }
            Err(err) => tracing::warn!(%method, %url, error = %err, "transport failure"),
        }
        result
    }
}

fn run(agent: &ureq::Agent, request: HttpRequest) -> Result<HttpResponse, TransportError> {
    let url = request.url.as_str();
    let headers = request.headers.as_slice();

    let result = match (request.method, request.body.as_deref()) {
        (HttpMethod::Get, _) => with_headers(agent.get(url), headers).call(),
        (HttpMethod::Delete, _) => with_headers(agent.delete(url), headers).call(),
        (HttpMethod::Post, Some(body)) => with_headers(agent.post(url), headers).send(body),
        (HttpMethod::Post, None) => with_headers(agent.post(url), headers).send_empty(),
        (HttpMethod::Put, Some(body)) => with_headers(agent.put(url), headers).send(body),
        (HttpMethod::Put, None) => with_headers(agent.put(url), headers).send_empty(),
    };

    match result {
        Ok(response) => convert_response(response),
        Err(err) => Err(map_ureq_error(err)),
    }
}

fn with_headers<B>(
    mut builder: ureq::RequestBuilder<B>,
    headers: &[(String, String)],
) -> ureq::RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

fn convert_response(
    mut response: ureq::http::Response<ureq::Body>,
) -> Result<HttpResponse, TransportError> {
    let status = response.status().as_u16();
    let headers = response
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|value| (name.as_str().to_string(), value.to_string()))
        })
        .collect();
    // ureq caps `read_to_vec` at 10 MiB by default; bodies are read whole.
    let body = response
        .body_mut()
        .with_config()
        .limit(u64::MAX)
        .read_to_vec()
        .map_err(map_ureq_error)?;

    Ok(HttpResponse {
        status,
        headers,
        body,
    })
}

fn map_ureq_error(err: ureq::Error) -> TransportError {
    match err {
        ureq::Error::Timeout(_) => TransportError::Timeout,
        ureq::Error::HostNotFound => TransportError::Connection("host not found".to_owned()),
        ureq::Error::ConnectionFailed => TransportError::Connection("connection failed".to_owned()),
        ureq::Error::Io(e) => TransportError::Connection(e.to_string()),
        other => TransportError::Other(other.to_string()),
    }
}
