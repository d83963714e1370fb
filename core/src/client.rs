//! Request construction and response interpretation.
//!
//! # Design
//! `RequestClient` keeps no per-request state. Each operation is split the
//! same way: a `build_*` method produces an `HttpRequest`, the transport
//! performs exactly one round-trip, and a `parse_*` method turns the
//! `HttpResponse` into the caller's result. The `build_*` and `parse_*`
//! methods are public so the request/response mapping can be checked
//! without a transport.
//!
//! GET and POST report the status line but never reject on it; PUT and
//! DELETE only accept `200..=298`.

use std::fmt;
use std::ops::RangeInclusive;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::config::ClientConfig;
use crate::error::RequestError;
use crate::http::{
    CachePolicy, HttpMethod, HttpRequest, HttpResponse, ACCEPT, APPLICATION_JSON, AUTHORIZATION,
    CONTENT_TYPE,
};
use crate::log::{LogSink, LogState, Logger, TracingSink};
use crate::token::{bearer, StaticToken, TokenProvider};
use crate::transport::Transport;

/// Statuses accepted by PUT and DELETE.
const MUTATION_ACCEPTED: RangeInclusive<u16> = 200..=298;

/// Status that triggers the unauthorized hook.
const UNAUTHORIZED: u16 = 401;

/// Callback invoked with any 401 response.
pub type UnauthorizedHook = Arc<dyn Fn(&HttpResponse) + Send + Sync>;

/// Per-call settings for GET requests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GetOptions {
    /// Bearer token; no `authorization` header is sent when `None`.
    pub token: Option<String>,
    pub logs: LogState,
    pub cache_policy: CachePolicy,
}

impl GetOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn logs(mut self, logs: LogState) -> Self {
        self.logs = logs;
        self
    }

    pub fn cache_policy(mut self, cache_policy: CachePolicy) -> Self {
        self.cache_policy = cache_policy;
        self
    }
}

/// JSON-over-HTTP client with bearer-token headers.
///
/// Cloning is cheap; clones share the transport, token provider, sink and
/// hook.
#[derive(Clone)]
pub struct RequestClient {
    transport: Arc<dyn Transport>,
    tokens: Arc<dyn TokenProvider>,
    sink: Arc<dyn LogSink>,
    logs: LogState,
    on_unauthorized: Option<UnauthorizedHook>,
}

impl fmt::Debug for RequestClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestClient")
            .field("logs", &self.logs)
            .field("on_unauthorized", &self.on_unauthorized.is_some())
            .finish_non_exhaustive()
    }
}

/// Builder for [`RequestClient`].
pub struct RequestClientBuilder {
    transport: Arc<dyn Transport>,
    tokens: Arc<dyn TokenProvider>,
    sink: Arc<dyn LogSink>,
    logs: LogState,
    on_unauthorized: Option<UnauthorizedHook>,
}

impl fmt::Debug for RequestClientBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestClientBuilder")
            .field("logs", &self.logs)
            .finish_non_exhaustive()
    }
}

impl RequestClientBuilder {
    /// Token source for POST, PUT and DELETE. Defaults to no token.
    pub fn token_provider(mut self, tokens: impl TokenProvider + 'static) -> Self {
        self.tokens = Arc::new(tokens);
        self
    }

    /// Destination for diagnostic messages. Defaults to [`TracingSink`].
    pub fn log_sink(mut self, sink: impl LogSink + 'static) -> Self {
        self.sink = Arc::new(sink);
        self
    }

    /// Log state for POST, PUT and DELETE.
    pub fn logs(mut self, logs: LogState) -> Self {
        self.logs = logs;
        self
    }

    pub fn config(mut self, config: &ClientConfig) -> Self {
        self.logs = config.logs;
        self
    }

    /// Called synchronously with every 401 response, before the operation
    /// produces its result.
    pub fn on_unauthorized<F>(mut self, hook: F) -> Self
    where
        F: Fn(&HttpResponse) + Send + Sync + 'static,
    {
        self.on_unauthorized = Some(Arc::new(hook));
        self
    }

    pub fn build(self) -> RequestClient {
        RequestClient {
            transport: self.transport,
            tokens: self.tokens,
            sink: self.sink,
            logs: self.logs,
            on_unauthorized: self.on_unauthorized,
        }
    }
}

impl RequestClient {
    pub fn builder(transport: impl Transport + 'static) -> RequestClientBuilder {
        RequestClientBuilder {
            transport: Arc::new(transport),
            tokens: Arc::new(StaticToken::none()),
            sink: Arc::new(TracingSink),
            logs: LogState::default(),
            on_unauthorized: None,
        }
    }

    /// Client with default token provider, sink and log state.
    pub fn new(transport: impl Transport + 'static) -> Self {
        Self::builder(transport).build()
    }

    // -----------------------------------------------------------------------
    // Operations
    // -----------------------------------------------------------------------

    /// GET `url` and decode the body into `T`.
    pub async fn get_json<T>(&self, url: &str, options: &GetOptions) -> Result<T, RequestError>
    where
        T: DeserializeOwned,
    {
        let request = self.build_get(url, options)?;
        let response = self.transport.execute(request).await?;
        self.parse_get_json(response, options.logs)
    }

    /// GET `url` and return the raw body.
    pub async fn get_raw(&self, url: &str, options: &GetOptions) -> Result<Vec<u8>, RequestError> {
        let request = self.build_get(url, options)?;
        let response = self.transport.execute(request).await?;
        self.parse_get_raw(response, options.logs)
    }

    /// POST `params` as JSON and return the raw body.
    pub async fn post<P>(&self, url: &str, params: &P) -> Result<Vec<u8>, RequestError>
    where
        P: Serialize + ?Sized,
    {
        let request = self.build_post(url, params)?;
        let response = self.transport.execute(request).await?;
        self.parse_post(response)
    }

    /// PUT `params` as JSON and return the raw body.
    pub async fn put<P>(&self, url: &str, params: &P) -> Result<Vec<u8>, RequestError>
    where
        P: Serialize + ?Sized,
    {
        let request = self.build_put(url, params)?;
        let response = self.transport.execute(request).await?;
        self.parse_put(response)
    }

    /// DELETE `url` and return the raw body.
    pub async fn delete(&self, url: &str) -> Result<Vec<u8>, RequestError> {
        let request = self.build_delete(url)?;
        let response = self.transport.execute(request).await?;
        self.parse_delete(response)
    }

    // -----------------------------------------------------------------------
    // Request builders
    // -----------------------------------------------------------------------

    pub fn build_get(&self, url: &str, options: &GetOptions) -> Result<HttpRequest, RequestError> {
        let mut headers = vec![
            (ACCEPT.to_string(), APPLICATION_JSON.to_string()),
            (CONTENT_TYPE.to_string(), APPLICATION_JSON.to_string()),
        ];
        if let Some(token) = options.token.as_deref() {
            headers.push((AUTHORIZATION.to_string(), bearer(Some(token))));
        }
        Ok(HttpRequest {
            method: HttpMethod::Get,
            url: checked_url(url)?,
            headers,
            body: None,
            cache_policy: options.cache_policy,
        })
    }

    pub fn build_post<P>(&self, url: &str, params: &P) -> Result<HttpRequest, RequestError>
    where
        P: Serialize + ?Sized,
    {
        self.build_with_body(HttpMethod::Post, url, params)
    }

    pub fn build_put<P>(&self, url: &str, params: &P) -> Result<HttpRequest, RequestError>
    where
        P: Serialize + ?Sized,
    {
        self.build_with_body(HttpMethod::Put, url, params)
    }

    pub fn build_delete(&self, url: &str) -> Result<HttpRequest, RequestError> {
        Ok(HttpRequest {
            method: HttpMethod::Delete,
            url: checked_url(url)?,
            headers: vec![(AUTHORIZATION.to_string(), self.authorization())],
            body: None,
            cache_policy: CachePolicy::default(),
        })
    }

    fn build_with_body<P>(
        &self,
        method: HttpMethod,
        url: &str,
        params: &P,
    ) -> Result<HttpRequest, RequestError>
    where
        P: Serialize + ?Sized,
    {
        let url = checked_url(url)?;
        let body =
            serde_json::to_vec(params).map_err(|e| RequestError::Serialization(e.to_string()))?;
        Ok(HttpRequest {
            method,
            url,
            headers: vec![
                (CONTENT_TYPE.to_string(), APPLICATION_JSON.to_string()),
                (AUTHORIZATION.to_string(), self.authorization()),
            ],
            body: Some(body),
            cache_policy: CachePolicy::default(),
        })
    }

    fn authorization(&self) -> String {
        bearer(self.tokens.current_token().as_deref())
    }

    // -----------------------------------------------------------------------
    // Response parsers
    // -----------------------------------------------------------------------

    /// Interpret a GET response as `T`.
    ///
    /// The status is only reported. The body must be a JSON object before
    /// the typed decode is attempted, so a body that `T` could decode (an
    /// array, say) is still rejected.
    pub fn parse_get_json<T>(
        &self,
        response: HttpResponse,
        logs: LogState,
    ) -> Result<T, RequestError>
    where
        T: DeserializeOwned,
    {
        let logger = self.logger(logs);
        self.report_status(&response, &logger);
        received_object(&response.body, &logger)?;

        serde_json::from_slice(&response.body).map_err(|e| {
            logger.log(format_args!("Error decoding JSON: {e}"));
            RequestError::BadServerResponse(format!("decode failed: {e}"))
        })
    }

    /// Interpret a GET response as raw bytes, after the same JSON-object
    /// check as [`parse_get_json`](Self::parse_get_json).
    pub fn parse_get_raw(
        &self,
        response: HttpResponse,
        logs: LogState,
    ) -> Result<Vec<u8>, RequestError> {
        let logger = self.logger(logs);
        self.report_status(&response, &logger);
        received_object(&response.body, &logger)?;
        Ok(response.body)
    }

    /// Interpret a POST response. Any status and any body is returned as is.
    pub fn parse_post(&self, response: HttpResponse) -> Result<Vec<u8>, RequestError> {
        let logger = self.logger(self.logs);
        self.report_status(&response, &logger);
        match serde_json::from_slice::<Map<String, Value>>(&response.body) {
            Ok(json) => logger.log(format_args!("Data received = {}", Value::Object(json))),
            Err(_) => logger.log(format_args!("Data received = {} bytes", response.body.len())),
        }
        Ok(response.body)
    }

    pub fn parse_put(&self, response: HttpResponse) -> Result<Vec<u8>, RequestError> {
        self.parse_mutation(HttpMethod::Put, response)
    }

    pub fn parse_delete(&self, response: HttpResponse) -> Result<Vec<u8>, RequestError> {
        self.parse_mutation(HttpMethod::Delete, response)
    }

    fn parse_mutation(
        &self,
        method: HttpMethod,
        response: HttpResponse,
    ) -> Result<Vec<u8>, RequestError> {
        let logger = self.logger(self.logs);
        self.notify_unauthorized(&response);

        if !MUTATION_ACCEPTED.contains(&response.status) {
            logger.log(format_args!("{method} failed: HTTP Error code = {}", response.status));
            return Err(RequestError::HttpStatus {
                status: response.status,
                body: String::from_utf8_lossy(&response.body).into_owned(),
            });
        }
        if response.body.is_empty() {
            logger.log(format_args!("{method} failed: did not receive data"));
            return Err(RequestError::EmptyBody);
        }

        let json = serde_json::from_slice::<Map<String, Value>>(&response.body).map_err(|e| {
            logger.log(format_args!("{method} failed: cannot convert data to JSON object"));
            RequestError::BadServerResponse(format!("not a JSON object: {e}"))
        })?;
        if logger.enabled() {
            if let Ok(pretty) = serde_json::to_string_pretty(&json) {
                logger.log(format_args!("{pretty}"));
            }
        }
        Ok(response.body)
    }

    fn logger(&self, logs: LogState) -> Logger<'_> {
        Logger::new(self.sink.as_ref(), logs)
    }

    fn report_status(&self, response: &HttpResponse, logger: &Logger<'_>) {
        if response.status == 200 {
            logger.log(format_args!("HTTP Success"));
        } else {
            logger.log(format_args!("HTTP Error code = {}", response.status));
        }
        self.notify_unauthorized(response);
    }

    fn notify_unauthorized(&self, response: &HttpResponse) {
        if response.status == UNAUTHORIZED {
            if let Some(hook) = &self.on_unauthorized {
                hook(response);
            }
        }
    }
}

/// Require the body to be a JSON object and report it.
fn received_object(body: &[u8], logger: &Logger<'_>) -> Result<(), RequestError> {
    match serde_json::from_slice::<Map<String, Value>>(body) {
        Ok(json) => {
            logger.log(format_args!("Data received = {}", Value::Object(json)));
            Ok(())
        }
        Err(e) => {
            logger.log(format_args!("Data could not be serialized to JSON"));
            Err(RequestError::BadServerResponse(format!("not a JSON object: {e}")))
        }
    }
}

/// Reject anything that is not an absolute URI. The string is sent as given.
fn checked_url(url: &str) -> Result<String, RequestError> {
    url::Url::parse(url).map_err(|e| RequestError::InvalidUrl(format!("{url}: {e}")))?;
    Ok(url.to_string())
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde::Deserialize;

    use super::*;
    use crate::error::TransportError;

    /// Transport that must never be reached; these tests only build and parse.
    struct Unreachable;

    #[async_trait]
    impl Transport for Unreachable {
        async fn execute(&self, _request: HttpRequest) -> Result<HttpResponse, TransportError> {
            Err(TransportError::Other("unreachable".to_string()))
        }
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Item {
        id: i64,
        name: String,
    }

    fn client() -> RequestClient {
        RequestClient::builder(Unreachable)
            .token_provider(StaticToken::new("jwt"))
            .build()
    }

    fn recording_client(logs: LogState) -> (RequestClient, Arc<Mutex<Vec<String>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink_seen = Arc::clone(&seen);
        let client = RequestClient::builder(Unreachable)
            .log_sink(move |m: &str| sink_seen.lock().unwrap().push(m.to_string()))
            .logs(logs)
            .build();
        (client, seen)
    }

    #[test]
    fn build_get_sets_json_headers_without_token() {
        let req = client()
            .build_get("https://api.example.com/items/1", &GetOptions::new())
            .unwrap();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, "https://api.example.com/items/1");
        assert_eq!(
            req.headers,
            vec![
                ("accept".to_string(), "application/json".to_string()),
                ("content-type".to_string(), "application/json".to_string()),
            ]
        );
        assert!(req.body.is_none());
        assert_eq!(req.cache_policy, CachePolicy::ReloadIgnoringLocalCache);
    }

    #[test]
    fn build_get_uses_per_call_token_and_policy() {
        let options = GetOptions::new()
            .token("per-call")
            .cache_policy(CachePolicy::ReturnCacheElseLoad);
        let req = client().build_get("https://api.example.com/items", &options).unwrap();
        assert_eq!(req.header("Authorization"), Some("Bearer per-call"));
        assert_eq!(req.cache_policy, CachePolicy::ReturnCacheElseLoad);
    }

    #[test]
    fn build_get_rejects_relative_url() {
        let err = client().build_get("/items/1", &GetOptions::new()).unwrap_err();
        assert!(matches!(err, RequestError::InvalidUrl(_)));
    }

    #[test]
    fn build_post_serializes_params_and_reads_provider_token() {
        let params = serde_json::json!({"name": "x", "count": 2});
        let req = client().build_post("https://api.example.com/items", &params).unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(
            req.headers,
            vec![
                ("content-type".to_string(), "application/json".to_string()),
                ("authorization".to_string(), "Bearer jwt".to_string()),
            ]
        );
        let body: Value = serde_json::from_slice(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body, params);
    }

    #[test]
    fn build_put_sends_empty_bearer_when_no_token() {
        let client = RequestClient::new(Unreachable);
        let req = client
            .build_put("https://api.example.com/items/1", &serde_json::json!({}))
            .unwrap();
        assert_eq!(req.method, HttpMethod::Put);
        assert_eq!(req.header(AUTHORIZATION), Some("Bearer "));
        assert_eq!(req.body.as_deref(), Some(&b"{}"[..]));
    }

    #[test]
    fn build_delete_has_only_authorization() {
        let req = client().build_delete("https://api.example.com/items/1").unwrap();
        assert_eq!(req.method, HttpMethod::Delete);
        assert_eq!(
            req.headers,
            vec![("authorization".to_string(), "Bearer jwt".to_string())]
        );
        assert!(req.body.is_none());
    }

    #[test]
    fn build_post_reports_unserializable_params() {
        let mut params = std::collections::HashMap::new();
        params.insert(vec![1u8], "non-string key");
        let err = client().build_post("https://api.example.com", &params).unwrap_err();
        assert!(matches!(err, RequestError::Serialization(_)));
    }

    #[test]
    fn parse_get_json_success() {
        let response = HttpResponse::new(200, r#"{"id":1,"name":"x"}"#);
        let item: Item = client().parse_get_json(response, LogState::Disabled).unwrap();
        assert_eq!(
            item,
            Item {
                id: 1,
                name: "x".to_string()
            }
        );
    }

    #[test]
    fn parse_get_json_does_not_enforce_status() {
        let response = HttpResponse::new(500, r#"{"id":7,"name":"still decoded"}"#);
        let item: Item = client().parse_get_json(response, LogState::Disabled).unwrap();
        assert_eq!(item.id, 7);
    }

    #[test]
    fn parse_get_json_rejects_non_object_even_if_decodable() {
        let response = HttpResponse::new(200, "[1,2,3]");
        let err = client()
            .parse_get_json::<Vec<i32>>(response, LogState::Disabled)
            .unwrap_err();
        assert!(matches!(err, RequestError::BadServerResponse(_)));
    }

    #[test]
    fn parse_get_json_decode_failure() {
        let response = HttpResponse::new(200, r#"{"id":"one"}"#);
        let err = client().parse_get_json::<Item>(response, LogState::Disabled).unwrap_err();
        assert!(matches!(
            err,
            RequestError::BadServerResponse(msg) if msg.starts_with("decode failed")
        ));
    }

    #[test]
    fn parse_get_raw_returns_body_bytes() {
        let body = br#"{"anything":true}"#.to_vec();
        let raw = client()
            .parse_get_raw(HttpResponse::new(404, body.clone()), LogState::Disabled)
            .unwrap();
        assert_eq!(raw, body);
    }

    #[test]
    fn parse_get_raw_rejects_plain_text() {
        let err = client()
            .parse_get_raw(HttpResponse::new(200, "hello"), LogState::Disabled)
            .unwrap_err();
        assert!(matches!(err, RequestError::BadServerResponse(_)));
    }

    #[test]
    fn parse_post_returns_body_for_any_status() {
        for status in [200, 201, 400, 500] {
            let raw = client().parse_post(HttpResponse::new(status, "not json")).unwrap();
            assert_eq!(raw, b"not json".to_vec(), "status {status}");
        }
    }

    #[test]
    fn parse_put_accepts_2xx_json_object() {
        let raw = client()
            .parse_put(HttpResponse::new(200, r#"{"ok":true}"#))
            .unwrap();
        assert_eq!(raw, br#"{"ok":true}"#.to_vec());
    }

    #[test]
    fn parse_put_rejects_status_outside_range() {
        for status in [199, 299, 404, 500] {
            let err = client()
                .parse_put(HttpResponse::new(status, r#"{"error":"x"}"#))
                .unwrap_err();
            assert_eq!(err.status(), Some(status));
        }
    }

    #[test]
    fn parse_put_no_content_is_empty_body() {
        let err = client().parse_put(HttpResponse::new(204, "")).unwrap_err();
        assert!(matches!(err, RequestError::EmptyBody));
    }

    #[test]
    fn parse_delete_rejects_non_object() {
        let err = client()
            .parse_delete(HttpResponse::new(200, "[]"))
            .unwrap_err();
        assert!(matches!(err, RequestError::BadServerResponse(_)));
    }

    #[test]
    fn unauthorized_hook_runs_once_per_401() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let client = RequestClient::builder(Unreachable)
            .logs(LogState::Disabled)
            .on_unauthorized(move |response| {
                assert_eq!(response.status, 401);
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .build();

        let _ = client.parse_get_raw(HttpResponse::new(401, "{}"), LogState::Disabled);
        let _ = client.parse_post(HttpResponse::new(401, ""));
        let _ = client.parse_put(HttpResponse::new(401, ""));
        let _ = client.parse_delete(HttpResponse::new(401, ""));
        let _ = client.parse_post(HttpResponse::new(403, ""));

        assert_eq!(hits.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn messages_follow_log_state() {
        let (client, seen) = recording_client(LogState::Enabled);
        let _: Item = client
            .parse_get_json(HttpResponse::new(200, r#"{"id":1,"name":"x"}"#), LogState::Enabled)
            .unwrap();
        let _ = client.parse_get_raw(HttpResponse::new(500, "oops"), LogState::Enabled);
        let _ = client.parse_get_raw(HttpResponse::new(200, "{}"), LogState::Disabled);

        let seen = seen.lock().unwrap();
        assert_eq!(
            *seen,
            vec![
                "HTTP Success".to_string(),
                r#"Data received = {"id":1,"name":"x"}"#.to_string(),
                "HTTP Error code = 500".to_string(),
                "Data could not be serialized to JSON".to_string(),
            ]
        );
    }

    #[test]
    fn put_logs_pretty_json_only_when_enabled() {
        let (client, seen) = recording_client(LogState::Enabled);
        client.parse_put(HttpResponse::new(200, r#"{"a":1}"#)).unwrap();
        assert_eq!(*seen.lock().unwrap(), vec!["{\n  \"a\": 1\n}".to_string()]);

        let (quiet, quiet_seen) = recording_client(LogState::Disabled);
        quiet.parse_delete(HttpResponse::new(200, r#"{"a":1}"#)).unwrap();
        assert!(quiet_seen.lock().unwrap().is_empty());
    }

    #[test]
    fn config_sets_default_log_state() {
        let config = ClientConfig {
            logs: LogState::Disabled,
            timeout: None,
        };
        let client = RequestClient::builder(Unreachable).config(&config).build();
        assert_eq!(client.logs, LogState::Disabled);
    }
}
