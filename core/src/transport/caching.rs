//! Response cache honouring each GET's [`CachePolicy`].

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::TransportError;
use crate::http::{CachePolicy, HttpMethod, HttpRequest, HttpResponse, AUTHORIZATION};
use crate::transport::Transport;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    url: String,
    authorization: Option<String>,
}

impl CacheKey {
    fn of(request: &HttpRequest) -> Self {
        Self {
            url: request.url.clone(),
            authorization: request.header(AUTHORIZATION).map(str::to_string),
        }
    }
}

/// Number of responses a [`CachingTransport`] keeps unless told otherwise.
pub const DEFAULT_CAPACITY: usize = 256;

/// Stored responses plus their insertion order, oldest first.
#[derive(Debug, Default)]
struct Entries {
    responses: HashMap<CacheKey, HttpResponse>,
    order: VecDeque<CacheKey>,
}

impl Entries {
    fn insert(&mut self, key: CacheKey, response: HttpResponse, capacity: usize) {
        if capacity == 0 {
            return;
        }
        if self.responses.insert(key.clone(), response).is_some() {
            self.order.retain(|k| k != &key);
        }
        self.order.push_back(key);

        while self.order.len() > capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.responses.remove(&oldest);
            }
        }
    }

    fn clear(&mut self) {
        self.responses.clear();
        self.order.clear();
    }
}

/// Wraps a transport and stores successful GET responses in memory.
///
/// Non-GET requests always pass straight through. Only 2xx responses are
/// stored, and at most `capacity` of them; the oldest is evicted first.
#[derive(Debug)]
pub struct CachingTransport<T> {
    inner: T,
    capacity: usize,
    entries: Mutex<Entries>,
}

impl<T: Transport> CachingTransport<T> {
    pub fn new(inner: T) -> Self {
        Self::with_capacity(inner, DEFAULT_CAPACITY)
    }

    /// A cache holding at most `capacity` responses. Zero stores nothing.
    pub fn with_capacity(inner: T, capacity: usize) -> Self {
        Self {
            inner,
            capacity,
            entries: Mutex::new(Entries::default()),
        }
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop every stored response.
    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().responses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Entries> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lookup(&self, key: &CacheKey) -> Option<HttpResponse> {
        self.lock().responses.get(key).cloned()
    }

    async fn load(
        &self,
        key: CacheKey,
        request: HttpRequest,
    ) -> Result<HttpResponse, TransportError> {
        let response = self.inner.execute(request).await?;
        if response.is_success() {
            self.lock().insert(key, response.clone(), self.capacity);
        }
        Ok(response)
    }
}

#[async_trait]
impl<T: Transport> Transport for CachingTransport<T> {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        if request.method != HttpMethod::Get {
            return self.inner.execute(request).await;
        }

        let key = CacheKey::of(&request);
        match request.cache_policy {
            CachePolicy::ReloadIgnoringLocalCache => self.load(key, request).await,
            CachePolicy::ReturnCacheElseLoad => match self.lookup(&key) {
                Some(response) => {
                    tracing::debug!(url = %key.url, "serving cached response");
                    Ok(response)
                }
                None => self.load(key, request).await,
            },
            CachePolicy::ReturnCacheDontLoad => self.lookup(&key).ok_or(TransportError::CacheMiss),
        }
    }
}
