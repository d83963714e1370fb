//! Bearer-token lookup.
//!
//! POST, PUT and DELETE read the current token from a [`TokenProvider`]
//! supplied when the client is built. GET callers pass their token per call
//! through [`GetOptions`](crate::client::GetOptions).

use std::collections::HashMap;
use std::sync::RwLock;

/// Key under which the token is persisted in a [`KeyValueStore`].
pub const TOKEN_KEY: &str = "jwtToken";

/// Source of the bearer token attached to mutating requests.
pub trait TokenProvider: Send + Sync {
    fn current_token(&self) -> Option<String>;
}

impl<F> TokenProvider for F
where
    F: Fn() -> Option<String> + Send + Sync,
{
    fn current_token(&self) -> Option<String> {
        self()
    }
}

/// A fixed token, or none at all.
#[derive(Debug, Clone, Default)]
pub struct StaticToken(pub Option<String>);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(Some(token.into()))
    }

    pub fn none() -> Self {
        Self(None)
    }
}

impl TokenProvider for StaticToken {
    fn current_token(&self) -> Option<String> {
        self.0.clone()
    }
}

/// Read-only view of persisted string settings.
pub trait KeyValueStore: Send + Sync {
    fn string(&self, key: &str) -> Option<String>;
}

/// Reads [`TOKEN_KEY`] from a [`KeyValueStore`] on every request, so a token
/// written after login is picked up without rebuilding the client.
#[derive(Debug)]
pub struct StoredToken<S> {
    store: S,
}

impl<S: KeyValueStore> StoredToken<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

impl<S: KeyValueStore> TokenProvider for StoredToken<S> {
    fn current_token(&self) -> Option<String> {
        self.store.string(TOKEN_KEY)
    }
}

/// In-memory [`KeyValueStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        let mut values = self.values.write().unwrap_or_else(|e| e.into_inner());
        values.insert(key.into(), value.into());
    }

    pub fn remove(&self, key: &str) -> Option<String> {
        let mut values = self.values.write().unwrap_or_else(|e| e.into_inner());
        values.remove(key)
    }
}

impl KeyValueStore for MemoryStore {
    fn string(&self, key: &str) -> Option<String> {
        let values = self.values.read().unwrap_or_else(|e| e.into_inner());
        values.get(key).cloned()
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for std::sync::Arc<S> {
    fn string(&self, key: &str) -> Option<String> {
        (**self).string(key)
    }
}

/// Format an `authorization` header value. A missing token yields
/// `"Bearer "` rather than omitting the header.
pub(crate) fn bearer(token: Option<&str>) -> String {
    format!("Bearer {}", token.unwrap_or_default())
}
