//! Fire-and-forget operations with a completion callback.
//!
//! Each `spawn_*` call starts one task on the current tokio runtime and
//! returns immediately. The completion runs exactly once, on a runtime
//! worker, with the operation's result. Aborting the returned handle before
//! the task finishes skips the completion.

use std::future::Future;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::task::JoinHandle;

use crate::client::{GetOptions, RequestClient};
use crate::error::RequestError;

/// Run `future` on the current runtime and hand its output to `completion`.
///
/// # Panics
///
/// Panics when called outside a tokio runtime.
pub fn dispatch<T, F, C>(future: F, completion: C) -> JoinHandle<()>
where
    T: Send + 'static,
    F: Future<Output = Result<T, RequestError>> + Send + 'static,
    C: FnOnce(Result<T, RequestError>) + Send + 'static,
{
    tokio::spawn(async move { completion(future.await) })
}

impl RequestClient {
    pub fn spawn_get_json<T, C>(
        &self,
        url: impl Into<String>,
        options: GetOptions,
        completion: C,
    ) -> JoinHandle<()>
    where
        T: DeserializeOwned + Send + 'static,
        C: FnOnce(Result<T, RequestError>) + Send + 'static,
    {
        let client = self.clone();
        let url = url.into();
        dispatch(async move { client.get_json(&url, &options).await }, completion)
    }

    pub fn spawn_get_raw<C>(
        &self,
        url: impl Into<String>,
        options: GetOptions,
        completion: C,
    ) -> JoinHandle<()>
    where
        C: FnOnce(Result<Vec<u8>, RequestError>) + Send + 'static,
    {
        let client = self.clone();
        let url = url.into();
        dispatch(async move { client.get_raw(&url, &options).await }, completion)
    }

    pub fn spawn_post<P, C>(
        &self,
        url: impl Into<String>,
        params: P,
        completion: C,
    ) -> JoinHandle<()>
    where
        P: Serialize + Send + Sync + 'static,
        C: FnOnce(Result<Vec<u8>, RequestError>) + Send + 'static,
    {
        let client = self.clone();
        let url = url.into();
        dispatch(async move { client.post(&url, &params).await }, completion)
    }

    pub fn spawn_put<P, C>(
        &self,
        url: impl Into<String>,
        params: P,
        completion: C,
    ) -> JoinHandle<()>
    where
        P: Serialize + Send + Sync + 'static,
        C: FnOnce(Result<Vec<u8>, RequestError>) + Send + 'static,
    {
        let client = self.clone();
        let url = url.into();
        dispatch(async move { client.put(&url, &params).await }, completion)
    }

    pub fn spawn_delete<C>(&self, url: impl Into<String>, completion: C) -> JoinHandle<()>
    where
        C: FnOnce(Result<Vec<u8>, RequestError>) + Send + 'static,
    {
        let client = self.clone();
        let url = url.into();
        dispatch(async move { client.delete(&url).await }, completion)
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::oneshot;

    use super::*;
    use crate::error::TransportError;

    #[tokio::test]
    async fn completion_receives_future_output() {
        let (tx, rx) = oneshot::channel();
        let handle = dispatch(async { Ok::<_, RequestError>(42) }, move |result| {
            let _ = tx.send(result);
        });
        handle.await.unwrap();
        assert_eq!(rx.await.unwrap().unwrap(), 42);
    }

    #[tokio::test]
    async fn completion_receives_errors() {
        let (tx, rx) = oneshot::channel();
        dispatch(
            async { Err::<(), _>(RequestError::from(TransportError::Timeout)) },
            move |result| {
                let _ = tx.send(result);
            },
        );
        let result = rx.await.unwrap();
        assert!(matches!(result, Err(RequestError::Transport(TransportError::Timeout))));
    }
}
