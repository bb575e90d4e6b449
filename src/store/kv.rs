use std::sync::Arc;

use async_trait::async_trait;
use log::debug;

use crate::core::{RequestContext, TallyError};

/// Raw get/set access to a string cache.
#[async_trait]
pub trait KeyValueBackend: Send + Sync {
    /// Overwrites `key` with no expiry.
    async fn set(&self, key: &str, value: &str) -> Result<(), TallyError>;
    /// `Ok(None)` when the key is absent.
    async fn get(&self, key: &str) -> Result<Option<String>, TallyError>;
}

/// Cache front-end used by the handlers.
///
/// Every call runs under the caller's [`RequestContext`]. A missing key is
/// reported as [`TallyError::NotFound`]; backend failures keep their
/// `StorageUnavailable` kind with the key (and value) attached.
#[derive(Clone)]
pub struct KeyValueStore {
    backend: Arc<dyn KeyValueBackend>,
}

impl KeyValueStore {
    pub fn new(backend: impl KeyValueBackend + 'static) -> Self {
        Self {
            backend: Arc::new(backend),
        }
    }

    pub async fn set(
        &self,
        ctx: &RequestContext,
        key: &str,
        value: &str,
    ) -> Result<(), TallyError> {
        debug!("kv set '{}'", key);
        ctx.run(self.backend.set(key, value))
            .await
            .map_err(|err| match err {
                TallyError::StorageUnavailable(msg) => TallyError::StorageUnavailable(format!(
                    "could not set ({key}: {value}): {msg}"
                )),
                other => other,
            })
    }

    pub async fn get(&self, ctx: &RequestContext, key: &str) -> Result<String, TallyError> {
        debug!("kv get '{}'", key);
        match ctx.run(self.backend.get(key)).await {
            Ok(Some(value)) => Ok(value),
            Ok(None) => Err(TallyError::NotFound(format!(
                "could not get the value of the key: {key}"
            ))),
            Err(TallyError::StorageUnavailable(msg)) => Err(TallyError::StorageUnavailable(
                format!("could not get the value of the key {key}: {msg}"),
            )),
            Err(other) => Err(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::store::MemoryStore;

    struct Unreachable;

    #[async_trait]
    impl KeyValueBackend for Unreachable {
        async fn set(&self, _key: &str, _value: &str) -> Result<(), TallyError> {
            Err(TallyError::StorageUnavailable("connection refused".into()))
        }

        async fn get(&self, _key: &str) -> Result<Option<String>, TallyError> {
            Err(TallyError::StorageUnavailable("connection refused".into()))
        }
    }

    struct Hanging;

    #[async_trait]
    impl KeyValueBackend for Hanging {
        async fn set(&self, _key: &str, _value: &str) -> Result<(), TallyError> {
            std::future::pending().await
        }

        async fn get(&self, _key: &str) -> Result<Option<String>, TallyError> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn test_set_then_get() {
        let store = KeyValueStore::new(MemoryStore::new());
        let ctx = RequestContext::background();
        store.set(&ctx, "k", "v").await.unwrap();
        assert_eq!(store.get(&ctx, "k").await, Ok("v".to_string()));
    }

    #[tokio::test]
    async fn test_last_write_wins() {
        let store = KeyValueStore::new(MemoryStore::new());
        let ctx = RequestContext::background();
        store.set(&ctx, "k", "v1").await.unwrap();
        store.set(&ctx, "k", "v2").await.unwrap();
        assert_eq!(store.get(&ctx, "k").await, Ok("v2".to_string()));
    }

    #[tokio::test]
    async fn test_missing_key_is_not_found() {
        let store = KeyValueStore::new(MemoryStore::new());
        let result = store.get(&RequestContext::background(), "missing").await;
        assert!(matches!(result, Err(TallyError::NotFound(msg)) if msg.contains("missing")));
    }

    #[tokio::test]
    async fn test_backend_failure_carries_context() {
        let store = KeyValueStore::new(Unreachable);
        let ctx = RequestContext::background();

        let set = store.set(&ctx, "k", "v").await;
        assert!(matches!(
            set,
            Err(TallyError::StorageUnavailable(msg))
                if msg.contains("(k: v)") && msg.contains("connection refused")
        ));

        let get = store.get(&ctx, "k").await;
        assert!(matches!(get, Err(TallyError::StorageUnavailable(msg)) if msg.contains("key k")));
    }

    #[tokio::test]
    async fn test_deadline_is_distinct_from_unavailable() {
        let store = KeyValueStore::new(Hanging);
        let ctx = RequestContext::with_timeout(Duration::from_millis(20));
        assert_eq!(store.get(&ctx, "k").await, Err(TallyError::DeadlineExceeded));
        assert_eq!(store.set(&ctx, "k", "v").await, Err(TallyError::DeadlineExceeded));
    }
}
