//! In-memory last-result cache for rate services.

use std::sync::Arc;

/// Holds the most recent rates a service produced.
///
/// There is no expiry: the cache tier answers with whatever was stored last and the caller
/// stamps the age. Clones share the same slot.
#[derive(Debug)]
pub struct RateCache<T> {
    inner: Arc<tokio::sync::RwLock<Option<T>>>,
}

impl<T> Clone for RateCache<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Default for RateCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> RateCache<T> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(tokio::sync::RwLock::new(None)),
        }
    }

    pub async fn put(&self, value: T) {
        let mut slot = self.inner.write().await;
        *slot = Some(value);
    }

    pub async fn clear(&self) {
        let mut slot = self.inner.write().await;
        *slot = None;
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_none()
    }
}

impl<T: Clone> RateCache<T> {
    pub async fn get(&self) -> Option<T> {
        self.inner.read().await.clone()
    }
}
