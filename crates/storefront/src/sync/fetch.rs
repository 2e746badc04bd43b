//! Stale-while-revalidate fetch coordination.
//!
//! [`FetchCoordinator::ensure_fresh`] is the single entry point for reads:
//! fresh data short-circuits, an in-flight fetch for the same key is never
//! duplicated, and a completed fetch only lands if nothing newer was written
//! to the entry while it was on the wire. There is no cancel primitive -
//! version-checking at completion is the cancellation mechanism.

use std::collections::HashSet;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::error::ClientError;
use crate::sync::key::CacheKey;
use crate::sync::store::{CacheStore, EntryPatch, lock};

/// How long fetched data counts as fresh.
#[derive(Debug, Clone, Copy)]
pub struct FreshnessPolicy {
    pub stale_after: Duration,
}

impl FreshnessPolicy {
    /// Data older than `stale_after` triggers a background refresh.
    #[must_use]
    pub const fn new(stale_after: Duration) -> Self {
        Self { stale_after }
    }

    /// Treat cached data as always stale: serve it, but refresh on every
    /// read. Used for the cart, which other sessions can change.
    pub const ALWAYS_STALE: Self = Self {
        stale_after: Duration::ZERO,
    };
}

/// Deduplicating fetch coordinator for one resource family.
///
/// Cheaply cloneable; clones share the in-flight set and the store.
pub struct FetchCoordinator<T> {
    store: CacheStore<T>,
    in_flight: Arc<Mutex<HashSet<CacheKey>>>,
}

impl<T> Clone for FetchCoordinator<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            in_flight: Arc::clone(&self.in_flight),
        }
    }
}

impl<T: Clone + Send + Sync + 'static> FetchCoordinator<T> {
    #[must_use]
    pub fn new(store: CacheStore<T>) -> Self {
        Self {
            store,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Ensure the entry for `key` is fresh, refreshing in the background if
    /// needed. Fire-and-forget: the store is updated on completion and
    /// subscribers notified.
    ///
    /// Returns `None` when no request was started - either the cached data
    /// is younger than the policy window, or a fetch for this exact key is
    /// already in flight (N simultaneous callers produce exactly one network
    /// call). Otherwise returns the handle of the spawned refresh task;
    /// callers normally ignore it.
    ///
    /// Failures are written to the entry's `error` field, never thrown, and
    /// there is no retry at this layer.
    pub fn ensure_fresh<F, Fut>(
        &self,
        key: &CacheKey,
        policy: FreshnessPolicy,
        fetch: F,
    ) -> Option<JoinHandle<()>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ClientError>> + Send + 'static,
    {
        if let Some(entry) = self.store.read(key)
            && entry.is_fresh(policy.stale_after)
        {
            tracing::debug!(key = %key, "cache fresh, skipping fetch");
            return None;
        }

        {
            let mut in_flight = lock(&self.in_flight);
            if !in_flight.insert(key.clone()) {
                tracing::debug!(key = %key, "fetch already in flight, attaching");
                return None;
            }
        }

        // Mark the entry validating and capture the resulting version; a
        // completion that finds the version advanced past this was
        // superseded and must not land.
        let started_at_version = self.store.write(key, EntryPatch::validating());

        let store = self.store.clone();
        let in_flight = Arc::clone(&self.in_flight);
        let key = key.clone();
        let future = fetch();

        Some(tokio::spawn(async move {
            let result = future.await;

            let patch = match result {
                Ok(data) => EntryPatch::fresh(data),
                Err(error) => {
                    tracing::warn!(key = %key, %error, "fetch failed");
                    EntryPatch::failed(error)
                }
            };
            if store
                .write_if_version(&key, started_at_version, patch)
                .is_none()
            {
                tracing::debug!(
                    key = %key,
                    started_at_version,
                    "discarding superseded fetch response"
                );
            }

            lock(&in_flight).remove(&key);
        }))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tokio::sync::oneshot;

    use super::*;
    use crate::sync::key::build_key;

    fn key(name: &str) -> CacheKey {
        build_key(name, &[])
    }

    #[tokio::test]
    async fn test_fresh_data_skips_fetch() {
        let store: CacheStore<u32> = CacheStore::new("test");
        let coordinator = FetchCoordinator::new(store.clone());
        let k = key("products");
        store.write(&k, EntryPatch::fresh(1));

        let calls = Arc::new(AtomicUsize::new(0));
        let calls_fetch = Arc::clone(&calls);
        let handle = coordinator.ensure_fresh(&k, FreshnessPolicy::new(Duration::from_secs(60)), move || {
            calls_fetch.fetch_add(1, Ordering::SeqCst);
            async { Ok(2) }
        });

        assert!(handle.is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(store.read(&k).unwrap().data, Some(1));
    }

    #[tokio::test]
    async fn test_stale_data_refreshes() {
        let store: CacheStore<u32> = CacheStore::new("test");
        let coordinator = FetchCoordinator::new(store.clone());
        let k = key("products");
        store.write(&k, EntryPatch::fresh(1));

        let handle = coordinator
            .ensure_fresh(&k, FreshnessPolicy::ALWAYS_STALE, || async { Ok(2) })
            .expect("refresh should start");
        handle.await.unwrap();

        let entry = store.read(&k).unwrap();
        assert_eq!(entry.data, Some(2));
        assert!(!entry.is_validating);
    }

    #[tokio::test]
    async fn test_concurrent_callers_one_fetch() {
        let store: CacheStore<u32> = CacheStore::new("test");
        let coordinator = FetchCoordinator::new(store.clone());
        let k = key("products");

        let calls = Arc::new(AtomicUsize::new(0));
        let (release, gate) = oneshot::channel::<()>();

        let calls_first = Arc::clone(&calls);
        let first = coordinator
            .ensure_fresh(&k, FreshnessPolicy::ALWAYS_STALE, move || async move {
                calls_first.fetch_add(1, Ordering::SeqCst);
                let _ = gate.await;
                Ok(7)
            })
            .expect("first caller starts the fetch");

        let calls_second = Arc::clone(&calls);
        let second = coordinator.ensure_fresh(&k, FreshnessPolicy::ALWAYS_STALE, move || {
            calls_second.fetch_add(1, Ordering::SeqCst);
            async { Ok(8) }
        });
        assert!(second.is_none(), "second caller attaches to the first");

        release.send(()).unwrap();
        first.await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.read(&k).unwrap().data, Some(7));
    }

    #[tokio::test]
    async fn test_error_surfaces_on_entry() {
        let store: CacheStore<u32> = CacheStore::new("test");
        let coordinator = FetchCoordinator::new(store.clone());
        let k = key("products");
        store.write(&k, EntryPatch::fresh(1));

        let handle = coordinator
            .ensure_fresh(&k, FreshnessPolicy::ALWAYS_STALE, || async {
                Err(ClientError::NotFound("products".to_string()))
            })
            .expect("refresh should start");
        handle.await.unwrap();

        let entry = store.read(&k).unwrap();
        assert_eq!(entry.data, Some(1), "old data survives a failed refresh");
        assert!(entry.error.is_some());
        assert!(!entry.is_validating);
    }

    #[tokio::test]
    async fn test_superseded_response_is_discarded() {
        let store: CacheStore<u32> = CacheStore::new("test");
        let coordinator = FetchCoordinator::new(store.clone());
        let k = key("cart");

        let (release, gate) = oneshot::channel::<()>();
        let handle = coordinator
            .ensure_fresh(&k, FreshnessPolicy::ALWAYS_STALE, move || async move {
                let _ = gate.await;
                Ok(1)
            })
            .expect("refresh should start");

        // A newer write (e.g. an optimistic mutation) lands while the fetch
        // is on the wire.
        store.write(&k, EntryPatch::fresh(99));

        release.send(()).unwrap();
        handle.await.unwrap();

        assert_eq!(
            store.read(&k).unwrap().data,
            Some(99),
            "slow response must not overwrite newer state"
        );
    }

    #[tokio::test]
    async fn test_refetch_allowed_after_completion() {
        let store: CacheStore<u32> = CacheStore::new("test");
        let coordinator = FetchCoordinator::new(store.clone());
        let k = key("products");

        let first = coordinator
            .ensure_fresh(&k, FreshnessPolicy::ALWAYS_STALE, || async { Ok(1) })
            .expect("first refresh starts");
        first.await.unwrap();

        let second = coordinator
            .ensure_fresh(&k, FreshnessPolicy::ALWAYS_STALE, || async { Ok(2) })
            .expect("key is no longer in flight");
        second.await.unwrap();

        assert_eq!(store.read(&k).unwrap().data, Some(2));
    }
}
