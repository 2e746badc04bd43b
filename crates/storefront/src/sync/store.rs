//! Versioned cache store with subscriber notification.
//!
//! One store holds one resource family (catalog pages, product details,
//! the cart, ...), keyed by canonical [`CacheKey`]s. Entries are created on
//! first write, mutated in place afterwards, and evicted only by explicit
//! [`CacheStore::clear`] - staleness is a marking, not an expiry.
//!
//! # Ordering
//!
//! Every write runs under a single notify lock: the patch is merged, the
//! version incremented, and all subscribers invoked synchronously before the
//! next write can begin. Subscribers therefore observe writes in issuance
//! order and no write is silently dropped. Subscriber callbacks may read
//! from the store but must not write back into it synchronously - schedule
//! that work instead.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::error::ClientError;
use crate::sync::key::CacheKey;

/// One cached resource snapshot.
///
/// `version` increments on every write and is used to discard stale
/// in-flight fetch responses. An entry whose key has never been written is
/// not observable through [`CacheStore::read`]; views render a loading state
/// instead.
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    pub key: CacheKey,
    pub data: Option<T>,
    pub error: Option<Arc<ClientError>>,
    pub fetched_at: Option<Instant>,
    pub is_validating: bool,
    pub version: u64,
}

impl<T> CacheEntry<T> {
    /// The defined "loading" representation views fall back to when a key
    /// has never been written.
    #[must_use]
    pub const fn loading(key: CacheKey) -> Self {
        Self {
            key,
            data: None,
            error: None,
            fetched_at: None,
            is_validating: false,
            version: 0,
        }
    }

    /// Time since the data was last fetched, if it ever was.
    #[must_use]
    pub fn age(&self) -> Option<Duration> {
        self.fetched_at.map(|at| at.elapsed())
    }

    /// Whether the entry holds data younger than the staleness window.
    #[must_use]
    pub fn is_fresh(&self, stale_after: Duration) -> bool {
        self.data.is_some() && self.age().is_some_and(|age| age < stale_after)
    }
}

enum Field<T> {
    Keep,
    Set(T),
    Clear,
}

/// A partial update merged into an entry by [`CacheStore::write`].
///
/// Constructors cover the shapes the coordinators need; fields not touched
/// by a patch keep their current value.
pub struct EntryPatch<T> {
    data: Field<T>,
    error: Field<Arc<ClientError>>,
    fetched_at: Option<Instant>,
    is_validating: Option<bool>,
}

impl<T> EntryPatch<T> {
    /// A successful fetch: set data, clear any error, stamp the fetch time.
    #[must_use]
    pub fn fresh(data: T) -> Self {
        Self {
            data: Field::Set(data),
            error: Field::Clear,
            fetched_at: Some(Instant::now()),
            is_validating: Some(false),
        }
    }

    /// A failed fetch: keep whatever data exists, record the error.
    #[must_use]
    pub fn failed(error: ClientError) -> Self {
        Self {
            data: Field::Keep,
            error: Field::Set(Arc::new(error)),
            fetched_at: None,
            is_validating: Some(false),
        }
    }

    /// An optimistic local prediction: set data without touching the fetch
    /// timestamp, so staleness still reflects the last server contact.
    #[must_use]
    pub fn optimistic(data: T) -> Self {
        Self {
            data: Field::Set(data),
            error: Field::Clear,
            fetched_at: None,
            is_validating: None,
        }
    }

    /// Roll back to a pre-mutation snapshot (`None` restores "never
    /// loaded").
    #[must_use]
    pub fn restore(previous: Option<T>) -> Self {
        Self {
            data: previous.map_or(Field::Clear, Field::Set),
            error: Field::Keep,
            fetched_at: None,
            is_validating: None,
        }
    }

    /// Mark the entry as revalidating without clearing its data.
    #[must_use]
    pub const fn validating() -> Self {
        Self {
            data: Field::Keep,
            error: Field::Keep,
            fetched_at: None,
            is_validating: Some(true),
        }
    }
}

type Callback<T> = Arc<dyn Fn(&CacheEntry<T>) + Send + Sync>;

struct Subscriber<T> {
    id: u64,
    callback: Callback<T>,
}

struct EntryState<T> {
    entry: CacheEntry<T>,
    subscribers: Vec<Subscriber<T>>,
}

struct StoreInner<T> {
    name: &'static str,
    /// Serializes write+notify pairs; see module docs.
    notify: Mutex<()>,
    state: Mutex<HashMap<CacheKey, EntryState<T>>>,
    next_subscriber_id: AtomicU64,
}

/// Cache store for one resource family.
///
/// Cheaply cloneable; all clones share the same entries and subscribers.
pub struct CacheStore<T> {
    inner: Arc<StoreInner<T>>,
}

impl<T> Clone for CacheStore<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Clone> CacheStore<T> {
    /// Create an empty store. `name` shows up in trace output.
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                name,
                notify: Mutex::new(()),
                state: Mutex::new(HashMap::new()),
                next_subscriber_id: AtomicU64::new(1),
            }),
        }
    }

    /// Synchronous snapshot lookup. Returns `None` for keys that have never
    /// been written.
    #[must_use]
    pub fn read(&self, key: &CacheKey) -> Option<CacheEntry<T>> {
        let state = lock(&self.inner.state);
        state
            .get(key)
            .filter(|s| s.entry.version > 0)
            .map(|s| s.entry.clone())
    }

    /// Current version of the entry, `0` if it has never been written.
    #[must_use]
    pub fn version(&self, key: &CacheKey) -> u64 {
        let state = lock(&self.inner.state);
        state.get(key).map_or(0, |s| s.entry.version)
    }

    /// Merge a patch into the entry (creating it if absent), bump the
    /// version, and synchronously notify every subscriber of the key.
    ///
    /// Returns the entry's new version.
    pub fn write(&self, key: &CacheKey, patch: EntryPatch<T>) -> u64 {
        self.write_inner(key, None, patch)
            .expect("unconditional write always applies")
    }

    /// Like [`CacheStore::write`], but only if the entry's version still
    /// equals `expected` - the check and the write are one critical
    /// section. Returns `None` without writing when the entry has moved on;
    /// fetch completions use this to discard superseded responses.
    pub fn write_if_version(
        &self,
        key: &CacheKey,
        expected: u64,
        patch: EntryPatch<T>,
    ) -> Option<u64> {
        self.write_inner(key, Some(expected), patch)
    }

    fn write_inner(
        &self,
        key: &CacheKey,
        expected: Option<u64>,
        patch: EntryPatch<T>,
    ) -> Option<u64> {
        let _notify_guard = lock(&self.inner.notify);

        let (snapshot, callbacks) = {
            let mut state = lock(&self.inner.state);
            let entry_state = state
                .entry(key.clone())
                .or_insert_with(|| EntryState {
                    entry: CacheEntry::loading(key.clone()),
                    subscribers: Vec::new(),
                });

            if let Some(expected) = expected
                && entry_state.entry.version != expected
            {
                return None;
            }

            let entry = &mut entry_state.entry;
            match patch.data {
                Field::Set(data) => entry.data = Some(data),
                Field::Clear => entry.data = None,
                Field::Keep => {}
            }
            match patch.error {
                Field::Set(error) => entry.error = Some(error),
                Field::Clear => entry.error = None,
                Field::Keep => {}
            }
            if let Some(at) = patch.fetched_at {
                entry.fetched_at = Some(at);
            }
            if let Some(validating) = patch.is_validating {
                entry.is_validating = validating;
            }
            entry.version += 1;

            tracing::debug!(
                store = self.inner.name,
                key = %key,
                version = entry.version,
                "cache write"
            );

            let callbacks: Vec<Callback<T>> = entry_state
                .subscribers
                .iter()
                .map(|s| Arc::clone(&s.callback))
                .collect();
            (entry.clone(), callbacks)
        };

        // State lock released; subscribers may read freely. The notify lock
        // stays held so no later write can overtake this notification.
        for callback in callbacks {
            callback(&snapshot);
        }

        Some(snapshot.version)
    }

    /// Mark the entry stale-while-revalidating: `is_validating` is set
    /// without clearing data, so consumers keep rendering the old snapshot
    /// while a refresh is pending. No-op for keys never written.
    pub fn invalidate(&self, key: &CacheKey) {
        if self.version(key) == 0 {
            tracing::debug!(store = self.inner.name, key = %key, "invalidate on absent entry");
            return;
        }
        self.write(key, EntryPatch::validating());
    }

    /// Register a callback invoked on every write to `key`. The returned
    /// guard unsubscribes on drop; keeping it alive is the caller's
    /// responsibility.
    #[must_use]
    pub fn subscribe<F>(&self, key: &CacheKey, callback: F) -> SubscriptionGuard<T>
    where
        F: Fn(&CacheEntry<T>) + Send + Sync + 'static,
    {
        let id = self.inner.next_subscriber_id.fetch_add(1, Ordering::Relaxed);
        let mut state = lock(&self.inner.state);
        state
            .entry(key.clone())
            .or_insert_with(|| EntryState {
                entry: CacheEntry::loading(key.clone()),
                subscribers: Vec::new(),
            })
            .subscribers
            .push(Subscriber {
                id,
                callback: Arc::new(callback),
            });

        SubscriptionGuard {
            inner: Arc::clone(&self.inner),
            key: key.clone(),
            id,
        }
    }

    /// Drop every entry and subscriber list (process teardown / session
    /// change). Outstanding subscription guards become no-ops.
    pub fn clear(&self) {
        let _notify_guard = lock(&self.inner.notify);
        let mut state = lock(&self.inner.state);
        let evicted = state.len();
        state.clear();
        tracing::debug!(store = self.inner.name, evicted, "cache cleared");
    }
}

/// Scoped subscription handle; unsubscribes when dropped.
pub struct SubscriptionGuard<T> {
    inner: Arc<StoreInner<T>>,
    key: CacheKey,
    id: u64,
}

impl<T> Drop for SubscriptionGuard<T> {
    fn drop(&mut self) {
        let mut state = lock(&self.inner.state);
        if let Some(entry_state) = state.get_mut(&self.key) {
            entry_state.subscribers.retain(|s| s.id != self.id);
        }
    }
}

/// Lock a mutex, continuing with the inner state if a previous holder
/// panicked.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex as StdMutex;

    use super::*;
    use crate::sync::key::build_key;

    fn key(name: &str) -> CacheKey {
        build_key(name, &[])
    }

    #[test]
    fn test_read_before_first_write_is_none() {
        let store: CacheStore<u32> = CacheStore::new("test");
        let k = key("products");
        assert!(store.read(&k).is_none());

        // Subscribing alone does not make the entry readable.
        let _guard = store.subscribe(&k, |_| {});
        assert!(store.read(&k).is_none());
        assert_eq!(store.version(&k), 0);
    }

    #[test]
    fn test_write_creates_and_versions() {
        let store: CacheStore<u32> = CacheStore::new("test");
        let k = key("products");

        assert_eq!(store.write(&k, EntryPatch::fresh(7)), 1);
        let entry = store.read(&k).unwrap();
        assert_eq!(entry.data, Some(7));
        assert_eq!(entry.version, 1);
        assert!(entry.fetched_at.is_some());
        assert!(!entry.is_validating);

        assert_eq!(store.write(&k, EntryPatch::fresh(8)), 2);
        assert_eq!(store.read(&k).unwrap().data, Some(8));
    }

    #[test]
    fn test_failed_write_keeps_data() {
        let store: CacheStore<u32> = CacheStore::new("test");
        let k = key("products");
        store.write(&k, EntryPatch::fresh(7));
        store.write(
            &k,
            EntryPatch::failed(ClientError::NotFound("gone".to_string())),
        );

        let entry = store.read(&k).unwrap();
        assert_eq!(entry.data, Some(7));
        assert!(entry.error.is_some());

        // A later success clears the error again.
        store.write(&k, EntryPatch::fresh(9));
        assert!(store.read(&k).unwrap().error.is_none());
    }

    #[test]
    fn test_write_if_version() {
        let store: CacheStore<u32> = CacheStore::new("test");
        let k = key("products");
        let v1 = store.write(&k, EntryPatch::fresh(1));

        // Entry unchanged: the conditional write applies.
        assert_eq!(
            store.write_if_version(&k, v1, EntryPatch::fresh(2)),
            Some(v1 + 1)
        );

        // Entry moved on: the conditional write is discarded.
        assert!(store.write_if_version(&k, v1, EntryPatch::fresh(3)).is_none());
        assert_eq!(store.read(&k).unwrap().data, Some(2));
    }

    #[test]
    fn test_invalidate_marks_without_clearing() {
        let store: CacheStore<u32> = CacheStore::new("test");
        let k = key("cart");
        store.write(&k, EntryPatch::fresh(1));
        store.invalidate(&k);

        let entry = store.read(&k).unwrap();
        assert!(entry.is_validating);
        assert_eq!(entry.data, Some(1));
        assert_eq!(entry.version, 2);

        // Invalidating an unknown key creates nothing.
        store.invalidate(&key("other"));
        assert!(store.read(&key("other")).is_none());
    }

    #[test]
    fn test_subscribers_observe_writes_in_order() {
        let store: CacheStore<u32> = CacheStore::new("test");
        let k = key("products");
        let seen = Arc::new(StdMutex::new(Vec::new()));

        let seen_cb = Arc::clone(&seen);
        let _guard = store.subscribe(&k, move |entry| {
            seen_cb.lock().unwrap().push((entry.version, entry.data));
        });

        store.write(&k, EntryPatch::fresh(1));
        store.write(&k, EntryPatch::fresh(2));
        store.write(&k, EntryPatch::fresh(3));

        assert_eq!(
            *seen.lock().unwrap(),
            vec![(1, Some(1)), (2, Some(2)), (3, Some(3))]
        );
    }

    #[test]
    fn test_unsubscribe_on_drop() {
        let store: CacheStore<u32> = CacheStore::new("test");
        let k = key("products");
        let seen = Arc::new(StdMutex::new(Vec::new()));

        let seen_cb = Arc::clone(&seen);
        let guard = store.subscribe(&k, move |entry| {
            seen_cb.lock().unwrap().push(entry.version);
        });

        store.write(&k, EntryPatch::fresh(1));
        drop(guard);
        store.write(&k, EntryPatch::fresh(2));

        assert_eq!(*seen.lock().unwrap(), vec![1]);
    }

    #[test]
    fn test_multiple_subscribers_share_entry() {
        let store: CacheStore<u32> = CacheStore::new("test");
        let k = key("products");
        let count = Arc::new(StdMutex::new(0));

        let c1 = Arc::clone(&count);
        let _g1 = store.subscribe(&k, move |_| *c1.lock().unwrap() += 1);
        let c2 = Arc::clone(&count);
        let _g2 = store.subscribe(&k, move |_| *c2.lock().unwrap() += 1);

        store.write(&k, EntryPatch::fresh(1));
        assert_eq!(*count.lock().unwrap(), 2);
    }

    #[test]
    fn test_clear_evicts_everything() {
        let store: CacheStore<u32> = CacheStore::new("test");
        let k = key("products");
        store.write(&k, EntryPatch::fresh(1));
        store.clear();
        assert!(store.read(&k).is_none());
        assert_eq!(store.version(&k), 0);
    }

    #[test]
    fn test_freshness() {
        let store: CacheStore<u32> = CacheStore::new("test");
        let k = key("products");
        store.write(&k, EntryPatch::fresh(1));

        let entry = store.read(&k).unwrap();
        assert!(entry.is_fresh(Duration::from_secs(60)));
        assert!(!entry.is_fresh(Duration::ZERO));
    }
}
