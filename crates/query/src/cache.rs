//! Keyed query cache with request coalescing and a soft TTL.
//!
//! A [`QueryCache`] maps keys to fetched values. Values younger than the
//! configured stale time are served without I/O. Older values are served
//! immediately while a background refresh replaces them. Missing values are
//! fetched and stored.
//!
//! At most one fetch per key is in flight. Every fetch runs on its own
//! spawned task and is shared through a [`futures::future::Shared`] handle, so
//! concurrent callers await the same result and a caller that drops its
//! future does not cancel the fetch.
//!
//! Invalidating a key removes its value and detaches any in-flight fetch: the
//! detached fetch still answers the callers already awaiting it, but its
//! result is not stored. A fetch started after a mutation therefore always
//! wins over one started before it.

use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use folio_core::error::CoreError;
use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::time::Instant;

use crate::config::QueryConfig;
use crate::error::QueryError;

/// Result of a cached query. Values are shared, never copied.
pub type QueryResult<V> = Result<Arc<V>, QueryError>;

type SharedFetch<V> = Shared<BoxFuture<'static, QueryResult<V>>>;

/// Snapshot of a key's state, for rendering loading and error states.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryStatus {
    /// Never fetched, or invalidated.
    Missing,
    /// A fetch is in flight. A stale value may still be readable.
    Fetching,
    /// Cached and within the stale time.
    Fresh,
    /// Cached but past the stale time; the next read revalidates.
    Stale,
    /// The last fetch failed and there is no cached value.
    Failed(QueryError),
}

struct Entry<V> {
    value: Arc<V>,
    fetched_at: Instant,
}

struct InFlight<V> {
    id: u64,
    future: SharedFetch<V>,
}

struct State<K, V> {
    entries: HashMap<K, Entry<V>>,
    in_flight: HashMap<K, InFlight<V>>,
    failures: HashMap<K, QueryError>,
    next_id: u64,
}

enum Lookup<V> {
    Fresh(Arc<V>),
    Stale(Arc<V>),
    Missing,
}

/// Cheaply cloneable handle to a shared cache.
pub struct QueryCache<K, V> {
    state: Arc<Mutex<State<K, V>>>,
    config: QueryConfig,
}

impl<K, V> Clone for QueryCache<K, V> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            config: self.config,
        }
    }
}

impl<K, V> QueryCache<K, V>
where
    K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    pub fn new(config: QueryConfig) -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                entries: HashMap::new(),
                in_flight: HashMap::new(),
                failures: HashMap::new(),
                next_id: 0,
            })),
            config,
        }
    }

    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    /// Return the value for `key`, fetching it if needed.
    ///
    /// `fetch` is only called when no fetch for `key` is in flight. It is
    /// called with the cache locked and must only build the future; the
    /// future itself runs on a spawned task.
    pub async fn get_or_fetch<F, Fut>(&self, key: K, fetch: F) -> QueryResult<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, QueryError>> + Send + 'static,
    {
        let pending = {
            let mut state = self.lock();
            match self.lookup(&state, &key) {
                Lookup::Fresh(value) => {
                    tracing::debug!(key = ?key, "Cache hit");
                    return Ok(value);
                }
                Lookup::Stale(value) => {
                    tracing::debug!(key = ?key, "Serving stale value while revalidating");
                    let (pending, started) = self.start_fetch(&mut state, key.clone(), fetch);
                    if started {
                        self.watch(key, pending, "Background refresh failed");
                    }
                    return Ok(value);
                }
                Lookup::Missing => self.start_fetch(&mut state, key, fetch).0,
            }
        };
        pending.await
    }

    /// Warm `key` in the background.
    ///
    /// Does nothing for fresh values and joins a fetch already in flight.
    /// Failures are logged, not returned. Returns `false` when the value was
    /// fresh and no fetch was started or joined.
    pub fn prefetch<F, Fut>(&self, key: K, fetch: F) -> bool
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, QueryError>> + Send + 'static,
    {
        let pending = {
            let mut state = self.lock();
            if let Lookup::Fresh(_) = self.lookup(&state, &key) {
                tracing::debug!(key = ?key, "Prefetch skipped, value is fresh");
                return false;
            }
            let (pending, started) = self.start_fetch(&mut state, key.clone(), fetch);
            if !started {
                return true;
            }
            pending
        };
        self.watch(key, pending, "Prefetch failed");
        true
    }

    /// The cached value regardless of freshness.
    pub fn peek(&self, key: &K) -> Option<Arc<V>> {
        self.lock().entries.get(key).map(|e| Arc::clone(&e.value))
    }

    /// Whether a value is cached, fresh or stale. A cached key can be read
    /// without waiting on the network.
    pub fn is_cached(&self, key: &K) -> bool {
        self.lock().entries.contains_key(key)
    }

    pub fn status(&self, key: &K) -> QueryStatus {
        let state = self.lock();
        if state.in_flight.contains_key(key) {
            return QueryStatus::Fetching;
        }
        match self.lookup(&state, key) {
            Lookup::Fresh(_) => QueryStatus::Fresh,
            Lookup::Stale(_) => QueryStatus::Stale,
            Lookup::Missing => match state.failures.get(key) {
                Some(err) => QueryStatus::Failed(err.clone()),
                None => QueryStatus::Missing,
            },
        }
    }

    /// Drop the value for `key` and detach its in-flight fetch. Returns
    /// `true` if there was anything to drop.
    pub fn invalidate(&self, key: &K) -> bool {
        let mut state = self.lock();
        let removed = state.entries.remove(key).is_some();
        let detached = state.in_flight.remove(key).is_some();
        state.failures.remove(key);
        if removed || detached {
            tracing::debug!(key = ?key, detached, "Invalidated query");
        }
        removed || detached
    }

    /// Invalidate every key matching `predicate`. Returns how many keys were
    /// affected.
    pub fn invalidate_where<P>(&self, predicate: P) -> usize
    where
        P: Fn(&K) -> bool,
    {
        let mut state = self.lock();
        let keys: HashSet<K> = state
            .entries
            .keys()
            .chain(state.in_flight.keys())
            .chain(state.failures.keys())
            .filter(|k| predicate(k))
            .cloned()
            .collect();
        for key in &keys {
            state.entries.remove(key);
            state.in_flight.remove(key);
            state.failures.remove(key);
        }
        if !keys.is_empty() {
            tracing::debug!(count = keys.len(), "Invalidated queries");
        }
        keys.len()
    }

    /// Invalidate everything.
    pub fn clear(&self) -> usize {
        self.invalidate_where(|_| true)
    }

    // ---- private helpers ----

    fn lock(&self) -> MutexGuard<'_, State<K, V>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lookup(&self, state: &State<K, V>, key: &K) -> Lookup<V> {
        match state.entries.get(key) {
            Some(entry) if entry.fetched_at.elapsed() < self.config.stale_time => {
                Lookup::Fresh(Arc::clone(&entry.value))
            }
            Some(entry) => Lookup::Stale(Arc::clone(&entry.value)),
            None => Lookup::Missing,
        }
    }

    /// Join the in-flight fetch for `key` or spawn a new one. The flag is
    /// `true` when a new fetch was spawned.
    fn start_fetch<F, Fut>(
        &self,
        state: &mut State<K, V>,
        key: K,
        fetch: F,
    ) -> (SharedFetch<V>, bool)
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, QueryError>> + Send + 'static,
    {
        if let Some(in_flight) = state.in_flight.get(&key) {
            tracing::debug!(key = ?key, "Joining in-flight fetch");
            return (in_flight.future.clone(), false);
        }

        state.next_id += 1;
        let id = state.next_id;
        let timeout = self.config.fetch_timeout;
        let fetch_future = fetch();
        let cache = self.clone();
        let task_key = key.clone();

        let handle = tokio::spawn(async move {
            let started = Instant::now();
            let outcome =
                tokio::time::timeout(timeout, AssertUnwindSafe(fetch_future).catch_unwind()).await;
            let result = match outcome {
                Ok(Ok(result)) => result.map(Arc::new),
                Ok(Err(_)) => Err(QueryError::Core(CoreError::Internal(
                    "Query fetch panicked".to_string(),
                ))),
                Err(_) => Err(QueryError::Timeout(timeout)),
            };
            cache.settle(&task_key, id, &result, started);
            result
        });

        let future = async move {
            handle.await.unwrap_or_else(|e| {
                Err(QueryError::Core(CoreError::Internal(format!(
                    "Query fetch task failed: {e}"
                ))))
            })
        }
        .boxed()
        .shared();

        tracing::debug!(key = ?key, "Cache miss, fetching");
        state.in_flight.insert(
            key,
            InFlight {
                id,
                future: future.clone(),
            },
        );
        (future, true)
    }

    /// Record the outcome of fetch `id`, unless it was detached.
    fn settle(&self, key: &K, id: u64, result: &QueryResult<V>, started: Instant) {
        let elapsed_ms = started.elapsed().as_millis() as u64;
        let mut state = self.lock();
        if state.in_flight.get(key).map(|f| f.id) != Some(id) {
            tracing::debug!(key = ?key, elapsed_ms, "Discarding result of detached fetch");
            return;
        }
        state.in_flight.remove(key);
        match result {
            Ok(value) => {
                state.failures.remove(key);
                state.entries.insert(
                    key.clone(),
                    Entry {
                        value: Arc::clone(value),
                        fetched_at: Instant::now(),
                    },
                );
                tracing::debug!(key = ?key, elapsed_ms, "Stored fetch result");
            }
            Err(err) => {
                state.failures.insert(key.clone(), err.clone());
                tracing::debug!(key = ?key, elapsed_ms, error = %err, "Fetch failed");
            }
        }
    }

    /// Log the failure of a fetch nobody is awaiting.
    fn watch(&self, key: K, pending: SharedFetch<V>, message: &'static str) {
        tokio::spawn(async move {
            if let Err(err) = pending.await {
                tracing::warn!(key = ?key, error = %err, "{}", message);
            }
        });
    }
}
