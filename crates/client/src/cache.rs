//! Read-through query cache.
//!
//! Each read is keyed by resource type and identifying parameters. Entries go
//! stale after a per-resource window; concurrent reads of one key share a
//! single fetch; writes invalidate the keys they affect.
//!
//! The cache is in-memory and starts empty on every launch.

use log::{debug, warn};
use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::error::Result;

/// Identifies one cached read.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    Portfolios {
        user_id: String,
    },
    Portfolio {
        user_id: String,
        portfolio_id: String,
    },
    DefaultPortfolio {
        user_id: String,
    },
    Holdings {
        user_id: String,
        portfolio_id: String,
    },
    Holding {
        user_id: String,
        portfolio_id: String,
        holding_id: String,
    },
    Transactions {
        user_id: String,
        portfolio_id: String,
        holding_id: String,
    },
    SecuritySearch {
        query: String,
    },
}

impl QueryKey {
    /// Whether the key belongs to the given portfolio (its detail or any child).
    pub fn belongs_to_portfolio(&self, portfolio: &str) -> bool {
        match self {
            QueryKey::Portfolio { portfolio_id, .. }
            | QueryKey::Holdings { portfolio_id, .. }
            | QueryKey::Holding { portfolio_id, .. }
            | QueryKey::Transactions { portfolio_id, .. } => portfolio_id == portfolio,
            _ => false,
        }
    }

    /// Whether the key belongs to the given holding (its detail or transactions).
    pub fn belongs_to_holding(&self, holding: &str) -> bool {
        match self {
            QueryKey::Holding { holding_id, .. } | QueryKey::Transactions { holding_id, .. } => {
                holding_id == holding
            }
            _ => false,
        }
    }
}

/// How long each kind of read stays fresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaleTimes {
    pub portfolios: Duration,
    pub default_portfolio: Duration,
    pub holdings: Duration,
    pub transactions: Duration,
    pub security_search: Duration,
}

impl Default for StaleTimes {
    fn default() -> Self {
        Self {
            portfolios: Duration::from_secs(5 * 60),
            default_portfolio: Duration::from_secs(5 * 60),
            holdings: Duration::from_secs(60),
            transactions: Duration::from_secs(2 * 60),
            security_search: Duration::from_secs(10 * 60),
        }
    }
}

impl StaleTimes {
    pub fn for_key(&self, key: &QueryKey) -> Duration {
        match key {
            QueryKey::Portfolios { .. } | QueryKey::Portfolio { .. } => self.portfolios,
            QueryKey::DefaultPortfolio { .. } => self.default_portfolio,
            QueryKey::Holdings { .. } | QueryKey::Holding { .. } => self.holdings,
            QueryKey::Transactions { .. } => self.transactions,
            QueryKey::SecuritySearch { .. } => self.security_search,
        }
    }
}

type CachedValue = Arc<dyn Any + Send + Sync>;

struct CacheEntry {
    value: CachedValue,
    fetched_at: Instant,
}

/// Per-key state. Slots are never removed so the gate and generation survive
/// invalidation.
struct Slot {
    entry: Option<CacheEntry>,
    /// Bumped on every invalidation; a fetch started under an older generation
    /// is not written back.
    generation: u64,
    /// Held for the duration of a fetch so concurrent readers wait for it.
    gate: Arc<tokio::sync::Mutex<()>>,
}

impl Slot {
    fn new() -> Self {
        Self {
            entry: None,
            generation: 0,
            gate: Arc::new(tokio::sync::Mutex::new(())),
        }
    }

    fn fresh<T: Clone + Send + Sync + 'static>(&self, stale_after: Duration) -> Option<T> {
        let entry = self.entry.as_ref()?;
        if entry.fetched_at.elapsed() >= stale_after {
            return None;
        }
        match entry.value.clone().downcast::<T>() {
            Ok(value) => Some((*value).clone()),
            Err(_) => {
                warn!("[QueryCache] Cached value has an unexpected type, refetching");
                None
            }
        }
    }
}

pub struct QueryCache {
    slots: Mutex<HashMap<QueryKey, Slot>>,
    stale_times: StaleTimes,
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(StaleTimes::default())
    }
}

impl QueryCache {
    pub fn new(stale_times: StaleTimes) -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
            stale_times,
        }
    }

    pub fn stale_times(&self) -> &StaleTimes {
        &self.stale_times
    }

    /// Lock the slot map, recovering from poison if necessary.
    ///
    /// A poisoned map at worst holds an entry that is refetched later.
    fn lock_slots(&self) -> MutexGuard<'_, HashMap<QueryKey, Slot>> {
        self.slots.lock().unwrap_or_else(|poisoned| {
            warn!("[QueryCache] Slot map mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Returns the cached value for `key`, or runs `fetcher` and caches its result.
    ///
    /// Concurrent calls for the same key run `fetcher` once; the others wait
    /// and read the stored value. Failures are not cached.
    pub async fn fetch<T, F, Fut>(&self, key: QueryKey, fetcher: F) -> Result<T>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let stale_after = self.stale_times.for_key(&key);

        let gate = {
            let mut slots = self.lock_slots();
            let slot = slots.entry(key.clone()).or_insert_with(Slot::new);
            if let Some(value) = slot.fresh::<T>(stale_after) {
                debug!("[QueryCache] Hit {:?}", key);
                return Ok(value);
            }
            slot.gate.clone()
        };

        let _in_flight = gate.lock().await;

        let generation = {
            let mut slots = self.lock_slots();
            let slot = slots.entry(key.clone()).or_insert_with(Slot::new);
            // Another caller may have filled the slot while we waited
            if let Some(value) = slot.fresh::<T>(stale_after) {
                debug!("[QueryCache] Shared in-flight result for {:?}", key);
                return Ok(value);
            }
            slot.generation
        };

        debug!("[QueryCache] Miss {:?}, fetching", key);
        let value = fetcher().await?;

        let mut slots = self.lock_slots();
        let slot = slots.entry(key.clone()).or_insert_with(Slot::new);
        if slot.generation == generation {
            slot.entry = Some(CacheEntry {
                value: Arc::new(value.clone()),
                fetched_at: Instant::now(),
            });
        } else {
            debug!(
                "[QueryCache] {:?} was invalidated during fetch, result not cached",
                key
            );
        }
        Ok(value)
    }

    pub fn invalidate(&self, key: &QueryKey) {
        if let Some(slot) = self.lock_slots().get_mut(key) {
            debug!("[QueryCache] Invalidate {:?}", key);
            slot.entry = None;
            slot.generation += 1;
        }
    }

    pub fn invalidate_where<P>(&self, predicate: P)
    where
        P: Fn(&QueryKey) -> bool,
    {
        let mut slots = self.lock_slots();
        let mut count = 0usize;
        for (key, slot) in slots.iter_mut() {
            if predicate(key) {
                slot.entry = None;
                slot.generation += 1;
                count += 1;
            }
        }
        debug!("[QueryCache] Invalidated {} keys", count);
    }

    /// Drops every cached value, e.g. when the signed-in user changes.
    pub fn clear(&self) {
        self.invalidate_where(|_| true);
    }

    pub fn is_cached(&self, key: &QueryKey) -> bool {
        let stale_after = self.stale_times.for_key(key);
        self.lock_slots()
            .get(key)
            .and_then(|slot| slot.entry.as_ref())
            .map(|entry| entry.fetched_at.elapsed() < stale_after)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn holdings_key() -> QueryKey {
        QueryKey::Holdings {
            user_id: "u1".to_string(),
            portfolio_id: "p1".to_string(),
        }
    }

    #[tokio::test]
    async fn test_fresh_value_is_served_from_cache() {
        let cache = QueryCache::default();
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let value: Vec<u32> = cache
                .fetch(holdings_key(), || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(vec![1, 2, 3])
                })
                .await
                .unwrap();
            assert_eq!(value, vec![1, 2, 3]);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_stale_value_is_refetched() {
        let cache = QueryCache::new(StaleTimes {
            holdings: Duration::ZERO,
            ..StaleTimes::default()
        });
        let calls = AtomicUsize::new(0);

        for _ in 0..2 {
            let _: u32 = cache
                .fetch(holdings_key(), || async {
                    Ok(calls.fetch_add(1, Ordering::SeqCst) as u32)
                })
                .await
                .unwrap();
        }
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_errors_are_not_cached() {
        let cache = QueryCache::default();

        let failed: Result<u32> = cache
            .fetch(holdings_key(), || async {
                Err(ApiError::Network("offline".to_string()))
            })
            .await;
        assert!(failed.is_err());
        assert!(!cache.is_cached(&holdings_key()));

        let value: u32 = cache
            .fetch(holdings_key(), || async { Ok(7) })
            .await
            .unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn test_concurrent_reads_share_one_fetch() {
        let cache = Arc::new(QueryCache::default());
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = cache.clone();
            let calls = calls.clone();
            handles.push(tokio::spawn(async move {
                cache
                    .fetch(holdings_key(), || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(50)).await;
                        Ok::<_, ApiError>("holdings".to_string())
                    })
                    .await
            }));
        }

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), "holdings");
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalidation_during_fetch_discards_result() {
        let cache = Arc::new(QueryCache::default());
        let (started_tx, started_rx) = tokio::sync::oneshot::channel::<()>();
        let (release_tx, release_rx) = tokio::sync::oneshot::channel::<()>();

        let fetching = {
            let cache = cache.clone();
            tokio::spawn(async move {
                cache
                    .fetch(holdings_key(), || async move {
                        let _ = started_tx.send(());
                        let _ = release_rx.await;
                        Ok::<_, ApiError>(1u32)
                    })
                    .await
            })
        };

        started_rx.await.unwrap();
        cache.invalidate(&holdings_key());
        release_tx.send(()).unwrap();

        // The superseded caller still gets its value
        assert_eq!(fetching.await.unwrap().unwrap(), 1);
        assert!(!cache.is_cached(&holdings_key()));

        let next: u32 = cache
            .fetch(holdings_key(), || async { Ok(2) })
            .await
            .unwrap();
        assert_eq!(next, 2);
    }

    #[tokio::test]
    async fn test_invalidate_where_matches_portfolio_children() {
        let cache = QueryCache::default();
        let transactions = QueryKey::Transactions {
            user_id: "u1".to_string(),
            portfolio_id: "p1".to_string(),
            holding_id: "h1".to_string(),
        };
        let other = QueryKey::Holdings {
            user_id: "u1".to_string(),
            portfolio_id: "p2".to_string(),
        };
        let seeded = [
            (holdings_key(), 1u32),
            (transactions.clone(), 2),
            (other.clone(), 3),
        ];
        for (key, value) in seeded {
            let _ = cache.fetch(key, || async move { Ok(value) }).await.unwrap();
        }

        cache.invalidate_where(|k| k.belongs_to_portfolio("p1"));

        assert!(!cache.is_cached(&holdings_key()));
        assert!(!cache.is_cached(&transactions));
        let kept: u32 = cache
            .fetch(other, || async { Ok(99) })
            .await
            .unwrap();
        assert_eq!(kept, 3);
    }

    #[tokio::test]
    async fn test_type_mismatch_is_a_miss() {
        let cache = QueryCache::default();
        let _ = cache
            .fetch(holdings_key(), || async { Ok("text".to_string()) })
            .await
            .unwrap();

        let number: u32 = cache
            .fetch(holdings_key(), || async { Ok(5) })
            .await
            .unwrap();
        assert_eq!(number, 5);
    }

    #[test]
    fn test_stale_times_per_resource() {
        let times = StaleTimes::default();
        assert_eq!(times.for_key(&holdings_key()), Duration::from_secs(60));
        assert_eq!(
            times.for_key(&QueryKey::SecuritySearch {
                query: "AA".to_string()
            }),
            Duration::from_secs(600)
        );
    }
}
