use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::clock::Clock;
use crate::domain::supplier::Coordinate;

/// Coordinates are rounded to this many decimals before keying, so requests
/// from effectively the same point share a cache entry.
pub const FINGERPRINT_COORDINATE_DECIMALS: usize = 4;

pub const DEFAULT_CACHE_TTL_HOURS: i64 = 24;

/// Deterministic cache key derived from result-affecting request parameters
/// only — never from request ids or timestamps.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Collects request parameters and digests them into a [`Fingerprint`].
///
/// Parameters are serialized sorted by key (the map is ordered), hashed with
/// SHA-256, and truncated to 16 hex characters.
#[derive(Clone, Debug)]
pub struct FingerprintBuilder {
    params: BTreeMap<String, String>,
}

impl FingerprintBuilder {
    pub fn new(operation: &str) -> Self {
        let mut params = BTreeMap::new();
        params.insert("operation".to_owned(), operation.to_owned());
        Self { params }
    }

    pub fn field(mut self, key: &str, value: impl ToString) -> Self {
        self.params.insert(key.to_owned(), value.to_string());
        self
    }

    pub fn coordinate(self, key: &str, coordinate: Coordinate) -> Self {
        self.field(
            key,
            format!(
                "{:.prec$},{:.prec$}",
                coordinate.latitude,
                coordinate.longitude,
                prec = FINGERPRINT_COORDINATE_DECIMALS
            ),
        )
    }

    pub fn finish(self) -> Fingerprint {
        let canonical =
            serde_json::to_string(&self.params).expect("string map serializes infallibly");
        let digest = Sha256::digest(canonical.as_bytes());
        let hex: String = digest.iter().take(8).map(|byte| format!("{byte:02x}")).collect();
        Fingerprint(hex)
    }
}

/// Entry counts for health reporting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub total_entries: usize,
    pub active_entries: usize,
    pub expired_entries: usize,
}

impl CacheStats {
    pub fn merge(self, other: CacheStats) -> CacheStats {
        CacheStats {
            total_entries: self.total_entries + other.total_entries,
            active_entries: self.active_entries + other.active_entries,
            expired_entries: self.expired_entries + other.expired_entries,
        }
    }
}

/// Result of a cache-backed computation.
#[derive(Clone, Debug)]
pub struct CacheLookup<T> {
    pub payload: Arc<T>,
    pub cache_hit: bool,
    pub age_seconds: Option<u64>,
}

#[derive(Clone, Debug)]
struct CacheEntry<T> {
    payload: Arc<T>,
    created_at: DateTime<Utc>,
    ttl: Duration,
}

impl<T> CacheEntry<T> {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now - self.created_at >= self.ttl
    }

    fn age_seconds(&self, now: DateTime<Utc>) -> u64 {
        u64::try_from((now - self.created_at).num_seconds()).unwrap_or(0)
    }
}

#[derive(Debug)]
struct CacheState<T> {
    entries: HashMap<Fingerprint, CacheEntry<T>>,
    // Per-fingerprint computation gates for single-flight collapsing.
    inflight: HashMap<Fingerprint, Arc<Mutex<()>>>,
}

impl<T> Default for CacheState<T> {
    fn default() -> Self {
        Self { entries: HashMap::new(), inflight: HashMap::new() }
    }
}

/// Time-bounded response cache keyed on request fingerprints.
///
/// Expired entries are treated as misses and purged on the access that finds
/// them; `sweep_expired` exists for memory hygiene only. Concurrent writes to
/// one fingerprint are last-write-wins: recomputation is deterministic up to
/// quote jitter, and caching pre-jittered quotes deliberately makes the cache
/// the source of quote consistency within the TTL window.
pub struct ResponseCache<T> {
    clock: Arc<dyn Clock>,
    state: Mutex<CacheState<T>>,
}

impl<T> ResponseCache<T> {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock, state: Mutex::new(CacheState::default()) }
    }

    fn lock_state(&self) -> MutexGuard<'_, CacheState<T>> {
        match self.state.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn get(&self, fingerprint: &Fingerprint) -> Option<(Arc<T>, u64)> {
        let now = self.clock.now();
        let mut state = self.lock_state();

        let expired = match state.entries.get(fingerprint) {
            Some(entry) if entry.is_expired(now) => true,
            Some(entry) => return Some((Arc::clone(&entry.payload), entry.age_seconds(now))),
            None => return None,
        };
        if expired {
            state.entries.remove(fingerprint);
        }
        None
    }

    pub fn put(&self, fingerprint: Fingerprint, payload: T, ttl: Duration) {
        let now = self.clock.now();
        let mut state = self.lock_state();
        state
            .entries
            .insert(fingerprint, CacheEntry { payload: Arc::new(payload), created_at: now, ttl });
    }

    /// Serve `fingerprint` from cache or compute it exactly once.
    ///
    /// Concurrent misses on the same fingerprint collapse onto one
    /// computation: followers block on the per-fingerprint gate, then
    /// re-check the cache the leader has filled. Validation errors from
    /// `compute` are returned without caching, and no lock is held while
    /// computing.
    pub fn get_or_compute<F, E>(
        &self,
        fingerprint: Fingerprint,
        ttl: Duration,
        compute: F,
    ) -> Result<CacheLookup<T>, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        if let Some((payload, age_seconds)) = self.get(&fingerprint) {
            return Ok(CacheLookup { payload, cache_hit: true, age_seconds: Some(age_seconds) });
        }

        let gate = {
            let mut state = self.lock_state();
            Arc::clone(
                state
                    .inflight
                    .entry(fingerprint.clone())
                    .or_insert_with(|| Arc::new(Mutex::new(()))),
            )
        };
        let _guard = match gate.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        // The previous gate holder may have filled the entry while we waited.
        if let Some((payload, age_seconds)) = self.get(&fingerprint) {
            let mut state = self.lock_state();
            state.inflight.remove(&fingerprint);
            return Ok(CacheLookup { payload, cache_hit: true, age_seconds: Some(age_seconds) });
        }

        match compute() {
            Ok(payload) => {
                let payload = Arc::new(payload);
                let now = self.clock.now();
                let mut state = self.lock_state();
                state.entries.insert(
                    fingerprint.clone(),
                    CacheEntry { payload: Arc::clone(&payload), created_at: now, ttl },
                );
                state.inflight.remove(&fingerprint);
                Ok(CacheLookup { payload, cache_hit: false, age_seconds: None })
            }
            Err(error) => {
                let mut state = self.lock_state();
                state.inflight.remove(&fingerprint);
                Err(error)
            }
        }
    }

    /// Drop every expired entry, returning how many were removed.
    pub fn sweep_expired(&self) -> usize {
        let now = self.clock.now();
        let mut state = self.lock_state();
        let before = state.entries.len();
        state.entries.retain(|_, entry| !entry.is_expired(now));
        before - state.entries.len()
    }

    pub fn stats(&self) -> CacheStats {
        let now = self.clock.now();
        let state = self.lock_state();
        let total_entries = state.entries.len();
        let expired_entries =
            state.entries.values().filter(|entry| entry.is_expired(now)).count();
        CacheStats {
            total_entries,
            active_entries: total_entries - expired_entries,
            expired_entries,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use chrono::{Duration, TimeZone, Utc};

    use crate::clock::ManualClock;
    use crate::domain::supplier::Coordinate;
    use crate::errors::MatchError;

    use super::{FingerprintBuilder, ResponseCache};

    fn manual_clock() -> ManualClock {
        ManualClock::new(Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap())
    }

    fn fingerprint(tag: &str) -> super::Fingerprint {
        FingerprintBuilder::new("test").field("tag", tag).finish()
    }

    #[test]
    fn fingerprint_ignores_parameter_insertion_order() {
        let a = FingerprintBuilder::new("suppliers_search")
            .field("material", "cement")
            .field("qty", 50.0)
            .finish();
        let b = FingerprintBuilder::new("suppliers_search")
            .field("qty", 50.0)
            .field("material", "cement")
            .finish();
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), 16);
    }

    #[test]
    fn fingerprint_rounds_coordinates_to_four_decimals() {
        let a = FingerprintBuilder::new("route")
            .coordinate("origin", Coordinate::new(17.33521, 78.45374))
            .finish();
        let b = FingerprintBuilder::new("route")
            .coordinate("origin", Coordinate::new(17.33523, 78.45369))
            .finish();
        let c = FingerprintBuilder::new("route")
            .coordinate("origin", Coordinate::new(17.34, 78.45))
            .finish();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn fingerprint_distinguishes_operations_over_identical_parameters() {
        let search = FingerprintBuilder::new("suppliers_search").field("qty", 50.0).finish();
        let quote = FingerprintBuilder::new("supplier_quote").field("qty", 50.0).finish();
        assert_ne!(search, quote);
    }

    #[test]
    fn fresh_entry_hits_with_zero_age() {
        let clock = manual_clock();
        let cache: ResponseCache<String> = ResponseCache::new(Arc::new(clock));

        cache.put(fingerprint("a"), "payload".to_owned(), Duration::hours(24));
        let (payload, age_seconds) = cache.get(&fingerprint("a")).expect("fresh entry");
        assert_eq!(*payload, "payload");
        assert_eq!(age_seconds, 0);
    }

    #[test]
    fn entry_expires_after_its_ttl() {
        let clock = manual_clock();
        let cache: ResponseCache<String> = ResponseCache::new(Arc::new(clock.clone()));

        cache.put(fingerprint("a"), "payload".to_owned(), Duration::hours(24));

        clock.advance(Duration::hours(23));
        let (_, age_seconds) = cache.get(&fingerprint("a")).expect("still live");
        assert_eq!(age_seconds, 23 * 3600);

        clock.advance(Duration::hours(1));
        assert!(cache.get(&fingerprint("a")).is_none(), "entry at exactly its ttl is stale");
        assert_eq!(cache.stats().total_entries, 0, "expired entry purged on access");
    }

    #[test]
    fn get_or_compute_fills_then_serves_from_cache() {
        let clock = manual_clock();
        let cache: ResponseCache<String> = ResponseCache::new(Arc::new(clock.clone()));
        let computations = AtomicUsize::new(0);

        let first = cache
            .get_or_compute::<_, MatchError>(fingerprint("a"), Duration::hours(24), || {
                computations.fetch_add(1, Ordering::SeqCst);
                Ok("payload".to_owned())
            })
            .expect("compute");
        assert!(!first.cache_hit);
        assert_eq!(first.age_seconds, None);

        clock.advance(Duration::seconds(90));
        let second = cache
            .get_or_compute::<_, MatchError>(fingerprint("a"), Duration::hours(24), || {
                computations.fetch_add(1, Ordering::SeqCst);
                Ok("recomputed".to_owned())
            })
            .expect("hit");
        assert!(second.cache_hit);
        assert_eq!(second.age_seconds, Some(90));
        assert_eq!(*second.payload, "payload");
        assert_eq!(computations.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failed_computation_is_not_cached() {
        let clock = manual_clock();
        let cache: ResponseCache<String> = ResponseCache::new(Arc::new(clock));

        let error = cache
            .get_or_compute(fingerprint("a"), Duration::hours(24), || {
                Err::<String, _>(MatchError::InvalidQuantity(-1.0))
            })
            .expect_err("propagates");
        assert_eq!(error, MatchError::InvalidQuantity(-1.0));
        assert_eq!(cache.stats().total_entries, 0);

        let retry = cache
            .get_or_compute::<_, MatchError>(fingerprint("a"), Duration::hours(24), || {
                Ok("payload".to_owned())
            })
            .expect("retry succeeds");
        assert!(!retry.cache_hit);
    }

    #[test]
    fn concurrent_identical_misses_compute_once() {
        let clock = manual_clock();
        let cache: Arc<ResponseCache<String>> = Arc::new(ResponseCache::new(Arc::new(clock)));
        let computations = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let computations = Arc::clone(&computations);
                std::thread::spawn(move || {
                    cache
                        .get_or_compute::<_, MatchError>(
                            fingerprint("shared"),
                            Duration::hours(24),
                            || {
                                computations.fetch_add(1, Ordering::SeqCst);
                                Ok("payload".to_owned())
                            },
                        )
                        .expect("compute")
                })
            })
            .collect();

        for handle in handles {
            let lookup = handle.join().expect("thread");
            assert_eq!(*lookup.payload, "payload");
        }
        assert_eq!(computations.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn sweep_removes_only_expired_entries() {
        let clock = manual_clock();
        let cache: ResponseCache<String> = ResponseCache::new(Arc::new(clock.clone()));

        cache.put(fingerprint("short"), "a".to_owned(), Duration::hours(1));
        cache.put(fingerprint("long"), "b".to_owned(), Duration::hours(48));

        clock.advance(Duration::hours(2));
        let stats = cache.stats();
        assert_eq!(stats.total_entries, 2);
        assert_eq!(stats.active_entries, 1);
        assert_eq!(stats.expired_entries, 1);

        assert_eq!(cache.sweep_expired(), 1);
        assert_eq!(cache.stats().total_entries, 1);
        assert!(cache.get(&fingerprint("long")).is_some());
    }
}
