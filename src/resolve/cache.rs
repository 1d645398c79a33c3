//! TTL cache in front of a record lookup

use moka::sync::Cache;
use std::hash::Hash;
use std::time::Duration;

use super::{Actor, RecordLookup};

/// Caches user, pool and set ids and wildcard matches
///
/// Misses are cached too, so a name that resolves to nothing is looked up
/// once per TTL.
pub struct CachedLookup<L> {
    inner: L,
    users: Cache<String, Option<i64>>,
    pools: Cache<String, Option<i64>>,
    sets: Cache<String, Option<(i64, bool)>>,
    wildcards: Cache<(String, usize), Vec<String>>,
}

impl<L: RecordLookup> CachedLookup<L> {
    #[must_use]
    pub fn new(inner: L) -> Self {
        Self::with_cache_config(inner, Duration::from_secs(300), 1000)
    }

    /// Create a cached lookup with custom cache configuration
    ///
    /// # Arguments
    ///
    /// * `inner` - Lookup to cache
    /// * `ttl` - Time-to-live for cache entries
    /// * `max_capacity` - Maximum entries per cache
    #[must_use]
    pub fn with_cache_config(inner: L, ttl: Duration, max_capacity: u64) -> Self {
        Self {
            inner,
            users: build_cache(ttl, max_capacity),
            pools: build_cache(ttl, max_capacity),
            sets: build_cache(ttl, max_capacity),
            wildcards: build_cache(ttl, max_capacity),
        }
    }

    #[must_use]
    pub const fn inner(&self) -> &L {
        &self.inner
    }

    pub fn clear_cache(&self) {
        self.users.invalidate_all();
        self.pools.invalidate_all();
        self.sets.invalidate_all();
        self.wildcards.invalidate_all();
    }
}

fn build_cache<K, V>(ttl: Duration, max_capacity: u64) -> Cache<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    Cache::builder()
        .time_to_live(ttl)
        .max_capacity(max_capacity)
        .build()
}

impl<L: RecordLookup> RecordLookup for CachedLookup<L> {
    fn lookup_user_id(&self, name: &str) -> Option<i64> {
        self.users
            .get_with(name.to_lowercase(), || self.inner.lookup_user_id(name))
    }

    fn lookup_pool_id(&self, name: &str) -> Option<i64> {
        self.pools
            .get_with(name.to_lowercase(), || self.inner.lookup_pool_id(name))
    }

    fn lookup_set_id(&self, name: &str) -> Option<(i64, bool)> {
        self.sets
            .get_with(name.to_lowercase(), || self.inner.lookup_set_id(name))
    }

    fn wildcard_tag_matches(&self, pattern: &str, limit: usize) -> Vec<String> {
        self.wildcards.get_with((pattern.to_string(), limit), || {
            self.inner.wildcard_tag_matches(pattern, limit)
        })
    }

    fn favorites_hidden(&self, user_id: i64) -> bool {
        self.inner.favorites_hidden(user_id)
    }

    fn actor(&self) -> Actor {
        self.inner.actor()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingLookup {
        calls: AtomicUsize,
    }

    impl RecordLookup for CountingLookup {
        fn lookup_user_id(&self, name: &str) -> Option<i64> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            (name.eq_ignore_ascii_case("alice")).then_some(1)
        }

        fn lookup_pool_id(&self, _name: &str) -> Option<i64> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            None
        }

        fn lookup_set_id(&self, _name: &str) -> Option<(i64, bool)> {
            None
        }

        fn wildcard_tag_matches(&self, _pattern: &str, _limit: usize) -> Vec<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            vec!["cat".to_string()]
        }
    }

    #[test]
    fn test_hits_are_cached() {
        let cached = CachedLookup::new(CountingLookup::default());
        assert_eq!(cached.lookup_user_id("alice"), Some(1));
        assert_eq!(cached.lookup_user_id("Alice"), Some(1));
        assert_eq!(cached.inner().calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_misses_are_cached() {
        let cached = CachedLookup::new(CountingLookup::default());
        assert_eq!(cached.lookup_pool_id("nothing"), None);
        assert_eq!(cached.lookup_pool_id("nothing"), None);
        assert_eq!(cached.inner().calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_wildcards_keyed_by_limit() {
        let cached = CachedLookup::new(CountingLookup::default());
        cached.wildcard_tag_matches("ca*", 10);
        cached.wildcard_tag_matches("ca*", 10);
        cached.wildcard_tag_matches("ca*", 5);
        assert_eq!(cached.inner().calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_clear_cache() {
        let cached = CachedLookup::new(CountingLookup::default());
        cached.lookup_user_id("alice");
        cached.clear_cache();
        cached.lookup_user_id("alice");
        assert_eq!(cached.inner().calls.load(Ordering::SeqCst), 2);
    }
}
