use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    time::SystemTime,
};

use axum::body::Bytes;
use parking_lot::Mutex;
use tracing::{debug, info};

use crate::config::CacheConfig;

/// Share of `max_items` removed by one eviction pass, as `1 / EVICT_DIVISOR`
const EVICT_DIVISOR: usize = 5;

/// A cached file body and the disk metadata it was read with
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub content: Bytes,
    pub modified: SystemTime,
    pub size: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessStats {
    pub access_count: u64,
    pub last_accessed: SystemTime,
    pub size: u64,
}

/// Entry and stats always live and die together
#[derive(Debug)]
struct Slot {
    entry: CacheEntry,
    stats: AccessStats,
    /// Insertion order, breaks access count ties during eviction
    seq: u64,
}

#[derive(Debug, Default)]
struct State {
    slots: HashMap<PathBuf, Slot>,
    next_seq: u64,
}

/// Bounded file cache keyed by absolute path
///
/// Eviction is frequency based: once the store holds `max_items` entries the
/// next insert first drops the `max_items / 5` least accessed entries, oldest
/// insert first among equal counts.
///
/// Every operation holds one lock for its whole duration, so an eviction and
/// the insert that triggered it are atomic to other callers.
#[derive(Debug)]
pub struct CacheStore {
    max_items: usize,
    max_file_size: u64,
    state: Mutex<State>,
}

impl CacheStore {
    pub fn new(max_items: usize, max_file_size: u64) -> Self {
        Self {
            max_items,
            max_file_size,
            state: Mutex::new(State::default()),
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.max_items, config.max_file_size)
    }

    pub fn max_items(&self) -> usize {
        self.max_items
    }

    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    /// Look up a cached file, counting the access on hit
    pub fn get(&self, key: &Path) -> Option<CacheEntry> {
        let mut state = self.state.lock();
        let slot = state.slots.get_mut(key)?;
        slot.stats.access_count += 1;
        slot.stats.last_accessed = SystemTime::now();
        Some(slot.entry.clone())
    }

    /// Insert or replace a cached file
    ///
    /// Returns `false` when the content is over the size limit or the store is
    /// full and eviction could not free a slot.
    pub fn put(&self, key: PathBuf, content: Bytes, modified: SystemTime) -> bool {
        let size = content.len() as u64;
        if size > self.max_file_size {
            debug!("skip caching {:?}: {} bytes over limit", key, size);
            return false;
        }

        let mut state = self.state.lock();
        if state.slots.len() >= self.max_items {
            let removed = Self::evict_locked(&mut state, self.max_items);
            info!("[CACHE FULL] evicted {} entries", removed);
            if state.slots.len() >= self.max_items && !state.slots.contains_key(&key) {
                debug!("skip caching {:?}: store is full", key);
                return false;
            }
        }

        let seq = state.next_seq;
        state.next_seq += 1;
        let slot = Slot {
            entry: CacheEntry {
                content,
                modified,
                size,
            },
            stats: AccessStats {
                access_count: 1,
                last_accessed: SystemTime::now(),
                size,
            },
            seq,
        };
        state.slots.insert(key, slot);
        true
    }

    /// Drop the least accessed entries, returns how many were removed
    pub fn evict(&self) -> usize {
        let mut state = self.state.lock();
        Self::evict_locked(&mut state, self.max_items)
    }

    fn evict_locked(state: &mut State, max_items: usize) -> usize {
        let quota = max_items / EVICT_DIVISOR;
        if quota == 0 || state.slots.is_empty() {
            return 0;
        }

        let mut ranked = state
            .slots
            .iter()
            .map(|(key, slot)| (slot.stats.access_count, slot.seq, key.clone()))
            .collect::<Vec<_>>();
        ranked.sort_unstable_by_key(|(count, seq, _)| (*count, *seq));

        let mut removed = 0;
        for (_, _, key) in ranked.into_iter().take(quota) {
            debug!("evict {:?}", key);
            state.slots.remove(&key);
            removed += 1;
        }
        removed
    }

    pub fn remove(&self, key: &Path) -> Option<CacheEntry> {
        self.state.lock().slots.remove(key).map(|slot| slot.entry)
    }

    /// Access stats of one entry, does not count as an access
    pub fn stats(&self, key: &Path) -> Option<AccessStats> {
        self.state.lock().slots.get(key).map(|slot| slot.stats)
    }

    pub fn contains(&self, key: &Path) -> bool {
        self.state.lock().slots.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.state.lock().slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().slots.is_empty()
    }

    pub fn clear(&self) {
        self.state.lock().slots.clear();
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, thread, time::Duration};

    use super::*;

    fn key(name: &str) -> PathBuf {
        PathBuf::from(format!("/srv/www/{name}"))
    }

    fn content(body: &str) -> Bytes {
        Bytes::copy_from_slice(body.as_bytes())
    }

    #[test]
    fn test_put_then_get() {
        let store = CacheStore::new(10, 1024);
        let modified = SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        assert!(store.put(key("index.html"), content("<h1>hi</h1>"), modified));

        let entry = store.get(&key("index.html")).unwrap();
        assert_eq!(entry.content, content("<h1>hi</h1>"));
        assert_eq!(entry.modified, modified);
        assert_eq!(entry.size, 11);
    }

    #[test]
    fn test_get_counts_access() {
        let store = CacheStore::new(10, 1024);
        store.put(key("a.css"), content("a"), SystemTime::now());
        assert_eq!(store.stats(&key("a.css")).unwrap().access_count, 1);

        let before = store.stats(&key("a.css")).unwrap().last_accessed;
        store.get(&key("a.css"));
        store.get(&key("a.css"));
        let stats = store.stats(&key("a.css")).unwrap();
        assert_eq!(stats.access_count, 3);
        assert_eq!(stats.size, 1);
        assert!(stats.last_accessed >= before);
    }

    #[test]
    fn test_get_miss() {
        let store = CacheStore::new(10, 1024);
        assert!(store.get(&key("missing.js")).is_none());
        assert!(store.stats(&key("missing.js")).is_none());
    }

    #[test]
    fn test_oversized_content_rejected() {
        let store = CacheStore::new(10, 4);
        assert!(!store.put(key("big.bin"), content("12345"), SystemTime::now()));
        assert!(store.get(&key("big.bin")).is_none());
        assert!(store.is_empty());

        // exactly at the limit is fine
        assert!(store.put(key("ok.bin"), content("1234"), SystemTime::now()));
        assert!(store.contains(&key("ok.bin")));
    }

    #[test]
    fn test_eleventh_insert_evicts_two() {
        let store = CacheStore::new(10, 1024);
        for i in 0..10 {
            store.put(key(&format!("{i}.txt")), content("x"), SystemTime::now());
        }
        // everything but 3.txt and 7.txt gets an extra hit
        for i in (0..10).filter(|i| *i != 3 && *i != 7) {
            store.get(&key(&format!("{i}.txt")));
        }
        assert_eq!(store.len(), 10);

        assert!(store.put(key("10.txt"), content("x"), SystemTime::now()));
        assert_eq!(store.len(), 9);
        assert!(!store.contains(&key("3.txt")));
        assert!(!store.contains(&key("7.txt")));
        assert!(store.contains(&key("10.txt")));
        assert_eq!(store.stats(&key("10.txt")).unwrap().access_count, 1);
    }

    #[test]
    fn test_eviction_ties_follow_insertion_order() {
        let store = CacheStore::new(10, 1024);
        for i in 0..10 {
            store.put(key(&format!("{i}.txt")), content("x"), SystemTime::now());
        }
        assert_eq!(store.evict(), 2);
        assert!(!store.contains(&key("0.txt")));
        assert!(!store.contains(&key("1.txt")));
        assert!(store.contains(&key("2.txt")));
    }

    #[test]
    fn test_size_stays_bounded() {
        let store = CacheStore::new(10, 1024);
        for i in 0..100 {
            store.put(key(&format!("{i}.txt")), content("x"), SystemTime::now());
            assert!(store.len() <= 10);
        }
    }

    #[test]
    fn test_evict_fewer_than_quota() {
        let store = CacheStore::new(10, 1024);
        store.put(key("only.txt"), content("x"), SystemTime::now());
        assert_eq!(store.evict(), 1);
        assert!(store.is_empty());
        assert_eq!(store.evict(), 0);
    }

    #[test]
    fn test_small_capacity_removes_nothing() {
        let store = CacheStore::new(3, 1024);
        for name in ["a", "b", "c"] {
            assert!(store.put(key(name), content("x"), SystemTime::now()));
        }
        assert_eq!(store.evict(), 0);

        // full and nothing can be evicted, new keys are not cached
        assert!(!store.put(key("d"), content("x"), SystemTime::now()));
        assert_eq!(store.len(), 3);
        assert!(!store.contains(&key("d")));
    }

    #[test]
    fn test_zero_capacity_caches_nothing() {
        let store = CacheStore::new(0, 1024);
        assert!(!store.put(key("a"), content("x"), SystemTime::now()));
        assert!(store.is_empty());
    }

    #[test]
    fn test_replace_resets_stats() {
        let store = CacheStore::new(10, 1024);
        let old = SystemTime::UNIX_EPOCH;
        let new = SystemTime::UNIX_EPOCH + Duration::from_secs(60);
        store.put(key("app.js"), content("v1"), old);
        store.get(&key("app.js"));

        assert!(store.put(key("app.js"), content("v2!"), new));
        assert_eq!(store.len(), 1);
        let stats = store.stats(&key("app.js")).unwrap();
        assert_eq!(stats.access_count, 1);
        assert_eq!(stats.size, 3);
        let entry = store.get(&key("app.js")).unwrap();
        assert_eq!(entry.content, content("v2!"));
        assert_eq!(entry.modified, new);
    }

    #[test]
    fn test_remove_and_clear() {
        let store = CacheStore::new(10, 1024);
        store.put(key("a"), content("x"), SystemTime::now());
        store.put(key("b"), content("y"), SystemTime::now());

        assert!(store.remove(&key("a")).is_some());
        assert!(store.remove(&key("a")).is_none());
        assert!(store.stats(&key("a")).is_none());
        assert_eq!(store.len(), 1);

        store.clear();
        assert!(store.is_empty());
    }

    #[test]
    fn test_concurrent_inserts_stay_bounded() {
        let store = Arc::new(CacheStore::new(20, 1024));
        let handles = (0..8)
            .map(|t| {
                let store = store.clone();
                thread::spawn(move || {
                    for i in 0..200 {
                        let name = format!("{t}-{i}.txt");
                        store.put(key(&name), content("x"), SystemTime::now());
                        store.get(&key(&name));
                        assert!(store.len() <= 20);
                    }
                })
            })
            .collect::<Vec<_>>();
        for handle in handles {
            handle.join().unwrap();
        }
        assert!(store.len() <= 20);
    }
}
