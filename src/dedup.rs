//! Bounded deduplication for the output stream
//!
//! The cache holds at most `capacity` candidates. When an insert pushes it
//! past that, the whole cache is dropped and starts over, so memory stays
//! flat on huge runs at the cost of letting some late duplicates through.

use ahash::RandomState;
use hashbrown::HashSet;

/// Counters for one deduplication pass
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DedupStats {
    pub unique: u64,
    pub duplicates: u64,
    /// Times the cache overflowed and was cleared
    pub clears: u64,
}

/// First-occurrence filter over the candidate stream
pub trait Deduplicator: Send {
    /// Returns true if the item has not been seen (and records it)
    fn insert(&mut self, item: &str) -> bool;

    fn contains(&self, item: &str) -> bool;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn clear(&mut self);

    fn stats(&self) -> DedupStats;

    /// Approximate memory usage in bytes
    fn memory_usage(&self) -> usize;
}

/// In-memory set with clear-on-overflow
pub struct BoundedDedupCache {
    set: HashSet<String, RandomState>,
    capacity: usize,
    stats: DedupStats,
}

impl BoundedDedupCache {
    /// Cache bounded at `capacity` entries. A capacity of 0 is treated as 1
    /// (the cache clears after every second distinct insert); the CLI rejects 0.
    pub fn new(capacity: usize) -> Self {
        Self {
            // don't reserve the full bound up front; most runs never reach it
            set: HashSet::with_capacity_and_hasher(capacity.min(1 << 16), RandomState::new()),
            capacity: capacity.max(1),
            stats: DedupStats::default(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Deduplicator for BoundedDedupCache {
    fn insert(&mut self, item: &str) -> bool {
        if self.set.contains(item) {
            self.stats.duplicates += 1;
            return false;
        }

        self.set.insert(item.to_string());
        self.stats.unique += 1;

        if self.set.len() > self.capacity {
            log::debug!("Dedup cache exceeded {} entries, clearing", self.capacity);
            self.set.clear();
            self.stats.clears += 1;
        }
        true
    }

    fn contains(&self, item: &str) -> bool {
        self.set.contains(item)
    }

    fn len(&self) -> usize {
        self.set.len()
    }

    fn clear(&mut self) {
        self.set.clear();
    }

    fn stats(&self) -> DedupStats {
        self.stats
    }

    fn memory_usage(&self) -> usize {
        // String overhead + content + table slot, roughly
        self.set.len() * 64 + self.set.capacity() * 8
    }
}

/// Pass-through deduplicator (for when dedup is disabled)
#[derive(Debug, Default)]
pub struct NoOpDeduplicator {
    stats: DedupStats,
}

impl NoOpDeduplicator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Deduplicator for NoOpDeduplicator {
    fn insert(&mut self, _item: &str) -> bool {
        self.stats.unique += 1;
        true
    }

    fn contains(&self, _item: &str) -> bool {
        false
    }

    fn len(&self) -> usize {
        0
    }

    fn clear(&mut self) {}

    fn stats(&self) -> DedupStats {
        self.stats
    }

    fn memory_usage(&self) -> usize {
        0
    }
}

/// Build the deduplicator for a run
pub fn create_deduplicator(enabled: bool, capacity: usize) -> Box<dyn Deduplicator> {
    if enabled {
        Box::new(BoundedDedupCache::new(capacity))
    } else {
        Box::new(NoOpDeduplicator::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounded_cache_dedups() {
        let mut dedup = BoundedDedupCache::new(100);
        assert!(dedup.insert("hello"));
        assert!(!dedup.insert("hello"));
        assert!(dedup.insert("world"));
        assert_eq!(dedup.len(), 2);
        assert_eq!(
            dedup.stats(),
            DedupStats {
                unique: 2,
                duplicates: 1,
                clears: 0
            }
        );
    }

    #[test]
    fn test_clear_on_overflow() {
        let mut dedup = BoundedDedupCache::new(2);
        let kept: Vec<_> = ["a", "b", "c", "a"]
            .into_iter()
            .filter(|s| dedup.insert(s))
            .collect();

        // "c" overflows the cache, so the later "a" is new again
        assert_eq!(kept, vec!["a", "b", "c", "a"]);
        assert_eq!(dedup.stats().clears, 1);
        assert_eq!(dedup.len(), 1);
    }

    #[test]
    fn test_zero_capacity_acts_as_one() {
        let mut dedup = BoundedDedupCache::new(0);
        assert_eq!(dedup.capacity(), 1);
        assert!(dedup.insert("a"));
        assert!(!dedup.insert("a"));
        assert!(dedup.insert("b"));
        assert_eq!(dedup.stats().clears, 1);
        assert!(dedup.insert("a"));
    }

    #[test]
    fn test_within_capacity_never_clears() {
        let mut dedup = BoundedDedupCache::new(3);
        let kept: Vec<_> = ["a", "b", "c", "a", "b"]
            .into_iter()
            .filter(|s| dedup.insert(s))
            .collect();
        assert_eq!(kept, vec!["a", "b", "c"]);
        assert_eq!(dedup.stats().clears, 0);
    }

    #[test]
    fn test_noop_dedup() {
        let mut dedup = create_deduplicator(false, 10);
        assert!(dedup.insert("hello"));
        assert!(dedup.insert("hello"));
        assert!(dedup.is_empty());
        assert_eq!(dedup.stats().unique, 2);
    }
}
