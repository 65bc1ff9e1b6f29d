//! Bounded FIFO cache keyed by prompt hash.
use std::collections::{HashMap, VecDeque};
use std::hash::Hasher;
use twox_hash::XxHash64;

/// Insertion-ordered cache with a hard entry cap. Lookups do not refresh
/// an entry's position; eviction is strictly oldest-first.
#[derive(Debug, Clone)]
pub struct PromptCache<V> {
    map: HashMap<u64, V>,
    order: VecDeque<u64>,
    capacity: usize,
}

impl<V: Clone> PromptCache<V> {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            map: HashMap::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Stable key for a prompt.
    #[must_use]
    pub fn key_for(prompt: &str) -> u64 {
        let mut hasher = XxHash64::with_seed(0);
        hasher.write(prompt.as_bytes());
        hasher.finish()
    }

    #[must_use]
    pub fn get(&self, key: u64) -> Option<&V> {
        self.map.get(&key)
    }

    pub fn insert(&mut self, key: u64, value: V) {
        if self.map.insert(key, value).is_none() {
            self.order.push_back(key);
        }
        while self.map.len() > self.capacity {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            self.map.remove(&oldest);
        }
    }

    pub fn clear(&mut self) {
        self.map.clear();
        self.order.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evicts_oldest_first() {
        let mut cache: PromptCache<u32> = PromptCache::new(3);
        for n in 0..4_u32 {
            cache.insert(u64::from(n), n);
        }
        assert_eq!(cache.len(), 3);
        assert!(cache.get(0).is_none());
        assert_eq!(cache.get(1), Some(&1));
        assert_eq!(cache.get(3), Some(&3));
    }

    #[test]
    fn reinsert_overwrites_without_growing() {
        let mut cache: PromptCache<&str> = PromptCache::new(2);
        cache.insert(7, "first");
        cache.insert(7, "second");
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(7), Some(&"second"));
        // The slot keeps its original age.
        cache.insert(8, "other");
        cache.insert(9, "newest");
        assert!(cache.get(7).is_none());
    }

    #[test]
    fn identical_prompts_share_a_key() {
        let a = PromptCache::<()>::key_for("raise tariffs on steel");
        let b = PromptCache::<()>::key_for("raise tariffs on steel");
        let c = PromptCache::<()>::key_for("raise tariffs on steel imports");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn zero_capacity_is_bumped_to_one() {
        let mut cache: PromptCache<u8> = PromptCache::new(0);
        cache.insert(1, 1);
        assert_eq!(cache.capacity(), 1);
        assert_eq!(cache.len(), 1);
    }
}
