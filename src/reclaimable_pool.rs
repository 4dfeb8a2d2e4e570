//! A [ReclaimablePool] keeps large decoded assets alive up to a total cost, evicting the least recently used first.
//!
//! Cache entries only hold a `Weak` to anything in the pool.  Once the pool drops an item (because the budget was
//! exceeded, or because the application reported memory pressure via [ReclaimablePool::clear]) and no caller holds
//! it either, the pixels are freed and the entry decodes again on next use.
//!
//! Recency is a monotonically increasing tick per access; a `BTreeMap` from tick to key gives the eviction order.
use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;
use std::sync::Arc;

use ahash::RandomState;

struct PoolEntry<V> {
    item: Arc<V>,
    cost: u64,
    last_used: u64,
}

pub struct ReclaimablePool<K, V> {
    entries: HashMap<K, PoolEntry<V>, RandomState>,
    /// Last-used tick to key, oldest first.
    order: BTreeMap<u64, K>,
    tick: u64,
    max_cost: u64,
    current_cost: u64,
}

impl<K: Hash + Eq + Clone, V> ReclaimablePool<K, V> {
    pub fn new(max_cost: u64) -> ReclaimablePool<K, V> {
        ReclaimablePool {
            entries: Default::default(),
            order: Default::default(),
            tick: 0,
            max_cost,
            current_cost: 0,
        }
    }

    fn next_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    /// Get an item, marking it as the most recently used.
    pub fn get(&mut self, key: &K) -> Option<Arc<V>> {
        let tick = self.next_tick();
        let entry = self.entries.get_mut(key)?;
        let old = std::mem::replace(&mut entry.last_used, tick);
        let item = entry.item.clone();
        if let Some(k) = self.order.remove(&old) {
            self.order.insert(tick, k);
        }
        Some(item)
    }

    /// Add an item, returning the one previously stored under this key.
    ///
    /// Items are evicted oldest first until the pool is back within budget, which can include this one if `cost` alone
    /// exceeds the budget.
    pub fn insert(&mut self, key: K, item: Arc<V>, cost: u64) -> Option<Arc<V>> {
        let ret = self.remove(&key);
        let tick = self.next_tick();
        self.order.insert(tick, key.clone());
        self.entries.insert(
            key,
            PoolEntry {
                item,
                cost,
                last_used: tick,
            },
        );
        self.current_cost += cost;
        self.evict_to_budget();
        ret
    }

    pub fn remove(&mut self, key: &K) -> Option<Arc<V>> {
        let entry = self.entries.remove(key)?;
        self.order.remove(&entry.last_used);
        self.current_cost -= entry.cost;
        Some(entry.item)
    }

    fn evict_to_budget(&mut self) {
        while self.current_cost > self.max_cost {
            let oldest = match self.order.iter().next() {
                Some((_, k)) => k.clone(),
                None => break,
            };
            self.remove(&oldest);
        }
    }

    /// Drop everything, returning how many items were released.
    pub fn clear(&mut self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        self.order.clear();
        self.current_cost = 0;
        count
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn current_cost(&self) -> u64 {
        self.current_cost
    }

    pub fn max_cost(&self) -> u64 {
        self.max_cost
    }

    /// Iterator visiting entries in most-recently-used order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.order
            .values()
            .rev()
            .filter_map(move |k| self.entries.get(k).map(|e| (k, &*e.item)))
    }
}
