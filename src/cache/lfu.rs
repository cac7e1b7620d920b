//! In-process LFU cache with O(1) `get` / `put`.
//!
//! ## Layout
//!
//! ```text
//!   entries: key ──► Entry { value, frequency, node }
//!                                      │
//!   nodes (slot arena)                 ▼
//!   buckets:  freq=1 ◄──► freq=2 ◄──► freq=5      (strictly increasing)
//!               │           │           │
//!             [k3,k7]     [k1]       [k2,k4]      (oldest touched first)
//! ```
//!
//! Each frequency bucket is an intrusive list of arena nodes; buckets link to
//! their neighbours by frequency value. An entry refers back to its bucket by
//! frequency and to its position by node handle, so no raw pointers are
//! involved. Empty buckets are unlinked immediately.
//!
//! Eviction takes the head of the lowest bucket: least frequently used, ties
//! broken by the oldest insertion or touch.
//!
//! `put` on a key that is already cached does not replace its value, it only
//! counts as an access. Cached links are immutable for as long as they stay
//! in the cache.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::trace;

use crate::cache::traits::LinkCache;
use crate::errors::Result;

type NodeId = usize;

/// 预分配上限，超出部分按需增长
const PREALLOCATE_LIMIT: usize = 1024;

#[derive(Debug)]
struct Node {
    key: String,
    prev: Option<NodeId>,
    next: Option<NodeId>,
}

#[derive(Debug, Default)]
struct Bucket {
    head: Option<NodeId>,
    tail: Option<NodeId>,
    prev: Option<u64>,
    next: Option<u64>,
}

#[derive(Debug)]
struct Entry {
    value: String,
    frequency: u64,
    node: NodeId,
}

#[derive(Debug)]
struct LfuState {
    capacity: usize,
    entries: HashMap<String, Entry>,
    nodes: Vec<Option<Node>>,
    free: Vec<NodeId>,
    buckets: HashMap<u64, Bucket>,
    lowest: Option<u64>,
}

impl LfuState {
    fn new(capacity: usize) -> Self {
        let reserved = capacity.min(PREALLOCATE_LIMIT);
        Self {
            capacity,
            entries: HashMap::with_capacity(reserved),
            nodes: Vec::with_capacity(reserved),
            free: Vec::new(),
            buckets: HashMap::new(),
            lowest: None,
        }
    }

    fn node(&self, id: NodeId) -> &Node {
        self.nodes[id].as_ref().expect("live node handle")
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        self.nodes[id].as_mut().expect("live node handle")
    }

    fn alloc_node(&mut self, key: String) -> NodeId {
        let node = Node {
            key,
            prev: None,
            next: None,
        };
        match self.free.pop() {
            Some(id) => {
                self.nodes[id] = Some(node);
                id
            }
            None => {
                self.nodes.push(Some(node));
                self.nodes.len() - 1
            }
        }
    }

    fn release_node(&mut self, id: NodeId) -> Node {
        let node = self.nodes[id].take().expect("live node handle");
        self.free.push(id);
        node
    }

    /// Creates the bucket for `frequency` right after `after` (or at the
    /// head of the list) unless it already exists.
    fn ensure_bucket(&mut self, frequency: u64, after: Option<u64>) {
        if self.buckets.contains_key(&frequency) {
            return;
        }

        let next = match after {
            Some(prev) => self.buckets[&prev].next,
            None => self.lowest,
        };

        match after {
            Some(prev) => self.buckets.get_mut(&prev).expect("bucket").next = Some(frequency),
            None => self.lowest = Some(frequency),
        }
        if let Some(next) = next {
            self.buckets.get_mut(&next).expect("bucket").prev = Some(frequency);
        }

        self.buckets.insert(
            frequency,
            Bucket {
                head: None,
                tail: None,
                prev: after,
                next,
            },
        );
    }

    fn unlink_bucket(&mut self, frequency: u64) {
        let bucket = self.buckets.remove(&frequency).expect("bucket");

        match bucket.prev {
            Some(prev) => self.buckets.get_mut(&prev).expect("bucket").next = bucket.next,
            None => self.lowest = bucket.next,
        }
        if let Some(next) = bucket.next {
            self.buckets.get_mut(&next).expect("bucket").prev = bucket.prev;
        }
    }

    fn push_back(&mut self, frequency: u64, id: NodeId) {
        let tail = self.buckets[&frequency].tail;
        {
            let node = self.node_mut(id);
            node.prev = tail;
            node.next = None;
        }
        match tail {
            Some(tail) => self.node_mut(tail).next = Some(id),
            None => self.buckets.get_mut(&frequency).expect("bucket").head = Some(id),
        }
        self.buckets.get_mut(&frequency).expect("bucket").tail = Some(id);
    }

    /// Removes `id` from its bucket, dropping the bucket if it became empty.
    ///
    /// Returns `true` if the bucket was dropped.
    fn detach(&mut self, frequency: u64, id: NodeId) -> bool {
        let (prev, next) = {
            let node = self.node(id);
            (node.prev, node.next)
        };

        match prev {
            Some(prev) => self.node_mut(prev).next = next,
            None => self.buckets.get_mut(&frequency).expect("bucket").head = next,
        }
        match next {
            Some(next) => self.node_mut(next).prev = prev,
            None => self.buckets.get_mut(&frequency).expect("bucket").tail = prev,
        }

        let node = self.node_mut(id);
        node.prev = None;
        node.next = None;

        if self.buckets[&frequency].head.is_none() {
            self.unlink_bucket(frequency);
            true
        } else {
            false
        }
    }

    /// Moves `key` one frequency up. The key must be present.
    fn touch(&mut self, key: &str) {
        let (frequency, id) = {
            let entry = &self.entries[key];
            (entry.frequency, entry.node)
        };

        let former_prev = self.buckets[&frequency].prev;
        let dropped = self.detach(frequency, id);
        let after = if dropped { former_prev } else { Some(frequency) };

        let next_frequency = frequency.saturating_add(1);
        self.ensure_bucket(next_frequency, after);
        self.push_back(next_frequency, id);

        self.entries.get_mut(key).expect("entry").frequency = next_frequency;
    }

    fn evict(&mut self) -> Option<(String, u64)> {
        let lowest = self.lowest?;
        let id = self.buckets[&lowest].head?;

        self.detach(lowest, id);
        let node = self.release_node(id);
        self.entries.remove(&node.key);

        Some((node.key, lowest))
    }

    fn insert(&mut self, key: &str, value: &str) {
        let id = self.alloc_node(key.to_string());
        self.ensure_bucket(1, None);
        self.push_back(1, id);
        self.entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                frequency: 1,
                node: id,
            },
        );
    }

    #[cfg(test)]
    fn validate_invariants(&self) {
        let mut seen = 0usize;
        let mut previous_frequency = 0u64;
        let mut cursor = self.lowest;
        let mut last_bucket = None;

        while let Some(frequency) = cursor {
            let bucket = &self.buckets[&frequency];
            assert!(frequency > previous_frequency, "buckets must strictly increase");
            assert_eq!(bucket.prev, last_bucket);
            assert!(bucket.head.is_some(), "empty bucket {frequency} left behind");

            let mut node_cursor = bucket.head;
            let mut last_node = None;
            while let Some(id) = node_cursor {
                let node = self.node(id);
                let entry = &self.entries[&node.key];
                assert_eq!(entry.frequency, frequency);
                assert_eq!(entry.node, id);
                assert_eq!(node.prev, last_node);
                last_node = Some(id);
                node_cursor = node.next;
                seen += 1;
            }
            assert_eq!(bucket.tail, last_node);

            previous_frequency = frequency;
            last_bucket = Some(frequency);
            cursor = bucket.next;
        }

        assert_eq!(seen, self.entries.len());
        assert!(self.entries.len() <= self.capacity);
        assert_eq!(
            self.buckets.len(),
            {
                let mut count = 0;
                let mut c = self.lowest;
                while let Some(f) = c {
                    count += 1;
                    c = self.buckets[&f].next;
                }
                count
            },
            "unreachable bucket"
        );
    }
}

/// Fixed-capacity least-frequently-used cache of key → URL.
pub struct LfuCache {
    state: Mutex<LfuState>,
}

impl LfuCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(LfuState::new(capacity)),
        }
    }

    /// Returns the cached value and counts the access.
    pub fn get(&self, key: &str) -> Option<String> {
        let mut state = self.state.lock();
        if !state.entries.contains_key(key) {
            return None;
        }
        state.touch(key);
        Some(state.entries[key].value.clone())
    }

    /// Caches `value` under `key`.
    ///
    /// A key that is already cached keeps its original value; the call only
    /// counts as an access. A new key evicts the least frequently used entry
    /// once the cache is full.
    pub fn put(&self, key: &str, value: &str) {
        let mut state = self.state.lock();

        if state.entries.contains_key(key) {
            state.touch(key);
            return;
        }

        if state.capacity == 0 {
            return;
        }

        if state.entries.len() >= state.capacity
            && let Some((evicted, frequency)) = state.evict()
        {
            trace!("LFU evicted '{}' at frequency {}", evicted, frequency);
        }

        state.insert(key, value);
    }

    /// Current access count of `key` without touching it.
    pub fn frequency(&self, key: &str) -> Option<u64> {
        self.state.lock().entries.get(key).map(|e| e.frequency)
    }

    /// Whether `key` is cached, without touching it.
    pub fn contains(&self, key: &str) -> bool {
        self.state.lock().entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.state.lock().capacity
    }

    #[cfg(test)]
    fn validate_invariants(&self) {
        self.state.lock().validate_invariants();
    }
}

#[async_trait]
impl LinkCache for LfuCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(LfuCache::get(self, key))
    }

    async fn put(&self, key: &str, value: &str) -> Result<()> {
        LfuCache::put(self, key, value);
        Ok(())
    }

    fn cache_name(&self) -> &'static str {
        "lfu"
    }
}
