// Baseline Index Implementation
// A single flat B-tree behind the same Index contract, so the driver can
// compare the tiered layout against an untiered one under identical
// workloads. Hits and visits are reported in the cold columns; the hot
// columns stay zero.

use anyhow::{ensure, Result};
use tracing::warn;

use crate::contracts::Index;
use crate::pure::btree::{BTree, VisitStats};
use crate::types::{IndexStats, Key};

pub struct BaselineIndex<V: Clone> {
    tree: BTree<V>,
    max_key: Key,
    queries: u64,
    hits: u64,
    not_found: u64,
    node_visits: u64,
}

impl<V: Clone> BaselineIndex<V> {
    /// Create a flat index over the key space `[0, max_key]`.
    pub fn new(max_key: Key, t: usize) -> Result<Self> {
        ensure!(max_key >= 0, "max_key must be non-negative, got {}", max_key);
        Ok(Self {
            tree: BTree::new(t)?,
            max_key,
            queries: 0,
            hits: 0,
            not_found: 0,
            node_visits: 0,
        })
    }

    /// Upper bound of the key space.
    pub fn max_key(&self) -> Key {
        self.max_key
    }

    pub fn insert(&mut self, key: Key, value: V) {
        if key < 0 || key > self.max_key {
            warn!(
                key,
                max_key = self.max_key,
                "insert key outside the index key space, dropping"
            );
            return;
        }
        self.tree.insert(key, value);
    }

    pub fn search(&mut self, key: Key) -> Option<V> {
        self.queries += 1;
        let mut visits = VisitStats::default();
        let found = self.tree.search_counted(key, &mut visits).cloned();
        self.node_visits += visits.node_visits;
        match found {
            Some(value) => {
                self.hits += 1;
                Some(value)
            }
            None => {
                self.not_found += 1;
                None
            }
        }
    }

    pub fn range_scan<F>(&mut self, lo: Key, hi: Key, emit: F)
    where
        F: FnMut(Key, &V),
    {
        let mut visits = VisitStats::default();
        self.tree.range_scan_counted(lo, hi, emit, &mut visits);
        self.node_visits += visits.node_visits;
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            queries: self.queries,
            hot_hits: 0,
            cold_hits: self.hits,
            not_found: self.not_found,
            hot_node_visits: 0,
            cold_node_visits: self.node_visits,
            hot_keys: 0,
            cold_keys: self.tree.key_count(),
        }
    }
}

impl<V: Clone> Index for BaselineIndex<V> {
    type Value = V;

    fn insert(&mut self, key: Key, value: V) {
        BaselineIndex::insert(self, key, value);
    }

    fn search(&mut self, key: Key) -> Option<V> {
        BaselineIndex::search(self, key)
    }

    fn range_scan(&mut self, lo: Key, hi: Key, emit: &mut dyn FnMut(Key, &V)) {
        BaselineIndex::range_scan(self, lo, hi, emit);
    }

    fn stats(&self) -> IndexStats {
        BaselineIndex::stats(self)
    }
}
