// Tiered Index Implementation
// Hot/cold composite over two B-trees. Every key lives in the cold tree;
// keys whose decayed access score crosses the promotion threshold are
// copied into the smaller hot tree, which is probed first on every query.

use anyhow::{ensure, Context, Result};
use tracing::{debug, warn};

use crate::contracts::Index;
use crate::pure::btree::{BTree, VisitStats};
use crate::types::{IndexStats, Key, TierConfig};

/// Lifetime counters, mutated only inside the index and exposed by
/// value through [`TieredIndex::stats`].
#[derive(Debug, Clone, Copy, Default)]
struct TierCounters {
    queries: u64,
    hot_hits: u64,
    cold_hits: u64,
    not_found: u64,
    hot_node_visits: u64,
    cold_node_visits: u64,
}

/// Two-tier ordered index over the contiguous key space `[0, max_key]`.
///
/// The cold tree is authoritative and holds every inserted key. The hot
/// tree is an inclusive cache: a key is promoted into it once its
/// exponentially decayed access score reaches the configured threshold,
/// and stays there for the life of the index (there is no eviction).
/// Point lookups probe hot before cold; range scans merge both trees
/// with emitted-key deduplication.
pub struct TieredIndex<V: Clone> {
    hot: BTree<V>,
    cold: BTree<V>,
    max_key: Key,
    scores: Vec<f64>,
    config: TierConfig,
    counters: TierCounters,
}

impl<V: Clone> TieredIndex<V> {
    /// Create an index over `[0, max_key]` with B-trees of minimum
    /// degree `t` and zeroed scores.
    pub fn new(max_key: Key, t: usize, config: TierConfig) -> Result<Self> {
        ensure!(max_key >= 0, "max_key must be non-negative, got {}", max_key);
        let slots = usize::try_from(max_key).context("key space too large")? + 1;
        Ok(Self {
            hot: BTree::new(t)?,
            cold: BTree::new(t)?,
            max_key,
            scores: vec![0.0; slots],
            config,
            counters: TierCounters::default(),
        })
    }

    /// Upper bound of the key space.
    pub fn max_key(&self) -> Key {
        self.max_key
    }

    /// The configuration the index was built with.
    pub fn config(&self) -> &TierConfig {
        &self.config
    }

    /// Current access score of `key`, or `None` outside the key space.
    pub fn score(&self, key: Key) -> Option<f64> {
        let slot = usize::try_from(key).ok()?;
        self.scores.get(slot).copied()
    }

    /// Insert `(key, value)` into the cold tier with upsert semantics.
    /// An out-of-range key is diagnosed and dropped; the hot tier is
    /// never touched on insert.
    pub fn insert(&mut self, key: Key, value: V) {
        if key < 0 || key > self.max_key {
            warn!(
                key,
                max_key = self.max_key,
                "insert key outside the index key space, dropping"
            );
            return;
        }
        self.cold.insert(key, value);
    }

    /// Point lookup: probe hot, then cold. Either hit bumps the key's
    /// access score; a cold hit whose new score reaches the threshold
    /// triggers a promotion attempt.
    pub fn search(&mut self, key: Key) -> Option<V> {
        self.counters.queries += 1;

        let mut hot_visits = VisitStats::default();
        let hot_hit = self.hot.search_counted(key, &mut hot_visits).cloned();
        self.counters.hot_node_visits += hot_visits.node_visits;
        if let Some(value) = hot_hit {
            self.counters.hot_hits += 1;
            if (0..=self.max_key).contains(&key) {
                // Keep accruing evidence; the key is already hot.
                self.bump_score(key);
            }
            return Some(value);
        }

        let mut cold_visits = VisitStats::default();
        let cold_hit = self.cold.search_counted(key, &mut cold_visits).cloned();
        self.counters.cold_node_visits += cold_visits.node_visits;
        match cold_hit {
            Some(value) => {
                self.counters.cold_hits += 1;
                if (0..=self.max_key).contains(&key) {
                    let score = self.bump_score(key);
                    if score >= self.config.hot_threshold() {
                        self.try_promote(key);
                    }
                }
                Some(value)
            }
            None => {
                self.counters.not_found += 1;
                None
            }
        }
    }

    /// Invoke `emit` for every pair in the union of both tiers with
    /// `lo <= key <= hi`, each key at most once. Emission order across
    /// the merged stream is unspecified: the hot traversal runs to
    /// completion first and the cold traversal only emits keys the hot
    /// pass has not already produced.
    pub fn range_scan<F>(&mut self, lo: Key, hi: Key, mut emit: F)
    where
        F: FnMut(Key, &V),
    {
        let mut seen = vec![false; self.scores.len()];
        let max_key = self.max_key;

        let mut hot_visits = VisitStats::default();
        self.hot.range_scan_counted(
            lo,
            hi,
            |key, value| {
                if key < 0 || key > max_key {
                    return;
                }
                let slot = key as usize;
                if !seen[slot] {
                    seen[slot] = true;
                    emit(key, value);
                }
            },
            &mut hot_visits,
        );
        self.counters.hot_node_visits += hot_visits.node_visits;

        let mut cold_visits = VisitStats::default();
        self.cold.range_scan_counted(
            lo,
            hi,
            |key, value| {
                if key < 0 || key > max_key {
                    return;
                }
                let slot = key as usize;
                if !seen[slot] {
                    seen[slot] = true;
                    emit(key, value);
                }
            },
            &mut cold_visits,
        );
        self.counters.cold_node_visits += cold_visits.node_visits;
    }

    /// Snapshot the statistics, recomputing the per-tier key counts.
    pub fn stats(&self) -> IndexStats {
        IndexStats {
            queries: self.counters.queries,
            hot_hits: self.counters.hot_hits,
            cold_hits: self.counters.cold_hits,
            not_found: self.counters.not_found,
            hot_node_visits: self.counters.hot_node_visits,
            cold_node_visits: self.counters.cold_node_visits,
            hot_keys: self.hot.key_count(),
            cold_keys: self.cold.key_count(),
        }
    }

    /// Apply the exponentially weighted update `s <- alpha * s + 1` and
    /// return the new score. Callers must have range-checked `key`.
    fn bump_score(&mut self, key: Key) -> f64 {
        let slot = key as usize;
        let next = self.config.decay_alpha() * self.scores[slot] + 1.0;
        self.scores[slot] = next;
        next
    }

    /// Copy `key`'s cold payload into the hot tier. Skipped silently when
    /// the hot tier is at capacity, the key is already hot, or the cold
    /// tier unexpectedly lacks the key; none of these is an error and the
    /// probes here do not feed the query-path visit counters.
    fn try_promote(&mut self, key: Key) {
        let total = self.scores.len() as f64;
        let hot_keys = self.hot.key_count();
        if hot_keys as f64 >= self.config.max_hot_fraction() * total {
            return;
        }
        if self.hot.search(key).is_some() {
            return;
        }
        let Some(value) = self.cold.search(key).cloned() else {
            return;
        };
        self.hot.insert(key, value);
        debug!(key, hot_keys = hot_keys + 1, "promoted key into the hot tier");
    }
}

impl<V: Clone> Index for TieredIndex<V> {
    type Value = V;

    fn insert(&mut self, key: Key, value: V) {
        TieredIndex::insert(self, key, value);
    }

    fn search(&mut self, key: Key) -> Option<V> {
        TieredIndex::search(self, key)
    }

    fn range_scan(&mut self, lo: Key, hi: Key, emit: &mut dyn FnMut(Key, &V)) {
        TieredIndex::range_scan(self, lo, hi, emit);
    }

    fn stats(&self) -> IndexStats {
        TieredIndex::stats(self)
    }
}
