// Validated Types
// Strongly-typed wrappers that enforce configuration invariants at
// construction time, so the index engines never see an invalid value.

use anyhow::{ensure, Result};
use serde::Serialize;
use std::fmt;

/// Key type shared by every index engine. The tiered and baseline engines
/// additionally restrict keys to `[0, max_key]`; the raw B-tree does not.
pub type Key = i64;

/// B-tree minimum degree (`t`). Nodes hold between `t - 1` and `2t - 1`
/// keys; the root may hold fewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MinDegree(usize);

impl MinDegree {
    /// Create a validated minimum degree
    ///
    /// # Invariants
    /// - `t >= 2` (a smaller degree cannot keep split nodes non-empty)
    pub fn new(t: usize) -> Result<Self> {
        ensure!(t >= 2, "B-tree minimum degree must be at least 2, got {}", t);
        Ok(Self(t))
    }

    pub fn get(&self) -> usize {
        self.0
    }

    /// Maximum keys a node may hold (`2t - 1`).
    pub fn max_keys(&self) -> usize {
        2 * self.0 - 1
    }

    /// Minimum keys a non-root node must hold (`t - 1`).
    pub fn min_keys(&self) -> usize {
        self.0 - 1
    }
}

impl fmt::Display for MinDegree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Tier routing configuration, read-only after construction.
///
/// Constructed through [`TierConfig::new`] or the
/// [`TierConfigBuilder`](crate::builders::TierConfigBuilder), both of
/// which validate every field, so a held value is always well-formed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TierConfig {
    decay_alpha: f64,
    hot_threshold: f64,
    max_hot_fraction: f64,
    inclusive: bool,
}

impl TierConfig {
    /// Create a validated configuration
    ///
    /// # Invariants
    /// - `decay_alpha` in `[0, 1]`
    /// - `hot_threshold >= 0`
    /// - `max_hot_fraction` in `[0, 1]`
    /// - `inclusive` must be `true`: exclusive mode is reserved and
    ///   rejected until its semantics are defined
    pub fn new(
        decay_alpha: f64,
        hot_threshold: f64,
        max_hot_fraction: f64,
        inclusive: bool,
    ) -> Result<Self> {
        ensure!(
            (0.0..=1.0).contains(&decay_alpha),
            "decay_alpha must lie in [0, 1], got {}",
            decay_alpha
        );
        ensure!(
            hot_threshold >= 0.0,
            "hot_threshold must be non-negative, got {}",
            hot_threshold
        );
        ensure!(
            (0.0..=1.0).contains(&max_hot_fraction),
            "max_hot_fraction must lie in [0, 1], got {}",
            max_hot_fraction
        );
        ensure!(
            inclusive,
            "exclusive (non-inclusive) tier mode is reserved and not supported"
        );
        Ok(Self {
            decay_alpha,
            hot_threshold,
            max_hot_fraction,
            inclusive,
        })
    }

    /// Per-access exponential smoothing factor for key scores.
    pub fn decay_alpha(&self) -> f64 {
        self.decay_alpha
    }

    /// Minimum post-update score for promotion candidacy.
    pub fn hot_threshold(&self) -> f64 {
        self.hot_threshold
    }

    /// Hot-tier capacity as a fraction of the key space.
    pub fn max_hot_fraction(&self) -> f64 {
        self.max_hot_fraction
    }

    /// Whether every hot key also stays in the cold tier.
    pub fn inclusive(&self) -> bool {
        self.inclusive
    }
}

impl Default for TierConfig {
    fn default() -> Self {
        Self {
            decay_alpha: 0.9,
            hot_threshold: 8.0,
            max_hot_fraction: 0.05,
            inclusive: true,
        }
    }
}

/// By-value statistics snapshot. Lifetime counters accumulate across an
/// engine's life; `hot_keys` and `cold_keys` are recomputed at snapshot
/// time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    pub queries: u64,
    pub hot_hits: u64,
    pub cold_hits: u64,
    pub not_found: u64,
    pub hot_node_visits: u64,
    pub cold_node_visits: u64,
    pub hot_keys: usize,
    pub cold_keys: usize,
}

impl IndexStats {
    /// Mean hot-tier nodes examined per query, zero when idle.
    pub fn avg_hot_nodes_per_query(&self) -> f64 {
        if self.queries == 0 {
            0.0
        } else {
            self.hot_node_visits as f64 / self.queries as f64
        }
    }

    /// Mean cold-tier nodes examined per query, zero when idle.
    pub fn avg_cold_nodes_per_query(&self) -> f64 {
        if self.queries == 0 {
            0.0
        } else {
            self.cold_node_visits as f64 / self.queries as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_min_degree_bounds() {
        assert!(MinDegree::new(1).is_err());
        let t = MinDegree::new(3).unwrap();
        assert_eq!(t.max_keys(), 5);
        assert_eq!(t.min_keys(), 2);
    }

    #[test]
    fn test_tier_config_validation() {
        assert!(TierConfig::new(1.1, 8.0, 0.05, true).is_err());
        assert!(TierConfig::new(0.9, -1.0, 0.05, true).is_err());
        assert!(TierConfig::new(0.9, 8.0, 1.5, true).is_err());
        assert!(TierConfig::new(0.9, 8.0, 0.05, false).is_err());
        assert!(TierConfig::new(0.9, 8.0, 0.05, true).is_ok());
    }

    #[test]
    fn test_stats_averages_guard_zero_queries() {
        let stats = IndexStats::default();
        assert_eq!(stats.avg_hot_nodes_per_query(), 0.0);
        assert_eq!(stats.avg_cold_nodes_per_query(), 0.0);
    }
}
