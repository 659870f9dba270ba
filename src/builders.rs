// Builder Components
// Fluent construction for the tier configuration, validating each field
// as it is set.

use anyhow::{ensure, Result};

use crate::types::TierConfig;

/// Tier configuration builder
///
/// Defaults match the canonical tuning: `decay_alpha = 0.9`,
/// `hot_threshold = 8.0`, `max_hot_fraction = 0.05`, inclusive caching.
pub struct TierConfigBuilder {
    decay_alpha: f64,
    hot_threshold: f64,
    max_hot_fraction: f64,
    inclusive: bool,
}

impl TierConfigBuilder {
    /// Create a builder with the default tuning
    pub fn new() -> Self {
        Self {
            decay_alpha: 0.9,
            hot_threshold: 8.0,
            max_hot_fraction: 0.05,
            inclusive: true,
        }
    }

    /// Set the per-access score smoothing factor (0.0 - 1.0)
    pub fn decay_alpha(mut self, alpha: f64) -> Result<Self> {
        ensure!(
            (0.0..=1.0).contains(&alpha),
            "decay_alpha must lie in [0, 1], got {}",
            alpha
        );
        self.decay_alpha = alpha;
        Ok(self)
    }

    /// Set the promotion score cutoff
    pub fn hot_threshold(mut self, threshold: f64) -> Result<Self> {
        ensure!(
            threshold >= 0.0,
            "hot_threshold must be non-negative, got {}",
            threshold
        );
        self.hot_threshold = threshold;
        Ok(self)
    }

    /// Set the hot-tier capacity fraction (0.0 - 1.0)
    pub fn max_hot_fraction(mut self, fraction: f64) -> Result<Self> {
        ensure!(
            (0.0..=1.0).contains(&fraction),
            "max_hot_fraction must lie in [0, 1], got {}",
            fraction
        );
        self.max_hot_fraction = fraction;
        Ok(self)
    }

    /// Select the caching mode. Only inclusive caching is supported;
    /// `build` rejects `false` (exclusive mode is reserved).
    pub fn inclusive(mut self, inclusive: bool) -> Self {
        self.inclusive = inclusive;
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<TierConfig> {
        TierConfig::new(
            self.decay_alpha,
            self.hot_threshold,
            self.max_hot_fraction,
            self.inclusive,
        )
    }
}

impl Default for TierConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
