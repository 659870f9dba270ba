// Workload Generators
// Synthetic key samplers for driving the index engines. Every sampler
// draws from a caller-supplied RNG so runs are reproducible from a seed.

use anyhow::{ensure, Context, Result};
use rand::Rng;
use std::fmt;
use std::str::FromStr;

use crate::types::Key;

/// Query key distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkloadKind {
    Uniform,
    Zipf,
}

impl FromStr for WorkloadKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "uniform" => Ok(Self::Uniform),
            "zipf" => Ok(Self::Zipf),
            other => anyhow::bail!("unknown workload '{}', expected 'uniform' or 'zipf'", other),
        }
    }
}

impl fmt::Display for WorkloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uniform => write!(f, "uniform"),
            Self::Zipf => write!(f, "zipf"),
        }
    }
}

/// Uniform sampler over `[0, n)`.
#[derive(Debug, Clone)]
pub struct UniformSampler {
    n: Key,
}

impl UniformSampler {
    pub fn new(n: Key) -> Result<Self> {
        ensure!(n >= 1, "uniform sampler needs at least one key, got {}", n);
        Ok(Self { n })
    }

    pub fn sample<R: Rng>(&self, rng: &mut R) -> Key {
        rng.gen_range(0..self.n)
    }
}

/// Zipf sampler over `[0, n)` with exponent `theta`, by inversion of a
/// precomputed CDF. Sampling is a binary search, `O(log n)` per draw.
#[derive(Debug, Clone)]
pub struct ZipfSampler {
    cdf: Vec<f64>,
}

impl ZipfSampler {
    pub fn new(n: Key, theta: f64) -> Result<Self> {
        ensure!(n >= 1, "zipf sampler needs at least one key, got {}", n);
        ensure!(
            theta.is_finite() && theta >= 0.0,
            "zipf exponent must be finite and non-negative, got {}",
            theta
        );
        let n = usize::try_from(n).context("key space too large")?;
        let weights: Vec<f64> = (1..=n).map(|rank| 1.0 / (rank as f64).powf(theta)).collect();
        let total: f64 = weights.iter().sum();
        let mut cdf = Vec::with_capacity(n);
        let mut cumulative = 0.0;
        for weight in &weights {
            cumulative += weight / total;
            cdf.push(cumulative);
        }
        Ok(Self { cdf })
    }

    pub fn sample<R: Rng>(&self, rng: &mut R) -> Key {
        let u: f64 = rng.gen();
        // First rank whose cumulative mass reaches u; the clamp covers
        // the last entry rounding to slightly below 1.0.
        let rank = self
            .cdf
            .partition_point(|&mass| mass < u)
            .min(self.cdf.len() - 1);
        rank as Key
    }
}

/// A configured sampler, built from a workload kind.
#[derive(Debug, Clone)]
pub enum Sampler {
    Uniform(UniformSampler),
    Zipf(ZipfSampler),
}

impl Sampler {
    /// Build a sampler over `[0, n)`; `theta` applies to Zipf only.
    pub fn new(kind: WorkloadKind, n: Key, theta: f64) -> Result<Self> {
        match kind {
            WorkloadKind::Uniform => Ok(Self::Uniform(UniformSampler::new(n)?)),
            WorkloadKind::Zipf => Ok(Self::Zipf(ZipfSampler::new(n, theta)?)),
        }
    }

    pub fn sample<R: Rng>(&self, rng: &mut R) -> Key {
        match self {
            Self::Uniform(sampler) => sampler.sample(rng),
            Self::Zipf(sampler) => sampler.sample(rng),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_workload_kind_parsing() {
        assert_eq!("uniform".parse::<WorkloadKind>().unwrap(), WorkloadKind::Uniform);
        assert_eq!("zipf".parse::<WorkloadKind>().unwrap(), WorkloadKind::Zipf);
        assert!("pareto".parse::<WorkloadKind>().is_err());
    }

    #[test]
    fn test_samplers_stay_in_range() -> Result<()> {
        let mut rng = StdRng::seed_from_u64(7);
        let uniform = UniformSampler::new(100)?;
        let zipf = ZipfSampler::new(100, 1.1)?;
        for _ in 0..1_000 {
            let k = uniform.sample(&mut rng);
            assert!((0..100).contains(&k));
            let k = zipf.sample(&mut rng);
            assert!((0..100).contains(&k));
        }
        Ok(())
    }

    #[test]
    fn test_zipf_skews_toward_low_ranks() -> Result<()> {
        let mut rng = StdRng::seed_from_u64(42);
        let zipf = ZipfSampler::new(1_000, 1.1)?;
        let mut low = 0u32;
        for _ in 0..10_000 {
            if zipf.sample(&mut rng) < 10 {
                low += 1;
            }
        }
        // The ten most popular ranks carry far more than 1% of the mass.
        assert!(low > 2_000);
        Ok(())
    }

    #[test]
    fn test_seeded_runs_are_reproducible() -> Result<()> {
        let zipf = ZipfSampler::new(500, 0.99)?;
        let mut a = StdRng::seed_from_u64(11);
        let mut b = StdRng::seed_from_u64(11);
        for _ in 0..100 {
            assert_eq!(zipf.sample(&mut a), zipf.sample(&mut b));
        }
        Ok(())
    }
}
