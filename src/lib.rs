// tiertree - An in-memory ordered index with an adaptive hot/cold tier split
// Root library module

pub mod baseline_index;
pub mod builders;
pub mod contracts;
pub mod observability;
pub mod pure;
pub mod tiered_index;
pub mod types;
pub mod workload;
pub mod wrappers;

// Re-export observability helpers
pub use observability::{
    get_metrics, init_logging, init_logging_with_level, record_metric, MetricType,
};

// Re-export the engine contract
pub use contracts::Index;

// Re-export validated types
pub use types::{IndexStats, Key, MinDegree, TierConfig};

// Re-export builders
pub use builders::TierConfigBuilder;

// Re-export index engines
pub use baseline_index::BaselineIndex;
pub use tiered_index::TieredIndex;

// Re-export the underlying tree
pub use pure::btree::{BTree, VisitStats};

// Re-export wrappers
pub use wrappers::TracedIndex;

// Re-export workload generators
pub use workload::{Sampler, UniformSampler, WorkloadKind, ZipfSampler};
