// tiertree workload driver
// Builds an index over a contiguous key space, replays a synthetic
// point-lookup workload against it, and reports the engine statistics
// as a human-readable block or a single CSV record.

use anyhow::{ensure, Result};
use clap::{Parser, ValueEnum};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::fmt;
use std::io;
use std::time::Instant;

use tiertree::{
    init_logging_with_level, BaselineIndex, Index, IndexStats, Key, Sampler, TierConfigBuilder,
    TieredIndex, TracedIndex, WorkloadKind,
};

// Macro for conditional printing based on quiet flag
macro_rules! qprintln {
    ($quiet:expr, $($arg:tt)*) => {
        if !$quiet {
            println!($($arg)*);
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Hot/cold tiered index
    Tiered,
    /// Single flat B-tree
    Baseline,
}

impl Mode {
    fn as_str(&self) -> &'static str {
        match self {
            Mode::Tiered => "tiered",
            Mode::Baseline => "baseline",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum WorkloadArg {
    Uniform,
    Zipf,
}

impl From<WorkloadArg> for WorkloadKind {
    fn from(arg: WorkloadArg) -> Self {
        match arg {
            WorkloadArg::Uniform => WorkloadKind::Uniform,
            WorkloadArg::Zipf => WorkloadKind::Zipf,
        }
    }
}

impl fmt::Display for WorkloadArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkloadArg::Uniform => write!(f, "uniform"),
            WorkloadArg::Zipf => write!(f, "zipf"),
        }
    }
}

/// Replay a synthetic point-lookup workload against an index engine
#[derive(Debug, Parser)]
#[command(name = "tiertree", version, about)]
struct Args {
    /// Number of distinct keys preloaded into the index
    #[arg(long, default_value_t = 100_000)]
    nkeys: Key,

    /// Number of point queries to run
    #[arg(long, default_value_t = 500_000)]
    nqueries: u64,

    /// Key distribution of the query stream
    #[arg(long, value_enum, default_value_t = WorkloadArg::Zipf)]
    workload: WorkloadArg,

    /// Zipf exponent (zipf workload only)
    #[arg(long, default_value_t = 1.1)]
    theta: f64,

    /// Promotion score cutoff
    #[arg(long, default_value_t = 8.0)]
    hot_threshold: f64,

    /// Per-access score smoothing factor
    #[arg(long, default_value_t = 0.9)]
    decay_alpha: f64,

    /// Hot-tier capacity as a fraction of the key space
    #[arg(long, default_value_t = 0.05)]
    hot_fraction: f64,

    /// B-tree minimum degree
    #[arg(long, default_value_t = 32)]
    degree: usize,

    /// RNG seed
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Index engine to drive
    #[arg(long, value_enum, default_value_t = Mode::Tiered)]
    mode: Mode,

    /// Emit one CSV record instead of the human-readable report
    #[arg(long)]
    csv: bool,

    /// Print the CSV header and exit
    #[arg(long)]
    csv_header: bool,

    /// Enable per-operation debug logging
    #[arg(long, short)]
    verbose: bool,

    /// Suppress all non-error output
    #[arg(long, short)]
    quiet: bool,
}

const CSV_HEADER: [&str; 18] = [
    "mode",
    "workload",
    "theta",
    "nkeys",
    "nqueries",
    "hot_threshold",
    "decay_alpha",
    "hot_fraction",
    "seed",
    "elapsed_sec",
    "qps",
    "hot_hits",
    "cold_hits",
    "not_found",
    "hot_keys",
    "cold_keys",
    "avg_hot_nodes_per_q",
    "avg_cold_nodes_per_q",
];

/// One CSV record per run; field order matches `CSV_HEADER`.
#[derive(Debug, Serialize)]
struct RunRecord<'a> {
    mode: &'a str,
    workload: String,
    theta: f64,
    nkeys: Key,
    nqueries: u64,
    hot_threshold: f64,
    decay_alpha: f64,
    hot_fraction: f64,
    seed: u64,
    elapsed_sec: f64,
    qps: f64,
    hot_hits: u64,
    cold_hits: u64,
    not_found: u64,
    hot_keys: usize,
    cold_keys: usize,
    avg_hot_nodes_per_q: f64,
    avg_cold_nodes_per_q: f64,
}

fn load_keys<I: Index<Value = Key>>(index: &mut I, nkeys: Key) {
    // Payloads carry the key itself; the engines treat them as opaque.
    for key in 0..nkeys {
        index.insert(key, key);
    }
}

fn run_queries<I: Index<Value = Key>>(
    index: &mut I,
    sampler: &Sampler,
    rng: &mut StdRng,
    nqueries: u64,
) -> f64 {
    let start = Instant::now();
    for _ in 0..nqueries {
        let key = sampler.sample(rng);
        let _ = index.search(key);
    }
    start.elapsed().as_secs_f64()
}

fn drive<I: Index<Value = Key>>(
    index: I,
    args: &Args,
    sampler: &Sampler,
    rng: &mut StdRng,
) -> (IndexStats, f64) {
    if args.verbose {
        let mut traced = TracedIndex::new(index);
        load_keys(&mut traced, args.nkeys);
        let elapsed = run_queries(&mut traced, sampler, rng, args.nqueries);
        (traced.stats(), elapsed)
    } else {
        let mut index = index;
        load_keys(&mut index, args.nkeys);
        let elapsed = run_queries(&mut index, sampler, rng, args.nqueries);
        (index.stats(), elapsed)
    }
}

fn print_report(args: &Args, stats: &IndexStats, elapsed: f64, qps: f64) {
    let quiet = args.quiet;
    qprintln!(quiet, "\n=== Results ({}) ===", args.mode.as_str());
    qprintln!(quiet, "Elapsed (sec):    {:.6}", elapsed);
    qprintln!(quiet, "Throughput (Q/s): {:.2}", qps);
    if args.mode == Mode::Tiered {
        qprintln!(quiet, "Hot hits:         {}", stats.hot_hits);
    }
    qprintln!(quiet, "Cold hits:        {}", stats.cold_hits);
    qprintln!(quiet, "Not found:        {}", stats.not_found);
    if args.mode == Mode::Tiered {
        qprintln!(quiet, "Hot keys:         {}", stats.hot_keys);
    }
    qprintln!(quiet, "Cold keys:        {}", stats.cold_keys);
    if args.mode == Mode::Tiered {
        qprintln!(quiet, "Avg hot nodes/q:  {:.3}", stats.avg_hot_nodes_per_query());
    }
    qprintln!(quiet, "Avg cold nodes/q: {:.3}", stats.avg_cold_nodes_per_query());
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging_with_level(args.verbose, args.quiet)?;

    if args.csv_header {
        let mut writer = csv::Writer::from_writer(io::stdout());
        writer.write_record(CSV_HEADER)?;
        writer.flush()?;
        return Ok(());
    }

    ensure!(args.nkeys >= 1, "need at least one key, got {}", args.nkeys);

    let workload = WorkloadKind::from(args.workload);
    let sampler = Sampler::new(workload, args.nkeys, args.theta)?;
    let mut rng = StdRng::seed_from_u64(args.seed);

    if !args.csv {
        let quiet = args.quiet;
        qprintln!(quiet, "Mode:        {}", args.mode.as_str());
        qprintln!(quiet, "Workload:    {}", workload);
        if workload == WorkloadKind::Zipf {
            qprintln!(quiet, "Theta:       {:.3}", args.theta);
        }
        qprintln!(quiet, "nkeys:       {}", args.nkeys);
        qprintln!(quiet, "nqueries:    {}", args.nqueries);
        if args.mode == Mode::Tiered {
            qprintln!(quiet, "Hot thresh:  {:.3}", args.hot_threshold);
            qprintln!(quiet, "Decay alpha: {:.3}", args.decay_alpha);
            qprintln!(quiet, "Hot frac:    {:.3}", args.hot_fraction);
        }
    }

    let (stats, elapsed) = match args.mode {
        Mode::Tiered => {
            let config = TierConfigBuilder::new()
                .decay_alpha(args.decay_alpha)?
                .hot_threshold(args.hot_threshold)?
                .max_hot_fraction(args.hot_fraction)?
                .build()?;
            let index: TieredIndex<Key> = TieredIndex::new(args.nkeys - 1, args.degree, config)?;
            drive(index, &args, &sampler, &mut rng)
        }
        Mode::Baseline => {
            let index: BaselineIndex<Key> = BaselineIndex::new(args.nkeys - 1, args.degree)?;
            drive(index, &args, &sampler, &mut rng)
        }
    };

    let qps = if elapsed > 0.0 {
        args.nqueries as f64 / elapsed
    } else {
        0.0
    };

    if args.csv {
        let record = RunRecord {
            mode: args.mode.as_str(),
            workload: workload.to_string(),
            theta: args.theta,
            nkeys: args.nkeys,
            nqueries: args.nqueries,
            hot_threshold: args.hot_threshold,
            decay_alpha: args.decay_alpha,
            hot_fraction: args.hot_fraction,
            seed: args.seed,
            elapsed_sec: elapsed,
            qps,
            hot_hits: stats.hot_hits,
            cold_hits: stats.cold_hits,
            not_found: stats.not_found,
            hot_keys: stats.hot_keys,
            cold_keys: stats.cold_keys,
            avg_hot_nodes_per_q: stats.avg_hot_nodes_per_query(),
            avg_cold_nodes_per_q: stats.avg_cold_nodes_per_query(),
        };
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(io::stdout());
        writer.serialize(record)?;
        writer.flush()?;
    } else {
        print_report(&args, &stats, elapsed, qps);
    }

    Ok(())
}
