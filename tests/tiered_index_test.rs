// Tiered Index Tests
// End-to-end behavior of the hot/cold composite: routing, score-driven
// promotion, capacity limits, deduplicated range merges, and statistics.

use anyhow::Result;
use pretty_assertions::assert_eq;
use tiertree::{TierConfig, TierConfigBuilder, TieredIndex};

fn config(alpha: f64, threshold: f64, fraction: f64) -> Result<TierConfig> {
    TierConfigBuilder::new()
        .decay_alpha(alpha)?
        .hot_threshold(threshold)?
        .max_hot_fraction(fraction)?
        .build()
}

#[test]
fn test_search_on_empty_index() -> Result<()> {
    let mut index: TieredIndex<&str> = TieredIndex::new(9, 2, TierConfig::default())?;
    assert_eq!(index.search(3), None);
    let stats = index.stats();
    assert_eq!(stats.queries, 1);
    assert_eq!(stats.not_found, 1);
    assert_eq!(stats.hot_hits, 0);
    assert_eq!(stats.cold_hits, 0);
    Ok(())
}

#[test]
fn test_insert_then_lookup() -> Result<()> {
    let mut index = TieredIndex::new(9, 2, TierConfig::default())?;
    index.insert(5, "payload");
    assert_eq!(index.search(5), Some("payload"));
    assert_eq!(index.stats().cold_hits, 1);
    assert_eq!(index.search(6), None);
    let stats = index.stats();
    assert_eq!(stats.queries, 2);
    assert_eq!(stats.not_found, 1);
    Ok(())
}

#[test]
fn test_promotion_after_threshold() -> Result<()> {
    // With alpha = 0.9 the score after n hits is 10 * (1 - 0.9^n): it
    // first reaches 8.0 on the 16th search.
    let mut index = TieredIndex::new(99, 4, config(0.9, 8.0, 0.10)?)?;
    index.insert(42, "hot candidate");

    for _ in 0..30 {
        assert_eq!(index.search(42), Some("hot candidate"));
    }

    let stats = index.stats();
    assert_eq!(stats.queries, 30);
    assert_eq!(stats.cold_hits, 16);
    assert_eq!(stats.hot_hits, 14);
    assert_eq!(stats.hot_keys, 1);
    assert_eq!(stats.cold_keys, 1);

    // Once hot, lookups stop touching the cold tree.
    let cold_visits_before = stats.cold_node_visits;
    assert_eq!(index.search(42), Some("hot candidate"));
    let stats = index.stats();
    assert_eq!(stats.cold_node_visits, cold_visits_before);
    assert_eq!(stats.hot_hits, 15);
    Ok(())
}

#[test]
fn test_score_crosses_threshold_exactly_once() -> Result<()> {
    let mut index = TieredIndex::new(99, 4, config(0.9, 8.0, 0.10)?)?;
    index.insert(42, 0u8);
    for _ in 0..15 {
        index.search(42);
    }
    assert!(index.score(42).unwrap() < 8.0);
    assert_eq!(index.stats().hot_keys, 0);

    index.search(42);
    assert!(index.score(42).unwrap() >= 8.0);
    assert_eq!(index.stats().hot_keys, 1);
    Ok(())
}

#[test]
fn test_hot_capacity_is_a_hard_ceiling() -> Result<()> {
    // fraction 0.02 over 100 keys caps the hot tier at two entries.
    let mut index = TieredIndex::new(99, 4, config(0.9, 8.0, 0.02)?)?;
    for key in [1, 2, 3] {
        index.insert(key, key);
    }
    for key in [1, 2, 3] {
        for _ in 0..20 {
            assert_eq!(index.search(key), Some(key));
        }
    }
    assert_eq!(index.stats().hot_keys, 2);

    // The third key keeps qualifying but is never promoted.
    let hot_hits_before = index.stats().hot_hits;
    for _ in 0..10 {
        assert_eq!(index.search(3), Some(3));
    }
    let stats = index.stats();
    assert_eq!(stats.hot_keys, 2);
    assert_eq!(stats.hot_hits, hot_hits_before);
    Ok(())
}

#[test]
fn test_upsert_keeps_one_cold_entry() -> Result<()> {
    let mut index = TieredIndex::new(9, 2, TierConfig::default())?;
    index.insert(7, "A");
    index.insert(7, "B");
    assert_eq!(index.search(7), Some("B"));
    assert_eq!(index.stats().cold_keys, 1);
    Ok(())
}

#[test]
fn test_range_scan_deduplicates_promoted_keys() -> Result<()> {
    let mut index = TieredIndex::new(9, 2, config(0.9, 8.0, 0.5)?)?;
    for key in 0..10 {
        index.insert(key, key * 100);
    }
    for key in [3, 7] {
        for _ in 0..16 {
            index.search(key);
        }
    }
    assert_eq!(index.stats().hot_keys, 2);

    let mut emitted = Vec::new();
    index.range_scan(2, 8, |key, value| emitted.push((key, *value)));
    emitted.sort_unstable();
    let want: Vec<(i64, i64)> = (2..=8).map(|k| (k, k * 100)).collect();
    assert_eq!(emitted, want);
    Ok(())
}

#[test]
fn test_range_merge_covers_exactly_the_cold_set() -> Result<()> {
    // Inclusive caching: the merged full-domain scan must produce the
    // cold key set exactly once each, however many keys are hot.
    let mut index = TieredIndex::new(49, 2, config(0.9, 2.0, 0.2)?)?;
    for key in 0..50 {
        index.insert(key, key);
    }
    for round in 0..12 {
        for key in 0..20 {
            index.search((key * 7 + round) % 50);
        }
    }
    let stats = index.stats();
    assert!(stats.hot_keys > 0);
    assert!(stats.hot_keys <= 10);

    let mut emitted = Vec::new();
    index.range_scan(0, 49, |key, _| emitted.push(key));
    emitted.sort_unstable();
    let want: Vec<i64> = (0..50).collect();
    assert_eq!(emitted, want);
    Ok(())
}

#[test]
fn test_score_converges_to_fixed_point() -> Result<()> {
    // With alpha = 0.5 the score tends to 1 / (1 - alpha) = 2 from below.
    let mut index = TieredIndex::new(9, 2, config(0.5, 1_000.0, 1.0)?)?;
    index.insert(4, ());
    let mut previous = 0.0;
    for _ in 0..50 {
        index.search(4);
        let score = index.score(4).unwrap();
        assert!(score > previous);
        assert!(score < 2.0);
        previous = score;
    }
    assert!((index.score(4).unwrap() - 2.0).abs() < 1e-9);
    // The absurd threshold kept everything cold.
    assert_eq!(index.stats().hot_keys, 0);
    Ok(())
}

#[test]
fn test_node_visit_accounting_per_query() -> Result<()> {
    // One key in cold, empty hot: each miss-then-hit search touches
    // exactly the two root nodes.
    let mut index = TieredIndex::new(9, 2, config(0.9, 1_000.0, 1.0)?)?;
    index.insert(5, "v");
    index.search(5);
    let stats = index.stats();
    assert_eq!(stats.hot_node_visits, 1);
    assert_eq!(stats.cold_node_visits, 1);

    index.search(5);
    let stats = index.stats();
    assert_eq!(stats.hot_node_visits, 2);
    assert_eq!(stats.cold_node_visits, 2);
    Ok(())
}

#[test]
fn test_round_trip_many_keys() -> Result<()> {
    let n: i64 = 500;
    let mut index = TieredIndex::new(n - 1, 3, TierConfig::default())?;
    let mut key = 0;
    for _ in 0..n {
        index.insert(key, key + 7);
        key = (key + 263) % n;
    }
    assert_eq!(index.stats().cold_keys, n as usize);
    for key in 0..n {
        assert_eq!(index.search(key), Some(key + 7));
    }
    Ok(())
}
