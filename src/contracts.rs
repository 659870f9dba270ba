// Contract-First Design
// Defines the contract every index engine satisfies. The documented
// preconditions and postconditions are the behavior callers may rely on.

use crate::types::{IndexStats, Key};

/// Core trait for point/range index engines over a bounded key space.
///
/// Engines are single-threaded: no operation may run concurrently with
/// another on the same engine, and none of them block or suspend.
pub trait Index {
    type Value: Clone;

    /// Insert a key-value pair
    ///
    /// # Preconditions
    /// - `key` should lie inside the engine's key space `[0, max_key]`
    ///
    /// # Postconditions
    /// - An in-range pair is searchable immediately; a previous value
    ///   under the same key is overwritten and the key set is unchanged
    /// - An out-of-range key is reported to the diagnostic channel and
    ///   the call has no other effect
    fn insert(&mut self, key: Key, value: Self::Value);

    /// Point lookup
    ///
    /// # Postconditions
    /// - Returns `Some(value)` when the key is present, `None` otherwise
    /// - The query counter advances by one and node-visit counters
    ///   reflect every node examined
    fn search(&mut self, key: Key) -> Option<Self::Value>;

    /// Invoke `emit` for every stored pair with `lo <= key <= hi`
    ///
    /// # Postconditions
    /// - Each matching key is emitted exactly once
    /// - `lo > hi` emits nothing
    /// - Node-visit counters reflect the traversal
    fn range_scan(&mut self, lo: Key, hi: Key, emit: &mut dyn FnMut(Key, &Self::Value));

    /// Snapshot the engine's statistics
    ///
    /// # Postconditions
    /// - Returned by value; key counts are recomputed at call time
    /// - Does not modify engine state
    fn stats(&self) -> IndexStats;
}
