// B-Tree Implementation - Pure Data Structure
// Minimum-degree B-tree keyed by i64, with upsert insert, counted point
// lookup, in-order range scans, and an invariant checker for tests.

use crate::types::{Key, MinDegree};
use anyhow::{bail, Result};

/// Per-operation node-visit accounting. One visit is one node examined
/// along a search or range traversal, independent of cache locality.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VisitStats {
    pub node_visits: u64,
}

/// A single tree node. `children` is empty exactly when `leaf` is true;
/// otherwise it holds `keys.len() + 1` entries.
#[derive(Debug, Clone)]
struct Node<V> {
    keys: Vec<Key>,
    values: Vec<V>,
    children: Vec<Box<Node<V>>>,
    leaf: bool,
}

impl<V> Node<V> {
    fn new(degree: MinDegree, leaf: bool) -> Self {
        Self {
            keys: Vec::with_capacity(degree.max_keys()),
            values: Vec::with_capacity(degree.max_keys()),
            children: if leaf {
                Vec::new()
            } else {
                Vec::with_capacity(degree.max_keys() + 1)
            },
            leaf,
        }
    }
}

/// Ordered map with bounded fanout. Nodes hold between `t - 1` and
/// `2t - 1` keys (root excepted) and all leaves sit at the same depth.
#[derive(Debug, Clone)]
pub struct BTree<V> {
    root: Box<Node<V>>,
    degree: MinDegree,
}

impl<V: Clone> BTree<V> {
    /// Create an empty tree with minimum degree `t`.
    pub fn new(t: usize) -> Result<Self> {
        let degree = MinDegree::new(t)?;
        Ok(Self {
            root: Box::new(Node::new(degree, true)),
            degree,
        })
    }

    /// The tree's minimum degree `t`.
    pub fn degree(&self) -> usize {
        self.degree.get()
    }

    /// Point lookup without visit accounting.
    pub fn search(&self, key: Key) -> Option<&V> {
        let mut stats = VisitStats::default();
        self.search_counted(key, &mut stats)
    }

    /// Point lookup, incrementing `stats.node_visits` once per node
    /// examined on the root-to-terminal path.
    pub fn search_counted(&self, key: Key, stats: &mut VisitStats) -> Option<&V> {
        let mut node = self.root.as_ref();
        loop {
            stats.node_visits += 1;
            let i = node.keys.partition_point(|&k| k < key);
            if i < node.keys.len() && node.keys[i] == key {
                return Some(&node.values[i]);
            }
            if node.leaf {
                return None;
            }
            node = node.children[i].as_ref();
        }
    }

    /// Insert-or-replace. A second insert under an existing key overwrites
    /// the payload without changing the key set. Never fails.
    ///
    /// Uses the classical preemptive top-down split: a full root is split
    /// before the descent (the only way the tree gains height), and every
    /// full child is split on the way down so no node overflows.
    pub fn insert(&mut self, key: Key, value: V) {
        let t = self.degree.get();
        if self.root.keys.len() == self.degree.max_keys() {
            let old_root = std::mem::replace(
                &mut self.root,
                Box::new(Node::new(self.degree, false)),
            );
            self.root.children.push(old_root);
            Self::split_child(&mut self.root, 0, t);
        }
        Self::insert_nonfull(&mut self.root, key, value, t);
    }

    /// Split the full child `parent.children[i]`: the median key moves up
    /// into `parent` at index `i`, the upper `t - 1` keys and `t` children
    /// move into a new right sibling at `children[i + 1]`.
    fn split_child(parent: &mut Node<V>, i: usize, t: usize) {
        let child = &mut parent.children[i];
        debug_assert_eq!(child.keys.len(), 2 * t - 1);
        let leaf = child.leaf;
        let right_keys = child.keys.split_off(t);
        let right_values = child.values.split_off(t);
        let right_children = if leaf {
            Vec::new()
        } else {
            child.children.split_off(t)
        };
        let median_key = child.keys.pop().unwrap();
        let median_value = child.values.pop().unwrap();
        let right = Box::new(Node {
            keys: right_keys,
            values: right_values,
            children: right_children,
            leaf,
        });
        parent.keys.insert(i, median_key);
        parent.values.insert(i, median_value);
        parent.children.insert(i + 1, right);
    }

    fn insert_nonfull(node: &mut Node<V>, key: Key, value: V, t: usize) {
        let mut i = node.keys.partition_point(|&k| k < key);
        if i < node.keys.len() && node.keys[i] == key {
            node.values[i] = value;
            return;
        }
        if node.leaf {
            node.keys.insert(i, key);
            node.values.insert(i, value);
            return;
        }
        if node.children[i].keys.len() == 2 * t - 1 {
            Self::split_child(node, i, t);
            // The promoted median lands at index i; re-aim the descent.
            if key > node.keys[i] {
                i += 1;
            } else if key == node.keys[i] {
                node.values[i] = value;
                return;
            }
        }
        Self::insert_nonfull(&mut node.children[i], key, value, t);
    }

    /// Invoke `emit(key, &value)` for every pair with `lo <= key <= hi`,
    /// in strictly increasing key order. `lo > hi` emits nothing.
    pub fn range_scan<F>(&self, lo: Key, hi: Key, emit: F)
    where
        F: FnMut(Key, &V),
    {
        let mut stats = VisitStats::default();
        self.range_scan_counted(lo, hi, emit, &mut stats);
    }

    /// Range scan with visit accounting, one per node entered.
    pub fn range_scan_counted<F>(&self, lo: Key, hi: Key, mut emit: F, stats: &mut VisitStats)
    where
        F: FnMut(Key, &V),
    {
        if lo > hi {
            return;
        }
        Self::range_node(&self.root, lo, hi, &mut emit, stats);
    }

    fn range_node<F>(node: &Node<V>, lo: Key, hi: Key, emit: &mut F, stats: &mut VisitStats)
    where
        F: FnMut(Key, &V),
    {
        stats.node_visits += 1;
        for i in 0..node.keys.len() {
            if node.keys[i] > hi {
                // Keys below keys[i] may still fall inside the range.
                if !node.leaf {
                    Self::range_node(&node.children[i], lo, hi, emit, stats);
                }
                return;
            }
            if !node.leaf && lo <= node.keys[i] {
                Self::range_node(&node.children[i], lo, hi, emit, stats);
            }
            if node.keys[i] >= lo {
                emit(node.keys[i], &node.values[i]);
            }
        }
        if !node.leaf {
            Self::range_node(&node.children[node.keys.len()], lo, hi, emit, stats);
        }
    }

    /// Exact number of keys, by recursive summation.
    pub fn key_count(&self) -> usize {
        Self::count_node(&self.root)
    }

    fn count_node(node: &Node<V>) -> usize {
        node.keys.len()
            + node
                .children
                .iter()
                .map(|child| Self::count_node(child))
                .sum::<usize>()
    }

    /// Verify the structural invariants (for testing): per-node key
    /// bounds, strict intra-node ordering, key/value/child arity, the
    /// between-children separator ordering, and uniform leaf depth.
    pub fn check_invariants(&self) -> Result<()> {
        Self::check_node(&self.root, true, None, None, self.degree)?;
        Ok(())
    }

    fn check_node(
        node: &Node<V>,
        is_root: bool,
        lower: Option<Key>,
        upper: Option<Key>,
        degree: MinDegree,
    ) -> Result<usize> {
        let nkeys = node.keys.len();
        if !is_root && nkeys < degree.min_keys() {
            bail!(
                "non-root node holds {} keys, minimum is {}",
                nkeys,
                degree.min_keys()
            );
        }
        if nkeys > degree.max_keys() {
            bail!(
                "node holds {} keys, maximum is {}",
                nkeys,
                degree.max_keys()
            );
        }
        if node.values.len() != nkeys {
            bail!("key/value arity mismatch: {} vs {}", nkeys, node.values.len());
        }
        for pair in node.keys.windows(2) {
            if pair[0] >= pair[1] {
                bail!("keys not strictly increasing: {} before {}", pair[0], pair[1]);
            }
        }
        if let (Some(bound), Some(&first)) = (lower, node.keys.first()) {
            if first <= bound {
                bail!("key {} at or below the left separator {}", first, bound);
            }
        }
        if let (Some(bound), Some(&last)) = (upper, node.keys.last()) {
            if last >= bound {
                bail!("key {} at or above the right separator {}", last, bound);
            }
        }
        if node.leaf {
            if !node.children.is_empty() {
                bail!("leaf node has {} children", node.children.len());
            }
            return Ok(0);
        }
        if node.children.len() != nkeys + 1 {
            bail!(
                "internal node holds {} children for {} keys",
                node.children.len(),
                nkeys
            );
        }
        let mut leaf_depth = None;
        for (i, child) in node.children.iter().enumerate() {
            let child_lower = if i == 0 { lower } else { Some(node.keys[i - 1]) };
            let child_upper = if i == nkeys { upper } else { Some(node.keys[i]) };
            let depth = Self::check_node(child, false, child_lower, child_upper, degree)?;
            match leaf_depth {
                None => leaf_depth = Some(depth),
                Some(expected) if expected != depth => {
                    bail!("leaves at unequal depth: {} vs {}", expected, depth)
                }
                Some(_) => {}
            }
        }
        Ok(leaf_depth.unwrap_or(0) + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_tree_creation() -> Result<()> {
        let tree: BTree<u32> = BTree::new(2)?;
        assert_eq!(tree.key_count(), 0);
        assert_eq!(tree.search(0), None);
        tree.check_invariants()?;
        Ok(())
    }

    #[test]
    fn test_degree_below_two_rejected() {
        assert!(BTree::<u32>::new(0).is_err());
        assert!(BTree::<u32>::new(1).is_err());
        assert!(BTree::<u32>::new(2).is_ok());
    }

    #[test]
    fn test_single_insertion() -> Result<()> {
        let mut tree = BTree::new(2)?;
        tree.insert(5, "five");
        assert_eq!(tree.key_count(), 1);
        assert_eq!(tree.search(5), Some(&"five"));
        assert_eq!(tree.search(4), None);
        Ok(())
    }

    #[test]
    fn test_root_split_grows_height() -> Result<()> {
        // At t = 2 the fourth insert forces a root split.
        let mut tree = BTree::new(2)?;
        for k in 0..4 {
            tree.insert(k, k);
        }
        tree.check_invariants()?;
        assert_eq!(tree.key_count(), 4);
        for k in 0..4 {
            assert_eq!(tree.search(k), Some(&k));
        }
        Ok(())
    }

    #[test]
    fn test_upsert_overwrites_promoted_key() -> Result<()> {
        // Drive key 1 up into the root, then overwrite it.
        let mut tree = BTree::new(2)?;
        for k in 0..4 {
            tree.insert(k, k * 10);
        }
        tree.insert(1, 999);
        assert_eq!(tree.search(1), Some(&999));
        assert_eq!(tree.key_count(), 4);
        tree.check_invariants()?;
        Ok(())
    }

    #[test]
    fn test_range_scan_order_and_bounds() -> Result<()> {
        let mut tree = BTree::new(2)?;
        for k in [8, 3, 5, 1, 9, 2, 7, 0, 6, 4] {
            tree.insert(k, k);
        }
        let mut seen = Vec::new();
        tree.range_scan(2, 7, |k, _| seen.push(k));
        assert_eq!(seen, vec![2, 3, 4, 5, 6, 7]);

        let mut empty = Vec::new();
        tree.range_scan(7, 2, |k, _| empty.push(k));
        assert!(empty.is_empty());
        Ok(())
    }

    #[test]
    fn test_search_counts_nodes_on_path() -> Result<()> {
        let mut tree = BTree::new(2)?;
        tree.insert(1, 1);
        let mut stats = VisitStats::default();
        assert_eq!(tree.search_counted(1, &mut stats), Some(&1));
        assert_eq!(stats.node_visits, 1);
        Ok(())
    }
}
