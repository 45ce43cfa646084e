//! Accumulation of repeated pairwise contributions before graph construction.

use std::collections::BTreeMap;
use std::collections::btree_map;

use sf_core::PairKey;

use crate::decompose::{CostMatrix, swap_roles};

/// Pairwise matrices keyed by canonical node pair.
///
/// Each stored matrix is oriented as `(label(first), label(second))`;
/// contributions submitted as `(p, q)` with `p > q` are transposed before
/// they are summed in.
#[derive(Debug, Clone, Default)]
pub struct MergeBuffer {
    entries: BTreeMap<PairKey, CostMatrix>,
}

impl MergeBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `m`, given for `(p, q)`, to the pair's running sum.
    pub fn store(&mut self, p: usize, q: usize, m: &CostMatrix) {
        let oriented = if PairKey::is_swapped(p, q) {
            swap_roles(m)
        } else {
            *m
        };
        *self
            .entries
            .entry(PairKey::new(p, q))
            .or_insert_with(CostMatrix::zeros) += oriented;
    }

    /// Number of distinct pairs buffered.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Accumulated matrix for a pair, oriented canonically.
    pub fn get(&self, key: PairKey) -> Option<&CostMatrix> {
        self.entries.get(&key)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Take every entry in key order, leaving the buffer empty.
    pub fn drain(&mut self) -> btree_map::IntoIter<PairKey, CostMatrix> {
        std::mem::take(&mut self.entries).into_iter()
    }
}
