use core::fmt;

/// Canonical key for an unordered node pair.
///
/// Always stores `first <= second`, so `(p, q)` and `(q, p)` map to the
/// same key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PairKey {
    first: usize,
    second: usize,
}

impl PairKey {
    /// Build the canonical key for `(p, q)`.
    pub fn new(p: usize, q: usize) -> Self {
        Self {
            first: p.min(q),
            second: p.max(q),
        }
    }

    /// Smaller node index.
    pub fn first(self) -> usize {
        self.first
    }

    /// Larger node index.
    pub fn second(self) -> usize {
        self.second
    }

    /// True when `(p, q)` had to be swapped to become canonical.
    pub fn is_swapped(p: usize, q: usize) -> bool {
        p > q
    }
}

impl fmt::Debug for PairKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PairKey({}, {})", self.first, self.second)
    }
}

impl fmt::Display for PairKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.first, self.second)
    }
}
