//! Repair policies for pairwise terms that violate submodularity.
//!
//! - [`truncate`]: clamp the matrix until it is submodular (lossy)
//! - [`linearize`]: push everything representable into unaries and keep the
//!   remaining `f11` residual as an [`AuxPenalty`]

use sf_core::Real;
use tracing::trace;

use crate::decompose::{CostMatrix, extract_min, submodular_excess};

/// Clamp passes applied by [`truncate`].
const TRUNCATION_PASSES: usize = 2;

/// Residual non-submodular cost between `p` and `q`, paid when both take
/// label 1. Cannot be expressed as a network edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AuxPenalty {
    pub p: usize,
    pub q: usize,
    /// Always strictly positive.
    pub score: Real,
}

fn clamp_once(f: &mut CostMatrix) {
    if submodular_excess(f) <= 0.0 {
        return;
    }
    let off = f[(0, 1)] + f[(1, 0)];
    if f[(0, 0)] > f[(1, 1)] {
        f[(0, 0)] = (off - f[(1, 1)]).max(0.0);
    } else {
        f[(1, 1)] = (off - f[(0, 0)]).max(0.0);
    }
}

/// Lower the larger diagonal entry to `max(0, f01 + f10 - other)`.
///
/// Already-submodular input is returned unchanged. Two passes reach
/// submodularity whenever `f01 + f10 >= 0`.
pub fn truncate(m: &CostMatrix) -> CostMatrix {
    let mut f = *m;
    for _ in 0..TRUNCATION_PASSES {
        clamp_once(&mut f);
    }
    f
}

/// Result of linearizing a non-submodular term.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Linearization {
    /// `[cost0, cost1]` pushed into node `p`.
    pub unary_p: [Real; 2],
    /// `[cost0, cost1]` pushed into node `q`.
    pub unary_q: [Real; 2],
    /// Constant dropped from all four entries.
    pub shift: Real,
    /// Cost left on `(1, 1)`.
    pub residual: Real,
}

impl Linearization {
    /// Energy this linearization assigns to `(label(p), label(q))`.
    pub fn energy(&self, lp: usize, lq: usize) -> Real {
        let pair = if lp == 1 && lq == 1 {
            self.residual
        } else {
            0.0
        };
        self.unary_p[lp] + self.unary_q[lq] + self.shift + pair
    }

    pub fn into_penalty(self, p: usize, q: usize) -> AuxPenalty {
        AuxPenalty {
            p,
            q,
            score: self.residual,
        }
    }
}

/// Reduce a strictly non-submodular matrix to a single `(1, 1)` residual.
///
/// Order: `p` cost0, `q` cost0, drop any positive `f00` from all entries,
/// `p` cost1, `q` cost1. Negative input is first shifted up by its minimum
/// component so every entry starts non-negative.
///
/// # Panics
///
/// If the result is not three exact zeros and one positive residual. That
/// only happens when `m` was submodular to begin with.
pub fn linearize(m: &CostMatrix) -> Linearization {
    let mut f = *m;
    let mut shift = 0.0;

    let lowest = f.min();
    if lowest < 0.0 {
        f.add_scalar_mut(-lowest);
        shift += lowest;
    }

    let p0 = extract_min(&mut f, (0, 0), (0, 1));
    let q0 = extract_min(&mut f, (0, 0), (1, 0));

    let f00 = f[(0, 0)];
    if f00 > 0.0 {
        f.add_scalar_mut(-f00);
        shift += f00;
    }

    let p1 = extract_min(&mut f, (1, 0), (1, 1));
    let q1 = extract_min(&mut f, (0, 1), (1, 1));

    assert!(
        f[(0, 0)] == 0.0 && f[(0, 1)] == 0.0 && f[(1, 0)] == 0.0 && f[(1, 1)] > 0.0,
        "linearization left more than one residual: {f:?}"
    );
    trace!(residual = f[(1, 1)], shift, "linearized non-submodular term");

    Linearization {
        unary_p: [p0, p1],
        unary_q: [q0, q1],
        shift,
        residual: f[(1, 1)],
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::decompose::{cost_matrix, is_submodular};
    use proptest::prelude::*;

    fn entries() -> impl Strategy<Value = (i32, i32, i32, i32)> {
        (0_i32..40, 0_i32..40, 0_i32..40, 0_i32..40)
    }

    proptest! {
        #[test]
        fn truncation_output_is_submodular((a, b, c, d) in entries()) {
            let m = cost_matrix(a as Real, b as Real, c as Real, d as Real);
            let t = truncate(&m);
            prop_assert!(is_submodular(&t, 0.0));
            if is_submodular(&m, 0.0) {
                prop_assert_eq!(t, m);
            }
        }

        #[test]
        fn linearization_is_exact_with_one_residual(
            (a, b, c, d) in entries().prop_filter("non-submodular", |&(a, b, c, d)| a + d > b + c)
        ) {
            let m = cost_matrix(a as Real, b as Real, c as Real, d as Real);
            let l = linearize(&m);
            prop_assert!(l.residual > 0.0);
            prop_assert_eq!(l.residual, (a + d - b - c) as Real);
            for (lp, lq) in [(0, 0), (0, 1), (1, 0), (1, 1)] {
                prop_assert_eq!(l.energy(lp, lq), m[(lp, lq)]);
            }
        }
    }
}
