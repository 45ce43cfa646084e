//! Normalization of a submodular 2×2 cost matrix into unary pushes plus one
//! edge.
//!
//! Entry `(a, b)` of a [`CostMatrix`] is the cost of `label(p) = a` and
//! `label(q) = b`, i.e. `[[f00, f01], [f10, f11]]`.

use nalgebra::Matrix2;
use sf_core::Real;

/// Pairwise cost matrix indexed by `(label(p), label(q))`.
pub type CostMatrix = Matrix2<Real>;

/// Build `[[f00, f01], [f10, f11]]`.
pub fn cost_matrix(f00: Real, f01: Real, f10: Real, f11: Real) -> CostMatrix {
    CostMatrix::new(f00, f01, f10, f11)
}

/// `f00 + f11 - (f01 + f10)`; positive means not submodular.
pub fn submodular_excess(m: &CostMatrix) -> Real {
    m[(0, 0)] + m[(1, 1)] - (m[(0, 1)] + m[(1, 0)])
}

/// True when `f00 + f11 <= f01 + f10 + tolerance`.
pub fn is_submodular(m: &CostMatrix, tolerance: Real) -> bool {
    submodular_excess(m) <= tolerance
}

/// The matrix with `p` and `q` swapped.
pub fn swap_roles(m: &CostMatrix) -> CostMatrix {
    m.transpose()
}

/// Subtract `min(m[a], m[b])` from both entries and return it.
pub(crate) fn extract_min(m: &mut CostMatrix, a: (usize, usize), b: (usize, usize)) -> Real {
    let v = m[a].min(m[b]);
    m[a] -= v;
    m[b] -= v;
    v
}

/// Result of decomposing one pairwise term.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decomposition {
    /// `[cost0, cost1]` pushed into node `p`.
    pub unary_p: [Real; 2],
    /// `[cost0, cost1]` pushed into node `q`.
    pub unary_q: [Real; 2],
    /// Capacity `p -> q`, paid when `p = 0, q = 1`.
    pub forward: Real,
    /// Capacity `q -> p`, paid when `p = 1, q = 0`.
    pub backward: Real,
}

impl Decomposition {
    /// Energy this decomposition assigns to `(label(p), label(q))`.
    pub fn energy(&self, lp: usize, lq: usize) -> Real {
        let edge = match (lp, lq) {
            (0, 1) => self.forward,
            (1, 0) => self.backward,
            _ => 0.0,
        };
        self.unary_p[lp] + self.unary_q[lq] + edge
    }
}

/// Decompose a submodular matrix.
///
/// Row minima go to `p` first, then column minima of the residual go to `q`.
/// For submodular input both diagonal residuals end at zero and the two
/// off-diagonal residuals are the edge capacities. Capacities are never
/// negative, even for non-submodular input; that input just loses its
/// diagonal residual.
pub fn decompose(m: &CostMatrix) -> Decomposition {
    let mut f = *m;
    let p0 = extract_min(&mut f, (0, 0), (0, 1));
    let p1 = extract_min(&mut f, (1, 0), (1, 1));
    let q0 = extract_min(&mut f, (0, 0), (1, 0));
    let q1 = extract_min(&mut f, (0, 1), (1, 1));

    Decomposition {
        unary_p: [p0, p1],
        unary_q: [q0, q1],
        forward: f[(0, 1)],
        backward: f[(1, 0)],
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn submodular_matrix() -> impl Strategy<Value = CostMatrix> {
        (0_i32..50, 0_i32..50, 0_i32..50, 0_i32..50)
            .prop_filter("submodular", |&(a, b, c, d)| a + d <= b + c)
            .prop_map(|(a, b, c, d)| cost_matrix(a as Real, b as Real, c as Real, d as Real))
    }

    proptest! {
        #[test]
        fn decomposition_is_exact_for_submodular_input(m in submodular_matrix()) {
            let d = decompose(&m);
            for (lp, lq) in [(0, 0), (0, 1), (1, 0), (1, 1)] {
                prop_assert_eq!(d.energy(lp, lq), m[(lp, lq)]);
            }
            prop_assert!(d.forward >= 0.0);
            prop_assert!(d.backward >= 0.0);
        }

        #[test]
        fn capacities_never_negative(
            a in -50.0_f64..50.0, b in -50.0_f64..50.0,
            c in -50.0_f64..50.0, e in -50.0_f64..50.0,
        ) {
            let d = decompose(&cost_matrix(a, b, c, e));
            prop_assert!(d.forward >= 0.0);
            prop_assert!(d.backward >= 0.0);
        }
    }
}
