//! Direct-mode solves checked against exhaustive enumeration.

use proptest::prelude::*;
use sf_core::Real;
use sf_energy::{EnergyConfig, EnergyModel, SolveMode};

#[derive(Debug, Clone)]
struct Problem {
    unaries: Vec<[Real; 2]>,
    pairs: Vec<(usize, usize, [Real; 4])>,
}

impl Problem {
    fn energy(&self, labels: &[usize]) -> Real {
        let unary: Real = self
            .unaries
            .iter()
            .zip(labels)
            .map(|(u, &l)| u[l])
            .sum();
        let pairwise: Real = self
            .pairs
            .iter()
            .map(|&(p, q, f)| f[2 * labels[p] + labels[q]])
            .sum();
        unary + pairwise
    }

    fn brute_force_min(&self) -> Real {
        let n = self.unaries.len();
        (0..1_usize << n)
            .map(|mask| {
                let labels: Vec<usize> = (0..n).map(|i| (mask >> i) & 1).collect();
                self.energy(&labels)
            })
            .fold(Real::INFINITY, Real::min)
    }

    fn build(&self) -> EnergyModel {
        let n = self.unaries.len();
        let mut model = EnergyModel::new(EnergyConfig::default(), n, self.pairs.len()).unwrap();
        model.setup(n);
        for (node, &costs) in self.unaries.iter().enumerate() {
            model.add_unary_terms(node, costs).unwrap();
        }
        for &(p, q, [f00, f01, f10, f11]) in &self.pairs {
            model.add_pairwise_term(p, q, f00, f01, f10, f11).unwrap();
        }
        model.finalize().unwrap();
        model
    }
}

#[test]
fn three_node_potts_chain() {
    let problem = Problem {
        unaries: vec![[0.0, 3.0], [2.0, 1.0], [4.0, 0.0]],
        pairs: vec![
            (0, 1, [0.0, 2.0, 2.0, 0.0]),
            (1, 2, [0.0, 2.0, 2.0, 0.0]),
        ],
    };
    let mut model = problem.build();
    let outcome = model.solve().unwrap();
    assert_eq!(outcome.mode, SolveMode::Direct);
    assert_eq!(model.minimum_energy(&outcome), problem.brute_force_min());

    let labels = model.labels().unwrap();
    assert_eq!(
        problem.energy(&labels),
        outcome.flow as Real + model.constant_offset()
    );
}

#[test]
fn reversed_pair_orientation_is_respected() {
    // (1, 0) with f01 large means label(1)=0, label(0)=1 is expensive.
    let problem = Problem {
        unaries: vec![[5.0, 0.0], [0.0, 5.0]],
        pairs: vec![(1, 0, [0.0, 20.0, 1.0, 0.0])],
    };
    let mut model = problem.build();
    let outcome = model.solve().unwrap();
    assert_eq!(model.minimum_energy(&outcome), problem.brute_force_min());
    assert_eq!(problem.brute_force_min(), 5.0);
}

fn submodular_problem() -> impl Strategy<Value = Problem> {
    (2_usize..7).prop_flat_map(|n| {
        let unaries = prop::collection::vec((0_i32..20, 0_i32..20), n);
        let pairs = prop::collection::vec(
            (0..n, 0..n, 0_i32..15, 0_i32..15, 0_i32..15, 0_i32..15),
            0..10,
        );
        (unaries, pairs).prop_map(|(unaries, pairs)| Problem {
            unaries: unaries
                .into_iter()
                .map(|(a, b)| [a as Real, b as Real])
                .collect(),
            pairs: pairs
                .into_iter()
                .filter(|&(p, q, ..)| p != q)
                .map(|(p, q, a, b, c, d)| {
                    // Lift the off-diagonal so the term is submodular.
                    let lift = (a + d - b - c).max(0);
                    (p, q, [a as Real, (b + lift) as Real, c as Real, d as Real])
                })
                .collect(),
        })
    })
}

proptest! {
    #[test]
    fn direct_solve_matches_brute_force(problem in submodular_problem()) {
        let mut model = problem.build();
        let outcome = model.solve().unwrap();
        prop_assert_eq!(model.minimum_energy(&outcome), problem.brute_force_min());
    }

    #[test]
    fn labels_reproduce_flow(problem in submodular_problem()) {
        let mut model = problem.build();
        let outcome = model.solve().unwrap();
        let labels = model.labels().unwrap();
        prop_assert_eq!(
            problem.energy(&labels),
            outcome.flow as Real + model.constant_offset()
        );
    }
}
