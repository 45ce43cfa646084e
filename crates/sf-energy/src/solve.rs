//! Min-cut solve and label extraction.

use sf_core::{Capacity, Real, SfError, from_capacity, to_capacity};
use sf_graph::{FlowNetwork, Segment};
use tracing::{debug, warn};

use crate::error::EnergyResult;
use crate::model::{EnergyModel, Phase};

/// How a solve was carried out, chosen by whether auxiliary penalties exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SolveMode {
    /// Single max-flow on the network as built; exact.
    Direct,
    /// Penalties biased into terminal weights before the max-flow; an upper
    /// bound.
    AuxBiased,
}

/// Result of [`EnergyModel::solve`]. Values are in capacity units, relative
/// to [`EnergyModel::constant_offset`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SolveOutcome {
    pub mode: SolveMode,
    /// Max-flow value returned by the network.
    pub flow: Capacity,
    /// Reported minimum-energy bound: `flow`, or `min(flow, baseline)` in
    /// aux-biased mode.
    pub energy_bound: Capacity,
    /// All-zero labeling cost; `None` in direct mode.
    pub baseline: Option<Capacity>,
    /// True when an aux-biased flow came out above the baseline.
    pub exceeded_baseline: bool,
}

impl<N: FlowNetwork> EnergyModel<N> {
    /// Compute the minimum cut. Requires [`EnergyModel::finalize`].
    pub fn solve(&mut self) -> EnergyResult<SolveOutcome> {
        self.require("solve", Phase::Finalized)?;
        let outcome = if self.aux_penalties.is_empty() {
            self.solve_direct()?
        } else {
            self.solve_aux_biased()?
        };
        self.phase = Phase::Solved;
        debug!(
            mode = ?outcome.mode,
            flow = outcome.flow,
            energy_bound = outcome.energy_bound,
            "solved energy model"
        );
        Ok(outcome)
    }

    fn solve_direct(&mut self) -> EnergyResult<SolveOutcome> {
        let flow = self.network.compute_min_cut()?;
        Ok(SolveOutcome {
            mode: SolveMode::Direct,
            flow,
            energy_bound: flow,
            baseline: None,
            exceeded_baseline: false,
        })
    }

    /// Bias both endpoints of every penalty by half its score toward label
    /// 1, then run one max-flow. Since `x_p * x_q <= (x_p + x_q) / 2` this
    /// over-approximates each penalty, so the flow bounds the true minimum
    /// from above and can never beat the all-zero labeling's cost.
    fn solve_aux_biased(&mut self) -> EnergyResult<SolveOutcome> {
        let baseline = self.baseline.ok_or_else(|| SfError::Invariant {
            what: "auxiliary penalties present but finalize recorded no baseline".into(),
        })?;

        let scale = self.config.capacity_scale;
        let biases = self
            .aux_penalties
            .iter()
            .map(|penalty| -> EnergyResult<_> {
                let bias = to_capacity(penalty.score / 2.0, scale)?;
                Ok((penalty.p, penalty.q, bias))
            })
            .collect::<EnergyResult<Vec<_>>>()?;
        for (p, q, bias) in biases {
            self.network.add_terminal_weights(p, bias, 0)?;
            self.network.add_terminal_weights(q, bias, 0)?;
        }

        let flow = self.network.compute_min_cut()?;
        let exceeded_baseline = flow > baseline;
        if exceeded_baseline {
            warn!(
                flow,
                baseline, "aux-biased flow exceeds the all-zero baseline; energy increased"
            );
        }
        let energy_bound = flow.min(baseline);
        self.baseline = Some(energy_bound);

        Ok(SolveOutcome {
            mode: SolveMode::AuxBiased,
            flow,
            energy_bound,
            baseline: Some(baseline),
            exceeded_baseline,
        })
    }

    /// Label of `node` in the computed cut: 0 on the source side, 1 on the
    /// sink side.
    pub fn label(&self, node: usize) -> EnergyResult<usize> {
        self.require("label", Phase::Solved)?;
        self.check_node(node)?;
        Ok(match self.network.segment_of(node)? {
            Segment::Source => 0,
            Segment::Sink => 1,
        })
    }

    /// Labels of all nodes, in index order.
    pub fn labels(&self) -> EnergyResult<Vec<usize>> {
        (0..self.node_count()).map(|node| self.label(node)).collect()
    }

    /// `outcome.energy_bound` converted back to energy units, offset included.
    pub fn minimum_energy(&self, outcome: &SolveOutcome) -> Real {
        from_capacity(outcome.energy_bound, self.config.capacity_scale) + self.offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EnergyConfig;
    use crate::error::EnergyError;

    fn model(n: usize) -> EnergyModel {
        let mut m = EnergyModel::new(EnergyConfig::default(), n, n).unwrap();
        m.setup(n);
        m
    }

    #[test]
    fn solve_requires_finalize() {
        let mut m = model(1);
        assert!(matches!(
            m.solve(),
            Err(EnergyError::Lifecycle {
                expected: Phase::Finalized,
                actual: Phase::Building,
                ..
            })
        ));
    }

    #[test]
    fn label_requires_solve() {
        let mut m = model(1);
        m.finalize().unwrap();
        assert!(m.label(0).is_err());
        m.solve().unwrap();
        assert_eq!(m.label(0).unwrap(), 0);
        assert!(matches!(
            m.label(3),
            Err(EnergyError::NodeOutOfRange { node: 3, count: 1 })
        ));
    }

    #[test]
    fn unary_only_picks_cheaper_label() {
        let mut m = model(3);
        m.add_unary_term(0, 1.0, 5.0).unwrap();
        m.add_unary_term(1, 6.0, 2.0).unwrap();
        m.add_unary_term(2, 3.0, 3.0).unwrap();
        m.finalize().unwrap();
        let out = m.solve().unwrap();
        assert_eq!(out.mode, SolveMode::Direct);
        assert_eq!(out.flow, 0);
        assert_eq!(m.minimum_energy(&out), 6.0);
        assert_eq!(&m.labels().unwrap()[..2], &[0, 1]);
    }

    #[test]
    fn solve_twice_is_rejected() {
        let mut m = model(1);
        m.finalize().unwrap();
        m.solve().unwrap();
        assert!(m.solve().is_err());
    }

    #[test]
    fn aux_mode_reports_bound_and_baseline() {
        let mut m = model(2);
        m.add_pairwise_term_aux(0, 1, 0.0, 1.0, 1.0, 3.0).unwrap();
        m.finalize().unwrap();
        let out = m.solve().unwrap();
        assert_eq!(out.mode, SolveMode::AuxBiased);
        assert_eq!(out.baseline, Some(0));
        assert_eq!(out.flow, 0);
        assert_eq!(out.energy_bound, 0);
        assert!(!out.exceeded_baseline);
        assert_eq!(m.labels().unwrap(), vec![0, 0]);
    }

    #[test]
    fn capacity_scale_round_trips_energy() {
        let config = EnergyConfig::default().with_capacity_scale(10.0);
        let mut m: EnergyModel = EnergyModel::new(config, 2, 1).unwrap();
        m.setup(2);
        m.add_unary_term(0, 0.0, 0.5).unwrap();
        m.add_unary_term(1, 0.7, 0.0).unwrap();
        m.add_pairwise_term(0, 1, 0.0, 0.3, 0.3, 0.0).unwrap();
        m.finalize().unwrap();
        let out = m.solve().unwrap();
        // Best is (0, 1) at 0.3; (0, 0) costs 0.7, (1, 1) costs 0.5.
        assert_eq!(out.flow, 3);
        assert!((m.minimum_energy(&out) - 0.3).abs() < 1e-9);
        assert_eq!(m.labels().unwrap(), vec![0, 1]);
    }
}
