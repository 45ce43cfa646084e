//! The energy model: owns unary potentials and the flow network, compiles
//! pairwise terms, and finalizes terminal capacities.

use sf_core::{Capacity, Real, ensure_finite, to_capacity};
use sf_graph::{DinicNetwork, FlowNetwork};
use tracing::{debug, trace, warn};

use crate::config::{EnergyConfig, RepairPolicy};
use crate::decompose::{CostMatrix, cost_matrix, decompose, submodular_excess};
use crate::error::{EnergyError, EnergyResult};
use crate::merge::MergeBuffer;
use crate::repair::{AuxPenalty, linearize, truncate};

/// Lifecycle phase of an [`EnergyModel`].
///
/// `Allocated -> Building -> Finalized -> Solved`; `setup` re-enters
/// `Building` from any phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Network exists, no nodes set up.
    Allocated,
    /// Accepting unary and pairwise terms.
    Building,
    /// Terminal capacities written; ready to solve.
    Finalized,
    /// Cut computed; labels readable.
    Solved,
}

/// Counters describing how pairwise terms were compiled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Diagnostics {
    /// Terms submitted through the auxiliary-linearization policy.
    pub total_terms: usize,
    /// Of those, terms that failed the submodularity test.
    pub non_submodular: usize,
    /// Pairwise edges inserted into the network.
    pub edges: usize,
    /// Auxiliary penalties recorded.
    pub aux_penalties: usize,
}

/// Binary pairwise energy compiled into a two-terminal flow network.
///
/// Label 0 corresponds to the source segment, label 1 to the sink segment.
#[derive(Debug)]
pub struct EnergyModel<N = DinicNetwork> {
    pub(crate) config: EnergyConfig,
    pub(crate) network: N,
    pub(crate) phase: Phase,

    /// `[cost0, cost1]` per node.
    pub(crate) unaries: Vec<[Real; 2]>,
    pub(crate) aux_penalties: Vec<AuxPenalty>,
    pub(crate) merge_buffer: MergeBuffer,
    pub(crate) diagnostics: Diagnostics,

    /// Constant removed from the energy so far.
    pub(crate) offset: Real,
    /// All-zero labeling cost, recorded at finalize when penalties exist.
    pub(crate) baseline: Option<Capacity>,
}

impl<N: FlowNetwork> EnergyModel<N> {
    /// Create a model owning a network pre-sized for the given counts.
    pub fn new(config: EnergyConfig, node_hint: usize, edge_hint: usize) -> EnergyResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            network: N::with_capacity(node_hint, edge_hint),
            phase: Phase::Allocated,
            unaries: Vec::new(),
            aux_penalties: Vec::new(),
            merge_buffer: MergeBuffer::new(),
            diagnostics: Diagnostics::default(),
            offset: 0.0,
            baseline: None,
        })
    }

    /// Replace the owned network with a fresh one; the old one is dropped.
    pub fn rebuild(&mut self, node_hint: usize, edge_hint: usize) {
        self.network = N::with_capacity(node_hint, edge_hint);
        self.unaries.clear();
        self.clear_terms();
        self.phase = Phase::Allocated;
    }

    /// Allocate `node_count` nodes and zero all per-node state.
    ///
    /// Diagnostic counters are kept; [`EnergyModel::reset`] clears them.
    pub fn setup(&mut self, node_count: usize) {
        self.network.allocate(node_count);
        self.unaries.clear();
        self.unaries.resize(node_count, [0.0; 2]);
        self.clear_terms();
        self.phase = Phase::Building;
    }

    /// Clear flow state, counters and every accumulated term. The node count
    /// is kept, with all unary potentials zeroed. The model must be set up
    /// again before new terms are added.
    pub fn reset(&mut self) {
        self.diagnostics = Diagnostics::default();
        self.network.reset_flows();
        self.unaries.fill([0.0; 2]);
        self.clear_terms();
        self.phase = Phase::Allocated;
    }

    fn clear_terms(&mut self) {
        self.aux_penalties.clear();
        self.merge_buffer.clear();
        self.offset = 0.0;
        self.baseline = None;
    }

    pub fn config(&self) -> &EnergyConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn node_count(&self) -> usize {
        self.unaries.len()
    }

    pub fn network(&self) -> &N {
        &self.network
    }

    pub fn diagnostics(&self) -> Diagnostics {
        self.diagnostics
    }

    pub fn non_submodular_count(&self) -> usize {
        self.diagnostics.non_submodular
    }

    pub fn total_term_count(&self) -> usize {
        self.diagnostics.total_terms
    }

    pub fn aux_penalties(&self) -> &[AuxPenalty] {
        &self.aux_penalties
    }

    pub fn merge_buffer(&self) -> &MergeBuffer {
        &self.merge_buffer
    }

    /// Accumulated `[cost0, cost1]` of a node before finalize.
    pub fn unary(&self, node: usize) -> Option<[Real; 2]> {
        self.unaries.get(node).copied()
    }

    /// Constant dropped from the energy: `energy(labels)` equals the cut value
    /// (in energy units) plus this offset.
    pub fn constant_offset(&self) -> Real {
        self.offset
    }

    /// Cost of the all-zero labeling relative to the offset, in capacity
    /// units. Only recorded when auxiliary penalties exist.
    pub fn baseline(&self) -> Option<Capacity> {
        self.baseline
    }

    pub(crate) fn require(&self, op: &'static str, expected: Phase) -> EnergyResult<()> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(EnergyError::Lifecycle {
                op,
                expected,
                actual: self.phase,
            })
        }
    }

    pub(crate) fn check_node(&self, node: usize) -> EnergyResult<()> {
        if node < self.unaries.len() {
            Ok(())
        } else {
            Err(EnergyError::NodeOutOfRange {
                node,
                count: self.unaries.len(),
            })
        }
    }

    fn check_pair(&self, p: usize, q: usize, m: &CostMatrix) -> EnergyResult<()> {
        self.check_node(p)?;
        self.check_node(q)?;
        if p == q {
            return Err(EnergyError::SelfPair { node: p });
        }
        for v in m.iter() {
            ensure_finite(*v, "pairwise cost")?;
        }
        Ok(())
    }

    /// Add `(cost0, cost1)` to a node's unary potential.
    pub fn add_unary_term(&mut self, node: usize, cost0: Real, cost1: Real) -> EnergyResult<()> {
        self.require("add_unary_term", Phase::Building)?;
        self.check_node(node)?;
        ensure_finite(cost0, "unary cost0")?;
        ensure_finite(cost1, "unary cost1")?;
        self.unaries[node][0] += cost0;
        self.unaries[node][1] += cost1;
        Ok(())
    }

    pub fn add_unary_terms(&mut self, node: usize, costs: [Real; 2]) -> EnergyResult<()> {
        self.add_unary_term(node, costs[0], costs[1])
    }

    fn push_unaries(&mut self, p: usize, q: usize, unary_p: [Real; 2], unary_q: [Real; 2]) {
        for label in 0..2 {
            self.unaries[p][label] += unary_p[label];
            self.unaries[q][label] += unary_q[label];
        }
    }

    /// Decompose and insert one network edge. Caller guarantees `m` is
    /// submodular (up to tolerance) and the pair is valid.
    fn insert_edge(&mut self, p: usize, q: usize, m: &CostMatrix) -> EnergyResult<()> {
        let d = decompose(m);
        let scale = self.config.capacity_scale;
        let forward = to_capacity(d.forward, scale)?;
        let backward = to_capacity(d.backward, scale)?;
        self.network.add_edge(p, q, forward, backward)?;
        self.push_unaries(p, q, d.unary_p, d.unary_q);
        self.diagnostics.edges += 1;
        Ok(())
    }

    /// Add a submodular pairwise term as one network edge.
    ///
    /// Fails with [`EnergyError::NotSubmodular`] when `f00 + f11` exceeds
    /// `f01 + f10` by more than the configured tolerance.
    pub fn add_pairwise_term(
        &mut self,
        p: usize,
        q: usize,
        f00: Real,
        f01: Real,
        f10: Real,
        f11: Real,
    ) -> EnergyResult<()> {
        self.add_pairwise_matrix(p, q, &cost_matrix(f00, f01, f10, f11))
    }

    pub fn add_pairwise_matrix(&mut self, p: usize, q: usize, m: &CostMatrix) -> EnergyResult<()> {
        self.require("add_pairwise_term", Phase::Building)?;
        self.check_pair(p, q, m)?;
        let excess = submodular_excess(m);
        if excess > self.config.submodular_tolerance {
            return Err(EnergyError::NotSubmodular { p, q, excess });
        }
        self.insert_edge(p, q, m)
    }

    /// Add a pairwise term, truncating it to submodularity first.
    pub fn add_pairwise_term_trunc(
        &mut self,
        p: usize,
        q: usize,
        f00: Real,
        f01: Real,
        f10: Real,
        f11: Real,
    ) -> EnergyResult<()> {
        self.add_pairwise_matrix_trunc(p, q, &cost_matrix(f00, f01, f10, f11))
    }

    pub fn add_pairwise_matrix_trunc(
        &mut self,
        p: usize,
        q: usize,
        m: &CostMatrix,
    ) -> EnergyResult<()> {
        self.require("add_pairwise_term_trunc", Phase::Building)?;
        self.check_pair(p, q, m)?;
        let t = truncate(m);
        let excess = submodular_excess(&t);
        if excess > 0.0 {
            warn!(p, q, excess, "truncation could not make pairwise term submodular");
            return Err(EnergyError::NotSubmodular { p, q, excess });
        }
        if t != *m {
            trace!(p, q, before = submodular_excess(m), "truncated pairwise term");
        }
        self.insert_edge(p, q, &t)
    }

    /// Add a pairwise term; non-submodular input becomes an auxiliary penalty
    /// instead of an edge.
    pub fn add_pairwise_term_aux(
        &mut self,
        p: usize,
        q: usize,
        f00: Real,
        f01: Real,
        f10: Real,
        f11: Real,
    ) -> EnergyResult<()> {
        self.add_pairwise_matrix_aux(p, q, &cost_matrix(f00, f01, f10, f11))
    }

    pub fn add_pairwise_matrix_aux(
        &mut self,
        p: usize,
        q: usize,
        m: &CostMatrix,
    ) -> EnergyResult<()> {
        self.require("add_pairwise_term_aux", Phase::Building)?;
        self.check_pair(p, q, m)?;
        self.diagnostics.total_terms += 1;

        if submodular_excess(m) <= self.config.submodular_tolerance {
            return self.insert_edge(p, q, m);
        }

        self.diagnostics.non_submodular += 1;
        let lin = linearize(m);
        self.push_unaries(p, q, lin.unary_p, lin.unary_q);
        self.offset += lin.shift;
        self.aux_penalties.push(lin.into_penalty(p, q));
        self.diagnostics.aux_penalties += 1;
        Ok(())
    }

    /// Add a pairwise term through the configured [`RepairPolicy`].
    pub fn add_pairwise_term_repaired(
        &mut self,
        p: usize,
        q: usize,
        f00: Real,
        f01: Real,
        f10: Real,
        f11: Real,
    ) -> EnergyResult<()> {
        self.add_pairwise_matrix_repaired(p, q, &cost_matrix(f00, f01, f10, f11))
    }

    pub fn add_pairwise_matrix_repaired(
        &mut self,
        p: usize,
        q: usize,
        m: &CostMatrix,
    ) -> EnergyResult<()> {
        match self.config.policy {
            RepairPolicy::Truncate => self.add_pairwise_matrix_trunc(p, q, m),
            RepairPolicy::AuxLinearize => self.add_pairwise_matrix_aux(p, q, m),
        }
    }

    /// Buffer a contribution for `(p, q)`; nothing reaches the network until
    /// [`EnergyModel::merge_parallel_edges`].
    pub fn store_pairwise_term(&mut self, p: usize, q: usize, m: &CostMatrix) -> EnergyResult<()> {
        self.require("store_pairwise_term", Phase::Building)?;
        self.check_pair(p, q, m)?;
        self.merge_buffer.store(p, q, m);
        Ok(())
    }

    /// Replay every buffered pair once through the configured policy, after
    /// subtracting the pair's own minimum entry. Returns the number of pairs
    /// replayed; the buffer is left empty.
    pub fn merge_parallel_edges(&mut self) -> EnergyResult<usize> {
        self.require("merge_parallel_edges", Phase::Building)?;
        let mut replayed = 0;
        for (key, m) in self.merge_buffer.drain() {
            let lowest = m.min();
            self.offset += lowest;
            self.add_pairwise_matrix_repaired(key.first(), key.second(), &m.add_scalar(-lowest))?;
            replayed += 1;
        }
        debug!(replayed, "merged parallel pairwise terms");
        Ok(replayed)
    }

    /// Write every node's unary potential into the network's terminal
    /// capacities.
    ///
    /// Each node's smaller cost moves into the constant offset; the node then
    /// pays `cost0 - min` toward the sink (label 0) and `cost1 - min` toward
    /// the source (label 1).
    pub fn finalize(&mut self) -> EnergyResult<()> {
        self.require("finalize", Phase::Building)?;
        if !self.merge_buffer.is_empty() {
            warn!(
                pending = self.merge_buffer.len(),
                "finalizing with unmerged pairwise terms; they are ignored"
            );
        }

        // Convert everything first so a failure leaves the model untouched.
        let scale = self.config.capacity_scale;
        let has_aux = !self.aux_penalties.is_empty();
        let mut weights = Vec::with_capacity(self.unaries.len());
        let mut lowest_sum = 0.0;
        let mut baseline: Capacity = 0;
        for &[cost0, cost1] in &self.unaries {
            let lowest = cost0.min(cost1);
            lowest_sum += lowest;
            let to_sink = to_capacity(cost0 - lowest, scale)?;
            let to_source = to_capacity(cost1 - lowest, scale)?;
            if has_aux {
                baseline = baseline
                    .checked_add(to_sink)
                    .ok_or(EnergyError::CapacityOverflow { what: "baseline" })?;
            }
            weights.push((to_source, to_sink));
        }

        for (node, (to_source, to_sink)) in weights.into_iter().enumerate() {
            self.network.add_terminal_weights(node, to_source, to_sink)?;
        }
        self.offset += lowest_sum;
        self.baseline = has_aux.then_some(baseline);
        self.phase = Phase::Finalized;

        debug!(
            nodes = self.unaries.len(),
            edges = self.diagnostics.edges,
            aux_penalties = self.aux_penalties.len(),
            offset = self.offset,
            baseline = ?self.baseline,
            "finalized energy model"
        );
        Ok(())
    }
}
