//! The two-terminal flow network seam.

use sf_core::Capacity;

use crate::error::GraphResult;

/// Side of the minimum cut a node ended up on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Same side as the source terminal.
    Source,
    /// Same side as the sink terminal.
    Sink,
}

/// Max-flow/min-cut primitive over `n` non-terminal nodes plus a source and
/// a sink terminal.
///
/// Capacities are integral and non-negative. Terminal weights and edges are
/// additive: repeated calls for the same node or pair accumulate.
pub trait FlowNetwork {
    /// Create an empty network pre-sized for `node_hint` nodes and
    /// `edge_hint` pairwise edges.
    fn with_capacity(node_hint: usize, edge_hint: usize) -> Self
    where
        Self: Sized;

    /// Drop all nodes, edges and flow, then allocate `node_count` fresh nodes.
    fn allocate(&mut self, node_count: usize);

    /// Number of non-terminal nodes.
    fn node_count(&self) -> usize;

    /// Number of pairwise edges added since the last `allocate`.
    fn edge_count(&self) -> usize;

    /// Add capacity from the source to `node` and from `node` to the sink.
    ///
    /// A node left on the sink side pays `cap_source`; a node on the source
    /// side pays `cap_sink`.
    fn add_terminal_weights(
        &mut self,
        node: usize,
        cap_source: Capacity,
        cap_sink: Capacity,
    ) -> GraphResult<()>;

    /// Add an edge `p -> q` with `forward` capacity and `q -> p` with
    /// `backward` capacity.
    fn add_edge(
        &mut self,
        p: usize,
        q: usize,
        forward: Capacity,
        backward: Capacity,
    ) -> GraphResult<()>;

    /// Compute the maximum flow, which equals the minimum cut value.
    ///
    /// Fails with [`GraphError::CapacityOverflow`](crate::GraphError::CapacityOverflow) when the
    /// flow does not fit in [`Capacity`].
    fn compute_min_cut(&mut self) -> GraphResult<Capacity>;

    /// Side of the last computed cut `node` lies on.
    fn segment_of(&self, node: usize) -> GraphResult<Segment>;

    /// Clear flow state and cut segmentation, keeping nodes and edges.
    fn reset_flows(&mut self);
}
