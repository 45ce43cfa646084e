//! Dinic max-flow over a two-terminal network.

use std::collections::VecDeque;

use sf_core::Capacity;
use tracing::trace;

use crate::error::{GraphError, GraphResult};
use crate::network::{FlowNetwork, Segment};

/// A pairwise edge as submitted, before it is laid into the residual graph.
#[derive(Debug, Clone, Copy)]
struct PairEdge {
    p: usize,
    q: usize,
    forward: Capacity,
    backward: Capacity,
}

/// Residual arc; `rev` indexes the paired arc in `adj[to]`.
#[derive(Debug, Clone)]
struct FlowArc {
    to: usize,
    rev: usize,
    cap: Capacity,
}

/// Dinic's algorithm on `n` nodes plus source (`n`) and sink (`n + 1`).
///
/// Capacities are kept as submitted and the residual graph is rebuilt on
/// every [`FlowNetwork::compute_min_cut`], so weights added after a solve are
/// honored by the next one.
#[derive(Debug, Clone, Default)]
pub struct DinicNetwork {
    node_count: usize,
    terminal_source: Vec<Capacity>,
    terminal_sink: Vec<Capacity>,
    edges: Vec<PairEdge>,

    adj: Vec<Vec<FlowArc>>,
    level: Vec<i32>,
    iter: Vec<usize>,

    /// Empty until a cut is computed.
    segments: Vec<Segment>,
}

impl DinicNetwork {
    /// Accumulated `(source, sink)` terminal capacities of `node`.
    pub fn terminal_weights(&self, node: usize) -> Option<(Capacity, Capacity)> {
        let source = self.terminal_source.get(node)?;
        let sink = self.terminal_sink.get(node)?;
        Some((*source, *sink))
    }

    fn source(&self) -> usize {
        self.node_count
    }

    fn sink(&self) -> usize {
        self.node_count + 1
    }

    fn check_node(&self, node: usize) -> GraphResult<()> {
        if node < self.node_count {
            Ok(())
        } else {
            Err(GraphError::NodeOutOfRange {
                node,
                count: self.node_count,
            })
        }
    }

    fn push_arc_pair(&mut self, from: usize, to: usize, cap: Capacity, rev_cap: Capacity) {
        let (rf, rt) = (self.adj[to].len(), self.adj[from].len());
        self.adj[from].push(FlowArc { to, rev: rf, cap });
        self.adj[to].push(FlowArc {
            to: from,
            rev: rt,
            cap: rev_cap,
        });
    }

    /// Lay the stored capacities into a fresh residual graph.
    ///
    /// Returns the flow that terminal weights carry directly (`min` of the two
    /// terminal capacities of each node).
    fn build_residual(&mut self) -> GraphResult<Capacity> {
        let vertex_count = self.node_count + 2;
        self.adj = vec![Vec::new(); vertex_count];
        self.level = vec![-1; vertex_count];
        self.iter = vec![0; vertex_count];

        let (s, t) = (self.source(), self.sink());
        let mut direct = 0;
        for node in 0..self.node_count {
            let (cs, ct) = (self.terminal_source[node], self.terminal_sink[node]);
            let shared = cs.min(ct);
            direct = checked_sum(direct, shared, "direct terminal flow")?;
            if cs > shared {
                self.push_arc_pair(s, node, cs - shared, 0);
            }
            if ct > shared {
                self.push_arc_pair(node, t, ct - shared, 0);
            }
        }

        for i in 0..self.edges.len() {
            let e = self.edges[i];
            self.push_arc_pair(e.p, e.q, e.forward, e.backward);
        }
        Ok(direct)
    }

    fn bfs(&mut self, s: usize) {
        self.level.fill(-1);
        self.level[s] = 0;
        let mut q = VecDeque::new();
        q.push_back(s);
        while let Some(v) = q.pop_front() {
            for e in &self.adj[v] {
                if e.cap > 0 && self.level[e.to] < 0 {
                    self.level[e.to] = self.level[v] + 1;
                    q.push_back(e.to);
                }
            }
        }
    }

    /// Blocking flow on the current level graph, with an explicit path stack
    /// so long augmenting paths do not grow the call stack.
    fn blocking_flow(&mut self, s: usize, t: usize) -> GraphResult<Capacity> {
        let mut total = 0;
        let mut path: Vec<(usize, usize)> = Vec::new();
        let mut v = s;

        loop {
            if v == t {
                let f = path
                    .iter()
                    .map(|&(u, i)| self.adj[u][i].cap)
                    .min()
                    .unwrap_or(0);
                for &(u, i) in &path {
                    self.adj[u][i].cap -= f;
                    let (to, rev) = (self.adj[u][i].to, self.adj[u][i].rev);
                    self.adj[to][rev].cap += f;
                }
                total = checked_sum(total, f, "blocking flow")?;

                // Retreat to the tail of the first saturated arc.
                let cut = path
                    .iter()
                    .position(|&(u, i)| self.adj[u][i].cap == 0)
                    .unwrap_or(0);
                v = path[cut].0;
                path.truncate(cut);
                continue;
            }

            let mut advanced = false;
            while self.iter[v] < self.adj[v].len() {
                let i = self.iter[v];
                let (to, cap) = (self.adj[v][i].to, self.adj[v][i].cap);
                if cap > 0 && self.level[to] == self.level[v] + 1 {
                    path.push((v, i));
                    v = to;
                    advanced = true;
                    break;
                }
                self.iter[v] += 1;
            }
            if advanced {
                continue;
            }

            // Dead end: prune v from the level graph and back up.
            self.level[v] = -1;
            match path.pop() {
                Some((u, _)) => {
                    self.iter[u] += 1;
                    v = u;
                }
                None => break,
            }
        }
        Ok(total)
    }

    /// Mark every vertex that can still reach the sink in the residual graph.
    fn sink_reachable(&self) -> Vec<bool> {
        let t = self.sink();
        let mut seen = vec![false; self.adj.len()];
        seen[t] = true;
        let mut q = VecDeque::new();
        q.push_back(t);
        while let Some(v) = q.pop_front() {
            for e in &self.adj[v] {
                // `e` is v -> u; its pair is the arc u -> v.
                let u = e.to;
                if !seen[u] && self.adj[u][e.rev].cap > 0 {
                    seen[u] = true;
                    q.push_back(u);
                }
            }
        }
        seen
    }
}

fn checked_sum(a: Capacity, b: Capacity, what: &'static str) -> GraphResult<Capacity> {
    a.checked_add(b).ok_or(GraphError::CapacityOverflow { what })
}

impl FlowNetwork for DinicNetwork {
    fn with_capacity(node_hint: usize, edge_hint: usize) -> Self {
        Self {
            terminal_source: Vec::with_capacity(node_hint),
            terminal_sink: Vec::with_capacity(node_hint),
            edges: Vec::with_capacity(edge_hint),
            ..Self::default()
        }
    }

    fn allocate(&mut self, node_count: usize) {
        self.node_count = node_count;
        self.terminal_source.clear();
        self.terminal_source.resize(node_count, 0);
        self.terminal_sink.clear();
        self.terminal_sink.resize(node_count, 0);
        self.edges.clear();
        self.reset_flows();
    }

    fn node_count(&self) -> usize {
        self.node_count
    }

    fn edge_count(&self) -> usize {
        self.edges.len()
    }

    fn add_terminal_weights(
        &mut self,
        node: usize,
        cap_source: Capacity,
        cap_sink: Capacity,
    ) -> GraphResult<()> {
        self.check_node(node)?;
        if cap_source < 0 {
            return Err(GraphError::NegativeCapacity {
                what: "source terminal",
                value: cap_source,
            });
        }
        if cap_sink < 0 {
            return Err(GraphError::NegativeCapacity {
                what: "sink terminal",
                value: cap_sink,
            });
        }
        let source = checked_sum(self.terminal_source[node], cap_source, "source terminal")?;
        let sink = checked_sum(self.terminal_sink[node], cap_sink, "sink terminal")?;
        self.terminal_source[node] = source;
        self.terminal_sink[node] = sink;
        Ok(())
    }

    fn add_edge(
        &mut self,
        p: usize,
        q: usize,
        forward: Capacity,
        backward: Capacity,
    ) -> GraphResult<()> {
        self.check_node(p)?;
        self.check_node(q)?;
        if p == q {
            return Err(GraphError::SelfLoop { node: p });
        }
        if forward < 0 {
            return Err(GraphError::NegativeCapacity {
                what: "forward",
                value: forward,
            });
        }
        if backward < 0 {
            return Err(GraphError::NegativeCapacity {
                what: "backward",
                value: backward,
            });
        }
        // A saturated arc hands its capacity to the reverse arc.
        checked_sum(forward, backward, "pairwise edge")?;
        self.edges.push(PairEdge {
            p,
            q,
            forward,
            backward,
        });
        Ok(())
    }

    fn compute_min_cut(&mut self) -> GraphResult<Capacity> {
        let mut flow = self.build_residual()?;
        let (s, t) = (self.source(), self.sink());
        let mut phases = 0_usize;
        loop {
            self.bfs(s);
            if self.level[t] < 0 {
                break;
            }
            self.iter.fill(0);
            let pushed = self.blocking_flow(s, t)?;
            flow = checked_sum(flow, pushed, "max flow")?;
            phases += 1;
        }

        let reach = self.sink_reachable();
        self.segments = (0..self.node_count)
            .map(|node| {
                if reach[node] {
                    Segment::Sink
                } else {
                    Segment::Source
                }
            })
            .collect();

        trace!(
            nodes = self.node_count,
            edges = self.edges.len(),
            phases,
            flow,
            "dinic max-flow complete"
        );
        Ok(flow)
    }

    fn segment_of(&self, node: usize) -> GraphResult<Segment> {
        self.check_node(node)?;
        self.segments
            .get(node)
            .copied()
            .ok_or(GraphError::CutNotComputed)
    }

    fn reset_flows(&mut self) {
        self.adj.clear();
        self.level.clear();
        self.iter.clear();
        self.segments.clear();
    }
}
