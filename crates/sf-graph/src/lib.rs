//! sf-graph: flow-network layer for subflow.
//!
//! Provides:
//! - The [`FlowNetwork`] trait: the two-terminal max-flow/min-cut primitive
//!   the energy model compiles into
//! - [`DinicNetwork`], a reference implementation using Dinic's algorithm
//!
//! # Example
//!
//! ```
//! use sf_graph::{DinicNetwork, FlowNetwork, Segment};
//!
//! let mut net = DinicNetwork::with_capacity(2, 1);
//! net.allocate(2);
//! net.add_terminal_weights(0, 5, 0).unwrap();
//! net.add_terminal_weights(1, 0, 4).unwrap();
//! net.add_edge(0, 1, 3, 0).unwrap();
//!
//! assert_eq!(net.compute_min_cut().unwrap(), 3);
//! assert_eq!(net.segment_of(0).unwrap(), Segment::Source);
//! assert_eq!(net.segment_of(1).unwrap(), Segment::Sink);
//! ```

pub mod dinic;
pub mod error;
pub mod network;

// Re-exports for ergonomics
pub use dinic::DinicNetwork;
pub use error::{GraphError, GraphResult};
pub use network::{FlowNetwork, Segment};
