//! Network-specific error types.

use sf_core::{Capacity, SfError};

pub type GraphResult<T> = Result<T, GraphError>;

/// Flow network construction and query errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// A node index is outside the allocated range.
    NodeOutOfRange { node: usize, count: usize },

    /// An edge would connect a node to itself.
    SelfLoop { node: usize },

    /// A capacity is negative.
    NegativeCapacity {
        what: &'static str,
        value: Capacity,
    },

    /// A capacity or flow sum no longer fits in [`Capacity`].
    CapacityOverflow { what: &'static str },

    /// A segment was queried before any cut was computed.
    CutNotComputed,
}

impl std::fmt::Display for GraphError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GraphError::NodeOutOfRange { node, count } => {
                write!(f, "Node {} out of range (network has {} nodes)", node, count)
            }
            GraphError::SelfLoop { node } => {
                write!(f, "Edge from node {} to itself", node)
            }
            GraphError::NegativeCapacity { what, value } => {
                write!(f, "Negative {} capacity {}", what, value)
            }
            GraphError::CapacityOverflow { what } => {
                write!(f, "Capacity overflow in {}", what)
            }
            GraphError::CutNotComputed => {
                write!(f, "Segment queried before a minimum cut was computed")
            }
        }
    }
}

impl std::error::Error for GraphError {}

impl From<GraphError> for SfError {
    fn from(err: GraphError) -> Self {
        match err {
            GraphError::NodeOutOfRange { node, count } => SfError::IndexOob {
                what: "network node",
                index: node,
                len: count,
            },
            other => SfError::Invariant {
                what: other.to_string(),
            },
        }
    }
}
