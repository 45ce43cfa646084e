//! Error types for energy model operations.

use sf_core::{Real, SfError};
use sf_graph::GraphError;
use thiserror::Error;

use crate::model::Phase;

/// Errors that can occur while building or solving an energy model.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EnergyError {
    #[error("Network error: {0}")]
    Graph(#[from] GraphError),

    #[error("Core error: {0}")]
    Core(#[from] SfError),

    #[error("Pair ({p}, {q}) is not submodular: f00 + f11 exceeds f01 + f10 by {excess}")]
    NotSubmodular { p: usize, q: usize, excess: Real },

    #[error("`{op}` requires the model to be {expected:?}, but it is {actual:?}")]
    Lifecycle {
        op: &'static str,
        expected: Phase,
        actual: Phase,
    },

    #[error("Node {node} out of range (model has {count} nodes)")]
    NodeOutOfRange { node: usize, count: usize },

    #[error("Pairwise term connects node {node} to itself")]
    SelfPair { node: usize },

    #[error("Capacity overflow while summing the {what}")]
    CapacityOverflow { what: &'static str },

    #[error("Invalid configuration: {what}")]
    Config { what: String },
}

pub type EnergyResult<T> = Result<T, EnergyError>;

impl From<EnergyError> for SfError {
    fn from(e: EnergyError) -> Self {
        match e {
            EnergyError::Graph(g) => g.into(),
            EnergyError::Core(c) => c,
            EnergyError::NotSubmodular { .. } => SfError::InvalidArg {
                what: "non-submodular pairwise term",
            },
            EnergyError::Lifecycle { op, .. } => SfError::Invariant {
                what: format!("lifecycle violation in {op}"),
            },
            EnergyError::NodeOutOfRange { node, count } => SfError::IndexOob {
                what: "model node",
                index: node,
                len: count,
            },
            EnergyError::SelfPair { .. } => SfError::InvalidArg { what: "self pair" },
            EnergyError::CapacityOverflow { .. } => SfError::InvalidArg {
                what: "capacity overflow",
            },
            EnergyError::Config { .. } => SfError::InvalidArg {
                what: "configuration",
            },
        }
    }
}
