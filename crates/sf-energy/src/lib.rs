//! Binary pairwise energy minimization via min-cut.
//!
//! This crate compiles per-node unary costs and per-pair 2×2 cost matrices
//! into a two-terminal flow network whose minimum cut equals the energy
//! minimum. Pairwise terms that are not submodular are either truncated
//! (lossy) or linearized into auxiliary penalties that bias the solve
//! (upper bound).
//!
//! # Example
//!
//! ```
//! use sf_energy::{EnergyConfig, EnergyModel};
//!
//! let mut model: EnergyModel = EnergyModel::new(EnergyConfig::default(), 3, 2).unwrap();
//! model.setup(3);
//! model.add_unary_term(0, 0.0, 4.0).unwrap();
//! model.add_unary_term(2, 4.0, 0.0).unwrap();
//! model.add_pairwise_term(0, 1, 0.0, 2.0, 2.0, 0.0).unwrap();
//! model.add_pairwise_term(1, 2, 0.0, 2.0, 2.0, 0.0).unwrap();
//! model.finalize().unwrap();
//!
//! let outcome = model.solve().unwrap();
//! assert_eq!(model.minimum_energy(&outcome), 2.0);
//! assert_eq!(model.label(0).unwrap(), 0);
//! assert_eq!(model.label(2).unwrap(), 1);
//! ```

pub mod config;
pub mod decompose;
pub mod error;
pub mod merge;
pub mod model;
pub mod repair;
pub mod solve;

pub use config::{EnergyConfig, RepairPolicy};
pub use decompose::{CostMatrix, Decomposition, cost_matrix, decompose, is_submodular};
pub use error::{EnergyError, EnergyResult};
pub use merge::MergeBuffer;
pub use model::{Diagnostics, EnergyModel, Phase};
pub use repair::{AuxPenalty, Linearization, linearize, truncate};
pub use solve::{SolveMode, SolveOutcome};
