//! Runtime configuration for the energy model.

use sf_core::{DEFAULT_SUBMODULAR_TOLERANCE, Real};

use crate::error::{EnergyError, EnergyResult};

/// How non-submodular pairwise terms are made safe for the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum RepairPolicy {
    /// Clamp the larger diagonal entry until the matrix is submodular.
    /// Fast, lossy.
    Truncate,
    /// Keep the residual as an auxiliary penalty and bias the solve.
    #[default]
    AuxLinearize,
}

/// Energy model configuration.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EnergyConfig {
    /// Policy used by `add_pairwise_term_repaired` and `merge_parallel_edges`.
    pub policy: RepairPolicy,
    /// Slack allowed on `f00 + f11 <= f01 + f10` before a term counts as
    /// non-submodular.
    pub submodular_tolerance: Real,
    /// Multiplier applied to energies before rounding to integer capacities.
    pub capacity_scale: Real,
}

impl Default for EnergyConfig {
    fn default() -> Self {
        Self {
            policy: RepairPolicy::default(),
            submodular_tolerance: DEFAULT_SUBMODULAR_TOLERANCE,
            capacity_scale: 1.0,
        }
    }
}

impl EnergyConfig {
    pub fn with_policy(mut self, policy: RepairPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_capacity_scale(mut self, scale: Real) -> Self {
        self.capacity_scale = scale;
        self
    }

    pub fn validate(&self) -> EnergyResult<()> {
        if !self.submodular_tolerance.is_finite() || self.submodular_tolerance < 0.0 {
            return Err(EnergyError::Config {
                what: format!(
                    "submodular_tolerance must be finite and >= 0, got {}",
                    self.submodular_tolerance
                ),
            });
        }
        if !self.capacity_scale.is_finite() || self.capacity_scale <= 0.0 {
            return Err(EnergyError::Config {
                what: format!(
                    "capacity_scale must be finite and > 0, got {}",
                    self.capacity_scale
                ),
            });
        }
        Ok(())
    }
}
