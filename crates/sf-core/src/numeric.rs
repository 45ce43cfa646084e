use crate::{SfError, SfResult};

/// Floating point type used for energies.
pub type Real = f64;

/// Integer capacity type used by the flow network.
pub type Capacity = i64;

/// Slack used when testing `f00 + f11 <= f01 + f10` on noisy inputs.
pub const DEFAULT_SUBMODULAR_TOLERANCE: Real = 0.1;

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, SfError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(SfError::NonFinite { what, value: v })
    }
}

/// Convert a non-negative energy into an integer network capacity.
///
/// Values are scaled then rounded to the nearest integer. Results that do not
/// fit in [`Capacity`] are rejected rather than saturated.
pub fn to_capacity(v: Real, scale: Real) -> SfResult<Capacity> {
    let scaled = ensure_finite(v * scale, "scaled capacity")?.round();
    // `Capacity::MAX as Real` rounds up to 2^63, the first value out of range.
    if scaled.abs() >= Capacity::MAX as Real {
        return Err(SfError::InvalidArg {
            what: "capacity exceeds the integer range",
        });
    }
    Ok(scaled as Capacity)
}

/// Inverse of [`to_capacity`], up to rounding.
pub fn from_capacity(c: Capacity, scale: Real) -> Real {
    c as Real / scale
}
