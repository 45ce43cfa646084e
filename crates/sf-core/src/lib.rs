//! sf-core: stable foundation for subflow.
//!
//! Contains:
//! - numeric (Real, Capacity + conversion between them)
//! - ids (canonical node-pair keys)
//! - error (shared error types)

pub mod error;
pub mod ids;
pub mod numeric;

// Re-exports: nice ergonomics for downstream crates
pub use error::{SfError, SfResult};
pub use ids::*;
pub use numeric::*;
