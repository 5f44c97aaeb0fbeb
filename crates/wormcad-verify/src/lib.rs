#![warn(missing_docs)]

//! Verification queries for finished gear solids.
//!
//! - [`find_optimal_rotation`] searches for the relative rotation that
//!   minimizes boolean-intersection volume between a wheel and its
//!   positioned worm (mesh alignment).
//! - [`measure_rim`] ray-casts from the bore surface to find the true
//!   minimum wall thickness, which bore-adjacent features make
//!   non-circular and analytically awkward.
//!
//! Both are pure queries: they never mutate the solids they inspect.

mod align;
mod rim;

pub use align::{find_optimal_rotation, AlignmentOptions, MeshAlignmentResult};
pub use rim::{measure_rim, RimMeasurement, RimOptions};

use thiserror::Error;

/// Errors from verification queries.
#[derive(Debug, Clone, Error)]
pub enum VerifyError {
    /// The wheel tooth count must be positive.
    #[error("tooth count must be positive")]
    InvalidToothCount,

    /// A search step must be positive.
    #[error("search step must be positive, got {0}")]
    InvalidSearchStep(f64),
}
