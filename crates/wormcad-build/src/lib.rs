#![warn(missing_docs)]

//! Solid assembly for worm threads and wheel teeth.
//!
//! Two builders live here:
//!
//! - [`ThreadSolidBuilder`] lofts tapered thread cross-sections along the
//!   helical path, unions them with the core cylinder and trims the
//!   extended taper zones back to the requested length.
//! - [`VirtualHobbingSimulator`] generates wheel teeth by simulating the
//!   kinematics of a hobbing machine: cutter and blank move through a
//!   fixed gear ratio while material is removed by boolean subtraction.
//!
//! Both recover locally from individual kernel failures (a failed union
//! degrades to a named fallback, a failed cut is logged and skipped), so a
//! build either yields a usable solid, possibly imperfect, or fails only
//! for genuinely impossible input geometry.

mod hobbing;
mod thread;

pub use hobbing::{
    HobbingOptions, HobbingState, HobbingStrategy, VirtualHobbingSimulator, MAX_HOBBING_STEPS,
    MIN_HOBBING_STEPS,
};
pub use thread::{ThreadBuildOptions, ThreadSolidBuilder};

use thiserror::Error;

/// Errors from solid building and hobbing simulation.
#[derive(Debug, Error)]
pub enum BuildError {
    /// The requested thread length is not positive.
    #[error("thread length must be positive, got {0}")]
    InvalidLength(f64),

    /// Too few loft sections per turn to form a solid.
    #[error("sections per turn must be at least 3, got {0}")]
    TooFewSections(u32),

    /// Hobbing step count outside the accepted range. Very low counts give
    /// meaningless results, very high counts risk resource exhaustion.
    #[error("hobbing step count {0} out of range (6..=1000)")]
    StepCountOutOfRange(u32),

    /// Hobbing needs at least one tooth and one start.
    #[error("hobbing requires at least one wheel tooth and one worm start")]
    InvalidHobbingRatio,

    /// A profile/path precondition was violated (impossible geometry).
    #[error(transparent)]
    Profile(#[from] wormcad_profile::ProfileError),

    /// A kernel precondition failed before any recovery was possible.
    #[error(transparent)]
    Kernel(#[from] wormcad_kernel::KernelError),
}
