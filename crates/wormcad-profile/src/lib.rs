#![warn(missing_docs)]

//! Thread cross-section profiles and helical paths for wormcad.
//!
//! This crate holds the purely geometric front end of the gear pipeline:
//! the immutable [`ThreadSpec`] parameter record, the 2D thread profile
//! generator (straight, arc-flank and involute-helicoid styles), and the
//! [`HelixPathGenerator`] that samples the 3D centerline a profile is
//! lofted along: a constant-radius helix for cylindrical worms or an
//! hourglass path for globoid worms.
//!
//! Nothing here touches the geometry kernel; builders in `wormcad-build`
//! combine these into solids.

mod path;
mod profile;
mod spec;

pub use path::{
    extended_length, measured_lead, GloboidThroat, HelixPathGenerator, PathPoint, WormForm,
};
pub use profile::{
    thread_profile, ProfileSection, ARC_FLANK_SAMPLES, MIN_HALF_WIDTH, MIN_PROFILE_HEIGHT,
    TAPER_MIN,
};
pub use spec::{ProfileStyle, ThreadSpec};

use thiserror::Error;

/// Errors from profile and path generation.
#[derive(Debug, Clone, Error)]
pub enum ProfileError {
    /// The configured globoid throat comes out non-positive. This is a
    /// hard precondition violation: the requested shape is impossible.
    #[error(
        "globoid throat pitch radius must be positive, got {radius:.3} \
         (centre distance {centre_distance}, wheel pitch radius \
         {wheel_pitch_radius}, throat reduction {throat_reduction})"
    )]
    InvalidThroat {
        /// The computed (non-positive) throat pitch radius.
        radius: f64,
        /// Configured centre distance.
        centre_distance: f64,
        /// Configured wheel pitch radius.
        wheel_pitch_radius: f64,
        /// Configured throat reduction.
        throat_reduction: f64,
    },

    /// The requested path length is not positive.
    #[error("path length must be positive, got {0}")]
    InvalidLength(f64),

    /// The thread lead is not positive.
    #[error("thread lead must be positive, got {0}")]
    InvalidLead(f64),

    /// Too few samples requested for a path.
    #[error("path needs at least 2 samples, got {0}")]
    TooFewSamples(usize),
}
