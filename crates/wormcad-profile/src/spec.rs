//! The immutable thread parameter record.

use serde::{Deserialize, Serialize};

/// Flank shape of the thread cross-section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ProfileStyle {
    /// Straight trapezoidal flanks at the nominal pressure angle. The
    /// choice for subtractive machining.
    #[default]
    Straight,
    /// Flanks carry a sampled circular-arc bulge to reduce stress risers.
    /// Used for additively manufactured gears.
    ArcFlank,
    /// Involute helicoid. In axial section this degenerates to the same
    /// straight-flank trapezoid as [`ProfileStyle::Straight`]; the
    /// involute property lives in the 3D sweep, not the planar section.
    InvoluteHelicoid,
}

/// Complete parameter record for one worm thread.
///
/// Created once from the external gear calculator and never mutated.
/// All lengths are in millimetres, angles in degrees.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadSpec {
    /// Gear module (axial pitch / π).
    pub module_mm: f64,
    /// Number of thread starts.
    pub starts: u32,
    /// Pitch radius.
    pub pitch_radius: f64,
    /// Tip (outside) radius.
    pub tip_radius: f64,
    /// Root radius.
    pub root_radius: f64,
    /// Axial advance per full revolution of one thread.
    pub lead: f64,
    /// Helix angle produced by the lead at the pitch radius.
    pub lead_angle_deg: f64,
    /// Nominal flank pressure angle.
    pub pressure_angle_deg: f64,
    /// Radial tooth height above the pitch radius.
    pub addendum: f64,
    /// Radial tooth depth below the pitch radius.
    pub dedendum: f64,
    /// Thread half-width at the pitch line.
    pub half_width_pitch: f64,
    /// Thread half-width at the root.
    pub half_width_root: f64,
    /// Thread half-width at the tip.
    pub half_width_tip: f64,
    /// Left-hand thread (mirrored helix) if true.
    pub left_hand: bool,
    /// Flank profile style.
    pub profile: ProfileStyle,
}

impl ThreadSpec {
    /// Helix direction sign: `+1` for right-hand, `-1` for left-hand.
    pub fn hand_sign(&self) -> f64 {
        if self.left_hand {
            -1.0
        } else {
            1.0
        }
    }

    /// Number of thread turns needed to cover `length` along the axis.
    pub fn turns_for_length(&self, length: f64) -> f64 {
        if self.lead > 0.0 {
            length / self.lead
        } else {
            0.0
        }
    }
}
