//! Kinematic virtual-hobbing simulation.

use serde::{Deserialize, Serialize};
use wormcad_math::{Dir3, Point3, Vec3};
use wormcad_kernel::{KernelContext, Solid};
use wormcad_repair::simplify;

use crate::BuildError;

/// Fewest accepted hobbing steps.
pub const MIN_HOBBING_STEPS: u32 = 6;

/// Most accepted hobbing steps.
pub const MAX_HOBBING_STEPS: u32 = 1000;

/// How the accumulated cutting geometry is applied to the blank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HobbingStrategy {
    /// Union all positioned hob copies into one envelope, then subtract it
    /// from the blank once. Fewer booleans, but one very large one;
    /// intermediate simplification bounds face-count growth.
    Envelope,
    /// Subtract the hob from the blank at every step. More booleans, each
    /// smaller and more numerically stable.
    #[default]
    Incremental,
}

/// Options for a hobbing run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HobbingOptions {
    /// Number of simulated steps over one wheel revolution.
    pub steps: u32,
    /// Cutting strategy.
    pub strategy: HobbingStrategy,
    /// A point on the hob's spin axis.
    pub hob_axis_origin: [f64; 3],
    /// Direction of the hob's spin axis.
    pub hob_axis_dir: [f64; 3],
}

impl Default for HobbingOptions {
    fn default() -> Self {
        Self {
            steps: 36,
            strategy: HobbingStrategy::Incremental,
            hob_axis_origin: [0.0, 0.0, 0.0],
            hob_axis_dir: [1.0, 0.0, 0.0],
        }
    }
}

/// Kinematic state at one simulated step.
///
/// The coupling invariant `hob_angle == wheel_angle * ratio` holds exactly
/// at every step; `ratio = teeth / starts`.
#[derive(Debug, Clone, Copy)]
pub struct HobbingState {
    /// Step index in `0..steps`.
    pub step: u32,
    /// Wheel rotation at this step, degrees.
    pub wheel_angle_deg: f64,
    /// Hob rotation at this step, degrees.
    pub hob_angle_deg: f64,
    /// Gear ratio (teeth per start).
    pub ratio: f64,
}

impl HobbingState {
    /// Check the kinematic coupling invariant.
    pub fn coupling_holds(&self) -> bool {
        (self.hob_angle_deg - self.wheel_angle_deg * self.ratio).abs() < 1e-9
    }
}

/// Simulates gear cutting: a worm-shaped cutter and the wheel blank rotate
/// through a fixed kinematic ratio while boolean subtraction removes
/// material. The blank's axis is Z through the origin; the hob solid is
/// already positioned by the caller and spins about the configured axis.
#[derive(Debug, Clone)]
pub struct VirtualHobbingSimulator {
    teeth: u32,
    starts: u32,
    options: HobbingOptions,
}

impl VirtualHobbingSimulator {
    /// Create a simulator, validating the step count and ratio up front.
    pub fn new(teeth: u32, starts: u32, options: HobbingOptions) -> Result<Self, BuildError> {
        if teeth == 0 || starts == 0 {
            return Err(BuildError::InvalidHobbingRatio);
        }
        if !(MIN_HOBBING_STEPS..=MAX_HOBBING_STEPS).contains(&options.steps) {
            return Err(BuildError::StepCountOutOfRange(options.steps));
        }
        Ok(Self {
            teeth,
            starts,
            options,
        })
    }

    /// Gear ratio (teeth per start).
    pub fn ratio(&self) -> f64 {
        self.teeth as f64 / self.starts as f64
    }

    /// The full kinematic schedule, one state per step.
    pub fn states(&self) -> Vec<HobbingState> {
        let n = self.options.steps;
        let ratio = self.ratio();
        (0..n)
            .map(|i| {
                let wheel_angle_deg = i as f64 * 360.0 / n as f64;
                HobbingState {
                    step: i,
                    wheel_angle_deg,
                    hob_angle_deg: wheel_angle_deg * ratio,
                    ratio,
                }
            })
            .collect()
    }

    /// Run the simulation and return the cut blank.
    ///
    /// Steps whose boolean fails are logged and skipped; the simulation
    /// always completes with the accumulated result. The progress hook is
    /// invoked synchronously once per step.
    pub fn run(
        &self,
        ctx: &KernelContext,
        blank: &Solid,
        hob: &Solid,
        mut progress: Option<&mut dyn FnMut(u32, u32)>,
    ) -> Result<Solid, BuildError> {
        let states = self.states();
        let result = match self.options.strategy {
            HobbingStrategy::Incremental => {
                self.run_incremental(ctx, blank, hob, &states, &mut progress)
            }
            HobbingStrategy::Envelope => {
                self.run_envelope(ctx, blank, hob, &states, &mut progress)
            }
        };
        Ok(result)
    }

    fn hob_axis(&self) -> (Point3, Dir3) {
        let o = self.options.hob_axis_origin;
        let d = self.options.hob_axis_dir;
        let dir = Vec3::new(d[0], d[1], d[2]);
        let dir = if dir.norm() > 1e-12 {
            Dir3::new_normalize(dir)
        } else {
            Dir3::new_normalize(Vec3::x())
        };
        (Point3::new(o[0], o[1], o[2]), dir)
    }

    /// The cutter pose at one step, in the blank's frame.
    fn positioned_hob(&self, ctx: &KernelContext, hob: &Solid, state: &HobbingState) -> Solid {
        debug_assert!(state.coupling_holds());
        let (origin, axis) = self.hob_axis();
        let spun = ctx.rotate_about(hob, &origin, &axis, state.hob_angle_deg);
        ctx.rotate_z(&spun, -state.wheel_angle_deg)
    }

    fn run_incremental(
        &self,
        ctx: &KernelContext,
        blank: &Solid,
        hob: &Solid,
        states: &[HobbingState],
        progress: &mut Option<&mut dyn FnMut(u32, u32)>,
    ) -> Solid {
        let total = states.len() as u32;
        let (origin, axis) = self.hob_axis();
        let mut wheel = blank.clone();

        for state in states {
            if let Some(hook) = progress.as_deref_mut() {
                hook(state.step, total);
            }
            debug_assert!(state.coupling_holds());

            // Rotate the blank into the hob's frame, cut against the
            // spinning (but otherwise fixed-position) hob, rotate back.
            let in_frame = ctx.rotate_z(&wheel, state.wheel_angle_deg);
            let cutter = ctx.rotate_about(hob, &origin, &axis, state.hob_angle_deg);
            match ctx.boolean_subtract(&in_frame, &cutter) {
                Ok(cut) => wheel = ctx.rotate_z(&cut, -state.wheel_angle_deg),
                Err(e) => {
                    log::warn!("hobbing step {} skipped: {e}", state.step);
                }
            }
        }
        wheel
    }

    fn run_envelope(
        &self,
        ctx: &KernelContext,
        blank: &Solid,
        hob: &Solid,
        states: &[HobbingState],
        progress: &mut Option<&mut dyn FnMut(u32, u32)>,
    ) -> Solid {
        let total = states.len() as u32;
        let simplify_every = total.div_ceil(6).max(1);
        let mut envelope = Solid::empty();

        for state in states {
            if let Some(hook) = progress.as_deref_mut() {
                hook(state.step, total);
            }

            let positioned = self.positioned_hob(ctx, hob, state);
            match ctx.boolean_union(&envelope, &positioned) {
                Ok(u) => envelope = u,
                Err(e) => log::warn!(
                    "envelope accumulation at step {} skipped: {e}",
                    state.step
                ),
            }
            if (state.step + 1) % simplify_every == 0 {
                envelope = simplify(ctx, &envelope);
            }
        }

        let envelope = self.trim_to_cutting_zone(ctx, &envelope, blank);

        match ctx.boolean_subtract(blank, &envelope) {
            Ok(cut) => cut,
            Err(e) => {
                log::warn!("envelope subtraction failed ({e}); returning uncut blank");
                blank.clone()
            }
        }
    }

    /// Spatially trim the envelope to a bounding cylinder around the true
    /// cutting zone, so the final subtraction sees a smaller operand.
    fn trim_to_cutting_zone(&self, ctx: &KernelContext, envelope: &Solid, blank: &Solid) -> Solid {
        let (min, max) = match ctx.bounding_box(blank) {
            Ok(b) => b,
            Err(_) => return envelope.clone(),
        };
        let margin = 1.0;
        let radius = min
            .x
            .abs()
            .max(max.x.abs())
            .max(min.y.abs())
            .max(max.y.abs())
            * std::f64::consts::SQRT_2
            + margin;
        let height = (max.z - min.z) + 2.0 * margin;
        let zone = match ctx.create_cylinder(radius, height) {
            Ok(c) => ctx.translate(&c, 0.0, 0.0, min.z - margin),
            Err(_) => return envelope.clone(),
        };
        match ctx.boolean_intersect(envelope, &zone) {
            Ok(trimmed) if !trimmed.is_empty() => trimmed,
            Ok(_) => {
                log::warn!("envelope does not reach the cutting zone");
                Solid::empty()
            }
            Err(e) => {
                log::warn!("envelope trim failed ({e}); using untrimmed envelope");
                envelope.clone()
            }
        }
    }
}
