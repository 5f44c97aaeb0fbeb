#![warn(missing_docs)]

//! wormcad: worm-and-wheel gear pair solid generation.
//!
//! Turns engineering parameters (module, lead angle, tooth counts, profile
//! style) into dimensionally-correct boundary-representation solids:
//! thread profiles with end tapering, helical and globoid sweeps, virtual
//! hobbing of wheel teeth, mesh-alignment search, topology repair, and
//! ray-cast rim thickness measurement.
//!
//! # Example
//!
//! ```no_run
//! use wormcad::{build_worm, KernelContext, ProfileStyle, WormDesign, WormForm};
//!
//! let ctx = KernelContext::default();
//! let design = WormDesign {
//!     module_mm: 2.0,
//!     starts: 1,
//!     lead_angle_deg: 7.0,
//!     pressure_angle_deg: 20.0,
//!     length: 30.0,
//!     bore_diameter: 6.0,
//!     left_hand: false,
//!     profile: ProfileStyle::Straight,
//!     form: WormForm::Cylindrical,
//! };
//! let worm = build_worm(&ctx, &design).unwrap();
//! assert!(ctx.volume(&worm) > 0.0);
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use wormcad_build::{
    BuildError, HobbingOptions, HobbingState, HobbingStrategy, ThreadBuildOptions,
    ThreadSolidBuilder, VirtualHobbingSimulator,
};
pub use wormcad_kernel::{KernelContext, KernelError, Solid};
pub use wormcad_profile::{
    GloboidThroat, HelixPathGenerator, ProfileError, ProfileStyle, ThreadSpec, WormForm,
};
pub use wormcad_repair::{repair, simplify, RepairOutcome};
pub use wormcad_verify::{
    find_optimal_rotation, measure_rim, AlignmentOptions, MeshAlignmentResult, RimMeasurement,
    RimOptions, VerifyError,
};

/// Errors from the high-level gear operations.
#[derive(Debug, Error)]
pub enum GearError {
    /// A design parameter makes the requested gear impossible.
    #[error("invalid design: {0}")]
    InvalidDesign(String),

    /// Solid building failed.
    #[error(transparent)]
    Build(#[from] BuildError),

    /// Verification failed.
    #[error(transparent)]
    Verify(#[from] VerifyError),

    /// A kernel precondition failed.
    #[error(transparent)]
    Kernel(#[from] KernelError),
}

/// Worm design parameters, as produced by the external gear calculator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WormDesign {
    /// Gear module (mm).
    pub module_mm: f64,
    /// Number of thread starts.
    pub starts: u32,
    /// Target lead angle at the pitch radius (degrees).
    pub lead_angle_deg: f64,
    /// Flank pressure angle (degrees).
    pub pressure_angle_deg: f64,
    /// Nominal worm length (mm).
    pub length: f64,
    /// Shaft bore diameter used for rim reporting (mm).
    pub bore_diameter: f64,
    /// Left-hand thread if true.
    pub left_hand: bool,
    /// Flank profile style.
    pub profile: ProfileStyle,
    /// Cylindrical or globoid body.
    pub form: WormForm,
}

impl WormDesign {
    /// Derive the full thread parameter record.
    ///
    /// Standard proportions: lead `π·m·starts`, addendum `m`, dedendum
    /// `1.25·m`, pitch radius from the target lead angle, half-widths from
    /// the pressure angle.
    pub fn thread_spec(&self) -> Result<ThreadSpec, GearError> {
        if self.module_mm <= 0.0 {
            return Err(GearError::InvalidDesign(format!(
                "module must be positive, got {}",
                self.module_mm
            )));
        }
        if self.starts == 0 {
            return Err(GearError::InvalidDesign("worm needs at least one start".into()));
        }
        if !(0.0..90.0).contains(&self.lead_angle_deg) || self.lead_angle_deg == 0.0 {
            return Err(GearError::InvalidDesign(format!(
                "lead angle must be in (0, 90) degrees, got {}",
                self.lead_angle_deg
            )));
        }

        let module = self.module_mm;
        let lead = std::f64::consts::PI * module * self.starts as f64;
        let pitch_radius =
            module * self.starts as f64 / (2.0 * self.lead_angle_deg.to_radians().tan());
        let addendum = module;
        let dedendum = 1.25 * module;
        let pressure_tan = self.pressure_angle_deg.to_radians().tan();
        let half_width_pitch = std::f64::consts::PI * module / 4.0;

        Ok(ThreadSpec {
            module_mm: module,
            starts: self.starts,
            pitch_radius,
            tip_radius: pitch_radius + addendum,
            root_radius: pitch_radius - dedendum,
            lead,
            lead_angle_deg: self.lead_angle_deg,
            pressure_angle_deg: self.pressure_angle_deg,
            addendum,
            dedendum,
            half_width_pitch,
            half_width_root: half_width_pitch + dedendum * pressure_tan,
            half_width_tip: half_width_pitch - addendum * pressure_tan,
            left_hand: self.left_hand,
            profile: self.profile,
        })
    }
}

/// Wheel design parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WheelDesign {
    /// Number of wheel teeth.
    pub teeth: u32,
    /// Face width along the wheel axis (mm).
    pub width: f64,
    /// Bore diameter used for rim reporting (mm).
    pub bore_diameter: f64,
    /// Cut a globoid-matched waist into the blank rim before hobbing.
    pub throated: bool,
}

impl WheelDesign {
    /// Wheel pitch radius for a given worm module.
    pub fn pitch_radius(&self, module_mm: f64) -> f64 {
        self.teeth as f64 * module_mm / 2.0
    }

    /// Wheel tip (outside) radius for a given worm module.
    pub fn tip_radius(&self, module_mm: f64) -> f64 {
        self.pitch_radius(module_mm) + module_mm
    }
}

/// Centre distance between the worm and wheel axes.
pub fn centre_distance(worm: &WormDesign, wheel: &WheelDesign) -> Result<f64, GearError> {
    let spec = worm.thread_spec()?;
    Ok(spec.pitch_radius + wheel.pitch_radius(worm.module_mm))
}

/// Build the worm solid for a design.
pub fn build_worm(ctx: &KernelContext, design: &WormDesign) -> Result<Solid, GearError> {
    let spec = design.thread_spec()?;
    let mut builder =
        ThreadSolidBuilder::new(spec, design.form, design.length, ThreadBuildOptions::default());
    Ok(builder.build(ctx)?)
}

/// Build the wheel blank: a plain cylinder at the wheel tip radius,
/// centered on the origin, optionally throated to hug the worm.
pub fn wheel_blank(
    ctx: &KernelContext,
    worm: &WormDesign,
    wheel: &WheelDesign,
) -> Result<Solid, GearError> {
    if wheel.width <= 0.0 {
        return Err(GearError::InvalidDesign(format!(
            "wheel width must be positive, got {}",
            wheel.width
        )));
    }
    let tip_radius = wheel.tip_radius(worm.module_mm);
    let blank = ctx.create_cylinder(tip_radius, wheel.width)?;
    let mut blank = ctx.translate(&blank, 0.0, 0.0, -wheel.width / 2.0);

    if wheel.throated {
        let spec = worm.thread_spec()?;
        let a = centre_distance(worm, wheel)?;
        let throat_radius = spec.tip_radius + 0.5;
        let length = 2.0 * tip_radius + 2.0;
        let cutter = ctx.create_cylinder(throat_radius, length)?;
        // Stand the cutter along X at the worm axis position.
        let axis_y = wormcad_math::Dir3::new_normalize(wormcad_math::Vec3::y());
        let cutter = ctx.rotate_about(
            &cutter,
            &wormcad_math::Point3::origin(),
            &axis_y,
            90.0,
        );
        let cutter = ctx.translate(&cutter, -length / 2.0, a, 0.0);
        match ctx.boolean_subtract(&blank, &cutter) {
            Ok(cut) => blank = cut,
            Err(e) => log::warn!("throating cut failed ({e}); blank left cylindrical"),
        }
    }
    Ok(blank)
}

/// Position a worm solid (built on the Z axis) into mesh with a wheel at
/// the origin: worm axis along X, offset to the centre distance along Y.
pub fn position_worm(ctx: &KernelContext, worm_solid: &Solid, centre_distance: f64) -> Solid {
    let axis_y = wormcad_math::Dir3::new_normalize(wormcad_math::Vec3::y());
    let along_x = ctx.rotate_about(worm_solid, &wormcad_math::Point3::origin(), &axis_y, 90.0);
    ctx.translate(&along_x, 0.0, centre_distance, 0.0)
}

/// Build the wheel by virtual hobbing, using the worm itself as the hob.
///
/// The blank spins about Z; the hob sits beside it at the centre distance
/// with its axis along X, coupled at `teeth / starts`.
pub fn build_wheel(
    ctx: &KernelContext,
    worm: &WormDesign,
    wheel: &WheelDesign,
    steps: u32,
    strategy: HobbingStrategy,
) -> Result<Solid, GearError> {
    let a = centre_distance(worm, wheel)?;
    let blank = wheel_blank(ctx, worm, wheel)?;
    let hob = position_worm(ctx, &build_worm(ctx, worm)?, a);

    let simulator = VirtualHobbingSimulator::new(
        wheel.teeth,
        worm.starts,
        HobbingOptions {
            steps,
            strategy,
            hob_axis_origin: [0.0, a, 0.0],
            hob_axis_dir: [1.0, 0.0, 0.0],
        },
    )?;
    let cut = simulator.run(ctx, &blank, &hob, None)?;

    let outcome = repair(ctx, &cut);
    if !outcome.valid {
        log::warn!(
            "wheel solid is still invalid after repair (last strategy: {})",
            outcome.strategy
        );
    }
    Ok(outcome.solid)
}

/// Verification summary for a finished worm/wheel pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairReport {
    /// Mesh alignment search result.
    pub alignment: MeshAlignmentResult,
    /// Rim measurement of the worm shaft.
    pub worm_rim: RimMeasurement,
    /// Rim measurement of the wheel.
    pub wheel_rim: RimMeasurement,
    /// Always `None`: tooth-contact-ratio analysis is mathematically
    /// invalid for this geometry and deliberately not evaluated.
    pub contact_ratio: Option<f64>,
}

/// Verify a finished pair: mesh alignment plus rim thickness on both parts.
///
/// Both solids are taken in their build frames (axis Z); the worm is
/// positioned against the wheel internally for the interference search.
/// `rim_threshold` is the wall thickness below which the measurements
/// raise their warning flag.
pub fn verify_pair(
    ctx: &KernelContext,
    wheel_solid: &Solid,
    worm_solid: &Solid,
    worm: &WormDesign,
    wheel: &WheelDesign,
    rim_threshold: f64,
) -> Result<PairReport, GearError> {
    let a = centre_distance(worm, wheel)?;
    let positioned = position_worm(ctx, worm_solid, a);
    let alignment = find_optimal_rotation(
        ctx,
        wheel_solid,
        &positioned,
        wheel.teeth,
        &AlignmentOptions::default(),
    )?;
    let worm_rim = measure_rim(
        ctx,
        worm_solid,
        worm.bore_diameter,
        rim_threshold,
        true,
        &RimOptions::default(),
    );
    let wheel_rim = measure_rim(
        ctx,
        wheel_solid,
        wheel.bore_diameter,
        rim_threshold,
        false,
        &RimOptions::default(),
    );
    Ok(PairReport {
        alignment,
        worm_rim,
        wheel_rim,
        contact_ratio: None,
    })
}
