//! Worm thread solid assembly.

use serde::{Deserialize, Serialize};
use wormcad_kernel::{KernelContext, KernelError, Solid};
use wormcad_profile::{
    extended_length, thread_profile, HelixPathGenerator, ProfileSection, ThreadSpec, WormForm,
    TAPER_MIN,
};
use wormcad_repair::{repair, simplify};

use crate::BuildError;

/// Options for thread solid construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadBuildOptions {
    /// Loft sections per thread turn.
    pub sections_per_turn: u32,
    /// Use ruled (straight) lateral faces in the loft.
    pub ruled_loft: bool,
}

impl Default for ThreadBuildOptions {
    fn default() -> Self {
        Self {
            sections_per_turn: 48,
            ruled_loft: true,
        }
    }
}

/// Builds the complete worm solid: threads lofted along the helix, a core
/// cylinder at root radius, end-taper zones trimmed to the exact length.
///
/// The result is computed once on the first [`build`](Self::build) call,
/// cached, and returned unchanged afterwards. Rebuilding with different
/// parameters requires a new builder instance.
#[derive(Debug)]
pub struct ThreadSolidBuilder {
    spec: ThreadSpec,
    form: WormForm,
    length: f64,
    options: ThreadBuildOptions,
    cached: Option<Solid>,
}

impl ThreadSolidBuilder {
    /// Create a builder for a worm of the given nominal length.
    pub fn new(spec: ThreadSpec, form: WormForm, length: f64, options: ThreadBuildOptions) -> Self {
        Self {
            spec,
            form,
            length,
            options,
            cached: None,
        }
    }

    /// Build the worm solid (memoized).
    pub fn build(&mut self, ctx: &KernelContext) -> Result<Solid, BuildError> {
        if let Some(cached) = &self.cached {
            return Ok(cached.clone());
        }
        let solid = self.build_uncached(ctx)?;
        self.cached = Some(solid.clone());
        Ok(solid)
    }

    fn build_uncached(&self, ctx: &KernelContext) -> Result<Solid, BuildError> {
        if self.length <= 0.0 {
            return Err(BuildError::InvalidLength(self.length));
        }
        if self.options.sections_per_turn < 3 {
            return Err(BuildError::TooFewSections(self.options.sections_per_turn));
        }

        let lead = self.spec.lead;
        let ext_length = extended_length(self.length, lead);
        let turns = self.spec.turns_for_length(ext_length);
        let n_sections =
            ((turns * self.options.sections_per_turn as f64).ceil() as usize + 1).max(2);

        let generator = HelixPathGenerator::new(&self.spec, self.form);
        let mut threads: Vec<Solid> = Vec::new();

        for k in 0..self.spec.starts {
            let start_deg = k as f64 * 360.0 / self.spec.starts as f64;
            // An impossible globoid throat surfaces here, before any
            // kernel call is made.
            let path = generator.sample(start_deg, ext_length, n_sections)?;

            let mut rings = Vec::with_capacity(path.len());
            for point in &path {
                let taper = taper_factor(point.position.z, ext_length / 2.0, lead);
                if let Some(profile) = thread_profile(&self.spec, taper, self.spec.profile) {
                    let section = ProfileSection::at_path_point(&profile, point, taper);
                    rings.push(section.points);
                }
            }

            if rings.len() < 2 {
                log::warn!("start {k}: no usable sections, skipping thread");
                continue;
            }
            match ctx.loft_sections(&rings, self.options.ruled_loft) {
                Ok(solid) => threads.push(solid),
                Err(e) => log::warn!("start {k}: loft failed ({e}), skipping thread"),
            }
        }

        let core = ctx.create_cylinder(self.spec.root_radius, ext_length)?;
        let core = ctx.translate(&core, 0.0, 0.0, -ext_length / 2.0);

        let solid = if threads.is_empty() {
            // Degenerate but valid: the bare core is still a usable shaft.
            log::warn!("no threads were produced; returning bare core cylinder");
            core
        } else {
            let mut merged = threads[0].clone();
            for (k, thread) in threads.iter().enumerate().skip(1) {
                match ctx.boolean_union(&merged, thread) {
                    Ok(u) => merged = u,
                    Err(e) => log::warn!("union of start {k} failed ({e}); start dropped"),
                }
            }
            union_with_fallback(ctx, &core, &merged)
        };

        let trimmed = self.trim_to_length(ctx, &solid);

        let outcome = repair(ctx, &trimmed);
        if !outcome.valid {
            log::warn!(
                "worm solid is still invalid after repair (last strategy: {})",
                outcome.strategy
            );
        }
        Ok(outcome.solid)
    }

    /// Cut away the tapered extension zones beyond the nominal half-length
    /// on both ends, leaving full-depth thread at both cut faces.
    fn trim_to_length(&self, ctx: &KernelContext, solid: &Solid) -> Solid {
        let span = 2.0 * (1.05 * self.spec.pitch_radius + self.spec.addendum).max(self.spec.tip_radius);
        let cut_depth = 2.0 * self.spec.lead;
        let half = self.length / 2.0;

        let cutter = match ctx.create_box(2.0 * span, 2.0 * span, cut_depth) {
            Ok(b) => b,
            Err(e) => {
                log::warn!("trim cutter construction failed ({e}); leaving ends untrimmed");
                return solid.clone();
            }
        };
        let top = ctx.translate(&cutter, -span, -span, half);
        let bottom = ctx.translate(&cutter, -span, -span, -half - cut_depth);

        let mut result = solid.clone();
        for (end, cut) in [("top", &top), ("bottom", &bottom)] {
            match ctx.boolean_subtract(&result, cut) {
                Ok(s) => result = s,
                Err(e) => log::warn!("{end} trim cut failed ({e}); end left untrimmed"),
            }
        }
        result
    }
}

/// Taper factor at axial position `z`: ramps with a cosine ease from the
/// minimum at the extended extremities to 1.0 over one lead, and is 1.0
/// through the interior. Never returns zero; a zero-area section would
/// be degenerate.
fn taper_factor(z: f64, half_extended: f64, lead: f64) -> f64 {
    let from_end = (half_extended - z.abs()).max(0.0);
    if from_end >= lead {
        return 1.0;
    }
    let eased = 0.5 * (1.0 - (std::f64::consts::PI * from_end / lead).cos());
    TAPER_MIN + (1.0 - TAPER_MIN) * eased
}

/// Try the union strategies in order and return the first success; the
/// final strategy merges boundaries without classification and cannot
/// fail.
fn union_with_fallback(ctx: &KernelContext, core: &Solid, threads: &Solid) -> Solid {
    type Op<'a> = (
        &'static str,
        Box<dyn Fn() -> Result<Solid, KernelError> + 'a>,
    );
    let attempts: Vec<Op> = vec![
        ("boolean-union", Box::new(|| ctx.boolean_union(core, threads))),
        (
            "boolean-union-simplified",
            Box::new(|| {
                let a = simplify(ctx, core);
                let b = simplify(ctx, threads);
                ctx.boolean_union(&a, &b)
            }),
        ),
    ];

    for (name, op) in attempts {
        match op() {
            Ok(solid) => {
                if name != "boolean-union" {
                    log::warn!("core/thread union degraded to {name}");
                }
                return solid;
            }
            Err(e) => log::warn!("union strategy {name} failed: {e}"),
        }
    }
    log::warn!("all union strategies failed; merging boundaries unclassified");
    ctx.merge_unclassified(core, threads)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wormcad_profile::ProfileStyle;

    fn sample_spec() -> ThreadSpec {
        let module = 2.0;
        ThreadSpec {
            module_mm: module,
            starts: 1,
            pitch_radius: 8.1446,
            tip_radius: 10.1446,
            root_radius: 5.6446,
            lead: std::f64::consts::PI * module,
            lead_angle_deg: 7.0,
            pressure_angle_deg: 20.0,
            addendum: module,
            dedendum: 1.25 * module,
            half_width_pitch: std::f64::consts::PI * module / 4.0,
            half_width_root: std::f64::consts::PI * module / 4.0
                + 1.25 * module * 20.0_f64.to_radians().tan(),
            half_width_tip: std::f64::consts::PI * module / 4.0
                - module * 20.0_f64.to_radians().tan(),
            left_hand: false,
            profile: ProfileStyle::Straight,
        }
    }

    fn coarse_options() -> ThreadBuildOptions {
        ThreadBuildOptions {
            sections_per_turn: 16,
            ruled_loft: true,
        }
    }

    #[test]
    fn test_taper_factor_profile() {
        let lead = 6.0;
        let half_ext = 16.0; // nominal 20 + one lead per end
        // Full depth through the interior and at the nominal cut faces.
        assert!((taper_factor(0.0, half_ext, lead) - 1.0).abs() < 1e-12);
        assert!((taper_factor(10.0, half_ext, lead) - 1.0).abs() < 1e-12);
        // Minimum at the extended extremities.
        assert!((taper_factor(16.0, half_ext, lead) - TAPER_MIN).abs() < 1e-12);
        assert!((taper_factor(-16.0, half_ext, lead) - TAPER_MIN).abs() < 1e-12);
        // Monotone ramp inside the taper zone.
        let a = taper_factor(15.0, half_ext, lead);
        let b = taper_factor(13.0, half_ext, lead);
        assert!(TAPER_MIN < a && a < b && b < 1.0);
    }

    #[test]
    fn test_build_volume_within_root_and_tip_bounds() {
        let ctx = KernelContext::with_segments(24);
        let spec = sample_spec();
        let length = 1.5 * spec.lead;
        let mut builder =
            ThreadSolidBuilder::new(spec.clone(), WormForm::Cylindrical, length, coarse_options());
        let solid = builder.build(&ctx).unwrap();

        let vol = ctx.volume(&solid);
        let lower = std::f64::consts::PI * spec.root_radius.powi(2) * length;
        let upper = std::f64::consts::PI * spec.tip_radius.powi(2) * length;
        assert!(
            vol > lower && vol < upper,
            "volume {vol} outside ({lower}, {upper})"
        );
    }

    #[test]
    fn test_build_trims_to_nominal_length() {
        let ctx = KernelContext::with_segments(24);
        let spec = sample_spec();
        let length = 1.5 * spec.lead;
        let mut builder =
            ThreadSolidBuilder::new(spec, WormForm::Cylindrical, length, coarse_options());
        let solid = builder.build(&ctx).unwrap();

        let (min, max) = ctx.bounding_box(&solid).unwrap();
        assert!((max.z - length / 2.0).abs() < 1e-6, "max z {}", max.z);
        assert!((min.z + length / 2.0).abs() < 1e-6, "min z {}", min.z);
    }

    #[test]
    fn test_build_is_memoized() {
        let ctx = KernelContext::with_segments(16);
        let spec = sample_spec();
        let mut builder = ThreadSolidBuilder::new(
            spec.clone(),
            WormForm::Cylindrical,
            spec.lead,
            coarse_options(),
        );
        let first = builder.build(&ctx).unwrap();
        let second = builder.build(&ctx).unwrap();
        assert_eq!(
            first.mesh().polygons.len(),
            second.mesh().polygons.len(),
            "second build must return the cached solid"
        );
        assert!((ctx.volume(&first) - ctx.volume(&second)).abs() < 1e-12);
    }

    #[test]
    fn test_degenerate_spec_returns_bare_core() {
        let ctx = KernelContext::with_segments(24);
        let mut spec = sample_spec();
        // Shrink the tooth below the degeneracy floors: every section is
        // skipped and the core cylinder alone comes back.
        spec.module_mm = 0.02;
        spec.addendum = 0.02;
        spec.dedendum = 0.025;
        spec.half_width_root = 0.02;
        spec.half_width_tip = 0.01;
        let length = 2.0 * spec.lead;
        let mut builder =
            ThreadSolidBuilder::new(spec.clone(), WormForm::Cylindrical, length, coarse_options());
        let solid = builder.build(&ctx).unwrap();

        let core_volume = std::f64::consts::PI * spec.root_radius.powi(2) * length;
        let vol = ctx.volume(&solid);
        assert!(
            (vol - core_volume).abs() < core_volume * 0.05,
            "expected bare core ~{core_volume}, got {vol}"
        );
    }

    #[test]
    fn test_build_rejects_bad_length() {
        let ctx = KernelContext::default();
        let mut builder = ThreadSolidBuilder::new(
            sample_spec(),
            WormForm::Cylindrical,
            -5.0,
            ThreadBuildOptions::default(),
        );
        assert!(matches!(
            builder.build(&ctx),
            Err(BuildError::InvalidLength(_))
        ));
    }

    #[test]
    fn test_invalid_globoid_throat_fails_before_kernel_work() {
        let ctx = KernelContext::default();
        let throat = wormcad_profile::GloboidThroat {
            centre_distance: 48.0,
            wheel_pitch_radius: 30.0,
            throat_reduction: 20.0,
        };
        let mut builder = ThreadSolidBuilder::new(
            sample_spec(),
            WormForm::Globoid(throat),
            20.0,
            ThreadBuildOptions::default(),
        );
        assert!(matches!(
            builder.build(&ctx),
            Err(BuildError::Profile(
                wormcad_profile::ProfileError::InvalidThroat { .. }
            ))
        ));
    }
}
