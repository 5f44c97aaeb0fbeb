//! Ray-cast rim thickness measurement.

use serde::{Deserialize, Serialize};
use wormcad_kernel::{KernelContext, Solid};
use wormcad_math::{Point3, Vec3};

/// Options for the rim measurement sample grid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RimOptions {
    /// Angular sample positions around the bore.
    pub angular_samples: u32,
    /// Axial sample stations away from the part's extremities.
    pub axial_samples: u32,
    /// Offset along the ray before accepting a hit, so the bore surface
    /// itself is not reported (mm).
    pub surface_offset: f64,
}

impl Default for RimOptions {
    fn default() -> Self {
        Self {
            angular_samples: 72,
            axial_samples: 5,
            surface_offset: 0.01,
        }
    }
}

/// Result of a rim thickness measurement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RimMeasurement {
    /// Minimum thickness found across all samples (mm).
    pub min_thickness: f64,
    /// Sample point on the nominal bore surface realizing the minimum.
    pub inner_point: [f64; 3],
    /// First boundary hit outward of `inner_point`.
    pub outer_point: [f64; 3],
    /// True when the minimum is below the caller's threshold.
    pub below_threshold: bool,
    /// False when no measurement could be taken at all.
    pub valid: bool,
    /// Explanation when the measurement is invalid or thin.
    pub diagnostic: String,
}

impl RimMeasurement {
    fn invalid(diagnostic: String) -> Self {
        Self {
            min_thickness: 0.0,
            inner_point: [0.0; 3],
            outer_point: [0.0; 3],
            below_threshold: false,
            valid: false,
            diagnostic,
        }
    }
}

/// Measure the true minimum wall thickness from the bore to the outer
/// boundary by radial ray casting.
///
/// Points are sampled on the nominal bore cylinder over a grid of angular
/// and axial positions kept away from the axial extremities; from each,
/// a ray is cast radially outward and the first intersection beyond a
/// small offset is recorded. The minimum parameter over all samples is
/// the rim thickness. A closed-form root-minus-bore calculation would
/// miss keyway slots and flats, which make the true minimum non-circular.
///
/// Never panics: missing geometry or rays that find no outer surface
/// produce an invalid measurement with a diagnostic instead.
pub fn measure_rim(
    ctx: &KernelContext,
    solid: &Solid,
    bore_diameter: f64,
    threshold: f64,
    is_worm_part: bool,
    options: &RimOptions,
) -> RimMeasurement {
    if bore_diameter <= 0.0 {
        return RimMeasurement::invalid(format!(
            "bore diameter must be positive, got {bore_diameter}"
        ));
    }
    if options.angular_samples == 0 || options.axial_samples == 0 {
        return RimMeasurement::invalid("sample grid must not be empty".to_string());
    }

    let (min, max) = match ctx.bounding_box(solid) {
        Ok(bounds) => bounds,
        Err(e) => {
            return RimMeasurement::invalid(format!("bounding box unavailable: {e}"));
        }
    };

    // Worm shafts keep a larger margin from the ends (thread run-out);
    // wheel rims only need to clear edge chamfer territory.
    let margin_fraction = if is_worm_part { 0.15 } else { 0.10 };
    let span = max.z - min.z;
    if span <= 0.0 {
        return RimMeasurement::invalid("solid has no axial extent".to_string());
    }
    let z_start = min.z + span * margin_fraction;
    let z_end = max.z - span * margin_fraction;

    let bore_radius = bore_diameter / 2.0;
    let mut best: Option<(f64, Point3, Point3)> = None;

    for zi in 0..options.axial_samples {
        let z = if options.axial_samples == 1 {
            (z_start + z_end) / 2.0
        } else {
            z_start + (z_end - z_start) * zi as f64 / (options.axial_samples - 1) as f64
        };
        for ai in 0..options.angular_samples {
            let angle = 2.0 * std::f64::consts::PI * ai as f64 / options.angular_samples as f64;
            let dir = Vec3::new(angle.cos(), angle.sin(), 0.0);
            let origin = Point3::new(bore_radius * dir.x, bore_radius * dir.y, z);

            let hits = ctx.ray_intersect(solid, &origin, &dir);
            if let Some(&t) = hits.iter().find(|&&t| t > options.surface_offset) {
                let outer = origin + dir * t;
                if best.as_ref().map_or(true, |(b, _, _)| t < *b) {
                    best = Some((t, origin, outer));
                }
            }
        }
    }

    match best {
        Some((thickness, inner, outer)) => {
            let below = thickness < threshold;
            if below {
                log::warn!(
                    "rim thickness {thickness:.3} mm is below the {threshold:.3} mm threshold"
                );
            }
            RimMeasurement {
                min_thickness: thickness,
                inner_point: [inner.x, inner.y, inner.z],
                outer_point: [outer.x, outer.y, outer.z],
                below_threshold: below,
                valid: true,
                diagnostic: if below {
                    format!("thickness {thickness:.3} mm below threshold {threshold:.3} mm")
                } else {
                    String::new()
                },
            }
        }
        None => RimMeasurement::invalid(
            "no outer boundary found from the bore surface (hollow or invalid geometry)"
                .to_string(),
        ),
    }
}
