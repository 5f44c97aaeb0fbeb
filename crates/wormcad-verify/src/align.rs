//! Two-phase grid search for the optimal mesh rotation.

use serde::{Deserialize, Serialize};
use wormcad_kernel::{KernelContext, Solid};
use wormcad_math::normalize_angle_deg;

use crate::VerifyError;

/// An intersection volume below this is treated as a perfect mesh.
const ZERO_VOLUME_EPS: f64 = 1e-9;

/// Options for the alignment search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlignmentOptions {
    /// Coarse pass step across the full tooth pitch, degrees.
    pub coarse_step_deg: f64,
    /// Fine pass step inside the window around the coarse optimum, degrees.
    pub fine_step_deg: f64,
    /// Residual interference volume the caller accepts (mm³).
    pub volume_tolerance: f64,
}

impl Default for AlignmentOptions {
    fn default() -> Self {
        Self {
            coarse_step_deg: 1.0,
            fine_step_deg: 0.2,
            volume_tolerance: 1e-3,
        }
    }
}

/// Result of a mesh alignment search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeshAlignmentResult {
    /// Optimal wheel rotation, degrees, in `[0, 360/teeth)`.
    pub rotation_deg: f64,
    /// Interference volume remaining at the optimal rotation (mm³).
    pub residual_volume: f64,
    /// Angular tooth pitch, `360 / teeth`, degrees.
    pub tooth_pitch_deg: f64,
    /// Whether the residual volume is within the caller's tolerance.
    pub within_tolerance: bool,
    /// Human-readable summary of how the search ended.
    pub status: String,
}

/// Find the wheel rotation minimizing interference with the positioned worm.
///
/// The tooth pattern repeats every `360 / num_teeth` degrees, so exactly
/// one tooth pitch is searched: a coarse pass over the whole pitch, then a
/// fine pass in a one-coarse-step window around the coarse optimum. Either
/// phase exits early the instant a zero-volume intersection is found.
pub fn find_optimal_rotation(
    ctx: &KernelContext,
    wheel: &Solid,
    worm: &Solid,
    num_teeth: u32,
    options: &AlignmentOptions,
) -> Result<MeshAlignmentResult, VerifyError> {
    if num_teeth == 0 {
        return Err(VerifyError::InvalidToothCount);
    }
    for step in [options.coarse_step_deg, options.fine_step_deg] {
        if step <= 0.0 {
            return Err(VerifyError::InvalidSearchStep(step));
        }
    }

    let pitch = 360.0 / num_teeth as f64;
    let interference = |angle_deg: f64| -> f64 {
        let rotated = ctx.rotate_z(wheel, angle_deg);
        match ctx.boolean_intersect(&rotated, worm) {
            Ok(overlap) => ctx.volume(&overlap),
            Err(e) => {
                log::warn!("interference check at {angle_deg:.2} deg failed: {e}");
                f64::INFINITY
            }
        }
    };

    // Coarse pass over one tooth pitch.
    let mut best_angle = 0.0;
    let mut best_volume = f64::INFINITY;
    let mut angle = 0.0;
    while angle < pitch {
        let volume = interference(angle);
        if volume < best_volume {
            best_volume = volume;
            best_angle = angle;
        }
        if volume <= ZERO_VOLUME_EPS {
            return Ok(finish(
                angle,
                volume,
                pitch,
                options,
                "perfect mesh found in coarse pass",
            ));
        }
        angle += options.coarse_step_deg;
    }

    // Fine pass in a window around the coarse optimum.
    let mut fine = best_angle - options.coarse_step_deg;
    let window_end = best_angle + options.coarse_step_deg;
    while fine <= window_end {
        let candidate = ((fine % pitch) + pitch) % pitch;
        let volume = interference(candidate);
        if volume < best_volume {
            best_volume = volume;
            best_angle = candidate;
        }
        if volume <= ZERO_VOLUME_EPS {
            return Ok(finish(
                candidate,
                volume,
                pitch,
                options,
                "perfect mesh found in fine pass",
            ));
        }
        fine += options.fine_step_deg;
    }

    let status = if best_volume <= options.volume_tolerance {
        "interference within tolerance"
    } else {
        "interference above tolerance"
    };
    Ok(finish(best_angle, best_volume, pitch, options, status))
}

fn finish(
    angle_deg: f64,
    volume: f64,
    pitch: f64,
    options: &AlignmentOptions,
    status: &str,
) -> MeshAlignmentResult {
    let rotation = normalize_angle_deg(angle_deg) % pitch;
    MeshAlignmentResult {
        rotation_deg: rotation,
        residual_volume: volume,
        tooth_pitch_deg: pitch,
        within_tolerance: volume <= options.volume_tolerance,
        status: status.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_zero_teeth() {
        let ctx = KernelContext::default();
        let a = ctx.create_box(1.0, 1.0, 1.0).unwrap();
        let result = find_optimal_rotation(&ctx, &a, &a, 0, &AlignmentOptions::default());
        assert!(matches!(result, Err(VerifyError::InvalidToothCount)));
    }

    #[test]
    fn test_disjoint_solids_exit_early() {
        let ctx = KernelContext::default();
        let wheel = ctx.create_box(2.0, 2.0, 2.0).unwrap();
        let worm = ctx.translate(&ctx.create_box(2.0, 2.0, 2.0).unwrap(), 50.0, 0.0, 0.0);
        let result =
            find_optimal_rotation(&ctx, &wheel, &worm, 30, &AlignmentOptions::default()).unwrap();
        assert!(result.within_tolerance);
        assert!(result.residual_volume <= ZERO_VOLUME_EPS);
        assert_eq!(result.status, "perfect mesh found in coarse pass");
        assert!((result.rotation_deg - 0.0).abs() < 1e-9);
    }

    #[test]
    fn test_rotation_stays_inside_one_tooth_pitch() {
        let ctx = KernelContext::default();
        // Overlapping solids: a box through the wheel axis and a fixed bar.
        let wheel = ctx.translate(&ctx.create_box(8.0, 1.0, 1.0).unwrap(), -4.0, -0.5, -0.5);
        let worm = ctx.translate(&ctx.create_box(1.0, 8.0, 1.0).unwrap(), -0.5, -4.0, -0.5);
        let teeth = 12; // 30 degree pitch
        let result = find_optimal_rotation(
            &ctx,
            &wheel,
            &worm,
            teeth,
            &AlignmentOptions {
                coarse_step_deg: 5.0,
                fine_step_deg: 1.0,
                volume_tolerance: 1e-3,
            },
        )
        .unwrap();
        assert!((0.0..30.0).contains(&result.rotation_deg));
        assert!(result.residual_volume.is_finite());
        assert!(result.residual_volume >= 0.0);
        assert!((result.tooth_pitch_deg - 30.0).abs() < 1e-12);
    }

    #[test]
    fn test_finds_lower_interference_than_worst_case() {
        let ctx = KernelContext::default();
        // A plus-shaped wheel against a diagonal bar: interference varies
        // strongly with rotation.
        let arm = ctx.translate(&ctx.create_box(10.0, 1.0, 1.0).unwrap(), -5.0, -0.5, -0.5);
        let wheel = arm.clone();
        let worm = ctx.rotate_z(&arm, 45.0);
        let options = AlignmentOptions {
            coarse_step_deg: 5.0,
            fine_step_deg: 1.0,
            volume_tolerance: 1e-6,
        };
        let result = find_optimal_rotation(&ctx, &wheel, &worm, 8, &options).unwrap();
        let worst = {
            let rotated = ctx.rotate_z(&wheel, 45.0);
            let overlap = ctx.boolean_intersect(&rotated, &worm).unwrap();
            ctx.volume(&overlap)
        };
        assert!(
            result.residual_volume < worst,
            "search result {} should beat the aligned worst case {worst}",
            result.residual_volume
        );
    }
}
