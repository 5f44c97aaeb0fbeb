//! 2D thread cross-section generation.

use wormcad_math::{Point2, Point3, Vec3};

use crate::path::PathPoint;
use crate::spec::{ProfileStyle, ThreadSpec};

/// Minimum tapered half-width before a section is considered degenerate (mm).
pub const MIN_HALF_WIDTH: f64 = 0.05;

/// Minimum tapered radial height before a section is considered degenerate (mm).
pub const MIN_PROFILE_HEIGHT: f64 = 0.1;

/// Lower clamp for taper factors; zero would mean a zero-area section.
pub const TAPER_MIN: f64 = 0.05;

/// Interior sample count for one arc-flank bulge.
pub const ARC_FLANK_SAMPLES: usize = 8;

/// Build the closed 2D cross-section of one thread at a given taper factor.
///
/// Coordinates are in the local section frame centered on the path point:
/// `x` is radial (positive outward), `y` runs across the thread width. The
/// radial extents are `±(addendum|dedendum) · taper`, the half-widths are
/// the spec's root/tip half-widths scaled by the same factor.
///
/// Returns `None` when the tapered section would be degenerate; the
/// caller skips that station instead of lofting a malformed ring.
pub fn thread_profile(
    spec: &ThreadSpec,
    taper_factor: f64,
    style: ProfileStyle,
) -> Option<Vec<Point2>> {
    let taper = taper_factor.clamp(TAPER_MIN, 1.0);

    let inner = -spec.dedendum * taper;
    let outer = spec.addendum * taper;
    if outer - inner < MIN_PROFILE_HEIGHT {
        log::debug!(
            "skipping degenerate section: height {:.4} below floor",
            outer - inner
        );
        return None;
    }

    let hw_root = spec.half_width_root * taper;
    let hw_tip = spec.half_width_tip * taper;
    if hw_root.max(hw_tip) < MIN_HALF_WIDTH {
        log::debug!(
            "skipping degenerate section: half-widths {:.4}/{:.4} below floor",
            hw_root,
            hw_tip
        );
        return None;
    }
    let hw_root = hw_root.max(MIN_HALF_WIDTH);
    let hw_tip = hw_tip.max(MIN_HALF_WIDTH);

    let corners = [
        Point2::new(inner, -hw_root),
        Point2::new(outer, -hw_tip),
        Point2::new(outer, hw_tip),
        Point2::new(inner, hw_root),
    ];

    let points = match style {
        // The involute helicoid degenerates to the straight trapezoid in
        // axial section; the involute property lives in the 3D sweep.
        ProfileStyle::Straight | ProfileStyle::InvoluteHelicoid => corners.to_vec(),
        ProfileStyle::ArcFlank => {
            let arc_radius = 0.45 * spec.module_mm;
            let amplitude = 0.15 * arc_radius;
            let mut pts = Vec::with_capacity(4 + 2 * ARC_FLANK_SAMPLES);
            pts.push(corners[0]);
            bulge_flank(&mut pts, corners[0], corners[1], amplitude);
            pts.push(corners[1]);
            pts.push(corners[2]);
            bulge_flank(&mut pts, corners[2], corners[3], amplitude);
            pts.push(corners[3]);
            pts
        }
    };

    Some(points)
}

/// Sample a circular-arc bulge between two flank corners, pushing the
/// interior points. The bulge is offset away from the thread centerline
/// (`y = 0`), adding material along the flank.
fn bulge_flank(out: &mut Vec<Point2>, from: Point2, to: Point2, amplitude: f64) {
    let chord = to - from;
    let len = chord.norm();
    if len < 1e-9 || amplitude <= 0.0 {
        return;
    }
    // Perpendicular of the chord, oriented away from the centerline.
    let mut normal = wormcad_math::Vec2::new(-chord.y, chord.x) / len;
    let mid_y = (from.y + to.y) / 2.0;
    if normal.y * mid_y < 0.0 {
        normal = -normal;
    }
    for i in 1..=ARC_FLANK_SAMPLES {
        let s = i as f64 / (ARC_FLANK_SAMPLES + 1) as f64;
        let u = 2.0 * s - 1.0;
        let offset = amplitude * (1.0 - u * u).max(0.0).sqrt();
        out.push(from + chord * s + normal * offset);
    }
}

/// A closed planar cross-section positioned and oriented at one path point.
///
/// Owned by the builder that created it and consumed once by a loft call.
#[derive(Debug, Clone)]
pub struct ProfileSection {
    /// Ordered boundary ring in 3D.
    pub points: Vec<Point3>,
    /// Taper factor the section was generated at, in `[0.05, 1.0]`.
    pub taper: f64,
}

impl ProfileSection {
    /// Position a 2D profile at a path point.
    ///
    /// The local frame is radial/axial: `x` maps to the outward radial
    /// direction from the worm axis (Z), `y` to the direction
    /// perpendicular to both the radial and the thread tangent.
    pub fn at_path_point(profile: &[Point2], point: &PathPoint, taper: f64) -> Self {
        let pos = point.position;
        let radial = {
            let r = Vec3::new(pos.x, pos.y, 0.0);
            if r.norm() > 1e-9 {
                r.normalize()
            } else {
                Vec3::x()
            }
        };
        let tangent = if point.tangent.norm() > 1e-12 {
            point.tangent.normalize()
        } else {
            Vec3::z()
        };
        let across = radial.cross(&tangent);
        let across = if across.norm() > 1e-12 {
            across.normalize()
        } else {
            Vec3::z()
        };

        let points = profile
            .iter()
            .map(|p| pos + radial * p.x + across * p.y)
            .collect();
        ProfileSection { points, taper }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::{ProfileStyle, ThreadSpec};
    use approx::assert_relative_eq;

    fn sample_spec() -> ThreadSpec {
        ThreadSpec {
            module_mm: 2.0,
            starts: 1,
            pitch_radius: 8.0,
            tip_radius: 10.0,
            root_radius: 5.5,
            lead: std::f64::consts::PI * 2.0,
            lead_angle_deg: 7.0,
            pressure_angle_deg: 20.0,
            addendum: 2.0,
            dedendum: 2.5,
            half_width_pitch: 1.57,
            half_width_root: 2.48,
            half_width_tip: 0.84,
            left_hand: false,
            profile: ProfileStyle::Straight,
        }
    }

    #[test]
    fn test_straight_profile_extents() {
        let spec = sample_spec();
        let pts = thread_profile(&spec, 1.0, ProfileStyle::Straight).unwrap();
        assert_eq!(pts.len(), 4);
        let min_x = pts.iter().map(|p| p.x).fold(f64::MAX, f64::min);
        let max_x = pts.iter().map(|p| p.x).fold(f64::MIN, f64::max);
        assert_relative_eq!(min_x, -spec.dedendum, epsilon = 1e-12);
        assert_relative_eq!(max_x, spec.addendum, epsilon = 1e-12);
        let max_y = pts.iter().map(|p| p.y).fold(f64::MIN, f64::max);
        assert_relative_eq!(max_y, spec.half_width_root, epsilon = 1e-12);
    }

    #[test]
    fn test_taper_scales_profile() {
        let spec = sample_spec();
        let half = thread_profile(&spec, 0.5, ProfileStyle::Straight).unwrap();
        let max_x = half.iter().map(|p| p.x).fold(f64::MIN, f64::max);
        assert_relative_eq!(max_x, spec.addendum * 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_taper_floor_is_applied() {
        let spec = sample_spec();
        // A requested taper of zero is clamped to TAPER_MIN, never zero area.
        let pts = thread_profile(&spec, 0.0, ProfileStyle::Straight).unwrap();
        let max_x = pts.iter().map(|p| p.x).fold(f64::MIN, f64::max);
        assert_relative_eq!(max_x, spec.addendum * TAPER_MIN, epsilon = 1e-12);
    }

    #[test]
    fn test_degenerate_section_is_skipped() {
        let mut spec = sample_spec();
        spec.module_mm = 0.08;
        spec.addendum = 0.08;
        spec.dedendum = 0.1;
        spec.half_width_root = 0.12;
        spec.half_width_tip = 0.04;
        // At the minimum taper the section falls below the height floor.
        assert!(thread_profile(&spec, TAPER_MIN, ProfileStyle::Straight).is_none());
    }

    #[test]
    fn test_involute_matches_straight_in_axial_section() {
        let spec = sample_spec();
        let straight = thread_profile(&spec, 0.8, ProfileStyle::Straight).unwrap();
        let involute = thread_profile(&spec, 0.8, ProfileStyle::InvoluteHelicoid).unwrap();
        assert_eq!(straight.len(), involute.len());
        for (a, b) in straight.iter().zip(involute.iter()) {
            assert_relative_eq!(a.x, b.x, epsilon = 1e-12);
            assert_relative_eq!(a.y, b.y, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_arc_flank_bulges_outward() {
        let spec = sample_spec();
        let straight = thread_profile(&spec, 1.0, ProfileStyle::Straight).unwrap();
        let arc = thread_profile(&spec, 1.0, ProfileStyle::ArcFlank).unwrap();
        assert_eq!(arc.len(), 4 + 2 * ARC_FLANK_SAMPLES);
        // The bulge adds material along both flanks, so the enclosed
        // section area must grow.
        let shoelace = |pts: &[Point2]| -> f64 {
            let mut a = 0.0;
            for i in 0..pts.len() {
                let j = (i + 1) % pts.len();
                a += pts[i].x * pts[j].y - pts[j].x * pts[i].y;
            }
            a.abs() / 2.0
        };
        assert!(shoelace(&arc) > shoelace(&straight) + 1e-6);
    }

    #[test]
    fn test_section_positioning() {
        let profile = vec![
            Point2::new(-1.0, -0.5),
            Point2::new(1.0, -0.5),
            Point2::new(1.0, 0.5),
            Point2::new(-1.0, 0.5),
        ];
        let point = PathPoint {
            position: Point3::new(8.0, 0.0, 0.0),
            tangent: Vec3::y(),
            t: 0.0,
        };
        let section = ProfileSection::at_path_point(&profile, &point, 1.0);
        assert_eq!(section.points.len(), 4);
        // x maps to the radial (+x here) direction.
        let max_x = section.points.iter().map(|p| p.x).fold(f64::MIN, f64::max);
        let min_x = section.points.iter().map(|p| p.x).fold(f64::MAX, f64::min);
        assert_relative_eq!(max_x, 9.0, epsilon = 1e-9);
        assert_relative_eq!(min_x, 7.0, epsilon = 1e-9);
        // The ring stays in the plane containing the axis direction.
        for p in &section.points {
            assert_relative_eq!(p.y, 0.0, epsilon = 1e-9);
        }
    }
}
