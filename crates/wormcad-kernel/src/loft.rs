//! Loft and sweep: solids from ordered cross-sections.

use wormcad_math::{Point2, Point3, Vec3};
use wormcad_mesh::{Mesh, Polygon, Vertex};

use crate::{KernelError, Solid};

/// Loft a solid through ordered closed sections (rings of 3D points).
///
/// Lateral faces are emitted as triangles so the boolean engine only ever
/// sees planar convex polygons; caps are fan-triangulated from the first
/// and last ring. The final orientation is normalized by signed volume,
/// which also makes the loft independent of ring winding (mirrored
/// left-hand threads come through a flipped winding).
pub(crate) fn loft_sections_impl(
    sections: &[Vec<Point3>],
    ruled: bool,
) -> Result<Solid, KernelError> {
    if sections.len() < 2 {
        return Err(KernelError::TooFewSections(sections.len()));
    }
    let n_points = sections[0].len();
    for (i, ring) in sections.iter().enumerate() {
        if ring.len() < 3 {
            return Err(KernelError::DegenerateSection(i));
        }
        if ring.len() != n_points {
            return Err(KernelError::MismatchedSections(n_points, ring.len()));
        }
    }
    // Only ruled interpolation is implemented; a smooth mode would fit the
    // same signature and currently falls back to ruled.
    let _ = ruled;

    let mut polygons = Vec::new();

    for ring_idx in 0..sections.len() - 1 {
        let ring_a = &sections[ring_idx];
        let ring_b = &sections[ring_idx + 1];
        for j in 0..n_points {
            let k = (j + 1) % n_points;
            push_triangle(&mut polygons, ring_a[j], ring_a[k], ring_b[k]);
            push_triangle(&mut polygons, ring_a[j], ring_b[k], ring_b[j]);
        }
    }

    push_cap(&mut polygons, sections.first().unwrap(), true);
    push_cap(&mut polygons, sections.last().unwrap(), false);

    let mesh = Mesh::from_polygons(polygons).oriented_outward();
    if mesh.is_empty() {
        return Err(KernelError::DegenerateSection(0));
    }
    Ok(Solid::from_mesh(mesh))
}

/// Sweep a planar profile along a sampled path of (position, tangent)
/// pairs. The profile is oriented at each path point with a consistent
/// perpendicular frame, then lofted.
pub(crate) fn sweep_profile_impl(
    profile: &[Point2],
    path: &[(Point3, Vec3)],
) -> Result<Solid, KernelError> {
    if profile.len() < 3 {
        return Err(KernelError::DegenerateSection(0));
    }
    if path.len() < 2 {
        return Err(KernelError::DegeneratePath);
    }

    let sections: Vec<Vec<Point3>> = path
        .iter()
        .map(|(pos, tangent)| {
            let t = if tangent.norm() > 1e-12 {
                tangent.normalize()
            } else {
                Vec3::z()
            };
            // Arbitrary but consistent perpendicular frame.
            let seed = if t.x.abs() < 0.9 { Vec3::x() } else { Vec3::y() };
            let u = seed.cross(&t).normalize();
            let v = t.cross(&u);
            profile
                .iter()
                .map(|p| pos + u * p.x + v * p.y)
                .collect()
        })
        .collect();

    loft_sections_impl(&sections, true)
}

fn push_triangle(polygons: &mut Vec<Polygon>, a: Point3, b: Point3, c: Point3) {
    let n = (b - a).cross(&(c - a));
    if n.norm() < 1e-12 {
        return; // collapsed triangle (coincident ring points)
    }
    let n = n.normalize();
    polygons.push(Polygon::new(vec![
        Vertex::new(a, n),
        Vertex::new(b, n),
        Vertex::new(c, n),
    ]));
}

fn push_cap(polygons: &mut Vec<Polygon>, ring: &[Point3], reversed: bool) {
    let pts: Vec<Point3> = if reversed {
        ring.iter().rev().copied().collect()
    } else {
        ring.to_vec()
    };
    for i in 1..pts.len() - 1 {
        push_triangle(polygons, pts[0], pts[i], pts[i + 1]);
    }
}
