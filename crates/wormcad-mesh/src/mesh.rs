//! The [`Mesh`] type: polygon-soup solids and their boolean/query operations.

use std::collections::HashMap;
use std::f64::consts::PI;

use wormcad_math::{Point3, Transform, Vec3};

use crate::bsp::Node;
use crate::polygon::{Polygon, Vertex};

/// A solid represented as a closed set of convex polygons.
///
/// All operations are pure: booleans and transforms return new meshes and
/// never mutate their operands.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    /// Boundary polygons with outward-facing normals.
    pub polygons: Vec<Polygon>,
}

impl Mesh {
    /// Create an empty mesh.
    pub fn new() -> Self {
        Mesh { polygons: Vec::new() }
    }

    /// Create a mesh from existing polygons.
    pub fn from_polygons(polygons: Vec<Polygon>) -> Self {
        Mesh { polygons }
    }

    /// True if the mesh has no polygons.
    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }

    // =========================================================================
    // Primitives
    // =========================================================================

    /// Cylinder along the Z axis from `z = 0` to `z = height`.
    pub fn cylinder(radius: f64, height: f64, segments: u32) -> Self {
        let n = segments.max(3) as usize;
        let ring = |z: f64| -> Vec<Point3> {
            (0..n)
                .map(|i| {
                    let theta = 2.0 * PI * i as f64 / n as f64;
                    Point3::new(radius * theta.cos(), radius * theta.sin(), z)
                })
                .collect()
        };
        let bottom = ring(0.0);
        let top = ring(height);

        let mut polygons = Vec::with_capacity(n + 2);
        for i in 0..n {
            let j = (i + 1) % n;
            let radial = |p: &Point3| Vec3::new(p.x, p.y, 0.0).normalize();
            polygons.push(Polygon::new(vec![
                Vertex::new(bottom[i], radial(&bottom[i])),
                Vertex::new(bottom[j], radial(&bottom[j])),
                Vertex::new(top[j], radial(&top[j])),
                Vertex::new(top[i], radial(&top[i])),
            ]));
        }
        // Caps: bottom reversed so its normal points down.
        polygons.push(Polygon::new(
            bottom
                .iter()
                .rev()
                .map(|&p| Vertex::new(p, -Vec3::z()))
                .collect(),
        ));
        polygons.push(Polygon::new(
            top.iter().map(|&p| Vertex::new(p, Vec3::z())).collect(),
        ));
        Mesh::from_polygons(polygons)
    }

    /// Axis-aligned box with one corner at the origin and dimensions
    /// `(sx, sy, sz)`.
    pub fn cuboid(sx: f64, sy: f64, sz: f64) -> Self {
        let p = |x: f64, y: f64, z: f64| Point3::new(x, y, z);
        let face = |a: Point3, b: Point3, c: Point3, d: Point3, normal: Vec3| {
            Polygon::new(vec![
                Vertex::new(a, normal),
                Vertex::new(b, normal),
                Vertex::new(c, normal),
                Vertex::new(d, normal),
            ])
        };
        Mesh::from_polygons(vec![
            face(p(0.0, 0.0, 0.0), p(0.0, sy, 0.0), p(sx, sy, 0.0), p(sx, 0.0, 0.0), -Vec3::z()),
            face(p(0.0, 0.0, sz), p(sx, 0.0, sz), p(sx, sy, sz), p(0.0, sy, sz), Vec3::z()),
            face(p(0.0, 0.0, 0.0), p(sx, 0.0, 0.0), p(sx, 0.0, sz), p(0.0, 0.0, sz), -Vec3::y()),
            face(p(0.0, sy, 0.0), p(0.0, sy, sz), p(sx, sy, sz), p(sx, sy, 0.0), Vec3::y()),
            face(p(0.0, 0.0, 0.0), p(0.0, 0.0, sz), p(0.0, sy, sz), p(0.0, sy, 0.0), -Vec3::x()),
            face(p(sx, 0.0, 0.0), p(sx, sy, 0.0), p(sx, sy, sz), p(sx, 0.0, sz), Vec3::x()),
        ])
    }

    // =========================================================================
    // Booleans (BSP tree)
    // =========================================================================

    /// Boolean union (self ∪ other).
    pub fn union(&self, other: &Mesh) -> Mesh {
        let mut a = Node::new(&self.polygons);
        let mut b = Node::new(&other.polygons);
        a.clip_to(&b);
        b.clip_to(&a);
        b.invert();
        b.clip_to(&a);
        b.invert();
        a.build(&b.all_polygons());
        Mesh::from_polygons(a.all_polygons())
    }

    /// Boolean difference (self − other).
    pub fn subtract(&self, other: &Mesh) -> Mesh {
        let mut a = Node::new(&self.polygons);
        let mut b = Node::new(&other.polygons);
        a.invert();
        a.clip_to(&b);
        b.clip_to(&a);
        b.invert();
        b.clip_to(&a);
        b.invert();
        a.build(&b.all_polygons());
        a.invert();
        Mesh::from_polygons(a.all_polygons())
    }

    /// Boolean intersection (self ∩ other).
    pub fn intersect(&self, other: &Mesh) -> Mesh {
        let mut a = Node::new(&self.polygons);
        let mut b = Node::new(&other.polygons);
        a.invert();
        b.clip_to(&a);
        b.invert();
        a.clip_to(&b);
        b.clip_to(&a);
        a.build(&b.all_polygons());
        a.invert();
        Mesh::from_polygons(a.all_polygons())
    }

    /// Plain concatenation of boundary polygons, with no boolean
    /// classification. Used as the last-resort merge when a real union
    /// fails; the result is only approximately correct where the operands
    /// overlap.
    pub fn merged(&self, other: &Mesh) -> Mesh {
        let mut polygons = self.polygons.clone();
        polygons.extend(other.polygons.iter().cloned());
        Mesh::from_polygons(polygons)
    }

    // =========================================================================
    // Transforms
    // =========================================================================

    /// Apply an affine transform, returning a new mesh.
    pub fn transformed(&self, t: &Transform) -> Mesh {
        let det = t.matrix.fixed_view::<3, 3>(0, 0).determinant();
        let polygons = self
            .polygons
            .iter()
            .map(|poly| {
                let verts: Vec<Vertex> = poly
                    .vertices
                    .iter()
                    .map(|v| {
                        let n = t.apply_vec(&v.normal);
                        let n = if n.norm() > 1e-12 { n.normalize() } else { v.normal };
                        Vertex::new(t.apply_point(&v.pos), n)
                    })
                    .collect();
                let mut p = Polygon::new(verts);
                if det < 0.0 {
                    p.flip();
                }
                p
            })
            .collect();
        Mesh::from_polygons(polygons)
    }

    /// Flip every polygon so normals face the other way.
    pub fn flipped(&self) -> Mesh {
        let mut polygons = self.polygons.clone();
        for p in &mut polygons {
            p.flip();
        }
        Mesh::from_polygons(polygons)
    }

    /// Return the mesh oriented so its signed volume is positive
    /// (outward-facing normals).
    pub fn oriented_outward(self) -> Mesh {
        if self.signed_volume() < 0.0 {
            self.flipped()
        } else {
            self
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Fan-triangulated copy of every polygon.
    pub fn triangles(&self) -> Vec<[Vertex; 3]> {
        self.polygons.iter().flat_map(|p| p.triangulate()).collect()
    }

    /// Signed volume by the divergence theorem. Positive when polygon
    /// windings face outward.
    pub fn signed_volume(&self) -> f64 {
        let mut vol = 0.0;
        for tri in self.triangles() {
            let a = tri[0].pos.coords;
            let b = tri[1].pos.coords;
            let c = tri[2].pos.coords;
            vol += a.dot(&b.cross(&c));
        }
        vol / 6.0
    }

    /// Absolute enclosed volume.
    pub fn volume(&self) -> f64 {
        self.signed_volume().abs()
    }

    /// Total surface area.
    pub fn surface_area(&self) -> f64 {
        self.polygons.iter().map(|p| p.area()).sum()
    }

    /// Axis-aligned bounding box as `(min, max)`, or `None` for an empty mesh.
    pub fn bounding_box(&self) -> Option<(Point3, Point3)> {
        let mut min = Point3::new(f64::MAX, f64::MAX, f64::MAX);
        let mut max = Point3::new(f64::MIN, f64::MIN, f64::MIN);
        let mut any = false;
        for poly in &self.polygons {
            for v in &poly.vertices {
                any = true;
                min.x = min.x.min(v.pos.x);
                min.y = min.y.min(v.pos.y);
                min.z = min.z.min(v.pos.z);
                max.x = max.x.max(v.pos.x);
                max.y = max.y.max(v.pos.y);
                max.z = max.z.max(v.pos.z);
            }
        }
        any.then_some((min, max))
    }

    /// Strict manifold check: every edge of the triangulated surface is
    /// shared by exactly two triangles (quantized coordinates).
    pub fn is_manifold(&self) -> bool {
        const QUANTIZATION_FACTOR: f64 = 1e7;

        fn quantize(p: &Point3) -> (i64, i64, i64) {
            (
                (p.x * QUANTIZATION_FACTOR).round() as i64,
                (p.y * QUANTIZATION_FACTOR).round() as i64,
                (p.z * QUANTIZATION_FACTOR).round() as i64,
            )
        }

        if self.polygons.is_empty() {
            return false;
        }

        let mut edge_counts: HashMap<((i64, i64, i64), (i64, i64, i64)), u32> = HashMap::new();
        for tri in self.triangles() {
            for &(i0, i1) in &[(0usize, 1usize), (1, 2), (2, 0)] {
                let p0 = quantize(&tri[i0].pos);
                let p1 = quantize(&tri[i1].pos);
                let key = if p0 < p1 { (p0, p1) } else { (p1, p0) };
                *edge_counts.entry(key).or_insert(0) += 1;
            }
        }
        edge_counts.values().all(|&count| count == 2)
    }

    /// Watertightness check that tolerates the T-vertices boolean results
    /// carry: a geometrically closed surface has area-weighted normals
    /// summing to zero and a positive signed volume.
    pub fn is_closed(&self) -> bool {
        if self.polygons.is_empty() {
            return false;
        }
        let mut normal_sum = Vec3::zeros();
        let mut area = 0.0;
        for tri in self.triangles() {
            let e1 = tri[1].pos - tri[0].pos;
            let e2 = tri[2].pos - tri[0].pos;
            let n = e1.cross(&e2) / 2.0;
            area += n.norm();
            normal_sum += n;
        }
        if area < 1e-12 {
            return false;
        }
        normal_sum.norm() <= 1e-6 * area + 1e-9 && self.signed_volume() > 0.0
    }

    /// Weld vertices to a grid of the given tolerance and drop polygons
    /// that collapse to (near) zero area.
    pub fn welded(&self, tolerance: f64) -> Mesh {
        let tol = tolerance.max(1e-9);
        let snap = |p: &Point3| -> Point3 {
            Point3::new(
                (p.x / tol).round() * tol,
                (p.y / tol).round() * tol,
                (p.z / tol).round() * tol,
            )
        };

        let mut polygons = Vec::with_capacity(self.polygons.len());
        for poly in &self.polygons {
            let mut verts: Vec<Vertex> = Vec::with_capacity(poly.vertices.len());
            for v in &poly.vertices {
                let pos = snap(&v.pos);
                if verts.last().map_or(true, |prev: &Vertex| (prev.pos - pos).norm() > tol / 2.0) {
                    verts.push(Vertex::new(pos, v.normal));
                }
            }
            // The snapped loop may close onto its own first vertex.
            while verts.len() >= 2
                && (verts[0].pos - verts.last().unwrap().pos).norm() <= tol / 2.0
            {
                verts.pop();
            }
            if verts.len() < 3 {
                continue;
            }
            let candidate = Polygon::new(verts);
            if candidate.area() > tol * tol {
                polygons.push(candidate);
            }
        }
        Mesh::from_polygons(polygons)
    }

    /// Drop faces that cannot be stitched into a shell: any polygon with
    /// a boundary edge no other polygon shares (quantized at `tolerance`).
    pub fn without_dangling_faces(&self, tolerance: f64) -> Mesh {
        let tol = tolerance.max(1e-9);
        let quantize = |p: &Point3| -> (i64, i64, i64) {
            (
                (p.x / tol).round() as i64,
                (p.y / tol).round() as i64,
                (p.z / tol).round() as i64,
            )
        };
        let edge_key = |a: &Point3, b: &Point3| {
            let (qa, qb) = (quantize(a), quantize(b));
            if qa < qb { (qa, qb) } else { (qb, qa) }
        };

        let mut edge_counts: HashMap<_, u32> = HashMap::new();
        for poly in &self.polygons {
            let n = poly.vertices.len();
            for i in 0..n {
                let j = (i + 1) % n;
                *edge_counts
                    .entry(edge_key(&poly.vertices[i].pos, &poly.vertices[j].pos))
                    .or_insert(0) += 1;
            }
        }

        let polygons = self
            .polygons
            .iter()
            .filter(|poly| {
                let n = poly.vertices.len();
                (0..n).all(|i| {
                    let j = (i + 1) % n;
                    edge_counts[&edge_key(&poly.vertices[i].pos, &poly.vertices[j].pos)] >= 2
                })
            })
            .cloned()
            .collect();
        Mesh::from_polygons(polygons)
    }

    /// Cast a ray and return the ordered intersection parameters `t > 0`
    /// (Möller–Trumbore against the triangulated surface).
    pub fn ray_hits(&self, origin: &Point3, direction: &Vec3) -> Vec<f64> {
        let dir = *direction;
        let mut hits = Vec::new();
        for tri in self.triangles() {
            let a = tri[0].pos;
            let e1 = tri[1].pos - a;
            let e2 = tri[2].pos - a;
            let pvec = dir.cross(&e2);
            let det = e1.dot(&pvec);
            if det.abs() < 1e-12 {
                continue;
            }
            let inv_det = 1.0 / det;
            let tvec = origin - a;
            let u = tvec.dot(&pvec) * inv_det;
            if !(-1e-9..=1.0 + 1e-9).contains(&u) {
                continue;
            }
            let qvec = tvec.cross(&e1);
            let v = dir.dot(&qvec) * inv_det;
            if v < -1e-9 || u + v > 1.0 + 1e-9 {
                continue;
            }
            let t = e2.dot(&qvec) * inv_det;
            if t > 1e-9 {
                hits.push(t);
            }
        }
        hits.sort_by(|a, b| a.partial_cmp(b).unwrap());
        hits.dedup_by(|a, b| (*a - *b).abs() < 1e-7);
        hits
    }
}
