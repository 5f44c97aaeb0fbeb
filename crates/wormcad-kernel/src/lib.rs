#![warn(missing_docs)]

//! Geometry-kernel interface for wormcad.
//!
//! Provides the opaque [`Solid`] handle and the [`KernelContext`] through
//! which every modeling operation runs. The gear-generation crates are
//! written against this surface only; the mesh backend in `wormcad-mesh`
//! stays behind it.
//!
//! The context is an explicit object passed to every operation; there is
//! no ambient or global modeling session.
//!
//! # Example
//!
//! ```
//! use wormcad_kernel::KernelContext;
//!
//! let ctx = KernelContext::default();
//! let blank = ctx.create_cylinder(10.0, 20.0).unwrap();
//! let bore = ctx.create_cylinder(3.0, 20.0).unwrap();
//! let hub = ctx.boolean_subtract(&blank, &bore).unwrap();
//! assert!(ctx.volume(&hub) < ctx.volume(&blank));
//! ```

mod loft;

use std::path::Path;

use thiserror::Error;
use wormcad_math::{Dir3, Point3, Transform, Vec3};
use wormcad_mesh::Mesh;

use loft::{loft_sections_impl, sweep_profile_impl};

/// Errors from kernel operations.
#[derive(Debug, Error)]
pub enum KernelError {
    /// A primitive was requested with a non-positive dimension.
    #[error("invalid {name} for primitive: {value}")]
    InvalidDimension {
        /// Which dimension was rejected.
        name: &'static str,
        /// The rejected value.
        value: f64,
    },

    /// A loft needs at least two sections.
    #[error("loft needs at least 2 sections, got {0}")]
    TooFewSections(usize),

    /// Loft sections must all have the same point count.
    #[error("loft sections have mismatched point counts: {0} vs {1}")]
    MismatchedSections(usize, usize),

    /// A loft section needs at least three points.
    #[error("loft section {0} has fewer than 3 points")]
    DegenerateSection(usize),

    /// A sweep path needs at least two points.
    #[error("sweep path has fewer than 2 points")]
    DegeneratePath,

    /// A boolean operation did not produce a usable result.
    #[error("boolean {0} failed to produce a usable solid")]
    BooleanFailed(&'static str),

    /// An operation that requires geometry was given an empty solid.
    #[error("solid is empty")]
    EmptySolid,

    /// Interchange import/export failed.
    #[error("interchange: {0}")]
    Interchange(#[from] wormcad_mesh::MeshError),

    /// An I/O error outside the interchange reader/writer itself.
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

/// An opaque handle to a boundary-representation solid.
///
/// Solids are immutable values: every transform and boolean returns a new
/// handle and never mutates its operands.
#[derive(Debug, Clone)]
pub struct Solid {
    mesh: Mesh,
}

impl Solid {
    /// Wrap a mesh, orienting it outward.
    pub fn from_mesh(mesh: Mesh) -> Self {
        Solid {
            mesh: mesh.oriented_outward(),
        }
    }

    /// An empty solid.
    pub fn empty() -> Self {
        Solid { mesh: Mesh::new() }
    }

    /// Borrow the underlying mesh.
    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    /// True if the solid has no geometry.
    pub fn is_empty(&self) -> bool {
        self.mesh.is_empty()
    }
}

/// The explicit kernel context.
///
/// Holds the tessellation and healing tolerances shared by all operations
/// in one modeling session. Single-threaded and non-reentrant; give each
/// build its own context or share one sequentially.
#[derive(Debug, Clone)]
pub struct KernelContext {
    /// Segment count for round primitives.
    pub segments: u32,
    /// Fine weld grid used by `unify_faces` and `heal` (mm).
    pub weld_tolerance: f64,
    /// Coarse weld grid used by `sew_and_solidify` (mm).
    pub sew_tolerance: f64,
}

impl Default for KernelContext {
    fn default() -> Self {
        Self {
            segments: 48,
            weld_tolerance: 1e-5,
            sew_tolerance: 1e-3,
        }
    }
}

impl KernelContext {
    /// Context with a specific round-primitive segment count.
    pub fn with_segments(segments: u32) -> Self {
        Self {
            segments,
            ..Self::default()
        }
    }

    // =========================================================================
    // Primitives
    // =========================================================================

    /// Cylinder along the Z axis from `z = 0` to `z = height`.
    pub fn create_cylinder(&self, radius: f64, height: f64) -> Result<Solid, KernelError> {
        if radius <= 0.0 {
            return Err(KernelError::InvalidDimension {
                name: "radius",
                value: radius,
            });
        }
        if height <= 0.0 {
            return Err(KernelError::InvalidDimension {
                name: "height",
                value: height,
            });
        }
        Ok(Solid::from_mesh(Mesh::cylinder(radius, height, self.segments)))
    }

    /// Axis-aligned box with one corner at the origin.
    pub fn create_box(&self, sx: f64, sy: f64, sz: f64) -> Result<Solid, KernelError> {
        for (name, value) in [("sx", sx), ("sy", sy), ("sz", sz)] {
            if value <= 0.0 {
                return Err(KernelError::InvalidDimension { name, value });
            }
        }
        Ok(Solid::from_mesh(Mesh::cuboid(sx, sy, sz)))
    }

    /// Loft a solid through ordered closed sections.
    ///
    /// All sections must carry the same number of points, in matching
    /// order. `ruled` selects straight lateral faces; a smooth
    /// interpolation mode is not implemented and falls back to ruled.
    pub fn loft_sections(
        &self,
        sections: &[Vec<Point3>],
        ruled: bool,
    ) -> Result<Solid, KernelError> {
        loft_sections_impl(sections, ruled)
    }

    /// Sweep a planar profile along a sampled path.
    pub fn sweep_profile(
        &self,
        profile: &[wormcad_math::Point2],
        path: &[(Point3, Vec3)],
    ) -> Result<Solid, KernelError> {
        sweep_profile_impl(profile, path)
    }

    // =========================================================================
    // Booleans
    // =========================================================================

    /// Boolean union (a ∪ b).
    pub fn boolean_union(&self, a: &Solid, b: &Solid) -> Result<Solid, KernelError> {
        if a.is_empty() {
            return Ok(b.clone());
        }
        if b.is_empty() {
            return Ok(a.clone());
        }
        let result = a.mesh.union(&b.mesh);
        if result.is_empty() || !result.signed_volume().is_finite() {
            log::debug!("union of non-empty operands produced no usable geometry");
            return Err(KernelError::BooleanFailed("union"));
        }
        Ok(Solid { mesh: result })
    }

    /// Boolean difference (a − b).
    pub fn boolean_subtract(&self, a: &Solid, b: &Solid) -> Result<Solid, KernelError> {
        if a.is_empty() || b.is_empty() {
            return Ok(a.clone());
        }
        let result = a.mesh.subtract(&b.mesh);
        if !result.signed_volume().is_finite() {
            log::debug!("subtract produced a degenerate result");
            return Err(KernelError::BooleanFailed("subtract"));
        }
        // Cutting everything away is a legitimate (empty) result.
        Ok(Solid { mesh: result })
    }

    /// Boolean intersection (a ∩ b). An empty result means the operands
    /// do not overlap.
    pub fn boolean_intersect(&self, a: &Solid, b: &Solid) -> Result<Solid, KernelError> {
        if a.is_empty() || b.is_empty() {
            return Ok(Solid::empty());
        }
        let result = a.mesh.intersect(&b.mesh);
        if !result.signed_volume().is_finite() {
            return Err(KernelError::BooleanFailed("intersect"));
        }
        Ok(Solid { mesh: result })
    }

    /// Merge two solids by concatenating their boundaries, without boolean
    /// classification. The named fallback when a real union fails.
    pub fn merge_unclassified(&self, a: &Solid, b: &Solid) -> Solid {
        Solid {
            mesh: a.mesh.merged(&b.mesh),
        }
    }

    // =========================================================================
    // Healing
    // =========================================================================

    /// Unify coincident same-surface faces (fine weld, degenerate drop).
    pub fn unify_faces(&self, s: &Solid) -> Result<Solid, KernelError> {
        let mesh = s.mesh.welded(self.weld_tolerance);
        if mesh.is_empty() {
            return Err(KernelError::EmptySolid);
        }
        Ok(Solid { mesh })
    }

    /// Stitch faces into a shell and rebuild a solid from it: weld at the
    /// coarse sew tolerance, discard faces that cannot be stitched to a
    /// neighbor, and re-orient the result outward.
    pub fn sew_and_solidify(&self, s: &Solid) -> Result<Solid, KernelError> {
        let mesh = s
            .mesh
            .welded(self.sew_tolerance)
            .without_dangling_faces(self.sew_tolerance)
            .oriented_outward();
        if mesh.is_empty() {
            return Err(KernelError::EmptySolid);
        }
        Ok(Solid { mesh })
    }

    /// Generic shape-level healing: weld, drop degenerates, re-orient.
    pub fn heal(&self, s: &Solid) -> Result<Solid, KernelError> {
        let mesh = s.mesh.welded(self.weld_tolerance).oriented_outward();
        if mesh.is_empty() {
            return Err(KernelError::EmptySolid);
        }
        Ok(Solid { mesh })
    }

    // =========================================================================
    // Interchange
    // =========================================================================

    /// Export a solid to the neutral interchange representation (binary STL).
    pub fn export_interchange(&self, s: &Solid, path: &Path) -> Result<(), KernelError> {
        if s.is_empty() {
            return Err(KernelError::EmptySolid);
        }
        wormcad_mesh::write_stl_binary(&s.mesh, path)?;
        Ok(())
    }

    /// Import a solid from the neutral interchange representation.
    pub fn import_interchange(&self, path: &Path) -> Result<Solid, KernelError> {
        let mesh = wormcad_mesh::read_stl_binary(path)?;
        Ok(Solid::from_mesh(mesh))
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Cast a ray from `origin` along `direction`; returns the ordered hit
    /// parameters (`t > 0`).
    pub fn ray_intersect(&self, s: &Solid, origin: &Point3, direction: &Vec3) -> Vec<f64> {
        s.mesh.ray_hits(origin, direction)
    }

    /// Enclosed volume of the solid.
    pub fn volume(&self, s: &Solid) -> f64 {
        s.mesh.volume()
    }

    /// Topological validity: non-empty and watertight.
    pub fn is_valid(&self, s: &Solid) -> bool {
        !s.is_empty() && s.mesh.is_closed()
    }

    /// Axis-aligned bounding box as `(min, max)`.
    pub fn bounding_box(&self, s: &Solid) -> Result<(Point3, Point3), KernelError> {
        s.mesh.bounding_box().ok_or(KernelError::EmptySolid)
    }

    // =========================================================================
    // Transforms (pure: always return a new solid)
    // =========================================================================

    /// Translate by `(x, y, z)`.
    pub fn translate(&self, s: &Solid, x: f64, y: f64, z: f64) -> Solid {
        Solid {
            mesh: s.mesh.transformed(&Transform::translation(x, y, z)),
        }
    }

    /// Rotate about the Z axis by `angle_deg` degrees.
    pub fn rotate_z(&self, s: &Solid, angle_deg: f64) -> Solid {
        Solid {
            mesh: s.mesh.transformed(&Transform::rotation_z_deg(angle_deg)),
        }
    }

    /// Rotate about an arbitrary axis through `origin` by `angle_deg` degrees.
    pub fn rotate_about(&self, s: &Solid, origin: &Point3, axis: &Dir3, angle_deg: f64) -> Solid {
        let t = Transform::rotation_about_line(origin, axis, angle_deg.to_radians());
        Solid {
            mesh: s.mesh.transformed(&t),
        }
    }

    /// Apply an arbitrary affine transform.
    pub fn transform(&self, s: &Solid, t: &Transform) -> Solid {
        Solid {
            mesh: s.mesh.transformed(t),
        }
    }
}
