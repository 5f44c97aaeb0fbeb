#![warn(missing_docs)]

//! Triangle-mesh boundary representation for wormcad.
//!
//! Gear solids are represented as closed polygon meshes and combined with
//! BSP-tree boolean operations. This crate is the backend behind the
//! kernel interface in `wormcad-kernel`; the gear-generation crates never
//! touch it directly.
//!
//! # Features
//!
//! - [`Mesh`] - polygon soup with convex faces and per-vertex normals
//! - BSP-tree union / subtract / intersect
//! - Manifold validity check, vertex welding, volume and AABB queries
//! - Ray casting against the triangulated surface
//! - Binary STL write/read for interchange

mod bsp;
mod mesh;
mod polygon;
mod stl;

pub use mesh::Mesh;
pub use polygon::{Plane, Polygon, Vertex};
pub use stl::{read_stl_binary, write_stl_binary};

use thiserror::Error;

/// Epsilon used by the plane classification in the BSP splitter.
pub const EPSILON: f64 = 1e-5;

/// Errors from mesh interchange operations.
#[derive(Debug, Error)]
pub enum MeshError {
    /// An I/O error while reading or writing an STL file.
    #[error("stl io: {0}")]
    Io(#[from] std::io::Error),

    /// The STL file contained no facets.
    #[error("stl file contained no facets")]
    EmptyStl,
}
