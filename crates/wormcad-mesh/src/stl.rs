//! Binary STL interchange for [`Mesh`].

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use wormcad_math::{Point3, Vec3};

use crate::polygon::{Polygon, Vertex};
use crate::{Mesh, MeshError};

/// Write a mesh to a binary STL file.
pub fn write_stl_binary(mesh: &Mesh, path: &Path) -> Result<(), MeshError> {
    let mut triangles = Vec::new();
    for tri in mesh.triangles() {
        let e1 = tri[1].pos - tri[0].pos;
        let e2 = tri[2].pos - tri[0].pos;
        let n = e1.cross(&e2);
        let n = if n.norm() > 1e-12 { n.normalize() } else { Vec3::z() };
        triangles.push(stl_io::Triangle {
            normal: stl_io::Normal::new([n.x as f32, n.y as f32, n.z as f32]),
            vertices: [
                stl_io::Vertex::new([tri[0].pos.x as f32, tri[0].pos.y as f32, tri[0].pos.z as f32]),
                stl_io::Vertex::new([tri[1].pos.x as f32, tri[1].pos.y as f32, tri[1].pos.z as f32]),
                stl_io::Vertex::new([tri[2].pos.x as f32, tri[2].pos.y as f32, tri[2].pos.z as f32]),
            ],
        });
    }

    let mut writer = BufWriter::new(File::create(path)?);
    stl_io::write_stl(&mut writer, triangles.iter())?;
    Ok(())
}

/// Read a mesh back from a binary STL file.
///
/// The importer re-indexes coincident vertices, which is what the repair
/// pipeline's round-trip strategy relies on for normalization.
pub fn read_stl_binary(path: &Path) -> Result<Mesh, MeshError> {
    let mut reader = BufReader::new(File::open(path)?);
    let indexed = stl_io::read_stl(&mut reader)?;
    if indexed.faces.is_empty() {
        return Err(MeshError::EmptyStl);
    }

    let points: Vec<Point3> = indexed
        .vertices
        .iter()
        .map(|v| Point3::new(v[0] as f64, v[1] as f64, v[2] as f64))
        .collect();

    let mut polygons = Vec::with_capacity(indexed.faces.len());
    for face in &indexed.faces {
        let a = points[face.vertices[0]];
        let b = points[face.vertices[1]];
        let c = points[face.vertices[2]];
        let e1 = b - a;
        let e2 = c - a;
        let n = e1.cross(&e2);
        if n.norm() < 1e-12 {
            continue; // degenerate facet
        }
        let n = n.normalize();
        polygons.push(Polygon::new(vec![
            Vertex::new(a, n),
            Vertex::new(b, n),
            Vertex::new(c, n),
        ]));
    }
    if polygons.is_empty() {
        return Err(MeshError::EmptyStl);
    }
    Ok(Mesh::from_polygons(polygons))
}
