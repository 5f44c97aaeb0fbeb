//! Vertices, planes and convex polygons: the building blocks of [`crate::Mesh`].

use crate::EPSILON;
use wormcad_math::{Point3, Vec3};

/// A vertex of a polygon, holding position and normal.
#[derive(Debug, Clone)]
pub struct Vertex {
    /// Position in 3D space.
    pub pos: Point3,
    /// Outward surface normal at this vertex.
    pub normal: Vec3,
}

impl Vertex {
    /// Create a new vertex.
    pub const fn new(pos: Point3, normal: Vec3) -> Self {
        Vertex { pos, normal }
    }

    /// Flip orientation-specific data (the normal).
    pub fn flip(&mut self) {
        self.normal = -self.normal;
    }

    /// Linearly interpolate between `self` and `other` by parameter `t`.
    pub fn interpolate(&self, other: &Vertex, t: f64) -> Vertex {
        Vertex {
            pos: self.pos + (other.pos - self.pos) * t,
            normal: self.normal + (other.normal - self.normal) * t,
        }
    }
}

/// A plane in 3D space in normal/offset form (`normal · p == w`).
#[derive(Debug, Clone)]
pub struct Plane {
    /// Unit normal of the plane.
    pub normal: Vec3,
    /// Signed offset from the origin along the normal.
    pub w: f64,
}

impl Plane {
    /// Create a plane from three points (right-handed winding).
    pub fn from_points(a: &Point3, b: &Point3, c: &Point3) -> Plane {
        let n = (b - a).cross(&(c - a));
        let n = if n.norm() > 1e-12 { n.normalize() } else { Vec3::z() };
        Plane {
            normal: n,
            w: n.dot(&a.coords),
        }
    }

    /// Flip the plane orientation.
    pub fn flip(&mut self) {
        self.normal = -self.normal;
        self.w = -self.w;
    }

    /// Split `polygon` by this plane, distributing the results into
    /// `coplanar_front`, `coplanar_back`, `front` and `back`.
    pub fn split_polygon(
        &self,
        polygon: &Polygon,
        coplanar_front: &mut Vec<Polygon>,
        coplanar_back: &mut Vec<Polygon>,
        front: &mut Vec<Polygon>,
        back: &mut Vec<Polygon>,
    ) {
        const COPLANAR: i32 = 0;
        const FRONT: i32 = 1;
        const BACK: i32 = 2;
        const SPANNING: i32 = 3;

        let mut polygon_type = 0;
        let mut types = Vec::with_capacity(polygon.vertices.len());

        for v in &polygon.vertices {
            let t = self.normal.dot(&v.pos.coords) - self.w;
            let vertex_type = if t < -EPSILON {
                BACK
            } else if t > EPSILON {
                FRONT
            } else {
                COPLANAR
            };
            polygon_type |= vertex_type;
            types.push(vertex_type);
        }

        match polygon_type {
            COPLANAR => {
                if self.normal.dot(&polygon.plane.normal) > 0.0 {
                    coplanar_front.push(polygon.clone());
                } else {
                    coplanar_back.push(polygon.clone());
                }
            }
            FRONT => front.push(polygon.clone()),
            BACK => back.push(polygon.clone()),
            _ => {
                // SPANNING: walk the edge loop and emit intersection vertices
                let mut f: Vec<Vertex> = Vec::new();
                let mut b: Vec<Vertex> = Vec::new();
                let vcount = polygon.vertices.len();

                for i in 0..vcount {
                    let j = (i + 1) % vcount;
                    let ti = types[i];
                    let tj = types[j];
                    let vi = &polygon.vertices[i];
                    let vj = &polygon.vertices[j];

                    if ti != BACK {
                        f.push(vi.clone());
                    }
                    if ti != FRONT {
                        b.push(vi.clone());
                    }

                    if (ti | tj) == SPANNING {
                        let denom = self.normal.dot(&(vj.pos - vi.pos));
                        if denom.abs() > EPSILON {
                            let t = (self.w - self.normal.dot(&vi.pos.coords)) / denom;
                            let v = vi.interpolate(vj, t);
                            f.push(v.clone());
                            b.push(v);
                        }
                    }
                }

                if f.len() >= 3 {
                    front.push(Polygon::new(f));
                }
                if b.len() >= 3 {
                    back.push(Polygon::new(b));
                }
            }
        }
    }
}

/// A convex polygon, defined by a list of vertices and a cached plane.
#[derive(Debug, Clone)]
pub struct Polygon {
    /// Ordered boundary vertices (counter-clockwise seen from outside).
    pub vertices: Vec<Vertex>,
    /// Plane of the polygon.
    pub plane: Plane,
}

impl Polygon {
    /// Create a polygon from at least three vertices.
    pub fn new(vertices: Vec<Vertex>) -> Self {
        debug_assert!(vertices.len() >= 3, "degenerate polygon");
        let plane = Plane::from_points(
            &vertices[0].pos,
            &vertices[1].pos,
            &vertices[2].pos,
        );
        Polygon { vertices, plane }
    }

    /// Reverse winding order, flipping vertex normals and the plane.
    pub fn flip(&mut self) {
        self.vertices.reverse();
        for v in &mut self.vertices {
            v.flip();
        }
        self.plane.flip();
    }

    /// Fan-triangulate this polygon into `[v0, v1, v2]` triples.
    pub fn triangulate(&self) -> Vec<[Vertex; 3]> {
        let mut triangles = Vec::new();
        if self.vertices.len() < 3 {
            return triangles;
        }
        let v0 = self.vertices[0].clone();
        for i in 1..(self.vertices.len() - 1) {
            triangles.push([
                v0.clone(),
                self.vertices[i].clone(),
                self.vertices[i + 1].clone(),
            ]);
        }
        triangles
    }

    /// Area of the polygon.
    pub fn area(&self) -> f64 {
        self.triangulate()
            .iter()
            .map(|tri| {
                let e1 = tri[1].pos - tri[0].pos;
                let e2 = tri[2].pos - tri[0].pos;
                e1.cross(&e2).norm() / 2.0
            })
            .sum()
    }
}
