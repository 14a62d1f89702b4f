#![warn(missing_docs)]

//! Triangle mesh container and file I/O for heliwrap.
//!
//! Provides the [`TriangleMesh`] type consumed by the raytrace crate,
//! plus loading from OBJ and STL files and binary STL export. The mesh
//! is a plain indexed triangle soup; no repair or topology checks are
//! performed.

pub mod bbox;
pub mod error;
pub mod io;

pub use bbox::Aabb3;
pub use error::{MeshError, Result};
pub use io::{load_mesh, save_stl};

use heliwrap_math::{Point3, Vec3};

/// An indexed triangle mesh.
#[derive(Debug, Clone)]
pub struct TriangleMesh {
    /// Flat array of vertex positions: `[x0, y0, z0, x1, y1, z1, ...]` (f32).
    pub vertices: Vec<f32>,
    /// Flat array of triangle indices: `[i0, i1, i2, ...]` (u32).
    pub indices: Vec<u32>,
}

impl TriangleMesh {
    /// Create an empty mesh.
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            indices: Vec::new(),
        }
    }

    /// Number of triangles.
    pub fn num_triangles(&self) -> usize {
        self.indices.len() / 3
    }

    /// Number of vertices.
    pub fn num_vertices(&self) -> usize {
        self.vertices.len() / 3
    }

    /// Position of vertex `i` as a double-precision point.
    pub fn vertex(&self, i: usize) -> Point3 {
        Point3::new(
            self.vertices[i * 3] as f64,
            self.vertices[i * 3 + 1] as f64,
            self.vertices[i * 3 + 2] as f64,
        )
    }

    /// Corner positions of triangle `i`.
    pub fn triangle(&self, i: usize) -> [Point3; 3] {
        let i0 = self.indices[i * 3] as usize;
        let i1 = self.indices[i * 3 + 1] as usize;
        let i2 = self.indices[i * 3 + 2] as usize;
        [self.vertex(i0), self.vertex(i1), self.vertex(i2)]
    }

    /// Translate every vertex by `d`.
    pub fn translate(&mut self, d: &Vec3) {
        for v in self.vertices.chunks_mut(3) {
            v[0] += d.x as f32;
            v[1] += d.y as f32;
            v[2] += d.z as f32;
        }
    }

    /// Bounding box of all vertices, or `None` for an empty mesh.
    pub fn aabb(&self) -> Option<Aabb3> {
        if self.vertices.is_empty() {
            return None;
        }
        let mut aabb = Aabb3::empty();
        for i in 0..self.num_vertices() {
            aabb.include_point(&self.vertex(i));
        }
        Some(aabb)
    }
}

impl Default for TriangleMesh {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad_mesh() -> TriangleMesh {
        TriangleMesh {
            vertices: vec![
                0.0, 0.0, 0.0, //
                1.0, 0.0, 0.0, //
                1.0, 1.0, 0.0, //
                0.0, 1.0, 0.0,
            ],
            indices: vec![0, 1, 2, 0, 2, 3],
        }
    }

    #[test]
    fn test_counts() {
        let mesh = quad_mesh();
        assert_eq!(mesh.num_vertices(), 4);
        assert_eq!(mesh.num_triangles(), 2);
    }

    #[test]
    fn test_triangle_access() {
        let mesh = quad_mesh();
        let [a, b, c] = mesh.triangle(1);
        assert!((a - Point3::new(0.0, 0.0, 0.0)).norm() < 1e-12);
        assert!((b - Point3::new(1.0, 1.0, 0.0)).norm() < 1e-12);
        assert!((c - Point3::new(0.0, 1.0, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn test_translate() {
        let mut mesh = quad_mesh();
        mesh.translate(&Vec3::new(1.0, -2.0, 0.5));
        let v = mesh.vertex(0);
        assert!((v - Point3::new(1.0, -2.0, 0.5)).norm() < 1e-6);
    }

    #[test]
    fn test_aabb() {
        let mesh = quad_mesh();
        let aabb = mesh.aabb().unwrap();
        assert!((aabb.max.x - 1.0).abs() < 1e-6);
        assert!((aabb.min.y - 0.0).abs() < 1e-6);
        assert!(TriangleMesh::new().aabb().is_none());
    }
}
