//! Mesh file loading and saving.
//!
//! Supports Wavefront OBJ (ascii) and STL (binary and ascii, auto-detected)
//! for input, and binary STL for output. STL input is kept as a triangle
//! soup; vertices are not merged.

use std::fs;
use std::path::Path;

use crate::error::{MeshError, Result};
use crate::TriangleMesh;

/// Load a triangle mesh, picking the parser from the file extension.
pub fn load_mesh<P: AsRef<Path>>(path: P) -> Result<TriangleMesh> {
    let path = path.as_ref();
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    match ext.as_str() {
        "obj" => parse_obj(&fs::read_to_string(path)?),
        "stl" => parse_stl(&fs::read(path)?),
        other => Err(MeshError::UnsupportedFormat(other.to_string())),
    }
}

/// Parse an ascii OBJ document.
///
/// Only `v` and `f` records are used; polygon faces are fan-triangulated.
pub fn parse_obj(text: &str) -> Result<TriangleMesh> {
    let mut mesh = TriangleMesh::new();

    for (lineno, line) in text.lines().enumerate() {
        let mut fields = line.split_whitespace();
        match fields.next() {
            Some("v") => {
                for _ in 0..3 {
                    let field = fields.next().ok_or_else(|| {
                        MeshError::Malformed(format!("line {}: short vertex", lineno + 1))
                    })?;
                    let value: f32 = field.parse().map_err(|_| {
                        MeshError::Malformed(format!("line {}: bad coordinate", lineno + 1))
                    })?;
                    mesh.vertices.push(value);
                }
            }
            Some("f") => {
                let mut corners = Vec::new();
                for field in fields {
                    // "i", "i/j" and "i//k" forms all start with the vertex index
                    let head = field.split('/').next().unwrap_or(field);
                    let idx: i64 = head.parse().map_err(|_| {
                        MeshError::Malformed(format!("line {}: bad face index", lineno + 1))
                    })?;
                    if idx < 1 {
                        return Err(MeshError::Malformed(format!(
                            "line {}: non-positive face index",
                            lineno + 1
                        )));
                    }
                    corners.push((idx - 1) as u32);
                }
                if corners.len() < 3 {
                    return Err(MeshError::Malformed(format!(
                        "line {}: face with fewer than 3 corners",
                        lineno + 1
                    )));
                }
                for k in 1..corners.len() - 1 {
                    mesh.indices.push(corners[0]);
                    mesh.indices.push(corners[k]);
                    mesh.indices.push(corners[k + 1]);
                }
            }
            // Comments, normals, texcoords, groups, etc.
            _ => {}
        }
    }

    let n = mesh.num_vertices() as u32;
    if mesh.indices.iter().any(|&i| i >= n) {
        return Err(MeshError::Malformed("face index out of range".into()));
    }
    Ok(mesh)
}

/// Parse STL bytes, auto-detecting binary vs ascii.
pub fn parse_stl(bytes: &[u8]) -> Result<TriangleMesh> {
    // A well-formed binary STL is exactly 84 + 50 * count bytes.
    if bytes.len() >= 84 {
        let count = u32::from_le_bytes([bytes[80], bytes[81], bytes[82], bytes[83]]) as usize;
        if bytes.len() == 84 + count * 50 {
            return parse_stl_binary(bytes, count);
        }
    }
    let text = std::str::from_utf8(bytes)
        .map_err(|_| MeshError::Malformed("not binary STL and not valid ascii".into()))?;
    parse_stl_ascii(text)
}

fn parse_stl_binary(bytes: &[u8], count: usize) -> Result<TriangleMesh> {
    let mut mesh = TriangleMesh::new();
    mesh.vertices.reserve(count * 9);
    mesh.indices.reserve(count * 3);

    for t in 0..count {
        // 12 bytes of normal (skipped), then three vertices
        let base = 84 + t * 50 + 12;
        for corner in 0..3 {
            let off = base + corner * 12;
            for axis in 0..3 {
                let o = off + axis * 4;
                let v = f32::from_le_bytes([bytes[o], bytes[o + 1], bytes[o + 2], bytes[o + 3]]);
                mesh.vertices.push(v);
            }
            mesh.indices.push((t * 3 + corner) as u32);
        }
    }
    Ok(mesh)
}

fn parse_stl_ascii(text: &str) -> Result<TriangleMesh> {
    let mut mesh = TriangleMesh::new();

    for (lineno, line) in text.lines().enumerate() {
        let mut fields = line.split_whitespace();
        if fields.next() != Some("vertex") {
            continue;
        }
        for _ in 0..3 {
            let field = fields.next().ok_or_else(|| {
                MeshError::Malformed(format!("line {}: short vertex", lineno + 1))
            })?;
            let value: f32 = field.parse().map_err(|_| {
                MeshError::Malformed(format!("line {}: bad coordinate", lineno + 1))
            })?;
            mesh.vertices.push(value);
        }
    }

    if mesh.vertices.len() % 9 != 0 {
        return Err(MeshError::Malformed(
            "ascii STL vertex count not a multiple of 3".into(),
        ));
    }
    mesh.indices = (0..mesh.num_vertices() as u32).collect();
    Ok(mesh)
}

/// Write a mesh as binary STL.
pub fn save_stl<P: AsRef<Path>>(path: P, mesh: &TriangleMesh) -> Result<()> {
    fs::write(path, stl_bytes(mesh))?;
    Ok(())
}

/// Serialize a mesh to binary STL bytes.
pub fn stl_bytes(mesh: &TriangleMesh) -> Vec<u8> {
    let num_triangles = mesh.num_triangles();
    let mut data = Vec::with_capacity(84 + num_triangles * 50);

    let mut header = [0u8; 80];
    header[..12].copy_from_slice(b"heliwrap STL");
    data.extend_from_slice(&header);
    data.extend_from_slice(&(num_triangles as u32).to_le_bytes());

    for tri in mesh.indices.chunks(3) {
        let i0 = tri[0] as usize * 3;
        let i1 = tri[1] as usize * 3;
        let i2 = tri[2] as usize * 3;

        let v0 = [
            mesh.vertices[i0],
            mesh.vertices[i0 + 1],
            mesh.vertices[i0 + 2],
        ];
        let v1 = [
            mesh.vertices[i1],
            mesh.vertices[i1 + 1],
            mesh.vertices[i1 + 2],
        ];
        let v2 = [
            mesh.vertices[i2],
            mesh.vertices[i2 + 1],
            mesh.vertices[i2 + 2],
        ];

        let e1 = [v1[0] - v0[0], v1[1] - v0[1], v1[2] - v0[2]];
        let e2 = [v2[0] - v0[0], v2[1] - v0[1], v2[2] - v0[2]];
        let nx = e1[1] * e2[2] - e1[2] * e2[1];
        let ny = e1[2] * e2[0] - e1[0] * e2[2];
        let nz = e1[0] * e2[1] - e1[1] * e2[0];
        let len = (nx * nx + ny * ny + nz * nz).sqrt();
        let (nx, ny, nz) = if len > 1e-10 {
            (nx / len, ny / len, nz / len)
        } else {
            (0.0, 0.0, 1.0)
        };

        data.extend_from_slice(&nx.to_le_bytes());
        data.extend_from_slice(&ny.to_le_bytes());
        data.extend_from_slice(&nz.to_le_bytes());
        for v in [v0, v1, v2] {
            data.extend_from_slice(&v[0].to_le_bytes());
            data.extend_from_slice(&v[1].to_le_bytes());
            data.extend_from_slice(&v[2].to_le_bytes());
        }
        data.extend_from_slice(&0u16.to_le_bytes());
    }

    data
}
