#![warn(missing_docs)]

//! Medial-axis skeleton file parsing.
//!
//! Reads the `.cg` text format produced by mesh skeletonization tools:
//! one header line, then `v x y z` vertex records and `e i j` edge
//! records. The curve fitter consumes only the vertex list; edges are
//! parsed and retained but otherwise unused — ordering along the
//! skeleton is reconstructed by axis sorting, not by walking the edge
//! graph, under the assumption of a single monotonic path.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use heliwrap_math::{Point3, Vec3};
use thiserror::Error;

/// Errors that can occur while reading a skeleton file.
#[derive(Error, Debug)]
pub enum SkeletonError {
    /// Underlying I/O failure.
    #[error("skeleton i/o failed: {0}")]
    Io(#[from] std::io::Error),

    /// A line starts with a token other than `v` or `e`.
    #[error("line {line}: unexpected prefix {token:?}")]
    UnexpectedPrefix {
        /// 1-based line number.
        line: usize,
        /// The offending leading token.
        token: String,
    },

    /// A numeric field failed to parse or a record is too short.
    #[error("line {line}: {message}")]
    Parse {
        /// 1-based line number.
        line: usize,
        /// What went wrong.
        message: String,
    },

    /// The file contains no vertices.
    #[error("skeleton contains no vertices")]
    Empty,
}

/// Result type for skeleton operations.
pub type Result<T> = std::result::Result<T, SkeletonError>;

/// A raw skeleton: vertex positions plus edge adjacency.
#[derive(Debug, Clone)]
pub struct Skeleton {
    /// Vertex positions in file order.
    pub vertices: Vec<Point3>,
    /// Edges as pairs of vertex indices.
    pub edges: Vec<[usize; 2]>,
}

impl Skeleton {
    /// Translation that moves the lowest-Z vertex (the skeleton root)
    /// to the origin.
    pub fn root_offset(&self) -> Vec3 {
        let mut root = self.vertices[0];
        for v in &self.vertices[1..] {
            if v.z < root.z {
                root = *v;
            }
        }
        -root.coords
    }

    /// Translate every vertex by `d`.
    pub fn translate(&mut self, d: &Vec3) {
        for v in &mut self.vertices {
            *v += *d;
        }
    }
}

/// Load a skeleton from a `.cg` file.
pub fn load_skeleton<P: AsRef<Path>>(path: P) -> Result<Skeleton> {
    let file = File::open(path)?;
    parse_skeleton(BufReader::new(file))
}

/// Parse a skeleton from any buffered reader.
///
/// The first line is a header and is skipped. Vertex records must carry at
/// least three numeric fields (extra fields are ignored); edge records at
/// least two integer indices (only the first two are kept).
pub fn parse_skeleton<R: BufRead>(reader: R) -> Result<Skeleton> {
    let mut vertices = Vec::new();
    let mut edges = Vec::new();

    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if i == 0 {
            // Header line
            continue;
        }
        let lineno = i + 1;
        let mut fields = line.split_whitespace();
        match fields.next() {
            None => continue, // blank line
            Some("v") => {
                let mut coords = [0.0f64; 3];
                for c in &mut coords {
                    let field = fields.next().ok_or_else(|| SkeletonError::Parse {
                        line: lineno,
                        message: "vertex with fewer than 3 coordinates".into(),
                    })?;
                    *c = field.parse().map_err(|_| SkeletonError::Parse {
                        line: lineno,
                        message: format!("bad coordinate {:?}", field),
                    })?;
                }
                vertices.push(Point3::new(coords[0], coords[1], coords[2]));
            }
            Some("e") => {
                let mut idx = [0usize; 2];
                for v in &mut idx {
                    let field = fields.next().ok_or_else(|| SkeletonError::Parse {
                        line: lineno,
                        message: "edge with fewer than 2 indices".into(),
                    })?;
                    *v = field.parse().map_err(|_| SkeletonError::Parse {
                        line: lineno,
                        message: format!("bad edge index {:?}", field),
                    })?;
                }
                edges.push(idx);
            }
            Some(other) => {
                return Err(SkeletonError::UnexpectedPrefix {
                    line: lineno,
                    token: other.to_string(),
                });
            }
        }
    }

    if vertices.is_empty() {
        return Err(SkeletonError::Empty);
    }

    Ok(Skeleton { vertices, edges })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
# D:3 NV:4 NE:3
v 0.0 0.0 2.0
v 0.1 -0.1 1.0
v 0.0 0.1 0.5
v -0.1 0.0 0.0
e 0 1
e 1 2
e 2 3
";

    #[test]
    fn test_parse_sample() {
        let skel = parse_skeleton(SAMPLE.as_bytes()).unwrap();
        assert_eq!(skel.vertices.len(), 4);
        assert_eq!(skel.edges.len(), 3);
        assert!((skel.vertices[1].z - 1.0).abs() < 1e-12);
        assert_eq!(skel.edges[2], [2, 3]);
    }

    #[test]
    fn test_unexpected_prefix() {
        let text = "header\nv 0 0 0\nf 1 2 3\n";
        match parse_skeleton(text.as_bytes()) {
            Err(SkeletonError::UnexpectedPrefix { line, token }) => {
                assert_eq!(line, 3);
                assert_eq!(token, "f");
            }
            other => panic!("expected UnexpectedPrefix, got {:?}", other),
        }
    }

    #[test]
    fn test_short_vertex() {
        let text = "header\nv 1.0 2.0\n";
        assert!(matches!(
            parse_skeleton(text.as_bytes()),
            Err(SkeletonError::Parse { line: 2, .. })
        ));
    }

    #[test]
    fn test_empty_skeleton() {
        let text = "header only\n";
        assert!(matches!(
            parse_skeleton(text.as_bytes()),
            Err(SkeletonError::Empty)
        ));
    }

    #[test]
    fn test_root_offset_and_translate() {
        let mut skel = parse_skeleton(SAMPLE.as_bytes()).unwrap();
        let d = skel.root_offset();
        // Root is the lowest-Z vertex (-0.1, 0.0, 0.0)
        assert!((d - Vec3::new(0.1, 0.0, 0.0)).norm() < 1e-12);
        skel.translate(&d);
        let moved = skel.root_offset();
        assert!(moved.norm() < 1e-12);
    }

    #[test]
    fn test_vertex_extra_fields_ignored() {
        let text = "header\nv 1 2 3 0.5 0.5\n";
        let skel = parse_skeleton(text.as_bytes()).unwrap();
        assert!((skel.vertices[0] - Point3::new(1.0, 2.0, 3.0)).norm() < 1e-12);
    }
}
