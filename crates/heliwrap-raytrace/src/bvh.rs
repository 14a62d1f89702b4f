//! Bounding Volume Hierarchy for accelerated ray casting.
//!
//! Uses Surface Area Heuristic (SAH) for construction.

use heliwrap_math::Point3;
use heliwrap_mesh::{Aabb3, TriangleMesh};

use crate::intersect::intersect_triangle;
use crate::{Ray, RayHit};

/// A BVH node - either a leaf containing triangles or an internal node with children.
#[derive(Debug, Clone)]
pub enum BvhNode {
    /// Leaf node containing triangle indices.
    Leaf {
        /// Axis-aligned bounding box of this node.
        aabb: Aabb3,
        /// Triangle indices contained in this leaf.
        triangles: Vec<usize>,
    },
    /// Internal node with two children.
    Internal {
        /// Axis-aligned bounding box of this node.
        aabb: Aabb3,
        /// Left child node.
        left: Box<BvhNode>,
        /// Right child node.
        right: Box<BvhNode>,
    },
}

/// Bounding Volume Hierarchy for accelerated ray-mesh intersection.
///
/// Holds its own copy of the triangle corner positions, so queries never
/// touch the source mesh. All query methods take `&self`; the structure
/// is safe to share across threads.
#[derive(Debug, Clone)]
pub struct Bvh {
    root: Option<BvhNode>,
    triangles: Vec<[Point3; 3]>,
}

impl Bvh {
    /// Build a BVH from a triangle mesh using SAH construction.
    pub fn build(mesh: &TriangleMesh) -> Self {
        let triangles: Vec<[Point3; 3]> =
            (0..mesh.num_triangles()).map(|i| mesh.triangle(i)).collect();

        // Collect all triangles with their AABBs and centroids
        let mut tri_data: Vec<(usize, Aabb3, Point3)> = triangles
            .iter()
            .enumerate()
            .map(|(i, corners)| {
                let mut aabb = Aabb3::empty();
                for c in corners {
                    aabb.include_point(c);
                }
                let centroid = aabb.center();
                (i, aabb, centroid)
            })
            .collect();

        let root = if tri_data.is_empty() {
            None
        } else {
            Some(build_node(&mut tri_data))
        };

        Self { root, triangles }
    }

    /// Trace a ray through the BVH, returning all intersections sorted by t.
    pub fn trace(&self, ray: &Ray) -> Vec<RayHit> {
        let mut hits = Vec::new();

        if let Some(ref root) = self.root {
            self.trace_node(ray, root, &mut hits);
        }

        hits.sort_by(|a, b| a.t.total_cmp(&b.t));
        hits
    }

    /// Trace a ray and return only the closest hit.
    pub fn trace_closest(&self, ray: &Ray) -> Option<RayHit> {
        let mut closest: Option<RayHit> = None;
        let mut closest_t = f64::INFINITY;

        if let Some(ref root) = self.root {
            self.trace_node_closest(ray, root, &mut closest, &mut closest_t);
        }

        closest
    }

    /// Number of triangles indexed by this BVH.
    pub fn num_triangles(&self) -> usize {
        self.triangles.len()
    }

    /// Trace a ray through a single node.
    fn trace_node(&self, ray: &Ray, node: &BvhNode, hits: &mut Vec<RayHit>) {
        match node {
            BvhNode::Leaf { aabb, triangles } => {
                if ray.intersect_aabb(aabb).is_some() {
                    for &tri in triangles {
                        let [v0, v1, v2] = &self.triangles[tri];
                        if let Some(t) = intersect_triangle(ray, v0, v1, v2) {
                            hits.push(RayHit::new(t, ray.at(t), tri));
                        }
                    }
                }
            }
            BvhNode::Internal { aabb, left, right } => {
                if ray.intersect_aabb(aabb).is_some() {
                    self.trace_node(ray, left, hits);
                    self.trace_node(ray, right, hits);
                }
            }
        }
    }

    /// Trace a ray, keeping only the closest hit.
    fn trace_node_closest(
        &self,
        ray: &Ray,
        node: &BvhNode,
        closest: &mut Option<RayHit>,
        closest_t: &mut f64,
    ) {
        match node {
            BvhNode::Leaf { aabb, triangles } => {
                if let Some((t_min, _)) = ray.intersect_aabb(aabb) {
                    // Early out if AABB entry is beyond current closest
                    if t_min >= *closest_t {
                        return;
                    }

                    for &tri in triangles {
                        let [v0, v1, v2] = &self.triangles[tri];
                        if let Some(t) = intersect_triangle(ray, v0, v1, v2) {
                            if t < *closest_t {
                                *closest_t = t;
                                *closest = Some(RayHit::new(t, ray.at(t), tri));
                            }
                        }
                    }
                }
            }
            BvhNode::Internal { aabb, left, right } => {
                if let Some((t_min, _)) = ray.intersect_aabb(aabb) {
                    if t_min >= *closest_t {
                        return;
                    }

                    // Test children in order of AABB distance
                    let left_t = ray.intersect_aabb(get_aabb(left)).map(|(t, _)| t);
                    let right_t = ray.intersect_aabb(get_aabb(right)).map(|(t, _)| t);

                    match (left_t, right_t) {
                        (Some(lt), Some(rt)) => {
                            if lt < rt {
                                self.trace_node_closest(ray, left, closest, closest_t);
                                self.trace_node_closest(ray, right, closest, closest_t);
                            } else {
                                self.trace_node_closest(ray, right, closest, closest_t);
                                self.trace_node_closest(ray, left, closest, closest_t);
                            }
                        }
                        (Some(_), None) => {
                            self.trace_node_closest(ray, left, closest, closest_t);
                        }
                        (None, Some(_)) => {
                            self.trace_node_closest(ray, right, closest, closest_t);
                        }
                        (None, None) => {}
                    }
                }
            }
        }
    }
}

/// Get the AABB of a node.
fn get_aabb(node: &BvhNode) -> &Aabb3 {
    match node {
        BvhNode::Leaf { aabb, .. } => aabb,
        BvhNode::Internal { aabb, .. } => aabb,
    }
}

/// Build a BVH node recursively using SAH.
fn build_node(tri_data: &mut [(usize, Aabb3, Point3)]) -> BvhNode {
    // Compute bounds of all triangles
    let mut bounds = Aabb3::empty();
    for (_, aabb, _) in tri_data.iter() {
        bounds.include_aabb(aabb);
    }

    // Base case: small number of triangles -> leaf
    if tri_data.len() <= 4 {
        return BvhNode::Leaf {
            aabb: bounds,
            triangles: tri_data.iter().map(|(i, _, _)| *i).collect(),
        };
    }

    // Find best split using SAH
    let (best_axis, best_pos) = find_best_split(tri_data, &bounds);

    // Partition triangles
    let mid = partition_triangles(tri_data, best_axis, best_pos);

    // Fallback if partition fails
    if mid == 0 || mid == tri_data.len() {
        // Just split in the middle
        let mid = tri_data.len() / 2;
        let (left_data, right_data) = tri_data.split_at_mut(mid);
        return BvhNode::Internal {
            aabb: bounds,
            left: Box::new(build_node(left_data)),
            right: Box::new(build_node(right_data)),
        };
    }

    let (left_data, right_data) = tri_data.split_at_mut(mid);

    BvhNode::Internal {
        aabb: bounds,
        left: Box::new(build_node(left_data)),
        right: Box::new(build_node(right_data)),
    }
}

/// Find the best split axis and position using SAH.
fn find_best_split(tri_data: &[(usize, Aabb3, Point3)], bounds: &Aabb3) -> (usize, f64) {
    const NUM_BUCKETS: usize = 12;

    let extent = [
        bounds.max.x - bounds.min.x,
        bounds.max.y - bounds.min.y,
        bounds.max.z - bounds.min.z,
    ];

    let mut best_cost = f64::INFINITY;
    let mut best_axis = 0;
    let mut best_pos = 0.0;

    // Try each axis
    for axis in 0..3 {
        let axis_extent = extent[axis];
        if axis_extent < 1e-10 {
            continue;
        }

        let axis_min = match axis {
            0 => bounds.min.x,
            1 => bounds.min.y,
            _ => bounds.min.z,
        };

        // Initialize buckets
        let mut bucket_counts = [0usize; NUM_BUCKETS];
        let mut bucket_bounds = [Aabb3::empty(); NUM_BUCKETS];

        // Assign triangles to buckets
        for (_, aabb, centroid) in tri_data {
            let c = match axis {
                0 => centroid.x,
                1 => centroid.y,
                _ => centroid.z,
            };

            let b = ((c - axis_min) / axis_extent * NUM_BUCKETS as f64) as usize;
            let b = b.min(NUM_BUCKETS - 1);

            bucket_counts[b] += 1;
            bucket_bounds[b].include_aabb(aabb);
        }

        // Sweep to find best split
        for split in 1..NUM_BUCKETS {
            let mut left_count = 0;
            let mut left_bounds = Aabb3::empty();
            for i in 0..split {
                left_count += bucket_counts[i];
                if bucket_counts[i] > 0 {
                    left_bounds.include_aabb(&bucket_bounds[i]);
                }
            }

            let mut right_count = 0;
            let mut right_bounds = Aabb3::empty();
            for i in split..NUM_BUCKETS {
                right_count += bucket_counts[i];
                if bucket_counts[i] > 0 {
                    right_bounds.include_aabb(&bucket_bounds[i]);
                }
            }

            if left_count == 0 || right_count == 0 {
                continue;
            }

            // SAH cost: traversal + P(left) * N_left + P(right) * N_right
            let left_area = surface_area(&left_bounds);
            let right_area = surface_area(&right_bounds);
            let total_area = surface_area(bounds);

            let cost = 0.125 // traversal cost
                + left_area / total_area * left_count as f64
                + right_area / total_area * right_count as f64;

            if cost < best_cost {
                best_cost = cost;
                best_axis = axis;
                best_pos = axis_min + (split as f64 / NUM_BUCKETS as f64) * axis_extent;
            }
        }
    }

    (best_axis, best_pos)
}

/// Partition triangles by centroid along an axis.
fn partition_triangles(tri_data: &mut [(usize, Aabb3, Point3)], axis: usize, pos: f64) -> usize {
    let mut left = 0;
    let mut right = tri_data.len();

    while left < right {
        let c = match axis {
            0 => tri_data[left].2.x,
            1 => tri_data[left].2.y,
            _ => tri_data[left].2.z,
        };

        if c < pos {
            left += 1;
        } else {
            right -= 1;
            tri_data.swap(left, right);
        }
    }

    left
}

/// Compute surface area of an AABB.
fn surface_area(aabb: &Aabb3) -> f64 {
    let dx = aabb.max.x - aabb.min.x;
    let dy = aabb.max.y - aabb.min.y;
    let dz = aabb.max.z - aabb.min.z;
    2.0 * (dx * dy + dy * dz + dz * dx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use heliwrap_math::Vec3;

    fn make_cube_mesh(size: f32) -> TriangleMesh {
        let s = size;
        TriangleMesh {
            vertices: vec![
                0.0, 0.0, 0.0, s, 0.0, 0.0, s, s, 0.0, 0.0, s, 0.0, //
                0.0, 0.0, s, s, 0.0, s, s, s, s, 0.0, s, s,
            ],
            indices: vec![
                0, 2, 1, 0, 3, 2, //
                4, 5, 6, 4, 6, 7, //
                0, 1, 5, 0, 5, 4, //
                2, 3, 7, 2, 7, 6, //
                0, 4, 7, 0, 7, 3, //
                1, 2, 6, 1, 6, 5,
            ],
        }
    }

    #[test]
    fn test_bvh_build() {
        let bvh = Bvh::build(&make_cube_mesh(10.0));
        assert!(bvh.root.is_some());
        assert_eq!(bvh.num_triangles(), 12);
    }

    #[test]
    fn test_bvh_trace_cube() {
        let bvh = Bvh::build(&make_cube_mesh(10.0));

        // Ray from outside, entering and exiting the cube
        let ray = Ray::new(Point3::new(5.0, 5.0, -5.0), Vec3::new(0.0, 0.0, 1.0));
        let hits = bvh.trace(&ray);
        assert_eq!(hits.len(), 2);

        // First hit at z=0, second at z=10
        assert!((hits[0].point.z - 0.0).abs() < 1e-8);
        assert!((hits[1].point.z - 10.0).abs() < 1e-8);
    }

    #[test]
    fn test_bvh_trace_miss() {
        let bvh = Bvh::build(&make_cube_mesh(10.0));
        let ray = Ray::new(Point3::new(50.0, 50.0, -5.0), Vec3::new(0.0, 0.0, 1.0));
        assert!(bvh.trace(&ray).is_empty());
        assert!(bvh.trace_closest(&ray).is_none());
    }

    #[test]
    fn test_bvh_trace_closest() {
        let bvh = Bvh::build(&make_cube_mesh(10.0));
        let ray = Ray::new(Point3::new(5.0, 5.0, -5.0), Vec3::new(0.0, 0.0, 1.0));
        let closest = bvh.trace_closest(&ray).unwrap();
        assert!((closest.t - 5.0).abs() < 1e-8);
        assert!((closest.point.z - 0.0).abs() < 1e-8);
    }

    #[test]
    fn test_bvh_trace_from_inside() {
        // A ray cast from inside the cube sees only the exit face
        let bvh = Bvh::build(&make_cube_mesh(10.0));
        let ray = Ray::new(Point3::new(5.0, 5.0, 5.0), Vec3::new(0.0, 0.0, 1.0));
        let closest = bvh.trace_closest(&ray).unwrap();
        assert!((closest.t - 5.0).abs() < 1e-8);
        assert!((closest.point.z - 10.0).abs() < 1e-8);
    }

    #[test]
    fn test_bvh_empty_mesh() {
        let bvh = Bvh::build(&TriangleMesh::new());
        let ray = Ray::new(Point3::origin(), Vec3::x());
        assert!(bvh.trace_closest(&ray).is_none());
    }
}
