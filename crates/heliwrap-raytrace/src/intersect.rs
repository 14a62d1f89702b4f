//! Ray-triangle intersection.

use heliwrap_math::Point3;

use crate::Ray;

/// Epsilon for the parallel-ray rejection test.
const EPSILON: f64 = 1e-12;

/// Möller–Trumbore ray-triangle intersection.
///
/// Returns the ray parameter `t` of the intersection, or `None` when the
/// ray misses the triangle, is parallel to its plane, or the hit lies
/// behind the origin. Hits at `t >= 0` are accepted so a ray starting on
/// the surface reports a zero-distance hit rather than a miss.
pub fn intersect_triangle(ray: &Ray, v0: &Point3, v1: &Point3, v2: &Point3) -> Option<f64> {
    let edge1 = v1 - v0;
    let edge2 = v2 - v0;
    let dir = ray.direction.as_ref();

    let h = dir.cross(&edge2);
    let a = edge1.dot(&h);

    // Ray parallel to the triangle plane (or degenerate triangle)
    if a.abs() < EPSILON {
        return None;
    }

    let f = 1.0 / a;
    let s = ray.origin - v0;
    let u = f * s.dot(&h);
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(&edge1);
    let v = f * dir.dot(&q);
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = f * edge2.dot(&q);
    if t >= 0.0 {
        Some(t)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use heliwrap_math::Vec3;

    fn unit_triangle() -> (Point3, Point3, Point3) {
        (
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        )
    }

    #[test]
    fn test_hit_through_interior() {
        let (v0, v1, v2) = unit_triangle();
        let ray = Ray::new(Point3::new(0.25, 0.25, -3.0), Vec3::new(0.0, 0.0, 1.0));
        let t = intersect_triangle(&ray, &v0, &v1, &v2).unwrap();
        assert!((t - 3.0).abs() < 1e-10);
    }

    #[test]
    fn test_miss_outside() {
        let (v0, v1, v2) = unit_triangle();
        let ray = Ray::new(Point3::new(0.9, 0.9, -3.0), Vec3::new(0.0, 0.0, 1.0));
        assert!(intersect_triangle(&ray, &v0, &v1, &v2).is_none());
    }

    #[test]
    fn test_parallel_ray() {
        let (v0, v1, v2) = unit_triangle();
        let ray = Ray::new(Point3::new(0.0, 0.0, 1.0), Vec3::new(1.0, 0.0, 0.0));
        assert!(intersect_triangle(&ray, &v0, &v1, &v2).is_none());
    }

    #[test]
    fn test_behind_origin() {
        let (v0, v1, v2) = unit_triangle();
        let ray = Ray::new(Point3::new(0.25, 0.25, 3.0), Vec3::new(0.0, 0.0, 1.0));
        assert!(intersect_triangle(&ray, &v0, &v1, &v2).is_none());
    }

    #[test]
    fn test_edge_hit() {
        let (v0, v1, v2) = unit_triangle();
        // Straight at the v0-v1 edge midpoint
        let ray = Ray::new(Point3::new(0.5, 0.0, -1.0), Vec3::new(0.0, 0.0, 1.0));
        let t = intersect_triangle(&ray, &v0, &v1, &v2).unwrap();
        assert!((t - 1.0).abs() < 1e-10);
    }
}
