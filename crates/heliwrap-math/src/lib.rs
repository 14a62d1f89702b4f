#![warn(missing_docs)]

//! Math types for the heliwrap curve pipeline.
//!
//! Thin wrappers around nalgebra providing domain-specific types
//! for 3D geometry: points, vectors, directions, and tolerance
//! constants shared by the mesh, raytrace, and curve crates.

use nalgebra::{Unit, Vector3};

/// A point in 3D space.
pub type Point3 = nalgebra::Point3<f64>;

/// A vector in 3D space.
pub type Vec3 = Vector3<f64>;

/// A unit (normalized) direction vector in 3D space.
pub type Dir3 = Unit<Vector3<f64>>;

/// Tolerance constants for geometric comparisons.
#[derive(Debug, Clone, Copy)]
pub struct Tolerance {
    /// Linear distance tolerance in model units.
    pub linear: f64,
    /// Angular tolerance in radians.
    pub angular: f64,
}

impl Tolerance {
    /// Default tolerances (1e-9 linear, 1e-9 rad angular).
    pub const DEFAULT: Self = Self {
        linear: 1e-9,
        angular: 1e-9,
    };

    /// Check if two points are coincident within tolerance.
    pub fn points_equal(&self, a: &Point3, b: &Point3) -> bool {
        (a - b).norm() < self.linear
    }

    /// Check if a scalar distance is effectively zero.
    pub fn is_zero(&self, d: f64) -> bool {
        d.abs() < self.linear
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// A unit vector perpendicular to `v`, chosen stably.
///
/// Crosses `v` with the coordinate axis it is least aligned with, so the
/// result is well-conditioned for any non-zero input. Returns `None` when
/// `v` itself has (near-)zero norm.
pub fn stable_perpendicular(v: &Vec3) -> Option<Vec3> {
    if v.norm() < Tolerance::DEFAULT.linear {
        return None;
    }
    let ax = v.x.abs();
    let ay = v.y.abs();
    let az = v.z.abs();
    let axis = if ax <= ay && ax <= az {
        Vec3::x()
    } else if ay <= az {
        Vec3::y()
    } else {
        Vec3::z()
    };
    let p = v.cross(&axis);
    let n = p.norm();
    if n < Tolerance::DEFAULT.linear {
        None
    } else {
        Some(p / n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tolerance_points_equal() {
        let tol = Tolerance::DEFAULT;
        let a = Point3::new(1.0, 2.0, 3.0);
        let b = Point3::new(1.0 + 1e-12, 2.0, 3.0);
        assert!(tol.points_equal(&a, &b));
        let c = Point3::new(1.001, 2.0, 3.0);
        assert!(!tol.points_equal(&a, &c));
    }

    #[test]
    fn test_stable_perpendicular_axes() {
        for v in [
            Vec3::x(),
            Vec3::y(),
            Vec3::z(),
            Vec3::new(1.0, 2.0, 3.0),
            Vec3::new(-0.3, 0.0, 0.1),
        ] {
            let p = stable_perpendicular(&v).unwrap();
            assert!((p.norm() - 1.0).abs() < 1e-12);
            assert!(p.dot(&v).abs() < 1e-12 * v.norm().max(1.0));
        }
    }

    #[test]
    fn test_stable_perpendicular_zero() {
        assert!(stable_perpendicular(&Vec3::zeros()).is_none());
    }
}
