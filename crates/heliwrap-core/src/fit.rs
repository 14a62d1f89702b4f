//! Skeleton curve fitting.
//!
//! Turns a noisy, irregularly spaced skeleton point set into a dense
//! smooth curve with a moving frame: per-sample velocity, acceleration,
//! and a unit orientation normal used as the reference direction for
//! angular sweeps.
//!
//! Ordering along the skeleton is imposed by sorting on Z — the axis the
//! skeleton grows along — under the assumption of a single monotonic
//! path. Skeleton edge records are deliberately ignored; branching
//! skeletons are out of scope.

use heliwrap_math::{stable_perpendicular, Point3, Tolerance, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::{FitError, FitResult};
use crate::spline::SmoothingSpline;

/// Resolution of the second, dense fitting pass. The dense curve is what
/// finite differencing and helix generation operate on.
pub const DENSE_SAMPLES: usize = 2000;

/// Curve fitting parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitSettings {
    /// Number of points in the first-pass denoised curve.
    pub samples: usize,
    /// Spline polynomial order for both fitting passes.
    pub order: usize,
}

impl Default for FitSettings {
    fn default() -> Self {
        Self {
            samples: 10,
            order: 3,
        }
    }
}

impl FitSettings {
    /// Validate settings against the number of input points.
    pub fn validate(&self, num_points: usize) -> FitResult<()> {
        if self.order < 1 {
            return Err(FitError::InvalidParameters("order must be >= 1".into()));
        }
        if self.samples < self.order + 1 {
            return Err(FitError::InvalidParameters(format!(
                "samples must be at least order + 1 = {}",
                self.order + 1
            )));
        }
        if num_points < self.order + 1 {
            return Err(FitError::NotEnoughPoints {
                got: num_points,
                need: self.order + 1,
            });
        }
        Ok(())
    }
}

/// A fitted skeleton curve with its moving frame.
///
/// Four parallel sequences of equal length: positions, velocities
/// (first finite differences), accelerations (second differences), and
/// unit orientation normals. Constructed only by [`fit`]; immutable
/// afterwards.
#[derive(Debug, Clone)]
pub struct FittedCurve {
    positions: Vec<Point3>,
    velocities: Vec<Vec3>,
    accelerations: Vec<Vec3>,
    orientations: Vec<Vec3>,
}

impl FittedCurve {
    /// Number of samples.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// True when the curve has no samples.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Sample positions along the curve.
    pub fn positions(&self) -> &[Point3] {
        &self.positions
    }

    /// Finite-difference velocity at each sample (not normalized).
    pub fn velocities(&self) -> &[Vec3] {
        &self.velocities
    }

    /// Finite-difference acceleration at each sample.
    pub fn accelerations(&self) -> &[Vec3] {
        &self.accelerations
    }

    /// Unit orientation normal at each sample, orthogonal to the tangent.
    pub fn orientations(&self) -> &[Vec3] {
        &self.orientations
    }
}

/// Control-point count giving the least-squares fit its smoothing:
/// roughly the square root of the sample count, never below the minimum
/// the degree requires and never above the sample count itself.
fn smoothing_control_count(num_points: usize, degree: usize) -> usize {
    let target = (num_points as f64).sqrt().ceil() as usize + degree;
    target.clamp(degree + 1, num_points)
}

/// Fit a smoothing spline through `points` and resample it at `count`
/// uniformly spaced parameters.
fn smooth_resample(points: &[Point3], count: usize, degree: usize) -> FitResult<Vec<Point3>> {
    let n_ctrl = smoothing_control_count(points.len(), degree);
    let spline = SmoothingSpline::fit(points, degree, n_ctrl)?;
    Ok(spline.sample_uniform(count))
}

/// Fit a smooth, densely sampled curve with a moving frame to a raw
/// skeleton point set.
///
/// The pipeline: sort by Z, denoise with a first smoothing-spline pass
/// evaluated at `settings.samples` points, re-fit and evaluate at
/// [`DENSE_SAMPLES`] points, then difference twice for velocity and
/// acceleration and build the orientation normal by Gram-Schmidt
/// projection of the acceleration against the unit tangent.
///
/// Where the frame degenerates (locally straight curve, near-zero
/// acceleration), the previous sample's orientation is carried forward
/// and re-orthogonalized against the current tangent; at the first
/// sample a stable arbitrary perpendicular of the tangent is used. A
/// vanishing velocity is unrecoverable and fails with
/// [`FitError::DegenerateFrame`].
pub fn fit(points: &[Point3], settings: &FitSettings) -> FitResult<FittedCurve> {
    settings.validate(points.len())?;
    if points
        .iter()
        .any(|p| !(p.x.is_finite() && p.y.is_finite() && p.z.is_finite()))
    {
        return Err(FitError::InvalidParameters(
            "input contains non-finite coordinates".into(),
        ));
    }

    // Impose an ordering along the growth axis.
    let mut sorted = points.to_vec();
    sorted.sort_by(|a, b| a.z.total_cmp(&b.z));

    // Two-pass smoothing: denoise, then densify.
    let coarse = smooth_resample(&sorted, settings.samples, settings.order)?;
    let dense = smooth_resample(&coarse, DENSE_SAMPLES, settings.order)?;

    // First differences for velocity, second for acceleration. Each
    // difference shortens the sequence by one, so trim everything to the
    // acceleration length.
    let velocities: Vec<Vec3> = dense.windows(2).map(|w| w[1] - w[0]).collect();
    let accelerations: Vec<Vec3> = velocities.windows(2).map(|w| w[1] - w[0]).collect();

    let n = accelerations.len();
    let positions: Vec<Point3> = dense[..n].to_vec();
    let velocities: Vec<Vec3> = velocities[..n].to_vec();

    let tol = Tolerance::DEFAULT;
    let mut orientations = Vec::with_capacity(n);
    let mut prev: Option<Vec3> = None;

    for i in 0..n {
        let speed = velocities[i].norm();
        if speed < tol.linear {
            return Err(FitError::DegenerateFrame { index: i });
        }
        let vn = velocities[i] / speed;

        let projected = {
            let mag = accelerations[i].norm();
            if mag < tol.linear {
                None
            } else {
                let an = accelerations[i] / mag;
                let residual = an - vn * an.dot(&vn);
                let len = residual.norm();
                // The projection collapses when acceleration is parallel
                // to velocity (straight-line motion with speed change).
                if len < tol.linear {
                    None
                } else {
                    Some(residual / len)
                }
            }
        };

        let orientation = match projected {
            Some(u) => u,
            None => fallback_orientation(&vn, prev.as_ref()),
        };
        prev = Some(orientation);
        orientations.push(orientation);
    }

    Ok(FittedCurve {
        positions,
        velocities,
        accelerations,
        orientations,
    })
}

/// Orientation for a sample whose frame is degenerate: carry the previous
/// orientation forward, re-orthogonalized against the current tangent, or
/// fall back to a stable perpendicular at the first sample.
fn fallback_orientation(vn: &Vec3, prev: Option<&Vec3>) -> Vec3 {
    if let Some(p) = prev {
        let residual = *p - vn * p.dot(vn);
        let len = residual.norm();
        if len >= Tolerance::DEFAULT.linear {
            return residual / len;
        }
    }
    // vn is unit length here, so a perpendicular always exists.
    stable_perpendicular(vn).unwrap_or_else(Vec3::x)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Points along a gently curving cubic, monotone in Z.
    fn cubic_skeleton(count: usize) -> Vec<Point3> {
        (0..count)
            .map(|i| {
                let t = i as f64;
                Point3::new(0.002 * t * t * t - 0.05 * t * t, 0.3 * t, 2.0 * t)
            })
            .collect()
    }

    #[test]
    fn test_sequences_share_length() {
        let curve = fit(&cubic_skeleton(30), &FitSettings::default()).unwrap();
        assert_eq!(curve.len(), DENSE_SAMPLES - 2);
        assert_eq!(curve.positions().len(), curve.velocities().len());
        assert_eq!(curve.velocities().len(), curve.accelerations().len());
        assert_eq!(curve.accelerations().len(), curve.orientations().len());
    }

    #[test]
    fn test_orientation_invariants() {
        let curve = fit(&cubic_skeleton(30), &FitSettings::default()).unwrap();
        for i in 0..curve.len() {
            let u = curve.orientations()[i];
            let vn = curve.velocities()[i].normalize();
            assert!((u.norm() - 1.0).abs() < 1e-9, "sample {i}");
            assert!(u.dot(&vn).abs() < 1e-9, "sample {i}");
        }
    }

    #[test]
    fn test_straight_skeleton_uses_fallback_frame() {
        // Colinear points: acceleration vanishes, orientation must still
        // be a well-defined unit perpendicular with no NaN anywhere.
        let points: Vec<Point3> = (0..20).map(|i| Point3::new(0.0, 0.0, i as f64)).collect();
        let curve = fit(&points, &FitSettings::default()).unwrap();
        for i in 0..curve.len() {
            let u = curve.orientations()[i];
            assert!(u.x.is_finite() && u.y.is_finite() && u.z.is_finite());
            assert!((u.norm() - 1.0).abs() < 1e-9);
            assert!(u.z.abs() < 1e-9); // perpendicular to the Z tangent
        }
    }

    #[test]
    fn test_stalled_skeleton_is_degenerate() {
        // All-identical points: the fitted curve collapses to a single
        // position and the velocity vanishes everywhere. Unlike the
        // zero-acceleration case there is no recoverable frame, so the
        // whole fit must fail at the first sample.
        let points = vec![Point3::new(1.0, 2.0, 3.0); 30];
        assert!(matches!(
            fit(&points, &FitSettings::default()),
            Err(FitError::DegenerateFrame { index: 0 })
        ));
    }

    #[test]
    fn test_unsorted_input_is_sorted_by_z() {
        let mut points = cubic_skeleton(30);
        points.reverse();
        points.swap(3, 17);
        let a = fit(&points, &FitSettings::default()).unwrap();
        let b = fit(&cubic_skeleton(30), &FitSettings::default()).unwrap();
        for i in 0..a.len() {
            assert!((a.positions()[i] - b.positions()[i]).norm() < 1e-12);
        }
    }

    #[test]
    fn test_round_trip_resampling() {
        // A cubic lies exactly in the cubic spline space, so both passes
        // reproduce it and the dense curve should track the analytic one.
        let count = 40;
        let points = cubic_skeleton(count);
        let settings = FitSettings {
            samples: count,
            order: 3,
        };
        let curve = fit(&points, &settings).unwrap();
        let n = curve.len();
        for (i, p) in curve.positions().iter().enumerate() {
            let u = i as f64 / (DENSE_SAMPLES - 1) as f64;
            let t = u * (count - 1) as f64;
            let expected = Point3::new(0.002 * t * t * t - 0.05 * t * t, 0.3 * t, 2.0 * t);
            assert!(
                (p - expected).norm() < 1e-4,
                "sample {i}/{n} drifted: {p:?} vs {expected:?}"
            );
        }
    }

    #[test]
    fn test_invalid_parameters() {
        let points = cubic_skeleton(30);
        let bad_order = FitSettings {
            samples: 10,
            order: 0,
        };
        assert!(matches!(
            fit(&points, &bad_order),
            Err(FitError::InvalidParameters(_))
        ));

        let bad_samples = FitSettings {
            samples: 3,
            order: 3,
        };
        assert!(matches!(
            fit(&points, &bad_samples),
            Err(FitError::InvalidParameters(_))
        ));

        let too_few = cubic_skeleton(3);
        assert!(matches!(
            fit(&too_few, &FitSettings::default()),
            Err(FitError::NotEnoughPoints { got: 3, need: 4 })
        ));
    }

    #[test]
    fn test_non_finite_input_rejected() {
        let mut points = cubic_skeleton(30);
        points[5].y = f64::NAN;
        assert!(matches!(
            fit(&points, &FitSettings::default()),
            Err(FitError::InvalidParameters(_))
        ));
    }

    #[test]
    fn test_determinism() {
        let points = cubic_skeleton(25);
        let a = fit(&points, &FitSettings::default()).unwrap();
        let b = fit(&points, &FitSettings::default()).unwrap();
        for i in 0..a.len() {
            assert_eq!(a.positions()[i], b.positions()[i]);
            assert_eq!(a.orientations()[i], b.orientations()[i]);
        }
    }

    #[test]
    fn test_smoothing_control_count_bounds() {
        assert_eq!(smoothing_control_count(4, 3), 4);
        assert!(smoothing_control_count(100, 3) <= 100);
        assert!(smoothing_control_count(100, 3) >= 4);
        assert_eq!(smoothing_control_count(10, 3), 7);
    }
}
