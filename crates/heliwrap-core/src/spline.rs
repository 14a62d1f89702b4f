//! Least-squares smoothing B-splines.
//!
//! A [`SmoothingSpline`] is a clamped uniform B-spline curve fit to a
//! point sequence by linear least squares. Smoothing comes from giving
//! the spline fewer control points than data points, so the solve
//! averages out sampling noise instead of interpolating it.

use heliwrap_math::Point3;
use nalgebra::DMatrix;

use crate::error::{FitError, FitResult};

/// Find the knot span index for parameter `t`.
///
/// Returns `i` such that `knots[i] <= t < knots[i+1]`, clamped to the valid
/// range. For `t` at the end of the domain, returns the last valid span.
fn find_span(knots: &[f64], n: usize, degree: usize, t: f64) -> usize {
    // n = number of control points - 1 (last index)
    if t >= knots[n + 1] {
        return n; // last valid span
    }
    if t <= knots[degree] {
        return degree; // first valid span
    }
    // Binary search
    let mut low = degree;
    let mut high = n + 1;
    let mut mid = (low + high) / 2;
    while t < knots[mid] || t >= knots[mid + 1] {
        if t < knots[mid] {
            high = mid;
        } else {
            low = mid;
        }
        mid = (low + high) / 2;
    }
    mid
}

/// Compute non-zero basis function values at parameter `t`.
///
/// Returns `degree + 1` values `N[span-degree..=span]` at `t`.
fn basis_functions(knots: &[f64], span: usize, degree: usize, t: f64) -> Vec<f64> {
    let mut n = vec![0.0; degree + 1];
    let mut left = vec![0.0; degree + 1];
    let mut right = vec![0.0; degree + 1];
    n[0] = 1.0;

    for j in 1..=degree {
        left[j] = t - knots[span + 1 - j];
        right[j] = knots[span + j] - t;
        let mut saved = 0.0;
        for r in 0..j {
            let denom = right[r + 1] + left[j - r];
            if denom.abs() < 1e-30 {
                // Zero-length knot interval — avoid division by zero
                n[j] = saved;
                continue;
            }
            let temp = n[r] / denom;
            n[r] = saved + right[r + 1] * temp;
            saved = left[j - r] * temp;
        }
        n[j] = saved;
    }

    n
}

/// Clamped uniform knot vector on [0, 1] for `n_ctrl` control points.
fn clamped_uniform_knots(n_ctrl: usize, degree: usize) -> Vec<f64> {
    let m = n_ctrl + degree + 1;
    let mut knots = vec![0.0; m];
    let n_internal = m - 2 * (degree + 1);
    for i in 0..=degree {
        knots[i] = 0.0;
        knots[m - 1 - i] = 1.0;
    }
    for i in 1..=n_internal {
        knots[degree + i] = i as f64 / (n_internal + 1) as f64;
    }
    knots
}

/// A 3D smoothing spline: one clamped uniform B-spline curve fit to a
/// point sequence by least squares, parameterized on [0, 1].
#[derive(Debug, Clone)]
pub struct SmoothingSpline {
    degree: usize,
    knots: Vec<f64>,
    control: Vec<Point3>,
}

impl SmoothingSpline {
    /// Fit a smoothing spline to `points` (parameterized uniformly by
    /// sample index) with the given degree and control-point count.
    ///
    /// Requires `degree >= 1`, `n_ctrl >= degree + 1`, and at least as
    /// many points as control points so the system is not underdetermined.
    pub fn fit(points: &[Point3], degree: usize, n_ctrl: usize) -> FitResult<Self> {
        let m = points.len();
        if degree < 1 {
            return Err(FitError::InvalidParameters("order must be >= 1".into()));
        }
        if n_ctrl < degree + 1 {
            return Err(FitError::InvalidParameters(format!(
                "need at least {} control points for order {}",
                degree + 1,
                degree
            )));
        }
        if m < n_ctrl {
            return Err(FitError::NotEnoughPoints {
                got: m,
                need: n_ctrl,
            });
        }

        let knots = clamped_uniform_knots(n_ctrl, degree);
        let n = n_ctrl - 1;

        // Design matrix: row i holds the basis values at parameter u_i.
        let mut a = DMatrix::<f64>::zeros(m, n_ctrl);
        for i in 0..m {
            let u = i as f64 / (m - 1) as f64;
            let span = find_span(&knots, n, degree, u);
            let basis = basis_functions(&knots, span, degree, u);
            for (j, &b) in basis.iter().enumerate() {
                a[(i, span - degree + j)] = b;
            }
        }

        let b = DMatrix::<f64>::from_fn(m, 3, |i, j| points[i][j]);

        let svd = a.svd(true, true);
        let sol = svd
            .solve(&b, 1e-12)
            .map_err(|e| FitError::SolveFailed(e.to_string()))?;

        let control = (0..n_ctrl)
            .map(|i| Point3::new(sol[(i, 0)], sol[(i, 1)], sol[(i, 2)]))
            .collect();

        Ok(Self {
            degree,
            knots,
            control,
        })
    }

    /// Evaluate the spline at parameter `u`, clamped to [0, 1].
    pub fn eval(&self, u: f64) -> Point3 {
        let n = self.control.len() - 1;
        let u = u.clamp(self.knots[self.degree], self.knots[n + 1]);
        let span = find_span(&self.knots, n, self.degree, u);
        let basis = basis_functions(&self.knots, span, self.degree, u);

        let mut point = Point3::origin();
        for (i, &b) in basis.iter().enumerate() {
            let cp = &self.control[span - self.degree + i];
            point.x += b * cp.x;
            point.y += b * cp.y;
            point.z += b * cp.z;
        }
        point
    }

    /// Evaluate the spline at `count` uniformly spaced parameters over [0, 1].
    pub fn sample_uniform(&self, count: usize) -> Vec<Point3> {
        (0..count)
            .map(|k| self.eval(k as f64 / (count - 1).max(1) as f64))
            .collect()
    }

    /// Number of control points.
    pub fn num_control_points(&self) -> usize {
        self.control.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basis_partition_of_unity() {
        use approx::assert_relative_eq;

        let degree = 3;
        let knots = clamped_uniform_knots(8, degree);
        for k in 0..=20 {
            let u = k as f64 / 20.0;
            let span = find_span(&knots, 7, degree, u);
            let basis = basis_functions(&knots, span, degree, u);
            let sum: f64 = basis.iter().sum();
            assert_relative_eq!(sum, 1.0, epsilon = 1e-12);
            assert!(basis.iter().all(|&b| b >= -1e-12));
        }
    }

    #[test]
    fn test_fit_reproduces_line() {
        // A straight line is in every spline space; least squares recovers
        // it exactly even with heavy smoothing.
        let points: Vec<Point3> = (0..50)
            .map(|i| {
                let t = i as f64;
                Point3::new(2.0 * t, -t, 0.5 * t + 1.0)
            })
            .collect();
        let spline = SmoothingSpline::fit(&points, 3, 6).unwrap();
        for k in 0..=10 {
            let u = k as f64 / 10.0;
            let t = u * 49.0;
            let expected = Point3::new(2.0 * t, -t, 0.5 * t + 1.0);
            assert!((spline.eval(u) - expected).norm() < 1e-8);
        }
    }

    #[test]
    fn test_fit_reproduces_cubic() {
        // Degree-3 polynomials lie in the cubic spline space exactly.
        let f = |t: f64| Point3::new(t, 0.01 * t * t * t - 0.2 * t * t, 2.0 * t);
        let points: Vec<Point3> = (0..40).map(|i| f(i as f64)).collect();
        let spline = SmoothingSpline::fit(&points, 3, 9).unwrap();
        for k in 0..=20 {
            let u = k as f64 / 20.0;
            let expected = f(u * 39.0);
            assert!((spline.eval(u) - expected).norm() < 1e-6);
        }
    }

    #[test]
    fn test_square_system_interpolates() {
        let points = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 2.0, 0.0),
            Point3::new(2.0, 1.5, 1.0),
            Point3::new(3.0, 0.0, 2.0),
        ];
        let spline = SmoothingSpline::fit(&points, 3, 4).unwrap();
        assert!((spline.eval(0.0) - points[0]).norm() < 1e-9);
        assert!((spline.eval(1.0) - points[3]).norm() < 1e-9);
    }

    #[test]
    fn test_fit_rejects_bad_parameters() {
        let points: Vec<Point3> = (0..5).map(|i| Point3::new(i as f64, 0.0, 0.0)).collect();
        assert!(matches!(
            SmoothingSpline::fit(&points, 0, 4),
            Err(FitError::InvalidParameters(_))
        ));
        assert!(matches!(
            SmoothingSpline::fit(&points, 3, 3),
            Err(FitError::InvalidParameters(_))
        ));
        assert!(matches!(
            SmoothingSpline::fit(&points, 3, 6),
            Err(FitError::NotEnoughPoints { got: 5, need: 6 })
        ));
    }

    #[test]
    fn test_sample_uniform_endpoints() {
        let points: Vec<Point3> = (0..10).map(|i| Point3::new(i as f64, 0.0, 0.0)).collect();
        let spline = SmoothingSpline::fit(&points, 2, 5).unwrap();
        let samples = spline.sample_uniform(7);
        assert_eq!(samples.len(), 7);
        assert!((samples[0] - spline.eval(0.0)).norm() < 1e-12);
        assert!((samples[6] - spline.eval(1.0)).norm() < 1e-12);
    }
}
