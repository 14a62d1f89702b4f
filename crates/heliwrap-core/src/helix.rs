//! Conformal helix generation.
//!
//! Sweeps a rotating radius vector around a fitted skeleton curve. At
//! every sample the radius direction is the orientation normal rotated
//! about the tangent by an accumulated angle, the radius magnitude is
//! found by casting a ray against the surface mesh, and a periodic
//! ripple is added on top of the conformal distance.
//!
//! The accumulated angle is a prefix sum over the per-sample velocity
//! magnitudes (arc-length steps) scaled by the pitch; it is computed
//! once up front so the remaining per-sample work has no sequential
//! coupling. The 2n curves of a family are independent and are
//! generated in parallel.

use std::f64::consts::TAU;

use heliwrap_math::{Point3, Tolerance, Vec3};
use heliwrap_raytrace::{Bvh, Ray};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{HelixError, HelixResult};
use crate::fit::FittedCurve;

/// Fixed amplitude of the periodic ripple added to the conformal radius.
pub const RIPPLE_AMPLITUDE: f64 = 2.0;

/// Winding handedness of a helix relative to the curve tangent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Winding {
    /// Counterclockwise angular progression.
    Forward,
    /// Clockwise angular progression.
    Reverse,
}

impl Winding {
    /// Sign of the angular increment: +1 forward, -1 reverse.
    pub fn signum(&self) -> f64 {
        match self {
            Winding::Forward => 1.0,
            Winding::Reverse => -1.0,
        }
    }
}

/// Configuration of a single helix curve. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HelixSpec {
    /// Initial sweep angle in radians.
    pub start_angle: f64,
    /// Ripple frequency in cycles per full rotation.
    pub frequency: f64,
    /// Constant radial bias added beyond the conformal surface distance.
    pub radial_offset: f64,
    /// Arc length traveled per full rotation.
    pub pitch: f64,
    /// Winding handedness.
    pub winding: Winding,
}

impl HelixSpec {
    /// Validate the spec. Rejects non-positive or non-finite pitch,
    /// negative or non-finite frequency, and non-finite angles/offsets.
    pub fn validate(&self) -> HelixResult<()> {
        if !(self.pitch.is_finite() && self.pitch > 0.0) {
            return Err(HelixError::InvalidSpec("pitch must be positive".into()));
        }
        if !(self.frequency.is_finite() && self.frequency >= 0.0) {
            return Err(HelixError::InvalidSpec(
                "frequency must be non-negative".into(),
            ));
        }
        if !self.start_angle.is_finite() || !self.radial_offset.is_finite() {
            return Err(HelixError::InvalidSpec(
                "start angle and offset must be finite".into(),
            ));
        }
        Ok(())
    }
}

/// A generated helix: the spec that produced it plus its point sequence.
#[derive(Debug, Clone)]
pub struct HelixCurve {
    /// The configuration this curve was generated from.
    pub spec: HelixSpec,
    /// Helix points, one per fitted-curve sample.
    pub points: Vec<Point3>,
}

/// Surface distance queries consumed by the helix generator.
///
/// `cast_ray` returns the distance along the (normalized) direction to
/// the first surface intersection, or `None` when the ray escapes the
/// mesh. Implementations must be safe for concurrent read-only use.
pub trait SurfaceQuery {
    /// Distance from `origin` to the nearest surface hit along `direction`.
    fn cast_ray(&self, origin: &Point3, direction: &Vec3) -> Option<f64>;
}

impl SurfaceQuery for Bvh {
    fn cast_ray(&self, origin: &Point3, direction: &Vec3) -> Option<f64> {
        let hit = self.trace_closest(&Ray::new(*origin, *direction))?;
        hit.t.is_finite().then_some(hit.t)
    }
}

/// Accumulated sweep angle at every sample: a prefix sum of the
/// arc-length steps scaled by `2π / pitch`, signed by the winding.
///
/// The sum is inclusive: sample `i` already contains the step from
/// sample `i` itself.
fn accumulate_angles(curve: &FittedCurve, spec: &HelixSpec) -> Vec<f64> {
    let k = spec.winding.signum() * TAU / spec.pitch;
    let mut phi = spec.start_angle;
    curve
        .velocities()
        .iter()
        .map(|v| {
            phi += k * v.norm();
            phi
        })
        .collect()
}

/// Generate one helix curve around a fitted skeleton curve.
///
/// For each sample `i` with accumulated angle `phi`:
/// the radius direction is `orientation * cos(phi) + (orientation × tangent)
/// * sin(phi)`, the conformal radius `R` comes from a surface ray cast
/// along it, and the output point is
/// `position + (R + radial_offset + ripple) * direction` where `ripple =
/// signum * RIPPLE_AMPLITUDE * cos(frequency * phi)`.
///
/// A ray that escapes the mesh fails this curve with
/// [`HelixError::RadiusUndefined`]; no fallback radius is substituted.
pub fn generate<S: SurfaceQuery + ?Sized>(
    curve: &FittedCurve,
    surface: &S,
    spec: &HelixSpec,
) -> HelixResult<HelixCurve> {
    spec.validate()?;

    let angles = accumulate_angles(curve, spec);
    let signum = spec.winding.signum();
    let tol = Tolerance::DEFAULT;

    let mut points = Vec::with_capacity(curve.len());
    for i in 0..curve.len() {
        let speed = curve.velocities()[i].norm();
        if speed < tol.linear {
            return Err(HelixError::DegenerateFrame { sample: i });
        }
        let vn = curve.velocities()[i] / speed;
        let u = curve.orientations()[i];
        let phi = angles[i];

        // Rotation of the orientation normal about the tangent axis:
        // u and u × vn form an orthonormal basis of the normal plane.
        let ri = u * phi.cos() + u.cross(&vn) * phi.sin();

        let position = curve.positions()[i];
        let radius = surface
            .cast_ray(&position, &ri)
            .ok_or(HelixError::RadiusUndefined { sample: i })?;

        let ripple = signum * RIPPLE_AMPLITUDE * (spec.frequency * phi).cos();
        points.push(position + (radius + spec.radial_offset + ripple) * ri);
    }

    Ok(HelixCurve {
        spec: spec.clone(),
        points,
    })
}

/// Configuration of a helix family: `count` equally spaced start angles
/// over [0, 2π), each generated in both windings. The ripple frequency
/// equals `count`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HelixFamilySettings {
    /// Number of start angles (the family holds `2 * count` curves).
    pub count: usize,
    /// Arc length per full rotation.
    pub pitch: f64,
    /// Constant radial bias beyond the conformal surface distance.
    pub radial_offset: f64,
}

impl Default for HelixFamilySettings {
    fn default() -> Self {
        Self {
            count: 8,
            pitch: 200.0,
            radial_offset: 5.0,
        }
    }
}

impl HelixFamilySettings {
    /// Enumerate the specs of the family: all forward windings first,
    /// then all reverse, each over `count` equally spaced start angles.
    pub fn specs(&self) -> Vec<HelixSpec> {
        let mut specs = Vec::with_capacity(self.count * 2);
        for winding in [Winding::Forward, Winding::Reverse] {
            for k in 0..self.count {
                specs.push(HelixSpec {
                    start_angle: k as f64 * TAU / self.count as f64,
                    frequency: self.count as f64,
                    radial_offset: self.radial_offset,
                    pitch: self.pitch,
                    winding,
                });
            }
        }
        specs
    }
}

/// Generate the full helix family in parallel.
///
/// The curves are independent; each result is reported separately so a
/// failed curve (for example [`HelixError::RadiusUndefined`]) does not
/// abort its siblings. Results are in spec enumeration order regardless
/// of execution order.
pub fn generate_family<S: SurfaceQuery + Sync>(
    curve: &FittedCurve,
    surface: &S,
    settings: &HelixFamilySettings,
) -> Vec<(HelixSpec, HelixResult<HelixCurve>)> {
    settings
        .specs()
        .into_par_iter()
        .map(|spec| {
            let result = generate(curve, surface, &spec);
            (spec, result)
        })
        .collect()
}
