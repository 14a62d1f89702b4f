#![warn(missing_docs)]

//! Curve fitting and conformal helix generation.
//!
//! This crate is the algorithmic core of heliwrap: it turns a noisy
//! skeleton point set into a smooth parametric curve with a moving
//! frame, then sweeps rotating radius vectors around that curve, ray
//! casting against the surface mesh so every helix point sits at a
//! constant conformal offset from the true surface.
//!
//! # Pipeline
//!
//! ```ignore
//! use heliwrap_core::{fit, generate_family, FitSettings, HelixFamilySettings};
//! use heliwrap_raytrace::Bvh;
//!
//! let curve = fit(&skeleton.vertices, &FitSettings::default())?;
//! let bvh = Bvh::build(&mesh);
//! let family = generate_family(&curve, &bvh, &HelixFamilySettings::default());
//! for (spec, result) in family {
//!     // each curve succeeds or fails independently
//! }
//! ```

pub mod error;
pub mod fit;
pub mod helix;
pub mod spline;

pub use error::{FitError, FitResult, HelixError, HelixResult};
pub use fit::{fit, FitSettings, FittedCurve, DENSE_SAMPLES};
pub use helix::{
    generate, generate_family, HelixCurve, HelixFamilySettings, HelixSpec, SurfaceQuery, Winding,
    RIPPLE_AMPLITUDE,
};
pub use spline::SmoothingSpline;
