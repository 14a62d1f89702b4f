#![warn(missing_docs)]

//! BVH-accelerated ray casting against triangle meshes.
//!
//! This crate answers the single geometric query the helix pipeline needs:
//! "from point P in direction V, how far to the surface?" It builds a
//! bounding volume hierarchy over the mesh triangles once, then serves
//! read-only ray queries from any number of threads.
//!
//! # Architecture
//!
//! - [`Ray`] - Ray representation with origin and direction
//! - [`RayHit`] - Intersection result with triangle index
//! - [`intersect`] - Möller–Trumbore ray-triangle test
//! - [`bvh`] - Bounding volume hierarchy with SAH construction
//!
//! # Example
//!
//! ```ignore
//! use heliwrap_raytrace::{Bvh, Ray};
//!
//! let mesh = heliwrap_mesh::load_mesh("leg.stl")?;
//! let bvh = Bvh::build(&mesh);
//!
//! let ray = Ray::new(Point3::origin(), Vec3::x());
//! if let Some(hit) = bvh.trace_closest(&ray) {
//!     println!("surface at distance {}", hit.t);
//! }
//! ```

pub mod bvh;
pub mod intersect;
mod ray;

pub use bvh::Bvh;
pub use ray::{Ray, RayHit};
