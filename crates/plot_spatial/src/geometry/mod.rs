//! Geometric value types and intersection tests
//!
//! Pure value operations shared by the tree backends and the ray-casting
//! layer: axis-aligned bounds, rays, circles and spheres, and the slab-method
//! ray/bounds intersection tests.

pub mod bounds;
pub mod primitives;

pub use bounds::{Aabb, Rect};
pub use primitives::{Circle, Ray, Ray2, Sphere, Viewport};
