//! # Plot Spatial
//!
//! Spatial indexing and ray casting for interactive plot visualizations.
//!
//! After a layout pass assigns coordinates to a set of entities, this crate
//! answers "which entities are near this point / inside this region / along
//! this ray" in sub-linear time.
//!
//! ## Features
//!
//! - **Quadtree / Octree**: recursive spatial partitioning over 2D or 3D
//!   layouts, selected automatically from the input's dimensionality
//! - **Ray Casting**: slab-method bounds pruning with tolerance-based entity
//!   hit testing, results ranked by distance
//! - **Single Query Surface**: one facade for point, region, and ray
//!   queries regardless of backend
//! - **Diagnostics**: build statistics and serializable tree snapshots
//!
//! ## Quick Start
//!
//! ```rust
//! use plot_spatial::prelude::*;
//!
//! let entities = vec![
//!     PositionedEntity::new_2d(EntityId::new(1), 10.0, 10.0),
//!     PositionedEntity::new_2d(EntityId::new(2), 80.0, 80.0),
//! ];
//!
//! let mut index = SpatialIndex::with_defaults();
//! index.build(&entities).expect("uniform 2D input");
//!
//! // Entities within 30 units of a point.
//! let near = index.query_point(Vec2::new(15.0, 15.0), 30.0);
//! assert_eq!(near.len(), 1);
//!
//! // Entities along a pick ray, closest first.
//! let hits = index.query_ray(Ray2::new(Vec2::new(0.0, 0.0), Vec2::new(1.0, 1.0)));
//! assert_eq!(hits.first().map(|hit| hit.entity), Some(EntityId::new(1)));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod entity;
pub mod foundation;
pub mod geometry;
pub mod spatial;

pub use config::{Config, ConfigError, SpatialIndexConfig};
pub use entity::{EntityId, PositionedEntity};
pub use spatial::{SpatialError, SpatialIndex};

/// Common imports for crate users
pub mod prelude {
    pub use crate::{
        config::{Config, ConfigError, SpatialIndexConfig},
        entity::{EntityId, PositionedEntity},
        foundation::math::{Vec2, Vec3},
        geometry::{Aabb, Circle, Ray, Ray2, Rect, Sphere, Viewport},
        spatial::{
            closest_intersection, filter_by_distance, Dimensionality, IndexStatistics, OctTree,
            QuadTree, QueryPoint, QueryRay, RayIntersection, RaycastingSystem, Region,
            SpatialError, SpatialIndex, TreeSnapshot, TreeStats,
        },
    };
}
