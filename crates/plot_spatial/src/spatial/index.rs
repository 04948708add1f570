//! Spatial index facade over the quadtree and octree backends
//!
//! `SpatialIndex` owns one tree at a time, selected from the dimensionality
//! of the entities handed to [`SpatialIndex::build`], and exposes a single
//! point/region/ray query surface regardless of backend. A new layout pass
//! rebuilds the tree wholesale; queries never observe a partial rebuild.

use crate::config::SpatialIndexConfig;
use crate::entity::{EntityId, PositionedEntity};
use crate::foundation::math::{Vec2, Vec3};
use crate::geometry::{Aabb, Circle, Rect, Sphere};
use crate::spatial::quadtree::POINT_MATCH_EPSILON;
use crate::spatial::raycast::{QueryRay, RayIntersection, RaycastingSystem};
use crate::spatial::{OctTree, QuadTree, SpatialError, TreeSnapshot};
use log::debug;
use serde::{Deserialize, Serialize};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

/// Dimensionality of the indexed entity set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Dimensionality {
    /// All entities are 2D; the quadtree backend serves queries
    Planar,
    /// All entities carry a z coordinate; the octree backend serves queries
    Spatial,
}

/// A query point in either 2D or 3D form
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum QueryPoint {
    /// 2D point; against an octree this selects cylinder semantics
    Planar(Vec2),
    /// 3D point; against a quadtree the z coordinate is discarded
    Spatial(Vec3),
}

impl From<Vec2> for QueryPoint {
    fn from(point: Vec2) -> Self {
        Self::Planar(point)
    }
}

impl From<Vec3> for QueryPoint {
    fn from(point: Vec3) -> Self {
        Self::Spatial(point)
    }
}

/// A query region in any of the supported shapes
///
/// Shapes are coerced to the active backend's dimensionality: planar shapes
/// against an octree span the tree's full depth (rectangles as boxes,
/// circles as cylinders); volumetric shapes against a quadtree are projected
/// onto the XY plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Region {
    /// Axis-aligned rectangle
    Rect(Rect),
    /// Circle
    Circle(Circle),
    /// Axis-aligned box
    Aabb(Aabb),
    /// Sphere
    Sphere(Sphere),
}

impl From<Rect> for Region {
    fn from(rect: Rect) -> Self {
        Self::Rect(rect)
    }
}

impl From<Circle> for Region {
    fn from(circle: Circle) -> Self {
        Self::Circle(circle)
    }
}

impl From<Aabb> for Region {
    fn from(aabb: Aabb) -> Self {
        Self::Aabb(aabb)
    }
}

impl From<Sphere> for Region {
    fn from(sphere: Sphere) -> Self {
        Self::Sphere(sphere)
    }
}

/// Statistics for the most recent build
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct IndexStatistics {
    /// Entities indexed by the last build
    pub entity_count: usize,
    /// Deepest node level reached
    pub max_depth: u32,
    /// Mean level of stored entities
    pub average_depth: f64,
    /// Heuristic memory estimate in bytes
    pub memory_usage_bytes: usize,
    /// Wall-clock duration of the last build in milliseconds
    pub build_time_ms: f64,
    /// Unix timestamp of the last build in milliseconds, `None` before the
    /// first build
    pub last_build_timestamp_ms: Option<u64>,
}

/// The active tree backend
#[derive(Debug, Clone)]
enum TreeBackend {
    Quad(QuadTree),
    Oct(OctTree),
}

/// Facade selecting and querying a spatial tree backend
///
/// # Usage
/// ```
/// use plot_spatial::prelude::*;
///
/// let entities = vec![
///     PositionedEntity::new_2d(EntityId::new(1), 10.0, 10.0),
///     PositionedEntity::new_2d(EntityId::new(2), 80.0, 80.0),
/// ];
///
/// let mut index = SpatialIndex::with_defaults();
/// index.build(&entities).expect("uniform 2D input");
///
/// let near = index.query_point(Vec2::new(10.0, 10.0), 5.0);
/// assert_eq!(near.len(), 1);
/// ```
#[derive(Debug)]
pub struct SpatialIndex {
    config: SpatialIndexConfig,
    raycaster: RaycastingSystem,
    backend: Option<TreeBackend>,
    statistics: IndexStatistics,
    stale: bool,
}

impl SpatialIndex {
    /// Create an index with a validated configuration
    pub fn new(config: SpatialIndexConfig) -> Result<Self, SpatialError> {
        config.validate()?;
        Ok(Self {
            raycaster: RaycastingSystem::new(&config),
            config,
            backend: None,
            statistics: IndexStatistics::default(),
            stale: false,
        })
    }

    /// Create an index with the default configuration
    pub fn with_defaults() -> Self {
        let config = SpatialIndexConfig::default();
        Self {
            raycaster: RaycastingSystem::new(&config),
            config,
            backend: None,
            statistics: IndexStatistics::default(),
            stale: false,
        }
    }

    /// Build the index over a freshly laid-out entity set
    ///
    /// Selects the quadtree backend when no entity carries a z coordinate
    /// and the octree backend when every entity does; mixed input is
    /// rejected. On error the previously built tree is left untouched, so
    /// callers never query a partially-rebuilt index.
    pub fn build(&mut self, entities: &[PositionedEntity]) -> Result<(), SpatialError> {
        let started = Instant::now();

        self.backend = match detect_dimensionality(entities)? {
            None => None,
            Some(Dimensionality::Planar) => {
                Some(TreeBackend::Quad(QuadTree::build(entities, &self.config)?))
            }
            Some(Dimensionality::Spatial) => {
                Some(TreeBackend::Oct(OctTree::build(entities, &self.config)?))
            }
        };

        let tree_stats = match &self.backend {
            None => Default::default(),
            Some(TreeBackend::Quad(tree)) => tree.stats(),
            Some(TreeBackend::Oct(tree)) => tree.stats(),
        };
        self.statistics = IndexStatistics {
            entity_count: tree_stats.entity_count,
            max_depth: tree_stats.max_depth,
            average_depth: tree_stats.average_depth,
            memory_usage_bytes: tree_stats.memory_usage_bytes,
            build_time_ms: started.elapsed().as_secs_f64() * 1000.0,
            last_build_timestamp_ms: unix_timestamp_ms(),
        };
        self.stale = false;

        debug!(
            "spatial index built: {} entities, backend {:?}, {:.3} ms",
            self.statistics.entity_count,
            self.dimensionality(),
            self.statistics.build_time_ms
        );
        Ok(())
    }

    /// Query entities within a radius of a point
    ///
    /// A zero radius matches entities at the point's exact coordinates
    /// within floating tolerance. A 2D point against the octree backend
    /// selects across the whole depth range (cylinder semantics).
    pub fn query_point(
        &self,
        point: impl Into<QueryPoint>,
        radius: f64,
    ) -> Vec<PositionedEntity> {
        match (&self.backend, point.into()) {
            (None, _) => Vec::new(),
            (Some(TreeBackend::Quad(tree)), QueryPoint::Planar(p)) => {
                tree.query_point(p, radius)
            }
            (Some(TreeBackend::Quad(tree)), QueryPoint::Spatial(p)) => {
                tree.query_point(p.xy(), radius)
            }
            (Some(TreeBackend::Oct(tree)), QueryPoint::Spatial(p)) => {
                tree.query_point(p, radius)
            }
            (Some(TreeBackend::Oct(tree)), QueryPoint::Planar(p)) => {
                tree.query_cylinder(p, radius.max(POINT_MATCH_EPSILON))
            }
        }
    }

    /// Query entities inside a region
    pub fn query_region(&self, region: impl Into<Region>) -> Vec<PositionedEntity> {
        match (&self.backend, region.into()) {
            (None, _) => Vec::new(),
            (Some(TreeBackend::Quad(tree)), Region::Rect(rect)) => tree.query_rect(&rect),
            (Some(TreeBackend::Quad(tree)), Region::Circle(circle)) => {
                tree.query_circle(&circle)
            }
            (Some(TreeBackend::Quad(tree)), Region::Aabb(aabb)) => {
                tree.query_rect(&Rect::new(aabb.min.xy(), aabb.max.xy()))
            }
            (Some(TreeBackend::Quad(tree)), Region::Sphere(sphere)) => {
                tree.query_circle(&Circle::new(sphere.center.xy(), sphere.radius))
            }
            (Some(TreeBackend::Oct(tree)), Region::Aabb(aabb)) => tree.query_aabb(&aabb),
            (Some(TreeBackend::Oct(tree)), Region::Sphere(sphere)) => {
                tree.query_sphere(&sphere)
            }
            (Some(TreeBackend::Oct(tree)), Region::Rect(rect)) => {
                // Planar rectangle selects across the whole depth range.
                let Some(bounds) = tree.bounds() else {
                    return Vec::new();
                };
                tree.query_aabb(&Aabb::new(
                    Vec3::new(rect.min.x, rect.min.y, bounds.min.z),
                    Vec3::new(rect.max.x, rect.max.y, bounds.max.z),
                ))
            }
            (Some(TreeBackend::Oct(tree)), Region::Circle(circle)) => {
                tree.query_cylinder(circle.center, circle.radius)
            }
        }
    }

    /// Cast a ray and return intersections sorted ascending by distance
    pub fn query_ray(&self, ray: impl Into<QueryRay>) -> Vec<RayIntersection> {
        match &self.backend {
            None => Vec::new(),
            Some(TreeBackend::Quad(tree)) => self.raycaster.cast_quadtree(tree, ray),
            Some(TreeBackend::Oct(tree)) => self.raycaster.cast_octree(tree, ray),
        }
    }

    /// Find an indexed entity by id
    pub fn find_entity(&self, id: EntityId) -> Option<PositionedEntity> {
        match &self.backend {
            None => None,
            Some(TreeBackend::Quad(tree)) => tree.find_entity(id),
            Some(TreeBackend::Oct(tree)) => tree.find_entity(id),
        }
    }

    /// Query entities within a radius of an already-indexed entity
    pub fn query_nearby(&self, id: EntityId, radius: f64) -> Vec<PositionedEntity> {
        match &self.backend {
            None => Vec::new(),
            Some(TreeBackend::Quad(tree)) => tree.query_nearby(id, radius),
            Some(TreeBackend::Oct(tree)) => tree.query_nearby(id, radius),
        }
    }

    /// Statistics for the most recent build
    pub fn statistics(&self) -> &IndexStatistics {
        &self.statistics
    }

    /// Plain nested snapshot of the active tree, `None` when empty
    pub fn to_data(&self) -> Option<TreeSnapshot> {
        match &self.backend {
            None => None,
            Some(TreeBackend::Quad(tree)) => tree.to_data(),
            Some(TreeBackend::Oct(tree)) => tree.to_data(),
        }
    }

    /// Dimensionality of the active backend, `None` before a build
    pub fn dimensionality(&self) -> Option<Dimensionality> {
        match &self.backend {
            None => None,
            Some(TreeBackend::Quad(_)) => Some(Dimensionality::Planar),
            Some(TreeBackend::Oct(_)) => Some(Dimensionality::Spatial),
        }
    }

    /// Whether the index holds no entities
    pub fn is_empty(&self) -> bool {
        match &self.backend {
            None => true,
            Some(TreeBackend::Quad(tree)) => tree.is_empty(),
            Some(TreeBackend::Oct(tree)) => tree.is_empty(),
        }
    }

    /// Discard the built tree
    pub fn clear(&mut self) {
        self.backend = None;
        self.statistics = IndexStatistics::default();
    }

    /// The active configuration
    pub fn config(&self) -> &SpatialIndexConfig {
        &self.config
    }

    /// Replace the configuration, invalidating any built tree
    ///
    /// A tree built under the old limits cannot keep serving queries as if
    /// the new limits applied, so the tree is dropped immediately and the
    /// index reads as empty until the next [`SpatialIndex::build`].
    pub fn set_config(&mut self, config: SpatialIndexConfig) -> Result<(), SpatialError> {
        config.validate()?;
        self.raycaster = RaycastingSystem::new(&config);
        self.config = config;
        if self.backend.is_some() {
            debug!("configuration change invalidated the built tree");
            self.backend = None;
            self.statistics = IndexStatistics::default();
        }
        self.stale = true;
        Ok(())
    }

    /// Whether the configuration changed since the last build
    pub fn is_stale(&self) -> bool {
        self.stale
    }
}

impl Default for SpatialIndex {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Classify an entity set as uniformly 2D or uniformly 3D
///
/// Returns `None` for empty input and an error as soon as one entity's
/// dimensionality disagrees with the first.
fn detect_dimensionality(
    entities: &[PositionedEntity],
) -> Result<Option<Dimensionality>, SpatialError> {
    let mut iter = entities.iter();
    let Some(first) = iter.next() else {
        return Ok(None);
    };
    let spatial = first.is_3d();
    for entity in iter {
        if entity.is_3d() != spatial {
            return Err(SpatialError::MixedDimensionality { entity: entity.id });
        }
    }
    Ok(Some(if spatial {
        Dimensionality::Spatial
    } else {
        Dimensionality::Planar
    }))
}

fn unix_timestamp_ms() -> Option<u64> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .ok()
        .and_then(|elapsed| u64::try_from(elapsed.as_millis()).ok())
}
