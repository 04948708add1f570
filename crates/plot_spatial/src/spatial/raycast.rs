//! Ray casting against the spatial trees
//!
//! Broad phase prunes subtrees whose bounds the ray misses (slab method,
//! bounds expanded by the hit tolerance); the narrow phase measures each
//! candidate entity's perpendicular distance to the ray. Results are sorted
//! ascending by distance along the ray.

use crate::config::SpatialIndexConfig;
use crate::entity::{EntityId, PositionedEntity};
use crate::foundation::math::{distance_2d, distance_3d, Vec3};
use crate::geometry::{Ray, Ray2};
use crate::spatial::{NodeId, OctTree, QuadTree};
use log::trace;
use serde::{Deserialize, Serialize};

/// A ray in either 2D or 3D form
///
/// Either form can be cast against either tree backend; the caster lifts or
/// projects the ray to match the tree's dimensionality.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum QueryRay {
    /// 2D ray, cast directly against a quadtree or lifted to an octree's
    /// mid-depth plane
    Planar(Ray2),
    /// 3D ray, cast directly against an octree or projected onto a
    /// quadtree's XY plane
    Spatial(Ray),
}

impl From<Ray2> for QueryRay {
    fn from(ray: Ray2) -> Self {
        Self::Planar(ray)
    }
}

impl From<Ray> for QueryRay {
    fn from(ray: Ray) -> Self {
        Self::Spatial(ray)
    }
}

/// Result of a ray intersection test against an entity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RayIntersection {
    /// The entity that was hit
    pub entity: EntityId,
    /// Distance along the ray to the closest point, always >= 0
    pub distance: f64,
    /// Closest point on the ray to the entity (z = 0 for 2D casts)
    pub point: Vec3,
    /// Whether the hit falls within the tighter point-query tolerance
    pub direct_hit: bool,
}

/// Ray/entity intersection queries over either tree backend
#[derive(Debug, Clone)]
pub struct RaycastingSystem {
    /// Perpendicular distance within which an entity counts as hit
    ray_tolerance: f64,
    /// Tighter distance classifying a hit as direct
    point_tolerance: f64,
}

impl RaycastingSystem {
    /// Create a raycasting system from the index configuration
    pub fn new(config: &SpatialIndexConfig) -> Self {
        Self {
            ray_tolerance: config.ray_intersection_tolerance,
            point_tolerance: config.point_query_tolerance,
        }
    }

    /// Cast a ray against a quadtree
    ///
    /// A 3D ray is projected onto the XY plane (discarding z) and
    /// re-normalized before traversal.
    pub fn cast_quadtree(
        &self,
        tree: &QuadTree,
        ray: impl Into<QueryRay>,
    ) -> Vec<RayIntersection> {
        let ray = match ray.into() {
            QueryRay::Planar(ray) => ray,
            QueryRay::Spatial(ray) => Ray2::new(ray.origin.xy(), ray.direction.xy()),
        };
        if ray.is_degenerate() {
            return Vec::new();
        }
        let Some(root) = tree.root() else {
            return Vec::new();
        };

        let mut hits = Vec::new();
        self.walk_quad(tree, root, &ray, &mut hits);
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        trace!("quadtree raycast: {} hits", hits.len());
        hits
    }

    fn walk_quad(
        &self,
        tree: &QuadTree,
        node: NodeId,
        ray: &Ray2,
        hits: &mut Vec<RayIntersection>,
    ) {
        let n = tree.node(node);
        // Expand by the hit tolerance so entities near a node edge are not
        // pruned along with the node.
        if n.bounds.expanded(self.ray_tolerance).intersect_ray(ray).is_none() {
            return;
        }
        for entity in &n.entities {
            if let Some(hit) = self.test_entity_2d(entity, ray) {
                hits.push(hit);
            }
        }
        for &child in n.children() {
            self.walk_quad(tree, child, ray, hits);
        }
    }

    /// Perpendicular-distance hit test in 2D
    fn test_entity_2d(&self, entity: &PositionedEntity, ray: &Ray2) -> Option<RayIntersection> {
        let position = entity.position_2d();
        let t = (position - ray.origin).dot(&ray.direction);
        if t < 0.0 {
            // Behind the origin.
            return None;
        }
        let closest = ray.point_at(t);
        let offset = distance_2d(position, closest);
        if offset > self.ray_tolerance {
            return None;
        }
        Some(RayIntersection {
            entity: entity.id,
            distance: t,
            point: Vec3::new(closest.x, closest.y, 0.0),
            direct_hit: offset <= self.point_tolerance,
        })
    }

    /// Cast a ray against an octree
    ///
    /// A 2D ray is lifted to 3D on the tree root's mid-depth plane (z = 0
    /// for an empty tree) and re-normalized before traversal.
    pub fn cast_octree(&self, tree: &OctTree, ray: impl Into<QueryRay>) -> Vec<RayIntersection> {
        let ray = match ray.into() {
            QueryRay::Spatial(ray) => ray,
            QueryRay::Planar(ray) => {
                let plane = tree.bounds().map_or(0.0, |bounds| bounds.mid_depth());
                Ray::new(
                    Vec3::new(ray.origin.x, ray.origin.y, plane),
                    Vec3::new(ray.direction.x, ray.direction.y, 0.0),
                )
            }
        };
        if ray.is_degenerate() {
            return Vec::new();
        }
        let Some(root) = tree.root() else {
            return Vec::new();
        };

        let mut hits = Vec::new();
        self.walk_oct(tree, root, &ray, &mut hits);
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        trace!("octree raycast: {} hits", hits.len());
        hits
    }

    fn walk_oct(&self, tree: &OctTree, node: NodeId, ray: &Ray, hits: &mut Vec<RayIntersection>) {
        let n = tree.node(node);
        if n.bounds.expanded(self.ray_tolerance).intersect_ray(ray).is_none() {
            return;
        }
        for entity in &n.entities {
            if let Some(hit) = self.test_entity_3d(entity, ray) {
                hits.push(hit);
            }
        }
        for &child in n.children() {
            self.walk_oct(tree, child, ray, hits);
        }
    }

    /// Perpendicular-distance hit test in 3D
    fn test_entity_3d(&self, entity: &PositionedEntity, ray: &Ray) -> Option<RayIntersection> {
        let position = entity.position_3d();
        let t = (position - ray.origin).dot(&ray.direction);
        if t < 0.0 {
            // Behind the origin.
            return None;
        }
        let closest = ray.point_at(t);
        let offset = distance_3d(position, closest);
        if offset > self.ray_tolerance {
            return None;
        }
        Some(RayIntersection {
            entity: entity.id,
            distance: t,
            point: closest,
            direct_hit: offset <= self.point_tolerance,
        })
    }
}

/// Pick the intersection closest to the ray origin
pub fn closest_intersection(hits: &[RayIntersection]) -> Option<&RayIntersection> {
    hits.iter()
        .min_by(|a, b| a.distance.total_cmp(&b.distance))
}

/// Keep intersections whose distance falls inside `[min, max]`
pub fn filter_by_distance(hits: &[RayIntersection], min: f64, max: f64) -> Vec<RayIntersection> {
    hits.iter()
        .filter(|hit| hit.distance >= min && hit.distance <= max)
        .copied()
        .collect()
}
