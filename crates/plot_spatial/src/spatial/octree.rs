//! Octree spatial partitioning structure
//!
//! The 3D sibling of the quadtree: identical build and query algorithms with
//! 8-way subdivision and volumetric bounds. Adds a cylinder query for
//! "2D-style" selection in a 3D scene.

use crate::config::SpatialIndexConfig;
use crate::entity::{EntityId, PositionedEntity};
use crate::foundation::math::{radial_distance_xy, Vec2, Vec3};
use crate::geometry::{Aabb, Sphere};
use crate::spatial::quadtree::POINT_MATCH_EPSILON;
use crate::spatial::{NodeId, SpatialError, TreeSnapshot, TreeStats};
use log::{debug, warn};

/// Arena index of the root node
const ROOT: NodeId = 0;

/// Child state of a tree node
#[derive(Debug, Clone, Copy)]
pub(crate) enum OctNodeKind {
    /// No children; entities accumulate locally
    Leaf,
    /// Subdivided into eight octants
    Internal {
        /// Arena indices of the octant children, ordered by the
        /// x/y/z bit layout of [`Aabb::octants`]
        children: [NodeId; 8],
    },
}

/// Single node in the octree arena
#[derive(Debug, Clone)]
pub(crate) struct OctNode {
    /// Layout-space bounds of this node
    pub(crate) bounds: Aabb,
    /// Depth from the root (0 = root)
    pub(crate) level: u32,
    /// Entities stored locally
    pub(crate) entities: Vec<PositionedEntity>,
    /// Leaf or internal state
    pub(crate) kind: OctNodeKind,
}

impl OctNode {
    fn leaf(bounds: Aabb, level: u32) -> Self {
        Self {
            bounds,
            level,
            entities: Vec::new(),
            kind: OctNodeKind::Leaf,
        }
    }

    /// Child indices; empty for leaves
    pub(crate) fn children(&self) -> &[NodeId] {
        match &self.kind {
            OctNodeKind::Leaf => &[],
            OctNodeKind::Internal { children } => children,
        }
    }
}

/// Octree over 3D positioned entities
///
/// Built once per layout pass and immutable afterwards, like
/// [`QuadTree`](crate::spatial::QuadTree).
#[derive(Debug, Clone)]
pub struct OctTree {
    nodes: Vec<OctNode>,
    config: SpatialIndexConfig,
    entity_count: usize,
}

impl OctTree {
    /// Build an octree over the given entities
    ///
    /// Computes a padded bounding box over all entity positions and inserts
    /// each entity sequentially. Empty input produces an empty tree.
    pub fn build(
        entities: &[PositionedEntity],
        config: &SpatialIndexConfig,
    ) -> Result<Self, SpatialError> {
        let mut tree = Self {
            nodes: Vec::new(),
            config: config.clone(),
            entity_count: 0,
        };

        let Some(bounds) =
            Aabb::padded_over(entities.iter().map(PositionedEntity::position_3d))
        else {
            return Ok(tree);
        };

        tree.nodes.push(OctNode::leaf(bounds, 0));
        for entity in entities {
            tree.insert(ROOT, *entity)?;
        }
        tree.entity_count = entities.len();

        debug!(
            "octree built: {} entities in {} nodes, max depth {}",
            tree.entity_count,
            tree.nodes.len(),
            tree.stats().max_depth
        );
        Ok(tree)
    }

    /// Insert an entity at or below the given node
    fn insert(&mut self, node: NodeId, entity: PositionedEntity) -> Result<(), SpatialError> {
        let point = entity.position_3d();
        if !self.nodes[node].bounds.contains_point(point) {
            return Err(SpatialError::BoundsViolation {
                entity: entity.id,
                x: entity.x,
                y: entity.y,
            });
        }

        match self.nodes[node].kind {
            OctNodeKind::Leaf => {
                let has_room =
                    self.nodes[node].entities.len() < self.config.max_entities_per_leaf;
                let at_depth_limit = self.nodes[node].level >= self.config.max_depth;
                if has_room || at_depth_limit {
                    // The depth limit overrides the capacity limit.
                    self.nodes[node].entities.push(entity);
                    Ok(())
                } else {
                    self.subdivide(node);
                    self.insert_into_children(node, entity)
                }
            }
            OctNodeKind::Internal { .. } => self.insert_into_children(node, entity),
        }
    }

    fn insert_into_children(
        &mut self,
        node: NodeId,
        entity: PositionedEntity,
    ) -> Result<(), SpatialError> {
        let OctNodeKind::Internal { children } = self.nodes[node].kind else {
            self.nodes[node].entities.push(entity);
            return Ok(());
        };

        let point = entity.position_3d();
        for child in children {
            if self.nodes[child].bounds.contains_point(point) {
                return self.insert(child, entity);
            }
        }

        // Octants tile the parent exactly, so a contained point always fits
        // a child; keep the entity locally rather than lose it.
        warn!(
            "entity {} fits no octant of node at level {}, keeping locally",
            entity.id, self.nodes[node].level
        );
        self.nodes[node].entities.push(entity);
        Ok(())
    }

    /// Subdivide a leaf into eight octants and redistribute its entities
    fn subdivide(&mut self, node: NodeId) {
        let bounds = self.nodes[node].bounds;
        let level = self.nodes[node].level;

        let first = self.nodes.len();
        for octant in bounds.octants() {
            self.nodes.push(OctNode::leaf(octant, level + 1));
        }
        let children = std::array::from_fn(|i| first + i);
        self.nodes[node].kind = OctNodeKind::Internal { children };

        // Entities that fit no child stay on this node.
        let existing = std::mem::take(&mut self.nodes[node].entities);
        let mut kept = Vec::new();
        for entity in existing {
            let point = entity.position_3d();
            let target = children
                .iter()
                .copied()
                .find(|&child| self.nodes[child].bounds.contains_point(point));
            match target {
                Some(child) => self.nodes[child].entities.push(entity),
                None => kept.push(entity),
            }
        }
        self.nodes[node].entities = kept;
    }

    /// Query all entities inside a box (boundary-inclusive)
    pub fn query_aabb(&self, aabb: &Aabb) -> Vec<PositionedEntity> {
        let mut results = Vec::new();
        if !self.nodes.is_empty() {
            self.collect_aabb(ROOT, aabb, &mut results);
        }
        results
    }

    fn collect_aabb(&self, node: NodeId, aabb: &Aabb, results: &mut Vec<PositionedEntity>) {
        let n = &self.nodes[node];
        if !n.bounds.intersects(aabb) {
            return;
        }
        for entity in &n.entities {
            if aabb.contains_point(entity.position_3d()) {
                results.push(*entity);
            }
        }
        if let OctNodeKind::Internal { children } = n.kind {
            for child in children {
                self.collect_aabb(child, aabb, results);
            }
        }
    }

    /// Query all entities inside a sphere (boundary-inclusive)
    ///
    /// Subtree pruning uses the closest-point-on-box distance to the sphere
    /// center.
    pub fn query_sphere(&self, sphere: &Sphere) -> Vec<PositionedEntity> {
        let mut results = Vec::new();
        if !self.nodes.is_empty() {
            self.collect_sphere(ROOT, sphere, &mut results);
        }
        results
    }

    fn collect_sphere(&self, node: NodeId, sphere: &Sphere, results: &mut Vec<PositionedEntity>) {
        let n = &self.nodes[node];
        if !n.bounds.intersects_sphere(sphere) {
            return;
        }
        for entity in &n.entities {
            if sphere.contains_point(entity.position_3d()) {
                results.push(*entity);
            }
        }
        if let OctNodeKind::Internal { children } = n.kind {
            for child in children {
                self.collect_sphere(child, sphere, results);
            }
        }
    }

    /// Query entities inside a z-spanning cylinder
    ///
    /// Box region query over the root's full depth, post-filtered on radial
    /// XY distance. Supports 2D-style selection in a 3D scene.
    pub fn query_cylinder(&self, center: Vec2, radius: f64) -> Vec<PositionedEntity> {
        let Some(bounds) = self.bounds() else {
            return Vec::new();
        };
        let slab = Aabb::new(
            Vec3::new(center.x - radius, center.y - radius, bounds.min.z),
            Vec3::new(center.x + radius, center.y + radius, bounds.max.z),
        );
        self.query_aabb(&slab)
            .into_iter()
            .filter(|entity| radial_distance_xy(entity.position_3d(), center) <= radius)
            .collect()
    }

    /// Query entities within a radius of a point
    ///
    /// A zero radius matches entities whose coordinates equal the point
    /// within floating tolerance.
    pub fn query_point(&self, point: Vec3, radius: f64) -> Vec<PositionedEntity> {
        self.query_sphere(&Sphere::new(point, radius.max(POINT_MATCH_EPSILON)))
    }

    /// Find an indexed entity by id
    pub fn find_entity(&self, id: EntityId) -> Option<PositionedEntity> {
        self.nodes
            .iter()
            .flat_map(|node| node.entities.iter())
            .find(|entity| entity.id == id)
            .copied()
    }

    /// Query entities within a radius of an already-indexed entity
    ///
    /// The probe entity itself is excluded from the result. Returns empty
    /// when the id is not indexed.
    pub fn query_nearby(&self, id: EntityId, radius: f64) -> Vec<PositionedEntity> {
        let Some(entity) = self.find_entity(id) else {
            return Vec::new();
        };
        self.query_sphere(&Sphere::new(entity.position_3d(), radius))
            .into_iter()
            .filter(|candidate| candidate.id != id)
            .collect()
    }

    /// Aggregate statistics over the built tree
    pub fn stats(&self) -> TreeStats {
        let mut stats = TreeStats {
            node_count: self.nodes.len(),
            ..TreeStats::default()
        };
        let mut depth_sum = 0_u64;
        for node in &self.nodes {
            if matches!(node.kind, OctNodeKind::Leaf) {
                stats.leaf_count += 1;
            }
            stats.max_depth = stats.max_depth.max(node.level);
            stats.entity_count += node.entities.len();
            depth_sum += node.entities.len() as u64 * u64::from(node.level);
        }
        if stats.entity_count > 0 {
            stats.average_depth = depth_sum as f64 / stats.entity_count as f64;
        }
        stats.memory_usage_bytes = self.nodes.len() * std::mem::size_of::<OctNode>()
            + stats.entity_count * std::mem::size_of::<PositionedEntity>();
        stats
    }

    /// Number of entities passed to `build`
    pub fn entity_count(&self) -> usize {
        self.entity_count
    }

    /// Whether the tree holds no entities
    pub fn is_empty(&self) -> bool {
        self.entity_count == 0
    }

    /// Root bounds of the built tree, if any
    pub fn bounds(&self) -> Option<Aabb> {
        self.nodes.first().map(|node| node.bounds)
    }

    /// Discard the tree entirely
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.entity_count = 0;
    }

    /// Plain nested snapshot of the tree, `None` when empty
    pub fn to_data(&self) -> Option<TreeSnapshot> {
        if self.nodes.is_empty() {
            None
        } else {
            Some(self.snapshot(ROOT))
        }
    }

    fn snapshot(&self, node: NodeId) -> TreeSnapshot {
        let n = &self.nodes[node];
        TreeSnapshot {
            level: n.level,
            min: vec![n.bounds.min.x, n.bounds.min.y, n.bounds.min.z],
            max: vec![n.bounds.max.x, n.bounds.max.y, n.bounds.max.z],
            entities: n.entities.clone(),
            children: n
                .children()
                .iter()
                .map(|&child| self.snapshot(child))
                .collect(),
        }
    }

    pub(crate) fn root(&self) -> Option<NodeId> {
        if self.nodes.is_empty() {
            None
        } else {
            Some(ROOT)
        }
    }

    pub(crate) fn node(&self, id: NodeId) -> &OctNode {
        &self.nodes[id]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entities_3d(points: &[(f64, f64, f64)]) -> Vec<PositionedEntity> {
        points
            .iter()
            .enumerate()
            .map(|(i, &(x, y, z))| PositionedEntity::new_3d(EntityId::new(i as u64), x, y, z))
            .collect()
    }

    fn corner_entities() -> Vec<PositionedEntity> {
        entities_3d(&[
            (10.0, 10.0, 10.0),
            (90.0, 10.0, 10.0),
            (10.0, 90.0, 10.0),
            (90.0, 90.0, 10.0),
            (10.0, 10.0, 90.0),
            (90.0, 10.0, 90.0),
            (10.0, 90.0, 90.0),
            (90.0, 90.0, 90.0),
            (50.0, 50.0, 50.0),
        ])
    }

    fn small_leaf_config() -> SpatialIndexConfig {
        SpatialIndexConfig {
            max_depth: 6,
            max_entities_per_leaf: 4,
            ..SpatialIndexConfig::default()
        }
    }

    #[test]
    fn test_build_conserves_entities() {
        let entities = corner_entities();
        let tree = OctTree::build(&entities, &small_leaf_config()).expect("build");

        assert_eq!(tree.stats().entity_count, entities.len());
        assert_eq!(tree.entity_count(), entities.len());
    }

    #[test]
    fn test_build_subdivides_past_capacity() {
        let tree = OctTree::build(&corner_entities(), &small_leaf_config()).expect("build");

        let stats = tree.stats();
        assert!(stats.node_count >= 9); // root + one full octant block
        assert!(matches!(
            tree.node(ROOT).kind,
            OctNodeKind::Internal { .. }
        ));
    }

    #[test]
    fn test_depth_limit_overrides_capacity() {
        let entities = entities_3d(&[(1.0, 2.0, 3.0); 30]);
        let config = SpatialIndexConfig {
            max_depth: 2,
            max_entities_per_leaf: 4,
            ..SpatialIndexConfig::default()
        };
        let tree = OctTree::build(&entities, &config).expect("build");

        let stats = tree.stats();
        assert_eq!(stats.entity_count, 30);
        assert!(stats.max_depth <= 2);
    }

    #[test]
    fn test_aabb_query() {
        let tree = OctTree::build(&corner_entities(), &small_leaf_config()).expect("build");

        let results = tree.query_aabb(&Aabb::new(
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(50.0, 50.0, 50.0),
        ));
        let ids: Vec<u64> = results.iter().map(|e| e.id.raw()).collect();

        // The near-bottom-left corner entity and the boundary center.
        assert!(ids.contains(&0));
        assert!(ids.contains(&8));
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn test_sphere_query() {
        let tree = OctTree::build(&corner_entities(), &small_leaf_config()).expect("build");

        let results = tree.query_sphere(&Sphere::new(Vec3::new(50.0, 50.0, 50.0), 10.0));
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, EntityId::new(8));

        // Radius reaching the corners picks up everything.
        let all = tree.query_sphere(&Sphere::new(Vec3::new(50.0, 50.0, 50.0), 100.0));
        assert_eq!(all.len(), 9);
    }

    #[test]
    fn test_cylinder_query_ignores_z() {
        let entities = entities_3d(&[
            (10.0, 10.0, 0.0),
            (10.0, 10.0, 500.0),
            (10.0, 10.0, -500.0),
            (40.0, 10.0, 0.0),
        ]);
        let tree = OctTree::build(&entities, &small_leaf_config()).expect("build");

        // All three stacked entities match regardless of depth.
        let results = tree.query_cylinder(Vec2::new(10.0, 10.0), 5.0);
        assert_eq!(results.len(), 3);

        let wide = tree.query_cylinder(Vec2::new(10.0, 10.0), 30.0);
        assert_eq!(wide.len(), 4);
    }

    #[test]
    fn test_point_query_exactness() {
        let tree = OctTree::build(&corner_entities(), &small_leaf_config()).expect("build");

        let exact = tree.query_point(Vec3::new(50.0, 50.0, 50.0), 0.0);
        assert_eq!(exact.len(), 1);
        assert_eq!(exact[0].id, EntityId::new(8));

        assert!(tree
            .query_point(Vec3::new(50.0, 50.0, 51.0), 0.0)
            .is_empty());
    }

    #[test]
    fn test_query_nearby_excludes_probe() {
        let entities = entities_3d(&[(0.0, 0.0, 0.0), (5.0, 0.0, 0.0), (50.0, 0.0, 0.0)]);
        let tree = OctTree::build(&entities, &SpatialIndexConfig::default()).expect("build");

        let nearby = tree.query_nearby(EntityId::new(0), 10.0);
        assert_eq!(nearby.len(), 1);
        assert_eq!(nearby[0].id, EntityId::new(1));
    }

    #[test]
    fn test_empty_build() {
        let tree = OctTree::build(&[], &SpatialIndexConfig::default()).expect("build");
        assert!(tree.is_empty());
        assert!(tree.to_data().is_none());
        assert!(tree
            .query_sphere(&Sphere::new(Vec3::zeros(), 100.0))
            .is_empty());
    }

    #[test]
    fn test_rebuild_is_deterministic() {
        let entities = corner_entities();
        let config = small_leaf_config();
        let a = OctTree::build(&entities, &config).expect("build");
        let b = OctTree::build(&entities, &config).expect("build");

        assert_eq!(a.stats(), b.stats());
        assert_eq!(a.to_data(), b.to_data());
    }

    #[test]
    fn test_snapshot_has_three_component_bounds() {
        let tree = OctTree::build(&corner_entities(), &small_leaf_config()).expect("build");
        let snapshot = tree.to_data().expect("non-empty tree");
        assert_eq!(snapshot.min.len(), 3);
        assert_eq!(snapshot.children.len(), 8);
    }
}
