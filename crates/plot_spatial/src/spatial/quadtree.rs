//! Quadtree spatial partitioning structure
//!
//! Divides 2D layout space into hierarchical quadrants for fast point and
//! region queries. Nodes live in a flat arena and reference their children
//! by index; a node subdivides when its entity count exceeds the configured
//! leaf capacity, until the depth limit is reached.

use crate::config::SpatialIndexConfig;
use crate::entity::{EntityId, PositionedEntity};
use crate::foundation::math::Vec2;
use crate::geometry::{Circle, Rect};
use crate::spatial::{NodeId, SpatialError, TreeSnapshot, TreeStats};
use log::{debug, warn};

/// Arena index of the root node
const ROOT: NodeId = 0;

/// Exactness floor for zero-radius point queries
///
/// Coordinates within this distance compare as equal, so `query_point` with
/// radius 0 returns exactly the coincident entities.
pub(crate) const POINT_MATCH_EPSILON: f64 = 1.0e-9;

/// Child state of a tree node
///
/// Exhaustively matched during traversal; children are always a full block
/// of four quadrants, never partially populated.
#[derive(Debug, Clone, Copy)]
pub(crate) enum QuadNodeKind {
    /// No children; entities accumulate locally
    Leaf,
    /// Subdivided into four quadrants
    Internal {
        /// Arena indices of the SW, SE, NW, NE children
        children: [NodeId; 4],
    },
}

/// Single node in the quadtree arena
#[derive(Debug, Clone)]
pub(crate) struct QuadNode {
    /// Layout-space bounds of this node
    pub(crate) bounds: Rect,
    /// Depth from the root (0 = root)
    pub(crate) level: u32,
    /// Entities stored locally
    ///
    /// Bounded by the leaf capacity except at the depth limit, where
    /// entities accumulate without subdividing.
    pub(crate) entities: Vec<PositionedEntity>,
    /// Leaf or internal state
    pub(crate) kind: QuadNodeKind,
}

impl QuadNode {
    fn leaf(bounds: Rect, level: u32) -> Self {
        Self {
            bounds,
            level,
            entities: Vec::new(),
            kind: QuadNodeKind::Leaf,
        }
    }

    /// Child indices; empty for leaves
    pub(crate) fn children(&self) -> &[NodeId] {
        match &self.kind {
            QuadNodeKind::Leaf => &[],
            QuadNodeKind::Internal { children } => children,
        }
    }
}

/// Quadtree over 2D positioned entities
///
/// Built once per layout pass and immutable afterwards; a new layout pass
/// replaces the tree wholesale via a fresh [`QuadTree::build`].
#[derive(Debug, Clone)]
pub struct QuadTree {
    nodes: Vec<QuadNode>,
    config: SpatialIndexConfig,
    entity_count: usize,
}

impl QuadTree {
    /// Build a quadtree over the given entities
    ///
    /// Computes a padded bounding rectangle over all entity positions and
    /// inserts each entity sequentially. Empty input produces an empty tree.
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
            Rect::padded_over(entities.iter().map(PositionedEntity::position_2d))
        else {
            return Ok(tree);
        };

        tree.nodes.push(QuadNode::leaf(bounds, 0));
        for entity in entities {
            tree.insert(ROOT, *entity)?;
        }
        tree.entity_count = entities.len();

        debug!(
            "quadtree built: {} entities in {} nodes, max depth {}",
            tree.entity_count,
            tree.nodes.len(),
            tree.stats().max_depth
        );
        Ok(tree)
    }

    /// Insert an entity at or below the given node
    fn insert(&mut self, node: NodeId, entity: PositionedEntity) -> Result<(), SpatialError> {
        let point = entity.position_2d();
        if !self.nodes[node].bounds.contains_point(point) {
            return Err(SpatialError::BoundsViolation {
                entity: entity.id,
                x: entity.x,
                y: entity.y,
            });
        }

        match self.nodes[node].kind {
            QuadNodeKind::Leaf => {
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
            QuadNodeKind::Internal { .. } => self.insert_into_children(node, entity),
        }
    }

    fn insert_into_children(
        &mut self,
        node: NodeId,
        entity: PositionedEntity,
    ) -> Result<(), SpatialError> {
        let QuadNodeKind::Internal { children } = self.nodes[node].kind else {
            self.nodes[node].entities.push(entity);
            return Ok(());
        };

        let point = entity.position_2d();
        for child in children {
            if self.nodes[child].bounds.contains_point(point) {
                return self.insert(child, entity);
            }
        }

        // Quadrants tile the parent exactly, so a contained point always fits
        // a child; keep the entity locally rather than lose it.
        warn!(
            "entity {} fits no quadrant of node at level {}, keeping locally",
            entity.id, self.nodes[node].level
        );
        self.nodes[node].entities.push(entity);
        Ok(())
    }

    /// Subdivide a leaf into four quadrants and redistribute its entities
    fn subdivide(&mut self, node: NodeId) {
        let bounds = self.nodes[node].bounds;
        let level = self.nodes[node].level;

        let first = self.nodes.len();
        for quadrant in bounds.quadrants() {
            self.nodes.push(QuadNode::leaf(quadrant, level + 1));
        }
        let children = [first, first + 1, first + 2, first + 3];
        self.nodes[node].kind = QuadNodeKind::Internal { children };

        // Entities that fit no child stay on this node.
        let existing = std::mem::take(&mut self.nodes[node].entities);
        let mut kept = Vec::new();
        for entity in existing {
            let point = entity.position_2d();
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

    /// Query all entities inside a rectangle (boundary-inclusive)
    pub fn query_rect(&self, rect: &Rect) -> Vec<PositionedEntity> {
        let mut results = Vec::new();
        if !self.nodes.is_empty() {
            self.collect_rect(ROOT, rect, &mut results);
        }
        results
    }

    fn collect_rect(&self, node: NodeId, rect: &Rect, results: &mut Vec<PositionedEntity>) {
        let n = &self.nodes[node];
        if !n.bounds.intersects(rect) {
            return;
        }
        for entity in &n.entities {
            if rect.contains_point(entity.position_2d()) {
                results.push(*entity);
            }
        }
        if let QuadNodeKind::Internal { children } = n.kind {
            for child in children {
                self.collect_rect(child, rect, results);
            }
        }
    }

    /// Query all entities inside a circle (boundary-inclusive)
    pub fn query_circle(&self, circle: &Circle) -> Vec<PositionedEntity> {
        let mut results = Vec::new();
        if !self.nodes.is_empty() {
            self.collect_circle(ROOT, circle, &mut results);
        }
        results
    }

    fn collect_circle(&self, node: NodeId, circle: &Circle, results: &mut Vec<PositionedEntity>) {
        let n = &self.nodes[node];
        if !n.bounds.intersects_circle(circle) {
            return;
        }
        for entity in &n.entities {
            if circle.contains_point(entity.position_2d()) {
                results.push(*entity);
            }
        }
        if let QuadNodeKind::Internal { children } = n.kind {
            for child in children {
                self.collect_circle(child, circle, results);
            }
        }
    }

    /// Query entities within a radius of a point
    ///
    /// A zero radius matches entities whose coordinates equal the point
    /// within floating tolerance.
    pub fn query_point(&self, point: Vec2, radius: f64) -> Vec<PositionedEntity> {
        self.query_circle(&Circle::new(point, radius.max(POINT_MATCH_EPSILON)))
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
        self.query_circle(&Circle::new(entity.position_2d(), radius))
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
            if matches!(node.kind, QuadNodeKind::Leaf) {
                stats.leaf_count += 1;
            }
            stats.max_depth = stats.max_depth.max(node.level);
            stats.entity_count += node.entities.len();
            depth_sum += node.entities.len() as u64 * u64::from(node.level);
        }
        if stats.entity_count > 0 {
            stats.average_depth = depth_sum as f64 / stats.entity_count as f64;
        }
        stats.memory_usage_bytes = self.nodes.len() * std::mem::size_of::<QuadNode>()
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
    pub fn bounds(&self) -> Option<Rect> {
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
            min: vec![n.bounds.min.x, n.bounds.min.y],
            max: vec![n.bounds.max.x, n.bounds.max.y],
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

    pub(crate) fn node(&self, id: NodeId) -> &QuadNode {
        &self.nodes[id]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entities_2d(points: &[(f64, f64)]) -> Vec<PositionedEntity> {
        points
            .iter()
            .enumerate()
            .map(|(i, &(x, y))| PositionedEntity::new_2d(EntityId::new(i as u64), x, y))
            .collect()
    }

    fn scenario_entities() -> Vec<PositionedEntity> {
        entities_2d(&[
            (10.0, 10.0),
            (20.0, 20.0),
            (80.0, 80.0),
            (90.0, 10.0),
            (10.0, 90.0),
            (50.0, 50.0),
            (30.0, 70.0),
            (70.0, 30.0),
        ])
    }

    fn scenario_config() -> SpatialIndexConfig {
        SpatialIndexConfig {
            max_depth: 6,
            max_entities_per_leaf: 4,
            ..SpatialIndexConfig::default()
        }
    }

    #[test]
    fn test_build_conserves_entities() {
        let entities = scenario_entities();
        let tree = QuadTree::build(&entities, &scenario_config()).expect("build");

        // Entities reachable from the root equal the build input.
        assert_eq!(tree.stats().entity_count, entities.len());
        assert_eq!(tree.entity_count(), entities.len());
    }

    #[test]
    fn test_build_subdivides_past_capacity() {
        let entities = scenario_entities();
        let tree = QuadTree::build(&entities, &scenario_config()).expect("build");

        assert!(tree.stats().node_count > 1);
        assert!(matches!(
            tree.node(ROOT).kind,
            QuadNodeKind::Internal { .. }
        ));
    }

    #[test]
    fn test_depth_limit_overrides_capacity() {
        // Coincident points can never be separated by subdivision; they must
        // pile up at the depth limit instead of recursing forever.
        let entities = entities_2d(&[(5.0, 5.0); 20]);
        let config = SpatialIndexConfig {
            max_depth: 3,
            max_entities_per_leaf: 2,
            ..SpatialIndexConfig::default()
        };
        let tree = QuadTree::build(&entities, &config).expect("build");

        let stats = tree.stats();
        assert_eq!(stats.entity_count, 20);
        assert!(stats.max_depth <= 3);
    }

    #[test]
    fn test_region_query_scenario() {
        let entities = scenario_entities();
        let tree = QuadTree::build(&entities, &scenario_config()).expect("build");

        let region = Rect::new(Vec2::new(0.0, 0.0), Vec2::new(50.0, 50.0));
        let results = tree.query_rect(&region);
        let ids: Vec<u64> = results.iter().map(|e| e.id.raw()).collect();

        // (10,10), (20,20) and the boundary point (50,50).
        assert!(ids.contains(&0));
        assert!(ids.contains(&1));
        assert!(ids.contains(&5));
        assert_eq!(results.len(), 3);
    }

    #[test]
    fn test_full_coverage_query_returns_everything() {
        let entities = scenario_entities();
        let tree = QuadTree::build(&entities, &scenario_config()).expect("build");

        let root = tree.bounds().expect("non-empty tree");
        assert_eq!(tree.query_rect(&root).len(), entities.len());
    }

    #[test]
    fn test_point_query_exactness() {
        let entities = scenario_entities();
        let tree = QuadTree::build(&entities, &scenario_config()).expect("build");

        let exact = tree.query_point(Vec2::new(50.0, 50.0), 0.0);
        assert_eq!(exact.len(), 1);
        assert_eq!(exact[0].id, EntityId::new(5));

        let near_miss = tree.query_point(Vec2::new(50.5, 50.0), 0.0);
        assert!(near_miss.is_empty());
    }

    #[test]
    fn test_circle_query_is_boundary_inclusive() {
        let entities = entities_2d(&[(0.0, 0.0), (10.0, 0.0), (11.0, 0.0)]);
        let tree = QuadTree::build(&entities, &SpatialIndexConfig::default()).expect("build");

        let results = tree.query_circle(&Circle::new(Vec2::zeros(), 10.0));
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn test_find_entity_and_query_nearby() {
        let entities = scenario_entities();
        let tree = QuadTree::build(&entities, &scenario_config()).expect("build");

        let found = tree.find_entity(EntityId::new(1)).expect("indexed entity");
        assert_eq!(found.position_2d(), Vec2::new(20.0, 20.0));
        assert!(tree.find_entity(EntityId::new(999)).is_none());

        let nearby = tree.query_nearby(EntityId::new(0), 20.0);
        assert_eq!(nearby.len(), 1);
        assert_eq!(nearby[0].id, EntityId::new(1));
    }

    #[test]
    fn test_empty_build() {
        let tree = QuadTree::build(&[], &SpatialIndexConfig::default()).expect("build");
        assert!(tree.is_empty());
        assert!(tree.bounds().is_none());
        assert!(tree.to_data().is_none());
        assert!(tree
            .query_rect(&Rect::new(Vec2::zeros(), Vec2::new(100.0, 100.0)))
            .is_empty());
    }

    #[test]
    fn test_rebuild_is_deterministic() {
        let entities = scenario_entities();
        let config = scenario_config();
        let a = QuadTree::build(&entities, &config).expect("build");
        let b = QuadTree::build(&entities, &config).expect("build");

        assert_eq!(a.stats(), b.stats());
        assert_eq!(a.to_data(), b.to_data());
    }

    #[test]
    fn test_snapshot_mirrors_tree() {
        let entities = scenario_entities();
        let tree = QuadTree::build(&entities, &scenario_config()).expect("build");

        let snapshot = tree.to_data().expect("non-empty tree");
        assert_eq!(snapshot.level, 0);
        assert_eq!(snapshot.min.len(), 2);
        assert_eq!(snapshot.children.len(), 4);

        fn count(snapshot: &TreeSnapshot) -> usize {
            snapshot.entities.len()
                + snapshot.children.iter().map(count).sum::<usize>()
        }
        assert_eq!(count(&snapshot), entities.len());
    }

    #[test]
    fn test_clear_discards_tree() {
        let mut tree =
            QuadTree::build(&scenario_entities(), &scenario_config()).expect("build");
        tree.clear();
        assert!(tree.is_empty());
        assert_eq!(tree.stats().node_count, 0);
    }
}
