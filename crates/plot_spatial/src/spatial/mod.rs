//! Spatial partitioning trees, ray casting, and the index facade
//!
//! A tree is built once per layout pass from positioned entities and then
//! serves read-only point, region, and ray queries. [`SpatialIndex`] picks
//! the quadtree or octree backend from the input's dimensionality.

pub mod index;
pub mod octree;
pub mod quadtree;
pub mod raycast;

pub use index::{Dimensionality, IndexStatistics, QueryPoint, Region, SpatialIndex};
pub use octree::OctTree;
pub use quadtree::QuadTree;
pub use raycast::{
    closest_intersection, filter_by_distance, QueryRay, RayIntersection, RaycastingSystem,
};

use crate::config::ConfigError;
use crate::entity::{EntityId, PositionedEntity};
use serde::{Deserialize, Serialize};

/// Index of a node within a tree's arena
///
/// Trees store nodes in a flat vector; children are referenced by index
/// rather than owned pointers, which keeps snapshots cycle-free.
pub(crate) type NodeId = usize;

/// Errors from index construction and entity ingestion
#[derive(Debug, thiserror::Error)]
pub enum SpatialError {
    /// Invalid configuration
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Input mixes entities with and without a z coordinate
    ///
    /// The backend is selected from the dimensionality of the whole input;
    /// a mixed array has no well-defined backend and is rejected rather
    /// than silently zero-filling the missing coordinates.
    #[error("mixed 2D/3D input: entity {entity} disagrees with the first entity's dimensionality")]
    MixedDimensionality {
        /// First entity whose dimensionality disagrees with the input's
        entity: EntityId,
    },

    /// Entity position lies outside the tree's root bounds
    ///
    /// Root bounds are derived from the same entity set, so this indicates
    /// a programmer error upstream; it is surfaced instead of silently
    /// dropping the entity.
    #[error("entity {entity} at ({x}, {y}) lies outside the tree bounds")]
    BoundsViolation {
        /// The rejected entity
        entity: EntityId,
        /// Its x coordinate
        x: f64,
        /// Its y coordinate
        y: f64,
    },
}

/// Aggregate statistics for a built tree
///
/// Diagnostics for capacity planning, not correctness: the memory figure is
/// a heuristic from node and entity struct sizes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct TreeStats {
    /// Entities stored across all nodes
    pub entity_count: usize,
    /// Total nodes in the arena
    pub node_count: usize,
    /// Nodes without children
    pub leaf_count: usize,
    /// Deepest node level reached
    pub max_depth: u32,
    /// Mean level of stored entities
    pub average_depth: f64,
    /// Heuristic memory estimate in bytes
    pub memory_usage_bytes: usize,
}

/// Plain nested snapshot of a built tree
///
/// Mirrors the tree for logging and snapshot testing; bounds corners carry
/// two components for quadtrees and three for octrees. Not a stable wire
/// format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeSnapshot {
    /// Depth of this node from the root
    pub level: u32,
    /// Minimum corner of the node bounds
    pub min: Vec<f64>,
    /// Maximum corner of the node bounds
    pub max: Vec<f64>,
    /// Entities stored locally on this node
    pub entities: Vec<PositionedEntity>,
    /// Child snapshots; empty for leaves
    pub children: Vec<TreeSnapshot>,
}
