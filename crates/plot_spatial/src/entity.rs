//! Positioned entity types consumed by the spatial index
//!
//! Entities are produced and owned by the upstream layout pass; the index
//! only reads them and stores copies for the lifetime of one tree.

use crate::foundation::math::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// Opaque entity identifier
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct EntityId(u64);

impl EntityId {
    /// Create an entity identifier from a raw value
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw identifier value
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl From<u64> for EntityId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An entity with layout-assigned coordinates
///
/// The optional `z` coordinate decides which tree backend indexes the
/// entity: entirely-2D input builds a quadtree, entirely-3D input builds
/// an octree. Mixed input is rejected by the facade.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionedEntity {
    /// Identifier assigned by the upstream layout collaborator
    pub id: EntityId,
    /// X coordinate in layout space
    pub x: f64,
    /// Y coordinate in layout space
    pub y: f64,
    /// Z coordinate, present only for 3D layouts
    pub z: Option<f64>,
}

impl PositionedEntity {
    /// Create a 2D entity
    pub const fn new_2d(id: EntityId, x: f64, y: f64) -> Self {
        Self { id, x, y, z: None }
    }

    /// Create a 3D entity
    pub const fn new_3d(id: EntityId, x: f64, y: f64, z: f64) -> Self {
        Self {
            id,
            x,
            y,
            z: Some(z),
        }
    }

    /// Whether this entity carries a third coordinate
    pub const fn is_3d(&self) -> bool {
        self.z.is_some()
    }

    /// Position projected onto the XY plane
    pub fn position_2d(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    /// Full 3D position, with a missing `z` read as 0
    pub fn position_3d(&self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z.unwrap_or(0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_dimensionality() {
        let flat = PositionedEntity::new_2d(EntityId::new(1), 1.0, 2.0);
        assert!(!flat.is_3d());
        assert_eq!(flat.position_2d(), Vec2::new(1.0, 2.0));
        assert_eq!(flat.position_3d(), Vec3::new(1.0, 2.0, 0.0));

        let deep = PositionedEntity::new_3d(EntityId::new(2), 1.0, 2.0, 3.0);
        assert!(deep.is_3d());
        assert_eq!(deep.position_3d(), Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_entity_id_roundtrip() {
        let id = EntityId::new(42);
        assert_eq!(id.raw(), 42);
        assert_eq!(EntityId::from(42_u64), id);
        assert_eq!(id.to_string(), "#42");
    }
}
