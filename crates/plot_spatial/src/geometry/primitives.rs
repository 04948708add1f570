//! Primitive query shapes and ray types
//!
//! Provides the value types callers use to express queries: rays in 2D and
//! 3D form, circles and spheres for radius selection, and the viewport
//! helper for building pick rays from mouse coordinates.

use crate::foundation::math::{
    distance_squared_2d, distance_squared_3d, normalize_or_zero_2d, normalize_or_zero_3d, Vec2,
    Vec3,
};
use serde::{Deserialize, Serialize};

/// Distance in front of the scene at which screen-space pick rays originate
const SCREEN_RAY_DEPTH: f64 = 1000.0;

/// A 2D ray for casting against planar trees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ray2 {
    /// The origin point of the ray
    pub origin: Vec2,
    /// The direction of the ray, normalized on construction
    pub direction: Vec2,
}

impl Ray2 {
    /// Creates a new ray with the given origin and direction
    ///
    /// The direction is normalized; a zero direction is preserved as zero
    /// and produces no intersections downstream.
    pub fn new(origin: Vec2, direction: Vec2) -> Self {
        Self {
            origin,
            direction: normalize_or_zero_2d(direction),
        }
    }

    /// Creates a ray passing from `from` through `to`
    pub fn from_points(from: Vec2, to: Vec2) -> Self {
        Self::new(from, to - from)
    }

    /// Get a point along the ray at distance t
    pub fn point_at(&self, t: f64) -> Vec2 {
        self.origin + self.direction * t
    }

    /// Whether the ray has a usable direction
    pub fn is_degenerate(&self) -> bool {
        self.direction == Vec2::zeros()
    }
}

/// A 3D ray for casting and picking
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ray {
    /// The origin point of the ray in scene space
    pub origin: Vec3,
    /// The direction of the ray, normalized on construction
    pub direction: Vec3,
}

impl Ray {
    /// Creates a new ray with the given origin and direction
    ///
    /// The direction is normalized; a zero direction is preserved as zero
    /// and produces no intersections downstream.
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: normalize_or_zero_3d(direction),
        }
    }

    /// Creates a ray passing from `from` through `to`
    pub fn from_points(from: Vec3, to: Vec3) -> Self {
        Self::new(from, to - from)
    }

    /// Creates a pick ray from screen coordinates
    ///
    /// Screen coordinates are pixels with the origin at the top-left; the
    /// resulting ray originates in front of the scene at the cursor's
    /// viewport-center-relative position and points into the scene along -Z.
    pub fn from_screen(screen_x: f64, screen_y: f64, viewport: &Viewport) -> Self {
        let centered = viewport.to_centered(screen_x, screen_y);
        Self::new(
            Vec3::new(centered.x, centered.y, SCREEN_RAY_DEPTH),
            Vec3::new(0.0, 0.0, -1.0),
        )
    }

    /// Get a point along the ray at distance t
    pub fn point_at(&self, t: f64) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Whether the ray has a usable direction
    pub fn is_degenerate(&self) -> bool {
        self.direction == Vec3::zeros()
    }
}

/// Viewport dimensions for screen-space ray construction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Viewport width in pixels
    pub width: f64,
    /// Viewport height in pixels
    pub height: f64,
}

impl Viewport {
    /// Create a viewport with the given pixel dimensions
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Convert screen coordinates to viewport-center-relative coordinates
    ///
    /// Screen Y grows downward; the returned Y grows upward to match scene
    /// space.
    pub fn to_centered(&self, screen_x: f64, screen_y: f64) -> Vec2 {
        Vec2::new(
            screen_x - self.width * 0.5,
            self.height * 0.5 - screen_y,
        )
    }
}

/// A circle for 2D radius selection
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    /// The center of the circle
    pub center: Vec2,
    /// The radius of the circle
    pub radius: f64,
}

impl Circle {
    /// Creates a new circle with the given center and radius
    pub const fn new(center: Vec2, radius: f64) -> Self {
        Self { center, radius }
    }

    /// Check if a point lies inside the circle (boundary-inclusive)
    pub fn contains_point(&self, point: Vec2) -> bool {
        distance_squared_2d(self.center, point) <= self.radius * self.radius
    }
}

/// A sphere for 3D radius selection
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sphere {
    /// The center of the sphere
    pub center: Vec3,
    /// The radius of the sphere
    pub radius: f64,
}

impl Sphere {
    /// Creates a new sphere with the given center and radius
    pub const fn new(center: Vec3, radius: f64) -> Self {
        Self { center, radius }
    }

    /// Check if a point lies inside the sphere (boundary-inclusive)
    pub fn contains_point(&self, point: Vec3) -> bool {
        distance_squared_3d(self.center, point) <= self.radius * self.radius
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_ray_normalizes_direction() {
        let ray = Ray::new(Vec3::zeros(), Vec3::new(10.0, 0.0, 0.0));
        assert_relative_eq!(ray.direction.magnitude(), 1.0);

        let ray2 = Ray2::new(Vec2::zeros(), Vec2::new(0.0, -3.0));
        assert_relative_eq!(ray2.direction.y, -1.0);
    }

    #[test]
    fn test_degenerate_ray_keeps_zero_direction() {
        let ray = Ray::new(Vec3::new(1.0, 2.0, 3.0), Vec3::zeros());
        assert!(ray.is_degenerate());
        assert_eq!(ray.direction, Vec3::zeros());
    }

    #[test]
    fn test_ray_from_points() {
        let ray = Ray2::from_points(Vec2::new(1.0, 1.0), Vec2::new(4.0, 5.0));
        assert_relative_eq!(ray.direction.x, 0.6);
        assert_relative_eq!(ray.direction.y, 0.8);
        let p = ray.point_at(5.0);
        assert_relative_eq!(p.x, 4.0);
        assert_relative_eq!(p.y, 5.0);
    }

    #[test]
    fn test_screen_ray_is_viewport_centered() {
        let viewport = Viewport::new(1920.0, 1080.0);

        // Cursor at the viewport center maps to the scene origin.
        let ray = Ray::from_screen(960.0, 540.0, &viewport);
        assert_relative_eq!(ray.origin.x, 0.0);
        assert_relative_eq!(ray.origin.y, 0.0);
        assert_relative_eq!(ray.direction.z, -1.0);

        // Top-left corner: negative x, positive y (screen y flipped).
        let ray = Ray::from_screen(0.0, 0.0, &viewport);
        assert_relative_eq!(ray.origin.x, -960.0);
        assert_relative_eq!(ray.origin.y, 540.0);
    }

    #[test]
    fn test_circle_membership_is_boundary_inclusive() {
        let circle = Circle::new(Vec2::zeros(), 5.0);
        assert!(circle.contains_point(Vec2::new(5.0, 0.0)));
        assert!(circle.contains_point(Vec2::new(3.0, 4.0)));
        assert!(!circle.contains_point(Vec2::new(5.1, 0.0)));
    }

    #[test]
    fn test_sphere_membership() {
        let sphere = Sphere::new(Vec3::new(1.0, 1.0, 1.0), 2.0);
        assert!(sphere.contains_point(Vec3::new(1.0, 1.0, 3.0)));
        assert!(!sphere.contains_point(Vec3::new(1.0, 1.0, 3.1)));
    }
}
