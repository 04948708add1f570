//! Axis-aligned bounding volumes and slab-method ray intersection
//!
//! `Rect` and `Aabb` are the node bounds of the quad and oct trees. Both
//! store min/max corners; extents are always non-negative. Padded
//! construction over an entity set guarantees a non-degenerate root even for
//! collinear or coincident input.

use crate::geometry::primitives::{Circle, Ray, Ray2, Sphere};
use crate::foundation::math::{distance_squared_2d, distance_squared_3d, Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// Fraction of the largest extent added as padding on every side
const PADDING_RATIO: f64 = 0.1;

/// Fixed padding floor so coincident points still get a usable root volume
const PADDING_EPSILON: f64 = 1.0e-3;

/// Axis-aligned rectangle for 2D spatial queries
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Minimum corner of the rectangle
    pub min: Vec2,
    /// Maximum corner of the rectangle
    pub max: Vec2,
}

impl Rect {
    /// Create a new rectangle from min and max corners
    pub const fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Create a rectangle centered at a point with given half-extents
    pub fn from_center_extents(center: Vec2, extents: Vec2) -> Self {
        Self {
            min: center - extents,
            max: center + extents,
        }
    }

    /// Compute a padded rectangle covering all given points
    ///
    /// Padding is a tenth of the largest extent plus a fixed epsilon, so
    /// collinear or coincident points never produce a zero-area root.
    /// Returns `None` for an empty point set.
    pub fn padded_over<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = Vec2>,
    {
        let mut points = points.into_iter();
        let first = points.next()?;
        let mut min = first;
        let mut max = first;
        for p in points {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }

        let extent = (max.x - min.x).max(max.y - min.y);
        let padding = extent * PADDING_RATIO + PADDING_EPSILON;
        Some(Self {
            min: min - Vec2::new(padding, padding),
            max: max + Vec2::new(padding, padding),
        })
    }

    /// Get the center of the rectangle
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Get the extents (half-size) of the rectangle
    pub fn extents(&self) -> Vec2 {
        (self.max - self.min) * 0.5
    }

    /// Width of the rectangle
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    /// Height of the rectangle
    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    /// Check if this rectangle contains a point (boundary-inclusive)
    pub fn contains_point(&self, point: Vec2) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
    }

    /// Check if this rectangle intersects another rectangle
    pub fn intersects(&self, other: &Rect) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }

    /// Closest point inside this rectangle to the given point
    pub fn closest_point(&self, point: Vec2) -> Vec2 {
        Vec2::new(
            point.x.clamp(self.min.x, self.max.x),
            point.y.clamp(self.min.y, self.max.y),
        )
    }

    /// Check if this rectangle intersects a circle
    ///
    /// Closest-point distance test: the circle intersects iff its center is
    /// within `radius` of the nearest point on the rectangle.
    pub fn intersects_circle(&self, circle: &Circle) -> bool {
        let closest = self.closest_point(circle.center);
        distance_squared_2d(closest, circle.center) <= circle.radius * circle.radius
    }

    /// Grow the rectangle by a margin on every side
    pub fn expanded(&self, margin: f64) -> Rect {
        Self {
            min: self.min - Vec2::new(margin, margin),
            max: self.max + Vec2::new(margin, margin),
        }
    }

    /// Split into four equal quadrants
    ///
    /// Order: SW, SE, NW, NE (x bit 0, y bit 1), matching the octant layout
    /// of [`Aabb::octants`] restricted to the XY plane.
    pub fn quadrants(&self) -> [Rect; 4] {
        let center = self.center();
        [
            Rect::new(self.min, center),
            Rect::new(
                Vec2::new(center.x, self.min.y),
                Vec2::new(self.max.x, center.y),
            ),
            Rect::new(
                Vec2::new(self.min.x, center.y),
                Vec2::new(center.x, self.max.y),
            ),
            Rect::new(center, self.max),
        ]
    }

    /// Test ray intersection with this rectangle using the slab method
    ///
    /// Returns the distance to the entry point, or `None` on a miss. Zero
    /// direction components divide to infinity and resolve through IEEE
    /// interval arithmetic without special-casing.
    pub fn intersect_ray(&self, ray: &Ray2) -> Option<f64> {
        let inv_x = 1.0 / ray.direction.x;
        let inv_y = 1.0 / ray.direction.y;

        let tx1 = (self.min.x - ray.origin.x) * inv_x;
        let tx2 = (self.max.x - ray.origin.x) * inv_x;
        let ty1 = (self.min.y - ray.origin.y) * inv_y;
        let ty2 = (self.max.y - ray.origin.y) * inv_y;

        let t_min = tx1.min(tx2).max(ty1.min(ty2));
        let t_max = tx1.max(tx2).min(ty1.max(ty2));

        // Ray intersects if t_max >= t_min and the exit is not behind the origin
        if t_max >= t_min && t_max >= 0.0 {
            Some(t_min.max(0.0))
        } else {
            None
        }
    }
}

/// Axis-aligned bounding box for 3D spatial queries
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    /// Minimum corner of the bounding box
    pub min: Vec3,
    /// Maximum corner of the bounding box
    pub max: Vec3,
}

impl Aabb {
    /// Create a new box from min and max corners
    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Create a box centered at a point with given half-extents
    pub fn from_center_extents(center: Vec3, extents: Vec3) -> Self {
        Self {
            min: center - extents,
            max: center + extents,
        }
    }

    /// Compute a padded box covering all given points
    ///
    /// Same padding rule as [`Rect::padded_over`]. Returns `None` for an
    /// empty point set.
    pub fn padded_over<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = Vec3>,
    {
        let mut points = points.into_iter();
        let first = points.next()?;
        let mut min = first;
        let mut max = first;
        for p in points {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            min.z = min.z.min(p.z);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
            max.z = max.z.max(p.z);
        }

        let extent = (max.x - min.x).max(max.y - min.y).max(max.z - min.z);
        let padding = extent * PADDING_RATIO + PADDING_EPSILON;
        Some(Self {
            min: min - Vec3::new(padding, padding, padding),
            max: max + Vec3::new(padding, padding, padding),
        })
    }

    /// Get the center of the box
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Get the extents (half-size) of the box
    pub fn extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Z coordinate of the box center
    ///
    /// The plane onto which planar rays are lifted when cast into a 3D tree.
    pub fn mid_depth(&self) -> f64 {
        (self.min.z + self.max.z) * 0.5
    }

    /// Check if this box contains a point (boundary-inclusive)
    pub fn contains_point(&self, point: Vec3) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
            && point.z >= self.min.z
            && point.z <= self.max.z
    }

    /// Check if this box intersects another box
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }

    /// Closest point inside this box to the given point
    pub fn closest_point(&self, point: Vec3) -> Vec3 {
        Vec3::new(
            point.x.clamp(self.min.x, self.max.x),
            point.y.clamp(self.min.y, self.max.y),
            point.z.clamp(self.min.z, self.max.z),
        )
    }

    /// Check if this box intersects a sphere
    ///
    /// Closest-point distance test, as in the radius queries of the tree
    /// backends.
    pub fn intersects_sphere(&self, sphere: &Sphere) -> bool {
        let closest = self.closest_point(sphere.center);
        distance_squared_3d(closest, sphere.center) <= sphere.radius * sphere.radius
    }

    /// Grow the box by a margin on every side
    pub fn expanded(&self, margin: f64) -> Aabb {
        Self {
            min: self.min - Vec3::new(margin, margin, margin),
            max: self.max + Vec3::new(margin, margin, margin),
        }
    }

    /// Split into eight equal octants
    ///
    /// Octant layout (bit 0 = +x half, bit 1 = +y half, bit 2 = +z half):
    /// index 0 is the -x/-y/-z corner, index 7 the +x/+y/+z corner.
    pub fn octants(&self) -> [Aabb; 8] {
        let center = self.center();
        let quarter = self.extents() * 0.5;

        std::array::from_fn(|octant| {
            let x_sign = if octant & 1 != 0 { 1.0 } else { -1.0 };
            let y_sign = if octant & 2 != 0 { 1.0 } else { -1.0 };
            let z_sign = if octant & 4 != 0 { 1.0 } else { -1.0 };

            let child_center = Vec3::new(
                center.x + quarter.x * x_sign,
                center.y + quarter.y * y_sign,
                center.z + quarter.z * z_sign,
            );
            Aabb::from_center_extents(child_center, quarter)
        })
    }

    /// Test ray intersection with this box using the slab method
    ///
    /// Returns the distance to the entry point, or `None` on a miss. Zero
    /// direction components divide to infinity and resolve through IEEE
    /// interval arithmetic without special-casing.
    pub fn intersect_ray(&self, ray: &Ray) -> Option<f64> {
        let inv_x = 1.0 / ray.direction.x;
        let inv_y = 1.0 / ray.direction.y;
        let inv_z = 1.0 / ray.direction.z;

        let tx1 = (self.min.x - ray.origin.x) * inv_x;
        let tx2 = (self.max.x - ray.origin.x) * inv_x;
        let ty1 = (self.min.y - ray.origin.y) * inv_y;
        let ty2 = (self.max.y - ray.origin.y) * inv_y;
        let tz1 = (self.min.z - ray.origin.z) * inv_z;
        let tz2 = (self.max.z - ray.origin.z) * inv_z;

        let t_min = tx1.min(tx2).max(ty1.min(ty2)).max(tz1.min(tz2));
        let t_max = tx1.max(tx2).min(ty1.max(ty2)).min(tz1.max(tz2));

        // Ray intersects if t_max >= t_min and the exit is not behind the origin
        if t_max >= t_min && t_max >= 0.0 {
            Some(t_min.max(0.0))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rect_contains_boundary_points() {
        let rect = Rect::new(Vec2::new(0.0, 0.0), Vec2::new(50.0, 50.0));
        assert!(rect.contains_point(Vec2::new(0.0, 0.0)));
        assert!(rect.contains_point(Vec2::new(50.0, 50.0)));
        assert!(rect.contains_point(Vec2::new(25.0, 50.0)));
        assert!(!rect.contains_point(Vec2::new(50.0, 50.1)));
    }

    #[test]
    fn test_rect_quadrants_tile_parent() {
        let rect = Rect::new(Vec2::new(0.0, 0.0), Vec2::new(100.0, 100.0));
        let quadrants = rect.quadrants();

        assert_eq!(quadrants[0].max, Vec2::new(50.0, 50.0));
        assert_eq!(quadrants[3].min, Vec2::new(50.0, 50.0));
        for q in &quadrants {
            assert_relative_eq!(q.width(), 50.0);
            assert_relative_eq!(q.height(), 50.0);
        }
    }

    #[test]
    fn test_aabb_octants_tile_parent() {
        let aabb = Aabb::new(Vec3::new(-8.0, -8.0, -8.0), Vec3::new(8.0, 8.0, 8.0));
        let octants = aabb.octants();

        assert_eq!(octants[0].min, Vec3::new(-8.0, -8.0, -8.0));
        assert_eq!(octants[7].max, Vec3::new(8.0, 8.0, 8.0));
        // +x bit selects the right half, +z bit the front half
        assert!(octants[1].min.x >= 0.0);
        assert!(octants[4].min.z >= 0.0);
        for o in &octants {
            assert_eq!(o.extents(), Vec3::new(4.0, 4.0, 4.0));
        }
    }

    #[test]
    fn test_padded_over_regular_points() {
        let rect = Rect::padded_over([
            Vec2::new(10.0, 10.0),
            Vec2::new(90.0, 50.0),
        ])
        .expect("non-empty input");

        // Largest extent is 80, so padding is 8 + epsilon.
        assert!(rect.min.x < 2.01 && rect.min.x > 1.99);
        assert!(rect.max.x > 97.99 && rect.max.x < 98.01);
        assert!(rect.contains_point(Vec2::new(10.0, 10.0)));
        assert!(rect.contains_point(Vec2::new(90.0, 50.0)));
    }

    #[test]
    fn test_padded_over_coincident_points_is_not_degenerate() {
        let p = Vec3::new(5.0, 5.0, 5.0);
        let aabb = Aabb::padded_over([p, p, p]).expect("non-empty input");
        let extents = aabb.extents();
        assert!(extents.x > 0.0 && extents.y > 0.0 && extents.z > 0.0);
        assert!(aabb.contains_point(p));
    }

    #[test]
    fn test_padded_over_empty_input() {
        assert!(Rect::padded_over(std::iter::empty()).is_none());
        assert!(Aabb::padded_over(std::iter::empty()).is_none());
    }

    #[test]
    fn test_circle_rect_intersection() {
        let rect = Rect::new(Vec2::new(0.0, 0.0), Vec2::new(10.0, 10.0));
        assert!(rect.intersects_circle(&Circle::new(Vec2::new(5.0, 5.0), 1.0)));
        assert!(rect.intersects_circle(&Circle::new(Vec2::new(13.0, 5.0), 3.0)));
        assert!(!rect.intersects_circle(&Circle::new(Vec2::new(13.1, 5.0), 3.0)));
    }

    #[test]
    fn test_sphere_aabb_intersection() {
        let aabb = Aabb::new(Vec3::zeros(), Vec3::new(10.0, 10.0, 10.0));
        assert!(aabb.intersects_sphere(&Sphere::new(Vec3::new(5.0, 5.0, 12.0), 2.0)));
        assert!(!aabb.intersects_sphere(&Sphere::new(Vec3::new(5.0, 5.0, 12.1), 2.0)));
    }

    #[test]
    fn test_slab_intersection_straight_hit() {
        let rect = Rect::new(Vec2::new(99.0, -1.0), Vec2::new(101.0, 1.0));
        let ray = Ray2::new(Vec2::zeros(), Vec2::new(1.0, 0.0));
        let t = rect.intersect_ray(&ray).expect("ray hits rect");
        assert_relative_eq!(t, 99.0);
    }

    #[test]
    fn test_slab_intersection_axis_parallel_components() {
        // Direction has a zero y component; division yields infinity and the
        // interval math must still resolve.
        let aabb = Aabb::new(Vec3::new(5.0, -1.0, -1.0), Vec3::new(6.0, 1.0, 1.0));
        let ray = Ray::new(Vec3::zeros(), Vec3::new(1.0, 0.0, 0.0));
        assert!(aabb.intersect_ray(&ray).is_some());

        // Same ray, box off to the side: the y slab never overlaps.
        let aabb = Aabb::new(Vec3::new(5.0, 2.0, -1.0), Vec3::new(6.0, 3.0, 1.0));
        assert!(aabb.intersect_ray(&ray).is_none());
    }

    #[test]
    fn test_slab_intersection_behind_origin() {
        let rect = Rect::new(Vec2::new(-3.0, -1.0), Vec2::new(-2.0, 1.0));
        let ray = Ray2::new(Vec2::zeros(), Vec2::new(1.0, 0.0));
        assert!(rect.intersect_ray(&ray).is_none());
    }

    #[test]
    fn test_slab_intersection_origin_inside() {
        let aabb = Aabb::new(Vec3::new(-1.0, -1.0, -1.0), Vec3::new(1.0, 1.0, 1.0));
        let ray = Ray::new(Vec3::zeros(), Vec3::new(0.0, 1.0, 0.0));
        let t = aabb.intersect_ray(&ray).expect("origin inside the box");
        assert_relative_eq!(t, 0.0);
    }

    #[test]
    fn test_expanded_bounds() {
        let rect = Rect::new(Vec2::zeros(), Vec2::new(2.0, 2.0)).expanded(1.0);
        assert_eq!(rect.min, Vec2::new(-1.0, -1.0));
        assert_eq!(rect.max, Vec2::new(3.0, 3.0));
    }
}
