//! Math utilities and types
//!
//! Provides fundamental math types for 2D and 3D spatial queries. Layout
//! coordinates arrive as `f64`, so all aliases are double-precision.

pub use nalgebra::{Vector2, Vector3};

/// 2D vector type
pub type Vec2 = Vector2<f64>;

/// 3D vector type
pub type Vec3 = Vector3<f64>;

/// 2D point type
pub type Point2 = nalgebra::Point2<f64>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f64>;

/// Euclidean distance between two 2D points
pub fn distance_2d(a: Vec2, b: Vec2) -> f64 {
    (b - a).magnitude()
}

/// Squared Euclidean distance between two 2D points
///
/// Avoids the square root when only comparisons are needed.
pub fn distance_squared_2d(a: Vec2, b: Vec2) -> f64 {
    (b - a).magnitude_squared()
}

/// Euclidean distance between two 3D points
pub fn distance_3d(a: Vec3, b: Vec3) -> f64 {
    (b - a).magnitude()
}

/// Squared Euclidean distance between two 3D points
pub fn distance_squared_3d(a: Vec3, b: Vec3) -> f64 {
    (b - a).magnitude_squared()
}

/// Radial distance in the XY plane, ignoring any z component
///
/// Used by cylinder-style selection in 3D scenes.
pub fn radial_distance_xy(a: Vec3, b: Vec2) -> f64 {
    distance_2d(a.xy(), b)
}

/// Normalize a 2D vector, mapping the zero vector to itself
///
/// A degenerate direction never produces NaN components; downstream
/// intersection tests yield empty results for a zero direction.
pub fn normalize_or_zero_2d(v: Vec2) -> Vec2 {
    let magnitude = v.magnitude();
    if magnitude > 0.0 {
        v / magnitude
    } else {
        Vec2::zeros()
    }
}

/// Normalize a 3D vector, mapping the zero vector to itself
pub fn normalize_or_zero_3d(v: Vec3) -> Vec3 {
    let magnitude = v.magnitude();
    if magnitude > 0.0 {
        v / magnitude
    } else {
        Vec3::zeros()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_distance_2d() {
        let a = Vec2::new(0.0, 0.0);
        let b = Vec2::new(3.0, 4.0);
        assert_relative_eq!(distance_2d(a, b), 5.0);
        assert_relative_eq!(distance_squared_2d(a, b), 25.0);
    }

    #[test]
    fn test_distance_3d() {
        let a = Vec3::new(1.0, 2.0, 3.0);
        let b = Vec3::new(1.0, 2.0, 3.0);
        assert_relative_eq!(distance_3d(a, b), 0.0);
        assert_relative_eq!(distance_3d(a, b + Vec3::new(2.0, 3.0, 6.0)), 7.0);
    }

    #[test]
    fn test_normalize_regular_vector() {
        let n = normalize_or_zero_2d(Vec2::new(10.0, 0.0));
        assert_relative_eq!(n.x, 1.0);
        assert_relative_eq!(n.y, 0.0);

        let n = normalize_or_zero_3d(Vec3::new(0.0, 0.0, -4.0));
        assert_relative_eq!(n.magnitude(), 1.0);
        assert_relative_eq!(n.z, -1.0);
    }

    #[test]
    fn test_normalize_zero_vector_stays_zero() {
        let n = normalize_or_zero_2d(Vec2::zeros());
        assert_eq!(n, Vec2::zeros());

        let n = normalize_or_zero_3d(Vec3::zeros());
        assert_eq!(n, Vec3::zeros());
    }

    #[test]
    fn test_radial_distance_ignores_z() {
        let a = Vec3::new(3.0, 4.0, 100.0);
        assert_relative_eq!(radial_distance_xy(a, Vec2::new(0.0, 0.0)), 5.0);
    }
}
