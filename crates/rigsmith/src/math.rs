//! Math types and glam re-exports.
//!
//! We re-export [glam](https://docs.rs/glam) types so users don't need to
//! depend on it directly. The [`Transform`] type provides position, rotation,
//! and scale for scene nodes, and [`Aabb`] is the world-space box used for
//! camera framing.

pub use glam::{Mat4, Quat, Vec3};

/// A 3D transform: position, rotation, and scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Transform {
    /// Identity transform (origin, no rotation, uniform scale of 1).
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    /// Create a transform at the given position.
    pub fn from_xyz(x: f32, y: f32, z: f32) -> Self {
        Self {
            translation: Vec3::new(x, y, z),
            ..Self::IDENTITY
        }
    }

    /// Return a copy with uniform scale applied.
    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = Vec3::splat(scale);
        self
    }

    /// Compute the 4x4 model matrix.
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// An axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    /// A box of the given half extents centered on the origin.
    pub fn from_half_extents(half: Vec3) -> Self {
        Self::new(-half, half)
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Smallest box containing both `self` and `other`.
    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Transform all eight corners and return the box around them.
    pub fn transformed(&self, matrix: &Mat4) -> Aabb {
        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);
        for i in 0..8 {
            let corner = Vec3::new(
                if i & 1 == 0 { self.min.x } else { self.max.x },
                if i & 2 == 0 { self.min.y } else { self.max.y },
                if i & 4 == 0 { self.min.z } else { self.max.z },
            );
            let p = matrix.transform_point3(corner);
            min = min.min(p);
            max = max.max(p);
        }
        Aabb { min, max }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn union_covers_both() {
        let a = Aabb::new(Vec3::ZERO, Vec3::ONE);
        let b = Aabb::new(Vec3::splat(-1.0), Vec3::splat(0.5));
        let u = a.union(&b);
        assert_eq!(u.min, Vec3::splat(-1.0));
        assert_eq!(u.max, Vec3::ONE);
    }

    #[test]
    fn transformed_box_follows_translation_and_scale() {
        let aabb = Aabb::from_half_extents(Vec3::ONE);
        let matrix = Transform::from_xyz(10.0, 0.0, 0.0).with_scale(2.0).matrix();
        let moved = aabb.transformed(&matrix);
        assert!((moved.min.x - 8.0).abs() < 0.001);
        assert!((moved.max.x - 12.0).abs() < 0.001);
        assert!((moved.center().y).abs() < 0.001);
    }
}
