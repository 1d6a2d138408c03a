//! Math type re-exports and scene-specific math utilities.
//!
//! Re-exports the `glam` types used throughout the crate and provides the
//! axis-aligned bounding box stored with every mesh chunk.

pub use glam::{
    // Single precision
    Vec2, Vec3, Vec4, Mat4, Quat,
    // Double precision (transform resolution)
    DVec3, DMat4, DQuat,
    EulerRot,
};

use bytemuck::{Pod, Zeroable};
use std::fmt;

/// Axis-aligned bounding box with single precision.
#[derive(Clone, Copy, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct BBox3f {
    pub min: Vec3,
    pub max: Vec3,
}

impl BBox3f {
    /// Empty bounding box (inverted, will expand on first point).
    pub const EMPTY: Self = Self {
        min: Vec3::splat(f32::INFINITY),
        max: Vec3::splat(f32::NEG_INFINITY),
    };

    /// Create a new bounding box from min and max points.
    #[inline]
    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Create a bounding box from a single point.
    #[inline]
    pub fn from_point(p: Vec3) -> Self {
        Self { min: p, max: p }
    }

    /// Check if this box is empty (has no volume).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Expand this box to include a point.
    #[inline]
    pub fn expand_by_point(&mut self, p: Vec3) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    /// Get the center of the box.
    #[inline]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Get the size (extents) of the box.
    #[inline]
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }
}

impl Default for BBox3f {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl fmt::Debug for BBox3f {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BBox3f({:?} - {:?})", self.min, self.max)
    }
}

/// Re-emit a Z-up vector in the Y-up convention by swapping the second and third component.
#[inline]
pub fn swap_yz(v: Vec3) -> Vec3 {
    Vec3::new(v.x, v.z, v.y)
}

/// Double precision variant of [`swap_yz`].
#[inline]
pub fn swap_yz_f64(v: DVec3) -> DVec3 {
    DVec3::new(v.x, v.z, v.y)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bbox_expand() {
        let mut b = BBox3f::from_point(Vec3::new(1.0, 2.0, 3.0));
        b.expand_by_point(Vec3::new(-1.0, 5.0, 0.0));
        assert_eq!(b.min, Vec3::new(-1.0, 2.0, 0.0));
        assert_eq!(b.max, Vec3::new(1.0, 5.0, 3.0));
        assert_eq!(b.size(), Vec3::new(2.0, 3.0, 3.0));
        assert!(!b.is_empty());
    }

    #[test]
    fn test_bbox_empty() {
        let mut b = BBox3f::EMPTY;
        assert!(b.is_empty());
        b.expand_by_point(Vec3::ZERO);
        assert!(!b.is_empty());
        assert_eq!(b.center(), Vec3::ZERO);
    }

    #[test]
    fn test_swap_yz() {
        assert_eq!(swap_yz(Vec3::new(1.0, 2.0, 3.0)), Vec3::new(1.0, 3.0, 2.0));
        assert_eq!(swap_yz_f64(DVec3::new(1.0, 2.0, 3.0)), DVec3::new(1.0, 3.0, 2.0));
    }
}
