//! Transform resolution from the source (Z-up) into the target (Y-up) convention.
//!
//! Source world matrices are made parent-relative against the already
//! converted parent world, decomposed, and re-emitted with the second and
//! third axes swapped. With scale baking enabled the node's scale is dropped
//! from the matrix its children are resolved against; the caller folds it
//! into the node's geometry instead.

use crate::scene::Transform;
use crate::util::{swap_yz_f64, DMat4, DQuat, DVec3, EulerRot};

/// Result of resolving one node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResolvedTransform {
    /// Emitted component value.
    pub transform: Transform,
    /// Decomposed parent-relative scale in source space.
    pub source_scale: DVec3,
    /// Parent-relative matrix used for the node's children (scale removed when baking).
    pub relative: DMat4,
}

/// Resolve `node_world` against `parent_world` (both in source space).
pub fn resolve_relative(parent_world: DMat4, node_world: DMat4, apply_scale: bool) -> ResolvedTransform {
    let mut relative = parent_world.inverse() * node_world;
    let (scale, rotation, translation) = relative.to_scale_rotation_translation();

    if apply_scale {
        relative = DMat4::from_rotation_translation(rotation, translation);
    }

    let emitted_scale = if apply_scale { DVec3::ONE } else { swap_yz_f64(scale) };

    ResolvedTransform {
        transform: Transform {
            translation: swap_yz_f64(translation).as_vec3(),
            rotation: target_euler(rotation).as_vec3(),
            scale: emitted_scale.as_vec3(),
        },
        source_scale: scale,
        relative,
    }
}

/// Euler triple for the target convention.
///
/// Decomposes with Z outermost and Y innermost (rotate Y, then X, then Z),
/// remaps the axes and negates every angle.
pub fn target_euler(rotation: DQuat) -> DVec3 {
    let (z, x, y) = rotation.to_euler(EulerRot::ZXY);
    -swap_yz_f64(DVec3::new(x, y, z))
}

/// Stack of converted world matrices mirroring the traversal depth.
#[derive(Debug)]
pub struct TransformResolver {
    stack: Vec<DMat4>,
    apply_scale: bool,
}

impl TransformResolver {
    /// Create a resolver; the root parent is the identity.
    pub fn new(apply_scale: bool) -> Self {
        Self { stack: Vec::new(), apply_scale }
    }

    /// Whether scale is baked into geometry.
    #[inline]
    pub fn apply_scale(&self) -> bool {
        self.apply_scale
    }

    /// Converted world matrix of the innermost pushed node.
    pub fn parent_world(&self) -> DMat4 {
        self.stack.last().copied().unwrap_or(DMat4::IDENTITY)
    }

    /// Resolve `world` against the current parent and descend into it.
    pub fn push(&mut self, world: DMat4) -> ResolvedTransform {
        let parent = self.parent_world();
        let resolved = resolve_relative(parent, world, self.apply_scale);
        self.stack.push(parent * resolved.relative);
        resolved
    }

    /// Ascend one level.
    pub fn pop(&mut self) -> Option<DMat4> {
        self.stack.pop()
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::Vec3;
    use std::f64::consts::FRAC_PI_2;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).abs().max_element() < 1e-5
    }

    #[test]
    fn test_translation_axis_swap() {
        let world = DMat4::from_translation(DVec3::new(1.0, 2.0, 3.0));
        let r = resolve_relative(DMat4::IDENTITY, world, false);
        assert!(approx(r.transform.translation, Vec3::new(1.0, 3.0, 2.0)));
        assert!(approx(r.transform.rotation, Vec3::ZERO));
        assert!(approx(r.transform.scale, Vec3::ONE));
    }

    #[test]
    fn test_rotation_about_up_axis() {
        let world = DMat4::from_rotation_z(FRAC_PI_2);
        let r = resolve_relative(DMat4::IDENTITY, world, false);
        assert!(approx(r.transform.rotation, Vec3::new(0.0, -FRAC_PI_2 as f32, 0.0)));
    }

    #[test]
    fn test_rotation_about_x() {
        let world = DMat4::from_rotation_x(0.5);
        let r = resolve_relative(DMat4::IDENTITY, world, false);
        assert!(approx(r.transform.rotation, Vec3::new(-0.5, 0.0, 0.0)));
    }

    #[test]
    fn test_scale_remap_without_baking() {
        let world = DMat4::from_scale(DVec3::new(1.0, 2.0, 3.0));
        let r = resolve_relative(DMat4::IDENTITY, world, false);
        assert!(approx(r.transform.scale, Vec3::new(1.0, 3.0, 2.0)));
    }

    #[test]
    fn test_scale_baking_emits_unit_scale() {
        let world = DMat4::from_scale(DVec3::splat(2.0));
        let r = resolve_relative(DMat4::IDENTITY, world, true);
        assert!(approx(r.transform.scale, Vec3::ONE));
        assert!((r.source_scale - DVec3::splat(2.0)).abs().max_element() < 1e-9);
    }

    #[test]
    fn test_child_relative_to_scaled_parent() {
        let parent_world = DMat4::from_scale(DVec3::splat(2.0));
        let child_world = parent_world * DMat4::from_translation(DVec3::new(1.0, 0.0, 0.0));

        // Baked: the parent's scale is not propagated, so the child keeps the world offset.
        let mut baked = TransformResolver::new(true);
        baked.push(parent_world);
        let r = baked.push(child_world);
        assert!(approx(r.transform.translation, Vec3::new(2.0, 0.0, 0.0)));

        let mut plain = TransformResolver::new(false);
        plain.push(parent_world);
        let r = plain.push(child_world);
        assert!(approx(r.transform.translation, Vec3::new(1.0, 0.0, 0.0)));
        assert!(approx(r.transform.scale, Vec3::ONE));
    }

    #[test]
    fn test_stack_depth() {
        let mut res = TransformResolver::new(false);
        assert_eq!(res.parent_world(), DMat4::IDENTITY);
        res.push(DMat4::from_translation(DVec3::X));
        assert_eq!(res.depth(), 1);
        assert!(res.pop().is_some());
        assert!(res.pop().is_none());
    }
}
