use glam::{Affine3A, Vec3A};
use std::f32::consts::FRAC_1_SQRT_2;

pub mod aabb_util_2;
pub mod obb;
pub mod plane;

pub trait AffineExt {
    /// Inverse of a rigid transform (rotation + translation only).
    fn inverse_rigid(&self) -> Self;
}

impl AffineExt for Affine3A {
    fn inverse_rigid(&self) -> Self {
        let matrix3 = self.matrix3.transpose();

        Self {
            matrix3,
            translation: matrix3 * -self.translation,
        }
    }
}

pub fn plane_space(n: Vec3A) -> (Vec3A, Vec3A) {
    if n.z.abs() > FRAC_1_SQRT_2 {
        // choose p in y-z plane
        let a = n.y.mul_add(n.y, n.z * n.z);
        let k = 1. / a.sqrt();
        let p = Vec3A::new(0., -n.z * k, n.y * k);
        (p, Vec3A::new(a * k, -n.x * p.z, n.x * p.y))
    } else {
        // choose p in x-y plane
        let a = n.x.mul_add(n.x, n.y * n.y);
        let k = 1. / a.sqrt();
        let p = Vec3A::new(-n.y * k, n.x * k, 0.);
        (p, Vec3A::new(-n.z * p.y, n.z * p.x, a * k))
    }
}

/// Returns true when every component of `scale` has the same magnitude.
#[inline]
pub fn is_uniform_scale(scale: Vec3A) -> bool {
    let abs = scale.abs();
    (abs - Vec3A::splat(abs.x)).abs().max_element() <= 1.0e-5 * abs.x.max(1.0)
}

/// Returns true when the scale is usable for queries (no zero or non-finite component).
#[inline]
pub fn is_valid_scale(scale: Vec3A) -> bool {
    scale.is_finite() && scale.abs().min_element() > f32::EPSILON
}

/// Sign of the scale determinant flips the winding of any triangle that is scaled with it.
#[inline]
pub fn is_inside_out(scale: Vec3A) -> bool {
    scale.x * scale.y * scale.z < 0.0
}
