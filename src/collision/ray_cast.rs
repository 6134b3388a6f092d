use glam::{Affine3A, Vec3A};

use super::{collector::CollisionResult, sub_shape_id::SubShapeId};

/// Ray segment from `origin` to `origin + direction`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayCast {
    pub origin: Vec3A,
    pub direction: Vec3A,
}

impl RayCast {
    #[inline]
    pub const fn new(origin: Vec3A, direction: Vec3A) -> Self {
        Self { origin, direction }
    }

    #[inline]
    pub fn point_on_ray(&self, fraction: f32) -> Vec3A {
        self.origin + fraction * self.direction
    }

    /// Transforms origin and direction, the fraction of a hit is unaffected.
    #[inline]
    pub fn transformed(&self, t: &Affine3A) -> Self {
        Self {
            origin: t.transform_point3a(self.origin),
            direction: t.transform_vector3a(self.direction),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BackFaceMode {
    /// Only report hits where the ray or shape enters the other shape.
    #[default]
    IgnoreBackFaces,
    /// Also report hits where the ray or shape leaves the other shape.
    CollideWithBackFaces,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RayCastSettings {
    pub back_face_mode: BackFaceMode,
    /// A ray starting inside a convex shape hits it at fraction 0.
    pub treat_convex_as_solid: bool,
}

impl Default for RayCastSettings {
    fn default() -> Self {
        Self {
            back_face_mode: BackFaceMode::IgnoreBackFaces,
            treat_convex_as_solid: true,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayCastResult {
    pub fraction: f32,
    pub sub_shape_id: SubShapeId,
}

impl Default for RayCastResult {
    fn default() -> Self {
        // Slightly above 1 so a hit at the very end of the ray still counts
        Self {
            fraction: 1.0 + f32::EPSILON,
            sub_shape_id: SubShapeId::EMPTY,
        }
    }
}

impl CollisionResult for RayCastResult {
    #[inline]
    fn early_out_fraction(&self) -> f32 {
        self.fraction
    }
}
