use glam::{Affine3A, Vec3A};

use super::{
    collector::CollisionResult,
    collide_shape::{CollectFacesMode, DEFAULT_COLLISION_TOLERANCE, DEFAULT_PENETRATION_TOLERANCE},
    ray_cast::BackFaceMode,
    shapes::{convex_shape::ConvexShapes, support::SupportingFace},
    sub_shape_id::SubShapeId,
};

/// A convex shape swept from `center_of_mass_start` along `direction`.
#[derive(Clone, Copy)]
pub struct ShapeCast<'a> {
    pub shape: &'a ConvexShapes,
    pub scale: Vec3A,
    pub center_of_mass_start: Affine3A,
    pub direction: Vec3A,
}

impl<'a> ShapeCast<'a> {
    #[inline]
    pub const fn new(
        shape: &'a ConvexShapes,
        scale: Vec3A,
        center_of_mass_start: Affine3A,
        direction: Vec3A,
    ) -> Self {
        Self {
            shape,
            scale,
            center_of_mass_start,
            direction,
        }
    }

    /// Re-expresses the cast in another space, `t` must be a rigid transform.
    pub fn post_transformed(&self, t: &Affine3A) -> Self {
        Self {
            center_of_mass_start: *t * self.center_of_mass_start,
            direction: t.transform_vector3a(self.direction),
            ..*self
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShapeCastSettings {
    pub back_face_mode: BackFaceMode,
    pub collision_tolerance: f32,
    pub penetration_tolerance: f32,
    pub collect_faces_mode: CollectFacesMode,
    /// Cast the cores and add the convex radii afterwards, faster but rounds off corners.
    pub use_shrunken_shape_and_convex_radius: bool,
    /// When the shapes start out penetrating, run EPA to find the deepest point.
    pub return_deepest_point: bool,
}

impl Default for ShapeCastSettings {
    fn default() -> Self {
        Self {
            back_face_mode: BackFaceMode::IgnoreBackFaces,
            collision_tolerance: DEFAULT_COLLISION_TOLERANCE,
            penetration_tolerance: DEFAULT_PENETRATION_TOLERANCE,
            collect_faces_mode: CollectFacesMode::NoFaces,
            use_shrunken_shape_and_convex_radius: false,
            return_deepest_point: false,
        }
    }
}

/// Contact found by a shape cast, everything in world space at the time of impact.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ShapeCastResult {
    pub contact_point_on1: Vec3A,
    pub contact_point_on2: Vec3A,
    pub penetration_axis: Vec3A,
    pub penetration_depth: f32,
    pub sub_shape_id1: SubShapeId,
    pub sub_shape_id2: SubShapeId,
    pub shape1_face: SupportingFace,
    pub shape2_face: SupportingFace,
    /// Fraction of `direction` travelled before the shapes touch.
    pub fraction: f32,
    pub is_back_face_hit: bool,
}

impl CollisionResult for ShapeCastResult {
    #[inline]
    fn early_out_fraction(&self) -> f32 {
        // Initially penetrating hits sort by how deep they are
        if self.fraction > 0.0 {
            self.fraction
        } else {
            -self.penetration_depth
        }
    }
}
