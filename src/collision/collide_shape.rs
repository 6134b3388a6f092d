use glam::Vec3A;

use super::{
    collector::CollisionResult, ray_cast::BackFaceMode, shapes::support::SupportingFace,
    sub_shape_id::SubShapeId,
};

pub const DEFAULT_COLLISION_TOLERANCE: f32 = 1.0e-4;
pub const DEFAULT_PENETRATION_TOLERANCE: f32 = 1.0e-4;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CollectFacesMode {
    /// Also return the supporting faces of both shapes.
    CollectFaces,
    #[default]
    NoFaces,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CollideShapeSettings {
    /// Shapes closer than this are reported as colliding with a negative penetration depth.
    pub max_separation_distance: f32,
    /// Distance at which GJK considers two shapes touching.
    pub collision_tolerance: f32,
    /// EPA stops when the penetration depth changes less than this between iterations.
    pub penetration_tolerance: f32,
    pub back_face_mode: BackFaceMode,
    pub collect_faces_mode: CollectFacesMode,
}

impl Default for CollideShapeSettings {
    fn default() -> Self {
        Self {
            max_separation_distance: 0.0,
            collision_tolerance: DEFAULT_COLLISION_TOLERANCE,
            penetration_tolerance: DEFAULT_PENETRATION_TOLERANCE,
            back_face_mode: BackFaceMode::IgnoreBackFaces,
            collect_faces_mode: CollectFacesMode::NoFaces,
        }
    }
}

/// Contact between two shapes, everything in world space.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CollideShapeResult {
    pub contact_point_on1: Vec3A,
    pub contact_point_on2: Vec3A,
    /// Direction to move shape 2 out of collision along the shortest path, not normalized.
    pub penetration_axis: Vec3A,
    pub penetration_depth: f32,
    pub sub_shape_id1: SubShapeId,
    pub sub_shape_id2: SubShapeId,
    pub shape1_face: SupportingFace,
    pub shape2_face: SupportingFace,
}

impl CollisionResult for CollideShapeResult {
    #[inline]
    fn early_out_fraction(&self) -> f32 {
        -self.penetration_depth
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CollidePointResult {
    pub sub_shape_id: SubShapeId,
}

impl CollisionResult for CollidePointResult {
    #[inline]
    fn early_out_fraction(&self) -> f32 {
        0.0
    }
}

/// Lets callers reject pairs of sub shapes before any narrow phase work happens.
pub trait ShapeFilter {
    fn should_collide(&self, _sub_shape_id1: SubShapeId, _sub_shape_id2: SubShapeId) -> bool {
        true
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultShapeFilter;

impl ShapeFilter for DefaultShapeFilter {}
