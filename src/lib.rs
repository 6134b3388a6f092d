pub mod collision;
#[cfg(feature = "debug-renderer")]
pub mod debug_renderer;
pub mod error;
pub mod linear_math;
pub mod logging;

pub use collision::{
    collector::{AllHitCollector, AnyHitCollector, ClosestHitCollector, CollisionCollector, CollisionResult},
    collide_shape::{
        CollectFacesMode, CollidePointResult, CollideShapeResult, CollideShapeSettings, DefaultShapeFilter,
        ShapeFilter,
    },
    dispatch::convex_convex_collision_algorithm::{
        ShapeInstance, cast_convex_vs_convex, cast_convex_vs_convex_with_stats, collide_convex_vs_convex,
    },
    ray_cast::{BackFaceMode, RayCast, RayCastResult, RayCastSettings},
    shape_cast::{ShapeCast, ShapeCastResult, ShapeCastSettings},
    shapes::{
        box_shape::{BoxShape, BoxShapeSettings},
        capsule_shape::{CapsuleShape, CapsuleShapeSettings},
        convex_hull_shape::{ConvexHullShape, ConvexHullShapeSettings},
        convex_shape::{ConvexShape, ConvexShapeSettings, ConvexShapes, ShapeResult},
        physics_material::{PhysicsMaterial, PhysicsMaterialList},
        scaled_shape::{MAX_SCALED_NESTING, ScaledShape, ScaledShapeSettings},
        shape_serialization::{restore_with_materials, save_with_materials},
        sphere_shape::{SphereShape, SphereShapeSettings},
        submerged_volume::SubmergedVolume,
        support::{SupportBuffer, SupportFunction, SupportMode, SupportingFace},
    },
    stats::{CollideStats, CollideStatsSnapshot},
    sub_shape_id::{SubShapeId, SubShapeIdCreator},
};
pub use error::{ShapeError, StreamError};
pub use glam;
