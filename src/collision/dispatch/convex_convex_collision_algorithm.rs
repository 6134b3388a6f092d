use glam::{Affine3A, Vec3A};
use log::trace;

use crate::{
    collision::{
        collector::CollisionCollector,
        collide_shape::{CollectFacesMode, CollideShapeResult, CollideShapeSettings, ShapeFilter},
        narrowphase::{epa::EpaPenetrationDepth, gjk::GjkClosestPoint},
        ray_cast::BackFaceMode,
        shape_cast::{ShapeCast, ShapeCastResult, ShapeCastSettings},
        shapes::{
            convex_shape::ConvexShapes,
            support::{
                AddConvexRadius, SupportBuffer, SupportFunction, SupportMode, SupportingFace,
                TransformedSupport,
            },
        },
        stats::CollideStats,
        sub_shape_id::SubShapeIdCreator,
    },
    linear_math::AffineExt,
};

/// A shape placed in the world for one query.
#[derive(Clone, Copy)]
pub struct ShapeInstance<'a> {
    pub shape: &'a ConvexShapes,
    pub scale: Vec3A,
    pub center_of_mass_transform: Affine3A,
    pub sub_shape_id_creator: SubShapeIdCreator,
}

impl<'a> ShapeInstance<'a> {
    #[inline]
    pub fn new(shape: &'a ConvexShapes, scale: Vec3A, center_of_mass_transform: Affine3A) -> Self {
        Self {
            shape,
            scale,
            center_of_mass_transform,
            sub_shape_id_creator: SubShapeIdCreator::default(),
        }
    }

    #[inline]
    #[must_use]
    pub const fn with_sub_shape_id_creator(mut self, creator: SubShapeIdCreator) -> Self {
        self.sub_shape_id_creator = creator;
        self
    }
}

/// Supporting face of `shape` in `local_direction`, mapped through `transform`.
fn transformed_face(
    shape: &ConvexShapes,
    local_direction: Vec3A,
    scale: Vec3A,
    transform: &Affine3A,
) -> SupportingFace {
    let mut face = SupportingFace::new();
    shape.get_supporting_face(local_direction, scale, &mut face);
    for vertex in &mut face {
        *vertex = transform.transform_point3a(*vertex);
    }
    face
}

/// Contact between two convex shapes.
///
/// Works in the space of shape 1: a GJK pass on the cores decides whether the shapes are
/// separated, touching within the combined convex radius or overlapping, the last case is
/// refined by EPA on the full shapes. At most one hit is reported.
pub fn collide_convex_vs_convex<C, F>(
    shape1: &ShapeInstance,
    shape2: &ShapeInstance,
    settings: &CollideShapeSettings,
    filter: &F,
    collector: &mut C,
    stats: Option<&CollideStats>,
) where
    C: CollisionCollector<CollideShapeResult>,
    F: ShapeFilter + ?Sized,
{
    let sub_shape_id1 = shape1.sub_shape_id_creator.id();
    let sub_shape_id2 = shape2.sub_shape_id_creator.id();
    if collector.should_early_out() || !filter.should_collide(sub_shape_id1, sub_shape_id2) {
        return;
    }

    if let Some(stats) = stats {
        stats.count_collide();
    }

    let com1 = shape1.center_of_mass_transform;
    let transform_2_to_1 = com1.inverse_rigid() * shape2.center_of_mass_transform;
    let max_separation = settings.max_separation_distance.max(0.0);

    // Cheap reject on the bounds before building support functions
    let mut bounds1 = shape1.shape.get_local_bounds(shape1.scale);
    bounds1.min -= Vec3A::splat(max_separation);
    bounds1.max += Vec3A::splat(max_separation);
    let bounds2 = shape2
        .shape
        .get_world_space_bounds(&transform_2_to_1, shape2.scale);
    if !bounds1.intersects(&bounds2) {
        trace!("bounds do not overlap");
        if let Some(stats) = stats {
            stats.count_separated();
        }
        return;
    }

    let mut buffer1 = SupportBuffer::new();
    let mut buffer2 = SupportBuffer::new();
    let support1 =
        shape1
            .shape
            .get_support_function(SupportMode::ExcludeConvexRadius, &mut buffer1, shape1.scale);
    let support2 = TransformedSupport::new(
        transform_2_to_1,
        shape2
            .shape
            .get_support_function(SupportMode::ExcludeConvexRadius, &mut buffer2, shape2.scale),
    );

    let radius1 = support1.get_convex_radius();
    let radius2 = support2.get_convex_radius();
    let max_distance = radius1 + radius2 + max_separation;

    let mut v = -transform_2_to_1.translation;
    if v.length_squared() < 1.0e-12 {
        v = Vec3A::X;
    }

    let tolerance = settings.collision_tolerance;
    let mut gjk = GjkClosestPoint::new();
    let Some(closest) =
        gjk.get_closest_points(support1, &support2, tolerance, max_distance * max_distance, &mut v)
    else {
        trace!("gjk says separated");
        if let Some(stats) = stats {
            stats.count_separated();
        }
        return;
    };

    let (point1, point2, axis, depth) = if closest.distance_sq > tolerance * tolerance {
        // Cores are apart, the radii decide
        let distance = closest.distance_sq.sqrt();
        let normal = closest.v / distance;
        (
            closest.point_a - radius1 * normal,
            closest.point_b + radius2 * normal,
            -normal,
            radius1 + radius2 - distance,
        )
    } else {
        if let Some(stats) = stats {
            stats.count_epa();
        }

        let full1 = AddConvexRadius::new(support1);
        let full2 = AddConvexRadius::new(&support2);
        let Some(penetration) =
            EpaPenetrationDepth::get_penetration_depth(&full1, &full2, settings.penetration_tolerance)
        else {
            if let Some(stats) = stats {
                stats.count_epa_failure();
            }
            return;
        };

        (
            penetration.point_a,
            penetration.point_b,
            penetration.penetration_axis,
            penetration.depth,
        )
    };

    if depth < -max_separation || -depth >= collector.early_out_fraction() {
        return;
    }

    let axis = if axis.length_squared() > 0.0 { axis } else { Vec3A::Y };

    let (shape1_face, shape2_face) = if settings.collect_faces_mode == CollectFacesMode::CollectFaces {
        let to_2 = transform_2_to_1.matrix3.transpose();
        (
            transformed_face(shape1.shape, axis, shape1.scale, &com1),
            transformed_face(
                shape2.shape,
                to_2 * -axis,
                shape2.scale,
                &shape2.center_of_mass_transform,
            ),
        )
    } else {
        Default::default()
    };

    if let Some(stats) = stats {
        stats.count_hit();
    }

    let _ = collector.add_hit(CollideShapeResult {
        contact_point_on1: com1.transform_point3a(point1),
        contact_point_on2: com1.transform_point3a(point2),
        penetration_axis: com1.transform_vector3a(axis),
        penetration_depth: depth,
        sub_shape_id1,
        sub_shape_id2,
        shape1_face,
        shape2_face,
    });
}

/// Sweeps the shape of `shape_cast` against `target` and reports the first time of impact.
pub fn cast_convex_vs_convex<C, F>(
    shape_cast: &ShapeCast,
    settings: &ShapeCastSettings,
    sub_shape_id_creator1: SubShapeIdCreator,
    target: &ShapeInstance,
    filter: &F,
    collector: &mut C,
) where
    C: CollisionCollector<ShapeCastResult>,
    F: ShapeFilter + ?Sized,
{
    cast_convex_vs_convex_with_stats(shape_cast, settings, sub_shape_id_creator1, target, filter, collector, None);
}

/// [`cast_convex_vs_convex`] that also counts into `stats`.
pub fn cast_convex_vs_convex_with_stats<C, F>(
    shape_cast: &ShapeCast,
    settings: &ShapeCastSettings,
    sub_shape_id_creator1: SubShapeIdCreator,
    target: &ShapeInstance,
    filter: &F,
    collector: &mut C,
    stats: Option<&CollideStats>,
) where
    C: CollisionCollector<ShapeCastResult>,
    F: ShapeFilter + ?Sized,
{
    let sub_shape_id1 = sub_shape_id_creator1.id();
    let sub_shape_id2 = target.sub_shape_id_creator.id();
    if collector.should_early_out() || !filter.should_collide(sub_shape_id1, sub_shape_id2) {
        return;
    }

    if let Some(stats) = stats {
        stats.count_cast();
    }

    let com2 = target.center_of_mass_transform;
    let local_cast = shape_cast.post_transformed(&com2.inverse_rigid());

    let mode = if settings.use_shrunken_shape_and_convex_radius {
        SupportMode::ExcludeConvexRadius
    } else {
        SupportMode::IncludeConvexRadius
    };

    let mut buffer1 = SupportBuffer::new();
    let mut buffer2 = SupportBuffer::new();
    let cast_support = TransformedSupport::new(
        local_cast.center_of_mass_start,
        shape_cast
            .shape
            .get_support_function(mode, &mut buffer1, shape_cast.scale),
    );
    let target_support = target
        .shape
        .get_support_function(mode, &mut buffer2, target.scale);

    let max_fraction = collector.early_out_fraction().min(1.0);
    let Some(hit) = GjkClosestPoint::new().cast_shape(
        &cast_support,
        target_support,
        local_cast.direction,
        settings.collision_tolerance,
        max_fraction,
    ) else {
        trace!("shape cast misses");
        return;
    };

    let deepest = if hit.fraction == 0.0 && settings.return_deepest_point {
        if let Some(stats) = stats {
            stats.count_epa();
        }

        let full1 = AddConvexRadius::new(&cast_support);
        let full2 = AddConvexRadius::new(target_support);
        let penetration =
            EpaPenetrationDepth::get_penetration_depth(&full1, &full2, settings.penetration_tolerance);
        if penetration.is_none() {
            if let Some(stats) = stats {
                stats.count_epa_failure();
            }
        }
        penetration
    } else {
        None
    };

    let (point1, point2, axis, depth) = match deepest {
        Some(penetration) => (
            penetration.point_a,
            penetration.point_b,
            penetration.penetration_axis,
            penetration.depth,
        ),
        None => {
            let axis = if hit.separating_axis.length_squared() > 0.0 {
                hit.separating_axis
            } else {
                local_cast.direction
            };
            let depth = (hit.point_a - hit.point_b).dot(axis.normalize_or_zero());
            (hit.point_a, hit.point_b, axis, depth)
        }
    };

    let is_back_face_hit = axis.dot(local_cast.direction) < 0.0;
    if is_back_face_hit && settings.back_face_mode == BackFaceMode::IgnoreBackFaces {
        trace!("ignoring back face hit");
        return;
    }

    let (shape1_face, shape2_face) = if settings.collect_faces_mode == CollectFacesMode::CollectFaces {
        let at_impact = Affine3A::from_translation((hit.fraction * local_cast.direction).into())
            * local_cast.center_of_mass_start;
        let to_1 = at_impact.matrix3.transpose();
        (
            transformed_face(shape_cast.shape, to_1 * axis, shape_cast.scale, &(com2 * at_impact)),
            transformed_face(target.shape, -axis, target.scale, &com2),
        )
    } else {
        Default::default()
    };

    if let Some(stats) = stats {
        stats.count_hit();
    }

    let _ = collector.add_hit(ShapeCastResult {
        contact_point_on1: com2.transform_point3a(point1),
        contact_point_on2: com2.transform_point3a(point2),
        penetration_axis: com2.transform_vector3a(axis),
        penetration_depth: depth,
        sub_shape_id1,
        sub_shape_id2,
        shape1_face,
        shape2_face,
        fraction: hit.fraction,
        is_back_face_hit,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::{
        collector::ClosestHitCollector, collide_shape::DefaultShapeFilter,
        shapes::box_shape::BoxShapeSettings,
    };

    #[test]
    fn far_boxes_skip_the_narrow_phase() {
        let shape = BoxShapeSettings::new(Vec3A::ONE).create().unwrap();
        let a = ShapeInstance::new(&shape, Vec3A::ONE, Affine3A::IDENTITY);
        let b = ShapeInstance::new(&shape, Vec3A::ONE, Affine3A::from_translation(glam::Vec3::X * 10.0));

        let stats = CollideStats::new();
        let mut collector = ClosestHitCollector::default();
        collide_convex_vs_convex(
            &a,
            &b,
            &CollideShapeSettings::default(),
            &DefaultShapeFilter,
            &mut collector,
            Some(&stats),
        );

        assert!(collector.hit.is_none());
        let snapshot = stats.snapshot();
        assert_eq!(snapshot.collide_calls, 1);
        assert_eq!(snapshot.gjk_separated, 1);
        assert_eq!(snapshot.epa_runs, 0);
    }
}
