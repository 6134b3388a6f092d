use approx::assert_relative_eq;
use convex_collision::{
    AllHitCollector, BackFaceMode, BoxShapeSettings, CapsuleShapeSettings, ClosestHitCollector,
    CollidePointResult, ConvexHullShapeSettings, RayCast, RayCastResult, RayCastSettings,
    ScaledShapeSettings, SphereShapeSettings, SubShapeIdCreator, glam::Vec3A, logging,
};
use std::sync::Arc;

fn init_for_test() {
    let _ = logging::try_init();
}

#[test]
fn ray_through_sphere_reports_entry_and_exit() {
    init_for_test();

    let sphere = SphereShapeSettings::new(1.0).create().unwrap();
    let ray = RayCast::new(Vec3A::new(-10.0, 0.0, 0.0), Vec3A::new(20.0, 0.0, 0.0));
    let settings = RayCastSettings {
        back_face_mode: BackFaceMode::CollideWithBackFaces,
        ..Default::default()
    };

    let mut collector = AllHitCollector::default();
    sphere.cast_ray_with_collector(&ray, &settings, SubShapeIdCreator::default(), &mut collector);
    collector.sort();

    assert_eq!(collector.hits.len(), 2);
    assert_relative_eq!(collector.hits[0].fraction, 0.45, epsilon = 1e-4);
    assert_relative_eq!(collector.hits[1].fraction, 0.55, epsilon = 1e-4);
}

#[test]
fn ray_ignores_back_faces_by_default() {
    init_for_test();

    let sphere = SphereShapeSettings::new(1.0).create().unwrap();
    let ray = RayCast::new(Vec3A::new(-10.0, 0.0, 0.0), Vec3A::new(20.0, 0.0, 0.0));

    let mut collector = AllHitCollector::default();
    sphere.cast_ray_with_collector(
        &ray,
        &RayCastSettings::default(),
        SubShapeIdCreator::default(),
        &mut collector,
    );

    assert_eq!(collector.hits.len(), 1);
}

#[test]
fn ray_starting_inside_solid_shape_hits_at_zero() {
    init_for_test();

    let shape = BoxShapeSettings::new(Vec3A::ONE).create().unwrap();
    let ray = RayCast::new(Vec3A::ZERO, Vec3A::new(5.0, 0.0, 0.0));

    let mut hit = RayCastResult::default();
    assert!(shape.cast_ray(&ray, SubShapeIdCreator::default(), &mut hit));
    assert_eq!(hit.fraction, 0.0);

    let mut collector = ClosestHitCollector::default();
    shape.cast_ray_with_collector(
        &ray,
        &RayCastSettings::default(),
        SubShapeIdCreator::default(),
        &mut collector,
    );
    assert_eq!(collector.hit.map(|h| h.fraction), Some(0.0));
}

#[test]
fn ray_from_inside_hollow_shape_reports_exit_only() {
    init_for_test();

    let shape = BoxShapeSettings::new(Vec3A::ONE).create().unwrap();
    let ray = RayCast::new(Vec3A::ZERO, Vec3A::new(4.0, 0.0, 0.0));
    let settings = RayCastSettings {
        back_face_mode: BackFaceMode::CollideWithBackFaces,
        treat_convex_as_solid: false,
    };

    let mut collector = AllHitCollector::default();
    shape.cast_ray_with_collector(&ray, &settings, SubShapeIdCreator::default(), &mut collector);

    assert_eq!(collector.hits.len(), 1);
    assert_relative_eq!(collector.hits[0].fraction, 0.25, epsilon = 1e-3);
}

#[test]
fn ray_against_box_face() {
    init_for_test();

    let shape = BoxShapeSettings::new(Vec3A::ONE).create().unwrap();
    let mut hit = RayCastResult::default();
    let ray = RayCast::new(Vec3A::new(-3.0, 0.2, 0.1), Vec3A::new(6.0, 0.0, 0.0));

    assert!(shape.cast_ray(&ray, SubShapeIdCreator::default(), &mut hit));
    assert_relative_eq!(hit.fraction, 1.0 / 3.0, epsilon = 1e-3);

    let miss = RayCast::new(Vec3A::new(-3.0, 2.0, 0.0), Vec3A::new(6.0, 0.0, 0.0));
    let mut hit = RayCastResult::default();
    assert!(!shape.cast_ray(&miss, SubShapeIdCreator::default(), &mut hit));
}

#[test]
fn ray_shorter_than_the_distance_misses() {
    init_for_test();

    let shape = CapsuleShapeSettings::new(1.0, 0.5).create().unwrap();
    let ray = RayCast::new(Vec3A::new(0.0, 5.0, 0.0), Vec3A::new(0.0, -2.0, 0.0));

    let mut hit = RayCastResult::default();
    assert!(!shape.cast_ray(&ray, SubShapeIdCreator::default(), &mut hit));

    let longer = RayCast::new(Vec3A::new(0.0, 5.0, 0.0), Vec3A::new(0.0, -4.0, 0.0));
    assert!(shape.cast_ray(&longer, SubShapeIdCreator::default(), &mut hit));
    assert_relative_eq!(hit.fraction, 0.875, epsilon = 1e-3);
}

#[test]
fn scaled_shape_ray_uses_scale() {
    init_for_test();

    let inner = Arc::new(BoxShapeSettings::new(Vec3A::ONE).create().unwrap());
    let scaled = ScaledShapeSettings::new(inner, Vec3A::new(2.0, 1.0, 1.0))
        .create()
        .unwrap();

    let ray = RayCast::new(Vec3A::new(-4.0, 0.0, 0.0), Vec3A::new(8.0, 0.0, 0.0));
    let mut hit = RayCastResult::default();
    assert!(scaled.cast_ray(&ray, SubShapeIdCreator::default(), &mut hit));
    assert_relative_eq!(hit.fraction, 0.25, epsilon = 1e-3);
}

#[test]
fn point_containment() {
    init_for_test();

    let shape = BoxShapeSettings::new(Vec3A::ONE).create().unwrap();

    let mut inside = AllHitCollector::<CollidePointResult>::default();
    shape.collide_point(Vec3A::splat(0.5), SubShapeIdCreator::default(), &mut inside);
    assert_eq!(inside.hits.len(), 1);

    let mut outside = AllHitCollector::<CollidePointResult>::default();
    shape.collide_point(Vec3A::new(1.5, 0.0, 0.0), SubShapeIdCreator::default(), &mut outside);
    assert!(outside.hits.is_empty());
}

#[test]
fn point_containment_in_hull_is_relative_to_center_of_mass() {
    init_for_test();

    let mut points = Vec::new();
    for x in [2.0, 4.0] {
        for y in [-1.0, 1.0] {
            for z in [-1.0, 1.0] {
                points.push(Vec3A::new(x, y, z));
            }
        }
    }
    let hull = ConvexHullShapeSettings::new(points).create().unwrap();
    assert!(hull.get_center_of_mass().abs_diff_eq(Vec3A::new(3.0, 0.0, 0.0), 1e-4));

    let mut collector = AllHitCollector::<CollidePointResult>::default();
    hull.collide_point(Vec3A::new(0.9, 0.0, 0.0), SubShapeIdCreator::default(), &mut collector);
    assert_eq!(collector.hits.len(), 1);

    let mut collector = AllHitCollector::<CollidePointResult>::default();
    hull.collide_point(Vec3A::new(3.0, 0.0, 0.0), SubShapeIdCreator::default(), &mut collector);
    assert!(collector.hits.is_empty());
}

#[test]
fn world_ray_is_cast_in_center_of_mass_space() {
    use convex_collision::{
        glam::{Affine3A, Quat, Vec3},
        linear_math::AffineExt,
    };

    init_for_test();

    let shape = CapsuleShapeSettings::new(1.0, 0.5).create().unwrap();
    // Capsule lying along world X, centered at (0, 0, 5)
    let com = Affine3A::from_rotation_translation(
        Quat::from_rotation_z(std::f32::consts::FRAC_PI_2),
        Vec3::new(0.0, 0.0, 5.0),
    );
    let world_ray = RayCast::new(Vec3A::new(0.5, 0.0, 0.0), Vec3A::new(0.0, 0.0, 10.0));
    let local_ray = world_ray.transformed(&com.inverse_rigid());

    let mut hit = RayCastResult::default();
    assert!(shape.cast_ray(&local_ray, SubShapeIdCreator::default(), &mut hit));
    assert_relative_eq!(world_ray.point_on_ray(hit.fraction).z, 4.5, epsilon = 1e-3);
}

#[test]
fn far_points_are_never_inside() {
    init_for_test();

    let shape = BoxShapeSettings::new(Vec3A::ONE).create().unwrap();
    let mut collector = AllHitCollector::<CollidePointResult>::default();
    for point in [
        Vec3A::new(100.0, 0.0, 0.0),
        Vec3A::new(0.0, -100.0, 0.0),
        Vec3A::new(0.0, 0.0, 100.0),
        Vec3A::splat(100.0 / 3f32.sqrt()),
    ] {
        shape.collide_point(point, SubShapeIdCreator::default(), &mut collector);
    }
    assert!(collector.hits.is_empty());
}

fn box_hull(half_extent: Vec3A) -> convex_collision::ConvexShapes {
    let mut points = Vec::new();
    for x in [-1.0, 1.0] {
        for y in [-1.0, 1.0] {
            for z in [-1.0, 1.0] {
                points.push(Vec3A::new(x, y, z) * half_extent);
            }
        }
    }
    ConvexHullShapeSettings::new(points).create().unwrap()
}

fn offsets(from: f32, to: f32, step: f32) -> impl Iterator<Item = f32> + Clone {
    let count = ((to - from) / step).round() as usize;
    (0..=count).map(move |i| from + i as f32 * step)
}

#[test]
fn off_axis_rays_hit_box_and_hull_faces() {
    init_for_test();

    let shapes = [
        BoxShapeSettings::new(Vec3A::ONE).create().unwrap(),
        box_hull(Vec3A::ONE),
    ];

    for shape in &shapes {
        for y in offsets(-0.8, 0.8, 0.1) {
            for z in offsets(-0.8, 0.8, 0.1) {
                let ray = RayCast::new(Vec3A::new(-10.0, y, z), Vec3A::new(20.0, 0.0, 0.0));
                let mut hit = RayCastResult::default();
                assert!(
                    shape.cast_ray(&ray, SubShapeIdCreator::default(), &mut hit),
                    "{:?} missed at y={y} z={z}",
                    shape.get_shape_type()
                );
                assert_relative_eq!(hit.fraction, 0.45, epsilon = 1e-3);
            }
        }
    }
}

#[test]
fn off_axis_rays_hit_capsule_side() {
    init_for_test();

    let shape = CapsuleShapeSettings::new(1.0, 0.5).create().unwrap();
    for y in offsets(-0.9, 0.9, 0.3) {
        for z in offsets(-0.4, 0.4, 0.1) {
            let ray = RayCast::new(Vec3A::new(-10.0, y, z), Vec3A::new(20.0, 0.0, 0.0));
            let mut hit = RayCastResult::default();
            assert!(shape.cast_ray(&ray, SubShapeIdCreator::default(), &mut hit), "missed at y={y} z={z}");

            let entry = -(0.25 - z * z).sqrt();
            assert_relative_eq!(hit.fraction, (entry + 10.0) / 20.0, epsilon = 1e-3);
        }
    }
}

#[test]
fn long_hull_uses_its_full_extent() {
    init_for_test();

    let hull = box_hull(Vec3A::new(10.0, 1.0, 1.0));

    let ray = RayCast::new(Vec3A::new(-20.0, 0.3, -0.4), Vec3A::new(40.0, 0.0, 0.0));
    let mut hit = RayCastResult::default();
    assert!(hull.cast_ray(&ray, SubShapeIdCreator::default(), &mut hit));
    assert_relative_eq!(ray.point_on_ray(hit.fraction).x, -10.0, epsilon = 1e-3);

    let mut collector = AllHitCollector::<CollidePointResult>::default();
    hull.collide_point(Vec3A::new(9.8, 0.0, 0.0), SubShapeIdCreator::default(), &mut collector);
    hull.collide_point(Vec3A::new(9.99, 0.99, -0.99), SubShapeIdCreator::default(), &mut collector);
    assert_eq!(collector.hits.len(), 2);
}
