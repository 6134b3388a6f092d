use std::sync::Arc;

use approx::assert_relative_eq;
use convex_collision::{
    BoxShapeSettings, CapsuleShapeSettings, ConvexHullShapeSettings, ScaledShapeSettings,
    SphereShapeSettings, SupportBuffer, SupportFunction, SupportMode, SupportingFace,
    glam::Vec3A, logging,
};

fn init_for_test() {
    let _ = logging::try_init();
}

#[test]
fn box_support_modes() {
    init_for_test();

    let shape = BoxShapeSettings::new(Vec3A::new(1.0, 2.0, 3.0)).create().unwrap();
    let mut buffer = SupportBuffer::new();

    let exclusive = shape.get_support_function(SupportMode::ExcludeConvexRadius, &mut buffer, Vec3A::ONE);
    assert_relative_eq!(exclusive.get_convex_radius(), 0.05);
    assert!(
        exclusive
            .get_support(Vec3A::ONE)
            .abs_diff_eq(Vec3A::new(0.95, 1.95, 2.95), 1e-6)
    );

    let inclusive = shape.get_support_function(SupportMode::IncludeConvexRadius, &mut buffer, Vec3A::ONE);
    assert_eq!(inclusive.get_convex_radius(), 0.0);
    assert!(inclusive.get_support(Vec3A::Z).abs_diff_eq(Vec3A::new(0.95, 1.95, 3.0), 1e-6));
}

#[test]
fn scaled_support_matches_direct_scale() {
    init_for_test();

    let inner = BoxShapeSettings::new(Vec3A::ONE).create().unwrap();
    let scale = Vec3A::new(2.0, -1.0, 0.5);
    let scaled = ScaledShapeSettings::new(Arc::new(inner.clone()), scale)
        .create()
        .unwrap();

    let mut direct_buffer = SupportBuffer::new();
    let mut wrapped_buffer = SupportBuffer::new();
    let direct = inner.get_support_function(SupportMode::IncludeConvexRadius, &mut direct_buffer, scale);
    let wrapped = scaled.get_support_function(SupportMode::IncludeConvexRadius, &mut wrapped_buffer, Vec3A::ONE);

    for dir in [Vec3A::X, Vec3A::NEG_Y, Vec3A::new(0.3, -0.2, 0.9)] {
        assert!(direct.get_support(dir).abs_diff_eq(wrapped.get_support(dir), 1e-6));
    }
    assert_relative_eq!(wrapped.get_support(Vec3A::X).x, 2.0, epsilon = 1e-6);
}

#[test]
fn sphere_and_capsule_scale_uniformly() {
    init_for_test();

    let mut buffer = SupportBuffer::new();

    let sphere = SphereShapeSettings::new(0.5).create().unwrap();
    let support = sphere.get_support_function(SupportMode::ExcludeConvexRadius, &mut buffer, Vec3A::splat(-2.0));
    assert_eq!(support.get_support(Vec3A::X), Vec3A::ZERO);
    assert_relative_eq!(support.get_convex_radius(), 1.0);

    let capsule = CapsuleShapeSettings::new(1.0, 0.25).create().unwrap();
    let support = capsule.get_support_function(SupportMode::IncludeConvexRadius, &mut buffer, Vec3A::splat(2.0));
    assert!(support.get_support(Vec3A::NEG_Y).abs_diff_eq(Vec3A::new(0.0, -2.5, 0.0), 1e-6));
}

#[test]
fn hull_support_is_relative_to_center_of_mass() {
    init_for_test();

    let mut points = Vec::new();
    for x in [0.0, 2.0] {
        for y in [0.0, 2.0] {
            for z in [0.0, 2.0] {
                points.push(Vec3A::new(x, y, z));
            }
        }
    }
    let hull = ConvexHullShapeSettings::new(points).create().unwrap();

    let mut buffer = SupportBuffer::new();
    let support = hull.get_support_function(SupportMode::IncludeConvexRadius, &mut buffer, Vec3A::ONE);
    assert_relative_eq!(support.get_support(Vec3A::X).x, 1.0, epsilon = 1e-5);
    assert_relative_eq!(support.get_support(Vec3A::NEG_Z).z, -1.0, epsilon = 1e-5);
}

#[test]
fn supporting_faces() {
    init_for_test();

    let mut face = SupportingFace::new();

    let shape = BoxShapeSettings::new(Vec3A::ONE).create().unwrap();
    shape.get_supporting_face(Vec3A::new(0.1, 0.9, 0.0), Vec3A::ONE, &mut face);
    assert_eq!(face.len(), 4);
    assert!(face.iter().all(|v| (v.y - 1.0).abs() < 1e-6));

    let sphere = SphereShapeSettings::new(1.0).create().unwrap();
    sphere.get_supporting_face(Vec3A::X, Vec3A::ONE, &mut face);
    assert!(face.is_empty());

    let capsule = CapsuleShapeSettings::new(1.0, 0.5).create().unwrap();
    capsule.get_supporting_face(Vec3A::Z, Vec3A::ONE, &mut face);
    assert_eq!(face.len(), 2);

    let inner = Arc::new(BoxShapeSettings::new(Vec3A::ONE).create().unwrap());
    let scaled = ScaledShapeSettings::new(inner, Vec3A::new(3.0, 1.0, 1.0))
        .create()
        .unwrap();
    scaled.get_supporting_face(Vec3A::X, Vec3A::ONE, &mut face);
    assert_eq!(face.len(), 4);
    assert!(face.iter().all(|v| (v.x - 3.0).abs() < 1e-6));
}

#[test]
fn bounds_and_mass_properties() {
    init_for_test();

    let shape = CapsuleShapeSettings::new(1.0, 0.5).create().unwrap();
    let bounds = shape.get_local_bounds(Vec3A::splat(2.0));
    assert!(bounds.max.abs_diff_eq(Vec3A::new(1.0, 3.0, 1.0), 1e-6));
    assert_relative_eq!(shape.get_mass(), shape.get_volume() * 1000.0);
    assert_relative_eq!(shape.get_inner_radius(), 0.5);
    assert_eq!(shape.get_sub_shape_id_bits_recursive(), 0);
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

#[test]
fn capsule_core_plus_radius_is_the_full_shape() {
    init_for_test();

    let capsule = CapsuleShapeSettings::new(1.0, 0.5).create().unwrap();
    let mut core_buffer = SupportBuffer::new();
    let mut full_buffer = SupportBuffer::new();
    let core = capsule.get_support_function(SupportMode::ExcludeConvexRadius, &mut core_buffer, Vec3A::ONE);
    let full = capsule.get_support_function(SupportMode::IncludeConvexRadius, &mut full_buffer, Vec3A::ONE);

    for dir in [
        Vec3A::X,
        Vec3A::NEG_Y,
        Vec3A::new(0.3, 0.8, -0.2),
        Vec3A::new(-1.0, 0.1, 2.0),
    ] {
        let expected = core.get_support(dir) + core.get_convex_radius() * dir.normalize();
        assert!(full.get_support(dir).abs_diff_eq(expected, 1e-6));
    }
}

#[test]
fn hull_core_plus_radius_reaches_every_face() {
    init_for_test();

    let hull = box_hull(Vec3A::new(10.0, 1.0, 1.0));
    let mut core_buffer = SupportBuffer::new();
    let mut full_buffer = SupportBuffer::new();
    let core = hull.get_support_function(SupportMode::ExcludeConvexRadius, &mut core_buffer, Vec3A::ONE);
    let full = hull.get_support_function(SupportMode::IncludeConvexRadius, &mut full_buffer, Vec3A::ONE);

    assert_eq!(full.get_convex_radius(), 0.0);
    assert_relative_eq!(core.get_convex_radius(), 0.05);
    assert_relative_eq!(full.get_support(Vec3A::X).x, 10.0, epsilon = 1e-5);

    for dir in [Vec3A::X, Vec3A::NEG_X, Vec3A::Y, Vec3A::NEG_Y, Vec3A::Z, Vec3A::NEG_Z] {
        let reach = dir.dot(core.get_support(dir)) + core.get_convex_radius();
        assert_relative_eq!(reach, dir.dot(full.get_support(dir)), epsilon = 1e-5);
    }
}
