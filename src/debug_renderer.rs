//! Visualization hooks for support functions and supporting faces.

use std::sync::{Arc, Mutex, PoisonError};

use ahash::AHashMap;
use glam::{Affine3A, Vec3A};

use crate::collision::shapes::{
    convex_shape::ConvexShapes,
    get_triangles::unit_sphere_triangles,
    physics_material::Color,
    support::{SupportFunction, SupportMode, SupportingFace},
};

pub const COLOR_GREEN: Color = 0xFF00_FF00;
pub const COLOR_RED: Color = 0xFFFF_0000;
pub const COLOR_YELLOW: Color = 0xFFFF_FF00;

/// Receives the primitives drawn by the debug helpers, positions in world space.
pub trait DebugRenderer {
    fn draw_line(&mut self, from: Vec3A, to: Vec3A, color: Color);

    fn draw_triangle(&mut self, v1: Vec3A, v2: Vec3A, v3: Vec3A, color: Color);

    fn draw_arrow(&mut self, from: Vec3A, to: Vec3A, color: Color, size: f32) {
        self.draw_line(from, to, color);

        let Some(dir) = (to - from).try_normalize() else {
            return;
        };
        let (u, v) = crate::linear_math::plane_space(dir);
        let back = to - size * dir;
        self.draw_line(to, back + size * 0.5 * u, color);
        self.draw_line(to, back - size * 0.5 * u, color);
        self.draw_line(to, back + size * 0.5 * v, color);
        self.draw_line(to, back - size * 0.5 * v, color);
    }

    fn draw_marker(&mut self, position: Vec3A, color: Color, size: f32) {
        for axis in [Vec3A::X, Vec3A::Y, Vec3A::Z] {
            self.draw_line(position - size * axis, position + size * axis, color);
        }
    }
}

type SupportGeometry = Arc<Vec<[Vec3A; 3]>>;

/// Tessellated support geometry per scale, keyed by the scale's bit pattern.
///
/// Cloning a shape starts it off with an empty cache.
#[derive(Debug, Default)]
pub struct SupportGeometryCache(Mutex<AHashMap<[u32; 3], SupportGeometry>>);

impl Clone for SupportGeometryCache {
    fn clone(&self) -> Self {
        Self::default()
    }
}

impl SupportGeometryCache {
    fn get_or_insert_with(&self, scale: Vec3A, build: impl FnOnce() -> Vec<[Vec3A; 3]>) -> SupportGeometry {
        let key = scale.to_array().map(f32::to_bits);
        let mut map = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        map.entry(key).or_insert_with(|| Arc::new(build())).clone()
    }

    pub fn len(&self) -> usize {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ConvexShapes {
    /// Draws the surface the inclusive support function describes, optionally with the
    /// direction that produced each sample.
    pub fn draw_get_support_function<R: DebugRenderer + ?Sized>(
        &self,
        renderer: &mut R,
        center_of_mass_transform: &Affine3A,
        scale: Vec3A,
        color: Color,
        draw_support_direction: bool,
    ) {
        let geometry = self.base().debug_geometry.get_or_insert_with(scale, || {
            let support = self.make_support(SupportMode::IncludeConvexRadius, scale);
            unit_sphere_triangles()
                .iter()
                .map(|triangle| triangle.map(|dir| support.get_support(dir)))
                .collect()
        });

        for (triangle, directions) in geometry.iter().zip(unit_sphere_triangles()) {
            let [a, b, c] = triangle.map(|v| center_of_mass_transform.transform_point3a(v));
            renderer.draw_triangle(a, b, c, color);

            if draw_support_direction {
                let direction = center_of_mass_transform.transform_vector3a(directions[0]);
                renderer.draw_arrow(a, a + 0.1 * direction, COLOR_RED, 0.01);
            }
        }
    }

    /// Draws the supporting faces along the six local axes.
    pub fn draw_get_supporting_face<R: DebugRenderer + ?Sized>(
        &self,
        renderer: &mut R,
        center_of_mass_transform: &Affine3A,
        scale: Vec3A,
    ) {
        let mut face = SupportingFace::new();
        for direction in [Vec3A::X, Vec3A::NEG_X, Vec3A::Y, Vec3A::NEG_Y, Vec3A::Z, Vec3A::NEG_Z] {
            self.get_supporting_face(direction, scale, &mut face);
            if face.is_empty() {
                continue;
            }

            let world: SupportingFace = face
                .iter()
                .map(|&v| center_of_mass_transform.transform_point3a(v))
                .collect();

            let mut center = Vec3A::ZERO;
            for (i, &v) in world.iter().enumerate() {
                renderer.draw_line(v, world[(i + 1) % world.len()], COLOR_GREEN);
                center += v;
            }
            center /= world.len() as f32;

            let world_direction = center_of_mass_transform.transform_vector3a(direction);
            renderer.draw_arrow(center, center + 0.2 * world_direction, COLOR_YELLOW, 0.02);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::shapes::{box_shape::BoxShapeSettings, sphere_shape::SphereShapeSettings};

    #[derive(Default)]
    struct CountingRenderer {
        lines: usize,
        triangles: usize,
    }

    impl DebugRenderer for CountingRenderer {
        fn draw_line(&mut self, _from: Vec3A, _to: Vec3A, _color: Color) {
            self.lines += 1;
        }

        fn draw_triangle(&mut self, _v1: Vec3A, _v2: Vec3A, _v3: Vec3A, _color: Color) {
            self.triangles += 1;
        }
    }

    #[test]
    fn support_geometry_is_cached_per_scale() {
        let sphere = SphereShapeSettings::new(1.0).create().unwrap();
        let mut renderer = CountingRenderer::default();

        sphere.draw_get_support_function(&mut renderer, &Affine3A::IDENTITY, Vec3A::ONE, COLOR_GREEN, false);
        sphere.draw_get_support_function(&mut renderer, &Affine3A::IDENTITY, Vec3A::ONE, COLOR_GREEN, false);
        sphere.draw_get_support_function(&mut renderer, &Affine3A::IDENTITY, Vec3A::splat(2.0), COLOR_GREEN, false);

        assert_eq!(renderer.triangles, 3 * unit_sphere_triangles().len());
        assert_eq!(sphere.base().debug_geometry.len(), 2);
        assert!(sphere.clone().base().debug_geometry.is_empty());
    }

    #[test]
    fn box_draws_six_faces() {
        let shape = BoxShapeSettings::new(Vec3A::ONE).create().unwrap();
        let mut renderer = CountingRenderer::default();
        shape.draw_get_supporting_face(&mut renderer, &Affine3A::IDENTITY, Vec3A::ONE);

        // 4 edges plus an arrow of 5 lines per face
        assert_eq!(renderer.lines, 6 * (4 + 5));
    }
}
