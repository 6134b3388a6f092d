use std::io::{self, Read, Write};

use glam::Vec3A;

use super::{
    convex_shape::{
        ConvexShape, ConvexShapeSettings, ConvexShapes, DEFAULT_CONVEX_RADIUS, ShapeResult,
    },
    stream::{FromStream, ToStream},
    support::{Support, SupportCore, SupportMode, SupportingFace},
};
use crate::{
    error::{ShapeError, StreamError},
    linear_math::{aabb_util_2::Aabb, obb::Obb},
};

#[derive(Clone, Debug, PartialEq)]
pub struct BoxShapeSettings {
    pub half_extent: Vec3A,
    /// Rounds the corners, can not be bigger than the smallest half extent.
    pub convex_radius: f32,
    pub base: ConvexShapeSettings,
}

impl BoxShapeSettings {
    #[must_use]
    pub fn new(half_extent: Vec3A) -> Self {
        Self {
            half_extent,
            convex_radius: DEFAULT_CONVEX_RADIUS.min(half_extent.min_element().max(0.0)),
            base: ConvexShapeSettings::default(),
        }
    }

    pub fn create(&self) -> ShapeResult {
        let base = self.base.create_base()?;
        BoxShape::new(base, self.half_extent, self.convex_radius).map(ConvexShapes::Box)
    }
}

#[derive(Clone, Debug)]
pub struct BoxShape {
    pub convex_shape: ConvexShape,
    half_extent: Vec3A,
    convex_radius: f32,
}

impl BoxShape {
    pub fn new(
        convex_shape: ConvexShape,
        half_extent: Vec3A,
        convex_radius: f32,
    ) -> Result<Self, ShapeError> {
        if !half_extent.is_finite() || half_extent.min_element() <= 0.0 {
            return Err(ShapeError::InvalidHalfExtent(half_extent.to_array()));
        }

        let max = half_extent.min_element();
        if !(0.0..=max).contains(&convex_radius) {
            return Err(ShapeError::InvalidConvexRadius {
                radius: convex_radius,
                max,
            });
        }

        Ok(Self {
            convex_shape,
            half_extent,
            convex_radius,
        })
    }

    #[inline]
    #[must_use]
    pub const fn get_half_extent(&self) -> Vec3A {
        self.half_extent
    }

    #[inline]
    #[must_use]
    pub const fn get_convex_radius(&self) -> f32 {
        self.convex_radius
    }

    #[must_use]
    pub fn get_support(&self, mode: SupportMode, scale: Vec3A) -> Support {
        let abs_scale = scale.abs();
        let half_extent = self.half_extent * abs_scale;
        let convex_radius = self.convex_radius * abs_scale.min_element();

        Support::new(
            SupportCore::Box {
                half_extent: half_extent - convex_radius,
            },
            convex_radius,
            mode,
        )
    }

    pub fn get_supporting_face(&self, direction: Vec3A, scale: Vec3A, face: &mut SupportingFace) {
        let obb = Obb::from_half_extent(self.half_extent * scale.abs());

        let abs_dir = direction.abs();
        let axis = if abs_dir.x >= abs_dir.y && abs_dir.x >= abs_dir.z {
            0
        } else if abs_dir.y >= abs_dir.z {
            1
        } else {
            2
        };
        let side = if direction[axis] < 0.0 { -1.0 } else { 1.0 };

        face.extend(obb.get_face_verts(axis, side));
    }

    /// The 12 triangles of the box surface, scaled and wound outward.
    pub fn get_surface_triangles(&self, scale: Vec3A) -> Vec<[Vec3A; 3]> {
        let obb = Obb::from_half_extent(self.half_extent);

        let mut triangles = Vec::with_capacity(12);
        for axis in 0..3 {
            for side in [-1.0, 1.0] {
                let [a, b, c, d] = obb.get_face_verts(axis, side).map(|v| v * scale);
                triangles.push([a, b, c]);
                triangles.push([a, c, d]);
            }
        }
        triangles
    }

    #[inline]
    #[must_use]
    pub fn get_local_bounds(&self) -> Aabb {
        Aabb::from_half_extent(self.half_extent)
    }

    #[inline]
    #[must_use]
    pub fn get_volume(&self) -> f32 {
        8.0 * self.half_extent.x * self.half_extent.y * self.half_extent.z
    }

    #[inline]
    #[must_use]
    pub fn get_inner_radius(&self) -> f32 {
        self.half_extent.min_element()
    }

    pub(crate) fn save_fields<W: Write>(&self, stream: &mut W) -> io::Result<()> {
        self.half_extent.to_stream(stream)?;
        self.convex_radius.to_stream(stream)
    }

    pub(crate) fn restore_fields<R: Read>(
        convex_shape: ConvexShape,
        stream: &mut R,
    ) -> Result<Self, StreamError> {
        let half_extent = Vec3A::from_stream(stream)?;
        let convex_radius = f32::from_stream(stream)?;
        Ok(Self::new(convex_shape, half_extent, convex_radius)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::shapes::support::SupportFunction;

    fn unit_box() -> BoxShape {
        BoxShape::new(ConvexShape::default(), Vec3A::ONE, 0.1).unwrap()
    }

    #[test]
    fn rejects_bad_extents_and_radius() {
        assert_eq!(
            BoxShape::new(ConvexShape::default(), Vec3A::new(1.0, 0.0, 1.0), 0.0).unwrap_err(),
            ShapeError::InvalidHalfExtent([1.0, 0.0, 1.0])
        );
        assert!(matches!(
            BoxShape::new(ConvexShape::default(), Vec3A::splat(0.5), 0.6),
            Err(ShapeError::InvalidConvexRadius { .. })
        ));
    }

    #[test]
    fn inclusive_support_reaches_faces() {
        let support = unit_box().get_support(SupportMode::IncludeConvexRadius, Vec3A::new(2.0, 1.0, 1.0));
        assert!((support.get_support(Vec3A::X).x - 2.0).abs() < 1e-6);
        assert!((support.get_support(Vec3A::NEG_Y).y + 1.0).abs() < 1e-6);
    }

    #[test]
    fn supporting_face_is_ccw_seen_from_direction() {
        let mut face = SupportingFace::new();
        unit_box().get_supporting_face(Vec3A::new(0.1, -1.0, 0.2), Vec3A::ONE, &mut face);
        assert_eq!(face.len(), 4);

        let normal = (face[1] - face[0]).cross(face[2] - face[0]);
        assert!(normal.normalize().abs_diff_eq(Vec3A::NEG_Y, 1e-6));
        assert!(face.iter().all(|v| v.y == -1.0));
    }

    #[test]
    fn surface_triangles_face_outward() {
        let triangles = unit_box().get_surface_triangles(Vec3A::ONE);
        assert_eq!(triangles.len(), 12);
        for [a, b, c] in triangles {
            let normal = (b - a).cross(c - a);
            assert!(normal.dot(a + b + c) > 0.0);
        }
    }
}
