use std::{
    f32::consts::PI,
    io::{self, Read, Write},
};

use glam::Vec3A;

use super::{
    convex_shape::{ConvexShape, ConvexShapeSettings, ConvexShapes, ShapeResult},
    stream::{FromStream, ToStream},
    support::{Support, SupportCore, SupportMode, SupportingFace},
};
use crate::{
    error::{ShapeError, StreamError},
    linear_math::{aabb_util_2::Aabb, is_uniform_scale},
};

/// How far from perpendicular to the axis a direction may be and still get both side points.
const CAPSULE_PROJECTION_SLOP: f32 = 0.02;

#[derive(Clone, Debug, PartialEq)]
pub struct CapsuleShapeSettings {
    pub half_height_of_cylinder: f32,
    pub radius: f32,
    pub base: ConvexShapeSettings,
}

impl CapsuleShapeSettings {
    #[must_use]
    pub fn new(half_height_of_cylinder: f32, radius: f32) -> Self {
        Self {
            half_height_of_cylinder,
            radius,
            base: ConvexShapeSettings::default(),
        }
    }

    pub fn create(&self) -> ShapeResult {
        let base = self.base.create_base()?;
        CapsuleShape::new(base, self.half_height_of_cylinder, self.radius).map(ConvexShapes::Capsule)
    }
}

/// Segment along local Y swept by a sphere.
#[derive(Clone, Debug)]
pub struct CapsuleShape {
    pub convex_shape: ConvexShape,
    half_height_of_cylinder: f32,
    radius: f32,
}

impl CapsuleShape {
    pub fn new(
        convex_shape: ConvexShape,
        half_height_of_cylinder: f32,
        radius: f32,
    ) -> Result<Self, ShapeError> {
        if !half_height_of_cylinder.is_finite() || half_height_of_cylinder < 0.0 {
            return Err(ShapeError::InvalidHalfHeight(half_height_of_cylinder));
        }
        if !radius.is_finite() || radius <= 0.0 {
            return Err(ShapeError::InvalidRadius(radius));
        }

        Ok(Self {
            convex_shape,
            half_height_of_cylinder,
            radius,
        })
    }

    #[inline]
    #[must_use]
    pub const fn get_half_height_of_cylinder(&self) -> f32 {
        self.half_height_of_cylinder
    }

    #[inline]
    #[must_use]
    pub const fn get_radius(&self) -> f32 {
        self.radius
    }

    #[inline]
    fn scaled(&self, scale: Vec3A) -> (f32, f32) {
        debug_assert!(is_uniform_scale(scale), "capsules only support uniform scale");
        let s = scale.x.abs();
        (self.half_height_of_cylinder * s, self.radius * s)
    }

    #[must_use]
    pub fn get_support(&self, mode: SupportMode, scale: Vec3A) -> Support {
        let (half_height, radius) = self.scaled(scale);
        Support::new(SupportCore::Segment { half_height }, radius, mode)
    }

    pub fn get_supporting_face(&self, direction: Vec3A, scale: Vec3A, face: &mut SupportingFace) {
        let (half_height, radius) = self.scaled(scale);

        let Some(dir) = direction.try_normalize() else {
            return;
        };

        let offset = radius * dir;
        let top = Vec3A::new(0.0, half_height, 0.0) + offset;
        let bottom = Vec3A::new(0.0, -half_height, 0.0) + offset;

        // Only the flat side of the cylinder counts as a face
        if (top.dot(dir) - bottom.dot(dir)).abs() < CAPSULE_PROJECTION_SLOP {
            face.push(top);
            face.push(bottom);
        }
    }

    #[inline]
    #[must_use]
    pub fn get_local_bounds(&self) -> Aabb {
        Aabb::from_half_extent(Vec3A::new(
            self.radius,
            self.half_height_of_cylinder + self.radius,
            self.radius,
        ))
    }

    #[must_use]
    pub fn get_volume(&self) -> f32 {
        let r2 = self.radius * self.radius;
        PI * r2 * (2.0 * self.half_height_of_cylinder) + 4.0 / 3.0 * PI * r2 * self.radius
    }

    #[inline]
    #[must_use]
    pub const fn get_inner_radius(&self) -> f32 {
        self.radius
    }

    pub(crate) fn save_fields<W: Write>(&self, stream: &mut W) -> io::Result<()> {
        self.half_height_of_cylinder.to_stream(stream)?;
        self.radius.to_stream(stream)
    }

    pub(crate) fn restore_fields<R: Read>(
        convex_shape: ConvexShape,
        stream: &mut R,
    ) -> Result<Self, StreamError> {
        let half_height_of_cylinder = f32::from_stream(stream)?;
        let radius = f32::from_stream(stream)?;
        Ok(Self::new(convex_shape, half_height_of_cylinder, radius)?)
    }
}
