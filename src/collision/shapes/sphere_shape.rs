use std::{
    f32::consts::PI,
    io::{self, Read, Write},
    mem,
};

use glam::Vec3A;

use super::{
    convex_shape::{ConvexShape, ConvexShapeSettings, ConvexShapes, ShapeResult},
    stream::{FromStream, ToStream},
    submerged_volume::SubmergedVolume,
    support::{Support, SupportCore, SupportMode},
};
use crate::{
    error::{ShapeError, StreamError},
    linear_math::{aabb_util_2::Aabb, is_uniform_scale, plane::Plane},
};

#[derive(Clone, Debug, PartialEq)]
pub struct SphereShapeSettings {
    pub radius: f32,
    pub base: ConvexShapeSettings,
}

impl SphereShapeSettings {
    #[must_use]
    pub fn new(radius: f32) -> Self {
        Self {
            radius,
            base: ConvexShapeSettings::default(),
        }
    }

    pub fn create(&self) -> ShapeResult {
        let base = self.base.create_base()?;
        SphereShape::new(base, self.radius).map(ConvexShapes::Sphere)
    }
}

/// A sphere is a point core with its whole radius as convex radius.
#[derive(Clone, Debug)]
pub struct SphereShape {
    pub convex_shape: ConvexShape,
    radius: f32,
}

impl SphereShape {
    pub fn new(convex_shape: ConvexShape, radius: f32) -> Result<Self, ShapeError> {
        if !radius.is_finite() || radius <= 0.0 {
            return Err(ShapeError::InvalidRadius(radius));
        }

        Ok(Self {
            convex_shape,
            radius,
        })
    }

    #[inline]
    #[must_use]
    pub const fn get_radius(&self) -> f32 {
        self.radius
    }

    #[inline]
    fn scaled_radius(&self, scale: Vec3A) -> f32 {
        debug_assert!(is_uniform_scale(scale), "spheres only support uniform scale");
        self.radius * scale.x.abs()
    }

    #[must_use]
    pub fn get_support(&self, mode: SupportMode, scale: Vec3A) -> Support {
        Support::new(SupportCore::Point, self.scaled_radius(scale), mode)
    }

    #[inline]
    #[must_use]
    pub fn get_local_bounds(&self) -> Aabb {
        Aabb::from_half_extent(Vec3A::splat(self.radius))
    }

    #[inline]
    #[must_use]
    pub fn get_volume(&self) -> f32 {
        4.0 / 3.0 * PI * self.radius.powi(3)
    }

    #[inline]
    #[must_use]
    pub const fn get_inner_radius(&self) -> f32 {
        self.radius
    }

    /// Analytic ray cast against the solid sphere, a ray starting inside hits at 0.
    pub fn cast_ray(&self, origin: Vec3A, direction: Vec3A, max_fraction: f32) -> Option<f32> {
        let radius_sq = self.radius * self.radius;

        let c = origin.length_squared() - radius_sq;
        if c <= 0.0 {
            return Some(0.0);
        }

        let a = direction.length_squared();
        if a < f32::EPSILON * f32::EPSILON {
            return None;
        }

        let b = 2.0 * origin.dot(direction);
        let discriminant = b * b - 4.0 * a * c;
        if discriminant < 0.0 {
            return None;
        }

        let sqrt_disc = discriminant.sqrt();
        let mut t0 = (-b - sqrt_disc) / (2.0 * a);
        let mut t1 = (-b + sqrt_disc) / (2.0 * a);
        if t0 > t1 {
            mem::swap(&mut t0, &mut t1);
        }

        // The origin is outside, so only the entry can be a hit
        if t0 >= 0.0 && t0 <= max_fraction {
            Some(t0)
        } else {
            None
        }
    }

    /// Spherical cap below `plane`, the sphere is centered at `center`.
    pub fn get_submerged_volume(&self, center: Vec3A, scale: Vec3A, plane: &Plane) -> SubmergedVolume {
        let radius = self.scaled_radius(scale);
        let total_volume = 4.0 / 3.0 * PI * radius.powi(3);

        let distance = plane.signed_distance(center);
        if distance >= radius {
            return SubmergedVolume {
                total_volume,
                submerged_volume: 0.0,
                center_of_buoyancy: Vec3A::ZERO,
            };
        }

        if distance <= -radius {
            return SubmergedVolume {
                total_volume,
                submerged_volume: total_volume,
                center_of_buoyancy: center,
            };
        }

        // Height of the cap below the plane
        let h = radius - distance;
        let submerged_volume = PI * h * h * (3.0 * radius - h) / 3.0;
        let centroid_offset = 3.0 * (2.0 * radius - h).powi(2) / (4.0 * (3.0 * radius - h));

        SubmergedVolume {
            total_volume,
            submerged_volume,
            center_of_buoyancy: center - plane.normal * centroid_offset,
        }
    }

    pub(crate) fn save_fields<W: Write>(&self, stream: &mut W) -> io::Result<()> {
        self.radius.to_stream(stream)
    }

    pub(crate) fn restore_fields<R: Read>(
        convex_shape: ConvexShape,
        stream: &mut R,
    ) -> Result<Self, StreamError> {
        let radius = f32::from_stream(stream)?;
        Ok(Self::new(convex_shape, radius)?)
    }
}
