use std::{
    io::{self, Read, Write},
    sync::Arc,
};

use glam::{Affine3A, Quat, Vec3A};
use log::trace;

use super::{
    box_shape::BoxShape,
    capsule_shape::CapsuleShape,
    convex_hull_shape::ConvexHullShape,
    get_triangles::{GetTrianglesContext, TriangleSource},
    physics_material::{PhysicsMaterial, PhysicsMaterialList},
    scaled_shape::{MAX_SCALED_NESTING, ScaledShape},
    sphere_shape::SphereShape,
    stream::{FromStream, ShapeType, ToStream},
    submerged_volume::{SubmergedVolume, integrate_below_plane},
    support::{Support, SupportBuffer, SupportMode, SupportingFace},
};
use crate::{
    collision::{
        collector::CollisionCollector,
        collide_shape::{CollidePointResult, DEFAULT_COLLISION_TOLERANCE, ShapeFilter},
        dispatch::convex_convex_collision_algorithm::{ShapeInstance, cast_convex_vs_convex},
        narrowphase::gjk::GjkClosestPoint,
        ray_cast::{BackFaceMode, RayCast, RayCastResult, RayCastSettings},
        shape_cast::{ShapeCast, ShapeCastResult, ShapeCastSettings},
        shapes::support::PointSupport,
        sub_shape_id::SubShapeIdCreator,
    },
    error::{ShapeError, StreamError},
    linear_math::{
        aabb_util_2::{Aabb, transform_aabb},
        is_inside_out, is_uniform_scale, is_valid_scale,
        plane::Plane,
    },
};

#[cfg(feature = "debug-renderer")]
use crate::debug_renderer::SupportGeometryCache;

pub const DEFAULT_DENSITY: f32 = 1000.0;
pub const DEFAULT_CONVEX_RADIUS: f32 = 0.05;

pub type ShapeResult = Result<ConvexShapes, ShapeError>;

/// Settings every convex shape shares.
#[derive(Clone, Debug, PartialEq)]
pub struct ConvexShapeSettings {
    /// `None` resolves to [`PhysicsMaterial::default_material`].
    pub material: Option<Arc<PhysicsMaterial>>,
    pub density: f32,
}

impl Default for ConvexShapeSettings {
    fn default() -> Self {
        Self {
            material: None,
            density: DEFAULT_DENSITY,
        }
    }
}

impl ConvexShapeSettings {
    #[must_use]
    pub fn with_material(mut self, material: Arc<PhysicsMaterial>) -> Self {
        self.material = Some(material);
        self
    }

    #[must_use]
    pub fn with_density(mut self, density: f32) -> Self {
        self.density = density;
        self
    }

    pub(crate) fn create_base(&self) -> Result<ConvexShape, ShapeError> {
        ConvexShape::new(self.material.clone(), self.density)
    }
}

/// Material and density, embedded in every concrete shape.
#[derive(Clone, Debug)]
pub struct ConvexShape {
    material: Option<Arc<PhysicsMaterial>>,
    density: f32,
    #[cfg(feature = "debug-renderer")]
    pub(crate) debug_geometry: SupportGeometryCache,
}

impl Default for ConvexShape {
    fn default() -> Self {
        Self {
            material: None,
            density: DEFAULT_DENSITY,
            #[cfg(feature = "debug-renderer")]
            debug_geometry: SupportGeometryCache::default(),
        }
    }
}

impl ConvexShape {
    pub fn new(material: Option<Arc<PhysicsMaterial>>, density: f32) -> Result<Self, ShapeError> {
        if !density.is_finite() || density <= 0.0 {
            return Err(ShapeError::InvalidDensity(density));
        }

        Ok(Self {
            material,
            density,
            ..Default::default()
        })
    }

    #[inline]
    pub fn get_material(&self) -> &Arc<PhysicsMaterial> {
        self.material
            .as_ref()
            .unwrap_or_else(|| PhysicsMaterial::default_material())
    }

    /// The material as it was set, `None` when the default is used.
    #[inline]
    pub const fn material(&self) -> Option<&Arc<PhysicsMaterial>> {
        self.material.as_ref()
    }

    #[inline]
    pub fn set_material(&mut self, material: Option<Arc<PhysicsMaterial>>) {
        self.material = material;
    }

    #[inline]
    pub const fn get_density(&self) -> f32 {
        self.density
    }

    pub fn set_density(&mut self, density: f32) -> Result<(), ShapeError> {
        if !density.is_finite() || density <= 0.0 {
            return Err(ShapeError::InvalidDensity(density));
        }

        self.density = density;
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub enum ConvexShapes {
    Box(BoxShape),
    Sphere(SphereShape),
    Capsule(CapsuleShape),
    ConvexHull(ConvexHullShape),
    Scaled(ScaledShape),
}

impl ConvexShapes {
    #[must_use]
    pub const fn get_shape_type(&self) -> ShapeType {
        match self {
            Self::Box(_) => ShapeType::Box,
            Self::Sphere(_) => ShapeType::Sphere,
            Self::Capsule(_) => ShapeType::Capsule,
            Self::ConvexHull(_) => ShapeType::ConvexHull,
            Self::Scaled(_) => ShapeType::Scaled,
        }
    }

    #[must_use]
    pub const fn base(&self) -> &ConvexShape {
        match self {
            Self::Box(shape) => &shape.convex_shape,
            Self::Sphere(shape) => &shape.convex_shape,
            Self::Capsule(shape) => &shape.convex_shape,
            Self::ConvexHull(shape) => &shape.convex_shape,
            Self::Scaled(shape) => &shape.convex_shape,
        }
    }

    pub const fn base_mut(&mut self) -> &mut ConvexShape {
        match self {
            Self::Box(shape) => &mut shape.convex_shape,
            Self::Sphere(shape) => &mut shape.convex_shape,
            Self::Capsule(shape) => &mut shape.convex_shape,
            Self::ConvexHull(shape) => &mut shape.convex_shape,
            Self::Scaled(shape) => &mut shape.convex_shape,
        }
    }

    #[inline]
    pub fn get_material(&self) -> &Arc<PhysicsMaterial> {
        self.base().get_material()
    }

    #[inline]
    pub fn set_material(&mut self, material: Option<Arc<PhysicsMaterial>>) {
        self.base_mut().set_material(material);
    }

    #[inline]
    #[must_use]
    pub const fn get_density(&self) -> f32 {
        self.base().get_density()
    }

    #[inline]
    pub fn set_density(&mut self, density: f32) -> Result<(), ShapeError> {
        self.base_mut().set_density(density)
    }

    /// Convex shapes are leaves, they never add bits to a sub shape id.
    #[inline]
    #[must_use]
    pub const fn get_sub_shape_id_bits_recursive(&self) -> u32 {
        0
    }

    /// Offset of the center of mass from the shape origin, all queries are relative to it.
    #[must_use]
    pub fn get_center_of_mass(&self) -> Vec3A {
        match self {
            Self::ConvexHull(hull) => hull.get_center_of_mass(),
            Self::Scaled(scaled) => scaled.get_inner_shape().get_center_of_mass() * scaled.get_scale(),
            Self::Box(_) | Self::Sphere(_) | Self::Capsule(_) => Vec3A::ZERO,
        }
    }

    /// True when the shape can be queried with `scale`.
    #[must_use]
    pub fn is_valid_scale(&self, scale: Vec3A) -> bool {
        if !is_valid_scale(scale) {
            return false;
        }

        match self {
            Self::Sphere(_) | Self::Capsule(_) => is_uniform_scale(scale),
            Self::Scaled(scaled) => scaled.get_inner_shape().is_valid_scale(scale * scaled.get_scale()),
            Self::Box(_) | Self::ConvexHull(_) => true,
        }
    }

    /// Bounds relative to the center of mass.
    #[must_use]
    pub fn get_local_bounds(&self, scale: Vec3A) -> Aabb {
        let unscaled = match self {
            Self::Box(shape) => shape.get_local_bounds(),
            Self::Sphere(shape) => shape.get_local_bounds(),
            Self::Capsule(shape) => shape.get_local_bounds(),
            Self::ConvexHull(shape) => shape.get_local_bounds(),
            Self::Scaled(scaled) => {
                return scaled.get_inner_shape().get_local_bounds(scale * scaled.get_scale());
            }
        };

        let a = unscaled.min * scale;
        let b = unscaled.max * scale;
        Aabb::new(a.min(b), a.max(b))
    }

    #[must_use]
    pub fn get_world_space_bounds(&self, center_of_mass_transform: &Affine3A, scale: Vec3A) -> Aabb {
        let local = self.get_local_bounds(scale);
        let t = *center_of_mass_transform * Affine3A::from_translation(local.center().into());
        transform_aabb(local.extent(), 0.0, &t)
    }

    /// Radius of the largest sphere around the center of mass that fits inside the shape.
    #[must_use]
    pub fn get_inner_radius(&self) -> f32 {
        match self {
            Self::Box(shape) => shape.get_inner_radius(),
            Self::Sphere(shape) => shape.get_inner_radius(),
            Self::Capsule(shape) => shape.get_inner_radius(),
            Self::ConvexHull(shape) => shape.get_inner_radius(),
            Self::Scaled(scaled) => {
                scaled.get_inner_shape().get_inner_radius() * scaled.get_scale().abs().min_element()
            }
        }
    }

    #[must_use]
    pub fn get_volume(&self) -> f32 {
        match self {
            Self::Box(shape) => shape.get_volume(),
            Self::Sphere(shape) => shape.get_volume(),
            Self::Capsule(shape) => shape.get_volume(),
            Self::ConvexHull(shape) => shape.get_volume(),
            Self::Scaled(scaled) => {
                let s = scaled.get_scale();
                scaled.get_inner_shape().get_volume() * (s.x * s.y * s.z).abs()
            }
        }
    }

    #[inline]
    #[must_use]
    pub fn get_mass(&self) -> f32 {
        self.get_volume() * self.get_density()
    }

    pub(crate) fn make_support(&self, mode: SupportMode, scale: Vec3A) -> Support {
        match self {
            Self::Box(shape) => shape.get_support(mode, scale),
            Self::Sphere(shape) => shape.get_support(mode, scale),
            Self::Capsule(shape) => shape.get_support(mode, scale),
            Self::ConvexHull(shape) => shape.get_support(mode, scale),
            Self::Scaled(scaled) => scaled
                .get_inner_shape()
                .make_support(mode, scale * scaled.get_scale()),
        }
    }

    /// Builds the support object for this shape under `scale` inside `buffer`.
    ///
    /// The result borrows the buffer, building another support object into it ends the
    /// life of this one.
    pub fn get_support_function<'b>(
        &self,
        mode: SupportMode,
        buffer: &'b mut SupportBuffer,
        scale: Vec3A,
    ) -> &'b Support {
        debug_assert!(self.is_valid_scale(scale), "invalid scale {scale}");
        buffer.emplace(self.make_support(mode, scale))
    }

    /// Replaces `face` with the vertices of the face most aligned with `direction`,
    /// relative to the center of mass. Smooth shapes leave it empty.
    pub fn get_supporting_face(&self, direction: Vec3A, scale: Vec3A, face: &mut SupportingFace) {
        face.clear();
        self.append_supporting_face(direction, scale, face);
    }

    fn append_supporting_face(&self, direction: Vec3A, scale: Vec3A, face: &mut SupportingFace) {
        match self {
            Self::Box(shape) => shape.get_supporting_face(direction, scale, face),
            Self::Capsule(shape) => shape.get_supporting_face(direction, scale, face),
            Self::ConvexHull(shape) => shape.get_supporting_face(direction, scale, face),
            Self::Sphere(_) => {}
            Self::Scaled(scaled) => {
                scaled
                    .get_inner_shape()
                    .append_supporting_face(direction, scale * scaled.get_scale(), face);
            }
        }
    }

    /// Fraction along `origin + t * direction` where the ray enters the solid shape.
    fn cast_ray_fraction(&self, origin: Vec3A, direction: Vec3A, max_fraction: f32) -> Option<f32> {
        match self {
            Self::Sphere(sphere) => sphere.cast_ray(origin, direction, max_fraction),
            Self::Scaled(scaled) => {
                let inv_scale = scaled.get_scale().recip();
                scaled.get_inner_shape().cast_ray_fraction(
                    origin * inv_scale,
                    direction * inv_scale,
                    max_fraction,
                )
            }
            _ => {
                let mut buffer = SupportBuffer::new();
                let support =
                    self.get_support_function(SupportMode::IncludeConvexRadius, &mut buffer, Vec3A::ONE);
                GjkClosestPoint::new().cast_ray(
                    origin,
                    direction,
                    DEFAULT_COLLISION_TOLERANCE,
                    support,
                    max_fraction,
                )
            }
        }
    }

    /// Casts a ray given relative to the center of mass and keeps it in `hit` when it is
    /// closer than the hit already there.
    pub fn cast_ray(
        &self,
        ray: &RayCast,
        sub_shape_id_creator: SubShapeIdCreator,
        hit: &mut RayCastResult,
    ) -> bool {
        debug_assert!(ray.direction != Vec3A::ZERO, "ray direction must not be zero");
        if ray.direction == Vec3A::ZERO {
            return false;
        }

        match self.cast_ray_fraction(ray.origin, ray.direction, hit.fraction) {
            Some(fraction) if fraction < hit.fraction => {
                hit.fraction = fraction;
                hit.sub_shape_id = sub_shape_id_creator.id();
                true
            }
            _ => false,
        }
    }

    /// Casts a ray relative to the center of mass and reports hits in increasing
    /// fraction order, the exit point only when back faces are requested.
    pub fn cast_ray_with_collector<C>(
        &self,
        ray: &RayCast,
        settings: &RayCastSettings,
        sub_shape_id_creator: SubShapeIdCreator,
        collector: &mut C,
    ) where
        C: CollisionCollector<RayCastResult>,
    {
        debug_assert!(ray.direction != Vec3A::ZERO, "ray direction must not be zero");
        if ray.direction == Vec3A::ZERO || collector.should_early_out() {
            return;
        }

        let sub_shape_id = sub_shape_id_creator.id();
        let max_fraction = collector.early_out_fraction().min(1.0);

        let starts_inside = self.contains_point(ray.origin);
        if starts_inside {
            if settings.treat_convex_as_solid {
                let hit = RayCastResult {
                    fraction: 0.0,
                    sub_shape_id,
                };
                // Solid shapes have no exit to report
                let _ = collector.add_hit(hit);
                return;
            }
        } else {
            let Some(fraction) = self.cast_ray_fraction(ray.origin, ray.direction, max_fraction) else {
                trace!("ray misses the shape");
                return;
            };

            let hit = RayCastResult {
                fraction,
                sub_shape_id,
            };
            if collector.add_hit(hit).is_break() {
                return;
            }
        }

        if settings.back_face_mode == BackFaceMode::CollideWithBackFaces {
            // Leaving the shape is entering it when walking the ray backwards
            let end = ray.point_on_ray(1.0);
            if let Some(reverse) = self.cast_ray_fraction(end, -ray.direction, 1.0) {
                let fraction = 1.0 - reverse;
                if reverse > 0.0 && fraction < collector.early_out_fraction() {
                    let _ = collector.add_hit(RayCastResult {
                        fraction,
                        sub_shape_id,
                    });
                }
            }
        }
    }

    fn contains_point(&self, point: Vec3A) -> bool {
        let mut buffer = SupportBuffer::new();
        let support = self.get_support_function(SupportMode::IncludeConvexRadius, &mut buffer, Vec3A::ONE);
        let mut v = point;
        GjkClosestPoint::new().intersects(
            &PointSupport { point },
            support,
            DEFAULT_COLLISION_TOLERANCE,
            &mut v,
        )
    }

    /// Reports `point` (relative to the center of mass) to the collector when it is inside.
    pub fn collide_point<C>(&self, point: Vec3A, sub_shape_id_creator: SubShapeIdCreator, collector: &mut C)
    where
        C: CollisionCollector<CollidePointResult>,
    {
        if collector.should_early_out() {
            return;
        }

        if self.contains_point(point) {
            let _ = collector.add_hit(CollidePointResult {
                sub_shape_id: sub_shape_id_creator.id(),
            });
        }
    }

    /// Sweeps `shape_cast` (in world space) against this shape placed at
    /// `center_of_mass_transform` with `scale`.
    #[allow(clippy::too_many_arguments)]
    pub fn cast_shape<C, F>(
        &self,
        shape_cast: &ShapeCast,
        settings: &ShapeCastSettings,
        scale: Vec3A,
        center_of_mass_transform: &Affine3A,
        sub_shape_id_creator1: SubShapeIdCreator,
        sub_shape_id_creator2: SubShapeIdCreator,
        filter: &F,
        collector: &mut C,
    ) where
        C: CollisionCollector<ShapeCastResult>,
        F: ShapeFilter + ?Sized,
    {
        let target = ShapeInstance {
            shape: self,
            scale,
            center_of_mass_transform: *center_of_mass_transform,
            sub_shape_id_creator: sub_shape_id_creator2,
        };
        cast_convex_vs_convex(shape_cast, settings, sub_shape_id_creator1, &target, filter, collector);
    }

    fn triangle_source(&self, scale: Vec3A) -> TriangleSource {
        let faces = match self {
            Self::Box(shape) => shape.get_surface_triangles(scale),
            Self::ConvexHull(shape) => shape.get_surface_triangles(scale),
            Self::Sphere(_) | Self::Capsule(_) => {
                let support = self.make_support(SupportMode::IncludeConvexRadius, scale);
                return TriangleSource::SupportMapped(Box::new(support));
            }
            Self::Scaled(scaled) => {
                return scaled.get_inner_shape().triangle_source(scale * scaled.get_scale());
            }
        };

        if is_inside_out(scale) {
            TriangleSource::Faces(faces.into_iter().map(|[a, b, c]| [a, c, b]).collect())
        } else {
            TriangleSource::Faces(faces)
        }
    }

    /// Starts a traversal of the surface triangles that overlap `bounds` (world space).
    #[must_use]
    pub fn get_triangles_start(
        &self,
        bounds: &Aabb,
        position_com: Vec3A,
        rotation: Quat,
        scale: Vec3A,
    ) -> GetTrianglesContext {
        GetTrianglesContext::new(bounds, position_com, rotation, self.triangle_source(scale))
    }

    /// Fills `out` with the next triangles and `materials` with their material, returns how
    /// many were written. 0 means the traversal is done.
    pub fn get_triangles_next(
        &self,
        context: &mut GetTrianglesContext,
        out: &mut [[Vec3A; 3]],
        materials: Option<&mut [Arc<PhysicsMaterial>]>,
    ) -> usize {
        let count = context.fill(out);

        if let Some(materials) = materials {
            let material = self.get_material();
            for slot in materials.iter_mut().take(count) {
                slot.clone_from(material);
            }
        }

        count
    }

    /// Volume of the shape below `plane` and its centroid, in world space.
    #[must_use]
    pub fn get_submerged_volume(
        &self,
        center_of_mass_transform: &Affine3A,
        scale: Vec3A,
        plane: &Plane,
    ) -> SubmergedVolume {
        match self {
            Self::Sphere(sphere) => {
                sphere.get_submerged_volume(center_of_mass_transform.translation, scale, plane)
            }
            Self::Scaled(scaled) => scaled.get_inner_shape().get_submerged_volume(
                center_of_mass_transform,
                scale * scaled.get_scale(),
                plane,
            ),
            _ => self.get_submerged_volume_from_surface(center_of_mass_transform, scale, plane),
        }
    }

    fn get_submerged_volume_from_surface(
        &self,
        center_of_mass_transform: &Affine3A,
        scale: Vec3A,
        plane: &Plane,
    ) -> SubmergedVolume {
        let total_volume = self.get_volume() * (scale.x * scale.y * scale.z).abs();
        let position = center_of_mass_transform.translation;

        let bounds = self.get_world_space_bounds(center_of_mass_transform, scale);
        let (mut min_dist, mut max_dist) = (f32::MAX, f32::MIN);
        for i in 0..8 {
            let corner = Vec3A::select(
                glam::BVec3A::new(i & 1 != 0, i & 2 != 0, i & 4 != 0),
                bounds.max,
                bounds.min,
            );
            let d = plane.signed_distance(corner);
            min_dist = min_dist.min(d);
            max_dist = max_dist.max(d);
        }

        if min_dist >= 0.0 {
            return SubmergedVolume {
                total_volume,
                ..Default::default()
            };
        }

        if max_dist <= 0.0 {
            return SubmergedVolume {
                total_volume,
                submerged_volume: total_volume,
                center_of_buoyancy: position,
            };
        }

        let rotation = Quat::from_mat3a(&center_of_mass_transform.matrix3);
        let mut context = self.get_triangles_start(&Aabb::EVERYTHING, position, rotation, scale);

        let mut triangles = Vec::new();
        let mut chunk = [[Vec3A::ZERO; 3]; 32];
        loop {
            let count = context.fill(&mut chunk);
            if count == 0 {
                break;
            }
            triangles.extend_from_slice(&chunk[..count]);
        }

        let (submerged_volume, center_of_buoyancy) = integrate_below_plane(triangles, plane, position);
        SubmergedVolume {
            total_volume,
            submerged_volume: submerged_volume.min(total_volume),
            center_of_buoyancy,
        }
    }

    /// Writes the shape record: type tag, density and the shape's own fields.
    pub fn save_binary_state<W: Write>(&self, stream: &mut W) -> io::Result<()> {
        self.get_shape_type().write(stream)?;
        self.get_density().to_stream(stream)?;

        match self {
            Self::Box(shape) => shape.save_fields(stream),
            Self::Sphere(shape) => shape.save_fields(stream),
            Self::Capsule(shape) => shape.save_fields(stream),
            Self::ConvexHull(shape) => shape.save_fields(stream),
            Self::Scaled(shape) => shape.save_fields(stream),
        }
    }

    /// Reads a record written by [`Self::save_binary_state`], materials are left at default.
    pub fn restore_binary_state<R: Read>(stream: &mut R) -> Result<Self, StreamError> {
        Self::restore_nested(stream, 0)
    }

    pub(crate) fn restore_nested<R: Read>(stream: &mut R, nesting: usize) -> Result<Self, StreamError> {
        let shape_type = ShapeType::read(stream)?;
        let density = f32::from_stream(stream)?;
        let base = ConvexShape::new(None, density)?;

        Ok(match shape_type {
            ShapeType::Box => Self::Box(BoxShape::restore_fields(base, stream)?),
            ShapeType::Sphere => Self::Sphere(SphereShape::restore_fields(base, stream)?),
            ShapeType::Capsule => Self::Capsule(CapsuleShape::restore_fields(base, stream)?),
            ShapeType::ConvexHull => Self::ConvexHull(ConvexHullShape::restore_fields(base, stream)?),
            ShapeType::Scaled => {
                if nesting >= MAX_SCALED_NESTING {
                    return Err(ShapeError::NestingTooDeep(MAX_SCALED_NESTING).into());
                }
                Self::Scaled(ScaledShape::restore_fields(base, stream, nesting)?)
            }
        })
    }

    /// Number of scaled shapes wrapped around each other, starting at this one.
    #[must_use]
    pub fn get_scaled_nesting(&self) -> usize {
        match self {
            Self::Scaled(scaled) => 1 + scaled.get_inner_shape().get_scaled_nesting(),
            _ => 0,
        }
    }

    /// Number of entries `save_material_state` appends.
    #[must_use]
    pub fn material_count(&self) -> usize {
        match self {
            Self::Scaled(scaled) => 1 + scaled.get_inner_shape().material_count(),
            _ => 1,
        }
    }

    /// Appends the materials this shape references, in a fixed order.
    pub fn save_material_state(&self, materials: &mut PhysicsMaterialList) {
        materials.push(self.base().material().cloned());
        if let Self::Scaled(scaled) = self {
            scaled.get_inner_shape().save_material_state(materials);
        }
    }

    /// Second pass of restoring: hands back the materials in `save_material_state` order.
    pub fn restore_material_state(
        &mut self,
        materials: &[Option<Arc<PhysicsMaterial>>],
    ) -> Result<(), StreamError> {
        let expected = self.material_count();
        if materials.len() != expected {
            return Err(StreamError::MaterialCountMismatch {
                expected,
                got: materials.len(),
            });
        }

        self.set_material(materials[0].clone());
        if let Self::Scaled(scaled) = self {
            scaled.inner_mut().restore_material_state(&materials[1..])?;
        }

        Ok(())
    }
}
