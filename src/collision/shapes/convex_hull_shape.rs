use std::io::{self, Read, Write};

use arrayvec::ArrayVec;
use glam::{Mat3A, Vec3A};
use log::warn;

use super::{
    convex_shape::{
        ConvexShape, ConvexShapeSettings, ConvexShapes, DEFAULT_CONVEX_RADIUS, ShapeResult,
    },
    stream::{FromStream, ToStream},
    support::{Support, SupportCore, SupportMode, SupportingFace},
};
use crate::{
    collision::narrowphase::polytope::ConvexPolytope,
    error::{ShapeError, StreamError},
    linear_math::{aabb_util_2::Aabb, is_inside_out, plane::Plane, plane_space},
};

pub const MAX_POINTS_IN_HULL: usize = 256;
pub const DEFAULT_HULL_TOLERANCE: f32 = 1.0e-3;

/// Faces whose normals are closer than this are merged into one polygon.
const COPLANAR_NORMAL_TOLERANCE: f32 = 1.0e-4;

#[derive(Clone, Debug, PartialEq)]
pub struct ConvexHullShapeSettings {
    pub points: Vec<Vec3A>,
    /// Upper bound for the convex radius, the hull may pick a smaller one.
    pub max_convex_radius: f32,
    /// Points closer than this to the hull are dropped while building it.
    pub hull_tolerance: f32,
    pub base: ConvexShapeSettings,
}

impl ConvexHullShapeSettings {
    #[must_use]
    pub fn new(points: Vec<Vec3A>) -> Self {
        Self {
            points,
            max_convex_radius: DEFAULT_CONVEX_RADIUS,
            hull_tolerance: DEFAULT_HULL_TOLERANCE,
            base: ConvexShapeSettings::default(),
        }
    }

    pub fn create(&self) -> ShapeResult {
        let base = self.base.create_base()?;
        ConvexHullShape::new(base, &self.points, self.max_convex_radius, self.hull_tolerance)
            .map(ConvexShapes::ConvexHull)
    }
}

/// Flat polygon of the hull, vertex indices wound counter clockwise seen from outside.
#[derive(Clone, Debug, PartialEq)]
pub struct HullFace {
    pub vertices: Vec<u8>,
    pub plane: Plane,
}

#[derive(Clone, Debug)]
pub struct ConvexHullShape {
    pub convex_shape: ConvexShape,
    /// Hull vertices relative to the center of mass.
    points: Vec<Vec3A>,
    faces: Vec<HullFace>,
    /// Per vertex, where it moves when every adjacent face plane is pushed in by one unit.
    core_offsets: Vec<Vec3A>,
    center_of_mass: Vec3A,
    convex_radius: f32,
    inner_radius: f32,
    volume: f32,
}

impl ConvexHullShape {
    pub fn new(
        convex_shape: ConvexShape,
        input: &[Vec3A],
        max_convex_radius: f32,
        hull_tolerance: f32,
    ) -> Result<Self, ShapeError> {
        if input.len() < 4 {
            return Err(ShapeError::TooFewPoints(input.len()));
        }
        if input.len() > MAX_POINTS_IN_HULL {
            return Err(ShapeError::TooManyPoints {
                count: input.len(),
                max: MAX_POINTS_IN_HULL,
            });
        }
        if !max_convex_radius.is_finite() || max_convex_radius < 0.0 {
            return Err(ShapeError::InvalidConvexRadius {
                radius: max_convex_radius,
                max: f32::MAX,
            });
        }

        let polytope = ConvexPolytope::build(input, hull_tolerance)?;

        let used = polytope.vertex_indices();
        let points: Vec<Vec3A> = used.iter().map(|&i| polytope.points()[i]).collect();
        let triangles: Vec<[usize; 3]> = polytope
            .faces()
            .map(|f| f.vertices.map(|v| used.binary_search(&v).unwrap_or(0)))
            .collect();

        let (volume, center_of_mass) = volume_and_center_of_mass(&points, &triangles);
        if volume <= f32::EPSILON {
            return Err(ShapeError::DegenerateHull("hull has no volume"));
        }

        let points: Vec<Vec3A> = points.iter().map(|&p| p - center_of_mass).collect();
        let faces = merge_coplanar_faces(&points, &triangles, hull_tolerance);

        Self::from_parts(convex_shape, points, faces, center_of_mass, max_convex_radius, volume)
    }

    fn from_parts(
        convex_shape: ConvexShape,
        points: Vec<Vec3A>,
        faces: Vec<HullFace>,
        center_of_mass: Vec3A,
        max_convex_radius: f32,
        volume: f32,
    ) -> Result<Self, ShapeError> {
        let inner_radius = faces
            .iter()
            .map(|f| -f.plane.constant)
            .fold(f32::MAX, f32::min);
        if inner_radius <= 0.0 {
            return Err(ShapeError::DegenerateHull("center of mass is not inside the hull"));
        }

        let core_offsets: Vec<Vec3A> = (0..points.len())
            .map(|i| core_offset(&points, &faces, i, inner_radius))
            .collect();

        // Keep the shrunken core from collapsing
        let convex_radius = core_offsets
            .iter()
            .map(|offset| inner_radius / offset.length().max(1.0))
            .fold(max_convex_radius.min(0.5 * inner_radius), f32::min);

        Ok(Self {
            convex_shape,
            points,
            faces,
            core_offsets,
            center_of_mass,
            convex_radius,
            inner_radius,
            volume,
        })
    }

    /// Hull vertices relative to the center of mass.
    #[inline]
    pub fn get_points(&self) -> &[Vec3A] {
        &self.points
    }

    #[inline]
    pub fn get_faces(&self) -> &[HullFace] {
        &self.faces
    }

    #[inline]
    #[must_use]
    pub const fn get_center_of_mass(&self) -> Vec3A {
        self.center_of_mass
    }

    #[inline]
    #[must_use]
    pub const fn get_convex_radius(&self) -> f32 {
        self.convex_radius
    }

    #[inline]
    #[must_use]
    pub const fn get_inner_radius(&self) -> f32 {
        self.inner_radius
    }

    #[inline]
    #[must_use]
    pub const fn get_volume(&self) -> f32 {
        self.volume
    }

    /// The inclusive support is the hull itself. The core is the hull with every face
    /// plane pushed in by the convex radius.
    #[must_use]
    pub fn get_support(&self, mode: SupportMode, scale: Vec3A) -> Support {
        match mode {
            SupportMode::IncludeConvexRadius => {
                let hull = self.points.iter().map(|&p| p * scale).collect();
                Support::new(SupportCore::Hull(hull), 0.0, mode)
            }
            SupportMode::ExcludeConvexRadius => {
                let core = self
                    .points
                    .iter()
                    .zip(&self.core_offsets)
                    .map(|(&p, &offset)| (p + self.convex_radius * offset) * scale)
                    .collect();

                // Non uniform scale moves the planes by at least the smallest factor
                let convex_radius = self.convex_radius * scale.abs().min_element();
                Support::new(SupportCore::Hull(core), convex_radius, mode)
            }
        }
    }

    pub fn get_supporting_face(&self, direction: Vec3A, scale: Vec3A, face: &mut SupportingFace) {
        let inv_scale = scale.recip();

        let Some(best) = self.faces.iter().max_by(|a, b| {
            let da = (a.plane.normal * inv_scale).normalize_or_zero().dot(direction);
            let db = (b.plane.normal * inv_scale).normalize_or_zero().dot(direction);
            da.total_cmp(&db)
        }) else {
            return;
        };

        let vertices = best.vertices.iter().map(|&i| self.points[i as usize] * scale);
        if is_inside_out(scale) {
            let reversed: Vec<Vec3A> = vertices.collect();
            let room = face.remaining_capacity();
            face.extend(reversed.into_iter().rev().take(room));
        } else {
            let room = face.remaining_capacity();
            face.extend(vertices.take(room));
        }
    }

    /// Fan triangulation of every face, scaled, wound as the faces are.
    pub fn get_surface_triangles(&self, scale: Vec3A) -> Vec<[Vec3A; 3]> {
        let mut triangles = Vec::new();
        for face in &self.faces {
            let first = self.points[face.vertices[0] as usize] * scale;
            for pair in face.vertices[1..].windows(2) {
                triangles.push([
                    first,
                    self.points[pair[0] as usize] * scale,
                    self.points[pair[1] as usize] * scale,
                ]);
            }
        }
        triangles
    }

    #[inline]
    #[must_use]
    pub fn get_local_bounds(&self) -> Aabb {
        Aabb::from_points(&self.points)
    }

    pub(crate) fn save_fields<W: Write>(&self, stream: &mut W) -> io::Result<()> {
        self.convex_radius.to_stream(stream)?;
        (self.points.len() as u32).to_stream(stream)?;
        for point in &self.points {
            point.to_stream(stream)?;
        }
        self.center_of_mass.to_stream(stream)?;
        self.inner_radius.to_stream(stream)?;
        self.volume.to_stream(stream)
    }

    pub(crate) fn restore_fields<R: Read>(
        convex_shape: ConvexShape,
        stream: &mut R,
    ) -> Result<Self, StreamError> {
        let convex_radius = f32::from_stream(stream)?;
        let count = u32::from_stream(stream)? as usize;
        if count > MAX_POINTS_IN_HULL {
            return Err(ShapeError::TooManyPoints {
                count,
                max: MAX_POINTS_IN_HULL,
            }
            .into());
        }

        let points = (0..count)
            .map(|_| Vec3A::from_stream(stream))
            .collect::<io::Result<Vec<_>>>()?;
        let center_of_mass = Vec3A::from_stream(stream)?;
        let inner_radius = f32::from_stream(stream)?;
        let volume = f32::from_stream(stream)?;

        if !(inner_radius.is_finite() && inner_radius > 0.0) {
            return Err(ShapeError::DegenerateHull("stored inner radius is not positive").into());
        }
        if !(volume.is_finite() && volume > 0.0) {
            return Err(ShapeError::DegenerateHull("stored volume is not positive").into());
        }
        if !(convex_radius.is_finite() && (0.0..=0.5 * inner_radius).contains(&convex_radius)) {
            return Err(ShapeError::InvalidConvexRadius {
                radius: convex_radius,
                max: 0.5 * inner_radius,
            }
            .into());
        }

        // The stored points are exactly the hull vertices, so rebuilding gives the same faces
        let polytope = ConvexPolytope::build(&points, DEFAULT_HULL_TOLERANCE * 0.1)?;
        let triangles: Vec<[usize; 3]> = polytope.faces().map(|f| f.vertices).collect();
        let faces = merge_coplanar_faces(&points, &triangles, DEFAULT_HULL_TOLERANCE);

        let mut hull = Self::from_parts(convex_shape, points, faces, center_of_mass, convex_radius, volume)?;
        if (hull.inner_radius - inner_radius).abs() > DEFAULT_HULL_TOLERANCE {
            warn!(
                "stored hull inner radius {inner_radius} differs from the rebuilt one {}",
                hull.inner_radius
            );
        }
        hull.convex_radius = convex_radius;
        hull.inner_radius = inner_radius;
        Ok(hull)
    }
}

/// Displacement of vertex `index` when the planes of its faces move inward by one unit.
///
/// Uses the three adjacent planes that are the furthest from parallel. A vertex without
/// three independent planes moves toward the center of mass instead.
fn core_offset(points: &[Vec3A], faces: &[HullFace], index: usize, inner_radius: f32) -> Vec3A {
    let normals: Vec<Vec3A> = faces
        .iter()
        .filter(|f| f.vertices.contains(&(index as u8)))
        .map(|f| f.plane.normal)
        .collect();

    let mut best: Option<(f32, Mat3A)> = None;
    for i in 0..normals.len() {
        for j in i + 1..normals.len() {
            for k in j + 1..normals.len() {
                let planes = Mat3A::from_cols(normals[i], normals[j], normals[k]).transpose();
                let det = planes.determinant().abs();
                if best.is_none_or(|(best_det, _)| det > best_det) {
                    best = Some((det, planes));
                }
            }
        }
    }

    match best {
        Some((det, planes)) if det > 1.0e-6 => planes.inverse() * Vec3A::NEG_ONE,
        _ => -points[index] / inner_radius,
    }
}

/// Signed tetrahedron decomposition of a closed triangle surface.
fn volume_and_center_of_mass(points: &[Vec3A], triangles: &[[usize; 3]]) -> (f32, Vec3A) {
    let reference = points.iter().copied().sum::<Vec3A>() / points.len() as f32;

    let mut volume = 0.0;
    let mut weighted_center = Vec3A::ZERO;
    for &[a, b, c] in triangles {
        let (a, b, c) = (points[a], points[b], points[c]);
        let tetra_volume = (a - reference).dot((b - reference).cross(c - reference)) / 6.0;
        volume += tetra_volume;
        weighted_center += tetra_volume * (reference + a + b + c) * 0.25;
    }

    if volume <= f32::EPSILON {
        return (volume, reference);
    }

    (volume, weighted_center / volume)
}

/// Groups triangles that share a plane into convex polygons sorted counter clockwise.
fn merge_coplanar_faces(points: &[Vec3A], triangles: &[[usize; 3]], tolerance: f32) -> Vec<HullFace> {
    let mut groups: Vec<(Vec3A, f32, Vec<usize>)> = Vec::new();

    for tri in triangles {
        let [a, b, c] = tri.map(|i| points[i]);
        let Some(normal) = (b - a).cross(c - a).try_normalize() else {
            continue;
        };
        let distance = normal.dot(a);

        let group = groups.iter_mut().find(|(n, d, _)| {
            n.dot(normal) > 1.0 - COPLANAR_NORMAL_TOLERANCE && (*d - distance).abs() <= tolerance
        });
        match group {
            Some((_, _, vertices)) => vertices.extend_from_slice(tri),
            None => groups.push((normal, distance, tri.to_vec())),
        }
    }

    groups
        .into_iter()
        .map(|(normal, distance, mut vertices)| {
            vertices.sort_unstable();
            vertices.dedup();

            let center = vertices.iter().map(|&i| points[i]).sum::<Vec3A>() / vertices.len() as f32;
            let (u, v) = plane_space(normal);
            let angle = |i: usize| {
                let d = points[i] - center;
                d.dot(v).atan2(d.dot(u))
            };
            vertices.sort_by(|&a, &b| angle(a).total_cmp(&angle(b)));

            HullFace {
                vertices: vertices.into_iter().map(|i| i as u8).collect(),
                plane: Plane::new(normal, -distance),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::shapes::support::SupportFunction;

    fn cube_points(offset: Vec3A) -> Vec<Vec3A> {
        let mut points = Vec::new();
        for x in [-1.0, 1.0] {
            for y in [-1.0, 1.0] {
                for z in [-1.0, 1.0] {
                    points.push(Vec3A::new(x, y, z) + offset);
                }
            }
        }
        points
    }

    fn cube_hull() -> ConvexHullShape {
        let offset = Vec3A::new(3.0, 0.0, 0.0);
        let mut points = cube_points(offset);
        points.push(offset);
        ConvexHullShape::new(ConvexShape::default(), &points, 0.05, DEFAULT_HULL_TOLERANCE).unwrap()
    }

    #[test]
    fn cube_hull_properties() {
        let hull = cube_hull();
        assert_eq!(hull.get_points().len(), 8);
        assert_eq!(hull.get_faces().len(), 6);
        assert!(hull.get_faces().iter().all(|f| f.vertices.len() == 4));
        assert!(hull.get_center_of_mass().abs_diff_eq(Vec3A::new(3.0, 0.0, 0.0), 1e-5));
        assert!((hull.get_volume() - 8.0).abs() < 1e-4);
        assert!((hull.get_inner_radius() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn convex_radius_is_clamped() {
        let hull =
            ConvexHullShape::new(ConvexShape::default(), &cube_points(Vec3A::ZERO), 5.0, DEFAULT_HULL_TOLERANCE)
                .unwrap();
        assert!((hull.get_convex_radius() - 0.5).abs() < 1e-5);
    }

    #[test]
    fn inclusive_support_is_the_hull() {
        let hull = cube_hull();
        let support = hull.get_support(SupportMode::IncludeConvexRadius, Vec3A::ONE);
        assert_eq!(support.get_convex_radius(), 0.0);
        let p = support.get_support(Vec3A::X);
        assert!((p.x - 1.0).abs() < 1e-5);
        let corner = support.get_support(Vec3A::ONE);
        assert!(corner.abs_diff_eq(Vec3A::ONE, 1e-5));
    }

    #[test]
    fn core_faces_move_in_by_the_radius() {
        let mut points = cube_points(Vec3A::ZERO);
        for p in &mut points {
            p.x *= 10.0;
        }
        let hull = ConvexHullShape::new(ConvexShape::default(), &points, 0.05, DEFAULT_HULL_TOLERANCE).unwrap();
        let core = hull.get_support(SupportMode::ExcludeConvexRadius, Vec3A::ONE);
        assert!((core.get_convex_radius() - 0.05).abs() < 1e-6);
        assert!(core.get_support(Vec3A::new(1.0, 0.2, 0.3)).abs_diff_eq(Vec3A::new(9.95, 0.95, 0.95), 1e-5));
        assert!(core.get_support(Vec3A::new(-0.1, -1.0, 0.3)).abs_diff_eq(Vec3A::new(-9.95, -0.95, 0.95), 1e-5));
    }

    #[test]
    fn supporting_face_is_ccw() {
        let mut face = SupportingFace::new();
        cube_hull().get_supporting_face(Vec3A::Z, Vec3A::ONE, &mut face);
        assert_eq!(face.len(), 4);
        let normal = (face[1] - face[0]).cross(face[2] - face[0]).normalize();
        assert!(normal.abs_diff_eq(Vec3A::Z, 1e-5));
    }

    #[test]
    fn rejects_bad_point_sets() {
        assert_eq!(
            ConvexHullShape::new(ConvexShape::default(), &[Vec3A::ZERO; 3], 0.0, DEFAULT_HULL_TOLERANCE)
                .unwrap_err(),
            ShapeError::TooFewPoints(3)
        );
        assert!(matches!(
            ConvexHullShape::new(ConvexShape::default(), &[Vec3A::ZERO; 300], 0.0, DEFAULT_HULL_TOLERANCE),
            Err(ShapeError::TooManyPoints { count: 300, .. })
        ));
        let flat = [Vec3A::ZERO, Vec3A::X, Vec3A::Y, Vec3A::ONE.with_z(0.0)];
        assert!(matches!(
            ConvexHullShape::new(ConvexShape::default(), &flat, 0.0, DEFAULT_HULL_TOLERANCE),
            Err(ShapeError::DegenerateHull(_))
        ));
    }
}
