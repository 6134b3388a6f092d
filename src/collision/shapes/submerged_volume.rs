use arrayvec::ArrayVec;
use glam::Vec3A;

use crate::linear_math::plane::Plane;

/// Result of a buoyancy query, everything in world space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SubmergedVolume {
    pub total_volume: f32,
    pub submerged_volume: f32,
    /// Centroid of the submerged part, zero when nothing is submerged.
    pub center_of_buoyancy: Vec3A,
}

/// Keeps the part of a triangle below the plane (Sutherland-Hodgman with a single plane).
fn clip_below(triangle: &[Vec3A; 3], plane: &Plane) -> ArrayVec<Vec3A, 4> {
    let mut out = ArrayVec::new();

    for i in 0..3 {
        let current = triangle[i];
        let next = triangle[(i + 1) % 3];
        let d_current = plane.signed_distance(current);
        let d_next = plane.signed_distance(next);

        if d_current <= 0.0 {
            out.push(current);
        }

        if (d_current < 0.0 && d_next > 0.0) || (d_current > 0.0 && d_next < 0.0) {
            let t = d_current / (d_current - d_next);
            out.push(current + t * (next - current));
        }
    }

    out
}

/// Integrates the volume below `plane` enclosed by a closed, outward wound surface.
///
/// Every clipped triangle forms a tetrahedron with a point on the plane, the cap that
/// closes the clipped surface lies in the plane and adds nothing.
pub(crate) fn integrate_below_plane(
    triangles: impl IntoIterator<Item = [Vec3A; 3]>,
    plane: &Plane,
    reference: Vec3A,
) -> (f32, Vec3A) {
    let reference = plane.project(reference);

    let mut volume = 0.0;
    let mut weighted_center = Vec3A::ZERO;
    for triangle in triangles {
        let polygon = clip_below(&triangle, plane);
        if polygon.len() < 3 {
            continue;
        }

        let a = polygon[0];
        for pair in polygon[1..].windows(2) {
            let (b, c) = (pair[0], pair[1]);
            let tetra_volume = (a - reference).dot((b - reference).cross(c - reference)) / 6.0;
            volume += tetra_volume;
            weighted_center += tetra_volume * (reference + a + b + c) * 0.25;
        }
    }

    if volume <= f32::EPSILON {
        return (0.0, Vec3A::ZERO);
    }

    (volume, weighted_center / volume)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clip_keeps_lower_part() {
        let plane = Plane::new(Vec3A::Y, 0.0);
        let triangle = [
            Vec3A::new(0.0, -1.0, 0.0),
            Vec3A::new(2.0, 1.0, 0.0),
            Vec3A::new(-2.0, 1.0, 0.0),
        ];
        let clipped = clip_below(&triangle, &plane);
        assert_eq!(clipped.len(), 3);
        assert!(clipped.iter().all(|p| p.y <= 1e-6));
    }

    #[test]
    fn fully_above_is_empty() {
        let plane = Plane::new(Vec3A::Y, 0.0);
        let triangle = [
            Vec3A::new(0.0, 1.0, 0.0),
            Vec3A::new(1.0, 2.0, 0.0),
            Vec3A::new(0.0, 2.0, 1.0),
        ];
        assert!(clip_below(&triangle, &plane).is_empty());
    }
}
