use std::f32::consts::FRAC_1_SQRT_2;

use glam::Vec3A;
use log::debug;

use super::{
    closest_point::closest_point_on_triangle,
    gjk::GjkClosestPoint,
    polytope::{ConvexPolytope, PolytopeFace},
};
use crate::collision::shapes::support::SupportFunction;

pub const MAX_EPA_ITERATIONS: usize = 128;
/// Upper bound on the number of support points the polytope may grow to.
pub const MAX_EPA_POINTS: usize = 256;

const FRAC_1_SQRT_3: f32 = 0.577_350_26;

/// Directions sampled to seed the polytope around the origin.
const SEED_DIRECTIONS: [Vec3A; 14] = [
    Vec3A::X,
    Vec3A::NEG_X,
    Vec3A::Y,
    Vec3A::NEG_Y,
    Vec3A::Z,
    Vec3A::NEG_Z,
    Vec3A::new(FRAC_1_SQRT_3, FRAC_1_SQRT_3, FRAC_1_SQRT_3),
    Vec3A::new(-FRAC_1_SQRT_3, FRAC_1_SQRT_3, FRAC_1_SQRT_3),
    Vec3A::new(FRAC_1_SQRT_3, -FRAC_1_SQRT_3, FRAC_1_SQRT_3),
    Vec3A::new(FRAC_1_SQRT_3, FRAC_1_SQRT_3, -FRAC_1_SQRT_3),
    Vec3A::new(-FRAC_1_SQRT_3, -FRAC_1_SQRT_3, FRAC_1_SQRT_3),
    Vec3A::new(-FRAC_1_SQRT_3, FRAC_1_SQRT_3, -FRAC_1_SQRT_3),
    Vec3A::new(FRAC_1_SQRT_3, -FRAC_1_SQRT_3, -FRAC_1_SQRT_3),
    Vec3A::new(-FRAC_1_SQRT_3, -FRAC_1_SQRT_3, -FRAC_1_SQRT_3),
];

/// Deepest penetration between two overlapping shapes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Penetration {
    /// Deepest point of A inside B.
    pub point_a: Vec3A,
    /// Deepest point of B inside A.
    pub point_b: Vec3A,
    /// `point_a - point_b`, moving B along it separates the shapes.
    pub penetration_axis: Vec3A,
    pub depth: f32,
}

/// Expanding polytope search on the Minkowski difference `A - B`.
pub struct EpaPenetrationDepth;

impl EpaPenetrationDepth {
    /// Computes the penetration of `a` and `b`, both given with their convex radius included.
    ///
    /// Returns `None` when the shapes do not overlap or the expansion runs out of budget
    /// before converging.
    pub fn get_penetration_depth<A, B>(a: &A, b: &B, tolerance: f32) -> Option<Penetration>
    where
        A: SupportFunction + ?Sized,
        B: SupportFunction + ?Sized,
    {
        let mut gjk = GjkClosestPoint::new();
        let mut v = Vec3A::X;
        gjk.get_closest_points(a, b, tolerance, tolerance * tolerance, &mut v)?;

        let mut support_a = Vec::with_capacity(MAX_EPA_POINTS);
        let mut support_b = Vec::with_capacity(MAX_EPA_POINTS);
        let mut seeds = Vec::with_capacity(MAX_EPA_POINTS);
        for (y, p, q) in gjk.simplex() {
            seeds.push(y);
            support_a.push(p);
            support_b.push(q);
        }
        for dir in SEED_DIRECTIONS {
            let p = a.get_support(dir);
            let q = b.get_support(-dir);
            seeds.push(p - q);
            support_a.push(p);
            support_b.push(q);
        }

        let mut polytope = match ConvexPolytope::build(&seeds, tolerance * FRAC_1_SQRT_2) {
            Ok(polytope) => polytope,
            Err(err) => {
                debug!("EPA could not build its initial polytope: {err}");
                return None;
            }
        };

        if !polytope.contains(Vec3A::ZERO) {
            debug!("EPA initial polytope does not contain the origin");
            return None;
        }

        for _ in 0..MAX_EPA_ITERATIONS {
            // Most recently added face wins ties
            let mut closest = None;
            let mut closest_dist = f32::MAX;
            for face in polytope.faces() {
                if face.normal != Vec3A::ZERO && face.distance <= closest_dist {
                    closest_dist = face.distance;
                    closest = Some(*face);
                }
            }
            let face = closest?;

            let p = a.get_support(face.normal);
            let q = b.get_support(-face.normal);
            let w = p - q;

            if face.normal.dot(w) - face.distance < tolerance {
                return Some(Self::penetration_on_face(&polytope, &face, &support_a, &support_b));
            }

            if polytope.points().len() >= MAX_EPA_POINTS {
                debug!("EPA ran out of support points");
                return None;
            }

            if polytope.add_point(w).is_some() {
                support_a.push(p);
                support_b.push(q);
            } else {
                // Nothing left to expand toward, the face is as close as it gets
                return Some(Self::penetration_on_face(&polytope, &face, &support_a, &support_b));
            }
        }

        debug!("EPA did not converge in {MAX_EPA_ITERATIONS} iterations");
        None
    }

    fn penetration_on_face(
        polytope: &ConvexPolytope,
        face: &PolytopeFace,
        support_a: &[Vec3A],
        support_b: &[Vec3A],
    ) -> Penetration {
        let [i0, i1, i2] = face.vertices;
        let points = polytope.points();
        let bary = closest_point_on_triangle(points[i0], points[i1], points[i2]);
        let [w0, w1, w2, _] = bary.weights;

        let point_a = w0 * support_a[i0] + w1 * support_a[i1] + w2 * support_a[i2];
        let point_b = w0 * support_b[i0] + w1 * support_b[i1] + w2 * support_b[i2];

        let mut penetration_axis = point_a - point_b;
        if penetration_axis.length_squared() < f32::EPSILON * f32::EPSILON {
            penetration_axis = face.normal;
        }

        Penetration {
            point_a,
            point_b,
            penetration_axis,
            depth: face.distance.max(0.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::shapes::support::{Support, SupportCore, SupportMode};

    struct Offset(Support, Vec3A);

    impl SupportFunction for Offset {
        fn get_support(&self, direction: Vec3A) -> Vec3A {
            self.0.get_support(direction) + self.1
        }

        fn get_convex_radius(&self) -> f32 {
            0.0
        }
    }

    fn unit_box() -> Support {
        Support::new(
            SupportCore::Box { half_extent: Vec3A::ONE },
            0.0,
            SupportMode::IncludeConvexRadius,
        )
    }

    #[test]
    fn overlapping_boxes_along_x() {
        let a = unit_box();
        let b = Offset(unit_box(), Vec3A::new(1.5, 0.0, 0.0));
        let pen = EpaPenetrationDepth::get_penetration_depth(&a, &b, 1.0e-4).unwrap();

        assert!((pen.depth - 0.5).abs() < 1e-3);
        assert!(pen.penetration_axis.normalize().abs_diff_eq(Vec3A::X, 1e-3));
    }

    #[test]
    fn separated_boxes_have_no_penetration() {
        let a = unit_box();
        let b = Offset(unit_box(), Vec3A::new(3.0, 0.0, 0.0));
        assert!(EpaPenetrationDepth::get_penetration_depth(&a, &b, 1.0e-4).is_none());
    }
}
