use glam::Vec3A;
use log::trace;

use super::closest_point::{
    ClosestPoint, closest_point_on_segment, closest_point_on_tetrahedron,
    closest_point_on_triangle,
};
use crate::collision::shapes::support::{PointSupport, SupportFunction};

/// Iteration budget of every GJK loop, running out counts as "no answer".
pub const MAX_GJK_ITERATIONS: usize = 100;

/// Closest points between two shapes found by [`GjkClosestPoint::get_closest_points`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClosestPoints {
    /// Squared distance between the two points, 0 when the shapes overlap.
    pub distance_sq: f32,
    /// Closest point of `A - B` to the origin.
    pub v: Vec3A,
    pub point_a: Vec3A,
    pub point_b: Vec3A,
}

/// Time of impact found by [`GjkClosestPoint::cast_shape`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CastHit {
    pub fraction: f32,
    /// Contact point on the moving shape at the time of impact.
    pub point_a: Vec3A,
    pub point_b: Vec3A,
    /// Points from the moving shape toward the target, not normalized and zero when the
    /// shapes already overlapped more than their convex radii at the start.
    pub separating_axis: Vec3A,
}

/// Simplex based queries on the Minkowski difference of two support mappings.
///
/// Both support functions must be expressed in the same space.
#[derive(Clone, Debug, Default)]
pub struct GjkClosestPoint {
    /// Vertices of the simplex, their meaning depends on the query.
    y: [Vec3A; 4],
    /// Support points on A.
    p: [Vec3A; 4],
    /// Support points on B.
    q: [Vec3A; 4],
    weights: [f32; 4],
    num_points: usize,
}

impl GjkClosestPoint {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current simplex as `(a - b, a, b)` triples.
    pub fn simplex(&self) -> impl Iterator<Item = (Vec3A, Vec3A, Vec3A)> + '_ {
        (0..self.num_points).map(|i| (self.y[i], self.p[i], self.q[i]))
    }

    #[inline]
    pub const fn num_points(&self) -> usize {
        self.num_points
    }

    fn push(&mut self, y: Vec3A, p: Vec3A, q: Vec3A) {
        debug_assert!(self.num_points < 4);
        self.y[self.num_points] = y;
        self.p[self.num_points] = p;
        self.q[self.num_points] = q;
        self.num_points += 1;
    }

    #[inline]
    fn closest_point_of_simplex(&self) -> ClosestPoint {
        Self::closest_point_of(&self.y[..self.num_points])
    }

    /// Drops the vertices that are not in `closest.set`, keeping the order of the rest.
    fn reduce(&mut self, closest: &ClosestPoint) {
        let mut kept = 0;
        for i in 0..self.num_points {
            if closest.set & (1 << i) != 0 {
                self.y[kept] = self.y[i];
                self.p[kept] = self.p[i];
                self.q[kept] = self.q[i];
                self.weights[kept] = closest.weights[i];
                kept += 1;
            }
        }
        self.num_points = kept;
    }

    fn witness_points(&self) -> (Vec3A, Vec3A) {
        let mut a = Vec3A::ZERO;
        let mut b = Vec3A::ZERO;
        for i in 0..self.num_points {
            a += self.weights[i] * self.p[i];
            b += self.weights[i] * self.q[i];
        }
        (a, b)
    }

    /// Closest points between the cores of `a` and `b`, ignoring convex radii.
    ///
    /// `v` is the initial search direction and receives the final separating vector
    /// `point_a - point_b`. Returns `None` once the shapes are known to be further than
    /// `sqrt(max_dist_sq)` apart.
    pub fn get_closest_points<A, B>(
        &mut self,
        a: &A,
        b: &B,
        tolerance: f32,
        max_dist_sq: f32,
        v: &mut Vec3A,
    ) -> Option<ClosestPoints>
    where
        A: SupportFunction + ?Sized,
        B: SupportFunction + ?Sized,
    {
        let tolerance_sq = tolerance * tolerance;

        self.num_points = 0;
        if v.length_squared() < f32::EPSILON {
            *v = Vec3A::X;
        }

        let mut v_len_sq = f32::MAX;
        let mut prev_v_len_sq = f32::MAX;

        for _ in 0..MAX_GJK_ITERATIONS {
            let p = a.get_support(-*v);
            let q = b.get_support(*v);
            let w = p - q;

            let dot = v.dot(w);
            if dot > 0.0 && dot * dot > v.length_squared() * max_dist_sq {
                trace!("GJK found a separating axis beyond the max distance");
                return None;
            }

            // w is not further along -v than the current closest point
            if self.num_points > 0 && v_len_sq - dot <= v_len_sq * 1.0e-6 {
                break;
            }

            self.push(w, p, q);

            let closest = self.closest_point_of_simplex();
            self.reduce(&closest);

            if closest.set == 0b1111 {
                *v = Vec3A::ZERO;
                v_len_sq = 0.0;
                break;
            }

            *v = closest.point;
            v_len_sq = v.length_squared();
            if v_len_sq <= tolerance_sq {
                break;
            }

            if prev_v_len_sq - v_len_sq <= f32::EPSILON * prev_v_len_sq {
                break;
            }
            prev_v_len_sq = v_len_sq;
        }

        if v_len_sq > max_dist_sq {
            return None;
        }

        let (point_a, point_b) = self.witness_points();
        Some(ClosestPoints {
            distance_sq: v_len_sq,
            v: *v,
            point_a,
            point_b,
        })
    }

    /// True when `a` and `b` overlap or are within `tolerance` of each other.
    pub fn intersects<A, B>(&mut self, a: &A, b: &B, tolerance: f32, v: &mut Vec3A) -> bool
    where
        A: SupportFunction + ?Sized,
        B: SupportFunction + ?Sized,
    {
        self.get_closest_points(a, b, tolerance, tolerance * tolerance, v)
            .is_some()
    }

    /// Sweeps `a` along `direction` toward `b` and finds the first time they touch,
    /// taking both convex radii into account.
    ///
    /// Only fractions up to `max_fraction` are considered. A cast that starts in contact
    /// reports a fraction of 0.
    pub fn cast_shape<A, B>(
        &mut self,
        a: &A,
        b: &B,
        direction: Vec3A,
        tolerance: f32,
        max_fraction: f32,
    ) -> Option<CastHit>
    where
        A: SupportFunction + ?Sized,
        B: SupportFunction + ?Sized,
    {
        let sum_radius = a.get_convex_radius() + b.get_convex_radius();
        let limit = sum_radius + tolerance;
        let limit_sq = limit * limit;

        self.num_points = 0;

        // Simplex vertices of C = B - A are kept un-shifted in `y`, the ray point `x`
        // moves as the cast advances.
        let mut fraction = 0.0;
        let mut x = Vec3A::ZERO;
        let mut v = x - (b.get_support(direction) - a.get_support(-direction));
        if v.length_squared() < f32::EPSILON {
            v = -direction;
        }
        let mut normal = Vec3A::ZERO;
        let mut v_len_sq = f32::MAX;
        let mut converged = false;

        for _ in 0..MAX_GJK_ITERATIONS {
            let p = a.get_support(-v);
            let q = b.get_support(v);
            let c = q - p;
            let w = x - c;

            let v_len = v.length();
            let vw = v.dot(w);
            if vw > sum_radius * v_len {
                let vd = v.dot(direction);
                if vd >= 0.0 {
                    trace!("shape cast moves away from the separating plane");
                    return None;
                }

                let previous_fraction = fraction;
                fraction -= (vw - sum_radius * v_len) / vd;
                if fraction == previous_fraction {
                    // The step is below float precision at this fraction
                    converged = true;
                    break;
                }
                if fraction > max_fraction {
                    return None;
                }

                x = fraction * direction;
                normal = v;
                v_len_sq = f32::MAX;
            }

            self.push(c, p, q);

            let shifted: [Vec3A; 4] = std::array::from_fn(|i| x - self.y[i]);
            let closest = Self::closest_point_of(&shifted[..self.num_points]);
            self.reduce(&closest);

            if closest.set == 0b1111 {
                v = Vec3A::ZERO;
                converged = true;
                break;
            }

            v = closest.point;
            let new_v_len_sq = v.length_squared();
            if new_v_len_sq <= limit_sq {
                converged = true;
                break;
            }

            // No more progress toward the origin, x touches the Minkowski difference
            if v_len_sq - new_v_len_sq <= 1.0e-6 * v_len_sq {
                converged = true;
                break;
            }
            v_len_sq = new_v_len_sq;
        }

        if !converged && fraction == 0.0 {
            trace!("shape cast ran out of iterations");
            return None;
        }

        let (point_a, point_b) = self.witness_points();

        // Direction from A toward B
        let axis = if v.length_squared() > f32::EPSILON * f32::EPSILON {
            -v
        } else {
            -normal
        };
        let axis_dir = axis.normalize_or_zero();
        let point_a = point_a + fraction * direction + a.get_convex_radius() * axis_dir;
        let point_b = point_b - b.get_convex_radius() * axis_dir;

        Some(CastHit {
            fraction,
            point_a,
            point_b,
            separating_axis: axis,
        })
    }

    /// Casts the ray `origin + t * direction` for `t` in `[0, max_fraction]` against `b`.
    ///
    /// `b` is treated as solid, a ray starting inside it hits at fraction 0.
    pub fn cast_ray<B>(
        &mut self,
        origin: Vec3A,
        direction: Vec3A,
        tolerance: f32,
        b: &B,
        max_fraction: f32,
    ) -> Option<f32>
    where
        B: SupportFunction + ?Sized,
    {
        let a = PointSupport { point: origin };
        self.cast_shape(&a, b, direction, tolerance, max_fraction)
            .map(|hit| hit.fraction)
    }

    fn closest_point_of(y: &[Vec3A]) -> ClosestPoint {
        match y.len() {
            1 => ClosestPoint {
                point: y[0],
                weights: [1.0, 0.0, 0.0, 0.0],
                set: 0b1,
            },
            2 => closest_point_on_segment(y[0], y[1]),
            3 => closest_point_on_triangle(y[0], y[1], y[2]),
            _ => closest_point_on_tetrahedron(y[0], y[1], y[2], y[3]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::shapes::support::{Support, SupportCore, SupportMode};

    fn sphere(radius: f32, mode: SupportMode) -> Support {
        Support::new(SupportCore::Point, radius, mode)
    }

    struct Offset<S>(S, Vec3A);

    impl<S: SupportFunction> SupportFunction for Offset<S> {
        fn get_support(&self, direction: Vec3A) -> Vec3A {
            self.0.get_support(direction) + self.1
        }

        fn get_convex_radius(&self) -> f32 {
            self.0.get_convex_radius()
        }
    }

    #[test]
    fn closest_points_of_separated_boxes() {
        let a = Support::new(
            SupportCore::Box { half_extent: Vec3A::ONE },
            0.0,
            SupportMode::ExcludeConvexRadius,
        );
        let b = Offset(a.clone(), Vec3A::new(5.0, 0.0, 0.0));

        let mut v = Vec3A::X;
        let result = GjkClosestPoint::new()
            .get_closest_points(&a, &b, 1.0e-4, f32::MAX, &mut v)
            .unwrap();
        assert!((result.distance_sq - 9.0).abs() < 1e-4);
        assert!((result.point_a.x - 1.0).abs() < 1e-5);
        assert!((result.point_b.x - 4.0).abs() < 1e-5);
    }

    #[test]
    fn closest_points_respects_max_distance() {
        let a = sphere(1.0, SupportMode::ExcludeConvexRadius);
        let b = Offset(sphere(1.0, SupportMode::ExcludeConvexRadius), Vec3A::new(0.0, 10.0, 0.0));
        let mut v = Vec3A::X;
        assert!(
            GjkClosestPoint::new()
                .get_closest_points(&a, &b, 1.0e-4, 4.0, &mut v)
                .is_none()
        );
    }

    #[test]
    fn ray_hits_sphere_front() {
        let b = sphere(1.0, SupportMode::IncludeConvexRadius);
        let fraction = GjkClosestPoint::new()
            .cast_ray(
                Vec3A::new(-10.0, 0.0, 0.0),
                Vec3A::new(20.0, 0.0, 0.0),
                1.0e-4,
                &b,
                1.0,
            )
            .unwrap();
        assert!((fraction - 0.45).abs() < 1e-3);
    }

    #[test]
    fn ray_misses_sphere() {
        let b = sphere(1.0, SupportMode::IncludeConvexRadius);
        let hit = GjkClosestPoint::new().cast_ray(
            Vec3A::new(-10.0, 2.0, 0.0),
            Vec3A::new(20.0, 0.0, 0.0),
            1.0e-4,
            &b,
            1.0,
        );
        assert!(hit.is_none());
    }

    #[test]
    fn shape_cast_with_radii() {
        let a = sphere(0.5, SupportMode::ExcludeConvexRadius);
        let b = Offset(sphere(0.5, SupportMode::ExcludeConvexRadius), Vec3A::new(4.0, 0.0, 0.0));
        let hit = GjkClosestPoint::new()
            .cast_shape(&a, &b, Vec3A::new(4.0, 0.0, 0.0), 1.0e-4, 1.0)
            .unwrap();
        assert!((hit.fraction - 0.75).abs() < 1e-3);
        assert!(hit.separating_axis.normalize().abs_diff_eq(Vec3A::X, 1e-3));
    }

    #[test]
    fn off_axis_rays_through_box_converge() {
        let b = Support::new(
            SupportCore::Box { half_extent: Vec3A::ONE },
            0.0,
            SupportMode::IncludeConvexRadius,
        );

        for i in 0..=16 {
            for j in 0..=16 {
                let (y, z) = (-0.8 + 0.1 * i as f32, -0.8 + 0.1 * j as f32);
                let fraction = GjkClosestPoint::new()
                    .cast_ray(Vec3A::new(-10.0, y, z), Vec3A::new(20.0, 0.0, 0.0), 1.0e-4, &b, 1.0)
                    .unwrap_or_else(|| panic!("ray at y={y} z={z} missed"));
                assert!((fraction - 0.45).abs() < 1e-3);
            }
        }
    }
}
