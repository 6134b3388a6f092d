use glam::Vec3A;

const DEGENERATE_EPSILON: f32 = 1.0e-12;

/// Closest point of a simplex to the origin.
///
/// `weights[i]` is the barycentric weight of input vertex `i` and bit `i` of `set` tells
/// whether that vertex is part of the sub simplex the point lies on.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClosestPoint {
    pub point: Vec3A,
    pub weights: [f32; 4],
    pub set: u32,
}

impl ClosestPoint {
    #[inline]
    const fn vertex(point: Vec3A, index: usize) -> Self {
        let mut weights = [0.0; 4];
        weights[index] = 1.0;
        Self {
            point,
            weights,
            set: 1 << index,
        }
    }

    /// Re-labels the vertices of a sub simplex result to the indices of the parent simplex.
    fn remap(self, indices: [usize; 3]) -> Self {
        let mut weights = [0.0; 4];
        let mut set = 0;
        for (local, &parent) in indices.iter().enumerate() {
            weights[parent] = self.weights[local];
            if self.set & (1 << local) != 0 {
                set |= 1 << parent;
            }
        }

        Self {
            point: self.point,
            weights,
            set,
        }
    }
}

/// Closest point to the origin on segment `ab`.
pub fn closest_point_on_segment(a: Vec3A, b: Vec3A) -> ClosestPoint {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq < DEGENERATE_EPSILON {
        // Pick the vertex closest to the origin
        return if a.length_squared() <= b.length_squared() {
            ClosestPoint::vertex(a, 0)
        } else {
            ClosestPoint::vertex(b, 1)
        };
    }

    let t = -a.dot(ab) / len_sq;
    if t <= 0.0 {
        ClosestPoint::vertex(a, 0)
    } else if t >= 1.0 {
        ClosestPoint::vertex(b, 1)
    } else {
        ClosestPoint {
            point: a + t * ab,
            weights: [1.0 - t, t, 0.0, 0.0],
            set: 0b11,
        }
    }
}

fn closest_point_on_degenerate_triangle(a: Vec3A, b: Vec3A, c: Vec3A) -> ClosestPoint {
    let candidates = [
        closest_point_on_segment(a, b).remap([0, 1, 3]),
        closest_point_on_segment(a, c).remap([0, 2, 3]),
        closest_point_on_segment(b, c).remap([1, 2, 3]),
    ];

    let mut best = candidates[0];
    for candidate in &candidates[1..] {
        if candidate.point.length_squared() < best.point.length_squared() {
            best = *candidate;
        }
    }
    best
}

/// Closest point to the origin on triangle `abc`, by walking its Voronoi regions.
pub fn closest_point_on_triangle(a: Vec3A, b: Vec3A, c: Vec3A) -> ClosestPoint {
    let ab = b - a;
    let ac = c - a;
    if ab.cross(ac).length_squared() < DEGENERATE_EPSILON {
        return closest_point_on_degenerate_triangle(a, b, c);
    }

    let ap = -a;
    let d1 = ab.dot(ap);
    let d2 = ac.dot(ap);
    if d1 <= 0.0 && d2 <= 0.0 {
        return ClosestPoint::vertex(a, 0);
    }

    let bp = -b;
    let d3 = ab.dot(bp);
    let d4 = ac.dot(bp);
    if d3 >= 0.0 && d4 <= d3 {
        return ClosestPoint::vertex(b, 1);
    }

    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        let v = d1 / (d1 - d3);
        return ClosestPoint {
            point: a + v * ab,
            weights: [1.0 - v, v, 0.0, 0.0],
            set: 0b011,
        };
    }

    let cp = -c;
    let d5 = ab.dot(cp);
    let d6 = ac.dot(cp);
    if d6 >= 0.0 && d5 <= d6 {
        return ClosestPoint::vertex(c, 2);
    }

    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        let w = d2 / (d2 - d6);
        return ClosestPoint {
            point: a + w * ac,
            weights: [1.0 - w, 0.0, w, 0.0],
            set: 0b101,
        };
    }

    let va = d3 * d6 - d5 * d4;
    let d43 = d4 - d3;
    let d56 = d5 - d6;
    if va <= 0.0 && d43 >= 0.0 && d56 >= 0.0 {
        let w = d43 / (d43 + d56);
        return ClosestPoint {
            point: b + w * (c - b),
            weights: [0.0, 1.0 - w, w, 0.0],
            set: 0b110,
        };
    }

    let denom = 1.0 / (va + vb + vc);
    let v = vb * denom;
    let w = vc * denom;
    ClosestPoint {
        point: a + v * ab + w * ac,
        weights: [1.0 - v - w, v, w, 0.0],
        set: 0b111,
    }
}

/// True when the origin and `d` are on opposite sides of plane `abc`.
///
/// A flat tetrahedron reports every face as a candidate.
fn origin_outside_of_plane(a: Vec3A, b: Vec3A, c: Vec3A, d: Vec3A) -> bool {
    let n = (b - a).cross(c - a);
    let sign_p = -a.dot(n);
    let sign_d = (d - a).dot(n);
    if sign_d * sign_d < DEGENERATE_EPSILON * DEGENERATE_EPSILON {
        return true;
    }

    sign_p * sign_d < 0.0
}

/// Closest point to the origin on (or in) tetrahedron `abcd`.
pub fn closest_point_on_tetrahedron(a: Vec3A, b: Vec3A, c: Vec3A, d: Vec3A) -> ClosestPoint {
    let faces = [
        ([a, b, c], d, [0, 1, 2]),
        ([a, c, d], b, [0, 2, 3]),
        ([a, d, b], c, [0, 3, 1]),
        ([b, d, c], a, [1, 3, 2]),
    ];

    let mut best: Option<ClosestPoint> = None;
    for ([p, q, r], opposite, indices) in faces {
        if !origin_outside_of_plane(p, q, r, opposite) {
            continue;
        }

        let candidate = closest_point_on_triangle(p, q, r).remap(indices);
        if best.is_none_or(|b| candidate.point.length_squared() < b.point.length_squared()) {
            best = Some(candidate);
        }
    }

    if let Some(best) = best {
        return best;
    }

    // Origin is inside, express it in barycentric coordinates
    let ab = b - a;
    let ac = c - a;
    let ad = d - a;
    let ap = -a;
    let volume = ab.dot(ac.cross(ad));
    let wb = ap.dot(ac.cross(ad)) / volume;
    let wc = ab.dot(ap.cross(ad)) / volume;
    let wd = ab.dot(ac.cross(ap)) / volume;

    ClosestPoint {
        point: Vec3A::ZERO,
        weights: [1.0 - wb - wc - wd, wb, wc, wd],
        set: 0b1111,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segment_interior() {
        let r = closest_point_on_segment(Vec3A::new(-1.0, 1.0, 0.0), Vec3A::new(3.0, 1.0, 0.0));
        assert!(r.point.abs_diff_eq(Vec3A::new(0.0, 1.0, 0.0), 1e-6));
        assert_eq!(r.set, 0b11);
        assert!((r.weights[0] - 0.75).abs() < 1e-6);
    }

    #[test]
    fn segment_clamps_to_vertex() {
        let r = closest_point_on_segment(Vec3A::new(1.0, 0.0, 0.0), Vec3A::new(2.0, 0.0, 0.0));
        assert_eq!(r.set, 0b01);
        assert_eq!(r.point, Vec3A::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn triangle_face_region() {
        let r = closest_point_on_triangle(
            Vec3A::new(-1.0, -1.0, 2.0),
            Vec3A::new(1.0, -1.0, 2.0),
            Vec3A::new(0.0, 1.0, 2.0),
        );
        assert!(r.point.abs_diff_eq(Vec3A::new(0.0, 0.0, 2.0), 1e-6));
        assert_eq!(r.set, 0b111);
        let sum: f32 = r.weights.iter().sum();
        assert!((sum - 1.0).abs() < 1e-6);
    }

    #[test]
    fn triangle_edge_region() {
        let r = closest_point_on_triangle(
            Vec3A::new(1.0, -1.0, 0.0),
            Vec3A::new(1.0, 1.0, 0.0),
            Vec3A::new(3.0, 0.0, 0.0),
        );
        assert!(r.point.abs_diff_eq(Vec3A::new(1.0, 0.0, 0.0), 1e-6));
        assert_eq!(r.set, 0b011);
    }

    #[test]
    fn tetrahedron_contains_origin() {
        let r = closest_point_on_tetrahedron(
            Vec3A::new(1.0, 1.0, 1.0),
            Vec3A::new(-1.0, -1.0, 1.0),
            Vec3A::new(-1.0, 1.0, -1.0),
            Vec3A::new(1.0, -1.0, -1.0),
        );
        assert_eq!(r.set, 0b1111);
        assert_eq!(r.point, Vec3A::ZERO);
        for w in r.weights {
            assert!((w - 0.25).abs() < 1e-5);
        }
    }

    #[test]
    fn tetrahedron_outside_picks_face() {
        let r = closest_point_on_tetrahedron(
            Vec3A::new(0.0, 0.0, 1.0),
            Vec3A::new(1.0, 0.0, 1.0),
            Vec3A::new(0.0, 1.0, 1.0),
            Vec3A::new(0.0, 0.0, 2.0),
        );
        assert!(r.point.abs_diff_eq(Vec3A::new(0.0, 0.0, 1.0), 1e-6));
        assert_eq!(r.set, 0b0001);
    }
}
