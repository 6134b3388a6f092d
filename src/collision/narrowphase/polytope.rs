use ahash::AHashSet;
use glam::Vec3A;

use crate::error::ShapeError;

/// Triangle of a [`ConvexPolytope`], wound counter clockwise seen from outside.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PolytopeFace {
    pub vertices: [usize; 3],
    /// Unit outward normal, zero for a sliver triangle.
    pub normal: Vec3A,
    /// Signed distance of the face plane from the origin along `normal`.
    pub distance: f32,
    removed: bool,
}

impl PolytopeFace {
    fn new(points: &[Vec3A], vertices: [usize; 3]) -> Self {
        let [a, b, c] = vertices.map(|i| points[i]);
        let normal = (b - a).cross(c - a).normalize_or_zero();
        Self {
            vertices,
            normal,
            distance: normal.dot(a),
            removed: false,
        }
    }

    #[inline]
    pub fn signed_distance(&self, point: Vec3A) -> f32 {
        self.normal.dot(point) - self.distance
    }

    #[inline]
    pub const fn is_removed(&self) -> bool {
        self.removed
    }
}

/// Incrementally grown convex hull made of triangles.
///
/// Points are never removed, so indices handed out by [`ConvexPolytope::add_point`]
/// stay valid for the lifetime of the polytope.
#[derive(Clone, Debug, Default)]
pub struct ConvexPolytope {
    points: Vec<Vec3A>,
    faces: Vec<PolytopeFace>,
    tolerance: f32,
}

impl ConvexPolytope {
    /// Builds the hull of `points`, every input keeps its index in [`Self::points`].
    ///
    /// Points closer than `tolerance` to the current hull are not added.
    pub fn build(points: &[Vec3A], tolerance: f32) -> Result<Self, ShapeError> {
        if points.len() < 4 {
            return Err(ShapeError::TooFewPoints(points.len()));
        }

        let initial = Self::initial_tetrahedron(points, tolerance)?;

        let mut polytope = Self {
            points: points.to_vec(),
            faces: Vec::with_capacity(points.len() * 2),
            tolerance,
        };

        let [a, b, c, d] = initial;
        let centroid = (points[a] + points[b] + points[c] + points[d]) * 0.25;
        for tri in [[a, b, c], [a, d, b], [a, c, d], [b, d, c]] {
            let mut face = PolytopeFace::new(&polytope.points, tri);
            if face.signed_distance(centroid) > 0.0 {
                face = PolytopeFace::new(&polytope.points, [tri[0], tri[2], tri[1]]);
            }
            polytope.faces.push(face);
        }

        for i in 0..points.len() {
            if !initial.contains(&i) {
                polytope.extend_with(i);
            }
        }

        Ok(polytope)
    }

    fn initial_tetrahedron(points: &[Vec3A], tolerance: f32) -> Result<[usize; 4], ShapeError> {
        // Most distant pair among the extremes along each axis
        let mut best_pair = (0, 0);
        let mut best_dist_sq = -1.0;
        for axis in 0..3 {
            let (mut lo, mut hi) = (0, 0);
            for (i, p) in points.iter().enumerate() {
                if p[axis] < points[lo][axis] {
                    lo = i;
                }
                if p[axis] > points[hi][axis] {
                    hi = i;
                }
            }

            let dist_sq = points[lo].distance_squared(points[hi]);
            if dist_sq > best_dist_sq {
                best_dist_sq = dist_sq;
                best_pair = (lo, hi);
            }
        }

        if best_dist_sq <= tolerance * tolerance {
            return Err(ShapeError::DegenerateHull("all points coincide"));
        }

        let (i0, i1) = best_pair;
        let line = points[i1] - points[i0];

        let (i2, line_dist_sq) = points
            .iter()
            .enumerate()
            .map(|(i, p)| (i, line.cross(*p - points[i0]).length_squared() / line.length_squared()))
            .fold((0, -1.0), |best, cur| if cur.1 > best.1 { cur } else { best });
        if line_dist_sq <= tolerance * tolerance {
            return Err(ShapeError::DegenerateHull("all points are collinear"));
        }

        let normal = line.cross(points[i2] - points[i0]).normalize();
        let (i3, plane_dist) = points
            .iter()
            .enumerate()
            .map(|(i, p)| (i, normal.dot(*p - points[i0]).abs()))
            .fold((0, -1.0), |best, cur| if cur.1 > best.1 { cur } else { best });
        if plane_dist <= tolerance {
            return Err(ShapeError::DegenerateHull("all points are coplanar"));
        }

        Ok([i0, i1, i2, i3])
    }

    /// Adds `point` to the hull, returns its index or `None` when it lies inside.
    pub fn add_point(&mut self, point: Vec3A) -> Option<usize> {
        self.points.push(point);
        let index = self.points.len() - 1;
        if self.extend_with(index) {
            Some(index)
        } else {
            self.points.pop();
            None
        }
    }

    fn extend_with(&mut self, index: usize) -> bool {
        let point = self.points[index];

        let mut visible_edges = AHashSet::new();
        let mut any_visible = false;
        for face in self.faces.iter_mut().filter(|f| !f.removed) {
            if face.signed_distance(point) > self.tolerance {
                let [a, b, c] = face.vertices;
                visible_edges.insert((a, b));
                visible_edges.insert((b, c));
                visible_edges.insert((c, a));
                face.removed = true;
                any_visible = true;
            }
        }

        if !any_visible {
            return false;
        }

        // Horizon edges are the ones whose twin belongs to a face that stays
        let mut horizon: Vec<(usize, usize)> = visible_edges
            .iter()
            .filter(|&&(a, b)| !visible_edges.contains(&(b, a)))
            .copied()
            .collect();
        horizon.sort_unstable();

        for (a, b) in horizon {
            self.faces.push(PolytopeFace::new(&self.points, [a, b, index]));
        }

        true
    }

    #[inline]
    pub fn points(&self) -> &[Vec3A] {
        &self.points
    }

    /// Faces still on the hull, in creation order.
    pub fn faces(&self) -> impl Iterator<Item = &PolytopeFace> {
        self.faces.iter().filter(|f| !f.removed)
    }

    /// Indices of the points that ended up as hull vertices, sorted.
    pub fn vertex_indices(&self) -> Vec<usize> {
        let mut used: Vec<usize> = self.faces().flat_map(|f| f.vertices).collect();
        used.sort_unstable();
        used.dedup();
        used
    }

    /// True when `point` is inside or within `tolerance` of every face.
    pub fn contains(&self, point: Vec3A) -> bool {
        self.faces()
            .all(|f| f.signed_distance(point) <= self.tolerance)
    }
}
