use std::sync::OnceLock;

use glam::{Affine3A, Quat, Vec3A};

use super::support::{Support, SupportFunction};
use crate::linear_math::aabb_util_2::Aabb;

/// Smallest output slice `get_triangles_next` accepts.
pub const MIN_TRIANGLES_REQUESTED: usize = 32;

/// Subdivision levels of the octahedron used to tessellate smooth shapes.
const SPHERE_SUBDIVISION_LEVELS: usize = 3;

/// Unit sphere made of 512 outward wound triangles.
pub fn unit_sphere_triangles() -> &'static [[Vec3A; 3]] {
    static TRIANGLES: OnceLock<Vec<[Vec3A; 3]>> = OnceLock::new();
    TRIANGLES.get_or_init(|| {
        let (x, y, z) = (Vec3A::X, Vec3A::Y, Vec3A::Z);
        let mut triangles = vec![
            [x, y, z],
            [y, -x, z],
            [-x, -y, z],
            [-y, x, z],
            [y, x, -z],
            [-x, y, -z],
            [-y, -x, -z],
            [x, -y, -z],
        ];

        for _ in 0..SPHERE_SUBDIVISION_LEVELS {
            triangles = triangles
                .into_iter()
                .flat_map(|[a, b, c]| {
                    let ab = (a + b).normalize();
                    let bc = (b + c).normalize();
                    let ca = (c + a).normalize();
                    [[a, ab, ca], [ab, b, bc], [ca, bc, c], [ab, bc, ca]]
                })
                .collect();
        }

        triangles
    })
}

/// Where a traversal gets its local triangles from.
#[derive(Clone, Debug)]
pub(crate) enum TriangleSource {
    /// Exact, already scaled surface triangles.
    Faces(Vec<[Vec3A; 3]>),
    /// The unit sphere pushed out onto the surface through a support mapping.
    SupportMapped(Box<Support>),
}

/// State of one `get_triangles_start` / `get_triangles_next` traversal.
///
/// Restart a traversal by creating a new context.
#[derive(Clone, Debug)]
pub struct GetTrianglesContext {
    transform: Affine3A,
    bounds: Aabb,
    source: TriangleSource,
    next: usize,
}

impl GetTrianglesContext {
    pub(crate) fn new(
        bounds: &Aabb,
        position_com: Vec3A,
        rotation: Quat,
        source: TriangleSource,
    ) -> Self {
        Self {
            transform: Affine3A::from_rotation_translation(rotation, position_com.into()),
            bounds: *bounds,
            source,
            next: 0,
        }
    }

    fn local_triangle(&self, index: usize) -> Option<[Vec3A; 3]> {
        match &self.source {
            TriangleSource::Faces(triangles) => triangles.get(index).copied(),
            TriangleSource::SupportMapped(support) => unit_sphere_triangles()
                .get(index)
                .map(|tri| tri.map(|v| support.get_support(v))),
        }
    }

    /// Writes world space triangles into `out`, returns how many, 0 once exhausted.
    pub(crate) fn fill(&mut self, out: &mut [[Vec3A; 3]]) -> usize {
        debug_assert!(out.len() >= MIN_TRIANGLES_REQUESTED);

        let mut count = 0;
        while count < out.len() {
            let Some(local) = self.local_triangle(self.next) else {
                break;
            };
            self.next += 1;

            let world = local.map(|v| self.transform.transform_point3a(v));
            if !self.bounds.intersects(&Aabb::from_points(&world)) {
                continue;
            }

            out[count] = world;
            count += 1;
        }

        count
    }
}
