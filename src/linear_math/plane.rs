use glam::{Affine3A, Vec3A};

/// Plane `normal · p + constant = 0`, the half space below it has a negative distance.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Plane {
    pub normal: Vec3A,
    pub constant: f32,
}

impl Plane {
    #[inline]
    pub const fn new(normal: Vec3A, constant: f32) -> Self {
        Self { normal, constant }
    }

    #[inline]
    pub fn from_point_and_normal(point: Vec3A, normal: Vec3A) -> Self {
        Self {
            normal,
            constant: -normal.dot(point),
        }
    }

    #[inline]
    pub fn signed_distance(&self, point: Vec3A) -> f32 {
        self.normal.dot(point) + self.constant
    }

    /// Closest point on the plane to `point`, assumes a normalized normal.
    #[inline]
    pub fn project(&self, point: Vec3A) -> Vec3A {
        point - self.normal * self.signed_distance(point)
    }

    /// Transforms the plane by a rigid transform.
    pub fn transformed(&self, t: &Affine3A) -> Self {
        let normal = t.transform_vector3a(self.normal);
        let point = t.transform_point3a(-self.normal * self.constant);
        Self::from_point_and_normal(point, normal)
    }
}
