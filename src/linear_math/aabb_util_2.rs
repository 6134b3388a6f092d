use glam::{Affine3A, Vec3A};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: Vec3A,
    pub max: Vec3A,
}

impl Default for Aabb {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl Aabb {
    /// Inverted box that any `encapsulate` call will overwrite.
    pub const EMPTY: Self = Self {
        min: Vec3A::new(f32::MAX, f32::MAX, f32::MAX),
        max: Vec3A::new(-f32::MAX, -f32::MAX, -f32::MAX),
    };

    /// A box that overlaps everything, used when callers don't want culling.
    pub const EVERYTHING: Self = Self {
        min: Vec3A::new(-f32::MAX, -f32::MAX, -f32::MAX),
        max: Vec3A::new(f32::MAX, f32::MAX, f32::MAX),
    };

    #[inline]
    pub const fn new(min: Vec3A, max: Vec3A) -> Self {
        Self { min, max }
    }

    #[inline]
    pub fn from_half_extent(half_extent: Vec3A) -> Self {
        Self {
            min: -half_extent,
            max: half_extent,
        }
    }

    #[inline]
    pub fn center(&self) -> Vec3A {
        (self.min + self.max) * 0.5
    }

    #[inline]
    pub fn extent(&self) -> Vec3A {
        (self.max - self.min) * 0.5
    }

    #[inline]
    pub fn intersects(&self, rhs: &Self) -> bool {
        self.min.cmple(rhs.max).all() && self.max.cmpge(rhs.min).all()
    }

    #[inline]
    pub fn encapsulate(&mut self, point: Vec3A) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    pub fn from_points(points: &[Vec3A]) -> Self {
        let mut aabb = Self::EMPTY;
        for &point in points {
            aabb.encapsulate(point);
        }
        aabb
    }
}

pub fn transform_aabb(half_extents: Vec3A, margin: f32, t: &Affine3A) -> Aabb {
    let half_extents_with_margin = half_extents + margin;
    let abs_b = t.matrix3.abs();
    let center = t.translation;
    let extent = abs_b * half_extents_with_margin;

    Aabb {
        min: center - extent,
        max: center + extent,
    }
}
