use std::mem;

use arrayvec::ArrayVec;
use glam::{Affine3A, Vec3A};

use super::convex_hull_shape::MAX_POINTS_IN_HULL;

/// Maximum number of vertices in a supporting face.
pub const MAX_SUPPORTING_FACE_VERTICES: usize = 32;

/// Vertices of the face of a shape most aligned with a direction, relative to the center of mass.
pub type SupportingFace = ArrayVec<Vec3A, MAX_SUPPORTING_FACE_VERTICES>;

/// Size in bytes of the scratch storage a support object is built into.
pub const SUPPORT_BUFFER_SIZE: usize = 4160;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SupportMode {
    /// The core shape, the convex radius is reported separately by `get_convex_radius`.
    #[default]
    ExcludeConvexRadius,
    /// The full shape, the convex radius is already part of every support point.
    IncludeConvexRadius,
}

/// A convex support mapping.
pub trait SupportFunction {
    /// Point of the shape furthest along `direction`, `direction` does not need to be normalized.
    fn get_support(&self, direction: Vec3A) -> Vec3A;

    /// Radius that has to be added around `get_support` to get the full shape.
    fn get_convex_radius(&self) -> f32;
}

impl<S: SupportFunction + ?Sized> SupportFunction for &S {
    #[inline]
    fn get_support(&self, direction: Vec3A) -> Vec3A {
        (**self).get_support(direction)
    }

    #[inline]
    fn get_convex_radius(&self) -> f32 {
        (**self).get_convex_radius()
    }
}

/// Scaled core geometry of a shape.
#[derive(Clone, Debug, PartialEq)]
pub enum SupportCore {
    Point,
    Box { half_extent: Vec3A },
    /// Segment along the local Y axis.
    Segment { half_height: f32 },
    Hull(ArrayVec<Vec3A, MAX_POINTS_IN_HULL>),
}

impl SupportCore {
    fn get_support(&self, direction: Vec3A) -> Vec3A {
        match self {
            Self::Point => Vec3A::ZERO,
            Self::Box { half_extent } => {
                Vec3A::select(direction.cmplt(Vec3A::ZERO), -*half_extent, *half_extent)
            }
            Self::Segment { half_height } => {
                let y = if direction.y < 0.0 { -half_height } else { *half_height };
                Vec3A::new(0.0, y, 0.0)
            }
            Self::Hull(points) => {
                let mut best = Vec3A::ZERO;
                let mut best_dot = f32::MIN;
                for &p in points {
                    let dot = p.dot(direction);
                    if dot > best_dot {
                        best_dot = dot;
                        best = p;
                    }
                }
                best
            }
        }
    }
}

/// Support object of one shape under one scale and mode.
///
/// The geometry is copied in, so the value does not borrow the shape it was made from.
#[derive(Clone, Debug, PartialEq)]
pub struct Support {
    core: SupportCore,
    convex_radius: f32,
    mode: SupportMode,
}

impl Support {
    #[inline]
    #[must_use]
    pub const fn new(core: SupportCore, convex_radius: f32, mode: SupportMode) -> Self {
        Self {
            core,
            convex_radius,
            mode,
        }
    }

    #[inline]
    pub const fn core(&self) -> &SupportCore {
        &self.core
    }

    #[inline]
    pub const fn mode(&self) -> SupportMode {
        self.mode
    }
}

impl SupportFunction for Support {
    fn get_support(&self, direction: Vec3A) -> Vec3A {
        let core = self.core.get_support(direction);
        match self.mode {
            SupportMode::ExcludeConvexRadius => core,
            SupportMode::IncludeConvexRadius => {
                core + self.convex_radius * direction.normalize_or_zero()
            }
        }
    }

    #[inline]
    fn get_convex_radius(&self) -> f32 {
        match self.mode {
            SupportMode::ExcludeConvexRadius => self.convex_radius,
            SupportMode::IncludeConvexRadius => 0.0,
        }
    }
}

/// Caller owned scratch storage for one [`Support`].
///
/// Building a new support object into the buffer drops the previous one, and the
/// returned reference borrows the buffer so it cannot outlive it.
#[repr(C, align(16))]
#[derive(Debug, Default)]
pub struct SupportBuffer {
    slot: Option<Support>,
}

const _: () = assert!(mem::size_of::<SupportBuffer>() <= SUPPORT_BUFFER_SIZE);
const _: () = assert!(mem::align_of::<SupportBuffer>() == 16);

impl SupportBuffer {
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self { slot: None }
    }

    #[inline]
    pub(crate) fn emplace(&mut self, support: Support) -> &Support {
        self.slot.insert(support)
    }
}

/// A single point, used for ray casts and point queries.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PointSupport {
    pub point: Vec3A,
}

impl SupportFunction for PointSupport {
    #[inline]
    fn get_support(&self, _direction: Vec3A) -> Vec3A {
        self.point
    }

    #[inline]
    fn get_convex_radius(&self) -> f32 {
        0.0
    }
}

/// Support of another shape placed with a rigid transform.
#[derive(Clone, Copy, Debug)]
pub struct TransformedSupport<S> {
    transform: Affine3A,
    inverse_rotation: glam::Mat3A,
    inner: S,
}

impl<S: SupportFunction> TransformedSupport<S> {
    pub fn new(transform: Affine3A, inner: S) -> Self {
        Self {
            transform,
            inverse_rotation: transform.matrix3.transpose(),
            inner,
        }
    }
}

impl<S: SupportFunction> SupportFunction for TransformedSupport<S> {
    #[inline]
    fn get_support(&self, direction: Vec3A) -> Vec3A {
        let local = self.inner.get_support(self.inverse_rotation * direction);
        self.transform.transform_point3a(local)
    }

    #[inline]
    fn get_convex_radius(&self) -> f32 {
        self.inner.get_convex_radius()
    }
}

/// Turns a core support back into the full shape by adding its radius to every point.
#[derive(Clone, Copy, Debug)]
pub struct AddConvexRadius<S> {
    inner: S,
    radius: f32,
}

impl<S: SupportFunction> AddConvexRadius<S> {
    pub fn new(inner: S) -> Self {
        let radius = inner.get_convex_radius();
        Self { inner, radius }
    }
}

impl<S: SupportFunction> SupportFunction for AddConvexRadius<S> {
    #[inline]
    fn get_support(&self, direction: Vec3A) -> Vec3A {
        self.inner.get_support(direction) + self.radius * direction.normalize_or_zero()
    }

    #[inline]
    fn get_convex_radius(&self) -> f32 {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn include_mode_adds_radius_along_direction() {
        let core = SupportCore::Box {
            half_extent: Vec3A::new(0.5, 1.0, 1.5),
        };
        let exclude = Support::new(core.clone(), 0.25, SupportMode::ExcludeConvexRadius);
        let include = Support::new(core, 0.25, SupportMode::IncludeConvexRadius);

        for dir in [Vec3A::X, Vec3A::new(-1.0, 2.0, 0.5), Vec3A::new(0.0, -3.0, 0.0)] {
            let expected = exclude.get_support(dir) + exclude.get_convex_radius() * dir.normalize();
            assert!(include.get_support(dir).abs_diff_eq(expected, 1e-6));
        }
        assert_eq!(include.get_convex_radius(), 0.0);
    }

    #[test]
    fn add_convex_radius_matches_include_mode() {
        let exclude = Support::new(
            SupportCore::Segment { half_height: 2.0 },
            0.5,
            SupportMode::ExcludeConvexRadius,
        );
        let include = Support::new(
            SupportCore::Segment { half_height: 2.0 },
            0.5,
            SupportMode::IncludeConvexRadius,
        );
        let added = AddConvexRadius::new(&exclude);

        let dir = Vec3A::new(1.0, 1.0, 0.0);
        assert!(added.get_support(dir).abs_diff_eq(include.get_support(dir), 1e-6));
    }

    #[test]
    fn buffer_holds_latest_support() {
        let mut buffer = SupportBuffer::new();
        let first = buffer
            .emplace(Support::new(SupportCore::Point, 1.0, SupportMode::ExcludeConvexRadius))
            .get_convex_radius();
        let second = buffer
            .emplace(Support::new(SupportCore::Point, 2.0, SupportMode::ExcludeConvexRadius))
            .get_convex_radius();
        assert_eq!(first, 1.0);
        assert_eq!(second, 2.0);
    }
}
