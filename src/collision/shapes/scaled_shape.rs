use std::{
    io::{self, Read, Write},
    sync::Arc,
};

use glam::Vec3A;

use super::{
    convex_shape::{ConvexShape, ConvexShapes, ShapeResult},
    stream::{FromStream, ToStream},
};
use crate::error::{ShapeError, StreamError};

/// Maximum number of scaled shapes wrapped around each other.
pub const MAX_SCALED_NESTING: usize = 8;

#[derive(Clone, Debug)]
pub struct ScaledShapeSettings {
    pub inner: Arc<ConvexShapes>,
    pub scale: Vec3A,
}

impl ScaledShapeSettings {
    #[must_use]
    pub const fn new(inner: Arc<ConvexShapes>, scale: Vec3A) -> Self {
        Self { inner, scale }
    }

    pub fn create(&self) -> ShapeResult {
        ScaledShape::new(self.inner.clone(), self.scale).map(ConvexShapes::Scaled)
    }
}

/// Applies a constant, possibly non-uniform scale to a shared inner shape.
///
/// Starts out with the inner shape's material and density.
#[derive(Clone, Debug)]
pub struct ScaledShape {
    pub convex_shape: ConvexShape,
    inner: Arc<ConvexShapes>,
    scale: Vec3A,
}

impl ScaledShape {
    pub fn new(inner: Arc<ConvexShapes>, scale: Vec3A) -> Result<Self, ShapeError> {
        let convex_shape = inner.base().clone();
        Self::with_base(convex_shape, inner, scale)
    }

    fn with_base(convex_shape: ConvexShape, inner: Arc<ConvexShapes>, scale: Vec3A) -> Result<Self, ShapeError> {
        if !inner.is_valid_scale(scale) {
            return Err(ShapeError::InvalidScale(scale.to_array()));
        }
        if inner.get_scaled_nesting() >= MAX_SCALED_NESTING {
            return Err(ShapeError::NestingTooDeep(MAX_SCALED_NESTING));
        }

        Ok(Self {
            convex_shape,
            inner,
            scale,
        })
    }

    #[inline]
    #[must_use]
    pub fn get_inner_shape(&self) -> &ConvexShapes {
        &self.inner
    }

    /// Mutable access to the inner shape, cloning it first if it is shared.
    pub(crate) fn inner_mut(&mut self) -> &mut ConvexShapes {
        Arc::make_mut(&mut self.inner)
    }

    #[inline]
    #[must_use]
    pub const fn get_scale(&self) -> Vec3A {
        self.scale
    }

    pub(crate) fn save_fields<W: Write>(&self, stream: &mut W) -> io::Result<()> {
        self.scale.to_stream(stream)?;
        self.inner.save_binary_state(stream)
    }

    /// `nesting` counts the scaled shapes this one is wrapped in.
    pub(crate) fn restore_fields<R: Read>(
        convex_shape: ConvexShape,
        stream: &mut R,
        nesting: usize,
    ) -> Result<Self, StreamError> {
        let scale = Vec3A::from_stream(stream)?;
        let inner = ConvexShapes::restore_nested(stream, nesting + 1)?;
        Ok(Self::with_base(convex_shape, Arc::new(inner), scale)?)
    }
}
