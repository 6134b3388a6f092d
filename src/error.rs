use std::io;

use thiserror::Error;

/// Reason a shape could not be constructed from its settings.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ShapeError {
    #[error("density must be positive, got {0}")]
    InvalidDensity(f32),
    #[error("invalid half extent {0:?}, every component must be positive")]
    InvalidHalfExtent([f32; 3]),
    #[error("invalid convex radius {radius}, must be in [0, {max}]")]
    InvalidConvexRadius { radius: f32, max: f32 },
    #[error("invalid radius {0}, must be positive")]
    InvalidRadius(f32),
    #[error("invalid half height {0}, must be non-negative")]
    InvalidHalfHeight(f32),
    #[error("need at least 4 points to build a hull, got {0}")]
    TooFewPoints(usize),
    #[error("too many points for a hull: {count} (max {max})")]
    TooManyPoints { count: usize, max: usize },
    #[error("hull is degenerate: {0}")]
    DegenerateHull(&'static str),
    #[error("invalid scale {0:?}, components must be non-zero")]
    InvalidScale([f32; 3]),
    #[error("scaled shapes nested more than {0} deep")]
    NestingTooDeep(usize),
}

/// Failure while saving or restoring shape state.
#[derive(Error, Debug)]
pub enum StreamError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("unknown shape type tag {0}")]
    UnknownShapeType(u8),
    #[error("material index {index} out of range (have {len} materials)")]
    MaterialIndexOutOfRange { index: u32, len: usize },
    #[error("expected {expected} materials, got {got}")]
    MaterialCountMismatch { expected: usize, got: usize },
    #[error("invalid state: {0}")]
    InvalidState(#[from] ShapeError),
}
