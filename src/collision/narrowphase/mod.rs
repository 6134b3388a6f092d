pub mod closest_point;
pub mod epa;
pub mod gjk;
pub mod polytope;
