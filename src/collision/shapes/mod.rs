pub mod box_shape;
pub mod capsule_shape;
pub mod convex_hull_shape;
pub mod convex_shape;
pub mod get_triangles;
pub mod physics_material;
pub mod scaled_shape;
pub mod shape_serialization;
pub mod sphere_shape;
pub mod stream;
pub mod submerged_volume;
pub mod support;
