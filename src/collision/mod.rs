pub mod collector;
pub mod collide_shape;
pub mod dispatch;
pub mod narrowphase;
pub mod ray_cast;
pub mod shape_cast;
pub mod shapes;
pub mod stats;
pub mod sub_shape_id;
