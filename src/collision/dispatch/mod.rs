pub mod convex_convex_collision_algorithm;
