pub mod ai;
pub mod bullets;
pub mod collisions;
pub mod physics;
pub mod spawning;
