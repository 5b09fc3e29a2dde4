//! Ready-made character rigs built from procedural shapes.

pub mod dragon;

pub use dragon::{Dragon, DragonParams};
