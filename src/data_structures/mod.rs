//! Scene-side data types.
//!
//! - `model`: meshes, colour materials and the draw traits binding them
//! - `instance`: node poses and the per-draw GPU payload
//! - `scene_graph`: the named-component node arena with transform propagation
//! - `texture`: the depth attachment

pub mod instance;
pub mod model;
pub mod scene_graph;
pub mod texture;
