//! drake-ngin
//!
//! A lightweight, cross-platform engine for procedural character demos,
//! focused on native and WASM compatibility. This crate exposes a small
//! surface for building scenes out of procedural primitive shapes, posing
//! them through a retained scene graph, and animating them with closed-form
//! per-frame formulas and tween timelines. The design emphasizes reuse of
//! pipelines and a minimal runtime surface suitable for embedding in native
//! applications or the web.
//!
//! High-level modules
//! - `camera`: camera types, controller and uniforms for view/projection
//! - `context`: central GPU and window context that owns device/queue/pipelines
//! - `data_structures`: engine data models (meshes, instances, scene graph)
//! - `flow`: high level flow control (scenes / update loops)
//! - `geometry`: procedural primitive mesh builders (cuboid, sphere, plane)
//! - `models`: ready-made character rigs (the dragon)
//! - `pick`: object picking utilities and shaders
//! - `pipelines`: definitions for the render pipelines (basic, light, pick)
//! - `pool`: free-list recycling for short-lived scene objects
//! - `render`: render composition for efficient pipeline reuse
//! - `tween`: easing, interpolation and timelines for chained animations
//!

pub mod camera;
pub mod context;
pub mod data_structures;
pub mod flow;
pub mod geometry;
pub mod models;
pub mod pick;
pub mod pipelines;
pub mod pool;
pub mod render;
pub mod tween;

// Re-exports covering what demo code touches, so downstream packages don't
// need cgmath/wgpu/winit as direct dependencies.
pub use cgmath::{Deg, InnerSpace, Quaternion, Rad, Rotation3, Vector3};
pub use wgpu::{Color, Device, Queue};
pub use winit::dpi::PhysicalPosition;
pub use winit::event::{DeviceEvent, WindowEvent};
