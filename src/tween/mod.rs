//! Easing, interpolation and timelines for chained animations.
//!
//! The demos drive all non-idle motion through this module: a
//! [`Timeline`] schedules eased value changes and delayed calls against a
//! shared clock, while [`Lerp`] and [`BezierPath`] provide the value blending
//! the scheduled entries apply each frame. Everything is synchronous and
//! advanced from the per-frame update callback.

pub mod easing;
pub mod interp;
pub mod timeline;

pub use easing::Ease;
pub use interp::{BezierPath, Lerp};
pub use timeline::Timeline;
