//! Offset-scheduled tween entries sharing one clock.
//!
//! A [`Timeline`] is the engine's stand-in for chained tween calls: every
//! entry has a start offset, a duration and an easing curve, and applies its
//! eased progress to the target state through a closure. Zero-duration
//! entries double as delayed calls. The whole timeline is advanced once per
//! frame from `on_update` and can be dropped mid-flight with
//! [`clear`](Timeline::clear), which suppresses all pending callbacks.

use crate::tween::Ease;

struct Entry<S> {
    start: f32,
    duration: f32,
    ease: Ease,
    apply: Option<Box<dyn FnMut(&mut S, f32)>>,
    on_complete: Option<Box<dyn FnOnce(&mut S)>>,
    done: bool,
}

/// A scheduled set of eased animations and delayed calls against state `S`.
///
/// Entries fire in insertion order within a frame. An entry's `apply` closure
/// is always invoked with eased progress `1.0` exactly once before its
/// completion callback runs.
pub struct Timeline<S> {
    entries: Vec<Entry<S>>,
    elapsed: f32,
}

impl<S> Timeline<S> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            elapsed: 0.0,
        }
    }

    /// Schedule an eased animation starting `at` seconds from the current
    /// clock position.
    ///
    /// Scheduling is relative so that long-lived timelines (a shared effects
    /// timeline, say) can keep accepting spawns at any point in their life.
    /// `apply` receives the eased progress in [0, 1] every frame while the
    /// entry is active.
    pub fn tween(
        &mut self,
        at: f32,
        duration: f32,
        ease: Ease,
        apply: impl FnMut(&mut S, f32) + 'static,
    ) -> &mut Self {
        self.entries.push(Entry {
            start: self.elapsed + at,
            duration,
            ease,
            apply: Some(Box::new(apply)),
            on_complete: None,
            done: false,
        });
        self
    }

    /// Like [`tween`](Self::tween), with a callback fired once the entry
    /// finishes.
    pub fn tween_then(
        &mut self,
        at: f32,
        duration: f32,
        ease: Ease,
        apply: impl FnMut(&mut S, f32) + 'static,
        on_complete: impl FnOnce(&mut S) + 'static,
    ) -> &mut Self {
        self.entries.push(Entry {
            start: self.elapsed + at,
            duration,
            ease,
            apply: Some(Box::new(apply)),
            on_complete: Some(Box::new(on_complete)),
            done: false,
        });
        self
    }

    /// Schedule a delayed call `at` seconds from the current clock position.
    pub fn call(&mut self, at: f32, f: impl FnOnce(&mut S) + 'static) -> &mut Self {
        self.entries.push(Entry {
            start: self.elapsed + at,
            duration: 0.0,
            ease: Ease::Linear,
            apply: None,
            on_complete: Some(Box::new(f)),
            done: false,
        });
        self
    }

    /// Advance the clock by `dt` seconds and run all due entries.
    ///
    /// Returns `true` while entries remain, `false` once the timeline has
    /// played out (or was never populated).
    pub fn advance(&mut self, state: &mut S, dt: f32) -> bool {
        self.elapsed += dt;
        let elapsed = self.elapsed;
        for entry in &mut self.entries {
            if entry.done || elapsed < entry.start {
                continue;
            }
            if elapsed >= entry.start + entry.duration {
                if let Some(apply) = &mut entry.apply {
                    apply(state, entry.ease.apply(1.0));
                }
                if let Some(on_complete) = entry.on_complete.take() {
                    on_complete(state);
                }
                entry.done = true;
            } else if let Some(apply) = &mut entry.apply {
                let progress = (elapsed - entry.start) / entry.duration;
                apply(state, entry.ease.apply(progress));
            }
        }
        self.entries.retain(|entry| !entry.done);
        !self.entries.is_empty()
    }

    /// Drop every pending entry without firing any callbacks and rewind the
    /// clock. This is the cancellation path for a torn-down sequence.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.elapsed = 0.0;
    }

    /// True when no entries are pending.
    pub fn is_idle(&self) -> bool {
        self.entries.is_empty()
    }

    /// Seconds the timeline has been advanced since creation or the last
    /// [`clear`](Self::clear).
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// End offset of the last scheduled entry.
    pub fn duration(&self) -> f32 {
        self.entries
            .iter()
            .map(|entry| entry.start + entry.duration)
            .fold(0.0, f32::max)
    }
}

impl<S> Default for Timeline<S> {
    fn default() -> Self {
        Self::new()
    }
}
