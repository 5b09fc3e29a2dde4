//! Shared helpers for the event-loop integration tests.

/// Counts lifecycle hook invocations so tests can assert call ordering.
///
/// `scratch` collects markers written by deferred mutations; tests use it
/// to prove that async effects landed.
#[derive(Default)]
pub(crate) struct Counters {
    pub frames: u32,
    pub inits: u32,
    pub clicks: u32,
    pub updates: u32,
    pub scratch: String,
}
