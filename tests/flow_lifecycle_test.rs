//! Full event-loop lifecycle test.
//!
//! Boots the real winit/wgpu stack (which needs a window and a GPU, hence
//! the feature gate), runs a probe flow for a handful of frames and checks
//! that the hooks fire in order and that queued effects land.

use drake_ngin::{
    context::Context,
    flow::{Effect, FlowConstructor, GraphicsFlow},
    render::Render,
};

use crate::common::test_utils::Counters;

mod common;

enum Event {
    Ping,
}

struct Probe;

#[cfg(feature = "integration-tests")]
impl GraphicsFlow<Counters, Event> for Probe {
    fn on_init(&mut self, ctx: &mut Context, state: &mut Counters) -> Effect<Counters, Event> {
        ctx.clear_colour = drake_ngin::Color::TRANSPARENT;
        // Nothing may run before init.
        assert_eq!(state.frames, 0);
        assert_eq!(state.inits, 0);
        assert_eq!(state.clicks, 0);
        assert_eq!(state.updates, 0);
        state.inits += 1;
        Effect::Nothing
    }

    fn on_click(&mut self, _: &Context, state: &mut Counters, _: u32) -> Effect<Counters, Event> {
        state.clicks += 1;
        Effect::Nothing
    }

    fn on_update(
        &mut self,
        _: &Context,
        state: &mut Counters,
        _: std::time::Duration,
    ) -> Effect<Counters, Event> {
        assert_eq!(state.frames, state.updates);
        assert_eq!(state.inits, 1);
        state.frames += 1;
        state.updates += 1;

        let first: Box<dyn FnOnce(&mut Counters)> = Box::new(|state: &mut Counters| {
            state.scratch.push('+');
        });
        let second: Box<dyn FnOnce(&mut Counters)> = Box::new(|state: &mut Counters| {
            state.scratch.push('*');
        });
        match state.frames {
            // A queued event must come back through on_custom_events.
            3 => Effect::Events(vec![Box::new(async move { Event::Ping })]),
            // Deferred mutations must both apply.
            5 => Effect::Mutations(vec![
                Box::new(async move { first }),
                Box::new(async move { second }),
            ]),
            n if n > 5 => {
                assert!(state.scratch.contains('+'));
                assert!(state.scratch.contains('*'));
                assert_eq!(state.scratch.len(), 2, "{}", state.scratch);
                Effect::Nothing
            }
            _ => Effect::Nothing,
        }
    }

    fn on_tick(&mut self, _: &Context, _: &mut Counters) -> Effect<Counters, Event> {
        Effect::Nothing
    }

    fn on_device_events(
        &mut self,
        _: &Context,
        _: &mut Counters,
        _: &drake_ngin::DeviceEvent,
    ) -> Effect<Counters, Event> {
        Effect::Nothing
    }

    fn on_window_events(
        &mut self,
        _: &Context,
        _: &mut Counters,
        _: &drake_ngin::WindowEvent,
    ) -> Effect<Counters, Event> {
        Effect::Nothing
    }

    fn on_custom_events(&mut self, _: &Context, state: &mut Counters, _: Event) -> Option<Event> {
        // The ping was queued in frame 3 and can only arrive afterwards.
        assert!(state.frames >= 3);
        None
    }

    fn on_render<'pass>(&self) -> Render<'_, 'pass> {
        Render::None
    }

    fn render_to_texture(
        &self,
        _: &Context,
        state: &mut Counters,
        _: &mut image::ImageBuffer<image::Rgba<u8>, wgpu::BufferView>,
    ) -> Result<drake_ngin::flow::ImageTestResult, anyhow::Error> {
        use drake_ngin::flow::ImageTestResult;
        // Give the scheduled effects a few frames to land before passing.
        if state.frames > 6 {
            Ok(ImageTestResult::Passed)
        } else {
            Ok(ImageTestResult::Waiting)
        }
    }
}

#[test]
#[cfg(feature = "integration-tests")]
fn lifecycle_hooks_fire_in_order() {
    let probe: FlowConstructor<Counters, Event> =
        Box::new(|_| Box::pin(async move { Box::new(Probe) as Box<dyn GraphicsFlow<_, _>> }));

    if let Err(e) = drake_ngin::flow::run(vec![probe]) {
        panic!("{}", e);
    }
}
