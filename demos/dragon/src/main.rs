//! The sneezing dragon demo.
//!
//! A procedural dragon idles in the scene, flapping its wings and swaying
//! its tail. Clicking the dragon winds up a sneeze: strong sneezes blow
//! fire out of its nostrils, weak ones just puff smoke.

mod smoke;

use anyhow::Result;
use rand::{Rng, rngs::ThreadRng};

use drake_ngin::{
    Deg, DeviceEvent, Vector3, WindowEvent,
    camera::Camera,
    context::{Context, InitContext},
    data_structures::{instance::Instance, scene_graph::{SceneGraph, ShapeDesc}},
    flow::{Effect, FlowConstructor, GraphicsFlow},
    geometry::plane,
    models::{Dragon, DragonParams},
    render::Render,
    tween::Timeline,
};
use smoke::Smoke;

const DRAGON_ID: u32 = 1;
// 0x652e37, the dusky red of the original backdrop.
const BACKGROUND: drake_ngin::Color = drake_ngin::Color {
    r: 0.396,
    g: 0.180,
    b: 0.216,
    a: 1.0,
};
const FLOOR_COLOUR: [f32; 4] = [0.45, 0.22, 0.26, 1.0];
const FLOOR_Y: f32 = -36.0;

#[derive(Default)]
struct State {}

enum Event {}

struct DragonScene {
    env: SceneGraph,
    dragon: Dragon,
    sneeze: Timeline<Dragon>,
    smoke: Smoke,
    effects: Timeline<Smoke>,
    rng: ThreadRng,
}

impl DragonScene {
    async fn new(ctx: &InitContext) -> Result<DragonScene> {
        let mut env = SceneGraph::new();
        env.add_shape(
            &ctx.device,
            "floor",
            None,
            plane(2000.0, 2000.0)?,
            ShapeDesc {
                colour: FLOOR_COLOUR,
                ..Default::default()
            },
            Instance::from(Vector3::new(0.0, FLOOR_Y, 0.0)),
        )?;

        let mut dragon = Dragon::new(&ctx.device, DRAGON_ID, DragonParams::default())?;
        // Drop the rig until the paws rest on the floor plane.
        dragon.set_root(Instance::from(Vector3::new(0.0, -5.0, 0.0)));
        let smoke = Smoke::new(&ctx.device)?;

        Ok(DragonScene {
            env,
            dragon,
            sneeze: Timeline::new(),
            smoke,
            effects: Timeline::new(),
            rng: rand::thread_rng(),
        })
    }
}

impl GraphicsFlow<State, Event> for DragonScene {
    fn on_init(&mut self, ctx: &mut Context, _: &mut State) -> Effect<State, Event> {
        ctx.clear_colour = BACKGROUND;
        ctx.camera.camera = Camera::new((0.0, 50.0, 190.0), Deg(-90.0), Deg(-10.0));
        ctx.light.uniform.position = [200.0, 100.0, 100.0];

        self.env.update_world_transforms();
        self.env.write_to_buffers(&ctx.queue);
        self.dragon.sync(&ctx.queue);
        self.smoke.graph.update_world_transforms();
        self.smoke.graph.write_to_buffers(&ctx.queue);
        Effect::Nothing
    }

    fn on_click(&mut self, _: &Context, _: &mut State, id: u32) -> Effect<State, Event> {
        if id == DRAGON_ID && !self.dragon.is_sneezing() {
            let power = self.rng.gen_range(2.0..Dragon::MAX_SNEEZE_RATE);
            log::info!("sneeze incoming with power {:.1}", power);
            self.sneeze = self.dragon.start_sneeze(power);
        }
        Effect::Nothing
    }

    fn on_update(&mut self, ctx: &Context, _: &mut State, dt: std::time::Duration) -> Effect<State, Event> {
        let seconds = dt.as_secs_f32();

        self.sneeze.advance(&mut self.dragon, seconds);
        self.dragon.run(dt);
        self.dragon.sync(&ctx.queue);

        if let Some(rate) = self.dragon.take_blast() {
            for nostril in self.dragon.nostril_positions() {
                if rate > Dragon::FIRE_THRESHOLD {
                    self.smoke.blast(nostril, rate, &mut self.effects);
                } else {
                    self.smoke.puff(nostril, &mut self.effects);
                }
            }
        }

        self.effects.advance(&mut self.smoke, seconds);
        self.smoke.graph.update_world_transforms();
        self.smoke.graph.write_to_buffers(&ctx.queue);
        Effect::Nothing
    }

    fn on_tick(&mut self, _: &Context, _: &mut State) -> Effect<State, Event> {
        Effect::Nothing
    }

    fn on_device_events(
        &mut self,
        _: &Context,
        _: &mut State,
        _: &DeviceEvent,
    ) -> Effect<State, Event> {
        Effect::Nothing
    }

    fn on_window_events(
        &mut self,
        _: &Context,
        _: &mut State,
        _: &WindowEvent,
    ) -> Effect<State, Event> {
        Effect::Nothing
    }

    fn on_custom_events(&mut self, _: &Context, _: &mut State, event: Event) -> Option<Event> {
        Some(event)
    }

    fn on_render<'pass>(&self) -> Render<'_, 'pass> {
        Render::Composed(vec![
            self.env.get_render(),
            self.dragon.graph.get_render(),
            self.smoke.graph.get_render(),
        ])
    }
}

fn main() {
    let scene: FlowConstructor<State, Event> = Box::new(|ctx| {
        Box::pin(async move {
            Box::new(
                DragonScene::new(&ctx)
                    .await
                    .expect("failed to build the dragon scene"),
            ) as Box<dyn GraphicsFlow<_, _>>
        })
    });

    if let Err(e) = drake_ngin::flow::run(vec![scene]) {
        log::error!("event loop ended with an error: {}", e);
    }
}
