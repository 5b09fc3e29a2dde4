//! The sphere demo: two mirrored spheres over a floor plane.
//!
//! The smaller sibling of the dragon demo, mostly useful for checking
//! lighting and camera behaviour. The lower sphere mirrors the upper one
//! under the floor; the light marker shows the orbiting point light.

use anyhow::Result;

use drake_ngin::{
    Deg, DeviceEvent, Vector3, WindowEvent,
    camera::Camera,
    context::{Context, InitContext},
    data_structures::{
        instance::Instance,
        model::Model,
        scene_graph::{SceneGraph, ShapeDesc},
    },
    flow::{Effect, FlowConstructor, GraphicsFlow},
    geometry::{plane, uv_sphere},
    render::Render,
};

const SPHERE_ID: u32 = 1;
// 0x156289, the original sphere blue.
const SPHERE_COLOUR: [f32; 4] = [0.082, 0.384, 0.537, 1.0];
const FLOOR_COLOUR: [f32; 4] = [0.92, 0.92, 0.92, 1.0];
const SPHERE_HEIGHT: f32 = 120.0;
const LIGHT_POSITION: [f32; 3] = [300.0, 300.0, -300.0];

#[derive(Default)]
struct State {}

enum Event {}

struct SphereScene {
    graph: SceneGraph,
    light_marker: Option<Model>,
}

impl SphereScene {
    async fn new(ctx: &InitContext) -> Result<SphereScene> {
        let mut graph = SceneGraph::new();
        graph.add_shape(
            &ctx.device,
            "floor",
            None,
            plane(2000.0, 2000.0)?,
            ShapeDesc {
                colour: FLOOR_COLOUR,
                ..Default::default()
            },
            Instance::new(),
        )?;
        let ball = uv_sphere(100.0, 50, 50)?;
        graph.add_shape(
            &ctx.device,
            "sphere",
            None,
            ball.clone(),
            ShapeDesc {
                colour: SPHERE_COLOUR,
                transparent: false,
                pick_id: SPHERE_ID,
            },
            Instance::from(Vector3::new(0.0, SPHERE_HEIGHT, 0.0)),
        )?;
        // The mirrored twin below the floor completes the reflection gag.
        graph.add_shape(
            &ctx.device,
            "sphere_mirror",
            None,
            ball,
            ShapeDesc {
                colour: SPHERE_COLOUR,
                ..Default::default()
            },
            Instance::from(Vector3::new(0.0, -SPHERE_HEIGHT, 0.0)),
        )?;

        let marker = uv_sphere(8.0, 16, 12)?.upload(&ctx.device, "light marker");
        let light_marker = Some(Model {
            meshes: vec![marker],
            materials: Vec::new(),
        });

        Ok(SphereScene {
            graph,
            light_marker,
        })
    }
}

impl GraphicsFlow<State, Event> for SphereScene {
    fn on_init(&mut self, ctx: &mut Context, _: &mut State) -> Effect<State, Event> {
        ctx.clear_colour = drake_ngin::Color {
            r: 0.85,
            g: 0.87,
            b: 0.9,
            a: 1.0,
        };
        ctx.camera.camera = Camera::new((400.0, 400.0, 400.0), Deg(-135.0), Deg(-35.0));
        ctx.light.uniform.position = LIGHT_POSITION;
        ctx.light.model = self.light_marker.take();

        self.graph.update_world_transforms();
        self.graph.write_to_buffers(&ctx.queue);
        Effect::Nothing
    }

    fn on_click(&mut self, _: &Context, _: &mut State, id: u32) -> Effect<State, Event> {
        log::info!("clicked sphere {}", id);
        Effect::Nothing
    }

    fn on_update(
        &mut self,
        _: &Context,
        _: &mut State,
        _: std::time::Duration,
    ) -> Effect<State, Event> {
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
        self.graph.get_render()
    }
}

fn main() {
    let scene: FlowConstructor<State, Event> = Box::new(|ctx| {
        Box::pin(async move {
            Box::new(
                SphereScene::new(&ctx)
                    .await
                    .expect("failed to build the sphere scene"),
            ) as Box<dyn GraphicsFlow<_, _>>
        })
    });

    if let Err(e) = drake_ngin::flow::run(vec![scene]) {
        log::error!("event loop ended with an error: {}", e);
    }
}
