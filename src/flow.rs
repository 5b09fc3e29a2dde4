//! The application event loop and the flow lifecycle.
//!
//! Scenes are "flows": self-contained units that react to input, advance
//! their animations and hand the engine something renderable once per
//! frame. [`App`] owns the winit event loop and any number of boxed
//! [`GraphicsFlow`]s and wires window/device events, per-frame updates,
//! periodic ticks, GPU picking and the batched render passes together.
//!
//! Per frame, in order:
//!
//! 1. winit events are forwarded to every flow
//! 2. the frame is rendered from the flows' [`Render`] batches
//! 3. `on_tick` fires if the tick duration has elapsed
//! 4. camera and light uniforms are refreshed
//! 5. `on_update` advances every flow by the frame delta
//!
//! Left clicks additionally run a pick pass and call `on_click` on the
//! flows owning the hit id.

use std::{collections::HashSet, fmt::Debug, iter, pin::Pin, sync::Arc};

use cgmath::Rotation3;
use instant::{Duration, Instant};
#[cfg(feature = "integration-tests")]
use tokio::runtime::Runtime;
use winit::{
    application::ApplicationHandler,
    event::{DeviceEvent, DeviceId, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop, EventLoopProxy},
    window::Window,
};

use crate::{
    context::{Context, InitContext, MouseButtonState},
    data_structures::{
        model::{DrawLight, DrawModel},
        texture::Texture,
    },
    pick::run_pick_pass,
    render::{Instanced, Render},
};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

/// What a lifecycle hook hands back to the event loop.
///
/// Hooks themselves run synchronously on the loop thread; anything
/// asynchronous is returned as an `Effect` and resolved by the platform
/// layer (blocking on the tokio runtime natively, `spawn_local` on the
/// web).
pub enum Effect<S, E> {
    /// Futures resolving to custom events. Resolved events are pushed onto
    /// the event queue and redistributed through `on_custom_events`; they
    /// have no effect unless some flow consumes them.
    Events(Vec<Box<dyn Future<Output = E>>>),
    /// Futures resolving to state mutations. The loop applies each mutation
    /// to the shared state once it resolves.
    Mutations(Vec<Box<dyn Future<Output = Box<dyn FnOnce(&mut S)>>>>),
    /// Reconfigure the [`Context`] at runtime: clear colour, tick duration,
    /// camera pose.
    Configure(Box<dyn FnOnce(&mut Context)>),
    /// The default: nothing to resolve.
    Nothing,
}

impl<S, E> Default for Effect<S, E> {
    fn default() -> Self {
        Self::Nothing
    }
}

#[cfg(feature = "integration-tests")]
pub enum ImageTestResult {
    Passed,
    Waiting,
    Failed,
}

/// A scene or demo state driven by the event loop.
///
/// The engine runs any number of flows side by side. Every hook receives
/// the shared [`Context`] and the application state `S`; custom events of
/// type `E` travel between flows through the event queue.
pub trait GraphicsFlow<S, E> {
    /// Runs once per flow after GPU resources exist.
    ///
    /// The only hook with mutable context access; set the clear colour,
    /// camera start or tick duration here.
    fn on_init(&mut self, ctx: &mut Context, state: &mut S) -> Effect<S, E>;

    /// Runs when a shape owned by this flow was clicked.
    ///
    /// `id` is the pick id given to the shape in `on_render`. Ids must be
    /// non-zero to be clickable; `0` marks a shape as not pickable. Flows
    /// rendering through [`Render::Custom`] have to implement picking
    /// themselves, see [`crate::pick::run_pick_pass`].
    fn on_click(&mut self, ctx: &Context, state: &mut S, id: u32) -> Effect<S, E>;

    /// Runs every frame with the time elapsed since the previous frame.
    /// This is where animations and timelines advance.
    fn on_update(&mut self, ctx: &Context, state: &mut S, dt: Duration) -> Effect<S, E>;

    /// Runs every `tick_duration_millis`, for logic too coarse to belong in
    /// the per-frame hook.
    fn on_tick(&mut self, ctx: &Context, state: &mut S) -> Effect<S, E>;

    /// Raw device input: relative mouse motion and the like.
    fn on_device_events(&mut self, ctx: &Context, state: &mut S, event: &DeviceEvent) -> Effect<S, E>;

    /// Window-scoped input and lifecycle events.
    fn on_window_events(&mut self, ctx: &Context, state: &mut S, event: &WindowEvent) -> Effect<S, E>;

    /// Custom events queued through [`Effect::Events`].
    ///
    /// Return the event to hand it to the next flow, or `None` to consume
    /// it.
    fn on_custom_events(&mut self, ctx: &Context, state: &mut S, event: E) -> Option<E>;

    /// Collect this flow's renderable content for the current frame.
    fn on_render<'pass>(&self) -> Render<'_, 'pass>;

    #[cfg(feature = "integration-tests")]
    fn render_to_texture(
        &self,
        ctx: &Context,
        state: &mut S,
        texture: &mut image::ImageBuffer<image::Rgba<u8>, wgpu::BufferView>,
    ) -> Result<ImageTestResult, anyhow::Error>;
}

// The web backend requires user event types to be Debug.
impl<State, Event> Debug for dyn GraphicsFlow<State, Event> + 'static {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("GraphicsFlow")
    }
}

/// Factory producing a flow once the GPU context exists.
///
/// Constructors are async so they can upload geometry through the
/// [`InitContext`] before the first frame.
pub type FlowConstructor<S, E> =
    Box<dyn FnOnce(InitContext) -> Pin<Box<dyn Future<Output = Box<dyn GraphicsFlow<S, E>>>>>>;

/// GPU context, application state and surface status, bundled because they
/// become available together once the window exists.
#[derive(Debug)]
pub struct EngineState<State: 'static> {
    pub(crate) ctx: Context,
    state: State,
    surface_ready: bool,
}

impl<State: Default> EngineState<State> {
    async fn new(window: Arc<Window>) -> Self {
        let ctx = match Context::new(window).await {
            Ok(ctx) => ctx,
            Err(e) => panic!("engine bootstrap failed, no GPU context: {}", e),
        };
        Self {
            ctx,
            state: State::default(),
            surface_ready: false,
        }
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.surface_ready = true;
        self.ctx.config.width = width;
        self.ctx.config.height = height;
        self.ctx.projection.resize(width, height);
        self.ctx.surface.configure(&self.ctx.device, &self.ctx.config);
        self.ctx.depth_texture = Texture::depth(&self.ctx.device, [width, height], "depth buffer");
    }

    /// Integrate the camera controller and orbit the light, then push both
    /// uniforms to the GPU.
    fn advance_scene(&mut self, dt: Duration) {
        let ctx = &mut self.ctx;
        ctx.camera.controller.update(&mut ctx.camera.camera, dt);
        ctx.camera
            .uniform
            .update_view_proj(&ctx.camera.camera, &ctx.projection);
        ctx.queue.write_buffer(
            &ctx.camera.buffer,
            0,
            bytemuck::cast_slice(&[ctx.camera.uniform]),
        );

        let orbit = cgmath::Quaternion::from_axis_angle(
            (0.0, 1.0, 0.0).into(),
            cgmath::Deg(2.0 * dt.as_secs_f32()),
        );
        let position: cgmath::Vector3<f32> = ctx.light.uniform.position.into();
        ctx.light.uniform.position = (orbit * position).into();
        ctx.queue.write_buffer(
            &ctx.light.buffer,
            0,
            bytemuck::cast_slice(&[ctx.light.uniform]),
        );
    }

    #[cfg(feature = "integration-tests")]
    fn padded_dims(&self) -> (u32, u32) {
        // Texture-to-buffer copies need 256-byte row alignment, so the
        // capture target is padded up from the surface size.
        (
            self.ctx.config.width.div_ceil(256) * 256,
            self.ctx.config.height.div_ceil(256) * 256,
        )
    }

    #[cfg(feature = "integration-tests")]
    fn capture_extent(&self) -> wgpu::Extent3d {
        let (width, height) = self.padded_dims();
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        }
    }

    #[cfg(feature = "integration-tests")]
    fn capture_target(&self, format: wgpu::TextureFormat, label: &str) -> wgpu::Texture {
        self.ctx.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: self.capture_extent(),
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::COPY_SRC | wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        })
    }

    #[cfg(feature = "integration-tests")]
    fn copy_capture(&self, encoder: &mut wgpu::CommandEncoder, capture: &wgpu::Texture) -> wgpu::Buffer {
        let (width, height) = self.padded_dims();
        let texel = std::mem::size_of::<u32>() as u32;
        let buffer = self.ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("capture readback"),
            size: (texel * width * height) as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: capture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(texel * width),
                    rows_per_image: Some(height),
                },
            },
            self.capture_extent(),
        );
        buffer
    }

    /// Map the capture buffer and let every flow assert against the frame.
    /// Exits the loop once all flows report `Passed`.
    #[cfg(feature = "integration-tests")]
    fn check_capture<Event>(
        &mut self,
        flows: &mut Vec<Box<dyn GraphicsFlow<State, Event>>>,
        runtime: &Runtime,
        proxy: &EventLoopProxy<LoopEvent<State, Event>>,
        readback: &wgpu::Buffer,
    ) {
        let (width, height) = self.padded_dims();
        let slice = readback.slice(..);
        let mut frame = runtime.block_on(async {
            let (tx, rx) = futures_intrusive::channel::shared::oneshot_channel();
            slice.map_async(wgpu::MapMode::Read, move |result| {
                tx.send(result).unwrap();
            });
            self.ctx
                .device
                .poll(wgpu::PollType::Wait {
                    submission_index: None,
                    timeout: Some(Duration::from_secs(3)),
                })
                .unwrap();
            rx.receive().await.unwrap().unwrap();
            image::ImageBuffer::<image::Rgba<u8>, _>::from_raw(
                width,
                height,
                slice.get_mapped_range(),
            )
            .unwrap()
        });

        let all_passed = flows.iter_mut().all(|flow| {
            match flow.render_to_texture(&self.ctx, &mut self.state, &mut frame) {
                Err(e) => panic!("{}", e),
                Ok(ImageTestResult::Passed) => true,
                Ok(ImageTestResult::Failed) => panic!("golden image assertion failed"),
                Ok(ImageTestResult::Waiting) => false,
            }
        });
        if all_passed {
            proxy
                .send_event(LoopEvent::Exit)
                .expect("assertions passed but the event loop refused to exit");
        }
    }

    fn render<Event>(
        &mut self,
        flows: &mut Vec<Box<dyn GraphicsFlow<State, Event>>>,
        #[cfg(feature = "integration-tests")] runtime: &Runtime,
        #[cfg(feature = "integration-tests")] proxy: &EventLoopProxy<LoopEvent<State, Event>>,
    ) -> Result<(), SurfaceFrameError> {
        // Keep the loop spinning; winit only redraws on request.
        self.ctx.window.request_redraw();

        if !self.surface_ready {
            return Ok(());
        }
        let frame = match self.ctx.surface.get_current_texture() {
            wgpu::CurrentSurfaceTexture::Success(frame)
            | wgpu::CurrentSurfaceTexture::Suboptimal(frame) => frame,
            wgpu::CurrentSurfaceTexture::Timeout => return Err(SurfaceFrameError::Timeout),
            wgpu::CurrentSurfaceTexture::Occluded => return Err(SurfaceFrameError::Occluded),
            wgpu::CurrentSurfaceTexture::Outdated => return Err(SurfaceFrameError::Outdated),
            wgpu::CurrentSurfaceTexture::Lost => return Err(SurfaceFrameError::Lost),
            wgpu::CurrentSurfaceTexture::Validation => return Err(SurfaceFrameError::Validation),
        };

        #[cfg(feature = "integration-tests")]
        let (capture, capture_depth) = (
            self.capture_target(self.ctx.config.format, "capture colour"),
            self.capture_target(wgpu::TextureFormat::Depth32Float, "capture depth"),
        );
        #[cfg(feature = "integration-tests")]
        let color_view = capture.create_view(&wgpu::TextureViewDescriptor::default());
        #[cfg(not(feature = "integration-tests"))]
        let color_view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        #[cfg(feature = "integration-tests")]
        let capture_depth_view = capture_depth.create_view(&wgpu::TextureViewDescriptor::default());
        #[cfg(feature = "integration-tests")]
        let depth_view = &capture_depth_view;
        #[cfg(not(feature = "integration-tests"))]
        let depth_view = &self.ctx.depth_texture.view;

        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame encoder"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("frame pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &color_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.ctx.clear_colour),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
                multiview_mask: None,
            });

            if let Some(marker) = &self.ctx.light.model {
                pass.set_pipeline(&self.ctx.pipelines.light);
                pass.draw_light_model(marker, &self.ctx.camera.bind_group, &self.ctx.light.bind_group);
            }

            let mut opaque: Vec<Instanced> = Vec::new();
            let mut translucent: Vec<Instanced> = Vec::new();
            for flow in flows.iter() {
                flow.on_render()
                    .split_batches(&self.ctx, &mut pass, &mut opaque, &mut translucent);
            }

            pass.set_pipeline(&self.ctx.pipelines.basic);
            draw_batch(&mut pass, opaque, &self.ctx.camera.bind_group, &self.ctx.light.bind_group);
            pass.set_pipeline(&self.ctx.pipelines.transparent);
            draw_batch(&mut pass, translucent, &self.ctx.camera.bind_group, &self.ctx.light.bind_group);
        }

        #[cfg(feature = "integration-tests")]
        let readback = self.copy_capture(&mut encoder, &capture);

        self.ctx.queue.submit(iter::once(encoder.finish()));

        #[cfg(feature = "integration-tests")]
        self.check_capture(flows, runtime, proxy, &readback);

        frame.present();
        Ok(())
    }
}

/// Mirrors [`wgpu::CurrentSurfaceTexture`]'s non-frame outcomes so the render
/// loop can match on and log them the way it used to match `wgpu::SurfaceError`.
#[derive(Debug)]
enum SurfaceFrameError {
    Timeout,
    Occluded,
    Outdated,
    Lost,
    Validation,
}

impl std::fmt::Display for SurfaceFrameError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Timeout => write!(f, "surface texture acquisition timed out"),
            Self::Occluded => write!(f, "surface is occluded"),
            Self::Outdated => write!(f, "surface configuration is outdated"),
            Self::Lost => write!(f, "surface was lost"),
            Self::Validation => write!(f, "surface texture acquisition failed validation"),
        }
    }
}

/// Draw one pipeline's batch; the pipeline must already be set.
fn draw_batch<'a>(
    pass: &mut wgpu::RenderPass<'_>,
    batch: Vec<Instanced<'a>>,
    camera: &'a wgpu::BindGroup,
    light: &'a wgpu::BindGroup,
) {
    for item in batch {
        if item.amount == 0 || item.instance.size() == 0 {
            log::warn!("skipping a draw with zero instances");
            continue;
        }
        pass.set_vertex_buffer(1, item.instance.slice(..));
        pass.draw_model_instanced(item.model, 0..item.amount as u32, camera, light);
    }
}

/// User events of the winit loop: async init hand-off, pick results,
/// deferred state mutations and the custom events flows exchange.
#[allow(dead_code)]
pub(crate) enum LoopEvent<State: 'static, Event: 'static> {
    Ready {
        app: EngineState<State>,
        flows: Vec<Box<dyn GraphicsFlow<State, Event>>>,
    },
    Picked((u32, HashSet<usize>)),
    Apply(Box<dyn FnOnce(&mut State)>),
    Custom(Event),
    Exit,
}

impl<State, Event> Debug for LoopEvent<State, Event> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ready { app: _, flows } => f.debug_struct("Ready").field("flows", flows).finish(),
            Self::Picked(hit) => f.debug_tuple("Picked").field(hit).finish(),
            Self::Apply(_) => f.write_str("Apply(FnOnce(&mut State))"),
            Self::Custom(_) => f.write_str("Custom(..)"),
            Self::Exit => f.write_str("Exit"),
        }
    }
}

pub struct App<State: 'static, Event: 'static> {
    #[cfg(not(target_arch = "wasm32"))]
    async_runtime: tokio::runtime::Runtime,
    proxy: EventLoopProxy<LoopEvent<State, Event>>,
    state: Option<EngineState<State>>,
    flows: Vec<Box<dyn GraphicsFlow<State, Event>>>,
    // Consumed on resume; `Option` so they can be taken out of `&mut self`.
    constructors: Option<Vec<FlowConstructor<State, Event>>>,
    last_time: Instant,
    time_since_tick: Duration,
}

impl<State, Event> App<State, Event>
where
    State: 'static + Default,
    Event: 'static,
{
    fn new(
        event_loop: &EventLoop<LoopEvent<State, Event>>,
        constructors: Vec<FlowConstructor<State, Event>>,
    ) -> Self {
        Self {
            #[cfg(not(target_arch = "wasm32"))]
            async_runtime: tokio::runtime::Runtime::new().unwrap(),
            proxy: event_loop.create_proxy(),
            state: None,
            flows: Vec::new(),
            constructors: Some(constructors),
            last_time: Instant::now(),
            time_since_tick: Duration::from_millis(0),
        }
    }

    /// Run `hook` on every flow and resolve the returned effects.
    fn broadcast(
        &mut self,
        mut hook: impl FnMut(&mut dyn GraphicsFlow<State, Event>, &Context, &mut State) -> Effect<State, Event>,
    ) {
        let Some(app) = self.state.as_mut() else {
            return;
        };
        for flow in self.flows.iter_mut() {
            let effect = hook(flow.as_mut(), &app.ctx, &mut app.state);
            apply_effect(
                #[cfg(not(target_arch = "wasm32"))]
                &self.async_runtime,
                &mut app.state,
                &mut app.ctx,
                self.proxy.clone(),
                effect,
            );
        }
    }

    /// `on_init` is the one hook with mutable context access, so it can't
    /// go through [`broadcast`](Self::broadcast).
    fn init_flows(&mut self) {
        let Some(app) = self.state.as_mut() else {
            return;
        };
        for flow in self.flows.iter_mut() {
            let effect = flow.on_init(&mut app.ctx, &mut app.state);
            apply_effect(
                #[cfg(not(target_arch = "wasm32"))]
                &self.async_runtime,
                &mut app.state,
                &mut app.ctx,
                self.proxy.clone(),
                effect,
            );
        }
    }

    /// Notify every flow owning `pick_id` of the click.
    fn dispatch_click(&mut self, pick_id: u32, owners: HashSet<usize>) {
        let Some(app) = self.state.as_mut() else {
            return;
        };
        app.ctx.mouse.toggle(pick_id);
        if owners.len() > 1 {
            log::warn!("pick id {} is claimed by {} flows", pick_id, owners.len());
        }
        for index in owners {
            let Some(flow) = self.flows.get_mut(index) else {
                continue;
            };
            let effect = flow.on_click(&app.ctx, &mut app.state, pick_id);
            apply_effect(
                #[cfg(not(target_arch = "wasm32"))]
                &self.async_runtime,
                &mut app.state,
                &mut app.ctx,
                self.proxy.clone(),
                effect,
            );
        }
    }

    fn mouse_input(&mut self, button: MouseButton, pressed: bool) {
        let Some(app) = self.state.as_mut() else {
            return;
        };
        match (button, pressed) {
            (MouseButton::Left, true) => {
                app.ctx.mouse.pressed = MouseButtonState::Left;
                let hit = run_pick_pass::<State, Event>(
                    #[cfg(not(target_arch = "wasm32"))]
                    &self.async_runtime,
                    &mut self.flows,
                    &app.ctx,
                    #[cfg(target_arch = "wasm32")]
                    self.proxy.clone(),
                );
                if let Some((pick_id, owners)) = hit {
                    self.dispatch_click(pick_id, owners);
                }
            }
            (MouseButton::Right, true) => app.ctx.mouse.pressed = MouseButtonState::Right,
            (_, false) => app.ctx.mouse.pressed = MouseButtonState::None,
            _ => (),
        }
    }

    fn redraw(&mut self) {
        let dt = self.last_time.elapsed();
        self.last_time = Instant::now();
        self.time_since_tick += dt;

        let Some(app) = self.state.as_mut() else {
            return;
        };
        let outcome = app.render(
            &mut self.flows,
            #[cfg(feature = "integration-tests")]
            &self.async_runtime,
            #[cfg(feature = "integration-tests")]
            &self.proxy,
        );
        match outcome {
            Ok(()) => {
                let tick_due =
                    self.time_since_tick >= Duration::from_millis(app.ctx.tick_duration_millis);
                if tick_due {
                    self.time_since_tick = Duration::from_millis(0);
                    self.broadcast(|flow, ctx, state| flow.on_tick(ctx, state));
                }
                if let Some(app) = self.state.as_mut() {
                    app.advance_scene(dt);
                }
                self.broadcast(move |flow, ctx, state| flow.on_update(ctx, state, dt));
            }
            // A lost or outdated surface comes back after a reconfigure.
            Err(SurfaceFrameError::Lost | SurfaceFrameError::Outdated) => {
                if let Some(app) = self.state.as_mut() {
                    let size = app.ctx.window.inner_size();
                    app.resize(size.width, size.height);
                }
            }
            Err(e) => log::error!("frame could not be rendered: {}", e),
        }
    }
}

impl<State: 'static + Default, Event: 'static> ApplicationHandler<LoopEvent<State, Event>>
    for App<State, Event>
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        #[allow(unused_mut)]
        let mut attributes = Window::default_attributes();

        #[cfg(target_arch = "wasm32")]
        {
            use wasm_bindgen::JsCast;
            use winit::platform::web::WindowAttributesExtWebSys;

            let canvas = wgpu::web_sys::window()
                .and_then(|window| window.document())
                .and_then(|document| document.get_element_by_id("canvas"))
                .expect_throw("the page has no #canvas element to attach to");
            attributes = attributes.with_canvas(Some(canvas.unchecked_into()));
        }

        let window = Arc::new(event_loop.create_window(attributes).unwrap());
        let constructors = self.constructors.take().unwrap();

        let boot = async move {
            let app = EngineState::new(window).await;
            // Into clones device/queue handles, not the resources behind
            // them.
            let pending: Vec<_> = constructors
                .into_iter()
                .map(|build| build((&app.ctx).into()))
                .collect();
            let flows = futures::future::join_all(pending).await;
            (app, flows)
        };

        #[cfg(not(target_arch = "wasm32"))]
        {
            let (app, flows) = self.async_runtime.block_on(boot);
            self.flows = flows;
            self.state = Some(app);
            self.init_flows();
        }

        #[cfg(target_arch = "wasm32")]
        {
            let proxy = self.proxy.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let (app, flows) = boot.await;
                assert!(proxy.send_event(LoopEvent::Ready { app, flows }).is_ok());
            });
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: LoopEvent<State, Event>) {
        match event {
            // Hand-off from the async web bootstrap.
            LoopEvent::Ready { app, flows } => {
                self.flows = flows;
                self.state = Some(app);
                if let Some(app) = self.state.as_mut() {
                    let size = app.ctx.window.inner_size();
                    app.resize(size.width, size.height);
                }
                self.init_flows();
                if let Some(app) = &self.state {
                    app.ctx.window.request_redraw();
                }
            }
            LoopEvent::Picked((pick_id, owners)) => self.dispatch_click(pick_id, owners),
            LoopEvent::Apply(mutation) => {
                if let Some(app) = self.state.as_mut() {
                    mutation(&mut app.state);
                }
            }
            LoopEvent::Custom(custom) => {
                if let Some(app) = self.state.as_mut() {
                    let leftover = self.flows.iter_mut().fold(Some(custom), |event, flow| {
                        flow.on_custom_events(&app.ctx, &mut app.state, event?)
                    });
                    if leftover.is_some() {
                        log::warn!("a custom event was not consumed by any flow");
                    }
                }
            }
            LoopEvent::Exit => event_loop.exit(),
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: DeviceId,
        event: DeviceEvent,
    ) {
        if let Some(app) = self.state.as_mut() {
            if let DeviceEvent::MouseMotion { delta: (dx, dy) } = event {
                // Orbiting only engages while the right button is held.
                if let MouseButtonState::Right = app.ctx.mouse.pressed {
                    const ORBIT_SPEED: f64 = 5.0;
                    app.ctx
                        .camera
                        .controller
                        .handle_mouse(dx * ORBIT_SPEED, dy * ORBIT_SPEED);
                }
            }
        }
        self.broadcast(|flow, ctx, state| flow.on_device_events(ctx, state, &event));
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let Some(app) = self.state.as_mut() else {
            return;
        };
        app.ctx.camera.controller.handle_window_events(&event);
        if let WindowEvent::CursorMoved { position, .. } = event {
            app.ctx.mouse.coords = position;
        }

        self.broadcast(|flow, ctx, state| flow.on_window_events(ctx, state, &event));

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => {
                if let Some(app) = self.state.as_mut() {
                    app.resize(size.width, size.height);
                }
            }
            WindowEvent::RedrawRequested => self.redraw(),
            WindowEvent::MouseInput {
                state: button_state,
                button,
                ..
            } => self.mouse_input(button, button_state.is_pressed()),
            _ => (),
        }
    }
}

/// Resolve one hook's [`Effect`] against the platform's async runtime.
#[cfg_attr(target_arch = "wasm32", allow(unused_variables))]
fn apply_effect<State, Event>(
    #[cfg(not(target_arch = "wasm32"))] runtime: &tokio::runtime::Runtime,
    state: &mut State,
    ctx: &mut Context,
    proxy: EventLoopProxy<LoopEvent<State, Event>>,
    effect: Effect<State, Event>,
) {
    match effect {
        Effect::Events(pending) => {
            let resolve =
                async move { futures::future::join_all(pending.into_iter().map(Pin::from)).await };
            #[cfg(not(target_arch = "wasm32"))]
            for event in runtime.block_on(resolve) {
                if let Err(e) = proxy.send_event(LoopEvent::Custom(event)) {
                    log::error!("{}", e);
                    panic!("the event loop closed before all queued events were delivered");
                }
            }
            #[cfg(target_arch = "wasm32")]
            wasm_bindgen_futures::spawn_local(async move {
                for event in resolve.await {
                    assert!(proxy.send_event(LoopEvent::Custom(event)).is_ok());
                }
            });
        }
        Effect::Mutations(pending) => {
            let resolve =
                async move { futures::future::join_all(pending.into_iter().map(Pin::from)).await };
            // Natively the mutations apply right here; on the web they come
            // back through the event queue once resolved.
            #[cfg(not(target_arch = "wasm32"))]
            for mutation in runtime.block_on(resolve) {
                mutation(state);
            }
            #[cfg(target_arch = "wasm32")]
            wasm_bindgen_futures::spawn_local(async move {
                for mutation in resolve.await {
                    assert!(proxy.send_event(LoopEvent::Apply(mutation)).is_ok());
                }
            });
        }
        Effect::Configure(configure) => configure(ctx),
        Effect::Nothing => (),
    }
}

/// Build the event loop and drive `constructors` until the window closes.
pub fn run<State: 'static + Default, Event: 'static>(
    constructors: Vec<FlowConstructor<State, Event>>,
) -> anyhow::Result<()> {
    #[cfg(not(target_arch = "wasm32"))]
    if let Err(e) = env_logger::try_init() {
        println!("Warning: Could not initialize logger: {}", e);
    }
    #[cfg(target_arch = "wasm32")]
    console_log::init_with_level(log::Level::Info).unwrap_throw();

    let event_loop = build_event_loop::<State, Event>()?;
    let mut app: App<State, Event> = App::new(&event_loop, constructors);
    event_loop.run_app(&mut app)?;
    Ok(())
}

fn build_event_loop<State: 'static, Event: 'static>()
-> anyhow::Result<EventLoop<LoopEvent<State, Event>>> {
    // Tests drive the loop from the harness thread, which winit only
    // permits with the platform any_thread escape hatches.
    #[cfg(all(feature = "integration-tests", target_os = "linux"))]
    let event_loop = {
        use winit::platform::wayland::EventLoopBuilderExtWayland;
        EventLoop::with_user_event().with_any_thread(true).build()?
    };

    #[cfg(all(feature = "integration-tests", target_os = "windows"))]
    let event_loop = {
        use winit::platform::windows::EventLoopBuilderExtWindows;
        EventLoop::with_user_event().with_any_thread(true).build()?
    };

    #[cfg(not(all(
        feature = "integration-tests",
        any(target_os = "linux", target_os = "windows")
    )))]
    let event_loop = EventLoop::with_user_event().build()?;

    Ok(event_loop)
}
