//! The GPU and window context shared by all flows.
//!
//! One [`Context`] exists per application. It owns the surface, device and
//! queue, the camera and light resources, the depth attachment and the
//! pipeline set, plus the runtime-configurable bits flows may change from
//! `on_init` or through `Effect::Configure`: clear colour, tick duration
//! and the camera pose.

use std::sync::Arc;

use anyhow::{Context as _, Result};
use winit::{
    dpi::{PhysicalPosition, PhysicalSize},
    window::Window,
};

use crate::{
    camera::{Camera, CameraController, CameraResources, Projection},
    data_structures::texture::Texture,
    pipelines::{
        Pipelines,
        light::{LightResources, LightUniform},
    },
};

/// Which mouse button is currently held, if any.
#[derive(Debug)]
pub enum MouseButtonState {
    Left,
    Right,
    None,
}

/// Cursor position, held button and the currently picked object, if any.
#[derive(Debug)]
pub struct MouseState {
    pub coords: PhysicalPosition<f64>,
    pub pressed: MouseButtonState,
    pub selection: Option<u32>,
}

impl MouseState {
    /// Select `id`, or clear the selection when `id` was already selected.
    pub fn toggle(&mut self, id: u32) {
        self.selection = match self.selection {
            Some(current) if current == id => None,
            _ => Some(id),
        };
    }
}

impl Default for MouseState {
    fn default() -> Self {
        Self {
            coords: (0.0, 0.0).into(),
            pressed: MouseButtonState::None,
            selection: None,
        }
    }
}

/// The slice of the context handed to flow constructors.
///
/// Device and queue are reference counted internally, so this is cheap to
/// produce and lets constructors upload geometry before the first frame.
#[derive(Debug)]
pub struct InitContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
}

impl From<&Context> for InitContext {
    fn from(ctx: &Context) -> Self {
        Self {
            device: ctx.device.clone(),
            queue: ctx.queue.clone(),
            config: ctx.config.clone(),
        }
    }
}

#[derive(Debug)]
pub struct Context {
    pub(crate) window: Arc<Window>,
    pub(crate) depth_texture: Texture,
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub camera: CameraResources,
    pub projection: Projection,
    pub light: LightResources,
    pub pipelines: Pipelines,
    pub mouse: MouseState,
    pub clear_colour: wgpu::Color,
    pub tick_duration_millis: u64,
}

impl Context {
    pub async fn new(window: Arc<Window>) -> Result<Self> {
        let size = window.inner_size();

        log::info!("requesting GPU adapter");
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            // WebGL is the widest-supported browser backend; everywhere
            // else the primary native backends are fine.
            #[cfg(not(target_arch = "wasm32"))]
            backends: wgpu::Backends::PRIMARY,
            #[cfg(target_arch = "wasm32")]
            backends: wgpu::Backends::GL,
            ..wgpu::InstanceDescriptor::new_without_display_handle()
        });
        let surface = instance.create_surface(window.clone())?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("no compatible GPU adapter found")?;

        log::info!("requesting device and queue");
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: None,
                required_features: wgpu::Features::empty(),
                // WebGL can't provide the full default limits.
                required_limits: if cfg!(target_arch = "wasm32") {
                    wgpu::Limits::downlevel_webgl2_defaults()
                } else {
                    wgpu::Limits::default()
                },
                memory_hints: Default::default(),
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                trace: wgpu::Trace::Off,
            })
            .await?;

        let config = surface_config(&surface, &adapter, size);

        let projection =
            Projection::new(config.width, config.height, cgmath::Deg(45.0), 1.0, 2000.0);
        let camera = CameraResources::new(
            &device,
            // A vantage point a character rig fills nicely; flows override
            // this in on_init.
            Camera::new((0.0, 60.0, 160.0), cgmath::Deg(-90.0), cgmath::Deg(-15.0)),
            &projection,
            CameraController::new(40.0, 0.4),
        );

        let light = LightResources::new(
            LightUniform::new([80.0, 120.0, 100.0], [1.0, 1.0, 1.0]),
            None,
            &device,
        );
        let depth_texture = Texture::depth(&device, [config.width, config.height], "depth buffer");
        let pipelines = Pipelines::new(
            &device,
            &config,
            &camera.bind_group_layout,
            &light.bind_group_layout,
        );

        Ok(Self {
            window,
            depth_texture,
            surface,
            device,
            queue,
            config,
            camera,
            projection,
            light,
            pipelines,
            mouse: MouseState::default(),
            clear_colour: wgpu::Color {
                r: 0.02,
                g: 0.02,
                b: 0.03,
                a: 1.0,
            },
            tick_duration_millis: 500,
        })
    }
}

fn surface_config(
    surface: &wgpu::Surface,
    adapter: &wgpu::Adapter,
    size: PhysicalSize<u32>,
) -> wgpu::SurfaceConfiguration {
    let caps = surface.get_capabilities(adapter);
    // The shape shader writes linear colour and relies on an sRGB swapchain
    // for the transfer curve.
    let format = caps
        .formats
        .iter()
        .copied()
        .find(|format| format.is_srgb())
        .unwrap_or(caps.formats[0]);
    wgpu::SurfaceConfiguration {
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        format,
        width: size.width,
        height: size.height,
        present_mode: caps.present_modes[0],
        alpha_mode: caps.alpha_modes[0],
        view_formats: vec![],
        desired_maximum_frame_latency: 2,
    }
}
