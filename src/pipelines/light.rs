use wgpu::util::DeviceExt;

use crate::{
    data_structures::{
        model::{Model, ShapeVertex, Vertex},
        texture::Texture,
    },
    pipelines::build_pipeline,
};

/// The single scene light: uniform data as the shaders see it.
///
/// Uniform buffers are padded to 16-byte rows, hence the filler fields.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightUniform {
    pub position: [f32; 3],
    pub _padding: u32,
    pub color: [f32; 3],
    pub _padding2: u32,
}

impl LightUniform {
    pub fn new(position: [f32; 3], color: [f32; 3]) -> Self {
        Self {
            position,
            _padding: 0,
            color,
            _padding2: 0,
        }
    }
}

/// GPU resources of the scene light, plus an optional marker model drawn at
/// the light position (handy while tuning a scene).
#[derive(Debug)]
pub struct LightResources {
    pub model: Option<Model>,
    pub uniform: LightUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl LightResources {
    pub fn new(uniform: LightUniform, model: Option<Model>, device: &wgpu::Device) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("light uniform buffer"),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group_layout = layout(device);
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some("light bind group"),
        });
        Self {
            model,
            uniform,
            buffer,
            bind_group,
            bind_group_layout,
        }
    }
}

/// Bind group layout of the light uniform, shared by the lit pipelines.
pub fn layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
        label: Some("light bind group layout"),
    })
}

/// Pipeline drawing the light marker model in the light colour.
pub fn build(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    camera_layout: &wgpu::BindGroupLayout,
) -> wgpu::RenderPipeline {
    let light_layout = layout(device);
    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("light marker pipeline layout"),
        bind_group_layouts: &[Some(camera_layout), Some(&light_layout)],
        immediate_size: 0,
    });

    build_pipeline(
        device,
        &pipeline_layout,
        "light marker",
        config.format,
        Some(wgpu::BlendState::REPLACE),
        Some(Texture::DEPTH_FORMAT),
        &[ShapeVertex::desc()],
        wgpu::ShaderModuleDescriptor {
            label: Some("light shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("light.wgsl").into()),
        },
    )
}
