use crate::{
    data_structures::{
        instance::InstanceRaw,
        model::{ShapeVertex, Vertex, colour_layout},
        texture::Texture,
    },
    pipelines::build_pipeline,
};

/// The opaque colour-material pipeline running the shape shader.
pub fn build(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    camera_layout: &wgpu::BindGroupLayout,
    light_layout: &wgpu::BindGroupLayout,
) -> wgpu::RenderPipeline {
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("shape pipeline layout"),
        bind_group_layouts: &[Some(&colour_layout(device)), Some(camera_layout), Some(light_layout)],
        immediate_size: 0,
    });

    build_pipeline(
        device,
        &layout,
        "opaque shapes",
        config.format,
        Some(wgpu::BlendState::REPLACE),
        Some(Texture::DEPTH_FORMAT),
        &[ShapeVertex::desc(), InstanceRaw::desc()],
        wgpu::ShaderModuleDescriptor {
            label: Some("shape shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shape_shader.wgsl").into()),
        },
    )
}
