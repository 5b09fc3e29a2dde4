use crate::{
    data_structures::{
        instance::InstanceRaw,
        model::{ShapeVertex, Vertex, colour_layout},
    },
    pipelines::build_pipeline,
};

/// Pipeline writing pick ids into an `R32Uint` offscreen target.
///
/// Reuses the colour material's 16-byte uniform slot for the id, so pick
/// models bind with the same layout as regular shapes.
pub fn build(
    device: &wgpu::Device,
    camera_layout: &wgpu::BindGroupLayout,
) -> wgpu::RenderPipeline {
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("pick pipeline layout"),
        bind_group_layouts: &[Some(&colour_layout(device)), Some(camera_layout)],
        immediate_size: 0,
    });

    build_pipeline(
        device,
        &layout,
        "pick ids",
        wgpu::TextureFormat::R32Uint,
        // Integer targets cannot blend.
        None,
        Some(wgpu::TextureFormat::Depth24Plus),
        &[ShapeVertex::desc(), InstanceRaw::desc()],
        wgpu::ShaderModuleDescriptor {
            label: Some("pick shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("pick.wgsl").into()),
        },
    )
}
