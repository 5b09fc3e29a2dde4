//! The depth attachment.
//!
//! Shape colour lives in uniform materials, so the only texture the engine
//! allocates for itself is the depth buffer. It is recreated on every
//! resize to match the surface.

/// A GPU texture together with its default view.
#[derive(Debug)]
pub struct Texture {
    #[allow(unused)]
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
}

impl Texture {
    /// Format of the depth attachment used by all depth-tested pipelines.
    pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

    /// Allocate a depth buffer matching `size` ([width, height] in pixels).
    ///
    /// Zero extents are clamped to one texel; winit reports 0x0 while a
    /// window is minimised.
    pub fn depth(device: &wgpu::Device, size: [u32; 2], label: &str) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: size[0].max(1),
                height: size[1].max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self { texture, view }
    }
}
