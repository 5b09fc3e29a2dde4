//! GPU picking: resolving a click to the object under the cursor.
//!
//! Every pickable shape carries a `u32` id. On left-click the scene is
//! re-rendered into an offscreen `R32Uint` target with the ids as fragment
//! output, the texel under the cursor is read back, and the id is mapped to
//! the flows that registered it. Only those flows get an `on_click`.
//!
//! Readback is asynchronous on the GPU side: native builds block on the
//! tokio runtime, web builds resolve through `spawn_local` and report the
//! result back to the event loop as a `Picked` user event.

use std::{
    collections::{HashMap, HashSet},
    iter,
};

use crate::{
    context::Context,
    data_structures::model::{DrawModel, Material, Mesh, Model},
    flow::GraphicsFlow,
    render::Instanced,
};

#[cfg(target_arch = "wasm32")]
use crate::flow::LoopEvent;

/// Copy-to-buffer rows must be 256-byte aligned; round a texel count up so
/// a 4-byte-per-texel row satisfies that with room to spare.
fn padded(texels: u32) -> u32 {
    texels.div_ceil(256) * 256
}

fn offscreen_target(
    device: &wgpu::Device,
    extent: wgpu::Extent3d,
    format: wgpu::TextureFormat,
    label: &str,
) -> wgpu::Texture {
    device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: extent,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::COPY_SRC | wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    })
}

/// Twin of a model whose material uniform carries a pick id instead of a
/// colour. The pick shader reads the id straight from the uniform slot,
/// which keeps the bind group layout identical to regular shapes.
pub fn pick_variant(device: &wgpu::Device, id: u32, meshes: Vec<Mesh>) -> Model {
    let meshes = meshes
        .into_iter()
        .map(|mut mesh| {
            mesh.material = 0;
            mesh
        })
        .collect();
    Model {
        meshes,
        materials: vec![Material::new_pick_material(device, "pick material", id)],
    }
}

/// Render every flow's pickable shapes as ids and resolve the texel under
/// the cursor.
///
/// Returns `Some((id, owning_flows))` on native builds. On the web the
/// readback cannot block, so this returns `None` immediately and the result
/// arrives later as a `Picked` user event through `proxy`.
pub fn run_pick_pass<State, Event>(
    #[cfg(not(target_arch = "wasm32"))] runtime: &tokio::runtime::Runtime,
    flows: &mut Vec<Box<dyn GraphicsFlow<State, Event>>>,
    ctx: &Context,
    #[cfg(target_arch = "wasm32")] proxy: winit::event_loop::EventLoopProxy<
        LoopEvent<State, Event>,
    >,
) -> Option<(u32, HashSet<usize>)> {
    let width = padded(ctx.config.width);
    let height = padded(ctx.config.height);
    // The pick target is larger than the surface, so cursor coordinates
    // scale up accordingly.
    let scale_x = f64::from(width) / f64::from(ctx.config.width);
    let scale_y = f64::from(height) / f64::from(ctx.config.height);
    let extent = wgpu::Extent3d {
        width,
        height,
        depth_or_array_layers: 1,
    };

    let id_target = offscreen_target(&ctx.device, extent, wgpu::TextureFormat::R32Uint, "pick ids");
    let depth_target = offscreen_target(
        &ctx.device,
        extent,
        wgpu::TextureFormat::Depth24Plus,
        "pick depth",
    );

    let mut encoder = ctx
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("pick encoder"),
        });

    let mut owners: HashMap<u32, HashSet<usize>> = HashMap::new();
    {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("pick pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &id_target.create_view(&wgpu::TextureViewDescriptor::default()),
                resolve_target: None,
                ops: wgpu::Operations {
                    // Id 0 doubles as the "clicked nothing" result.
                    load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &depth_target.create_view(&wgpu::TextureViewDescriptor::default()),
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            multiview_mask: None,
            occlusion_query_set: None,
            timestamp_writes: None,
        });

        let mut pickable: Vec<Instanced> = Vec::new();
        for (index, flow) in flows.iter().enumerate() {
            let render = flow.on_render();
            render.collect_ids(index, &mut owners);
            render.pickable_batches(&mut pickable);
        }

        pass.set_pipeline(&ctx.pipelines.pick);
        for item in &pickable {
            if item.id == 0 {
                continue;
            }
            let amount = match u32::try_from(item.amount) {
                Ok(amount) => amount,
                Err(_) => {
                    log::error!(
                        "object {} has {} instances, more than the pick pass can draw",
                        item.id,
                        item.amount
                    );
                    continue;
                }
            };
            let id_model = pick_variant(&ctx.device, item.id, item.model.meshes.clone());
            pass.set_vertex_buffer(1, item.instance.slice(..));
            pass.draw_model_instanced(
                &id_model,
                0..amount,
                &ctx.camera.bind_group,
                &ctx.light.bind_group,
            );
        }
    }

    let texel = std::mem::size_of::<u32>() as u32;
    let readback = ctx.device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("pick readback"),
        size: (texel * width * height) as wgpu::BufferAddress,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });
    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            texture: &id_target,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &readback,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(texel * width),
                rows_per_image: Some(height),
            },
        },
        extent,
    );
    ctx.queue.submit(iter::once(encoder.finish()));

    let cursor = ctx.mouse.coords;

    #[cfg(target_arch = "wasm32")]
    {
        let device = ctx.device.clone();
        wasm_bindgen_futures::spawn_local(async move {
            let slice = readback.slice(..);
            let id = read_pick_texel(slice, &device, width, height, scale_x, scale_y, cursor).await;
            if let Some(flow_ids) = owners.get(&id) {
                assert!(
                    proxy
                        .send_event(LoopEvent::Picked((id, flow_ids.clone())))
                        .is_ok()
                );
                readback.unmap();
            }
        });
        return None;
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        let slice = readback.slice(..);
        let id = runtime.block_on(read_pick_texel(
            slice,
            &ctx.device,
            width,
            height,
            scale_x,
            scale_y,
            cursor,
        ));
        return owners.get(&id).map(|flow_ids| (id, flow_ids.clone()));
    }
}

/// Map the readback buffer and return the id at the (scaled) cursor
/// position, or `0` when the cursor falls outside the target.
async fn read_pick_texel(
    slice: wgpu::BufferSlice<'_>,
    device: &wgpu::Device,
    width: u32,
    height: u32,
    scale_x: f64,
    scale_y: f64,
    cursor: winit::dpi::PhysicalPosition<f64>,
) -> u32 {
    // The mapping must be requested and the device polled before awaiting,
    // otherwise the callback never fires and the future deadlocks.
    let (tx, rx) = futures_intrusive::channel::shared::oneshot_channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        tx.send(result).unwrap();
    });
    #[cfg(target_arch = "wasm32")]
    device.poll(wgpu::PollType::Poll).unwrap();
    #[cfg(not(target_arch = "wasm32"))]
    device
        .poll(wgpu::PollType::Wait {
            submission_index: None,
            timeout: None,
        })
        .unwrap();
    rx.receive().await.unwrap().unwrap();

    let data = slice.get_mapped_range();
    let x = (cursor.x * scale_x) as usize;
    let y = (cursor.y * scale_y) as usize;
    if x >= width as usize || y >= height as usize {
        return 0;
    }
    let offset = (y * width as usize + x) * 4;
    if offset + 4 > data.len() {
        return 0;
    }
    let mut bytes = [0u8; 4];
    bytes.copy_from_slice(&data[offset..offset + 4]);
    let id = u32::from_le_bytes(bytes);

    log::info!("pick pass resolved id {}", id);
    id
}
