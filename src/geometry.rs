//! Procedural primitive mesh builders.
//!
//! All scene content is hand-authored from these primitives; no model files
//! are loaded. Builders produce CPU-side [`MeshData`] which the scene graph
//! uploads into vertex/index buffers when a shape node is added.
//!
//! Cuboids carry per-face normals so they light flat, the way the blocky
//! character rigs are meant to look. Spheres use smooth per-vertex normals.

use anyhow::{Result, ensure};
use cgmath::{InnerSpace, Vector3};
use wgpu::util::DeviceExt;

use crate::data_structures::model::{Mesh, ShapeVertex};

/// CPU-side mesh: shape vertices plus triangle-list indices.
#[derive(Clone, Debug, Default)]
pub struct MeshData {
    pub vertices: Vec<ShapeVertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    /// Upload into GPU vertex/index buffers.
    pub fn upload(&self, device: &wgpu::Device, label: &str) -> Mesh {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} vertex buffer", label)),
            contents: bytemuck::cast_slice(&self.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} index buffer", label)),
            contents: bytemuck::cast_slice(&self.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Mesh {
            name: label.to_string(),
            vertex_buffer,
            index_buffer,
            num_elements: self.indices.len() as u32,
            material: 0,
        }
    }
}

/// Axis-aligned box centred on the origin with per-face normals.
///
/// 24 vertices (four per face) so that every face can carry its own normal.
pub fn cuboid(width: f32, height: f32, depth: f32) -> Result<MeshData> {
    ensure!(
        width > 0.0 && height > 0.0 && depth > 0.0,
        "cuboid extents must be positive, got {}x{}x{}",
        width,
        height,
        depth
    );
    let half = Vector3::new(width / 2.0, height / 2.0, depth / 2.0);

    // Each face is spanned by a right/up axis pair chosen so that
    // right x up = normal, which keeps the winding counter-clockwise
    // when seen from outside.
    let faces: [(Vector3<f32>, Vector3<f32>, Vector3<f32>); 6] = [
        (Vector3::unit_x(), -Vector3::unit_z(), Vector3::unit_y()),
        (-Vector3::unit_x(), Vector3::unit_z(), Vector3::unit_y()),
        (Vector3::unit_y(), Vector3::unit_x(), -Vector3::unit_z()),
        (-Vector3::unit_y(), Vector3::unit_x(), Vector3::unit_z()),
        (Vector3::unit_z(), Vector3::unit_x(), Vector3::unit_y()),
        (-Vector3::unit_z(), -Vector3::unit_x(), Vector3::unit_y()),
    ];

    let mut mesh = MeshData::default();
    for (normal, right, up) in faces {
        let centre = Vector3::new(normal.x * half.x, normal.y * half.y, normal.z * half.z);
        let r = Vector3::new(right.x * half.x, right.y * half.y, right.z * half.z);
        let u = Vector3::new(up.x * half.x, up.y * half.y, up.z * half.z);

        let base = mesh.vertices.len() as u32;
        for corner in [centre - r - u, centre + r - u, centre + r + u, centre - r + u] {
            mesh.vertices.push(ShapeVertex {
                position: corner.into(),
                normal: normal.into(),
            });
        }
        mesh.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
    Ok(mesh)
}

/// UV sphere centred on the origin with smooth normals.
///
/// `segments` counts the subdivisions around the Y axis, `rings` the stacks
/// from pole to pole.
pub fn uv_sphere(radius: f32, segments: u32, rings: u32) -> Result<MeshData> {
    ensure!(radius > 0.0, "sphere radius must be positive, got {}", radius);
    ensure!(
        segments >= 3 && rings >= 2,
        "sphere needs at least 3 segments and 2 rings, got {}x{}",
        segments,
        rings
    );

    let mut mesh = MeshData::default();
    for ring in 0..=rings {
        let phi = std::f32::consts::PI * ring as f32 / rings as f32;
        let y = phi.cos();
        let ring_radius = phi.sin();
        for segment in 0..=segments {
            let theta = std::f32::consts::TAU * segment as f32 / segments as f32;
            let normal = Vector3::new(ring_radius * theta.sin(), y, ring_radius * theta.cos());
            mesh.vertices.push(ShapeVertex {
                position: (normal * radius).into(),
                normal: normal.normalize().into(),
            });
        }
    }

    let stride = segments + 1;
    for ring in 0..rings {
        for segment in 0..segments {
            let a = ring * stride + segment;
            let b = (ring + 1) * stride + segment;
            mesh.indices.extend_from_slice(&[a, b, b + 1, a, b + 1, a + 1]);
        }
    }
    Ok(mesh)
}

/// Flat quad in the XZ plane facing up (+Y), centred on the origin.
pub fn plane(width: f32, depth: f32) -> Result<MeshData> {
    ensure!(
        width > 0.0 && depth > 0.0,
        "plane extents must be positive, got {}x{}",
        width,
        depth
    );
    let hw = width / 2.0;
    let hd = depth / 2.0;
    let normal = [0.0, 1.0, 0.0];
    let vertices = vec![
        ShapeVertex {
            position: [-hw, 0.0, -hd],
            normal,
        },
        ShapeVertex {
            position: [-hw, 0.0, hd],
            normal,
        },
        ShapeVertex {
            position: [hw, 0.0, hd],
            normal,
        },
        ShapeVertex {
            position: [hw, 0.0, -hd],
            normal,
        },
    ];
    Ok(MeshData {
        vertices,
        indices: vec![0, 1, 2, 0, 2, 3],
    })
}
