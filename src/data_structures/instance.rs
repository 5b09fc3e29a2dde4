//! Node poses and the per-draw payload derived from them.
//!
//! An [`Instance`] is the pose animation code mutates every frame; its
//! [`InstanceRaw`] form is what actually lands in the per-draw vertex
//! buffer. Scene graph nodes keep one local and one derived world pose
//! each, composed through the `Mul` impl below.

use std::ops::Mul;

use cgmath::{ElementWise, Matrix3, Matrix4, One, Quaternion, Rotation, Vector3};

use crate::data_structures::model;

/// Position, rotation and non-uniform scale of one scene node.
#[derive(Clone, Debug)]
pub struct Instance {
    pub position: Vector3<f32>,
    pub rotation: Quaternion<f32>,
    pub scale: Vector3<f32>,
}

impl Instance {
    /// The identity pose: origin, no rotation, unit scale.
    pub fn new() -> Self {
        Self {
            position: Vector3::new(0.0, 0.0, 0.0),
            rotation: Quaternion::one(),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }

    pub fn to_matrix(&self) -> Matrix4<f32> {
        Matrix4::from_translation(self.position)
            * Matrix4::from(self.rotation)
            * Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }

    pub fn to_raw(&self) -> InstanceRaw {
        InstanceRaw {
            model: self.to_matrix().into(),
            normal: Matrix3::from(self.rotation).into(),
        }
    }
}

impl<'a> Mul<&'a Instance> for &Instance {
    type Output = Instance;

    /// Compose parent ∘ child: the child's offset is scaled and rotated
    /// into the parent's frame before translating.
    fn mul(self, child: &'a Instance) -> Instance {
        let offset = self
            .rotation
            .rotate_vector(child.position.mul_element_wise(self.scale));
        Instance {
            position: self.position + offset,
            rotation: self.rotation * child.rotation,
            scale: self.scale.mul_element_wise(child.scale),
        }
    }
}

impl Mul for Instance {
    type Output = Instance;

    fn mul(self, child: Instance) -> Instance {
        &self * &child
    }
}

impl From<Vector3<f32>> for Instance {
    fn from(position: Vector3<f32>) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }
}

impl Default for Instance {
    fn default() -> Self {
        Self::new()
    }
}

/// GPU layout of one instance: the 4x4 world matrix followed by the 3x3
/// normal matrix.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct InstanceRaw {
    model: [[f32; 4]; 4],
    normal: [[f32; 3]; 3],
}

impl model::Vertex for InstanceRaw {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        // A mat4 occupies four vec4 slots, the normal matrix three vec3
        // slots; locations 5..=11 match the shape and pick shaders.
        const ATTRIBUTES: [wgpu::VertexAttribute; 7] = wgpu::vertex_attr_array![
            5 => Float32x4,
            6 => Float32x4,
            7 => Float32x4,
            8 => Float32x4,
            9 => Float32x3,
            10 => Float32x3,
            11 => Float32x3,
        ];
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<InstanceRaw>() as wgpu::BufferAddress,
            // One stride per drawn instance, not per vertex.
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &ATTRIBUTES,
        }
    }
}
