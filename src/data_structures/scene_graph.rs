//! Scene graph and hierarchical scene organization.
//!
//! The scene graph is a flat arena of nodes. Every node carries a local
//! transform, a derived world transform and an optional GPU shape (one
//! procedural mesh with a colour material and a single-entry instance
//! buffer). Nodes are registered under unique string keys so character rigs
//! can address their components ("wing_l", "tail_2", "nose", ...) by name.
//!
//! Parents are always inserted before their children, which lets
//! [`SceneGraph::update_world_transforms`] derive world transforms in one
//! forward pass: `world = parent_world * local`.

use std::collections::HashMap;

use anyhow::{Result, ensure};
use log::warn;
use wgpu::util::DeviceExt;

use crate::{
    data_structures::{
        instance::Instance,
        model::{Material, Model},
    },
    geometry::MeshData,
    render::{Instanced, Render},
};

/// Handle to a node inside a [`SceneGraph`].
///
/// Ids are only meaningful for the graph that created them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// Visual description of a shape node.
#[derive(Clone, Copy, Debug)]
pub struct ShapeDesc {
    pub colour: [f32; 4],
    /// Routes the shape through the alpha-blended pipeline.
    pub transparent: bool,
    /// Id written to the pick buffer. `0` marks the shape as not pickable.
    pub pick_id: u32,
}

impl Default for ShapeDesc {
    fn default() -> Self {
        Self {
            colour: [1.0, 1.0, 1.0, 1.0],
            transparent: false,
            pick_id: 0,
        }
    }
}

/// GPU data of a shape node: uploaded model plus its instance buffer.
#[derive(Debug)]
pub struct Shape {
    pub model: Model,
    pub instance_buffer: wgpu::Buffer,
    pub id: u32,
    pub transparent: bool,
    colour_dirty: bool,
}

#[derive(Debug)]
struct Node {
    parent: Option<NodeId>,
    local: Instance,
    world: Instance,
    visible: bool,
    shape: Option<Shape>,
}

/// Arena of named scene nodes with parent-child transform propagation.
#[derive(Debug, Default)]
pub struct SceneGraph {
    nodes: Vec<Node>,
    names: HashMap<String, NodeId>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a transform-only node. Groups are the pivots of a rig: a wing
    /// rotates around its group origin, not around the shape's centre.
    pub fn add_group(
        &mut self,
        name: &str,
        parent: Option<NodeId>,
        local: Instance,
    ) -> Result<NodeId> {
        self.insert(name, parent, local, None)
    }

    /// Insert a node with an uploaded mesh and a fresh colour material.
    pub fn add_shape(
        &mut self,
        device: &wgpu::Device,
        name: &str,
        parent: Option<NodeId>,
        mesh: MeshData,
        desc: ShapeDesc,
        local: Instance,
    ) -> Result<NodeId> {
        let mesh = mesh.upload(device, name);
        let material = Material::new(device, name, desc.colour);
        let model = Model {
            meshes: vec![mesh],
            materials: vec![material],
        };

        let instance_data = [local.to_raw()];
        let instance_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} instance buffer", name)),
            contents: bytemuck::cast_slice(&instance_data),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });

        let shape = Shape {
            model,
            instance_buffer,
            id: desc.pick_id,
            transparent: desc.transparent,
            colour_dirty: false,
        };
        self.insert(name, parent, local, Some(shape))
    }

    fn insert(
        &mut self,
        name: &str,
        parent: Option<NodeId>,
        local: Instance,
        shape: Option<Shape>,
    ) -> Result<NodeId> {
        ensure!(
            !self.names.contains_key(name),
            "scene graph already contains a node named {}",
            name
        );
        if let Some(parent) = parent {
            ensure!(
                parent.0 < self.nodes.len(),
                "parent node {:?} does not exist",
                parent
            );
        }
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent,
            world: local.clone(),
            local,
            visible: true,
            shape,
        });
        self.names.insert(name.to_string(), id);
        Ok(id)
    }

    /// Look up a node by its component key.
    pub fn node(&self, name: &str) -> Option<NodeId> {
        self.names.get(name).copied()
    }

    pub fn local(&self, id: NodeId) -> &Instance {
        &self.nodes[id.0].local
    }

    pub fn local_mut(&mut self, id: NodeId) -> &mut Instance {
        &mut self.nodes[id.0].local
    }

    /// World transform as derived by the last
    /// [`update_world_transforms`](Self::update_world_transforms) pass.
    pub fn world(&self, id: NodeId) -> &Instance {
        &self.nodes[id.0].world
    }

    pub fn set_visible(&mut self, id: NodeId, visible: bool) {
        self.nodes[id.0].visible = visible;
    }

    /// Change the RGB part of a shape's material. No-op with a warning for
    /// group nodes.
    pub fn set_colour(&mut self, id: NodeId, rgb: [f32; 3]) {
        match &mut self.nodes[id.0].shape {
            Some(shape) => {
                let material = &mut shape.model.materials[0];
                material.colour[..3].copy_from_slice(&rgb);
                shape.colour_dirty = true;
            }
            None => warn!("you attempted to re-colour a group node"),
        }
    }

    /// Change the alpha of a shape's material. Only visible on transparent
    /// shapes.
    pub fn set_opacity(&mut self, id: NodeId, alpha: f32) {
        match &mut self.nodes[id.0].shape {
            Some(shape) => {
                shape.model.materials[0].colour[3] = alpha;
                shape.colour_dirty = true;
            }
            None => warn!("you attempted to set opacity on a group node"),
        }
    }

    /// Derive all world transforms from the local ones in one forward pass.
    ///
    /// Parents precede children in the arena, so each node can rely on its
    /// parent's world transform being up to date already.
    pub fn update_world_transforms(&mut self) {
        for i in 0..self.nodes.len() {
            let parent_world = self.nodes[i]
                .parent
                .map(|parent| self.nodes[parent.0].world.clone());
            let node = &mut self.nodes[i];
            node.world = match parent_world {
                Some(parent_world) => &parent_world * &node.local,
                None => node.local.clone(),
            };
        }
    }

    /// Push world transforms and dirty material colours to the GPU.
    pub fn write_to_buffers(&mut self, queue: &wgpu::Queue) {
        for node in &mut self.nodes {
            if let Some(shape) = &mut node.shape {
                let raw = [node.world.to_raw()];
                queue.write_buffer(&shape.instance_buffer, 0, bytemuck::cast_slice(&raw));
                if shape.colour_dirty {
                    shape.model.materials[0].upload(queue);
                    shape.colour_dirty = false;
                }
            }
        }
    }

    /// Collect all visible shapes into a render batch, split into the opaque
    /// and transparent pipelines.
    pub fn get_render<'a, 'pass>(&'a self) -> Render<'a, 'pass>
    where
        'pass: 'a,
    {
        let mut opaque: Vec<Instanced<'a>> = Vec::new();
        let mut transparent: Vec<Instanced<'a>> = Vec::new();
        for node in &self.nodes {
            if !node.visible {
                continue;
            }
            if let Some(shape) = &node.shape {
                let instanced = Instanced {
                    instance: &shape.instance_buffer,
                    model: &shape.model,
                    amount: 1,
                    id: shape.id,
                };
                if shape.transparent {
                    transparent.push(instanced);
                } else {
                    opaque.push(instanced);
                }
            }
        }
        Render::Composed(vec![
            Render::Defaults(opaque),
            Render::Transparents(transparent),
        ])
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
