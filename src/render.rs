//! Render composition.
//!
//! Flows describe what they want drawn by returning a [`Render`] from
//! `on_render`. The event loop flattens those trees into per-pipeline
//! batches so pipeline switches happen once per frame, not once per object.

use std::collections::{HashMap, HashSet};

use wgpu::RenderPass;

use crate::context::Context;

/// One instanced draw: a model, its instance buffer and a pick id.
///
/// `id` is written to the pick target during the pick pass; `0` marks the
/// object as not clickable.
pub struct Instanced<'a> {
    pub instance: &'a wgpu::Buffer,
    pub model: &'a crate::data_structures::model::Model,
    pub amount: usize,
    pub id: u32,
}

/// A flow's renderable content for one frame.
///
/// `Default`/`Defaults` feed the opaque pipeline, `Transparent`/
/// `Transparents` the alpha-blended one. `Composed` nests further renders,
/// and `Custom` hands the render pass to a caller-supplied closure (which
/// then also has to handle its own picking).
pub enum Render<'a, 'pass>
where
    'pass: 'a,
{
    None,
    Default(Instanced<'a>),
    Defaults(Vec<Instanced<'a>>),
    Transparent(Instanced<'a>),
    Transparents(Vec<Instanced<'a>>),
    Composed(Vec<Render<'a, 'pass>>),
    Custom(Box<dyn 'a + FnOnce(&Context, &mut wgpu::RenderPass<'pass>) -> ()>),
}

impl<'a, 'pass> Render<'a, 'pass> {
    /// Record which flow owns which pick ids.
    ///
    /// Walks the tree and adds `flow_index` to the owner set of every
    /// non-zero id, so a pick result only wakes the flows that can handle
    /// it. The same id may be claimed by several flows.
    pub(crate) fn collect_ids(&self, flow_index: usize, owners: &mut HashMap<u32, HashSet<usize>>) {
        let mut note = |id: u32| {
            if id == 0 {
                return;
            }
            owners.entry(id).or_default().insert(flow_index);
        };
        match self {
            Render::Default(one) | Render::Transparent(one) => note(one.id),
            Render::Defaults(many) | Render::Transparents(many) => {
                for instanced in many {
                    note(instanced.id);
                }
            }
            Render::Composed(children) => {
                for child in children {
                    child.collect_ids(flow_index, owners);
                }
            }
            Render::None | Render::Custom(_) => (),
        }
    }

    /// Flatten the tree into the opaque and translucent batches, running
    /// any `Custom` closures against the pass on the way.
    pub(crate) fn split_batches(
        self,
        ctx: &Context,
        pass: &mut RenderPass<'pass>,
        opaque: &mut Vec<Instanced<'a>>,
        translucent: &mut Vec<Instanced<'a>>,
    ) {
        match self {
            Render::Default(one) => opaque.push(one),
            Render::Defaults(mut many) => opaque.append(&mut many),
            Render::Transparent(one) => translucent.push(one),
            Render::Transparents(mut many) => translucent.append(&mut many),
            Render::Composed(children) => {
                for child in children {
                    child.split_batches(ctx, pass, opaque, translucent);
                }
            }
            Render::Custom(draw) => draw(ctx, pass),
            Render::None => (),
        }
    }

    /// Flatten the tree for the pick pass. Opacity doesn't matter there,
    /// and `Custom` renders are skipped (they pick for themselves).
    pub(crate) fn pickable_batches(self, out: &mut Vec<Instanced<'a>>) {
        match self {
            Render::Default(one) | Render::Transparent(one) => out.push(one),
            Render::Defaults(mut many) | Render::Transparents(mut many) => out.append(&mut many),
            Render::Composed(children) => {
                for child in children {
                    child.pickable_batches(out);
                }
            }
            Render::None | Render::Custom(_) => (),
        }
    }
}
