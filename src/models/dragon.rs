//! The dragon rig: a blocky character assembled from cuboids.
//!
//! The dragon is built once into its own scene graph under named component
//! keys ("wing_l", "tail_2", "nostril_r", ...). At runtime two kinds of
//! motion touch the rig:
//!
//! - [`run`](Dragon::run) applies the idle pose every frame: wings flap and
//!   the tail sways on closed-form sine formulas over the elapsed time.
//! - [`start_sneeze`](Dragon::start_sneeze) returns a tween timeline that
//!   plays the three-stage sneeze (wind-up, snap, recovery) against disjoint
//!   channels (head, chest, nostrils, eyes), so both kinds of motion can run
//!   at the same time.
//!
//! The sneeze's particle side effect is decoupled from the rig: at the snap
//! the timeline records the blast strength, and the hosting flow drains it
//! with [`take_blast`](Dragon::take_blast) to spawn smoke or fire.

use std::f32::consts::TAU;

use anyhow::Result;
use cgmath::{Quaternion, Rad, Rotation3, Vector3};
use instant::Duration;

use crate::{
    data_structures::{
        instance::Instance,
        scene_graph::{NodeId, SceneGraph, ShapeDesc},
    },
    geometry::cuboid,
    tween::{Ease, Lerp, Timeline},
};

const GREEN: [f32; 4] = [0.365, 0.651, 0.514, 1.0];
const PALE_GREEN: [f32; 4] = [0.55, 0.76, 0.64, 1.0];
const PINK: [f32; 4] = [0.93, 0.57, 0.55, 1.0];
const WHITE: [f32; 4] = [0.98, 0.98, 0.96, 1.0];
const DARK: [f32; 4] = [0.16, 0.12, 0.14, 1.0];

/// Wing roll when the flap sine is at zero.
const WING_REST: f32 = 0.4;
/// Phase lag between neighbouring tail segments, producing the travelling wave.
const TAIL_PHASE_LAG: f32 = 0.6;
/// Radians of yaw per unit of tail amplitude.
const TAIL_SWAY: f32 = 0.06;
/// Breathing cycles per second while idling.
const BREATH_RATE: f32 = 0.4;

const PREPARE: f32 = 0.45;
const SNAP: f32 = 0.1;
const RECOVER: f32 = 0.8;
/// Head pitch at the end of the snap, in radians (nose down).
const SNAP_PITCH: f32 = 0.35;

/// Idle animation parameters of the rig.
#[derive(Clone, Copy, Debug)]
pub struct DragonParams {
    /// Wing flap amplitude in radians.
    pub wing_amplitude: f32,
    /// Wing flaps per second.
    pub wing_circle: f32,
    /// Tail sway amplitude (scaled by [`TAIL_SWAY`] into radians).
    pub tail_amplitude: f32,
    /// Tail sways per second.
    pub tail_circle: f32,
}

impl Default for DragonParams {
    fn default() -> Self {
        Self {
            wing_amplitude: std::f32::consts::FRAC_PI_6,
            wing_circle: 1.0,
            tail_amplitude: 3.0,
            tail_circle: 1.5,
        }
    }
}

/// The dragon: its scene graph, idle phase and sneeze state.
pub struct Dragon {
    pub graph: SceneGraph,
    params: DragonParams,
    phase: f32,
    sneezing: bool,
    pending_blast: Option<f32>,
    head: NodeId,
    chest: NodeId,
    belly: NodeId,
    wing_l: NodeId,
    wing_r: NodeId,
    nostril_l: NodeId,
    nostril_r: NodeId,
    eye_l: NodeId,
    eye_r: NodeId,
    tail: Vec<NodeId>,
}

impl Dragon {
    /// Largest meaningful sneeze strength.
    pub const MAX_SNEEZE_RATE: f32 = 8.0;
    /// Strengths above this produce fire instead of smoke.
    pub const FIRE_THRESHOLD: f32 = 5.0;

    /// Build the rig. All shapes share `pick_id`, so a click on any body
    /// part resolves to the dragon.
    pub fn new(device: &wgpu::Device, pick_id: u32, params: DragonParams) -> Result<Self> {
        let mut graph = SceneGraph::new();
        let shape = |colour| ShapeDesc {
            colour,
            transparent: false,
            pick_id,
        };
        let at = |x, y, z| Instance::from(Vector3::new(x, y, z));
        let tilted = |x, y, z, roll: f32| Instance {
            position: Vector3::new(x, y, z),
            rotation: Quaternion::from_angle_z(Rad(roll)),
            ..Default::default()
        };

        let root = graph.add_group("dragon", None, Instance::new())?;

        // Torso. The belly sits diamond-wise like the chest, which gives the
        // silhouette its ridge.
        let body = graph.add_group("body", Some(root), Instance::new())?;
        let belly = graph.add_shape(
            device,
            "belly",
            Some(body),
            cuboid(30.0, 30.0, 40.0)?,
            shape(PALE_GREEN),
            tilted(0.0, 0.0, 0.0, std::f32::consts::FRAC_PI_4),
        )?;
        let chest = graph.add_shape(
            device,
            "chest",
            Some(body),
            cuboid(24.0, 24.0, 20.0)?,
            shape(GREEN),
            tilted(0.0, 2.0, 12.0, std::f32::consts::FRAC_PI_4),
        )?;
        for (name, x, z) in [
            ("leg_fl", -9.0, 10.0),
            ("leg_fr", 9.0, 10.0),
            ("leg_bl", -9.0, -10.0),
            ("leg_br", 9.0, -10.0),
        ] {
            graph.add_shape(
                device,
                name,
                Some(body),
                cuboid(7.0, 14.0, 7.0)?,
                shape(GREEN),
                at(x, -24.0, z),
            )?;
        }

        // Head. The group origin is the neck joint the sneeze pitches around.
        let head = graph.add_group("head", Some(root), at(0.0, 16.0, 26.0))?;
        graph.add_shape(
            device,
            "skull",
            Some(head),
            cuboid(22.0, 18.0, 16.0)?,
            shape(GREEN),
            at(0.0, 6.0, 0.0),
        )?;
        graph.add_shape(
            device,
            "snout",
            Some(head),
            cuboid(12.0, 8.0, 12.0)?,
            shape(PALE_GREEN),
            at(0.0, 0.0, 10.0),
        )?;
        let nostril_l = graph.add_shape(
            device,
            "nostril_l",
            Some(head),
            cuboid(2.4, 2.4, 2.4)?,
            shape(DARK),
            at(-3.0, 2.0, 16.0),
        )?;
        let nostril_r = graph.add_shape(
            device,
            "nostril_r",
            Some(head),
            cuboid(2.4, 2.4, 2.4)?,
            shape(DARK),
            at(3.0, 2.0, 16.0),
        )?;
        let eye_l = graph.add_shape(
            device,
            "eye_l",
            Some(head),
            cuboid(2.0, 8.0, 8.0)?,
            shape(WHITE),
            at(-11.5, 8.0, 2.0),
        )?;
        let eye_r = graph.add_shape(
            device,
            "eye_r",
            Some(head),
            cuboid(2.0, 8.0, 8.0)?,
            shape(WHITE),
            at(11.5, 8.0, 2.0),
        )?;
        graph.add_shape(
            device,
            "iris_l",
            Some(head),
            cuboid(1.2, 4.0, 4.0)?,
            shape(DARK),
            at(-12.2, 7.0, 3.0),
        )?;
        graph.add_shape(
            device,
            "iris_r",
            Some(head),
            cuboid(1.2, 4.0, 4.0)?,
            shape(DARK),
            at(12.2, 7.0, 3.0),
        )?;
        graph.add_shape(
            device,
            "ear_l",
            Some(head),
            cuboid(4.0, 10.0, 4.0)?,
            shape(GREEN),
            tilted(-7.0, 17.0, -4.0, 0.3),
        )?;
        graph.add_shape(
            device,
            "ear_r",
            Some(head),
            cuboid(4.0, 10.0, 4.0)?,
            shape(GREEN),
            tilted(7.0, 17.0, -4.0, -0.3),
        )?;

        // Wings pivot at the shoulder groups; the plates hang outwards so the
        // flap rotation lifts the tips, not the whole wing.
        let wing_l = graph.add_group("wing_l", Some(root), at(-14.0, 10.0, 8.0))?;
        graph.add_shape(
            device,
            "wing_l_plate",
            Some(wing_l),
            cuboid(22.0, 2.0, 14.0)?,
            shape(PINK),
            at(-11.0, 0.0, 0.0),
        )?;
        let wing_r = graph.add_group("wing_r", Some(root), at(14.0, 10.0, 8.0))?;
        graph.add_shape(
            device,
            "wing_r_plate",
            Some(wing_r),
            cuboid(22.0, 2.0, 14.0)?,
            shape(PINK),
            at(11.0, 0.0, 0.0),
        )?;

        // Tail: a chain of shrinking segments, each jointed to the previous
        // one so the sway wave travels down the chain.
        let mut tail = Vec::new();
        let mut tail_parent = root;
        for (i, size) in [7.0f32, 6.0, 5.0, 4.0].into_iter().enumerate() {
            let joint = if i == 0 {
                at(0.0, 4.0, -20.0)
            } else {
                at(0.0, 1.0, -8.0)
            };
            let segment = graph.add_group(&format!("tail_{}", i), Some(tail_parent), joint)?;
            graph.add_shape(
                device,
                &format!("tail_seg_{}", i),
                Some(segment),
                cuboid(size, size, 8.0)?,
                shape(GREEN),
                at(0.0, 0.0, -4.0),
            )?;
            tail.push(segment);
            tail_parent = segment;
        }
        graph.add_shape(
            device,
            "tail_tip",
            Some(tail_parent),
            cuboid(4.0, 4.0, 4.0)?,
            shape(PINK),
            tilted(0.0, 1.0, -7.0, std::f32::consts::FRAC_PI_4),
        )?;

        Ok(Self {
            graph,
            params,
            phase: 0.0,
            sneezing: false,
            pending_blast: None,
            head,
            chest,
            belly,
            wing_l,
            wing_r,
            nostril_l,
            nostril_r,
            eye_l,
            eye_r,
            tail,
        })
    }

    /// Wing flap angle at elapsed time `t`, in radians.
    pub fn wing_angle(params: &DragonParams, t: f32) -> f32 {
        (TAU * params.wing_circle * t).sin() * params.wing_amplitude
    }

    /// Yaw of tail segment `segment` at elapsed time `t`, in radians.
    ///
    /// Segments lag each other by a fixed phase, which turns the per-segment
    /// sine into a wave travelling towards the tail tip.
    pub fn tail_angle(params: &DragonParams, segment: usize, t: f32) -> f32 {
        (TAU * params.tail_circle * t - segment as f32 * TAIL_PHASE_LAG).sin()
            * params.tail_amplitude
            * TAIL_SWAY
    }

    /// Advance the idle pose: wing flap, tail sway and belly breathing.
    pub fn run(&mut self, dt: Duration) {
        self.phase += dt.as_secs_f32();

        let flap = Self::wing_angle(&self.params, self.phase);
        self.graph.local_mut(self.wing_l).rotation = Quaternion::from_angle_z(Rad(WING_REST + flap));
        self.graph.local_mut(self.wing_r).rotation =
            Quaternion::from_angle_z(Rad(-(WING_REST + flap)));

        for (i, segment) in self.tail.clone().into_iter().enumerate() {
            self.graph.local_mut(segment).rotation =
                Quaternion::from_angle_y(Rad(Self::tail_angle(&self.params, i, self.phase)));
        }

        let breath = 1.0 + (TAU * BREATH_RATE * self.phase).sin() * 0.02;
        self.graph.local_mut(self.belly).scale = Vector3::new(1.0, breath, 1.0);
    }

    /// Derive world transforms and push them (plus dirty colours) to the GPU.
    pub fn sync(&mut self, queue: &wgpu::Queue) {
        self.graph.update_world_transforms();
        self.graph.write_to_buffers(queue);
    }

    /// Place the whole dragon in the scene.
    pub fn set_root(&mut self, instance: Instance) {
        if let Some(root) = self.graph.node("dragon") {
            *self.graph.local_mut(root) = instance;
        }
    }

    /// World positions of both nostrils, the particle spawn points.
    ///
    /// Only meaningful after a [`sync`](Self::sync).
    pub fn nostril_positions(&self) -> [Vector3<f32>; 2] {
        [
            self.graph.world(self.nostril_l).position,
            self.graph.world(self.nostril_r).position,
        ]
    }

    /// True while a sneeze sequence is playing; clicks should be ignored.
    pub fn is_sneezing(&self) -> bool {
        self.sneezing
    }

    /// Strength of a sneeze blast that fired since the last call, if any.
    pub fn take_blast(&mut self) -> Option<f32> {
        self.pending_blast.take()
    }

    /// Build the three-stage sneeze timeline.
    ///
    /// The hosting flow owns the returned timeline and advances it with the
    /// dragon each frame. At the head snap the blast strength becomes
    /// available through [`take_blast`](Self::take_blast).
    pub fn start_sneeze(&mut self, power: f32) -> Timeline<Dragon> {
        let power = power.clamp(1.0, Self::MAX_SNEEZE_RATE);
        self.sneezing = true;

        let strength = power / Self::MAX_SNEEZE_RATE;
        let back_pitch = -0.5 * strength;
        let inflate = 1.0 + 0.15 * strength;
        let flare = 1.0 + 0.8 * strength;
        let squint = 1.0 - 0.6 * strength;

        let mut timeline = Timeline::new();
        // Wind-up: head back, chest and nostrils inflate, eyes narrow.
        timeline.tween(0.0, PREPARE, Ease::QuadOut, move |d: &mut Dragon, t| {
            d.set_head_pitch(0.0f32.lerp(back_pitch, t));
            d.set_chest_inflate(1.0f32.lerp(inflate, t));
            d.set_nostril_flare(1.0f32.lerp(flare, t));
            d.set_eye_squint(1.0f32.lerp(squint, t));
        });
        // The snap itself, ending in the blast.
        timeline.tween_then(
            PREPARE,
            SNAP,
            Ease::QuartIn,
            move |d: &mut Dragon, t| {
                d.set_head_pitch(back_pitch.lerp(SNAP_PITCH, t));
                d.set_nostril_flare(flare.lerp(0.4, t));
            },
            move |d: &mut Dragon| d.pending_blast = Some(power),
        );
        // Wobbly recovery back to the rest pose.
        timeline.tween(
            PREPARE + SNAP,
            RECOVER,
            Ease::ElasticOut,
            move |d: &mut Dragon, t| {
                d.set_head_pitch(SNAP_PITCH.lerp(0.0, t));
                d.set_chest_inflate(inflate.lerp(1.0, t));
                d.set_nostril_flare(0.4f32.lerp(1.0, t));
                d.set_eye_squint(squint.lerp(1.0, t));
            },
        );
        timeline.call(PREPARE + SNAP + RECOVER, |d: &mut Dragon| {
            d.sneezing = false;
        });
        timeline
    }

    fn set_head_pitch(&mut self, pitch: f32) {
        self.graph.local_mut(self.head).rotation = Quaternion::from_angle_x(Rad(pitch));
    }

    fn set_chest_inflate(&mut self, scale: f32) {
        self.graph.local_mut(self.chest).scale = Vector3::new(scale, scale, scale);
    }

    fn set_nostril_flare(&mut self, scale: f32) {
        for nostril in [self.nostril_l, self.nostril_r] {
            self.graph.local_mut(nostril).scale = Vector3::new(scale, scale, scale);
        }
    }

    fn set_eye_squint(&mut self, scale: f32) {
        for eye in [self.eye_l, self.eye_r] {
            self.graph.local_mut(eye).scale = Vector3::new(1.0, scale, 1.0);
        }
    }
}
