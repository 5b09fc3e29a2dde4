//! Pooled smoke/fire particles spawned at the dragon's nostrils.
//!
//! A fixed set of translucent cubes is parked invisibly in its own scene
//! graph. Spawning a puff or a blast acquires one from the pool, schedules
//! its flight on the shared effects timeline and releases it back once the
//! flight completes.

use anyhow::Result;
use rand::{Rng, rngs::ThreadRng};

use drake_ngin::{
    Device, Quaternion, Rad, Rotation3, Vector3,
    data_structures::{
        instance::Instance,
        scene_graph::{NodeId, SceneGraph, ShapeDesc},
    },
    geometry::cuboid,
    pool::Pool,
    tween::{BezierPath, Ease, Lerp, Timeline},
};

const POOL_SIZE: usize = 24;
const SMOKE_GREY: [f32; 3] = [0.85, 0.85, 0.85];
/// Colour ramp of a fire blast: white heart to sooty black.
const FIRE_RAMP: [[f32; 3]; 5] = [
    [1.0, 1.0, 1.0],
    [1.0, 0.804, 0.29],
    [1.0, 0.804, 0.29],
    [0.969, 0.133, 0.196],
    [0.0, 0.0, 0.0],
];

/// Seconds a lazy smoke puff drifts before it is recycled.
const PUFF_FLIGHT: f32 = 10.0;
/// Seconds of a fire blast (the scale ramp runs twice as long).
const BLAST_FLIGHT: f32 = 1.0;

pub struct Particle {
    node: NodeId,
    in_flight: bool,
}

/// The particle field: pooled cubes plus the RNG jittering their flights.
pub struct Smoke {
    pub graph: SceneGraph,
    pool: Pool<Particle>,
    rng: ThreadRng,
}

impl Smoke {
    pub fn new(device: &Device) -> Result<Self> {
        let mut graph = SceneGraph::new();
        let mut nodes = Vec::with_capacity(POOL_SIZE);
        for i in 0..POOL_SIZE {
            let node = graph.add_shape(
                device,
                &format!("puff_{}", i),
                None,
                cuboid(4.0, 4.0, 4.0)?,
                ShapeDesc {
                    colour: [SMOKE_GREY[0], SMOKE_GREY[1], SMOKE_GREY[2], 0.5],
                    transparent: true,
                    pick_id: 0,
                },
                Instance::new(),
            )?;
            graph.set_visible(node, false);
            nodes.push(node);
        }
        let pool = Pool::new(
            POOL_SIZE,
            |i| Particle {
                node: nodes[i],
                in_flight: false,
            },
            |particle| particle.in_flight = false,
        );
        Ok(Self {
            graph,
            pool,
            rng: rand::thread_rng(),
        })
    }

    /// A lazy drift: up, forward and sideways along a jittered Bézier path,
    /// tumbling and growing while it fades out.
    pub fn puff(&mut self, origin: Vector3<f32>, effects: &mut Timeline<Smoke>) {
        let Some(particle) = self.checkout(origin) else {
            return;
        };
        let node = particle.node;

        let path = BezierPath::new(vec![
            origin,
            origin
                + Vector3::new(
                    30.0 - self.rng.gen_range(0.0..10.0),
                    20.0 + self.rng.gen_range(0.0..2.0),
                    20.0,
                ),
            origin
                + Vector3::new(
                    10.0 + self.rng.gen_range(0.0..20.0),
                    40.0 + self.rng.gen_range(0.0..5.0),
                    -30.0,
                ),
            origin
                + Vector3::new(
                    50.0 - self.rng.gen_range(0.0..20.0),
                    70.0 + self.rng.gen_range(0.0..10.0),
                    20.0,
                ),
        ])
        .expect("puff path has 4 control points");
        let spin_x = self.rng.gen_range(0.0..std::f32::consts::PI * 3.0);
        let spin_y = self.rng.gen_range(0.0..std::f32::consts::PI * 3.0);
        let grow = Vector3::new(
            5.0 + self.rng.gen_range(0.0..5.0),
            5.0 + self.rng.gen_range(0.0..5.0),
            5.0 + self.rng.gen_range(0.0..5.0),
        );

        effects.tween_then(
            0.0,
            PUFF_FLIGHT,
            Ease::QuartOut,
            move |smoke: &mut Smoke, t| {
                let local = smoke.graph.local_mut(node);
                local.position = path.sample(t);
                local.rotation = Quaternion::from_angle_x(Rad(spin_x * t))
                    * Quaternion::from_angle_y(Rad(spin_y * t));
                local.scale = Vector3::new(1.0, 1.0, 1.0).lerp(grow, t);
                smoke.graph.set_opacity(node, 0.5f32.lerp(0.0, t));
            },
            move |smoke: &mut Smoke| smoke.recycle(particle),
        );
    }

    /// A sneeze blast: fast forward ejection with a colour ramp from white
    /// heat to soot, scaled by the sneeze `rate`.
    pub fn blast(&mut self, origin: Vector3<f32>, rate: f32, effects: &mut Timeline<Smoke>) {
        let Some(particle) = self.checkout(origin) else {
            return;
        };
        let node = particle.node;
        let max = drake_ngin::models::Dragon::MAX_SNEEZE_RATE;

        let target = origin
            + Vector3::new(
                0.0,
                -2.0 * rate,
                (15.0 * rate).max(40.0),
            );
        let spin_x = self.rng.gen_range(0.0..std::f32::consts::PI * 3.0);
        let spin_z = self.rng.gen_range(0.0..std::f32::consts::PI * 3.0);
        let scale_ramp = BezierPath::new(vec![
            Vector3::new(1.0, 1.0, 1.0),
            Vector3::new(
                rate / max + self.rng.gen_range(0.0..0.3),
                rate / max + self.rng.gen_range(0.0..0.3),
                (rate * 2.0) / max + self.rng.gen_range(0.0..0.3),
            ),
            Vector3::new(
                rate / max + self.rng.gen_range(0.0..0.5),
                rate / max + self.rng.gen_range(0.0..0.5),
                (rate * 2.0) / max + self.rng.gen_range(0.0..0.5),
            ),
            Vector3::new(
                (rate * 2.0) / max + self.rng.gen_range(0.0..0.5),
                (rate * 2.0) / max + self.rng.gen_range(0.0..0.5),
                (rate * 4.0) / max + self.rng.gen_range(0.0..0.5),
            ),
            Vector3::new(
                rate * 2.0 + self.rng.gen_range(0.0..5.0),
                rate * 2.0 + self.rng.gen_range(0.0..5.0),
                rate * 2.0 + self.rng.gen_range(0.0..5.0),
            ),
        ])
        .expect("blast scale ramp has 5 control points");
        let colour_ramp =
            BezierPath::new(FIRE_RAMP.to_vec()).expect("fire ramp has 5 control points");

        effects.tween(0.0, BLAST_FLIGHT, Ease::QuartOut, move |smoke: &mut Smoke, t| {
            let local = smoke.graph.local_mut(node);
            local.position = origin.lerp(target, t);
            local.rotation =
                Quaternion::from_angle_x(Rad(spin_x * t)) * Quaternion::from_angle_z(Rad(spin_z * t));
            smoke.graph.set_colour(node, colour_ramp.sample(t));
            smoke.graph.set_opacity(node, 0.5f32.lerp(0.0, t));
        });
        effects.tween_then(
            0.0,
            BLAST_FLIGHT * 2.0,
            Ease::QuartOut,
            move |smoke: &mut Smoke, t| {
                smoke.graph.local_mut(node).scale = scale_ramp.sample(t);
            },
            move |smoke: &mut Smoke| smoke.recycle(particle),
        );
    }

    /// Take a particle from the pool and park it at the spawn point.
    fn checkout(&mut self, origin: Vector3<f32>) -> Option<Particle> {
        let mut particle = match self.pool.acquire() {
            Some(particle) => particle,
            None => {
                log::debug!("smoke pool exhausted, dropping a spawn");
                return None;
            }
        };
        particle.in_flight = true;
        let node = particle.node;
        let local = self.graph.local_mut(node);
        local.position = origin;
        local.rotation = Quaternion::from_angle_x(Rad(0.0));
        local.scale = Vector3::new(1.0, 1.0, 1.0);
        self.graph.set_colour(node, SMOKE_GREY);
        self.graph.set_opacity(node, 0.5);
        self.graph.set_visible(node, true);
        Some(particle)
    }

    /// Hide a finished particle and return it to the free list.
    fn recycle(&mut self, particle: Particle) {
        debug_assert!(particle.in_flight, "recycled a particle that was never spawned");
        self.graph.set_visible(particle.node, false);
        self.pool.release(particle);
    }
}
