use std::f32::consts::{FRAC_PI_6, TAU};

use drake_ngin::{
    models::{Dragon, DragonParams},
    tween::{Ease, Lerp, Timeline},
};

fn params() -> DragonParams {
    DragonParams {
        wing_amplitude: FRAC_PI_6,
        wing_circle: 1.0,
        tail_amplitude: 3.0,
        tail_circle: 1.5,
    }
}

// Given a fixed elapsed time the pose formulas produce a specific angle.
#[test]
fn wing_angle_is_deterministic() {
    let p = params();
    let angle = Dragon::wing_angle(&p, 0.123);
    for _ in 0..10 {
        assert_eq!(Dragon::wing_angle(&p, 0.123), angle);
    }
}

#[test]
fn wing_angle_matches_its_closed_form() {
    let p = params();
    assert_eq!(Dragon::wing_angle(&p, 0.0), 0.0);
    // A quarter of a flap cycle peaks at the amplitude.
    let quarter = 0.25 / p.wing_circle;
    assert!((Dragon::wing_angle(&p, quarter) - p.wing_amplitude).abs() < 1e-5);
    // Half a cycle crosses zero again.
    assert!(Dragon::wing_angle(&p, 2.0 * quarter).abs() < 1e-5);

    let t = 0.37;
    let expected = (TAU * p.wing_circle * t).sin() * p.wing_amplitude;
    assert_eq!(Dragon::wing_angle(&p, t), expected);
}

#[test]
fn wing_amplitude_bounds_the_flap() {
    let p = params();
    for i in 0..1000 {
        let t = i as f32 * 0.013;
        assert!(Dragon::wing_angle(&p, t).abs() <= p.wing_amplitude + 1e-6);
    }
}

#[test]
fn tail_segments_lag_each_other() {
    let p = params();
    let t = 0.8;
    // The wave travels: segment 1 now shows the angle segment 0 showed one
    // phase lag earlier.
    let lag_per_segment = 0.6 / (TAU * p.tail_circle);
    let earlier = Dragon::tail_angle(&p, 0, t - lag_per_segment);
    let later = Dragon::tail_angle(&p, 1, t);
    assert!((earlier - later).abs() < 1e-5);
}

#[test]
fn tail_angle_scales_with_amplitude() {
    let mut p = params();
    let t = 0.31;
    let base = Dragon::tail_angle(&p, 2, t);
    p.tail_amplitude *= 2.0;
    let doubled = Dragon::tail_angle(&p, 2, t);
    assert!((doubled - 2.0 * base).abs() < 1e-6);
}

/// The sneeze channels as plain numbers, to play a sequence without a GPU.
#[derive(Debug)]
struct MockRig {
    head_pitch: f32,
    chest: f32,
    nostrils: f32,
    blasts: Vec<f32>,
}

impl MockRig {
    fn rest() -> Self {
        Self {
            head_pitch: 0.0,
            chest: 1.0,
            nostrils: 1.0,
            blasts: Vec::new(),
        }
    }
}

/// A prepare/snap/recover sequence with the dragon's stage layout.
fn sneeze_like_sequence(power: f32) -> Timeline<MockRig> {
    let strength = power / Dragon::MAX_SNEEZE_RATE;
    let back = -0.5 * strength;
    let inflate = 1.0 + 0.15 * strength;
    let flare = 1.0 + 0.8 * strength;

    let mut timeline = Timeline::new();
    timeline.tween(0.0, 0.45, Ease::QuadOut, move |rig: &mut MockRig, t| {
        rig.head_pitch = 0.0f32.lerp(back, t);
        rig.chest = 1.0f32.lerp(inflate, t);
        rig.nostrils = 1.0f32.lerp(flare, t);
    });
    timeline.tween_then(
        0.45,
        0.1,
        Ease::QuartIn,
        move |rig: &mut MockRig, t| {
            rig.head_pitch = back.lerp(0.35, t);
            rig.nostrils = flare.lerp(0.4, t);
        },
        move |rig: &mut MockRig| rig.blasts.push(power),
    );
    timeline.tween(0.55, 0.8, Ease::ElasticOut, move |rig: &mut MockRig, t| {
        rig.head_pitch = 0.35f32.lerp(0.0, t);
        rig.chest = inflate.lerp(1.0, t);
        rig.nostrils = 0.4f32.lerp(1.0, t);
    });
    timeline
}

#[test]
fn sneeze_sequence_restores_the_rest_pose() {
    let mut rig = MockRig::rest();
    let mut timeline = sneeze_like_sequence(6.0);

    // Advance in uneven frame steps well past the total duration.
    let mut running = true;
    let mut guard = 0;
    while running && guard < 1000 {
        running = timeline.advance(&mut rig, 0.016);
        guard += 1;
    }
    assert!(!running);
    assert!(rig.head_pitch.abs() < 1e-4);
    assert!((rig.chest - 1.0).abs() < 1e-4);
    assert!((rig.nostrils - 1.0).abs() < 1e-4);
}

#[test]
fn sneeze_blast_fires_exactly_once_at_the_snap() {
    let mut rig = MockRig::rest();
    let mut timeline = sneeze_like_sequence(7.5);

    timeline.advance(&mut rig, 0.45);
    assert!(rig.blasts.is_empty(), "blast before the snap finished");
    timeline.advance(&mut rig, 0.1);
    assert_eq!(rig.blasts, vec![7.5]);
    while timeline.advance(&mut rig, 0.1) {}
    assert_eq!(rig.blasts.len(), 1);
}

#[test]
fn head_winds_back_before_it_snaps_forward() {
    let mut rig = MockRig::rest();
    let mut timeline = sneeze_like_sequence(8.0);

    timeline.advance(&mut rig, 0.45);
    assert!(rig.head_pitch < -0.3, "head should be tilted back");
    timeline.advance(&mut rig, 0.1);
    assert!(rig.head_pitch > 0.3, "head should have snapped forward");
}
