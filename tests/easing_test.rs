use drake_ngin::tween::Ease;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const ALL: [Ease; 9] = [
    Ease::Linear,
    Ease::QuadIn,
    Ease::QuadOut,
    Ease::QuadInOut,
    Ease::QuartIn,
    Ease::QuartOut,
    Ease::SineInOut,
    Ease::BackOut,
    Ease::ElasticOut,
];

// Overshooting curves are allowed to leave [0, 1] in the middle, but never
// at the endpoints.
#[test]
fn every_ease_hits_both_endpoints() {
    for ease in ALL {
        assert!(
            ease.apply(0.0).abs() < 1e-6,
            "{:?} at 0 was {}",
            ease,
            ease.apply(0.0)
        );
        assert!(
            (ease.apply(1.0) - 1.0).abs() < 1e-6,
            "{:?} at 1 was {}",
            ease,
            ease.apply(1.0)
        );
    }
}

#[test]
fn input_outside_unit_interval_is_clamped() {
    for ease in ALL {
        assert_eq!(ease.apply(-2.5), ease.apply(0.0), "{:?}", ease);
        assert_eq!(ease.apply(7.0), ease.apply(1.0), "{:?}", ease);
    }
}

#[test]
fn monotone_eases_never_move_backwards() {
    let monotone = [
        Ease::Linear,
        Ease::QuadIn,
        Ease::QuadOut,
        Ease::QuadInOut,
        Ease::QuartIn,
        Ease::QuartOut,
        Ease::SineInOut,
    ];
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    for ease in monotone {
        for _ in 0..200 {
            let a: f32 = rng.gen_range(0.0..1.0);
            let b: f32 = rng.gen_range(0.0..1.0);
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            assert!(
                ease.apply(lo) <= ease.apply(hi) + 1e-6,
                "{:?} decreased between {} and {}",
                ease,
                lo,
                hi
            );
        }
    }
}

#[test]
fn quad_and_quart_match_their_closed_forms() {
    assert!((Ease::QuadIn.apply(0.5) - 0.25).abs() < 1e-6);
    assert!((Ease::QuadOut.apply(0.5) - 0.75).abs() < 1e-6);
    assert!((Ease::QuartIn.apply(0.5) - 0.0625).abs() < 1e-6);
    assert!((Ease::QuartOut.apply(0.5) - 0.9375).abs() < 1e-6);
}

// The snappy curves spend most of their motion early (out) or late (in),
// which is what the sneeze relies on.
#[test]
fn quart_out_front_loads_the_motion() {
    assert!(Ease::QuartOut.apply(0.25) > 0.65);
    assert!(Ease::QuartIn.apply(0.75) < 0.35);
}
