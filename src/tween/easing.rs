//! Easing functions mapping linear progress to animated progress.
//!
//! All functions map 0 to 0 and 1 to 1. Input outside [0, 1] is clamped, so
//! a finished tween always lands exactly on its target value.

/// The easing curves used by the demo animations.
///
/// `QuartOut`/`QuartIn` are the snappy curves of the sneeze (wind-up and
/// head-snap), `ElasticOut` the wobbly recovery, the rest are utility curves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Ease {
    #[default]
    Linear,
    QuadIn,
    QuadOut,
    QuadInOut,
    QuartIn,
    QuartOut,
    SineInOut,
    BackOut,
    ElasticOut,
}

impl Ease {
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Ease::Linear => t,
            Ease::QuadIn => t * t,
            Ease::QuadOut => 1.0 - (1.0 - t) * (1.0 - t),
            Ease::QuadInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
            Ease::QuartIn => t.powi(4),
            Ease::QuartOut => 1.0 - (1.0 - t).powi(4),
            Ease::SineInOut => -((std::f32::consts::PI * t).cos() - 1.0) / 2.0,
            Ease::BackOut => {
                const C1: f32 = 1.70158;
                const C3: f32 = C1 + 1.0;
                1.0 + C3 * (t - 1.0).powi(3) + C1 * (t - 1.0).powi(2)
            }
            Ease::ElasticOut => {
                const C4: f32 = std::f32::consts::TAU / 3.0;
                if t == 0.0 {
                    0.0
                } else if t == 1.0 {
                    1.0
                } else {
                    2.0f32.powf(-10.0 * t) * ((t * 10.0 - 0.75) * C4).sin() + 1.0
                }
            }
        }
    }
}
