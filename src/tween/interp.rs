//! Value interpolation for tweened channels.

use cgmath::{InnerSpace, Quaternion, Vector3};

use anyhow::{Result, ensure};

/// Linear blending between two values of the same type.
///
/// `t` is expected to be in [0, 1]; callers usually pass eased progress.
pub trait Lerp: Copy {
    fn lerp(self, other: Self, t: f32) -> Self;
}

impl Lerp for f32 {
    fn lerp(self, other: Self, t: f32) -> Self {
        self + (other - self) * t
    }
}

impl Lerp for Vector3<f32> {
    fn lerp(self, other: Self, t: f32) -> Self {
        self + (other - self) * t
    }
}

impl Lerp for [f32; 3] {
    fn lerp(self, other: Self, t: f32) -> Self {
        [
            self[0].lerp(other[0], t),
            self[1].lerp(other[1], t),
            self[2].lerp(other[2], t),
        ]
    }
}

/// Normalized linear blend along the shortest arc. Good enough for the small
/// joint rotations the rigs animate; a full slerp would be overkill here.
impl Lerp for Quaternion<f32> {
    fn lerp(self, other: Self, t: f32) -> Self {
        let other = if self.dot(other) < 0.0 { -other } else { other };
        let blended = Quaternion::new(
            self.s.lerp(other.s, t),
            self.v.x.lerp(other.v.x, t),
            self.v.y.lerp(other.v.y, t),
            self.v.z.lerp(other.v.z, t),
        );
        blended.normalize()
    }
}

/// Bézier curve of arbitrary degree over tweenable control points.
///
/// Evaluated with de Casteljau's algorithm: the curve starts at the first
/// control point, ends at the last and is pulled towards the ones in
/// between. The particle flight paths use four points, the sneeze scale and
/// colour ramps five.
#[derive(Clone, Debug)]
pub struct BezierPath<T: Lerp> {
    points: Vec<T>,
}

impl<T: Lerp> BezierPath<T> {
    pub fn new(points: Vec<T>) -> Result<Self> {
        ensure!(
            points.len() >= 2,
            "a bezier path needs at least 2 control points, got {}",
            points.len()
        );
        Ok(Self { points })
    }

    /// Point on the curve at `t` in [0, 1] (clamped).
    pub fn sample(&self, t: f32) -> T {
        let t = t.clamp(0.0, 1.0);
        let mut scratch = self.points.clone();
        let mut len = scratch.len();
        while len > 1 {
            for i in 0..len - 1 {
                scratch[i] = scratch[i].lerp(scratch[i + 1], t);
            }
            len -= 1;
        }
        scratch[0]
    }
}
