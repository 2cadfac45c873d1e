use std::{f32::consts::PI, time::Duration};

use serde::{Deserialize, Serialize};

/// Presentation state of a single element. Only the properties the
/// sequencers animate are tracked.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualState {
    pub opacity: f32,
    pub x: f32,
    pub y: f32,
    pub scale: f32,
    /// In-plane rotation in degrees.
    pub rotation: f32,
    pub rotation_x: f32,
    pub rotation_y: f32,
    /// Blur radius in pixels.
    pub blur: f32,
}

impl Default for VisualState {
    fn default() -> Self {
        Self::RESTING
    }
}

impl VisualState {
    /// Fully visible, untransformed.
    pub const RESTING: Self = Self {
        opacity: 1.0,
        x: 0.0,
        y: 0.0,
        scale: 1.0,
        rotation: 0.0,
        rotation_x: 0.0,
        rotation_y: 0.0,
        blur: 0.0,
    };

    /// Resting state faded out and pushed down by `y` pixels.
    pub fn hidden_below(y: f32) -> Self {
        Self {
            opacity: 0.0,
            y,
            ..Self::RESTING
        }
    }

    pub fn with_x(mut self, x: f32) -> Self {
        self.x = x;
        self
    }

    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_rotation(mut self, degrees: f32) -> Self {
        self.rotation = degrees;
        self
    }

    pub fn with_rotation_x(mut self, degrees: f32) -> Self {
        self.rotation_x = degrees;
        self
    }

    pub fn with_rotation_y(mut self, degrees: f32) -> Self {
        self.rotation_y = degrees;
        self
    }

    pub fn with_blur(mut self, blur: f32) -> Self {
        self.blur = blur;
        self
    }

    /// Linear interpolation between two states. `t` is not clamped so that
    /// overshooting easings carry through.
    pub fn lerp(&self, to: &Self, t: f32) -> Self {
        let mix = |a: f32, b: f32| a + (b - a) * t;
        Self {
            opacity: mix(self.opacity, to.opacity).clamp(0.0, 1.0),
            x: mix(self.x, to.x),
            y: mix(self.y, to.y),
            scale: mix(self.scale, to.scale),
            rotation: mix(self.rotation, to.rotation),
            rotation_x: mix(self.rotation_x, to.rotation_x),
            rotation_y: mix(self.rotation_y, to.rotation_y),
            blur: mix(self.blur, to.blur).max(0.0),
        }
    }
}

/// Easing curves used by the page. Every curve maps 0 to 0 and 1 to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Easing {
    Linear,
    Power2Out,
    Power3Out,
    EaseInOut,
    /// Overshoots past the target before settling.
    BackOut(f32),
    /// Critically or under-damped spring normalised to a unit mass.
    Spring { damping: f32, stiffness: f32 },
}

impl Default for Easing {
    fn default() -> Self {
        Easing::Power3Out
    }
}

impl Easing {
    pub fn apply(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        if t == 0.0 || t == 1.0 {
            return t;
        }

        match *self {
            Easing::Linear => t,
            Easing::Power2Out => 1.0 - (1.0 - t).powi(3),
            Easing::Power3Out => 1.0 - (1.0 - t).powi(4),
            Easing::EaseInOut => 0.5 - 0.5 * (PI * t).cos(),
            Easing::BackOut(overshoot) => {
                let u = t - 1.0;
                1.0 + (overshoot + 1.0) * u.powi(3) + overshoot * u.powi(2)
            }
            Easing::Spring { damping, stiffness } => spring(t, damping, stiffness),
        }
    }
}

// Displacement of a damped spring released from 1 towards 0, sampled over a
// fixed one-second window and forced to land on 1 at the end.
fn spring(t: f32, damping: f32, stiffness: f32) -> f32 {
    let omega = stiffness.max(f32::EPSILON).sqrt();
    let zeta = damping / (2.0 * omega);
    let displacement = if zeta < 1.0 {
        let damped = omega * (1.0 - zeta * zeta).sqrt();
        (-zeta * omega * t).exp()
            * ((damped * t).cos() + (zeta * omega / damped) * (damped * t).sin())
    } else {
        (1.0 + omega * t) * (-omega * t).exp()
    };
    let settled = 1.0 - displacement;
    // Blend into the target over the last tenth so the curve ends exactly at 1.
    if t > 0.9 {
        let w = (t - 0.9) / 0.1;
        settled * (1.0 - w) + w
    } else {
        settled
    }
}

/// One element transition from `from` to `to`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tween {
    pub from: VisualState,
    pub to: VisualState,
    #[serde(with = "duration_secs")]
    pub delay: Duration,
    #[serde(with = "duration_secs")]
    pub duration: Duration,
    pub easing: Easing,
}

impl Tween {
    pub fn new(from: VisualState, to: VisualState, duration: Duration, easing: Easing) -> Self {
        Self {
            from,
            to,
            delay: Duration::ZERO,
            duration,
            easing,
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// The same transition played backwards.
    pub fn reversed(&self) -> Self {
        Self {
            from: self.to,
            to: self.from,
            ..*self
        }
    }

    pub fn end(&self) -> Duration {
        self.delay + self.duration
    }

    /// State at `elapsed` since the tween was started.
    pub fn sample(&self, elapsed: Duration) -> VisualState {
        if elapsed <= self.delay {
            return self.from;
        }
        if self.duration.is_zero() || elapsed >= self.end() {
            return self.to;
        }

        let progress = (elapsed - self.delay).as_secs_f32() / self.duration.as_secs_f32();
        self.from.lerp(&self.to, self.easing.apply(progress))
    }
}

pub(crate) mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Easing; 6] = [
        Easing::Linear,
        Easing::Power2Out,
        Easing::Power3Out,
        Easing::EaseInOut,
        Easing::BackOut(1.7),
        Easing::Spring {
            damping: 20.0,
            stiffness: 100.0,
        },
    ];

    #[test]
    fn easings_hit_both_endpoints() {
        for easing in ALL {
            assert_eq!(easing.apply(0.0), 0.0, "{easing:?}");
            assert_eq!(easing.apply(1.0), 1.0, "{easing:?}");
        }
    }

    #[test]
    fn back_out_overshoots() {
        let peak = (1..100)
            .map(|i| Easing::BackOut(1.7).apply(i as f32 / 100.0))
            .fold(f32::MIN, f32::max);
        assert!(peak > 1.0);
    }

    #[test]
    fn out_curves_lead_linear() {
        assert!(Easing::Power3Out.apply(0.5) > 0.5);
        assert!(Easing::Power2Out.apply(0.5) > 0.5);
        assert!((Easing::EaseInOut.apply(0.5) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn tween_holds_during_delay_and_settles() {
        let tween = Tween::new(
            VisualState::hidden_below(40.0),
            VisualState::RESTING,
            Duration::from_millis(600),
            Easing::Linear,
        )
        .delayed(Duration::from_millis(200));

        assert_eq!(tween.sample(Duration::from_millis(100)).opacity, 0.0);
        let mid = tween.sample(Duration::from_millis(500));
        assert!((mid.opacity - 0.5).abs() < 1e-4);
        assert!((mid.y - 20.0).abs() < 1e-3);
        assert_eq!(tween.sample(Duration::from_secs(2)), VisualState::RESTING);
    }

    #[test]
    fn reversed_swaps_endpoints() {
        let tween = Tween::new(
            VisualState::hidden_below(100.0).with_rotation_x(-90.0),
            VisualState::RESTING,
            Duration::from_secs(1),
            Easing::Power3Out,
        );
        let back = tween.reversed();
        assert_eq!(back.from, VisualState::RESTING);
        assert_eq!(back.to.rotation_x, -90.0);
        assert_eq!(back.duration, tween.duration);
    }
}
