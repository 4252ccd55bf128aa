//! Easing curves and a small time-driven tween.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Cubic ease-in-out: `4t³` below 0.5, `1 − (−2t+2)³/2` above.
#[inline]
pub fn ease_in_out_cubic(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

#[inline]
pub fn ease_out_cubic(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t).powi(3)
}

#[inline]
pub fn ease_out_quad(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t) * (1.0 - t)
}

#[inline]
pub fn ease_out_expo(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    if t >= 1.0 {
        1.0
    } else {
        1.0 - 2f32.powf(-10.0 * t)
    }
}

#[inline]
pub fn ease_out_back(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    let c1 = 1.70158;
    let c3 = c1 + 1.0;
    1.0 + c3 * (t - 1.0).powi(3) + c1 * (t - 1.0).powi(2)
}

/// Named easing curves used by configuration records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum Easing {
    Linear,
    #[default]
    EaseInOut,
    EaseOut,
    OutExpo,
    OutBack,
    OutQuad,
}

impl Easing {
    pub fn apply(self, t: f32) -> f32 {
        match self {
            Easing::Linear => t.clamp(0.0, 1.0),
            Easing::EaseInOut => ease_in_out_cubic(t),
            Easing::EaseOut => ease_out_cubic(t),
            Easing::OutExpo => ease_out_expo(t),
            Easing::OutBack => ease_out_back(t),
            Easing::OutQuad => ease_out_quad(t),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Easing::Linear => "linear",
            Easing::EaseInOut => "ease-in-out",
            Easing::EaseOut => "ease-out",
            Easing::OutExpo => "out-expo",
            Easing::OutBack => "out-back",
            Easing::OutQuad => "out-quad",
        }
    }
}

/// A scalar animated from `from` to `to` over `duration_ms`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tween {
    pub from: f32,
    pub to: f32,
    pub duration_ms: f32,
    pub elapsed_ms: f32,
    pub easing: Easing,
}

impl Tween {
    pub fn new(from: f32, to: f32, duration_ms: f32, easing: Easing) -> Self {
        Self {
            from,
            to,
            duration_ms: duration_ms.max(0.0),
            elapsed_ms: 0.0,
            easing,
        }
    }

    /// Linear progress in `[0, 1]`. Zero-length tweens are complete at once.
    pub fn progress(&self) -> f32 {
        if self.duration_ms <= 0.0 {
            1.0
        } else {
            (self.elapsed_ms / self.duration_ms).clamp(0.0, 1.0)
        }
    }

    pub fn value(&self) -> f32 {
        let e = self.easing.apply(self.progress());
        self.from + (self.to - self.from) * e
    }

    /// Advance and return the new value.
    pub fn advance(&mut self, dt_ms: f32) -> f32 {
        self.elapsed_ms += dt_ms.max(0.0);
        self.value()
    }

    pub fn is_done(&self) -> bool {
        self.progress() >= 1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cubic_ease_is_monotone_with_fixed_ends() {
        assert_eq!(ease_in_out_cubic(0.0), 0.0);
        assert_eq!(ease_in_out_cubic(1.0), 1.0);
        let mut prev = ease_in_out_cubic(0.0);
        for i in 1..=10_000 {
            let v = ease_in_out_cubic(i as f32 / 10_000.0);
            assert!(v >= prev, "decreased at step {i}: {prev} -> {v}");
            prev = v;
        }
        assert!((ease_in_out_cubic(0.5) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn ease_out_curves_hit_endpoints() {
        for e in [Easing::EaseOut, Easing::OutExpo, Easing::OutQuad, Easing::Linear] {
            assert!(e.apply(0.0).abs() < 1e-6, "{}", e.label());
            assert!((e.apply(1.0) - 1.0).abs() < 1e-6, "{}", e.label());
        }
        assert!((Easing::OutBack.apply(1.0) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn tween_reaches_target_and_clamps() {
        let mut t = Tween::new(0.0, 10.0, 100.0, Easing::Linear);
        assert_eq!(t.advance(50.0), 5.0);
        assert!(!t.is_done());
        assert_eq!(t.advance(500.0), 10.0);
        assert!(t.is_done());

        let instant = Tween::new(3.0, 7.0, 0.0, Easing::EaseInOut);
        assert!(instant.is_done());
        assert_eq!(instant.value(), 7.0);
    }
}
