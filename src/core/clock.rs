//! Frame timing.
//!
//! The host calls [`FrameClock::tick`] with its own timestamps (rAF time in
//! the browser, a tokio interval in the player). Deltas are clamped so a
//! backgrounded tab does not produce a catch-up burst on return.

/// Default upper bound for one frame's delta.
pub const MAX_FRAME_DELTA_SECS: f32 = 0.1;

/// Nominal frame length used to convert per-frame constants into per-second ones.
pub const NOMINAL_FRAME_SECS: f32 = 1.0 / 60.0;

#[derive(Debug, Clone)]
pub struct FrameClock {
    last_ms: Option<f64>,
    max_delta_secs: f32,
    elapsed_secs: f64,
    frames: u64,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new(MAX_FRAME_DELTA_SECS)
    }
}

impl FrameClock {
    pub fn new(max_delta_secs: f32) -> Self {
        Self {
            last_ms: None,
            max_delta_secs: max_delta_secs.max(0.0),
            elapsed_secs: 0.0,
            frames: 0,
        }
    }

    /// Feed a host timestamp in milliseconds; returns the clamped delta in seconds.
    ///
    /// The first call returns 0. Timestamps that go backwards also yield 0.
    pub fn tick(&mut self, now_ms: f64) -> f32 {
        let dt = match self.last_ms {
            None => 0.0,
            Some(prev) => ((now_ms - prev) / 1000.0).max(0.0) as f32,
        };
        self.last_ms = Some(now_ms);
        let dt = clamp_delta(dt, self.max_delta_secs);
        self.elapsed_secs += dt as f64;
        self.frames += 1;
        dt
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed_secs
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Forget the previous timestamp (after a pause) without resetting totals.
    pub fn resync(&mut self) {
        self.last_ms = None;
    }
}

/// Clamp a delta into `[0, max]`; non-finite deltas become 0.
#[inline]
pub fn clamp_delta(dt_secs: f32, max_secs: f32) -> f32 {
    if !dt_secs.is_finite() {
        return 0.0;
    }
    dt_secs.clamp(0.0, max_secs)
}

/// How many nominal 60 Hz frames `dt_secs` represents.
#[inline]
pub fn frames_in(dt_secs: f32) -> f32 {
    dt_secs / NOMINAL_FRAME_SECS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_tick_is_zero_and_deltas_are_seconds() {
        let mut c = FrameClock::default();
        assert_eq!(c.tick(1000.0), 0.0);
        let dt = c.tick(1016.0);
        assert!((dt - 0.016).abs() < 1e-6);
        assert_eq!(c.frames(), 2);
    }

    #[test]
    fn stalled_frames_are_clamped() {
        let mut c = FrameClock::new(0.1);
        c.tick(0.0);
        assert_eq!(c.tick(30_000.0), 0.1);
        assert_eq!(c.tick(29_000.0), 0.0);
        assert_eq!(clamp_delta(f32::NAN, 0.1), 0.0);
    }

    #[test]
    fn nominal_frames() {
        assert!((frames_in(1.0) - 60.0).abs() < 1e-3);
    }
}
