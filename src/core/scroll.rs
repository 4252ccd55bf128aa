//! Scroll offset to narrative position.

use crate::beats::{NarrativeBeat, NarrativeBeatTable};

/// Upper clamp used when no beat claims a progress value.
pub const FALLBACK_EPSILON: f32 = 1e-6;

/// Wheel deltas are damped before the host scrolls.
pub const WHEEL_SCALE: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollResolution {
    /// Normalized scroll progress, `[0, 1]`.
    pub progress: f32,
    pub beat: &'static NarrativeBeat,
    pub beat_index: usize,
    /// Progress inside `beat`, `[0, 1]`.
    pub beat_progress: f32,
}

/// Pure mapping from raw scroll offsets to beats. Holds no state.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScrollMapper {
    table: NarrativeBeatTable,
}

impl ScrollMapper {
    pub fn new(table: NarrativeBeatTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> NarrativeBeatTable {
        self.table
    }

    /// Resolve `raw_y` of `max_y`.
    ///
    /// Beats own `lo ≤ p < hi`; the final beat also owns `p = 1`. A
    /// non-positive or non-finite `max_y` resolves to progress 0.
    pub fn resolve(&self, raw_y: f32, max_y: f32) -> ScrollResolution {
        let progress = normalize(raw_y, max_y);
        self.resolve_progress(progress)
    }

    pub fn resolve_progress(&self, progress: f32) -> ScrollResolution {
        let progress = if progress.is_finite() {
            progress.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let beats = self.table.ordered();
        let last = beats.len() - 1;
        let found = beats
            .iter()
            .enumerate()
            .find(|(i, b)| b.contains(progress, *i == last));
        let (beat_index, beat) = match found {
            Some(hit) => hit,
            None => {
                let p = progress.clamp(0.0, 1.0 - FALLBACK_EPSILON);
                nearest(beats, p)
            }
        };
        ScrollResolution {
            progress,
            beat,
            beat_index,
            beat_progress: beat.local_progress(progress),
        }
    }

    /// Scroll offset that lands on the start of beat `index`.
    pub fn target_for_beat(&self, index: usize, max_y: f32) -> Option<f32> {
        let beat = self.table.at(index)?;
        Some(beat.lo * max_y.max(0.0))
    }
}

fn normalize(raw_y: f32, max_y: f32) -> f32 {
    if !max_y.is_finite() || max_y <= 0.0 || !raw_y.is_finite() {
        return 0.0;
    }
    (raw_y / max_y).clamp(0.0, 1.0)
}

fn nearest(beats: &'static [NarrativeBeat], p: f32) -> (usize, &'static NarrativeBeat) {
    let mut best = (0, &beats[0]);
    let mut best_d = f32::INFINITY;
    for (i, b) in beats.iter().enumerate() {
        let d = if p < b.lo {
            b.lo - p
        } else if p > b.hi {
            p - b.hi
        } else {
            0.0
        };
        if d < best_d {
            best_d = d;
            best = (i, b);
        }
    }
    best
}

/// Scroll distance for a wheel delta.
pub fn wheel_to_scroll(delta_y: f32) -> f32 {
    delta_y * WHEEL_SCALE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dense_sampling_hits_exactly_one_beat() {
        let m = ScrollMapper::default();
        let beats = NarrativeBeatTable.ordered();
        let last = beats.len() - 1;
        for i in 0..=100_000 {
            let p = i as f32 / 100_000.0;
            let r = m.resolve_progress(p);
            let matches = beats
                .iter()
                .enumerate()
                .filter(|(j, b)| b.contains(p, *j == last))
                .count();
            assert_eq!(matches, 1, "p={p}");
            assert!((0.0..=1.0).contains(&r.beat_progress), "p={p}");
            assert_eq!(r.beat.id, beats[r.beat_index].id);
        }
    }

    #[test]
    fn boundaries_belong_to_the_upper_beat() {
        let m = ScrollMapper::default();
        assert_eq!(m.resolve_progress(0.05).beat.id, "crisis-building");
        assert_eq!(m.resolve_progress(0.049).beat.id, "genesis");
        assert_eq!(m.resolve_progress(1.0).beat.id, "call-to-action");
        assert_eq!(m.resolve_progress(1.0).beat_progress, 1.0);
    }

    #[test]
    fn raw_offsets_are_clamped() {
        let m = ScrollMapper::default();
        assert_eq!(m.resolve(-50.0, 1000.0).progress, 0.0);
        assert_eq!(m.resolve(5000.0, 1000.0).progress, 1.0);
        assert_eq!(m.resolve(500.0, 0.0).progress, 0.0);
        assert_eq!(m.resolve(500.0, f32::NAN).beat.id, "genesis");
        let r = m.resolve(400.0, 1000.0);
        assert_eq!(r.beat.id, "entropic-duality");
        assert!((r.beat_progress - 0.5).abs() < 1e-4);
    }

    #[test]
    fn nearest_fallback_picks_closest_range() {
        let beats = NarrativeBeatTable.ordered();
        let (i, b) = nearest(beats, 1.0 - FALLBACK_EPSILON);
        assert_eq!(b.id, "call-to-action");
        assert_eq!(i, beats.len() - 1);
    }

    #[test]
    fn beat_targets_and_wheel() {
        let m = ScrollMapper::default();
        assert_eq!(m.target_for_beat(0, 9000.0), Some(0.0));
        let t = m.target_for_beat(2, 10_000.0).unwrap_or_default();
        assert!((t - 1200.0).abs() < 1e-2);
        assert_eq!(m.target_for_beat(99, 10_000.0), None);
        assert_eq!(wheel_to_scroll(100.0), 50.0);
    }
}
