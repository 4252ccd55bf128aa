// Seeded PRNG for visual noise (jitter, scattered layouts, link refresh).
//
// Not cryptographically secure. A fixed seed makes every simulation and
// choreography reproducible in tests and in the player.

use std::f32::consts::TAU;

#[derive(Debug, Clone)]
pub struct Prng {
    state: u64,
}

impl Prng {
    pub fn new(seed: u64) -> Self {
        // Zero is a fixed point of xorshift.
        let seed = if seed == 0 { 0x9E3779B97F4A7C15 } else { seed };
        Self { state: seed }
    }

    /// Derive an independent stream (per level system, per behavior run).
    pub fn fork(&mut self, salt: u64) -> Prng {
        Prng::new(self.next_u64() ^ salt.wrapping_mul(0xD1B54A32D192ED03))
    }

    #[inline]
    fn next_u64(&mut self) -> u64 {
        // xorshift64*
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545F4914F6CDD1D)
    }

    #[inline]
    pub fn next_u32(&mut self) -> u32 {
        (self.next_u64() >> 32) as u32
    }

    /// Uniform in `[0, 1)`.
    #[inline]
    pub fn next_f32_01(&mut self) -> f32 {
        let x = self.next_u32() >> 8;
        (x as f32) / ((1u32 << 24) as f32)
    }

    #[inline]
    pub fn gen_range_f32(&mut self, low: f32, high: f32) -> f32 {
        low + (high - low) * self.next_f32_01()
    }

    #[inline]
    pub fn gen_range_usize(&mut self, low: usize, high: usize) -> usize {
        if high <= low {
            return low;
        }
        let span = (high - low) as u32;
        let v = self.next_u32() % span;
        low + v as usize
    }

    /// Uniform in `[-amplitude, amplitude)`.
    #[inline]
    pub fn signed(&mut self, amplitude: f32) -> f32 {
        (self.next_f32_01() * 2.0 - 1.0) * amplitude
    }

    /// Uniform angle in `[0, 2π)`.
    #[inline]
    pub fn angle(&mut self) -> f32 {
        self.next_f32_01() * TAU
    }

    #[inline]
    pub fn chance(&mut self, p: f32) -> bool {
        self.next_f32_01() < p
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_stream() {
        let mut a = Prng::new(7);
        let mut b = Prng::new(7);
        for _ in 0..100 {
            assert_eq!(a.next_u32(), b.next_u32());
        }
    }

    #[test]
    fn ranges_are_respected() {
        let mut r = Prng::new(42);
        for _ in 0..10_000 {
            let u = r.next_f32_01();
            assert!((0.0..1.0).contains(&u));
            let g = r.gen_range_f32(20.0, 30.0);
            assert!((20.0..30.0).contains(&g));
            let s = r.signed(0.05);
            assert!((-0.05..0.05).contains(&s));
            let i = r.gen_range_usize(3, 6);
            assert!((3..6).contains(&i));
        }
        assert_eq!(r.gen_range_usize(5, 5), 5);
    }

    #[test]
    fn zero_seed_is_usable_and_forks_diverge() {
        let mut r = Prng::new(0);
        assert_ne!(r.next_u32(), 0);
        let mut f1 = r.fork(1);
        let mut f2 = r.fork(1);
        assert_ne!(f1.next_u32(), f2.next_u32());
    }
}
