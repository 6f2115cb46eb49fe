//! Deterministic random source used by the spawner systems.
//!
//! The scheduler never touches entropy; every spawner owns a seeded
//! generator so replays of the same configuration and tick script produce
//! identical event transcripts.

/// Uniform random values consumed by the scheduling core.
pub trait RandomSource {
    /// Uniform real in the half-open interval [0, 1).
    fn next_unit(&mut self) -> f64;

    /// Uniform integer in the closed interval [`lo`, `hi`].
    fn next_in_range(&mut self, lo: u32, hi: u32) -> u32;
}

/// SplitMix64 generator: small state, full 64-bit output, deterministic.
#[derive(Clone, Copy, Debug)]
pub struct SplitMix64 {
    state: u64,
}

impl SplitMix64 {
    /// Creates a generator from the provided seed. A zero seed is replaced
    /// with the golden-ratio increment so the stream never degenerates.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        let seed = if seed == 0 { 0x9e37_79b9_7f4a_7c15 } else { seed };
        Self { state: seed }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9e37_79b9_7f4a_7c15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
        z ^ (z >> 31)
    }
}

impl RandomSource for SplitMix64 {
    fn next_unit(&mut self) -> f64 {
        const SCALE: f64 = 1.0 / ((1u64 << 53) as f64);
        let value = self.next_u64() >> 11;
        (value as f64) * SCALE
    }

    fn next_in_range(&mut self, lo: u32, hi: u32) -> u32 {
        debug_assert!(lo <= hi, "range bounds must be ordered");
        let span = u64::from(hi - lo) + 1;
        lo + (self.next_u64() % span) as u32
    }
}
