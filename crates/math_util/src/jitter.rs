//! Halton (2,3) jitter sequence for temporal anti-aliasing
//!
//! The camera projection is shifted by a different sub-pixel offset every
//! frame. Offsets come from a precomputed, cyclic low-discrepancy table so the
//! pattern is identical on every run.

use glam::{Vec2, Vec4};

/// Number of samples in the default jitter table.
pub const DEFAULT_JITTER_SAMPLES: usize = 16;

/// Radical inverse of `index` in the given `base`.
///
/// Returns a value in [0, 1). Index 0 maps to 0.
#[inline]
pub fn halton(index: u32, base: u32) -> f32 {
    let mut result = 0.0f32;
    let mut f = 1.0f32;
    let mut i = index;

    while i > 0 {
        f /= base as f32;
        result += f * (i % base) as f32;
        i /= base;
    }

    result
}

/// Cyclic jitter table plus the two most recent samples.
///
/// `active` packs the previous offset in `xy` and the current offset in `zw`,
/// both in texel units centered on zero.
#[derive(Debug, Clone)]
pub struct JitterSequence {
    points: Vec<Vec2>,
    index: usize,
    active: Vec4,
}

impl Default for JitterSequence {
    fn default() -> Self {
        Self::new(DEFAULT_JITTER_SAMPLES)
    }
}

impl JitterSequence {
    /// Build a table of `count` offsets. A count of zero is treated as one.
    pub fn new(count: usize) -> Self {
        let count = count.max(1);
        // 1-based so the first sample is not the degenerate (0, 0) corner
        let points = (1..=count as u32)
            .map(|i| Vec2::new(halton(i, 2) - 0.5, halton(i, 3) - 0.5))
            .collect();
        Self {
            points,
            index: 0,
            active: Vec4::ZERO,
        }
    }

    /// Step to the next sample.
    ///
    /// The current offset becomes the previous one, the table entry at the
    /// current index becomes the new current offset, and the index moves one
    /// entry forward, wrapping at the table length.
    pub fn advance(&mut self) -> Vec4 {
        let next = self.points[self.index];
        self.active = Vec4::new(self.active.z, self.active.w, next.x, next.y);
        self.index = (self.index + 1) % self.points.len();
        self.active
    }

    /// Table entry at `index`, reduced modulo the table length.
    pub fn sample(&self, index: usize) -> Vec2 {
        self.points[index % self.points.len()]
    }

    pub fn active(&self) -> Vec4 {
        self.active
    }

    pub fn previous(&self) -> Vec2 {
        Vec2::new(self.active.x, self.active.y)
    }

    pub fn current(&self) -> Vec2 {
        Vec2::new(self.active.z, self.active.w)
    }

    /// Index of the entry the next `advance` will load.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn sample_count(&self) -> usize {
        self.points.len()
    }

    /// Rewind to the start of the table and forget the active sample.
    pub fn reset(&mut self) {
        self.index = 0;
        self.active = Vec4::ZERO;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn halton_base_2() {
        assert!((halton(1, 2) - 0.5).abs() < 1e-6);
        assert!((halton(2, 2) - 0.25).abs() < 1e-6);
        assert!((halton(3, 2) - 0.75).abs() < 1e-6);
        assert!((halton(4, 2) - 0.125).abs() < 1e-6);
    }

    #[test]
    fn halton_base_3() {
        assert!((halton(1, 3) - 1.0 / 3.0).abs() < 1e-6);
        assert!((halton(2, 3) - 2.0 / 3.0).abs() < 1e-6);
        assert!((halton(3, 3) - 1.0 / 9.0).abs() < 1e-6);
    }

    #[test]
    fn table_is_centered() {
        let seq = JitterSequence::default();
        assert_eq!(seq.sample_count(), DEFAULT_JITTER_SAMPLES);
        for i in 0..seq.sample_count() {
            let p = seq.sample(i);
            assert!(p.x > -0.5 && p.x < 0.5, "x={} at {}", p.x, i);
            assert!(p.y > -0.5 && p.y < 0.5, "y={} at {}", p.y, i);
        }
        assert!((seq.sample(0).x - 0.0).abs() < 1e-6);
        assert!((seq.sample(0).y - (1.0 / 3.0 - 0.5)).abs() < 1e-6);
    }

    #[test]
    fn previous_pair_follows_current_pair() {
        let mut seq = JitterSequence::default();
        let mut last_current = seq.current();
        for _ in 0..40 {
            let s = seq.advance();
            assert_eq!(Vec2::new(s.x, s.y), last_current);
            last_current = Vec2::new(s.z, s.w);
        }
    }

    #[test]
    fn index_cycles_with_table_length() {
        let mut seq = JitterSequence::new(16);
        seq.advance();
        let start = seq.index();
        let first = seq.current();
        for _ in 0..seq.sample_count() {
            seq.advance();
        }
        assert_eq!(seq.index(), start);
        // one full period later the same table entry is current again
        assert_eq!(seq.current(), first);
        assert_eq!(seq.previous(), seq.sample(seq.sample_count() - 1));
    }

    #[test]
    fn sequences_are_reproducible() {
        let mut a = JitterSequence::new(8);
        let mut b = JitterSequence::new(8);
        for _ in 0..20 {
            assert_eq!(a.advance(), b.advance());
        }
        a.reset();
        assert_eq!(a.index(), 0);
        assert_eq!(a.active(), Vec4::ZERO);
    }

    #[test]
    fn zero_length_is_clamped() {
        let mut seq = JitterSequence::new(0);
        assert_eq!(seq.sample_count(), 1);
        seq.advance();
        seq.advance();
        assert_eq!(seq.index(), 0);
        assert_eq!(seq.previous(), seq.current());
    }
}
