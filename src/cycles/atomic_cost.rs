//! Lock-free `f32` accumulator for concurrent cost updates.
//!
//! Several cycles packed in the same round may share an edge. Their deltas
//! are combined with a compare-and-swap add on the bit pattern, so no update
//! is lost and unrelated edges never contend.

use std::sync::atomic::{AtomicU32, Ordering};

use rayon::prelude::*;

/// An edge cost that can be read and incremented from many lanes at once.
#[derive(Debug, Default)]
pub struct AtomicCost(AtomicU32);

impl AtomicCost {
    pub fn new(value: f32) -> Self {
        Self(AtomicU32::new(value.to_bits()))
    }

    #[inline]
    pub fn load(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Relaxed))
    }

    /// Add `delta` and return the previous value.
    #[inline]
    pub fn fetch_add(&self, delta: f32) -> f32 {
        let prev = match self.0.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |bits| {
            Some((f32::from_bits(bits) + delta).to_bits())
        }) {
            Ok(bits) | Err(bits) => bits,
        };
        f32::from_bits(prev)
    }

    pub fn into_inner(self) -> f32 {
        f32::from_bits(self.0.into_inner())
    }
}

/// Load `weights` into a fresh buffer of atomic costs.
pub fn atomic_costs(weights: &[f32]) -> Vec<AtomicCost> {
    weights.par_iter().map(|&w| AtomicCost::new(w)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concurrent_adds_are_not_lost() {
        let cells: Vec<AtomicCost> = (0..4).map(|_| AtomicCost::new(0.0)).collect();
        (0..40_000usize).into_par_iter().for_each(|i| {
            cells[i % 4].fetch_add(1.0);
            cells[(i + 1) % 4].fetch_add(-0.5);
        });
        for c in &cells {
            assert_eq!(c.load(), 5_000.0);
        }
    }

    #[test]
    fn fetch_add_returns_previous() {
        let c = AtomicCost::new(-2.0);
        assert_eq!(c.fetch_add(2.0), -2.0);
        assert_eq!(c.into_inner(), 0.0);
    }
}
