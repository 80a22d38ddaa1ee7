//! Non-repeating variant sequence
//!
//! Hands out variant indices in shuffled cycles: each of the `N` variants
//! appears exactly once per cycle, and a fresh cycle is shuffled only when
//! the previous one is used up.

use std::collections::VecDeque;

use lane_engine::foundation::random::RandomSource;

/// Shuffled, self-refilling sequence of variant indices
#[derive(Debug, Clone)]
pub struct SequenceGenerator {
    remaining: VecDeque<usize>,
    variant_count: usize,
}

impl SequenceGenerator {
    /// Create a generator over `[0, variant_count)`
    ///
    /// The first cycle is shuffled lazily on the first draw.
    pub fn new(variant_count: usize) -> Self {
        Self {
            remaining: VecDeque::with_capacity(variant_count),
            variant_count,
        }
    }

    /// Number of variants per cycle
    pub fn variant_count(&self) -> usize {
        self.variant_count
    }

    /// Draws left before the next reshuffle
    pub fn remaining(&self) -> usize {
        self.remaining.len()
    }

    /// Next variant index; `None` only when there are no variants
    pub fn next(&mut self, random: &mut dyn RandomSource) -> Option<usize> {
        if self.remaining.is_empty() {
            self.refill(random);
        }
        self.remaining.pop_front()
    }

    /// Identity permutation shuffled in place (Fisher–Yates)
    fn refill(&mut self, random: &mut dyn RandomSource) {
        let mut order: Vec<usize> = (0..self.variant_count).collect();
        let n = order.len();
        for i in 0..n {
            let j = random.range_usize(i, n);
            order.swap(i, j);
        }
        log::trace!("New platform cycle: {order:?}");
        self.remaining.extend(order);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lane_engine::foundation::random::{ScriptedRandom, SeededRandom};

    #[test]
    fn test_every_cycle_is_a_permutation() {
        let mut random = SeededRandom::new(17);
        let mut generator = SequenceGenerator::new(5);

        for _ in 0..50 {
            let mut cycle: Vec<usize> = (0..5)
                .map(|_| generator.next(&mut random).expect("has variants"))
                .collect();
            cycle.sort_unstable();
            assert_eq!(cycle, vec![0, 1, 2, 3, 4]);
        }
    }

    #[test]
    fn test_refills_only_when_empty() {
        let mut random = SeededRandom::new(1);
        let mut generator = SequenceGenerator::new(3);
        assert_eq!(generator.remaining(), 0);
        generator.next(&mut random);
        assert_eq!(generator.remaining(), 2);
        generator.next(&mut random);
        generator.next(&mut random);
        assert_eq!(generator.remaining(), 0);
        generator.next(&mut random);
        assert_eq!(generator.remaining(), 2);
    }

    #[test]
    fn test_single_variant_and_empty() {
        let mut random = SeededRandom::new(1);
        let mut single = SequenceGenerator::new(1);
        assert_eq!(single.next(&mut random), Some(0));
        assert_eq!(single.next(&mut random), Some(0));

        let mut empty = SequenceGenerator::new(0);
        assert_eq!(empty.next(&mut random), None);
    }

    #[test]
    fn test_orders_vary_between_cycles() {
        let mut random = SeededRandom::new(99);
        let mut generator = SequenceGenerator::new(5);
        let cycles: Vec<Vec<usize>> = (0..20)
            .map(|_| (0..5).filter_map(|_| generator.next(&mut random)).collect())
            .collect();
        assert!(cycles.iter().any(|c| c != &cycles[0]));
    }

    #[test]
    fn test_zero_draws_keep_identity_order() {
        // j == i on every Fisher-Yates step
        let mut random = ScriptedRandom::new([0.0]);
        let mut generator = SequenceGenerator::new(4);
        let cycle: Vec<usize> = (0..4).filter_map(|_| generator.next(&mut random)).collect();
        assert_eq!(cycle, vec![0, 1, 2, 3]);
    }
}
