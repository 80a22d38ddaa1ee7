//! Lane patterns
//!
//! A pattern is the set of lanes (0, 1, 2) populated together in one spawn.

use lane_engine::foundation::random::RandomSource;

/// Patterns for moving obstacles: every subset of the three lanes
pub const OBSTACLE_PATTERNS: [&[usize]; 8] = [
    &[],
    &[0],
    &[1],
    &[2],
    &[0, 1],
    &[0, 2],
    &[1, 2],
    &[0, 1, 2],
];

/// Patterns for static obstacles: never all three lanes, so a path stays open
pub const STATIC_PATTERNS: [&[usize]; 7] = [&[], &[0], &[1], &[2], &[0, 1], &[0, 2], &[1, 2]];

/// Every subset of `[0, count)`, generated by bitmask in mask order
pub fn lane_subsets(count: usize) -> Vec<Vec<usize>> {
    (0..1_usize << count)
        .map(|mask| (0..count).filter(|bit| mask & (1 << bit) != 0).collect())
        .collect()
}

/// Pick one pattern uniformly
pub fn choose<'a, P>(patterns: &'a [P], random: &mut dyn RandomSource) -> Option<&'a P> {
    if patterns.is_empty() {
        return None;
    }
    patterns.get(random.range_usize(0, patterns.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lane_engine::foundation::random::SeededRandom;

    #[test]
    fn test_obstacle_patterns_cover_required_sets() {
        assert!(OBSTACLE_PATTERNS.contains(&&[0, 1, 2][..]));
        assert!(OBSTACLE_PATTERNS.contains(&&[][..]));
        for lane in 0..3 {
            assert!(OBSTACLE_PATTERNS.contains(&&[lane][..]));
        }
    }

    #[test]
    fn test_static_patterns_leave_a_lane_open() {
        assert!(STATIC_PATTERNS.iter().all(|p| p.len() < 3));
        assert_eq!(STATIC_PATTERNS.len(), 7);
    }

    #[test]
    fn test_lane_subsets_is_power_set() {
        let subsets = lane_subsets(3);
        assert_eq!(subsets.len(), 8);
        assert_eq!(subsets[0], Vec::<usize>::new());
        assert_eq!(subsets[7], vec![0, 1, 2]);
        for pattern in OBSTACLE_PATTERNS {
            assert!(subsets.iter().any(|s| s.as_slice() == pattern));
        }
        assert_eq!(lane_subsets(0), vec![Vec::<usize>::new()]);
    }

    #[test]
    fn test_uniform_choice_reaches_every_pattern() {
        let mut random = SeededRandom::new(5);
        let mut hits = [0_u32; 8];
        for _ in 0..8000 {
            let pattern = choose(&OBSTACLE_PATTERNS, &mut random).expect("non-empty");
            let index = OBSTACLE_PATTERNS
                .iter()
                .position(|p| p == pattern)
                .expect("drawn from the set");
            hits[index] += 1;
        }
        // Expected 1000 each
        assert!(hits.iter().all(|&h| (800..1200).contains(&h)), "{hits:?}");
    }

    #[test]
    fn test_choose_from_empty() {
        let mut random = SeededRandom::new(5);
        let none: [&[usize]; 0] = [];
        assert!(choose(&none, &mut random).is_none());
    }
}
