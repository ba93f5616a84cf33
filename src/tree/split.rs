use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::ops::Range;

use crate::{utils::structures::SampleStore, RandomGenerator};

/// Axis-aligned split: values below `threshold` go left, the rest go right.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StandardSplit {
    pub feature: usize,
    pub threshold: f64,
}

impl StandardSplit {
    /// Branch taken by `x`: 0 for left, 1 for right.
    #[inline]
    pub fn split(&self, x: &[f64]) -> usize {
        (x[self.feature] >= self.threshold) as usize
    }
}

/// Reorders `indices` so that rows going left come first and returns the
/// number of left rows.
fn split_samples(split: &StandardSplit, store: &SampleStore, indices: &mut [usize]) -> usize {
    let mut start = 0;
    let mut end = indices.len();

    while start < end {
        if store.value(indices[start], split.feature) < split.threshold {
            start += 1;
        } else {
            indices.swap(start, end - 1);
            end -= 1;
        }
    }
    start
}

/// Draws a threshold in `(min, max]`, strictly above `min` so the left side is
/// never empty.
fn draw_threshold(min: f64, max: f64, random_state: &mut RandomGenerator) -> f64 {
    // interpolated so that ranges wider than f64::MAX do not overflow
    let u: f64 = random_state.gen();
    let threshold = (1.0 - u) * min + u * max;
    if threshold > min && threshold <= max {
        return threshold;
    }
    let mid = min / 2.0 + max / 2.0;
    if mid > min && mid <= max {
        mid
    } else {
        // min and max are adjacent floats
        max
    }
}

/// Picks a random non-constant feature and a random threshold inside the
/// node's value range, partitioning `indices` accordingly.
///
/// Features found constant on this node are dropped from
/// `non_constant_features`, which bounds the number of attempts by the
/// feature count. Returns `None` when every candidate feature is constant.
pub fn get_random_split(
    store: &SampleStore,
    indices: &mut [usize],
    non_constant_features: &mut Vec<usize>,
    random_state: &mut RandomGenerator,
) -> Option<(Range<usize>, Range<usize>, StandardSplit)> {
    non_constant_features.shuffle(random_state);

    while let Some(feature) = non_constant_features.pop() {
        let (min_feature, max_feature) = indices.iter().fold(
            (f64::INFINITY, f64::NEG_INFINITY),
            |(lo, hi), &i| {
                let v = store.value(i, feature);
                (lo.min(v), hi.max(v))
            },
        );

        if max_feature <= min_feature {
            continue;
        }

        let threshold = draw_threshold(min_feature, max_feature, random_state);
        let split = StandardSplit { feature, threshold };
        let split_idx = split_samples(&split, store, indices);

        non_constant_features.push(feature);
        return Some((0..split_idx, split_idx..indices.len(), split));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn store() -> SampleStore {
        SampleStore::from_rows(vec![
            vec![5.0, 1.0],
            vec![1.0, 1.0],
            vec![3.0, 1.0],
            vec![4.0, 1.0],
            vec![2.0, 1.0],
        ])
        .unwrap()
    }

    #[test]
    fn test_split_partitions_indices() {
        let store = store();
        let mut indices = vec![0, 1, 2, 3, 4];
        let split = StandardSplit {
            feature: 0,
            threshold: 3.0,
        };
        let pivot = split_samples(&split, &store, &mut indices);
        assert_eq!(pivot, 2);
        assert!(indices[..pivot].iter().all(|&i| store.value(i, 0) < 3.0));
        assert!(indices[pivot..].iter().all(|&i| store.value(i, 0) >= 3.0));
    }

    #[test]
    fn test_random_split_skips_constant_feature() {
        let store = store();
        let mut random_state = RandomGenerator::seed_from_u64(7);
        for _ in 0..50 {
            let mut indices = vec![0, 1, 2, 3, 4];
            let mut features = vec![0, 1];
            let (left, right, split) =
                get_random_split(&store, &mut indices, &mut features, &mut random_state)
                    .unwrap();
            assert_eq!(split.feature, 0);
            assert!(split.threshold > 1.0 && split.threshold <= 5.0);
            assert!(!left.is_empty());
            assert!(!right.is_empty());
            assert_eq!(left.len() + right.len(), 5);
            assert!(features.contains(&0));
        }
    }

    #[test]
    fn test_random_split_all_constant() {
        let store = SampleStore::from_rows(vec![vec![2.0, 2.0]; 4]).unwrap();
        let mut random_state = RandomGenerator::seed_from_u64(0);
        let mut indices = vec![0, 1, 2, 3];
        let mut features = vec![0, 1];
        assert!(get_random_split(&store, &mut indices, &mut features, &mut random_state).is_none());
        assert!(features.is_empty());
    }

    #[test]
    fn test_threshold_on_adjacent_floats() {
        let mut random_state = RandomGenerator::seed_from_u64(3);
        let min = 1.0_f64;
        let max = f64::from_bits(min.to_bits() + 1);
        for _ in 0..20 {
            let threshold = draw_threshold(min, max, &mut random_state);
            assert!(threshold > min && threshold <= max);
        }
    }
}
