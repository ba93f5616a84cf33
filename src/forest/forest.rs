use rand::{seq::index, Rng, SeedableRng};
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::{
    config::ForestConfig,
    error::{ForestError, Result},
    tree::tree::{self, Tree},
    utils::structures::SampleStore,
    RandomGenerator,
};

pub trait Forest<T: Tree>: Sync + Send {
    fn get_forest_config(&self) -> &ForestConfig;
    fn get_trees(&self) -> &[T];
    fn grow_tree(
        store: &SampleStore,
        indices: &mut [usize],
        height_limit: usize,
        random_state: &mut RandomGenerator,
    ) -> T;
    fn fit(&mut self, store: &SampleStore) -> Result<()>;

    /// Grows `n_trees` trees, each on its own subsample of `max_samples` rows.
    ///
    /// Every tree gets a generator seeded from `random_state` in slot order
    /// before any work is dispatched, so tree `i` is the same whatever the
    /// thread count or completion order. Once `cancel` is raised no further
    /// tree is started.
    fn fit_(
        &self,
        store: &SampleStore,
        max_samples: usize,
        height_limit: usize,
        random_state: &mut RandomGenerator,
        cancel: Option<&AtomicBool>,
    ) -> Result<Vec<T>> {
        let config = self.get_forest_config();
        let seeds = (0..config.n_trees)
            .map(|_| random_state.gen::<u64>())
            .collect::<Vec<_>>();
        let trees = seeds
            .into_par_iter()
            .map(|seed| {
                if cancel.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
                    return None;
                }
                let mut random_state = RandomGenerator::seed_from_u64(seed);
                let mut indices =
                    generate_indices(max_samples, store.n_rows(), &mut random_state);
                Some(Self::grow_tree(
                    store,
                    &mut indices,
                    height_limit,
                    &mut random_state,
                ))
            })
            .collect::<Vec<Option<T>>>();

        let requested = trees.len();
        let trees = trees.into_iter().flatten().collect::<Vec<T>>();
        if trees.len() < requested {
            return Err(ForestError::Cancelled {
                built: trees.len(),
                requested,
            });
        }
        Ok(trees)
    }
}

pub trait OutlierForest<T: Tree>: Forest<T> {
    /// Subsample size the trees were grown on.
    fn get_max_samples(&self) -> usize;
    /// Feature count seen at fit time, `None` before the first fit.
    fn get_n_features(&self) -> Option<usize>;
    fn get_threshold(&self) -> f64;

    fn check_dimension(&self, got: usize) -> Result<()> {
        match self.get_n_features() {
            None => Err(ForestError::NotFit),
            Some(expected) if expected != got => {
                Err(ForestError::DimensionMismatch { expected, got })
            }
            Some(_) => Ok(()),
        }
    }

    fn mean_path_length(&self, x: &[f64]) -> f64 {
        let trees = self.get_trees();
        trees.iter().map(|tree| tree.path_length(x)).sum::<f64>() / trees.len() as f64
    }

    /// Mean path length of `x` across the ensemble.
    fn average_path_length(&self, x: &[f64]) -> Result<f64> {
        self.check_dimension(x.len())?;
        Ok(self.mean_path_length(x))
    }

    /// `2^(-E[h(x)] / c(max_samples))`, in (0, 1]; higher is more anomalous.
    fn anomaly_score(&self, x: &[f64]) -> Result<f64> {
        let depth = self.average_path_length(x)?;
        Ok(score_from_depth(depth, self.get_max_samples()))
    }

    /// `0.5 - anomaly_score`; negative values flag anomalies.
    fn decision_value(&self, x: &[f64]) -> Result<f64> {
        Ok(0.5 - self.anomaly_score(x)?)
    }

    fn path_lengths(&self, store: &SampleStore) -> Result<Vec<f64>> {
        self.check_dimension(store.n_features())?;
        Ok((0..store.n_rows())
            .into_par_iter()
            .map(|i| self.mean_path_length(store.row(i)))
            .collect())
    }

    fn score_samples(&self, store: &SampleStore) -> Result<Vec<f64>> {
        let max_samples = self.get_max_samples();
        Ok(self
            .path_lengths(store)?
            .into_iter()
            .map(|depth| score_from_depth(depth, max_samples))
            .collect())
    }

    fn decision_function(&self, store: &SampleStore) -> Result<Vec<f64>> {
        Ok(self
            .score_samples(store)?
            .into_iter()
            .map(|score| 0.5 - score)
            .collect())
    }

    /// Labels rows 1 (anomaly) when their score exceeds the threshold, else 0.
    fn predict(&self, store: &SampleStore) -> Result<Vec<isize>> {
        let threshold = self.get_threshold();
        Ok(self
            .score_samples(store)?
            .into_iter()
            .map(|score| (score > threshold) as isize)
            .collect())
    }
}

pub fn score_from_depth(depth: f64, max_samples: usize) -> f64 {
    2.0_f64.powf(-depth / tree::average_path_length(max_samples))
}

/// Draws `n_samples` distinct row indices out of `n_population`, or all rows
/// when the population is smaller.
pub fn generate_indices(
    n_samples: usize,
    n_population: usize,
    random_state: &mut RandomGenerator,
) -> Vec<usize> {
    let n_samples = n_samples.min(n_population);
    index::sample(random_state, n_population, n_samples).into_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_indices_distinct() {
        let mut random_state = RandomGenerator::seed_from_u64(11);
        let mut indices = generate_indices(256, 1000, &mut random_state);
        assert_eq!(indices.len(), 256);
        assert!(indices.iter().all(|&i| i < 1000));
        indices.sort_unstable();
        indices.dedup();
        assert_eq!(indices.len(), 256);
    }

    #[test]
    fn test_generate_indices_clamps() {
        let mut random_state = RandomGenerator::seed_from_u64(11);
        let mut indices = generate_indices(256, 10, &mut random_state);
        indices.sort_unstable();
        assert_eq!(indices, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_score_from_depth() {
        let c = tree::average_path_length(256);
        crate::assert_eq_with_tol!(score_from_depth(c, 256), 0.5, 1e-12);
        crate::assert_eq_with_tol!(score_from_depth(0.0, 256), 1.0, 1e-12);
        assert!(score_from_depth(100.0, 256) > 0.0);
    }
}
