use rand::seq::SliceRandom;
use rand::Rng;
use rand_distr::{Distribution, Normal, Uniform};
use serde::{Deserialize, Serialize};

use crate::{
    error::{ForestError, Result},
    utils::structures::SampleStore,
    RandomGenerator,
};

/// Gaussian inliers with a small fraction of uniformly drawn outliers.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SyntheticConfig {
    pub n_inliers: usize,
    pub n_features: usize,
    pub inlier_mean: f64,
    pub inlier_std: f64,
    pub outlier_fraction: f64,
    pub outlier_low: f64,
    pub outlier_high: f64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            n_inliers: 1000,
            n_features: 1,
            inlier_mean: 1.0,
            inlier_std: 1.0,
            outlier_fraction: 0.01,
            outlier_low: 20.0,
            outlier_high: 30.0,
        }
    }
}

/// A generated store with `true` marking injected outliers.
pub struct LabeledStore {
    pub store: SampleStore,
    pub labels: Vec<bool>,
}

impl SyntheticConfig {
    pub fn n_outliers(&self) -> usize {
        (self.outlier_fraction * self.n_inliers as f64) as usize
    }

    pub fn generate<R: Rng>(&self, random_state: &mut R) -> Result<LabeledStore> {
        if self.n_features == 0 {
            return Err(ForestError::configuration("n_features", "must be at least 1"));
        }
        if !(0.0..1.0).contains(&self.outlier_fraction) {
            return Err(ForestError::configuration(
                "outlier_fraction",
                format!("must be in [0, 1), got {}", self.outlier_fraction),
            ));
        }
        let normal = Normal::new(self.inlier_mean, self.inlier_std)
            .map_err(|e| ForestError::configuration("inlier_std", e.to_string()))?;
        if !(self.outlier_low < self.outlier_high)
            || !self.outlier_low.is_finite()
            || !self.outlier_high.is_finite()
        {
            return Err(ForestError::configuration(
                "outlier_low",
                "must be finite and below outlier_high",
            ));
        }
        let uniform = Uniform::new_inclusive(self.outlier_low, self.outlier_high);

        let mut rows = (0..self.n_inliers)
            .map(|_| {
                let row = (0..self.n_features)
                    .map(|_| normal.sample(random_state))
                    .collect::<Vec<f64>>();
                (row, false)
            })
            .collect::<Vec<_>>();
        for _ in 0..self.n_outliers() {
            let row = (0..self.n_features)
                .map(|_| uniform.sample(random_state))
                .collect::<Vec<f64>>();
            rows.push((row, true));
        }
        rows.shuffle(random_state);

        let labels = rows.iter().map(|(_, label)| *label).collect();
        let store = SampleStore::from_rows(rows.into_iter().map(|(row, _)| row).collect())?;
        Ok(LabeledStore { store, labels })
    }
}

/// Default synthetic dataset from a fixed seed.
pub fn generate_default(seed: u64) -> Result<LabeledStore> {
    use rand::SeedableRng;
    SyntheticConfig::default().generate(&mut RandomGenerator::seed_from_u64(seed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_shape() {
        let data = generate_default(42).unwrap();
        assert_eq!(data.store.n_rows(), 1010);
        assert_eq!(data.store.n_features(), 1);
        assert_eq!(data.labels.iter().filter(|&&l| l).count(), 10);
        assert!(generate_default(0).is_ok());
    }

    #[test]
    fn test_outliers_in_range() {
        let data = generate_default(1).unwrap();
        for (row, &label) in data.store.rows().zip(&data.labels) {
            if label {
                assert!(row[0] >= 20.0 && row[0] <= 30.0);
            }
        }
    }

    #[test]
    fn test_bad_config() {
        let config = SyntheticConfig {
            n_features: 0,
            ..SyntheticConfig::default()
        };
        assert!(config
            .generate(&mut rand::thread_rng())
            .is_err());
    }

    #[test]
    fn test_bad_outlier_fraction() {
        for outlier_fraction in [-1.0, 1.0, 2.5, f64::NAN] {
            let config = SyntheticConfig {
                outlier_fraction,
                ..SyntheticConfig::default()
            };
            let result = config.generate(&mut rand::thread_rng());
            assert!(
                matches!(result, Err(ForestError::Configuration { ref name, .. }) if name == "outlier_fraction"),
                "outlier_fraction {outlier_fraction}"
            );
        }
        let none = SyntheticConfig {
            outlier_fraction: 0.0,
            ..SyntheticConfig::default()
        };
        let data = none.generate(&mut rand::thread_rng()).unwrap();
        assert!(data.labels.iter().all(|&l| !l));
    }
}
