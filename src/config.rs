use serde::{Deserialize, Serialize};

use crate::error::{ForestError, Result};

pub const DEFAULT_N_TREES: usize = 100;
pub const SUBSAMPLE_SIZE: usize = 256;

/// Hyper-parameters of an isolation forest.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ForestConfig {
    pub n_trees: usize,
    /// Requested subsample size per tree, clamped to the row count at fit time.
    pub max_samples: usize,
    /// Overrides the default height limit `ceil(log2(max_samples))`.
    pub max_depth: Option<usize>,
    pub random_state: Option<u64>,
    /// Size of a dedicated worker pool; the global rayon pool is used when unset.
    pub n_threads: Option<usize>,
    /// Expected fraction of outliers, used to place the prediction threshold.
    pub contamination: Option<f64>,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: DEFAULT_N_TREES,
            max_samples: SUBSAMPLE_SIZE,
            max_depth: None,
            random_state: None,
            n_threads: None,
            contamination: None,
        }
    }
}

impl ForestConfig {
    pub fn new(n_trees: usize, max_samples: usize) -> Self {
        Self {
            n_trees,
            max_samples,
            ..Self::default()
        }
    }
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }
    pub fn with_n_threads(mut self, n_threads: usize) -> Self {
        self.n_threads = Some(n_threads);
        self
    }
    pub fn with_contamination(mut self, contamination: f64) -> Self {
        self.contamination = Some(contamination);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.n_trees < 1 {
            return Err(ForestError::configuration(
                "n_trees",
                "must be at least 1",
            ));
        }
        if self.max_samples < 2 {
            return Err(ForestError::configuration(
                "max_samples",
                format!("must be at least 2, got {}", self.max_samples),
            ));
        }
        if self.max_depth == Some(0) {
            return Err(ForestError::configuration(
                "max_depth",
                "must be at least 1",
            ));
        }
        if self.n_threads == Some(0) {
            return Err(ForestError::configuration(
                "n_threads",
                "must be at least 1",
            ));
        }
        if let Some(contamination) = self.contamination {
            if !(contamination > 0.0 && contamination <= 0.5) {
                return Err(ForestError::configuration(
                    "contamination",
                    format!("must be in (0, 0.5], got {contamination}"),
                ));
            }
        }
        Ok(())
    }

    /// Height limit for trees grown on `max_samples` points.
    pub fn height_limit(&self, max_samples: usize) -> usize {
        self.max_depth
            .unwrap_or((max_samples as f64).max(2.0).log2().ceil() as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = ForestConfig::default();
        assert_eq!(config.n_trees, 100);
        assert_eq!(config.max_samples, 256);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_zero_trees() {
        let err = ForestConfig::new(0, 256).validate().unwrap_err();
        assert!(matches!(err, ForestError::Configuration { ref name, .. } if name == "n_trees"));
    }

    #[test]
    fn test_rejects_small_sample_size() {
        assert!(ForestConfig::new(10, 1).validate().is_err());
        assert!(ForestConfig::new(10, 2).validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_contamination() {
        for contamination in [0.0, -0.1, 0.6, f64::NAN] {
            let config = ForestConfig::default().with_contamination(contamination);
            assert!(config.validate().is_err(), "{contamination} accepted");
        }
        assert!(ForestConfig::default()
            .with_contamination(0.5)
            .validate()
            .is_ok());
    }

    #[test]
    fn test_rejects_zero_threads() {
        assert!(ForestConfig::default().with_n_threads(0).validate().is_err());
    }

    #[test]
    fn test_height_limit() {
        let config = ForestConfig::default();
        assert_eq!(config.height_limit(256), 8);
        assert_eq!(config.height_limit(257), 9);
        assert_eq!(config.height_limit(2), 1);
        assert_eq!(config.height_limit(1), 1);
        assert_eq!(config.with_max_depth(3).height_limit(256), 3);
    }
}
