use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::atomic::AtomicBool;
use tracing::{debug, info, warn};

use crate::{
    config::ForestConfig,
    error::{ForestError, Result},
    forest::forest::{Forest, OutlierForest},
    tree::iso_tree::IsolationTree,
    utils::{
        io::{read_bin, write_bin},
        statistics::quantile,
        structures::SampleStore,
    },
    RandomGenerator,
};

const DEFAULT_THRESHOLD: f64 = 0.5;

/// Ensemble of isolation trees scoring points by how quickly they isolate.
///
/// A forest starts unfit. A successful `fit` replaces the whole ensemble; a
/// failed one leaves the previous state untouched.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IsolationForest {
    trees: Vec<IsolationTree>,
    config: ForestConfig,
    max_samples: usize,
    height_limit: usize,
    n_features: Option<usize>,
    threshold: f64,
}

impl IsolationForest {
    pub fn new(config: ForestConfig) -> Self {
        Self {
            trees: Vec::new(),
            config,
            max_samples: 0,
            height_limit: 0,
            n_features: None,
            threshold: DEFAULT_THRESHOLD,
        }
    }

    /// Fits `n_trees` trees on subsamples of `max_samples` rows with default
    /// settings otherwise.
    pub fn fit_with(
        store: &SampleStore,
        n_trees: usize,
        max_samples: usize,
        random_state: Option<u64>,
    ) -> Result<Self> {
        let mut config = ForestConfig::new(n_trees, max_samples);
        config.random_state = random_state;
        let mut forest = Self::new(config);
        forest.fit(store)?;
        Ok(forest)
    }

    /// Like `fit`, but stops launching tree builds once `cancel` is set.
    pub fn fit_cancellable(&mut self, store: &SampleStore, cancel: &AtomicBool) -> Result<()> {
        self.fit_checked(store, Some(cancel))
    }

    fn fit_checked(&mut self, store: &SampleStore, cancel: Option<&AtomicBool>) -> Result<()> {
        self.config.validate()?;
        if store.is_empty() {
            return Err(ForestError::configuration(
                "store",
                "cannot fit on an empty sample store",
            ));
        }
        let max_samples = self.config.max_samples.min(store.n_rows());
        if max_samples < 2 {
            return Err(ForestError::configuration(
                "store",
                format!("at least 2 rows are required, got {}", store.n_rows()),
            ));
        }
        if max_samples < self.config.max_samples {
            warn!(
                requested = self.config.max_samples,
                n_rows = store.n_rows(),
                "max_samples larger than the sample store, using all rows"
            );
        }
        let height_limit = self.config.height_limit(max_samples);
        let mut random_state = match self.config.random_state {
            Some(seed) => RandomGenerator::seed_from_u64(seed),
            None => RandomGenerator::from_entropy(),
        };
        debug!(
            n_trees = self.config.n_trees,
            max_samples,
            height_limit,
            n_threads = ?self.config.n_threads,
            "fitting isolation forest"
        );

        let trees = match self.config.n_threads {
            Some(n_threads) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(n_threads)
                    .build()?;
                pool.install(|| {
                    self.fit_(store, max_samples, height_limit, &mut random_state, cancel)
                })?
            }
            None => self.fit_(store, max_samples, height_limit, &mut random_state, cancel)?,
        };

        let mut fitted = Self {
            trees,
            config: self.config.clone(),
            max_samples,
            height_limit,
            n_features: Some(store.n_features()),
            threshold: DEFAULT_THRESHOLD,
        };
        if let Some(contamination) = self.config.contamination {
            let scores = fitted.score_samples(store)?;
            fitted.threshold = quantile(&scores, 1.0 - contamination);
        }
        info!(
            n_trees = fitted.trees.len(),
            max_samples,
            threshold = fitted.threshold,
            "isolation forest fit"
        );
        *self = fitted;
        Ok(())
    }

    pub fn config(&self) -> &ForestConfig {
        &self.config
    }
    /// Replaces the configuration used by the next fit; the current ensemble
    /// stays until that fit succeeds.
    pub fn set_config(&mut self, config: ForestConfig) {
        self.config = config;
    }
    pub fn is_fit(&self) -> bool {
        self.n_features.is_some()
    }
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
    pub fn trees(&self) -> &[IsolationTree] {
        &self.trees
    }
    pub fn max_samples(&self) -> usize {
        self.max_samples
    }
    pub fn height_limit(&self) -> usize {
        self.height_limit
    }
    pub fn n_features(&self) -> Option<usize> {
        self.n_features
    }
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Writes the fitted forest as MessagePack.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        if !self.is_fit() {
            return Err(ForestError::NotFit);
        }
        write_bin(path, self)
    }

    /// Reads a forest written by `save`, rejecting models that could not
    /// have come out of a successful fit.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let forest: Self = read_bin(path)?;
        forest.validate()?;
        Ok(forest)
    }

    fn validate(&self) -> Result<()> {
        let Some(n_features) = self.n_features else {
            return Err(ForestError::InvalidModel("forest is not fit".to_string()));
        };
        if self.trees.is_empty() {
            return Err(ForestError::InvalidModel("forest has no trees".to_string()));
        }
        if self.max_samples < 2 {
            return Err(ForestError::InvalidModel(format!(
                "max_samples must be at least 2, got {}",
                self.max_samples
            )));
        }
        if !self.threshold.is_finite() {
            return Err(ForestError::InvalidModel(format!(
                "non-finite threshold {}",
                self.threshold
            )));
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(n_features).map_err(|e| match e {
                ForestError::InvalidModel(reason) => {
                    ForestError::InvalidModel(format!("tree {}: {}", i, reason))
                }
                other => other,
            })?;
        }
        Ok(())
    }
}

impl Forest<IsolationTree> for IsolationForest {
    fn get_forest_config(&self) -> &ForestConfig {
        &self.config
    }
    fn get_trees(&self) -> &[IsolationTree] {
        &self.trees
    }
    fn grow_tree(
        store: &SampleStore,
        indices: &mut [usize],
        height_limit: usize,
        random_state: &mut RandomGenerator,
    ) -> IsolationTree {
        IsolationTree::build(store, indices, height_limit, random_state)
    }
    fn fit(&mut self, store: &SampleStore) -> Result<()> {
        self.fit_checked(store, None)
    }
}

impl OutlierForest<IsolationTree> for IsolationForest {
    fn get_max_samples(&self) -> usize {
        self.max_samples
    }
    fn get_n_features(&self) -> Option<usize> {
        self.n_features
    }
    fn get_threshold(&self) -> f64 {
        self.threshold
    }
}
