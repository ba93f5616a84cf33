//! Fit-then-score entry point over a whole sample store.

use serde::{Deserialize, Serialize};
use std::ops::Range;
use tracing::info;

use crate::{
    config::ForestConfig,
    error::Result,
    forest::{
        forest::{score_from_depth, Forest, OutlierForest},
        iso_forest::IsolationForest,
    },
    utils::structures::SampleStore,
};

/// Which score is reported per row.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoreConvention {
    /// `2^(-E[h]/c)` in (0, 1], higher is more anomalous.
    #[default]
    AnomalyScore,
    /// `0.5 - anomaly score`, negative is anomalous.
    DecisionValue,
}

impl ScoreConvention {
    fn apply(self, score: f64) -> f64 {
        match self {
            ScoreConvention::AnomalyScore => score,
            ScoreConvention::DecisionValue => 0.5 - score,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct ScoringDriver {
    config: ForestConfig,
    convention: ScoreConvention,
}

impl ScoringDriver {
    pub fn new(config: ForestConfig) -> Self {
        Self {
            config,
            convention: ScoreConvention::default(),
        }
    }
    pub fn with_convention(mut self, convention: ScoreConvention) -> Self {
        self.convention = convention;
        self
    }

    pub fn fit(&self, store: &SampleStore) -> Result<IsolationForest> {
        let mut forest = IsolationForest::new(self.config.clone());
        forest.fit(store)?;
        Ok(forest)
    }

    /// Fits once, then scores every row in parallel; pairs are in row order.
    pub fn run(&self, store: &SampleStore) -> Result<Vec<(usize, f64)>> {
        let forest = self.fit(store)?;
        let scores = forest.score_samples(store)?;
        info!(n_rows = store.n_rows(), convention = ?self.convention, "scored sample store");
        Ok(scores
            .into_iter()
            .map(|score| self.convention.apply(score))
            .enumerate()
            .collect())
    }

    /// Fits once and returns a restartable, lazily scored view of the store.
    pub fn run_lazy<'a>(&self, store: &'a SampleStore) -> Result<ScoredStore<'a>> {
        let forest = self.fit(store)?;
        ScoredStore::new(forest, store, self.convention)
    }
}

/// Fits with default settings and returns the anomaly score of every row.
pub fn run(
    store: &SampleStore,
    n_estimators: usize,
    sample_size: usize,
) -> Result<Vec<(usize, f64)>> {
    ScoringDriver::new(ForestConfig::new(n_estimators, sample_size)).run(store)
}

/// A fitted forest paired with the store it scores.
pub struct ScoredStore<'a> {
    forest: IsolationForest,
    store: &'a SampleStore,
    convention: ScoreConvention,
}

impl<'a> ScoredStore<'a> {
    pub fn new(
        forest: IsolationForest,
        store: &'a SampleStore,
        convention: ScoreConvention,
    ) -> Result<Self> {
        forest.check_dimension(store.n_features())?;
        Ok(Self {
            forest,
            store,
            convention,
        })
    }

    pub fn forest(&self) -> &IsolationForest {
        &self.forest
    }

    pub fn into_forest(self) -> IsolationForest {
        self.forest
    }

    /// Starts a fresh pass over the rows.
    pub fn iter(&self) -> ScoreIter<'_> {
        ScoreIter {
            forest: &self.forest,
            store: self.store,
            convention: self.convention,
            rows: 0..self.store.n_rows(),
        }
    }
}

impl<'s> IntoIterator for &'s ScoredStore<'_> {
    type Item = (usize, f64);
    type IntoIter = ScoreIter<'s>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Scores rows one at a time as they are pulled.
#[derive(Clone)]
pub struct ScoreIter<'a> {
    forest: &'a IsolationForest,
    store: &'a SampleStore,
    convention: ScoreConvention,
    rows: Range<usize>,
}

impl Iterator for ScoreIter<'_> {
    type Item = (usize, f64);

    fn next(&mut self) -> Option<Self::Item> {
        let i = self.rows.next()?;
        let depth = self.forest.mean_path_length(self.store.row(i));
        let score = score_from_depth(depth, self.forest.get_max_samples());
        Some((i, self.convention.apply(score)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.rows.size_hint()
    }
}

impl ExactSizeIterator for ScoreIter<'_> {}
