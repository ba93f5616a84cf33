//! Isolation Forest anomaly scoring.
//!
//! Trees are grown on random subsamples by recursive random axis-aligned
//! splits; points that isolate after few splits score close to 1.
//!
//! ```no_run
//! use iforest::{ForestConfig, IsolationForest, Forest, OutlierForest};
//! use iforest::utils::io::read_csv;
//!
//! let store = read_csv("test_data.csv", b',', true)?;
//! let mut forest = IsolationForest::new(ForestConfig::default().with_random_state(42));
//! forest.fit(&store)?;
//! let scores = forest.score_samples(&store)?;
//! # Ok::<(), iforest::ForestError>(())
//! ```

pub mod config;
pub mod driver;
pub mod error;

pub mod tree {
    pub mod iso_tree;
    pub mod node;
    pub mod split;
    #[allow(clippy::module_inception)]
    pub mod tree;
}

pub mod forest {
    #[allow(clippy::module_inception)]
    pub mod forest;
    pub mod iso_forest;
}

pub mod utils {
    pub mod io;
    pub mod statistics;
    pub mod structures;
    pub mod synthetic;
}


pub type RandomGenerator = rand_chacha::ChaCha8Rng;

pub use config::ForestConfig;
pub use driver::{run, ScoreConvention, ScoringDriver};
pub use error::{ForestError, Result};
pub use forest::forest::{Forest, OutlierForest};
pub use forest::iso_forest::IsolationForest;
pub use tree::iso_tree::IsolationTree;
pub use tree::tree::Tree;
pub use utils::structures::SampleStore;
