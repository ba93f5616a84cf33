use serde::{Deserialize, Serialize};
use std::ops::Range;

use super::{node::Node, split::StandardSplit};
use crate::tree::split::get_random_split;
use crate::{
    error::{ForestError, Result},
    tree::tree::Tree,
    utils::structures::SampleStore,
    RandomGenerator,
};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IsolationTreeConfig {
    pub max_depth: usize,
    pub n_features: usize,
}

/// Randomized binary partition tree grown on one subsample.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IsolationTree {
    nodes: Vec<Node>,
    config: IsolationTreeConfig,
}

impl IsolationTree {
    pub fn new(config: IsolationTreeConfig) -> Self {
        Self {
            nodes: Vec::new(),
            config,
        }
    }

    /// Builds a tree over the rows of `store` listed in `indices`.
    pub fn build(
        store: &SampleStore,
        indices: &mut [usize],
        max_depth: usize,
        random_state: &mut RandomGenerator,
    ) -> Self {
        let mut tree = Self::new(IsolationTreeConfig {
            max_depth,
            n_features: store.n_features(),
        });
        tree.fit(store, indices, random_state);
        tree
    }

    pub fn n_features(&self) -> usize {
        self.config.n_features
    }
    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }
    pub fn n_leaves(&self) -> usize {
        self.nodes.iter().filter(|node| node.is_leaf()).count()
    }
    pub fn max_depth_reached(&self) -> usize {
        self.nodes.iter().map(Node::get_depth).max().unwrap_or(0)
    }
    /// Checks that every walk from the root ends on a leaf and only reads
    /// features below `n_features`.
    ///
    /// Children are built after their parent, so every child id must be
    /// greater than its parent's id and inside the arena.
    pub fn validate(&self, n_features: usize) -> Result<()> {
        if self.nodes.is_empty() {
            return Err(ForestError::InvalidModel("tree has no nodes".to_string()));
        }
        if self.config.n_features != n_features {
            return Err(ForestError::InvalidModel(format!(
                "tree expects {} features, forest has {}",
                self.config.n_features, n_features
            )));
        }
        for (position, node) in self.nodes.iter().enumerate() {
            if let Node::Internal {
                split, left, right, ..
            } = node
            {
                if split.feature >= n_features {
                    return Err(ForestError::InvalidModel(format!(
                        "node {} splits on feature {} of {}",
                        position, split.feature, n_features
                    )));
                }
                for child in [*left, *right] {
                    if child <= position || child >= self.nodes.len() {
                        return Err(ForestError::InvalidModel(format!(
                            "node {} has child {} outside ({}, {})",
                            position,
                            child,
                            position,
                            self.nodes.len()
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    /// Sum of leaf sizes, i.e. the size of the subsample the tree was grown on.
    pub fn leaf_sizes_total(&self) -> usize {
        self.nodes
            .iter()
            .filter(|node| node.is_leaf())
            .map(Node::get_n_samples)
            .sum()
    }
}

impl Tree for IsolationTree {
    fn get_max_depth(&self) -> usize {
        self.config.max_depth
    }

    fn get_nodes(&self) -> &[Node] {
        &self.nodes
    }

    fn set_nodes(&mut self, nodes: Vec<Node>) {
        self.nodes = nodes;
    }

    fn get_split(
        &self,
        store: &SampleStore,
        indices: &mut [usize],
        non_constant_features: &mut Vec<usize>,
        random_state: &mut RandomGenerator,
    ) -> Option<(Range<usize>, Range<usize>, StandardSplit)> {
        get_random_split(store, indices, non_constant_features, random_state)
    }
}
