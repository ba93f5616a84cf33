use serde::{Deserialize, Serialize};

use super::split::StandardSplit;

/// A node of an isolation tree, stored in the tree's node arena.
///
/// Children are arena ids owned by exactly one parent, so the structure is a
/// strict tree with no sharing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    External {
        id: usize,
        depth: usize,
        n_samples: usize,
    },
    Internal {
        id: usize,
        split: StandardSplit,
        left: usize,
        right: usize,
        depth: usize,
        n_samples: usize,
    },
}
impl Node {
    pub fn get_n_samples(&self) -> usize {
        match self {
            Node::External { n_samples, .. } => *n_samples,
            Node::Internal { n_samples, .. } => *n_samples,
        }
    }
    pub fn get_depth(&self) -> usize {
        match self {
            Node::External { depth, .. } => *depth,
            Node::Internal { depth, .. } => *depth,
        }
    }
    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::External { .. })
    }
}
