use std::collections::VecDeque;
use std::ops::Range;

use crate::{
    tree::{
        node::Node,
        split::StandardSplit,
    },
    utils::structures::SampleStore,
    RandomGenerator,
};

pub const EGAMMA: f64 = 0.577215664901532860606512090082402431_f64;

/// Expected path length of an unsuccessful search in a binary search tree
/// over `n_samples` points, `c(n)`.
pub fn average_path_length(n_samples: usize) -> f64 {
    if n_samples <= 1 {
        0.0
    } else {
        2.0 * harmonic_number(n_samples - 1)
            - (2.0 * (n_samples as f64 - 1.0) / n_samples as f64)
    }
}

#[inline]
fn harmonic_number(n: usize) -> f64 {
    (n as f64).ln() + EGAMMA
}

pub trait Tree: Sync + Send {
    fn get_max_depth(&self) -> usize;
    fn get_nodes(&self) -> &[Node];
    fn set_nodes(&mut self, nodes: Vec<Node>);
    fn get_root(&self) -> &Node {
        &self.get_nodes()[0]
    }
    fn get_node_at(&self, id: usize) -> &Node {
        &self.get_nodes()[id]
    }
    fn get_split(
        &self,
        store: &SampleStore,
        indices: &mut [usize],
        non_constant_features: &mut Vec<usize>,
        random_state: &mut RandomGenerator,
    ) -> Option<(Range<usize>, Range<usize>, StandardSplit)>;

    /// Grows the tree over the rows of `store` listed in `indices`.
    fn fit(&mut self, store: &SampleStore, indices: &mut [usize], random_state: &mut RandomGenerator) {
        let nodes = self.build_tree(store, indices, random_state);
        self.set_nodes(nodes);
    }
    fn build_tree(
        &self,
        store: &SampleStore,
        indices: &mut [usize],
        random_state: &mut RandomGenerator,
    ) -> Vec<Node> {
        let features = (0..store.n_features()).collect::<Vec<_>>();
        // (range, depth, parent and branch, candidate features)
        let mut queue = VecDeque::from(vec![(0..indices.len(), 0, None, features)]);
        let mut nodes: Vec<Node> = Vec::new();
        while let Some((range, depth, parent, mut non_constant_features)) = queue.pop_front() {
            let id = nodes.len();

            let link_parent = |nodes: &mut Vec<Node>| {
                if let Some((parent, branch)) = parent {
                    if let Node::Internal { left, right, .. } = &mut nodes[parent] {
                        if branch == 0 {
                            *left = id;
                        } else {
                            *right = id;
                        }
                    }
                }
            };

            let is_leaf = depth >= self.get_max_depth()
                || range.len() < 2
                || non_constant_features.is_empty();

            let node_indices = &mut indices[range.clone()];
            let leaf = Node::External {
                id,
                depth,
                n_samples: node_indices.len(),
            };

            if is_leaf {
                nodes.push(leaf);
                link_parent(&mut nodes);
                continue;
            }

            let Some((left_range, right_range, split)) = self.get_split(
                store,
                node_indices,
                &mut non_constant_features,
                random_state,
            ) else {
                nodes.push(leaf);
                link_parent(&mut nodes);
                continue;
            };

            nodes.push(Node::Internal {
                id,
                split,
                left: id,
                right: id,
                depth,
                n_samples: node_indices.len(),
            });
            link_parent(&mut nodes);

            for (branch, child_range) in [left_range, right_range].into_iter().enumerate() {
                let child_range =
                    (range.start + child_range.start)..(range.start + child_range.end);
                queue.push_back((
                    child_range,
                    depth + 1,
                    Some((id, branch)),
                    non_constant_features.clone(),
                ));
            }
        }
        nodes
    }

    fn predict_leaf(&self, x: &[f64]) -> &Node {
        let mut node = self.get_root();
        while let Node::Internal {
            split, left, right, ..
        } = node
        {
            node = match split.split(x) {
                0 => self.get_node_at(*left),
                _ => self.get_node_at(*right),
            };
        }
        node
    }

    /// Edges from the root to the leaf reached by `x`, plus `c(leaf size)`.
    fn path_length(&self, x: &[f64]) -> f64 {
        let leaf = self.predict_leaf(x);
        leaf.get_depth() as f64 + average_path_length(leaf.get_n_samples())
    }

    /// Splits tested by `x` on its way to a leaf.
    fn get_splits(&self, x: &[f64]) -> Vec<&StandardSplit> {
        let mut path = Vec::new();
        let mut node = self.get_root();
        while let Node::Internal {
            split, left, right, ..
        } = node
        {
            path.push(split);
            node = match split.split(x) {
                0 => self.get_node_at(*left),
                _ => self.get_node_at(*right),
            };
        }
        path
    }
}
