//! Best-path extraction for supervised fine-tuning.

use crate::tree::node::{root_trajectory, NodeId, ThoughtTree};
use serde::{Deserialize, Serialize};

/// One supervised example: the question and the steps that best answered it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SftRecord {
    pub instruction: String,
    pub response: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SftOptions {
    /// Leaves within this distance of the best value count as tied.
    /// `0.0` keeps exact float equality.
    pub tolerance: f64,
}

/// Pairs for every leaf whose value equals the best leaf value exactly.
pub fn extract_sft(tree: &ThoughtTree) -> Vec<SftRecord> {
    extract_sft_with(tree, &SftOptions::default())
}

pub fn extract_sft_with(tree: &ThoughtTree, options: &SftOptions) -> Vec<SftRecord> {
    let Some(max_value) = tree.best_leaf_value(tree.root()) else {
        log::debug!("No scored leaf in tree of {} nodes; SFT extraction is empty", tree.len());
        return Vec::new();
    };

    let root = tree.root_node();
    let preamble = root_trajectory(root.content());
    let tolerance = options.tolerance.max(0.0);

    tree.leaves()
        .into_iter()
        .filter(|&id| {
            tree.node(id).value().is_some_and(|value| {
                if tolerance == 0.0 {
                    value == max_value
                } else {
                    max_value - value <= tolerance
                }
            })
        })
        .map(|id| {
            let trajectory = tree.node(id).trajectory();
            SftRecord {
                instruction: root.content().to_string(),
                response: trajectory
                    .strip_prefix(preamble.as_str())
                    .unwrap_or(trajectory)
                    .to_string(),
            }
        })
        .collect()
}

/// The final-answer query: the highest-valued leaf, earliest created on ties.
pub fn best_leaf(tree: &ThoughtTree) -> Option<NodeId> {
    let mut best: Option<(NodeId, f64)> = None;
    for id in tree.leaves() {
        if let Some(value) = tree.node(id).value() {
            if best.map_or(true, |(_, current)| value > current) {
                best = Some((id, value));
            }
        }
    }
    best.map(|(id, _)| id)
}
