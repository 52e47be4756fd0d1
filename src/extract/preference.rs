//! Sibling preference pairs for preference optimization.
//!
//! Every internal node with at least two children contributes one directed
//! record per ordered sibling pair whose value margin is strictly above the
//! threshold. Unscored siblings never take part.

use crate::tree::node::{NodeId, ThoughtTree};
use crate::{Result, ThoughtBeamError};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreferenceRecord {
    /// Trajectory of the shared parent
    pub instruction: String,
    pub preferred: String,
    pub dispreferred: String,
}

/// Extracts preference records, parents in depth-first order and pairs in
/// sibling order.
///
/// Fails with [`ThoughtBeamError::InvalidThreshold`] unless
/// `0 < threshold < 1`.
pub fn extract_preferences(tree: &ThoughtTree, threshold: f64) -> Result<Vec<PreferenceRecord>> {
    if !(threshold > 0.0 && threshold < 1.0) {
        return Err(ThoughtBeamError::InvalidThreshold(threshold));
    }

    let parents: Vec<NodeId> = tree
        .preorder()
        .into_iter()
        .filter(|&id| tree.node(id).children().len() >= 2)
        .collect();

    let records: Vec<Vec<PreferenceRecord>> = parents
        .par_iter()
        .map(|&id| sibling_preferences(tree, id, threshold))
        .collect();
    let records: Vec<PreferenceRecord> = records.into_iter().flatten().collect();

    log::debug!(
        "Extracted {} preference record(s) from {} parent(s) at threshold {}",
        records.len(),
        parents.len(),
        threshold
    );
    Ok(records)
}

fn sibling_preferences(tree: &ThoughtTree, parent: NodeId, threshold: f64) -> Vec<PreferenceRecord> {
    let node = tree.node(parent);
    let children = node.children();
    let mut records = Vec::new();
    for (i, &first) in children.iter().enumerate() {
        for (j, &second) in children.iter().enumerate() {
            if i == j {
                continue;
            }
            let (Some(v_first), Some(v_second)) =
                (tree.node(first).value(), tree.node(second).value())
            else {
                continue;
            };
            if v_first - v_second > threshold {
                records.push(PreferenceRecord {
                    instruction: node.trajectory().to_string(),
                    preferred: tree.node(first).content().to_string(),
                    dispreferred: tree.node(second).content().to_string(),
                });
            }
        }
    }
    records
}
