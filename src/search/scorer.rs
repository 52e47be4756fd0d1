//! Path scoring: one oracle call per new node, over its full trajectory.

use crate::search::oracle::{OracleError, ScoringOracle};
use crate::tree::node::Node;
use std::sync::Arc;
use std::time::Duration;

/// Scores nodes through a [`ScoringOracle`]
#[derive(Clone)]
pub struct PathScorer {
    oracle: Arc<dyn ScoringOracle>,
    rating_scale: f64,
    timeout: Option<Duration>,
}

impl PathScorer {
    pub fn new(oracle: Arc<dyn ScoringOracle>) -> Self {
        Self {
            oracle,
            rating_scale: 1.0,
            timeout: None,
        }
    }

    pub fn with_rating_scale(mut self, rating_scale: f64) -> Self {
        self.rating_scale = rating_scale;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the node's value in [0, 1]. The caller attaches it.
    pub async fn score(&self, node: &Node) -> Result<f64, OracleError> {
        let call = self.oracle.score(node.trajectory());
        let raw = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| OracleError::Timeout(limit))??,
            None => call.await?,
        };
        normalize_score(raw, self.rating_scale)
    }
}

fn normalize_score(raw: f64, rating_scale: f64) -> Result<f64, OracleError> {
    if !raw.is_finite() {
        return Err(OracleError::InvalidOutput(format!("non-finite score {}", raw)));
    }
    Ok((raw / rating_scale).clamp(0.0, 1.0))
}
