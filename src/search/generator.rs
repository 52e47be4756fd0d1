//! Thought generation: one oracle call per expanded node.

use crate::search::oracle::{GenerationOracle, GenerationRequest, OracleError, STEP_INSTRUCTION};
use crate::tree::node::Node;
use std::sync::Arc;
use std::time::Duration;

/// Produces candidate next steps for a node
#[derive(Clone)]
pub struct ThoughtGenerator {
    oracle: Arc<dyn GenerationOracle>,
    instruction: String,
    timeout: Option<Duration>,
}

impl ThoughtGenerator {
    pub fn new(oracle: Arc<dyn GenerationOracle>) -> Self {
        Self {
            oracle,
            instruction: STEP_INSTRUCTION.to_string(),
            timeout: None,
        }
    }

    pub fn with_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.instruction = instruction.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Asks the oracle for up to `width` continuations of `node`.
    ///
    /// Returns normalized, non-blank step texts in oracle order. An empty list
    /// means the node already reads as a final answer; a reply made only of
    /// blank candidates is [`OracleError::InvalidOutput`].
    pub async fn generate(&self, node: &Node, width: usize) -> Result<Vec<String>, OracleError> {
        let request = GenerationRequest {
            trajectory: node.trajectory(),
            instruction: &self.instruction,
            width,
        };
        let call = self.oracle.generate(request);
        let contents = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| OracleError::Timeout(limit))??,
            None => call.await?,
        };

        let mut steps: Vec<String> = contents
            .iter()
            .filter(|content| !content.is_blank())
            .map(|content| content.normalize())
            .collect();
        if steps.is_empty() && !contents.is_empty() {
            return Err(OracleError::InvalidOutput(format!(
                "all {} candidates were blank",
                contents.len()
            )));
        }
        if steps.len() > width {
            log::warn!(
                "Generation oracle returned {} candidates for width {}; keeping the first {}",
                steps.len(),
                width,
                width
            );
            steps.truncate(width);
        }
        Ok(steps)
    }
}
