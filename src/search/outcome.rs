use crate::search::oracle::OracleError;
use crate::tree::node::{NodeId, ThoughtTree};

/// Which oracle call failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OracleStage {
    Generation,
    Scoring,
}

/// A non-fatal oracle failure isolated to one node
#[derive(Debug, Clone, PartialEq)]
pub struct SearchDiagnostic {
    /// `None` for the root scoring call made before round 0
    pub round: Option<usize>,
    pub node: NodeId,
    pub stage: OracleStage,
    pub error: OracleError,
}

/// Counters and frontier of one completed round
#[derive(Debug, Clone, PartialEq)]
pub struct RoundReport {
    pub round: usize,
    /// Frontier the round started from
    pub expanded: Vec<NodeId>,
    /// Children created this round, in creation order
    pub generated: Vec<NodeId>,
    /// Children whose score was written
    pub scored: usize,
    /// Frontier nodes whose generation came back empty
    pub answered: usize,
    /// New children excluded from the frontier (depth limit or final answer)
    pub terminal: usize,
    /// Frontier for the next round, best first
    pub next_frontier: Vec<NodeId>,
}

/// Result of a beam search: the tree is the artifact of record
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub tree: ThoughtTree,
    pub rounds: Vec<RoundReport>,
    pub diagnostics: Vec<SearchDiagnostic>,
}

impl SearchOutcome {
    pub fn rounds_completed(&self) -> usize {
        self.rounds.len()
    }

    pub fn into_tree(self) -> ThoughtTree {
        self.tree
    }
}
