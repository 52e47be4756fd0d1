//! Beam search driver.
//!
//! Each round expands the whole frontier, scores every new child, then pools
//! the non-terminal children of all frontier nodes and keeps the best
//! `beam_size` of them. Oracle calls inside a round run concurrently; pruning
//! waits for all of them.
//!
//! Pruned and terminal nodes are never removed, they simply stop expanding.

use crate::search::config::BeamConfig;
use crate::search::generator::ThoughtGenerator;
use crate::search::outcome::{OracleStage, RoundReport, SearchDiagnostic, SearchOutcome};
use crate::search::scorer::PathScorer;
use crate::tree::content::Content;
use crate::tree::node::{NodeId, ThoughtTree};
use crate::{Result, ThoughtBeamError};
use futures::future::join_all;
use std::cmp::Ordering;

/// Runs beam search rounds over a [`ThoughtTree`]
pub struct BeamController {
    generator: ThoughtGenerator,
    scorer: PathScorer,
    config: BeamConfig,
}

impl BeamController {
    /// Validates `config` and applies its timeout and rating scale to the
    /// oracle wrappers.
    pub fn new(generator: ThoughtGenerator, scorer: PathScorer, config: BeamConfig) -> Result<Self> {
        config.validate()?;
        let timeout = config.oracle_timeout();
        Ok(Self {
            generator: generator.with_timeout(timeout),
            scorer: scorer
                .with_rating_scale(config.rating_scale)
                .with_timeout(timeout),
            config,
        })
    }

    pub fn config(&self) -> &BeamConfig {
        &self.config
    }

    /// Searches from a fresh root holding `question`.
    pub async fn search(&self, question: impl Into<Content>) -> Result<SearchOutcome> {
        self.search_from(ThoughtTree::new(question)).await
    }

    /// Searches from the root of a host-supplied tree.
    ///
    /// The tree is expected to hold only its root; existing children are kept
    /// but never revisited.
    pub async fn search_from(&self, mut tree: ThoughtTree) -> Result<SearchOutcome> {
        let root = tree.root();
        let mut diagnostics = Vec::new();
        let mut rounds = Vec::new();

        log::info!(
            "Beam search started: {} question={:?}",
            self.config.to_config_string(),
            truncate_for_log(tree.node(root).content())
        );

        if tree.node(root).value().is_none() {
            match self.scorer.score(tree.node(root)).await {
                Ok(value) => tree.set_value(root, value),
                Err(error) => {
                    log::warn!("Scoring the root failed: {}", error);
                    diagnostics.push(SearchDiagnostic {
                        round: None,
                        node: root,
                        stage: OracleStage::Scoring,
                        error,
                    });
                }
            }
        }
        tree.record_visit(root);

        let mut frontier = vec![root];
        let mut round = 0;
        while !frontier.is_empty() && round < self.config.max_depth {
            let report = self
                .run_round(&mut tree, round, &frontier, &mut diagnostics)
                .await?;
            frontier = report.next_frontier.clone();
            rounds.push(report);
            round += 1;
        }

        log::info!(
            "Beam search finished after {} round(s): {} nodes, {} diagnostic(s)",
            rounds.len(),
            tree.len(),
            diagnostics.len()
        );
        Ok(SearchOutcome {
            tree,
            rounds,
            diagnostics,
        })
    }

    async fn run_round(
        &self,
        tree: &mut ThoughtTree,
        round: usize,
        frontier: &[NodeId],
        diagnostics: &mut Vec<SearchDiagnostic>,
    ) -> Result<RoundReport> {
        let width = self.config.width;

        // Expand
        let expansions = join_all(
            frontier
                .iter()
                .map(|&id| self.generator.generate(tree.node(id), width)),
        )
        .await;

        let mut generated = Vec::new();
        let mut answered = 0;
        for (&parent, expansion) in frontier.iter().zip(expansions) {
            match expansion {
                Ok(steps) if steps.is_empty() => {
                    log::debug!("Node {} reached an answer at depth {}", parent, tree.node(parent).depth());
                    answered += 1;
                }
                Ok(steps) => {
                    for step in steps {
                        generated.push(tree.create_child(parent, step));
                    }
                }
                Err(error) => {
                    log::warn!("Round {}: expanding {} failed: {}", round, parent, error);
                    diagnostics.push(SearchDiagnostic {
                        round: Some(round),
                        node: parent,
                        stage: OracleStage::Generation,
                        error,
                    });
                }
            }
        }

        // Score
        let scores = join_all(generated.iter().map(|&id| self.scorer.score(tree.node(id)))).await;
        let mut scored = 0;
        for (&child, score) in generated.iter().zip(scores) {
            match score {
                Ok(value) => {
                    tree.set_value(child, value);
                    scored += 1;
                }
                Err(error) => {
                    log::warn!("Round {}: scoring {} failed: {}", round, child, error);
                    diagnostics.push(SearchDiagnostic {
                        round: Some(round),
                        node: child,
                        stage: OracleStage::Scoring,
                        error,
                    });
                }
            }
        }

        if scored == 0 && answered == 0 {
            log::error!(
                "Round {}: no child of {} frontier node(s) could be generated and scored",
                round,
                frontier.len()
            );
            return Err(ThoughtBeamError::SearchExhausted {
                round,
                frontier: frontier.len(),
            });
        }

        // Prune
        let mut candidates: Vec<NodeId> = generated
            .iter()
            .copied()
            .filter(|&id| !self.is_terminal(tree, id))
            .collect();
        let terminal = generated.len() - candidates.len();
        candidates.sort_by(|&a, &b| compare_for_beam(tree.node(a).value(), tree.node(b).value()));
        candidates.truncate(self.config.beam_size);
        for &id in &candidates {
            tree.record_visit(id);
        }

        log::info!(
            "Round {}: expanded {}, generated {}, scored {}, answered {}, terminal {}, kept {}",
            round,
            frontier.len(),
            generated.len(),
            scored,
            answered,
            terminal,
            candidates.len()
        );

        Ok(RoundReport {
            round,
            expanded: frontier.to_vec(),
            generated,
            scored,
            answered,
            terminal,
            next_frontier: candidates,
        })
    }

    fn is_terminal(&self, tree: &ThoughtTree, id: NodeId) -> bool {
        let node = tree.node(id);
        node.depth() >= self.config.max_depth || self.config.is_final_answer(node.content())
    }
}

/// Descending by value, unscored last. Used with a stable sort so equal
/// values keep creation order.
fn compare_for_beam(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.total_cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn truncate_for_log(text: &str) -> String {
    const LIMIT: usize = 80;
    match text.char_indices().nth(LIMIT) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
