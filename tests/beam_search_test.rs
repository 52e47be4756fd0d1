//! Beam controller behavior against scripted oracles

mod common;

use assert_matches::assert_matches;
use common::{config, controller, set, ScriptedGenerator, ScriptedScorer};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use thought_beam::search::OracleStage;
use thought_beam::{BeamConfig, BeamController, OracleError, PathScorer, ThoughtBeamError, ThoughtGenerator};

fn contents(outcome: &thought_beam::SearchOutcome, ids: &[thought_beam::NodeId]) -> Vec<String> {
    ids.iter()
        .map(|&id| outcome.tree.node(id).content().to_string())
        .collect()
}

#[tokio::test]
async fn test_frontier_is_capped_by_beam_size_every_round() {
    let generator = Arc::new(ScriptedGenerator::default());
    let scorer = Arc::new(ScriptedScorer::with_values(&[("r0", 0.6), ("r1", 0.9), ("r2", 0.3)]));
    let search = controller(generator.clone(), scorer.clone(), config(2, 3, 3));

    let outcome = search.search("Q").await.unwrap();

    assert_eq!(outcome.rounds_completed(), 3);
    for report in &outcome.rounds {
        let non_terminal = report.generated.len() - report.terminal;
        assert_eq!(report.next_frontier.len(), non_terminal.min(2));
    }
    assert_eq!(contents(&outcome, &outcome.rounds[0].next_frontier), vec!["r1", "r0"]);
    // all grandchildren tie at 0.5: creation order decides
    assert_eq!(contents(&outcome, &outcome.rounds[1].next_frontier), vec!["r10", "r11"]);
    assert!(outcome.rounds[2].next_frontier.is_empty());
    assert_eq!(outcome.rounds[2].terminal, 6);

    // 1 root + 3 + 2*3 + 2*3, pruned siblings retained
    assert_eq!(outcome.tree.len(), 16);
    assert_eq!(generator.calls.load(Ordering::SeqCst), 5);
    assert_eq!(scorer.calls.load(Ordering::SeqCst), 16);
    assert!(outcome.diagnostics.is_empty());
}

#[tokio::test]
async fn test_visits_count_beam_selections() {
    let generator = Arc::new(ScriptedGenerator::default());
    let scorer = Arc::new(ScriptedScorer::with_values(&[("r1", 0.9)]));
    let outcome = controller(generator, scorer, config(1, 2, 2))
        .search("Q")
        .await
        .unwrap();

    let tree = &outcome.tree;
    assert_eq!(tree.root_node().visits(), 1);
    assert_eq!(tree.root_node().value(), Some(0.5));
    for (_, node) in tree.iter().filter(|(_, n)| n.depth() > 0) {
        let expected = if node.content() == "r1" { 1 } else { 0 };
        assert_eq!(node.visits(), expected, "visits of {}", node.content());
    }
}

#[tokio::test]
async fn test_beam_size_one_is_greedy_but_keeps_siblings() {
    let generator = Arc::new(ScriptedGenerator::default());
    let scorer = Arc::new(ScriptedScorer::with_values(&[("r1", 0.9)]));
    let outcome = controller(generator, scorer, config(1, 3, 3))
        .search("Q")
        .await
        .unwrap();

    assert_eq!(outcome.rounds_completed(), 3);
    assert_eq!(outcome.rounds[0].next_frontier.len(), 1);
    assert_eq!(outcome.rounds[1].next_frontier.len(), 1);
    assert!(outcome.rounds[2].next_frontier.is_empty());
    for report in &outcome.rounds {
        assert_eq!(report.expanded.len(), 1);
        assert_eq!(report.generated.len(), 3);
    }
    assert_eq!(contents(&outcome, &outcome.rounds[0].next_frontier), vec!["r1"]);
    assert_eq!(contents(&outcome, &outcome.rounds[1].next_frontier), vec!["r10"]);
    assert_eq!(outcome.tree.len(), 10);
}

#[test]
fn test_identical_oracles_give_identical_trees() {
    let run = || {
        let generator = Arc::new(ScriptedGenerator::default());
        let scorer = Arc::new(ScriptedScorer::with_values(&[("r01", 0.8), ("r10", 0.8)]));
        tokio_test::block_on(controller(generator, scorer, config(2, 3, 2)).search("Q")).unwrap()
    };

    let first = run();
    let second = run();
    assert_eq!(first.tree, second.tree);
    assert_eq!(first.rounds, second.rounds);
    // r01 and r10 tie at 0.8; r01 was created first
    assert_eq!(contents(&first, &first.rounds[1].next_frontier), vec!["r01", "r10"]);
}

#[tokio::test]
async fn test_one_failed_expansion_does_not_stop_siblings() {
    let generator = Arc::new(ScriptedGenerator {
        fail_on: set(&["r0"]),
        ..Default::default()
    });
    let scorer = Arc::new(ScriptedScorer::with_values(&[]));
    let outcome = controller(generator, scorer, config(2, 2, 2))
        .search("Q")
        .await
        .unwrap();

    assert_eq!(outcome.tree.len(), 5);
    assert_eq!(outcome.rounds[1].scored, 2);
    assert_eq!(contents(&outcome, &outcome.rounds[1].generated), vec!["r10", "r11"]);

    assert_eq!(outcome.diagnostics.len(), 1);
    let diagnostic = &outcome.diagnostics[0];
    assert_eq!(diagnostic.round, Some(1));
    assert_eq!(diagnostic.stage, OracleStage::Generation);
    assert_eq!(outcome.tree.node(diagnostic.node).content(), "r0");
    assert!(outcome.tree.node(diagnostic.node).is_leaf());
    assert_matches!(diagnostic.error, OracleError::Unavailable(_));
}

#[tokio::test]
async fn test_failed_score_ranks_last_and_stays_unset() {
    let generator = Arc::new(ScriptedGenerator::default());
    let scorer = Arc::new(ScriptedScorer {
        fail_on: set(&["r0"]),
        ..ScriptedScorer::with_values(&[("r1", 0.1)])
    });
    let outcome = controller(generator, scorer, config(2, 2, 2))
        .search("Q")
        .await
        .unwrap();

    assert_eq!(contents(&outcome, &outcome.rounds[0].next_frontier), vec!["r1", "r0"]);
    let failed = outcome.diagnostics[0].node;
    assert_eq!(outcome.diagnostics[0].stage, OracleStage::Scoring);
    assert_eq!(outcome.tree.node(failed).value(), None);
}

#[tokio::test]
async fn test_all_expansions_failing_is_exhaustion() {
    let generator = Arc::new(ScriptedGenerator {
        fail_all: true,
        ..Default::default()
    });
    let scorer = Arc::new(ScriptedScorer::with_values(&[]));
    let result = controller(generator, scorer, config(2, 3, 2)).search("Q").await;

    assert_matches!(
        result,
        Err(ThoughtBeamError::SearchExhausted { round: 0, frontier: 1 })
    );
}

#[tokio::test]
async fn test_exhaustion_in_a_later_round() {
    let generator = Arc::new(ScriptedGenerator {
        fail_on: set(&["r0", "r1"]),
        ..Default::default()
    });
    let scorer = Arc::new(ScriptedScorer::with_values(&[]));
    let result = controller(generator, scorer, config(2, 3, 2)).search("Q").await;

    assert_matches!(
        result,
        Err(ThoughtBeamError::SearchExhausted { round: 1, frontier: 2 })
    );
}

#[tokio::test]
async fn test_all_scores_failing_is_exhaustion() {
    let generator = Arc::new(ScriptedGenerator::default());
    let scorer = Arc::new(ScriptedScorer {
        fail_all: true,
        ..Default::default()
    });
    let result = controller(generator, scorer, config(2, 3, 2)).search("Q").await;

    assert_matches!(result, Err(ThoughtBeamError::SearchExhausted { round: 0, .. }));
}

#[tokio::test]
async fn test_blank_replies_are_failures_not_answers() {
    let generator = Arc::new(ScriptedGenerator {
        blank_on: set(&["r"]),
        ..Default::default()
    });
    let scorer = Arc::new(ScriptedScorer::with_values(&[]));
    let result = controller(generator, scorer, config(2, 3, 2)).search("Q").await;

    assert_matches!(
        result,
        Err(ThoughtBeamError::SearchExhausted { round: 0, frontier: 1 })
    );
}

#[tokio::test]
async fn test_answered_frontier_ends_search_normally() {
    let generator = Arc::new(ScriptedGenerator {
        answer_on: set(&["r0", "r1"]),
        ..Default::default()
    });
    let scorer = Arc::new(ScriptedScorer::with_values(&[]));
    let outcome = controller(generator, scorer, config(2, 4, 2))
        .search("Q")
        .await
        .unwrap();

    assert_eq!(outcome.rounds_completed(), 2);
    assert_eq!(outcome.rounds[1].answered, 2);
    assert!(outcome.rounds[1].generated.is_empty());
    assert_eq!(outcome.tree.len(), 3);
    assert!(outcome.diagnostics.is_empty());
}

#[tokio::test]
async fn test_completion_marker_children_are_terminal() {
    let generator = Arc::new(ScriptedGenerator {
        finalize_on: set(&["r"]),
        ..Default::default()
    });
    let scorer = Arc::new(ScriptedScorer::with_values(&[]));
    let outcome = controller(generator, scorer, config(3, 4, 2))
        .search("Q")
        .await
        .unwrap();

    assert_eq!(outcome.rounds_completed(), 1);
    assert_eq!(outcome.rounds[0].terminal, 2);
    assert!(outcome.rounds[0].next_frontier.is_empty());
    assert_eq!(outcome.tree.len(), 3);
}

#[tokio::test]
async fn test_timeout_isolates_the_slow_node() {
    let generator = Arc::new(ScriptedGenerator {
        hang_on: set(&["r0"]),
        ..Default::default()
    });
    let scorer = Arc::new(ScriptedScorer::with_values(&[]));
    let config = BeamConfig {
        oracle_timeout_ms: Some(50),
        ..config(2, 2, 2)
    };
    let outcome = controller(generator, scorer, config)
        .search("Q")
        .await
        .unwrap();

    assert_eq!(outcome.diagnostics.len(), 1);
    assert_eq!(
        outcome.diagnostics[0].error,
        OracleError::Timeout(Duration::from_millis(50))
    );
    assert_eq!(contents(&outcome, &outcome.rounds[1].generated), vec!["r10", "r11"]);
}

#[tokio::test]
async fn test_zero_depth_only_scores_root() {
    let generator = Arc::new(ScriptedGenerator::default());
    let scorer = Arc::new(ScriptedScorer::with_values(&[("r", 0.25)]));
    let outcome = controller(generator.clone(), scorer, config(2, 0, 2))
        .search("Q")
        .await
        .unwrap();

    assert_eq!(outcome.rounds_completed(), 0);
    assert_eq!(outcome.tree.len(), 1);
    assert_eq!(outcome.tree.root_node().value(), Some(0.25));
    assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_rating_scale_normalizes_scores() {
    let generator = Arc::new(ScriptedGenerator::default());
    let scorer = Arc::new(ScriptedScorer {
        default: 5.0,
        ..Default::default()
    });
    let config = BeamConfig {
        rating_scale: 10.0,
        ..config(1, 1, 2)
    };
    let outcome = controller(generator, scorer, config)
        .search("Q")
        .await
        .unwrap();

    for (_, node) in outcome.tree.iter() {
        assert_eq!(node.value(), Some(0.5));
    }
}

#[tokio::test]
async fn test_searched_tree_keeps_structural_invariants() {
    let generator = Arc::new(ScriptedGenerator::default());
    let scorer = Arc::new(ScriptedScorer::with_values(&[("r2", 0.9), ("r20", 0.1)]));
    let outcome = controller(generator, scorer, config(2, 3, 3))
        .search("Find x such that 2x + 3 = 11")
        .await
        .unwrap();

    let tree = &outcome.tree;
    for (id, node) in tree.iter() {
        let expected_depth = node.parent().map_or(0, |p| tree.node(p).depth() + 1);
        assert_eq!(node.depth(), expected_depth);
        assert_eq!(tree.reconstruct_trajectory(id), node.trajectory());
        for &child in node.children() {
            assert_eq!(tree.node(child).parent(), Some(id));
        }
    }
}

#[test]
fn test_invalid_config_is_rejected() {
    let generator = ThoughtGenerator::new(Arc::new(ScriptedGenerator::default()));
    let scorer = PathScorer::new(Arc::new(ScriptedScorer::default()));
    let result = BeamController::new(generator, scorer, config(0, 3, 2));
    assert!(matches!(result, Err(ThoughtBeamError::InvalidConfig(_))));
}
