//! Scripted oracles shared by the integration tests.
//!
//! Children of a node whose last step is `p` are named `p0`, `p1`, ... The
//! root's last step is `r`.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thought_beam::{
    BeamConfig, BeamController, Content, GenerationOracle, GenerationRequest, OracleError,
    PathScorer, ScoringOracle, ThoughtGenerator,
};

/// Name of the last step in a trajectory
pub fn last_step(trajectory: &str) -> String {
    let line = trajectory.lines().last().unwrap_or_default();
    if line == "---" {
        return "r".to_string();
    }
    match line.split_once(": ") {
        Some((_, content)) => content.to_string(),
        None => line.to_string(),
    }
}

#[derive(Default)]
pub struct ScriptedGenerator {
    /// Expansion of these steps fails
    pub fail_on: HashSet<String>,
    /// These steps have reached an answer (empty expansion)
    pub answer_on: HashSet<String>,
    /// Children of these steps carry the completion marker
    pub finalize_on: HashSet<String>,
    /// Expansion of these steps hangs
    pub hang_on: HashSet<String>,
    /// Expansion of these steps yields only blank candidates
    pub blank_on: HashSet<String>,
    pub fail_all: bool,
    pub calls: AtomicUsize,
}

#[async_trait]
impl GenerationOracle for ScriptedGenerator {
    async fn generate(&self, request: GenerationRequest<'_>) -> Result<Vec<Content>, OracleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let parent = last_step(request.trajectory);
        if self.fail_all || self.fail_on.contains(&parent) {
            return Err(OracleError::Unavailable(format!("backend down for {}", parent)));
        }
        if self.hang_on.contains(&parent) {
            tokio::time::sleep(Duration::from_secs(30)).await;
        }
        if self.answer_on.contains(&parent) {
            return Ok(Vec::new());
        }
        if self.blank_on.contains(&parent) {
            return Ok(vec![Content::from("  "); request.width]);
        }
        let suffix = if self.finalize_on.contains(&parent) {
            " TERMINATE"
        } else {
            ""
        };
        Ok((0..request.width)
            .map(|k| Content::Text(format!("{}{}{}", parent, k, suffix)))
            .collect())
    }
}

#[derive(Default)]
pub struct ScriptedScorer {
    /// Value per last step; everything else scores `default`
    pub values: HashMap<String, f64>,
    pub default: f64,
    pub fail_on: HashSet<String>,
    pub fail_all: bool,
    pub calls: AtomicUsize,
}

impl ScriptedScorer {
    pub fn with_values(values: &[(&str, f64)]) -> Self {
        Self {
            values: values.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
            default: 0.5,
            ..Default::default()
        }
    }
}

#[async_trait]
impl ScoringOracle for ScriptedScorer {
    async fn score(&self, trajectory: &str) -> Result<f64, OracleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let step = last_step(trajectory);
        if self.fail_all || self.fail_on.contains(&step) {
            return Err(OracleError::Unavailable(format!("grader down for {}", step)));
        }
        Ok(self.values.get(&step).copied().unwrap_or(self.default))
    }
}

pub fn set(items: &[&str]) -> HashSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

pub fn config(beam_size: usize, max_depth: usize, width: usize) -> BeamConfig {
    BeamConfig {
        beam_size,
        max_depth,
        width,
        ..BeamConfig::default()
    }
}

pub fn controller(
    generator: Arc<ScriptedGenerator>,
    scorer: Arc<ScriptedScorer>,
    config: BeamConfig,
) -> BeamController {
    BeamController::new(
        ThoughtGenerator::new(generator),
        PathScorer::new(scorer),
        config,
    )
    .expect("valid config")
}
