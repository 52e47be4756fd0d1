//! Oracle seams.
//!
//! The search never produces or judges thought text itself. It talks to two
//! async oracles:
//!
//! - [`GenerationOracle`]: trajectory -> up to `width` candidate next steps
//! - [`ScoringOracle`]: trajectory -> scalar quality
//!
//! [`OptionListOracle`] and [`RatingOracle`] adapt a plain text completion
//! backend to those seams.

use crate::search::config::{BeamConfig, DEFAULT_COMPLETION_MARKER};
use crate::tree::content::Content;
use async_trait::async_trait;
use std::time::Duration;

/// Instruction sent with every generation request
pub const STEP_INSTRUCTION: &str = "You are solving a problem one reasoning step at a time. \
Given the question and the steps taken so far, propose distinct possible next steps. \
Write each on its own line as `Option N: <step>`. Each option must be a single step, \
not a full solution. If the latest step already answers the question, reply with \
TERMINATE and no options.";

/// Per-call oracle failure. Always isolated to the node being processed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OracleError {
    #[error("oracle unavailable: {0}")]
    Unavailable(String),

    #[error("oracle timed out after {0:?}")]
    Timeout(Duration),

    #[error("oracle returned unusable output: {0}")]
    InvalidOutput(String),
}

/// What the generation oracle is asked for
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest<'a> {
    pub trajectory: &'a str,
    pub instruction: &'a str,
    /// Upper bound on the number of candidates
    pub width: usize,
}

#[async_trait]
pub trait GenerationOracle: Send + Sync {
    /// Returns 0..=width candidate steps, in preference order. An empty list
    /// means no further step is possible.
    async fn generate(&self, request: GenerationRequest<'_>) -> Result<Vec<Content>, OracleError>;
}

#[async_trait]
pub trait ScoringOracle: Send + Sync {
    /// Returns a raw quality score for the full trajectory.
    async fn score(&self, trajectory: &str) -> Result<f64, OracleError>;
}

/// Text-in, text-out model backend
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, OracleError>;
}

// ============================================================================
// OPTION LIST ADAPTER
// ============================================================================

/// Generation oracle over a completion backend that answers with
/// `Option N: ...` lines.
///
/// The marker that turns an option-less reply into an answer should match
/// [`BeamConfig::completion_marker`]; [`OptionListOracle::from_config`] takes
/// it from there.
pub struct OptionListOracle<B> {
    backend: B,
    completion_marker: Option<String>,
}

impl<B: CompletionBackend> OptionListOracle<B> {
    /// Adapter using [`DEFAULT_COMPLETION_MARKER`]
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            completion_marker: Some(DEFAULT_COMPLETION_MARKER.to_string()),
        }
    }

    /// Adapter sharing the search's completion marker
    pub fn from_config(backend: B, config: &BeamConfig) -> Self {
        Self {
            backend,
            completion_marker: config.completion_marker.clone(),
        }
    }

    pub fn with_completion_marker(mut self, marker: Option<String>) -> Self {
        self.completion_marker = marker;
        self
    }
}

#[async_trait]
impl<B: CompletionBackend> GenerationOracle for OptionListOracle<B> {
    async fn generate(&self, request: GenerationRequest<'_>) -> Result<Vec<Content>, OracleError> {
        let prompt = format!(
            "{}\n\nPropose at most {} options.",
            request.trajectory, request.width
        );
        let reply = self.backend.complete(request.instruction, &prompt).await?;
        let options = parse_options(&reply);

        if options.is_empty() {
            let answered = self
                .completion_marker
                .as_deref()
                .is_some_and(|marker| reply.contains(marker));
            if answered {
                return Ok(Vec::new());
            }
            return Err(OracleError::InvalidOutput(format!(
                "no options found in reply of {} chars",
                reply.len()
            )));
        }
        Ok(options
            .into_iter()
            .take(request.width)
            .map(Content::Text)
            .collect())
    }
}

/// Extracts `Option N: text` entries from a completion.
///
/// Continuation lines that do not start a new option are appended to the
/// previous one.
pub fn parse_options(reply: &str) -> Vec<String> {
    let mut options: Vec<String> = Vec::new();
    for line in reply.lines() {
        let trimmed = line.trim();
        if let Some(text) = option_body(trimmed) {
            options.push(text.to_string());
        } else if let Some(last) = options.last_mut() {
            if !trimmed.is_empty() {
                last.push('\n');
                last.push_str(trimmed);
            }
        }
    }
    options.retain(|o| !o.trim().is_empty());
    options
}

fn option_body(line: &str) -> Option<&str> {
    let rest = line
        .trim_start_matches(['*', '#', '-'])
        .trim_start()
        .strip_prefix("Option")?
        .trim_start();
    let digits = rest.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits == 0 {
        return None;
    }
    let rest = rest[digits..].trim_start_matches('*').trim_start();
    let body = rest.strip_prefix(':').or_else(|| rest.strip_prefix('.'))?;
    Some(body.trim_start_matches('*').trim())
}

// ============================================================================
// RATING ADAPTER
// ============================================================================

/// Instruction sent to the rating backend
pub const RATING_INSTRUCTION: &str = "Rate the reasoning trajectory below for correctness \
and progress toward answering the question. End your reply with a line `Rating: N`.";

/// Scoring oracle over a completion backend that ends with `Rating: N`
pub struct RatingOracle<B> {
    backend: B,
}

impl<B: CompletionBackend> RatingOracle<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl<B: CompletionBackend> ScoringOracle for RatingOracle<B> {
    async fn score(&self, trajectory: &str) -> Result<f64, OracleError> {
        let reply = self.backend.complete(RATING_INSTRUCTION, trajectory).await?;
        parse_rating(&reply).ok_or_else(|| {
            OracleError::InvalidOutput(format!("no rating found in reply of {} chars", reply.len()))
        })
    }
}

/// Reads the number after the last `Rating:` label in a reply.
pub fn parse_rating(reply: &str) -> Option<f64> {
    let lower = reply.to_ascii_lowercase();
    let start = lower.rfind("rating:")? + "rating:".len();
    let number: String = reply[start..]
        .trim_start()
        .trim_start_matches('*')
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    number.trim_end_matches('.').parse().ok()
}
