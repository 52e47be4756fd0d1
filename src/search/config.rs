//! Beam search parameters.
//!
//! Defaults are a three-wide beam, four steps deep, three candidates per
//! expansion.

use crate::{Result, ThoughtBeamError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Beam search configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeamConfig {
    /// Nodes kept in the frontier after each pruning step.
    /// `1` is greedy chain-of-thought descent.
    /// Default: 3
    #[serde(default = "default_beam_size")]
    pub beam_size: usize,

    /// Depth at which branches stop expanding. `0` only scores the root.
    /// Default: 4
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Candidate continuations requested per expansion
    /// Default: 3
    #[serde(default = "default_width")]
    pub width: usize,

    /// Per-call deadline for each oracle invocation, in milliseconds.
    /// `None` waits indefinitely.
    #[serde(default)]
    pub oracle_timeout_ms: Option<u64>,

    /// Raw scores are divided by this before clamping to [0, 1]
    /// (e.g. 10.0 for a 1-10 rating oracle).
    /// Default: 1.0
    #[serde(default = "default_rating_scale")]
    pub rating_scale: f64,

    /// A child whose content contains this marker is a final answer and is
    /// never expanded.
    /// Default: "TERMINATE"
    #[serde(default = "default_completion_marker")]
    pub completion_marker: Option<String>,
}

fn default_beam_size() -> usize {
    3
}

fn default_max_depth() -> usize {
    4
}

fn default_width() -> usize {
    3
}

fn default_rating_scale() -> f64 {
    1.0
}

/// Marker a final-answer step carries unless configured otherwise
pub const DEFAULT_COMPLETION_MARKER: &str = "TERMINATE";

fn default_completion_marker() -> Option<String> {
    Some(DEFAULT_COMPLETION_MARKER.to_string())
}

impl Default for BeamConfig {
    fn default() -> Self {
        Self {
            beam_size: default_beam_size(),
            max_depth: default_max_depth(),
            width: default_width(),
            oracle_timeout_ms: None,
            rating_scale: default_rating_scale(),
            completion_marker: default_completion_marker(),
        }
    }
}

impl BeamConfig {
    /// Loads a configuration from a JSON file; missing fields take defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: BeamConfig = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.beam_size == 0 {
            return Err(ThoughtBeamError::InvalidConfig(
                "beam_size must be at least 1".to_string(),
            ));
        }
        if self.width == 0 {
            return Err(ThoughtBeamError::InvalidConfig(
                "width must be at least 1".to_string(),
            ));
        }
        if !(self.rating_scale.is_finite() && self.rating_scale > 0.0) {
            return Err(ThoughtBeamError::InvalidConfig(format!(
                "rating_scale must be positive, got {}",
                self.rating_scale
            )));
        }
        if matches!(&self.completion_marker, Some(marker) if marker.is_empty()) {
            return Err(ThoughtBeamError::InvalidConfig(
                "completion_marker must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn oracle_timeout(&self) -> Option<Duration> {
        self.oracle_timeout_ms.map(Duration::from_millis)
    }

    /// True when `content` carries the completion marker
    pub fn is_final_answer(&self, content: &str) -> bool {
        self.completion_marker
            .as_deref()
            .is_some_and(|marker| content.contains(marker))
    }

    /// Compact description for logging
    pub fn to_config_string(&self) -> String {
        format!(
            "beam[{}]_depth[{}]_width[{}]_scale[{:.1}]",
            self.beam_size, self.max_depth, self.width, self.rating_scale
        )
    }
}
