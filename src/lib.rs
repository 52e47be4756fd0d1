//! # Thought Beam
//!
//! Tree-of-thought beam search over opaque generation and scoring oracles.
//!
//! ## Features
//!
//! - **Thought Tree**: arena-backed tree of reasoning steps with immutable trajectories
//! - **Beam Search**: concurrent expansion and scoring, pooled pruning with a stable tie-break
//! - **Dataset Extraction**: best-path SFT pairs and sibling preference pairs
//! - **Persistence**: nested and flat JSON records with structural validation
//!
//! ## Usage
//!
//! ```rust,ignore
//! use thought_beam::{BeamConfig, BeamController, PathScorer, ThoughtGenerator};
//!
//! let controller = BeamController::new(generator, scorer, BeamConfig::default())?;
//! let outcome = controller.search("What is 17 * 24?").await?;
//! let pairs = thought_beam::extract::extract_sft(&outcome.tree);
//! ```

// ============================================================================
// PUBLIC API MODULES
// ============================================================================

/// Thought tree data model and codec
pub mod tree;

/// Beam search controller and oracle seams
pub mod search;

/// Dataset extraction over finished trees
pub mod extract;

/// Logger setup for binaries
pub mod logging;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================

pub use tree::{Content, ContentPart, Node, NodeId, ThoughtTree};

pub use search::{
    BeamConfig, BeamController, GenerationOracle, GenerationRequest, OracleError, PathScorer,
    ScoringOracle, SearchOutcome, ThoughtGenerator,
};

pub use extract::{PreferenceRecord, SftRecord};

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Main error type for the thought beam library
#[derive(Debug, thiserror::Error)]
pub enum ThoughtBeamError {
    #[error("Oracle error: {0}")]
    Oracle(#[from] OracleError),

    #[error("Search exhausted at round {round}: no child of {frontier} frontier node(s) could be scored")]
    SearchExhausted { round: usize, frontier: usize },

    #[error("Malformed tree: {0}")]
    MalformedTree(String),

    #[error("Invalid preference threshold {0}: must be strictly between 0 and 1")]
    InvalidThreshold(f64),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, ThoughtBeamError>;

// ============================================================================
// LIBRARY VERSION INFO
// ============================================================================

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Library description
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
