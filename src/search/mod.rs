pub mod beam;
pub mod config;
pub mod generator;
pub mod oracle;
pub mod outcome;
pub mod scorer;

pub use beam::BeamController;
pub use config::{BeamConfig, DEFAULT_COMPLETION_MARKER};
pub use generator::ThoughtGenerator;
pub use oracle::{
    parse_options, parse_rating, CompletionBackend, GenerationOracle, GenerationRequest,
    OptionListOracle, OracleError, RatingOracle, ScoringOracle, RATING_INSTRUCTION,
    STEP_INSTRUCTION,
};
pub use outcome::{OracleStage, RoundReport, SearchDiagnostic, SearchOutcome};
pub use scorer::PathScorer;
