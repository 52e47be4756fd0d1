//! Read-only dataset extraction over a finished tree.
//!
//! - `sft`: best-valued leaves as instruction/response pairs
//! - `preference`: sibling comparisons as preferred/dispreferred triples
//! - `writer`: JSON-lines and CSV output

pub mod preference;
pub mod sft;
pub mod writer;

pub use preference::{extract_preferences, PreferenceRecord};
pub use sft::{best_leaf, extract_sft, extract_sft_with, SftOptions, SftRecord};
pub use writer::{DatasetFormat, DatasetWriter};
