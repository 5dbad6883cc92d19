//! PushLog Review Engine: diff-to-signal pipeline for pull requests.
//!
//! Reconstructs line-level diff state from each file's patch, derives
//! readability, complexity and maintainability suggestions from the added
//! code, and merges them with remote per-file risk scores into a ranked,
//! annotated file list.
//!
//! Used by the binary for stdin/stdout; can also be called as a library.

pub mod config;
pub mod diff;
pub mod engine;
pub mod error;
pub mod merge;
pub mod metrics;
pub mod openai;
pub mod oracle;
pub mod readability;
pub mod suggestions;
pub mod types;

pub use config::Config;
pub use engine::Engine;
pub use error::{EngineError, MetricsError, OracleError};
pub use oracle::{ScoreMap, ScoringOracle, SummaryGenerator};
pub use types::{ChangeSet, FileChange, PatchLine, ReviewReport, Suggestion};
