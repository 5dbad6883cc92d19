//! Orchestration: local analysis, summary and scoring run concurrently over
//! the same file set, then scores are merged into a ranked report.

use std::sync::Arc;

use chrono::Utc;
use tokio::task::{spawn_blocking, JoinError};
use tracing::{info, warn};

use crate::error::OracleError;
use crate::merge;
use crate::oracle::{ScoreMap, ScoringOracle, SummaryGenerator};
use crate::suggestions;
use crate::types::{FileChange, ReviewReport};

/// The review engine. Remote collaborators are supplied by the caller.
pub struct Engine {
  scorer: Arc<dyn ScoringOracle>,
  summarizer: Arc<dyn SummaryGenerator>,
}

impl Engine {
  pub fn new(scorer: Arc<dyn ScoringOracle>, summarizer: Arc<dyn SummaryGenerator>) -> Self {
    Self { scorer, summarizer }
  }

  /// Review one change set.
  ///
  /// All three branches always run to completion. A failing or panicking
  /// branch degrades the report (no summary, default scores, no suggestions)
  /// and adds a warning; it never fails the review.
  pub async fn review(&self, mut files: Vec<FileChange>) -> ReviewReport {
    for file in files.iter_mut() {
      file.parse_patch();
    }
    let review_id = review_id(&files);
    let shared = Arc::new(files);

    let suggestions_task = {
      let files = Arc::clone(&shared);
      spawn_blocking(move || suggestions::aggregate(&files))
    };
    let summary_task = {
      let files = Arc::clone(&shared);
      let summarizer = Arc::clone(&self.summarizer);
      spawn_blocking(move || summarizer.summarize(&files))
    };
    let score_task = {
      let files = Arc::clone(&shared);
      let scorer = Arc::clone(&self.scorer);
      spawn_blocking(move || scorer.score(&files))
    };

    let (suggestions, summary, scores) = tokio::join!(suggestions_task, summary_task, score_task);

    let mut warnings = Vec::new();

    let suggestions = match suggestions {
      Ok(found) => found,
      Err(e) => {
        warn!(error = %e, "suggestion task failed");
        warnings.push(format!("suggestions unavailable: {}", e));
        Vec::new()
      }
    };

    let summary = match flatten(summary) {
      Ok(text) => Some(text),
      Err(e) => {
        warn!(error = %e, "summary generation failed");
        warnings.push(format!("summary unavailable: {}", e));
        None
      }
    };

    let (scores, scores_available) = match flatten(scores) {
      Ok(map) => (map, true),
      Err(e) => {
        warn!(error = %e, "scoring failed; using default scores");
        warnings.push(format!("scores unavailable: {}", e));
        (ScoreMap::new(), false)
      }
    };

    // Every task has finished, so this is normally the only reference left.
    let files = Arc::try_unwrap(shared).unwrap_or_else(|still_shared| (*still_shared).clone());
    let files = merge::merge(files, &scores);

    info!(
      review_id = %review_id,
      files = files.len(),
      suggestions = suggestions.len(),
      scores_available,
      warnings = warnings.len(),
      "review assembled"
    );

    ReviewReport {
      review_id,
      generated_at: Utc::now().to_rfc3339(),
      summary,
      scores_available,
      files,
      suggestions,
      warnings,
    }
  }
}

fn flatten<T>(joined: Result<Result<T, OracleError>, JoinError>) -> Result<T, OracleError> {
  joined.unwrap_or_else(|e| Err(OracleError::TaskFailed(e.to_string())))
}

/// Stable id: hash of every filename and patch, in order.
pub fn review_id(files: &[FileChange]) -> String {
  let mut hasher = blake3::Hasher::new();
  for file in files {
    hasher.update(file.filename.as_bytes());
    hasher.update(b"\0");
    hasher.update(file.patch.as_deref().unwrap_or_default().as_bytes());
    hasher.update(b"\n");
  }
  let hex = hasher.finalize().to_hex();
  format!("rev-{}", &hex[..16])
}
