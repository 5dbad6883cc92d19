//! Contracts for the remote collaborators: the scoring oracle and the
//! summary generator. Both are blocking calls; the engine runs them on the
//! blocking pool.

use std::collections::HashMap;

use serde::Deserialize;

use crate::error::OracleError;
use crate::types::{FileChange, ScoreRecord, ScoreStatus};

/// Scores keyed by filename.
pub type ScoreMap = HashMap<String, ScoreRecord>;

/// Per-file vulnerability and importance scoring.
pub trait ScoringOracle: Send + Sync {
  fn score(&self, files: &[FileChange]) -> Result<ScoreMap, OracleError>;
}

/// Free-form prose describing the change set. The text is opaque to the engine.
pub trait SummaryGenerator: Send + Sync {
  fn summarize(&self, files: &[FileChange]) -> Result<String, OracleError>;
}

#[derive(Debug, Deserialize)]
struct RawScore {
  filename: String,
  status: String,
  importance_score: f64,
  #[serde(default)]
  vulnerability_summary: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawPayload {
  Wrapped { files: Vec<RawScore> },
  Bare(Vec<RawScore>),
}

/// Parse the oracle's structured reply into validated records.
///
/// Accepts `{"files": [...]}` or a bare array, optionally inside a markdown
/// code fence. Any invalid entry rejects the whole payload. When a filename
/// repeats, the first entry wins.
pub fn parse_score_payload(text: &str) -> Result<ScoreMap, OracleError> {
  let payload: RawPayload = serde_json::from_str(strip_code_fence(text))
    .map_err(|e| OracleError::malformed(format!("score payload: {}", e)))?;
  let entries = match payload {
    RawPayload::Wrapped { files } => files,
    RawPayload::Bare(files) => files,
  };

  let mut scores = ScoreMap::new();
  for entry in entries {
    let status = ScoreStatus::from_str_loose(&entry.status).ok_or_else(|| {
      OracleError::malformed(format!("{}: unknown status {:?}", entry.filename, entry.status))
    })?;
    let importance = entry.importance_score;
    if importance.fract() != 0.0 || !(1.0..=10.0).contains(&importance) {
      return Err(OracleError::malformed(format!(
        "{}: importance_score {} outside 1..=10",
        entry.filename, importance
      )));
    }
    let record = ScoreRecord {
      status,
      importance_score: importance as u8,
      vulnerability_summary: entry
        .vulnerability_summary
        .filter(|s| !s.trim().is_empty()),
    };
    scores.entry(entry.filename).or_insert(record);
  }
  Ok(scores)
}

fn strip_code_fence(text: &str) -> &str {
  let trimmed = text.trim();
  let Some(rest) = trimmed.strip_prefix("```") else {
    return trimmed;
  };
  // Drop the info string (e.g. `json`) on the opening fence line.
  let body = rest.split_once('\n').map_or("", |(_, body)| body);
  body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_wrapped_payload() {
    let text = r#"{"files": [
      {"filename": "auth.py", "status": "vulnerable", "importance_score": 9,
       "vulnerability_summary": "SQL built from request args"},
      {"filename": "README.md", "status": "secure", "importance_score": 1, "vulnerability_summary": null}
    ]}"#;
    let scores = parse_score_payload(text).unwrap();
    assert_eq!(scores.len(), 2);
    let auth = &scores["auth.py"];
    assert_eq!(auth.status, ScoreStatus::Vulnerable);
    assert_eq!(auth.importance_score, 9);
    assert!(scores["README.md"].vulnerability_summary.is_none());
  }

  #[test]
  fn parses_fenced_bare_array() {
    let text = "```json\n[{\"filename\": \"a.c\", \"status\": \"Secure\", \"importance_score\": 4}]\n```";
    let scores = parse_score_payload(text).unwrap();
    assert_eq!(scores["a.c"].importance_score, 4);
    assert_eq!(scores["a.c"].status, ScoreStatus::Secure);
  }

  #[test]
  fn first_duplicate_wins() {
    let text = r#"[
      {"filename": "a.c", "status": "secure", "importance_score": 2},
      {"filename": "a.c", "status": "vulnerable", "importance_score": 10}
    ]"#;
    let scores = parse_score_payload(text).unwrap();
    assert_eq!(scores["a.c"].importance_score, 2);
    assert_eq!(scores["a.c"].status, ScoreStatus::Secure);
  }

  #[test]
  fn rejects_prose() {
    let err = parse_score_payload("Here are the scores you asked for!").unwrap_err();
    assert!(matches!(err, OracleError::Malformed(_)));
  }

  #[test]
  fn rejects_out_of_range_importance() {
    for bad in ["0", "11", "4.5"] {
      let text = format!(
        r#"[{{"filename": "a.c", "status": "secure", "importance_score": {}}}]"#,
        bad
      );
      assert!(parse_score_payload(&text).is_err(), "accepted {}", bad);
    }
  }

  #[test]
  fn rejects_unknown_status() {
    let text = r#"[{"filename": "a.c", "status": "maybe", "importance_score": 3}]"#;
    let err = parse_score_payload(text).unwrap_err();
    assert!(err.to_string().contains("unknown status"));
  }
}
