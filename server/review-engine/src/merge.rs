//! Merge oracle scores into the file list and rank files for display.

use crate::oracle::ScoreMap;
use crate::types::{FileChange, ScoreStatus};

/// Annotate each file with its score (defaults when absent) and order by
/// `(is_vulnerable, importance_score)` descending. The sort is stable, so
/// files with equal keys keep their input order. Scores for filenames not in
/// `files` are ignored.
pub fn merge(files: Vec<FileChange>, scores: &ScoreMap) -> Vec<FileChange> {
  let mut ranked: Vec<FileChange> = files
    .into_iter()
    .map(|mut file| {
      match scores.get(&file.filename) {
        Some(record) => {
          file.is_vulnerable = record.status == ScoreStatus::Vulnerable;
          file.importance_score = record.importance_score;
          file.vulnerability_summary = record.vulnerability_summary.clone();
        }
        None => {
          file.is_vulnerable = false;
          file.importance_score = 0;
          file.vulnerability_summary = None;
        }
      }
      file
    })
    .collect();

  ranked.sort_by(|a, b| priority_key(b).cmp(&priority_key(a)));
  ranked
}

fn priority_key(file: &FileChange) -> (bool, u8) {
  (file.is_vulnerable, file.importance_score)
}
