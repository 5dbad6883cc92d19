//! Core types for the review engine (JSON contracts + internal models).

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Diff lines
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineKind {
  Addition,
  Deletion,
  Context,
}

/// One reconstructed line of a diff. `content` keeps the leading marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchLine {
  pub content: String,
  pub kind: LineKind,
  pub old_line_number: Option<u32>,
  pub new_line_number: Option<u32>,
}

impl PatchLine {
  /// Line text without its diff marker (`+`/`-`). Context lines without a
  /// marker are returned as-is.
  pub fn body(&self) -> &str {
    match self.kind {
      LineKind::Addition => self.content.strip_prefix('+').unwrap_or(&self.content),
      LineKind::Deletion => self.content.strip_prefix('-').unwrap_or(&self.content),
      LineKind::Context => self.content.strip_prefix(' ').unwrap_or(&self.content),
    }
  }

  pub fn is_addition(&self) -> bool {
    self.kind == LineKind::Addition
  }
}

// ---------------------------------------------------------------------------
// Inbound types (JSON contract: what the PR-data provider sends)
// ---------------------------------------------------------------------------

/// One file entry in a change set. Unknown fields are silently ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileChange {
  pub filename: String,
  #[serde(default)]
  pub status: String,
  #[serde(default)]
  pub additions: u32,
  #[serde(default)]
  pub deletions: u32,
  #[serde(default)]
  pub changes: u32,
  /// Raw unified-diff text; absent for binary or rename-only files.
  #[serde(default)]
  pub patch: Option<String>,
  /// Derived from `patch` by the diff parser; never read from input.
  #[serde(skip_deserializing, default)]
  pub lines: Vec<PatchLine>,
  #[serde(skip_deserializing, default)]
  pub is_vulnerable: bool,
  #[serde(skip_deserializing, default)]
  pub importance_score: u8,
  #[serde(skip_deserializing, default)]
  pub vulnerability_summary: Option<String>,
}

impl FileChange {
  pub fn new(filename: impl Into<String>, patch: Option<&str>) -> Self {
    Self {
      filename: filename.into(),
      patch: patch.map(str::to_string),
      ..Self::default()
    }
  }

  /// True when the file carries diff text worth analyzing.
  pub fn has_patch(&self) -> bool {
    self.patch.as_deref().is_some_and(|p| !p.is_empty())
  }
}

/// The full request body: every file in one pull request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChangeSet {
  pub files: Vec<FileChange>,
}

// ---------------------------------------------------------------------------
// Suggestions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SuggestionCategory {
  Complexity,
  Maintainability,
  LineLength,
  Indentation,
  Nesting,
  Naming,
}

impl SuggestionCategory {
  /// Human-facing kind shown next to the suggestion.
  pub fn label(self) -> &'static str {
    match self {
      Self::Complexity => "Complexity Suggestion",
      Self::Maintainability => "Maintainability Suggestion",
      Self::LineLength => "Line Break Suggestion",
      Self::Indentation => "Indentation Suggestion",
      Self::Nesting => "Nesting Suggestion",
      Self::Naming => "Variable Naming Suggestion",
    }
  }
}

/// One heuristic finding. `line_number` is best-effort.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Suggestion {
  pub filename: String,
  pub line_number: u32,
  pub text: String,
  pub category: SuggestionCategory,
}

impl Suggestion {
  pub fn new(
    filename: &str,
    line_number: u32,
    text: impl Into<String>,
    category: SuggestionCategory,
  ) -> Self {
    Self {
      filename: filename.to_string(),
      line_number,
      text: text.into(),
      category,
    }
  }
}

// ---------------------------------------------------------------------------
// Scores (scoring oracle output)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreStatus {
  Vulnerable,
  Secure,
}

impl ScoreStatus {
  pub fn from_str_loose(s: &str) -> Option<Self> {
    match s.trim().to_ascii_lowercase().as_str() {
      "vulnerable" => Some(Self::Vulnerable),
      "secure" | "safe" => Some(Self::Secure),
      _ => None,
    }
  }
}

/// Validated per-file score. `importance_score` is always within 1..=10.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreRecord {
  pub status: ScoreStatus,
  pub importance_score: u8,
  pub vulnerability_summary: Option<String>,
}

// ---------------------------------------------------------------------------
// Output types (JSON contract: what we emit)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct ReviewReport {
  pub review_id: String,
  pub generated_at: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub summary: Option<String>,
  pub scores_available: bool,
  /// Files in priority order (vulnerable first, then by importance).
  pub files: Vec<FileChange>,
  pub suggestions: Vec<Suggestion>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub warnings: Vec<String>,
}

/// Structured error output for unusable input.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorOutput {
  pub error: bool,
  pub message: String,
}

impl ErrorOutput {
  pub fn new(message: impl Into<String>) -> Self {
    Self {
      error: true,
      message: message.into(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn change_set_ignores_derived_fields_on_input() {
    let json = r#"{"files": [
      {"filename": "a.py", "status": "modified", "additions": 2, "patch": "@@ -1 +1 @@\n+x",
       "is_vulnerable": true, "importance_score": 9}
    ]}"#;
    let set: ChangeSet = serde_json::from_str(json).unwrap();
    let file = &set.files[0];
    assert_eq!(file.filename, "a.py");
    assert_eq!(file.additions, 2);
    assert!(!file.is_vulnerable);
    assert_eq!(file.importance_score, 0);
    assert!(file.has_patch());
  }

  #[test]
  fn empty_patch_counts_as_missing() {
    assert!(!FileChange::new("bin.png", None).has_patch());
    assert!(!FileChange::new("empty.c", Some("")).has_patch());
  }

  #[test]
  fn category_serializes_kebab_case() {
    let json = serde_json::to_string(&SuggestionCategory::LineLength).unwrap();
    assert_eq!(json, "\"line-length\"");
    assert_eq!(SuggestionCategory::Naming.label(), "Variable Naming Suggestion");
  }

  #[test]
  fn patch_line_body_strips_marker() {
    let line = PatchLine {
      content: "+    let x = 1;".into(),
      kind: LineKind::Addition,
      old_line_number: None,
      new_line_number: Some(3),
    };
    assert_eq!(line.body(), "    let x = 1;");
  }
}
