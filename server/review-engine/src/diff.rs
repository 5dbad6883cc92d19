//! Unified-diff reconstruction: raw patch text to numbered line records.

use std::sync::OnceLock;

use regex::Regex;

use crate::types::{FileChange, LineKind, PatchLine};

static HUNK_HEADER: OnceLock<Regex> = OnceLock::new();

/// `@@ -A[,B] +C[,D] @@`; the counts are optional.
fn hunk_header() -> &'static Regex {
  HUNK_HEADER.get_or_init(|| {
    Regex::new(r"^@@ -(\d+)(?:,\d+)? \+(\d+)(?:,\d+)? @@").expect("valid regex")
  })
}

const NO_NEWLINE_MARKER: &str = "\\ No newline at end of file";

/// Parse one raw patch into ordered line records.
///
/// Each hunk header resets both counters to its starting values minus one; the
/// header itself emits nothing. Lines that merely look like headers are
/// classified by their first character like any other line.
pub fn parse(patch: &str) -> Vec<PatchLine> {
  let mut lines = Vec::new();
  let mut old_line: u32 = 0;
  let mut new_line: u32 = 0;

  for raw in patch.lines() {
    if let Some(caps) = hunk_header().captures(raw) {
      if let (Some(old_start), Some(new_start)) = (
        caps.get(1).and_then(|m| m.as_str().parse::<u32>().ok()),
        caps.get(2).and_then(|m| m.as_str().parse::<u32>().ok()),
      ) {
        old_line = old_start.saturating_sub(1);
        new_line = new_start.saturating_sub(1);
        continue;
      }
    }

    if raw.trim() == NO_NEWLINE_MARKER {
      continue;
    }

    let record = if raw.starts_with('+') {
      new_line = new_line.saturating_add(1);
      PatchLine {
        content: raw.to_string(),
        kind: LineKind::Addition,
        old_line_number: None,
        new_line_number: Some(new_line),
      }
    } else if raw.starts_with('-') {
      old_line = old_line.saturating_add(1);
      PatchLine {
        content: raw.to_string(),
        kind: LineKind::Deletion,
        old_line_number: Some(old_line),
        new_line_number: None,
      }
    } else {
      old_line = old_line.saturating_add(1);
      new_line = new_line.saturating_add(1);
      PatchLine {
        content: raw.to_string(),
        kind: LineKind::Context,
        old_line_number: Some(old_line),
        new_line_number: Some(new_line),
      }
    };
    lines.push(record);
  }

  lines
}

impl FileChange {
  /// Populate `lines` from `patch`. Files without a patch end up with no lines.
  pub fn parse_patch(&mut self) {
    self.lines = match self.patch.as_deref() {
      Some(p) => parse(p),
      None => Vec::new(),
    };
  }
}
