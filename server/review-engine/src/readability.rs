//! Readability checks over added lines: length, indentation, nesting, naming.
//!
//! Each check is an independent predicate. All checks run on every added line
//! and may fire together; emission order is fixed (length, indentation,
//! nesting, naming).

use std::sync::OnceLock;

use regex::Regex;

use crate::types::{PatchLine, Suggestion, SuggestionCategory};

/// Longest body (after trimming) that is not flagged.
pub const MAX_LINE_LENGTH: usize = 80;
/// Canonical indent step; any other leading run is flagged.
pub const INDENT_WIDTH: usize = 4;
/// Occurrences of one bracket character on a line that count as deep nesting.
pub const NESTING_REPEAT: usize = 5;

static DECLARATION: OnceLock<Regex> = OnceLock::new();
static GENERIC_NAME: OnceLock<Regex> = OnceLock::new();

fn declaration() -> &'static Regex {
  DECLARATION.get_or_init(|| {
    Regex::new(r"\b(?:int|char|float|double|unsigned|bool)\s+").expect("valid regex")
  })
}

fn generic_name() -> &'static Regex {
  GENERIC_NAME.get_or_init(|| {
    Regex::new(r"\b(data|temp|value|buf|var|res|item)\b").expect("valid regex")
  })
}

/// Scan the added lines of one file.
pub fn scan(filename: &str, lines: &[PatchLine]) -> Vec<Suggestion> {
  let mut out = Vec::new();

  for line in lines.iter().filter(|l| l.is_addition()) {
    let raw = line.body();
    let body = raw.trim();
    let line_number = line.new_line_number.unwrap_or(0);

    if body.starts_with("#define") {
      continue;
    }

    if is_long_line(body) {
      out.push(Suggestion::new(
        filename,
        line_number,
        "Line exceeds 80 characters. Consider breaking it into multiple lines for readability.",
        SuggestionCategory::LineLength,
      ));
    }

    if has_inconsistent_indentation(raw) {
      out.push(Suggestion::new(
        filename,
        line_number,
        "Line has inconsistent indentation. Consider using 4 spaces for indentation.",
        SuggestionCategory::Indentation,
      ));
    }

    if has_excessive_nesting(body) {
      out.push(Suggestion::new(
        filename,
        line_number,
        "Code appears deeply nested (5+ levels). Consider refactoring to reduce nesting depth.",
        SuggestionCategory::Nesting,
      ));
    }

    for name in generic_names(body) {
      out.push(Suggestion::new(
        filename,
        line_number,
        format!(
          "Variable '{}' is too generic. Consider renaming it to something more descriptive.",
          name
        ),
        SuggestionCategory::Naming,
      ));
    }
  }

  out
}

pub fn is_long_line(body: &str) -> bool {
  body.chars().count() > MAX_LINE_LENGTH
}

/// Leading space run of 1..=3 followed by a non-space, or 5 and more.
///
/// Takes the body before trimming; only spaces count toward the run.
pub fn has_inconsistent_indentation(raw: &str) -> bool {
  let run = raw.bytes().take_while(|b| *b == b' ').count();
  let followed_by_text = raw.len() > run;
  match run {
    0 => false,
    r if r < INDENT_WIDTH => followed_by_text,
    r => r > INDENT_WIDTH,
  }
}

pub fn has_excessive_nesting(body: &str) -> bool {
  ['(', '{']
    .iter()
    .any(|bracket| body.chars().filter(|c| c == bracket).count() >= NESTING_REPEAT)
}

/// Generic identifiers on a line that declares a primitive-typed variable.
pub fn generic_names(body: &str) -> Vec<&str> {
  if !declaration().is_match(body) {
    return Vec::new();
  }
  generic_name().find_iter(body).map(|m| m.as_str()).collect()
}
