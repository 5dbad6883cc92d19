//! Complexity and maintainability metrics over the added code of one file.
//!
//! Only added lines are analyzed, joined in order into a synthetic body. That
//! body is a fragment rather than a full file, so backends are expected to
//! reject some of them; a rejection yields no findings for that file.

pub mod generic;
pub mod python;

use tracing::{debug, warn};

use crate::types::{PatchLine, Suggestion, SuggestionCategory};

/// Functions above this cyclomatic complexity are flagged.
pub const COMPLEXITY_THRESHOLD: u32 = 10;
/// Maintainability index scores below this are flagged.
pub const MAINTAINABILITY_THRESHOLD: f64 = 50.0;
/// Functions longer than this many lines are flagged (generic path only).
pub const FUNCTION_LENGTH_THRESHOLD: u32 = 50;

/// Per-function measurements. Lines are 1-based within the synthetic body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionMetrics {
  pub name: String,
  pub start_line: u32,
  pub end_line: u32,
  pub complexity: u32,
}

impl FunctionMetrics {
  pub fn length(&self) -> u32 {
    self.end_line.saturating_sub(self.start_line) + 1
  }
}

/// Maintainability as reported by a backend.
#[derive(Debug, Clone, PartialEq)]
pub enum Maintainability {
  /// One score for the whole body.
  Whole(f64),
  /// Scores keyed by the body line each block starts on. Neither current
  /// backend reports this way; Python scores the whole body.
  PerBlock(Vec<(u32, f64)>),
}

/// Added lines of one file joined into a body, with a map back to new-file lines.
#[derive(Debug, Clone, Default)]
pub struct AddedSource {
  pub text: String,
  line_map: Vec<u32>,
}

impl AddedSource {
  pub fn from_lines(lines: &[PatchLine]) -> Self {
    let added: Vec<&PatchLine> = lines.iter().filter(|l| l.is_addition()).collect();
    Self {
      text: added.iter().map(|l| l.body()).collect::<Vec<_>>().join("\n"),
      line_map: added.iter().map(|l| l.new_line_number.unwrap_or(0)).collect(),
    }
  }

  pub fn is_empty(&self) -> bool {
    self.line_map.is_empty()
  }

  /// New-file line for a 1-based body line; falls back to the body line.
  pub fn new_line(&self, body_line: u32) -> u32 {
    body_line
      .checked_sub(1)
      .and_then(|i| self.line_map.get(i as usize))
      .copied()
      .unwrap_or(body_line)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Backend {
  Python,
  Generic(generic::Grammar),
}

fn backend_for(filename: &str) -> Option<Backend> {
  if filename.ends_with(".py") {
    Some(Backend::Python)
  } else {
    generic::Grammar::for_filename(filename).map(Backend::Generic)
  }
}

/// Analyze the added lines of one file.
pub fn analyze(filename: &str, lines: &[PatchLine]) -> Vec<Suggestion> {
  let Some(backend) = backend_for(filename) else {
    debug!(filename, "no metrics backend for file type");
    return Vec::new();
  };
  let source = AddedSource::from_lines(lines);
  if source.is_empty() {
    return Vec::new();
  }

  let out = match backend {
    Backend::Python => match python::analyze(&source.text) {
      Ok(report) => {
        let mut out = complexity_findings(filename, &source, &report.functions);
        out.extend(maintainability_findings(filename, &source, &report.maintainability));
        out
      }
      Err(e) => {
        warn!(filename, error = %e, "metrics backend rejected fragment");
        Vec::new()
      }
    },
    Backend::Generic(grammar) => match generic::extract_functions(grammar, &source.text) {
      Ok(functions) => {
        let mut out = complexity_findings(filename, &source, &functions);
        out.extend(length_findings(filename, &source, &functions));
        out
      }
      Err(e) => {
        warn!(filename, error = %e, "metrics backend rejected fragment");
        Vec::new()
      }
    },
  };

  debug!(filename, suggestions = out.len(), "metrics analyzed");
  out
}

fn complexity_findings(
  filename: &str,
  source: &AddedSource,
  functions: &[FunctionMetrics],
) -> Vec<Suggestion> {
  functions
    .iter()
    .filter(|f| f.complexity > COMPLEXITY_THRESHOLD)
    .map(|f| {
      Suggestion::new(
        filename,
        source.new_line(f.start_line),
        format!(
          "Function '{}' has high cyclomatic complexity ({}). Consider refactoring.",
          f.name, f.complexity
        ),
        SuggestionCategory::Complexity,
      )
    })
    .collect()
}

fn maintainability_findings(
  filename: &str,
  source: &AddedSource,
  report: &Maintainability,
) -> Vec<Suggestion> {
  let low = |line: u32, score: f64| {
    Suggestion::new(
      filename,
      line,
      format!(
        "Low maintainability score ({:.2}) detected. Consider refactoring.",
        score
      ),
      SuggestionCategory::Maintainability,
    )
  };

  match report {
    Maintainability::Whole(score) if *score < MAINTAINABILITY_THRESHOLD => vec![low(1, *score)],
    Maintainability::Whole(_) => Vec::new(),
    Maintainability::PerBlock(blocks) => blocks
      .iter()
      .filter(|(_, score)| *score < MAINTAINABILITY_THRESHOLD)
      .map(|(line, score)| low(source.new_line(*line), *score))
      .collect(),
  }
}

fn length_findings(
  filename: &str,
  source: &AddedSource,
  functions: &[FunctionMetrics],
) -> Vec<Suggestion> {
  functions
    .iter()
    .filter(|f| f.length() > FUNCTION_LENGTH_THRESHOLD)
    .map(|f| {
      Suggestion::new(
        filename,
        source.new_line(f.start_line),
        format!(
          "Function '{}' is too long ({} lines). Consider modularizing.",
          f.name,
          f.length()
        ),
        SuggestionCategory::Maintainability,
      )
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::diff;

  fn added_patch(start: u32, body: &str) -> String {
    let mut patch = format!("@@ -{start},0 +{start},{} @@\n", body.lines().count());
    for line in body.lines() {
      patch.push('+');
      patch.push_str(line);
      patch.push('\n');
    }
    patch
  }

  fn branchy_c_function() -> String {
    branchy_body("int classify(int x)")
  }

  #[test]
  fn added_source_maps_lines_back() {
    let lines = diff::parse("@@ -1,2 +20,3 @@\n keep\n+a\n-gone\n+b");
    let source = AddedSource::from_lines(&lines);
    assert_eq!(source.text, "a\nb");
    assert_eq!(source.new_line(1), 21);
    assert_eq!(source.new_line(2), 22);
    assert_eq!(source.new_line(9), 9);
  }

  #[test]
  fn generic_complex_function_is_flagged_at_its_new_line() {
    let lines = diff::parse(&added_patch(100, &branchy_c_function()));
    let out = analyze("classify.c", &lines);
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].category, SuggestionCategory::Complexity);
    assert_eq!(out[0].line_number, 100);
    assert!(out[0].text.contains("'classify'"));
    assert!(out[0].text.contains("(12)"));
  }

  fn branchy_body(signature: &str) -> String {
    let mut body = format!("{signature} {{\n");
    for i in 0..11 {
      body.push_str(&format!("    if (x == {i}) return {i};\n"));
    }
    body.push_str("    return 0;\n}\n");
    body
  }

  fn complexity_names(filename: &str, body: &str) -> Vec<(String, u32)> {
    analyze(filename, &diff::parse(&added_patch(1, body)))
      .into_iter()
      .filter(|s| s.category == SuggestionCategory::Complexity)
      .map(|s| (s.text, s.line_number))
      .collect()
  }

  #[test]
  fn complex_functions_found_across_signature_shapes() {
    let pointer = complexity_names("strings.c", &branchy_body("char *pointer_return(int x)"));
    assert_eq!(pointer.len(), 1);
    assert!(pointer[0].0.contains("'pointer_return' has high cyclomatic complexity (12)"));

    let method = complexity_names("widget.cpp", &branchy_body("int Widget::render(int x)"));
    assert_eq!(method.len(), 1);
    assert!(method[0].0.contains("'Widget::render'"));

    let templated = complexity_names(
      "collect.cpp",
      &branchy_body("std::vector<int> collect(int x)"),
    );
    assert_eq!(templated.len(), 1);
    assert!(templated[0].0.contains("'collect'"));

    let java = format!(
      "class Registry {{\n{}}}\n",
      branchy_body("public List<String> names(int x)")
    );
    let generic_return = complexity_names("Registry.java", &java);
    assert_eq!(generic_return.len(), 1);
    assert!(generic_return[0].0.contains("'Registry.names'"));
    assert_eq!(generic_return[0].1, 2);
  }

  #[test]
  fn unknown_file_types_have_no_metrics() {
    let out = analyze("notes.txt", &diff::parse(&added_patch(1, &branchy_c_function())));
    assert!(out.is_empty());
  }

  #[test]
  fn generic_long_function_is_flagged() {
    let mut body = String::from("function build() {\n");
    for i in 0..55 {
      body.push_str(&format!("  step{i}();\n"));
    }
    body.push_str("}\n");
    let out = analyze("build.js", &diff::parse(&added_patch(1, &body)));
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].category, SuggestionCategory::Maintainability);
    assert!(out[0].text.contains("(57 lines)"));
  }

  #[test]
  fn python_fragment_that_does_not_parse_is_silent() {
    let out = analyze("broken.py", &diff::parse("@@ -1,0 +1,2 @@\n+    return x\n+  else:"));
    assert!(out.is_empty());
  }

  #[test]
  fn no_additions_no_findings() {
    assert!(analyze("a.py", &diff::parse("@@ -1,1 +1,0 @@\n-x = 1")).is_empty());
  }

  #[test]
  fn whole_body_maintainability_uses_sentinel_line() {
    let source = AddedSource::default();
    let out = maintainability_findings("a.py", &source, &Maintainability::Whole(42.5));
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].line_number, 1);
    assert!(out[0].text.contains("42.50"));
    assert!(maintainability_findings("a.py", &source, &Maintainability::Whole(50.0)).is_empty());
  }

  #[test]
  fn per_block_maintainability_flags_each_low_block() {
    let lines = diff::parse("@@ -1,0 +10,3 @@\n+a\n+b\n+c");
    let source = AddedSource::from_lines(&lines);
    let report = Maintainability::PerBlock(vec![(1, 20.0), (2, 80.0), (3, 49.9)]);
    let out = maintainability_findings("a.py", &source, &report);
    let lines: Vec<u32> = out.iter().map(|s| s.line_number).collect();
    assert_eq!(lines, vec![10, 12]);
  }
}
