//! Python metrics backend using tree-sitter.
//!
//! Computes per-function cyclomatic complexity and a whole-body
//! maintainability index. A tree containing syntax errors is rejected instead
//! of measured.

use std::collections::HashSet;

use tree_sitter::{Node, Parser, Tree};

use super::{FunctionMetrics, Maintainability};
use crate::error::MetricsError;

/// Result of measuring one Python body.
#[derive(Debug, Clone)]
pub struct PythonMetrics {
  pub functions: Vec<FunctionMetrics>,
  pub maintainability: Maintainability,
}

pub fn analyze(source: &str) -> Result<PythonMetrics, MetricsError> {
  let tree = parse(source)?;
  let root = tree.root_node();
  let bytes = source.as_bytes();

  let mut functions = Vec::new();
  collect_functions(root, bytes, None, &mut functions);

  let total_complexity =
    functions.iter().map(|f| f.complexity).sum::<u32>() + count_branches(root);
  let volume = halstead_volume(root, bytes);
  let logical_lines = count_logical_lines(root);
  let comments = comment_percentage(root, source);

  Ok(PythonMetrics {
    functions,
    maintainability: Maintainability::Whole(maintainability_index(
      volume,
      total_complexity,
      logical_lines,
      comments,
    )),
  })
}

fn parse(source: &str) -> Result<Tree, MetricsError> {
  let mut parser = Parser::new();
  parser
    .set_language(&tree_sitter_python::LANGUAGE.into())
    .map_err(|e| MetricsError::Language(e.to_string()))?;
  let tree = parser
    .parse(source, None)
    .ok_or_else(|| MetricsError::Language("parser produced no tree".to_string()))?;

  let root = tree.root_node();
  if root.has_error() {
    return Err(MetricsError::Syntax {
      line: first_error_line(root).unwrap_or(1),
    });
  }
  Ok(tree)
}

fn first_error_line(node: Node) -> Option<usize> {
  if node.is_error() || node.is_missing() {
    return Some(node.start_position().row + 1);
  }
  let mut cursor = node.walk();
  let found = node
    .children(&mut cursor)
    .filter(|c| c.has_error())
    .find_map(first_error_line);
  found
}

fn node_text<'a>(node: Node, source: &'a [u8]) -> &'a str {
  node.utf8_text(source).unwrap_or("")
}

/// Walk definitions. Methods are named `Class.method`; nested functions are
/// reported on their own and excluded from their parent's complexity.
fn collect_functions(
  node: Node,
  source: &[u8],
  class_name: Option<&str>,
  out: &mut Vec<FunctionMetrics>,
) {
  let mut cursor = node.walk();
  for child in node.children(&mut cursor) {
    match child.kind() {
      "function_definition" => {
        let name = child
          .child_by_field_name("name")
          .map(|n| node_text(n, source))
          .unwrap_or("<anonymous>");
        let qualified = match class_name {
          Some(class) => format!("{}.{}", class, name),
          None => name.to_string(),
        };
        let body = child.child_by_field_name("body");
        out.push(FunctionMetrics {
          name: qualified,
          start_line: (child.start_position().row + 1) as u32,
          end_line: (child.end_position().row + 1) as u32,
          complexity: 1 + body.map_or(0, count_branches),
        });
        if let Some(body) = body {
          collect_functions(body, source, None, out);
        }
      }
      "class_definition" => {
        let name = child
          .child_by_field_name("name")
          .map(|n| node_text(n, source))
          .unwrap_or("<class>");
        if let Some(body) = child.child_by_field_name("body") {
          collect_functions(body, source, Some(name), out);
        }
      }
      _ => collect_functions(child, source, class_name, out),
    }
  }
}

/// Decision points under `node`, not descending into nested functions.
fn count_branches(node: Node) -> u32 {
  let mut total = 0;
  let mut cursor = node.walk();
  for child in node.children(&mut cursor) {
    if child.kind() == "function_definition" {
      continue;
    }
    total += branch_weight(child) + count_branches(child);
  }
  total
}

fn branch_weight(node: Node) -> u32 {
  match node.kind() {
    "if_statement" | "elif_clause" | "for_statement" | "while_statement" | "except_clause"
    | "except_group_clause" | "with_statement" | "assert_statement" | "conditional_expression"
    | "boolean_operator" | "for_in_clause" | "if_clause" | "case_clause" => 1,
    // `else` only branches on loops and `try`.
    "else_clause" => match node.parent().map(|p| p.kind()) {
      Some("for_statement" | "while_statement" | "try_statement") => 1,
      _ => 0,
    },
    _ => 0,
  }
}

const OPERATOR_NODES: &[&str] = &[
  "binary_operator",
  "boolean_operator",
  "comparison_operator",
  "unary_operator",
  "not_operator",
  "augmented_assignment",
];

/// Halstead volume `N * log2(n)` over operator expressions: unnamed children
/// are operators, named children are operands.
fn halstead_volume(root: Node, source: &[u8]) -> f64 {
  let mut operators: Vec<&str> = Vec::new();
  let mut operands: Vec<&str> = Vec::new();

  let mut stack = vec![root];
  while let Some(node) = stack.pop() {
    let mut cursor = node.walk();
    let children: Vec<Node> = node.children(&mut cursor).collect();
    if OPERATOR_NODES.contains(&node.kind()) {
      for child in &children {
        if child.is_named() {
          operands.push(node_text(*child, source));
        } else {
          operators.push(child.kind());
        }
      }
    }
    stack.extend(children);
  }

  let distinct: HashSet<&str> = operators.iter().chain(operands.iter()).copied().collect();
  let length = (operators.len() + operands.len()) as f64;
  let vocabulary = distinct.len() as f64;
  if vocabulary <= 1.0 {
    return 0.0;
  }
  length * vocabulary.log2()
}

fn count_logical_lines(node: Node) -> u32 {
  let kind = node.kind();
  let own = u32::from(
    node.is_named()
      && (kind.ends_with("_statement")
        || matches!(
          kind,
          "function_definition"
            | "class_definition"
            | "elif_clause"
            | "else_clause"
            | "except_clause"
            | "finally_clause"
        )),
  );
  let mut cursor = node.walk();
  let nested: u32 = node.children(&mut cursor).map(count_logical_lines).sum();
  own + nested
}

/// Comment and docstring lines as a percentage of non-blank lines.
fn comment_percentage(root: Node, source: &str) -> f64 {
  let mut comment_rows: HashSet<usize> = HashSet::new();
  let mut stack = vec![root];
  while let Some(node) = stack.pop() {
    let mut cursor = node.walk();
    let named: Vec<Node> = node.named_children(&mut cursor).collect();
    let is_docstring = node.kind() == "expression_statement"
      && named.len() == 1
      && named[0].kind() == "string";
    if node.kind() == "comment" || is_docstring {
      comment_rows.extend(node.start_position().row..=node.end_position().row);
      continue;
    }
    stack.extend(node.children(&mut cursor));
  }

  let non_blank = source.lines().filter(|l| !l.trim().is_empty()).count();
  if non_blank == 0 {
    return 0.0;
  }
  comment_rows.len() as f64 / non_blank as f64 * 100.0
}

/// Maintainability index on a 0..=100 scale.
///
/// `171 - 5.2 ln(V) - 0.23 G - 16.2 ln(L) + 50 sin(sqrt(2.46 * rad(C)))`,
/// rescaled by 100/171. Empty bodies score 100.
pub fn maintainability_index(volume: f64, complexity: u32, lines: u32, comment_pct: f64) -> f64 {
  if volume <= 0.0 || lines == 0 {
    return 100.0;
  }
  let raw = 171.0 - 5.2 * volume.ln() - 0.23 * f64::from(complexity) - 16.2 * f64::from(lines).ln()
    + 50.0 * (2.46 * comment_pct.to_radians()).sqrt().sin();
  (raw * 100.0 / 171.0).clamp(0.0, 100.0)
}
