//! Function extraction for non-Python sources using tree-sitter grammars.
//!
//! The body is a fragment, so the tree usually contains error nodes around its
//! edges. Those are tolerated: every function node whose own subtree parsed
//! cleanly is measured, the rest are skipped.

use std::path::Path;

use tree_sitter::{Language, Node, Parser};

use super::FunctionMetrics;
use crate::error::MetricsError;

/// Grammars available to the generic path, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grammar {
  C,
  Cpp,
  CSharp,
  Go,
  Java,
  JavaScript,
  Rust,
  TypeScript,
  Tsx,
}

impl Grammar {
  pub fn for_filename(filename: &str) -> Option<Self> {
    let ext = Path::new(filename)
      .extension()
      .and_then(|e| e.to_str())?
      .to_ascii_lowercase();
    let grammar = match ext.as_str() {
      "c" | "h" => Self::C,
      "cc" | "cpp" | "cxx" | "hpp" | "hh" | "hxx" => Self::Cpp,
      "cs" => Self::CSharp,
      "go" => Self::Go,
      "java" => Self::Java,
      "js" | "jsx" | "mjs" | "cjs" => Self::JavaScript,
      "rs" => Self::Rust,
      "ts" | "mts" | "cts" => Self::TypeScript,
      "tsx" => Self::Tsx,
      _ => return None,
    };
    Some(grammar)
  }

  fn language(self) -> Language {
    match self {
      Self::C => tree_sitter_c::LANGUAGE.into(),
      Self::Cpp => tree_sitter_cpp::LANGUAGE.into(),
      Self::CSharp => tree_sitter_c_sharp::LANGUAGE.into(),
      Self::Go => tree_sitter_go::LANGUAGE.into(),
      Self::Java => tree_sitter_java::LANGUAGE.into(),
      Self::JavaScript => tree_sitter_javascript::LANGUAGE.into(),
      Self::Rust => tree_sitter_rust::LANGUAGE.into(),
      Self::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
      Self::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
    }
  }
}

/// Functions found in `source`, ordered by start line.
pub fn extract_functions(
  grammar: Grammar,
  source: &str,
) -> Result<Vec<FunctionMetrics>, MetricsError> {
  let mut parser = Parser::new();
  parser
    .set_language(&grammar.language())
    .map_err(|e| MetricsError::Language(e.to_string()))?;
  let tree = parser
    .parse(source, None)
    .ok_or_else(|| MetricsError::Language("parser produced no tree".to_string()))?;

  let mut found = Vec::new();
  collect_functions(tree.root_node(), source.as_bytes(), None, &mut found);
  found.sort_by_key(|f| f.start_line);
  Ok(found)
}

fn node_text(node: Node, source: &[u8]) -> String {
  node.utf8_text(source).unwrap_or("").to_string()
}

fn collect_functions(
  node: Node,
  source: &[u8],
  container: Option<&str>,
  out: &mut Vec<FunctionMetrics>,
) {
  let mut cursor = node.walk();
  for child in node.children(&mut cursor) {
    if let Some(name) = function_name(child, source) {
      if !child.has_error() {
        let qualified = match container {
          Some(owner) => format!("{}.{}", owner, name),
          None => name,
        };
        out.push(FunctionMetrics {
          name: qualified,
          start_line: (child.start_position().row + 1) as u32,
          end_line: (child.end_position().row + 1) as u32,
          complexity: 1 + count_branches(child, source),
        });
      }
      collect_functions(child, source, None, out);
    } else if let Some(owner) = container_name(child, source) {
      collect_functions(child, source, Some(owner.as_str()), out);
    } else {
      collect_functions(child, source, container, out);
    }
  }
}

/// Name of a function-like node, or `None` when `node` does not define a
/// named function. Anonymous closures fold into their enclosing function.
fn function_name(node: Node, source: &[u8]) -> Option<String> {
  match node.kind() {
    // C and C++: the name sits under one or more declarators.
    "function_definition" => declarator_name(node.child_by_field_name("declarator")?, source),
    "function_item"
    | "function_declaration"
    | "generator_function_declaration"
    | "method_declaration"
    | "constructor_declaration"
    | "local_function_statement"
    | "method_definition" => node.child_by_field_name("name").map(|n| node_text(n, source)),
    "arrow_function" | "function_expression" | "function" => node
      .child_by_field_name("name")
      .map(|n| node_text(n, source))
      .or_else(|| binding_name(node, source)),
    _ => None,
  }
}

fn declarator_name(mut declarator: Node, source: &[u8]) -> Option<String> {
  for _ in 0..8 {
    if declarator.kind() == "function_declarator" {
      return declarator
        .child_by_field_name("declarator")
        .map(|n| node_text(n, source));
    }
    declarator = match declarator.child_by_field_name("declarator") {
      Some(inner) => inner,
      None => {
        let mut cursor = declarator.walk();
        let inner = declarator.named_children(&mut cursor).next()?;
        inner
      }
    };
  }
  None
}

/// `const f = () => ...`, `{ f: function () {} }` and `obj.f = function () {}`.
fn binding_name(node: Node, source: &[u8]) -> Option<String> {
  let parent = node.parent()?;
  let field = match parent.kind() {
    "variable_declarator" => "name",
    "pair" => "key",
    "assignment_expression" => "left",
    _ => return None,
  };
  parent.child_by_field_name(field).map(|n| node_text(n, source))
}

fn container_name(node: Node, source: &[u8]) -> Option<String> {
  let field = match node.kind() {
    "impl_item" => "type",
    "class_declaration" | "interface_declaration" | "enum_declaration" | "record_declaration"
    | "struct_declaration" | "class_specifier" | "struct_specifier" | "trait_item" => "name",
    _ => return None,
  };
  node.child_by_field_name(field).map(|n| node_text(n, source))
}

/// Decision points under `node`, not descending into nested named functions.
fn count_branches(node: Node, source: &[u8]) -> u32 {
  let mut total = 0;
  let mut cursor = node.walk();
  for child in node.children(&mut cursor) {
    if function_name(child, source).is_some() {
      continue;
    }
    total += branch_weight(child) + count_branches(child, source);
  }
  total
}

fn branch_weight(node: Node) -> u32 {
  match node.kind() {
    "if_statement" | "if_expression" | "for_statement" | "for_range_loop"
    | "enhanced_for_statement" | "foreach_statement" | "for_in_statement" | "for_expression"
    | "while_statement" | "while_expression" | "do_statement" | "case_statement"
    | "switch_case" | "switch_section" | "switch_block_statement_group" | "switch_rule"
    | "expression_case" | "type_case" | "communication_case" | "match_arm" | "catch_clause"
    | "conditional_expression" | "ternary_expression" | "try_expression" => 1,
    "binary_expression" => {
      let mut cursor = node.walk();
      let logical = node
        .children(&mut cursor)
        .filter(|c| matches!(c.kind(), "&&" | "||" | "??"))
        .count();
      logical as u32
    }
    _ => 0,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use indoc::indoc;

  fn functions(grammar: Grammar, src: &str) -> Vec<FunctionMetrics> {
    extract_functions(grammar, src).unwrap()
  }

  #[test]
  fn grammar_by_extension() {
    assert_eq!(Grammar::for_filename("src/util.c"), Some(Grammar::C));
    assert_eq!(Grammar::for_filename("Widget.HPP"), Some(Grammar::Cpp));
    assert_eq!(Grammar::for_filename("web/app.tsx"), Some(Grammar::Tsx));
    assert_eq!(Grammar::for_filename("lib.rs"), Some(Grammar::Rust));
    assert_eq!(Grammar::for_filename("README.md"), None);
    assert_eq!(Grammar::for_filename("Makefile"), None);
  }

  #[test]
  fn c_function_with_branches() {
    let src = indoc! {"
      static int pick(int a, int b) {
          if (a > b && b > 0) {
              return a;
          }
          for (int i = 0; i < b; i++) {
              a += i;
          }
          return a > 0 ? a : b;
      }
    "};
    let found = functions(Grammar::C, src);
    assert_eq!(found.len(), 1);
    let f = &found[0];
    assert_eq!(f.name, "pick");
    assert_eq!((f.start_line, f.end_line), (1, 9));
    // 1 + if + && + for + ?
    assert_eq!(f.complexity, 5);
  }

  #[test]
  fn pointer_and_qualified_declarators() {
    let c = functions(Grammar::C, "char *dup(const char *s) {\n    return s ? copy(s) : 0;\n}\n");
    assert_eq!(c[0].name, "dup");
    assert_eq!(c[0].complexity, 2);

    let src = indoc! {"
      int Widget::render(int x) {
          return x;
      }

      std::vector<int> collect(int n) {
          std::vector<int> out;
          return out;
      }
    "};
    let names: Vec<String> = functions(Grammar::Cpp, src).into_iter().map(|f| f.name).collect();
    assert_eq!(names, vec!["Widget::render", "collect"]);
  }

  #[test]
  fn methods_are_qualified_by_their_type() {
    let src = indoc! {"
      class Registry {
          public List<String> names(int limit) {
              if (limit > 0) {
                  return items;
              }
              return null;
          }
      }
    "};
    let found = functions(Grammar::Java, src);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name, "Registry.names");
    assert_eq!(found[0].complexity, 2);
  }

  #[test]
  fn rust_and_go_signatures() {
    let rust = indoc! {"
      fn parse<T>(input: &str) -> Result<T, Error> {
          match input.len() {
              0 => Err(Error::Empty),
              _ => Ok(value(input)?),
          }
      }
    "};
    let found = functions(Grammar::Rust, rust);
    assert_eq!(found[0].name, "parse");
    // 1 + two arms + `?`
    assert_eq!(found[0].complexity, 4);

    let go = indoc! {r#"
      func (s *Server) Start(addr string) (int, error) {
          if addr == "" {
              return 0, nil
          }
          return 1, nil
      }
    "#};
    let found = functions(Grammar::Go, go);
    assert_eq!(found[0].name, "Start");
    assert_eq!(found[0].complexity, 2);
  }

  #[test]
  fn nested_functions_count_separately() {
    let src = indoc! {"
      function outer(a) {
          function inner(b) {
              if (b) { return 1; }
              return 0;
          }
          if (a || !a) { return inner(a); }
      }
    "};
    let found = functions(Grammar::JavaScript, src);
    assert_eq!(found.len(), 2);
    assert_eq!(found[0].name, "outer");
    assert_eq!(found[0].complexity, 3);
    assert_eq!(found[1].name, "inner");
    assert_eq!(found[1].complexity, 2);
  }

  #[test]
  fn bound_arrow_functions_take_their_binding_name() {
    let found = functions(Grammar::TypeScript, "const pick = (a: number) => a > 0 ? a : 0;\n");
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name, "pick");
    assert_eq!(found[0].complexity, 2);
  }

  #[test]
  fn strings_and_comments_do_not_count() {
    let src = indoc! {r#"
      void log_it(void) {
          // if this && that
          /* while (1) { } */
          puts("if (a || b) { case }");
      }
    "#};
    let found = functions(Grammar::C, src);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].complexity, 1);
  }

  #[test]
  fn complete_functions_survive_a_broken_fragment() {
    let src = indoc! {"
          return total;
      }

      int twice(int x) {
          return x * 2;
      }
    "};
    let found = functions(Grammar::C, src);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name, "twice");
    assert_eq!(found[0].start_line, 4);
  }

  #[test]
  fn unterminated_body_is_dropped() {
    assert!(functions(Grammar::C, "int half(int x) {\n  if (x) {\n").is_empty());
  }
}
