//! Cyclomatic complexity and per-file code metrics.
//!
//! Cyclomatic complexity is calculated as:
//! - Start at 1
//! - Add 1 for each: if, for (including range loops), case arm, &&, ||
//!
//! Every arm of a switch, type switch or select counts, `default` included.

use streaming_iterator::StreamingIterator;
use tree_sitter::{Node, QueryCursor};

use super::parser::{GoParser, ParsedFile};
use super::{CodeMetrics, FunctionInfo};

/// Tree-sitter query for control flow nodes (complexity calculation).
pub(crate) const CONTROL_FLOW_QUERY: &str = r#"
(if_statement) @if
(for_statement) @for
(expression_case) @case
(type_case) @case
(communication_case) @case
(default_case) @case
(binary_expression operator: "&&") @and
(binary_expression operator: "||") @or
"#;

/// Decision points found in one function.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControlFlowInfo {
    /// Number of if statements.
    pub if_count: u32,
    /// Number of for statements (three-clause, condition-only and range).
    pub loop_count: u32,
    /// Number of case clauses, including `default` (switch, type switch, select).
    pub case_count: u32,
    /// Number of && operators.
    pub and_count: u32,
    /// Number of || operators.
    pub or_count: u32,
}

impl ControlFlowInfo {
    /// CC = 1 + decision_points
    pub fn cyclomatic_complexity(&self) -> u32 {
        1 + self.if_count + self.loop_count + self.case_count + self.and_count + self.or_count
    }
}

/// Count the decision points inside `node` (a function or method declaration).
///
/// Function literals nested in the body are part of the subtree and count
/// toward the enclosing declaration.
pub fn control_flow(parser: &GoParser, parsed: &ParsedFile, node: Node) -> ControlFlowInfo {
    let query = parser.control_flow_query();
    let mut cursor = QueryCursor::new();
    let mut matches = cursor.matches(query, node, parsed.source.as_bytes());

    let mut info = ControlFlowInfo::default();
    while let Some(m) = matches.next() {
        for capture in m.captures {
            match query.capture_names()[capture.index as usize] {
                "if" => info.if_count += 1,
                "for" => info.loop_count += 1,
                "case" => info.case_count += 1,
                "and" => info.and_count += 1,
                "or" => info.or_count += 1,
                _ => {}
            }
        }
    }
    info
}

/// Cyclomatic complexity of one function or method declaration.
pub fn function_complexity(parser: &GoParser, parsed: &ParsedFile, node: Node) -> u32 {
    control_flow(parser, parsed, node).cyclomatic_complexity()
}

/// Compute file metrics in one walk over the tree.
///
/// `functions` supplies the already computed complexities; the complexity
/// score is their sum.
pub fn compute_metrics(parsed: &ParsedFile, functions: &[FunctionInfo]) -> CodeMetrics {
    let mut metrics = CodeMetrics {
        lines_of_code: parsed.source.lines().count(),
        complexity_score: functions.iter().map(|f| u64::from(f.complexity)).sum(),
        ..Default::default()
    };

    let mut cursor = parsed.root().walk();
    loop {
        let node = cursor.node();
        match node.kind() {
            "function_declaration" | "method_declaration" => {
                metrics.function_count += 1;
                let is_test = node
                    .child_by_field_name("name")
                    .map(|n| parsed.node_text(n).starts_with("Test"))
                    .unwrap_or(false);
                if is_test {
                    metrics.test_count += 1;
                }
            }
            "type_spec" | "type_alias" => match node.child_by_field_name("type").map(|t| t.kind()) {
                Some("struct_type") => metrics.struct_count += 1,
                Some("interface_type") => metrics.interface_count += 1,
                _ => {}
            },
            "comment" => {
                let span = node.end_position().row - node.start_position().row;
                metrics.comment_lines += span + 1;
            }
            _ => {}
        }

        // Pre-order: descend, else advance to the next sibling of the nearest ancestor.
        if cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return metrics;
            }
        }
    }
}
