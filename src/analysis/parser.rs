//! Tree-sitter parser adapter for Go.
//!
//! A successful parse always yields a tree free of `ERROR` and `MISSING`
//! nodes; anything else is reported as [`AnalysisError::Syntax`] and no tree is
//! returned.

use once_cell::sync::OnceCell;
use tree_sitter::{Language, Node, Parser, Query};

use super::error::{AnalysisError, AnalysisResultOf};
use super::metrics::CONTROL_FLOW_QUERY;
use super::{Position, Range};

/// Top-level node kinds allowed in a Go source file.
const TOP_LEVEL_KINDS: &[&str] = &[
    "package_clause",
    "import_declaration",
    "function_declaration",
    "method_declaration",
    "type_declaration",
    "const_declaration",
    "var_declaration",
    "comment",
];

/// Longest snippet of offending text quoted in a syntax error.
const MAX_SNIPPET: usize = 32;

static SHARED: OnceCell<GoParser> = OnceCell::new();

/// Holds a parsed tree-sitter tree and the text it was parsed from.
///
/// This is kept separate from the extracted facts so one tree can serve every
/// analysis pass without re-parsing.
#[derive(Debug)]
pub struct ParsedFile {
    /// The tree-sitter parse tree.
    pub tree: tree_sitter::Tree,
    /// The original source code (kept for node text extraction).
    pub source: String,
}

impl ParsedFile {
    /// Get text for a tree-sitter node.
    pub fn node_text(&self, node: Node) -> &str {
        node.utf8_text(self.source.as_bytes()).unwrap_or("")
    }

    /// The root `source_file` node.
    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }
}

/// Go parser: the grammar plus queries compiled once.
///
/// `tree_sitter::Parser` is not `Sync`, so a fresh parser is created for each
/// call while the language and queries are shared.
pub struct GoParser {
    language: Language,
    control_flow: Query,
}

impl GoParser {
    /// Load the grammar and compile the queries.
    pub fn new() -> AnalysisResultOf<Self> {
        let language: Language = tree_sitter_go::LANGUAGE.into();
        let control_flow = Query::new(&language, CONTROL_FLOW_QUERY)
            .map_err(|e| AnalysisError::Language(format!("control flow query: {}", e)))?;
        Ok(Self {
            language,
            control_flow,
        })
    }

    /// Process-wide parser instance.
    pub fn shared() -> AnalysisResultOf<&'static GoParser> {
        SHARED.get_or_try_init(GoParser::new)
    }

    /// Query capturing the decision points counted by cyclomatic complexity.
    pub fn control_flow_query(&self) -> &Query {
        &self.control_flow
    }

    /// Create a new parser for this call.
    fn create_parser(&self) -> AnalysisResultOf<Parser> {
        let mut parser = Parser::new();
        parser
            .set_language(&self.language)
            .map_err(|e| AnalysisError::Language(e.to_string()))?;
        Ok(parser)
    }

    /// Parse Go source text.
    pub fn parse(&self, text: &str) -> AnalysisResultOf<ParsedFile> {
        let mut parser = self.create_parser()?;
        let tree = parser.parse(text, None).ok_or_else(|| {
            AnalysisError::syntax(Range::default(), "parser produced no tree")
        })?;

        let parsed = ParsedFile {
            tree,
            source: text.to_string(),
        };
        check_syntax(&parsed)?;

        tracing::trace!(bytes = text.len(), "parsed go source");
        Ok(parsed)
    }
}

/// Reject trees that contain errors or are not shaped like a Go file.
fn check_syntax(parsed: &ParsedFile) -> AnalysisResultOf<()> {
    let root = parsed.root();

    if let Some(node) = first_error(root) {
        let message = if node.is_missing() {
            format!("missing {}", node.kind())
        } else {
            let text = parsed.node_text(node);
            let snippet = text.lines().next().unwrap_or("").trim();
            if snippet.is_empty() {
                "unexpected end of input".to_string()
            } else {
                let snippet: String = snippet.chars().take(MAX_SNIPPET).collect();
                format!("unexpected `{}`", snippet)
            }
        };
        return Err(AnalysisError::syntax(Range::from_node(node), message));
    }

    let mut cursor = root.walk();
    let mut seen_package = false;
    for child in root.named_children(&mut cursor) {
        let kind = child.kind();
        if kind == "comment" {
            continue;
        }
        if !seen_package {
            if kind != "package_clause" {
                return Err(AnalysisError::syntax(
                    Range::from_node(child),
                    "expected 'package' clause",
                ));
            }
            seen_package = true;
            continue;
        }
        if !TOP_LEVEL_KINDS.contains(&kind) || kind == "package_clause" {
            return Err(AnalysisError::syntax(
                Range::from_node(child),
                "non-declaration statement outside function body",
            ));
        }
    }

    if !seen_package {
        let origin = Position::default();
        return Err(AnalysisError::syntax(
            Range::new(origin, origin),
            "expected 'package' clause",
        ));
    }

    Ok(())
}

/// First `ERROR` or `MISSING` node in pre-order.
fn first_error(root: Node) -> Option<Node> {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_error() || node.is_missing() {
            return Some(node);
        }
        if !node.has_error() {
            continue;
        }
        let mut cursor = node.walk();
        let children: Vec<Node> = node.children(&mut cursor).collect();
        stack.extend(children.into_iter().rev());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> AnalysisResultOf<ParsedFile> {
        GoParser::shared().unwrap().parse(text)
    }

    #[test]
    fn test_parse_valid_file() {
        let parsed = parse("package main\n\nfunc main() {}\n").unwrap();
        assert_eq!(parsed.root().kind(), "source_file");
        assert!(!parsed.root().has_error());
    }

    #[test]
    fn test_parse_reports_error_location() {
        let err = parse("package main\n\nfunc main() {\n\tx := \n}\n").unwrap_err();
        match err {
            AnalysisError::Syntax { range, .. } => {
                assert!(range.start.line >= 2, "error should be inside main: {:?}", range);
            }
            other => panic!("expected syntax error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_requires_package_clause() {
        let err = parse("func main() {}\n").unwrap_err();
        assert!(err.is_syntax());
        assert!(err.to_string().contains("package"));

        let err = parse("").unwrap_err();
        assert!(err.to_string().contains("package"));
    }

    #[test]
    fn test_parse_rejects_top_level_statement() {
        let err = parse("package main\n\nx := 1\n").unwrap_err();
        assert!(err.is_syntax());
    }

    #[test]
    fn test_parse_is_deterministic() {
        let text = "package main\n\nimport \"fmt\"\n\nfunc main() { fmt.Println(1) }\n";
        let a = parse(text).unwrap();
        let b = parse(text).unwrap();
        assert_eq!(a.root().to_sexp(), b.root().to_sexp());
    }
}
