//! Fact structures extracted from Go source.
//!
//! Every record here is produced fresh by one analysis pass and never mutated
//! afterwards. An [`AnalysisResult`] bundles all of them for one parse.

use std::fmt;
use std::iter::Sum;
use std::ops::AddAssign;

use serde::{Deserialize, Serialize};

use crate::diagnostics::Diagnostic;

/// A zero-based position in a document.
///
/// `character` is a byte column, matching tree-sitter points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub line: usize,
    pub character: usize,
}

impl Position {
    pub fn new(line: usize, character: usize) -> Self {
        Self { line, character }
    }
}

impl From<tree_sitter::Point> for Position {
    fn from(point: tree_sitter::Point) -> Self {
        Self {
            line: point.row,
            character: point.column,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Human-facing output is 1-indexed.
        write!(f, "{}:{}", self.line + 1, self.character + 1)
    }
}

/// A text range; `start` is always at or before `end`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    /// Create a range, swapping the endpoints if they arrive reversed.
    pub fn new(start: Position, end: Position) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self {
                start: end,
                end: start,
            }
        }
    }

    /// Create a range covering a tree-sitter node.
    pub fn from_node(node: tree_sitter::Node) -> Self {
        Self::new(node.start_position().into(), node.end_position().into())
    }

    /// Whether `pos` lies inside this range (end inclusive).
    pub fn contains(&self, pos: Position) -> bool {
        self.start <= pos && pos <= self.end
    }

    /// Whether `other` lies entirely inside this range.
    pub fn encloses(&self, other: &Range) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.start)
    }
}

/// Kind of an indexed symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    Function,
    Type,
    Variable,
    Constant,
    Package,
}

impl SymbolKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolKind::Function => "function",
            SymbolKind::Type => "type",
            SymbolKind::Variable => "variable",
            SymbolKind::Constant => "constant",
            SymbolKind::Package => "package",
        }
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A named, located program entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    pub range: Range,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
    /// Receiver type for methods.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container: Option<String>,
}

/// An import declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportInfo {
    /// The import path, unquoted.
    pub path: String,
    /// Local alias (e.g., `import log "github.com/sirupsen/logrus"` -> "log").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    /// Whether any qualified access in the file binds to this import.
    pub used: bool,
    pub range: Range,
}

/// A function parameter or result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub variadic: bool,
}

impl ParameterInfo {
    /// Render as it appears in a signature (`name ...T`, `T`).
    pub fn render(&self) -> String {
        let ty = if self.variadic {
            format!("...{}", self.type_name)
        } else {
            self.type_name.clone()
        };
        match &self.name {
            Some(name) => format!("{} {}", name, ty),
            None => ty,
        }
    }
}

/// A function or method declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionInfo {
    pub name: String,
    pub signature: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
    /// Range of the whole declaration.
    pub range: Range,
    /// Range of the name identifier.
    pub name_range: Range,
    /// Cyclomatic complexity, always >= 1.
    pub complexity: u32,
    pub is_method: bool,
    /// For methods: the receiver type (e.g., "*Config" for `func (c *Config) Validate()`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiver: Option<String>,
    pub exported: bool,
    pub parameters: Vec<ParameterInfo>,
    pub returns: Vec<ParameterInfo>,
}

impl FunctionInfo {
    /// Receiver type name without pointer or type arguments.
    pub fn receiver_base(&self) -> Option<&str> {
        self.receiver.as_deref().map(|r| {
            let r = r.trim_start_matches('*');
            r.split('[').next().unwrap_or(r)
        })
    }

    /// Get the qualified name (Receiver.name for methods).
    pub fn qualified_name(&self) -> String {
        match self.receiver_base() {
            Some(recv) => format!("{}.{}", recv, self.name),
            None => self.name.clone(),
        }
    }
}

/// A struct field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
    /// Raw tag literal including its quotes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    pub embedded: bool,
}

/// An interface method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodInfo {
    pub name: String,
    pub signature: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
    pub parameters: Vec<ParameterInfo>,
    pub returns: Vec<ParameterInfo>,
}

/// Kind-specific payload of a type declaration, classified by body shape.
///
/// `alias` marks `type A = ...` declarations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TypeDetail {
    Struct {
        fields: Vec<FieldInfo>,
        #[serde(default)]
        alias: bool,
    },
    Interface {
        methods: Vec<MethodInfo>,
        /// Embedded interfaces and type-set elements.
        embedded: Vec<String>,
        #[serde(default)]
        alias: bool,
    },
    Other {
        underlying: String,
        alias: bool,
    },
}

impl TypeDetail {
    pub fn kind_str(&self) -> &'static str {
        match self {
            TypeDetail::Struct { .. } => "struct",
            TypeDetail::Interface { .. } => "interface",
            TypeDetail::Other { .. } => "other",
        }
    }
}

/// A type declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeInfo {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
    pub range: Range,
    #[serde(flatten)]
    pub detail: TypeDetail,
}

/// Where a variable was declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableScope {
    Package,
    Local,
}

/// A `var` or `const` declaration (one record per declared name).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableInfo {
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    pub range: Range,
    pub constant: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
    pub scope: VariableScope,
}

/// Kind of a referenced definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceKind {
    Function,
    Variable,
    Constant,
    Type,
    Package,
    Other,
}

impl ReferenceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReferenceKind::Function => "function",
            ReferenceKind::Variable => "variable",
            ReferenceKind::Constant => "constant",
            ReferenceKind::Type => "type",
            ReferenceKind::Package => "package",
            ReferenceKind::Other => "other",
        }
    }
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A definition paired with all of its uses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub name: String,
    pub kind: ReferenceKind,
    pub definition: Range,
    /// Usage sites in traversal order.
    pub usages: Vec<Range>,
}

/// Aggregate counters for one file (or a sum over files).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeMetrics {
    pub lines_of_code: usize,
    pub comment_lines: usize,
    pub function_count: usize,
    pub struct_count: usize,
    pub interface_count: usize,
    pub test_count: usize,
    /// Sum of all function complexities.
    pub complexity_score: u64,
}

impl AddAssign for CodeMetrics {
    fn add_assign(&mut self, other: Self) {
        self.lines_of_code += other.lines_of_code;
        self.comment_lines += other.comment_lines;
        self.function_count += other.function_count;
        self.struct_count += other.struct_count;
        self.interface_count += other.interface_count;
        self.test_count += other.test_count;
        self.complexity_score += other.complexity_score;
    }
}

impl Sum for CodeMetrics {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(CodeMetrics::default(), |mut acc, m| {
            acc += m;
            acc
        })
    }
}

/// The complete, immutable output of analyzing one source text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    /// Package name from the `package` clause.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,
    pub imports: Vec<ImportInfo>,
    pub functions: Vec<FunctionInfo>,
    pub types: Vec<TypeInfo>,
    pub variables: Vec<VariableInfo>,
    pub references: Vec<Reference>,
    pub diagnostics: Vec<Diagnostic>,
    pub metrics: CodeMetrics,
}

impl AnalysisResult {
    /// Flatten functions, types and variables into symbols, in source order.
    pub fn symbols(&self) -> Vec<Symbol> {
        let functions = self.functions.iter().map(|f| Symbol {
            name: f.name.clone(),
            kind: SymbolKind::Function,
            range: f.range,
            signature: Some(f.signature.clone()),
            documentation: f.documentation.clone(),
            container: f.receiver_base().map(str::to_string),
        });
        let types = self.types.iter().map(|t| Symbol {
            name: t.name.clone(),
            kind: SymbolKind::Type,
            range: t.range,
            signature: None,
            documentation: t.documentation.clone(),
            container: None,
        });
        let variables = self.variables.iter().map(|v| Symbol {
            name: v.name.clone(),
            kind: if v.constant {
                SymbolKind::Constant
            } else {
                SymbolKind::Variable
            },
            range: v.range,
            signature: v.type_name.clone(),
            documentation: v.documentation.clone(),
            container: None,
        });

        let mut symbols: Vec<Symbol> = functions.chain(types).chain(variables).collect();
        // Stable: ties keep function, type, variable order.
        symbols.sort_by_key(|s| s.range.start);
        symbols
    }

    /// Find a function by name.
    pub fn find_function(&self, name: &str) -> Option<&FunctionInfo> {
        self.functions.iter().find(|f| f.name == name)
    }

    /// Find a type by name.
    pub fn find_type(&self, name: &str) -> Option<&TypeInfo> {
        self.types.iter().find(|t| t.name == name)
    }

    /// All references with the given name (one per distinct definition).
    pub fn references_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Reference> {
        self.references.iter().filter(move |r| r.name == name)
    }

    /// Diagnostics carrying the given rule code.
    pub fn diagnostics_with_code<'a>(
        &'a self,
        code: &'a str,
    ) -> impl Iterator<Item = &'a Diagnostic> {
        self.diagnostics.iter().filter(move |d| d.code == code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(sl: usize, sc: usize, el: usize, ec: usize) -> Range {
        Range::new(Position::new(sl, sc), Position::new(el, ec))
    }

    #[test]
    fn test_range_normalizes_order() {
        let r = range(4, 2, 1, 0);
        assert_eq!(r.start, Position::new(1, 0));
        assert_eq!(r.end, Position::new(4, 2));
    }

    #[test]
    fn test_range_contains() {
        let r = range(1, 4, 3, 1);
        assert!(r.contains(Position::new(1, 4)));
        assert!(r.contains(Position::new(2, 0)));
        assert!(r.contains(Position::new(3, 1)));
        assert!(!r.contains(Position::new(3, 2)));
        assert!(!r.contains(Position::new(0, 9)));
    }

    #[test]
    fn test_metrics_sum() {
        let a = CodeMetrics {
            lines_of_code: 10,
            comment_lines: 2,
            function_count: 3,
            struct_count: 1,
            interface_count: 0,
            test_count: 1,
            complexity_score: 5,
        };
        let b = CodeMetrics {
            lines_of_code: 4,
            function_count: 1,
            interface_count: 2,
            complexity_score: 1,
            ..Default::default()
        };

        let total: CodeMetrics = vec![a, b].into_iter().sum();
        assert_eq!(total.lines_of_code, 14);
        assert_eq!(total.comment_lines, 2);
        assert_eq!(total.function_count, 4);
        assert_eq!(total.struct_count, 1);
        assert_eq!(total.interface_count, 2);
        assert_eq!(total.test_count, 1);
        assert_eq!(total.complexity_score, 6);
    }

    #[test]
    fn test_function_qualified_name() {
        let method = FunctionInfo {
            name: "Validate".to_string(),
            signature: "func (*Config) Validate() error".to_string(),
            documentation: None,
            range: range(0, 0, 2, 1),
            name_range: range(0, 17, 0, 25),
            complexity: 1,
            is_method: true,
            receiver: Some("*Config".to_string()),
            exported: true,
            parameters: Vec::new(),
            returns: Vec::new(),
        };
        assert_eq!(method.receiver_base(), Some("Config"));
        assert_eq!(method.qualified_name(), "Config.Validate");
    }

    #[test]
    fn test_type_detail_serializes_with_kind_tag() {
        let info = TypeInfo {
            name: "Service".to_string(),
            documentation: None,
            range: range(0, 0, 2, 1),
            detail: TypeDetail::Interface {
                methods: Vec::new(),
                embedded: vec!["io.Closer".to_string()],
                alias: false,
            },
        };
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["kind"], "interface");
        assert_eq!(json["embedded"][0], "io.Closer");
    }
}
