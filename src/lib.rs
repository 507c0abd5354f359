//! gosight - Go source analysis and symbol indexing.
//!
//! gosight turns Go source text into a structured fact base (imports,
//! declarations, cross-references, complexity metrics and diagnostics) and
//! keeps that fact base current as documents are opened, edited and closed.
//!
//! # Architecture
//!
//! The codebase uses tree-sitter for AST-based analysis:
//!
//! - `analysis`: Parsing, scope binding, symbol extraction, metrics
//! - `diagnostics`: Rule engine and built-in rules
//! - `session`: Open-document store
//! - `config`: YAML configuration schema
//! - `report`: Output formatting (pretty, JSON)
//! - `cli`: Command-line interface
//!
//! # Example
//!
//! ```no_run
//! use gosight::Analyzer;
//!
//! let analyzer = Analyzer::new()?;
//! let result = analyzer.analyze_source("package main\n\nfunc main() {}\n")?;
//! assert_eq!(result.functions.len(), 1);
//! # Ok::<(), gosight::AnalysisError>(())
//! ```

pub mod analysis;
pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod report;
pub mod session;

pub use analysis::{
    dependencies, AnalysisError, AnalysisResult, Analyzer, CodeMetrics, FunctionInfo, ImportInfo,
    PackageAnalysis, Position, Range, Reference, Symbol, SymbolKind, TypeInfo, VariableInfo,
};
pub use config::Config;
pub use diagnostics::{Diagnostic, DiagnosticsEngine, Rule, Severity};
pub use session::{DocumentStore, SessionError};
