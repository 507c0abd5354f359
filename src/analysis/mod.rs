//! AST-backed analysis of Go source.
//!
//! Turns one source text into an immutable [`AnalysisResult`]: imports,
//! declarations, cross-references, complexity metrics and diagnostics.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────┐   ┌──────────────┐   ┌────────────────┐
//! │ Source text │──▶│ GoParser │──▶│ Scope binder │──▶│ Extract, refs, │
//! └─────────────┘   └──────────┘   │ (Bindings)   │   │ metrics        │
//!                                  └──────────────┘   └────────────────┘
//!                                                             │
//!                                                             ▼
//!                                  ┌──────────────┐   ┌────────────────┐
//!                                  │ Analysis-    │◀──│ Diagnostics    │
//!                                  │ Result       │   │ engine         │
//!                                  └──────────────┘   └────────────────┘
//! ```

mod analyzer;
mod error;
mod extract;
mod facts;
mod metrics;
mod parser;
mod references;
mod scope;

pub use analyzer::{dependencies, Analyzer, FileFailure, PackageAnalysis};
pub use error::{AnalysisError, AnalysisResultOf};
pub use extract::{extract, is_exported, ExtractedFacts};
pub use facts::{
    AnalysisResult, CodeMetrics, FieldInfo, FunctionInfo, ImportInfo, MethodInfo, ParameterInfo,
    Position, Range, Reference, ReferenceKind, Symbol, SymbolKind, TypeDetail, TypeInfo,
    VariableInfo, VariableScope,
};
pub use metrics::{compute_metrics, control_flow, function_complexity, ControlFlowInfo};
pub use parser::{GoParser, ParsedFile};
pub use references::resolve as resolve_references;
pub use scope::{
    default_package_name, Bindings, DefId, Definition, DefinitionKind, Scope, ScopeId, ScopeKind,
    Use,
};
