//! Diagnostics: independent rules run over one file's facts.
//!
//! Rules are registered with [`DiagnosticsEngine::builder`] and run in
//! registration order. A rule that fails or panics is logged and skipped; the
//! other rules still report.

mod engine;
pub mod rules;
mod types;

pub use engine::{DiagnosticsEngine, DiagnosticsEngineBuilder, Rule, RuleContext};
pub use rules::{MissingDocumentationRule, UnusedImportRule, MISSING_DOC, UNUSED_IMPORT};
pub use types::{Diagnostic, Severity, DEFAULT_SOURCE};
