//! Built-in diagnostic rules.

use crate::analysis::is_exported;

use super::{Diagnostic, Rule, RuleContext, Severity};

pub const UNUSED_IMPORT: &str = "unused-import";
pub const MISSING_DOC: &str = "missing-doc";

/// Codes of every built-in rule, in default run order.
pub const BUILTIN_CODES: &[&str] = &[UNUSED_IMPORT, MISSING_DOC];

/// Fresh instances of the built-in rules, in default run order.
pub fn builtin_rules() -> Vec<Box<dyn Rule>> {
    vec![Box::new(UnusedImportRule), Box::new(MissingDocumentationRule)]
}

/// Flags imports that no qualified access binds to.
pub struct UnusedImportRule;

impl Rule for UnusedImportRule {
    fn code(&self) -> &'static str {
        UNUSED_IMPORT
    }

    fn default_severity(&self) -> Severity {
        Severity::Warning
    }

    fn check(&self, ctx: &RuleContext<'_>) -> anyhow::Result<Vec<Diagnostic>> {
        Ok(ctx
            .facts
            .imports
            .iter()
            .filter(|import| !import.used)
            .map(|import| {
                Diagnostic::new(
                    self.code(),
                    self.default_severity(),
                    format!("Unused import: {}", import.path),
                    import.range,
                )
            })
            .collect())
    }
}

/// Flags exported functions and methods without a doc comment.
pub struct MissingDocumentationRule;

impl Rule for MissingDocumentationRule {
    fn code(&self) -> &'static str {
        MISSING_DOC
    }

    fn default_severity(&self) -> Severity {
        Severity::Info
    }

    fn check(&self, ctx: &RuleContext<'_>) -> anyhow::Result<Vec<Diagnostic>> {
        Ok(ctx
            .facts
            .functions
            .iter()
            .filter(|f| is_exported(&f.name) && f.documentation.is_none())
            .map(|f| {
                Diagnostic::new(
                    self.code(),
                    self.default_severity(),
                    format!("Exported function {} lacks documentation", f.name),
                    f.name_range,
                )
            })
            .collect())
    }
}
