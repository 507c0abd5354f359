//! Rule registry and runner.

use std::panic::{self, AssertUnwindSafe};

use crate::analysis::{ExtractedFacts, ParsedFile};
use crate::config::Config;

use super::rules::builtin_rules;
use super::{Diagnostic, Severity, DEFAULT_SOURCE};

/// Everything a rule may inspect for one file.
pub struct RuleContext<'a> {
    pub parsed: &'a ParsedFile,
    pub facts: &'a ExtractedFacts,
}

/// A diagnostic check.
pub trait Rule: Send + Sync {
    /// Stable rule code, used in output and configuration.
    fn code(&self) -> &'static str;

    fn default_severity(&self) -> Severity;

    /// Produce findings for one file, in occurrence order.
    fn check(&self, ctx: &RuleContext<'_>) -> anyhow::Result<Vec<Diagnostic>>;
}

struct RegisteredRule {
    rule: Box<dyn Rule>,
    severity: Option<Severity>,
}

/// Runs registered rules in order.
pub struct DiagnosticsEngine {
    source: String,
    rules: Vec<RegisteredRule>,
}

impl Default for DiagnosticsEngine {
    /// All built-in rules with their default severities.
    fn default() -> Self {
        builtin_rules()
            .into_iter()
            .fold(Self::builder(), |b, rule| b.boxed_rule(rule, None))
            .build()
    }
}

impl DiagnosticsEngine {
    pub fn builder() -> DiagnosticsEngineBuilder {
        DiagnosticsEngineBuilder {
            source: DEFAULT_SOURCE.to_string(),
            rules: Vec::new(),
        }
    }

    /// Built-in rules filtered and adjusted by the configuration.
    pub fn from_config(config: &Config) -> Self {
        let mut builder = Self::builder().source(config.source_tag());
        for rule in builtin_rules() {
            let code = rule.code();
            if !config.rule_enabled(code) {
                tracing::debug!(rule = code, "rule disabled by configuration");
                continue;
            }
            builder = builder.boxed_rule(rule, config.severity_override(code));
        }
        builder.build()
    }

    /// Codes of the registered rules, in run order.
    pub fn rule_codes(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.rule.code()).collect()
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Run every rule; failures are isolated per rule.
    pub fn run(&self, ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();

        for registered in &self.rules {
            let code = registered.rule.code();
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| registered.rule.check(ctx)));

            let found = match outcome {
                Ok(Ok(found)) => found,
                Ok(Err(e)) => {
                    tracing::warn!(rule = code, error = %e, "diagnostic rule failed");
                    continue;
                }
                Err(payload) => {
                    tracing::warn!(rule = code, panic = %panic_message(&*payload), "diagnostic rule panicked");
                    continue;
                }
            };

            diagnostics.extend(found.into_iter().map(|mut d| {
                if let Some(severity) = registered.severity {
                    d.severity = severity;
                }
                d.source = self.source.clone();
                d
            }));
        }

        diagnostics
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Builder for [`DiagnosticsEngine`].
pub struct DiagnosticsEngineBuilder {
    source: String,
    rules: Vec<RegisteredRule>,
}

impl DiagnosticsEngineBuilder {
    /// Set the source tag stamped on every diagnostic.
    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    /// Register a rule; rules run in registration order.
    pub fn rule<R: Rule + 'static>(self, rule: R) -> Self {
        self.boxed_rule(Box::new(rule), None)
    }

    /// Register a rule whose findings are reported at `severity`.
    pub fn rule_with_severity<R: Rule + 'static>(self, rule: R, severity: Severity) -> Self {
        self.boxed_rule(Box::new(rule), Some(severity))
    }

    fn boxed_rule(mut self, rule: Box<dyn Rule>, severity: Option<Severity>) -> Self {
        self.rules.push(RegisteredRule { rule, severity });
        self
    }

    pub fn build(self) -> DiagnosticsEngine {
        DiagnosticsEngine {
            source: self.source,
            rules: self.rules,
        }
    }
}
