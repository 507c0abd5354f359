//! The analysis pipeline: parse, bind, extract, resolve, measure, diagnose.

use std::collections::BTreeMap;

use rayon::prelude::*;

use crate::config::Config;
use crate::diagnostics::{Diagnostic, DiagnosticsEngine, RuleContext};

use super::error::{AnalysisError, AnalysisResultOf};
use super::extract::extract;
use super::metrics::compute_metrics;
use super::parser::{GoParser, ParsedFile};
use super::references;
use super::scope::Bindings;
use super::{AnalysisResult, CodeMetrics};

/// Turns Go source text into an [`AnalysisResult`].
///
/// Holds no per-call state, so one instance can be shared across threads.
pub struct Analyzer {
    parser: &'static GoParser,
    diagnostics: DiagnosticsEngine,
}

impl Analyzer {
    /// Analyzer with every built-in rule enabled.
    pub fn new() -> AnalysisResultOf<Self> {
        Self::with_diagnostics(DiagnosticsEngine::default())
    }

    pub fn with_diagnostics(diagnostics: DiagnosticsEngine) -> AnalysisResultOf<Self> {
        Ok(Self {
            parser: GoParser::shared()?,
            diagnostics,
        })
    }

    pub fn from_config(config: &Config) -> AnalysisResultOf<Self> {
        Self::with_diagnostics(DiagnosticsEngine::from_config(config))
    }

    pub fn diagnostics_engine(&self) -> &DiagnosticsEngine {
        &self.diagnostics
    }

    /// Parse only; fails on any syntax error.
    pub fn parse(&self, text: &str) -> AnalysisResultOf<ParsedFile> {
        self.parser.parse(text)
    }

    /// Run every stage after parsing.
    pub fn analyze_parsed(&self, uri: Option<&str>, parsed: &ParsedFile) -> AnalysisResult {
        let bindings = Bindings::build(parsed);
        tracing::debug!(
            uri,
            definitions = bindings.definitions.len(),
            "bound scopes"
        );

        let facts = extract(self.parser, parsed, &bindings);
        tracing::debug!(
            uri,
            imports = facts.imports.len(),
            functions = facts.functions.len(),
            types = facts.types.len(),
            variables = facts.variables.len(),
            "extracted symbols"
        );

        let references = references::resolve(&bindings);
        let metrics = compute_metrics(parsed, &facts.functions);
        let diagnostics = self.diagnostics.run(&RuleContext {
            parsed,
            facts: &facts,
        });
        tracing::debug!(
            uri,
            references = references.len(),
            diagnostics = diagnostics.len(),
            complexity = metrics.complexity_score,
            "analysis complete"
        );

        AnalysisResult {
            uri: uri.map(str::to_string),
            package: facts.package,
            imports: facts.imports,
            functions: facts.functions,
            types: facts.types,
            variables: facts.variables,
            references,
            diagnostics,
            metrics,
        }
    }

    /// Analyze source text that is not tied to a document.
    pub fn analyze_source(&self, text: &str) -> AnalysisResultOf<AnalysisResult> {
        let parsed = self.parse(text)?;
        Ok(self.analyze_parsed(None, &parsed))
    }

    /// Analyze source text and tag the result with `uri`.
    pub fn analyze(&self, uri: &str, text: &str) -> AnalysisResultOf<AnalysisResult> {
        let parsed = self.parse(text)?;
        Ok(self.analyze_parsed(Some(uri), &parsed))
    }

    /// Analyze many files in parallel.
    ///
    /// Files that fail to parse are reported in [`PackageAnalysis::failures`];
    /// they do not stop the others. Results are ordered by uri.
    pub fn analyze_package<U, T>(&self, files: &[(U, T)]) -> PackageAnalysis
    where
        U: AsRef<str> + Sync,
        T: AsRef<str> + Sync,
    {
        let outcomes: Vec<(String, AnalysisResultOf<AnalysisResult>)> = files
            .par_iter()
            .map(|(uri, text)| {
                let uri = uri.as_ref();
                (uri.to_string(), self.analyze(uri, text.as_ref()))
            })
            .collect();

        let mut analysis = PackageAnalysis::default();
        for (uri, outcome) in outcomes {
            match outcome {
                Ok(result) => analysis.files.push(result),
                Err(error) => {
                    tracing::warn!(uri = %uri, error = %error, "skipping file");
                    analysis.failures.push(FileFailure { uri, error });
                }
            }
        }
        analysis.files.sort_by(|a, b| a.uri.cmp(&b.uri));
        analysis.failures.sort_by(|a, b| a.uri.cmp(&b.uri));
        analysis.metrics = analysis.files.iter().map(|r| r.metrics).sum();
        analysis
    }
}

/// A file that could not be analyzed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFailure {
    pub uri: String,
    pub error: AnalysisError,
}

/// Results for a set of files analyzed together.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PackageAnalysis {
    pub files: Vec<AnalysisResult>,
    pub failures: Vec<FileFailure>,
    /// Field-wise sum over `files`.
    pub metrics: CodeMetrics,
}

impl PackageAnalysis {
    /// Used import paths per package, merged over all files.
    pub fn dependencies(&self) -> BTreeMap<String, Vec<String>> {
        let mut merged: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for result in &self.files {
            for (package, paths) in dependencies(result) {
                merged.entry(package).or_default().extend(paths);
            }
        }
        for paths in merged.values_mut() {
            paths.sort();
            paths.dedup();
        }
        merged
    }

    /// Every diagnostic with the uri of its file.
    pub fn diagnostics(&self) -> impl Iterator<Item = (&str, &Diagnostic)> {
        self.files.iter().flat_map(|r| {
            let uri = r.uri.as_deref().unwrap_or("");
            r.diagnostics.iter().map(move |d| (uri, d))
        })
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics().any(|(_, d)| d.is_error())
    }
}

/// Package name -> sorted, de-duplicated paths of the imports it uses.
///
/// Unused imports are left out. A file without a package clause maps under
/// the empty name.
pub fn dependencies(result: &AnalysisResult) -> BTreeMap<String, Vec<String>> {
    let mut paths: Vec<String> = result
        .imports
        .iter()
        .filter(|i| i.used)
        .map(|i| i.path.clone())
        .collect();
    paths.sort();
    paths.dedup();

    let mut map = BTreeMap::new();
    map.insert(result.package.clone().unwrap_or_default(), paths);
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{MISSING_DOC, UNUSED_IMPORT};

    const END_TO_END: &str = r#"package main

import (
    "fmt"
    "os"
)

func Greet(name string) {
    if name == "" {
        return
    }
    fmt.Println("hello", name)
}

func helper() int {
    return 1
}
"#;

    #[test]
    fn test_end_to_end() {
        let analyzer = Analyzer::new().unwrap();
        let result = analyzer.analyze_source(END_TO_END).unwrap();

        assert_eq!(result.package.as_deref(), Some("main"));
        assert_eq!(result.imports.len(), 2);
        assert_eq!(result.functions.len(), 2);
        assert_eq!(result.find_function("Greet").unwrap().complexity, 2);
        assert_eq!(result.find_function("helper").unwrap().complexity, 1);
        assert_eq!(result.diagnostics_with_code(UNUSED_IMPORT).count(), 1);
        assert_eq!(result.diagnostics_with_code(MISSING_DOC).count(), 1);
        assert_eq!(result.metrics.complexity_score, 3);
        assert!(result.uri.is_none());
    }

    #[test]
    fn test_analysis_is_deterministic() {
        let analyzer = Analyzer::new().unwrap();
        let a = analyzer.analyze("file:///a.go", END_TO_END).unwrap();
        let b = analyzer.analyze("file:///a.go", END_TO_END).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.uri.as_deref(), Some("file:///a.go"));
    }

    #[test]
    fn test_syntax_error_is_reported() {
        let analyzer = Analyzer::new().unwrap();
        let err = analyzer.analyze_source("package main\nfunc (").unwrap_err();
        assert!(err.is_syntax());
    }

    #[test]
    fn test_deeply_nested_source_is_analyzed() {
        let depth = 20_000;
        let source = format!(
            "package main\n\nvar y = 1\n\nvar x = {}y{}\n",
            "(".repeat(depth),
            ")".repeat(depth)
        );
        let analyzer = Analyzer::new().unwrap();
        let result = analyzer.analyze_source(&source).unwrap();

        assert_eq!(result.variables.len(), 2);
        let y = result.references.iter().find(|r| r.name == "y").unwrap();
        assert_eq!(y.usages.len(), 1);
    }

    #[test]
    fn test_long_selector_chain_keeps_source_order() {
        let links = 5_000;
        let source = format!(
            "package main\n\ntype node struct {{\n\tnext *node\n}}\n\nfunc last(n node) {{\n\t_ = n{}\n}}\n",
            ".next".repeat(links)
        );
        let analyzer = Analyzer::new().unwrap();
        let result = analyzer.analyze_source(&source).unwrap();

        let next = result.references.iter().find(|r| r.name == "next").unwrap();
        assert_eq!(next.usages.len(), links);
        assert!(next
            .usages
            .windows(2)
            .all(|w| w[0].start.character < w[1].start.character));
        let n = result.references.iter().find(|r| r.name == "n").unwrap();
        assert_eq!(n.usages.len(), 1);
    }

    #[test]
    fn test_from_config_shapes_diagnostics_engine() {
        let config =
            Config::parse_str("source: ci\nrules:\n  missing-doc:\n    enabled: false\n").unwrap();
        let analyzer = Analyzer::from_config(&config).unwrap();
        let engine = analyzer.diagnostics_engine();
        assert_eq!(engine.source(), "ci");
        assert_eq!(engine.rule_codes(), vec![UNUSED_IMPORT]);
    }

    #[test]
    fn test_dependencies_only_lists_used_imports() {
        let analyzer = Analyzer::new().unwrap();
        let result = analyzer.analyze_source(END_TO_END).unwrap();
        let deps = dependencies(&result);
        assert_eq!(deps.get("main"), Some(&vec!["fmt".to_string()]));
    }

    #[test]
    fn test_analyze_package_sums_and_sorts() {
        let analyzer = Analyzer::new().unwrap();
        let files = vec![
            ("b.go", "package demo\n\nimport \"strings\"\n\nfunc b() string { return strings.TrimSpace(\" \") }\n"),
            ("a.go", END_TO_END),
            ("broken.go", "package demo\nfunc {"),
        ];
        let analysis = analyzer.analyze_package(&files);

        let uris: Vec<_> = analysis.files.iter().map(|r| r.uri.as_deref().unwrap()).collect();
        assert_eq!(uris, vec!["a.go", "b.go"]);
        assert_eq!(analysis.failures.len(), 1);
        assert_eq!(analysis.failures[0].uri, "broken.go");

        let expected: CodeMetrics = analysis.files.iter().map(|r| r.metrics).sum();
        assert_eq!(analysis.metrics, expected);
        assert_eq!(analysis.metrics.function_count, 3);

        let deps = analysis.dependencies();
        assert_eq!(deps.get("demo"), Some(&vec!["strings".to_string()]));
        assert_eq!(deps.get("main"), Some(&vec!["fmt".to_string()]));
        assert!(!analysis.has_errors());
    }
}
