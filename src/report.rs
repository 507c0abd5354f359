//! Output formatting for gosight results.
//!
//! Supports two output formats:
//! - Pretty: colored terminal output for human readability
//! - JSON: structured output for programmatic consumption

use colored::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::analysis::{AnalysisError, CodeMetrics, PackageAnalysis, Symbol};
use crate::diagnostics::{Diagnostic, Severity};

// =============================================================================
// JSON Format
// =============================================================================

/// JSON report for the `analyze` command.
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonReport {
    pub version: String,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<String>,
    pub passed: bool,
    pub files_analyzed: usize,
    pub diagnostics: Vec<JsonDiagnostic>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<JsonFailure>,
    pub metrics: CodeMetrics,
}

/// One diagnostic, flattened with its file; line and column are 1-indexed.
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonDiagnostic {
    pub code: String,
    pub severity: String,
    pub source: String,
    pub file: String,
    pub line: usize,
    pub column: usize,
    pub message: String,
}

/// A file that could not be analyzed.
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonFailure {
    pub file: String,
    pub message: String,
}

/// JSON report for the `metrics` command.
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonMetricsReport {
    pub version: String,
    pub path: String,
    pub total: CodeMetrics,
    pub files: Vec<JsonFileMetrics>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JsonFileMetrics {
    pub file: String,
    #[serde(flatten)]
    pub metrics: CodeMetrics,
}

/// Whether an analysis run passes: no error diagnostics and no failed files.
pub fn passed(analysis: &PackageAnalysis) -> bool {
    !analysis.has_errors() && analysis.failures.is_empty()
}

fn diagnostic_to_json(file: &str, d: &Diagnostic) -> JsonDiagnostic {
    JsonDiagnostic {
        code: d.code.clone(),
        severity: d.severity.to_string(),
        source: d.source.clone(),
        file: file.to_string(),
        line: d.range.start.line + 1,
        column: d.range.start.character + 1,
        message: d.message.clone(),
    }
}

fn failure_message(error: &AnalysisError) -> String {
    error.to_string()
}

/// Build the `analyze` JSON report.
pub fn build_json_report(
    path: &str,
    config_path: Option<&str>,
    analysis: &PackageAnalysis,
) -> JsonReport {
    JsonReport {
        version: env!("CARGO_PKG_VERSION").to_string(),
        path: path.to_string(),
        config: config_path.map(str::to_string),
        passed: passed(analysis),
        files_analyzed: analysis.files.len(),
        diagnostics: analysis
            .diagnostics()
            .map(|(file, d)| diagnostic_to_json(file, d))
            .collect(),
        failures: analysis
            .failures
            .iter()
            .map(|f| JsonFailure {
                file: f.uri.clone(),
                message: failure_message(&f.error),
            })
            .collect(),
        metrics: analysis.metrics,
    }
}

/// Build the `metrics` JSON report.
pub fn build_metrics_report(path: &str, analysis: &PackageAnalysis) -> JsonMetricsReport {
    JsonMetricsReport {
        version: env!("CARGO_PKG_VERSION").to_string(),
        path: path.to_string(),
        total: analysis.metrics,
        files: analysis
            .files
            .iter()
            .map(|r| JsonFileMetrics {
                file: r.uri.clone().unwrap_or_default(),
                metrics: r.metrics,
            })
            .collect(),
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}

/// Write `analyze` results in JSON format.
pub fn write_json(
    path: &str,
    config_path: Option<&str>,
    analysis: &PackageAnalysis,
) -> anyhow::Result<()> {
    print_json(&build_json_report(path, config_path, analysis))
}

pub fn write_metrics_json(path: &str, analysis: &PackageAnalysis) -> anyhow::Result<()> {
    print_json(&build_metrics_report(path, analysis))
}

pub fn write_deps_json(deps: &BTreeMap<String, Vec<String>>) -> anyhow::Result<()> {
    print_json(deps)
}

pub fn write_symbols_json(symbols: &[Symbol]) -> anyhow::Result<()> {
    print_json(symbols)
}

// =============================================================================
// Pretty Format
// =============================================================================

fn write_header(label: &str, path: &str, config_path: Option<&str>) {
    println!();
    print!("  ");
    print!("{}", "gosight".cyan().bold());
    println!(" v{}", env!("CARGO_PKG_VERSION"));
    println!();

    print!("  {}", format!("{:<10}", label).dimmed());
    println!("{}", path);
    if let Some(config) = config_path {
        print!("  {}", "Config:   ".dimmed());
        println!("{}", config);
    }
    println!();
}

/// Write `analyze` results in pretty (human-readable) format.
pub fn write_pretty(path: &str, config_path: Option<&str>, analysis: &PackageAnalysis) {
    write_header("Analyzing:", path, config_path);

    let diagnostics: Vec<(&str, &Diagnostic)> = analysis.diagnostics().collect();
    write_result_summary(analysis, diagnostics.len());
    println!();

    if !diagnostics.is_empty() {
        write_diagnostics(&diagnostics);
        println!();
    }

    if !analysis.failures.is_empty() {
        println!("  {} ({}):", "Failed".red().bold(), analysis.failures.len());
        println!();
        for failure in &analysis.failures {
            println!("    {}", failure.uri.blue());
            println!("            {}", failure_message(&failure.error));
        }
        println!();
    }

    write_metrics_block(&analysis.metrics);
    println!();
}

fn write_result_summary(analysis: &PackageAnalysis, diagnostic_count: usize) {
    if passed(analysis) {
        print!("  {}", "✓ PASS".green());
    } else {
        print!("  {}", "✗ FAIL".red());
    }
    print!("  Files: {}", analysis.files.len());
    print!("  Diagnostics: {}", diagnostic_count);
    if !analysis.failures.is_empty() {
        print!("  {}", format!("({} failed)", analysis.failures.len()).red());
    }
    println!();
}

fn write_diagnostics(diagnostics: &[(&str, &Diagnostic)]) {
    println!("  {} ({}):", "Diagnostics".bold(), diagnostics.len());
    println!();

    for (file, d) in diagnostics {
        write_severity_tag(&d.severity);
        print!("   ");
        print!("{:<18}", d.code.dimmed());
        print!("{}", file.blue());
        print!("{}", format!(":{}", d.range.start).dimmed());
        println!();

        // Message on next line, indented
        println!("            {}", d.message);
        println!();
    }
}

fn write_severity_tag(severity: &Severity) {
    match severity {
        Severity::Error => print!("    {} ", "ERROR".red()),
        Severity::Warning => print!("    {} ", "WARN ".yellow()),
        Severity::Info => print!("    {} ", "INFO ".blue()),
    }
}

fn write_metrics_block(metrics: &CodeMetrics) {
    println!("  {}", "Metrics:".bold());
    println!("    {:<20} {:>8}", "lines of code", metrics.lines_of_code);
    println!("    {:<20} {:>8}", "comment lines", metrics.comment_lines);
    println!("    {:<20} {:>8}", "functions", metrics.function_count);
    println!("    {:<20} {:>8}", "structs", metrics.struct_count);
    println!("    {:<20} {:>8}", "interfaces", metrics.interface_count);
    println!("    {:<20} {:>8}", "tests", metrics.test_count);
    print!("    {:<20} ", "complexity");
    write_colored_complexity(metrics.complexity_score, metrics.function_count);
    println!();
}

/// Color the total by average complexity per function.
fn write_colored_complexity(score: u64, functions: usize) {
    let text = format!("{:>8}", score);
    let average = if functions == 0 {
        0.0
    } else {
        score as f64 / functions as f64
    };
    match average {
        a if a <= 5.0 => print!("{}", text.green()),
        a if a <= 10.0 => print!("{}", text.yellow()),
        _ => print!("{}", text.red()),
    }
}

/// Write `metrics` results in pretty format.
pub fn write_metrics_pretty(path: &str, analysis: &PackageAnalysis) {
    write_header("Metrics:", path, None);

    for result in &analysis.files {
        let file = result.uri.as_deref().unwrap_or("");
        println!(
            "    {:<40} {:>6} loc {:>4} funcs  complexity {:>4}",
            file.blue(),
            result.metrics.lines_of_code,
            result.metrics.function_count,
            result.metrics.complexity_score
        );
    }
    println!();
    write_metrics_block(&analysis.metrics);
    println!();
}

/// Write package dependencies in pretty format.
pub fn write_deps_pretty(deps: &BTreeMap<String, Vec<String>>) {
    println!();
    for (package, paths) in deps {
        let name = if package.is_empty() { "(none)" } else { package };
        println!("  {} ({}):", name.cyan().bold(), paths.len());
        for path in paths {
            println!("    {}", path);
        }
        println!();
    }
}

/// Write a symbol list in pretty format.
pub fn write_symbols_pretty(file: &str, symbols: &[Symbol]) {
    println!();
    println!("  {} ({}):", file.blue(), symbols.len());
    println!();
    for s in symbols {
        let name = match &s.container {
            Some(container) => format!("{}.{}", container, s.name),
            None => s.name.clone(),
        };
        print!("    {:<10}", s.kind.as_str().dimmed());
        print!("{:<32}", name);
        print!("{}", format!("{}", s.range.start).dimmed());
        if let Some(signature) = &s.signature {
            print!("  {}", signature);
        }
        println!();
    }
    println!();
}
