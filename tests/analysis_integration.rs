//! Integration tests for the analysis pipeline.
//!
//! These tests validate symbol extraction, reference resolution, complexity
//! and diagnostics against the testdata fixtures.

use std::path::PathBuf;

use gosight::analysis::{ReferenceKind, TypeDetail, VariableScope};
use gosight::{AnalysisError, Analyzer, Config, Severity};

fn testdata_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("testdata")
}

fn fixture(name: &str) -> String {
    std::fs::read_to_string(testdata_path().join(name)).expect("fixture should exist")
}

// =============================================================================
// Fixture Tests
// =============================================================================

#[test]
fn test_clean_file_has_no_diagnostics() {
    let analyzer = Analyzer::new().unwrap();
    let result = analyzer.analyze("clean.go", &fixture("clean.go")).unwrap();

    assert_eq!(result.package.as_deref(), Some("inventory"));
    assert!(result.imports.iter().all(|i| i.used));
    assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);

    let get = result.find_function("Get").expect("Get should exist");
    assert!(get.is_method);
    assert_eq!(get.qualified_name(), "Store.Get");
    assert_eq!(get.complexity, 2);
    assert_eq!(get.signature, "func (*Store) Get(sku string) (Item, error)");
    assert_eq!(get.documentation.as_deref(), Some("Get returns the item for sku."));

    let item = result.find_type("Item").expect("Item should exist");
    match &item.detail {
        TypeDetail::Struct { fields, .. } => {
            assert_eq!(fields.len(), 2);
            assert_eq!(fields[0].documentation.as_deref(), Some("SKU identifies the item."));
            assert_eq!(fields[1].tag.as_deref(), Some("`json:\"count\"`"));
        }
        other => panic!("expected struct, got {:?}", other),
    }

    let names: Vec<&str> = result.variables.iter().map(|v| v.name.as_str()).collect();
    assert_eq!(names, vec!["ErrNotFound", "MaxItems"]);
    assert!(result.variables.iter().all(|v| v.scope == VariableScope::Package));
}

#[test]
fn test_server_fixture() {
    let analyzer = Analyzer::new().unwrap();
    let result = analyzer.analyze("server.go", &fixture("server.go")).unwrap();

    let unused: Vec<_> = result.diagnostics_with_code("unused-import").collect();
    assert_eq!(unused.len(), 1);
    assert_eq!(unused[0].message, "Unused import: os");

    let missing: Vec<_> = result.diagnostics_with_code("missing-doc").collect();
    assert_eq!(missing.len(), 1);
    assert_eq!(missing[0].message, "Exported function Route lacks documentation");

    assert_eq!(result.find_function("Route").unwrap().complexity, 5);
    assert_eq!(result.find_function("status").unwrap().complexity, 4);

    assert_eq!(result.metrics.function_count, 2);
    assert_eq!(result.metrics.interface_count, 1);
    assert_eq!(result.metrics.complexity_score, 9);

    match &result.find_type("Handler").unwrap().detail {
        TypeDetail::Interface { methods, .. } => assert_eq!(methods[0].name, "Serve"),
        other => panic!("expected interface, got {:?}", other),
    }
}

#[test]
fn test_shadowed_variable_has_separate_references() {
    let analyzer = Analyzer::new().unwrap();
    let result = analyzer.analyze("server.go", &fixture("server.go")).unwrap();

    let counts: Vec<_> = result.references_named("count").collect();
    assert_eq!(counts.len(), 2);
    assert!(counts.iter().all(|r| r.kind == ReferenceKind::Variable));

    // Package-level `count` is only read in status().
    assert_eq!(counts[0].usages.len(), 1);
    // The local in Route() is read twice.
    assert_eq!(counts[1].usages.len(), 2);

    let http = result.references_named("http").next().unwrap();
    assert_eq!(http.kind, ReferenceKind::Package);
    assert_eq!(http.usages.len(), 2);
}

#[test]
fn test_broken_fixture_is_a_syntax_error() {
    let analyzer = Analyzer::new().unwrap();
    let err = analyzer
        .analyze("broken.go", &fixture("invalid/broken.go"))
        .unwrap_err();
    match err {
        AnalysisError::Syntax { range, .. } => assert!(range.start.line >= 2),
        other => panic!("expected syntax error, got {:?}", other),
    }
}

// =============================================================================
// Property Tests
// =============================================================================

#[test]
fn test_complexity_is_at_least_one() {
    let analyzer = Analyzer::new().unwrap();
    for name in ["clean.go", "server.go"] {
        let result = analyzer.analyze(name, &fixture(name)).unwrap();
        assert!(result.functions.iter().all(|f| f.complexity >= 1));
    }
}

#[test]
fn test_ranges_are_ordered() {
    let analyzer = Analyzer::new().unwrap();
    let result = analyzer.analyze("clean.go", &fixture("clean.go")).unwrap();

    for reference in &result.references {
        assert!(reference.definition.start <= reference.definition.end);
        for usage in &reference.usages {
            assert!(usage.start <= usage.end);
        }
    }
    for symbol in result.symbols() {
        assert!(symbol.range.start <= symbol.range.end);
    }
}

#[test]
fn test_concrete_end_to_end_case() {
    let source = r#"package main

import (
	"fmt"
	"strings"
)

func Process(input string) {
	if input != "" {
		fmt.Println(input)
	}
}

func helper() {}
"#;
    let analyzer = Analyzer::new().unwrap();
    let result = analyzer.analyze_source(source).unwrap();

    assert_eq!(result.functions.len(), 2);
    assert_eq!(result.find_function("Process").unwrap().complexity, 2);
    assert_eq!(result.diagnostics_with_code("unused-import").count(), 1);
    assert_eq!(result.diagnostics_with_code("missing-doc").count(), 1);

    let missing = result.diagnostics_with_code("missing-doc").next().unwrap();
    let process = result.find_function("Process").unwrap();
    assert_eq!(missing.range, process.name_range);
}

#[test]
fn test_config_changes_rules() {
    let config = Config::parse_str(
        "source: ci\nrules:\n  unused-import:\n    severity: error\n  missing-doc:\n    enabled: false\n",
    )
    .unwrap();
    let analyzer = Analyzer::from_config(&config).unwrap();
    let result = analyzer.analyze("server.go", &fixture("server.go")).unwrap();

    assert_eq!(result.diagnostics.len(), 1);
    assert_eq!(result.diagnostics[0].severity, Severity::Error);
    assert_eq!(result.diagnostics[0].source, "ci");
}

#[test]
fn test_package_analysis_over_fixtures() {
    let analyzer = Analyzer::new().unwrap();
    let files = vec![
        ("server.go".to_string(), fixture("server.go")),
        ("clean.go".to_string(), fixture("clean.go")),
    ];
    let analysis = analyzer.analyze_package(&files);

    assert_eq!(analysis.files.len(), 2);
    assert_eq!(analysis.files[0].uri.as_deref(), Some("clean.go"));
    assert_eq!(
        analysis.metrics.function_count,
        analysis.files.iter().map(|r| r.metrics.function_count).sum::<usize>()
    );

    let deps = analysis.dependencies();
    assert_eq!(deps["inventory"], vec!["errors", "fmt"]);
    assert_eq!(deps["server"], vec!["net/http", "strings"]);
}
