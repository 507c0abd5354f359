//! Integration tests for the document session store.

use std::sync::Arc;
use std::thread;

use gosight::{Analyzer, DocumentStore, Position, SessionError};

const URI: &str = "file:///workspace/main.go";

const SOURCE: &str = r#"package main

import (
	"fmt"
	"os"
)

// Config holds settings.
type Config struct {
	Name string
}

var verbose = false

func Run(c Config) {
	if verbose {
		fmt.Println(c.Name)
	}
}
"#;

#[test]
fn test_open_then_symbols_matches_analyze_source() {
    let store = DocumentStore::new().unwrap();
    store.open_document(URI, SOURCE, 1).unwrap();

    let direct = Analyzer::new().unwrap().analyze_source(SOURCE).unwrap();
    let mut from_store: Vec<_> = store
        .symbols(URI)
        .unwrap()
        .into_iter()
        .map(|s| (s.name, s.kind, s.range))
        .collect();
    let mut expected: Vec<_> = direct
        .symbols()
        .into_iter()
        .map(|s| (s.name, s.kind, s.range))
        .collect();
    from_store.sort_by(|a, b| a.0.cmp(&b.0));
    expected.sort_by(|a, b| a.0.cmp(&b.0));
    assert_eq!(from_store, expected);
    assert_eq!(
        expected.len(),
        direct.functions.len() + direct.types.len() + direct.variables.len()
    );
}

#[test]
fn test_reopen_after_close_is_fresh() {
    let store = DocumentStore::new().unwrap();
    store.open_document(URI, SOURCE, 1).unwrap();
    let first = store.analysis(URI).unwrap();

    store.close_document(URI).unwrap();
    assert!(matches!(store.analysis(URI), Err(SessionError::NotFound { .. })));
    assert!(store.open_documents().is_empty());

    store.open_document(URI, SOURCE, 1).unwrap();
    let second = store.analysis(URI).unwrap();
    assert_eq!(*first, *second);
    assert_eq!(store.version(URI).unwrap(), 1);
}

#[test]
fn test_diagnostics_and_metrics_follow_changes() {
    let store = DocumentStore::new().unwrap();
    store.open_document(URI, SOURCE, 1).unwrap();

    let diagnostics = store.diagnostics(URI).unwrap();
    let codes: Vec<&str> = diagnostics.iter().map(|d| d.code.as_str()).collect();
    assert_eq!(codes, vec!["unused-import", "missing-doc"]);

    let fixed = SOURCE.replace("\t\"os\"\n", "").replace("func Run", "// Run runs.\nfunc Run");
    store.change_document(URI, &fixed, 2).unwrap();
    assert!(store.diagnostics(URI).unwrap().is_empty());
    assert_eq!(store.metrics(URI).unwrap().function_count, 1);
    assert_eq!(store.text(URI).unwrap(), fixed);
}

#[test]
fn test_out_of_order_change_is_rejected() {
    let store = DocumentStore::new().unwrap();
    store.open_document(URI, SOURCE, 5).unwrap();

    let err = store.change_document(URI, "package main\n", 4).unwrap_err();
    match err {
        SessionError::StaleVersion {
            stored, received, ..
        } => {
            assert_eq!(stored, 5);
            assert_eq!(received, 4);
        }
        other => panic!("expected stale version, got {:?}", other),
    }
    assert_eq!(store.text(URI).unwrap(), SOURCE);
}

#[test]
fn test_symbol_at_position() {
    let store = DocumentStore::new().unwrap();
    store.open_document(URI, SOURCE, 1).unwrap();

    // Inside the body of Run.
    let symbol = store.symbol_at(URI, Position::new(16, 2)).unwrap().unwrap();
    assert_eq!(symbol.name, "Run");
    assert_eq!(symbol.signature.as_deref(), Some("func Run(c Config)"));
}

#[test]
fn test_concurrent_readers_and_writers() {
    let store = Arc::new(DocumentStore::new().unwrap());
    store.open_document(URI, SOURCE, 0).unwrap();

    let handles: Vec<_> = (1..=8)
        .map(|i| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                let uri = format!("file:///workspace/f{}.go", i);
                store.open_document(&uri, SOURCE, 1).unwrap();
                // Versions may arrive out of order; stale ones are rejected.
                let _ = store.change_document(URI, SOURCE, i);
                store.symbols(URI).unwrap().len()
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), 3);
    }
    assert_eq!(store.open_documents().len(), 9);
    assert_eq!(store.version(URI).unwrap(), 8);
}
