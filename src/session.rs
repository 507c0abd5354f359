//! Open-document session state.
//!
//! The [`DocumentStore`] keeps one analyzed snapshot per open uri. Parsing and
//! analysis run outside the lock; the write lock is held only to swap in the
//! finished snapshot, so readers never wait on analysis work.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use thiserror::Error;

use crate::analysis::{
    AnalysisError, AnalysisResult, Analyzer, CodeMetrics, ParsedFile, Position, Symbol,
};
use crate::diagnostics::Diagnostic;

/// Errors returned by [`DocumentStore`] operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("document not open: {uri}")]
    NotFound { uri: String },

    #[error("stale version for {uri}: stored {stored}, received {received}")]
    StaleVersion {
        uri: String,
        stored: i64,
        received: i64,
    },

    #[error("{operation} is not supported")]
    Unsupported { operation: &'static str },

    #[error(transparent)]
    Analysis(#[from] AnalysisError),
}

pub type SessionResult<T> = Result<T, SessionError>;

/// One open document and its latest successful analysis.
pub struct SourceDocument {
    pub uri: String,
    pub text: String,
    pub version: i64,
    pub parsed: ParsedFile,
    pub result: Arc<AnalysisResult>,
}

/// Open documents keyed by uri.
pub struct DocumentStore {
    analyzer: Analyzer,
    documents: RwLock<HashMap<String, SourceDocument>>,
}

impl DocumentStore {
    /// Store backed by an analyzer with the built-in rules.
    pub fn new() -> SessionResult<Self> {
        Ok(Self::with_analyzer(Analyzer::new()?))
    }

    pub fn with_analyzer(analyzer: Analyzer) -> Self {
        Self {
            analyzer,
            documents: RwLock::new(HashMap::new()),
        }
    }

    pub fn analyzer(&self) -> &Analyzer {
        &self.analyzer
    }

    fn build(&self, uri: &str, text: &str, version: i64) -> SessionResult<SourceDocument> {
        let parsed = self.analyzer.parse(text)?;
        let result = self.analyzer.analyze_parsed(Some(uri), &parsed);
        Ok(SourceDocument {
            uri: uri.to_string(),
            text: text.to_string(),
            version,
            parsed,
            result: Arc::new(result),
        })
    }

    /// Analyze and store a document, replacing any open one with the same uri.
    ///
    /// Reopening never moves a document to an older version.
    pub fn open_document(&self, uri: &str, text: &str, version: i64) -> SessionResult<()> {
        let document = self.build(uri, text, version)?;

        let mut documents = self.documents.write();
        if let Some(current) = documents.get(uri) {
            if version < current.version {
                return Err(SessionError::StaleVersion {
                    uri: uri.to_string(),
                    stored: current.version,
                    received: version,
                });
            }
        }
        let replaced = documents.insert(uri.to_string(), document).is_some();
        tracing::debug!(uri, version, replaced, "document opened");
        Ok(())
    }

    /// Replace an open document's text.
    ///
    /// The new version must be strictly greater than the stored one. On any
    /// error the previous snapshot stays in place.
    pub fn change_document(&self, uri: &str, text: &str, version: i64) -> SessionResult<()> {
        if !self.documents.read().contains_key(uri) {
            return Err(SessionError::NotFound {
                uri: uri.to_string(),
            });
        }

        let document = match self.build(uri, text, version) {
            Ok(document) => document,
            Err(e) => {
                tracing::debug!(uri, version, error = %e, "change rejected, keeping previous state");
                return Err(e);
            }
        };

        // Re-check under the write lock: the document may have been closed or
        // changed while we were analyzing.
        let mut documents = self.documents.write();
        let current = documents.get_mut(uri).ok_or_else(|| SessionError::NotFound {
            uri: uri.to_string(),
        })?;
        if version <= current.version {
            return Err(SessionError::StaleVersion {
                uri: uri.to_string(),
                stored: current.version,
                received: version,
            });
        }
        *current = document;
        tracing::debug!(uri, version, "document changed");
        Ok(())
    }

    /// Forget a document. Closing a uri that is not open is not an error.
    pub fn close_document(&self, uri: &str) -> SessionResult<()> {
        let removed = self.documents.write().remove(uri).is_some();
        tracing::debug!(uri, removed, "document closed");
        Ok(())
    }

    fn with_document<T>(&self, uri: &str, f: impl FnOnce(&SourceDocument) -> T) -> SessionResult<T> {
        let documents = self.documents.read();
        documents
            .get(uri)
            .map(f)
            .ok_or_else(|| SessionError::NotFound {
                uri: uri.to_string(),
            })
    }

    /// The latest analysis snapshot.
    pub fn analysis(&self, uri: &str) -> SessionResult<Arc<AnalysisResult>> {
        self.with_document(uri, |d| Arc::clone(&d.result))
    }

    /// Functions, types and variables of the document, in source order.
    pub fn symbols(&self, uri: &str) -> SessionResult<Vec<Symbol>> {
        self.with_document(uri, |d| d.result.symbols())
    }

    /// The innermost symbol whose range contains `position`.
    pub fn symbol_at(&self, uri: &str, position: Position) -> SessionResult<Option<Symbol>> {
        let symbols = self.symbols(uri)?;
        Ok(symbols
            .into_iter()
            .filter(|s| s.range.contains(position))
            .reduce(|best, s| if best.range.encloses(&s.range) { s } else { best }))
    }

    pub fn diagnostics(&self, uri: &str) -> SessionResult<Vec<Diagnostic>> {
        self.with_document(uri, |d| d.result.diagnostics.clone())
    }

    pub fn metrics(&self, uri: &str) -> SessionResult<CodeMetrics> {
        self.with_document(uri, |d| d.result.metrics)
    }

    pub fn version(&self, uri: &str) -> SessionResult<i64> {
        self.with_document(uri, |d| d.version)
    }

    pub fn text(&self, uri: &str) -> SessionResult<String> {
        self.with_document(uri, |d| d.text.clone())
    }

    /// Uris of all open documents, sorted.
    pub fn open_documents(&self) -> Vec<String> {
        let mut uris: Vec<String> = self.documents.read().keys().cloned().collect();
        uris.sort();
        uris
    }

    pub fn completion(&self, _uri: &str, _position: Position) -> SessionResult<Vec<Symbol>> {
        Err(SessionError::Unsupported {
            operation: "completion",
        })
    }

    pub fn definition(&self, _uri: &str, _position: Position) -> SessionResult<Option<Symbol>> {
        Err(SessionError::Unsupported {
            operation: "definition",
        })
    }

    pub fn hover(&self, _uri: &str, _position: Position) -> SessionResult<Option<String>> {
        Err(SessionError::Unsupported { operation: "hover" })
    }
}
