//! Errors produced by the analysis pipeline.

use thiserror::Error;

use super::Range;

/// Failure of a single analysis call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    /// The source text does not parse as a Go file.
    #[error("syntax error at {range}: {message}")]
    Syntax { range: Range, message: String },

    /// The Go grammar or one of its queries could not be loaded.
    #[error("language setup failed: {0}")]
    Language(String),
}

impl AnalysisError {
    pub(crate) fn syntax(range: Range, message: impl Into<String>) -> Self {
        AnalysisError::Syntax {
            range,
            message: message.into(),
        }
    }

    /// Whether this is a parse failure (as opposed to a setup failure).
    pub fn is_syntax(&self) -> bool {
        matches!(self, AnalysisError::Syntax { .. })
    }
}

pub type AnalysisResultOf<T> = Result<T, AnalysisError>;
