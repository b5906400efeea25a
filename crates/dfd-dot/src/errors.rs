//! Errors produced while parsing DOT text.

use thiserror::Error;

/// Errors produced while parsing DOT text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DotError {
    /// The input does not follow the DOT grammar.
    #[error("Syntax error at {line}:{column}: {message}")]
    Syntax {
        /// 1-based line of the offending input
        line: usize,
        /// 1-based column of the offending input
        column: usize,
        /// What the parser expected or found
        message: String,
    },

    /// The input holds no graph at all.
    #[error("No graph found in DOT input")]
    NoGraph,
}

impl DotError {
    /// Build a syntax error located at byte `offset` of `source`.
    pub fn at(source: &str, offset: usize, message: impl Into<String>) -> Self {
        let consumed = &source[..offset.min(source.len())];
        let line = consumed.matches('\n').count() + 1;
        let column = consumed
            .rfind('\n')
            .map_or(consumed.chars().count(), |nl| consumed[nl + 1..].chars().count())
            + 1;
        Self::Syntax {
            line,
            column,
            message: message.into(),
        }
    }
}

/// Result type for DOT parsing.
pub type DotResult<T> = Result<T, DotError>;
