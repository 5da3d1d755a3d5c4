//! Parse error types.

use source_map::Span;
use thiserror::Error;

/// An error that occurred during parsing.
///
/// Parsing never aborts on these; they are collected next to the best-effort
/// result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}")]
pub struct ParseError {
    /// The kind of error.
    pub kind: ParseErrorKind,
    /// The location in the source where the error occurred.
    pub span: Span,
}

impl ParseError {
    /// Creates a new parse error.
    pub fn new(kind: ParseErrorKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Whether the error only degrades output rather than invalidating it.
    pub fn is_warning(&self) -> bool {
        matches!(
            self.kind,
            ParseErrorKind::DuplicateBlock { .. } | ParseErrorKind::UnexpectedClosingTag { .. }
        )
    }
}

/// The kind of parse error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    /// A top-level block has no closing tag.
    #[error("unclosed block: <{tag}>")]
    UnclosedBlock { tag: String },

    /// A second block of a kind that may appear only once.
    #[error("duplicate <{tag}> block; only the first one is used")]
    DuplicateBlock { tag: String },

    /// An element inside the template has no closing tag.
    #[error("unclosed tag: <{tag_name}>")]
    UnclosedTag { tag_name: String },

    /// A start tag is missing its `>`.
    #[error("unterminated start tag: <{tag_name}")]
    UnterminatedStartTag { tag_name: String },

    /// A closing tag that closes nothing.
    #[error("unexpected closing tag: </{tag_name}>")]
    UnexpectedClosingTag { tag_name: String },

    /// A `<!--` without `-->`.
    #[error("unterminated comment")]
    UnterminatedComment,

    /// A `{{` without `}}`.
    #[error("unterminated interpolation")]
    UnterminatedInterpolation,

    /// A quoted attribute value without its closing quote.
    #[error("unterminated value for attribute `{name}`")]
    UnterminatedAttributeValue { name: String },

    /// An attribute that could not be read.
    #[error("invalid attribute: {message}")]
    InvalidAttribute { message: String },

    /// The script or expression parser rejected the input.
    #[error("{message}")]
    SyntaxError { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let error = ParseError::new(
            ParseErrorKind::UnclosedBlock {
                tag: "script".to_string(),
            },
            Span::new(0u32, 8u32),
        );
        assert_eq!(error.to_string(), "unclosed block: <script>");
        assert!(!error.is_warning());
    }
}
