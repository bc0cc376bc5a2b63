//! Error types for script parsing, value resolution and annotation.
//!
//! # Error Handling Strategy
//!
//! This crate uses two complementary error handling patterns:
//!
//! - Typed errors ([`ParseError`], [`ResolveError`], [`AnnotationError`]) describe
//!   a failure confined to one statement, one declared value or one lookup. They
//!   are returned as `Result<T, _>` by the component that detects them.
//!
//! - [`crate::types::Issue`]: Non-fatal warnings and errors collected during
//!   analysis. Every typed error is converted into an issue at the statement
//!   boundary, so one bad statement never aborts the analysis of a whole script.

use std::fmt;
use thiserror::Error;

/// Error encountered while parsing a single statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// Human-readable error message.
    pub message: String,
    /// Position inside the statement text, if available.
    pub position: Option<Position>,
    /// The specific category of parse error.
    pub kind: ParseErrorKind,
}

/// Position information for a parse error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    /// Line number (1-indexed).
    pub line: usize,
    /// Column number (1-indexed).
    pub column: usize,
}

impl Position {
    /// Computes the line/column of a byte offset in `text`.
    pub fn from_offset(text: &str, offset: usize) -> Self {
        let offset = offset.min(text.len());
        let before = &text[..offset];
        let line = before.matches('\n').count() + 1;
        let column = match before.rfind('\n') {
            Some(newline) => before[newline + 1..].chars().count() + 1,
            None => before.chars().count() + 1,
        };
        Self { line, column }
    }
}

/// Category of parse error for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParseErrorKind {
    /// Unexpected token or character in input.
    #[default]
    SyntaxError,
    /// Missing required clause or keyword.
    MissingClause,
    /// Invalid or unexpected end of input.
    UnexpectedEof,
    /// Construct recognized but deliberately not supported (`IMPORT`, `USING`, `#SET x = IF(...)`).
    UnsupportedFeature,
    /// Lexer/tokenization error.
    LexerError,
}

impl ParseError {
    /// Creates a new parse error with just a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            position: None,
            kind: ParseErrorKind::SyntaxError,
        }
    }

    /// Creates an error for a construct that is recognized but not supported.
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::new(message).with_kind(ParseErrorKind::UnsupportedFeature)
    }

    /// Sets the error kind.
    pub fn with_kind(mut self, kind: ParseErrorKind) -> Self {
        self.kind = kind;
        self
    }

    /// Attaches a position computed from a byte offset in the statement text.
    pub fn at_offset(mut self, text: &str, offset: usize) -> Self {
        self.position = Some(Position::from_offset(text, offset));
        self
    }

    /// True when the statement was skipped by design rather than by failure.
    pub fn is_unsupported(&self) -> bool {
        self.kind == ParseErrorKind::UnsupportedFeature
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Parse error")?;

        if let Some(pos) = self.position {
            write!(f, " at line {}, column {}", pos.line, pos.column)?;
        }

        write!(f, ": {}", self.message)
    }
}

impl std::error::Error for ParseError {}

/// Failure to resolve one declared value.
///
/// The resolver never surfaces these to its callers: they select the fallback
/// text and are reported as `RESOLVE_FALLBACK` issues.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// The right-hand side does not match any of the supported shapes.
    #[error("unrecognized expression: {0}")]
    Unrecognized(String),

    /// A literal could not be parsed as a date.
    #[error("invalid date literal: {0}")]
    InvalidDate(String),

    /// A literal could not be parsed as an integer.
    #[error("invalid integer literal: {0}")]
    InvalidInteger(String),

    /// An operation was applied to a value of the wrong type.
    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    /// A format placeholder referenced a missing argument.
    #[error("format placeholder {{{0}}} has no matching argument")]
    PlaceholderIndex(String),
}

/// Failure of the optional external stream metadata lookup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnnotationError {
    /// The resource does not exist or is not visible to the provider.
    #[error("resource not found: {0}")]
    NotFound(String),

    /// The provider could not be reached or returned an error.
    #[error("stream lookup failed: {0}")]
    Unavailable(String),
}
