use std::fmt;

use miette::{LabeledSpan, NamedSource, Report};
use php_ast::Position;
use php_lexer::{EscapeError, TokenKind};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("expected {expected}, found {found}")]
    Expected {
        expected: String,
        found: TokenKind,
        position: Position,
    },

    #[error("unexpected token {found}")]
    Unexpected { found: TokenKind, position: Position },

    #[error("expected expression")]
    ExpectedExpression { position: Position },

    #[error("expected statement")]
    ExpectedStatement { position: Position },

    #[error("expected {expected} after {after}")]
    ExpectedAfter {
        expected: String,
        after: String,
        position: Position,
    },

    #[error("unclosed {delimiter} opened at offset {}", .opened_at.start_offset)]
    UnclosedDelimiter {
        delimiter: String,
        opened_at: Position,
        position: Position,
    },

    #[error("{message}")]
    Lexical { message: String, position: Position },

    /// A construct the selected dialect does not have. The node is still built.
    #[error("{feature} require PHP 7")]
    DialectFeature {
        feature: &'static str,
        position: Position,
    },

    #[error("{message}")]
    Forbidden { message: String, position: Position },

    /// A string escape PHP rejects. `position` is the literal or string part
    /// that holds it.
    #[error("{error}")]
    InvalidEscape { error: EscapeError, position: Position },
}

impl ParseError {
    pub fn position(&self) -> Position {
        match self {
            ParseError::Expected { position, .. }
            | ParseError::Unexpected { position, .. }
            | ParseError::ExpectedExpression { position }
            | ParseError::ExpectedStatement { position }
            | ParseError::ExpectedAfter { position, .. }
            | ParseError::UnclosedDelimiter { position, .. }
            | ParseError::Lexical { position, .. }
            | ParseError::DialectFeature { position, .. }
            | ParseError::Forbidden { position, .. }
            | ParseError::InvalidEscape { position, .. } => *position,
        }
    }

    fn code_suffix(&self) -> &'static str {
        match self {
            ParseError::Expected { .. } => "expected",
            ParseError::Unexpected { .. } => "unexpected",
            ParseError::ExpectedExpression { .. } => "expected_expression",
            ParseError::ExpectedStatement { .. } => "expected_statement",
            ParseError::ExpectedAfter { .. } => "expected_after",
            ParseError::UnclosedDelimiter { .. } => "unclosed_delimiter",
            ParseError::Lexical { .. } => "lexical",
            ParseError::DialectFeature { .. } => "dialect_feature",
            ParseError::Forbidden { .. } => "forbidden",
            ParseError::InvalidEscape { .. } => "invalid_escape",
        }
    }
}

fn label_at(position: Position, text: impl Into<String>) -> Option<LabeledSpan> {
    let range = position.range()?;
    Some(LabeledSpan::new(Some(text.into()), range.start, range.len()))
}

impl miette::Diagnostic for ParseError {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(format!("php::parse::{}", self.code_suffix())))
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let mut labels = Vec::new();
        if let ParseError::UnclosedDelimiter { opened_at, .. } = self {
            labels.extend(label_at(*opened_at, "opened here"));
        }
        labels.extend(label_at(self.position(), "here"));
        if labels.is_empty() {
            None
        } else {
            Some(Box::new(labels.into_iter()))
        }
    }
}

/// Attach `source` to each error so it renders with context.
pub fn report(source: &str, name: &str, errors: &[ParseError]) -> Vec<Report> {
    errors
        .iter()
        .map(|err| {
            Report::new(err.clone()).with_source_code(NamedSource::new(name, source.to_string()))
        })
        .collect()
}
