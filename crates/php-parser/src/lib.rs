pub mod diagnostics;
pub mod expr;
pub mod parser;
pub mod precedence;
pub mod stmt;

use std::fmt;

use diagnostics::ParseError;
use php_ast::Root;

/// The surface grammar to accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Dialect {
    Php5,
    #[default]
    Php7,
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::Php5 => f.write_str("php5"),
            Dialect::Php7 => f.write_str("php7"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserConfig {
    pub dialect: Dialect,
    /// Attach whitespace, comments and punctuation to nodes.
    pub with_free_floating: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            dialect: Dialect::default(),
            with_free_floating: true,
        }
    }
}

pub struct ParseResult {
    pub root: Root,
    pub errors: Vec<ParseError>,
}

pub fn parse(source: &str) -> ParseResult {
    parse_with(source, ParserConfig::default())
}

#[tracing::instrument(skip_all, fields(source_len = source.len(), dialect = %config.dialect))]
pub fn parse_with(source: &str, config: ParserConfig) -> ParseResult {
    let mut parser = parser::Parser::new(source, config);
    let root = parser.parse_root();
    ParseResult {
        root,
        errors: parser.into_errors(),
    }
}
