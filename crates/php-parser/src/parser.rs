use php_ast::*;
use php_lexer::{Lexer, LexerConfig, Token, TokenKind};
use tracing::debug;

use crate::diagnostics::ParseError;
use crate::stmt;
use crate::{Dialect, ParserConfig};

/// Deepest expression/statement nesting accepted before giving up on a
/// construct. Each level costs several recursive frames, so this stays well
/// inside a 2 MiB thread stack even in unoptimized builds.
pub const MAX_DEPTH: u32 = 32;

pub struct Parser<'src> {
    lexer: Lexer<'src>,
    current: Token,
    source: &'src str,
    config: ParserConfig,
    errors: Vec<ParseError>,
    /// Position of the most recently consumed token.
    prev: Position,
    /// Nesting depth (0 = top-level scope)
    pub depth: u32,
    /// Set once the nesting limit has been reported.
    too_deep: bool,
}

/// Pull the next token the grammar cares about. `<?php` tags are not
/// grammar tokens: their text and trivia become leading trivia of the token
/// that follows.
fn next_significant(lexer: &mut Lexer<'_>, keep_trivia: bool) -> Token {
    let mut pending: Vec<Trivia> = Vec::new();
    loop {
        let mut token = lexer.next_token();
        if token.kind != TokenKind::OpenTag {
            if !pending.is_empty() {
                pending.append(&mut token.free_floating);
                token.free_floating = pending;
            }
            return token;
        }
        if keep_trivia {
            let text = lexer.token_text(&token);
            pending.append(&mut token.free_floating);
            pending.push(Trivia::new(TriviaKind::Token, text, token.position));
        }
        lexer.recycle(token);
    }
}

impl<'src> Parser<'src> {
    pub fn new(source: &'src str, config: ParserConfig) -> Self {
        let mut lexer = Lexer::with_config(
            source,
            LexerConfig {
                with_free_floating: config.with_free_floating,
            },
        );
        let current = next_significant(&mut lexer, config.with_free_floating);
        let mut parser = Self {
            lexer,
            current,
            source,
            config,
            errors: Vec::new(),
            prev: Position::NONE,
            depth: 0,
            too_deep: false,
        };
        parser.drain_lexer_errors();
        parser
    }

    pub fn source(&self) -> &'src str {
        self.source
    }

    pub fn dialect(&self) -> Dialect {
        self.config.dialect
    }

    pub fn with_free_floating(&self) -> bool {
        self.config.with_free_floating
    }

    // =========================================================================
    // Token navigation
    // =========================================================================

    pub fn current_kind(&self) -> TokenKind {
        self.current.kind
    }

    pub fn current_position(&self) -> Position {
        self.current.position
    }

    pub fn current_text(&self) -> &'src str {
        self.lexer.token_text(&self.current)
    }

    pub fn text(&self, token: &Token) -> &'src str {
        self.lexer.token_text(token)
    }

    fn drain_lexer_errors(&mut self) {
        let drained: Vec<_> = self.lexer.errors.drain(..).collect();
        for e in drained {
            self.error(ParseError::Lexical {
                message: e.message,
                position: e.position,
            });
        }
    }

    /// Advance to the next token, returning the consumed token. The caller
    /// owns the token's text; trivia it has not claimed moves on to the
    /// leading trivia of the new current token.
    pub fn advance(&mut self) -> Token {
        let next = next_significant(&mut self.lexer, self.config.with_free_floating);
        let mut token = std::mem::replace(&mut self.current, next);
        self.drain_lexer_errors();
        self.prev = token.position;
        if !token.free_floating.is_empty() {
            let unclaimed = std::mem::take(&mut token.free_floating);
            self.carry_forward(unclaimed);
        }
        token
    }

    /// Consume the current token without building a node for it. Its
    /// trivia and its own text become leading trivia of the next token.
    pub fn skip(&mut self) {
        let mut trivia = std::mem::take(&mut self.current.free_floating);
        let token = self.advance();
        if self.config.with_free_floating {
            let text = self.lexer.token_text(&token);
            trivia.push(Trivia::new(TriviaKind::Token, text, token.position));
            self.carry_forward(trivia);
        }
        self.lexer.recycle(token);
    }

    fn carry_forward(&mut self, mut trivia: Vec<Trivia>) {
        trivia.append(&mut self.current.free_floating);
        self.current.free_floating = trivia;
    }

    /// Hand a consumed token back once its text has been copied out.
    pub fn recycle(&mut self, token: Token) {
        self.lexer.recycle(token);
    }

    pub fn check(&self, kind: TokenKind) -> bool {
        self.current.kind == kind
    }

    /// Consume the current token if it is `kind`.
    pub fn eat(&mut self, kind: TokenKind) -> Option<Position> {
        if self.check(kind) {
            let position = self.current.position;
            self.skip();
            Some(position)
        } else {
            None
        }
    }

    /// Consume `kind` or report it as missing.
    pub fn expect(&mut self, kind: TokenKind) -> Option<Position> {
        if let Some(position) = self.eat(kind) {
            return Some(position);
        }
        self.error(ParseError::Expected {
            expected: kind.to_string(),
            found: self.current_kind(),
            position: self.current_position(),
        });
        None
    }

    /// Expect `kind` after a context described by `after`.
    pub fn expect_after(&mut self, kind: TokenKind, after: &str) -> Option<Position> {
        if let Some(position) = self.eat(kind) {
            return Some(position);
        }
        self.error(ParseError::ExpectedAfter {
            expected: kind.to_string(),
            after: after.to_string(),
            position: self.current_position(),
        });
        None
    }

    /// Expect a closing delimiter, reporting where the opening was.
    pub fn expect_closing(&mut self, kind: TokenKind, opened_at: Position) -> Option<Position> {
        if let Some(position) = self.eat(kind) {
            return Some(position);
        }
        self.error(ParseError::UnclosedDelimiter {
            delimiter: kind.to_string(),
            opened_at,
            position: self.current_position(),
        });
        None
    }

    pub fn peek_kind(&mut self) -> TokenKind {
        self.lexer.peek().kind
    }

    pub fn peek2_kind(&mut self) -> TokenKind {
        self.lexer.peek2().kind
    }

    pub fn peek_text(&mut self) -> &'src str {
        let position = self.lexer.peek().position;
        position
            .range()
            .and_then(|range| self.source.get(range))
            .unwrap_or("")
    }

    // =========================================================================
    // Positions and trivia
    // =========================================================================

    /// Where the construct about to be parsed begins.
    pub fn start(&self) -> Position {
        self.current.position
    }

    /// From `start` to the end of the last consumed token. A construct that
    /// consumed nothing is zero-width at `start`.
    pub fn finish(&self, start: Position) -> Position {
        if self.prev.is_none() || self.prev.end_offset < start.start_offset {
            return Position::new(
                start.start_line,
                start.start_line,
                start.start_offset,
                start.start_offset,
            );
        }
        Position::between(start, self.prev)
    }

    /// A collection holding the current token's leading trivia under
    /// [`Key::Start`].
    pub fn take_leading(&mut self) -> Collection {
        let mut free_floating = Collection::new();
        free_floating.set(Key::Start, std::mem::take(&mut self.current.free_floating));
        free_floating
    }

    pub fn take_doc_comment(&mut self) -> String {
        self.current.doc_comment.take().unwrap_or_default()
    }

    /// Consume the current token and store its trivia plus its own text
    /// under `key`.
    pub fn consume_into(&mut self, free_floating: &mut Collection, key: Key) {
        let mut trivia = std::mem::take(&mut self.current.free_floating);
        let token = self.advance();
        if self.config.with_free_floating {
            let text = self.lexer.token_text(&token);
            trivia.push(Trivia::new(TriviaKind::Token, text, token.position));
            free_floating.set(key, trivia);
        }
        self.lexer.recycle(token);
    }

    /// Statement terminator: `;`, or `?>` standing in for one.
    pub fn terminate(&mut self, free_floating: &mut Collection, after: &str) {
        match self.current_kind() {
            TokenKind::Semicolon => self.consume_into(free_floating, Key::SemiColon),
            TokenKind::CloseTag => self.consume_into(free_floating, Key::PhpCloseTag),
            _ => self.error(ParseError::ExpectedAfter {
                expected: TokenKind::Semicolon.to_string(),
                after: after.to_string(),
                position: self.current_position(),
            }),
        }
    }

    // =========================================================================
    // Error handling
    // =========================================================================

    pub fn error(&mut self, err: ParseError) {
        debug!(error = %err, position = ?err.position(), "recovered syntax error");
        self.errors.push(err);
    }

    pub fn into_errors(self) -> Vec<ParseError> {
        self.errors
    }

    /// Report `feature` when parsing the PHP 5 grammar. The construct is
    /// still built.
    pub fn require_php7(&mut self, feature: &'static str, position: Position) {
        if self.config.dialect == Dialect::Php5 {
            self.error(ParseError::DialectFeature { feature, position });
        }
    }

    /// Panic-mode error recovery: advance until we hit a likely statement boundary.
    pub fn synchronize(&mut self) {
        loop {
            match self.current_kind() {
                TokenKind::Eof => break,
                TokenKind::Semicolon => {
                    self.skip();
                    break;
                }
                TokenKind::If
                | TokenKind::While
                | TokenKind::Do
                | TokenKind::For
                | TokenKind::Foreach
                | TokenKind::Function
                | TokenKind::Return
                | TokenKind::Echo
                | TokenKind::Break
                | TokenKind::Continue
                | TokenKind::Switch
                | TokenKind::Try
                | TokenKind::Throw
                | TokenKind::Goto
                | TokenKind::Declare
                | TokenKind::Unset
                | TokenKind::Global
                | TokenKind::Class
                | TokenKind::Abstract
                | TokenKind::Final
                | TokenKind::Interface
                | TokenKind::Trait
                | TokenKind::Namespace
                | TokenKind::Use
                | TokenKind::HaltCompiler
                | TokenKind::RightBrace
                | TokenKind::CloseTag
                | TokenKind::InlineHtml => break,
                _ => self.skip(),
            }
        }
    }

    /// Stop tokenizing after `__halt_compiler();`. The remaining bytes are
    /// not PHP: they are kept verbatim under [`Key::End`].
    pub fn halt_compiler(&mut self, free_floating: &mut Collection) {
        let (rest, position) = self.lexer.halt();
        debug!(bytes = rest.len(), "halted compiler");
        if self.config.with_free_floating && !rest.is_empty() {
            free_floating.push(Key::End, Trivia::new(TriviaKind::Token, rest, position));
        }
    }

    /// Give up on a construct nested deeper than [`MAX_DEPTH`]. The limit is
    /// reported once per parse; the construct is skipped up to the delimiter
    /// or terminator that closes it, so the enclosing levels resume cleanly.
    pub fn skip_too_deep(&mut self, statement: bool) -> Node {
        let start = self.start();
        if !self.too_deep {
            self.too_deep = true;
            self.error(ParseError::Forbidden {
                message: "nesting too deep".to_string(),
                position: start,
            });
        }
        let mut open = 0u32;
        loop {
            match self.current_kind() {
                TokenKind::Eof => break,
                TokenKind::LeftParen
                | TokenKind::LeftBracket
                | TokenKind::LeftBrace
                | TokenKind::CurlyOpen
                | TokenKind::DollarOpenCurlyBraces => open += 1,
                TokenKind::RightParen | TokenKind::RightBracket | TokenKind::RightBrace => {
                    if open == 0 {
                        break;
                    }
                    open -= 1;
                    if open == 0 && statement && self.check(TokenKind::RightBrace) {
                        self.skip();
                        break;
                    }
                }
                TokenKind::Semicolon if open == 0 => {
                    if statement {
                        self.skip();
                    }
                    break;
                }
                TokenKind::Comma | TokenKind::CloseTag if open == 0 => break,
                _ => {}
            }
            self.skip();
        }
        if statement {
            Node::bad_stmt(self.finish(start))
        } else {
            Node::bad(self.finish(start))
        }
    }

    // =========================================================================
    // Helper: check if token is a keyword usable as identifier in member context
    // =========================================================================

    pub fn is_semi_reserved_keyword(&self) -> bool {
        is_reserved_word(self.current_kind())
    }

    /// Consume an identifier. Keywords are accepted too when `keywords` is
    /// set (member names after `->` and `::`, method names).
    pub fn parse_identifier_with(&mut self, keywords: bool) -> Identifier {
        let acceptable = self.check(TokenKind::Identifier) || (keywords && self.is_semi_reserved_keyword());
        if !acceptable {
            self.error(ParseError::Expected {
                expected: "identifier".to_string(),
                found: self.current_kind(),
                position: self.current_position(),
            });
            return Identifier::new("", self.finish(self.start()));
        }
        let free_floating = self.take_leading();
        let token = self.advance();
        let value = self.text(&token).to_string();
        self.lexer.recycle(token);
        Identifier {
            value,
            position: self.prev,
            free_floating,
        }
    }

    pub fn parse_identifier(&mut self) -> Identifier {
        self.parse_identifier_with(false)
    }

    // =========================================================================
    // Name parsing
    // =========================================================================

    fn parse_name_part(&mut self) -> NamePart {
        let free_floating = self.take_leading();
        let token = self.advance();
        let part = NamePart {
            value: self.text(&token).to_string(),
            position: token.position,
            free_floating,
        };
        self.lexer.recycle(token);
        part
    }

    /// Parse a name: `Foo`, `Foo\Bar`, `\Foo\Bar` or `namespace\Foo\Bar`.
    /// A `\` not followed by a name part is left in place (group use).
    pub fn parse_name(&mut self) -> Node {
        let start = self.start();
        let free_floating = self.take_leading();

        let fully_qualified = self.eat(TokenKind::Backslash).is_some();
        let relative = !fully_qualified
            && self.check(TokenKind::Namespace)
            && self.peek_kind() == TokenKind::Backslash;
        if relative {
            self.skip();
            self.skip();
        }

        if !self.check(TokenKind::Identifier) {
            self.error(ParseError::Expected {
                expected: "identifier".to_string(),
                found: self.current_kind(),
                position: self.current_position(),
            });
            let mut bad = Node::bad(self.finish(start));
            *bad.free_floating_mut() = free_floating;
            return bad;
        }

        let mut parts = vec![self.parse_name_part()];
        while self.check(TokenKind::Backslash) && self.peek_kind() == TokenKind::Identifier {
            self.skip();
            parts.push(self.parse_name_part());
        }

        let position = self.finish(start);
        if fully_qualified {
            Node::FullyQualified(FullyQualified {
                parts,
                position,
                free_floating,
            })
        } else if relative {
            Node::Relative(Relative {
                parts,
                position,
                free_floating,
            })
        } else {
            Node::Name(Name {
                parts,
                position,
                free_floating,
            })
        }
    }

    pub fn at_name(&mut self) -> bool {
        match self.current_kind() {
            TokenKind::Identifier | TokenKind::Backslash => true,
            TokenKind::Namespace => self.peek_kind() == TokenKind::Backslash,
            _ => false,
        }
    }

    // =========================================================================
    // Type hint parsing
    // =========================================================================

    /// Parse a type hint: `?T`, `array`, `callable` or a class/scalar name.
    pub fn parse_type_hint(&mut self) -> Node {
        if !self.check(TokenKind::Question) {
            return self.parse_simple_type();
        }
        let start = self.start();
        let free_floating = self.take_leading();
        self.skip();
        self.require_php7("nullable types", start);
        let inner = self.parse_simple_type();
        Node::Nullable(Nullable {
            expr: Box::new(inner),
            position: self.finish(start),
            free_floating,
        })
    }

    fn parse_simple_type(&mut self) -> Node {
        match self.current_kind() {
            TokenKind::Array | TokenKind::Static => {
                Node::Identifier(self.parse_identifier_with(true))
            }
            TokenKind::Identifier if self.current_text().eq_ignore_ascii_case("callable") => {
                Node::Identifier(self.parse_identifier())
            }
            _ => {
                let name = self.parse_name();
                if let Node::Name(n) = &name {
                    if n.parts.len() == 1 && is_scalar_type(&n.parts[0].value) {
                        self.require_php7("scalar type hints", n.position);
                    }
                }
                name
            }
        }
    }

    /// Check if the current token could start a type hint.
    pub fn could_be_type_hint(&mut self) -> bool {
        match self.current_kind() {
            TokenKind::Question | TokenKind::Array | TokenKind::Identifier | TokenKind::Backslash => true,
            TokenKind::Namespace => self.peek_kind() == TokenKind::Backslash,
            _ => false,
        }
    }

    /// `: type` after a parameter list.
    pub fn parse_return_type(&mut self) -> Option<Box<Node>> {
        let colon = self.eat(TokenKind::Colon)?;
        self.require_php7("return types", colon);
        Some(Box::new(self.parse_type_hint()))
    }

    // =========================================================================
    // Top-level parsing
    // =========================================================================

    pub fn parse_root(&mut self) -> Root {
        let mut stmts = Vec::new();

        while !self.check(TokenKind::Eof) {
            let before = self.current_position();
            stmts.push(stmt::parse_top_stmt(self));
            // Safety: if parsing made no progress, skip the token to avoid infinite loop
            if self.current_position() == before && !self.check(TokenKind::Eof) {
                self.error(ParseError::Unexpected {
                    found: self.current_kind(),
                    position: before,
                });
                self.skip();
            }
        }

        let mut free_floating = Collection::new();
        free_floating.set(Key::End, std::mem::take(&mut self.current.free_floating));

        let position = match (stmts.first(), stmts.last()) {
            (Some(first), Some(last)) => Position::between(first.position(), last.position()),
            _ => Position::new(1, 1, 0, 0),
        };

        Root {
            stmts,
            position,
            free_floating,
        }
    }
}

/// Keywords that may still be used as member names (`$a->list`, `A::new()`).
pub fn is_reserved_word(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::If
            | TokenKind::Else
            | TokenKind::ElseIf
            | TokenKind::While
            | TokenKind::Do
            | TokenKind::For
            | TokenKind::Foreach
            | TokenKind::As
            | TokenKind::Function
            | TokenKind::Return
            | TokenKind::Echo
            | TokenKind::Print
            | TokenKind::And
            | TokenKind::Or
            | TokenKind::Xor
            | TokenKind::Break
            | TokenKind::Continue
            | TokenKind::Switch
            | TokenKind::Case
            | TokenKind::Default
            | TokenKind::EndIf
            | TokenKind::EndWhile
            | TokenKind::EndFor
            | TokenKind::EndForeach
            | TokenKind::Throw
            | TokenKind::Try
            | TokenKind::Catch
            | TokenKind::Finally
            | TokenKind::Instanceof
            | TokenKind::Insteadof
            | TokenKind::Array
            | TokenKind::List
            | TokenKind::Goto
            | TokenKind::Declare
            | TokenKind::Unset
            | TokenKind::Global
            | TokenKind::EndDeclare
            | TokenKind::EndSwitch
            | TokenKind::Isset
            | TokenKind::Empty
            | TokenKind::Include
            | TokenKind::IncludeOnce
            | TokenKind::Require
            | TokenKind::RequireOnce
            | TokenKind::Eval
            | TokenKind::Exit
            | TokenKind::Die
            | TokenKind::Clone
            | TokenKind::New
            | TokenKind::Class
            | TokenKind::Abstract
            | TokenKind::Final
            | TokenKind::Interface
            | TokenKind::Trait
            | TokenKind::Extends
            | TokenKind::Implements
            | TokenKind::Public
            | TokenKind::Protected
            | TokenKind::Private
            | TokenKind::Static
            | TokenKind::Var
            | TokenKind::Const
            | TokenKind::Fn_
            | TokenKind::Namespace
            | TokenKind::Use
            | TokenKind::Yield_
            | TokenKind::MagicClass
            | TokenKind::MagicDir
            | TokenKind::MagicFile
            | TokenKind::MagicFunction
            | TokenKind::MagicLine
            | TokenKind::MagicMethod
            | TokenKind::MagicNamespace
            | TokenKind::MagicTrait
            | TokenKind::HaltCompiler
    )
}

fn is_scalar_type(name: &str) -> bool {
    ["int", "float", "string", "bool", "iterable", "object", "void"]
        .iter()
        .any(|t| name.eq_ignore_ascii_case(t))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser(source: &str) -> Parser<'_> {
        Parser::new(source, ParserConfig::default())
    }

    #[test]
    fn test_open_tag_folds_into_leading_trivia() {
        let mut p = parser("<?php $a;");
        assert_eq!(p.current_kind(), TokenKind::Variable);
        let ff = p.take_leading();
        let values: Vec<_> = ff
            .get(Key::Start)
            .unwrap()
            .iter()
            .map(|t| (t.kind, t.value.as_str()))
            .collect();
        assert_eq!(values, [(TriviaKind::Token, "<?php ")]);
    }

    #[test]
    fn test_skip_carries_text_and_trivia_forward() {
        let mut p = parser("<?php foo /* c */ ( $a");
        p.skip();
        p.skip();
        assert_eq!(p.current_kind(), TokenKind::Variable);
        let ff = p.take_leading();
        let values: Vec<_> = ff
            .get(Key::Start)
            .unwrap()
            .iter()
            .map(|t| (t.kind, t.value.as_str()))
            .collect();
        assert_eq!(
            values,
            [
                (TriviaKind::Token, "<?php "),
                (TriviaKind::Token, "foo"),
                (TriviaKind::Whitespace, " "),
                (TriviaKind::Comment, "/* c */"),
                (TriviaKind::Whitespace, " "),
                (TriviaKind::Token, "("),
                (TriviaKind::Whitespace, " "),
            ]
        );
    }

    #[test]
    fn test_advance_leaves_unclaimed_trivia_for_next_token() {
        let mut p = parser("<?php a /* c */ b");
        let token = p.advance();
        assert!(token.free_floating.is_empty());
        p.recycle(token);
        let values: Vec<_> = p
            .take_leading()
            .get(Key::Start)
            .unwrap()
            .iter()
            .map(|t| t.value.clone())
            .collect();
        assert_eq!(values, ["<?php ", " ", "/* c */", " "]);
    }

    #[test]
    fn test_too_deep_reports_once_and_skips_group() {
        let mut p = parser("<?php (1, (2)) + 3; (4)");
        p.skip_too_deep(false);
        assert!(p.check(TokenKind::Semicolon));
        p.skip();
        p.skip_too_deep(false);
        assert!(p.check(TokenKind::Eof));
        let errors = p.into_errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].to_string(), "nesting too deep");
    }

    #[test]
    fn test_too_deep_statement_stops_after_block() {
        let mut p = parser("<?php if ($a) { b(); } c();");
        match p.skip_too_deep(true) {
            Node::Bad(bad) => assert!(bad.statement),
            other => panic!("expected Bad, got {}", other.type_name()),
        }
        assert_eq!(p.current_text(), "c");
    }

    #[test]
    fn test_finish_spans_consumed_tokens() {
        let mut p = parser("<?php foo bar");
        let start = p.start();
        p.skip();
        p.skip();
        assert_eq!(p.finish(start), Position::new(1, 1, 6, 13));
    }

    #[test]
    fn test_finish_without_progress_is_zero_width() {
        let mut p = parser("<?php a b");
        p.skip();
        let start = p.start();
        assert_eq!(p.finish(start), Position::new(1, 1, 8, 8));
    }

    #[test]
    fn test_terminate_records_semicolon() {
        let mut p = parser("<?php ;");
        let mut ff = Collection::new();
        p.terminate(&mut ff, "statement");
        let semi = ff.get(Key::SemiColon).unwrap();
        // `<?php ` then the terminator itself
        assert_eq!(semi.len(), 2);
        assert_eq!(semi[1].kind, TriviaKind::Token);
        assert_eq!(semi[1].value, ";");
        assert!(p.check(TokenKind::Eof));
    }

    #[test]
    fn test_terminate_accepts_close_tag() {
        let mut p = parser("<?php ?>\n");
        let mut ff = Collection::new();
        p.terminate(&mut ff, "statement");
        assert_eq!(ff.get(Key::PhpCloseTag).unwrap().last().unwrap().value, "?>\n");
        assert!(p.into_errors().is_empty());
    }

    #[test]
    fn test_terminate_reports_missing_semicolon() {
        let mut p = parser("<?php )");
        let mut ff = Collection::new();
        p.terminate(&mut ff, "echo");
        assert!(ff.is_empty());
        let errors = p.into_errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].to_string(), "expected ';' after echo");
    }

    #[test]
    fn test_parse_name_kinds() {
        let mut p = parser("<?php \\A\\B namespace\\C D\\E");
        assert!(matches!(p.parse_name(), Node::FullyQualified(n) if n.parts.len() == 2));
        assert!(matches!(p.parse_name(), Node::Relative(n) if n.parts[0].value == "C"));
        match p.parse_name() {
            Node::Name(n) => {
                assert_eq!(n.parts.len(), 2);
                assert_eq!(n.position, Position::new(1, 1, 23, 26));
            }
            other => panic!("expected Name, got {}", other.type_name()),
        }
    }

    #[test]
    fn test_parse_name_stops_before_group_brace() {
        let mut p = parser("<?php A\\B\\{");
        match p.parse_name() {
            Node::Name(n) => assert_eq!(n.parts.len(), 2),
            other => panic!("expected Name, got {}", other.type_name()),
        }
        assert!(p.check(TokenKind::Backslash));
    }

    #[test]
    fn test_php5_reports_nullable_type() {
        let mut p = Parser::new(
            "<?php ?int",
            ParserConfig {
                dialect: Dialect::Php5,
                ..ParserConfig::default()
            },
        );
        assert!(matches!(p.parse_type_hint(), Node::Nullable(_)));
        let errors = p.into_errors();
        assert_eq!(errors.len(), 2);
        assert!(errors
            .iter()
            .all(|e| matches!(e, ParseError::DialectFeature { .. })));
    }

    #[test]
    fn test_without_free_floating_collects_nothing() {
        let mut p = Parser::new(
            "<?php /* c */ ;",
            ParserConfig {
                with_free_floating: false,
                ..ParserConfig::default()
            },
        );
        assert!(p.take_leading().is_empty());
        let mut ff = Collection::new();
        p.terminate(&mut ff, "statement");
        assert!(ff.is_empty());
    }
}
