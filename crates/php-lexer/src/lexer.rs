use logos::Logos;
use php_ast::{LineIndex, Position, Trivia, TriviaKind};
use tracing::trace;

use crate::token::{resolve_keyword, TokenKind};

#[derive(Debug, Clone, PartialEq)]
pub struct LexerError {
    pub message: String,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub position: Position,
    /// Whitespace and comments between the previous token and this one.
    pub free_floating: Vec<Trivia>,
    /// The last `/** */` comment among this token's leading trivia.
    pub doc_comment: Option<String>,
}

impl Token {
    pub fn new(kind: TokenKind, position: Position) -> Self {
        Self {
            kind,
            position,
            free_floating: Vec::new(),
            doc_comment: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LexerConfig {
    /// Collect whitespace and comments as token trivia.
    pub with_free_floating: bool,
}

impl Default for LexerConfig {
    fn default() -> Self {
        Self {
            with_free_floating: true,
        }
    }
}

/// Lexical mode. The lexer works in the mode on top of its stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    InlineHtml,
    Php,
    DoubleQuotes,
    Backquote,
    Heredoc,
    Nowdoc,
    /// After `$name[` inside a string.
    VarOffset,
    /// After `$name->` inside a string.
    LookingForProperty,
    /// After `${` inside a string.
    LookingForVarName,
}

const POOL_LIMIT: usize = 64;

/// Free list of trivia buffers, owned by one lexer.
#[derive(Debug, Default)]
pub struct TokenPool {
    free: Vec<Vec<Trivia>>,
}

impl TokenPool {
    pub fn take(&mut self) -> Vec<Trivia> {
        self.free.pop().unwrap_or_default()
    }

    pub fn give(&mut self, mut buffer: Vec<Trivia>) {
        if buffer.capacity() == 0 || self.free.len() >= POOL_LIMIT {
            return;
        }
        buffer.clear();
        self.free.push(buffer);
    }

    pub fn len(&self) -> usize {
        self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.free.is_empty()
    }
}

type Raw = (TokenKind, usize, usize);

pub struct Lexer<'src> {
    source: &'src str,
    pos: usize,
    modes: Vec<Mode>,
    heredoc_labels: Vec<String>,
    lines: LineIndex<'src>,
    config: LexerConfig,
    pool: TokenPool,
    peeked: Option<Token>,
    peeked2: Option<Token>,
    pub errors: Vec<LexerError>,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Self::with_config(source, LexerConfig::default())
    }

    pub fn with_config(source: &'src str, config: LexerConfig) -> Self {
        Self {
            source,
            pos: 0,
            modes: vec![Mode::InlineHtml],
            heredoc_labels: Vec::new(),
            lines: LineIndex::new(source),
            config,
            pool: TokenPool::default(),
            peeked: None,
            peeked2: None,
            errors: Vec::new(),
        }
    }

    pub fn source(&self) -> &'src str {
        self.source
    }

    pub fn mode(&self) -> Mode {
        self.modes.last().copied().unwrap_or(Mode::Php)
    }

    pub fn peek(&mut self) -> &Token {
        let token = match self.peeked.take() {
            Some(token) => token,
            None => self.read_next_token(),
        };
        self.peeked.insert(token)
    }

    /// Peek two tokens ahead (past the next token).
    pub fn peek2(&mut self) -> &Token {
        if self.peeked.is_none() {
            self.peeked = Some(self.read_next_token());
        }
        let token = match self.peeked2.take() {
            Some(token) => token,
            None => self.read_next_token(),
        };
        self.peeked2.insert(token)
    }

    pub fn next_token(&mut self) -> Token {
        if let Some(token) = self.peeked.take() {
            self.peeked = self.peeked2.take();
            return token;
        }
        self.read_next_token()
    }

    /// Get the text slice corresponding to a token
    pub fn token_text(&self, token: &Token) -> &'src str {
        token
            .position
            .range()
            .and_then(|range| self.source.get(range))
            .unwrap_or("")
    }

    /// Hand a consumed token back once its trivia has been copied out.
    pub fn recycle(&mut self, token: Token) {
        self.pool.give(token.free_floating);
    }

    pub fn pool(&self) -> &TokenPool {
        &self.pool
    }

    /// Stop tokenizing: everything after the current position is raw data
    /// (`__halt_compiler();`). Returns that data and where it lies; the next
    /// token is `Eof`.
    pub fn halt(&mut self) -> (&'src str, Position) {
        let start = self.pos.min(self.source.len());
        let rest = &self.source[start..];
        let position = self.lines.position(start, self.source.len());
        self.pos = self.source.len();
        self.peeked = None;
        self.peeked2 = None;
        self.modes.truncate(1);
        self.heredoc_labels.clear();
        (rest, position)
    }

    fn push_mode(&mut self, mode: Mode) {
        trace!(?mode, depth = self.modes.len(), "push lexer mode");
        self.modes.push(mode);
    }

    fn pop_mode(&mut self) {
        if self.modes.len() > 1 {
            let mode = self.modes.pop();
            trace!(?mode, depth = self.modes.len(), "pop lexer mode");
        }
    }

    fn set_mode(&mut self, mode: Mode) {
        if let Some(top) = self.modes.last_mut() {
            *top = mode;
        }
    }

    fn error(&mut self, message: impl Into<String>, start: usize, end: usize) {
        let position = self.lines.position(start, end);
        self.errors.push(LexerError {
            message: message.into(),
            position,
        });
    }

    fn read_next_token(&mut self) -> Token {
        let mut trivia = Vec::new();
        let mut doc_comment = None;
        let (kind, start, end) = loop {
            if self.pos >= self.source.len() {
                self.close_open_modes();
                break (TokenKind::Eof, self.source.len(), self.source.len());
            }
            let raw = match self.mode() {
                Mode::InlineHtml => Some(self.lex_inline_html()),
                Mode::Php => Some(self.lex_php()),
                Mode::DoubleQuotes => Some(self.lex_encapsed(b'"', TokenKind::DoubleQuote)),
                Mode::Backquote => Some(self.lex_encapsed(b'`', TokenKind::Backtick)),
                Mode::Heredoc => self.lex_heredoc_body(true),
                Mode::Nowdoc => self.lex_heredoc_body(false),
                Mode::VarOffset => self.lex_var_offset(),
                Mode::LookingForProperty => self.lex_looking_for_property(),
                Mode::LookingForVarName => self.lex_looking_for_var_name(),
            };
            // `None`: the mode changed without consuming input
            let Some((kind, start, end)) = raw else {
                continue;
            };
            if !kind.is_trivia() {
                break (kind, start, end);
            }
            let text = &self.source[start..end];
            if kind == TokenKind::DocComment {
                doc_comment = Some(text.to_string());
            }
            if self.config.with_free_floating {
                if trivia.capacity() == 0 {
                    trivia = self.pool.take();
                }
                let trivia_kind = if kind == TokenKind::Whitespace {
                    TriviaKind::Whitespace
                } else {
                    TriviaKind::Comment
                };
                let position = self.lines.position(start, end);
                trivia.push(Trivia::new(trivia_kind, text, position));
            }
        };
        Token {
            kind,
            position: self.lines.position(start, end),
            free_floating: trivia,
            doc_comment,
        }
    }

    /// Report strings and heredocs still open at end of input and fall back
    /// to the base mode.
    fn close_open_modes(&mut self) {
        let unterminated = self.modes.iter().rev().find_map(|mode| match mode {
            Mode::DoubleQuotes => Some("Unterminated string"),
            Mode::Backquote => Some("Unterminated shell command"),
            Mode::Heredoc | Mode::Nowdoc => Some("Unterminated heredoc"),
            _ => None,
        });
        if let Some(message) = unterminated {
            let end = self.source.len();
            self.error(message, end, end);
        }
        self.modes.truncate(1);
        self.heredoc_labels.clear();
    }

    fn lex_inline_html(&mut self) -> Raw {
        let start = self.pos;
        let rest = &self.source[start..];

        if start == 0 && rest.starts_with("#!") {
            let end = memchr::memchr(b'\n', rest.as_bytes()).map_or(rest.len(), |nl| nl + 1);
            self.pos = end;
            return (TokenKind::Comment, start, end);
        }

        if let Some((kind, len)) = open_tag_at(rest.as_bytes()) {
            self.pos = start + len;
            self.set_mode(Mode::Php);
            return (kind, start, self.pos);
        }

        let end = memchr::memmem::find_iter(rest.as_bytes(), b"<?")
            .find(|&at| open_tag_at(&rest.as_bytes()[at..]).is_some())
            .map_or(self.source.len(), |at| start + at);
        self.pos = end;
        (TokenKind::InlineHtml, start, end)
    }

    fn lex_php(&mut self) -> Raw {
        let start = self.pos;
        let bytes = &self.source.as_bytes()[start..];

        let binary = matches!(bytes[0], b'b' | b'B') as usize;
        match bytes.get(binary) {
            Some(b'"') => return self.lex_double_quoted(start, binary),
            Some(b'<') if bytes[binary..].starts_with(b"<<<") => {
                if let Some(raw) = self.lex_heredoc_start(start, binary) {
                    return raw;
                }
            }
            _ => {}
        }
        if bytes[0] == b'`' {
            self.pos = start + 1;
            self.push_mode(Mode::Backquote);
            return (TokenKind::Backtick, start, start + 1);
        }

        let rest = &self.source[start..];
        let mut inner = TokenKind::lexer(rest);
        match inner.next() {
            Some(Ok(kind)) => {
                let mut end = start + inner.span().end;
                self.pos = end;

                if kind.is_numeric() {
                    if let Some(raw) = self.try_consume_invalid_numeric(start) {
                        return raw;
                    }
                }

                match kind {
                    TokenKind::Identifier => {
                        let resolved = resolve_keyword(&self.source[start..end]);
                        (resolved.unwrap_or(TokenKind::Identifier), start, end)
                    }
                    TokenKind::CloseTag => {
                        let after = &self.source.as_bytes()[end..];
                        if after.starts_with(b"\r\n") {
                            end += 2;
                        } else if after.starts_with(b"\n") {
                            end += 1;
                        }
                        self.pos = end;
                        self.set_mode(Mode::InlineHtml);
                        (TokenKind::CloseTag, start, end)
                    }
                    TokenKind::LeftBrace => {
                        self.push_mode(Mode::Php);
                        (kind, start, end)
                    }
                    TokenKind::RightBrace => {
                        self.pop_mode();
                        (kind, start, end)
                    }
                    TokenKind::Comment | TokenKind::DocComment => {
                        let text = &self.source[start..end];
                        if text.starts_with("/*") && (text.len() < 4 || !text.ends_with("*/")) {
                            self.error("Unterminated comment", start, end);
                        }
                        (TokenKind::classify_comment(text), start, end)
                    }
                    _ => (kind, start, end),
                }
            }
            Some(Err(())) => {
                if bytes.get(binary) == Some(&b'\'') {
                    let end = self.source.len();
                    self.pos = end;
                    self.error("Unterminated string", start, end);
                    return (TokenKind::ConstantEncapsedString, start, end);
                }
                let len = rest.chars().next().map_or(1, char::len_utf8);
                let end = start + len;
                self.pos = end;
                self.error(
                    format!("Unexpected character '{}'", &self.source[start..end]),
                    start,
                    end,
                );
                (TokenKind::BadCharacter, start, end)
            }
            None => (TokenKind::Eof, self.source.len(), self.source.len()),
        }
    }

    /// Consume characters that form an invalid numeric literal rest (digits,
    /// underscores, dots, hex chars, exponent markers).
    fn consume_invalid_numeric_rest(&mut self) {
        let bytes = self.source.as_bytes();
        while self.pos < bytes.len() {
            let b = bytes[self.pos];
            if !(b.is_ascii_alphanumeric() || b == b'_' || b == b'.' || b == b'+' || b == b'-') {
                break;
            }
            // Only consume +/- after e/E
            if (b == b'+' || b == b'-') && !matches!(bytes[self.pos - 1], b'e' | b'E') {
                break;
            }
            self.pos += 1;
        }
    }

    /// A numeric token directly followed by `_` is an invalid literal:
    /// greedily consume the rest of it.
    fn try_consume_invalid_numeric(&mut self, start: usize) -> Option<Raw> {
        if self.source.as_bytes().get(self.pos) != Some(&b'_') {
            return None;
        }
        self.consume_invalid_numeric_rest();
        let end = self.pos;
        self.error("Invalid numeric literal", start, end);
        Some((TokenKind::InvalidNumericLiteral, start, end))
    }

    /// `"..."` in PHP code: a single token unless it interpolates, in which
    /// case only the opening quote is emitted and the body is lexed in
    /// [`Mode::DoubleQuotes`].
    fn lex_double_quoted(&mut self, start: usize, prefix: usize) -> Raw {
        let bytes = self.source.as_bytes();
        let body_start = start + prefix + 1;
        let mut i = body_start;
        loop {
            match bytes.get(i) {
                None => {
                    let end = bytes.len();
                    self.pos = end;
                    self.error("Unterminated string", start, end);
                    return (TokenKind::ConstantEncapsedString, start, end);
                }
                Some(b'\\') => i += 2,
                Some(b'"') => {
                    self.pos = i + 1;
                    return (TokenKind::ConstantEncapsedString, start, i + 1);
                }
                Some(_) if starts_interpolation(bytes, i) => break,
                Some(_) => i += 1,
            }
        }
        self.pos = body_start;
        self.push_mode(Mode::DoubleQuotes);
        (TokenKind::DoubleQuote, start, body_start)
    }

    /// Body of an interpolated `"..."` or `` `...` `` string.
    fn lex_encapsed(&mut self, quote: u8, closing: TokenKind) -> Raw {
        let start = self.pos;
        let bytes = self.source.as_bytes();
        if bytes[start] == quote {
            self.pos = start + 1;
            self.pop_mode();
            return (closing, start, start + 1);
        }
        if starts_interpolation(bytes, start) {
            return self.lex_interpolation(start);
        }
        let mut i = start;
        while i < bytes.len() {
            match bytes[i] {
                b'\\' => i += 2,
                b if b == quote => break,
                _ if starts_interpolation(bytes, i) => break,
                _ => i += 1,
            }
        }
        let end = i.min(bytes.len());
        self.pos = end;
        (TokenKind::EncapsedAndWhitespace, start, end)
    }

    /// `<<<LABEL`, `<<<"LABEL"` or `<<<'LABEL'` followed by a line break.
    /// Anything else is not a heredoc and is lexed as `<<` `<`.
    fn lex_heredoc_start(&mut self, start: usize, prefix: usize) -> Option<Raw> {
        let bytes = self.source.as_bytes();
        let mut i = start + prefix + 3;
        while matches!(bytes.get(i), Some(b' ' | b'\t')) {
            i += 1;
        }
        let quote = match bytes.get(i) {
            Some(&q @ (b'\'' | b'"')) => {
                i += 1;
                Some(q)
            }
            _ => None,
        };
        let label_start = i;
        if !bytes.get(i).is_some_and(|&b| is_ident_start(b)) {
            return None;
        }
        while bytes.get(i).is_some_and(|&b| is_ident_continue(b)) {
            i += 1;
        }
        let label_end = i;
        if let Some(q) = quote {
            if bytes.get(i) != Some(&q) {
                return None;
            }
            i += 1;
        }
        match bytes.get(i) {
            Some(b'\n') => i += 1,
            Some(b'\r') => {
                i += 1;
                if bytes.get(i) == Some(&b'\n') {
                    i += 1;
                }
            }
            _ => return None,
        }

        self.pos = i;
        self.heredoc_labels
            .push(self.source[label_start..label_end].to_string());
        let mode = if quote == Some(b'\'') {
            Mode::Nowdoc
        } else {
            Mode::Heredoc
        };
        self.push_mode(mode);
        Some((TokenKind::StartHeredoc, start, i))
    }

    fn lex_heredoc_body(&mut self, interpolate: bool) -> Option<Raw> {
        enum Stop {
            Text,
            End(usize),
            Interpolation,
        }

        let start = self.pos;
        let bytes = self.source.as_bytes();
        let Some(label) = self.heredoc_labels.last() else {
            self.pop_mode();
            return None;
        };
        let label = label.as_bytes();

        let mut i = start;
        let stop = loop {
            if i >= bytes.len() {
                break Stop::Text;
            }
            if matches!(bytes[i - 1], b'\n' | b'\r') {
                if let Some(label_start) = heredoc_end_at(bytes, i, label) {
                    break Stop::End(label_start + label.len());
                }
            }
            match bytes[i] {
                b'\\' if interpolate => i += 2,
                _ if interpolate && starts_interpolation(bytes, i) => break Stop::Interpolation,
                _ => i += 1,
            }
        };
        let i = i.min(bytes.len());

        match stop {
            Stop::End(label_end) if i == start => {
                self.pos = label_end;
                self.heredoc_labels.pop();
                self.pop_mode();
                Some((TokenKind::EndHeredoc, start, label_end))
            }
            Stop::Interpolation if i == start => Some(self.lex_interpolation(start)),
            _ => {
                self.pos = i;
                Some((TokenKind::EncapsedAndWhitespace, start, i))
            }
        }
    }

    /// `$name`, `${` or `{$` at `start` inside a string body.
    fn lex_interpolation(&mut self, start: usize) -> Raw {
        let bytes = self.source.as_bytes();
        if bytes[start] == b'{' {
            self.pos = start + 1;
            self.push_mode(Mode::Php);
            return (TokenKind::CurlyOpen, start, start + 1);
        }
        if bytes.get(start + 1) == Some(&b'{') {
            self.pos = start + 2;
            self.push_mode(Mode::LookingForVarName);
            return (TokenKind::DollarOpenCurlyBraces, start, start + 2);
        }
        let end = ident_end(bytes, start + 1);
        self.pos = end;
        if bytes.get(end) == Some(&b'[') {
            self.push_mode(Mode::VarOffset);
        } else if bytes[end..].starts_with(b"->")
            && bytes.get(end + 2).is_some_and(|&b| is_ident_start(b))
        {
            self.push_mode(Mode::LookingForProperty);
        }
        (TokenKind::Variable, start, end)
    }

    /// Inside `"$a[...]"`: a bracket, a name, a variable or a number.
    fn lex_var_offset(&mut self) -> Option<Raw> {
        let start = self.pos;
        let bytes = self.source.as_bytes();
        let (kind, end) = match bytes[start] {
            b'[' => (TokenKind::LeftBracket, start + 1),
            b']' => {
                self.pop_mode();
                (TokenKind::RightBracket, start + 1)
            }
            b'-' => (TokenKind::Minus, start + 1),
            b'$' if bytes.get(start + 1).is_some_and(|&b| is_ident_start(b)) => {
                (TokenKind::Variable, ident_end(bytes, start + 1))
            }
            b'0'..=b'9' => {
                let mut end = start;
                while bytes.get(end).is_some_and(|b| b.is_ascii_alphanumeric()) {
                    end += 1;
                }
                (TokenKind::NumString, end)
            }
            b if is_ident_start(b) => (TokenKind::Identifier, ident_end(bytes, start)),
            _ => {
                self.error("Unexpected character in string offset", start, start);
                self.pop_mode();
                return None;
            }
        };
        self.pos = end;
        Some((kind, start, end))
    }

    /// Inside `"$a->b"`: the arrow, then one property name.
    fn lex_looking_for_property(&mut self) -> Option<Raw> {
        let start = self.pos;
        let bytes = self.source.as_bytes();
        if bytes[start..].starts_with(b"->") {
            self.pos = start + 2;
            return Some((TokenKind::Arrow, start, start + 2));
        }
        self.pop_mode();
        if is_ident_start(bytes[start]) {
            let end = ident_end(bytes, start);
            self.pos = end;
            return Some((TokenKind::Identifier, start, end));
        }
        None
    }

    /// After `${`: a bare name directly followed by `[` or `}` is a variable
    /// name; anything else is an expression.
    fn lex_looking_for_var_name(&mut self) -> Option<Raw> {
        let start = self.pos;
        let bytes = self.source.as_bytes();
        self.set_mode(Mode::Php);
        if is_ident_start(bytes[start]) {
            let end = ident_end(bytes, start);
            if matches!(bytes.get(end), Some(b'[' | b'}')) {
                self.pos = end;
                return Some((TokenKind::StringVarname, start, end));
            }
        }
        None
    }
}

/// `<?php` (followed by whitespace or end of input) or `<?=`. The one
/// whitespace character after `<?php` belongs to the tag; `\r\n` counts as
/// one.
fn open_tag_at(bytes: &[u8]) -> Option<(TokenKind, usize)> {
    if bytes.starts_with(b"<?=") {
        return Some((TokenKind::OpenTagWithEcho, 3));
    }
    let tag = bytes.get(..5)?;
    if !tag.eq_ignore_ascii_case(b"<?php") {
        return None;
    }
    match bytes.get(5) {
        None => Some((TokenKind::OpenTag, 5)),
        Some(b'\r') if bytes.get(6) == Some(&b'\n') => Some((TokenKind::OpenTag, 7)),
        Some(b' ' | b'\t' | b'\r' | b'\n') => Some((TokenKind::OpenTag, 6)),
        _ => None,
    }
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b >= 0x80
}

fn is_ident_continue(b: u8) -> bool {
    is_ident_start(b) || b.is_ascii_digit()
}

fn ident_end(bytes: &[u8], from: usize) -> usize {
    let mut end = from;
    while bytes.get(end).is_some_and(|&b| is_ident_continue(b)) {
        end += 1;
    }
    end
}

/// `true` when the terminator at `pos` is escaped: it is preceded by an odd
/// run of backslashes.
pub fn is_escaped(bytes: &[u8], pos: usize) -> bool {
    let run = bytes[..pos.min(bytes.len())]
        .iter()
        .rev()
        .take_while(|&&b| b == b'\\')
        .count();
    run % 2 == 1
}

/// `$` followed by `{` or a name start, or `{` followed by `$`, not escaped.
fn starts_interpolation(bytes: &[u8], pos: usize) -> bool {
    let next = bytes.get(pos + 1).copied();
    let opens = match bytes[pos] {
        b'$' => next.is_some_and(|b| b == b'{' || is_ident_start(b)),
        b'{' => next == Some(b'$'),
        _ => false,
    };
    opens && !is_escaped(bytes, pos)
}

/// Checks whether the line starting at `line_start` closes a heredoc
/// labelled `label`. Returns the offset of the label on success.
///
/// Leading spaces and tabs are skipped; the label must not continue into
/// a longer name.
pub fn heredoc_end_at(bytes: &[u8], line_start: usize, label: &[u8]) -> Option<usize> {
    let mut i = line_start;
    while matches!(bytes.get(i), Some(b' ' | b'\t')) {
        i += 1;
    }
    if !bytes.get(i..)?.starts_with(label) || is_escaped(bytes, i) {
        return None;
    }
    match bytes.get(i + label.len()) {
        Some(&b) if is_ident_continue(b) => None,
        _ => Some(i),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect_tokens(source: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(source);
        let mut tokens = Vec::new();
        loop {
            let token = lexer.next_token();
            if token.kind == TokenKind::Eof {
                tokens.push(token);
                break;
            }
            tokens.push(token);
        }
        tokens
    }

    fn collect_kinds(source: &str) -> Vec<TokenKind> {
        collect_tokens(source).into_iter().map(|t| t.kind).collect()
    }

    fn collect_texts(source: &str) -> Vec<(TokenKind, String)> {
        let mut lexer = Lexer::new(source);
        let mut out = Vec::new();
        loop {
            let token = lexer.next_token();
            if token.kind == TokenKind::Eof {
                break;
            }
            out.push((token.kind, lexer.token_text(&token).to_string()));
        }
        out
    }

    fn round_trip(source: &str) -> String {
        let mut lexer = Lexer::new(source);
        let mut out = String::new();
        loop {
            let token = lexer.next_token();
            for trivia in &token.free_floating {
                out.push_str(&trivia.value);
            }
            out.push_str(lexer.token_text(&token));
            if token.kind == TokenKind::Eof {
                break;
            }
        }
        out
    }

    #[test]
    fn test_php_only() {
        let tokens = collect_kinds("<?php $x = 42;");
        assert_eq!(
            tokens,
            vec![
                TokenKind::OpenTag,
                TokenKind::Variable,
                TokenKind::Equals,
                TokenKind::IntLiteral,
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_inline_html_before_php() {
        let tokens = collect_kinds("<html><?php echo 1;");
        assert_eq!(
            tokens,
            vec![
                TokenKind::InlineHtml,
                TokenKind::OpenTag,
                TokenKind::Echo,
                TokenKind::IntLiteral,
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_close_tag_swallows_one_newline() {
        let texts = collect_texts("<?php echo 1 ?>\n\n<b>");
        assert_eq!(texts[3], (TokenKind::CloseTag, "?>\n".to_string()));
        assert_eq!(texts[4], (TokenKind::InlineHtml, "\n<b>".to_string()));
    }

    #[test]
    fn test_open_tag_with_echo() {
        let tokens = collect_kinds("a<?= $x ?>");
        assert_eq!(
            tokens,
            vec![
                TokenKind::InlineHtml,
                TokenKind::OpenTagWithEcho,
                TokenKind::Variable,
                TokenKind::CloseTag,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_keyword_resolution() {
        let tokens = collect_kinds("<?php IF else While function");
        assert_eq!(
            tokens,
            vec![
                TokenKind::OpenTag,
                TokenKind::If,
                TokenKind::Else,
                TokenKind::While,
                TokenKind::Function,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_trivia_attached_to_next_token() {
        let tokens = collect_tokens("<?php /* a */\n$x;");
        let var = &tokens[1];
        assert_eq!(var.kind, TokenKind::Variable);
        let values: Vec<_> = var.free_floating.iter().map(|t| t.value.as_str()).collect();
        assert_eq!(values, ["/* a */", "\n"]);
        assert_eq!(var.free_floating[0].kind, TriviaKind::Comment);
        assert_eq!(var.position, Position::new(2, 2, 14, 16));
    }

    #[test]
    fn test_without_free_floating() {
        let mut lexer = Lexer::with_config(
            "<?php  /** doc */ function",
            LexerConfig {
                with_free_floating: false,
            },
        );
        lexer.next_token();
        let token = lexer.next_token();
        assert_eq!(token.kind, TokenKind::Function);
        assert!(token.free_floating.is_empty());
        assert_eq!(token.doc_comment.as_deref(), Some("/** doc */"));
    }

    #[test]
    fn test_doc_comment_on_following_token() {
        let tokens = collect_tokens("<?php /** first */ /* plain */ class A {}");
        assert_eq!(tokens[1].kind, TokenKind::Class);
        assert_eq!(tokens[1].doc_comment.as_deref(), Some("/** first */"));
        assert_eq!(tokens[2].doc_comment, None);
    }

    #[test]
    fn test_shebang_is_trivia() {
        let tokens = collect_tokens("#!/usr/bin/env php\n<?php 1;");
        assert_eq!(tokens[0].kind, TokenKind::OpenTag);
        assert_eq!(tokens[0].free_floating[0].value, "#!/usr/bin/env php\n");
        assert_eq!(tokens[0].position.start_line, 2);
    }

    #[test]
    fn test_peek_doesnt_consume() {
        let mut lexer = Lexer::new("<?php 42 43");
        assert_eq!(lexer.peek().kind, TokenKind::OpenTag);
        assert_eq!(lexer.peek2().kind, TokenKind::IntLiteral);
        assert_eq!(lexer.next_token().kind, TokenKind::OpenTag);
        assert_eq!(lexer.next_token().kind, TokenKind::IntLiteral);
        assert_eq!(lexer.next_token().kind, TokenKind::IntLiteral);
        assert_eq!(lexer.next_token().kind, TokenKind::Eof);
    }

    #[test]
    fn test_plain_double_quoted_is_one_token() {
        let texts = collect_texts(r#"<?php "a \"b\" $ {x}";"#);
        assert_eq!(
            texts[1],
            (TokenKind::ConstantEncapsedString, r#""a \"b\" $ {x}""#.to_string())
        );
    }

    #[test]
    fn test_escaped_backslash_ends_string() {
        let texts = collect_texts(r#"<?php "a\\"; $b"#);
        assert_eq!(texts[1], (TokenKind::ConstantEncapsedString, r#""a\\""#.to_string()));
        assert_eq!(texts[3].0, TokenKind::Variable);
    }

    #[test]
    fn test_simple_interpolation() {
        let texts = collect_texts(r#"<?php "a $b c";"#);
        assert_eq!(
            texts,
            vec![
                (TokenKind::OpenTag, "<?php ".to_string()),
                (TokenKind::DoubleQuote, "\"".to_string()),
                (TokenKind::EncapsedAndWhitespace, "a ".to_string()),
                (TokenKind::Variable, "$b".to_string()),
                (TokenKind::EncapsedAndWhitespace, " c".to_string()),
                (TokenKind::DoubleQuote, "\"".to_string()),
                (TokenKind::Semicolon, ";".to_string()),
            ]
        );
    }

    #[test]
    fn test_curly_interpolation_nests() {
        let kinds = collect_kinds(r#"<?php "{$a->b("x{$c}")}!";"#);
        assert_eq!(
            kinds,
            vec![
                TokenKind::OpenTag,
                TokenKind::DoubleQuote,
                TokenKind::CurlyOpen,
                TokenKind::Variable,
                TokenKind::Arrow,
                TokenKind::Identifier,
                TokenKind::LeftParen,
                TokenKind::DoubleQuote,
                TokenKind::EncapsedAndWhitespace,
                TokenKind::CurlyOpen,
                TokenKind::Variable,
                TokenKind::RightBrace,
                TokenKind::DoubleQuote,
                TokenKind::RightParen,
                TokenKind::RightBrace,
                TokenKind::EncapsedAndWhitespace,
                TokenKind::DoubleQuote,
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_var_offset_and_property_in_string() {
        let kinds = collect_kinds(r#"<?php "$a[0] $b[k] $c->d";"#);
        assert_eq!(
            kinds,
            vec![
                TokenKind::OpenTag,
                TokenKind::DoubleQuote,
                TokenKind::Variable,
                TokenKind::LeftBracket,
                TokenKind::NumString,
                TokenKind::RightBracket,
                TokenKind::EncapsedAndWhitespace,
                TokenKind::Variable,
                TokenKind::LeftBracket,
                TokenKind::Identifier,
                TokenKind::RightBracket,
                TokenKind::EncapsedAndWhitespace,
                TokenKind::Variable,
                TokenKind::Arrow,
                TokenKind::Identifier,
                TokenKind::DoubleQuote,
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_dollar_curly_var_name() {
        let kinds = collect_kinds(r#"<?php "${a} ${b . c}";"#);
        assert_eq!(
            kinds,
            vec![
                TokenKind::OpenTag,
                TokenKind::DoubleQuote,
                TokenKind::DollarOpenCurlyBraces,
                TokenKind::StringVarname,
                TokenKind::RightBrace,
                TokenKind::EncapsedAndWhitespace,
                TokenKind::DollarOpenCurlyBraces,
                TokenKind::Identifier,
                TokenKind::Dot,
                TokenKind::Identifier,
                TokenKind::RightBrace,
                TokenKind::DoubleQuote,
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_backtick_command() {
        let kinds = collect_kinds("<?php `ls $dir`;");
        assert_eq!(
            kinds,
            vec![
                TokenKind::OpenTag,
                TokenKind::Backtick,
                TokenKind::EncapsedAndWhitespace,
                TokenKind::Variable,
                TokenKind::Backtick,
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_heredoc_with_interpolation() {
        let texts = collect_texts("<?php <<<EOT\nHi $name\n  EOT;\n");
        assert_eq!(
            texts,
            vec![
                (TokenKind::OpenTag, "<?php ".to_string()),
                (TokenKind::StartHeredoc, "<<<EOT\n".to_string()),
                (TokenKind::EncapsedAndWhitespace, "Hi ".to_string()),
                (TokenKind::Variable, "$name".to_string()),
                (TokenKind::EncapsedAndWhitespace, "\n".to_string()),
                (TokenKind::EndHeredoc, "  EOT".to_string()),
                (TokenKind::Semicolon, ";".to_string()),
            ]
        );
    }

    #[test]
    fn test_nowdoc_is_literal() {
        let texts = collect_texts("<?php <<<'EOT'\n$a {$b}\nEOT;");
        assert_eq!(texts[2], (TokenKind::EncapsedAndWhitespace, "$a {$b}\n".to_string()));
        assert_eq!(texts[3], (TokenKind::EndHeredoc, "EOT".to_string()));
    }

    #[test]
    fn test_empty_heredoc() {
        let kinds = collect_kinds("<?php <<<EOT\nEOT;");
        assert_eq!(
            kinds,
            vec![
                TokenKind::OpenTag,
                TokenKind::StartHeredoc,
                TokenKind::EndHeredoc,
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_heredoc_end_requires_label_boundary() {
        let body = b"line1\nENDextra";
        assert_eq!(heredoc_end_at(body, 6, b"END"), None);
        let body = b"line1\nEND;\n";
        assert_eq!(heredoc_end_at(body, 6, b"END"), Some(6));
        let body = b"x\n\t END";
        assert_eq!(heredoc_end_at(body, 2, b"END"), Some(4));
    }

    #[test]
    fn test_heredoc_label_prefix_is_body_text() {
        let texts = collect_texts("<?php <<<END\nENDING\nEND;");
        assert_eq!(texts[2], (TokenKind::EncapsedAndWhitespace, "ENDING\n".to_string()));
        assert_eq!(texts[3], (TokenKind::EndHeredoc, "END".to_string()));
    }

    #[test]
    fn test_is_escaped() {
        assert!(is_escaped(br#"a\""#, 2));
        assert!(!is_escaped(br#"a\\""#, 3));
        assert!(is_escaped(br#"\\\""#, 3));
        assert!(!is_escaped(br#"""#, 0));
    }

    #[test]
    fn test_unterminated_string_is_reported() {
        let mut lexer = Lexer::new("<?php \"abc $x");
        while lexer.next_token().kind != TokenKind::Eof {}
        assert_eq!(lexer.errors.len(), 1);
        assert_eq!(lexer.errors[0].message, "Unterminated string");
        assert_eq!(lexer.mode(), Mode::Php);
    }

    #[test]
    fn test_unterminated_comment_is_reported() {
        let mut lexer = Lexer::new("<?php /* open");
        let token = lexer.next_token();
        assert_eq!(token.kind, TokenKind::OpenTag);
        assert_eq!(lexer.next_token().kind, TokenKind::Eof);
        assert_eq!(lexer.errors[0].message, "Unterminated comment");
    }

    #[test]
    fn test_bad_character_keeps_going() {
        let kinds = collect_kinds("<?php \u{1}$a");
        assert_eq!(
            kinds,
            vec![
                TokenKind::OpenTag,
                TokenKind::BadCharacter,
                TokenKind::Variable,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_invalid_numeric_literal() {
        let mut lexer = Lexer::new("<?php 1__0;");
        lexer.next_token();
        let token = lexer.next_token();
        assert_eq!(token.kind, TokenKind::InvalidNumericLiteral);
        assert_eq!(lexer.token_text(&token), "1__0");
        assert_eq!(lexer.errors.len(), 1);
    }

    #[test]
    fn test_open_tag_takes_one_whitespace() {
        let tokens = collect_texts("<?php  $a");
        assert_eq!(tokens[0], (TokenKind::OpenTag, "<?php ".to_string()));
        let tokens = collect_texts("<?php\r\n\r\n$a");
        assert_eq!(tokens[0], (TokenKind::OpenTag, "<?php\r\n".to_string()));
        let tokens = collect_texts("<?php\r$a");
        assert_eq!(tokens[0], (TokenKind::OpenTag, "<?php\r".to_string()));
        let tokens = collect_texts("<?php");
        assert_eq!(tokens[0], (TokenKind::OpenTag, "<?php".to_string()));
        let tokens = collect_tokens("<?php\n$a");
        assert!(tokens[1].free_floating.is_empty());
    }

    #[test]
    fn test_positions_track_lines() {
        let tokens = collect_tokens("<?php\n$a =\n  1;");
        assert_eq!(tokens[1].position, Position::new(2, 2, 6, 8));
        assert_eq!(tokens[3].position, Position::new(3, 3, 13, 14));
    }

    #[test]
    fn test_round_trip_reproduces_source() {
        let sources = [
            "<?php $x = 42;",
            "<html>\n<?php // hi\necho \"a {$b[1]} c\"; ?>\n</html>",
            "<?php\n$s = <<<EOT\n  x $y\n  EOT;\n# done\n",
            "#!/bin/php\n<?php `ls` /* x */;",
            "<?php \"unterminated $x",
            "<?php $a = '\\'';\t\r\n",
        ];
        for source in sources {
            assert_eq!(round_trip(source), source);
        }
    }

    #[test]
    fn test_recycle_returns_buffers() {
        let mut lexer = Lexer::new("<?php  $a  $b");
        lexer.next_token();
        let token = lexer.next_token();
        assert!(!token.free_floating.is_empty());
        assert!(lexer.pool().is_empty());
        lexer.recycle(token);
        assert_eq!(lexer.pool().len(), 1);
        let token = lexer.next_token();
        assert_eq!(token.free_floating.len(), 1);
        assert!(lexer.pool().is_empty());
    }

    #[test]
    fn test_empty_source() {
        let tokens = collect_kinds("");
        assert_eq!(tokens, vec![TokenKind::Eof]);
    }

    #[test]
    fn test_only_inline_html() {
        let tokens = collect_kinds("<html><body>Hello</body></html>");
        assert_eq!(tokens, vec![TokenKind::InlineHtml, TokenKind::Eof]);
    }

    #[test]
    fn test_halt_returns_raw_rest() {
        let mut lexer = Lexer::new("<?php __halt_compiler(); \x00\x01 \"open");
        let mut kinds = Vec::new();
        loop {
            let token = lexer.next_token();
            kinds.push(token.kind);
            if token.kind == TokenKind::Semicolon {
                break;
            }
        }
        assert_eq!(kinds.last(), Some(&TokenKind::Semicolon));
        let (rest, position) = lexer.halt();
        assert_eq!(rest, " \x00\x01 \"open");
        assert_eq!(position.start_offset, 24);
        assert_eq!(lexer.next_token().kind, TokenKind::Eof);
        assert!(lexer.errors.is_empty());
    }
}
