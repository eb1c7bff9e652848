use logos::Logos;

fn lex_single_quoted_string(lex: &mut logos::Lexer<TokenKind>) -> bool {
    let remainder = lex.remainder();
    let mut chars = remainder.chars();
    loop {
        match chars.next() {
            Some('\\') => {
                chars.next();
            }
            Some('\'') => {
                let consumed = remainder.len() - chars.as_str().len();
                lex.bump(consumed);
                return true;
            }
            Some(_) => {}
            None => return false,
        }
    }
}

/// `//` and `#` comments run to the end of the line or to a `?>`, whichever
/// comes first. The line break itself is left for the whitespace token.
fn lex_line_comment(lex: &mut logos::Lexer<TokenKind>) -> bool {
    let rest = lex.remainder().as_bytes();
    let mut end = rest.len();
    let mut from = 0;
    while let Some(i) = memchr::memchr3(b'\n', b'\r', b'?', &rest[from..]) {
        let at = from + i;
        if rest[at] != b'?' || rest.get(at + 1) == Some(&b'>') {
            end = at;
            break;
        }
        from = at + 1;
    }
    lex.bump(end);
    true
}

/// Block comments close at the first `*/` after the opening `/*`. An
/// unclosed comment swallows the rest of the input; the lexer reports it.
fn lex_block_comment(lex: &mut logos::Lexer<TokenKind>) -> bool {
    let span = lex.span();
    let body_start = span.start + 2;
    let source = lex.source();
    let end = match memchr::memmem::find(&source.as_bytes()[body_start..], b"*/") {
        Some(i) => body_start + i + 2,
        None => source.len(),
    };
    lex.bump(end.saturating_sub(span.end));
    true
}

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // --- Trivia ---
    #[regex(r"[ \t\r\n\x0C]+")]
    Whitespace,

    #[token("//", lex_line_comment)]
    #[token("#", lex_line_comment)]
    #[token("/*", lex_block_comment)]
    Comment,

    /// Never produced by the scanner itself: a `/*` comment is promoted by
    /// [`TokenKind::classify_comment`] once its full text is known.
    DocComment,

    // --- Literals ---
    // Float: scientific notation (with or without decimal)
    #[regex(
        r"[0-9](_?[0-9])*(\.[0-9](_?[0-9])*)?[eE][+-]?[0-9](_?[0-9])*",
        priority = 5
    )]
    FloatLiteral,

    #[regex(r"[0-9](_?[0-9])*\.([0-9](_?[0-9])*)?", priority = 4)]
    FloatLiteralSimple,

    #[regex(r"\.[0-9](_?[0-9])*([eE][+-]?[0-9](_?[0-9])*)?", priority = 4)]
    FloatLiteralLeadingDot,

    #[regex(r"0[xX][0-9a-fA-F](_?[0-9a-fA-F])*")]
    HexIntLiteral,

    #[regex(r"0[bB][01](_?[01])*")]
    BinIntLiteral,

    #[regex(r"0[0-7]+", priority = 3)]
    OctIntLiteral,

    #[regex(r"[0-9](_?[0-9])*", priority = 1)]
    IntLiteral,

    /// A single-quoted string, or a double-quoted one without interpolation.
    #[regex(r"[bB]?'", lex_single_quoted_string)]
    ConstantEncapsedString,

    // --- Variables ---
    #[regex(r"\$[a-zA-Z_\x{80}-\x{10FFFF}][a-zA-Z0-9_\x{80}-\x{10FFFF}]*")]
    Variable,
    #[token("$")]
    Dollar,

    // --- Identifiers (keywords resolved from these) ---
    #[regex(r"[a-zA-Z_\x{80}-\x{10FFFF}][a-zA-Z0-9_\x{80}-\x{10FFFF}]*")]
    Identifier,

    // --- Operators ---
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("**")]
    StarStar,
    #[token(".")]
    Dot,

    #[token("=")]
    Equals,
    #[token("+=")]
    PlusEquals,
    #[token("-=")]
    MinusEquals,
    #[token("*=")]
    StarEquals,
    #[token("/=")]
    SlashEquals,
    #[token("%=")]
    PercentEquals,
    #[token("**=")]
    StarStarEquals,
    #[token(".=")]
    DotEquals,
    #[token("&=")]
    AmpersandEquals,
    #[token("|=")]
    PipeEquals,
    #[token("^=")]
    CaretEquals,
    #[token("<<=")]
    ShiftLeftEquals,
    #[token(">>=")]
    ShiftRightEquals,
    #[token("??=")]
    CoalesceEquals,

    #[token("==")]
    EqualsEquals,
    #[token("!=")]
    #[token("<>")]
    BangEquals,
    #[token("===")]
    EqualsEqualsEquals,
    #[token("!==")]
    BangEqualsEquals,
    #[token("<")]
    LessThan,
    #[token(">")]
    GreaterThan,
    #[token("<=")]
    LessThanEquals,
    #[token(">=")]
    GreaterThanEquals,
    #[token("<=>")]
    Spaceship,

    #[token("&&")]
    AmpersandAmpersand,
    #[token("||")]
    PipePipe,
    #[token("!")]
    Bang,

    #[token("&")]
    Ampersand,
    #[token("|")]
    Pipe,
    #[token("^")]
    Caret,
    #[token("~")]
    Tilde,
    #[token("<<")]
    ShiftLeft,
    #[token(">>")]
    ShiftRight,

    #[token("++")]
    PlusPlus,
    #[token("--")]
    MinusMinus,

    #[token("?")]
    Question,
    #[token("??")]
    QuestionQuestion,
    #[token(":")]
    Colon,

    #[token("=>")]
    FatArrow,

    // --- Delimiters ---
    #[token("(")]
    LeftParen,
    #[token(")")]
    RightParen,
    #[token("[")]
    LeftBracket,
    #[token("]")]
    RightBracket,
    #[token("{")]
    LeftBrace,
    #[token("}")]
    RightBrace,
    #[token(";")]
    Semicolon,
    #[token(",")]
    Comma,

    #[token("::")]
    DoubleColon,

    #[token("->")]
    Arrow,

    #[token("\\")]
    Backslash,

    #[token("@")]
    At,

    #[token("...")]
    Ellipsis,

    // --- Keywords (not matched by Logos directly, resolved from Identifier) ---
    If,
    Else,
    ElseIf,
    While,
    Do,
    For,
    Foreach,
    As,
    Function,
    Return,
    Echo,
    Print,
    And,
    Or,
    Xor,
    Break,
    Continue,
    Switch,
    Case,
    Default,
    EndIf,
    EndWhile,
    EndFor,
    EndForeach,
    Throw,
    Try,
    Catch,
    Finally,
    Instanceof,
    Insteadof,
    Array,
    List,
    Goto,
    Declare,
    Unset,
    Global,
    EndDeclare,
    EndSwitch,
    Isset,
    Empty,
    Include,
    IncludeOnce,
    Require,
    RequireOnce,
    Eval,
    Exit,
    Die,
    Clone,
    New,
    Class,
    Abstract,
    Final,
    Interface,
    Trait,
    Extends,
    Implements,
    Public,
    Protected,
    Private,
    Static,
    Var,
    Const,
    Fn_,
    Namespace,
    Use,
    Yield_,
    MagicClass,
    MagicDir,
    MagicFile,
    MagicFunction,
    MagicLine,
    MagicMethod,
    MagicNamespace,
    MagicTrait,
    HaltCompiler,

    // --- Produced by the Lexer wrapper, not by Logos ---
    /// `<?php`
    OpenTag,
    /// `<?=`
    OpenTagWithEcho,
    /// `?>`, including one directly following line break.
    #[token("?>")]
    CloseTag,
    InlineHtml,

    /// Opening `"` of an interpolated string, and its closing `"`.
    DoubleQuote,
    /// Opening and closing `` ` `` of a shell command.
    Backtick,
    /// Literal text inside an interpolated string, shell command or heredoc.
    EncapsedAndWhitespace,
    /// `{` directly followed by `$` inside a string.
    CurlyOpen,
    /// `${` inside a string.
    DollarOpenCurlyBraces,
    /// The bare variable name of `"${name}"` and `"${name[...]}"`.
    StringVarname,
    /// An integer offset inside `"$a[0]"`.
    NumString,
    /// `<<<LABEL` up to and including the line break.
    StartHeredoc,
    /// The closing heredoc label, including its indentation.
    EndHeredoc,

    /// A numeric literal with a misplaced `_` separator.
    InvalidNumericLiteral,
    /// A byte that starts no token.
    BadCharacter,

    Eof,
}

macro_rules! keywords {
    ($($kind:ident => $text:literal),* $(,)?) => {
        /// The keyword spelled `text`, compared case-insensitively. `None`
        /// for plain identifiers, including `true`, `null` and `self`.
        pub fn resolve_keyword(text: &str) -> Option<TokenKind> {
            $(
                if text.eq_ignore_ascii_case($text) {
                    return Some(TokenKind::$kind);
                }
            )*
            None
        }

        fn keyword_text(kind: TokenKind) -> Option<&'static str> {
            match kind {
                $(TokenKind::$kind => Some($text),)*
                _ => None,
            }
        }
    };
}

keywords! {
    Abstract => "abstract",
    And => "and",
    Array => "array",
    As => "as",
    Break => "break",
    Case => "case",
    Catch => "catch",
    Class => "class",
    Clone => "clone",
    Const => "const",
    Continue => "continue",
    Declare => "declare",
    Default => "default",
    Die => "die",
    Do => "do",
    Echo => "echo",
    Else => "else",
    ElseIf => "elseif",
    Empty => "empty",
    EndDeclare => "enddeclare",
    EndFor => "endfor",
    EndForeach => "endforeach",
    EndIf => "endif",
    EndSwitch => "endswitch",
    EndWhile => "endwhile",
    Eval => "eval",
    Exit => "exit",
    Extends => "extends",
    Final => "final",
    Finally => "finally",
    Fn_ => "fn",
    For => "for",
    Foreach => "foreach",
    Function => "function",
    Global => "global",
    Goto => "goto",
    HaltCompiler => "__halt_compiler",
    If => "if",
    Implements => "implements",
    Include => "include",
    IncludeOnce => "include_once",
    Instanceof => "instanceof",
    Insteadof => "insteadof",
    Interface => "interface",
    Isset => "isset",
    List => "list",
    MagicClass => "__CLASS__",
    MagicDir => "__DIR__",
    MagicFile => "__FILE__",
    MagicFunction => "__FUNCTION__",
    MagicLine => "__LINE__",
    MagicMethod => "__METHOD__",
    MagicNamespace => "__NAMESPACE__",
    MagicTrait => "__TRAIT__",
    Namespace => "namespace",
    New => "new",
    Or => "or",
    Print => "print",
    Private => "private",
    Protected => "protected",
    Public => "public",
    Require => "require",
    RequireOnce => "require_once",
    Return => "return",
    Static => "static",
    Switch => "switch",
    Throw => "throw",
    Trait => "trait",
    Try => "try",
    Unset => "unset",
    Use => "use",
    Var => "var",
    While => "while",
    Xor => "xor",
    Yield_ => "yield",
}

impl TokenKind {
    pub fn is_assignment_op(&self) -> bool {
        matches!(
            self,
            TokenKind::Equals
                | TokenKind::PlusEquals
                | TokenKind::MinusEquals
                | TokenKind::StarEquals
                | TokenKind::SlashEquals
                | TokenKind::PercentEquals
                | TokenKind::StarStarEquals
                | TokenKind::DotEquals
                | TokenKind::AmpersandEquals
                | TokenKind::PipeEquals
                | TokenKind::CaretEquals
                | TokenKind::ShiftLeftEquals
                | TokenKind::ShiftRightEquals
                | TokenKind::CoalesceEquals
        )
    }

    /// `/**` followed by whitespace opens a doc comment. `/**/` stays a plain
    /// comment.
    pub fn classify_comment(text: &str) -> TokenKind {
        let bytes = text.as_bytes();
        if bytes.starts_with(b"/**")
            && matches!(bytes.get(3), Some(b' ' | b'\t' | b'\r' | b'\n'))
        {
            TokenKind::DocComment
        } else {
            TokenKind::Comment
        }
    }

    /// Whitespace and comments: collected as trivia, never handed to the parser.
    pub fn is_trivia(&self) -> bool {
        matches!(
            self,
            TokenKind::Whitespace | TokenKind::Comment | TokenKind::DocComment
        )
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            TokenKind::IntLiteral
                | TokenKind::HexIntLiteral
                | TokenKind::BinIntLiteral
                | TokenKind::OctIntLiteral
                | TokenKind::FloatLiteral
                | TokenKind::FloatLiteralSimple
                | TokenKind::FloatLiteralLeadingDot
        )
    }

    /// Source spelling of tokens that are always written the same way.
    pub fn fixed_text(self) -> Option<&'static str> {
        let text = match self {
            TokenKind::Dollar => "$",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Star => "*",
            TokenKind::Slash => "/",
            TokenKind::Percent => "%",
            TokenKind::StarStar => "**",
            TokenKind::Dot => ".",
            TokenKind::Equals => "=",
            TokenKind::PlusEquals => "+=",
            TokenKind::MinusEquals => "-=",
            TokenKind::StarEquals => "*=",
            TokenKind::SlashEquals => "/=",
            TokenKind::PercentEquals => "%=",
            TokenKind::StarStarEquals => "**=",
            TokenKind::DotEquals => ".=",
            TokenKind::AmpersandEquals => "&=",
            TokenKind::PipeEquals => "|=",
            TokenKind::CaretEquals => "^=",
            TokenKind::ShiftLeftEquals => "<<=",
            TokenKind::ShiftRightEquals => ">>=",
            TokenKind::CoalesceEquals => "??=",
            TokenKind::EqualsEquals => "==",
            TokenKind::BangEquals => "!=",
            TokenKind::EqualsEqualsEquals => "===",
            TokenKind::BangEqualsEquals => "!==",
            TokenKind::LessThan => "<",
            TokenKind::GreaterThan => ">",
            TokenKind::LessThanEquals => "<=",
            TokenKind::GreaterThanEquals => ">=",
            TokenKind::Spaceship => "<=>",
            TokenKind::AmpersandAmpersand => "&&",
            TokenKind::PipePipe => "||",
            TokenKind::Bang => "!",
            TokenKind::Ampersand => "&",
            TokenKind::Pipe => "|",
            TokenKind::Caret => "^",
            TokenKind::Tilde => "~",
            TokenKind::ShiftLeft => "<<",
            TokenKind::ShiftRight => ">>",
            TokenKind::PlusPlus => "++",
            TokenKind::MinusMinus => "--",
            TokenKind::Question => "?",
            TokenKind::QuestionQuestion => "??",
            TokenKind::Colon => ":",
            TokenKind::FatArrow => "=>",
            TokenKind::LeftParen => "(",
            TokenKind::RightParen => ")",
            TokenKind::LeftBracket => "[",
            TokenKind::RightBracket => "]",
            TokenKind::LeftBrace => "{",
            TokenKind::RightBrace => "}",
            TokenKind::Semicolon => ";",
            TokenKind::Comma => ",",
            TokenKind::DoubleColon => "::",
            TokenKind::Arrow => "->",
            TokenKind::Backslash => "\\",
            TokenKind::At => "@",
            TokenKind::Ellipsis => "...",
            TokenKind::OpenTag => "<?php",
            TokenKind::OpenTagWithEcho => "<?=",
            TokenKind::CloseTag => "?>",
            TokenKind::DoubleQuote => "\"",
            TokenKind::Backtick => "`",
            TokenKind::CurlyOpen => "{$",
            TokenKind::DollarOpenCurlyBraces => "${",
            kind => return keyword_text(kind),
        };
        Some(text)
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(text) = self.fixed_text() {
            return write!(f, "'{text}'");
        }
        let description = match self {
            TokenKind::Whitespace => "whitespace",
            TokenKind::Comment => "comment",
            TokenKind::DocComment => "doc comment",
            TokenKind::IntLiteral => "integer",
            TokenKind::HexIntLiteral => "hex integer",
            TokenKind::BinIntLiteral => "binary integer",
            TokenKind::OctIntLiteral => "octal integer",
            TokenKind::FloatLiteral
            | TokenKind::FloatLiteralSimple
            | TokenKind::FloatLiteralLeadingDot => "float",
            TokenKind::ConstantEncapsedString => "string",
            TokenKind::Variable => "variable",
            TokenKind::Identifier => "identifier",
            TokenKind::InlineHtml => "inline HTML",
            TokenKind::EncapsedAndWhitespace => "string content",
            TokenKind::StringVarname => "variable name",
            TokenKind::NumString => "number",
            TokenKind::StartHeredoc => "heredoc start",
            TokenKind::EndHeredoc => "heredoc end",
            TokenKind::InvalidNumericLiteral => "invalid numeric literal",
            TokenKind::BadCharacter => "unexpected character",
            TokenKind::Eof => "end of file",
            _ => "token",
        };
        f.write_str(description)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_keyword() {
        assert_eq!(resolve_keyword("if"), Some(TokenKind::If));
        assert_eq!(resolve_keyword("IF"), Some(TokenKind::If));
        assert_eq!(resolve_keyword("If"), Some(TokenKind::If));
        assert_eq!(resolve_keyword("function"), Some(TokenKind::Function));
        assert_eq!(resolve_keyword("insteadof"), Some(TokenKind::Insteadof));
        assert_eq!(resolve_keyword("myFunc"), None);
        // constants and builtin types stay plain names
        assert_eq!(resolve_keyword("true"), None);
        assert_eq!(resolve_keyword("null"), None);
        assert_eq!(resolve_keyword("self"), None);
    }

    #[test]
    fn test_display_uses_fixed_text() {
        assert_eq!(TokenKind::LeftBrace.to_string(), "'{'");
        assert_eq!(TokenKind::EndIf.to_string(), "'endif'");
        assert_eq!(TokenKind::MagicClass.to_string(), "'__CLASS__'");
        assert_eq!(TokenKind::Variable.to_string(), "variable");
        assert_eq!(resolve_keyword("__class__"), Some(TokenKind::MagicClass));
        assert_eq!(TokenKind::Identifier.fixed_text(), None);
    }

    #[test]
    fn test_is_assignment_op() {
        assert!(TokenKind::Equals.is_assignment_op());
        assert!(TokenKind::PlusEquals.is_assignment_op());
        assert!(TokenKind::DotEquals.is_assignment_op());
        assert!(!TokenKind::Plus.is_assignment_op());
        assert!(!TokenKind::EqualsEquals.is_assignment_op());
    }

    #[test]
    fn test_scan_basic_tokens() {
        let mut lex = TokenKind::lexer("+-*/%**.");
        assert_eq!(lex.next(), Some(Ok(TokenKind::Plus)));
        assert_eq!(lex.next(), Some(Ok(TokenKind::Minus)));
        assert_eq!(lex.next(), Some(Ok(TokenKind::Star)));
        assert_eq!(lex.next(), Some(Ok(TokenKind::Slash)));
        assert_eq!(lex.next(), Some(Ok(TokenKind::Percent)));
        assert_eq!(lex.next(), Some(Ok(TokenKind::StarStar)));
        assert_eq!(lex.next(), Some(Ok(TokenKind::Dot)));
        assert_eq!(lex.next(), None);
    }

    #[test]
    fn test_scan_integers() {
        let mut lex = TokenKind::lexer("42 0xFF 0b1010 077");
        assert_eq!(lex.next(), Some(Ok(TokenKind::IntLiteral)));
        assert_eq!(lex.slice(), "42");
        assert_eq!(lex.next(), Some(Ok(TokenKind::Whitespace)));
        assert_eq!(lex.next(), Some(Ok(TokenKind::HexIntLiteral)));
        assert_eq!(lex.slice(), "0xFF");
        assert_eq!(lex.next(), Some(Ok(TokenKind::Whitespace)));
        assert_eq!(lex.next(), Some(Ok(TokenKind::BinIntLiteral)));
        assert_eq!(lex.slice(), "0b1010");
        assert_eq!(lex.next(), Some(Ok(TokenKind::Whitespace)));
        assert_eq!(lex.next(), Some(Ok(TokenKind::OctIntLiteral)));
        assert_eq!(lex.slice(), "077");
    }

    #[test]
    fn test_scan_floats() {
        let mut lex = TokenKind::lexer("3.14 1e10");
        assert_eq!(lex.next(), Some(Ok(TokenKind::FloatLiteralSimple)));
        assert_eq!(lex.slice(), "3.14");
        assert_eq!(lex.next(), Some(Ok(TokenKind::Whitespace)));
        assert_eq!(lex.next(), Some(Ok(TokenKind::FloatLiteral)));
        assert_eq!(lex.slice(), "1e10");
    }

    #[test]
    fn test_scan_single_quoted() {
        let mut lex = TokenKind::lexer(r"'it\'s'");
        assert_eq!(lex.next(), Some(Ok(TokenKind::ConstantEncapsedString)));
        assert_eq!(lex.slice(), r"'it\'s'");
        let mut lex = TokenKind::lexer("'open");
        assert_eq!(lex.next(), Some(Err(())));
    }

    #[test]
    fn test_scan_comments_are_tokens() {
        let mut lex = TokenKind::lexer("// line\n# hash ?>/* block */ /** doc */");
        assert_eq!(lex.next(), Some(Ok(TokenKind::Comment)));
        assert_eq!(lex.slice(), "// line");
        assert_eq!(lex.next(), Some(Ok(TokenKind::Whitespace)));
        assert_eq!(lex.next(), Some(Ok(TokenKind::Comment)));
        assert_eq!(lex.slice(), "# hash ");
        assert_eq!(lex.next(), Some(Ok(TokenKind::CloseTag)));
        assert_eq!(lex.next(), Some(Ok(TokenKind::Comment)));
        assert_eq!(lex.slice(), "/* block */");
        assert_eq!(lex.next(), Some(Ok(TokenKind::Whitespace)));
        assert_eq!(lex.next(), Some(Ok(TokenKind::Comment)));
        assert_eq!(lex.slice(), "/** doc */");
        assert_eq!(
            TokenKind::classify_comment(lex.slice()),
            TokenKind::DocComment
        );
    }

    #[test]
    fn test_scan_short_block_comments() {
        let mut lex = TokenKind::lexer("/**/");
        assert_eq!(lex.next(), Some(Ok(TokenKind::Comment)));
        assert_eq!(lex.slice(), "/**/");
        let mut lex = TokenKind::lexer("/***/x");
        assert_eq!(lex.next(), Some(Ok(TokenKind::Comment)));
        assert_eq!(lex.slice(), "/***/");
        let mut lex = TokenKind::lexer("/*/ x");
        assert_eq!(lex.next(), Some(Ok(TokenKind::Comment)));
        assert_eq!(lex.slice(), "/*/ x");
        assert_eq!(TokenKind::classify_comment("/**/"), TokenKind::Comment);
        assert_eq!(TokenKind::classify_comment("/***/"), TokenKind::Comment);
    }

    #[test]
    fn test_scan_variable() {
        let mut lex = TokenKind::lexer("$x $_foo");
        assert_eq!(lex.next(), Some(Ok(TokenKind::Variable)));
        assert_eq!(lex.slice(), "$x");
        assert_eq!(lex.next(), Some(Ok(TokenKind::Whitespace)));
        assert_eq!(lex.next(), Some(Ok(TokenKind::Variable)));
        assert_eq!(lex.slice(), "$_foo");
    }
}
