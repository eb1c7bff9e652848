pub mod token;
pub mod lexer;
pub mod escape;

pub use token::TokenKind;
pub use escape::{split_literal, unescape, EscapeError, Quote};
pub use lexer::{Lexer, LexerConfig, LexerError, Mode, Token, TokenPool};
