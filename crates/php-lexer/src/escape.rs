//! Escape sequences of PHP string literals.
//!
//! Values are `String`s, so a byte produced by an octal or hex escape maps to
//! the code point of the same number: `"\xe9"` reads as `é`.

use thiserror::Error;

/// How a string body was delimited. The delimiter decides which escapes are
/// honoured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quote {
    Single,
    Double,
    Backtick,
    Heredoc,
    Nowdoc,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EscapeError {
    #[error("missing closing '}}' for UTF-8 codepoint escape")]
    UnclosedCodepoint { offset: usize },

    #[error("invalid UTF-8 codepoint escape sequence {sequence}")]
    InvalidCodepoint { sequence: String, offset: usize },

    #[error("octal escape sequence overflow {sequence} is greater than \\377")]
    OctalOverflow { sequence: String, offset: usize },
}

impl EscapeError {
    /// Byte offset of the offending `\` in the body.
    pub fn offset(&self) -> usize {
        match self {
            EscapeError::UnclosedCodepoint { offset }
            | EscapeError::InvalidCodepoint { offset, .. }
            | EscapeError::OctalOverflow { offset, .. } => *offset,
        }
    }
}

/// Split a quoted literal such as `'a'`, `"a"` or `b"a"` into its body and
/// quote style. Returns `None` for text that is not quoted, e.g. the bare
/// offset of `"$a[key]"`.
pub fn split_literal(text: &str) -> Option<(&str, Quote)> {
    let text = text.strip_prefix(['b', 'B']).unwrap_or(text);
    let quote = match text.as_bytes().first()? {
        b'\'' => Quote::Single,
        b'"' => Quote::Double,
        _ => return None,
    };
    if text.len() < 2 || !text.ends_with(&text[..1]) {
        return None;
    }
    Some((&text[1..text.len() - 1], quote))
}

/// The value of a string body. `\` sequences that mean nothing for `quote`
/// are kept as written.
pub fn unescape(body: &str, quote: Quote) -> Result<String, EscapeError> {
    if quote == Quote::Nowdoc || memchr::memchr(b'\\', body.as_bytes()).is_none() {
        return Ok(body.to_string());
    }
    match quote {
        Quote::Single => Ok(unescape_single(body)),
        _ => unescape_double(body, quote),
    }
}

fn unescape_single(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.clone().next() {
            Some(next @ ('\\' | '\'')) => {
                out.push(next);
                chars.next();
            }
            _ => out.push('\\'),
        }
    }
    out
}

fn unescape_double(body: &str, quote: Quote) -> Result<String, EscapeError> {
    let bytes = body.as_bytes();
    let mut out = String::with_capacity(body.len());
    let mut i = 0;

    while i < bytes.len() {
        let Some(at) = memchr::memchr(b'\\', &bytes[i..]) else {
            out.push_str(&body[i..]);
            break;
        };
        out.push_str(&body[i..i + at]);
        i += at;

        let Some(&next) = bytes.get(i + 1) else {
            out.push('\\');
            break;
        };
        let simple = match next {
            b'n' => Some('\n'),
            b'r' => Some('\r'),
            b't' => Some('\t'),
            b'v' => Some('\x0B'),
            b'e' => Some('\x1B'),
            b'f' => Some('\x0C'),
            b'\\' => Some('\\'),
            b'$' => Some('$'),
            b'"' if quote == Quote::Double => Some('"'),
            b'`' if quote == Quote::Backtick => Some('`'),
            _ => None,
        };
        if let Some(c) = simple {
            out.push(c);
            i += 2;
            continue;
        }

        match next {
            b'u' if bytes.get(i + 2) == Some(&b'{') => {
                let (c, len) = codepoint(body, i)?;
                out.push(c);
                i += len;
            }
            b'0'..=b'7' => {
                let digits = bytes[i + 1..]
                    .iter()
                    .take(3)
                    .take_while(|b| matches!(b, b'0'..=b'7'))
                    .count();
                let sequence = &body[i..i + 1 + digits];
                let value = u32::from_str_radix(&sequence[1..], 8).unwrap_or(0);
                let byte = u8::try_from(value).map_err(|_| EscapeError::OctalOverflow {
                    sequence: sequence.to_string(),
                    offset: i,
                })?;
                out.push(char::from(byte));
                i += 1 + digits;
            }
            b'x' | b'X' => {
                let digits = bytes[i + 2..]
                    .iter()
                    .take(2)
                    .take_while(|b| b.is_ascii_hexdigit())
                    .count();
                match u8::from_str_radix(&body[i + 2..i + 2 + digits], 16) {
                    Ok(byte) if digits > 0 => out.push(char::from(byte)),
                    _ => out.push_str(&body[i..i + 2 + digits]),
                }
                i += 2 + digits;
            }
            _ => {
                // Unknown escape: both characters stay.
                out.push('\\');
                i += 1;
            }
        }
    }

    Ok(out)
}

/// Decode `\u{...}` starting at the `\` at `at`. Returns the character and the
/// length of the whole sequence.
fn codepoint(body: &str, at: usize) -> Result<(char, usize), EscapeError> {
    let digits_start = at + 3;
    let Some(close) = body[digits_start..].find('}') else {
        return Err(EscapeError::UnclosedCodepoint { offset: at });
    };
    let digits = &body[digits_start..digits_start + close];
    let sequence_len = 3 + close + 1;
    let invalid = || EscapeError::InvalidCodepoint {
        sequence: body[at..at + sequence_len].to_string(),
        offset: at,
    };

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(invalid());
    }
    let value = u32::from_str_radix(digits, 16).map_err(|_| invalid())?;
    let c = char::from_u32(value).ok_or_else(invalid)?;
    Ok((c, sequence_len))
}
