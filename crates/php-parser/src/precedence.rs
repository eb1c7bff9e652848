//! Binding powers for the Pratt loop in [`crate::expr`]. Higher binds tighter.

use php_lexer::TokenKind;

/// Right-hand binding power of `=` and the compound assignments.
pub const ASSIGNMENT_BP: u8 = 8;

/// Left binding power of `? :` and `?:`.
pub const TERNARY_BP: u8 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Assoc {
    Left,
    Right,
}

/// Precedence level of a binary operator. Equality and comparison are
/// non-associative in PHP and are parsed as left-associative.
fn infix_level(kind: &TokenKind) -> Option<(u8, Assoc)> {
    use Assoc::{Left, Right};

    let level = match kind {
        TokenKind::Or => (1, Left),
        TokenKind::Xor => (3, Left),
        TokenKind::And => (5, Left),
        // assignment (8) and ternary (10) sit here
        TokenKind::QuestionQuestion => (13, Right),
        TokenKind::PipePipe => (15, Left),
        TokenKind::AmpersandAmpersand => (17, Left),
        TokenKind::Pipe => (19, Left),
        TokenKind::Caret => (21, Left),
        TokenKind::Ampersand => (23, Left),
        TokenKind::EqualsEquals
        | TokenKind::BangEquals
        | TokenKind::EqualsEqualsEquals
        | TokenKind::BangEqualsEquals
        | TokenKind::Spaceship => (25, Left),
        TokenKind::LessThan
        | TokenKind::LessThanEquals
        | TokenKind::GreaterThan
        | TokenKind::GreaterThanEquals => (27, Left),
        TokenKind::Dot => (31, Left),
        TokenKind::ShiftLeft | TokenKind::ShiftRight => (33, Left),
        TokenKind::Plus | TokenKind::Minus => (35, Left),
        TokenKind::Star | TokenKind::Slash | TokenKind::Percent => (37, Left),
        TokenKind::StarStar => (39, Right),
        // above `!`, so `!$a instanceof B` is `!($a instanceof B)`
        TokenKind::Instanceof => (42, Left),
        _ => return None,
    };
    Some(level)
}

/// `(left_bp, right_bp)` of a binary operator.
pub fn infix_binding_power(kind: &TokenKind) -> Option<(u8, u8)> {
    infix_level(kind).map(|(level, assoc)| match assoc {
        Assoc::Left => (level, level + 1),
        Assoc::Right => (level + 1, level),
    })
}

/// Right binding power of a prefix operator.
pub fn prefix_binding_power(kind: &TokenKind) -> Option<u8> {
    match kind {
        // below `**`: `-$a ** 2` is `-($a ** 2)`
        TokenKind::Minus | TokenKind::Plus => Some(39),
        TokenKind::Bang | TokenKind::Tilde | TokenKind::PlusPlus | TokenKind::MinusMinus => Some(41),
        _ => None,
    }
}

/// Left binding power of `$a++` and `$a--`.
pub fn postfix_binding_power(kind: &TokenKind) -> Option<u8> {
    match kind {
        TokenKind::PlusPlus | TokenKind::MinusMinus => Some(43),
        _ => None,
    }
}
