use php_ast::*;
use php_lexer::{split_literal, unescape, Quote, TokenKind};

use crate::diagnostics::ParseError;
use crate::parser::{Parser, MAX_DEPTH};
use crate::precedence::{self, ASSIGNMENT_BP, TERNARY_BP};
use crate::stmt;
use crate::Dialect;

/// Binding power of `->`, `::`, `[`, `{` and `(` after an expression.
const POSTFIX_BP: u8 = 44;

/// Right binding power of casts and `@`.
const CAST_BP: u8 = 41;

/// Right binding power of `print`, `yield` and `include`: everything but
/// `and`, `or` and `xor`.
const LOW_PREFIX_BP: u8 = 7;

#[derive(Debug, Clone, Copy)]
enum CastKind {
    Int,
    Double,
    String,
    Bool,
    Array,
    Object,
    Unset,
}

/// Cast keyword strings and their CastKind values
const CAST_KEYWORDS: &[(&str, CastKind)] = &[
    ("int", CastKind::Int),
    ("integer", CastKind::Int),
    ("float", CastKind::Double),
    ("double", CastKind::Double),
    ("real", CastKind::Double),
    ("string", CastKind::String),
    ("binary", CastKind::String),
    ("bool", CastKind::Bool),
    ("boolean", CastKind::Bool),
    ("array", CastKind::Array),
    ("object", CastKind::Object),
    ("unset", CastKind::Unset),
];

fn cast_kind(text: &str) -> Option<CastKind> {
    CAST_KEYWORDS
        .iter()
        .find(|(keyword, _)| text.eq_ignore_ascii_case(keyword))
        .map(|(_, kind)| *kind)
}

/// Leading trivia of `child` becomes the leading trivia of the node wrapping it.
pub(crate) fn hoist_start(child: &mut Node) -> Collection {
    let mut free_floating = Collection::new();
    free_floating.set(Key::Start, child.free_floating_mut().take(Key::Start));
    free_floating
}

/// Parse an expression.
pub fn parse_expr(parser: &mut Parser) -> Node {
    parse_expr_bp(parser, 0)
}

/// Pratt expression parser. Parses expressions with binding power >= min_bp.
pub fn parse_expr_bp(parser: &mut Parser, min_bp: u8) -> Node {
    if parser.depth >= MAX_DEPTH {
        return parser.skip_too_deep(false);
    }
    parser.depth += 1;
    let node = parse_expr_loop(parser, min_bp);
    parser.depth -= 1;
    node
}

fn parse_expr_loop(parser: &mut Parser, min_bp: u8) -> Node {
    let start = parser.start();
    let mut lhs = parse_atom(parser);

    loop {
        let kind = parser.current_kind();

        // Check for postfix operators first (++, --)
        if let Some(left_bp) = precedence::postfix_binding_power(&kind) {
            if left_bp < min_bp {
                break;
            }
            parser.skip();
            let free_floating = hoist_start(&mut lhs);
            let variable = Box::new(lhs);
            let position = parser.finish(start);
            lhs = if kind == TokenKind::PlusPlus {
                Node::PostIncExpr(PostIncExpr {
                    variable,
                    position,
                    free_floating,
                })
            } else {
                Node::PostDecExpr(PostDecExpr {
                    variable,
                    position,
                    free_floating,
                })
            };
            continue;
        }

        // Assignment binds whatever precedence the left side was parsed at
        // (`!$a = f()`), as long as the left side can be written to.
        if kind.is_assignment_op() {
            let assignable = is_assignable(&lhs, kind);
            if !assignable && ASSIGNMENT_BP < min_bp {
                break;
            }
            if !assignable {
                parser.error(ParseError::Forbidden {
                    message: "cannot assign to this expression".to_string(),
                    position: lhs.position(),
                });
            }
            lhs = parse_assignment(parser, lhs, start);
            continue;
        }

        // Ternary operator (special handling)
        if kind == TokenKind::Question {
            if TERNARY_BP < min_bp {
                break;
            }
            parser.skip();

            // Short ternary: `$x ?: $y`
            let if_true = if parser.check(TokenKind::Colon) {
                None
            } else {
                Some(Box::new(parse_expr_bp(parser, 0)))
            };
            parser.expect(TokenKind::Colon);
            // Ternary is LEFT-associative in PHP, so use TERNARY_BP + 1
            let if_false = Box::new(parse_expr_bp(parser, TERNARY_BP + 1));
            let free_floating = hoist_start(&mut lhs);
            lhs = Node::TernaryExpr(TernaryExpr {
                condition: Box::new(lhs),
                if_true,
                if_false,
                position: parser.finish(start),
                free_floating,
            });
            continue;
        }

        // Arrow operator: $obj->prop or $obj->method()
        if kind == TokenKind::Arrow {
            if POSTFIX_BP < min_bp {
                break;
            }
            parser.skip();
            let member = parse_member_name(parser);
            let free_floating = hoist_start(&mut lhs);
            lhs = if parser.check(TokenKind::LeftParen) {
                let argument_list = parse_argument_list(parser);
                Node::MethodCallExpr(MethodCallExpr {
                    variable: Box::new(lhs),
                    method: Box::new(member),
                    argument_list,
                    position: parser.finish(start),
                    free_floating,
                })
            } else {
                Node::PropertyFetchExpr(PropertyFetchExpr {
                    variable: Box::new(lhs),
                    property: Box::new(member),
                    position: parser.finish(start),
                    free_floating,
                })
            };
            continue;
        }

        // Double colon: Class::$prop, Class::method(), Class::CONST
        if kind == TokenKind::DoubleColon {
            if POSTFIX_BP < min_bp {
                break;
            }
            parser.skip();
            lhs = parse_static_member(parser, lhs, start);
            continue;
        }

        // Array access: $arr[index], and $str{index} on variables
        if kind == TokenKind::LeftBracket || (kind == TokenKind::LeftBrace && is_dereferencable(&lhs)) {
            if POSTFIX_BP < min_bp {
                break;
            }
            lhs = parse_dim_fetch(parser, lhs, start);
            continue;
        }

        // Function call: name(args)
        if kind == TokenKind::LeftParen {
            if POSTFIX_BP < min_bp {
                break;
            }
            let argument_list = parse_argument_list(parser);
            let free_floating = hoist_start(&mut lhs);
            lhs = Node::FunctionCallExpr(FunctionCallExpr {
                function: Box::new(lhs),
                argument_list,
                position: parser.finish(start),
                free_floating,
            });
            continue;
        }

        // instanceof takes a class reference on the right
        if kind == TokenKind::Instanceof {
            let Some((left_bp, right_bp)) = precedence::infix_binding_power(&kind) else {
                break;
            };
            if left_bp < min_bp {
                break;
            }
            parser.skip();
            let class = if parser.check(TokenKind::Static) {
                Node::Identifier(parser.parse_identifier_with(true))
            } else {
                match parse_expr_bp(parser, right_bp) {
                    Node::ConstFetchExpr(fetch) => {
                        let ConstFetchExpr {
                            constant,
                            mut free_floating,
                            ..
                        } = fetch;
                        let mut constant = *constant;
                        constant
                            .free_floating_mut()
                            .prepend(Key::Start, free_floating.take(Key::Start));
                        constant
                    }
                    other => other,
                }
            };
            let free_floating = hoist_start(&mut lhs);
            lhs = Node::InstanceOfExpr(InstanceOfExpr {
                expr: Box::new(lhs),
                class: Box::new(class),
                position: parser.finish(start),
                free_floating,
            });
            continue;
        }

        // Infix binary operators
        if let Some((left_bp, right_bp)) = precedence::infix_binding_power(&kind) {
            if left_bp < min_bp {
                break;
            }
            let op_position = parser.current_position();
            parser.skip();
            match kind {
                TokenKind::QuestionQuestion => {
                    parser.require_php7("null coalescing operators", op_position)
                }
                TokenKind::Spaceship => parser.require_php7("spaceship operators", op_position),
                _ => {}
            }
            let right = Box::new(parse_expr_bp(parser, right_bp));
            let free_floating = hoist_start(&mut lhs);
            lhs = binary_node(kind, Box::new(lhs), right, parser.finish(start), free_floating);
            continue;
        }

        // Not an operator we handle: stop
        break;
    }

    lhs
}

fn is_assignable(node: &Node, op: TokenKind) -> bool {
    match node {
        Node::SimpleVar(_)
        | Node::Var(_)
        | Node::ArrayDimFetchExpr(_)
        | Node::PropertyFetchExpr(_)
        | Node::StaticPropertyFetchExpr(_) => true,
        Node::ListExpr(_) | Node::ShortArrayExpr(_) | Node::ShortListExpr(_) => op == TokenKind::Equals,
        _ => false,
    }
}

/// Expressions that may be followed by `{dim}`.
fn is_dereferencable(node: &Node) -> bool {
    matches!(
        node,
        Node::SimpleVar(_)
            | Node::Var(_)
            | Node::ArrayDimFetchExpr(_)
            | Node::PropertyFetchExpr(_)
            | Node::StaticPropertyFetchExpr(_)
            | Node::FunctionCallExpr(_)
            | Node::MethodCallExpr(_)
            | Node::StaticCallExpr(_)
    )
}

fn parse_assignment(parser: &mut Parser, mut lhs: Node, start: Position) -> Node {
    let op = parser.current_kind();
    parser.skip();
    let free_floating = hoist_start(&mut lhs);

    if op == TokenKind::Equals && parser.check(TokenKind::Ampersand) {
        parser.skip();
        let expression = parse_expr_bp(parser, ASSIGNMENT_BP);
        if matches!(expression, Node::NewExpr(_)) && parser.dialect() == Dialect::Php7 {
            parser.error(ParseError::Forbidden {
                message: "cannot assign 'new' by reference".to_string(),
                position: expression.position(),
            });
        }
        return Node::AssignReference(AssignReference {
            variable: Box::new(lhs),
            expression: Box::new(expression),
            position: parser.finish(start),
            free_floating,
        });
    }

    if op == TokenKind::CoalesceEquals {
        parser.require_php7("null coalescing assignments", parser.finish(start));
    }
    let variable = match lhs {
        Node::ShortArrayExpr(_) | Node::ListExpr(_) => {
            if matches!(lhs, Node::ShortArrayExpr(_)) {
                parser.require_php7("short list syntax", lhs.position());
            }
            into_list(lhs)
        }
        other => other,
    };
    let expression = parse_expr_bp(parser, ASSIGNMENT_BP);
    assign_node(
        op,
        Box::new(variable),
        Box::new(expression),
        parser.finish(start),
        free_floating,
    )
}

/// Reinterpret an array literal on the left of `=` (or as a `foreach`
/// target) as a destructuring list, nested lists included.
pub(crate) fn into_list(node: Node) -> Node {
    fn convert(items: Vec<ArrayItemExpr>) -> Vec<ArrayItemExpr> {
        items
            .into_iter()
            .map(|mut item| {
                item.val = item.val.map(|val| Box::new(into_list(*val)));
                item
            })
            .collect()
    }
    match node {
        Node::ShortArrayExpr(array) => Node::ShortListExpr(ShortListExpr {
            items: convert(array.items),
            position: array.position,
            free_floating: array.free_floating,
        }),
        Node::ListExpr(list) => Node::ListExpr(ListExpr {
            items: convert(list.items),
            position: list.position,
            free_floating: list.free_floating,
        }),
        other => other,
    }
}

fn assign_node(
    op: TokenKind,
    variable: Box<Node>,
    expression: Box<Node>,
    position: Position,
    free_floating: Collection,
) -> Node {
    macro_rules! assign {
        ($ty:ident) => {
            Node::$ty($ty {
                variable,
                expression,
                position,
                free_floating,
            })
        };
    }
    match op {
        TokenKind::PlusEquals => assign!(AssignPlus),
        TokenKind::MinusEquals => assign!(AssignMinus),
        TokenKind::StarEquals => assign!(AssignMul),
        TokenKind::SlashEquals => assign!(AssignDiv),
        TokenKind::PercentEquals => assign!(AssignMod),
        TokenKind::StarStarEquals => assign!(AssignPow),
        TokenKind::DotEquals => assign!(AssignConcat),
        TokenKind::AmpersandEquals => assign!(AssignBitwiseAnd),
        TokenKind::PipeEquals => assign!(AssignBitwiseOr),
        TokenKind::CaretEquals => assign!(AssignBitwiseXor),
        TokenKind::ShiftLeftEquals => assign!(AssignShiftLeft),
        TokenKind::ShiftRightEquals => assign!(AssignShiftRight),
        TokenKind::CoalesceEquals => assign!(AssignCoalesce),
        _ => assign!(Assign),
    }
}

fn binary_node(
    op: TokenKind,
    left: Box<Node>,
    right: Box<Node>,
    position: Position,
    free_floating: Collection,
) -> Node {
    macro_rules! binary {
        ($ty:ident) => {
            Node::$ty($ty {
                left,
                right,
                position,
                free_floating,
            })
        };
    }
    match op {
        TokenKind::Plus => binary!(PlusExpr),
        TokenKind::Minus => binary!(MinusExpr),
        TokenKind::Star => binary!(MulExpr),
        TokenKind::Slash => binary!(DivExpr),
        TokenKind::Percent => binary!(ModExpr),
        TokenKind::StarStar => binary!(PowExpr),
        TokenKind::Dot => binary!(ConcatExpr),
        TokenKind::EqualsEquals => binary!(EqualExpr),
        TokenKind::BangEquals => binary!(NotEqualExpr),
        TokenKind::EqualsEqualsEquals => binary!(IdenticalExpr),
        TokenKind::BangEqualsEquals => binary!(NotIdenticalExpr),
        TokenKind::LessThan => binary!(SmallerExpr),
        TokenKind::LessThanEquals => binary!(SmallerOrEqualExpr),
        TokenKind::GreaterThan => binary!(GreaterExpr),
        TokenKind::GreaterThanEquals => binary!(GreaterOrEqualExpr),
        TokenKind::Spaceship => binary!(SpaceshipExpr),
        TokenKind::AmpersandAmpersand => binary!(BooleanAndExpr),
        TokenKind::PipePipe => binary!(BooleanOrExpr),
        TokenKind::And => binary!(LogicalAndExpr),
        TokenKind::Or => binary!(LogicalOrExpr),
        TokenKind::Xor => binary!(LogicalXorExpr),
        TokenKind::Ampersand => binary!(BitwiseAndExpr),
        TokenKind::Pipe => binary!(BitwiseOrExpr),
        TokenKind::Caret => binary!(BitwiseXorExpr),
        TokenKind::ShiftLeft => binary!(ShiftLeftExpr),
        TokenKind::ShiftRight => binary!(ShiftRightExpr),
        TokenKind::QuestionQuestion => binary!(CoalesceExpr),
        _ => Node::bad(position),
    }
}

/// Parse a member name after `->`: an identifier (keywords included), a
/// variable, or `{expr}`.
fn parse_member_name(parser: &mut Parser) -> Node {
    match parser.current_kind() {
        TokenKind::Variable => {
            let variable = Node::SimpleVar(parse_simple_var(parser));
            php5_inner_dims(parser, variable)
        }
        TokenKind::Dollar => parse_variable_variable(parser),
        TokenKind::LeftBrace => {
            let opened_at = parser.current_position();
            parser.skip();
            let expr = parse_expr(parser);
            parser.expect_closing(TokenKind::RightBrace, opened_at);
            expr
        }
        _ => Node::Identifier(parser.parse_identifier_with(true)),
    }
}

/// Everything after `Class::`.
fn parse_static_member(parser: &mut Parser, mut class: Node, start: Position) -> Node {
    let free_floating = hoist_start(&mut class);
    let class = Box::new(class);

    let member = match parser.current_kind() {
        TokenKind::Variable => {
            let variable = Node::SimpleVar(parse_simple_var(parser));
            let member = php5_inner_dims(parser, variable);
            if matches!(member, Node::ArrayDimFetchExpr(_)) && !parser.check(TokenKind::LeftParen) {
                // PHP 5 only reads `A::$b[k]` as a method name when called
                return rebase_dims(member, start, |property| {
                    Node::StaticPropertyFetchExpr(StaticPropertyFetchExpr {
                        class,
                        position: Position::between(start, property.position()),
                        property: Box::new(property),
                        free_floating,
                    })
                });
            }
            member
        }
        TokenKind::Dollar => parse_variable_variable(parser),
        TokenKind::LeftBrace => {
            let opened_at = parser.current_position();
            parser.skip();
            let expr = parse_expr(parser);
            parser.expect_closing(TokenKind::RightBrace, opened_at);
            let argument_list = parse_argument_list(parser);
            return Node::StaticCallExpr(StaticCallExpr {
                class,
                call: Box::new(expr),
                argument_list,
                position: parser.finish(start),
                free_floating,
            });
        }
        _ => {
            let name = parser.parse_identifier_with(true);
            if parser.check(TokenKind::LeftParen) {
                let argument_list = parse_argument_list(parser);
                return Node::StaticCallExpr(StaticCallExpr {
                    class,
                    call: Box::new(Node::Identifier(name)),
                    argument_list,
                    position: parser.finish(start),
                    free_floating,
                });
            }
            return Node::ClassConstFetchExpr(ClassConstFetchExpr {
                class,
                constant_name: name,
                position: parser.finish(start),
                free_floating,
            });
        }
    };

    // `A::$b(...)` calls the method named by `$b`
    if parser.check(TokenKind::LeftParen) {
        let argument_list = parse_argument_list(parser);
        return Node::StaticCallExpr(StaticCallExpr {
            class,
            call: Box::new(member),
            argument_list,
            position: parser.finish(start),
            free_floating,
        });
    }
    Node::StaticPropertyFetchExpr(StaticPropertyFetchExpr {
        class,
        property: Box::new(member),
        position: parser.finish(start),
        free_floating,
    })
}

/// PHP 5 applies `[...]` and `{...}` to the variable naming an indirection
/// before the indirection itself: `$$a['b']` is `${$a['b']}` and
/// `$o->$p['k']` is `$o->{$p['k']}`. PHP 7 leaves them to the postfix loop.
fn php5_inner_dims(parser: &mut Parser, mut variable: Node) -> Node {
    if parser.dialect() != Dialect::Php5 {
        return variable;
    }
    let start = variable.position();
    while parser.check(TokenKind::LeftBracket) || parser.check(TokenKind::LeftBrace) {
        variable = parse_dim_fetch(parser, variable, start);
    }
    variable
}

/// Rebuild a chain of dimension fetches on a new innermost variable made by
/// `base`, widening each fetch to begin at `start`.
fn rebase_dims(node: Node, start: Position, base: impl FnOnce(Node) -> Node) -> Node {
    match node {
        Node::ArrayDimFetchExpr(mut fetch) => {
            let inner = rebase_dims(*fetch.variable, start, base);
            fetch.variable = Box::new(inner);
            fetch.position = Position::between(start, fetch.position);
            Node::ArrayDimFetchExpr(fetch)
        }
        other => base(other),
    }
}

/// `[dim]` or `{dim}` after `variable`.
fn parse_dim_fetch(parser: &mut Parser, mut variable: Node, start: Position) -> Node {
    let curly_brace = parser.check(TokenKind::LeftBrace);
    let close = if curly_brace {
        TokenKind::RightBrace
    } else {
        TokenKind::RightBracket
    };
    let opened_at = parser.current_position();
    parser.skip();
    let dim = if parser.check(close) {
        None
    } else {
        Some(Box::new(parse_expr(parser)))
    };
    parser.expect_closing(close, opened_at);
    let free_floating = hoist_start(&mut variable);
    Node::ArrayDimFetchExpr(ArrayDimFetchExpr {
        variable: Box::new(variable),
        dim,
        curly_brace,
        position: parser.finish(start),
        free_floating,
    })
}

/// `$name`. Reports and returns an empty variable when the current token
/// is not a variable.
pub fn parse_simple_var(parser: &mut Parser) -> SimpleVar {
    if !parser.check(TokenKind::Variable) {
        parser.error(ParseError::Expected {
            expected: TokenKind::Variable.to_string(),
            found: parser.current_kind(),
            position: parser.current_position(),
        });
        let start = parser.start();
        return SimpleVar::new("", parser.finish(start));
    }
    let free_floating = parser.take_leading();
    let token = parser.advance();
    let text = parser.text(&token);
    let name = text.strip_prefix('$').unwrap_or(text).to_string();
    let position = token.position;
    parser.recycle(token);
    SimpleVar {
        name,
        position,
        free_floating,
    }
}

/// `$$a`, `$$$a` and `${expr}`.
fn parse_variable_variable(parser: &mut Parser) -> Node {
    let start = parser.start();
    let mut free_floating = parser.take_leading();
    parser.consume_into(&mut free_floating, Key::Dollar);

    let expr = match parser.current_kind() {
        TokenKind::Variable => {
            let variable = Node::SimpleVar(parse_simple_var(parser));
            php5_inner_dims(parser, variable)
        }
        TokenKind::Dollar => parse_variable_variable(parser),
        TokenKind::LeftBrace => {
            let opened_at = parser.current_position();
            parser.skip();
            let expr = parse_expr(parser);
            parser.expect_closing(TokenKind::RightBrace, opened_at);
            expr
        }
        _ => {
            parser.error(ParseError::Expected {
                expected: TokenKind::Variable.to_string(),
                found: parser.current_kind(),
                position: parser.current_position(),
            });
            let mut bad = Node::bad(parser.finish(start));
            *bad.free_floating_mut() = free_floating;
            return bad;
        }
    };
    Node::Var(Var {
        expr: Box::new(expr),
        position: parser.finish(start),
        free_floating,
    })
}

fn prefix_bp(kind: TokenKind) -> u8 {
    precedence::prefix_binding_power(&kind).unwrap_or(CAST_BP)
}

/// Parse an atomic expression (prefix unaries, literals, variables, etc.)
fn parse_atom(parser: &mut Parser) -> Node {
    let start = parser.start();

    macro_rules! unary {
        ($ty:ident, $field:ident, $bp:expr) => {{
            let free_floating = parser.take_leading();
            parser.skip();
            let operand = parse_expr_bp(parser, $bp);
            Node::$ty($ty {
                $field: Box::new(operand),
                position: parser.finish(start),
                free_floating,
            })
        }};
    }

    match parser.current_kind() {
        TokenKind::Variable => Node::SimpleVar(parse_simple_var(parser)),
        TokenKind::Dollar => parse_variable_variable(parser),

        kind if kind.is_numeric() || kind == TokenKind::InvalidNumericLiteral => {
            let free_floating = parser.take_leading();
            let token = parser.advance();
            let value = parser.text(&token).to_string();
            let position = token.position;
            parser.recycle(token);
            if matches!(
                kind,
                TokenKind::FloatLiteral | TokenKind::FloatLiteralSimple | TokenKind::FloatLiteralLeadingDot
            ) {
                Node::Dnumber(Dnumber {
                    value,
                    position,
                    free_floating,
                })
            } else {
                Node::Lnumber(Lnumber {
                    value,
                    position,
                    free_floating,
                })
            }
        }

        TokenKind::ConstantEncapsedString => {
            let free_floating = parser.take_leading();
            let token = parser.advance();
            let value = parser.text(&token).to_string();
            let position = token.position;
            parser.recycle(token);
            if let Some((body, quote)) = split_literal(&value) {
                check_escapes(parser, body, quote, position);
            }
            Node::StringLiteral(StringLiteral {
                value,
                position,
                free_floating,
            })
        }

        TokenKind::DoubleQuote => {
            let free_floating = parser.take_leading();
            parser.skip();
            let parts = parse_encaps_parts(parser, TokenKind::DoubleQuote, Quote::Double);
            parser.expect(TokenKind::DoubleQuote);
            Node::Encapsed(Encapsed {
                parts,
                position: parser.finish(start),
                free_floating,
            })
        }

        TokenKind::Backtick => {
            let free_floating = parser.take_leading();
            parser.skip();
            let parts = parse_encaps_parts(parser, TokenKind::Backtick, Quote::Backtick);
            parser.expect(TokenKind::Backtick);
            Node::ShellExecExpr(ShellExecExpr {
                parts,
                position: parser.finish(start),
                free_floating,
            })
        }

        TokenKind::StartHeredoc => {
            let free_floating = parser.take_leading();
            let label = parser.current_text().trim_end_matches(['\r', '\n']).to_string();
            let quote = if label.contains('\'') {
                Quote::Nowdoc
            } else {
                Quote::Heredoc
            };
            parser.skip();
            let parts = parse_encaps_parts(parser, TokenKind::EndHeredoc, quote);
            parser.expect(TokenKind::EndHeredoc);
            Node::Heredoc(Heredoc {
                label,
                parts,
                position: parser.finish(start),
                free_floating,
            })
        }

        TokenKind::MagicClass
        | TokenKind::MagicDir
        | TokenKind::MagicFile
        | TokenKind::MagicFunction
        | TokenKind::MagicLine
        | TokenKind::MagicMethod
        | TokenKind::MagicNamespace
        | TokenKind::MagicTrait => {
            let free_floating = parser.take_leading();
            let token = parser.advance();
            let value = parser.text(&token).to_string();
            parser.recycle(token);
            Node::MagicConstant(MagicConstant {
                value,
                position: parser.finish(start),
                free_floating,
            })
        }

        TokenKind::LeftParen => {
            if let Some(cast) = try_parse_cast(parser) {
                return cast;
            }
            let free_floating = parser.take_leading();
            parser.skip();
            let expr = parse_expr(parser);
            parser.expect_closing(TokenKind::RightParen, start);
            Node::ParenExpr(ParenExpr {
                expr: Box::new(expr),
                position: parser.finish(start),
                free_floating,
            })
        }

        TokenKind::Bang => unary!(BooleanNotExpr, expr, prefix_bp(TokenKind::Bang)),
        TokenKind::Tilde => unary!(BitwiseNotExpr, expr, prefix_bp(TokenKind::Tilde)),
        TokenKind::Minus => unary!(UnaryMinusExpr, expr, prefix_bp(TokenKind::Minus)),
        TokenKind::Plus => unary!(UnaryPlusExpr, expr, prefix_bp(TokenKind::Plus)),
        TokenKind::PlusPlus => unary!(PreIncExpr, variable, prefix_bp(TokenKind::PlusPlus)),
        TokenKind::MinusMinus => unary!(PreDecExpr, variable, prefix_bp(TokenKind::MinusMinus)),
        TokenKind::At => unary!(ErrorSuppressExpr, expr, CAST_BP),
        TokenKind::Clone => unary!(CloneExpr, expr, POSTFIX_BP),
        TokenKind::Print => unary!(PrintExpr, expr, LOW_PREFIX_BP),
        TokenKind::Include => unary!(IncludeExpr, expr, LOW_PREFIX_BP),
        TokenKind::IncludeOnce => unary!(IncludeOnceExpr, expr, LOW_PREFIX_BP),
        TokenKind::Require => unary!(RequireExpr, expr, LOW_PREFIX_BP),
        TokenKind::RequireOnce => unary!(RequireOnceExpr, expr, LOW_PREFIX_BP),

        TokenKind::New => parse_new_expr(parser),
        TokenKind::Yield_ => parse_yield_expr(parser),

        TokenKind::Eval => {
            let free_floating = parser.take_leading();
            parser.skip();
            let expr = parse_parenthesized(parser);
            Node::EvalExpr(EvalExpr {
                expr: Box::new(expr),
                position: parser.finish(start),
                free_floating,
            })
        }

        TokenKind::Empty => {
            let free_floating = parser.take_leading();
            parser.skip();
            let expr = parse_parenthesized(parser);
            Node::EmptyExpr(EmptyExpr {
                expr: Box::new(expr),
                position: parser.finish(start),
                free_floating,
            })
        }

        TokenKind::Isset => {
            let free_floating = parser.take_leading();
            parser.skip();
            let opened_at = parser.current_position();
            parser.expect(TokenKind::LeftParen);
            let mut variables = Vec::new();
            while !parser.check(TokenKind::RightParen) && !parser.check(TokenKind::Eof) {
                variables.push(parse_expr(parser));
                if parser.eat(TokenKind::Comma).is_none() {
                    break;
                }
            }
            parser.expect_closing(TokenKind::RightParen, opened_at);
            Node::IssetExpr(IssetExpr {
                variables,
                position: parser.finish(start),
                free_floating,
            })
        }

        TokenKind::Exit | TokenKind::Die => {
            let die = parser.check(TokenKind::Die);
            let free_floating = parser.take_leading();
            parser.skip();
            let mut expr = None;
            if let Some(opened_at) = parser.eat(TokenKind::LeftParen) {
                if !parser.check(TokenKind::RightParen) {
                    expr = Some(Box::new(parse_expr(parser)));
                }
                parser.expect_closing(TokenKind::RightParen, opened_at);
            }
            Node::ExitExpr(ExitExpr {
                die,
                expr,
                position: parser.finish(start),
                free_floating,
            })
        }

        TokenKind::Array if parser.peek_kind() == TokenKind::LeftParen => {
            let free_floating = parser.take_leading();
            parser.skip();
            let opened_at = parser.current_position();
            parser.skip();
            let items = parse_array_items(parser, TokenKind::RightParen);
            parser.expect_closing(TokenKind::RightParen, opened_at);
            Node::ArrayExpr(ArrayExpr {
                items,
                position: parser.finish(start),
                free_floating,
            })
        }

        TokenKind::LeftBracket => {
            let free_floating = parser.take_leading();
            parser.skip();
            let items = parse_array_items(parser, TokenKind::RightBracket);
            parser.expect_closing(TokenKind::RightBracket, start);
            Node::ShortArrayExpr(ShortArrayExpr {
                items,
                position: parser.finish(start),
                free_floating,
            })
        }

        TokenKind::List => {
            let free_floating = parser.take_leading();
            parser.skip();
            let opened_at = parser.current_position();
            parser.expect(TokenKind::LeftParen);
            let items = parse_array_items(parser, TokenKind::RightParen);
            parser.expect_closing(TokenKind::RightParen, opened_at);
            Node::ListExpr(ListExpr {
                items,
                position: parser.finish(start),
                free_floating,
            })
        }

        TokenKind::Function => {
            let doc_comment = parser.take_doc_comment();
            let free_floating = parser.take_leading();
            parse_closure(parser, start, free_floating, doc_comment, false)
        }

        TokenKind::Fn_ => {
            let doc_comment = parser.take_doc_comment();
            let free_floating = parser.take_leading();
            parse_arrow_function(parser, start, free_floating, doc_comment, false)
        }

        TokenKind::Static => match parser.peek_kind() {
            TokenKind::Function | TokenKind::Fn_ => {
                let doc_comment = parser.take_doc_comment();
                let free_floating = parser.take_leading();
                parser.skip();
                if parser.check(TokenKind::Function) {
                    parse_closure(parser, start, free_floating, doc_comment, true)
                } else {
                    parse_arrow_function(parser, start, free_floating, doc_comment, true)
                }
            }
            // `static::`: the postfix loop handles the `::`
            _ => Node::Identifier(parser.parse_identifier_with(true)),
        },

        TokenKind::Identifier | TokenKind::Backslash | TokenKind::Namespace if parser.at_name() => {
            let mut name = parser.parse_name();
            if parser.check(TokenKind::LeftParen) || parser.check(TokenKind::DoubleColon) {
                return name;
            }
            let free_floating = hoist_start(&mut name);
            Node::ConstFetchExpr(ConstFetchExpr {
                constant: Box::new(name),
                position: parser.finish(start),
                free_floating,
            })
        }

        _ => {
            parser.error(ParseError::ExpectedExpression {
                position: parser.current_position(),
            });
            Node::bad(parser.finish(start))
        }
    }
}

/// `( expr )` after `eval`, `empty` and the condition keywords.
pub(crate) fn parse_parenthesized(parser: &mut Parser) -> Node {
    let opened_at = parser.current_position();
    parser.expect(TokenKind::LeftParen);
    let expr = parse_expr(parser);
    parser.expect_closing(TokenKind::RightParen, opened_at);
    expr
}

/// Try to parse a cast expression like `(int)$x`. Returns Some(Node) if successful,
/// or None if this is not a cast (just a parenthesized expression).
fn try_parse_cast(parser: &mut Parser) -> Option<Node> {
    if !matches!(
        parser.peek_kind(),
        TokenKind::Identifier | TokenKind::Array | TokenKind::Unset
    ) {
        return None;
    }
    let kind = cast_kind(parser.peek_text())?;
    if parser.peek2_kind() != TokenKind::RightParen {
        return None;
    }

    let start = parser.start();
    let free_floating = parser.take_leading();
    parser.skip(); // (
    parser.skip(); // type
    parser.skip(); // )
    let expr = Box::new(parse_expr_bp(parser, CAST_BP));
    let position = parser.finish(start);
    Some(match kind {
        CastKind::Int => Node::CastInt(CastInt {
            expr,
            position,
            free_floating,
        }),
        CastKind::Double => Node::CastDouble(CastDouble {
            expr,
            position,
            free_floating,
        }),
        CastKind::String => Node::CastString(CastString {
            expr,
            position,
            free_floating,
        }),
        CastKind::Bool => Node::CastBool(CastBool {
            expr,
            position,
            free_floating,
        }),
        CastKind::Array => Node::CastArray(CastArray {
            expr,
            position,
            free_floating,
        }),
        CastKind::Object => Node::CastObject(CastObject {
            expr,
            position,
            free_floating,
        }),
        CastKind::Unset => Node::CastUnset(CastUnset {
            expr,
            position,
            free_floating,
        }),
    })
}

// =============================================================================
// Interpolated strings
// =============================================================================

/// Parts of a `"..."`, `` `...` `` or heredoc body, up to (not including)
/// the `end` token.
fn parse_encaps_parts(parser: &mut Parser, end: TokenKind, quote: Quote) -> Vec<Node> {
    let mut parts = Vec::new();
    while !parser.check(end) && !parser.check(TokenKind::Eof) {
        match parser.current_kind() {
            TokenKind::EncapsedAndWhitespace => {
                let free_floating = parser.take_leading();
                let token = parser.advance();
                let value = parser.text(&token).to_string();
                let position = token.position;
                parser.recycle(token);
                check_escapes(parser, &value, quote, position);
                parts.push(Node::EncapsedStringPart(EncapsedStringPart {
                    value,
                    position,
                    free_floating,
                }));
            }
            TokenKind::Variable => parts.push(parse_encaps_var(parser)),
            TokenKind::CurlyOpen => {
                let opened_at = parser.current_position();
                parser.skip();
                parts.push(parse_expr(parser));
                parser.expect_closing(TokenKind::RightBrace, opened_at);
            }
            TokenKind::DollarOpenCurlyBraces => parts.push(parse_dollar_curly(parser)),
            found => {
                parser.error(ParseError::Unexpected {
                    found,
                    position: parser.current_position(),
                });
                parser.skip();
            }
        }
    }
    parts
}

/// Escapes are interpreted again at lowering; here an invalid one only
/// becomes a diagnostic.
fn check_escapes(parser: &mut Parser, body: &str, quote: Quote, position: Position) {
    if let Err(error) = unescape(body, quote) {
        parser.error(ParseError::InvalidEscape { error, position });
    }
}

/// `$a`, `$a[offset]` or `$a->b` inside a string.
fn parse_encaps_var(parser: &mut Parser) -> Node {
    let start = parser.start();
    let variable = Node::SimpleVar(parse_simple_var(parser));

    match parser.current_kind() {
        TokenKind::LeftBracket => {
            parser.skip();
            let dim = parse_encaps_offset(parser);
            parser.expect(TokenKind::RightBracket);
            Node::ArrayDimFetchExpr(ArrayDimFetchExpr {
                variable: Box::new(variable),
                dim: Some(Box::new(dim)),
                curly_brace: false,
                position: parser.finish(start),
                free_floating: Collection::new(),
            })
        }
        TokenKind::Arrow => {
            parser.skip();
            let property = parser.parse_identifier();
            Node::PropertyFetchExpr(PropertyFetchExpr {
                variable: Box::new(variable),
                property: Box::new(Node::Identifier(property)),
                position: parser.finish(start),
                free_floating: Collection::new(),
            })
        }
        _ => variable,
    }
}

/// The offset of `"$a[...]"`: a bare name, a number (maybe negative) or a
/// variable.
fn parse_encaps_offset(parser: &mut Parser) -> Node {
    let start = parser.start();
    match parser.current_kind() {
        TokenKind::Identifier => {
            let (value, free_floating) = encaps_offset_text(parser);
            Node::StringLiteral(StringLiteral {
                value,
                position: parser.finish(start),
                free_floating,
            })
        }
        TokenKind::NumString => {
            let (value, free_floating) = encaps_offset_text(parser);
            Node::Lnumber(Lnumber {
                value,
                position: parser.finish(start),
                free_floating,
            })
        }
        // The `-` is kept as trivia; the number's position covers the digits.
        TokenKind::Minus if parser.peek_kind() == TokenKind::NumString => {
            parser.skip();
            let position = parser.start();
            let (digits, free_floating) = encaps_offset_text(parser);
            Node::Lnumber(Lnumber {
                value: format!("-{digits}"),
                position: parser.finish(position),
                free_floating,
            })
        }
        TokenKind::Variable => Node::SimpleVar(parse_simple_var(parser)),
        found => {
            parser.error(ParseError::Unexpected {
                found,
                position: parser.current_position(),
            });
            Node::bad(parser.finish(start))
        }
    }
}

fn encaps_offset_text(parser: &mut Parser) -> (String, Collection) {
    let free_floating = parser.take_leading();
    let token = parser.advance();
    let value = parser.text(&token).to_string();
    parser.recycle(token);
    (value, free_floating)
}

/// `${name}`, `${name[expr]}` or `${expr}` inside a string. The variable of
/// the `name` forms spans just the name; `${` is kept under [`Key::Dollar`].
fn parse_dollar_curly(parser: &mut Parser) -> Node {
    let start = parser.start();
    let mut free_floating = Collection::new();
    parser.consume_into(&mut free_floating, Key::Dollar);

    let node = if parser.check(TokenKind::StringVarname) {
        let token = parser.advance();
        let name = parser.text(&token).to_string();
        let variable = Node::SimpleVar(SimpleVar::new(name, token.position));
        parser.recycle(token);
        if let Some(opened_at) = parser.eat(TokenKind::LeftBracket) {
            let dim = parse_expr(parser);
            parser.expect_closing(TokenKind::RightBracket, opened_at);
            parser.expect_closing(TokenKind::RightBrace, start);
            Node::ArrayDimFetchExpr(ArrayDimFetchExpr {
                variable: Box::new(variable),
                dim: Some(Box::new(dim)),
                curly_brace: false,
                position: parser.finish(start),
                free_floating,
            })
        } else {
            parser.expect_closing(TokenKind::RightBrace, start);
            let mut variable = variable;
            *variable.free_floating_mut() = free_floating;
            variable
        }
    } else {
        let expr = parse_expr(parser);
        parser.expect_closing(TokenKind::RightBrace, start);
        Node::Var(Var {
            expr: Box::new(expr),
            position: parser.finish(start),
            free_floating,
        })
    };
    node
}

// =============================================================================
// New expression: new ClassName(args)
// =============================================================================

fn parse_new_expr(parser: &mut Parser) -> Node {
    let start = parser.start();
    let free_floating = parser.take_leading();
    parser.skip(); // new

    if parser.check(TokenKind::Class) {
        let class = parse_anonymous_class(parser);
        return Node::NewExpr(NewExpr {
            class: Box::new(class),
            argument_list: None,
            position: parser.finish(start),
            free_floating,
        });
    }

    let class = parse_class_name_reference(parser);
    let argument_list = if parser.check(TokenKind::LeftParen) {
        Some(parse_argument_list(parser))
    } else {
        None
    };
    Node::NewExpr(NewExpr {
        class: Box::new(class),
        argument_list,
        position: parser.finish(start),
        free_floating,
    })
}

fn parse_anonymous_class(parser: &mut Parser) -> Node {
    let start = parser.start();
    let free_floating = parser.take_leading();
    parser.skip(); // class
    parser.require_php7("anonymous classes", start);
    let argument_list = if parser.check(TokenKind::LeftParen) {
        Some(parse_argument_list(parser))
    } else {
        None
    };
    let extends = stmt::parse_class_extends(parser);
    let implements = stmt::parse_class_implements(parser);
    let stmts = stmt::parse_class_body(parser);
    Node::ClassStmt(ClassStmt {
        doc_comment: String::new(),
        class_name: None,
        modifiers: Vec::new(),
        argument_list,
        extends,
        implements,
        stmts,
        position: parser.finish(start),
        free_floating,
    })
}

/// The class of `new`: a name, `static`, or a variable with property and
/// dimension fetches but no calls.
fn parse_class_name_reference(parser: &mut Parser) -> Node {
    match parser.current_kind() {
        TokenKind::Static => return Node::Identifier(parser.parse_identifier_with(true)),
        TokenKind::Variable | TokenKind::Dollar => {}
        _ => return parser.parse_name(),
    }

    let start = parser.start();
    let mut class = if parser.check(TokenKind::Variable) {
        Node::SimpleVar(parse_simple_var(parser))
    } else {
        parse_variable_variable(parser)
    };
    loop {
        match parser.current_kind() {
            TokenKind::LeftBracket | TokenKind::LeftBrace => {
                class = parse_dim_fetch(parser, class, start);
            }
            TokenKind::Arrow => {
                parser.skip();
                let property = parse_member_name(parser);
                let free_floating = hoist_start(&mut class);
                class = Node::PropertyFetchExpr(PropertyFetchExpr {
                    variable: Box::new(class),
                    property: Box::new(property),
                    position: parser.finish(start),
                    free_floating,
                });
            }
            TokenKind::DoubleColon if matches!(parser.peek_kind(), TokenKind::Variable | TokenKind::Dollar) => {
                parser.skip();
                let property = if parser.check(TokenKind::Variable) {
                    Node::SimpleVar(parse_simple_var(parser))
                } else {
                    parse_variable_variable(parser)
                };
                let free_floating = hoist_start(&mut class);
                class = Node::StaticPropertyFetchExpr(StaticPropertyFetchExpr {
                    class: Box::new(class),
                    property: Box::new(property),
                    position: parser.finish(start),
                    free_floating,
                });
            }
            _ => break,
        }
    }
    class
}

// =============================================================================
// Closure expression: function($x) use($y) { }
// =============================================================================

fn parse_closure(
    parser: &mut Parser,
    start: Position,
    free_floating: Collection,
    doc_comment: String,
    is_static: bool,
) -> Node {
    parser.expect(TokenKind::Function);
    let returns_ref = parser.eat(TokenKind::Ampersand).is_some();
    let params = stmt::parse_param_list(parser);
    let closure_use = if parser.check(TokenKind::Use) {
        Some(parse_closure_use(parser))
    } else {
        None
    };
    let return_type = parser.parse_return_type();
    let stmts = stmt::parse_braced_stmts(parser);
    Node::ClosureExpr(ClosureExpr {
        returns_ref,
        is_static,
        doc_comment,
        params,
        closure_use,
        return_type,
        stmts,
        position: parser.finish(start),
        free_floating,
    })
}

fn parse_closure_use(parser: &mut Parser) -> ClosureUseExpr {
    let start = parser.start();
    let free_floating = parser.take_leading();
    parser.skip(); // use
    let opened_at = parser.current_position();
    parser.expect(TokenKind::LeftParen);
    let mut uses = Vec::new();
    while !parser.check(TokenKind::RightParen) && !parser.check(TokenKind::Eof) {
        let use_start = parser.start();
        if parser.check(TokenKind::Ampersand) {
            let free_floating = parser.take_leading();
            parser.skip();
            let variable = Node::SimpleVar(parse_simple_var(parser));
            uses.push(Node::ReferenceExpr(ReferenceExpr {
                variable: Box::new(variable),
                position: parser.finish(use_start),
                free_floating,
            }));
        } else {
            uses.push(Node::SimpleVar(parse_simple_var(parser)));
        }
        if parser.eat(TokenKind::Comma).is_none() {
            break;
        }
    }
    parser.expect_closing(TokenKind::RightParen, opened_at);
    ClosureUseExpr {
        uses,
        position: parser.finish(start),
        free_floating,
    }
}

// =============================================================================
// Arrow function: fn($x) => expr
// =============================================================================

fn parse_arrow_function(
    parser: &mut Parser,
    start: Position,
    free_floating: Collection,
    doc_comment: String,
    is_static: bool,
) -> Node {
    parser.require_php7("arrow functions", parser.current_position());
    parser.expect(TokenKind::Fn_);
    let returns_ref = parser.eat(TokenKind::Ampersand).is_some();
    let params = stmt::parse_param_list(parser);
    let return_type = parser.parse_return_type();
    parser.expect(TokenKind::FatArrow);
    let expr = parse_expr_bp(parser, ASSIGNMENT_BP);
    Node::ArrowFunctionExpr(ArrowFunctionExpr {
        returns_ref,
        is_static,
        doc_comment,
        params,
        return_type,
        expr: Box::new(expr),
        position: parser.finish(start),
        free_floating,
    })
}

// =============================================================================
// Yield expression
// =============================================================================

fn parse_yield_expr(parser: &mut Parser) -> Node {
    let start = parser.start();
    let free_floating = parser.take_leading();
    parser.skip(); // yield

    if parser.check(TokenKind::Identifier) && parser.current_text().eq_ignore_ascii_case("from") {
        parser.require_php7("yield from", parser.finish(start));
        parser.skip();
        let expr = parse_expr_bp(parser, LOW_PREFIX_BP);
        return Node::YieldFromExpr(YieldFromExpr {
            expr: Box::new(expr),
            position: parser.finish(start),
            free_floating,
        });
    }

    let ends_here = matches!(
        parser.current_kind(),
        TokenKind::Semicolon
            | TokenKind::RightParen
            | TokenKind::RightBracket
            | TokenKind::Comma
            | TokenKind::CloseTag
            | TokenKind::Eof
    );
    if ends_here {
        return Node::YieldExpr(YieldExpr {
            key: None,
            value: None,
            position: parser.finish(start),
            free_floating,
        });
    }

    let first = parse_expr_bp(parser, LOW_PREFIX_BP);
    let (key, value) = if parser.eat(TokenKind::FatArrow).is_some() {
        let value = parse_expr_bp(parser, LOW_PREFIX_BP);
        (Some(Box::new(first)), Some(Box::new(value)))
    } else {
        (None, Some(Box::new(first)))
    };
    Node::YieldExpr(YieldExpr {
        key,
        value,
        position: parser.finish(start),
        free_floating,
    })
}

// =============================================================================
// Argument list parsing
// =============================================================================

/// Parse an argument list: `(arg, arg, ...)`
pub fn parse_argument_list(parser: &mut Parser) -> ArgumentList {
    let start = parser.start();
    let free_floating = parser.take_leading();
    parser.expect(TokenKind::LeftParen);
    let mut arguments = Vec::new();
    while !parser.check(TokenKind::RightParen) && !parser.check(TokenKind::Eof) {
        arguments.push(parse_argument(parser));
        if parser.eat(TokenKind::Comma).is_none() {
            break;
        }
    }
    parser.expect_closing(TokenKind::RightParen, start);
    ArgumentList {
        arguments,
        position: parser.finish(start),
        free_floating,
    }
}

fn parse_argument(parser: &mut Parser) -> Argument {
    let start = parser.start();
    let mut free_floating = Collection::new();
    let variadic = parser.check(TokenKind::Ellipsis);
    let is_reference = parser.check(TokenKind::Ampersand);
    if variadic || is_reference {
        free_floating = parser.take_leading();
        parser.skip();
    }
    let mut expr = parse_expr(parser);
    if free_floating.is_empty() {
        free_floating = hoist_start(&mut expr);
    }
    Argument {
        variadic,
        is_reference,
        expr: Box::new(expr),
        position: parser.finish(start),
        free_floating,
    }
}

// =============================================================================
// Array parsing
// =============================================================================

/// Items of `array(...)`, `[...]` and `list(...)`. A comma with nothing
/// before it is an empty slot; a trailing comma adds nothing.
fn parse_array_items(parser: &mut Parser, close: TokenKind) -> Vec<ArrayItemExpr> {
    let mut items = Vec::new();
    loop {
        if parser.check(close) || parser.check(TokenKind::Eof) {
            break;
        }
        if parser.eat(TokenKind::Comma).is_some() {
            items.push(ArrayItemExpr {
                key: None,
                val: None,
                unpack: false,
                position: Position::NONE,
                free_floating: Collection::new(),
            });
            continue;
        }
        items.push(parse_array_item(parser));
        if parser.eat(TokenKind::Comma).is_none() {
            break;
        }
    }
    items
}

fn parse_array_item(parser: &mut Parser) -> ArrayItemExpr {
    let start = parser.start();

    if parser.check(TokenKind::Ellipsis) {
        let free_floating = parser.take_leading();
        parser.skip();
        let val = parse_expr(parser);
        return ArrayItemExpr {
            key: None,
            val: Some(Box::new(val)),
            unpack: true,
            position: parser.finish(start),
            free_floating,
        };
    }

    let mut first = parse_array_value(parser);
    let free_floating = hoist_start(&mut first);
    let (key, val) = if parser.eat(TokenKind::FatArrow).is_some() {
        (Some(Box::new(first)), parse_array_value(parser))
    } else {
        (None, first)
    };
    ArrayItemExpr {
        key,
        val: Some(Box::new(val)),
        unpack: false,
        position: parser.finish(start),
        free_floating,
    }
}

/// An item value, maybe taken by reference.
fn parse_array_value(parser: &mut Parser) -> Node {
    if !parser.check(TokenKind::Ampersand) {
        return parse_expr(parser);
    }
    let start = parser.start();
    let free_floating = parser.take_leading();
    parser.skip();
    let variable = parse_expr_bp(parser, POSTFIX_BP);
    Node::ReferenceExpr(ReferenceExpr {
        variable: Box::new(variable),
        position: parser.finish(start),
        free_floating,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ParserConfig;

    fn expr(source: &str) -> (Node, Vec<ParseError>) {
        let full = format!("<?php {source}");
        let mut parser = Parser::new(&full, ParserConfig::default());
        let node = parse_expr(&mut parser);
        (node, parser.into_errors())
    }

    fn expr_ok(source: &str) -> Node {
        let (node, errors) = expr(source);
        assert!(errors.is_empty(), "unexpected errors for {source}: {errors:?}");
        node
    }

    #[test]
    fn test_precedence_shapes() {
        match expr_ok("1 + 2 * 3") {
            Node::PlusExpr(plus) => assert!(matches!(*plus.right, Node::MulExpr(_))),
            other => panic!("expected PlusExpr, got {}", other.type_name()),
        }
        match expr_ok("-$a ** 2") {
            Node::UnaryMinusExpr(minus) => assert!(matches!(*minus.expr, Node::PowExpr(_))),
            other => panic!("expected UnaryMinusExpr, got {}", other.type_name()),
        }
        match expr_ok("!$a instanceof B") {
            Node::BooleanNotExpr(not) => assert!(matches!(*not.expr, Node::InstanceOfExpr(_))),
            other => panic!("expected BooleanNotExpr, got {}", other.type_name()),
        }
    }

    #[test]
    fn test_assignment_inside_negation() {
        match expr_ok("!$a = f()") {
            Node::BooleanNotExpr(not) => assert!(matches!(*not.expr, Node::Assign(_))),
            other => panic!("expected BooleanNotExpr, got {}", other.type_name()),
        }
    }

    #[test]
    fn test_compound_assignments() {
        assert!(matches!(expr_ok("$a .= 'x'"), Node::AssignConcat(_)));
        assert!(matches!(expr_ok("$a ??= 1"), Node::AssignCoalesce(_)));
        assert!(matches!(expr_ok("$a =& $b"), Node::AssignReference(_)));
        assert!(matches!(expr_ok("$a **= 2"), Node::AssignPow(_)));
    }

    #[test]
    fn test_short_array_on_left_becomes_short_list() {
        match expr_ok("[$a, [$b]] = $c") {
            Node::Assign(assign) => match *assign.variable {
                Node::ShortListExpr(list) => {
                    assert_eq!(list.items.len(), 2);
                    let inner = list.items[1].val.as_deref();
                    assert!(matches!(inner, Some(Node::ShortListExpr(_))));
                }
                other => panic!("expected ShortListExpr, got {}", other.type_name()),
            },
            other => panic!("expected Assign, got {}", other.type_name()),
        }
    }

    #[test]
    fn test_list_with_empty_slot() {
        match expr_ok("list(, $b) = $c") {
            Node::Assign(assign) => match *assign.variable {
                Node::ListExpr(list) => {
                    assert_eq!(list.items.len(), 2);
                    assert!(list.items[0].position.is_none());
                    assert!(list.items[0].val.is_none());
                }
                other => panic!("expected ListExpr, got {}", other.type_name()),
            },
            other => panic!("expected Assign, got {}", other.type_name()),
        }
    }

    #[test]
    fn test_casts() {
        assert!(matches!(expr_ok("(int) $a"), Node::CastInt(_)));
        assert!(matches!(expr_ok("(real) $a"), Node::CastDouble(_)));
        assert!(matches!(expr_ok("(binary) $a"), Node::CastString(_)));
        assert!(matches!(expr_ok("(array) $a"), Node::CastArray(_)));
        assert!(matches!(expr_ok("(unset) $a"), Node::CastUnset(_)));
        assert!(matches!(expr_ok("(FOO)"), Node::ParenExpr(_)));
    }

    #[test]
    fn test_names_and_calls() {
        match expr_ok("foo(1, ...$rest)") {
            Node::FunctionCallExpr(call) => {
                assert!(matches!(*call.function, Node::Name(_)));
                assert_eq!(call.argument_list.arguments.len(), 2);
                assert!(call.argument_list.arguments[1].variadic);
            }
            other => panic!("expected FunctionCallExpr, got {}", other.type_name()),
        }
        assert!(matches!(expr_ok("true"), Node::ConstFetchExpr(_)));
        assert!(matches!(expr_ok("A::B"), Node::ClassConstFetchExpr(_)));
        assert!(matches!(expr_ok("A::$b"), Node::StaticPropertyFetchExpr(_)));
        assert!(matches!(expr_ok("static::create()"), Node::StaticCallExpr(_)));
        assert!(matches!(expr_ok("$a->list"), Node::PropertyFetchExpr(_)));
        assert!(matches!(expr_ok("$a->b()"), Node::MethodCallExpr(_)));
    }

    #[test]
    fn test_variable_variable_keeps_dollar() {
        match expr_ok("$$a") {
            Node::Var(var) => {
                assert!(matches!(*var.expr, Node::SimpleVar(_)));
                let dollar = var.free_floating.get(Key::Dollar).unwrap();
                assert_eq!(dollar.last().unwrap().value, "$");
            }
            other => panic!("expected Var, got {}", other.type_name()),
        }
    }

    /// Nesting of the variable forms, for comparing the two grammars.
    fn variable_shape(node: &Node) -> String {
        match node {
            Node::SimpleVar(var) => format!("${}", var.name),
            Node::StringLiteral(literal) => literal.value.clone(),
            Node::Lnumber(number) => number.value.clone(),
            Node::Name(name) => {
                let parts: Vec<_> = name.parts.iter().map(|p| p.value.as_str()).collect();
                parts.join("\\")
            }
            Node::Var(var) => format!("Var({})", variable_shape(&var.expr)),
            Node::ArrayDimFetchExpr(fetch) => format!(
                "Dim({}, {})",
                variable_shape(&fetch.variable),
                fetch.dim.as_deref().map(variable_shape).unwrap_or_default()
            ),
            Node::PropertyFetchExpr(fetch) => format!(
                "Prop({}, {})",
                variable_shape(&fetch.variable),
                variable_shape(&fetch.property)
            ),
            Node::StaticPropertyFetchExpr(fetch) => format!(
                "StaticProp({}, {})",
                variable_shape(&fetch.class),
                variable_shape(&fetch.property)
            ),
            Node::StaticCallExpr(call) => format!(
                "StaticCall({}, {})",
                variable_shape(&call.class),
                variable_shape(&call.call)
            ),
            Node::FunctionCallExpr(call) => format!("Call({})", variable_shape(&call.function)),
            other => other.type_name().to_string(),
        }
    }

    fn php5_expr_ok(source: &str) -> Node {
        let full = format!("<?php {source}");
        let mut parser = Parser::new(
            &full,
            ParserConfig {
                dialect: Dialect::Php5,
                ..ParserConfig::default()
            },
        );
        let node = parse_expr(&mut parser);
        let errors = parser.into_errors();
        assert!(errors.is_empty(), "unexpected errors for {source}: {errors:?}");
        node
    }

    #[test]
    fn test_indirect_variables_bind_by_dialect() {
        let cases = [
            ("$$a['b']", "Var(Dim($a, 'b'))", "Dim(Var($a), 'b')"),
            ("$obj->$prop['k']", "Prop($obj, Dim($prop, 'k'))", "Dim(Prop($obj, $prop), 'k')"),
            (
                "Foo::$bar['k']()",
                "StaticCall(Foo, Dim($bar, 'k'))",
                "Call(Dim(StaticProp(Foo, $bar), 'k'))",
            ),
            ("Foo::$bar['k']", "Dim(StaticProp(Foo, $bar), 'k')", "Dim(StaticProp(Foo, $bar), 'k')"),
            ("$$$a[0]", "Var(Var(Dim($a, 0)))", "Dim(Var(Var($a)), 0)"),
        ];
        for (source, php5, php7) in cases {
            assert_eq!(variable_shape(&php5_expr_ok(source)), php5, "php5 {source}");
            assert_eq!(variable_shape(&expr_ok(source)), php7, "php7 {source}");
        }
    }

    #[test]
    fn test_php5_rebased_static_property_spans_class() {
        let node = php5_expr_ok("Foo::$bar['k']");
        let Node::ArrayDimFetchExpr(fetch) = node else {
            panic!("expected ArrayDimFetchExpr");
        };
        assert_eq!(fetch.position, Position::new(1, 1, 6, 20));
        assert_eq!(fetch.variable.position(), Position::new(1, 1, 6, 15));
    }

    #[test]
    fn test_curly_dim_fetch() {
        match expr_ok("$s{0}") {
            Node::ArrayDimFetchExpr(fetch) => assert!(fetch.curly_brace),
            other => panic!("expected ArrayDimFetchExpr, got {}", other.type_name()),
        }
    }

    #[test]
    fn test_interpolated_string_parts() {
        match expr_ok(r#""a $b[0] {$c->d} ${e} $f->g""#) {
            Node::Encapsed(encapsed) => {
                let types: Vec<_> = encapsed.parts.iter().map(Node::type_name).collect();
                assert_eq!(
                    types,
                    [
                        "EncapsedStringPart",
                        "ArrayDimFetchExpr",
                        "EncapsedStringPart",
                        "PropertyFetchExpr",
                        "EncapsedStringPart",
                        "SimpleVar",
                        "EncapsedStringPart",
                        "PropertyFetchExpr",
                    ]
                );
            }
            other => panic!("expected Encapsed, got {}", other.type_name()),
        }
    }

    #[test]
    fn test_negative_string_offset() {
        match expr_ok(r#""$a[-1]""#) {
            Node::Encapsed(encapsed) => match &encapsed.parts[0] {
                Node::ArrayDimFetchExpr(fetch) => match fetch.dim.as_deref() {
                    Some(Node::Lnumber(n)) => assert_eq!(n.value, "-1"),
                    other => panic!("unexpected dim {other:?}"),
                },
                other => panic!("expected ArrayDimFetchExpr, got {}", other.type_name()),
            },
            other => panic!("expected Encapsed, got {}", other.type_name()),
        }
    }

    #[test]
    fn test_heredoc_label() {
        match expr_ok("<<<EOT\nhello $name\nEOT") {
            Node::Heredoc(heredoc) => {
                assert_eq!(heredoc.label, "<<<EOT");
                assert_eq!(heredoc.parts.len(), 3);
            }
            other => panic!("expected Heredoc, got {}", other.type_name()),
        }
    }

    fn error_messages(source: &str) -> Vec<String> {
        expr(source).1.iter().map(|err| err.to_string()).collect()
    }

    #[test]
    fn test_invalid_escapes_are_reported() {
        assert_eq!(
            error_messages(r#""\u{zz}""#),
            [r"invalid UTF-8 codepoint escape sequence \u{zz}"]
        );
        assert_eq!(
            error_messages(r#""\u{41""#),
            ["missing closing '}' for UTF-8 codepoint escape"]
        );
        assert_eq!(
            error_messages(r#""\400""#),
            [r"octal escape sequence overflow \400 is greater than \377"]
        );
        assert_eq!(error_messages(r#""a\u{zz} $b""#).len(), 1);
        assert_eq!(error_messages("<<<EOT\n\\u{110000}\nEOT").len(), 1);
        assert_eq!(error_messages("`\\u{D800}`").len(), 1);
    }

    #[test]
    fn test_invalid_escape_keeps_literal_and_position() {
        let (node, errors) = expr(r#""\u{41""#);
        assert!(matches!(node, Node::StringLiteral(_)));
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], ParseError::InvalidEscape { .. }));
        assert_eq!(errors[0].position().range(), Some(6..13));
    }

    #[test]
    fn test_valid_and_inert_escapes_are_quiet() {
        expr_ok(r#""\x41 \101 \u{1F600} \xzz \q \$a""#);
        expr_ok(r"'\u{zz} \400'");
        expr_ok("<<<'EOT'\n\\u{zz}\nEOT");
    }

    #[test]
    fn test_closure_and_arrow_function() {
        match expr_ok("static function &($a, int ...$b) use (&$c): ?int { return 1; }") {
            Node::ClosureExpr(closure) => {
                assert!(closure.is_static);
                assert!(closure.returns_ref);
                assert_eq!(closure.params.len(), 2);
                assert!(closure.params[1].variadic);
                assert_eq!(closure.closure_use.map(|u| u.uses.len()), Some(1));
                assert!(matches!(closure.return_type.as_deref(), Some(Node::Nullable(_))));
                assert_eq!(closure.stmts.len(), 1);
            }
            other => panic!("expected ClosureExpr, got {}", other.type_name()),
        }
        assert!(matches!(expr_ok("fn($x) => $x + 1"), Node::ArrowFunctionExpr(_)));
    }

    #[test]
    fn test_new_forms() {
        match expr_ok("new class(1) extends A {}") {
            Node::NewExpr(new) => {
                assert!(new.argument_list.is_none());
                match *new.class {
                    Node::ClassStmt(class) => {
                        assert!(class.class_name.is_none());
                        assert!(class.argument_list.is_some());
                        assert!(class.extends.is_some());
                    }
                    other => panic!("expected ClassStmt, got {}", other.type_name()),
                }
            }
            other => panic!("expected NewExpr, got {}", other.type_name()),
        }
        match expr_ok("new $a->b['c']()") {
            Node::NewExpr(new) => {
                assert!(matches!(*new.class, Node::ArrayDimFetchExpr(_)));
                assert!(new.argument_list.is_some());
            }
            other => panic!("expected NewExpr, got {}", other.type_name()),
        }
    }

    #[test]
    fn test_yield_forms() {
        assert!(matches!(expr_ok("yield"), Node::YieldExpr(y) if y.value.is_none()));
        assert!(matches!(expr_ok("yield $k => $v"), Node::YieldExpr(y) if y.key.is_some()));
        assert!(matches!(expr_ok("yield from gen()"), Node::YieldFromExpr(_)));
    }

    #[test]
    fn test_php5_dialect_features() {
        let full = "<?php $a ?? $b <=> $c";
        let mut parser = Parser::new(
            full,
            ParserConfig {
                dialect: Dialect::Php5,
                ..ParserConfig::default()
            },
        );
        parse_expr(&mut parser);
        let features: Vec<_> = parser
            .into_errors()
            .into_iter()
            .filter_map(|e| match e {
                ParseError::DialectFeature { feature, .. } => Some(feature),
                _ => None,
            })
            .collect();
        assert_eq!(features, ["null coalescing operators", "spaceship operators"]);
    }

    #[test]
    fn test_assign_new_by_reference_rejected_in_php7() {
        let (node, errors) = expr("$a =& new Foo");
        assert!(matches!(node, Node::AssignReference(_)));
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], ParseError::Forbidden { .. }));
    }

    #[test]
    fn test_missing_operand_is_bad() {
        let (node, errors) = expr("1 + ;");
        match node {
            Node::PlusExpr(plus) => assert!(plus.right.is_bad()),
            other => panic!("expected PlusExpr, got {}", other.type_name()),
        }
        assert!(matches!(errors[0], ParseError::ExpectedExpression { .. }));
    }

    #[test]
    fn test_leading_trivia_moves_to_outermost_node() {
        let node = expr_ok("/* c */ $a + 1");
        let start = node.free_floating().get(Key::Start).unwrap();
        assert!(start.iter().any(|t| t.value == "/* c */"));
        match node {
            Node::PlusExpr(plus) => assert!(plus.left.free_floating().is_empty()),
            other => panic!("expected PlusExpr, got {}", other.type_name()),
        }
    }

    #[test]
    fn test_deep_nesting_is_reported() {
        let mut parser = Parser::new("<?php (((1)))", ParserConfig::default());
        parser.depth = MAX_DEPTH - 2;
        parse_expr(&mut parser);
        assert_eq!(parser.depth, MAX_DEPTH - 2);
        assert!(parser.check(TokenKind::Eof));
        let errors = parser.into_errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].to_string(), "nesting too deep");
    }
}
