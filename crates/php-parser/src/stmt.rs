use php_ast::*;
use php_lexer::TokenKind;

use crate::diagnostics::ParseError;
use crate::expr;
use crate::parser::{Parser, MAX_DEPTH};

/// Parse a statement at file or namespace level, where declarations like
/// `namespace`, `use` and `const` are allowed.
pub fn parse_top_stmt(parser: &mut Parser) -> Node {
    parse_stmt_at(parser, true)
}

/// Parse a single statement.
pub fn parse_stmt(parser: &mut Parser) -> Node {
    parse_stmt_at(parser, false)
}

fn parse_stmt_at(parser: &mut Parser, top_level: bool) -> Node {
    if parser.depth >= MAX_DEPTH {
        return parser.skip_too_deep(true);
    }
    parser.depth += 1;
    let stmt = parse_stmt_kind(parser, top_level);
    parser.depth -= 1;
    stmt
}

fn parse_stmt_kind(parser: &mut Parser, top_level: bool) -> Node {
    match parser.current_kind() {
        TokenKind::Semicolon => {
            let start = parser.start();
            let mut free_floating = Collection::new();
            parser.consume_into(&mut free_floating, Key::SemiColon);
            Node::NopStmt(NopStmt {
                position: parser.finish(start),
                free_floating,
            })
        }
        TokenKind::CloseTag => {
            let start = parser.start();
            let mut free_floating = Collection::new();
            parser.consume_into(&mut free_floating, Key::PhpCloseTag);
            Node::NopStmt(NopStmt {
                position: parser.finish(start),
                free_floating,
            })
        }
        TokenKind::InlineHtml => {
            let start = parser.start();
            let free_floating = parser.take_leading();
            let token = parser.advance();
            let value = parser.text(&token).to_string();
            parser.recycle(token);
            Node::InlineHtmlStmt(InlineHtmlStmt {
                value,
                position: parser.finish(start),
                free_floating,
            })
        }
        TokenKind::OpenTagWithEcho | TokenKind::Echo => parse_echo(parser),
        TokenKind::LeftBrace => Node::StmtList(parse_block(parser)),
        TokenKind::If => parse_if(parser),
        TokenKind::While => parse_while(parser),
        TokenKind::Do => parse_do_while(parser),
        TokenKind::For => parse_for(parser),
        TokenKind::Foreach => parse_foreach(parser),
        TokenKind::Switch => parse_switch(parser),
        TokenKind::Break => parse_break(parser),
        TokenKind::Continue => parse_continue(parser),
        TokenKind::Return => parse_return(parser),
        TokenKind::Global => parse_global(parser),
        TokenKind::Static if parser.peek_kind() == TokenKind::Variable => parse_static_vars(parser),
        TokenKind::Unset => parse_unset(parser),
        TokenKind::Throw => parse_throw(parser),
        TokenKind::Try => parse_try(parser),
        TokenKind::Goto => parse_goto(parser),
        TokenKind::Declare => parse_declare(parser),
        TokenKind::Identifier if parser.peek_kind() == TokenKind::Colon => parse_label(parser),
        TokenKind::Function => {
            // `function (` and `function &(` start a closure
            let next = parser.peek_kind();
            if next == TokenKind::LeftParen
                || (next == TokenKind::Ampersand && parser.peek2_kind() == TokenKind::LeftParen)
            {
                parse_expression_stmt(parser)
            } else {
                parse_function(parser)
            }
        }
        TokenKind::Abstract | TokenKind::Final | TokenKind::Class => parse_class(parser),
        TokenKind::Interface => parse_interface(parser),
        TokenKind::Trait => parse_trait(parser),
        TokenKind::Namespace if parser.peek_kind() != TokenKind::Backslash => {
            check_top_level(parser, top_level, "namespace");
            parse_namespace(parser)
        }
        TokenKind::Use => {
            check_top_level(parser, top_level, "use");
            parse_use(parser)
        }
        TokenKind::Const => {
            check_top_level(parser, top_level, "const");
            parse_const(parser)
        }
        TokenKind::HaltCompiler => {
            check_top_level(parser, top_level, "__halt_compiler");
            parse_halt_compiler(parser)
        }
        _ => parse_expression_stmt(parser),
    }
}

fn check_top_level(parser: &mut Parser, top_level: bool, keyword: &str) {
    if !top_level {
        parser.error(ParseError::Forbidden {
            message: format!("'{keyword}' is only allowed at the top level"),
            position: parser.current_position(),
        });
    }
}

/// Skip a token that started nothing, so statement loops always advance.
fn ensure_progress(parser: &mut Parser, before: Position) {
    if parser.current_position() == before && !parser.check(TokenKind::Eof) {
        parser.error(ParseError::Unexpected {
            found: parser.current_kind(),
            position: before,
        });
        parser.skip();
    }
}

fn parse_stmts_until(parser: &mut Parser, ends: &[TokenKind], top_level: bool) -> Vec<Node> {
    let mut stmts = Vec::new();
    while !parser.check(TokenKind::Eof) && !ends.contains(&parser.current_kind()) {
        let before = parser.current_position();
        stmts.push(parse_stmt_at(parser, top_level));
        ensure_progress(parser, before);
    }
    stmts
}

/// `{ stmts }`
pub fn parse_block(parser: &mut Parser) -> StmtList {
    let start = parser.start();
    let free_floating = parser.take_leading();
    let stmts = parse_braced_stmts(parser);
    StmtList {
        stmts,
        position: parser.finish(start),
        free_floating,
    }
}

/// The statements of a `{ ... }` body, braces consumed.
pub fn parse_braced_stmts(parser: &mut Parser) -> Vec<Node> {
    let opened_at = parser.current_position();
    if parser.expect(TokenKind::LeftBrace).is_none() {
        return Vec::new();
    }
    let stmts = parse_stmts_until(parser, &[TokenKind::RightBrace], false);
    parser.expect_closing(TokenKind::RightBrace, opened_at);
    stmts
}

/// Body of an alternative-syntax construct, up to one of `ends`.
fn parse_alt_body(parser: &mut Parser, ends: &[TokenKind]) -> Node {
    let start = parser.start();
    let stmts = parse_stmts_until(parser, ends, false);
    Node::StmtList(StmtList {
        stmts,
        position: parser.finish(start),
        free_floating: Collection::new(),
    })
}

/// Closes an alternative-syntax construct: `endif;` and friends.
fn finish_alt(parser: &mut Parser, end: TokenKind, free_floating: &mut Collection) {
    let keyword = end.to_string();
    parser.expect(end);
    parser.terminate(free_floating, &keyword);
}

fn parse_expr_list_until(parser: &mut Parser, stop: TokenKind) -> Vec<Node> {
    let mut exprs = Vec::new();
    while !parser.check(stop) && !parser.check(TokenKind::Eof) {
        exprs.push(expr::parse_expr(parser));
        if parser.eat(TokenKind::Comma).is_none() {
            break;
        }
    }
    exprs
}

fn at_terminator(parser: &Parser) -> bool {
    matches!(
        parser.current_kind(),
        TokenKind::Semicolon | TokenKind::CloseTag | TokenKind::Eof
    )
}

// =============================================================================
// Simple statements
// =============================================================================

fn parse_expression_stmt(parser: &mut Parser) -> Node {
    let start = parser.start();
    let mut expr = expr::parse_expr(parser);
    let mut free_floating = expr::hoist_start(&mut expr);
    parser.terminate(&mut free_floating, "expression");
    Node::ExpressionStmt(ExpressionStmt {
        expr: Box::new(expr),
        position: parser.finish(start),
        free_floating,
    })
}

/// `echo a, b;` and `<?= a, b ?>`
fn parse_echo(parser: &mut Parser) -> Node {
    let start = parser.start();
    let mut free_floating = Collection::new();
    if parser.check(TokenKind::OpenTagWithEcho) {
        parser.consume_into(&mut free_floating, Key::Start);
    } else {
        free_floating = parser.take_leading();
        parser.skip();
    }
    let mut exprs = vec![expr::parse_expr(parser)];
    while parser.eat(TokenKind::Comma).is_some() {
        exprs.push(expr::parse_expr(parser));
    }
    parser.terminate(&mut free_floating, "echo");
    Node::EchoStmt(EchoStmt {
        exprs,
        position: parser.finish(start),
        free_floating,
    })
}

fn parse_return(parser: &mut Parser) -> Node {
    let start = parser.start();
    let mut free_floating = parser.take_leading();
    parser.skip();
    let expr = if at_terminator(parser) {
        None
    } else {
        Some(Box::new(expr::parse_expr(parser)))
    };
    parser.terminate(&mut free_floating, "return");
    Node::ReturnStmt(ReturnStmt {
        expr,
        position: parser.finish(start),
        free_floating,
    })
}

fn parse_break(parser: &mut Parser) -> Node {
    let start = parser.start();
    let mut free_floating = parser.take_leading();
    parser.skip();
    let expr = if at_terminator(parser) {
        None
    } else {
        Some(Box::new(expr::parse_expr(parser)))
    };
    parser.terminate(&mut free_floating, "break");
    Node::BreakStmt(BreakStmt {
        expr,
        position: parser.finish(start),
        free_floating,
    })
}

fn parse_continue(parser: &mut Parser) -> Node {
    let start = parser.start();
    let mut free_floating = parser.take_leading();
    parser.skip();
    let expr = if at_terminator(parser) {
        None
    } else {
        Some(Box::new(expr::parse_expr(parser)))
    };
    parser.terminate(&mut free_floating, "continue");
    Node::ContinueStmt(ContinueStmt {
        expr,
        position: parser.finish(start),
        free_floating,
    })
}

fn parse_global(parser: &mut Parser) -> Node {
    let start = parser.start();
    let mut free_floating = parser.take_leading();
    parser.skip();
    let mut vars = vec![expr::parse_expr(parser)];
    while parser.eat(TokenKind::Comma).is_some() {
        vars.push(expr::parse_expr(parser));
    }
    parser.terminate(&mut free_floating, "global");
    Node::GlobalStmt(GlobalStmt {
        vars,
        position: parser.finish(start),
        free_floating,
    })
}

/// `static $a = 1, $b;`
fn parse_static_vars(parser: &mut Parser) -> Node {
    let start = parser.start();
    let mut free_floating = parser.take_leading();
    parser.skip();
    let mut vars = Vec::new();
    loop {
        let var_start = parser.start();
        let variable = expr::parse_simple_var(parser);
        let expr = if parser.eat(TokenKind::Equals).is_some() {
            Some(Box::new(expr::parse_expr(parser)))
        } else {
            None
        };
        vars.push(StaticVarStmt {
            variable,
            expr,
            position: parser.finish(var_start),
            free_floating: Collection::new(),
        });
        if parser.eat(TokenKind::Comma).is_none() {
            break;
        }
    }
    parser.terminate(&mut free_floating, "static");
    Node::StaticStmt(StaticStmt {
        vars,
        position: parser.finish(start),
        free_floating,
    })
}

fn parse_unset(parser: &mut Parser) -> Node {
    let start = parser.start();
    let mut free_floating = parser.take_leading();
    parser.skip();
    let opened_at = parser.current_position();
    parser.expect(TokenKind::LeftParen);
    let vars = parse_expr_list_until(parser, TokenKind::RightParen);
    parser.expect_closing(TokenKind::RightParen, opened_at);
    parser.terminate(&mut free_floating, "unset");
    Node::UnsetStmt(UnsetStmt {
        vars,
        position: parser.finish(start),
        free_floating,
    })
}

fn parse_throw(parser: &mut Parser) -> Node {
    let start = parser.start();
    let mut free_floating = parser.take_leading();
    parser.skip();
    let expr = expr::parse_expr(parser);
    parser.terminate(&mut free_floating, "throw");
    Node::ThrowStmt(ThrowStmt {
        expr: Box::new(expr),
        position: parser.finish(start),
        free_floating,
    })
}

fn parse_goto(parser: &mut Parser) -> Node {
    let start = parser.start();
    let mut free_floating = parser.take_leading();
    parser.skip();
    let label = parser.parse_identifier();
    parser.terminate(&mut free_floating, "goto");
    Node::GotoStmt(GotoStmt {
        label,
        position: parser.finish(start),
        free_floating,
    })
}

fn parse_label(parser: &mut Parser) -> Node {
    let start = parser.start();
    let free_floating = parser.take_leading();
    let label_name = parser.parse_identifier();
    parser.expect(TokenKind::Colon);
    Node::LabelStmt(LabelStmt {
        label_name,
        position: parser.finish(start),
        free_floating,
    })
}

// =============================================================================
// Control flow
// =============================================================================

fn parse_if(parser: &mut Parser) -> Node {
    let start = parser.start();
    let mut free_floating = parser.take_leading();
    parser.skip();
    let cond = Box::new(expr::parse_parenthesized(parser));

    // Alternative syntax: if (...): ... endif;
    if parser.eat(TokenKind::Colon).is_some() {
        let ends = [TokenKind::ElseIf, TokenKind::Else, TokenKind::EndIf];
        let stmt = Box::new(parse_alt_body(parser, &ends));

        let mut else_if = Vec::new();
        while parser.check(TokenKind::ElseIf) {
            let branch_start = parser.start();
            let free_floating = parser.take_leading();
            parser.skip();
            let cond = Box::new(expr::parse_parenthesized(parser));
            parser.expect(TokenKind::Colon);
            let stmt = Box::new(parse_alt_body(parser, &ends));
            else_if.push(AltElseIfStmt {
                cond,
                stmt,
                position: parser.finish(branch_start),
                free_floating,
            });
        }

        let else_stmt = if parser.check(TokenKind::Else) {
            let branch_start = parser.start();
            let free_floating = parser.take_leading();
            parser.skip();
            parser.expect(TokenKind::Colon);
            let stmt = Box::new(parse_alt_body(parser, &[TokenKind::EndIf]));
            Some(AltElseStmt {
                stmt,
                position: parser.finish(branch_start),
                free_floating,
            })
        } else {
            None
        };

        finish_alt(parser, TokenKind::EndIf, &mut free_floating);
        return Node::AltIfStmt(AltIfStmt {
            cond,
            stmt,
            else_if,
            else_stmt,
            position: parser.finish(start),
            free_floating,
        });
    }

    let stmt = Box::new(parse_stmt(parser));

    let mut else_if = Vec::new();
    while parser.check(TokenKind::ElseIf) {
        let branch_start = parser.start();
        let free_floating = parser.take_leading();
        parser.skip();
        let cond = Box::new(expr::parse_parenthesized(parser));
        let stmt = Box::new(parse_stmt(parser));
        else_if.push(ElseIfStmt {
            cond,
            stmt,
            position: parser.finish(branch_start),
            free_floating,
        });
    }

    // `else if` is an else branch holding another if
    let else_stmt = if parser.check(TokenKind::Else) {
        let branch_start = parser.start();
        let free_floating = parser.take_leading();
        parser.skip();
        let stmt = Box::new(parse_stmt(parser));
        Some(ElseStmt {
            stmt,
            position: parser.finish(branch_start),
            free_floating,
        })
    } else {
        None
    };

    Node::IfStmt(IfStmt {
        cond,
        stmt,
        else_if,
        else_stmt,
        position: parser.finish(start),
        free_floating,
    })
}

fn parse_while(parser: &mut Parser) -> Node {
    let start = parser.start();
    let mut free_floating = parser.take_leading();
    parser.skip();
    let cond = Box::new(expr::parse_parenthesized(parser));

    if parser.eat(TokenKind::Colon).is_some() {
        let stmt = Box::new(parse_alt_body(parser, &[TokenKind::EndWhile]));
        finish_alt(parser, TokenKind::EndWhile, &mut free_floating);
        return Node::AltWhileStmt(AltWhileStmt {
            cond,
            stmt,
            position: parser.finish(start),
            free_floating,
        });
    }

    let stmt = Box::new(parse_stmt(parser));
    Node::WhileStmt(WhileStmt {
        cond,
        stmt,
        position: parser.finish(start),
        free_floating,
    })
}

fn parse_do_while(parser: &mut Parser) -> Node {
    let start = parser.start();
    let mut free_floating = parser.take_leading();
    parser.skip();
    let stmt = Box::new(parse_stmt(parser));
    parser.expect(TokenKind::While);
    let cond = Box::new(expr::parse_parenthesized(parser));
    parser.terminate(&mut free_floating, "do-while");
    Node::DoStmt(DoStmt {
        stmt,
        cond,
        position: parser.finish(start),
        free_floating,
    })
}

fn parse_for(parser: &mut Parser) -> Node {
    let start = parser.start();
    let mut free_floating = parser.take_leading();
    parser.skip();
    let opened_at = parser.current_position();
    parser.expect(TokenKind::LeftParen);
    let init = parse_expr_list_until(parser, TokenKind::Semicolon);
    parser.expect(TokenKind::Semicolon);
    let cond = parse_expr_list_until(parser, TokenKind::Semicolon);
    parser.expect(TokenKind::Semicolon);
    let step = parse_expr_list_until(parser, TokenKind::RightParen);
    parser.expect_closing(TokenKind::RightParen, opened_at);

    if parser.eat(TokenKind::Colon).is_some() {
        let stmt = Box::new(parse_alt_body(parser, &[TokenKind::EndFor]));
        finish_alt(parser, TokenKind::EndFor, &mut free_floating);
        return Node::AltForStmt(AltForStmt {
            init,
            cond,
            step,
            stmt,
            position: parser.finish(start),
            free_floating,
        });
    }

    let stmt = Box::new(parse_stmt(parser));
    Node::ForStmt(ForStmt {
        init,
        cond,
        step,
        stmt,
        position: parser.finish(start),
        free_floating,
    })
}

/// The value (or key) slot of `foreach`: a variable, `&$v`, or a list.
fn parse_foreach_target(parser: &mut Parser) -> Node {
    if parser.check(TokenKind::Ampersand) {
        let start = parser.start();
        let free_floating = parser.take_leading();
        parser.skip();
        let variable = expr::parse_expr(parser);
        return Node::ReferenceExpr(ReferenceExpr {
            variable: Box::new(variable),
            position: parser.finish(start),
            free_floating,
        });
    }
    let target = expr::parse_expr(parser);
    if let Node::ShortArrayExpr(array) = &target {
        parser.require_php7("short list syntax", array.position);
    }
    expr::into_list(target)
}

fn parse_foreach(parser: &mut Parser) -> Node {
    let start = parser.start();
    let mut free_floating = parser.take_leading();
    parser.skip();
    let opened_at = parser.current_position();
    parser.expect(TokenKind::LeftParen);
    let expr = Box::new(expr::parse_expr(parser));
    parser.expect(TokenKind::As);
    let first = parse_foreach_target(parser);
    let (key, variable) = if parser.eat(TokenKind::FatArrow).is_some() {
        (Some(Box::new(first)), Box::new(parse_foreach_target(parser)))
    } else {
        (None, Box::new(first))
    };
    parser.expect_closing(TokenKind::RightParen, opened_at);

    if parser.eat(TokenKind::Colon).is_some() {
        let stmt = Box::new(parse_alt_body(parser, &[TokenKind::EndForeach]));
        finish_alt(parser, TokenKind::EndForeach, &mut free_floating);
        return Node::AltForeachStmt(AltForeachStmt {
            expr,
            key,
            variable,
            stmt,
            position: parser.finish(start),
            free_floating,
        });
    }

    let stmt = Box::new(parse_stmt(parser));
    Node::ForeachStmt(ForeachStmt {
        expr,
        key,
        variable,
        stmt,
        position: parser.finish(start),
        free_floating,
    })
}

fn parse_switch(parser: &mut Parser) -> Node {
    let start = parser.start();
    let mut free_floating = parser.take_leading();
    parser.skip();
    let cond = Box::new(expr::parse_parenthesized(parser));

    let list_start = parser.start();
    if parser.eat(TokenKind::Colon).is_some() {
        let cases = parse_cases(parser, TokenKind::EndSwitch);
        let case_list = CaseListStmt {
            cases,
            position: parser.finish(list_start),
            free_floating: Collection::new(),
        };
        finish_alt(parser, TokenKind::EndSwitch, &mut free_floating);
        return Node::AltSwitchStmt(AltSwitchStmt {
            cond,
            case_list,
            position: parser.finish(start),
            free_floating,
        });
    }

    let list_free_floating = parser.take_leading();
    parser.expect(TokenKind::LeftBrace);
    let cases = parse_cases(parser, TokenKind::RightBrace);
    parser.expect_closing(TokenKind::RightBrace, list_start);
    let case_list = CaseListStmt {
        cases,
        position: parser.finish(list_start),
        free_floating: list_free_floating,
    };
    Node::SwitchStmt(SwitchStmt {
        cond,
        case_list,
        position: parser.finish(start),
        free_floating,
    })
}

fn parse_cases(parser: &mut Parser, end: TokenKind) -> Vec<Node> {
    // A leading `;` is allowed: `switch ($a) {; case 1: ...}`
    parser.eat(TokenKind::Semicolon);
    let ends = [TokenKind::Case, TokenKind::Default, end];
    let mut cases = Vec::new();
    while !parser.check(end) && !parser.check(TokenKind::Eof) {
        let start = parser.start();
        let free_floating = parser.take_leading();
        match parser.current_kind() {
            TokenKind::Case => {
                parser.skip();
                let cond = Box::new(expr::parse_expr(parser));
                if parser.eat(TokenKind::Colon).is_none() && parser.eat(TokenKind::Semicolon).is_none() {
                    parser.expect_after(TokenKind::Colon, "case");
                }
                let stmts = parse_stmts_until(parser, &ends, false);
                cases.push(Node::CaseStmt(CaseStmt {
                    cond,
                    stmts,
                    position: parser.finish(start),
                    free_floating,
                }));
            }
            TokenKind::Default => {
                parser.skip();
                if parser.eat(TokenKind::Colon).is_none() && parser.eat(TokenKind::Semicolon).is_none() {
                    parser.expect_after(TokenKind::Colon, "default");
                }
                let stmts = parse_stmts_until(parser, &ends, false);
                cases.push(Node::DefaultStmt(DefaultStmt {
                    stmts,
                    position: parser.finish(start),
                    free_floating,
                }));
            }
            found => {
                parser.error(ParseError::Unexpected {
                    found,
                    position: start,
                });
                parser.synchronize();
                ensure_progress(parser, start);
            }
        }
    }
    cases
}

fn parse_try(parser: &mut Parser) -> Node {
    let start = parser.start();
    let free_floating = parser.take_leading();
    parser.skip();
    let stmts = parse_braced_stmts(parser);

    let mut catches = Vec::new();
    while parser.check(TokenKind::Catch) {
        let catch_start = parser.start();
        let free_floating = parser.take_leading();
        parser.skip();
        let opened_at = parser.current_position();
        parser.expect(TokenKind::LeftParen);
        let mut types = vec![parser.parse_name()];
        while let Some(pipe) = parser.eat(TokenKind::Pipe) {
            parser.require_php7("multi-catch blocks", pipe);
            types.push(parser.parse_name());
        }
        let variable = expr::parse_simple_var(parser);
        parser.expect_closing(TokenKind::RightParen, opened_at);
        let stmts = parse_braced_stmts(parser);
        catches.push(CatchStmt {
            types,
            variable,
            stmts,
            position: parser.finish(catch_start),
            free_floating,
        });
    }

    let finally = if parser.check(TokenKind::Finally) {
        let finally_start = parser.start();
        let free_floating = parser.take_leading();
        parser.skip();
        let stmts = parse_braced_stmts(parser);
        Some(FinallyStmt {
            stmts,
            position: parser.finish(finally_start),
            free_floating,
        })
    } else {
        None
    };

    if catches.is_empty() && finally.is_none() {
        parser.error(ParseError::Expected {
            expected: "'catch' or 'finally'".to_string(),
            found: parser.current_kind(),
            position: parser.current_position(),
        });
    }

    Node::TryStmt(TryStmt {
        stmts,
        catches,
        finally,
        position: parser.finish(start),
        free_floating,
    })
}

/// `declare(ticks=1) stmt`, `declare(...);` and `declare(...): ... enddeclare;`
fn parse_declare(parser: &mut Parser) -> Node {
    let start = parser.start();
    let mut free_floating = parser.take_leading();
    parser.skip();
    let opened_at = parser.current_position();
    parser.expect(TokenKind::LeftParen);
    let mut consts = Vec::new();
    while !parser.check(TokenKind::RightParen) && !parser.check(TokenKind::Eof) {
        consts.push(parse_constant(parser, false, String::new()));
        if parser.eat(TokenKind::Comma).is_none() {
            break;
        }
    }
    parser.expect_closing(TokenKind::RightParen, opened_at);

    let (stmt, alt) = if parser.eat(TokenKind::Colon).is_some() {
        let stmt = parse_alt_body(parser, &[TokenKind::EndDeclare]);
        finish_alt(parser, TokenKind::EndDeclare, &mut free_floating);
        (stmt, true)
    } else if at_terminator(parser) {
        let nop_start = parser.start();
        let mut nop_free_floating = Collection::new();
        parser.terminate(&mut nop_free_floating, "declare");
        let nop = Node::NopStmt(NopStmt {
            position: parser.finish(nop_start),
            free_floating: nop_free_floating,
        });
        (nop, false)
    } else {
        (parse_stmt(parser), false)
    };

    Node::DeclareStmt(DeclareStmt {
        consts,
        stmt: Box::new(stmt),
        alt,
        position: parser.finish(start),
        free_floating,
    })
}

// =============================================================================
// Functions
// =============================================================================

fn parse_function(parser: &mut Parser) -> Node {
    let start = parser.start();
    let doc_comment = parser.take_doc_comment();
    let free_floating = parser.take_leading();
    parser.skip();
    let returns_ref = parser.eat(TokenKind::Ampersand).is_some();
    let function_name = parser.parse_identifier();
    let params = parse_param_list(parser);
    let return_type = parser.parse_return_type();
    let stmts = parse_braced_stmts(parser);
    Node::FunctionStmt(FunctionStmt {
        returns_ref,
        doc_comment,
        function_name,
        params,
        return_type,
        stmts,
        position: parser.finish(start),
        free_floating,
    })
}

/// `( [type] [&] [...] $name [= default], ... )`
pub fn parse_param_list(parser: &mut Parser) -> Vec<Parameter> {
    let opened_at = parser.current_position();
    parser.expect(TokenKind::LeftParen);
    let mut params = Vec::new();
    while !parser.check(TokenKind::RightParen) && !parser.check(TokenKind::Eof) {
        params.push(parse_param(parser));
        if parser.eat(TokenKind::Comma).is_none() {
            break;
        }
    }
    parser.expect_closing(TokenKind::RightParen, opened_at);
    params
}

fn parse_param(parser: &mut Parser) -> Parameter {
    let start = parser.start();
    let free_floating = parser.take_leading();
    let variable_type = if parser.could_be_type_hint() {
        Some(Box::new(parser.parse_type_hint()))
    } else {
        None
    };
    let by_ref = parser.eat(TokenKind::Ampersand).is_some();
    let variadic = parser.eat(TokenKind::Ellipsis).is_some();
    let variable = expr::parse_simple_var(parser);
    let default_value = if parser.eat(TokenKind::Equals).is_some() {
        Some(Box::new(expr::parse_expr(parser)))
    } else {
        None
    };
    Parameter {
        by_ref,
        variadic,
        variable_type,
        variable,
        default_value,
        position: parser.finish(start),
        free_floating,
    }
}

// =============================================================================
// Classes, interfaces, traits
// =============================================================================

fn parse_class(parser: &mut Parser) -> Node {
    let start = parser.start();
    let doc_comment = parser.take_doc_comment();
    let free_floating = parser.take_leading();
    let mut modifiers = Vec::new();
    while matches!(parser.current_kind(), TokenKind::Abstract | TokenKind::Final) {
        modifiers.push(parser.parse_identifier_with(true));
    }
    parser.expect(TokenKind::Class);
    let class_name = Some(parser.parse_identifier());
    let extends = parse_class_extends(parser);
    let implements = parse_class_implements(parser);
    let stmts = parse_class_body(parser);
    Node::ClassStmt(ClassStmt {
        doc_comment,
        class_name,
        modifiers,
        argument_list: None,
        extends,
        implements,
        stmts,
        position: parser.finish(start),
        free_floating,
    })
}

fn parse_name_list(parser: &mut Parser) -> Vec<Node> {
    let mut names = vec![parser.parse_name()];
    while parser.eat(TokenKind::Comma).is_some() {
        names.push(parser.parse_name());
    }
    names
}

pub fn parse_class_extends(parser: &mut Parser) -> Option<ClassExtendsStmt> {
    if !parser.check(TokenKind::Extends) {
        return None;
    }
    let start = parser.start();
    let free_floating = parser.take_leading();
    parser.skip();
    let class_name = Box::new(parser.parse_name());
    Some(ClassExtendsStmt {
        class_name,
        position: parser.finish(start),
        free_floating,
    })
}

pub fn parse_class_implements(parser: &mut Parser) -> Option<ClassImplementsStmt> {
    if !parser.check(TokenKind::Implements) {
        return None;
    }
    let start = parser.start();
    let free_floating = parser.take_leading();
    parser.skip();
    let interface_names = parse_name_list(parser);
    Some(ClassImplementsStmt {
        interface_names,
        position: parser.finish(start),
        free_floating,
    })
}

/// `{ members }` of a class, interface or trait.
pub fn parse_class_body(parser: &mut Parser) -> Vec<Node> {
    let opened_at = parser.current_position();
    if parser.expect(TokenKind::LeftBrace).is_none() {
        return Vec::new();
    }
    let mut members = Vec::new();
    while !parser.check(TokenKind::RightBrace) && !parser.check(TokenKind::Eof) {
        let before = parser.current_position();
        if let Some(member) = parse_class_member(parser) {
            members.push(member);
        }
        ensure_progress(parser, before);
    }
    parser.expect_closing(TokenKind::RightBrace, opened_at);
    members
}

fn is_member_modifier(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Public
            | TokenKind::Protected
            | TokenKind::Private
            | TokenKind::Static
            | TokenKind::Abstract
            | TokenKind::Final
            | TokenKind::Var
    )
}

fn parse_class_member(parser: &mut Parser) -> Option<Node> {
    let start = parser.start();
    if parser.check(TokenKind::Use) {
        return Some(parse_trait_use(parser));
    }

    let doc_comment = parser.take_doc_comment();
    let free_floating = parser.take_leading();
    let mut modifiers = Vec::new();
    while is_member_modifier(parser.current_kind()) {
        modifiers.push(parser.parse_identifier_with(true));
    }

    match parser.current_kind() {
        TokenKind::Const => {
            if let Some(first) = modifiers.first() {
                parser.require_php7("class constant modifiers", first.position);
            }
            let mut free_floating = free_floating;
            parser.skip();
            let mut consts = Vec::new();
            loop {
                consts.push(parse_constant(parser, true, doc_comment.clone()));
                if parser.eat(TokenKind::Comma).is_none() {
                    break;
                }
            }
            parser.terminate(&mut free_floating, "class constant");
            Some(Node::ClassConstListStmt(ClassConstListStmt {
                doc_comment,
                modifiers,
                consts,
                position: parser.finish(start),
                free_floating,
            }))
        }
        TokenKind::Function => {
            parser.skip();
            let returns_ref = parser.eat(TokenKind::Ampersand).is_some();
            let method_name = parser.parse_identifier_with(true);
            let params = parse_param_list(parser);
            let return_type = parser.parse_return_type();
            let stmt = if at_terminator(parser) {
                let nop_start = parser.start();
                let mut nop_free_floating = Collection::new();
                parser.terminate(&mut nop_free_floating, "method declaration");
                Node::NopStmt(NopStmt {
                    position: parser.finish(nop_start),
                    free_floating: nop_free_floating,
                })
            } else {
                Node::StmtList(parse_block(parser))
            };
            Some(Node::ClassMethodStmt(ClassMethodStmt {
                returns_ref,
                doc_comment,
                method_name,
                modifiers,
                params,
                return_type,
                stmt: Box::new(stmt),
                position: parser.finish(start),
                free_floating,
            }))
        }
        TokenKind::Variable => Some(parse_property_list(
            parser,
            start,
            free_floating,
            doc_comment,
            modifiers,
            None,
        )),
        _ if !modifiers.is_empty() && parser.could_be_type_hint() => {
            let property_type = parser.parse_type_hint();
            parser.require_php7("typed properties", property_type.position());
            Some(parse_property_list(
                parser,
                start,
                free_floating,
                doc_comment,
                modifiers,
                Some(Box::new(property_type)),
            ))
        }
        found => {
            parser.error(ParseError::Unexpected {
                found,
                position: parser.current_position(),
            });
            parser.synchronize();
            None
        }
    }
}

fn parse_property_list(
    parser: &mut Parser,
    start: Position,
    mut free_floating: Collection,
    doc_comment: String,
    modifiers: Vec<Identifier>,
    property_type: Option<Box<Node>>,
) -> Node {
    let mut properties = Vec::new();
    loop {
        let property_start = parser.start();
        let own_doc = parser.take_doc_comment();
        let variable = expr::parse_simple_var(parser);
        let expr = if parser.eat(TokenKind::Equals).is_some() {
            Some(Box::new(expr::parse_expr(parser)))
        } else {
            None
        };
        properties.push(PropertyStmt {
            doc_comment: if own_doc.is_empty() {
                doc_comment.clone()
            } else {
                own_doc
            },
            variable,
            expr,
            position: parser.finish(property_start),
            free_floating: Collection::new(),
        });
        if parser.eat(TokenKind::Comma).is_none() {
            break;
        }
    }
    parser.terminate(&mut free_floating, "property declaration");
    Node::PropertyListStmt(PropertyListStmt {
        doc_comment,
        modifiers,
        property_type,
        properties,
        position: parser.finish(start),
        free_floating,
    })
}

/// `NAME = expr`. Class constants may be named after keywords.
fn parse_constant(parser: &mut Parser, keywords: bool, fallback_doc: String) -> ConstantStmt {
    let start = parser.start();
    let own_doc = parser.take_doc_comment();
    let free_floating = parser.take_leading();
    let constant_name = parser.parse_identifier_with(keywords);
    parser.expect(TokenKind::Equals);
    let expr = expr::parse_expr(parser);
    ConstantStmt {
        doc_comment: if own_doc.is_empty() { fallback_doc } else { own_doc },
        constant_name,
        expr: Box::new(expr),
        position: parser.finish(start),
        free_floating,
    }
}

/// `use A, B;` or `use A, B { adaptations }` inside a class body.
fn parse_trait_use(parser: &mut Parser) -> Node {
    let start = parser.start();
    let free_floating = parser.take_leading();
    parser.skip();
    let traits = parse_name_list(parser);

    let adaptation_list = if parser.check(TokenKind::LeftBrace) {
        let list_start = parser.start();
        let list_free_floating = parser.take_leading();
        parser.skip();
        let mut adaptations = Vec::new();
        while !parser.check(TokenKind::RightBrace) && !parser.check(TokenKind::Eof) {
            let before = parser.current_position();
            adaptations.push(parse_trait_adaptation(parser));
            ensure_progress(parser, before);
        }
        parser.expect_closing(TokenKind::RightBrace, list_start);
        Node::TraitAdaptationListStmt(TraitAdaptationListStmt {
            adaptations,
            position: parser.finish(list_start),
            free_floating: list_free_floating,
        })
    } else {
        let nop_start = parser.start();
        let mut nop_free_floating = Collection::new();
        parser.terminate(&mut nop_free_floating, "trait use");
        Node::NopStmt(NopStmt {
            position: parser.finish(nop_start),
            free_floating: nop_free_floating,
        })
    };

    Node::TraitUseStmt(TraitUseStmt {
        traits,
        adaptation_list: Box::new(adaptation_list),
        position: parser.finish(start),
        free_floating,
    })
}

/// `[Trait::]method`
fn parse_trait_method_ref(parser: &mut Parser) -> TraitMethodRefStmt {
    let start = parser.start();
    let free_floating = parser.take_leading();
    let qualified = parser.at_name()
        && matches!(
            parser.peek_kind(),
            TokenKind::DoubleColon | TokenKind::Backslash
        );
    let trait_name = if qualified || parser.check(TokenKind::Backslash) {
        let name = parser.parse_name();
        parser.expect(TokenKind::DoubleColon);
        Some(Box::new(name))
    } else {
        None
    };
    let method = parser.parse_identifier_with(true);
    TraitMethodRefStmt {
        trait_name,
        method,
        position: parser.finish(start),
        free_floating,
    }
}

fn parse_trait_adaptation(parser: &mut Parser) -> Node {
    let start = parser.start();
    let trait_ref = parse_trait_method_ref(parser);
    let mut free_floating = Collection::new();

    if parser.eat(TokenKind::Insteadof).is_some() {
        let insteadof = parse_name_list(parser);
        parser.terminate(&mut free_floating, "insteadof");
        return Node::TraitUsePrecedenceStmt(TraitUsePrecedenceStmt {
            trait_ref,
            insteadof,
            position: parser.finish(start),
            free_floating,
        });
    }

    parser.expect(TokenKind::As);
    let modifier = if matches!(
        parser.current_kind(),
        TokenKind::Public | TokenKind::Protected | TokenKind::Private
    ) {
        Some(parser.parse_identifier_with(true))
    } else {
        None
    };
    let alias = if at_terminator(parser) {
        None
    } else {
        Some(parser.parse_identifier_with(true))
    };
    parser.terminate(&mut free_floating, "trait alias");
    Node::TraitUseAliasStmt(TraitUseAliasStmt {
        trait_ref,
        modifier,
        alias,
        position: parser.finish(start),
        free_floating,
    })
}

fn parse_interface(parser: &mut Parser) -> Node {
    let start = parser.start();
    let doc_comment = parser.take_doc_comment();
    let free_floating = parser.take_leading();
    parser.skip();
    let interface_name = parser.parse_identifier();
    let extends = if parser.check(TokenKind::Extends) {
        let extends_start = parser.start();
        let free_floating = parser.take_leading();
        parser.skip();
        let interface_names = parse_name_list(parser);
        Some(InterfaceExtendsStmt {
            interface_names,
            position: parser.finish(extends_start),
            free_floating,
        })
    } else {
        None
    };
    let stmts = parse_class_body(parser);
    Node::InterfaceStmt(InterfaceStmt {
        doc_comment,
        interface_name,
        extends,
        stmts,
        position: parser.finish(start),
        free_floating,
    })
}

fn parse_trait(parser: &mut Parser) -> Node {
    let start = parser.start();
    let doc_comment = parser.take_doc_comment();
    let free_floating = parser.take_leading();
    parser.skip();
    let trait_name = parser.parse_identifier();
    let stmts = parse_class_body(parser);
    Node::TraitStmt(TraitStmt {
        doc_comment,
        trait_name,
        stmts,
        position: parser.finish(start),
        free_floating,
    })
}

// =============================================================================
// Namespaces and imports
// =============================================================================

fn parse_namespace(parser: &mut Parser) -> Node {
    let start = parser.start();
    let mut free_floating = parser.take_leading();
    parser.skip();

    let namespace_name = if parser.check(TokenKind::LeftBrace) {
        None
    } else {
        Some(Box::new(parser.parse_name()))
    };

    let stmts = if parser.check(TokenKind::LeftBrace) {
        let opened_at = parser.current_position();
        parser.skip();
        let stmts = parse_stmts_until(parser, &[TokenKind::RightBrace], true);
        parser.expect_closing(TokenKind::RightBrace, opened_at);
        Some(stmts)
    } else {
        parser.terminate(&mut free_floating, "namespace declaration");
        None
    };

    Node::NamespaceStmt(NamespaceStmt {
        namespace_name,
        stmts,
        position: parser.finish(start),
        free_floating,
    })
}

/// `function` or `const` after `use`.
fn parse_use_type(parser: &mut Parser) -> Option<Identifier> {
    if matches!(parser.current_kind(), TokenKind::Function | TokenKind::Const) {
        Some(parser.parse_identifier_with(true))
    } else {
        None
    }
}

fn parse_use_alias(parser: &mut Parser) -> Option<Identifier> {
    parser.eat(TokenKind::As)?;
    Some(parser.parse_identifier())
}

fn parse_use(parser: &mut Parser) -> Node {
    let start = parser.start();
    let mut free_floating = parser.take_leading();
    parser.skip();
    let use_type = parse_use_type(parser);

    let first_start = parser.start();
    let first_name = parser.parse_name();

    // Group use: `use A\{B, C as D};`
    if parser.check(TokenKind::Backslash) && parser.peek_kind() == TokenKind::LeftBrace {
        parser.require_php7("group use declarations", parser.finish(start));
        parser.skip();
        let opened_at = parser.current_position();
        parser.skip();
        let mut use_list = Vec::new();
        while !parser.check(TokenKind::RightBrace) && !parser.check(TokenKind::Eof) {
            let item_start = parser.start();
            let item_free_floating = parser.take_leading();
            let item_type = parse_use_type(parser);
            let use_name = Box::new(parser.parse_name());
            let alias = parse_use_alias(parser);
            use_list.push(UseStmt {
                use_type: item_type,
                use_name,
                alias,
                position: parser.finish(item_start),
                free_floating: item_free_floating,
            });
            if parser.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        parser.expect_closing(TokenKind::RightBrace, opened_at);
        parser.terminate(&mut free_floating, "use declaration");
        return Node::GroupUseStmt(GroupUseStmt {
            use_type,
            prefix: Box::new(first_name),
            use_list,
            position: parser.finish(start),
            free_floating,
        });
    }

    let alias = parse_use_alias(parser);
    let mut uses = vec![UseStmt {
        use_type: None,
        use_name: Box::new(first_name),
        alias,
        position: parser.finish(first_start),
        free_floating: Collection::new(),
    }];
    while parser.eat(TokenKind::Comma).is_some() {
        let item_start = parser.start();
        let item_free_floating = parser.take_leading();
        let use_name = Box::new(parser.parse_name());
        let alias = parse_use_alias(parser);
        uses.push(UseStmt {
            use_type: None,
            use_name,
            alias,
            position: parser.finish(item_start),
            free_floating: item_free_floating,
        });
    }
    parser.terminate(&mut free_floating, "use declaration");
    Node::UseListStmt(UseListStmt {
        use_type,
        uses,
        position: parser.finish(start),
        free_floating,
    })
}

fn parse_const(parser: &mut Parser) -> Node {
    let start = parser.start();
    let doc_comment = parser.take_doc_comment();
    let mut free_floating = parser.take_leading();
    parser.skip();
    let mut consts = Vec::new();
    loop {
        consts.push(parse_constant(parser, false, doc_comment.clone()));
        if parser.eat(TokenKind::Comma).is_none() {
            break;
        }
    }
    parser.terminate(&mut free_floating, "const declaration");
    Node::ConstListStmt(ConstListStmt {
        consts,
        position: parser.finish(start),
        free_floating,
    })
}

/// `__halt_compiler();` Nothing after it is tokenized; the raw rest of the
/// file is kept as trivia.
fn parse_halt_compiler(parser: &mut Parser) -> Node {
    let start = parser.start();
    let mut free_floating = parser.take_leading();
    parser.skip();
    let opened_at = parser.current_position();
    parser.expect(TokenKind::LeftParen);
    parser.expect_closing(TokenKind::RightParen, opened_at);
    parser.halt_compiler(&mut free_floating);
    parser.terminate(&mut free_floating, "__halt_compiler()");
    Node::HaltCompilerStmt(HaltCompilerStmt {
        position: parser.finish(start),
        free_floating,
    })
}
