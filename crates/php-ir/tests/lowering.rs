use php_ast::{walk, AstNode, Visitor};
use php_ir::{
    canonical_key, lower, AssignOp, BinaryOp, Node, NodeRef, NodeSet, Shape, UnaryOp,
};
use php_rs_parser::{parse, parse_with, Dialect, ParserConfig};
use proptest::prelude::*;

fn lower_source(source: &str) -> php_ir::Root {
    let result = parse(source);
    assert!(result.errors.is_empty(), "{:#?}", result.errors);
    lower(result.root).unwrap()
}

/// The expression of the `index`th statement, which must be an
/// `ExpressionStmt`.
fn expr_of(root: &php_ir::Root, index: usize) -> &Node {
    match &root.stmts[index] {
        Node::ExpressionStmt(stmt) => &stmt.expr,
        other => panic!("expected ExpressionStmt, got {}", other.type_name()),
    }
}

#[derive(Default)]
struct TypeNames(Vec<&'static str>);

impl<'a> Visitor<NodeRef<'a>> for TypeNames {
    fn enter_node(&mut self, node: NodeRef<'a>) -> bool {
        self.0.push(node.type_name());
        true
    }
}

// =============================================================================
// Canonicalization
// =============================================================================

#[test]
fn test_assignments_fold_into_assign() {
    let root = lower_source("<?php $a += 1; $a = 2; $a ??= 3; $a **= 4; $a =& $b;");
    let ops: Vec<_> = (0..4)
        .map(|i| match expr_of(&root, i) {
            Node::Assign(assign) => assign.op,
            other => panic!("expected Assign, got {}", other.type_name()),
        })
        .collect();
    assert_eq!(
        ops,
        [AssignOp::Plus, AssignOp::Assign, AssignOp::Coalesce, AssignOp::Pow]
    );
    assert!(matches!(expr_of(&root, 4), Node::AssignReference(_)));
}

#[test]
fn test_binary_operators_fold_into_binary_expr() {
    let root = lower_source("<?php $a . $b; $a <=> $b; $a and $b; $a ?? $b;");
    let ops: Vec<_> = (0..4)
        .map(|i| match expr_of(&root, i) {
            Node::BinaryExpr(expr) => expr.op,
            other => panic!("expected BinaryExpr, got {}", other.type_name()),
        })
        .collect();
    assert_eq!(
        ops,
        [BinaryOp::Concat, BinaryOp::Spaceship, BinaryOp::LogicalAnd, BinaryOp::Coalesce]
    );
}

#[test]
fn test_unary_operators() {
    let root = lower_source("<?php -$a; !$a; ++$a; $a--;");
    match expr_of(&root, 0) {
        Node::UnaryPrefixExpr(expr) => assert_eq!(expr.op, UnaryOp::Minus),
        other => panic!("{}", other.type_name()),
    }
    match expr_of(&root, 1) {
        Node::UnaryPrefixExpr(expr) => assert_eq!(expr.op, UnaryOp::BooleanNot),
        other => panic!("{}", other.type_name()),
    }
    match expr_of(&root, 2) {
        Node::UnaryPrefixExpr(expr) => assert_eq!(expr.op, UnaryOp::Increment),
        other => panic!("{}", other.type_name()),
    }
    match expr_of(&root, 3) {
        Node::UnaryPostfixExpr(expr) => assert_eq!(expr.op, UnaryOp::Decrement),
        other => panic!("{}", other.type_name()),
    }
}

#[test]
fn test_casts_use_canonical_type_names() {
    let root = lower_source(
        "<?php (int)$a; (integer)$a; (double)$a; (real)$a; (binary)$a; (boolean)$a; (array)$a; (object)$a; (unset)$a;",
    );
    let names: Vec<_> = (0..8)
        .map(|i| match expr_of(&root, i) {
            Node::TypeCastExpr(cast) => cast.type_name.as_str(),
            other => panic!("expected TypeCastExpr, got {}", other.type_name()),
        })
        .collect();
    assert_eq!(
        names,
        ["int", "int", "float", "float", "string", "bool", "array", "object"]
    );
    assert!(matches!(expr_of(&root, 8), Node::UnsetCastExpr(_)));
}

#[test]
fn test_includes_become_import_expr() {
    let root = lower_source(
        "<?php include 'a.php'; include_once 'b.php'; require 'c.php'; require_once 'd.php';",
    );
    let funcs: Vec<_> = (0..4)
        .map(|i| match expr_of(&root, i) {
            Node::ImportExpr(import) => import.func.as_str(),
            other => panic!("expected ImportExpr, got {}", other.type_name()),
        })
        .collect();
    assert_eq!(funcs, ["include", "include_once", "require", "require_once"]);
}

#[test]
fn test_arrays_and_lists_record_syntax() {
    let root = lower_source("<?php array(1); [1]; list($a) = $b; [$a, , $c] = $d;");
    match expr_of(&root, 0) {
        Node::ArrayExpr(array) => assert!(!array.short_syntax),
        other => panic!("{}", other.type_name()),
    }
    match expr_of(&root, 1) {
        Node::ArrayExpr(array) => assert!(array.short_syntax),
        other => panic!("{}", other.type_name()),
    }
    match expr_of(&root, 2) {
        Node::Assign(assign) => {
            assert!(matches!(&*assign.variable, Node::ListExpr(list) if !list.short_syntax))
        }
        other => panic!("{}", other.type_name()),
    }
    match expr_of(&root, 3) {
        Node::Assign(assign) => match &*assign.variable {
            Node::ListExpr(list) => {
                assert!(list.short_syntax);
                assert_eq!(list.items.len(), 3);
                assert!(list.items[1].position.is_none());
                assert!(list.items[1].val.is_none());
            }
            other => panic!("{}", other.type_name()),
        },
        other => panic!("{}", other.type_name()),
    }
}

#[test]
fn test_alternative_syntax_sets_flag() {
    let root = lower_source(
        "<?php
        if ($a): elseif ($b): else: endif;
        while ($a): endwhile;
        for (;;): endfor;
        foreach ($a as $b): endforeach;
        switch ($a): endswitch;
        if ($a) {} elseif ($b) {} else {}
        while ($a) {}",
    );
    match &root.stmts[0] {
        Node::IfStmt(stmt) => {
            assert!(stmt.alt_syntax);
            assert!(stmt.else_if[0].alt_syntax);
            assert!(stmt.else_stmt.as_ref().is_some_and(|e| e.alt_syntax));
        }
        other => panic!("{}", other.type_name()),
    }
    assert!(matches!(&root.stmts[1], Node::WhileStmt(s) if s.alt_syntax));
    assert!(matches!(&root.stmts[2], Node::ForStmt(s) if s.alt_syntax));
    assert!(matches!(&root.stmts[3], Node::ForeachStmt(s) if s.alt_syntax));
    assert!(matches!(&root.stmts[4], Node::SwitchStmt(s) if s.alt_syntax));
    match &root.stmts[5] {
        Node::IfStmt(stmt) => {
            assert!(!stmt.alt_syntax);
            assert!(!stmt.else_if[0].alt_syntax);
        }
        other => panic!("{}", other.type_name()),
    }
    assert!(matches!(&root.stmts[6], Node::WhileStmt(s) if !s.alt_syntax));
}

#[test]
fn test_no_surface_only_types_remain() {
    let root = lower_source(
        "<?php $a -= (string)$c[0] . include 'x.php'; $d = [1]; if ($a): endif; $b++;",
    );
    let mut names = TypeNames::default();
    walk(&mut names, &root);
    for surface_only in ["AssignMinus", "CastString", "ShortArrayExpr", "IncludeExpr", "AltIfStmt", "PostIncExpr", "ConcatExpr"] {
        assert!(!names.0.contains(&surface_only), "{surface_only} in {:?}", names.0);
    }
    assert!(names.0.contains(&"BinaryExpr"));
}

// =============================================================================
// Positions, trivia and absence
// =============================================================================

#[test]
fn test_positions_and_trivia_carry_over() {
    let source = "<?php\n// lead\n$a = $b + 1;\n";
    let surface = parse(source);
    let surface_stmt = surface.root.stmts[0].clone();
    let root = lower(surface.root).unwrap();
    assert_eq!(root.stmts[0].position(), surface_stmt.position());
    assert_eq!(root.stmts[0].free_floating(), surface_stmt.free_floating());
}

#[test]
fn test_absent_children_stay_absent() {
    let root = lower_source("<?php return; namespace A; namespace B {} function f() {}");
    assert!(matches!(&root.stmts[0], Node::ReturnStmt(r) if r.expr.is_none()));
    assert!(matches!(&root.stmts[1], Node::NamespaceStmt(n) if n.stmts.is_none()));
    assert!(matches!(&root.stmts[2], Node::NamespaceStmt(n) if n.stmts.as_ref().is_some_and(Vec::is_empty)));
    match &root.stmts[3] {
        Node::FunctionStmt(f) => {
            assert!(f.return_type.is_none());
            assert!(f.params.is_empty());
        }
        other => panic!("{}", other.type_name()),
    }
}

#[test]
fn test_string_values_are_interpreted() {
    let root = lower_source(r#"<?php 'a\n'; "b\n\x41"; "$c[key]";"#);
    assert!(matches!(expr_of(&root, 0), Node::StringLiteral(s) if !s.double_quotes && s.value == "a\\n"));
    assert!(matches!(expr_of(&root, 1), Node::StringLiteral(s) if s.double_quotes && s.value == "b\nA"));
    match expr_of(&root, 2) {
        Node::Encapsed(encapsed) => match &encapsed.parts[0] {
            Node::ArrayDimFetchExpr(fetch) => {
                assert!(matches!(fetch.dim.as_deref(), Some(Node::StringLiteral(s)) if s.value == "key"))
            }
            other => panic!("expected ArrayDimFetchExpr, got {}", other.type_name()),
        },
        other => panic!("expected Encapsed, got {}", other.type_name()),
    }
}

#[test]
fn test_invalid_escapes_lower_to_bad_string() {
    let result = parse(r#"<?php "\u{41"; "\400"; 'ok';"#);
    assert_eq!(result.errors.len(), 2);
    let root = lower(result.root).unwrap();
    match expr_of(&root, 0) {
        Node::BadString(bad) => {
            assert_eq!(bad.value, "\\u{41");
            assert_eq!(bad.error, "missing closing '}' for UTF-8 codepoint escape");
            assert_eq!(bad.position.range(), Some(6..13));
        }
        other => panic!("expected BadString, got {}", other.type_name()),
    }
    assert!(matches!(expr_of(&root, 1), Node::BadString(s) if s.value == "\\400"));
    assert!(matches!(expr_of(&root, 2), Node::StringLiteral(s) if s.value == "ok"));
}

#[test]
fn test_syntax_errors_lower_to_bad_nodes() {
    let result = parse("<?php $a = ; $b = 1;");
    assert_eq!(result.errors.len(), 1);
    let root = lower(result.root).unwrap();
    match expr_of(&root, 0) {
        Node::Assign(assign) => match &*assign.expression {
            Node::BadExpr(bad) => assert_eq!(bad.position.range(), Some(11..11)),
            other => panic!("expected BadExpr, got {}", other.type_name()),
        },
        other => panic!("expected Assign, got {}", other.type_name()),
    }
    assert!(matches!(expr_of(&root, 1), Node::Assign(_)));
}

#[test]
fn test_too_deep_statement_lowers_to_bad_stmt() {
    let depth = 40;
    let source = format!("<?php {}{} $after;", "if ($a) { ".repeat(depth), "}".repeat(depth));
    let result = parse(&source);
    assert_eq!(result.errors.len(), 1);
    let mut names = TypeNames::default();
    walk(&mut names, &lower(result.root).unwrap());
    assert!(names.0.contains(&"BadStmt"));
}

#[test]
fn test_namespace_resolves_relative_names() {
    let root = lower_source(
        "<?php namespace\\f(); namespace App\\Models; namespace\\User::find(); \\strlen(); Foo\\bar();
        namespace Other { namespace\\g(); }
        namespace { namespace\\h(); }",
    );
    let callee = |stmt: &Node| match stmt {
        Node::ExpressionStmt(stmt) => match &*stmt.expr {
            Node::FunctionCallExpr(call) => match &*call.function {
                Node::Name(name) => name.value.clone(),
                other => panic!("expected Name, got {}", other.type_name()),
            },
            Node::StaticCallExpr(call) => match &*call.class {
                Node::Name(name) => name.value.clone(),
                other => panic!("expected Name, got {}", other.type_name()),
            },
            other => panic!("expected a call, got {}", other.type_name()),
        },
        other => panic!("expected ExpressionStmt, got {}", other.type_name()),
    };
    let braced = |stmt: &Node| match stmt {
        Node::NamespaceStmt(ns) => callee(&ns.stmts.as_ref().expect("braced namespace")[0]),
        other => panic!("expected NamespaceStmt, got {}", other.type_name()),
    };
    assert_eq!(callee(&root.stmts[0]), "\\f");
    assert_eq!(callee(&root.stmts[2]), "\\App\\Models\\User");
    assert_eq!(callee(&root.stmts[3]), "\\strlen");
    assert_eq!(callee(&root.stmts[4]), "Foo\\bar");
    assert_eq!(braced(&root.stmts[5]), "\\Other\\g");
    assert_eq!(braced(&root.stmts[6]), "\\h");
}

#[test]
fn test_anonymous_class_is_an_expression() {
    let root = lower_source("<?php new class($x) extends A { public $p; }; class B {}");
    match expr_of(&root, 0) {
        Node::NewExpr(new) => match &*new.class {
            Node::AnonClassExpr(class) => {
                assert_eq!(class.argument_list.as_ref().map(|a| a.arguments.len()), Some(1));
                assert!(class.extends.is_some());
                assert_eq!(class.stmts.len(), 1);
            }
            other => panic!("expected AnonClassExpr, got {}", other.type_name()),
        },
        other => panic!("expected NewExpr, got {}", other.type_name()),
    }
    assert!(matches!(&root.stmts[1], Node::ClassStmt(class) if class.class_name.value == "B"));
}

#[test]
fn test_dialects_lower_to_same_ir() {
    let source = "<?php $a = [1, 2]; echo $a[0] . 'x';";
    let php5 = parse_with(
        source,
        ParserConfig {
            dialect: Dialect::Php5,
            ..ParserConfig::default()
        },
    );
    assert!(php5.errors.is_empty());
    assert_eq!(lower(php5.root).unwrap(), lower_source(source));
}

#[test]
fn test_canonical_key_of_lowered_expression() {
    let root = lower_source("<?php $a += B::C;");
    insta::assert_snapshot!(canonical_key(expr_of(&root, 0)), @r#"(Assign :op += :variable (SimpleVar :name "a") :expression (ClassConstFetchExpr :class (Name :value "B") :constant_name (Identifier :value "C")))"#);
}

// =============================================================================
// NodeSet
// =============================================================================

fn conditions(root: &php_ir::Root) -> Vec<&Node> {
    match &root.stmts[0] {
        Node::IfStmt(stmt) => std::iter::once(&*stmt.cond)
            .chain(stmt.else_if.iter().map(|e| &*e.cond))
            .collect(),
        other => panic!("expected IfStmt, got {}", other.type_name()),
    }
}

#[test]
fn test_nodeset_finds_repeated_condition() {
    let root = lower_source(
        "<?php if ($a == 1) {} elseif ($b) {} elseif ($a == 1) {} elseif ($a == 2) {}",
    );
    let mut set = NodeSet::new();
    let added: Vec<_> = conditions(&root).into_iter().map(|c| set.add(c)).collect();
    assert_eq!(added, [true, true, false, true]);
    assert_eq!(set.len(), 3);
}

#[test]
fn test_nodeset_switch_cases_past_threshold() {
    let mut source = String::from("<?php switch ($x) {");
    for i in 0..12 {
        source.push_str(&format!(" case Foo::BAR{i}: break;"));
    }
    source.push_str(" case Foo::BAR3: case Foo::BAR11: }");
    let root = lower_source(&source);
    let Node::SwitchStmt(switch) = &root.stmts[0] else {
        panic!("expected SwitchStmt");
    };
    let mut set = NodeSet::new();
    let duplicates: Vec<_> = switch
        .case_list
        .cases
        .iter()
        .filter_map(|case| match case {
            Node::CaseStmt(case) => Some(case),
            _ => None,
        })
        .filter(|case| !set.add(&case.cond))
        .map(|case| canonical_key(&case.cond))
        .collect();
    assert_eq!(duplicates.len(), 2);
    assert!(duplicates[0].contains("BAR3"));
    assert!(duplicates[1].contains("BAR11"));
    assert_eq!(set.len(), 12);
}

proptest! {
    #[test]
    fn prop_nodeset_counts_distinct_values(values in prop::collection::vec(0u8..16, 0..64)) {
        let mut set = NodeSet::new();
        let mut seen = std::collections::HashSet::new();
        for (i, value) in values.iter().enumerate() {
            let node = lower_source(&format!("<?php {}{value};", " ".repeat(i % 3)));
            let expr = expr_of(&node, 0).clone();
            prop_assert_eq!(set.add(&expr), seen.insert(*value));
        }
        prop_assert_eq!(set.len(), seen.len());
    }

    #[test]
    fn prop_same_shape_agrees_with_key(a in 0u8..4, b in 0u8..4, op_a in 0usize..3, op_b in 0usize..3) {
        const OPS: [&str; 3] = ["+", "-", "."];
        let left = lower_source(&format!("<?php $v{a} {} 1;", OPS[op_a]));
        let right = lower_source(&format!("<?php  $v{b} {} 1;", OPS[op_b]));
        let (left, right) = (expr_of(&left, 0), expr_of(&right, 0));
        prop_assert_eq!(left.same_shape(right), canonical_key(left) == canonical_key(right));
        prop_assert_eq!(left.same_shape(right), a == b && op_a == op_b);
    }
}
