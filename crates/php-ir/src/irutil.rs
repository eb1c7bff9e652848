//! Small helpers over IR nodes.

use php_ast::{Visitor, Walk};

use crate::ir::{Node, NodeRef};
use crate::shape::Shape;

/// Reset positions and trivia in place, recursively.
pub trait Detach {
    fn detach(&mut self);
}

impl Detach for String {
    fn detach(&mut self) {}
}

impl Detach for bool {
    fn detach(&mut self) {}
}

impl<T: Detach + ?Sized> Detach for Box<T> {
    fn detach(&mut self) {
        (**self).detach();
    }
}

impl<T: Detach> Detach for Option<T> {
    fn detach(&mut self) {
        if let Some(inner) = self {
            inner.detach();
        }
    }
}

impl<T: Detach> Detach for Vec<T> {
    fn detach(&mut self) {
        self.iter_mut().for_each(Detach::detach);
    }
}

/// `node` with every enclosing `(...)` removed.
pub fn unparen(mut node: &Node) -> &Node {
    while let Node::ParenExpr(paren) = node {
        node = &paren.expr;
    }
    node
}

/// Structural equality: positions and trivia do not count.
pub fn node_equal(a: &Node, b: &Node) -> bool {
    a.same_shape(b)
}

pub fn node_slice_equal(a: &[Node], b: &[Node]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(a, b)| node_equal(a, b))
}

/// A deep copy with no positions and no trivia, for building nodes that do
/// not come from the source.
pub fn clone_detached(node: &Node) -> Node {
    let mut copy = node.clone();
    copy.detach();
    copy
}

/// Whether `node` writes its left side: `=`, a compound assignment or `=&`.
pub fn is_assign(node: &Node) -> bool {
    matches!(node, Node::Assign(_) | Node::AssignReference(_))
}

struct Finder<'w> {
    what: &'w Node,
    found: bool,
}

impl<'a> Visitor<NodeRef<'a>> for Finder<'_> {
    fn enter_node(&mut self, node: NodeRef<'a>) -> bool {
        if !self.found && node.same_shape_as(self.what) {
            self.found = true;
        }
        !self.found
    }
}

/// Whether a node structurally equal to `what` occurs in `within`, `within`
/// itself included.
pub fn find(what: &Node, within: &Node) -> bool {
    let mut finder = Finder { what, found: false };
    within.walk(&mut finder);
    finder.found
}

#[cfg(test)]
mod tests {
    use php_ast::Position;

    use super::*;
    use crate::fmt::print;
    use crate::shape::canonical_key;

    fn stmts(source: &str) -> Vec<Node> {
        let result = php_rs_parser::parse(source);
        assert!(result.errors.is_empty(), "{:#?}", result.errors);
        crate::lower(result.root).unwrap().stmts
    }

    fn exprs(source: &str) -> Vec<Node> {
        stmts(source)
            .into_iter()
            .map(|stmt| match stmt {
                Node::ExpressionStmt(stmt) => *stmt.expr,
                other => panic!("expected ExpressionStmt, got {}", other.type_name()),
            })
            .collect()
    }

    /// Position of every node, and whether any node carries trivia.
    #[derive(Default)]
    struct Layout {
        positions: Vec<Position>,
        trivia: bool,
    }

    impl Layout {
        fn of(node: &Node) -> Self {
            let mut layout = Layout::default();
            node.walk(&mut layout);
            layout
        }
    }

    impl<'a> Visitor<NodeRef<'a>> for Layout {
        fn enter_node(&mut self, node: NodeRef<'a>) -> bool {
            self.positions.push(node.position());
            self.trivia |= !node.free_floating().is_empty();
            true
        }
    }

    #[test]
    fn test_unparen() {
        let exprs = exprs("<?php ((($a + 1))); $b;");
        insta::assert_snapshot!(print(unparen(&exprs[0])), @"$a + 1");
        assert!(std::ptr::eq(unparen(&exprs[1]), &exprs[1]));
    }

    #[test]
    fn test_node_equal_ignores_layout() {
        let exprs = exprs("<?php $a + 1; $a /* x */ +\n 1; $a + 2;");
        assert!(node_equal(&exprs[0], &exprs[1]));
        assert!(!node_equal(&exprs[0], &exprs[2]));
        assert!(node_slice_equal(&exprs[..1], &exprs[1..2]));
        assert!(!node_slice_equal(&exprs[..2], &exprs[1..]));
        assert!(!node_slice_equal(&exprs[..1], &exprs[..2]));
    }

    #[test]
    fn test_clone_detached() {
        let stmts = stmts("<?php /* lead */ $a = [1, $b];");
        let copy = clone_detached(&stmts[0]);
        assert!(node_equal(&stmts[0], &copy));
        assert!(Layout::of(&stmts[0]).trivia);

        let layout = Layout::of(&copy);
        assert!(!layout.trivia);
        assert!(layout.positions.iter().all(|p| *p == Position::NONE));
        insta::assert_snapshot!(canonical_key(&copy), @r#"(ExpressionStmt :expr (Assign :op = :variable (SimpleVar :name "a") :expression (ArrayExpr :items [(ArrayItemExpr :key nil :val (Lnumber :value "1") :unpack false) (ArrayItemExpr :key nil :val (SimpleVar :name "b") :unpack false)] :short_syntax true)))"#);
    }

    #[test]
    fn test_is_assign() {
        let exprs = exprs("<?php $a = 1; $a .= 'x'; $a =& $b; $a == 1;");
        let flags: Vec<_> = exprs.iter().map(is_assign).collect();
        assert_eq!(flags, [true, true, true, false]);
    }

    #[test]
    fn test_find() {
        let stmts = stmts("<?php if ($x > 1) { f($x  >  1); }");
        let root = Node::Root(crate::Root {
            stmts,
            position: Position::NONE,
            free_floating: php_ast::Collection::new(),
        });
        let needles = exprs("<?php $x > 1; $x > 2; f($x > 1);");
        assert!(find(&needles[0], &root));
        assert!(!find(&needles[1], &root));
        assert!(find(&needles[2], &root));
        assert!(find(&root, &root));
    }
}
