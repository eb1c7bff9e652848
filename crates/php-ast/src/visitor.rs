/// Visitor over a node tree whose borrowed node view is `N`.
///
/// All methods have no-op defaults, so implementors only override the hooks
/// they care about. Returning `false` from [`Visitor::enter_node`] skips the
/// node's children; [`Visitor::leave_node`] is still called for it.
pub trait Visitor<N: Copy> {
    fn enter_node(&mut self, _node: N) -> bool {
        true
    }

    fn leave_node(&mut self, _node: N) {}

    fn enter_child(&mut self, _key: &'static str, _parent: N) {}

    fn leave_child(&mut self, _key: &'static str, _parent: N) {}

    fn enter_child_list(&mut self, _key: &'static str, _parent: N) {}

    fn leave_child_list(&mut self, _key: &'static str, _parent: N) {}
}

/// A node that can drive a [`Visitor`] over itself and its children.
pub trait Walk<'a, N: Copy> {
    fn walk<V: Visitor<N> + ?Sized>(&'a self, visitor: &mut V);
}

/// A field of a node: a single child, a child list, an optional child, or a
/// scalar that is never visited.
pub trait WalkField<'a, N: Copy> {
    fn walk_field<V: Visitor<N> + ?Sized>(&'a self, visitor: &mut V, parent: N, key: &'static str);
}

/// Walk `node` with `visitor`.
pub fn walk<'a, N, T, V>(visitor: &mut V, node: &'a T)
where
    N: Copy,
    T: Walk<'a, N> + ?Sized,
    V: Visitor<N> + ?Sized,
{
    node.walk(visitor);
}

impl<'a, N: Copy, T: WalkField<'a, N> + ?Sized> WalkField<'a, N> for Box<T> {
    fn walk_field<V: Visitor<N> + ?Sized>(&'a self, visitor: &mut V, parent: N, key: &'static str) {
        (**self).walk_field(visitor, parent, key);
    }
}

impl<'a, N: Copy, T: WalkField<'a, N>> WalkField<'a, N> for Option<T> {
    fn walk_field<V: Visitor<N> + ?Sized>(&'a self, visitor: &mut V, parent: N, key: &'static str) {
        if let Some(inner) = self {
            inner.walk_field(visitor, parent, key);
        }
    }
}

impl<'a, N: Copy, T: Walk<'a, N>> WalkField<'a, N> for Vec<T> {
    fn walk_field<V: Visitor<N> + ?Sized>(&'a self, visitor: &mut V, parent: N, key: &'static str) {
        visitor.enter_child_list(key, parent);
        for item in self {
            item.walk(visitor);
        }
        visitor.leave_child_list(key, parent);
    }
}

/// Marks types as scalar fields: walking them visits nothing.
#[macro_export]
macro_rules! walk_leaf {
    ($($ty:ty),* $(,)?) => {
        $(
            impl<'a, N: Copy> $crate::visitor::WalkField<'a, N> for $ty {
                fn walk_field<V: $crate::visitor::Visitor<N> + ?Sized>(
                    &'a self,
                    _visitor: &mut V,
                    _parent: N,
                    _key: &'static str,
                ) {
                }
            }
        )*
    };
}

walk_leaf!(String, bool);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::*;
    use crate::position::Position;
    use crate::trivia::Collection;

    fn var(name: &str) -> Node {
        Node::SimpleVar(SimpleVar {
            name: name.into(),
            position: Position::NONE,
            free_floating: Collection::new(),
        })
    }

    fn sample() -> Root {
        // $a = $b + $c;
        let sum = Node::PlusExpr(PlusExpr {
            left: Box::new(var("b")),
            right: Box::new(var("c")),
            position: Position::NONE,
            free_floating: Collection::new(),
        });
        let assign = Node::Assign(Assign {
            variable: Box::new(var("a")),
            expression: Box::new(sum),
            position: Position::NONE,
            free_floating: Collection::new(),
        });
        Root {
            stmts: vec![Node::ExpressionStmt(ExpressionStmt {
                expr: Box::new(assign),
                position: Position::NONE,
                free_floating: Collection::new(),
            })],
            position: Position::NONE,
            free_floating: Collection::new(),
        }
    }

    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
        skip: &'static str,
    }

    impl<'a> Visitor<NodeRef<'a>> for Recorder {
        fn enter_node(&mut self, node: NodeRef<'a>) -> bool {
            self.events.push(format!("enter {}", node.type_name()));
            node.type_name() != self.skip
        }

        fn leave_node(&mut self, node: NodeRef<'a>) {
            self.events.push(format!("leave {}", node.type_name()));
        }

        fn enter_child(&mut self, key: &'static str, _parent: NodeRef<'a>) {
            self.events.push(format!("child {key}"));
        }

        fn enter_child_list(&mut self, key: &'static str, _parent: NodeRef<'a>) {
            self.events.push(format!("list {key}"));
        }
    }

    #[test]
    fn test_walk_visits_fields_in_declared_order() {
        let root = sample();
        let mut rec = Recorder::default();
        walk(&mut rec, &root);
        assert_eq!(
            rec.events,
            [
                "enter Root",
                "list stmts",
                "enter ExpressionStmt",
                "child expr",
                "enter Assign",
                "child variable",
                "enter SimpleVar",
                "leave SimpleVar",
                "child expression",
                "enter PlusExpr",
                "child left",
                "enter SimpleVar",
                "leave SimpleVar",
                "child right",
                "enter SimpleVar",
                "leave SimpleVar",
                "leave PlusExpr",
                "leave Assign",
                "leave ExpressionStmt",
                "leave Root",
            ]
        );
    }

    #[test]
    fn test_enter_node_false_skips_children_but_leaves() {
        let root = sample();
        let mut rec = Recorder {
            skip: "Assign",
            ..Default::default()
        };
        walk(&mut rec, &root);
        assert_eq!(
            rec.events,
            [
                "enter Root",
                "list stmts",
                "enter ExpressionStmt",
                "child expr",
                "enter Assign",
                "leave Assign",
                "leave ExpressionStmt",
                "leave Root",
            ]
        );
    }

    #[test]
    fn test_absent_child_not_visited_empty_list_is() {
        let ret = ReturnStmt {
            expr: None,
            position: Position::NONE,
            free_floating: Collection::new(),
        };
        let mut rec = Recorder::default();
        walk(&mut rec, &ret);
        assert_eq!(rec.events, ["enter ReturnStmt", "leave ReturnStmt"]);

        let list = StmtList {
            stmts: Vec::new(),
            position: Position::NONE,
            free_floating: Collection::new(),
        };
        let mut rec = Recorder::default();
        walk(&mut rec, &list);
        assert_eq!(rec.events, ["enter StmtList", "list stmts", "leave StmtList"]);
    }
}
