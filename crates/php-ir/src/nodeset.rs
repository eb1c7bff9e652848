//! Duplicate detection for IR nodes, e.g. repeated `if`/`elseif`
//! conditions or `switch` cases.

use std::collections::HashSet;

use crate::ir::Node;
use crate::shape::{canonical_key, Shape};

/// How many nodes are kept in the linearly searched list before the set
/// switches to canonical keys.
pub const NODE_SET_LIST_MAX: usize = 5;

/// A set of structurally distinct IR nodes.
///
/// Reuse one set with [`NodeSet::reset`] to keep its allocations.
#[derive(Debug, Clone, Default)]
pub struct NodeSet {
    list: Vec<Node>,
    keys: HashSet<String>,
}

impl NodeSet {
    pub fn new() -> Self {
        Self {
            list: Vec::with_capacity(NODE_SET_LIST_MAX),
            keys: HashSet::new(),
        }
    }

    /// Insert `node` unless a node of the same shape is already present.
    /// Returns `true` if it was inserted.
    pub fn add(&mut self, node: &Node) -> bool {
        if self.list.iter().any(|known| known.same_shape(node)) {
            return false;
        }
        if self.list.len() < NODE_SET_LIST_MAX {
            self.list.push(node.clone());
            return true;
        }

        if self.keys.is_empty() {
            tracing::debug!(
                threshold = NODE_SET_LIST_MAX,
                "node set spilled past its linear list"
            );
        }
        self.keys.insert(canonical_key(node))
    }

    pub fn len(&self) -> usize {
        self.list.len() + self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forget every node, keeping allocated storage.
    pub fn reset(&mut self) {
        self.list.clear();
        self.keys.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Identifier, Lnumber};
    use php_ast::{Collection, Position};

    fn number(value: &str, start: i32) -> Node {
        Node::Lnumber(Lnumber {
            value: value.into(),
            position: Position::new(1, 1, start, start + value.len() as i32),
            free_floating: Collection::new(),
        })
    }

    #[test]
    fn test_add_reports_duplicates() {
        let mut set = NodeSet::new();
        assert!(set.is_empty());
        assert!(set.add(&number("1", 0)));
        assert!(!set.add(&number("1", 10)));
        assert!(set.add(&number("2", 20)));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_duplicates_found_after_spill() {
        let mut set = NodeSet::new();
        for i in 0..20 {
            assert!(set.add(&number(&i.to_string(), i * 10)));
        }
        assert_eq!(set.len(), 20);
        for i in 0..20 {
            assert!(!set.add(&number(&i.to_string(), 500)), "{i} should be known");
        }
        assert_eq!(set.len(), 20);
    }

    #[test]
    fn test_same_text_different_type_is_distinct() {
        let mut set = NodeSet::new();
        assert!(set.add(&number("x", 0)));
        let ident = Node::Identifier(Identifier {
            value: "x".into(),
            position: Position::NONE,
            free_floating: Collection::new(),
        });
        assert!(set.add(&ident));
    }

    #[test]
    fn test_reset_empties_both_stores() {
        let mut set = NodeSet::new();
        for i in 0..8 {
            set.add(&number(&i.to_string(), 0));
        }
        set.reset();
        assert!(set.is_empty());
        assert!(set.add(&number("7", 0)));
    }
}
