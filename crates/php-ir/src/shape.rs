//! Structural equality over IR nodes.
//!
//! Two nodes have the same shape when they are the same node type and every
//! field is equal, positions and trivia aside. [`canonical_key`] prints the
//! same fields as an S-expression, so two nodes share a key exactly when
//! they have the same shape.

pub trait Shape {
    fn same_shape(&self, other: &Self) -> bool;

    /// Append the S-expression form of `self` to `out`.
    fn write_key(&self, out: &mut String);
}

/// The S-expression key of `node`, e.g. `(SimpleVar :name "a")`.
pub fn canonical_key<T: Shape + ?Sized>(node: &T) -> String {
    let mut out = String::new();
    node.write_key(&mut out);
    out
}

impl Shape for String {
    fn same_shape(&self, other: &Self) -> bool {
        self == other
    }

    fn write_key(&self, out: &mut String) {
        // Debug quoting escapes `"` and `\`, keeping keys unambiguous.
        out.push_str(&format!("{self:?}"));
    }
}

impl Shape for bool {
    fn same_shape(&self, other: &Self) -> bool {
        self == other
    }

    fn write_key(&self, out: &mut String) {
        out.push_str(if *self { "true" } else { "false" });
    }
}

impl<T: Shape + ?Sized> Shape for Box<T> {
    fn same_shape(&self, other: &Self) -> bool {
        (**self).same_shape(other)
    }

    fn write_key(&self, out: &mut String) {
        (**self).write_key(out);
    }
}

impl<T: Shape> Shape for Option<T> {
    fn same_shape(&self, other: &Self) -> bool {
        match (self, other) {
            (Some(a), Some(b)) => a.same_shape(b),
            (None, None) => true,
            _ => false,
        }
    }

    fn write_key(&self, out: &mut String) {
        match self {
            Some(inner) => inner.write_key(out),
            None => out.push_str("nil"),
        }
    }
}

impl<T: Shape> Shape for Vec<T> {
    fn same_shape(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().zip(other).all(|(a, b)| a.same_shape(b))
    }

    fn write_key(&self, out: &mut String) {
        out.push('[');
        for (i, item) in self.iter().enumerate() {
            if i > 0 {
                out.push(' ');
            }
            item.write_key(out);
        }
        out.push(']');
    }
}
