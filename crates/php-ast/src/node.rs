use crate::position::Position;
use crate::trivia::Collection;

/// Capabilities shared by every surface and IR node.
pub trait AstNode {
    fn position(&self) -> Position;
    fn set_position(&mut self, position: Position);
    fn free_floating(&self) -> &Collection;
    fn free_floating_mut(&mut self) -> &mut Collection;
}

impl<T: AstNode + ?Sized> AstNode for Box<T> {
    fn position(&self) -> Position {
        (**self).position()
    }

    fn set_position(&mut self, position: Position) {
        (**self).set_position(position)
    }

    fn free_floating(&self) -> &Collection {
        (**self).free_floating()
    }

    fn free_floating_mut(&mut self) -> &mut Collection {
        (**self).free_floating_mut()
    }
}

/// Implements [`AstNode`] for structs carrying `position` and
/// `free_floating` fields.
#[macro_export]
macro_rules! impl_ast_node {
    ($($ty:ty),* $(,)?) => {
        $(
            impl $crate::node::AstNode for $ty {
                fn position(&self) -> $crate::position::Position {
                    self.position
                }

                fn set_position(&mut self, position: $crate::position::Position) {
                    self.position = position;
                }

                fn free_floating(&self) -> &$crate::trivia::Collection {
                    &self.free_floating
                }

                fn free_floating_mut(&mut self) -> &mut $crate::trivia::Collection {
                    &mut self.free_floating
                }
            }
        )*
    };
}
