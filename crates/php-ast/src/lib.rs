pub mod ast;
pub mod node;
pub mod position;
pub mod trivia;
pub mod visitor;

pub use ast::*;
pub use node::AstNode;
pub use position::{InvalidPosition, LineIndex, Position};
pub use trivia::{move_free_floating, Collection, Key, Trivia, TriviaKind};
pub use visitor::{walk, Visitor, Walk, WalkField};
