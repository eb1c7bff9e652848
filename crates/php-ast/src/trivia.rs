//! Free-floating text: whitespace, comments and punctuation that carry no
//! meaning but must survive a round trip.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::node::AstNode;
use crate::position::Position;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TriviaKind {
    Whitespace,
    Comment,
    Token,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Trivia {
    pub kind: TriviaKind,
    pub value: String,
    pub position: Position,
}

impl Trivia {
    pub fn new(kind: TriviaKind, value: impl Into<String>, position: Position) -> Self {
        Self {
            kind,
            value: value.into(),
            position,
        }
    }
}

/// Attachment points for trivia. Adding a variant is a data-model change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Key {
    /// Leading trivia of the node's first token.
    Start,
    /// Trivia left before end of input.
    End,
    /// The `$` of `$$a` and `${expr}`.
    Dollar,
    /// The statement terminator, stored as a `Token` trivia.
    SemiColon,
    /// `?>` used in place of a terminator.
    PhpCloseTag,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Collection(BTreeMap<Key, Vec<Trivia>>);

impl Collection {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, key: Key) -> Option<&[Trivia]> {
        self.0.get(&key).map(Vec::as_slice)
    }

    /// Replace the bucket at `key`. An empty list removes it.
    pub fn set(&mut self, key: Key, trivia: Vec<Trivia>) {
        if trivia.is_empty() {
            self.0.remove(&key);
        } else {
            self.0.insert(key, trivia);
        }
    }

    pub fn push(&mut self, key: Key, trivia: Trivia) {
        self.0.entry(key).or_default().push(trivia);
    }

    pub fn take(&mut self, key: Key) -> Vec<Trivia> {
        self.0.remove(&key).unwrap_or_default()
    }

    /// Prepend `trivia` to the bucket at `key`.
    pub fn prepend(&mut self, key: Key, mut trivia: Vec<Trivia>) {
        if trivia.is_empty() {
            return;
        }
        if let Some(existing) = self.0.remove(&key) {
            trivia.extend(existing);
        }
        self.0.insert(key, trivia);
    }

    pub fn iter(&self) -> impl Iterator<Item = (Key, &Trivia)> {
        self.0
            .iter()
            .flat_map(|(key, list)| list.iter().map(move |t| (*key, t)))
    }

    pub fn len(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }
}

/// Move the `key` bucket of `src` onto `dst`, deleting it from `src`.
///
/// Moved trivia goes in front of whatever `dst` already has at `key`, since
/// the source node always precedes the destination's own text.
pub fn move_free_floating<S, D>(src: &mut S, dst: &mut D, key: Key)
where
    S: AstNode + ?Sized,
    D: AstNode + ?Sized,
{
    let moved = src.free_floating_mut().take(key);
    dst.free_floating_mut().prepend(key, moved);
}
