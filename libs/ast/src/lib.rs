#[cfg(test)]
mod test;

pub mod tree_node;

use serde_derive::{Deserialize, Serialize};
use std::ops::Deref;

pub use tree_node::*;

/// A tree node tagged with the source line it was parsed from. Every error the
/// back end reports points at one of these lines.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct Spanned<T> {
    pub line: usize,
    pub node: T,
}

impl<T> Spanned<T> {
    pub fn new(line: usize, node: T) -> Self {
        Self { line, node }
    }
}

impl<T> std::fmt::Display for Spanned<T>
where
    T: std::fmt::Display,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.node)
    }
}

impl<T> Deref for Spanned<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.node
    }
}

/// Attach a source line to any tree node.
pub trait At: Sized {
    fn at(self, line: usize) -> Spanned<Self> {
        Spanned::new(line, self)
    }
}

impl At for Command {}
impl At for Declaration {}
impl At for String {}
