//! Syntax module for the Toronto language
//!
//! Source text is read into [`Tree`] values: opaque atoms and ordered lists. The tree
//! carries no interpretation of its own; the head of a list is only given meaning when
//! the expander resolves it against a scope.

use std::fmt;

use serde::{Deserialize, Serialize};

pub mod bracketize;
pub mod parser;
pub mod reader;
pub mod recognizers;

/// Head of the list that wraps several top-level forms.
pub const SEQUENCE: &str = "do";
/// Head produced by `[ ... ]`.
pub const VECTOR: &str = "vector";
/// Head produced by `{ ... }`.
pub const RECORD: &str = "record";
/// Head produced by `< ... >`.
pub const ESCAPE: &str = "escape";
/// Head produced by the `%` prefix.
pub const PRESERVE: &str = "preserve";
/// Head produced by the `$` prefix.
pub const EVAL: &str = "eval";
/// Head produced by the `...` prefix.
pub const SPREAD: &str = "spread";

/// Represents a span in the source code, in bytes.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

/// A read form: an atom, a list of forms, or the empty pass-through value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tree {
    /// What an empty source reads to. Distinct from every atom.
    Empty,
    Atom(String),
    List(Vec<Tree>),
}

impl Tree {
    pub fn atom(text: impl Into<String>) -> Self {
        Tree::Atom(text.into())
    }

    pub fn list(items: impl IntoIterator<Item = Tree>) -> Self {
        Tree::List(items.into_iter().collect())
    }

    /// Builds `(tag items...)`.
    pub fn tagged(tag: &str, items: impl IntoIterator<Item = Tree>) -> Self {
        let mut list = vec![Tree::atom(tag)];
        list.extend(items);
        Tree::List(list)
    }

    pub fn as_atom(&self) -> Option<&str> {
        match self {
            Tree::Atom(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Tree]> {
        match self {
            Tree::List(items) => Some(items),
            _ => None,
        }
    }

    /// The head atom of a list, if it has one.
    pub fn head(&self) -> Option<&str> {
        self.as_list()?.first()?.as_atom()
    }

    /// The arguments of `(name args...)`, or `None` if this is not such a form.
    pub fn form_args(&self, name: &str) -> Option<&[Tree]> {
        match self.as_list()? {
            [head, args @ ..] if head.as_atom() == Some(name) => Some(args),
            _ => None,
        }
    }

    pub fn is_form(&self, name: &str) -> bool {
        self.form_args(name).is_some()
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Tree::Empty)
    }

    /// Pretty-prints the tree as source text.
    pub fn pretty(&self) -> String {
        match self {
            Tree::Empty => String::new(),
            Tree::Atom(text) => text.clone(),
            Tree::List(items) => {
                let inner = items
                    .iter()
                    .map(Tree::pretty)
                    .collect::<Vec<_>>()
                    .join(" ");
                format!("({})", inner)
            }
        }
    }
}

impl fmt::Display for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pretty())
    }
}

impl From<&str> for Tree {
    fn from(text: &str) -> Self {
        Tree::atom(text)
    }
}
