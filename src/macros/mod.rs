//! # Toronto Macro Expansion System
//!
//! Every operator in Toronto is resolved at expansion time, and every operator is one
//! of two kinds:
//!
//! - **Macros** receive their argument trees unexpanded. A macro that returns
//!   [`Value::Tree`](crate::runtime::Value::Tree) has its output expanded again; any
//!   other value is final.
//! - **Functions** receive their arguments after they have been expanded, left to
//!   right, and their result is never expanded again.
//!
//! Macros come either from Rust ([`Macro::Native`]) or from source code
//! ([`Macro::Template`], defined with `defmacro` or `macro`).
//!
//! Example:
//!   (defmacro unless [test ...body] (? test (do) (do ...body)))
//!   (unless ok (print "failed")) => (? ok (do) (do (print "failed")))

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::errors::{ErrorKind, TorontoError};
use crate::macros::expander::ExpansionContext;
use crate::runtime::Value;
use crate::syntax::Tree;

pub mod expander;
pub mod template;

// ============================================================================
// SECTION 1: CORE DATA STRUCTURES
// ============================================================================

/// Expansion nested deeper than this is reported as a recursion limit error.
pub const MAX_EXPANSION_DEPTH: usize = 256;

/// A native macro: unexpanded argument trees in, value out.
pub type MacroFn = fn(&[Tree], &mut ExpansionContext) -> Result<Value, TorontoError>;

/// A native function: expanded argument values in, value out.
pub type FunctionFn = fn(&[Value], &mut ExpansionContext) -> Result<Value, TorontoError>;

#[derive(Clone)]
pub enum Macro {
    Native(MacroFn),
    Template(Arc<MacroTemplate>),
}

/// The two ways an operator can be invoked.
#[derive(Clone)]
pub enum Operator {
    Macro(Macro),
    Function(FunctionFn),
}

/// Parameter list of a template macro: fixed names, then an optional rest name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamList {
    pub required: Vec<String>,
    pub rest: Option<String>,
}

/// A macro written in Toronto source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacroTemplate {
    pub name: String,
    pub params: ParamList,
    pub body: Tree,
}

// ============================================================================
// SECTION 2: CONSTRUCTION
// ============================================================================

impl ParamList {
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.required
            .iter()
            .chain(self.rest.iter())
            .map(String::as_str)
    }
}

impl MacroTemplate {
    /// Builds a template, rejecting parameter lists that name the same parameter twice.
    pub fn new(name: impl Into<String>, params: ParamList, body: Tree) -> Result<Self, ErrorKind> {
        let name = name.into();
        let mut seen = std::collections::HashSet::new();
        if let Some(dup) = params.names().find(|param| !seen.insert(*param)) {
            return Err(ErrorKind::InvalidMacro {
                reason: format!("duplicate parameter '{}'", dup),
                name,
            });
        }
        Ok(Self { name, params, body })
    }
}

impl Operator {
    pub fn template(template: MacroTemplate) -> Self {
        Operator::Macro(Macro::Template(Arc::new(template)))
    }

    pub fn is_macro(&self) -> bool {
        matches!(self, Operator::Macro(_))
    }
}

// ============================================================================
// SECTION 3: TRAIT IMPLEMENTATIONS
// ============================================================================

impl PartialEq for Macro {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Macro::Native(a), Macro::Native(b)) => *a as usize == *b as usize,
            (Macro::Template(a), Macro::Template(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl PartialEq for Operator {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Operator::Macro(a), Operator::Macro(b)) => a == b,
            (Operator::Function(a), Operator::Function(b)) => *a as usize == *b as usize,
            _ => false,
        }
    }
}

impl fmt::Debug for Macro {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Macro::Native(_) => f.write_str("Macro::Native"),
            Macro::Template(template) => write!(f, "Macro::Template({})", template.name),
        }
    }
}

impl fmt::Debug for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operator::Macro(m) => write!(f, "{:?}", m),
            Operator::Function(_) => f.write_str("Function"),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operator::Macro(Macro::Native(_)) => f.write_str("<macro>"),
            Operator::Macro(Macro::Template(template)) => write!(f, "<macro {}>", template.name),
            Operator::Function(_) => f.write_str("<function>"),
        }
    }
}
