//! # Operator Helper Infrastructure
//!
//! Argument checks and extraction shared by every standard operator. Each helper
//! reports failures through the expansion context, naming the operator that failed.

use crate::errors::{ErrorReporting, TorontoError};
use crate::macros::expander::ExpansionContext;
use crate::runtime::Value;
use crate::syntax::parser::wrap_in_sequence;
use crate::syntax::Tree;

/// Convenient type alias for operator return values
pub type OpResult = Result<Value, TorontoError>;

// ============================================================================
// ARITY
// ============================================================================

pub fn expect_arity<T>(
    ctx: &ExpansionContext,
    operator: &str,
    args: &[T],
    expected: usize,
) -> Result<(), TorontoError> {
    if args.len() == expected {
        return Ok(());
    }
    Err(ctx.arity_mismatch(operator, &expected.to_string(), args.len()))
}

pub fn expect_min_arity<T>(
    ctx: &ExpansionContext,
    operator: &str,
    args: &[T],
    min: usize,
) -> Result<(), TorontoError> {
    if args.len() >= min {
        return Ok(());
    }
    Err(ctx.arity_mismatch(operator, &format!("at least {}", min), args.len()))
}

pub fn expect_arity_range<T>(
    ctx: &ExpansionContext,
    operator: &str,
    args: &[T],
    min: usize,
    max: usize,
) -> Result<(), TorontoError> {
    if (min..=max).contains(&args.len()) {
        return Ok(());
    }
    Err(ctx.arity_mismatch(operator, &format!("{} to {}", min, max), args.len()))
}

// ============================================================================
// EXTRACTION
// ============================================================================

/// The text of an expanded atom argument.
pub fn value_name<'a>(
    ctx: &ExpansionContext,
    operator: &str,
    value: &'a Value,
) -> Result<&'a str, TorontoError> {
    value
        .as_atom()
        .ok_or_else(|| ctx.shape_mismatch(operator, "a name", value.type_name()))
}

/// The text of an unexpanded atom argument.
pub fn tree_name<'a>(
    ctx: &ExpansionContext,
    operator: &str,
    tree: &'a Tree,
) -> Result<&'a str, TorontoError> {
    tree.as_atom()
        .ok_or_else(|| ctx.shape_mismatch(operator, "a name", tree.pretty()))
}

/// Wraps a multi-form body into a single tree.
pub fn body_tree(forms: &[Tree]) -> Tree {
    wrap_in_sequence(forms.to_vec())
}
