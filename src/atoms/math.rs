//! # Arithmetic, Logic and Comparison Operators
//!
//! All operators in this module are functions: their operands are expanded first and
//! the result is an infix or prefix expression over them.
//!
//! ## Operators Provided
//!
//! - **Arithmetic**: `+`, `-`, `*`, `/`, `%`
//! - **Logical**: `or`, `and`, `not`
//! - **Bitwise**: `bor`, `band`, `xor`, `bnot`
//! - **Comparison**: `==`, `!=`, `<`, `>`, `<=`, `>=`

use crate::atoms::helpers::{expect_arity, expect_min_arity, OpResult};
use crate::macros::expander::ExpansionContext;
use crate::macros::FunctionFn;
use crate::runtime::scope::OperatorTable;
use crate::runtime::Value;

// ============================================================================
// SHARED CONSTRUCTORS
// ============================================================================

/// `(a op b op c ...)`, one operand or more.
fn variadic(ctx: &ExpansionContext, name: &str, symbol: &str, args: &[Value]) -> OpResult {
    expect_min_arity(ctx, name, args, 1)?;
    Ok(Value::Infix {
        operator: symbol.to_string(),
        operands: args.to_vec(),
    })
}

fn binary(ctx: &ExpansionContext, name: &str, args: &[Value]) -> OpResult {
    expect_arity(ctx, name, args, 2)?;
    Ok(Value::Infix {
        operator: name.to_string(),
        operands: args.to_vec(),
    })
}

fn prefix(ctx: &ExpansionContext, name: &str, symbol: &str, args: &[Value]) -> OpResult {
    expect_arity(ctx, name, args, 1)?;
    Ok(Value::Prefix {
        operator: symbol.to_string(),
        operand: Box::new(args[0].clone()),
    })
}

// ============================================================================
// ARITHMETIC OPERATIONS
// ============================================================================

/// Adds operands.
///
/// Usage: (+ <a> <b> ...)
///
/// Example:
///   (+ 1 2 3) ; => (1 + 2 + 3)
pub const OP_ADD: FunctionFn = |args, ctx| variadic(ctx, "+", "+", args);

/// Subtracts operands; with a single operand, negates it.
///
/// Example:
///   (- x) ; => (0 - x)
pub const OP_SUB: FunctionFn = |args, ctx| match args {
    [operand] => Ok(Value::Infix {
        operator: "-".to_string(),
        operands: vec![Value::Atom("0".to_string()), operand.clone()],
    }),
    _ => variadic(ctx, "-", "-", args),
};

pub const OP_MUL: FunctionFn = |args, ctx| variadic(ctx, "*", "*", args);

pub const OP_DIV: FunctionFn = |args, ctx| variadic(ctx, "/", "/", args);

pub const OP_MOD: FunctionFn = |args, ctx| variadic(ctx, "%", "%", args);

// ============================================================================
// LOGICAL AND BITWISE OPERATIONS
// ============================================================================

/// Example:
///   (or a b) ; => (a || b)
pub const OP_OR: FunctionFn = |args, ctx| variadic(ctx, "or", "||", args);

pub const OP_AND: FunctionFn = |args, ctx| variadic(ctx, "and", "&&", args);

/// Example:
///   (not a) ; => (!a)
pub const OP_NOT: FunctionFn = |args, ctx| prefix(ctx, "not", "!", args);

pub const OP_BOR: FunctionFn = |args, ctx| variadic(ctx, "bor", "|", args);

pub const OP_BAND: FunctionFn = |args, ctx| variadic(ctx, "band", "&", args);

pub const OP_XOR: FunctionFn = |args, ctx| variadic(ctx, "xor", "^", args);

pub const OP_BNOT: FunctionFn = |args, ctx| prefix(ctx, "bnot", "~", args);

// ============================================================================
// COMPARISON OPERATIONS
// ============================================================================

pub const OP_EQ: FunctionFn = |args, ctx| binary(ctx, "==", args);
pub const OP_NEQ: FunctionFn = |args, ctx| binary(ctx, "!=", args);
pub const OP_LT: FunctionFn = |args, ctx| binary(ctx, "<", args);
pub const OP_GT: FunctionFn = |args, ctx| binary(ctx, ">", args);
pub const OP_LTE: FunctionFn = |args, ctx| binary(ctx, "<=", args);
pub const OP_GTE: FunctionFn = |args, ctx| binary(ctx, ">=", args);

// ============================================================================
// REGISTRATION FUNCTION
// ============================================================================

pub fn register_math_ops(table: &mut OperatorTable) {
    table.register_function("+", OP_ADD);
    table.register_function("-", OP_SUB);
    table.register_function("*", OP_MUL);
    table.register_function("/", OP_DIV);
    table.register_function("%", OP_MOD);

    table.register_function("or", OP_OR);
    table.register_function("and", OP_AND);
    table.register_function("not", OP_NOT);
    table.register_function("!", OP_NOT);
    table.register_function("bor", OP_BOR);
    table.register_function("band", OP_BAND);
    table.register_function("xor", OP_XOR);
    table.register_function("bnot", OP_BNOT);

    table.register_function("==", OP_EQ);
    table.register_function("!=", OP_NEQ);
    table.register_function("<", OP_LT);
    table.register_function(">", OP_GT);
    table.register_function("<=", OP_LTE);
    table.register_function(">=", OP_GTE);
}

#[cfg(test)]
mod tests {
    use crate::engine::Engine;

    fn render(text: &str) -> String {
        Engine::new().compile_str(text).unwrap().render()
    }

    #[test]
    fn arithmetic_is_infix() {
        assert_eq!(render("(+ 1 2)"), "(1 + 2)");
        assert_eq!(render("(* 2 (- 5 3))"), "(2 * (5 - 3))");
        assert_eq!(render("(- x)"), "(0 - x)");
    }

    #[test]
    fn logic_uses_symbols() {
        assert_eq!(render("(or a (and b c))"), "(a || (b && c))");
        assert_eq!(render("(not a)"), "(!a)");
        assert_eq!(render("(! (== a b))"), "(!(a == b))");
        assert_eq!(render("(bnot (xor a b))"), "(~(a ^ b))");
    }

    #[test]
    fn comparisons_take_two_operands() {
        assert_eq!(render("(<= a b)"), "(a <= b)");
        let err = Engine::new().compile_str("(== a b c)").unwrap_err();
        assert_eq!(err.diagnostic_info.error_code, "toronto::expand::arity_mismatch");
    }
}
