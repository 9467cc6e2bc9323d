//! # Special Forms
//!
//! Binding, control flow and function definition.
//!
//! `def` and `get` are the only operators that touch the scope. Both run during
//! expansion, so a name is visible to the forms expanded after its `def` and to no
//! others. `func`, `async` and `=>` are macros: they expand their bodies in a child
//! scope where each parameter shadows any operator of the same name.

use crate::atoms::helpers::{
    body_tree, expect_arity, expect_arity_range, expect_min_arity, value_name, OpResult,
};
use crate::errors::{ErrorReporting, TorontoError};
use crate::macros::expander::ExpansionContext;
use crate::macros::template::parse_params;
use crate::macros::{FunctionFn, MacroFn, ParamList};
use crate::runtime::scope::OperatorTable;
use crate::runtime::Value;
use crate::syntax::{Tree, SEQUENCE};

// ============================================================================
// BINDING
// ============================================================================

/// Binds a name in the current scope.
///
/// Usage: (def <name> <value>)
///
/// Binding an operator value emits nothing; later forms can use the name as a head.
/// Binding anything else emits a definition.
pub const OP_DEF: FunctionFn = |args, ctx| {
    expect_arity(ctx, "def", args, 2)?;
    let name = value_name(ctx, "def", &args[0])?.to_string();
    let value = args[1].clone();
    ctx.scope_mut().define(&name, value.clone());
    if matches!(value, Value::Operator(_)) {
        return Ok(Value::Empty);
    }
    Ok(Value::Define {
        name,
        value: Box::new(value),
    })
};

/// Reads a name bound in scope.
///
/// Usage: (get <name>)
pub const OP_GET: FunctionFn = |args, ctx| {
    expect_arity(ctx, "get", args, 1)?;
    let name = value_name(ctx, "get", &args[0])?;
    match ctx.scope().resolve(name) {
        Some(Value::Operator(op)) => Ok(Value::Operator(op.clone())),
        Some(_) => Ok(Value::Lookup(name.to_string())),
        None => Err(ctx.undefined_name(name)),
    }
};

/// Usage: (= <target> <value>)
pub const OP_ASSIGN: FunctionFn = |args, ctx| {
    expect_arity(ctx, "=", args, 2)?;
    Ok(Value::Assign {
        target: Box::new(args[0].clone()),
        value: Box::new(args[1].clone()),
    })
};

// ============================================================================
// CONTROL
// ============================================================================

/// Sequences its operands, dropping those that emitted nothing.
pub const OP_DO: FunctionFn = |args, _ctx| {
    Ok(Value::Sequence(
        args.iter().filter(|v| !v.is_empty()).cloned().collect(),
    ))
};

/// The dynamic-call operator: every form whose head is not an operator lands here.
///
/// Usage: (call <callee> <args>...)
pub const OP_CALL: FunctionFn = |args, ctx| {
    expect_min_arity(ctx, "call", args, 1)?;
    Ok(Value::Call {
        callee: Box::new(args[0].clone()),
        args: args[1..].to_vec(),
    })
};

/// Usage: (? <test> <then> [<else>])
pub const OP_IF: FunctionFn = |args, ctx| {
    expect_arity_range(ctx, "?", args, 2, 3)?;
    Ok(Value::Conditional {
        test: Box::new(args[0].clone()),
        consequent: Box::new(args[1].clone()),
        alternate: Box::new(args.get(2).cloned().unwrap_or_default()),
    })
};

/// Chained conditional over test/result pairs, with an optional trailing default.
///
/// Example:
///   (cond a 1 b 2 3) ; => (a ? 1 : (b ? 2 : 3))
pub const OP_COND: FunctionFn = |args, ctx| {
    expect_min_arity(ctx, "cond", args, 1)?;
    let (pairs, default) = if args.len() % 2 == 1 {
        (&args[..args.len() - 1], args[args.len() - 1].clone())
    } else {
        (args, Value::Empty)
    };
    Ok(pairs.chunks(2).rev().fold(default, |alternate, pair| Value::Conditional {
        test: Box::new(pair[0].clone()),
        consequent: Box::new(pair[1].clone()),
        alternate: Box::new(alternate),
    }))
};

/// Runs its operands inside an immediately invoked async function.
///
/// Example:
///   (asyncdo (a) (b)) ; => (async function () { return (a(), b()); })()
pub const OP_ASYNC_DO: FunctionFn = |args, _ctx| {
    let body = Value::Function {
        params: Vec::new(),
        rest: None,
        body: args.to_vec(),
        is_async: true,
    };
    Ok(Value::Call {
        callee: Box::new(body),
        args: Vec::new(),
    })
};

pub const OP_PRINT: FunctionFn = |args, _ctx| {
    Ok(Value::Call {
        callee: Box::new(Value::Atom("console.log".to_string())),
        args: args.to_vec(),
    })
};

// ============================================================================
// FUNCTIONS
// ============================================================================

/// Expands `body` with each parameter bound to itself, so parameters shadow operators.
fn expand_body(
    ctx: &mut ExpansionContext,
    params: &ParamList,
    body: &[Tree],
) -> Result<Vec<Value>, TorontoError> {
    ctx.with_child_scope(|ctx| {
        for name in params.names() {
            ctx.scope_mut().define(name, Value::Atom(name.to_string()));
        }
        ctx.expand_all(body)
    })
}

fn function(args: &[Tree], ctx: &mut ExpansionContext, name: &str, is_async: bool) -> OpResult {
    expect_min_arity(ctx, name, args, 1)?;
    let params = parse_params(name, &args[0], ctx)?;
    let body = expand_body(ctx, &params, &args[1..])?;
    Ok(Value::Function {
        params: params.required,
        rest: params.rest,
        body,
        is_async,
    })
}

/// Usage: (func [<params>...] <body>...)
pub const OP_FUNC: MacroFn = |args, ctx| function(args, ctx, "func", false);

/// Usage: (async [<params>...] <body>...)
pub const OP_ASYNC: MacroFn = |args, ctx| function(args, ctx, "async", true);

/// Usage: (=> [<params>...] <body>...)
pub const OP_ARROW: MacroFn = |args, ctx| {
    expect_min_arity(ctx, "=>", args, 1)?;
    let params = parse_params("=>", &args[0], ctx)?;
    let body = body_tree(&args[1..]);
    let mut expanded = expand_body(ctx, &params, std::slice::from_ref(&body))?;
    Ok(Value::Arrow {
        params: params.required,
        rest: params.rest,
        body: Box::new(expanded.pop().unwrap_or_default()),
    })
};

pub fn register_special_forms(table: &mut OperatorTable) {
    table.register_function("def", OP_DEF);
    table.register_function("get", OP_GET);
    table.register_function("=", OP_ASSIGN);

    table.register_function(SEQUENCE, OP_DO);
    table.register_function("asyncdo", OP_ASYNC_DO);
    table.register_function("call", OP_CALL);
    table.register_function("?", OP_IF);
    table.register_function("cond", OP_COND);
    table.register_function("print", OP_PRINT);

    table.register_macro("func", OP_FUNC);
    table.register_macro("async", OP_ASYNC);
    table.register_macro("=>", OP_ARROW);
}

#[cfg(test)]
mod tests {
    use crate::engine::Engine;
    use crate::errors::{ErrorCategory, ErrorKind};

    fn render(text: &str) -> String {
        Engine::new().compile_str(text).unwrap().render()
    }

    #[test]
    fn def_then_get_in_order() {
        assert_eq!(
            render("(do (def x 1) (def y (get x)))"),
            r#"((this["x"] = 1, undefined), (this["y"] = this["x"], undefined))"#
        );
    }

    #[test]
    fn get_before_def_is_undefined() {
        let err = Engine::new()
            .compile_str("(do (def y (get x)) (def x 1))")
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::UndefinedName { name: "x".into() });
        assert_eq!(err.category(), ErrorCategory::Resolution);
    }

    #[test]
    fn asyncdo_wraps_an_async_function() {
        assert_eq!(
            render("(asyncdo (a) (b))"),
            "(async function () { return (a(), b()); })()"
        );
    }

    #[test]
    fn conditionals() {
        assert_eq!(render("(? a b)"), "(a ? b : undefined)");
        assert_eq!(render("(cond a 1 b 2 3)"), "(a ? 1 : (b ? 2 : 3))");
        assert_eq!(render("(cond a 1)"), "(a ? 1 : undefined)");
    }

    #[test]
    fn print_calls_console() {
        assert_eq!(render(r#"(print "hi")"#), r#"console.log("hi")"#);
    }

    #[test]
    fn parameters_shadow_operators() {
        assert_eq!(
            render("(func [print] (print 1))"),
            "(function (print) { return print(1); })"
        );
        assert_eq!(render("(print 1)"), "console.log(1)");
    }

    #[test]
    fn arrows_and_async_functions() {
        assert_eq!(render("(=> [a b] (+ a b))"), "((a, b) => (a + b))");
        assert_eq!(
            render("(async [] (f))"),
            "(async function () { return f(); })"
        );
    }

    #[test]
    fn function_scope_does_not_leak() {
        let err = Engine::new()
            .compile_str("(do (func [] (def inner 1)) (get inner))")
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::UndefinedName { name: "inner".into() });
    }
}
