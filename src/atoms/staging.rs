//! Staging and macro-definition operators.
//!
//! `%X` reads to `(preserve X)`, `<X>` to `(escape X)` and `$X` to `(eval X)`.
//! Preserve and escape are a quasiquote pair handled by the expander itself: preserve
//! turns code into literal data and escape switches back to code inside it. Eval
//! expands its operand right away; handed preserved data, it reads that data back
//! as code.

use crate::atoms::helpers::{body_tree, expect_arity, expect_min_arity, tree_name};
use crate::errors::{unspanned, ErrorReporting, TorontoError};
use crate::macros::expander::ExpansionContext;
use crate::macros::template::parse_params;
use crate::macros::{FunctionFn, MacroFn, MacroTemplate, Operator};
use crate::runtime::scope::OperatorTable;
use crate::runtime::Value;
use crate::syntax::{Tree, EVAL, SPREAD};

// ============================================================================
// EVAL AND SPREAD
// ============================================================================

/// Usage: (eval <form>)
pub const OP_EVAL: MacroFn = |args, ctx| {
    expect_arity(ctx, EVAL, args, 1)?;
    match ctx.expand(&args[0])? {
        // The binding is already in scope.
        Value::Define { .. } => Ok(Value::Empty),
        value => Ok(literal_to_tree(&value).map(Value::Tree).unwrap_or(value)),
    }
};

/// Usage: (spread <value>)
pub const OP_SPREAD: FunctionFn = |args, ctx| {
    expect_arity(ctx, SPREAD, args, 1)?;
    Ok(Value::Spread(Box::new(args[0].clone())))
};

/// Reads preserved data back into a tree. Only strings and arrays of them qualify.
fn literal_to_tree(value: &Value) -> Option<Tree> {
    match value {
        Value::Str(text) => Some(Tree::Atom(text.clone())),
        Value::Array(items) => items
            .iter()
            .map(literal_to_tree)
            .collect::<Option<Vec<_>>>()
            .map(Tree::List),
        _ => None,
    }
}

// ============================================================================
// MACRO DEFINITION
// ============================================================================

fn template(
    ctx: &ExpansionContext,
    operator: &str,
    name: &str,
    args: &[Tree],
) -> Result<MacroTemplate, TorontoError> {
    let params = parse_params(operator, &args[0], ctx)?;
    MacroTemplate::new(name, params, body_tree(&args[1..]))
        .map_err(|kind| ctx.report(kind, unspanned()))
}

/// An anonymous template macro, as a value.
///
/// Usage: (macro [<params>...] <body>...)
pub const OP_MACRO: MacroFn = |args, ctx| {
    expect_min_arity(ctx, "macro", args, 1)?;
    let template = template(ctx, "macro", "macro", args)?;
    Ok(Value::Operator(Operator::template(template)))
};

/// Usage: (defmacro <name> [<params>...] <body>...)
pub const OP_DEFMACRO: MacroFn = |args, ctx| {
    expect_min_arity(ctx, "defmacro", args, 2)?;
    let name = tree_name(ctx, "defmacro", &args[0])?;
    let template = template(ctx, "defmacro", name, &args[1..])?;
    ctx.scope_mut()
        .define(name, Value::Operator(Operator::template(template)));
    Ok(Value::Empty)
};

/// Usage: (defn <name> [<params>...] <body>...)
///
/// Example:
///   (defn add [a b] (+ a b)) ; => (def add (func [a b] (+ a b)))
pub const OP_DEFN: MacroFn = |args, ctx| {
    expect_min_arity(ctx, "defn", args, 2)?;
    tree_name(ctx, "defn", &args[0])?;
    let func = Tree::tagged("func", args[1..].iter().cloned());
    Ok(Value::Tree(Tree::tagged("def", [args[0].clone(), func])))
};

pub fn register_staging_ops(table: &mut OperatorTable) {
    table.register_macro(EVAL, OP_EVAL);
    table.register_function(SPREAD, OP_SPREAD);

    table.register_macro("macro", OP_MACRO);
    table.register_macro("defmacro", OP_DEFMACRO);
    table.register_macro("defn", OP_DEFN);
}

#[cfg(test)]
mod tests {
    use crate::engine::Engine;
    use crate::errors::ErrorKind;

    fn render(text: &str) -> String {
        Engine::new().compile_str(text).unwrap().render()
    }

    #[test]
    fn preserve_builds_literals() {
        assert_eq!(render("%a"), r#""a""#);
        assert_eq!(render("%(a (b c))"), r#"["a", ["b", "c"]]"#);
        assert_eq!(render("(preserve a <b>)"), r#"["a", b]"#);
    }

    #[test]
    fn eval_reads_preserved_data_back() {
        assert_eq!(render("$%(+ 1 2)"), "(1 + 2)");
    }

    #[test]
    fn eval_of_a_definition_emits_nothing() {
        assert_eq!(render("(do $(def x 1) (get x))"), r#"(this["x"])"#);
    }

    #[test]
    fn defn_rewrites_to_def_func() {
        assert_eq!(
            render("(defn add [a b] (+ a b))"),
            r#"(this["add"] = (function (a, b) { return (a + b); }), undefined)"#
        );
    }

    #[test]
    fn macro_value_can_be_bound_with_def() {
        assert_eq!(
            render("(do (def twice (macro [x] (, x x))) (twice (f)))"),
            "((f(), f()))"
        );
    }

    #[test]
    fn defmacro_rejects_duplicate_parameters() {
        let err = Engine::new()
            .compile_str("(defmacro m [a a] a)")
            .unwrap_err();
        assert!(matches!(err.kind, ErrorKind::InvalidMacro { ref name, .. } if name == "m"));
    }
}
