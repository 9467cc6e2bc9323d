//! Collection operators for the Toronto language.
//!
//! `[ ... ]` and `{ ... }` read to `vector` and `record` forms; both are plain
//! functions over their expanded children. `map`, `range` and `toArray` build on
//! `Array.from`, so they accept any iterable.

use crate::atoms::helpers::{expect_arity, expect_arity_range, expect_min_arity, OpResult};
use crate::errors::ErrorReporting;
use crate::macros::expander::ExpansionContext;
use crate::macros::FunctionFn;
use crate::runtime::scope::OperatorTable;
use crate::runtime::Value;

/// Example:
///   [1 2 3] ; => [1, 2, 3]
pub const OP_VECTOR: FunctionFn = |args, _ctx| Ok(Value::Array(args.to_vec()));

/// Builds a record from `key: value` pairs. A bare name `k` is short for `k: k`.
///
/// Example:
///   {a: 1 b} ; => { a: 1, b: b }
pub const OP_RECORD: FunctionFn = |args, ctx| build_record(args, ctx);

/// Member access.
///
/// Example:
///   (. console log) ; => (console.log)
pub const OP_MEMBER: FunctionFn = |args, ctx| {
    expect_min_arity(ctx, ".", args, 1)?;
    Ok(Value::Member(args.to_vec()))
};

/// Comma sequence: every operand is evaluated, the last one is the result.
pub const OP_COMMA: FunctionFn = |args, _ctx| Ok(Value::Sequence(args.to_vec()));

fn build_record(args: &[Value], ctx: &ExpansionContext) -> OpResult {
    let mut entries = Vec::new();
    let mut items = args.iter();
    while let Some(item) = items.next() {
        let Some(name) = item.as_atom() else {
            return Err(ctx.shape_mismatch("record", "a key", item.type_name()));
        };
        match name.strip_suffix(':').filter(|key| !key.is_empty()) {
            Some(key) => {
                let value = items.next().ok_or_else(|| {
                    ctx.shape_mismatch("record", format!("a value for key '{}'", key), "nothing")
                })?;
                entries.push((key.to_string(), value.clone()));
            }
            None => entries.push((name.to_string(), item.clone())),
        }
    }
    Ok(Value::Record(entries))
}

fn array_from(args: Vec<Value>) -> Value {
    Value::Call {
        callee: Box::new(Value::Atom("Array.from".to_string())),
        args,
    }
}

/// Usage: (toArray <iterable>)
pub const OP_TO_ARRAY: FunctionFn = |args, ctx| {
    expect_arity(ctx, "toArray", args, 1)?;
    Ok(array_from(args.to_vec()))
};

/// Example:
///   (map xs f) ; => Array.from(xs, f)
pub const OP_MAP: FunctionFn = |args, ctx| {
    expect_arity(ctx, "map", args, 2)?;
    Ok(array_from(args.to_vec()))
};

/// Integers from `min` (default 0) up to but not including `max`.
///
/// Example:
///   (range 3) ; => Array.from({ length: 3 }, ((_, i) => i))
pub const OP_RANGE: FunctionFn = |args, ctx| {
    expect_arity_range(ctx, "range", args, 1, 2)?;
    let index = Value::Atom("i".to_string());
    let (length, element) = match args {
        [max] => (max.clone(), index),
        _ => (
            Value::Infix {
                operator: "-".to_string(),
                operands: vec![args[1].clone(), args[0].clone()],
            },
            Value::Infix {
                operator: "+".to_string(),
                operands: vec![args[0].clone(), index],
            },
        ),
    };
    let mapper = Value::Arrow {
        params: vec!["_".to_string(), "i".to_string()],
        rest: None,
        body: Box::new(element),
    };
    Ok(array_from(vec![
        Value::Record(vec![("length".to_string(), length)]),
        mapper,
    ]))
};

pub fn register_collection_ops(table: &mut OperatorTable) {
    table.register_function(crate::syntax::VECTOR, OP_VECTOR);
    table.register_function(crate::syntax::RECORD, OP_RECORD);
    table.register_function(".", OP_MEMBER);
    table.register_function(",", OP_COMMA);

    table.register_function("toArray", OP_TO_ARRAY);
    table.register_function("map", OP_MAP);
    table.register_function("range", OP_RANGE);
}

#[cfg(test)]
mod tests {
    use crate::engine::Engine;
    use crate::errors::ErrorKind;

    fn render(text: &str) -> String {
        Engine::new().compile_str(text).unwrap().render()
    }

    #[test]
    fn vectors_expand_their_elements() {
        assert_eq!(render("[1 (+ 1 1) 3]"), "[1, (1 + 1), 3]");
        assert_eq!(render("[]"), "[]");
    }

    #[test]
    fn records_accept_shorthand() {
        assert_eq!(render("{a: 1 b}"), "{ a: 1, b: b }");
        assert_eq!(render("{}"), "{}");
    }

    #[test]
    fn record_key_without_value_is_a_shape_error() {
        let err = Engine::new().compile_str("{a: 1 b:}").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::ShapeMismatch { ref operator, .. } if operator == "record"));
    }

    #[test]
    fn iteration_builds_on_array_from() {
        assert_eq!(render("(toArray xs)"), "Array.from(xs)");
        assert_eq!(render("(map xs (=> [x] (* x 2)))"), "Array.from(xs, ((x) => (x * 2)))");
        assert_eq!(render("(range 3)"), "Array.from({ length: 3 }, ((_, i) => i))");
        assert_eq!(
            render("(range 2 5)"),
            "Array.from({ length: (5 - 2) }, ((_, i) => (2 + i)))"
        );
    }

    #[test]
    fn range_takes_one_or_two_bounds() {
        let err = Engine::new().compile_str("(range)").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::ArityMismatch { ref operator, .. } if operator == "range"));
    }

    #[test]
    fn member_access_chains() {
        assert_eq!(render("(. a b c)"), "(a.b.c)");
    }
}
