//! Runtime module for the Toronto language
//!
//! This module provides the value type produced by expansion. A [`Value`] is a typed
//! description of an executable expression. Rendering it through [`fmt::Display`]
//! yields JavaScript-flavoured expression text; serializing it hands the same
//! structure to any other backend.

use std::fmt;

use serde::Serialize;

use crate::macros::Operator;
use crate::syntax::Tree;

pub mod scope;

/// Canonical value produced by macro expansion.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub enum Value {
    /// Nothing to emit. `def` of an operator and empty input produce this.
    #[default]
    Empty,
    /// An atom passed through unchanged: names, numbers, quoted text.
    Atom(String),
    /// A literal string produced by preserving an atom.
    Str(String),
    Array(Vec<Value>),
    /// Key/value pairs in source order.
    Record(Vec<(String, Value)>),
    Infix {
        operator: String,
        operands: Vec<Value>,
    },
    Prefix {
        operator: String,
        operand: Box<Value>,
    },
    Call {
        callee: Box<Value>,
        args: Vec<Value>,
    },
    Conditional {
        test: Box<Value>,
        consequent: Box<Value>,
        alternate: Box<Value>,
    },
    Function {
        params: Vec<String>,
        rest: Option<String>,
        body: Vec<Value>,
        is_async: bool,
    },
    Arrow {
        params: Vec<String>,
        rest: Option<String>,
        body: Box<Value>,
    },
    Sequence(Vec<Value>),
    Define {
        name: String,
        value: Box<Value>,
    },
    Lookup(String),
    Assign {
        target: Box<Value>,
        value: Box<Value>,
    },
    /// Member access chain `a.b.c`.
    Member(Vec<Value>),
    Spread(Box<Value>),
    /// Macro output that still has to be expanded.
    Tree(Tree),
    /// A compile-time operator, bound with `def` or used as a computed head.
    #[serde(skip)]
    Operator(Operator),
}

impl Value {
    /// Returns the type name of the value, for shape errors.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Empty => "empty",
            Value::Atom(_) => "atom",
            Value::Str(_) => "string",
            Value::Array(_) => "array",
            Value::Record(_) => "record",
            Value::Infix { .. } | Value::Prefix { .. } => "operation",
            Value::Call { .. } => "call",
            Value::Conditional { .. } => "conditional",
            Value::Function { .. } | Value::Arrow { .. } => "function",
            Value::Sequence(_) => "sequence",
            Value::Define { .. } => "definition",
            Value::Lookup(_) => "lookup",
            Value::Assign { .. } => "assignment",
            Value::Member(_) => "member access",
            Value::Spread(_) => "spread",
            Value::Tree(_) => "tree",
            Value::Operator(_) => "operator",
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Value::Empty)
    }

    pub fn as_atom(&self) -> Option<&str> {
        match self {
            Value::Atom(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_operator(&self) -> Option<&Operator> {
        match self {
            Value::Operator(op) => Some(op),
            _ => None,
        }
    }
}

impl From<Tree> for Value {
    fn from(tree: Tree) -> Self {
        Value::Tree(tree)
    }
}

// ============================================================================
// RENDERING
// ============================================================================

fn join(f: &mut fmt::Formatter<'_>, items: &[Value], separator: &str) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(separator)?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

fn write_quoted(f: &mut fmt::Formatter<'_>, text: &str) -> fmt::Result {
    match serde_json::to_string(text) {
        Ok(quoted) => f.write_str(&quoted),
        Err(_) => write!(f, "{:?}", text),
    }
}

fn write_params(f: &mut fmt::Formatter<'_>, params: &[String], rest: &Option<String>) -> fmt::Result {
    let mut names: Vec<String> = params.to_vec();
    if let Some(rest) = rest {
        names.push(format!("...{}", rest));
    }
    write!(f, "({})", names.join(", "))
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Empty => f.write_str("undefined"),
            Value::Atom(text) => f.write_str(text),
            Value::Str(text) => write_quoted(f, text),
            Value::Array(items) => {
                f.write_str("[")?;
                join(f, items, ", ")?;
                f.write_str("]")
            }
            Value::Record(entries) if entries.is_empty() => f.write_str("{}"),
            Value::Record(entries) => {
                f.write_str("{ ")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", key, value)?;
                }
                f.write_str(" }")
            }
            Value::Infix { operator, operands } => {
                f.write_str("(")?;
                join(f, operands, &format!(" {} ", operator))?;
                f.write_str(")")
            }
            Value::Prefix { operator, operand } => write!(f, "({}{})", operator, operand),
            Value::Call { callee, args } => {
                write!(f, "{}(", callee)?;
                join(f, args, ", ")?;
                f.write_str(")")
            }
            Value::Conditional {
                test,
                consequent,
                alternate,
            } => write!(f, "({} ? {} : {})", test, consequent, alternate),
            Value::Function {
                params,
                rest,
                body,
                is_async,
            } => {
                f.write_str(if *is_async { "(async function " } else { "(function " })?;
                write_params(f, params, rest)?;
                match body.as_slice() {
                    [] => f.write_str(" { })"),
                    [single] => write!(f, " {{ return {}; }})", single),
                    _ => {
                        f.write_str(" { return (")?;
                        join(f, body, ", ")?;
                        f.write_str("); })")
                    }
                }
            }
            Value::Arrow { params, rest, body } => {
                f.write_str("(")?;
                write_params(f, params, rest)?;
                write!(f, " => {})", body)
            }
            Value::Sequence(items) if items.is_empty() => f.write_str("undefined"),
            Value::Sequence(items) => {
                f.write_str("(")?;
                join(f, items, ", ")?;
                f.write_str(")")
            }
            Value::Define { name, value } => {
                f.write_str("(this[")?;
                write_quoted(f, name)?;
                write!(f, "] = {}, undefined)", value)
            }
            Value::Lookup(name) => {
                f.write_str("this[")?;
                write_quoted(f, name)?;
                f.write_str("]")
            }
            Value::Assign { target, value } => write!(f, "({} = {})", target, value),
            Value::Member(path) => {
                f.write_str("(")?;
                join(f, path, ".")?;
                f.write_str(")")
            }
            Value::Spread(inner) => write!(f, "...{}", inner),
            Value::Tree(tree) => write!(f, "{}", tree),
            Value::Operator(op) => write!(f, "{}", op),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn atom(text: &str) -> Value {
        Value::Atom(text.into())
    }

    #[test]
    fn renders_infix_chains() {
        let sum = Value::Infix {
            operator: "+".into(),
            operands: vec![atom("1"), atom("2"), atom("3")],
        };
        assert_eq!(sum.to_string(), "(1 + 2 + 3)");
    }

    #[test]
    fn strings_are_json_quoted() {
        let text = Value::Str("say \"hi\"".into());
        assert_eq!(text.to_string(), r#""say \"hi\"""#);
        let array = Value::Array(vec![Value::Str("a".into()), atom("b")]);
        assert_eq!(array.to_string(), r#"["a", b]"#);
    }

    #[test]
    fn renders_functions_and_bindings() {
        let function = Value::Function {
            params: vec!["a".into()],
            rest: Some("more".into()),
            body: vec![atom("a")],
            is_async: false,
        };
        assert_eq!(function.to_string(), "(function (a, ...more) { return a; })");

        let define = Value::Define {
            name: "x".into(),
            value: Box::new(atom("1")),
        };
        assert_eq!(define.to_string(), r#"(this["x"] = 1, undefined)"#);
        assert_eq!(Value::Lookup("x".into()).to_string(), r#"this["x"]"#);
    }

    #[test]
    fn record_keeps_source_order() {
        let record = Value::Record(vec![("b".into(), atom("1")), ("a".into(), atom("2"))]);
        assert_eq!(record.to_string(), "{ b: 1, a: 2 }");
        assert_eq!(Value::Record(vec![]).to_string(), "{}");
    }

    #[test]
    fn serializes_for_other_backends() {
        let call = Value::Call {
            callee: Box::new(atom("f")),
            args: vec![Value::Str("x".into())],
        };
        let json = serde_json::to_value(&call).unwrap();
        assert_eq!(json["Call"]["callee"]["Atom"], "f");
        assert_eq!(json["Call"]["args"][0]["Str"], "x");
    }
}
