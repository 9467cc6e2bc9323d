//! Template macros: parameter lists, arity, binding and instantiation.
//!
//! A template body is instantiated in one of two ways:
//!
//! - A body of the form `(preserve X)` (surface `%X`) is taken literally. Only its
//!   escapes are live: `<param>` is replaced by the bound tree and `<...rest>` splices
//!   the rest arguments.
//! - Any other body is substituted: every atom naming a parameter is replaced, and
//!   `...rest` splices. Preserved subtrees are left untouched.

use std::collections::HashMap;

use crate::errors::{ErrorReporting, TorontoError};
use crate::macros::expander::ExpansionContext;
use crate::macros::{MacroTemplate, ParamList};
use crate::syntax::{Tree, ESCAPE, PRESERVE, SPREAD, VECTOR};

#[derive(Debug, Clone, PartialEq)]
pub enum Binding {
    Single(Tree),
    Rest(Vec<Tree>),
}

/// Reads `[a b ...rest]` (or a plain list of the same shape) as a parameter list.
pub fn parse_params(
    operator: &str,
    tree: &Tree,
    ctx: &ExpansionContext,
) -> Result<ParamList, TorontoError> {
    let items = match tree.form_args(VECTOR) {
        Some(items) => items,
        None => tree
            .as_list()
            .ok_or_else(|| ctx.shape_mismatch(operator, "a parameter list", tree.pretty()))?,
    };

    let mut params = ParamList::default();
    for (i, item) in items.iter().enumerate() {
        let is_last = i + 1 == items.len();
        match (item, item.form_args(SPREAD)) {
            (Tree::Atom(name), _) => params.required.push(name.clone()),
            (_, Some([Tree::Atom(rest)])) if is_last => params.rest = Some(rest.clone()),
            _ => {
                return Err(ctx.shape_mismatch(
                    operator,
                    "parameter names and an optional trailing ...rest",
                    item.pretty(),
                ))
            }
        }
    }
    Ok(params)
}

pub fn check_arity(
    template: &MacroTemplate,
    args: &[Tree],
    ctx: &ExpansionContext,
) -> Result<(), TorontoError> {
    let required = template.params.required.len();
    let (accepted, expected) = match template.params.rest {
        Some(_) => (args.len() >= required, format!("at least {}", required)),
        None => (args.len() == required, required.to_string()),
    };
    if accepted {
        Ok(())
    } else {
        Err(ctx.arity_mismatch(&template.name, &expected, args.len()))
    }
}

/// Binds parameters to argument trees. Arity must already have been checked.
pub fn bind_params(params: &ParamList, args: &[Tree]) -> HashMap<String, Binding> {
    let mut bindings: HashMap<String, Binding> = params
        .required
        .iter()
        .zip(args)
        .map(|(name, arg)| (name.clone(), Binding::Single(arg.clone())))
        .collect();
    if let Some(rest) = &params.rest {
        let extra = args.get(params.required.len()..).unwrap_or_default();
        bindings.insert(rest.clone(), Binding::Rest(extra.to_vec()));
    }
    bindings
}

/// Checks arity, binds the arguments and produces the tree to expand in place of the call.
pub fn instantiate(
    template: &MacroTemplate,
    args: &[Tree],
    ctx: &ExpansionContext,
) -> Result<Tree, TorontoError> {
    check_arity(template, args, ctx)?;
    let bindings = bind_params(&template.params, args);
    Ok(match template.body.form_args(PRESERVE) {
        Some([quoted]) => quasi(quoted, &bindings),
        _ => substitute(&template.body, &bindings),
    })
}

/// `X` when `item` is `(escape (spread X))`.
pub(crate) fn spliced_escape(item: &Tree) -> Option<&Tree> {
    match item.form_args(ESCAPE)? {
        [inner] => match inner.form_args(SPREAD)? {
            [spliced] => Some(spliced),
            _ => None,
        },
        _ => None,
    }
}

fn quasi(tree: &Tree, bindings: &HashMap<String, Binding>) -> Tree {
    let Tree::List(items) = tree else {
        return tree.clone();
    };
    if let Some([inner]) = tree.form_args(ESCAPE) {
        return substitute(inner, bindings);
    }

    let mut out = Vec::with_capacity(items.len());
    for item in items {
        let Some(spliced) = spliced_escape(item) else {
            out.push(quasi(item, bindings));
            continue;
        };
        match spliced.as_atom().and_then(|name| bindings.get(name)) {
            Some(Binding::Rest(trees)) => out.extend(trees.iter().cloned()),
            _ => out.push(Tree::tagged(SPREAD, [substitute(spliced, bindings)])),
        }
    }
    Tree::List(out)
}

fn substitute(tree: &Tree, bindings: &HashMap<String, Binding>) -> Tree {
    match tree {
        Tree::Empty => Tree::Empty,
        Tree::Atom(name) => match bindings.get(name) {
            Some(Binding::Single(bound)) => bound.clone(),
            Some(Binding::Rest(bound)) => Tree::tagged(VECTOR, bound.iter().cloned()),
            None => tree.clone(),
        },
        Tree::List(_) if tree.is_form(PRESERVE) => live_escapes(tree, bindings),
        Tree::List(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                if let Some([Tree::Atom(name)]) = item.form_args(SPREAD) {
                    if let Some(Binding::Rest(bound)) = bindings.get(name) {
                        out.extend(bound.iter().cloned());
                        continue;
                    }
                }
                out.push(substitute(item, bindings));
            }
            Tree::List(out)
        }
    }
}

/// Substitutes inside the escapes of a preserved subtree and leaves the rest literal.
/// The escapes themselves stay in place for the expander to evaluate.
fn live_escapes(tree: &Tree, bindings: &HashMap<String, Binding>) -> Tree {
    match tree {
        Tree::List(items) if tree.is_form(ESCAPE) => {
            let mut out = Vec::with_capacity(items.len());
            out.push(items[0].clone());
            out.extend(items[1..].iter().map(|inner| substitute(inner, bindings)));
            Tree::List(out)
        }
        Tree::List(items) => Tree::List(items.iter().map(|item| live_escapes(item, bindings)).collect()),
        _ => tree.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineConfig;
    use crate::errors::ErrorKind;
    use crate::runtime::scope::Scope;
    use crate::syntax::parser::parse;

    fn ctx() -> ExpansionContext {
        ExpansionContext::new(Scope::default(), EngineConfig::default())
    }

    fn template(params: &str, body: &str) -> MacroTemplate {
        let params = parse_params("test", &parse(params).unwrap(), &ctx()).unwrap();
        MacroTemplate::new("m", params, parse(body).unwrap()).unwrap()
    }

    fn args(text: &str) -> Vec<Tree> {
        parse(text).unwrap().as_list().unwrap().to_vec()
    }

    #[test]
    fn parses_rest_parameter() {
        let params = parse_params("test", &parse("[a b ...more]").unwrap(), &ctx()).unwrap();
        assert_eq!(params.required, vec!["a", "b"]);
        assert_eq!(params.rest.as_deref(), Some("more"));
    }

    #[test]
    fn rest_must_come_last() {
        let err = parse_params("test", &parse("[...more a]").unwrap(), &ctx()).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::ShapeMismatch { .. }));
    }

    #[test]
    fn arity_is_exact_without_rest() {
        let t = template("[a b]", "(+ a b)");
        let err = instantiate(&t, &args("(1)"), &ctx()).unwrap_err();
        assert_eq!(
            err.kind,
            ErrorKind::ArityMismatch {
                operator: "m".into(),
                expected: "2".into(),
                actual: 1
            }
        );
    }

    #[test]
    fn substitution_splices_rest() {
        let t = template("[f ...xs]", "(f 0 ...xs)");
        let out = instantiate(&t, &args("(g 1 2)"), &ctx()).unwrap();
        assert_eq!(out.pretty(), "(g 0 1 2)");
    }

    #[test]
    fn substitution_keeps_preserved_subtrees_literal() {
        let t = template("[x]", "(f x %x)");
        let out = instantiate(&t, &args("(1)"), &ctx()).unwrap();
        assert_eq!(out.pretty(), "(f 1 (preserve x))");
    }

    #[test]
    fn escapes_in_nested_preserves_see_parameters() {
        let t = template("[x ...xs]", "(do %(x <x> <...xs>))");
        let out = instantiate(&t, &args("((+ 1 2) a b)"), &ctx()).unwrap();
        assert_eq!(
            out.pretty(),
            "(do (preserve (x (escape (+ 1 2)) (escape (spread (vector a b))))))"
        );
    }

    #[test]
    fn quasi_body_only_replaces_escapes() {
        let t = template("[x ...xs]", "%(x <x> <...xs>)");
        let out = instantiate(&t, &args("((+ 1 2) a b)"), &ctx()).unwrap();
        assert_eq!(out.pretty(), "(x (+ 1 2) a b)");
    }
}
