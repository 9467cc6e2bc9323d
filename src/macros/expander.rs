//! # Expansion Engine
//!
//! Turns a [`Tree`] into a [`Value`] by resolving the head of every list against the
//! current [`Scope`] and invoking what it finds.
//!
//! ## Dispatch
//!
//! - An atom expands to itself; `Empty` and `()` expand to [`Value::Empty`].
//! - A list whose head resolves to a macro hands the macro its argument trees
//!   unexpanded. Tree output is expanded again; anything else is final.
//! - A list whose head resolves to a function expands the arguments left to right
//!   first, then calls the function.
//! - A list whose head is itself a list expands the head once. An operator value is
//!   dispatched as above.
//! - Anything else is handed, whole, to the dynamic-call operator (`call` by default).
//!
//! Operators run in expansion order, so a definition made by one form is visible to
//! every form expanded after it and to none expanded before it.
//!
//! ## Staging
//!
//! `preserve` and `escape` heads are handled here before the scope is consulted, so
//! they keep their meaning under any operator table.
//! [`ExpansionContext::preserve`] rebuilds a tree as literal data instead of expanding
//! it. Inside it, `(escape X)` switches back to ordinary expansion for `X`.

use serde::Serialize;

use crate::engine::EngineConfig;
use crate::errors::{unspanned, ErrorKind, ErrorReporting, TorontoError};
use crate::macros::{template, Macro, Operator};
use crate::runtime::scope::Scope;
use crate::runtime::Value;
use crate::syntax::{Tree, ESCAPE, PRESERVE};
use miette::SourceSpan;

// ============================================================================
// SECTION 1: TRACE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StepKind {
    Macro,
    Template,
    Function,
    DynamicCall,
}

/// One operator invocation, recorded when tracing is enabled.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpansionStep {
    pub operator: String,
    pub kind: StepKind,
    pub depth: usize,
    pub input: Tree,
}

// ============================================================================
// SECTION 2: CONTEXT
// ============================================================================

pub struct ExpansionContext {
    scope: Scope,
    config: EngineConfig,
    depth: usize,
    trace: Vec<ExpansionStep>,
}

impl ExpansionContext {
    pub fn new(scope: Scope, config: EngineConfig) -> Self {
        Self {
            scope,
            config,
            depth: 0,
            trace: Vec::new(),
        }
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn scope_mut(&mut self) -> &mut Scope {
        &mut self.scope
    }

    pub fn into_scope(self) -> Scope {
        self.scope
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn trace(&self) -> &[ExpansionStep] {
        &self.trace
    }

    pub fn take_trace(&mut self) -> Vec<ExpansionStep> {
        std::mem::take(&mut self.trace)
    }

    /// Runs `body` in a child scope; definitions made inside are dropped afterwards,
    /// whether or not `body` succeeds.
    pub fn with_child_scope<T>(
        &mut self,
        body: impl FnOnce(&mut Self) -> Result<T, TorontoError>,
    ) -> Result<T, TorontoError> {
        let parent = self.scope.child();
        let result = body(self);
        self.scope = parent;
        result
    }

    fn record(&mut self, operator: &str, kind: StepKind, input: &Tree) {
        if self.config.trace {
            self.trace.push(ExpansionStep {
                operator: operator.to_string(),
                kind,
                depth: self.depth,
                input: input.clone(),
            });
        }
    }
}

// ============================================================================
// SECTION 3: EXPANSION
// ============================================================================

impl ExpansionContext {
    pub fn expand(&mut self, tree: &Tree) -> Result<Value, TorontoError> {
        match tree {
            Tree::Empty => Ok(Value::Empty),
            Tree::Atom(text) => Ok(Value::Atom(text.clone())),
            Tree::List(items) => match items.split_first() {
                None => Ok(Value::Empty),
                Some((head, args)) => {
                    if self.depth >= self.config.max_depth {
                        let limit = self.config.max_depth;
                        return Err(self
                            .report(ErrorKind::RecursionLimit { limit }, unspanned())
                            .locate_in(tree));
                    }
                    self.depth += 1;
                    let result = self.expand_form(tree, head, args);
                    self.depth -= 1;
                    result.map_err(|err| err.locate_in(tree))
                }
            },
        }
    }

    /// Expands each tree in order.
    pub fn expand_all(&mut self, trees: &[Tree]) -> Result<Vec<Value>, TorontoError> {
        trees.iter().map(|tree| self.expand(tree)).collect()
    }

    fn expand_form(&mut self, node: &Tree, head: &Tree, args: &[Tree]) -> Result<Value, TorontoError> {
        match head {
            // Staging belongs to the expander, whatever the operator table holds.
            Tree::Atom(name) if name == PRESERVE => {
                self.record(name, StepKind::Macro, node);
                self.preserve_all(args)
            }
            Tree::Atom(name) if name == ESCAPE => {
                Err(self.report(ErrorKind::EscapeOutsidePreserve, unspanned()))
            }
            Tree::Atom(name) => match self.scope.resolve_operator(name) {
                Some(op) => self.invoke(&op, name, node, args),
                None => self.dynamic_call(node, None),
            },
            Tree::List(_) => {
                let scope = self.scope.clone();
                let traced = self.trace.len();
                match self.expand(head)? {
                    Value::Operator(op) => self.invoke(&op, &head.pretty(), node, args),
                    callee => {
                        let computed = ComputedHead {
                            callee,
                            scope,
                            traced,
                        };
                        self.dynamic_call(node, Some(computed))
                    }
                }
            }
            Tree::Empty => self.dynamic_call(node, None),
        }
    }

    fn invoke(
        &mut self,
        op: &Operator,
        name: &str,
        node: &Tree,
        args: &[Tree],
    ) -> Result<Value, TorontoError> {
        self.invoke_as(op, name, node, args, None)
    }

    /// Invokes `op`, tracing the step as `traced_as` when given.
    fn invoke_as(
        &mut self,
        op: &Operator,
        name: &str,
        node: &Tree,
        args: &[Tree],
        traced_as: Option<StepKind>,
    ) -> Result<Value, TorontoError> {
        let kind = match op {
            Operator::Macro(Macro::Native(_)) => StepKind::Macro,
            Operator::Macro(Macro::Template(_)) => StepKind::Template,
            Operator::Function(_) => StepKind::Function,
        };
        self.record(name, traced_as.unwrap_or(kind), node);
        match op {
            Operator::Macro(Macro::Native(func)) => {
                let output = func(args, self)?;
                self.expand_output(output)
            }
            Operator::Macro(Macro::Template(macro_template)) => {
                let output = template::instantiate(macro_template, args, self)?;
                self.expand(&output)
            }
            Operator::Function(func) => {
                let values = self.expand_all(args)?;
                func(&values, self)
            }
        }
    }

    fn expand_output(&mut self, output: Value) -> Result<Value, TorontoError> {
        match output {
            Value::Tree(tree) => self.expand(&tree),
            value => Ok(value),
        }
    }

    /// Hands an unresolved form to the fallback operator.
    ///
    /// A function fallback receives an already expanded computed head as its first
    /// value. A macro fallback reads the head tree itself, so everything the first
    /// expansion of the head did to the scope and the trace is rolled back first.
    fn dynamic_call(
        &mut self,
        node: &Tree,
        head: Option<ComputedHead>,
    ) -> Result<Value, TorontoError> {
        let fallback = self.config.fallback_operator.clone();
        let items = node.as_list().unwrap_or_default();
        let rest = items.get(1..).unwrap_or_default();
        let Some(op) = self.scope.resolve_operator(&fallback) else {
            let name = items.first().map(Tree::pretty).unwrap_or_default();
            return Err(self
                .report(ErrorKind::UnresolvedOperator { name, fallback }, unspanned())
                .with_help("define the fallback operator or bind this name to an operator"));
        };
        match (op, head) {
            (Operator::Function(func), Some(head)) => {
                self.record(&fallback, StepKind::DynamicCall, node);
                let mut values = Vec::with_capacity(items.len());
                values.push(head.callee);
                values.extend(self.expand_all(rest)?);
                func(&values, self)
            }
            (op, head) => {
                if let Some(head) = head {
                    self.scope = head.scope;
                    self.trace.truncate(head.traced);
                }
                self.invoke_as(&op, &fallback, node, items, Some(StepKind::DynamicCall))
            }
        }
    }
}

/// A list head that expanded to something other than an operator.
struct ComputedHead {
    callee: Value,
    /// Scope and trace length from before the head was expanded.
    scope: Scope,
    traced: usize,
}

// ============================================================================
// SECTION 4: STAGING
// ============================================================================

impl ExpansionContext {
    /// `(preserve X)` is `X` as data; `(preserve X Y ...)` is an array of each.
    pub fn preserve_all(&mut self, forms: &[Tree]) -> Result<Value, TorontoError> {
        match forms {
            [form] => self.preserve(form),
            _ => Ok(Value::Array(
                forms
                    .iter()
                    .map(|form| self.preserve(form))
                    .collect::<Result<_, _>>()?,
            )),
        }
    }

    /// Rebuilds `tree` as literal data: atoms become strings, lists become arrays.
    ///
    /// `(escape X)` is replaced by the expansion of `X`. In list position,
    /// `(escape (spread X))` splices the elements of `X` when it expands to an array.
    pub fn preserve(&mut self, tree: &Tree) -> Result<Value, TorontoError> {
        match tree {
            Tree::Empty => Ok(Value::Empty),
            Tree::Atom(text) => Ok(Value::Str(text.clone())),
            Tree::List(items) => {
                if let Some(args) = tree.form_args(ESCAPE) {
                    return self.expand_escape(tree, args);
                }
                let mut elements = Vec::with_capacity(items.len());
                for item in items {
                    match template::spliced_escape(item) {
                        Some(spliced) => match self.expand(spliced)? {
                            Value::Array(values) => elements.extend(values),
                            other => elements.push(Value::Spread(Box::new(other))),
                        },
                        None => elements.push(self.preserve(item)?),
                    }
                }
                Ok(Value::Array(elements))
            }
        }
    }

    fn expand_escape(&mut self, node: &Tree, args: &[Tree]) -> Result<Value, TorontoError> {
        match args {
            [inner] => self.expand(inner),
            _ => Err(self.arity_mismatch(ESCAPE, "1", args.len()).locate_in(node)),
        }
    }
}

impl ErrorReporting for ExpansionContext {
    fn report(&self, kind: ErrorKind, span: SourceSpan) -> TorontoError {
        TorontoError::unlocated(kind, span, "expand")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atoms::standard_table;
    use crate::errors::ErrorCategory;
    use crate::syntax::parser::parse;

    fn context() -> ExpansionContext {
        ExpansionContext::new(Scope::new(standard_table()), EngineConfig::default())
    }

    fn expand(text: &str) -> Result<Value, TorontoError> {
        let tree = parse(text)?;
        context().expand(&tree)
    }

    #[test]
    fn atoms_and_empty_pass_through() {
        assert_eq!(expand("x").unwrap(), Value::Atom("x".into()));
        assert_eq!(expand("").unwrap(), Value::Empty);
        assert_eq!(expand("()").unwrap(), Value::Empty);
    }

    #[test]
    fn preserve_splices_escapes() {
        let value = expand("%(a <(+ 1 2)>)").unwrap();
        assert_eq!(value.to_string(), r#"["a", (1 + 2)]"#);
    }

    #[test]
    fn preserve_splices_spread_escapes() {
        let value = expand("%(a <...[b c]> d)").unwrap();
        assert_eq!(value.to_string(), r#"["a", b, c, "d"]"#);
    }

    #[test]
    fn escape_outside_preserve_is_rejected() {
        let err = expand("(f <x>)").unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Escape);
    }

    #[test]
    fn missing_fallback_is_a_resolution_error() {
        let mut table = standard_table();
        table.remove("call");
        let mut ctx = ExpansionContext::new(Scope::new(table), EngineConfig::default());
        let err = ctx.expand(&parse("(foo 1)").unwrap()).unwrap_err();
        assert_eq!(
            err.kind,
            ErrorKind::UnresolvedOperator {
                name: "foo".into(),
                fallback: "call".into()
            }
        );
    }

    #[test]
    fn child_scope_is_restored_on_error() {
        let mut ctx = context();
        let result: Result<(), TorontoError> = ctx.with_child_scope(|ctx| {
            ctx.scope_mut().define("inner", Value::Empty);
            Err(ctx.undefined_name("inner"))
        });
        assert!(result.is_err());
        assert!(ctx.scope().resolve("inner").is_none());
    }

    #[test]
    fn depth_limit_is_enforced() {
        let config = EngineConfig {
            max_depth: 3,
            ..EngineConfig::default()
        };
        let mut ctx = ExpansionContext::new(Scope::new(standard_table()), config);
        assert!(ctx.expand(&parse("(+ 1 (+ 2 3))").unwrap()).is_ok());
        let err = ctx
            .expand(&parse("(+ 1 (+ 2 (+ 3 (+ 4 5))))").unwrap())
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::RecursionLimit { limit: 3 });
        assert_eq!(ctx.depth(), 0);
    }
}
