//! Operator table and scope.
//!
//! The [`OperatorTable`] is the base mapping from names to operators, normally the
//! standard library. A [`Scope`] layers local definitions over a base table. Both are
//! built on persistent maps, so cloning either one is cheap and a child scope is just
//! a clone that stops sharing on its first write.

use std::fmt;

use im::HashMap;

use crate::macros::{FunctionFn, Macro, MacroFn, MacroTemplate, Operator};
use crate::runtime::Value;

// ============================================================================
// OPERATOR TABLE
// ============================================================================

#[derive(Clone, Default)]
pub struct OperatorTable {
    entries: HashMap<String, Value>,
}

impl OperatorTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a macro: it receives its arguments unexpanded.
    pub fn register_macro(&mut self, name: &str, func: MacroFn) {
        self.insert(name, Value::Operator(Operator::Macro(Macro::Native(func))));
    }

    /// Registers a function: it receives its arguments already expanded.
    pub fn register_function(&mut self, name: &str, func: FunctionFn) {
        self.insert(name, Value::Operator(Operator::Function(func)));
    }

    pub fn register_template(&mut self, template: MacroTemplate) {
        let name = template.name.clone();
        self.insert(&name, Value::Operator(Operator::template(template)));
    }

    pub fn insert(&mut self, name: &str, value: Value) -> Option<Value> {
        self.entries.insert(name.to_string(), value)
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.entries.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.keys().cloned().collect();
        names.sort();
        names
    }

    /// Adds every entry of `other`, replacing entries of the same name.
    pub fn extend(&mut self, other: &OperatorTable) {
        for (name, value) in other.entries.iter() {
            self.entries.insert(name.clone(), value.clone());
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for OperatorTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperatorTable")
            .field("names", &self.names())
            .finish()
    }
}

// ============================================================================
// SCOPE
// ============================================================================

/// Local definitions over a base table.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    base: OperatorTable,
    locals: HashMap<String, Value>,
}

impl Scope {
    pub fn new(base: OperatorTable) -> Self {
        Self {
            base,
            locals: HashMap::new(),
        }
    }

    /// Looks a name up in the locals, then in the base table.
    pub fn resolve(&self, name: &str) -> Option<&Value> {
        self.locals.get(name).or_else(|| self.base.get(name))
    }

    /// The operator bound to `name`, if the binding is an operator.
    pub fn resolve_operator(&self, name: &str) -> Option<Operator> {
        self.resolve(name)?.as_operator().cloned()
    }

    /// Binds `name` locally, returning the local binding it shadows.
    pub fn define(&mut self, name: &str, value: Value) -> Option<Value> {
        self.locals.insert(name.to_string(), value)
    }

    pub fn is_defined_locally(&self, name: &str) -> bool {
        self.locals.contains_key(name)
    }

    pub fn locals(&self) -> impl Iterator<Item = &str> {
        self.locals.keys().map(String::as_str)
    }

    /// A scope that sees every current binding; its own definitions stay in it.
    pub fn child(&self) -> Scope {
        self.clone()
    }

    pub fn base(&self) -> &OperatorTable {
        &self.base
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::macros::expander::ExpansionContext;
    use crate::errors::TorontoError;

    fn identity(args: &[Value], _ctx: &mut ExpansionContext) -> Result<Value, TorontoError> {
        Ok(args.first().cloned().unwrap_or_default())
    }

    #[test]
    fn locals_shadow_base() {
        let mut table = OperatorTable::new();
        table.register_function("id", identity);
        let mut scope = Scope::new(table);
        assert!(scope.resolve_operator("id").is_some());

        assert_eq!(scope.define("id", Value::Atom("1".into())), None);
        assert_eq!(scope.resolve("id"), Some(&Value::Atom("1".into())));
        assert!(scope.resolve_operator("id").is_none());
        assert!(scope.base().contains("id"));
    }

    #[test]
    fn child_definitions_do_not_leak() {
        let mut parent = Scope::default();
        parent.define("x", Value::Atom("1".into()));
        let mut child = parent.child();
        child.define("y", Value::Atom("2".into()));

        assert!(child.resolve("x").is_some());
        assert!(parent.resolve("y").is_none());
        assert_eq!(child.locals().count(), 2);
    }

    #[test]
    fn names_are_sorted() {
        let mut table = OperatorTable::new();
        table.register_function("b", identity);
        table.register_function("a", identity);
        assert_eq!(table.names(), vec!["a".to_string(), "b".to_string()]);
        assert_eq!(table.len(), 2);
    }
}
