//! Engine facade: read, expand and render in one place.
//!
//! An [`Engine`] owns the pieces an embedder may want to swap out: the recognizer
//! chain, the base operator table and the expansion settings. Definitions live in a
//! [`Scope`] that the caller owns, so they survive from one compilation to the next
//! for exactly as long as the caller keeps the scope.

use serde::{Deserialize, Serialize};

use crate::atoms::standard_table;
use crate::errors::{SourceContext, TorontoError};
use crate::macros::expander::{ExpansionContext, ExpansionStep};
use crate::macros::MAX_EXPANSION_DEPTH;
use crate::runtime::scope::{OperatorTable, Scope};
use crate::runtime::Value;
use crate::syntax::bracketize::bracketize;
use crate::syntax::parser::parse_with;
use crate::syntax::recognizers::Chain;
use crate::syntax::Tree;

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Expansion settings.
///
/// Loadable from YAML; missing keys take their defaults:
///
/// ```yaml
/// max_depth: 64
/// trace: true
/// fallback_operator: call
/// indented: false
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Deepest list nesting expansion will enter.
    pub max_depth: usize,
    /// Record every operator invocation in [`Compilation::trace`].
    pub trace: bool,
    /// Operator that receives every form whose head is not an operator.
    pub fallback_operator: String,
    /// Read sources as indentation-structured lines instead of bracketed text.
    pub indented: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_depth: MAX_EXPANSION_DEPTH,
            trace: false,
            fallback_operator: "call".to_string(),
            indented: false,
        }
    }
}

impl EngineConfig {
    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(text)
    }
}

// ============================================================================
// ENGINE
// ============================================================================

pub struct Engine {
    chain: Chain,
    table: OperatorTable,
    config: EngineConfig,
}

/// The result of expanding one program.
#[derive(Debug, Clone, PartialEq)]
pub struct Compilation {
    pub value: Value,
    /// Empty unless tracing was enabled.
    pub trace: Vec<ExpansionStep>,
}

impl Engine {
    /// An engine with the standard chain, the standard operators and default settings.
    pub fn new() -> Self {
        Self {
            chain: Chain::standard(),
            table: standard_table(),
            config: EngineConfig::default(),
        }
    }

    pub fn with_chain(mut self, chain: Chain) -> Self {
        self.chain = chain;
        self
    }

    pub fn with_table(mut self, table: OperatorTable) -> Self {
        self.table = table;
        self
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn chain_mut(&mut self) -> &mut Chain {
        &mut self.chain
    }

    pub fn table_mut(&mut self) -> &mut OperatorTable {
        &mut self.table
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// A fresh scope over this engine's operator table.
    pub fn new_scope(&self) -> Scope {
        Scope::new(self.table.clone())
    }

    pub fn parse(&self, source: &SourceContext) -> Result<Tree, TorontoError> {
        if self.config.indented {
            return parse_with(&self.chain, &bracketize(source)?);
        }
        parse_with(&self.chain, source)
    }

    /// Expands `tree` in `scope`.
    ///
    /// Definitions made during expansion are kept in `scope` only if expansion
    /// succeeds; on error the scope is left as it was.
    pub fn expand(&self, tree: &Tree, scope: &mut Scope) -> Result<Compilation, TorontoError> {
        let mut ctx = ExpansionContext::new(scope.clone(), self.config.clone());
        let value = ctx.expand(tree)?;
        let trace = ctx.take_trace();
        *scope = ctx.into_scope();
        Ok(Compilation { value, trace })
    }

    pub fn compile(
        &self,
        source: &SourceContext,
        scope: &mut Scope,
    ) -> Result<Compilation, TorontoError> {
        let tree = self.parse(source)?;
        self.expand(&tree, scope)
    }

    /// Compiles `text` in a fresh scope.
    pub fn compile_str(&self, text: &str) -> Result<Compilation, TorontoError> {
        let mut scope = self.new_scope();
        self.compile(&SourceContext::anonymous(text), &mut scope)
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Compilation {
    /// Renders the expanded program as expression text.
    pub fn render(&self) -> String {
        self.value.to_string()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_loads_partial_yaml() {
        let config = EngineConfig::from_yaml("trace: true\n").unwrap();
        assert!(config.trace);
        assert_eq!(config.max_depth, MAX_EXPANSION_DEPTH);
        assert_eq!(config.fallback_operator, "call");
    }

    #[test]
    fn scope_survives_between_compilations() {
        let engine = Engine::new();
        let mut scope = engine.new_scope();
        let source = SourceContext::anonymous("(defmacro twice [x] (, x x))");
        engine.compile(&source, &mut scope).unwrap();

        let source = SourceContext::anonymous("(twice 1)");
        let output = engine.compile(&source, &mut scope).unwrap();
        assert_eq!(output.render(), "(1, 1)");
    }

    #[test]
    fn failed_compilation_leaves_scope_untouched() {
        let engine = Engine::new();
        let mut scope = engine.new_scope();
        let source = SourceContext::anonymous("(do (def x 1) (get missing))");
        assert!(engine.compile(&source, &mut scope).is_err());
        assert!(scope.resolve("x").is_none());
    }

    #[test]
    fn custom_fallback_operator() {
        let config = EngineConfig {
            fallback_operator: "vector".to_string(),
            ..EngineConfig::default()
        };
        let engine = Engine::new().with_config(config);
        assert_eq!(engine.compile_str("(f 1)").unwrap().render(), "[f, 1]");
    }

    #[test]
    fn indented_sources() {
        let config = EngineConfig::from_yaml("indented: true").unwrap();
        let engine = Engine::new().with_config(config);
        let output = engine.compile_str("print\n  + 1 2\n  x").unwrap();
        assert_eq!(output.render(), "console.log((1 + 2), x())");
    }

    #[test]
    fn json_output() {
        let output = Engine::new().compile_str("%a").unwrap();
        assert_eq!(output.to_json().unwrap(), r#"{"Str":"a"}"#);
    }
}
