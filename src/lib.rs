pub use crate::engine::{Compilation, Engine, EngineConfig};
pub use crate::errors::{ErrorCategory, ErrorKind, SourceContext, TorontoError};
pub use crate::runtime::Value;
pub use crate::syntax::{Span, Tree};

pub mod atoms;
pub mod engine;
pub mod errors;
pub mod macros;
pub mod runtime;
pub mod syntax;

pub mod prelude {
    pub use crate::engine::{Compilation, Engine, EngineConfig};
    pub use crate::errors::{ErrorKind, ErrorReporting, SourceContext, TorontoError};
    pub use crate::macros::expander::ExpansionContext;
    pub use crate::macros::{FunctionFn, MacroFn, Operator};
    pub use crate::runtime::scope::{OperatorTable, Scope};
    pub use crate::runtime::Value;
    pub use crate::syntax::parser::parse;
    pub use crate::syntax::Tree;
}
