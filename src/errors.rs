//! Toronto Error Handling - Unified Encapsulated API
//!
//! Every failure in the pipeline, from an unterminated string in the reader to an
//! escape used outside of a preserved form, is a [`TorontoError`]. Errors are fatal to
//! the call that produced them: there is no partial tree and no partial output.

use miette::{Diagnostic, LabeledSpan, NamedSource, SourceSpan};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::syntax::{Span, Tree};

// ============================================================================
// SOURCE CONTEXT - Error reporting infrastructure
// ============================================================================

/// Named source text handed to the reader, used to label lexical diagnostics.
#[derive(Debug, Clone)]
pub struct SourceContext {
    pub name: String,
    pub content: String,
}

impl SourceContext {
    /// Create a source context from real file content
    pub fn from_file(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    /// Create a source context for text that has no file behind it
    pub fn anonymous(content: impl Into<String>) -> Self {
        Self::from_file("input", content)
    }

    /// Convert to NamedSource for use with miette error reporting
    pub fn to_named_source(&self) -> Arc<NamedSource<String>> {
        Arc::new(NamedSource::new(self.name.clone(), self.content.clone()))
    }
}

impl Default for SourceContext {
    fn default() -> Self {
        Self::anonymous("")
    }
}

/// The single error type - no wrapper, no variants, just essential data
#[derive(Debug)]
pub struct TorontoError {
    /// What went wrong (type-specific data)
    pub kind: ErrorKind,
    /// Where it happened
    pub source_info: SourceInfo,
    /// How to help
    pub diagnostic_info: DiagnosticInfo,
}

/// All error types as a clean enum
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ErrorKind {
    // Lexical errors - the reader could not finish a token
    #[error("unterminated {delimiter}-quoted literal")]
    UnterminatedLiteral { delimiter: char },
    #[error("unterminated list, expected '{close}'")]
    UnterminatedList { close: String },
    #[error("no recognizer matched input at '{found}'")]
    UnrecognizedToken { found: String },
    #[error("indentation must use spaces, found a tab on line {line}")]
    TabIndentation { line: usize },

    // Resolution errors - a name could not be found
    #[error("'{name}' names no operator and the '{fallback}' fallback is not configured")]
    UnresolvedOperator { name: String, fallback: String },
    #[error("'{name}' is not defined in this scope")]
    UndefinedName { name: String },

    // Shape errors - reported by operators about their own operands
    #[error("'{operator}' expected {expected}, found {found}")]
    ShapeMismatch {
        operator: String,
        expected: String,
        found: String,
    },
    #[error("'{operator}' expected {expected} arguments, received {actual}")]
    ArityMismatch {
        operator: String,
        expected: String,
        actual: usize,
    },
    #[error("invalid macro '{name}': {reason}")]
    InvalidMacro { name: String, reason: String },

    // Staging errors
    #[error("escape used outside of a preserved form")]
    EscapeOutsidePreserve,

    // Resource limits
    #[error("expansion exceeded the depth limit of {limit}")]
    RecursionLimit { limit: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Lexical,
    Resolution,
    Shape,
    Escape,
    Limit,
}

/// Context-specific source information
#[derive(Debug, Clone)]
pub struct SourceInfo {
    /// `None` until the error is attached to a source or a form.
    pub source: Option<Arc<NamedSource<String>>>,
    pub primary_span: SourceSpan,
    pub phase: String,
}

/// Diagnostic enhancement data
#[derive(Debug, Clone)]
pub struct DiagnosticInfo {
    pub help: Option<String>,
    pub error_code: String,
}

/// Context-aware error creation - each context knows how to create appropriate errors
pub trait ErrorReporting {
    /// Create an error with context-appropriate enhancements
    fn report(&self, kind: ErrorKind, span: SourceSpan) -> TorontoError;

    fn shape_mismatch(
        &self,
        operator: &str,
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> TorontoError {
        self.report(
            ErrorKind::ShapeMismatch {
                operator: operator.into(),
                expected: expected.into(),
                found: found.into(),
            },
            unspanned(),
        )
    }

    fn arity_mismatch(&self, operator: &str, expected: &str, actual: usize) -> TorontoError {
        self.report(
            ErrorKind::ArityMismatch {
                operator: operator.into(),
                expected: expected.into(),
                actual,
            },
            unspanned(),
        )
    }

    fn undefined_name(&self, name: &str) -> TorontoError {
        self.report(ErrorKind::UndefinedName { name: name.into() }, unspanned())
    }
}

impl ErrorKind {
    /// Get the error category for test assertions
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::UnterminatedLiteral { .. }
            | Self::UnterminatedList { .. }
            | Self::UnrecognizedToken { .. }
            | Self::TabIndentation { .. } => ErrorCategory::Lexical,

            Self::UnresolvedOperator { .. } | Self::UndefinedName { .. } => {
                ErrorCategory::Resolution
            }

            Self::ShapeMismatch { .. } | Self::ArityMismatch { .. } | Self::InvalidMacro { .. } => {
                ErrorCategory::Shape
            }

            Self::EscapeOutsidePreserve => ErrorCategory::Escape,
            Self::RecursionLimit { .. } => ErrorCategory::Limit,
        }
    }

    /// Get error code suffix for diagnostic codes
    pub const fn code_suffix(&self) -> &'static str {
        match self {
            Self::UnterminatedLiteral { .. } => "unterminated_literal",
            Self::UnterminatedList { .. } => "unterminated_list",
            Self::UnrecognizedToken { .. } => "unrecognized_token",
            Self::TabIndentation { .. } => "tab_indentation",
            Self::UnresolvedOperator { .. } => "unresolved_operator",
            Self::UndefinedName { .. } => "undefined_name",
            Self::ShapeMismatch { .. } => "shape_mismatch",
            Self::ArityMismatch { .. } => "arity_mismatch",
            Self::InvalidMacro { .. } => "invalid_macro",
            Self::EscapeOutsidePreserve => "escape_outside_preserve",
            Self::RecursionLimit { .. } => "recursion_limit",
        }
    }

    fn primary_label(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Lexical => "reading stopped here",
            ErrorCategory::Resolution => "unresolved here",
            ErrorCategory::Shape => "in this form",
            ErrorCategory::Escape => "escape has nothing to splice into",
            ErrorCategory::Limit => "expansion too deep",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Lexical => "Lexical",
            Self::Resolution => "Resolution",
            Self::Shape => "Shape",
            Self::Escape => "Escape",
            Self::Limit => "Limit",
        };
        f.write_str(name)
    }
}

// ============================================================================
// TORONTO ERROR
// ============================================================================

impl TorontoError {
    /// Builds an error with no source attached yet; the expander attaches the
    /// offending form once the error leaves the operator that raised it.
    pub fn unlocated(kind: ErrorKind, span: SourceSpan, phase: &str) -> Self {
        let error_code = format!("toronto::{}::{}", phase, kind.code_suffix());
        Self {
            kind,
            source_info: SourceInfo {
                source: None,
                primary_span: span,
                phase: phase.to_string(),
            },
            diagnostic_info: DiagnosticInfo {
                help: None,
                error_code,
            },
        }
    }

    pub fn category(&self) -> ErrorCategory {
        self.kind.category()
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.diagnostic_info.help = Some(help.into());
        self
    }

    /// Attaches `form` as the error's source unless an inner form already claimed it.
    pub fn locate_in(mut self, form: &Tree) -> Self {
        if self.source_info.source.is_none() {
            let text = form.pretty();
            self.source_info.primary_span = SourceSpan::from(0..text.len());
            self.source_info.source = Some(Arc::new(NamedSource::new("form", text)));
        }
        self
    }
}

impl std::error::Error for TorontoError {}

impl fmt::Display for TorontoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} error: {}", self.kind.category(), self.kind)
    }
}

impl Diagnostic for TorontoError {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(&self.diagnostic_info.error_code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.diagnostic_info
            .help
            .as_ref()
            .map(|h| Box::new(h) as Box<dyn fmt::Display>)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        self.source_info.source.as_ref()?;
        let labels = vec![LabeledSpan::new_with_span(
            Some(self.kind.primary_label().to_string()),
            self.source_info.primary_span,
        )];
        Some(Box::new(labels.into_iter()))
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        self.source_info
            .source
            .as_ref()
            .map(|s| &**s as &dyn miette::SourceCode)
    }
}

/// Creates a placeholder span for errors not tied to a specific source location.
pub fn unspanned() -> SourceSpan {
    SourceSpan::from(0..0)
}

/// Converts a syntax Span to a miette SourceSpan.
pub fn to_source_span(span: Span) -> SourceSpan {
    SourceSpan::from(span.start..span.end)
}

// ============================================================================
// ERROR FORMATTING UTILITIES
// ============================================================================

/// Prints a TorontoError with full miette diagnostics
pub fn print_error(error: TorontoError) {
    use miette::Report;
    let report = Report::new(error);
    eprintln!("{report:?}");
}
