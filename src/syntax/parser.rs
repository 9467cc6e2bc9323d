//! Tree builder: drives a [`Chain`] over a whole source and assembles the forms.

use once_cell::sync::Lazy;

use crate::errors::{SourceContext, TorontoError};
use crate::syntax::bracketize::bracketize;
use crate::syntax::reader::Reader;
use crate::syntax::recognizers::Chain;
use crate::syntax::{Tree, SEQUENCE};

static STANDARD_CHAIN: Lazy<Chain> = Lazy::new(Chain::standard);

/// Parses `text` with the standard chain.
pub fn parse(text: &str) -> Result<Tree, TorontoError> {
    parse_with(&STANDARD_CHAIN, &SourceContext::anonymous(text))
}

/// Parses indentation-structured text with the standard chain.
pub fn parse_indented(text: &str) -> Result<Tree, TorontoError> {
    let source = bracketize(&SourceContext::anonymous(text))?;
    parse_with(&STANDARD_CHAIN, &source)
}

/// Parses a named source with `chain` and wraps the forms into a single tree.
pub fn parse_with(chain: &Chain, source: &SourceContext) -> Result<Tree, TorontoError> {
    parse_forms(chain, source).map(wrap_in_sequence)
}

/// Reads every top-level form, in source order. Comments and whitespace are dropped.
pub fn parse_forms(chain: &Chain, source: &SourceContext) -> Result<Vec<Tree>, TorontoError> {
    let mut reader = Reader::new(source);
    let mut forms = Vec::new();
    while !reader.is_at_end() {
        if let Some(form) = chain.read_child(&mut reader, None)? {
            forms.push(form);
        }
    }
    Ok(forms)
}

/// No forms read to `Empty`, one form is itself, several become `(do forms...)`.
pub fn wrap_in_sequence(mut forms: Vec<Tree>) -> Tree {
    match forms.len() {
        0 => Tree::Empty,
        1 => forms.remove(0),
        _ => Tree::tagged(SEQUENCE, forms),
    }
}
