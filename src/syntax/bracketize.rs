//! Indentation front end.
//!
//! Rewrites indented source into bracketed source before it reaches the recognizer
//! chain. Every non-blank line becomes one list; lines indented deeper than the line
//! above become its children, and a dedent closes every list at or below the new
//! level:
//!
//! ```text
//! def area            (def area
//!   * w h        =>    (* w h)
//! print area           )
//!                      (print area)
//! ```
//!
//! Indentation must use spaces. Lines holding only a comment are dropped.

use miette::SourceSpan;

use crate::errors::{ErrorKind, SourceContext, TorontoError};

struct Line<'a> {
    level: usize,
    code: &'a str,
    children: Vec<usize>,
}

/// Returns a new source with the same name whose content is the bracketed text.
pub fn bracketize(source: &SourceContext) -> Result<SourceContext, TorontoError> {
    let mut lines: Vec<Line<'_>> = Vec::new();
    let mut roots = Vec::new();
    let mut open: Vec<usize> = Vec::new();

    let mut offset = 0;
    for (number, raw) in source.content.split('\n').enumerate() {
        let start = offset;
        offset += raw.len() + 1;

        let code = raw.trim();
        if code.is_empty() || code.starts_with(';') || code.starts_with("//") {
            continue;
        }
        let level = indentation(raw).map_err(|column| {
            tab_error(source, number + 1, start + column)
        })?;

        while open.last().is_some_and(|&top| lines[top].level >= level) {
            open.pop();
        }
        let index = lines.len();
        lines.push(Line {
            level,
            code,
            children: Vec::new(),
        });
        match open.last() {
            Some(&parent) => lines[parent].children.push(index),
            None => roots.push(index),
        }
        open.push(index);
    }

    let mut out = String::with_capacity(source.content.len() + 4 * lines.len());
    for root in roots {
        emit(&lines, root, &mut out);
    }
    Ok(SourceContext::from_file(source.name.clone(), out))
}

/// Leading spaces, or the byte column of the first tab among them.
fn indentation(line: &str) -> Result<usize, usize> {
    for (column, ch) in line.char_indices() {
        match ch {
            ' ' => continue,
            '\t' => return Err(column),
            _ => return Ok(column),
        }
    }
    Ok(line.len())
}

// Closers go on their own line so a trailing comment cannot swallow them.
fn emit(lines: &[Line<'_>], index: usize, out: &mut String) {
    let line = &lines[index];
    let indent = " ".repeat(line.level);
    out.push_str(&indent);
    out.push('(');
    out.push_str(line.code);
    out.push('\n');
    for &child in &line.children {
        emit(lines, child, out);
    }
    out.push_str(&indent);
    out.push_str(")\n");
}

fn tab_error(source: &SourceContext, line: usize, at: usize) -> TorontoError {
    let mut error =
        TorontoError::unlocated(ErrorKind::TabIndentation { line }, SourceSpan::from(at..at + 1), "lex");
    error.source_info.source = Some(source.to_named_source());
    error.with_help("indent with spaces")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorCategory;
    use crate::syntax::parser::parse;

    fn read(text: &str) -> String {
        let source = bracketize(&SourceContext::anonymous(text)).unwrap();
        parse(&source.content).unwrap().pretty()
    }

    #[test]
    fn siblings_become_separate_forms() {
        assert_eq!(read("a 1\nb 2\n"), "(do (a 1) (b 2))");
    }

    #[test]
    fn deeper_lines_become_children() {
        assert_eq!(read("def x\n  + 1 2"), "(def x (+ 1 2))");
    }

    #[test]
    fn dedent_closes_every_deeper_list() {
        let text = "do\n  a\n    b\n  c\nd";
        assert_eq!(read(text), "(do (do (a (b)) (c)) (d))");
    }

    #[test]
    fn blank_and_comment_lines_are_skipped() {
        assert_eq!(read("\nf ; trailing\n\n  ; alone\n  g\n"), "(f (g))");
    }

    #[test]
    fn tab_indentation_is_a_lexical_error() {
        let err = bracketize(&SourceContext::from_file("tabs", "a\n\tb")).unwrap_err();
        assert_eq!(err.kind, ErrorKind::TabIndentation { line: 2 });
        assert_eq!(err.category(), ErrorCategory::Lexical);
        assert_eq!(err.source_info.primary_span.offset(), 2);
    }

    #[test]
    fn empty_source_stays_empty() {
        let source = bracketize(&SourceContext::anonymous("\n   \n")).unwrap();
        assert!(source.content.is_empty());
    }
}
