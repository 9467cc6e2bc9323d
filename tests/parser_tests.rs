// tests/parser_tests.rs

use toronto::errors::{ErrorCategory, ErrorKind, SourceContext};
use toronto::syntax::parser::{parse, parse_forms, parse_with, wrap_in_sequence};
use toronto::syntax::reader::Reader;
use toronto::syntax::recognizers::{Boundary, Chain, Prefixed, Recognizer, Token};
use toronto::syntax::Tree;
use toronto::TorontoError;

fn forms(text: &str) -> Vec<Tree> {
    parse_forms(&Chain::standard(), &SourceContext::anonymous(text)).unwrap()
}

// ---
// Surface syntax
// ---

#[test]
fn test_parse_simple_s_expression() {
    let tree = parse("(+ 1 2)").unwrap();
    assert_eq!(
        tree,
        Tree::list([Tree::atom("+"), Tree::atom("1"), Tree::atom("2")])
    );
}

#[test]
fn test_parse_brackets_desugar() {
    assert_eq!(parse("[1 2 3]").unwrap().pretty(), "(vector 1 2 3)");
    assert_eq!(parse("{a: 1}").unwrap().pretty(), "(record a: 1)");
    assert_eq!(parse("[]").unwrap(), Tree::list([Tree::atom("vector")]));
    assert_eq!(parse("()").unwrap(), Tree::List(vec![]));
}

#[test]
fn test_parse_prefixes() {
    assert_eq!(parse("%x").unwrap().pretty(), "(preserve x)");
    assert_eq!(parse("$(f)").unwrap().pretty(), "(eval (f))");
    assert_eq!(parse("...xs").unwrap().pretty(), "(spread xs)");
    assert_eq!(parse("%<x>").unwrap().pretty(), "(preserve (escape x))");
}

#[test]
fn test_parse_adjacent_close_delimiters() {
    assert_eq!(parse("(a (b c))").unwrap().pretty(), "(a (b c))");
    assert_eq!(parse("[a [b]]").unwrap().pretty(), "(vector a (vector b))");
    assert_eq!(parse("%(x <y>)").unwrap().pretty(), "(preserve (x (escape y)))");
}

#[test]
fn test_parse_with_comments() {
    let source = "; this is a comment\n (+ 1 2) // another comment";
    assert_eq!(forms(source), vec![parse("(+ 1 2)").unwrap()]);
}

#[test]
fn test_parse_multiple_forms_wrap_in_do() {
    let tree = parse("a b c").unwrap();
    assert_eq!(tree.pretty(), "(do a b c)");
    assert_eq!(wrap_in_sequence(vec![]), Tree::Empty);
}

#[test]
fn test_parse_whitespace_variants() {
    assert_eq!(parse("(\ta\n  b\r\n)").unwrap().pretty(), "(a b)");
}

// ---
// Errors
// ---

#[test]
fn test_unterminated_string_yields_no_tree() {
    let err = parse("(foo \"unterminated").unwrap_err();
    assert_eq!(err.kind, ErrorKind::UnterminatedLiteral { delimiter: '"' });
    assert_eq!(err.category(), ErrorCategory::Lexical);
}

#[test]
fn test_unterminated_list_points_at_open_delimiter() {
    let err = parse("  (foo").unwrap_err();
    assert_eq!(err.source_info.primary_span.offset(), 2);
    assert_eq!(err.diagnostic_info.error_code, "toronto::lex::unterminated_list");
}

#[test]
fn test_malformed_input_does_not_disturb_later_forms() {
    // The escape opener backs out of `<` and `<=`; the list around it still closes.
    assert_eq!(
        parse("(<= (< a b) c)").unwrap().pretty(),
        "(<= (< a b) c)"
    );
}

// ---
// Custom chains
// ---

#[test]
fn test_custom_recognizer_applies_inside_brackets() {
    let mut chain = Chain::standard();
    let bare = chain.position("bare").unwrap();
    chain.insert(bare, Prefixed::new("hash", "#", "hash"));

    let tree = parse_with(&chain, &SourceContext::anonymous("(f #x [#y])")).unwrap();
    assert_eq!(tree.pretty(), "(f (hash x) (vector (hash y)))");
}

#[test]
fn test_removing_comment_recognizer() {
    let mut chain = Chain::standard();
    chain.remove("comment");
    let tree = parse_with(&chain, &SourceContext::anonymous("; a")).unwrap();
    assert_eq!(tree.pretty(), "(do ; a)");
}

/// Consumes as much as it can, then declines.
struct Greedy;

impl Recognizer for Greedy {
    fn name(&self) -> &str {
        "greedy"
    }

    fn recognize(
        &self,
        reader: &mut Reader,
        _chain: &Chain,
        _boundary: Option<Boundary<'_>>,
    ) -> Result<Option<Token>, TorontoError> {
        while reader.next_char().is_some() {}
        Ok(None)
    }
}

#[test]
fn test_declining_recognizers_never_move_the_cursor() {
    let mut greedy = Chain::standard();
    greedy.insert(0, Greedy);
    greedy.insert(5, Greedy);

    for source in [
        "(a (b [c {d: e}]) <f g> %h $i ...j)",
        "(< a b) (<= a b) <x>",
        "((((a))))",
        "'text' \"more\" `tick`",
        "(a b",
        "[a (b]",
        "(foo \"unterminated",
    ] {
        let expected = parse_forms(&Chain::standard(), &SourceContext::anonymous(source));
        let actual = parse_forms(&greedy, &SourceContext::anonymous(source));
        match (expected, actual) {
            (Ok(expected), Ok(actual)) => assert_eq!(expected, actual, "source: {source}"),
            (Err(expected), Err(actual)) => assert_eq!(expected.kind, actual.kind, "source: {source}"),
            (expected, actual) => panic!("{source}: {expected:?} vs {actual:?}"),
        }
    }
}
