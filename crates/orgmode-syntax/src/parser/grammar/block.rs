//! Keywords, greater blocks, dynamic blocks, drawers and node properties.

use std::ops::Range;

use crate::diagnostics::DiagnosticKind;
use crate::parser::Parser;
use crate::scanner::TokenSource;
use crate::syntax_kind::SyntaxKind;

use super::{at_closer, elements};

/// `#+KEY: words`
pub(super) fn keyword<S: TokenSource>(p: &mut Parser<'_, S>) {
    let m = p.start();
    p.eat(SyntaxKind::WHITESPACE);
    p.bump();
    p.eat(SyntaxKind::WHITESPACE);
    if p.at(SyntaxKind::WORD) {
        let value = p.start();
        loop {
            if p.at(SyntaxKind::WORD) {
                p.bump();
            } else if p.at(SyntaxKind::WHITESPACE) && p.nth(1) == SyntaxKind::WORD {
                p.bump();
            } else {
                break;
            }
        }
        value.complete(p, SyntaxKind::VALUE);
    }
    p.eat(SyntaxKind::WHITESPACE);
    p.eat(SyntaxKind::NEWLINE);
    m.complete(p, SyntaxKind::KEYWORD);
}

/// `#+begin_NAME params` ... `#+end_NAME`
pub(super) fn greater_block<S: TokenSource>(p: &mut Parser<'_, S>) {
    let m = p.start();
    p.eat(SyntaxKind::WHITESPACE);
    let begin = p.current_range();
    p.bump();
    let name = begin_name(p);
    params(p);

    if !at_closer(p) {
        let body = p.start();
        elements(p);
        body.complete(p, SyntaxKind::BODY);
    }

    block_end(p, SyntaxKind::BLOCK_END_MARKER, begin, name);
    m.complete(p, SyntaxKind::GREATER_BLOCK);
}

/// `#+begin: NAME params` ... `#+end:`
pub(super) fn dynamic_block<S: TokenSource>(p: &mut Parser<'_, S>) {
    let m = p.start();
    p.eat(SyntaxKind::WHITESPACE);
    let begin = p.current_range();
    p.bump();
    p.eat(SyntaxKind::WHITESPACE);
    let name = begin_name(p);
    params(p);

    let contents = p.start();
    elements(p);
    contents.complete(p, SyntaxKind::CONTENTS);

    block_end(p, SyntaxKind::DYNAMIC_END, begin, name);
    m.complete(p, SyntaxKind::DYNAMIC_BLOCK);
}

fn begin_name<'t, S: TokenSource>(p: &mut Parser<'t, S>) -> Option<&'t str> {
    if p.at(SyntaxKind::BLOCK_BEGIN_NAME) {
        let name = p.current_text();
        p.bump();
        Some(name)
    } else {
        None
    }
}

/// Optional `VALUE` holding the rest of a begin line, then its newline.
fn params<S: TokenSource>(p: &mut Parser<'_, S>) {
    p.eat(SyntaxKind::WHITESPACE);
    if p.at(SyntaxKind::TEXT) {
        let value = p.start();
        p.bump();
        value.complete(p, SyntaxKind::VALUE);
    }
    p.eat(SyntaxKind::WHITESPACE);
    p.eat(SyntaxKind::NEWLINE);
}

/// The end line of a block, if the scanner produced one here.
fn block_end<S: TokenSource>(
    p: &mut Parser<'_, S>,
    marker: SyntaxKind,
    begin: Range<usize>,
    name: Option<&str>,
) {
    let indented = p.at(SyntaxKind::WHITESPACE) && p.nth(1) == marker;
    if !indented && !p.at(marker) {
        log::debug!("block opened at {begin:?} is never closed");
        p.error(
            DiagnosticKind::UnterminatedConstruct,
            begin,
            format!("block {:?} has no end line", name.unwrap_or_default()),
        );
        return;
    }

    p.eat(SyntaxKind::WHITESPACE);
    p.bump();
    p.eat(SyntaxKind::WHITESPACE);
    if p.at(SyntaxKind::BLOCK_END_NAME) {
        let end_name = p.current_text();
        let range = p.current_range();
        if let Some(name) = name
            && !name.eq_ignore_ascii_case(end_name)
        {
            p.error(
                DiagnosticKind::StructuralMismatch,
                range,
                format!("block {name:?} closed by {end_name:?}"),
            );
        }
        p.bump();
    }
    p.eat(SyntaxKind::WHITESPACE);
    p.eat(SyntaxKind::TEXT);
    p.eat(SyntaxKind::WHITESPACE);
    p.eat(SyntaxKind::NEWLINE);
}

/// `:NAME:` ... `:END:`
pub(super) fn drawer<S: TokenSource>(p: &mut Parser<'_, S>) {
    let m = p.start();
    p.eat(SyntaxKind::WHITESPACE);
    let begin = p.current_range();
    let name = p.current_text();
    p.bump();
    p.eat(SyntaxKind::WHITESPACE);
    p.eat(SyntaxKind::NEWLINE);

    let contents = p.start();
    elements(p);
    contents.complete(p, SyntaxKind::CONTENTS);

    let indented = p.at(SyntaxKind::WHITESPACE) && p.nth(1) == SyntaxKind::DRAWER_END;
    if indented || p.at(SyntaxKind::DRAWER_END) {
        p.eat(SyntaxKind::WHITESPACE);
        p.bump();
        p.eat(SyntaxKind::WHITESPACE);
        p.eat(SyntaxKind::NEWLINE);
    } else {
        log::debug!("drawer {name} at {begin:?} is never closed");
        p.error(
            DiagnosticKind::UnterminatedConstruct,
            begin,
            format!("drawer {name} has no :END: line"),
        );
    }

    m.complete(p, SyntaxKind::DRAWER);
}

/// `:NAME: value`
pub(super) fn node_property<S: TokenSource>(p: &mut Parser<'_, S>) {
    let m = p.start();
    p.eat(SyntaxKind::WHITESPACE);
    p.bump();
    p.eat(SyntaxKind::WHITESPACE);
    if p.at(SyntaxKind::TEXT) {
        let value = p.start();
        p.bump();
        value.complete(p, SyntaxKind::VALUE);
    }
    p.eat(SyntaxKind::WHITESPACE);
    p.eat(SyntaxKind::NEWLINE);
    m.complete(p, SyntaxKind::NODE_PROPERTY);
}

#[cfg(test)]
mod tests {
    use crate::{DiagnosticKind, NodeExt, SyntaxKind, SyntaxNode, parse};
    use pretty_assertions::assert_eq;

    fn find(root: &SyntaxNode, kind: SyntaxKind) -> SyntaxNode {
        root.descendants()
            .find(|n| n.kind() == kind)
            .unwrap_or_else(|| panic!("no {kind:?} node"))
    }

    fn field_text(node: &SyntaxNode, name: &str) -> Option<String> {
        node.field(name).map(|e| e.to_string())
    }

    #[test]
    fn keyword_value() {
        let tree = parse("#+TITLE: A  Title \n");
        let keyword = find(&tree.root_node(), SyntaxKind::KEYWORD);
        assert_eq!(field_text(&keyword, "name").as_deref(), Some("#+TITLE:"));
        assert_eq!(field_text(&keyword, "value").as_deref(), Some("A  Title"));
    }

    #[test]
    fn greater_block_fields() {
        let tree = parse("#+begin_src python :results output\nprint(1)\n#+end_src\n");
        let block = find(&tree.root_node(), SyntaxKind::GREATER_BLOCK);
        assert_eq!(field_text(&block, "name").as_deref(), Some("src"));
        assert_eq!(
            field_text(&block, "params").as_deref(),
            Some("python :results output")
        );
        assert_eq!(field_text(&block, "body").as_deref(), Some("print(1)\n"));
        assert_eq!(field_text(&block, "end_name").as_deref(), Some("src"));
        assert!(!block.is_missing());
        assert!(tree.diagnostics().is_empty());
    }

    #[test]
    fn mismatched_end_name_is_tolerated() {
        let tree = parse("#+begin_quote\nx\n#+end_example\n");
        let block = find(&tree.root_node(), SyntaxKind::GREATER_BLOCK);
        assert_eq!(field_text(&block, "end_name").as_deref(), Some("example"));
        let kinds: Vec<_> = tree.diagnostics().iter().map(|d| d.kind).collect();
        assert_eq!(kinds, vec![DiagnosticKind::StructuralMismatch]);
    }

    #[test]
    fn end_name_comparison_ignores_case() {
        let tree = parse("#+BEGIN_QUOTE\nx\n#+end_quote\n");
        assert!(tree.diagnostics().is_empty());
    }

    #[test]
    fn nested_blocks() {
        let tree = parse("#+begin_a\n#+begin_b\nx\n#+end_b\n#+end_a\n");
        let outer = find(&tree.root_node(), SyntaxKind::GREATER_BLOCK);
        let body = outer.field("body").and_then(|b| b.into_node()).expect("body");
        let inner = body.first_child().expect("inner block");
        assert_eq!(inner.kind(), SyntaxKind::GREATER_BLOCK);
        assert_eq!(field_text(&inner, "name").as_deref(), Some("b"));
        assert_eq!(field_text(&outer, "end_name").as_deref(), Some("a"));
    }

    #[test]
    fn empty_block_has_no_body() {
        let tree = parse("#+begin_x\n#+end_x\n");
        let block = find(&tree.root_node(), SyntaxKind::GREATER_BLOCK);
        assert!(block.field("body").is_none());
    }

    #[test]
    fn dynamic_block_always_has_contents() {
        let tree = parse("#+begin: clocktable :maxlevel 2\n#+end:\n");
        let block = find(&tree.root_node(), SyntaxKind::DYNAMIC_BLOCK);
        assert_eq!(field_text(&block, "name").as_deref(), Some("clocktable"));
        assert_eq!(field_text(&block, "params").as_deref(), Some(":maxlevel 2"));
        assert_eq!(field_text(&block, "contents").as_deref(), Some(""));
        assert!(!block.is_missing());
    }

    #[test]
    fn property_drawer() {
        let tree = parse(":PROPERTIES:\n:ID: 42\n:EMPTY:\n:END:\n");
        let drawer = find(&tree.root_node(), SyntaxKind::DRAWER);
        assert_eq!(field_text(&drawer, "name").as_deref(), Some(":PROPERTIES:"));
        let contents = drawer
            .field("contents")
            .and_then(|c| c.into_node())
            .expect("contents");
        let properties: Vec<_> = contents.children().collect();
        assert_eq!(properties.len(), 2);
        assert_eq!(field_text(&properties[0], "name").as_deref(), Some(":ID:"));
        assert_eq!(field_text(&properties[0], "value").as_deref(), Some("42"));
        assert_eq!(field_text(&properties[1], "value"), None);
        assert!(!drawer.is_missing());
    }

    #[test]
    fn key_value_line_in_plain_drawer_is_a_property() {
        let tree = parse(":LOGBOOK:\nCLOCK: here\n:NOTE: text\n:END:\n");
        let drawer = find(&tree.root_node(), SyntaxKind::DRAWER);
        let contents = drawer.field("contents").and_then(|c| c.into_node()).expect("contents");
        let kinds: Vec<_> = contents.children().map(|n| n.kind()).collect();
        assert_eq!(kinds, vec![SyntaxKind::PARAGRAPH, SyntaxKind::NODE_PROPERTY]);
    }

    #[test]
    fn unterminated_drawer() {
        let tree = parse(":NOTES:\ntext\n");
        let drawer = find(&tree.root_node(), SyntaxKind::DRAWER);
        assert!(drawer.is_missing());
        assert_eq!(
            tree.diagnostics()[0].kind,
            DiagnosticKind::UnterminatedConstruct
        );
    }
}
