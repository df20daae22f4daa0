//! # Grammar Rules
//!
//! Each function takes a `&mut Parser` and uses its methods to:
//!
//! 1. Inspect the current token (`p.current()`, `p.at()`, `p.nth()`)
//! 2. Consume tokens (`p.bump()`, `p.eat()`)
//! 3. Build tree structure (`p.start()` → marker → `complete()`)
//!
//! ## Module Structure
//!
//! - [`section`] - Sections and headings
//! - [`block`] - Keywords, greater and dynamic blocks, drawers, properties
//! - [`list`] - Lists and list items
//! - [`object`] - Paragraphs, words, markup and links
//!
//! ## Closers
//!
//! The scanner has already decided where every structure ends and says so
//! with dedicated tokens (`END_SECTION`, `LIST_END`, `BLOCK_END_MARKER`,
//! `DRAWER_END`, ...). A sequence of elements simply runs until one of those
//! shows up; whoever owns it consumes it. A construct whose closer never
//! arrives is finished anyway and reported as unterminated.
//!
//! ## Error Recovery
//!
//! A token that cannot start an element where it appears is wrapped in an
//! `ERROR` node on its own. The parse always moves forward by at least one
//! token, and always covers the whole input.

mod block;
mod list;
mod object;
mod section;

use crate::diagnostics::DiagnosticKind;
use crate::parser::Parser;
use crate::scanner::TokenSource;
use crate::syntax_kind::SyntaxKind;

pub(crate) use object::paragraph;

/// Parse the root document: an optional zeroth section and then sections.
pub fn root<S: TokenSource>(p: &mut Parser<'_, S>) {
    let m = p.start();

    if !at_closer(p) {
        let body = p.start();
        elements(p);
        body.complete(p, SyntaxKind::BODY);
    }

    while !p.at_end() {
        if p.at(SyntaxKind::STARS) {
            section::section(p);
        } else {
            recover(p);
        }
    }

    m.complete(p, SyntaxKind::ROOT);
}

/// Tokens that end the current run of elements.
fn at_closer<S: TokenSource>(p: &mut Parser<'_, S>) -> bool {
    match p.current() {
        SyntaxKind::EOF
        | SyntaxKind::STARS
        | SyntaxKind::END_SECTION
        | SyntaxKind::LIST_END => true,
        kind if is_line_closer(kind) => true,
        SyntaxKind::WHITESPACE => is_line_closer(p.nth(1)),
        _ => false,
    }
}

/// Closers that may be indented.
fn is_line_closer(kind: SyntaxKind) -> bool {
    matches!(
        kind,
        SyntaxKind::BLOCK_END_MARKER
            | SyntaxKind::DYNAMIC_END
            | SyntaxKind::DRAWER_END
            | SyntaxKind::BULLET
    )
}

/// Whitespace-only line (possibly the unterminated last one).
fn at_blank_line<S: TokenSource>(p: &mut Parser<'_, S>) -> bool {
    match p.current() {
        SyntaxKind::NEWLINE => true,
        SyntaxKind::WHITESPACE => matches!(
            p.nth(1),
            SyntaxKind::NEWLINE | SyntaxKind::EOF | SyntaxKind::END_SECTION | SyntaxKind::LIST_END
        ),
        _ => false,
    }
}

/// Elements until a closer.
fn elements<S: TokenSource>(p: &mut Parser<'_, S>) {
    while !at_closer(p) {
        element(p);
    }
}

/// Parse one element, dispatching on its first significant token.
fn element<S: TokenSource>(p: &mut Parser<'_, S>) {
    if at_blank_line(p) {
        blank_line(p);
        return;
    }

    let lead = if p.at(SyntaxKind::WHITESPACE) { 1 } else { 0 };
    match p.nth(lead) {
        SyntaxKind::KEYWORD_KEY => block::keyword(p),
        SyntaxKind::BLOCK_BEGIN_MARKER => block::greater_block(p),
        SyntaxKind::DYNAMIC_BEGIN => block::dynamic_block(p),
        SyntaxKind::DRAWER_NAME => block::drawer(p),
        SyntaxKind::PROPERTY_NAME => block::node_property(p),
        SyntaxKind::LIST_START if lead == 0 => list::list(p),
        SyntaxKind::COMMENT => comment_line(p),
        SyntaxKind::ERROR_SENTINEL => error_line(p),
        kind if object::is_object_start(kind) => {
            paragraph(p);
        }
        _ => recover(p),
    }
}

fn blank_line<S: TokenSource>(p: &mut Parser<'_, S>) {
    let m = p.start();
    p.eat(SyntaxKind::WHITESPACE);
    p.eat(SyntaxKind::NEWLINE);
    m.complete(p, SyntaxKind::BLANK_LINE);
}

fn comment_line<S: TokenSource>(p: &mut Parser<'_, S>) {
    let m = p.start();
    p.eat(SyntaxKind::WHITESPACE);
    p.bump();
    p.eat(SyntaxKind::NEWLINE);
    m.complete(p, SyntaxKind::COMMENT_LINE);
}

/// A line the scanner could not classify. The scanner already reported it.
fn error_line<S: TokenSource>(p: &mut Parser<'_, S>) {
    let m = p.start();
    p.eat(SyntaxKind::WHITESPACE);
    p.bump();
    object::objects(p);
    p.eat(SyntaxKind::WHITESPACE);
    p.eat(SyntaxKind::NEWLINE);
    m.complete(p, SyntaxKind::ERROR);
}

/// Wrap the current token in an ERROR node.
fn recover<S: TokenSource>(p: &mut Parser<'_, S>) {
    let kind = p.current();
    let range = p.current_range();
    log::debug!("unexpected {kind:?} at {range:?}");
    p.error(
        DiagnosticKind::LexError,
        range,
        format!("unexpected {kind:?}"),
    );
    let m = p.start();
    p.bump();
    m.complete(p, SyntaxKind::ERROR);
}

#[cfg(test)]
mod tests {
    use crate::{SyntaxKind, parse};

    #[test]
    fn zeroth_section_before_first_heading() {
        let tree = parse("preamble\n* H\n");
        let root = tree.root_node();
        let kinds: Vec<_> = root.children().map(|n| n.kind()).collect();
        assert_eq!(kinds, vec![SyntaxKind::BODY, SyntaxKind::SECTION]);
    }

    #[test]
    fn blank_and_comment_lines() {
        let tree = parse("\n  \n# note\n");
        let body = tree.root_node().first_child().expect("body");
        let kinds: Vec<_> = body.children().map(|n| n.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                SyntaxKind::BLANK_LINE,
                SyntaxKind::BLANK_LINE,
                SyntaxKind::COMMENT_LINE
            ]
        );
    }

    #[test]
    fn error_sentinel_line_becomes_error_node() {
        let tree = parse("#+begin_\n");
        let body = tree.root_node().first_child().expect("body");
        let error = body.first_child().expect("error node");
        assert_eq!(error.kind(), SyntaxKind::ERROR);
        assert_eq!(error.text().to_string(), "#+begin_\n");
        assert_eq!(tree.diagnostics().len(), 1);
    }

    #[test]
    fn trailing_whitespace_at_end_of_input() {
        let tree = parse("text\n   ");
        let body = tree.root_node().first_child().expect("body");
        let last = body.last_child().expect("blank line");
        assert_eq!(last.kind(), SyntaxKind::BLANK_LINE);
        assert_eq!(tree.root_node().text().to_string(), "text\n   ");
    }
}
