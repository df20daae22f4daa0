//! Sections and headings.

use crate::parser::Parser;
use crate::scanner::TokenSource;
use crate::syntax_kind::SyntaxKind;

use super::{at_blank_line, at_closer, elements, object, recover};

/// A heading, its body, and its subsections up to the matching `END_SECTION`.
pub(super) fn section<S: TokenSource>(p: &mut Parser<'_, S>) {
    let m = p.start();
    heading(p);

    if !at_closer(p) {
        let body = p.start();
        elements(p);
        body.complete(p, SyntaxKind::BODY);
    }

    loop {
        match p.current() {
            SyntaxKind::STARS => section(p),
            SyntaxKind::END_SECTION => {
                p.bump();
                break;
            }
            SyntaxKind::EOF => break,
            _ => recover(p),
        }
    }

    m.complete(p, SyntaxKind::SECTION);
}

/// `STARS [KEYWORD] [PRIORITY] [COMMENT] [TITLE]` and the blank lines after it.
fn heading<S: TokenSource>(p: &mut Parser<'_, S>) {
    let m = p.start();
    p.bump();
    p.eat(SyntaxKind::WHITESPACE);

    for prefix in [
        SyntaxKind::TODO_KEYWORD,
        SyntaxKind::PRIORITY,
        SyntaxKind::COMMENT_FLAG,
    ] {
        if p.eat(prefix) {
            p.eat(SyntaxKind::WHITESPACE);
        }
    }

    if object::is_object_start(p.current()) {
        let title = p.start();
        object::objects(p);
        title.complete(p, SyntaxKind::TITLE);
    }

    p.eat(SyntaxKind::WHITESPACE);
    p.eat(SyntaxKind::NEWLINE);
    while at_blank_line(p) {
        p.eat(SyntaxKind::WHITESPACE);
        p.eat(SyntaxKind::NEWLINE);
    }

    m.complete(p, SyntaxKind::HEADING);
}
