//! Lists and list items.
//!
//! The scanner brackets every list with zero-width `LIST_START`/`LIST_END`
//! tokens, so nesting here follows those markers and never looks at
//! indentation.

use crate::parser::Parser;
use crate::scanner::TokenSource;
use crate::syntax_kind::SyntaxKind;

use super::{at_closer, elements, object};

pub(super) fn list<S: TokenSource>(p: &mut Parser<'_, S>) {
    let m = p.start();
    p.bump();
    while at_bullet(p) {
        list_item(p);
    }
    p.eat(SyntaxKind::LIST_END);
    m.complete(p, SyntaxKind::LIST);
}

fn at_bullet<S: TokenSource>(p: &mut Parser<'_, S>) -> bool {
    p.at(SyntaxKind::BULLET) || (p.at(SyntaxKind::WHITESPACE) && p.nth(1) == SyntaxKind::BULLET)
}

/// `BULLET [CHECKBOX] objects` followed by everything indented under it.
fn list_item<S: TokenSource>(p: &mut Parser<'_, S>) {
    let m = p.start();
    p.eat(SyntaxKind::WHITESPACE);
    p.bump();
    p.eat(SyntaxKind::WHITESPACE);
    if p.eat(SyntaxKind::CHECKBOX) {
        p.eat(SyntaxKind::WHITESPACE);
    }

    let content = p.start();
    if object::is_object_start(p.current()) {
        object::paragraph(p);
    } else {
        p.eat(SyntaxKind::NEWLINE);
    }
    if !at_closer(p) {
        elements(p);
    }
    content.complete(p, SyntaxKind::CONTENT);

    m.complete(p, SyntaxKind::LIST_ITEM);
}
