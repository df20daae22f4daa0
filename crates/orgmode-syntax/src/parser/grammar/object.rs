//! Paragraphs and objects: words, markup spans, links and interrupted starts.

use crate::parser::Parser;
use crate::scanner::TokenSource;
use crate::syntax_kind::SyntaxKind;

pub(super) fn is_object_start(kind: SyntaxKind) -> bool {
    matches!(
        kind,
        SyntaxKind::WORD
            | SyntaxKind::MARKUP_START
            | SyntaxKind::INTERRUPTED_DELIMITER
            | SyntaxKind::LINK_START
    )
}

/// One line of objects and its newline.
pub(crate) fn paragraph<S: TokenSource>(p: &mut Parser<'_, S>) {
    let m = p.start();
    p.eat(SyntaxKind::WHITESPACE);
    objects(p);
    p.eat(SyntaxKind::WHITESPACE);
    p.eat(SyntaxKind::NEWLINE);
    m.complete(p, SyntaxKind::PARAGRAPH);
}

/// Objects left to right. Whitespace is taken only between two objects, so
/// trailing whitespace stays with the enclosing construct.
pub(super) fn objects<S: TokenSource>(p: &mut Parser<'_, S>) {
    loop {
        match p.current() {
            SyntaxKind::WORD => p.bump(),
            SyntaxKind::MARKUP_START => markup(p),
            SyntaxKind::INTERRUPTED_DELIMITER => interrupted(p),
            SyntaxKind::LINK_START => link(p),
            SyntaxKind::WHITESPACE if is_object_start(p.nth(1)) => p.bump(),
            _ => break,
        }
    }
}

fn markup<S: TokenSource>(p: &mut Parser<'_, S>) {
    let kind = match p.current_text() {
        "*" => SyntaxKind::BOLD,
        "/" => SyntaxKind::ITALIC,
        "_" => SyntaxKind::UNDERLINE,
        "=" => SyntaxKind::VERBATIM,
        "~" => SyntaxKind::CODE,
        _ => SyntaxKind::STRIKETHROUGH,
    };
    let m = p.start();
    p.bump();
    objects(p);
    p.eat(SyntaxKind::MARKUP_END);
    m.complete(p, kind);
}

/// An unpaired delimiter followed by whatever objects remain in its context.
fn interrupted<S: TokenSource>(p: &mut Parser<'_, S>) {
    let m = p.start();
    p.bump();
    objects(p);
    m.complete(p, SyntaxKind::INTERRUPTED_START);
}

fn link<S: TokenSource>(p: &mut Parser<'_, S>) {
    let m = p.start();
    p.bump();
    p.eat(SyntaxKind::LINK_PATH);
    if p.eat(SyntaxKind::LINK_SEPARATOR) {
        let description = p.start();
        p.eat(SyntaxKind::WHITESPACE);
        objects(p);
        p.eat(SyntaxKind::WHITESPACE);
        description.complete(p, SyntaxKind::DESCRIPTION);
    }
    p.eat(SyntaxKind::LINK_END);
    m.complete(p, SyntaxKind::REGULAR_LINK);
}

#[cfg(test)]
mod tests {
    use crate::{NodeExt, SyntaxKind, SyntaxNode, parse};
    use pretty_assertions::assert_eq;

    fn paragraph(input: &str) -> SyntaxNode {
        parse(input)
            .root_node()
            .descendants()
            .find(|n| n.kind() == SyntaxKind::PARAGRAPH)
            .expect("paragraph")
    }

    fn child_kinds(node: &SyntaxNode) -> Vec<SyntaxKind> {
        node.children_with_tokens().map(|e| e.kind()).collect()
    }

    #[test]
    fn words_and_whitespace() {
        assert_eq!(
            child_kinds(&paragraph("two words\n")),
            vec![
                SyntaxKind::WORD,
                SyntaxKind::WHITESPACE,
                SyntaxKind::WORD,
                SyntaxKind::NEWLINE
            ]
        );
    }

    #[test]
    fn each_markup_kind() {
        let p = paragraph("*b* /i/ _u_ =v= ~c~ +s+\n");
        let kinds: Vec<_> = p.children().map(|n| n.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                SyntaxKind::BOLD,
                SyntaxKind::ITALIC,
                SyntaxKind::UNDERLINE,
                SyntaxKind::VERBATIM,
                SyntaxKind::CODE,
                SyntaxKind::STRIKETHROUGH
            ]
        );
    }

    #[test]
    fn nested_markup() {
        let p = paragraph("*bold /and italic/*\n");
        let bold = p.first_child().expect("bold");
        assert_eq!(bold.kind(), SyntaxKind::BOLD);
        let italic = bold.first_child().expect("italic");
        assert_eq!(italic.kind(), SyntaxKind::ITALIC);
        assert_eq!(italic.text().to_string(), "/and italic/");
    }

    #[test]
    fn interrupted_start_swallows_the_rest_of_the_line() {
        let p = paragraph("a *b c\n");
        let interrupted = p.first_child().expect("interrupted start");
        assert_eq!(interrupted.kind(), SyntaxKind::INTERRUPTED_START);
        assert_eq!(interrupted.text().to_string(), "*b c");
    }

    #[test]
    fn link_fields() {
        let p = paragraph("[[file:notes.org][my /notes/]]\n");
        let link = p.first_child().expect("link");
        assert_eq!(link.kind(), SyntaxKind::REGULAR_LINK);
        assert_eq!(
            link.field("pathreg").map(|e| e.to_string()),
            Some("file:notes.org".to_string())
        );
        let description = link
            .field("description")
            .and_then(|e| e.into_node())
            .expect("description");
        assert_eq!(description.text().to_string(), "my /notes/");
        assert!(
            description
                .children()
                .any(|n| n.kind() == SyntaxKind::ITALIC)
        );
    }

    #[test]
    fn link_without_description() {
        let p = paragraph("[[https://orgmode.org]]\n");
        let link = p.first_child().expect("link");
        assert!(link.field("description").is_none());
    }

    #[test]
    fn indented_paragraph_keeps_leading_whitespace() {
        let p = paragraph("   x  \n");
        assert_eq!(
            child_kinds(&p),
            vec![
                SyntaxKind::WHITESPACE,
                SyntaxKind::WORD,
                SyntaxKind::WHITESPACE,
                SyntaxKind::NEWLINE
            ]
        );
    }
}
