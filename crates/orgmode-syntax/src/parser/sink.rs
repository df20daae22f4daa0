//! Sink for converting parser events into a Rowan green tree.

use rowan::{GreenNode, GreenNodeBuilder};

use crate::parser::event::Event;
use crate::scanner::ScannedToken;
use crate::syntax_kind::SyntaxKind;

/// Replays parser events against the source text.
pub struct Sink<'t> {
    builder: GreenNodeBuilder<'static>,
    text: &'t str,
    tokens: &'t [ScannedToken],
    cursor: usize,
    events: Vec<Event>,
}

impl<'t> Sink<'t> {
    pub fn new(text: &'t str, tokens: &'t [ScannedToken], events: Vec<Event>) -> Self {
        Self {
            builder: GreenNodeBuilder::new(),
            text,
            tokens,
            cursor: 0,
            events,
        }
    }

    /// Consume the sink and build the green tree.
    pub fn finish(mut self) -> GreenNode {
        for event in std::mem::take(&mut self.events) {
            match event {
                Event::Start { kind } => self.builder.start_node(kind.into()),
                Event::Token { kind } => self.token(kind),
                Event::Finish => self.builder.finish_node(),
                Event::Placeholder => {}
            }
        }

        self.builder.finish()
    }

    fn token(&mut self, kind: SyntaxKind) {
        let Some(token) = self.tokens.get(self.cursor) else {
            return;
        };
        self.cursor += 1;
        // Zero-width markers steer the grammar but are not leaves
        if !kind.is_structural_marker() {
            self.builder.token(kind.into(), &self.text[token.range()]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax_kind::SyntaxNode;

    #[test]
    fn sink_builds_simple_tree() {
        let text = "hello";
        let tokens = vec![ScannedToken::new(SyntaxKind::WORD, 0..5)];
        let events = vec![
            Event::start(SyntaxKind::ROOT),
            Event::start(SyntaxKind::PARAGRAPH),
            Event::token(SyntaxKind::WORD),
            Event::Finish,
            Event::Finish,
        ];

        let tree = SyntaxNode::new_root(Sink::new(text, &tokens, events).finish());

        assert_eq!(tree.kind(), SyntaxKind::ROOT);
        assert_eq!(tree.children().count(), 1);
        assert_eq!(tree.text().to_string(), text);
    }

    #[test]
    fn sink_skips_structural_markers() {
        let text = "-";
        let tokens = vec![
            ScannedToken::new(SyntaxKind::LIST_START, 0..0),
            ScannedToken::new(SyntaxKind::BULLET, 0..1),
            ScannedToken::new(SyntaxKind::LIST_END, 1..1),
        ];
        let events = vec![
            Event::start(SyntaxKind::ROOT),
            Event::token(SyntaxKind::LIST_START),
            Event::token(SyntaxKind::BULLET),
            Event::token(SyntaxKind::LIST_END),
            Event::Finish,
        ];

        let tree = SyntaxNode::new_root(Sink::new(text, &tokens, events).finish());
        let kinds: Vec<_> = tree.children_with_tokens().map(|e| e.kind()).collect();
        assert_eq!(kinds, vec![SyntaxKind::BULLET]);
    }
}
