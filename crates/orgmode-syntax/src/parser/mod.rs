//! # Parser - Event-Based Tree Construction
//!
//! The grammar engine pulls tokens from a [`TokenSource`] on demand and emits
//! a flat list of [`Event`]s describing the tree. The [`Sink`] then replays
//! the events against the source text to build a Rowan green tree.
//!
//! ## The Event Model
//!
//! ```text
//! Start(PARAGRAPH)
//! Token(WORD)
//! Token(WHITESPACE)
//! Token(WORD)
//! Token(NEWLINE)
//! Finish
//! ```
//!
//! Zero-width structural tokens (`LIST_START`, `LIST_END`, `END_SECTION`) are
//! consumed like any other token so the grammar can branch on them, but the
//! sink leaves them out of the tree.
//!
//! ## The Marker System
//!
//! `parser.start()` hands out a [`Marker`] that must be completed with a
//! kind. Dropping it unfinished panics, which catches grammar bugs
//! before they turn into corrupt trees.
//!
//! ```ignore
//! let m = p.start();
//! p.bump();
//! m.complete(p, SyntaxKind::PARAGRAPH);
//! ```

pub mod event;
pub mod sink;

mod grammar;

use std::ops::Range;

use rowan::GreenNode;

use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::scanner::{ScanOutput, ScannedToken, TokenSource};
use crate::syntax_kind::SyntaxKind;
use event::Event;
use sink::Sink;

/// Everything a finished parse produces.
#[derive(Debug, Clone)]
pub struct Parse {
    pub green: GreenNode,
    pub tokens: Vec<ScannedToken>,
    pub diagnostics: Vec<Diagnostic>,
    pub scan: ScanOutput,
}

/// The parser state machine.
///
/// Grammar functions receive `&mut Parser` and use its methods to:
///
/// - Inspect tokens: `current()`, `nth()`, `at()`, `at_end()`
/// - Consume tokens: `bump()`, `eat()`
/// - Build structure: `start()` → `Marker` → `complete()`
///
/// Lookahead pulls from the source lazily, so the scanner never runs ahead
/// of what the grammar has asked for.
pub struct Parser<'t, S> {
    text: &'t str,
    source: S,
    tokens: Vec<ScannedToken>,
    exhausted: bool,
    pos: usize,
    events: Vec<Event>,
    diagnostics: Vec<Diagnostic>,
}

impl<'t, S: TokenSource> Parser<'t, S> {
    pub fn new(text: &'t str, source: S) -> Self {
        Self {
            text,
            source,
            tokens: Vec::new(),
            exhausted: false,
            pos: 0,
            events: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Run the grammar over the whole source.
    pub fn parse(mut self) -> Parse {
        grammar::root(&mut self);
        // The grammar consumes every token, but drain in case it stopped early
        while self.fill(self.pos) {
            self.pos += 1;
        }

        let green = Sink::new(self.text, &self.tokens, self.events).finish();
        Parse {
            green,
            tokens: self.tokens,
            diagnostics: self.diagnostics,
            scan: self.source.finish(),
        }
    }

    /// Make sure token `index` is buffered. False once the source is dry.
    fn fill(&mut self, index: usize) -> bool {
        while self.tokens.len() <= index && !self.exhausted {
            match self.source.next_token() {
                Some(token) => self.tokens.push(token),
                None => self.exhausted = true,
            }
        }
        index < self.tokens.len()
    }

    /// Start a new node and return a marker.
    pub fn start(&mut self) -> Marker {
        let pos = self.events.len();
        self.events.push(Event::Placeholder);
        Marker {
            pos,
            completed: false,
        }
    }

    /// Current token kind, or EOF if past end.
    pub fn current(&mut self) -> SyntaxKind {
        self.nth(0)
    }

    /// Look ahead n tokens.
    pub fn nth(&mut self, n: usize) -> SyntaxKind {
        if self.fill(self.pos + n) {
            self.tokens[self.pos + n].kind
        } else {
            SyntaxKind::EOF
        }
    }

    /// Check if at end of input.
    pub fn at_end(&mut self) -> bool {
        !self.fill(self.pos)
    }

    /// Check if current token is of given kind.
    pub fn at(&mut self, kind: SyntaxKind) -> bool {
        self.current() == kind
    }

    /// Consume the current token if it matches.
    pub fn eat(&mut self, kind: SyntaxKind) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    /// Consume the current token unconditionally.
    pub fn bump(&mut self) {
        if !self.at_end() {
            let kind = self.tokens[self.pos].kind;
            self.events.push(Event::token(kind));
            self.pos += 1;
        }
    }

    /// Byte range of the current token. Empty at end of input.
    pub fn current_range(&mut self) -> Range<usize> {
        if self.fill(self.pos) {
            self.tokens[self.pos].range()
        } else {
            self.text.len()..self.text.len()
        }
    }

    /// Get the text of the current token.
    pub fn current_text(&mut self) -> &'t str {
        let range = self.current_range();
        &self.text[range]
    }

    /// Record a recoverable problem.
    pub fn error(&mut self, kind: DiagnosticKind, range: Range<usize>, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic::new(kind, range, message));
    }
}

/// A marker for a node being constructed.
///
/// When you call `parser.start()`, a `Placeholder` event is pushed and you get
/// a `Marker` pointing to it. `marker.complete(parser, KIND)` converts the
/// placeholder to a `Start` event and pushes a `Finish` event.
///
/// Dropping a marker without completing it panics.
#[must_use = "Markers must be completed, dropping them is a bug"]
pub struct Marker {
    /// Position in the events vector where our Placeholder lives
    pos: usize,
    /// Tracks whether complete() was called
    completed: bool,
}

impl Marker {
    /// Complete this marker, creating a node of the given kind.
    pub fn complete<S: TokenSource>(mut self, p: &mut Parser<'_, S>, kind: SyntaxKind) {
        self.completed = true;
        let event_at_pos = &mut p.events[self.pos];
        assert!(matches!(event_at_pos, Event::Placeholder));
        *event_at_pos = Event::start(kind);
        p.events.push(Event::Finish);
    }
}

impl Drop for Marker {
    fn drop(&mut self) {
        if !self.completed && !std::thread::panicking() {
            panic!("Marker must be completed");
        }
    }
}
