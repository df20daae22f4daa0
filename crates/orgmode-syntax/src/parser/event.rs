//! # Parser Events
//!
//! Events are the intermediate representation between parsing and tree
//! building. The grammar emits a **flat sequence** of them and the
//! [`Sink`](super::sink::Sink) turns that sequence into a Rowan tree.
//!
//! ```text
//! Start(KEYWORD)     ← Begin a KEYWORD node
//!   Token(KEYWORD_KEY)
//!   Token(WHITESPACE)
//!   Start(VALUE)
//!     Token(WORD)
//!   Finish
//!   Token(NEWLINE)
//! Finish             ← End the KEYWORD node
//! ```

use crate::syntax_kind::SyntaxKind;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Begin a new composite node.
    Start { kind: SyntaxKind },

    /// Attach the next scanner token to the current node.
    Token { kind: SyntaxKind },

    /// Finish the current node.
    Finish,

    /// Reserved slot for a node that may never be created.
    Placeholder,
}

impl Event {
    pub fn start(kind: SyntaxKind) -> Self {
        Event::Start { kind }
    }

    pub fn token(kind: SyntaxKind) -> Self {
        Event::Token { kind }
    }
}
