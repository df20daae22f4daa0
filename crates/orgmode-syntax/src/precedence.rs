//! Tie-breaking between competing interpretations of the same input.
//!
//! Wherever the scanner finds more than one viable reading of a line or
//! delimiter, it lists the candidates as [`Production`]s and lets [`resolve`]
//! pick the winner.
//!
//! | Production        | Precedence | Decided in                               |
//! |-------------------|-----------:|------------------------------------------|
//! | `Element`         | 1          | block begin, drawer lines                |
//! | `Incomplete`      | 0          | block begin without a name               |
//! | `NodeProperty`    | 1          | drawer lines                             |
//! | `Paragraph`       | 0          | drawer lines, bullets outside a list     |
//! | `ListItem`        | 1          | bullet lines                             |
//! | `Continuation`    | 0          | bullets inside a list                    |
//! | `Markup`          | 0          | markup start pairing                     |
//! | `InterruptedStart`| -1         | markup start pairing                     |
//!
//! Associativity is a property of how the grammar consumes tokens rather
//! than a choice between candidates. Heading titles and paragraphs take
//! objects left to right up to the end of their line (`object::objects`), so
//! titles group leftmost first and a paragraph extends as far right as the
//! line allows before the next element begins.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Production {
    /// A complete element (block, drawer, ...).
    Element,
    /// A construct that opens but cannot be completed, kept as an error.
    Incomplete,
    /// `:KEY: value` inside a drawer.
    NodeProperty,
    /// A line of objects.
    Paragraph,
    /// A bulleted line starting a list item.
    ListItem,
    /// A line continuing the content before it.
    Continuation,
    /// A paired markup span.
    Markup,
    /// An unpaired markup start kept as text.
    InterruptedStart,
}

impl Production {
    pub fn precedence(self) -> i8 {
        match self {
            Production::Element | Production::NodeProperty | Production::ListItem => 1,
            Production::InterruptedStart => -1,
            Production::Incomplete
            | Production::Paragraph
            | Production::Continuation
            | Production::Markup => 0,
        }
    }
}

/// Pick the winning production among viable candidates.
///
/// Higher precedence wins. Ties keep the earliest candidate, which is the
/// reading that starts first in the input.
pub fn resolve(candidates: &[Production]) -> Option<Production> {
    let mut best: Option<Production> = None;
    for &candidate in candidates {
        match best {
            Some(current) if current.precedence() >= candidate.precedence() => {}
            _ => best = Some(candidate),
        }
    }
    best
}
