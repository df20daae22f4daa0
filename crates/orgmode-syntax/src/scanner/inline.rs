//! Object-level scanning: words, markup delimiters and links on one line.
//!
//! A line segment is first split into pieces (whitespace, plain text,
//! delimiter characters, complete links). Delimiters are then paired with a
//! small stack before anything is emitted, so every `MARKUP_START` handed to
//! the grammar is guaranteed a `MARKUP_END` on the same line. Starts that
//! never find a partner come out as `INTERRUPTED_DELIMITER`.

use std::collections::VecDeque;
use std::ops::Range;

use crate::lexer::{Lexeme, Spanned, lex_at};
use crate::precedence::{Production, resolve};
use crate::syntax_kind::SyntaxKind;

use super::ScannedToken;
use super::frame::{Frame, MarkupKind, ScannerState};

/// Characters allowed right before an opening delimiter.
const PRE: &[char] = &['-', '(', '{', '\'', '"'];
/// Characters allowed right after a closing delimiter.
const POST: &[char] = &['-', '.', ',', ';', ':', '!', '?', '\'', ')', '}', '[', '"', '\\'];
const DELIMITERS: &[char] = &['*', '/', '_', '=', '~', '+'];

#[derive(Debug, Clone, PartialEq, Eq)]
enum Piece {
    Space(Range<usize>),
    Plain(Range<usize>),
    Delim(char, usize),
    Link(Link),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Link {
    open: Range<usize>,
    path: Range<usize>,
    separator: Option<Range<usize>>,
    description: Option<Range<usize>>,
    close: Range<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Plain,
    Start(MarkupKind),
    End,
    Interrupted,
}

/// Scan `range` of `text` as a sequence of objects.
pub(super) fn scan_objects(
    text: &str,
    range: Range<usize>,
    state: &mut ScannerState,
    max_depth: usize,
    out: &mut VecDeque<ScannedToken>,
) {
    Segment {
        text,
        range,
        links: true,
    }
    .scan(state, max_depth, out);
}

/// Scan `range` as whitespace-separated words with no markup.
pub(super) fn scan_words(text: &str, range: Range<usize>, out: &mut VecDeque<ScannedToken>) {
    let mut word: Option<Range<usize>> = None;
    for lexeme in lex_at(&text[range.clone()], range.start) {
        if lexeme.kind == Lexeme::Whitespace {
            flush(&mut word, out);
            out.push_back(ScannedToken::new(SyntaxKind::WHITESPACE, lexeme.span));
        } else {
            extend(&mut word, lexeme.span);
        }
    }
    flush(&mut word, out);
}

struct Segment<'a> {
    text: &'a str,
    range: Range<usize>,
    links: bool,
}

impl Segment<'_> {
    fn scan(&self, state: &mut ScannerState, max_depth: usize, out: &mut VecDeque<ScannedToken>) {
        let pieces = self.pieces();
        let roles = self.pair(&pieces, state.depth(), max_depth);
        let mut word: Option<Range<usize>> = None;

        for (piece, role) in pieces.into_iter().zip(roles) {
            match (piece, role) {
                (Piece::Space(span), _) => {
                    flush(&mut word, out);
                    out.push_back(ScannedToken::new(SyntaxKind::WHITESPACE, span));
                }
                (Piece::Plain(span), _) => extend(&mut word, span),
                (Piece::Delim(_, pos), Role::Plain) => extend(&mut word, pos..pos + 1),
                (Piece::Delim(_, pos), Role::Start(kind)) => {
                    flush(&mut word, out);
                    log::trace!("markup {kind:?} opens at {pos}");
                    state.push(Frame::Markup(kind));
                    out.push_back(ScannedToken::new(SyntaxKind::MARKUP_START, pos..pos + 1));
                }
                (Piece::Delim(_, pos), Role::End) => {
                    flush(&mut word, out);
                    if matches!(state.top(), Some(Frame::Markup(_))) {
                        state.pop();
                    }
                    out.push_back(ScannedToken::new(SyntaxKind::MARKUP_END, pos..pos + 1));
                }
                (Piece::Delim(c, pos), Role::Interrupted) => {
                    flush(&mut word, out);
                    log::trace!("markup start {c:?} at {pos} is never closed");
                    out.push_back(ScannedToken::new(
                        SyntaxKind::INTERRUPTED_DELIMITER,
                        pos..pos + 1,
                    ));
                }
                (Piece::Link(link), _) => {
                    flush(&mut word, out);
                    self.emit_link(link, state, max_depth, out);
                }
            }
        }
        flush(&mut word, out);
    }

    fn emit_link(
        &self,
        link: Link,
        state: &mut ScannerState,
        max_depth: usize,
        out: &mut VecDeque<ScannedToken>,
    ) {
        out.push_back(ScannedToken::new(SyntaxKind::LINK_START, link.open));
        out.push_back(ScannedToken::new(SyntaxKind::LINK_PATH, link.path));
        if let Some(separator) = link.separator {
            out.push_back(ScannedToken::new(SyntaxKind::LINK_SEPARATOR, separator));
        }
        if let Some(description) = link.description {
            Segment {
                text: self.text,
                range: description,
                links: false,
            }
            .scan(state, max_depth, out);
        }
        out.push_back(ScannedToken::new(SyntaxKind::LINK_END, link.close));
    }

    fn pieces(&self) -> Vec<Piece> {
        let lexemes = lex_at(&self.text[self.range.clone()], self.range.start);
        let mut pieces = Vec::with_capacity(lexemes.len());
        let mut i = 0;
        while i < lexemes.len() {
            let lexeme = &lexemes[i];
            match lexeme.kind {
                Lexeme::LinkOpen if self.links => {
                    if let Some((link, next)) = link_at(&lexemes, i) {
                        pieces.push(Piece::Link(link));
                        i = next;
                        continue;
                    }
                    pieces.push(Piece::Plain(lexeme.span.clone()));
                }
                Lexeme::Whitespace | Lexeme::Newline => {
                    pieces.push(Piece::Space(lexeme.span.clone()))
                }
                Lexeme::Delimiter(c) => pieces.push(Piece::Delim(c, lexeme.span.start)),
                _ => pieces.push(Piece::Plain(lexeme.span.clone())),
            }
            i += 1;
        }
        pieces
    }

    fn before(&self, pos: usize) -> Option<char> {
        self.text[self.range.start..pos].chars().next_back()
    }

    fn after(&self, pos: usize) -> Option<char> {
        self.text[pos + 1..self.range.end].chars().next()
    }

    /// Assign a role to every delimiter piece.
    fn pair(&self, pieces: &[Piece], base_depth: usize, max_depth: usize) -> Vec<Role> {
        let mut roles = vec![Role::Plain; pieces.len()];
        let mut open: Vec<(usize, MarkupKind)> = Vec::new();

        for (i, piece) in pieces.iter().enumerate() {
            let Piece::Delim(c, pos) = *piece else {
                continue;
            };
            let Some(kind) = MarkupKind::from_delimiter(c) else {
                continue;
            };
            let prev = self.before(pos);
            let next = self.after(pos);
            let literal = open.last().is_some_and(|(_, k)| k.is_literal());

            if can_end(prev, next) {
                let partner = if literal {
                    open.last()
                        .filter(|(_, k)| *k == kind)
                        .map(|_| open.len() - 1)
                } else {
                    open.iter().rposition(|(_, k)| *k == kind)
                };
                if let Some(at) = partner.filter(|&at| open[at].0 + 1 < i) {
                    for (skipped, _) in open.drain(at + 1..) {
                        roles[skipped] = Role::Interrupted;
                    }
                    if let Some((start, _)) = open.pop() {
                        roles[start] = start_role(kind, true);
                        roles[i] = Role::End;
                    }
                    continue;
                }
            }

            if literal {
                continue;
            }
            let after_start = open.last().is_some_and(|(j, _)| j + 1 == i);
            if can_start(prev, next, c, after_start) {
                if base_depth + open.len() >= max_depth {
                    log::trace!("markup at {pos} exceeds the nesting limit");
                    continue;
                }
                open.push((i, kind));
                roles[i] = start_role(kind, false);
            }
        }
        roles
    }
}

/// Role of a start candidate, depending on whether it found a partner.
fn start_role(kind: MarkupKind, closed: bool) -> Role {
    let viable: &[Production] = if closed {
        &[Production::InterruptedStart, Production::Markup]
    } else {
        &[Production::InterruptedStart]
    };
    match resolve(viable) {
        Some(Production::Markup) => Role::Start(kind),
        _ => Role::Interrupted,
    }
}

fn can_start(prev: Option<char>, next: Option<char>, c: char, after_start: bool) -> bool {
    let prev_ok = match prev {
        None => true,
        Some(p) => p.is_whitespace() || PRE.contains(&p) || after_start,
    };
    let next_ok = next.is_some_and(|n| !n.is_whitespace() && n != c);
    prev_ok && next_ok
}

fn can_end(prev: Option<char>, next: Option<char>) -> bool {
    let prev_ok = prev.is_some_and(|p| !p.is_whitespace());
    let next_ok = match next {
        None => true,
        Some(n) => n.is_whitespace() || POST.contains(&n) || DELIMITERS.contains(&n),
    };
    prev_ok && next_ok
}

/// Recognize a complete link starting at the `[[` lexeme `i`.
fn link_at(lexemes: &[Spanned], i: usize) -> Option<(Link, usize)> {
    let open = lexemes[i].span.clone();
    let mut j = i + 1;
    while lexemes.get(j).is_some_and(|l| in_path(l.kind)) {
        j += 1;
    }
    let path = open.end..lexemes.get(j)?.span.start;
    if path.is_empty() {
        return None;
    }

    match lexemes[j].kind {
        Lexeme::LinkClose => Some((
            Link {
                open,
                path,
                separator: None,
                description: None,
                close: lexemes[j].span.clone(),
            },
            j + 1,
        )),
        Lexeme::LinkSeparator => {
            let separator = lexemes[j].span.clone();
            j += 1;
            while lexemes
                .get(j)
                .is_some_and(|l| in_path(l.kind) || l.kind == Lexeme::Bracket)
            {
                j += 1;
            }
            let close = lexemes.get(j).filter(|l| l.kind == Lexeme::LinkClose)?;
            let description = separator.end..close.span.start;
            if description.is_empty() {
                return None;
            }
            Some((
                Link {
                    open,
                    path,
                    separator: Some(separator),
                    description: Some(description),
                    close: close.span.clone(),
                },
                j + 1,
            ))
        }
        _ => None,
    }
}

fn in_path(kind: Lexeme) -> bool {
    matches!(
        kind,
        Lexeme::Text | Lexeme::Whitespace | Lexeme::Delimiter(_)
    )
}

fn extend(word: &mut Option<Range<usize>>, span: Range<usize>) {
    match word {
        Some(w) => w.end = span.end,
        None => *word = Some(span),
    }
}

fn flush(word: &mut Option<Range<usize>>, out: &mut VecDeque<ScannedToken>) {
    if let Some(span) = word.take() {
        out.push_back(ScannedToken::new(SyntaxKind::WORD, span));
    }
}
