//! # Scanner - Context-Sensitive Tokens
//!
//! The scanner turns source text into the token stream the grammar consumes.
//! It works one line at a time and owns an explicit stack of open frames
//! (sections, blocks, drawers, lists, markup spans), which is everything it
//! needs to classify a line:
//!
//! ```text
//! "* A\n** B\n* C\n"
//!
//! STARS WHITESPACE WORD NEWLINE            push Section(1)
//! STARS WHITESPACE WORD NEWLINE            push Section(2)
//! END_SECTION END_SECTION STARS ...        pop Section(2), Section(1); push Section(1)
//! END_SECTION                              end of input
//! ```
//!
//! `LIST_START`, `LIST_END` and `END_SECTION` are zero-width. They are emitted
//! before the indentation of the line that caused them, so the grammar sees
//! structure changes before any text of the new line.
//!
//! At every line start (every `checkpoint_interval` lines) the scanner records
//! a [`Checkpoint`]: the offset, the line index, the number of tokens emitted
//! so far, and a [`Snapshot`] of the frame stack. Scanning can resume from any checkpoint,
//! which is what incremental reparsing builds on.

pub mod frame;
mod inline;

use std::collections::VecDeque;
use std::ops::Range;

use crate::config::ParserConfig;
use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::precedence::{Production, resolve};
use crate::syntax_kind::SyntaxKind;

pub use frame::{BlockKind, Frame, MarkupKind, NAME_MAX_LEN, ScannerState, Snapshot};

/// A token with its byte range in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScannedToken {
    pub kind: SyntaxKind,
    pub start: usize,
    pub end: usize,
}

impl ScannedToken {
    pub fn new(kind: SyntaxKind, range: Range<usize>) -> Self {
        Self {
            kind,
            start: range.start,
            end: range.end,
        }
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    pub(crate) fn shifted(self, delta: isize) -> Self {
        Self {
            kind: self.kind,
            start: self.start.saturating_add_signed(delta),
            end: self.end.saturating_add_signed(delta),
        }
    }
}

/// Scanner state recorded at a line start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkpoint {
    pub offset: usize,
    pub line: usize,
    pub token_index: usize,
    pub snapshot: Snapshot,
}

/// What a token source leaves behind once it is exhausted.
#[derive(Debug, Clone, Default)]
pub struct ScanOutput {
    pub checkpoints: Vec<Checkpoint>,
    pub diagnostics: Vec<Diagnostic>,
}

/// A pull-based supplier of tokens for the parser.
pub trait TokenSource {
    fn next_token(&mut self) -> Option<ScannedToken>;

    fn finish(self) -> ScanOutput;
}

pub struct Scanner<'a> {
    text: &'a str,
    config: &'a ParserConfig,
    state: ScannerState,
    offset: usize,
    line: usize,
    emitted: usize,
    pending: VecDeque<ScannedToken>,
    checkpoints: Vec<Checkpoint>,
    diagnostics: Vec<Diagnostic>,
    finished: bool,
}

impl<'a> Scanner<'a> {
    pub fn new(text: &'a str, config: &'a ParserConfig) -> Self {
        Self::resume(text, config, ScannerState::new(), 0, 0, 0)
    }

    /// Continue scanning at line `line`, starting at `offset`, with a
    /// restored frame stack. `token_index` is the number of tokens before
    /// `offset`.
    pub fn resume(
        text: &'a str,
        config: &'a ParserConfig,
        state: ScannerState,
        offset: usize,
        line: usize,
        token_index: usize,
    ) -> Self {
        Self {
            text,
            config,
            state,
            offset,
            line,
            emitted: token_index,
            pending: VecDeque::new(),
            checkpoints: Vec::new(),
            diagnostics: Vec::new(),
            finished: false,
        }
    }

    pub fn state(&self) -> &ScannerState {
        &self.state
    }

    /// Offset of the next unscanned line.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Index of the next unscanned line.
    pub fn line(&self) -> usize {
        self.line
    }

    /// True when the next token will come from a fresh line.
    pub fn at_line_start(&self) -> bool {
        self.pending.is_empty() && !self.finished && self.offset < self.text.len()
    }

    pub fn checkpoints(&self) -> &[Checkpoint] {
        &self.checkpoints
    }

    fn push(&mut self, kind: SyntaxKind, range: Range<usize>) {
        self.pending.push_back(ScannedToken::new(kind, range));
    }

    fn marker(&mut self, kind: SyntaxKind, at: usize) {
        self.push(kind, at..at);
    }

    fn scan_line(&mut self) {
        let start = self.offset;
        if self.line % self.config.checkpoint_interval.max(1) == 0 {
            self.checkpoints.push(Checkpoint {
                offset: start,
                line: self.line,
                token_index: self.emitted,
                snapshot: self.state.snapshot(),
            });
        }
        self.line += 1;

        let bytes = self.text.as_bytes();
        let (content_end, line_end) = match self.text[start..].find('\n') {
            Some(i) => {
                let nl = start + i;
                let content_end = if nl > start && bytes[nl - 1] == b'\r' {
                    nl - 1
                } else {
                    nl
                };
                (content_end, nl + 1)
            }
            None => (self.text.len(), self.text.len()),
        };

        self.line_tokens(start, content_end);
        if line_end > content_end {
            self.push(SyntaxKind::NEWLINE, content_end..line_end);
        }
        self.state.clear_markup();
        self.offset = line_end;
    }

    fn finish_input(&mut self) {
        let end = self.text.len();
        while let Some(frame) = self.state.pop() {
            match frame {
                Frame::Section(_) => self.marker(SyntaxKind::END_SECTION, end),
                Frame::List(_) => self.marker(SyntaxKind::LIST_END, end),
                Frame::Block { name, .. } | Frame::Drawer { name, .. } => {
                    log::trace!("{name:?} still open at end of input");
                }
                Frame::Markup(_) => {}
            }
        }
        self.finished = true;
    }

    fn line_tokens(&mut self, start: usize, end: usize) {
        let text = self.text;
        let line = &text[start..end];
        let indent_len = line.len() - line.trim_start_matches([' ', '\t']).len();
        let body = &line[indent_len..];

        if body.is_empty() {
            if indent_len > 0 {
                self.push(SyntaxKind::WHITESPACE, start..end);
            }
            return;
        }

        if indent_len == 0
            && let Some(stars) = heading_stars(body)
        {
            self.heading(start, end, stars);
            return;
        }

        let column = self.config.indent_column(&line[..indent_len]);
        if let Some(bullet_len) = bullet_len(body, column) {
            let candidates: &[Production] = if self.state.innermost_list().is_some() {
                &[Production::Continuation, Production::ListItem]
            } else {
                &[Production::Paragraph, Production::ListItem]
            };
            if resolve(candidates) == Some(Production::ListItem) {
                self.list_item(start, end, indent_len, column, bullet_len);
                return;
            }
        }

        while let Some(list_column) = self.state.innermost_list() {
            if column >= list_column {
                break;
            }
            log::trace!("line at column {column} closes list at column {list_column}");
            self.state.pop();
            self.marker(SyntaxKind::LIST_END, start);
        }
        self.element(start, end, indent_len);
    }

    /// Room for one more frame. Otherwise record the overflow.
    fn has_room(&mut self, range: Range<usize>) -> bool {
        if self.state.depth() < self.config.max_depth {
            return true;
        }
        log::debug!("nesting limit {} reached at {range:?}", self.config.max_depth);
        self.diagnostics.push(Diagnostic::new(
            DiagnosticKind::DepthLimit,
            range,
            format!(
                "more than {} open structures, line kept as text",
                self.config.max_depth
            ),
        ));
        false
    }

    fn heading(&mut self, start: usize, end: usize, level: usize) {
        while let Some(top) = self.state.top() {
            match top {
                Frame::Section(n) if *n < level => break,
                Frame::Section(_) => {
                    self.state.pop();
                    self.marker(SyntaxKind::END_SECTION, start);
                }
                Frame::List(_) => {
                    self.state.pop();
                    self.marker(SyntaxKind::LIST_END, start);
                }
                _ => {
                    let frame = self.state.pop();
                    log::trace!("heading at {start} closes {frame:?}");
                }
            }
        }

        if !self.has_room(start..end) {
            self.objects(start, end);
            return;
        }
        log::trace!("section level {level} opens at {start}");
        self.state.push(Frame::Section(level));

        let mut pos = start + level;
        self.push(SyntaxKind::STARS, start..pos);
        pos = self.whitespace(pos, end);

        let word = self.word(pos, end);
        if self.config.is_heading_keyword(&self.text[word.clone()]) {
            self.push(SyntaxKind::TODO_KEYWORD, word.clone());
            pos = self.whitespace(word.end, end);
        }
        let word = self.word(pos, end);
        if is_priority(&self.text[word.clone()]) {
            self.push(SyntaxKind::PRIORITY, word.clone());
            pos = self.whitespace(word.end, end);
        }
        let word = self.word(pos, end);
        if &self.text[word.clone()] == "COMMENT" {
            self.push(SyntaxKind::COMMENT_FLAG, word.clone());
            pos = self.whitespace(word.end, end);
        }
        self.objects(pos, end);
    }

    fn list_item(
        &mut self,
        start: usize,
        end: usize,
        indent_len: usize,
        column: usize,
        bullet_len: usize,
    ) {
        while let Some(list_column) = self.state.innermost_list() {
            if list_column <= column {
                break;
            }
            self.state.pop();
            self.marker(SyntaxKind::LIST_END, start);
        }

        if self.state.innermost_list() != Some(column) {
            if !self.has_room(start..end) {
                self.objects(start, end);
                return;
            }
            log::trace!("list at column {column} opens at {start}");
            self.state.push(Frame::List(column));
            self.marker(SyntaxKind::LIST_START, start);
        }

        let mut pos = self.whitespace(start, start + indent_len);
        self.push(SyntaxKind::BULLET, pos..pos + bullet_len);
        pos = self.whitespace(pos + bullet_len, end);

        let text = self.text;
        let rest = &text[pos..end];
        if ["[ ]", "[-]", "[X]"].iter().any(|c| rest.starts_with(c))
            && rest[3..].chars().next().is_none_or(|c| c == ' ' || c == '\t')
        {
            self.push(SyntaxKind::CHECKBOX, pos..pos + 3);
            pos = self.whitespace(pos + 3, end);
        }
        self.objects(pos, end);
    }

    fn element(&mut self, start: usize, end: usize, indent_len: usize) {
        let text = self.text;
        let body_start = start + indent_len;
        let body = &text[body_start..end];

        if starts_with_ignore_case(body, "#+begin_") {
            self.block_begin(start, end, indent_len);
        } else if starts_with_ignore_case(body, "#+end_")
            && let Some(at) = self.state.find_block(BlockKind::Greater)
        {
            self.block_end(start, end, indent_len, at, SyntaxKind::BLOCK_END_MARKER);
        } else if starts_with_ignore_case(body, "#+begin:") {
            self.dynamic_begin(start, end, indent_len);
        } else if starts_with_ignore_case(body, "#+end:")
            && let Some(at) = self.state.find_block(BlockKind::Dynamic)
        {
            self.block_end(start, end, indent_len, at, SyntaxKind::DYNAMIC_END);
        } else if let Some(key_len) = keyword_key_len(body) {
            self.whitespace(start, body_start);
            self.push(SyntaxKind::KEYWORD_KEY, body_start..body_start + key_len);
            inline::scan_words(self.text, body_start + key_len..end, &mut self.pending);
        } else if body.starts_with('#')
            && body[1..].chars().next().is_none_or(|c| c == ' ' || c == '\t')
        {
            self.whitespace(start, body_start);
            self.push(SyntaxKind::COMMENT, body_start..end);
        } else if !(body.starts_with(':') && self.drawer_line(start, end, indent_len)) {
            self.objects(start, end);
        }
    }

    fn block_begin(&mut self, start: usize, end: usize, indent_len: usize) {
        let body_start = start + indent_len;
        let marker_end = body_start + "#+begin_".len();
        let name = self.word(marker_end, end);

        let viable: &[Production] = if name.is_empty() {
            &[Production::Incomplete]
        } else {
            &[Production::Incomplete, Production::Element]
        };
        if resolve(viable) == Some(Production::Incomplete) {
            log::trace!("block begin without a name at {body_start}");
            self.diagnostics.push(Diagnostic::new(
                DiagnosticKind::LexError,
                body_start..marker_end,
                "block begin without a name",
            ));
            self.whitespace(start, body_start);
            self.push(SyntaxKind::ERROR_SENTINEL, body_start..marker_end);
            self.objects(marker_end, end);
            return;
        }
        if !self.has_room(start..end) {
            self.objects(start, end);
            return;
        }

        let block_name = frame::truncate_name(&self.text[name.clone()]);
        log::trace!("block {block_name:?} opens at {start}");
        self.state.push(Frame::Block {
            kind: BlockKind::Greater,
            name: block_name,
        });
        self.whitespace(start, body_start);
        self.push(SyntaxKind::BLOCK_BEGIN_MARKER, body_start..marker_end);
        self.push(SyntaxKind::BLOCK_BEGIN_NAME, name.clone());
        self.rest_as_text(name.end, end);
    }

    fn dynamic_begin(&mut self, start: usize, end: usize, indent_len: usize) {
        if !self.has_room(start..end) {
            self.objects(start, end);
            return;
        }
        let body_start = start + indent_len;
        let marker_end = body_start + "#+begin:".len();

        self.whitespace(start, body_start);
        self.push(SyntaxKind::DYNAMIC_BEGIN, body_start..marker_end);
        let pos = self.whitespace(marker_end, end);
        let name = self.word(pos, end);
        let block_name = frame::truncate_name(&self.text[name.clone()]);
        log::trace!("dynamic block {block_name:?} opens at {start}");
        self.state.push(Frame::Block {
            kind: BlockKind::Dynamic,
            name: block_name,
        });
        if !name.is_empty() {
            self.push(SyntaxKind::BLOCK_BEGIN_NAME, name.clone());
        }
        self.rest_as_text(name.end, end);
    }

    /// Close the block frame at index `at` and everything above it.
    fn block_end(&mut self, start: usize, end: usize, indent_len: usize, at: usize, marker: SyntaxKind) {
        while self.state.depth() > at {
            match self.state.pop() {
                Some(Frame::List(_)) => self.marker(SyntaxKind::LIST_END, start),
                Some(frame) => log::trace!("block end at {start} pops {frame:?}"),
                None => break,
            }
        }

        let body_start = start + indent_len;
        let marker_len = if marker == SyntaxKind::BLOCK_END_MARKER {
            "#+end_".len()
        } else {
            "#+end:".len()
        };
        let marker_end = body_start + marker_len;
        self.whitespace(start, body_start);
        self.push(marker, body_start..marker_end);

        let pos = if marker == SyntaxKind::DYNAMIC_END {
            self.whitespace(marker_end, end)
        } else {
            marker_end
        };
        let name = self.word(pos, end);
        if !name.is_empty() {
            self.push(SyntaxKind::BLOCK_END_NAME, name.clone());
        }
        self.rest_as_text(name.end, end);
    }

    /// Lines starting with `:`. Returns false when the line is a paragraph.
    fn drawer_line(&mut self, start: usize, end: usize, indent_len: usize) -> bool {
        let text = self.text;
        let body_start = start + indent_len;
        let body = &text[body_start..end];
        let name_len = body[1..]
            .bytes()
            .take_while(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'+'))
            .count();
        if name_len == 0 || body.as_bytes().get(1 + name_len) != Some(&b':') {
            return false;
        }
        let name = &body[1..1 + name_len];
        let name_end = body_start + name_len + 2;
        let rest_blank = text[name_end..end].trim().is_empty();
        let plus = name.contains('+');

        if name.eq_ignore_ascii_case("end") && rest_blank {
            let Some(at) = self.state.find_drawer() else {
                return false;
            };
            while self.state.depth() > at {
                if let Some(Frame::List(_)) = self.state.pop() {
                    self.marker(SyntaxKind::LIST_END, start);
                }
            }
            log::trace!("drawer closes at {start}");
            self.whitespace(start, body_start);
            self.push(SyntaxKind::DRAWER_END, body_start..name_end);
            self.whitespace(name_end, end);
            return true;
        }

        let mut candidates = Vec::with_capacity(2);
        match self.state.container() {
            Some(Frame::Drawer {
                properties: true, ..
            }) => candidates.push(Production::NodeProperty),
            Some(Frame::Drawer { .. }) if !plus => candidates.push(if rest_blank {
                Production::Element
            } else {
                Production::NodeProperty
            }),
            _ if !plus && rest_blank => candidates.push(Production::Element),
            _ => {}
        }
        candidates.push(Production::Paragraph);

        match resolve(&candidates) {
            Some(Production::NodeProperty) => {
                self.whitespace(start, body_start);
                self.push(SyntaxKind::PROPERTY_NAME, body_start..name_end);
                self.rest_as_text(name_end, end);
                true
            }
            Some(Production::Element) => {
                if !self.has_room(start..end) {
                    return false;
                }
                log::trace!("drawer {name:?} opens at {start}");
                self.state.push(Frame::Drawer {
                    name: frame::truncate_name(name),
                    properties: name.eq_ignore_ascii_case("properties"),
                });
                self.whitespace(start, body_start);
                self.push(SyntaxKind::DRAWER_NAME, body_start..name_end);
                self.whitespace(name_end, end);
                true
            }
            _ => false,
        }
    }

    fn objects(&mut self, start: usize, end: usize) {
        inline::scan_objects(
            self.text,
            start..end,
            &mut self.state,
            self.config.max_depth,
            &mut self.pending,
        );
    }

    /// Emit the whitespace run at `pos`, returning the offset after it.
    fn whitespace(&mut self, pos: usize, end: usize) -> usize {
        let len = self.text[pos..end]
            .bytes()
            .take_while(|b| matches!(b, b' ' | b'\t'))
            .count();
        if len > 0 {
            self.push(SyntaxKind::WHITESPACE, pos..pos + len);
        }
        pos + len
    }

    /// The non-whitespace run at `pos`.
    fn word(&self, pos: usize, end: usize) -> Range<usize> {
        let len = self.text[pos..end]
            .bytes()
            .take_while(|b| !matches!(b, b' ' | b'\t'))
            .count();
        pos..pos + len
    }

    /// Whitespace, a single `TEXT` token, then trailing whitespace.
    fn rest_as_text(&mut self, pos: usize, end: usize) {
        let pos = self.whitespace(pos, end);
        let trimmed = self.text[pos..end].trim_end_matches([' ', '\t']).len();
        if trimmed > 0 {
            self.push(SyntaxKind::TEXT, pos..pos + trimmed);
        }
        self.whitespace(pos + trimmed, end);
    }
}

impl Iterator for Scanner<'_> {
    type Item = ScannedToken;

    fn next(&mut self) -> Option<ScannedToken> {
        loop {
            if let Some(token) = self.pending.pop_front() {
                self.emitted += 1;
                return Some(token);
            }
            if self.finished {
                return None;
            }
            if self.offset >= self.text.len() {
                self.finish_input();
            } else {
                self.scan_line();
            }
        }
    }
}

impl TokenSource for Scanner<'_> {
    fn next_token(&mut self) -> Option<ScannedToken> {
        self.next()
    }

    fn finish(self) -> ScanOutput {
        ScanOutput {
            checkpoints: self.checkpoints,
            diagnostics: self.diagnostics,
        }
    }
}

/// Scan `text` to completion.
pub fn scan(text: &str, config: &ParserConfig) -> Vec<ScannedToken> {
    Scanner::new(text, config).collect()
}

fn heading_stars(body: &str) -> Option<usize> {
    let stars = body.bytes().take_while(|&b| b == b'*').count();
    match body.as_bytes().get(stars) {
        Some(b' ' | b'\t') if stars > 0 => Some(stars),
        _ => None,
    }
}

fn bullet_len(body: &str, column: usize) -> Option<usize> {
    let bytes = body.as_bytes();
    let len = match bytes.first()? {
        b'-' | b'+' => 1,
        b'*' if column > 0 => 1,
        b'0'..=b'9' => {
            let digits = bytes.iter().take_while(|b| b.is_ascii_digit()).count();
            match bytes.get(digits) {
                Some(b'.' | b')') => digits + 1,
                _ => return None,
            }
        }
        _ => return None,
    };
    matches!(bytes.get(len), Some(b' ' | b'\t')).then_some(len)
}

fn is_priority(word: &str) -> bool {
    let bytes = word.as_bytes();
    bytes.len() == 4
        && bytes.starts_with(b"[#")
        && bytes[2].is_ascii_alphanumeric()
        && bytes[3] == b']'
}

/// Length of a `#+KEY:` prefix.
fn keyword_key_len(body: &str) -> Option<usize> {
    let rest = body.strip_prefix("#+")?;
    let key = rest
        .bytes()
        .take_while(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-'))
        .count();
    (key > 0 && rest.as_bytes().get(key) == Some(&b':')).then_some(key + 3)
}

fn starts_with_ignore_case(text: &str, prefix: &str) -> bool {
    text.len() >= prefix.len()
        && text.as_bytes()[..prefix.len()].eq_ignore_ascii_case(prefix.as_bytes())
}
