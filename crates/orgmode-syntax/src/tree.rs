//! The parsed document: a Rowan tree plus everything needed to map it back
//! to the source and to reparse it incrementally.

use std::fmt::Write as _;
use std::ops::Range;

use rowan::{GreenNode, NodeOrToken};

use crate::config::{LANGUAGE, ParserConfig};
use crate::diagnostics::Diagnostic;
use crate::parser::Parse;
use crate::scanner::{Checkpoint, ScannedToken};
use crate::syntax_kind::{SyntaxElement, SyntaxKind, SyntaxNode};

/// Zero-based row and byte column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Point {
    pub row: usize,
    pub column: usize,
}

impl Point {
    pub fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }
}

/// A byte range and the points at both ends.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Span {
    pub range: Range<usize>,
    pub start: Point,
    pub end: Point,
}

/// Offsets of every line start, for offset → point conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    pub(crate) fn new(text: &str) -> Self {
        let starts = std::iter::once(0)
            .chain(text.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self { starts }
    }

    pub(crate) fn point(&self, offset: usize) -> Point {
        let row = self.starts.partition_point(|&start| start <= offset) - 1;
        Point::new(row, offset - self.starts[row])
    }
}

/// An immutable parse result.
///
/// Cloning is cheap for the tree itself (green nodes are reference counted)
/// but copies the token and checkpoint tables.
#[derive(Debug, Clone)]
pub struct Tree {
    green: GreenNode,
    text: String,
    tokens: Vec<ScannedToken>,
    checkpoints: Vec<Checkpoint>,
    scan_diagnostics: Vec<Diagnostic>,
    diagnostics: Vec<Diagnostic>,
    lines: LineIndex,
    config: ParserConfig,
}

impl Tree {
    pub(crate) fn new(text: String, config: ParserConfig, parse: Parse) -> Self {
        let Parse {
            green,
            tokens,
            diagnostics: grammar_diagnostics,
            scan,
        } = parse;

        let mut diagnostics: Vec<Diagnostic> = scan
            .diagnostics
            .iter()
            .cloned()
            .chain(grammar_diagnostics)
            .collect();
        diagnostics.sort_by_key(|d| (d.range.start, d.range.end));

        Self {
            green,
            lines: LineIndex::new(&text),
            text,
            tokens,
            checkpoints: scan.checkpoints,
            scan_diagnostics: scan.diagnostics,
            diagnostics,
            config,
        }
    }

    pub fn root_node(&self) -> SyntaxNode {
        SyntaxNode::new_root(self.green.clone())
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Scanner and grammar diagnostics, ordered by position.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// The scanner's token stream, including zero-width structural markers
    /// that do not appear in the tree.
    pub fn tokens(&self) -> &[ScannedToken] {
        &self.tokens
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Row and column of a byte offset. Offsets past the end clamp to it.
    pub fn point(&self, offset: usize) -> Point {
        self.lines.point(offset.min(self.text.len()))
    }

    pub fn span(&self, node: &SyntaxNode) -> Span {
        let range = node.text_range();
        self.range_span(range.start().into()..range.end().into())
    }

    pub fn range_span(&self, range: Range<usize>) -> Span {
        Span {
            start: self.point(range.start),
            end: self.point(range.end),
            range,
        }
    }

    /// Apply an edit and reparse. See [`crate::edit`].
    pub fn edit(
        &self,
        start_byte: usize,
        old_end_byte: usize,
        new_end_byte: usize,
        new_text: &str,
    ) -> Result<Tree, crate::EditError> {
        crate::incremental::edit(self, start_byte, old_end_byte, new_end_byte, new_text)
    }

    pub(crate) fn checkpoints(&self) -> &[Checkpoint] {
        &self.checkpoints
    }

    pub(crate) fn scan_diagnostics(&self) -> &[Diagnostic] {
        &self.scan_diagnostics
    }
}

/// Field lookup and recovery predicates on syntax nodes.
pub trait NodeExt {
    /// The first child filling the named field.
    fn field(&self, name: &str) -> Option<SyntaxElement>;

    /// Every child filling the named field, in order.
    fn fields(&self, name: &str) -> Vec<SyntaxElement>;

    /// Produced by error recovery.
    fn is_error(&self) -> bool;

    /// A block or drawer whose end line never arrived.
    fn is_missing(&self) -> bool;

    /// This node or any descendant is an error.
    fn has_error(&self) -> bool;
}

impl NodeExt for SyntaxNode {
    fn field(&self, name: &str) -> Option<SyntaxElement> {
        self.fields(name).into_iter().next()
    }

    fn fields(&self, name: &str) -> Vec<SyntaxElement> {
        let Some(spec) = LANGUAGE.field(self.kind(), name) else {
            return Vec::new();
        };
        let limit = if spec.multiple { usize::MAX } else { 1 };
        self.children_with_tokens()
            .filter(|child| child.kind() == spec.child)
            .take(limit)
            .collect()
    }

    fn is_error(&self) -> bool {
        self.kind() == SyntaxKind::ERROR
    }

    fn is_missing(&self) -> bool {
        let closer = match self.kind() {
            SyntaxKind::GREATER_BLOCK => SyntaxKind::BLOCK_END_MARKER,
            SyntaxKind::DYNAMIC_BLOCK => SyntaxKind::DYNAMIC_END,
            SyntaxKind::DRAWER => SyntaxKind::DRAWER_END,
            _ => return false,
        };
        !self.children_with_tokens().any(|c| c.kind() == closer)
    }

    fn has_error(&self) -> bool {
        self.descendants().any(|n| n.is_error())
    }
}

/// Render a node and everything under it, one element per line.
///
/// ```text
/// ROOT@0..4
///   BODY@0..4
///     PARAGRAPH@0..4
///       WORD@0..3 "abc"
///       NEWLINE@3..4 "\n"
/// ```
pub fn dump_tree(node: &SyntaxNode) -> String {
    let mut out = String::new();
    dump_into(&mut out, node, 0);
    out
}

fn dump_into(out: &mut String, node: &SyntaxNode, indent: usize) {
    let prefix = "  ".repeat(indent);
    let _ = writeln!(out, "{prefix}{:?}@{:?}", node.kind(), node.text_range());
    for child in node.children_with_tokens() {
        match child {
            NodeOrToken::Node(n) => dump_into(out, &n, indent + 1),
            NodeOrToken::Token(t) => {
                let _ = writeln!(
                    out,
                    "{prefix}  {:?}@{:?} {:?}",
                    t.kind(),
                    t.text_range(),
                    t.text()
                );
            }
        }
    }
}
