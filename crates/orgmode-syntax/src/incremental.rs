//! Incremental reparsing.
//!
//! An edit replaces `old[start..old_end]` with `new[start..new_end]`. The
//! reparse works in three steps:
//!
//! 1. **Restore.** Find the last scanner checkpoint at or before `start`.
//!    Tokens before it are reused as is, and the scanner resumes from its
//!    snapshot.
//! 2. **Re-synchronise.** Past `new_end`, at every line start the scanner's
//!    frame stack is compared with the old checkpoint for the same line. Once
//!    they agree, the rest of the old token stream is replayed, shifted by the
//!    edit's length change, instead of being scanned again.
//! 3. **Reuse.** The grammar runs over the spliced token stream, and every
//!    node of the result that is identical to a node of the old tree outside
//!    the edited range is replaced by that old node, so untouched subtrees are
//!    shared between the two trees.
//!
//! The result is always the tree a full parse of the new text would give.

use std::collections::HashMap;

use rowan::{GreenNode, GreenNodeData, NodeOrToken};

use crate::diagnostics::{Diagnostic, EditError};
use crate::parser::Parser;
use crate::scanner::{Checkpoint, ScanOutput, ScannedToken, Scanner, ScannerState, TokenSource};
use crate::tree::Tree;

/// Reparse `tree` after an edit.
///
/// `new_text` is the complete document after the edit. Bytes
/// `start_byte..old_end_byte` of the old text were replaced by
/// `start_byte..new_end_byte` of the new one; everything else must be
/// unchanged.
pub fn edit(
    tree: &Tree,
    start_byte: usize,
    old_end_byte: usize,
    new_end_byte: usize,
    new_text: &str,
) -> Result<Tree, EditError> {
    let old_text = tree.text();
    validate(old_text, start_byte, old_end_byte, new_end_byte, new_text)?;

    let config = tree.config();
    let delta = new_end_byte as isize - old_end_byte as isize;
    let restore_at = tree
        .checkpoints()
        .iter()
        .rposition(|cp| cp.offset <= start_byte);

    let source = match restore_at.map(|i| (i, &tree.checkpoints()[i])) {
        Some((index, checkpoint)) => match ScannerState::restore(&checkpoint.snapshot) {
            Ok(state) => {
                log::debug!(
                    "edit {start_byte}..{old_end_byte} -> ..{new_end_byte}: resuming at {} (token {})",
                    checkpoint.offset,
                    checkpoint.token_index
                );
                let scanner = Scanner::resume(
                    new_text,
                    config,
                    state,
                    checkpoint.offset,
                    checkpoint.line,
                    checkpoint.token_index,
                );
                IncrementalSource::new(tree, scanner, index, old_end_byte, new_end_byte, delta)
            }
            Err(err) => {
                log::debug!("checkpoint at {} unusable ({err}), full rescan", checkpoint.offset);
                IncrementalSource::full(tree, Scanner::new(new_text, config))
            }
        },
        None => IncrementalSource::full(tree, Scanner::new(new_text, config)),
    };

    let mut parse = Parser::new(new_text, source).parse();
    parse.green = reuse_subtrees(tree, &parse.green, start_byte, old_end_byte, delta);
    Ok(Tree::new(new_text.to_string(), config.clone(), parse))
}

fn validate(
    old_text: &str,
    start: usize,
    old_end: usize,
    new_end: usize,
    new_text: &str,
) -> Result<(), EditError> {
    for (offset, len) in [(old_end, old_text.len()), (new_end, new_text.len())] {
        if offset > len {
            return Err(EditError::OutOfBounds { offset, len });
        }
    }
    for end in [old_end, new_end] {
        if start > end {
            return Err(EditError::InvertedRange { start, end });
        }
    }
    for (text, offset) in [
        (old_text, start),
        (old_text, old_end),
        (new_text, start),
        (new_text, new_end),
    ] {
        if !text.is_char_boundary(offset) {
            return Err(EditError::NotCharBoundary { offset });
        }
    }

    let old_suffix = old_text.len() - old_end;
    let new_suffix = new_text.len() - new_end;
    if old_suffix != new_suffix {
        return Err(EditError::LengthMismatch {
            old_suffix,
            new_suffix,
        });
    }
    if old_text[..start] != new_text[..start] || old_text[old_end..] != new_text[new_end..] {
        return Err(EditError::ContentMismatch);
    }
    Ok(())
}

/// Old tokens up to the restore point, then the resumed scanner, then (once
/// the scanner's state matches the old one again) the old tokens shifted.
struct IncrementalSource<'a> {
    old: &'a Tree,
    prefix: std::vec::IntoIter<ScannedToken>,
    scanner: Option<Scanner<'a>>,
    replay: std::iter::Skip<std::slice::Iter<'a, ScannedToken>>,
    replaying: bool,
    old_end: usize,
    new_end: usize,
    delta: isize,
    emitted: usize,
    checkpoints: Vec<Checkpoint>,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> IncrementalSource<'a> {
    fn new(
        old: &'a Tree,
        scanner: Scanner<'a>,
        restore_index: usize,
        old_end: usize,
        new_end: usize,
        delta: isize,
    ) -> Self {
        let restore = &old.checkpoints()[restore_index];
        let prefix = old.tokens()[..restore.token_index].to_vec();
        let diagnostics = old
            .scan_diagnostics()
            .iter()
            .filter(|d| d.range.start < restore.offset)
            .cloned()
            .collect();
        Self {
            old,
            emitted: prefix.len(),
            prefix: prefix.into_iter(),
            scanner: Some(scanner),
            replay: old.tokens().iter().skip(old.tokens().len()),
            replaying: false,
            old_end,
            new_end,
            delta,
            checkpoints: old.checkpoints()[..restore_index].to_vec(),
            diagnostics,
        }
    }

    /// Rescan everything, without replaying old tokens.
    fn full(old: &'a Tree, scanner: Scanner<'a>) -> Self {
        let text_len = old.text().len();
        Self {
            old,
            prefix: Vec::new().into_iter(),
            scanner: Some(scanner),
            replay: old.tokens().iter().skip(old.tokens().len()),
            replaying: false,
            old_end: text_len,
            new_end: usize::MAX,
            delta: 0,
            emitted: 0,
            checkpoints: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Switch to replay if the scanner sits at a line start past the edit in
    /// the same state the old scan had there.
    fn try_resync(&mut self) {
        let old = self.old;
        let Some(scanner) = &self.scanner else {
            return;
        };
        if !scanner.at_line_start() || scanner.offset() < self.new_end {
            return;
        }
        let old_offset = scanner.offset() - self.new_end + self.old_end;
        let old_checkpoints = old.checkpoints();
        let Ok(found) = old_checkpoints.binary_search_by_key(&old_offset, |cp| cp.offset) else {
            return;
        };
        let old_checkpoint = &old_checkpoints[found];
        if old_checkpoint.snapshot != scanner.state().snapshot() {
            return;
        }
        // Replayed checkpoints must land on the same line grid a full scan uses
        let line_shift = scanner.line() as isize - old_checkpoint.line as isize;
        if line_shift.rem_euclid(old.config().checkpoint_interval.max(1) as isize) != 0 {
            return;
        }

        log::debug!(
            "scanner re-synchronised at {} (old {old_offset}), replaying {} tokens",
            scanner.offset(),
            old.tokens().len() - old_checkpoint.token_index
        );
        if let Some(scanner) = self.scanner.take() {
            self.absorb(scanner.finish());
        }

        let token_shift = self.emitted as isize - old_checkpoint.token_index as isize;
        let delta = self.delta;
        self.checkpoints
            .extend(old_checkpoints[found..].iter().map(|cp| Checkpoint {
                offset: cp.offset.saturating_add_signed(delta),
                line: cp.line.saturating_add_signed(line_shift),
                token_index: cp.token_index.saturating_add_signed(token_shift),
                snapshot: cp.snapshot.clone(),
            }));
        self.diagnostics.extend(
            old.scan_diagnostics()
                .iter()
                .filter(|d| d.range.start >= old_offset)
                .map(|d| d.shifted(delta)),
        );
        self.replay = old.tokens().iter().skip(old_checkpoint.token_index);
        self.replaying = true;
    }

    fn absorb(&mut self, output: ScanOutput) {
        self.checkpoints.extend(output.checkpoints);
        self.diagnostics.extend(output.diagnostics);
    }
}

impl TokenSource for IncrementalSource<'_> {
    fn next_token(&mut self) -> Option<ScannedToken> {
        if let Some(token) = self.prefix.next() {
            return Some(token);
        }
        if self.replaying {
            let token = self.replay.next()?.shifted(self.delta);
            self.emitted += 1;
            return Some(token);
        }
        self.try_resync();
        if self.replaying {
            return self.next_token();
        }
        let token = self.scanner.as_mut()?.next_token()?;
        self.emitted += 1;
        Some(token)
    }

    fn finish(mut self) -> ScanOutput {
        if let Some(scanner) = self.scanner.take() {
            self.absorb(scanner.finish());
        }
        ScanOutput {
            checkpoints: self.checkpoints,
            diagnostics: self.diagnostics,
        }
    }
}

type Key = (usize, usize, rowan::SyntaxKind);

/// Swap nodes of `new` for equal nodes of the old tree that lie wholly
/// outside the edited range, keyed by their position in the new text.
fn reuse_subtrees(
    old: &Tree,
    new: &GreenNode,
    start: usize,
    old_end: usize,
    delta: isize,
) -> GreenNode {
    let mut reusable: HashMap<Key, GreenNode> = HashMap::new();
    for node in old.root_node().descendants() {
        let range = node.text_range();
        let (node_start, node_end) = (usize::from(range.start()), usize::from(range.end()));
        let new_start = if node_end <= start {
            node_start
        } else if node_start >= old_end {
            node_start.saturating_add_signed(delta)
        } else {
            continue;
        };
        let green = node.green().into_owned();
        reusable.insert((new_start, node_end - node_start, green.kind()), green);
    }

    let mut reused = 0usize;
    let root = rebuild(new, 0, &reusable, &mut reused);
    log::debug!("reused {reused} subtrees from the previous tree");
    root
}

fn rebuild(
    node: &GreenNodeData,
    offset: usize,
    reusable: &HashMap<Key, GreenNode>,
    reused: &mut usize,
) -> GreenNode {
    let len = usize::from(node.text_len());
    if let Some(old) = reusable.get(&(offset, len, node.kind()))
        && **old == *node
    {
        *reused += 1;
        return old.clone();
    }

    let mut children = Vec::with_capacity(node.children().len());
    let mut child_offset = offset;
    for child in node.children() {
        match child {
            NodeOrToken::Node(n) => {
                children.push(NodeOrToken::Node(rebuild(n, child_offset, reusable, reused)));
                child_offset += usize::from(n.text_len());
            }
            NodeOrToken::Token(t) => {
                children.push(NodeOrToken::Token(t.to_owned()));
                child_offset += usize::from(t.text_len());
            }
        }
    }
    GreenNode::new(node.kind(), children)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax_kind::{SyntaxKind, SyntaxNode};
    use crate::config::ParserConfig;
    use crate::{dump_tree, parse, parse_with_config};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    /// Replace `old_range` of `text` and run both an incremental and a full
    /// parse of the result.
    fn apply(text: &str, old_range: std::ops::Range<usize>, insert: &str) -> (Tree, Tree) {
        let tree = parse(text);
        let new_text = format!("{}{insert}{}", &text[..old_range.start], &text[old_range.end..]);
        let edited = edit(
            &tree,
            old_range.start,
            old_range.end,
            old_range.start + insert.len(),
            &new_text,
        )
        .expect("valid edit");
        (edited, parse(&new_text))
    }

    fn sections(node: &SyntaxNode) -> Vec<SyntaxNode> {
        node.children()
            .filter(|n| n.kind() == SyntaxKind::SECTION)
            .collect()
    }

    #[rstest]
    #[case("* A\nbody\n* B\ntext\n", 4..8, "changed")]
    #[case("* A\n* B\n", 4..4, "** inserted\n")]
    #[case("#+begin_src\nx\n#+end_src\nafter\n", 12..13, "#+end_src\n")]
    #[case("- a\n- b\nc\n", 4..7, "  - nested")]
    #[case(":PROPERTIES:\n:ID: 1\n:END:\n", 13..19, "")]
    #[case("", 0..0, "* new\n")]
    #[case("a *bold* b\n", 2..3, "")]
    #[case("* A\n** B\n*** C\n", 0..1, "")]
    fn incremental_matches_full_parse(
        #[case] text: &str,
        #[case] range: std::ops::Range<usize>,
        #[case] insert: &str,
    ) {
        let (edited, full) = apply(text, range, insert);
        assert_eq!(dump_tree(&edited.root_node()), dump_tree(&full.root_node()));
        assert_eq!(edited.tokens(), full.tokens());
        assert_eq!(edited.diagnostics(), full.diagnostics());
    }

    #[test]
    fn untouched_sections_are_shared() {
        let text = "* A\none\n* B\ntwo\n* C\nthree\n";
        let tree = parse(text);
        let new_text = text.replacen("two", "TWO!", 1);
        let edited = edit(&tree, 12, 15, 16, &new_text).expect("valid edit");

        let old_sections = sections(&tree.root_node());
        let new_sections = sections(&edited.root_node());
        assert!(std::ptr::eq(&*old_sections[0].green(), &*new_sections[0].green()));
        assert!(!std::ptr::eq(&*old_sections[1].green(), &*new_sections[1].green()));
        assert!(std::ptr::eq(&*old_sections[2].green(), &*new_sections[2].green()));
    }

    #[test]
    fn checkpoints_follow_the_edit() {
        let text = "* A\nx\n* B\ny\n";
        let (edited, full) = apply(text, 4..5, "longer line");
        let offsets = |t: &Tree| t.checkpoints().iter().map(|c| c.offset).collect::<Vec<_>>();
        assert_eq!(offsets(&edited), offsets(&full));
        for cp in edited.checkpoints() {
            assert_eq!(edited.tokens()[cp.token_index].start, cp.offset);
        }
    }

    #[rstest]
    #[case(4..5, "longer line")]
    #[case(4..4, "new\n")]
    #[case(4..8, "")]
    #[case(0..0, "x\ny\n")]
    fn sparse_checkpoints_match_full_parse(
        #[case] range: std::ops::Range<usize>,
        #[case] insert: &str,
    ) {
        let config = ParserConfig {
            checkpoint_interval: 2,
            ..ParserConfig::default()
        };
        let text = "* A\nx\n* B\ny\n* C\nz\n";
        let tree = parse_with_config(text, &config);
        let new_text = format!("{}{insert}{}", &text[..range.start], &text[range.end..]);
        let edited = edit(&tree, range.start, range.end, range.start + insert.len(), &new_text)
            .expect("valid edit");
        let full = parse_with_config(&new_text, &config);

        let grid = |t: &Tree| {
            t.checkpoints()
                .iter()
                .map(|c| (c.offset, c.line, c.token_index))
                .collect::<Vec<_>>()
        };
        assert_eq!(grid(&edited), grid(&full));
        assert_eq!(edited.tokens(), full.tokens());
    }

    #[test]
    fn scanner_diagnostics_are_shifted() {
        let text = "a\n#+begin_\n";
        let (edited, full) = apply(text, 0..1, "abc");
        assert_eq!(edited.diagnostics(), full.diagnostics());
        assert_eq!(edited.diagnostics()[0].range, 4..12);
    }

    #[rstest]
    #[case(3, 1, 1, EditError::InvertedRange { start: 3, end: 1 })]
    #[case(0, 10, 10, EditError::OutOfBounds { offset: 10, len: 4 })]
    #[case(0, 1, 2, EditError::LengthMismatch { old_suffix: 3, new_suffix: 2 })]
    fn invalid_edits(
        #[case] start: usize,
        #[case] old_end: usize,
        #[case] new_end: usize,
        #[case] expected: EditError,
    ) {
        let tree = parse("abc\n");
        assert_eq!(edit(&tree, start, old_end, new_end, "abc\n").err(), Some(expected));
    }

    #[test]
    fn content_outside_range_must_match() {
        let tree = parse("abc\n");
        assert_eq!(
            edit(&tree, 1, 2, 2, "xyz\n").err(),
            Some(EditError::ContentMismatch)
        );
    }

    #[test]
    fn edits_must_fall_on_char_boundaries() {
        let tree = parse("é\n");
        assert_eq!(
            edit(&tree, 1, 1, 1, "é\n").err(),
            Some(EditError::NotCharBoundary { offset: 1 })
        );
    }
}
