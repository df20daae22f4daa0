//! The scanner's frame stack and its byte snapshot.
//!
//! Frames record which structures are open at the current position. They hold
//! no absolute offsets, so a snapshot taken at one line start is valid at the
//! same line after any edit that only shifted text before it.

use crate::diagnostics::SnapshotError;

/// Longest block or drawer name kept in a frame, in bytes.
pub const NAME_MAX_LEN: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
    Greater,
    Dynamic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkupKind {
    Bold,
    Italic,
    Underline,
    Verbatim,
    Code,
    Strikethrough,
}

impl MarkupKind {
    pub fn from_delimiter(c: char) -> Option<Self> {
        Some(match c {
            '*' => MarkupKind::Bold,
            '/' => MarkupKind::Italic,
            '_' => MarkupKind::Underline,
            '=' => MarkupKind::Verbatim,
            '~' => MarkupKind::Code,
            '+' => MarkupKind::Strikethrough,
            _ => return None,
        })
    }

    /// Verbatim and code contents are never scanned for nested markup.
    pub fn is_literal(self) -> bool {
        matches!(self, MarkupKind::Verbatim | MarkupKind::Code)
    }

    fn tag(self) -> u8 {
        self as u8
    }

    fn from_tag(tag: u8) -> Option<Self> {
        [
            MarkupKind::Bold,
            MarkupKind::Italic,
            MarkupKind::Underline,
            MarkupKind::Verbatim,
            MarkupKind::Code,
            MarkupKind::Strikethrough,
        ]
        .get(tag as usize)
        .copied()
    }
}

/// One open structure.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Frame {
    /// A heading section and its star count.
    Section(usize),
    /// `#+begin_NAME` or `#+begin: NAME`.
    Block { kind: BlockKind, name: String },
    /// `:NAME:`. `properties` is set for a `:PROPERTIES:` drawer.
    Drawer { name: String, properties: bool },
    /// A list and the indentation column of its bullets.
    List(usize),
    /// An open markup span on the current line.
    Markup(MarkupKind),
}

const TAG_SECTION: u8 = 0;
const TAG_GREATER: u8 = 1;
const TAG_DYNAMIC: u8 = 2;
const TAG_DRAWER: u8 = 3;
const TAG_PROPERTY_DRAWER: u8 = 4;
const TAG_LIST: u8 = 5;
const TAG_MARKUP: u8 = 6;

/// Cut `name` to at most [`NAME_MAX_LEN`] bytes without splitting a character.
pub fn truncate_name(name: &str) -> String {
    if name.len() <= NAME_MAX_LEN {
        return name.to_string();
    }
    let mut end = NAME_MAX_LEN;
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    name[..end].to_string()
}

/// Serialized [`ScannerState`]. Its size is bounded by the frame limit times
/// the largest frame encoding.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Snapshot(Vec<u8>);

impl Snapshot {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// The explicit frame stack.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScannerState {
    frames: Vec<Frame>,
}

impl ScannerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn top(&self) -> Option<&Frame> {
        self.frames.last()
    }

    pub fn push(&mut self, frame: Frame) {
        self.frames.push(frame);
    }

    pub fn pop(&mut self) -> Option<Frame> {
        self.frames.pop()
    }

    /// Drop every markup frame. Markup never spans a line break.
    pub fn clear_markup(&mut self) {
        self.frames.retain(|f| !matches!(f, Frame::Markup(_)));
    }

    /// Column of the innermost list, if the top of the stack is a list.
    pub fn innermost_list(&self) -> Option<usize> {
        match self.frames.last() {
            Some(Frame::List(col)) => Some(*col),
            _ => None,
        }
    }

    /// The innermost frame that is not a list or markup span.
    pub fn container(&self) -> Option<&Frame> {
        self.frames
            .iter()
            .rev()
            .find(|f| !matches!(f, Frame::List(_) | Frame::Markup(_)))
    }

    /// Index of the innermost open block of `kind` that is not hidden behind
    /// a section.
    pub fn find_block(&self, kind: BlockKind) -> Option<usize> {
        for (i, frame) in self.frames.iter().enumerate().rev() {
            match frame {
                Frame::Block { kind: k, .. } if *k == kind => return Some(i),
                Frame::Section(_) => return None,
                _ => {}
            }
        }
        None
    }

    /// Index of the innermost drawer reachable past open lists only.
    pub fn find_drawer(&self) -> Option<usize> {
        for (i, frame) in self.frames.iter().enumerate().rev() {
            match frame {
                Frame::Drawer { .. } => return Some(i),
                Frame::List(_) | Frame::Markup(_) => {}
                _ => return None,
            }
        }
        None
    }

    pub fn snapshot(&self) -> Snapshot {
        let mut bytes = Vec::with_capacity(self.frames.len() * 3);
        for frame in &self.frames {
            match frame {
                Frame::Section(level) => {
                    bytes.push(TAG_SECTION);
                    push_count(&mut bytes, *level);
                }
                Frame::Block { kind, name } => {
                    bytes.push(match kind {
                        BlockKind::Greater => TAG_GREATER,
                        BlockKind::Dynamic => TAG_DYNAMIC,
                    });
                    push_name(&mut bytes, name);
                }
                Frame::Drawer { name, properties } => {
                    bytes.push(if *properties {
                        TAG_PROPERTY_DRAWER
                    } else {
                        TAG_DRAWER
                    });
                    push_name(&mut bytes, name);
                }
                Frame::List(col) => {
                    bytes.push(TAG_LIST);
                    push_count(&mut bytes, *col);
                }
                Frame::Markup(kind) => {
                    bytes.push(TAG_MARKUP);
                    bytes.push(kind.tag());
                }
            }
        }
        Snapshot(bytes)
    }

    pub fn restore(snapshot: &Snapshot) -> Result<Self, SnapshotError> {
        let mut reader = Reader(snapshot.as_bytes());
        let mut frames = Vec::new();
        while let Some(tag) = reader.byte() {
            let frame = match tag {
                TAG_SECTION => Frame::Section(reader.count()?),
                TAG_GREATER | TAG_DYNAMIC => Frame::Block {
                    kind: if tag == TAG_GREATER {
                        BlockKind::Greater
                    } else {
                        BlockKind::Dynamic
                    },
                    name: reader.name()?,
                },
                TAG_DRAWER | TAG_PROPERTY_DRAWER => Frame::Drawer {
                    name: reader.name()?,
                    properties: tag == TAG_PROPERTY_DRAWER,
                },
                TAG_LIST => Frame::List(reader.count()?),
                TAG_MARKUP => {
                    let kind = reader.byte().ok_or(SnapshotError::Truncated)?;
                    Frame::Markup(MarkupKind::from_tag(kind).ok_or(SnapshotError::UnknownTag(kind))?)
                }
                other => return Err(SnapshotError::UnknownTag(other)),
            };
            frames.push(frame);
        }
        Ok(Self { frames })
    }
}

fn push_count(bytes: &mut Vec<u8>, count: usize) {
    bytes.extend_from_slice(&(count as u64).to_le_bytes());
}

fn push_name(bytes: &mut Vec<u8>, name: &str) {
    let name = truncate_name(name);
    bytes.push(name.len() as u8);
    bytes.extend_from_slice(name.as_bytes());
}

struct Reader<'a>(&'a [u8]);

impl Reader<'_> {
    fn byte(&mut self) -> Option<u8> {
        let (&first, rest) = self.0.split_first()?;
        self.0 = rest;
        Some(first)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], SnapshotError> {
        if self.0.len() < N {
            return Err(SnapshotError::Truncated);
        }
        let (head, rest) = self.0.split_at(N);
        self.0 = rest;
        let mut out = [0; N];
        out.copy_from_slice(head);
        Ok(out)
    }

    fn count(&mut self) -> Result<usize, SnapshotError> {
        let count = u64::from_le_bytes(self.array()?);
        usize::try_from(count).map_err(|_| SnapshotError::CountOverflow(count))
    }

    fn name(&mut self) -> Result<String, SnapshotError> {
        let len = self.byte().ok_or(SnapshotError::Truncated)? as usize;
        if self.0.len() < len {
            return Err(SnapshotError::Truncated);
        }
        let (head, rest) = self.0.split_at(len);
        self.0 = rest;
        String::from_utf8(head.to_vec()).map_err(|_| SnapshotError::InvalidName)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> ScannerState {
        let mut state = ScannerState::new();
        state.push(Frame::Section(1));
        state.push(Frame::Section(3));
        state.push(Frame::Block {
            kind: BlockKind::Greater,
            name: "quote".to_string(),
        });
        state.push(Frame::List(2));
        state.push(Frame::Drawer {
            name: "PROPERTIES".to_string(),
            properties: true,
        });
        state.push(Frame::Markup(MarkupKind::Code));
        state
    }

    #[test]
    fn snapshot_restores_same_stack() {
        let state = sample();
        let restored = ScannerState::restore(&state.snapshot()).expect("valid snapshot");
        assert_eq!(restored, state);
    }

    #[test]
    fn large_levels_and_columns_survive_snapshot() {
        let mut state = ScannerState::new();
        state.push(Frame::Section(70_001));
        state.push(Frame::List(100_000));
        let restored = ScannerState::restore(&state.snapshot()).expect("valid snapshot");
        assert_eq!(restored.frames(), &[Frame::Section(70_001), Frame::List(100_000)]);
    }

    #[test]
    fn empty_snapshot() {
        let state = ScannerState::new();
        assert!(state.snapshot().is_empty());
        assert_eq!(ScannerState::restore(&Snapshot::default()), Ok(state));
    }

    #[test]
    fn truncated_snapshot_is_rejected() {
        let bytes = sample().snapshot().as_bytes().to_vec();
        let cut = Snapshot(bytes[..bytes.len() - 1].to_vec());
        assert_eq!(ScannerState::restore(&cut), Err(SnapshotError::Truncated));
    }

    #[test]
    fn unknown_tag_is_rejected() {
        assert_eq!(
            ScannerState::restore(&Snapshot(vec![42])),
            Err(SnapshotError::UnknownTag(42))
        );
    }

    #[test]
    fn long_names_are_truncated_on_char_boundary() {
        let name = "é".repeat(40);
        let cut = truncate_name(&name);
        assert!(cut.len() <= NAME_MAX_LEN);
        assert_eq!(cut.len(), 64);
        assert!(name.starts_with(&cut));
    }

    #[test]
    fn snapshot_size_is_bounded() {
        let mut state = ScannerState::new();
        for _ in 0..64 {
            state.push(Frame::Block {
                kind: BlockKind::Dynamic,
                name: "x".repeat(500),
            });
        }
        assert_eq!(state.snapshot().len(), 64 * (2 + NAME_MAX_LEN));
    }

    #[test]
    fn block_lookup_stops_at_sections() {
        let mut state = ScannerState::new();
        state.push(Frame::Block {
            kind: BlockKind::Greater,
            name: "a".to_string(),
        });
        state.push(Frame::Section(1));
        assert_eq!(state.find_block(BlockKind::Greater), None);
        state.push(Frame::Drawer {
            name: "LOGBOOK".to_string(),
            properties: false,
        });
        state.push(Frame::List(0));
        assert_eq!(state.find_drawer(), Some(2));
        assert_eq!(
            state.container(),
            Some(&Frame::Drawer {
                name: "LOGBOOK".to_string(),
                properties: false,
            })
        );
    }
}
