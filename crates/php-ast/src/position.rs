use serde::Serialize;
use thiserror::Error;

/// Source range of a node or token: 1-based lines, byte offsets (half-open).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Position {
    pub start_line: i32,
    pub end_line: i32,
    pub start_offset: i32,
    pub end_offset: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid position {position:?}: start is after end")]
pub struct InvalidPosition {
    pub position: Position,
}

impl Position {
    /// "No position", carried by synthetic nodes.
    pub const NONE: Position = Position {
        start_line: -1,
        end_line: -1,
        start_offset: -1,
        end_offset: -1,
    };

    pub fn new(start_line: i32, end_line: i32, start_offset: i32, end_offset: i32) -> Self {
        Self {
            start_line,
            end_line,
            start_offset,
            end_offset,
        }
    }

    pub fn is_none(self) -> bool {
        self == Self::NONE
    }

    /// Range from the start of `start` to the end of `end`. A sentinel on
    /// either side yields the other one.
    pub fn between(start: Position, end: Position) -> Position {
        if start.is_none() {
            return end;
        }
        if end.is_none() {
            return start;
        }
        Position {
            start_line: start.start_line,
            end_line: end.end_line,
            start_offset: start.start_offset,
            end_offset: end.end_offset,
        }
    }

    pub fn len(self) -> usize {
        if self.is_none() {
            return 0;
        }
        (self.end_offset - self.start_offset).max(0) as usize
    }

    pub fn is_empty(self) -> bool {
        self.len() == 0
    }

    /// Byte range of this position, `None` for the sentinel.
    pub fn range(self) -> Option<std::ops::Range<usize>> {
        if self.is_none() {
            None
        } else {
            Some(self.start_offset as usize..self.end_offset as usize)
        }
    }

    pub fn validate(self) -> Result<Position, InvalidPosition> {
        if self.is_none()
            || (self.start_offset <= self.end_offset
                && self.start_line <= self.end_line
                && self.start_offset >= 0
                && self.start_line >= 1)
        {
            Ok(self)
        } else {
            Err(InvalidPosition { position: self })
        }
    }

    /// `true` when `inner` lies within `self`. Sentinels contain and are
    /// contained by everything.
    pub fn contains(self, inner: Position) -> bool {
        self.is_none()
            || inner.is_none()
            || (self.start_offset <= inner.start_offset && inner.end_offset <= self.end_offset)
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::NONE
    }
}

/// Incremental byte offset → line number index.
///
/// Newline offsets are discovered lazily: a query beyond the scanned prefix
/// extends the index forward, any other query binary-searches what is already
/// known. This suits the lexer's mostly-forward access pattern while still
/// answering backward queries without rescanning.
#[derive(Debug, Clone)]
pub struct LineIndex<'src> {
    source: &'src [u8],
    newlines: Vec<usize>,
    scanned: usize,
}

impl<'src> LineIndex<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            source: source.as_bytes(),
            newlines: Vec::new(),
            scanned: 0,
        }
    }

    /// 1-based line of byte `offset`: one plus the number of `\n` in
    /// `source[..offset]`. Offsets past the end are clamped.
    pub fn line_of(&mut self, offset: usize) -> i32 {
        let offset = offset.min(self.source.len());
        if offset > self.scanned {
            self.extend_to(offset);
        }
        let before = self.newlines.partition_point(|&nl| nl < offset);
        before as i32 + 1
    }

    /// Build a Position for the byte range `start..end`. The end line is the
    /// line of the last byte, so a token never "ends" on the following line.
    pub fn position(&mut self, start: usize, end: usize) -> Position {
        let start_line = self.line_of(start);
        let end_line = self.line_of(end.saturating_sub(1).max(start));
        Position::new(start_line, end_line, start as i32, end as i32)
    }

    fn extend_to(&mut self, offset: usize) {
        let hay = &self.source[self.scanned..offset];
        let base = self.scanned;
        self.newlines
            .extend(memchr::memchr_iter(b'\n', hay).map(|i| base + i));
        self.scanned = offset;
    }
}
