#[derive(Clone, Debug, PartialEq)]
pub struct Piece {
    pub buf_kind: crate::enums::BufferKind,
    pub range: std::ops::Range<u64>,
}

impl Piece {
    #[inline]
    #[must_use]
    pub fn new(buf_kind: crate::enums::BufferKind, range: std::ops::Range<u64>) -> Self {
        Self { buf_kind, range }
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> u64 {
        self.range.end - self.range.start
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.range.start == self.range.end
    }

    /// Whether `next` continues this piece in the same source, so the two can
    /// be represented by one piece.
    #[inline]
    #[must_use]
    pub fn continues_into(&self, next: &Piece) -> bool {
        self.buf_kind == next.buf_kind && self.range.end == next.range.start
    }
}
