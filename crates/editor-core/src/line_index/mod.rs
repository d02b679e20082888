pub mod line_iter;

use std::ops::AddAssign;

/// Derived map from line number to the byte offset where that line starts.
///
/// Rebuilt from the table after every committed batch; never patched in place.
/// `starts[0] == 0` always, and every `\n` is followed by a line start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIndex {
    starts: Vec<u64>,
    /// Document length at the time of the last rebuild.
    len: u64,
}

impl Default for LineIndex {
    fn default() -> Self {
        Self {
            starts: vec![0],
            len: 0,
        }
    }
}

impl LineIndex {
    /// Scans every piece of `table` for line feeds.
    ///
    /// # Errors
    ///
    /// Fails only if a chunk length does not fit in a `u64`.
    pub fn build(
        table: &crate::piece_table::table::PieceTable,
    ) -> crate::errors::EditorResult<Self> {
        let mut index = Self::default();

        index.rebuild(table)?;

        Ok(index)
    }

    /// Discards the cached starts and rescans `table`.
    ///
    /// # Errors
    ///
    /// See [`LineIndex::build`].
    pub fn rebuild(
        &mut self,
        table: &crate::piece_table::table::PieceTable,
    ) -> crate::errors::EditorResult<()> {
        self.starts.clear();
        self.starts.push(0);

        let mut offset = 0u64;

        for chunk in table.chunks() {
            for idx in memchr::memchr_iter(b'\n', chunk) {
                let after = <usize as TryInto<u64>>::try_into(idx)? + 1;

                self.starts.push(offset + after);
            }

            offset.add_assign(<usize as TryInto<u64>>::try_into(chunk.len())?);
        }

        self.len = offset;

        Ok(())
    }
}

/*

==========================
===== INLINE METHODS =====
==========================

*/

impl LineIndex {
    /// Number of lines; a document ending in `\n` has a final empty line.
    #[inline]
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.starts.len()
    }

    #[inline]
    #[must_use]
    pub fn starts(&self) -> &[u64] {
        &self.starts
    }

    #[inline]
    #[must_use]
    pub fn line_start(&self, line: usize) -> Option<u64> {
        self.starts.get(line).copied()
    }

    /// Offset just past the line, terminator included.
    #[must_use]
    pub fn line_end(&self, line: usize) -> Option<u64> {
        if line >= self.starts.len() {
            return None;
        }

        Some(self.starts.get(line + 1).copied().unwrap_or(self.len))
    }

    /// Byte range of `line` including its terminator.
    #[must_use]
    pub fn line_range(&self, line: usize) -> Option<std::ops::Range<u64>> {
        Some(self.line_start(line)?..self.line_end(line)?)
    }

    /// Line containing `pos`; positions past the end map to the last line.
    #[must_use]
    pub fn line_of(&self, pos: u64) -> usize {
        self.starts.partition_point(|&start| start <= pos).saturating_sub(1)
    }

    /// Byte range of `line` without its trailing `\n` or `\r\n`.
    #[must_use]
    pub fn content_range(
        &self,
        line: usize,
        table: &crate::piece_table::table::PieceTable,
    ) -> Option<std::ops::Range<u64>> {
        let std::ops::Range { start, mut end } = self.line_range(line)?;

        if end > start && table.byte_at(end - 1) == Some(b'\n') {
            end -= 1;

            if end > start && table.byte_at(end - 1) == Some(b'\r') {
                end -= 1;
            }
        }

        Some(start..end)
    }

    /// Iterates `(line number, byte range)` pairs for `range` of lines.
    #[must_use]
    pub fn lines(
        &self,
        range: std::ops::Range<usize>,
    ) -> crate::line_index::line_iter::LineRangeIter<'_> {
        crate::line_index::line_iter::LineRangeIter {
            index: self,
            current_line_idx: range.start,
            end_line_idx: range.end.min(self.line_count()),
        }
    }
}

#[cfg(test)]
mod line_index_tests {
    use super::LineIndex;
    use crate::piece_table::table::PieceTable;

    #[test]
    fn empty_document_has_one_line() {
        let table = PieceTable::from_text("").unwrap();
        let index = LineIndex::build(&table).unwrap();

        assert_eq!(index.starts(), &[0]);
        assert_eq!(index.line_range(0), Some(0..0));
        assert_eq!(index.line_of(0), 0);
    }

    #[test]
    fn starts_follow_every_newline() {
        let table = PieceTable::from_text("ab\ncd\r\n\nef").unwrap();
        let index = LineIndex::build(&table).unwrap();

        assert_eq!(index.starts(), &[0, 3, 7, 8]);
        assert_eq!(index.line_count(), 4);
        assert_eq!(index.line_end(3), Some(10));
        assert_eq!(index.line_end(4), None);
    }

    #[test]
    fn rebuild_sees_newlines_across_pieces() {
        let mut table = PieceTable::from_text("one\nthree").unwrap();

        table.insert(4, b"two\n").unwrap();

        let index = LineIndex::build(&table).unwrap();

        assert_eq!(index.starts(), &[0, 4, 8]);
    }

    #[test]
    fn line_of_uses_partition() {
        let table = PieceTable::from_text("ab\ncd\n").unwrap();
        let index = LineIndex::build(&table).unwrap();

        assert_eq!(index.line_of(0), 0);
        assert_eq!(index.line_of(2), 0);
        assert_eq!(index.line_of(3), 1);
        assert_eq!(index.line_of(6), 2);
        assert_eq!(index.line_of(99), 2);
    }

    #[test]
    fn content_range_strips_terminators() {
        let table = PieceTable::from_text("ab\r\ncd\nef").unwrap();
        let index = LineIndex::build(&table).unwrap();

        assert_eq!(index.content_range(0, &table), Some(0..2));
        assert_eq!(index.content_range(1, &table), Some(4..6));
        assert_eq!(index.content_range(2, &table), Some(7..9));
    }

    #[test]
    fn lines_iterator_yields_ranges() {
        let table = PieceTable::from_text("a\nbb\nccc").unwrap();
        let index = LineIndex::build(&table).unwrap();
        let lines: Vec<_> = index.lines(1..10).collect();

        assert_eq!(lines, vec![(1, 2..5), (2, 5..8)]);
    }
}
