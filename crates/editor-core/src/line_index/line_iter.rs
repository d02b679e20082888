use std::ops::AddAssign;

#[derive(Debug)]
pub struct LineRangeIter<'index> {
    pub index: &'index crate::line_index::LineIndex,
    pub current_line_idx: usize,
    pub end_line_idx: usize,
}

impl Iterator for LineRangeIter<'_> {
    type Item = (usize, std::ops::Range<u64>);

    fn next(&mut self) -> Option<Self::Item> {
        if self.current_line_idx >= self.end_line_idx {
            return None;
        }

        let range = self.index.line_range(self.current_line_idx)?;

        self.current_line_idx.add_assign(1);

        Some((self.current_line_idx - 1, range))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.end_line_idx.saturating_sub(self.current_line_idx);

        (remaining, Some(remaining))
    }
}
