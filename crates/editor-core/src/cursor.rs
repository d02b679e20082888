/// A byte offset into the logical document, `0..=len`.
pub type Position = u64;

/// Represents a cursor and its associated selection range.
/// Uses the "Anchor and Head" directional selection model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cursor {
    /// The fixed starting point of a selection.
    pub anchor: Position,
    /// The active, moving end of a selection (where the blinking caret is).
    pub head: Position,
    /// The preferred visual column. Used to maintain horizontal position
    /// when moving vertically across shorter lines.
    pub preferred_column: Option<u32>,
}

impl Cursor {
    #[must_use]
    pub fn new(pos: Position) -> Self {
        Self {
            anchor: pos,
            head: pos,
            preferred_column: None,
        }
    }

    /// Creates a selection from an anchor to a head.
    #[must_use]
    pub fn new_selection(anchor: Position, head: Position) -> Self {
        Self {
            anchor,
            head,
            preferred_column: None,
        }
    }

    /// Returns true if this is just a caret (no text selected).
    #[inline]
    #[must_use]
    pub fn no_selection(&self) -> bool {
        self.anchor == self.head
    }

    #[inline]
    #[must_use]
    pub fn has_selection(&self) -> bool {
        self.anchor != self.head
    }

    #[inline]
    #[must_use]
    pub fn start(&self) -> Position {
        std::cmp::min(self.anchor, self.head)
    }

    #[inline]
    #[must_use]
    pub fn end(&self) -> Position {
        std::cmp::max(self.anchor, self.head)
    }

    /// Normalized byte range regardless of selection direction.
    #[inline]
    #[must_use]
    pub fn range(&self) -> std::ops::Range<Position> {
        self.start()..self.end()
    }

    /// True when the head sits before the anchor.
    #[inline]
    #[must_use]
    pub fn is_backward(&self) -> bool {
        self.head < self.anchor
    }

    /// Moves the head, keeping the anchor. Forgets the preferred column.
    pub fn set_head(&mut self, pos: Position) {
        self.head = pos;
        self.preferred_column = None;
    }

    /// Moves both ends to `pos`.
    pub fn collapse_to(&mut self, pos: Position) {
        self.anchor = pos;
        self.head = pos;
        self.preferred_column = None;
    }

    /// Moves both anchor and head to the same position (clears selection).
    pub fn clear_selection(&mut self) {
        self.anchor = self.head;
    }

    /// Inverts the direction of the selection.
    pub fn invert(&mut self) {
        std::mem::swap(&mut self.anchor, &mut self.head);
    }
}

/// Ordered set of cursors. The last cursor is the primary one.
///
/// The set is never empty; constructors seed it with at least one cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CursorSet {
    cursors: Vec<Cursor>,
}

impl Default for CursorSet {
    fn default() -> Self {
        Self::new(Cursor::default())
    }
}

impl From<Vec<Cursor>> for CursorSet {
    fn from(cursors: Vec<Cursor>) -> Self {
        if cursors.is_empty() {
            return Self::default();
        }

        Self { cursors }
    }
}

/*

===========================
========= GETTERS =========
===========================

*/

impl CursorSet {
    #[must_use]
    pub fn new(cursor: Cursor) -> Self {
        Self {
            cursors: vec![cursor],
        }
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.cursors.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cursors.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[Cursor] {
        &self.cursors
    }

    /// Copy of every cursor, for batch snapshots.
    #[inline]
    #[must_use]
    pub fn snapshot(&self) -> Vec<Cursor> {
        self.cursors.clone()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Cursor> {
        self.cursors.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Cursor> {
        self.cursors.iter_mut()
    }

    #[must_use]
    pub fn get(&self, idx: usize) -> Option<Cursor> {
        self.cursors.get(idx).copied()
    }

    #[must_use]
    pub fn primary(&self) -> Cursor {
        self.cursors.last().copied().unwrap_or_default()
    }

    pub fn primary_mut(&mut self) -> &mut Cursor {
        if self.cursors.is_empty() {
            self.cursors.push(Cursor::default());
        }

        let last = self.cursors.len() - 1;

        &mut self.cursors[last]
    }

    /// Mutable access to cursor `idx`, if it exists.
    pub fn get_mut(&mut self, idx: usize) -> Option<&mut Cursor> {
        self.cursors.get_mut(idx)
    }

    /// Heads of every cursor, in set order.
    #[must_use]
    pub fn heads(&self) -> Vec<Position> {
        self.cursors.iter().map(|c| c.head).collect()
    }

    /// Whether some cursor selects exactly `range`.
    #[must_use]
    pub fn covers(&self, range: &std::ops::Range<Position>) -> bool {
        self.cursors.iter().any(|c| c.range() == *range)
    }

    /// Cursor indices ordered by descending start position.
    #[must_use]
    pub fn descending_order(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.cursors.len()).collect();

        order.sort_by(|&a, &b| self.cursors[b].start().cmp(&self.cursors[a].start()));

        order
    }
}

/*

===========================
========= MUTATION ========
===========================

*/

impl CursorSet {
    /// Replaces every cursor with `cursor`.
    pub fn set_single(&mut self, cursor: Cursor) {
        self.cursors.clear();
        self.cursors.push(cursor);
    }

    /// Adds `cursor` as the new primary.
    pub fn push(&mut self, cursor: Cursor) {
        self.cursors.push(cursor);
    }

    pub fn replace(&mut self, cursors: Vec<Cursor>) {
        *self = Self::from(cursors);
    }

    /// Drops every cursor but the primary one.
    pub fn keep_primary(&mut self) {
        let primary = self.primary();

        self.set_single(primary);
    }

    /// Clamps every head and anchor to `len`.
    pub fn clamp(&mut self, len: Position) {
        for cursor in &mut self.cursors {
            cursor.head = cursor.head.min(len);
            cursor.anchor = cursor.anchor.min(len);
        }
    }

    /// Sorts cursors by position and merges those whose ranges overlap or
    /// touch. Each merged cursor keeps the direction of the earlier one.
    pub fn merge(&mut self) {
        if self.cursors.len() < 2 {
            return;
        }

        self.cursors
            .sort_by(|a, b| a.start().cmp(&b.start()).then(a.end().cmp(&b.end())));

        let mut merged: Vec<Cursor> = Vec::with_capacity(self.cursors.len());

        for cursor in self.cursors.drain(..) {
            if let Some(prev) = merged.last_mut()
                && cursor.start() <= prev.end()
            {
                let start = prev.start();
                let end = prev.end().max(cursor.end());

                if prev.is_backward() {
                    prev.head = start;
                    prev.anchor = end;
                } else {
                    prev.anchor = start;
                    prev.head = end;
                }

                continue;
            }

            merged.push(cursor);
        }

        self.cursors = merged;
    }

    /// Shifts every head/anchor strictly after `pos` by `len` bytes.
    pub fn adjust_for_insert(&mut self, pos: Position, len: u64) {
        for cursor in &mut self.cursors {
            if cursor.head > pos {
                cursor.head += len;
            }

            if cursor.anchor > pos {
                cursor.anchor += len;
            }
        }
    }

    /// Pulls every head/anchor after `pos` back by `len` bytes. Positions
    /// inside the erased window collapse to `pos`.
    pub fn adjust_for_erase(&mut self, pos: Position, len: u64) {
        let shift = |p: &mut Position| {
            if *p > pos {
                *p = if *p >= pos + len { *p - len } else { pos };
            }
        };

        for cursor in &mut self.cursors {
            shift(&mut cursor.head);
            shift(&mut cursor.anchor);
        }
    }
}

#[cfg(test)]
mod cursor_tests {
    use super::*;

    #[test]
    fn test_cursor_creation() {
        let cursor = Cursor::new(10);

        assert_eq!(cursor.anchor, 10);
        assert_eq!(cursor.head, 10);
        assert!(cursor.no_selection());
        assert_eq!(cursor.preferred_column, None);
    }

    #[test]
    fn test_cursor_range() {
        let cursor = Cursor::new_selection(20, 10);

        assert_eq!(cursor.range(), 10..20);
        assert!(cursor.is_backward());
        assert!(cursor.has_selection());
    }

    #[test]
    fn test_cursor_invert() {
        let mut cursor = Cursor::new_selection(5, 15);

        cursor.invert();
        assert_eq!((cursor.anchor, cursor.head), (15, 5));
        assert_eq!(cursor.range(), 5..15);

        cursor.invert();
        assert_eq!((cursor.anchor, cursor.head), (5, 15));
    }

    #[test]
    fn merge_overlapping_keeps_earlier_direction() {
        let mut set = CursorSet::from(vec![
            Cursor::new_selection(12, 8),
            Cursor::new_selection(10, 3),
        ]);

        set.merge();

        assert_eq!(set.len(), 1);
        assert_eq!(set.primary(), Cursor::new_selection(12, 3));
    }

    #[test]
    fn merge_touching_and_duplicates() {
        let mut set = CursorSet::from(vec![
            Cursor::new(7),
            Cursor::new_selection(0, 4),
            Cursor::new(7),
            Cursor::new_selection(4, 6),
        ]);

        set.merge();

        assert_eq!(
            set.as_slice(),
            &[Cursor::new_selection(0, 6), Cursor::new(7)]
        );
    }

    #[test]
    fn insert_shift_moves_later_cursors_only() {
        let mut set = CursorSet::from(vec![Cursor::new(5), Cursor::new(20), Cursor::new(40)]);

        // The cursor at 20 performs the insert and is advanced by the caller.
        set.adjust_for_insert(20, 2);
        if let Some(cursor) = set.get_mut(1) {
            cursor.collapse_to(22);
        }

        assert_eq!(set.heads(), vec![5, 22, 42]);
    }

    #[test]
    fn erase_shift_clamps_inside_window() {
        let mut set = CursorSet::from(vec![
            Cursor::new(2),
            Cursor::new_selection(4, 9),
            Cursor::new(12),
        ]);

        set.adjust_for_erase(3, 4);

        assert_eq!(
            set.as_slice(),
            &[Cursor::new(2), Cursor::new_selection(3, 5), Cursor::new(8)]
        );
    }

    #[test]
    fn descending_order_and_primary() {
        let set = CursorSet::from(vec![Cursor::new(9), Cursor::new(1), Cursor::new(4)]);

        assert_eq!(set.descending_order(), vec![0, 2, 1]);
        assert_eq!(set.primary(), Cursor::new(4));
        assert_eq!(CursorSet::from(Vec::new()).len(), 1);
    }
}
