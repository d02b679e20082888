/// One primitive change to the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditOp {
    pub kind: crate::enums::EditKind,
    pub pos: crate::cursor::Position,
    /// Inserted bytes, or the bytes that were erased.
    pub text: Vec<u8>,
}

impl EditOp {
    #[must_use]
    pub fn insert(pos: crate::cursor::Position, text: Vec<u8>) -> Self {
        Self {
            kind: crate::enums::EditKind::Insert,
            pos,
            text,
        }
    }

    #[must_use]
    pub fn erase(pos: crate::cursor::Position, text: Vec<u8>) -> Self {
        Self {
            kind: crate::enums::EditKind::Erase,
            pos,
            text,
        }
    }

    /// Length of the text carried by this op.
    ///
    /// # Errors
    ///
    /// Fails only if the length does not fit in a `u64`.
    pub fn len(&self) -> crate::errors::EditorResult<u64> {
        Ok(<usize as TryInto<u64>>::try_into(self.text.len())?)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Re-applies this op to `table`.
    ///
    /// # Errors
    ///
    /// Propagates table range errors.
    pub fn apply(
        &self,
        table: &mut crate::piece_table::table::PieceTable,
    ) -> crate::errors::EditorResult<()> {
        match self.kind {
            crate::enums::EditKind::Insert => table.insert(self.pos, &self.text),
            crate::enums::EditKind::Erase => table.erase(self.pos, self.len()?),
        }
    }

    /// Applies the inverse of this op to `table`.
    ///
    /// # Errors
    ///
    /// Propagates table range errors.
    pub fn revert(
        &self,
        table: &mut crate::piece_table::table::PieceTable,
    ) -> crate::errors::EditorResult<()> {
        match self.kind {
            crate::enums::EditKind::Insert => table.erase(self.pos, self.len()?),
            crate::enums::EditKind::Erase => table.insert(self.pos, &self.text),
        }
    }
}

/// The atomic unit of undo/redo: every op produced by one user action.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EditBatch {
    pub ops: Vec<EditOp>,
    pub cursors_before: Vec<crate::cursor::Cursor>,
    pub cursors_after: Vec<crate::cursor::Cursor>,
}

impl EditBatch {
    #[must_use]
    pub fn new(cursors_before: Vec<crate::cursor::Cursor>) -> Self {
        Self {
            ops: Vec::new(),
            cursors_before,
            cursors_after: Vec::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Reverts every op, last recorded first.
    ///
    /// # Errors
    ///
    /// Propagates table range errors.
    pub fn undo_on(
        &self,
        table: &mut crate::piece_table::table::PieceTable,
    ) -> crate::errors::EditorResult<()> {
        self.ops.iter().rev().try_for_each(|op| op.revert(table))
    }

    /// Re-applies every op in recorded order.
    ///
    /// # Errors
    ///
    /// Propagates table range errors.
    pub fn redo_on(
        &self,
        table: &mut crate::piece_table::table::PieceTable,
    ) -> crate::errors::EditorResult<()> {
        self.ops.iter().try_for_each(|op| op.apply(table))
    }
}

/// Undo-stack depth of the last save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SavePoint {
    At(usize),
    /// The saved state was forked away from; only a new save makes the
    /// document clean again.
    Unreachable,
}

#[derive(Debug)]
pub struct UndoManager {
    undo_stack: Vec<EditBatch>,
    redo_stack: Vec<EditBatch>,
    save_point: SavePoint,
    /// Maximum number of batches kept on the undo stack.
    limit: Option<usize>,
}

impl Default for UndoManager {
    fn default() -> Self {
        Self::new(None)
    }
}

impl UndoManager {
    #[must_use]
    pub fn new(limit: Option<usize>) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            save_point: SavePoint::At(0),
            limit,
        }
    }

    /// Records a committed batch. Any redo history is discarded.
    pub fn push(&mut self, batch: EditBatch) {
        self.redo_stack.clear();

        if let SavePoint::At(depth) = self.save_point
            && depth > self.undo_stack.len()
        {
            self.save_point = SavePoint::Unreachable;
        }

        self.undo_stack.push(batch);

        if let Some(limit) = self.limit
            && self.undo_stack.len() > limit.max(1)
        {
            self.undo_stack.remove(0);
            self.save_point = match self.save_point {
                SavePoint::At(0) | SavePoint::Unreachable => SavePoint::Unreachable,
                SavePoint::At(depth) => SavePoint::At(depth - 1),
            };
        }

        tracing::trace!(depth = self.undo_stack.len(), "batch pushed");
    }

    /// Moves the newest batch to the redo stack and returns it. The caller
    /// reverts it against the table.
    pub fn undo(&mut self) -> Option<&EditBatch> {
        let batch = self.undo_stack.pop()?;

        self.redo_stack.push(batch);
        self.redo_stack.last()
    }

    /// Moves the newest undone batch back to the undo stack and returns it.
    pub fn redo(&mut self) -> Option<&EditBatch> {
        let batch = self.redo_stack.pop()?;

        self.undo_stack.push(batch);
        self.undo_stack.last()
    }

    pub fn mark_saved(&mut self) {
        self.save_point = SavePoint::At(self.undo_stack.len());
    }

    #[must_use]
    pub fn is_modified(&self) -> bool {
        match self.save_point {
            SavePoint::At(depth) => depth != self.undo_stack.len(),
            SavePoint::Unreachable => true,
        }
    }

    /// Drops all history and treats the current state as saved.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.save_point = SavePoint::At(0);
    }

    #[inline]
    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn depth(&self) -> usize {
        self.undo_stack.len()
    }

    #[inline]
    #[must_use]
    pub fn save_point(&self) -> SavePoint {
        self.save_point
    }
}
