//! Rectangular (block) selection and the virtual-space padding behind it.
//!
//! While a rectangle is active, lines shorter than its right edge are padded
//! with spaces so every row of the rectangle exists as real text. Those
//! inserts live in `pending_padding`, outside the undo history, until the
//! rectangle is abandoned (rolled back) or edited (committed).

use editor_core::errors::EditorResult;

impl crate::document::Document {
    /// Starts a rectangular selection with its anchor at (`line`, `column`).
    ///
    /// # Errors
    ///
    /// Propagates table errors.
    pub fn begin_rect_selection(&mut self, line: usize, column: u32) -> EditorResult<()> {
        self.rollback_padding()?;

        let line = line.min(self.line_count().saturating_sub(1));

        self.rect = Some(crate::document::RectSelection {
            anchor_line: line,
            anchor_column: column,
            head_line: line,
            head_column: column,
        });

        self.update_rect_selection(line, column)
    }

    /// Moves the rectangle's head: rolls back the previous padding, pads the
    /// covered lines up to the right edge, and places one cursor per line.
    ///
    /// # Errors
    ///
    /// Propagates table errors.
    pub fn update_rect_selection(&mut self, line: usize, column: u32) -> EditorResult<()> {
        let Some(mut rect) = self.rect else {
            return self.begin_rect_selection(line, column);
        };

        self.rollback_padding()?;

        rect.head_line = line.min(self.line_count().saturating_sub(1));
        rect.head_column = column;
        self.rect = Some(rect);

        let mut padding = editor_core::history::EditBatch::new(self.cursors.snapshot());
        let right = rect.right();

        for line in rect.lines().rev() {
            let (start, content) = self.line_content(line)?;
            let width = self.columns.width(&content);

            if width < right {
                let pad = vec![b' '; usize::try_from(right - width)?];
                let end = start + <usize as TryInto<u64>>::try_into(content.len())?;

                self.apply_insert(&mut padding, end, &pad)?;
            }
        }

        if !padding.is_empty() {
            self.line_index.rebuild(&self.table)?;

            tracing::trace!(inserts = padding.ops.len(), "padded rectangular selection");

            self.pending_padding = Some(padding);
        }

        let mut cursors = Vec::new();
        let lines: Vec<usize> = if rect.head_line >= rect.anchor_line {
            rect.lines().collect()
        } else {
            rect.lines().rev().collect()
        };

        // Ordered from the anchor row to the head row, so the head row is primary.
        for line in lines {
            let anchor = self.position_at(line, rect.anchor_column)?;
            let head = self.position_at(line, rect.head_column)?;

            cursors.push(editor_core::cursor::Cursor::new_selection(anchor, head));
        }

        self.cursors.replace(cursors);

        Ok(())
    }

    /// Undoes the pending padding directly against the table. Returns
    /// `false` when there was none.
    ///
    /// # Errors
    ///
    /// Propagates table errors.
    pub fn rollback_padding(&mut self) -> EditorResult<bool> {
        let Some(padding) = self.pending_padding.take() else {
            return Ok(false);
        };

        for op in padding.ops.iter().rev() {
            let len = op.len()?;

            self.table.erase(op.pos, len)?;
            self.cursors.adjust_for_erase(op.pos, len);
        }

        self.line_index.rebuild(&self.table)?;

        tracing::debug!(inserts = padding.ops.len(), "rolled back rectangular padding");

        Ok(true)
    }

    /// Moves the pending padding into the undo history as its own batch.
    /// Returns `false` when there was none.
    ///
    /// # Errors
    ///
    /// Propagates table errors.
    pub fn commit_padding(&mut self) -> EditorResult<bool> {
        let Some(mut padding) = self.pending_padding.take() else {
            return Ok(false);
        };

        padding.cursors_after = self.cursors.snapshot();

        tracing::debug!(inserts = padding.ops.len(), "committed rectangular padding");

        self.history.push(padding);
        self.refresh()?;

        Ok(true)
    }

    /// Escape inside a rectangle: drops the padding and collapses to the
    /// primary cursor.
    ///
    /// # Errors
    ///
    /// Propagates table errors.
    pub fn cancel_rect_selection(&mut self) -> EditorResult<()> {
        self.collapse_selections()
    }

    /// Any non-rectangular action supersedes the rectangle.
    pub(crate) fn leave_rect_mode(&mut self) -> EditorResult<()> {
        self.rollback_padding()?;
        self.rect = None;
        self.cursors.clamp(self.len());

        Ok(())
    }

    /// Pastes `payload` as a block: line `i` goes to document line
    /// `top + i` at the same visual column. An active rectangle is replaced
    /// and its top-left corner is the origin; otherwise the primary cursor is.
    /// Lines are appended when the block runs past the end of the document.
    ///
    /// # Errors
    ///
    /// Propagates table errors.
    pub fn insert_rectangular_block(&mut self, payload: &[u8]) -> EditorResult<()> {
        let mut rows: Vec<&[u8]> = payload
            .split(|&b| b == b'\n')
            .map(|row| row.strip_suffix(b"\r").unwrap_or(row))
            .collect();

        if payload.ends_with(b"\n") {
            rows.pop();
        }

        if rows.is_empty() {
            return Ok(());
        }

        let rect = self.rect;
        let mut batch = self.begin_batch()?;

        let (top, column) = match rect {
            Some(rect) => {
                for idx in self.cursors.descending_order() {
                    if let Some(cursor) = self.cursors.get(idx) {
                        let (start, len) = (cursor.start(), cursor.end() - cursor.start());

                        self.apply_erase(&mut batch, start, len)?;
                    }
                }

                self.line_index.rebuild(&self.table)?;

                (*rect.lines().start(), rect.left())
            }
            None => {
                let primary = self.cursors.primary();

                self.apply_erase(&mut batch, primary.start(), primary.end() - primary.start())?;
                self.line_index.rebuild(&self.table)?;
                self.line_column(primary.start())?
            }
        };

        let missing = (top + rows.len()).saturating_sub(self.line_count());

        if missing > 0 {
            let eol = self.line_terminator();
            let tail = eol.repeat(missing);
            let end = self.len();

            self.apply_insert(&mut batch, end, &tail)?;
            self.line_index.rebuild(&self.table)?;
        }

        let mut ends: Vec<u64> = Vec::with_capacity(rows.len());

        for (i, row) in rows.iter().enumerate().rev() {
            let (start, content) = self.line_content(top + i)?;
            let width = self.columns.width(&content);
            let mut segment = Vec::with_capacity(row.len());

            let pos = if width < column {
                segment.resize(usize::try_from(column - width)?, b' ');
                start + <usize as TryInto<u64>>::try_into(content.len())?
            } else {
                start + <usize as TryInto<u64>>::try_into(self.columns.offset_of(&content, column))?
            };

            segment.extend_from_slice(row);

            let seg_len = <usize as TryInto<u64>>::try_into(segment.len())?;

            self.apply_insert(&mut batch, pos, &segment)?;

            for end in &mut ends {
                *end += seg_len;
            }

            ends.push(pos + seg_len);
        }

        ends.reverse();
        self.cursors
            .replace(ends.into_iter().map(editor_core::cursor::Cursor::new).collect());

        self.commit(batch)
    }
}
