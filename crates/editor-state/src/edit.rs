//! Multi-cursor content edits: typing, deletion, case conversion and the
//! clipboard payloads.

use editor_core::errors::EditorResult;

impl crate::document::Document {
    /// Inserts `text` at every cursor, replacing selections.
    ///
    /// # Errors
    ///
    /// Propagates table errors.
    pub fn insert_at_cursors(&mut self, text: &[u8]) -> EditorResult<()> {
        let mut batch = self.begin_batch()?;
        let text_len = <usize as TryInto<u64>>::try_into(text.len())?;

        for idx in self.cursors.descending_order() {
            let Some(cursor) = self.cursors.get(idx) else {
                continue;
            };
            let start = cursor.start();

            self.apply_erase(&mut batch, start, cursor.end() - start)?;
            self.apply_insert(&mut batch, start, text)?;

            if let Some(cursor) = self.cursors.get_mut(idx) {
                cursor.collapse_to(start + text_len);
            }
        }

        self.commit(batch)
    }

    /// Delete key: removes each selection, or the text unit after each caret.
    ///
    /// # Errors
    ///
    /// Propagates table errors.
    pub fn delete_forward(&mut self) -> EditorResult<()> {
        self.delete_at_cursors(editor_core::enums::Direction::Forward)
    }

    /// Backspace: removes each selection, or the text unit before each caret.
    ///
    /// # Errors
    ///
    /// Propagates table errors.
    pub fn backspace(&mut self) -> EditorResult<()> {
        self.delete_at_cursors(editor_core::enums::Direction::Backward)
    }

    fn delete_at_cursors(&mut self, direction: editor_core::enums::Direction) -> EditorResult<()> {
        let mut batch = self.begin_batch()?;

        for idx in self.cursors.descending_order() {
            let Some(cursor) = self.cursors.get(idx) else {
                continue;
            };

            let range = if cursor.has_selection() {
                cursor.range()
            } else {
                match direction {
                    editor_core::enums::Direction::Forward => {
                        cursor.head..editor_core::text::next_boundary(&self.table, cursor.head)?
                    }
                    editor_core::enums::Direction::Backward => {
                        editor_core::text::prev_boundary(&self.table, cursor.head)?..cursor.head
                    }
                }
            };

            self.apply_erase(&mut batch, range.start, range.end - range.start)?;

            if let Some(cursor) = self.cursors.get_mut(idx) {
                cursor.collapse_to(range.start);
            }
        }

        self.commit(batch)
    }

    /// Upper/lower-cases every non-empty selection, keeping each selection
    /// (and its direction) over the converted text.
    ///
    /// # Errors
    ///
    /// Propagates table errors.
    pub fn convert_case(
        &mut self,
        conversion: editor_core::enums::CaseConversion,
    ) -> EditorResult<()> {
        let mut batch = self.begin_batch()?;

        for idx in self.cursors.descending_order() {
            let Some(cursor) = self.cursors.get(idx) else {
                continue;
            };

            if cursor.no_selection() {
                continue;
            }

            let start = cursor.start();
            let original = self.table.read(start, cursor.end() - start)?;
            let converted = editor_core::text::convert_case(&original, conversion);

            if converted == original {
                continue;
            }

            let end = start + <usize as TryInto<u64>>::try_into(converted.len())?;

            self.apply_erase(&mut batch, start, cursor.end() - start)?;
            self.apply_insert(&mut batch, start, &converted)?;

            if let Some(c) = self.cursors.get_mut(idx) {
                *c = if cursor.is_backward() {
                    editor_core::cursor::Cursor::new_selection(end, start)
                } else {
                    editor_core::cursor::Cursor::new_selection(start, end)
                };
            }
        }

        self.commit(batch)
    }
}

/*

=====================================
========= CLIPBOARD PAYLOADS ========
=====================================

*/

impl crate::document::Document {
    /// Selected texts in document order, joined by the configured separator.
    /// `None` when nothing is selected.
    ///
    /// # Errors
    ///
    /// Propagates table read errors.
    pub fn copy(&self) -> EditorResult<Option<Vec<u8>>> {
        let mut ranges: Vec<_> = self
            .cursors
            .iter()
            .filter(|c| c.has_selection())
            .map(editor_core::cursor::Cursor::range)
            .collect();

        if ranges.is_empty() {
            return Ok(None);
        }

        ranges.sort_by_key(|r| r.start);

        let mut payload = Vec::new();

        for (i, range) in ranges.iter().enumerate() {
            if i > 0 {
                payload.extend_from_slice(self.config.copy_separator.as_bytes());
            }

            payload.extend(self.table.read(range.start, range.end - range.start)?);
        }

        Ok(Some(payload))
    }

    /// [`copy`](Self::copy), then deletes every selection as one batch.
    ///
    /// # Errors
    ///
    /// Propagates table errors.
    pub fn cut(&mut self) -> EditorResult<Option<Vec<u8>>> {
        let Some(payload) = self.copy()? else {
            return Ok(None);
        };

        let mut batch = self.begin_batch()?;

        for idx in self.cursors.descending_order() {
            let Some(cursor) = self.cursors.get(idx) else {
                continue;
            };

            if cursor.has_selection() {
                self.apply_erase(&mut batch, cursor.start(), cursor.end() - cursor.start())?;

                if let Some(c) = self.cursors.get_mut(idx) {
                    c.collapse_to(cursor.start());
                }
            }
        }

        self.commit(batch)?;

        Ok(Some(payload))
    }

    /// # Errors
    ///
    /// Propagates table errors.
    pub fn paste(&mut self, text: &[u8]) -> EditorResult<()> {
        self.insert_at_cursors(text)
    }

    /// Drag-and-drop: moves the primary selection so it starts at `dest`
    /// (a position in the current document). Returns `false` when there is
    /// no selection or `dest` falls inside it.
    ///
    /// # Errors
    ///
    /// Propagates table errors.
    pub fn move_selection_to(&mut self, dest: u64) -> EditorResult<bool> {
        let primary = self.cursors.primary();
        let range = primary.range();

        if range.is_empty() || range.contains(&dest) || dest == range.end || dest > self.len() {
            return Ok(false);
        }

        let text = self.table.read(range.start, range.end - range.start)?;
        let len = range.end - range.start;
        let mut batch = self.begin_batch()?;

        self.cursors.set_single(editor_core::cursor::Cursor::new(range.start));
        self.apply_erase(&mut batch, range.start, len)?;

        let target = if dest > range.end { dest - len } else { dest };

        self.apply_insert(&mut batch, target, &text)?;
        self.cursors
            .set_single(editor_core::cursor::Cursor::new_selection(target, target + len));

        self.commit(batch)?;

        Ok(true)
    }
}
