//! Caret movement and selection building. None of these touch the text
//! except through rolling back rectangular padding.

use editor_core::cursor::{Cursor, Position};
use editor_core::errors::EditorResult;

/*

================================
========= PLACEMENT ============
================================

*/

impl crate::document::Document {
    /// Click: a single caret at `pos`.
    ///
    /// # Errors
    ///
    /// Propagates table errors from rolling back padding.
    pub fn set_cursor(&mut self, pos: Position) -> EditorResult<()> {
        self.leave_rect_mode()?;
        self.cursors.set_single(Cursor::new(pos.min(self.len())));

        Ok(())
    }

    /// Alt+click: adds a caret at `pos`. Cursors are merged and kept in
    /// position order, so the primary is whichever cursor ends up last, not
    /// necessarily the new caret.
    ///
    /// # Errors
    ///
    /// Propagates table errors from rolling back padding.
    pub fn add_cursor(&mut self, pos: Position) -> EditorResult<()> {
        self.leave_rect_mode()?;
        self.cursors.push(Cursor::new(pos.min(self.len())));
        self.cursors.merge();

        Ok(())
    }

    /// Shift+click or drag: moves the primary head, keeping its anchor.
    ///
    /// # Errors
    ///
    /// Propagates table errors from rolling back padding.
    pub fn extend_primary_to(&mut self, pos: Position) -> EditorResult<()> {
        self.leave_rect_mode()?;

        let pos = pos.min(self.len());

        self.cursors.primary_mut().set_head(pos);
        self.cursors.merge();

        Ok(())
    }

    /// # Errors
    ///
    /// Propagates table errors from rolling back padding.
    pub fn select_all(&mut self) -> EditorResult<()> {
        self.leave_rect_mode()?;
        self.cursors.set_single(Cursor::new_selection(0, self.len()));

        Ok(())
    }

    /// Escape: drops padding and every cursor but the primary, which loses
    /// its selection.
    ///
    /// # Errors
    ///
    /// Propagates table errors from rolling back padding.
    pub fn collapse_selections(&mut self) -> EditorResult<()> {
        self.leave_rect_mode()?;
        self.cursors.keep_primary();
        self.cursors.primary_mut().clear_selection();

        Ok(())
    }

    /// Double click: selects the word run at `pos`.
    ///
    /// # Errors
    ///
    /// Propagates table read errors.
    pub fn select_word_at(&mut self, pos: Position) -> EditorResult<()> {
        self.leave_rect_mode()?;

        let range = editor_core::text::word_range_at(&self.table, pos)?;

        self.cursors
            .set_single(Cursor::new_selection(range.start, range.end));

        Ok(())
    }

    /// Triple click: selects the line holding `pos`, terminator included.
    ///
    /// # Errors
    ///
    /// Propagates table errors from rolling back padding.
    pub fn select_line_at(&mut self, pos: Position) -> EditorResult<()> {
        self.leave_rect_mode()?;

        let line = self.line_index.line_of(pos.min(self.len()));

        if let Some(range) = self.line_index.line_range(line) {
            self.cursors
                .set_single(Cursor::new_selection(range.start, range.end));
        }

        Ok(())
    }

    /// Ctrl+D. With a bare primary caret, selects the word around it.
    /// Otherwise adds a cursor on the next case-sensitive occurrence of the
    /// primary selection, unless a cursor already covers it. Returns whether
    /// the selection changed.
    ///
    /// # Errors
    ///
    /// Propagates table read errors.
    pub fn select_next_occurrence(&mut self) -> EditorResult<bool> {
        self.leave_rect_mode()?;

        let primary = self.cursors.primary();

        if primary.no_selection() {
            let range = editor_core::text::word_range_at(&self.table, primary.head)?;

            if range.is_empty() {
                return Ok(false);
            }

            *self.cursors.primary_mut() = Cursor::new_selection(range.start, range.end);
            self.cursors.merge();

            return Ok(true);
        }

        let selected = self.table.read(primary.start(), primary.end() - primary.start())?;

        // Patterns are strings; a selection that is not UTF-8 cannot be searched.
        let Ok(pattern) = String::from_utf8(selected) else {
            return Ok(false);
        };

        let query = editor_core::search::SearchQuery::literal(pattern);
        let engine = editor_core::search::SearchEngine::new(query);
        let found = engine.find(
            &self.table,
            primary.end(),
            editor_core::enums::Direction::Forward,
        )?;

        match found {
            Some(found) if !self.cursors.covers(&found.range) => {
                self.cursors
                    .push(Cursor::new_selection(found.range.start, found.range.end));
                self.cursors.merge();

                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

/*

================================
========= MOVEMENT =============
================================

*/

impl crate::document::Document {
    /// Moves every cursor to `target(cursor)`. `extend` keeps the anchors.
    fn move_each(
        &mut self,
        extend: bool,
        target: impl Fn(&Self, &Cursor) -> EditorResult<Position>,
    ) -> EditorResult<()> {
        self.leave_rect_mode()?;

        let targets = self
            .cursors
            .iter()
            .map(|cursor| target(self, cursor))
            .collect::<EditorResult<Vec<Position>>>()?;

        for (cursor, pos) in self.cursors.iter_mut().zip(targets) {
            if extend {
                cursor.set_head(pos);
            } else {
                cursor.collapse_to(pos);
            }
        }

        self.cursors.merge();

        Ok(())
    }

    /// # Errors
    ///
    /// Propagates table read errors.
    pub fn move_left(&mut self, extend: bool) -> EditorResult<()> {
        self.move_each(extend, |doc, cursor| {
            if !extend && cursor.has_selection() {
                return Ok(cursor.start());
            }

            editor_core::text::prev_boundary(&doc.table, cursor.head)
        })
    }

    /// # Errors
    ///
    /// Propagates table read errors.
    pub fn move_right(&mut self, extend: bool) -> EditorResult<()> {
        self.move_each(extend, |doc, cursor| {
            if !extend && cursor.has_selection() {
                return Ok(cursor.end());
            }

            editor_core::text::next_boundary(&doc.table, cursor.head)
        })
    }

    /// # Errors
    ///
    /// Propagates table read errors.
    pub fn move_word_left(&mut self, extend: bool) -> EditorResult<()> {
        self.move_each(extend, |doc, cursor| {
            editor_core::text::move_word_left(&doc.table, cursor.head)
        })
    }

    /// # Errors
    ///
    /// Propagates table read errors.
    pub fn move_word_right(&mut self, extend: bool) -> EditorResult<()> {
        self.move_each(extend, |doc, cursor| {
            editor_core::text::move_word_right(&doc.table, cursor.head)
        })
    }

    /// Home.
    ///
    /// # Errors
    ///
    /// Propagates table errors from rolling back padding.
    pub fn move_line_start(&mut self, extend: bool) -> EditorResult<()> {
        self.move_each(extend, |doc, cursor| {
            let line = doc.line_index.line_of(cursor.head);

            Ok(doc.line_index.line_start(line).unwrap_or(0))
        })
    }

    /// End: stops before the line terminator.
    ///
    /// # Errors
    ///
    /// Propagates table errors from rolling back padding.
    pub fn move_line_end(&mut self, extend: bool) -> EditorResult<()> {
        self.move_each(extend, |doc, cursor| {
            let line = doc.line_index.line_of(cursor.head);

            Ok(doc
                .line_index
                .content_range(line, &doc.table)
                .map_or(cursor.head, |range| range.end))
        })
    }

    /// # Errors
    ///
    /// Propagates table errors from rolling back padding.
    pub fn move_document_start(&mut self, extend: bool) -> EditorResult<()> {
        self.move_each(extend, |_, _| Ok(0))
    }

    /// # Errors
    ///
    /// Propagates table errors from rolling back padding.
    pub fn move_document_end(&mut self, extend: bool) -> EditorResult<()> {
        self.move_each(extend, |doc, _| Ok(doc.len()))
    }

    /// # Errors
    ///
    /// Propagates table read errors.
    pub fn move_up(&mut self, extend: bool) -> EditorResult<()> {
        self.move_vertically(editor_core::enums::LineDirection::Up, extend)
    }

    /// # Errors
    ///
    /// Propagates table read errors.
    pub fn move_down(&mut self, extend: bool) -> EditorResult<()> {
        self.move_vertically(editor_core::enums::LineDirection::Down, extend)
    }

    /// Moves one line keeping the preferred visual column. Moving up from
    /// the first line lands on the document start, down from the last on
    /// its end.
    fn move_vertically(
        &mut self,
        direction: editor_core::enums::LineDirection,
        extend: bool,
    ) -> EditorResult<()> {
        self.leave_rect_mode()?;

        let last_line = self.line_count().saturating_sub(1);
        let mut targets = Vec::with_capacity(self.cursors.len());

        for cursor in self.cursors.iter() {
            let (line, current) = self.line_column(cursor.head)?;
            let column = cursor.preferred_column.unwrap_or(current);

            let pos = match direction {
                editor_core::enums::LineDirection::Up if line == 0 => 0,
                editor_core::enums::LineDirection::Up => self.position_at(line - 1, column)?,
                editor_core::enums::LineDirection::Down if line >= last_line => self.len(),
                editor_core::enums::LineDirection::Down => self.position_at(line + 1, column)?,
            };

            targets.push((pos, column));
        }

        for (cursor, (pos, column)) in self.cursors.iter_mut().zip(targets) {
            if extend {
                cursor.set_head(pos);
            } else {
                cursor.collapse_to(pos);
            }

            cursor.preferred_column = Some(column);
        }

        self.cursors.merge();

        Ok(())
    }
}
