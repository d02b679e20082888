//! Whole-line operations: duplicate and move the selected line blocks.

use editor_core::errors::EditorResult;

impl crate::document::Document {
    /// Closed line ranges touched by the cursors, ascending, with adjacent
    /// and overlapping blocks merged. A selection ending exactly at a line
    /// start does not include that line.
    #[must_use]
    pub fn selected_line_blocks(&self) -> Vec<(usize, usize)> {
        let mut blocks: Vec<(usize, usize)> = self
            .cursors
            .iter()
            .map(|cursor| {
                let first = self.line_index.line_of(cursor.start());
                let mut last = self.line_index.line_of(cursor.end());

                if last > first && self.line_index.line_start(last) == Some(cursor.end()) {
                    last -= 1;
                }

                (first, last)
            })
            .collect();

        blocks.sort_unstable();

        let mut merged: Vec<(usize, usize)> = Vec::with_capacity(blocks.len());

        for (first, last) in blocks {
            if let Some(prev) = merged.last_mut()
                && first <= prev.1 + 1
            {
                prev.1 = prev.1.max(last);

                continue;
            }

            merged.push((first, last));
        }

        merged
    }

    /// Byte range covering lines `first..=last`, terminator of `last` included.
    fn block_range(&self, first: usize, last: usize) -> Option<std::ops::Range<u64>> {
        Some(self.line_index.line_start(first)?..self.line_index.line_end(last)?)
    }

    /// Clones each selected line block next to itself. With
    /// [`LineDirection::Up`](editor_core::enums::LineDirection::Up) the
    /// cursors stay on the upper copy, with `Down` they follow the lower one.
    ///
    /// # Errors
    ///
    /// Propagates table errors.
    pub fn duplicate_lines(
        &mut self,
        direction: editor_core::enums::LineDirection,
    ) -> EditorResult<()> {
        let mut batch = self.begin_batch()?;
        let eol = self.line_terminator();

        for (first, last) in self.selected_line_blocks().into_iter().rev() {
            let Some(range) = self.block_range(first, last) else {
                continue;
            };

            let text = self.table.read(range.start, range.end - range.start)?;
            let terminated = text.last() == Some(&b'\n');

            // The copy always goes after the block; only cursor placement differs.
            let payload = if terminated {
                text
            } else {
                [eol, text.as_slice()].concat()
            };
            let shift = <usize as TryInto<u64>>::try_into(payload.len())?;

            self.apply_insert(&mut batch, range.end, &payload)?;

            if direction == editor_core::enums::LineDirection::Down {
                // Membership goes by the selection start, so a selection
                // ending on the next line start moves as a whole.
                for cursor in self.cursors.iter_mut() {
                    let start = cursor.start();
                    let inside = start < range.end || (!terminated && start == range.end);

                    if start >= range.start && inside {
                        cursor.anchor += shift;
                        cursor.head += shift;
                    }
                }
            }
        }

        self.commit(batch)
    }

    /// Swaps each selected line block with its neighbour above or below.
    /// Returns `false` (and changes nothing) when any block already touches
    /// the document edge in that direction.
    ///
    /// # Errors
    ///
    /// Propagates table errors.
    pub fn move_lines(
        &mut self,
        direction: editor_core::enums::LineDirection,
    ) -> EditorResult<bool> {
        self.leave_rect_mode()?;

        let blocks = self.selected_line_blocks();
        let last_line = self.line_count().saturating_sub(1);
        let blocked = match direction {
            editor_core::enums::LineDirection::Up => {
                blocks.iter().any(|&(first, _)| first == 0)
            }
            editor_core::enums::LineDirection::Down => {
                blocks.iter().any(|&(_, last)| last >= last_line)
            }
        };

        if blocks.is_empty() || blocked {
            return Ok(false);
        }

        let mut batch = self.begin_batch()?;
        let ordered: Vec<(usize, usize)> = match direction {
            editor_core::enums::LineDirection::Up => blocks,
            editor_core::enums::LineDirection::Down => blocks.into_iter().rev().collect(),
        };

        // Each swap keeps its region's length and line count, so the line
        // index stays valid for the regions not yet processed.
        for (first, last) in ordered {
            let (upper, lower) = match direction {
                editor_core::enums::LineDirection::Up => ((first - 1, first - 1), (first, last)),
                editor_core::enums::LineDirection::Down => ((first, last), (last + 1, last + 1)),
            };

            self.swap_adjacent_blocks(&mut batch, upper, lower, direction)?;
        }

        self.commit(batch)?;

        Ok(true)
    }

    /// Rewrites `upper ++ lower` as `lower ++ upper`, keeping the number of
    /// line terminators, and carries the moving block's cursors along.
    fn swap_adjacent_blocks(
        &mut self,
        batch: &mut editor_core::history::EditBatch,
        upper: (usize, usize),
        lower: (usize, usize),
        direction: editor_core::enums::LineDirection,
    ) -> EditorResult<()> {
        let (Some(upper_range), Some(lower_range)) = (
            self.block_range(upper.0, upper.1),
            self.block_range(lower.0, lower.1),
        ) else {
            return Ok(());
        };

        let start = upper_range.start;
        let middle = upper_range.end;
        let end = lower_range.end;

        let mut upper_text = self.table.read(start, middle - start)?;
        let mut lower_text = self.table.read(middle, end - middle)?;

        // The lower block is the document's last line without a terminator:
        // hand it the upper block's terminator.
        if lower_text.last() != Some(&b'\n') {
            let eol_len = if upper_text.ends_with(b"\r\n") { 2 } else { 1 };
            let eol = upper_text.split_off(upper_text.len() - eol_len);

            lower_text.extend_from_slice(&eol);
        }

        let lower_len = <usize as TryInto<u64>>::try_into(lower_text.len())?;
        let upper_len = middle - start;
        let snapshot = self.cursors.snapshot();
        let replacement = [lower_text, upper_text].concat();

        self.apply_erase(batch, start, end - start)?;
        self.apply_insert(batch, start, &replacement)?;

        let map = |p: u64| match direction {
            editor_core::enums::LineDirection::Down if p >= start && p <= middle => {
                (p + lower_len).min(end)
            }
            editor_core::enums::LineDirection::Up if p >= middle && p <= end => p - upper_len,
            _ => p,
        };

        let moved = snapshot
            .into_iter()
            .map(|cursor| {
                editor_core::cursor::Cursor::new_selection(map(cursor.anchor), map(cursor.head))
            })
            .collect();

        self.cursors.replace(moved);

        Ok(())
    }
}

#[cfg(test)]
mod lines_tests {
    use crate::config::EditorConfig;
    use crate::document::Document;
    use editor_core::cursor::Cursor;
    use editor_core::enums::LineDirection;

    fn doc_with(text: &str, cursors: Vec<Cursor>) -> Document {
        let mut document = Document::from_text(text, EditorConfig::default()).unwrap();

        document.cursors.replace(cursors);
        document
    }

    #[test]
    fn blocks_exclude_trailing_line_start_and_merge_neighbours() {
        let document = doc_with(
            "a\nb\nc\nd\ne\n",
            vec![Cursor::new_selection(0, 4), Cursor::new(4), Cursor::new(8)],
        );

        // Lines 0-1 from the selection, line 2 from the caret (merged), line 4 alone.
        assert_eq!(document.selected_line_blocks(), vec![(0, 2), (4, 4)]);
    }

    #[test]
    fn duplicate_down_moves_cursor_to_copy() {
        let mut document = doc_with("one\ntwo\n", vec![Cursor::new(1)]);

        document.duplicate_lines(LineDirection::Down).unwrap();

        assert_eq!(document.text(), "one\none\ntwo\n");
        assert_eq!(document.primary().head, 5);
    }

    #[test]
    fn duplicate_down_moves_full_line_selection() {
        let mut document = doc_with("one\ntwo\n", vec![Cursor::new_selection(0, 4)]);

        document.duplicate_lines(LineDirection::Down).unwrap();

        assert_eq!(document.text(), "one\none\ntwo\n");
        assert_eq!(document.primary().range(), 4..8);
    }

    #[test]
    fn duplicate_up_keeps_cursor_on_upper_copy() {
        let mut document = doc_with("one\ntwo\n", vec![Cursor::new(5)]);

        document.duplicate_lines(LineDirection::Up).unwrap();

        assert_eq!(document.text(), "one\ntwo\ntwo\n");
        assert_eq!(document.primary().head, 5);
    }

    #[test]
    fn duplicate_last_line_without_terminator() {
        let mut document = doc_with("a\r\nlast", vec![Cursor::new(7)]);

        document.duplicate_lines(LineDirection::Down).unwrap();

        assert_eq!(document.text(), "a\r\nlast\r\nlast");
        assert_eq!(document.primary().head, 13);

        document.undo().unwrap();
        assert_eq!(document.text(), "a\r\nlast");
    }

    #[test]
    fn move_down_and_up_round_trip() {
        let mut document = doc_with("1\n2\n3\n", vec![Cursor::new(0)]);

        assert!(document.move_lines(LineDirection::Down).unwrap());
        assert_eq!(document.text(), "2\n1\n3\n");
        assert_eq!(document.primary().head, 2);

        assert!(document.move_lines(LineDirection::Up).unwrap());
        assert_eq!(document.text(), "1\n2\n3\n");
        assert_eq!(document.primary().head, 0);
    }

    #[test]
    fn move_into_unterminated_last_line_keeps_terminator_count() {
        let mut document = doc_with("a\nb\nc", vec![Cursor::new_selection(2, 3)]);

        assert!(document.move_lines(LineDirection::Down).unwrap());
        assert_eq!(document.text(), "a\nc\nb");
        assert_eq!(document.primary(), Cursor::new_selection(4, 5));

        assert!(!document.move_lines(LineDirection::Down).unwrap());

        assert!(document.move_lines(LineDirection::Up).unwrap());
        assert_eq!(document.text(), "a\nb\nc");
        assert_eq!(document.primary(), Cursor::new_selection(2, 3));
    }

    #[test]
    fn move_at_edge_is_skipped_entirely() {
        let mut document = doc_with("x\ny\nz", vec![Cursor::new(0), Cursor::new(4)]);

        assert!(!document.move_lines(LineDirection::Up).unwrap());
        assert_eq!(document.text(), "x\ny\nz");
        assert_eq!(document.history().depth(), 0);
    }

    #[test]
    fn move_two_blocks_down_in_one_batch() {
        let mut document = doc_with("a\nb\nc\nd\ne", vec![Cursor::new(0), Cursor::new(4)]);

        assert!(document.move_lines(LineDirection::Down).unwrap());
        assert_eq!(document.text(), "b\na\nd\nc\ne");
        assert_eq!(document.cursors().heads(), vec![2, 6]);
        assert_eq!(document.history().depth(), 1);
    }
}
