use editor_core::errors::EditorResult;

/// Diagonal of an active rectangular selection, in lines and visual columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RectSelection {
    pub anchor_line: usize,
    pub anchor_column: u32,
    pub head_line: usize,
    pub head_column: u32,
}

impl RectSelection {
    #[must_use]
    pub fn lines(&self) -> std::ops::RangeInclusive<usize> {
        self.anchor_line.min(self.head_line)..=self.anchor_line.max(self.head_line)
    }

    #[must_use]
    pub fn left(&self) -> u32 {
        self.anchor_column.min(self.head_column)
    }

    #[must_use]
    pub fn right(&self) -> u32 {
        self.anchor_column.max(self.head_column)
    }
}

/// One open document: the text, its cursors and its history.
///
/// Every content change goes through a batch: ops are applied to the table
/// as they are recorded, other cursors are shifted, and the whole batch is
/// pushed to the undo manager in one piece. The line index is rebuilt once
/// per committed batch.
#[derive(Debug)]
pub struct Document {
    pub(crate) table: editor_core::piece_table::table::PieceTable,
    pub(crate) line_index: editor_core::line_index::LineIndex,
    pub(crate) history: editor_core::history::UndoManager,
    pub(crate) cursors: editor_core::cursor::CursorSet,

    /// Virtual-space inserts applied to the table but not yet in history.
    pub(crate) pending_padding: Option<editor_core::history::EditBatch>,
    pub(crate) rect: Option<RectSelection>,

    pub(crate) config: crate::config::EditorConfig,
    pub(crate) columns: Box<dyn editor_core::columns::ColumnMetrics>,

    /// The file path, if this document is tied to a file on disk.
    path: Option<std::path::PathBuf>,
    /// Tracks if the document has unsaved changes.
    is_dirty: bool,
}

/*

==================================
===== CREATION, OPEN, & SAVE =====
==================================

*/

impl Document {
    fn from_source(
        source: io::source::SharedBytes,
        config: crate::config::EditorConfig,
    ) -> EditorResult<Self> {
        let table = editor_core::piece_table::table::PieceTable::new(source)?;
        let line_index = editor_core::line_index::LineIndex::build(&table)?;

        Ok(Self {
            table,
            line_index,
            history: editor_core::history::UndoManager::new(config.undo_limit),
            cursors: editor_core::cursor::CursorSet::default(),
            pending_padding: None,
            rect: None,
            columns: Box::new(config.columns()),
            config,
            path: None,
            is_dirty: false,
        })
    }

    /// An empty, untitled document.
    ///
    /// # Errors
    ///
    /// Infallible in practice; kept fallible like the other constructors.
    pub fn new(config: crate::config::EditorConfig) -> EditorResult<Self> {
        Self::from_source(io::source::SharedBytes::empty(), config)
    }

    /// An untitled document holding `text`.
    ///
    /// # Errors
    ///
    /// Infallible in practice; kept fallible like the other constructors.
    pub fn from_text(text: &str, config: crate::config::EditorConfig) -> EditorResult<Self> {
        Self::from_source(io::source::SharedBytes::from(text), config)
    }

    /// Maps `path` read-only and uses it as the original buffer.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or mapped.
    pub fn open(
        path: impl AsRef<std::path::Path>,
        config: crate::config::EditorConfig,
    ) -> EditorResult<Self> {
        let path = path.as_ref();
        let mut document = Self::from_source(io::source::SharedBytes::open(path)?, config)?;

        document.path = Some(path.to_path_buf());

        tracing::debug!(
            path = %path.display(),
            len = document.len(),
            lines = document.line_count(),
            "opened document"
        );

        Ok(document)
    }

    /// Replaces the column measuring policy.
    #[must_use]
    pub fn with_columns(mut self, columns: Box<dyn editor_core::columns::ColumnMetrics>) -> Self {
        self.columns = columns;
        self
    }

    /// Saves the document to its current filepath.
    ///
    /// # Errors
    ///
    /// Fails with [`std::io::ErrorKind::NotFound`] if the document has never
    /// been given a path, or with the underlying I/O error.
    pub fn save(&mut self) -> EditorResult<()> {
        let Some(path) = self.path.clone() else {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "document has no file path; use save_as",
            )
            .into());
        };

        self.save_as(path)
    }

    /// Writes every piece to a temporary file next to `path`, renames it over
    /// `path`, then re-opens the result as the original buffer. Undo history
    /// survives; the current depth becomes the save point.
    ///
    /// Pending virtual-space padding is rolled back first; it is never written.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error. The document is unchanged on failure.
    pub fn save_as(&mut self, path: impl AsRef<std::path::Path>) -> EditorResult<()> {
        let path = path.as_ref();

        self.leave_rect_mode()?;

        let written = io::save::write_atomic(path, self.table.chunks())?;
        let source = io::source::SharedBytes::open(path)?;

        self.table.reset_to(source)?;
        self.history.mark_saved();
        self.path = Some(path.to_path_buf());
        self.refresh()?;

        tracing::info!(path = %path.display(), bytes = written, "saved document");

        Ok(())
    }
}

/*

==========================
===== INLINE METHODS =====
==========================

*/

impl Document {
    #[inline]
    #[must_use]
    pub fn len(&self) -> u64 {
        self.table.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.line_index.line_count()
    }

    #[inline]
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.is_dirty
    }

    #[inline]
    #[must_use]
    pub fn path(&self) -> Option<&std::path::Path> {
        self.path.as_deref()
    }

    #[inline]
    #[must_use]
    pub fn table(&self) -> &editor_core::piece_table::table::PieceTable {
        &self.table
    }

    #[inline]
    #[must_use]
    pub fn line_index(&self) -> &editor_core::line_index::LineIndex {
        &self.line_index
    }

    #[inline]
    #[must_use]
    pub fn history(&self) -> &editor_core::history::UndoManager {
        &self.history
    }

    #[inline]
    #[must_use]
    pub fn cursors(&self) -> &editor_core::cursor::CursorSet {
        &self.cursors
    }

    #[inline]
    #[must_use]
    pub fn primary(&self) -> editor_core::cursor::Cursor {
        self.cursors.primary()
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &crate::config::EditorConfig {
        &self.config
    }

    #[inline]
    #[must_use]
    pub fn rect_selection(&self) -> Option<RectSelection> {
        self.rect
    }

    #[inline]
    #[must_use]
    pub fn has_pending_padding(&self) -> bool {
        self.pending_padding.is_some()
    }
}

/*

===========================
========= GETTERS =========
===========================

*/

impl Document {
    /// Lossy UTF-8 copy of the whole document.
    #[must_use]
    pub fn text(&self) -> String {
        self.table.to_string_lossy()
    }

    /// # Errors
    ///
    /// Propagates table read errors.
    pub fn bytes(&self) -> EditorResult<Vec<u8>> {
        self.table.read_all()
    }

    /// Content of `line` without its terminator, with its start offset.
    ///
    /// # Errors
    ///
    /// [`editor_core::errors::EditorError::OutOfRange`] if `line` does not exist.
    pub fn line_content(&self, line: usize) -> EditorResult<(u64, Vec<u8>)> {
        let range = self
            .line_index
            .content_range(line, &self.table)
            .ok_or_else(|| {
                editor_core::errors::EditorError::out_of_range(
                    line as u64,
                    self.line_count() as u64,
                )
            })?;

        Ok((range.start, self.table.read(range.start, range.end - range.start)?))
    }

    /// Line and visual column of `pos`.
    ///
    /// # Errors
    ///
    /// Propagates table read errors.
    pub fn line_column(&self, pos: u64) -> EditorResult<(usize, u32)> {
        let pos = pos.min(self.len());
        let line = self.line_index.line_of(pos);
        let (start, content) = self.line_content(line)?;
        let offset = <u64 as TryInto<usize>>::try_into(pos.saturating_sub(start))?;

        Ok((line, self.columns.column_of(&content, offset.min(content.len()))))
    }

    /// Byte position for a line and visual column. Lines past the end clamp
    /// to the last line; columns past the end of a line clamp to its end.
    ///
    /// # Errors
    ///
    /// Propagates table read errors.
    pub fn position_at(&self, line: usize, column: u32) -> EditorResult<u64> {
        let line = line.min(self.line_count().saturating_sub(1));
        let (start, content) = self.line_content(line)?;
        let offset = self.columns.offset_of(&content, column);

        Ok(start + <usize as TryInto<u64>>::try_into(offset)?)
    }

    /// Terminator used when a line break has to be synthesized: `\r\n` if
    /// the first line ends that way, `\n` otherwise.
    #[must_use]
    pub(crate) fn line_terminator(&self) -> &'static [u8] {
        match self.line_index.line_end(0) {
            Some(end)
                if end >= 2
                    && self.table.byte_at(end - 2) == Some(b'\r')
                    && self.table.byte_at(end - 1) == Some(b'\n') =>
            {
                b"\r\n"
            }
            _ => b"\n",
        }
    }
}

/*

=====================================
========= BATCH PROTOCOL ============
=====================================

*/

impl Document {
    /// Starts a new logical edit: folds any pending padding into history and
    /// snapshots the cursors.
    pub(crate) fn begin_batch(&mut self) -> EditorResult<editor_core::history::EditBatch> {
        self.commit_padding()?;
        self.rect = None;
        self.cursors.clamp(self.len());
        self.cursors.merge();

        Ok(editor_core::history::EditBatch::new(self.cursors.snapshot()))
    }

    /// Erases `count` bytes at `pos`, records the op and pulls later cursors back.
    pub(crate) fn apply_erase(
        &mut self,
        batch: &mut editor_core::history::EditBatch,
        pos: u64,
        count: u64,
    ) -> EditorResult<()> {
        if count == 0 {
            return Ok(());
        }

        let text = self.table.read(pos, count)?;

        self.table.erase(pos, count)?;
        self.cursors.adjust_for_erase(pos, count);
        batch.ops.push(editor_core::history::EditOp::erase(pos, text));

        Ok(())
    }

    /// Inserts `bytes` at `pos`, records the op and pushes later cursors forward.
    pub(crate) fn apply_insert(
        &mut self,
        batch: &mut editor_core::history::EditBatch,
        pos: u64,
        bytes: &[u8],
    ) -> EditorResult<()> {
        if bytes.is_empty() {
            return Ok(());
        }

        self.table.insert(pos, bytes)?;
        self.cursors
            .adjust_for_insert(pos, <usize as TryInto<u64>>::try_into(bytes.len())?);
        batch
            .ops
            .push(editor_core::history::EditOp::insert(pos, bytes.to_vec()));

        Ok(())
    }

    /// Finishes a batch. Empty batches leave history untouched.
    pub(crate) fn commit(
        &mut self,
        mut batch: editor_core::history::EditBatch,
    ) -> EditorResult<()> {
        self.cursors.clamp(self.len());
        self.cursors.merge();

        if batch.is_empty() {
            return Ok(());
        }

        batch.cursors_after = self.cursors.snapshot();

        tracing::debug!(
            ops = batch.ops.len(),
            cursors = batch.cursors_after.len(),
            "committed edit batch"
        );

        self.history.push(batch);
        self.refresh()
    }

    /// Rebuilds derived state after the table changed.
    pub(crate) fn refresh(&mut self) -> EditorResult<()> {
        self.line_index.rebuild(&self.table)?;
        self.is_dirty = self.history.is_modified();

        Ok(())
    }
}

/*

===============================
========= UNDO & REDO =========
===============================

*/

impl Document {
    /// Reverts the newest batch. Returns `false` when there is nothing to undo.
    ///
    /// # Errors
    ///
    /// Propagates table errors.
    pub fn undo(&mut self) -> EditorResult<bool> {
        self.leave_rect_mode()?;

        let Some(batch) = self.history.undo() else {
            return Ok(false);
        };

        batch.undo_on(&mut self.table)?;
        self.cursors.replace(batch.cursors_before.clone());
        self.refresh()?;

        tracing::debug!(depth = self.history.depth(), "undo");

        Ok(true)
    }

    /// Re-applies the newest undone batch. Returns `false` when there is
    /// nothing to redo.
    ///
    /// # Errors
    ///
    /// Propagates table errors.
    pub fn redo(&mut self) -> EditorResult<bool> {
        self.leave_rect_mode()?;

        let Some(batch) = self.history.redo() else {
            return Ok(false);
        };

        batch.redo_on(&mut self.table)?;
        self.cursors.replace(batch.cursors_after.clone());
        self.refresh()?;

        tracing::debug!(depth = self.history.depth(), "redo");

        Ok(true)
    }
}

impl std::fmt::Display for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for chunk in self.table.chunks() {
            f.write_str(&String::from_utf8_lossy(chunk))?;
        }

        Ok(())
    }
}
