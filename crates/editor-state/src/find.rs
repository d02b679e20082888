//! Find and replace driven by a [`SearchQuery`].
//!
//! An invalid regex never errors out of these methods: the engine logs it
//! and behaves as if nothing matched.
//!
//! [`SearchQuery`]: editor_core::search::SearchQuery

use editor_core::errors::EditorResult;
use editor_core::search::{SearchEngine, SearchMatch, SearchQuery};

impl crate::document::Document {
    /// Selects the next match in `direction` as the single cursor. Forward
    /// search starts at the end of the primary selection, backward at its
    /// start. The cursors are untouched when nothing matches.
    ///
    /// # Errors
    ///
    /// Propagates table read errors.
    pub fn find_next(
        &mut self,
        query: &SearchQuery,
        direction: editor_core::enums::Direction,
    ) -> EditorResult<Option<SearchMatch>> {
        self.leave_rect_mode()?;

        let engine = SearchEngine::new(query.clone());

        self.select_match_from(&engine, direction)
    }

    fn select_match_from(
        &mut self,
        engine: &SearchEngine,
        direction: editor_core::enums::Direction,
    ) -> EditorResult<Option<SearchMatch>> {
        let primary = self.cursors.primary();
        let start = match direction {
            editor_core::enums::Direction::Forward => primary.end(),
            editor_core::enums::Direction::Backward => primary.start(),
        };

        let found = engine.find(&self.table, start, direction)?;

        if let Some(found) = &found {
            self.cursors.set_single(editor_core::cursor::Cursor::new_selection(
                found.range.start,
                found.range.end,
            ));
        }

        Ok(found)
    }

    /// Replaces the primary selection if it is exactly a match, then selects
    /// the following match. Without an exact match this only advances.
    /// Returns the newly selected match.
    ///
    /// # Errors
    ///
    /// Propagates table errors.
    pub fn replace_next(
        &mut self,
        query: &SearchQuery,
        replacement: &str,
    ) -> EditorResult<Option<SearchMatch>> {
        self.leave_rect_mode()?;

        let engine = SearchEngine::new(query.clone());
        let primary = self.cursors.primary();

        if let Some(found) = engine.match_exactly(&self.table, primary.range())? {
            let bytes = engine.expand_replacement(&self.table, &found, replacement)?;
            let end = found.range.start + <usize as TryInto<u64>>::try_into(bytes.len())?;
            let mut batch = self.begin_batch()?;

            self.cursors
                .set_single(editor_core::cursor::Cursor::new(found.range.start));
            self.apply_erase(&mut batch, found.range.start, found.len())?;
            self.apply_insert(&mut batch, found.range.start, &bytes)?;
            self.cursors.set_single(editor_core::cursor::Cursor::new(end));
            self.commit(batch)?;
        }

        self.select_match_from(&engine, editor_core::enums::Direction::Forward)
    }

    /// Replaces every non-overlapping match in one batch and returns how
    /// many there were.
    ///
    /// # Errors
    ///
    /// Propagates table errors.
    pub fn replace_all(&mut self, query: &SearchQuery, replacement: &str) -> EditorResult<usize> {
        let engine = SearchEngine::new(query.clone());
        let mut batch = self.begin_batch()?;
        let replacements = engine.replacements(&self.table, replacement)?;

        // Back to front, so pending match offsets stay valid.
        for (found, bytes) in replacements.iter().rev() {
            self.apply_erase(&mut batch, found.range.start, found.len())?;
            self.apply_insert(&mut batch, found.range.start, bytes)?;
        }

        tracing::debug!(pattern = %query.pattern, count = replacements.len(), "replace all");

        self.commit(batch)?;

        Ok(replacements.len())
    }

    /// # Errors
    ///
    /// Propagates table read errors.
    pub fn count_matches(&self, query: &SearchQuery) -> EditorResult<usize> {
        Ok(SearchEngine::new(query.clone()).find_all(&self.table)?.len())
    }
}

#[cfg(test)]
mod find_tests {
    use crate::config::EditorConfig;
    use crate::document::Document;
    use editor_core::cursor::Cursor;
    use editor_core::enums::Direction;
    use editor_core::search::SearchQuery;

    fn doc(text: &str) -> Document {
        Document::from_text(text, EditorConfig::default()).unwrap()
    }

    #[test]
    fn replace_all_grows_every_match() {
        let mut document = doc("aaa");

        let count = document.replace_all(&SearchQuery::literal("a"), "bb").unwrap();

        assert_eq!(count, 3);
        assert_eq!(document.text(), "bbbbbb");
        assert_eq!(document.history().depth(), 1);

        document.undo().unwrap();
        assert_eq!(document.text(), "aaa");
    }

    #[test]
    fn replace_all_without_matches_is_not_recorded() {
        let mut document = doc("abc");

        assert_eq!(document.replace_all(&SearchQuery::literal("z"), "y").unwrap(), 0);
        assert_eq!(document.history().depth(), 0);
        assert!(!document.is_dirty());
    }

    #[test]
    fn replace_all_regex_with_groups_and_escapes() {
        let mut document = doc("key=1\nname=two\n");

        let count = document
            .replace_all(&SearchQuery::regex(r"^(\w+)=(\w+)$"), r"$2\t$1")
            .unwrap();

        assert_eq!(count, 2);
        assert_eq!(document.text(), "1\tkey\ntwo\tname\n");
    }

    #[test]
    fn replace_all_inserts_at_zero_length_matches() {
        let mut document = doc("a\nb\n");

        let count = document.replace_all(&SearchQuery::regex("^"), "> ").unwrap();

        assert_eq!(count, 3);
        assert_eq!(document.text(), "> a\n> b\n> ");
        assert_eq!(document.count_matches(&SearchQuery::regex("^")).unwrap(), 0);
    }

    #[test]
    fn invalid_regex_is_no_match() {
        let mut document = doc("(((");
        let query = SearchQuery::regex("(");

        assert_eq!(document.count_matches(&query).unwrap(), 0);
        assert_eq!(document.replace_all(&query, "x").unwrap(), 0);
        assert_eq!(document.find_next(&query, Direction::Forward).unwrap(), None);
        assert_eq!(document.text(), "(((");
    }

    #[test]
    fn find_next_selects_and_wraps() {
        let mut document = doc("one two one");
        let query = SearchQuery::literal("one");

        let first = document.find_next(&query, Direction::Forward).unwrap().unwrap();
        assert_eq!(first.range, 0..3);
        assert_eq!(document.primary(), Cursor::new_selection(0, 3));

        let second = document.find_next(&query, Direction::Forward).unwrap().unwrap();
        assert_eq!(second.range, 8..11);

        let wrapped = document.find_next(&query, Direction::Forward).unwrap().unwrap();
        assert_eq!(wrapped.range, 0..3);

        let back = document.find_next(&query, Direction::Backward).unwrap().unwrap();
        assert_eq!(back.range, 8..11);
    }

    #[test]
    fn find_next_whole_word() {
        let mut document = doc("concatenate cat scatter");
        let query = SearchQuery::literal("cat").whole_word(true);

        assert_eq!(document.count_matches(&query).unwrap(), 1);
        assert_eq!(
            document.find_next(&query, Direction::Forward).unwrap().map(|m| m.range),
            Some(12..15)
        );
    }

    #[test]
    fn replace_next_replaces_only_exact_selection() {
        let mut document = doc("cat dog cat");
        let query = SearchQuery::literal("cat");

        // Caret only: advances to the first match without replacing.
        let selected = document.replace_next(&query, "cow").unwrap();
        assert_eq!(selected.map(|m| m.range), Some(0..3));
        assert_eq!(document.text(), "cat dog cat");

        let selected = document.replace_next(&query, "cow").unwrap();
        assert_eq!(document.text(), "cow dog cat");
        assert_eq!(selected.map(|m| m.range), Some(8..11));

        let selected = document.replace_next(&query, "cow").unwrap();
        assert_eq!(document.text(), "cow dog cow");
        assert_eq!(selected, None);
        assert_eq!(document.primary(), Cursor::new(11));

        assert_eq!(document.history().depth(), 2);
    }

    #[test]
    fn case_insensitive_count() {
        let document = doc("Foo foo FOO");

        assert_eq!(document.count_matches(&SearchQuery::literal("foo")).unwrap(), 1);
        assert_eq!(
            document
                .count_matches(&SearchQuery::literal("foo").match_case(false))
                .unwrap(),
            3
        );
    }
}
