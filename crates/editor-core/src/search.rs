//! Literal and regex search over a [`PieceTable`].
//!
//! Literal search streams the document through fixed-size windows with
//! `memchr::memmem`, so a match never needs the whole file in memory.
//! Regex search runs `regex::bytes` over the materialized document.
//!
//! [`PieceTable`]: crate::piece_table::table::PieceTable

use memchr::memmem::{Finder, FinderRev};

/// Candidate start positions examined per literal window.
const SEARCH_WINDOW: u64 = 256 * 1024;

/// Sequences that visually fuse with the glyph before them. A literal match
/// immediately followed by one of these is rejected.
const ZWJ: &[u8] = &[0xE2, 0x80, 0x8D];
const VS16: &[u8] = &[0xEF, 0xB8, 0x8F];
const SKIN_TONE_PREFIX: &[u8] = &[0xF0, 0x9F, 0x8F];

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchQuery {
    pub pattern: String,
    pub match_case: bool,
    pub whole_word: bool,
    pub regex: bool,
}

impl SearchQuery {
    #[must_use]
    pub fn literal(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            match_case: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn regex(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            match_case: true,
            regex: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn match_case(mut self, on: bool) -> Self {
        self.match_case = on;
        self
    }

    #[must_use]
    pub fn whole_word(mut self, on: bool) -> Self {
        self.whole_word = on;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchMatch {
    pub range: std::ops::Range<u64>,
}

impl SearchMatch {
    #[inline]
    #[must_use]
    pub fn len(&self) -> u64 {
        self.range.end - self.range.start
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }
}

#[derive(Debug)]
enum Matcher {
    /// Needle is ASCII-lowercased when the query ignores case.
    Literal {
        finder: Finder<'static>,
        finder_rev: FinderRev<'static>,
    },
    Regex(regex::bytes::Regex),
    /// Empty or uncompilable pattern; never matches.
    Never,
}

/// A compiled [`SearchQuery`].
#[derive(Debug)]
pub struct SearchEngine {
    query: SearchQuery,
    matcher: Matcher,
    window: u64,
}

/*

====================================
========= CREATION METHOD ==========
====================================

*/

impl SearchEngine {
    /// Compiles `query`, reporting a malformed regex.
    ///
    /// # Errors
    ///
    /// [`crate::errors::EditorError::InvalidPattern`] if the regex does not
    /// compile.
    pub fn compile(query: SearchQuery) -> crate::errors::EditorResult<Self> {
        let matcher = if query.pattern.is_empty() {
            Matcher::Never
        } else if !query.regex && !query.match_case && !query.pattern.is_ascii() {
            // Unicode case folding changes byte lengths; the window scan only folds ASCII.
            Matcher::Regex(
                regex::bytes::RegexBuilder::new(&regex::escape(&query.pattern))
                    .case_insensitive(true)
                    .build()?,
            )
        } else if query.regex {
            Matcher::Regex(
                regex::bytes::RegexBuilder::new(&query.pattern)
                    .case_insensitive(!query.match_case)
                    .multi_line(true)
                    .build()?,
            )
        } else {
            let needle = if query.match_case {
                query.pattern.as_bytes().to_vec()
            } else {
                query.pattern.as_bytes().to_ascii_lowercase()
            };

            Matcher::Literal {
                finder: Finder::new(&needle).into_owned(),
                finder_rev: FinderRev::new(&needle).into_owned(),
            }
        };

        Ok(Self {
            query,
            matcher,
            window: SEARCH_WINDOW,
        })
    }

    /// Like [`SearchEngine::compile`], but an invalid pattern is logged and
    /// yields an engine that never matches.
    #[must_use]
    pub fn new(query: SearchQuery) -> Self {
        match Self::compile(query.clone()) {
            Ok(engine) => engine,
            Err(err) => {
                tracing::warn!(pattern = %query.pattern, %err, "invalid search pattern");

                Self {
                    query,
                    matcher: Matcher::Never,
                    window: SEARCH_WINDOW,
                }
            }
        }
    }

    #[inline]
    #[must_use]
    pub fn query(&self) -> &SearchQuery {
        &self.query
    }

    #[cfg(test)]
    fn with_window(mut self, window: u64) -> Self {
        self.window = window.max(1);
        self
    }
}

/*

==========================
========= FIND ===========
==========================

*/

impl SearchEngine {
    /// Next match from `start` in `direction`, wrapping around the document
    /// once. Backward search returns the rightmost match starting strictly
    /// before `start`, or wraps to the last match.
    ///
    /// # Errors
    ///
    /// Propagates table read errors.
    pub fn find(
        &self,
        table: &crate::piece_table::table::PieceTable,
        start: u64,
        direction: crate::enums::Direction,
    ) -> crate::errors::EditorResult<Option<SearchMatch>> {
        let start = start.min(table.len());
        let len = table.len();

        let range = match (&self.matcher, direction) {
            (Matcher::Never, _) => None,
            (Matcher::Literal { finder, .. }, crate::enums::Direction::Forward) => {
                match self.literal_forward(table, finder, start, len)? {
                    Some(range) => Some(range),
                    None => self.literal_forward(table, finder, 0, start)?,
                }
            }
            (Matcher::Literal { finder_rev, .. }, crate::enums::Direction::Backward) => {
                match self.literal_backward(table, finder_rev, 0, start)? {
                    Some(range) => Some(range),
                    None => self.literal_backward(table, finder_rev, start, len)?,
                }
            }
            (Matcher::Regex(re), crate::enums::Direction::Forward) => {
                let hay = table.read_all()?;

                match self.regex_forward(re, &hay, start, usize::MAX)? {
                    Some(range) => Some(range),
                    None => {
                        let start = <u64 as TryInto<usize>>::try_into(start)?;

                        self.regex_forward(re, &hay, 0, start)?
                    }
                }
            }
            (Matcher::Regex(re), crate::enums::Direction::Backward) => {
                let hay = table.read_all()?;
                let all = self.regex_all(re, &hay, false)?;

                all.iter()
                    .rev()
                    .find(|r| r.start < start)
                    .or(all.last())
                    .cloned()
            }
        };

        Ok(range.map(|range| SearchMatch { range }))
    }

    /// Every non-overlapping match in ascending order.
    ///
    /// # Errors
    ///
    /// Propagates table read errors.
    pub fn find_all(
        &self,
        table: &crate::piece_table::table::PieceTable,
    ) -> crate::errors::EditorResult<Vec<SearchMatch>> {
        let ranges = match &self.matcher {
            Matcher::Never => Vec::new(),
            Matcher::Literal { finder, .. } => {
                let mut ranges = Vec::new();
                let mut pos = 0;

                while let Some(range) = self.literal_forward(table, finder, pos, table.len())? {
                    pos = range.end;
                    ranges.push(range);
                }

                ranges
            }
            Matcher::Regex(re) => self.regex_all(re, &table.read_all()?, false)?,
        };

        Ok(ranges.into_iter().map(|range| SearchMatch { range }).collect())
    }

    /// The match that spans exactly `range`, if any.
    ///
    /// # Errors
    ///
    /// Propagates table read errors.
    pub fn match_exactly(
        &self,
        table: &crate::piece_table::table::PieceTable,
        range: std::ops::Range<u64>,
    ) -> crate::errors::EditorResult<Option<SearchMatch>> {
        if range.is_empty() || range.end > table.len() {
            return Ok(None);
        }

        let found = match &self.matcher {
            Matcher::Never => None,
            Matcher::Literal { finder, .. } => {
                let needle_len = <usize as TryInto<u64>>::try_into(finder.needle().len())?;

                if range.end - range.start == needle_len {
                    self.literal_forward(table, finder, range.start, range.start + 1)?
                } else {
                    None
                }
            }
            Matcher::Regex(re) => {
                let hay = table.read_all()?;
                let at = <u64 as TryInto<usize>>::try_into(range.start)?;

                self.regex_forward(re, &hay, range.start, at.saturating_add(1))?
            }
        };

        Ok(found
            .filter(|found| *found == range)
            .map(|range| SearchMatch { range }))
    }

    /// Every match paired with its expanded replacement text, ascending.
    ///
    /// # Errors
    ///
    /// Propagates table read errors.
    pub fn replacements(
        &self,
        table: &crate::piece_table::table::PieceTable,
        replacement: &str,
    ) -> crate::errors::EditorResult<Vec<(SearchMatch, Vec<u8>)>> {
        let unescaped = unescape_replacement(replacement);

        match &self.matcher {
            Matcher::Regex(re) if self.query.regex => {
                let hay = table.read_all()?;
                let mut res = Vec::new();

                // Zero-length hits count here: `^` and `$` insert at every line edge.
                for range in self.regex_all(re, &hay, true)? {
                    let bytes = self.expand_at(re, &hay, &range, &unescaped)?;

                    res.push((SearchMatch { range }, bytes));
                }

                Ok(res)
            }
            _ => Ok(self
                .find_all(table)?
                .into_iter()
                .map(|m| (m, unescaped.clone().into_bytes()))
                .collect()),
        }
    }

    /// Replacement bytes for one match: escapes are always unescaped, capture
    /// groups are only substituted in regex mode.
    ///
    /// # Errors
    ///
    /// Propagates table read errors.
    pub fn expand_replacement(
        &self,
        table: &crate::piece_table::table::PieceTable,
        found: &SearchMatch,
        replacement: &str,
    ) -> crate::errors::EditorResult<Vec<u8>> {
        let unescaped = unescape_replacement(replacement);

        match &self.matcher {
            Matcher::Regex(re) if self.query.regex => {
                self.expand_at(re, &table.read_all()?, &found.range, &unescaped)
            }
            _ => Ok(unescaped.into_bytes()),
        }
    }
}

/*

=====================================
========= LITERAL SCANNING ==========
=====================================

*/

impl SearchEngine {
    fn prepare_window(
        &self,
        table: &crate::piece_table::table::PieceTable,
        pos: u64,
        count: u64,
    ) -> crate::errors::EditorResult<Vec<u8>> {
        let mut window = table.read(pos, count)?;

        if !self.query.match_case {
            window.make_ascii_lowercase();
        }

        Ok(window)
    }

    /// First acceptable match whose start lies in `from..until`.
    fn literal_forward(
        &self,
        table: &crate::piece_table::table::PieceTable,
        finder: &Finder<'_>,
        from: u64,
        until: u64,
    ) -> crate::errors::EditorResult<Option<std::ops::Range<u64>>> {
        let len = table.len();
        let n = <usize as TryInto<u64>>::try_into(finder.needle().len())?;
        let mut ws = from;

        while ws < until && ws + n <= len {
            let we = (ws + self.window).min(until);
            let read_end = (we + n - 1).min(len);
            let window = self.prepare_window(table, ws, read_end - ws)?;
            let mut off = 0usize;

            while let Some(idx) = finder.find(&window[off..]) {
                let pos = ws + <usize as TryInto<u64>>::try_into(off + idx)?;

                if pos >= we {
                    break;
                }

                if self.literal_accepts(table, pos..pos + n)? {
                    return Ok(Some(pos..pos + n));
                }

                off += idx + 1;
            }

            ws = we;
        }

        Ok(None)
    }

    /// Last acceptable match whose start lies in `from..until`.
    fn literal_backward(
        &self,
        table: &crate::piece_table::table::PieceTable,
        finder_rev: &FinderRev<'_>,
        from: u64,
        until: u64,
    ) -> crate::errors::EditorResult<Option<std::ops::Range<u64>>> {
        let len = table.len();
        let needle_len = finder_rev.needle().len();
        let n = <usize as TryInto<u64>>::try_into(needle_len)?;
        let mut we = until;

        while we > from {
            let ws = we.saturating_sub(self.window).max(from);
            let read_end = (we + n - 1).min(len);

            if ws + n > read_end {
                we = ws;

                continue;
            }

            let window = self.prepare_window(table, ws, read_end - ws)?;
            let mut hay_end = window.len();

            while let Some(idx) = finder_rev.rfind(&window[..hay_end]) {
                let pos = ws + <usize as TryInto<u64>>::try_into(idx)?;

                if pos < we && self.literal_accepts(table, pos..pos + n)? {
                    return Ok(Some(pos..pos + n));
                }

                if idx == 0 {
                    break;
                }

                hay_end = idx + needle_len - 1;
            }

            we = ws;
        }

        Ok(None)
    }

    fn literal_accepts(
        &self,
        table: &crate::piece_table::table::PieceTable,
        range: std::ops::Range<u64>,
    ) -> crate::errors::EditorResult<bool> {
        if self.query.whole_word {
            let before = range.start.checked_sub(1).and_then(|p| table.byte_at(p));

            if !is_word_boundary(before, table.byte_at(range.end)) {
                return Ok(false);
            }
        }

        Ok(!followed_by_joiner(&table.read(range.end, 4)?))
    }
}

/*

===================================
========= REGEX SCANNING ==========
===================================

*/

impl SearchEngine {
    /// First non-empty acceptable match at or after `start` whose start is
    /// below `until`.
    fn regex_forward(
        &self,
        re: &regex::bytes::Regex,
        hay: &[u8],
        start: u64,
        until: usize,
    ) -> crate::errors::EditorResult<Option<std::ops::Range<u64>>> {
        let mut at = <u64 as TryInto<usize>>::try_into(start)?;

        while at <= hay.len() {
            let Some(m) = re.find_at(hay, at) else {
                break;
            };

            if m.start() >= until {
                break;
            }

            if !m.is_empty() && self.regex_accepts(hay, m.range()) {
                return Ok(Some(to_u64_range(m.range())?));
            }

            at = m.start() + 1;
        }

        Ok(None)
    }

    /// Every `find_iter` hit that passes the filters. Empty hits are only
    /// kept when `keep_empty` is set.
    fn regex_all(
        &self,
        re: &regex::bytes::Regex,
        hay: &[u8],
        keep_empty: bool,
    ) -> crate::errors::EditorResult<Vec<std::ops::Range<u64>>> {
        re.find_iter(hay)
            .filter(|m| (keep_empty || !m.is_empty()) && self.regex_accepts(hay, m.range()))
            .map(|m| to_u64_range(m.range()))
            .collect()
    }

    fn regex_accepts(&self, hay: &[u8], range: std::ops::Range<usize>) -> bool {
        if self.query.whole_word
            && !is_word_boundary(
                range.start.checked_sub(1).and_then(|p| hay.get(p)).copied(),
                hay.get(range.end).copied(),
            )
        {
            return false;
        }

        // A literal query only lands here for Unicode case folding.
        self.query.regex || !followed_by_joiner(hay.get(range.end..).unwrap_or_default())
    }

    fn expand_at(
        &self,
        re: &regex::bytes::Regex,
        hay: &[u8],
        range: &std::ops::Range<u64>,
        unescaped: &str,
    ) -> crate::errors::EditorResult<Vec<u8>> {
        let start = <u64 as TryInto<usize>>::try_into(range.start)?;
        let mut dst = Vec::new();

        match re.captures_at(hay, start) {
            Some(caps)
                if caps
                    .get(0)
                    .is_some_and(|m| to_u64_range(m.range()).ok().as_ref() == Some(range)) =>
            {
                caps.expand(unescaped.as_bytes(), &mut dst);
            }
            _ => dst.extend_from_slice(unescaped.as_bytes()),
        }

        Ok(dst)
    }
}

fn to_u64_range(
    range: std::ops::Range<usize>,
) -> crate::errors::EditorResult<std::ops::Range<u64>> {
    let start = <usize as TryInto<u64>>::try_into(range.start)?;
    let end = <usize as TryInto<u64>>::try_into(range.end)?;

    Ok(start..end)
}

/// No word byte (or the document edge) on either side.
fn is_word_boundary(before: Option<u8>, after: Option<u8>) -> bool {
    !before.is_some_and(crate::text::is_word_byte) && !after.is_some_and(crate::text::is_word_byte)
}

fn followed_by_joiner(tail: &[u8]) -> bool {
    tail.starts_with(ZWJ)
        || tail.starts_with(VS16)
        || (tail.starts_with(SKIN_TONE_PREFIX)
            && tail.get(3).is_some_and(|b| (0xBB..=0xBF).contains(b)))
}

/// Resolves `\n`, `\r`, `\t` and `\\`. Other backslashes are kept as typed.
#[must_use]
pub fn unescape_replacement(replacement: &str) -> String {
    let mut out = String::with_capacity(replacement.len());
    let mut chars = replacement.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);

            continue;
        }

        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }

    out
}

#[cfg(test)]
mod search_tests {
    use super::*;
    use crate::enums::Direction;
    use crate::piece_table::table::PieceTable;

    fn table(s: &str) -> PieceTable {
        PieceTable::from_text(s).unwrap()
    }

    fn starts(engine: &SearchEngine, t: &PieceTable) -> Vec<u64> {
        engine
            .find_all(t)
            .unwrap()
            .into_iter()
            .map(|m| m.range.start)
            .collect()
    }

    #[test]
    fn whole_word_cat() {
        let t = table("concatenate cat scatter");
        let engine = SearchEngine::new(SearchQuery::literal("cat").whole_word(true));

        assert_eq!(starts(&engine, &t), vec![12]);

        let found = engine.find(&t, 0, Direction::Forward).unwrap().unwrap();

        assert_eq!(found.range, 12..15);
        // Wraps back to the only match.
        let again = engine.find(&t, 15, Direction::Forward).unwrap().unwrap();

        assert_eq!(again.range, 12..15);
    }

    #[test]
    fn forward_and_backward_wrap() {
        let t = table("ab ab ab");
        let engine = SearchEngine::new(SearchQuery::literal("ab"));

        assert_eq!(engine.find(&t, 1, Direction::Forward).unwrap().unwrap().range, 3..5);
        assert_eq!(engine.find(&t, 7, Direction::Forward).unwrap().unwrap().range, 0..2);
        assert_eq!(engine.find(&t, 3, Direction::Backward).unwrap().unwrap().range, 0..2);
        assert_eq!(engine.find(&t, 0, Direction::Backward).unwrap().unwrap().range, 6..8);
    }

    #[test]
    fn case_insensitive_literal() {
        let t = table("Hello HELLO hello");
        let engine = SearchEngine::new(SearchQuery::literal("hello").match_case(false));
        let exact = SearchEngine::new(SearchQuery::literal("hello"));

        assert_eq!(starts(&engine, &t), vec![0, 6, 12]);
        assert_eq!(starts(&exact, &t), vec![12]);
    }

    #[test]
    fn matches_straddling_windows_are_found() {
        let t = table("xxxxneedlexxxxneedle");
        let engine = SearchEngine::new(SearchQuery::literal("needle")).with_window(3);

        assert_eq!(starts(&engine, &t), vec![4, 14]);
        assert_eq!(engine.find(&t, 20, Direction::Backward).unwrap().unwrap().range, 14..20);
        assert_eq!(engine.find(&t, 14, Direction::Backward).unwrap().unwrap().range, 4..10);
    }

    #[test]
    fn match_followed_by_joiner_is_rejected() {
        let t = table("\u{1F468}\u{200D}\u{1F469} \u{1F468}");
        let engine = SearchEngine::new(SearchQuery::literal("\u{1F468}"));

        assert_eq!(starts(&engine, &t), vec![12]);
    }

    #[test]
    fn literal_find_all_is_non_overlapping() {
        let t = table("aaaa");
        let engine = SearchEngine::new(SearchQuery::literal("aa"));

        assert_eq!(starts(&engine, &t), vec![0, 2]);
    }

    #[test]
    fn regex_skips_empty_matches() {
        let t = table("a1 b22 c");
        let engine = SearchEngine::new(SearchQuery::regex(r"\d*"));

        let ranges: Vec<_> = engine.find_all(&t).unwrap().into_iter().map(|m| m.range).collect();

        assert_eq!(ranges, vec![1..2, 4..6]);
    }

    #[test]
    fn replacements_keep_zero_length_hits() {
        let t = table("a\nb\n");
        let engine = SearchEngine::new(SearchQuery::regex("^"));

        let plan: Vec<_> = engine
            .replacements(&t, "> ")
            .unwrap()
            .into_iter()
            .map(|(m, bytes)| (m.range, bytes))
            .collect();

        assert_eq!(
            plan,
            vec![(0..0, b"> ".to_vec()), (2..2, b"> ".to_vec()), (4..4, b"> ".to_vec())]
        );
        assert!(engine.find_all(&t).unwrap().is_empty());
    }

    #[test]
    fn case_insensitive_literal_folds_unicode() {
        let t = table("\u{C4}pfel \u{E4}pfel $1");
        let engine = SearchEngine::new(SearchQuery::literal("\u{E4}pfel").match_case(false));

        assert_eq!(starts(&engine, &t), vec![0, 7]);
        assert_eq!(engine.find(&t, 7, Direction::Backward).unwrap().unwrap().range, 0..6);

        let dollar = SearchEngine::new(SearchQuery::literal("\u{E4}").match_case(false));
        let plan = dollar.replacements(&t, "$1").unwrap();

        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].1, b"$1", "literal replacements are never expanded");
    }

    #[test]
    fn regex_backward_and_multiline_anchor() {
        let t = table("one\ntwo\nthree");
        let engine = SearchEngine::new(SearchQuery::regex(r"^t\w+"));

        assert_eq!(engine.find(&t, 9, Direction::Backward).unwrap().unwrap().range, 8..13);
        assert_eq!(engine.find(&t, 8, Direction::Backward).unwrap().unwrap().range, 4..7);
        assert_eq!(engine.find(&t, 4, Direction::Backward).unwrap().unwrap().range, 8..13);
        assert_eq!(engine.find(&t, 5, Direction::Forward).unwrap().unwrap().range, 8..13);
    }

    #[test]
    fn invalid_regex_never_matches() {
        let t = table("(((");

        assert!(SearchEngine::compile(SearchQuery::regex("(")).is_err());

        let engine = SearchEngine::new(SearchQuery::regex("("));

        assert!(engine.find(&t, 0, Direction::Forward).unwrap().is_none());
        assert!(engine.find_all(&t).unwrap().is_empty());
    }

    #[test]
    fn match_exactly_checks_bounds() {
        let t = table("foo bar foo");
        let engine = SearchEngine::new(SearchQuery::literal("foo"));
        let re = SearchEngine::new(SearchQuery::regex("fo+"));

        assert!(engine.match_exactly(&t, 8..11).unwrap().is_some());
        assert!(engine.match_exactly(&t, 4..7).unwrap().is_none());
        assert!(re.match_exactly(&t, 0..3).unwrap().is_some());
        assert!(re.match_exactly(&t, 0..2).unwrap().is_none());
    }

    #[test]
    fn replacement_expansion() {
        let t = table("key=value");
        let re = SearchEngine::new(SearchQuery::regex(r"(?<k>\w+)=(\w+)"));
        let lit = SearchEngine::new(SearchQuery::literal("="));

        let plan = re.replacements(&t, r"$2\t${k}").unwrap();

        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].1, b"value\tkey");

        let found = lit.find(&t, 0, Direction::Forward).unwrap().unwrap();

        assert_eq!(lit.expand_replacement(&t, &found, r"$1\n").unwrap(), b"$1\n");
    }

    #[test]
    fn unescape_keeps_unknown_escapes() {
        assert_eq!(unescape_replacement(r"a\nb\\c\qd\"), "a\nb\\c\\qd\\");
    }
}
