use std::ops::{AddAssign, SubAssign};

#[derive(Debug)]
pub struct PieceTable {
    /// Original unchanged bytes (shared, zero-copy).
    original: io::source::SharedBytes,
    /// Append-only buffer storing inserted bytes.
    buf: Vec<u8>,
    /// Ordered list of pieces describing the visible document.
    pieces: Vec<crate::piece_table::piece::Piece>,
    /// Sum of all piece lengths.
    len: u64,
}

/*

====================================
========= CREATION METHOD ==========
====================================

*/

impl PieceTable {
    /// # Errors
    ///
    /// Fails only if the source length does not fit in a `u64`.
    pub fn new(original: io::source::SharedBytes) -> crate::errors::EditorResult<Self> {
        let len = <usize as TryInto<u64>>::try_into(original.len())?;
        let mut pieces = Vec::new();

        if len > 0 {
            pieces.push(crate::piece_table::piece::Piece::new(
                crate::enums::BufferKind::Original,
                0..len,
            ));
        }

        Ok(Self {
            original,
            buf: Vec::with_capacity(crate::piece_table::BASELINE_CAPACITY),
            pieces,
            len,
        })
    }

    /// Builds a table whose original buffer is an in-memory copy of `text`.
    ///
    /// # Errors
    ///
    /// See [`PieceTable::new`].
    pub fn from_text(text: &str) -> crate::errors::EditorResult<Self> {
        Self::new(io::source::SharedBytes::from(text))
    }
}

/*

====================================
========= INLINE METHODS  ==========
====================================

*/

impl PieceTable {
    /// Total document length in bytes.
    #[inline]
    #[must_use]
    pub fn len(&self) -> u64 {
        self.len
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    #[must_use]
    pub fn piece_count(&self) -> usize {
        self.pieces.len()
    }

    #[inline]
    #[must_use]
    pub fn pieces(&self) -> &[crate::piece_table::piece::Piece] {
        &self.pieces
    }

    #[inline]
    #[must_use]
    pub fn original(&self) -> &io::source::SharedBytes {
        &self.original
    }

    /// The bytes a piece refers to.
    #[inline]
    fn slice_of(&self, piece: &crate::piece_table::piece::Piece) -> &[u8] {
        let source = match piece.buf_kind {
            crate::enums::BufferKind::Original => self.original.as_slice(),
            crate::enums::BufferKind::Add => self.buf.as_slice(),
        };
        // Piece ranges are always built from in-memory lengths, so they fit in usize.
        let start = usize::try_from(piece.range.start).unwrap_or(usize::MAX);
        let end = usize::try_from(piece.range.end).unwrap_or(usize::MAX);

        source.get(start..end).unwrap_or_default()
    }
}

/*

=====================================
========= INSERT / DELETE  ==========
=====================================

*/

impl PieceTable {
    /// Makes sure a piece boundary exists at `pos` and returns the index of
    /// the piece that starts there (`pieces.len()` when `pos` is the end).
    fn split_at(&mut self, pos: u64) -> usize {
        let mut cur = 0u64;

        for idx in 0..self.pieces.len() {
            if pos == cur {
                return idx;
            }

            let piece_len = self.pieces[idx].len();

            if pos < cur + piece_len {
                let piece = self.pieces[idx].clone();
                let mid = piece.range.start + (pos - cur);

                self.pieces[idx].range.end = mid;
                self.pieces.insert(
                    idx + 1,
                    crate::piece_table::piece::Piece::new(piece.buf_kind, mid..piece.range.end),
                );

                return idx + 1;
            }

            cur.add_assign(piece_len);
        }

        self.pieces.len()
    }

    /// Merges the piece at `idx` with its neighbours when they continue each
    /// other in the same source.
    fn coalesce_around(&mut self, idx: usize) {
        if idx + 1 < self.pieces.len() && self.pieces[idx].continues_into(&self.pieces[idx + 1]) {
            let next = self.pieces.remove(idx + 1);

            self.pieces[idx].range.end = next.range.end;
        }

        if idx > 0
            && idx < self.pieces.len()
            && self.pieces[idx - 1].continues_into(&self.pieces[idx])
        {
            let current = self.pieces.remove(idx);

            self.pieces[idx - 1].range.end = current.range.end;
        }
    }

    /// Inserts `bytes` so that they start at document position `pos`.
    ///
    /// # Errors
    ///
    /// [`crate::errors::EditorError::OutOfRange`] if `pos > len()`.
    pub fn insert(&mut self, pos: u64, bytes: &[u8]) -> crate::errors::EditorResult<()> {
        if bytes.is_empty() {
            return Ok(());
        }

        if pos > self.len {
            return Err(crate::errors::EditorError::out_of_range(pos, self.len));
        }

        let start = <usize as TryInto<u64>>::try_into(self.buf.len())?;
        let bytes_len = <usize as TryInto<u64>>::try_into(bytes.len())?;
        let end = start
            .checked_add(bytes_len)
            .ok_or(crate::errors::EditorError::Overflow)?;

        self.buf.extend_from_slice(bytes);

        let idx = self.split_at(pos);

        self.pieces.insert(
            idx,
            crate::piece_table::piece::Piece::new(crate::enums::BufferKind::Add, start..end),
        );
        self.coalesce_around(idx);
        self.len.add_assign(bytes_len);

        Ok(())
    }

    /// Removes `count` bytes starting at `pos`.
    ///
    /// # Errors
    ///
    /// [`crate::errors::EditorError::OutOfRange`] if `pos + count > len()`.
    /// Nothing is modified in that case.
    pub fn erase(&mut self, pos: u64, count: u64) -> crate::errors::EditorResult<()> {
        if count == 0 {
            return Ok(());
        }

        let end = pos
            .checked_add(count)
            .ok_or(crate::errors::EditorError::Overflow)?;

        if end > self.len {
            return Err(crate::errors::EditorError::out_of_range(end, self.len));
        }

        let first = self.split_at(pos);
        let last = self.split_at(end);

        self.pieces.drain(first..last);

        if first > 0 {
            self.coalesce_around(first - 1);
        }

        self.len.sub_assign(count);

        Ok(())
    }
}

/*

====================================
========== MISCELLANEOUS ===========
====================================

*/

impl PieceTable {
    /// Returns up to `count` bytes starting at `pos`, clipped to the end of
    /// the document.
    ///
    /// # Errors
    ///
    /// [`crate::errors::EditorError::OutOfRange`] if `pos > len()`.
    pub fn read(&self, mut pos: u64, count: u64) -> crate::errors::EditorResult<Vec<u8>> {
        if pos > self.len {
            return Err(crate::errors::EditorError::out_of_range(pos, self.len));
        }

        let mut remaining = count.min(self.len - pos);
        let mut res = Vec::with_capacity(<u64 as TryInto<usize>>::try_into(remaining)?);

        for piece in &self.pieces {
            if remaining == 0 {
                break;
            }

            let piece_len = piece.len();

            if pos >= piece_len {
                pos.sub_assign(piece_len);

                continue;
            }

            let take = (piece_len - pos).min(remaining);
            let start = <u64 as TryInto<usize>>::try_into(pos)?;
            let end = <u64 as TryInto<usize>>::try_into(pos + take)?;

            res.extend_from_slice(&self.slice_of(piece)[start..end]);
            remaining.sub_assign(take);
            pos = 0;
        }

        Ok(res)
    }

    /// Whole document as one byte vector.
    ///
    /// # Errors
    ///
    /// Fails only if the document does not fit in memory addressing.
    pub fn read_all(&self) -> crate::errors::EditorResult<Vec<u8>> {
        self.read(0, self.len)
    }

    /// Single byte lookup; `None` at or past the end of the document.
    #[must_use]
    pub fn byte_at(&self, mut pos: u64) -> Option<u8> {
        if pos >= self.len {
            return None;
        }

        for piece in &self.pieces {
            let piece_len = piece.len();

            if pos < piece_len {
                let offset = usize::try_from(pos).ok()?;

                return self.slice_of(piece).get(offset).copied();
            }

            pos.sub_assign(piece_len);
        }

        None
    }

    /// Lossy UTF-8 view of the whole document.
    #[must_use]
    pub fn to_string_lossy(&self) -> String {
        let bytes: Vec<u8> = self.chunks().flatten().copied().collect();

        String::from_utf8_lossy(&bytes).into_owned()
    }

    /// Returns an iterator that yields sequential zero-copy byte slices
    /// representing the fully evaluated text document.
    ///
    /// This is the path used for saving to disk and for rebuilding the line
    /// index.
    pub fn chunks(&self) -> impl Iterator<Item = &[u8]> + '_ {
        self.pieces.iter().map(move |piece| self.slice_of(piece))
    }
}

/*

=================
===== RESET =====
=================

*/

impl PieceTable {
    /// Resets the piece table after a successful save.
    ///
    /// Swaps in the newly written file as the original source, clears the
    /// append buffer, and collapses all pieces into a single piece covering
    /// the new file. The previous source is released once nothing else holds
    /// a handle to it.
    ///
    /// # Errors
    ///
    /// Fails only if the new source length does not fit in a `u64`.
    pub fn reset_to(
        &mut self,
        original: io::source::SharedBytes,
    ) -> crate::errors::EditorResult<()> {
        let file_size = <usize as TryInto<u64>>::try_into(original.len())?;

        self.original = original;
        self.buf.clear();

        if self.buf.capacity() > crate::piece_table::BASELINE_CAPACITY {
            self.buf.shrink_to(crate::piece_table::BASELINE_CAPACITY);
        }

        self.pieces.clear();

        if file_size > 0 {
            self.pieces.push(crate::piece_table::piece::Piece::new(
                crate::enums::BufferKind::Original,
                0..file_size,
            ));
        }

        self.len = file_size;

        Ok(())
    }
}

#[cfg(test)]
mod piece_table_tests {
    use crate::enums::BufferKind;
    use crate::piece_table::table::PieceTable;
    use std::io::Write;

    fn pt_from_str(s: &str) -> PieceTable {
        PieceTable::from_text(s).unwrap()
    }

    fn contents(pt: &PieceTable) -> Vec<u8> {
        pt.read(0, pt.len()).unwrap()
    }

    /// No empty pieces, no mergeable neighbours, cached length matches.
    #[track_caller]
    fn assert_normalized(pt: &PieceTable) {
        let pieces = pt.pieces();

        assert!(pieces.iter().all(|p| !p.is_empty()), "empty piece in {pieces:?}");
        assert!(
            pieces.windows(2).all(|w| !w[0].continues_into(&w[1])),
            "uncoalesced neighbours in {pieces:?}"
        );
        assert_eq!(pt.len(), pieces.iter().map(|p| p.len()).sum::<u64>());
    }

    /// Helper function to create a file-backed source with specific text
    fn create_mock_source(content: &[u8]) -> (tempfile::NamedTempFile, io::source::SharedBytes) {
        let mut temp = tempfile::NamedTempFile::new().unwrap();
        temp.write_all(content).unwrap();
        temp.as_file().sync_all().unwrap();
        let source = io::source::SharedBytes::open(temp.path()).unwrap();
        (temp, source)
    }

    #[test]
    fn new_len_matches_original() {
        let pt = pt_from_str("hello");

        assert_eq!(pt.len(), 5);
        assert_eq!(pt.piece_count(), 1);
    }

    #[test]
    fn insert_middle() {
        let mut pt = pt_from_str("helo");

        pt.insert(3, b"l").unwrap();
        assert_eq!(contents(&pt), b"hello");
        assert_normalized(&pt);
    }

    #[test]
    fn insert_start_end() {
        let mut pt = pt_from_str("world");

        pt.insert(0, b"hello ").unwrap();
        pt.insert(pt.len(), b"!").unwrap();
        assert_eq!(contents(&pt), b"hello world!");
        assert_normalized(&pt);
    }

    #[test]
    fn insert_past_end_is_out_of_range() {
        let mut pt = pt_from_str("abc");
        let err = pt.insert(4, b"x").unwrap_err();

        assert!(matches!(
            err,
            crate::errors::EditorError::OutOfRange { pos: 4, len: 3 }
        ));
        assert_eq!(contents(&pt), b"abc");
    }

    #[test]
    fn delete_middle() {
        let mut pt = pt_from_str("hello cruel world");

        pt.erase(5, 6).unwrap();

        assert_eq!(contents(&pt), b"hello world");
        assert_normalized(&pt);
    }

    #[test]
    fn delete_across_pieces() {
        let mut pt = pt_from_str("abcdef");

        pt.insert(3, b"XYZ").unwrap();
        assert_eq!(contents(&pt), b"abcXYZdef");

        pt.erase(2, 5).unwrap();
        assert_eq!(contents(&pt), b"abef");
        assert_normalized(&pt);
    }

    #[test]
    fn erase_zero_is_noop_and_overrun_is_rejected() {
        let mut pt = pt_from_str("abc");

        pt.erase(3, 0).unwrap();
        assert!(pt.erase(2, 2).is_err());
        assert_eq!(contents(&pt), b"abc");
    }

    #[test]
    fn erasing_an_insert_restores_a_single_original_piece() {
        let mut pt = pt_from_str("0123456789");

        pt.insert(5, b"inserted").unwrap();
        assert_eq!(pt.piece_count(), 3);

        pt.erase(5, 8).unwrap();
        assert_eq!(contents(&pt), b"0123456789");
        assert_eq!(pt.piece_count(), 1);
        assert_eq!(pt.pieces()[0].buf_kind, BufferKind::Original);
    }

    #[test]
    fn typing_at_one_spot_coalesces_into_one_piece() {
        let mut pt = pt_from_str("start end");
        let mut pos = 6;

        for ch in b"consecutive" {
            pt.insert(pos, &[*ch]).unwrap();
            pos += 1;
        }

        assert_eq!(contents(&pt), b"start consecutiveend");
        // Original prefix, the typed run, original suffix.
        assert_eq!(pt.piece_count(), 3);
        assert_eq!(pt.pieces()[1].buf_kind, BufferKind::Add);
        assert_eq!(pt.pieces()[1].len(), 11);
    }

    #[test]
    fn read_clips_to_end_and_rejects_start_past_end() {
        let pt = pt_from_str("abcdef");

        assert_eq!(pt.read(4, 100).unwrap(), b"ef");
        assert_eq!(pt.read(6, 1).unwrap(), b"");
        assert!(pt.read(7, 1).is_err());
    }

    #[test]
    fn byte_at_spans_pieces() {
        let mut pt = pt_from_str("ac");

        pt.insert(1, b"b").unwrap();

        assert_eq!(pt.byte_at(0), Some(b'a'));
        assert_eq!(pt.byte_at(1), Some(b'b'));
        assert_eq!(pt.byte_at(2), Some(b'c'));
        assert_eq!(pt.byte_at(3), None);
    }

    #[test]
    fn test_chunks_interleaved_pieces() {
        let (_temp, source) = create_mock_source(b"Hello world");
        let mut pt = PieceTable::new(source).unwrap();

        pt.insert(6, b"beautiful ").unwrap();
        pt.insert(pt.len(), b"!").unwrap();

        let bytes = pt.chunks().flatten().copied().collect::<Vec<u8>>();
        let result_string = String::from_utf8(bytes).unwrap();

        assert_eq!(result_string, "Hello beautiful world!");
        assert_eq!(pt.to_string_lossy(), "Hello beautiful world!");
    }

    #[test]
    fn test_chunks_empty_document() {
        let (_temp, source) = create_mock_source(b"");
        let pt = PieceTable::new(source).unwrap();

        let bytes = pt.chunks().flatten().copied().collect::<Vec<u8>>();

        assert!(
            bytes.is_empty(),
            "Iterating an empty document should yield 0 bytes"
        );
        assert_eq!(pt.piece_count(), 0);
    }

    #[test]
    fn test_reset_to_normal_save() {
        let mut pt = pt_from_str("Old text");

        assert_eq!(
            pt.buf.capacity(),
            crate::piece_table::BASELINE_CAPACITY,
            "Initial capacity should be BASELINE_CAPACITY"
        );

        let (_temp, new_source) = create_mock_source(b"Old some ");

        pt.reset_to(new_source).unwrap();

        assert_eq!(pt.buf.len(), 0, "Append buffer length must be cleared");
        assert_eq!(pt.piece_count(), 1, "Pieces must be collapsed to exactly 1");
        assert_eq!(pt.pieces()[0].buf_kind, BufferKind::Original);
        assert_eq!(pt.pieces()[0].range, 0..9);
        assert_eq!(contents(&pt), b"Old some ");
    }

    #[test]
    fn test_reset_to_large_insert_shrinks_to_baseline() {
        let mut pt = pt_from_str("Old text");
        let large_paste_size = crate::piece_table::BASELINE_CAPACITY * 2;
        let large_paste = vec![b'A'; large_paste_size];

        pt.insert(8, &large_paste).unwrap();

        assert!(
            pt.buf.capacity() >= large_paste_size,
            "Buffer capacity must have grown past BASELINE_CAPACITY"
        );

        pt.reset_to(io::source::SharedBytes::from("saved")).unwrap();

        assert_eq!(pt.buf.len(), 0);
        assert_eq!(pt.buf.capacity(), crate::piece_table::BASELINE_CAPACITY);
        assert_eq!(pt.len(), 5);
    }

    #[test]
    fn test_reset_to_empty_file_edge_case() {
        let mut pt = pt_from_str("Something");

        pt.erase(0, pt.len()).unwrap();
        pt.reset_to(io::source::SharedBytes::empty()).unwrap();

        assert_eq!(pt.piece_count(), 0);
        assert!(pt.is_empty());
        assert!(pt.chunks().next().is_none());
    }

    /// Deterministic xorshift so the sequence is reproducible without extra crates.
    struct XorShift(u64);

    impl XorShift {
        fn next(&mut self) -> u64 {
            self.0 ^= self.0 << 13;
            self.0 ^= self.0 >> 7;
            self.0 ^= self.0 << 17;
            self.0
        }

        fn below(&mut self, bound: u64) -> u64 {
            if bound == 0 { 0 } else { self.next() % bound }
        }
    }

    #[test]
    fn random_edits_match_reference_model() {
        let mut rng = XorShift(0x9E37_79B9_7F4A_7C15);
        let mut pt = pt_from_str("The quick brown fox\njumps over the lazy dog\n");
        let mut model = b"The quick brown fox\njumps over the lazy dog\n".to_vec();

        for step in 0..500 {
            let len = model.len() as u64;

            if rng.below(3) == 0 && len > 0 {
                let pos = rng.below(len);
                let count = rng.below((len - pos).min(8)) + 1;

                pt.erase(pos, count).unwrap();
                model.drain(pos as usize..(pos + count) as usize);
            } else {
                let pos = rng.below(len + 1);
                let text = format!("<{step}>");

                pt.insert(pos, text.as_bytes()).unwrap();
                model.splice(pos as usize..pos as usize, text.bytes());
            }

            assert_eq!(pt.len(), model.len() as u64);
            assert_normalized(&pt);
        }

        assert_eq!(pt.read_all().unwrap(), model);
    }
}
