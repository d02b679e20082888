//! Byte classification and text-unit stepping over a [`PieceTable`].
//!
//! Positions handed out by this module always land on a grapheme cluster
//! boundary when the surrounding bytes are valid UTF-8, and on a scalar
//! boundary otherwise. `\r\n` is one unit.
//!
//! [`PieceTable`]: crate::piece_table::table::PieceTable

use unicode_segmentation::UnicodeSegmentation;

/// How far around a position we look when resolving one cluster.
const STEP_WINDOW: u64 = 256;

/// Read size for run scans (word / whitespace).
const SCAN_WINDOW: u64 = 4 * 1024;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CharClass {
    Word,
    Space,
    Newline,
    Punct,
}

/// `[A-Za-z0-9_]` or any non-ASCII byte, so multi-byte sequences are never split.
#[inline]
#[must_use]
pub fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b >= 0x80
}

#[inline]
#[must_use]
pub fn is_space_byte(b: u8) -> bool {
    b == b' ' || b == b'\t'
}

#[inline]
#[must_use]
pub fn is_newline_byte(b: u8) -> bool {
    b == b'\n' || b == b'\r'
}

#[must_use]
pub fn classify(b: u8) -> CharClass {
    if is_newline_byte(b) {
        CharClass::Newline
    } else if is_space_byte(b) {
        CharClass::Space
    } else if is_word_byte(b) {
        CharClass::Word
    } else {
        CharClass::Punct
    }
}

/*

=====================================
========= TEXT-UNIT STEPPING ========
=====================================

*/

/// Position one text unit after `pos`, or `len` at the end.
///
/// # Errors
///
/// Propagates table read errors.
pub fn next_boundary(
    table: &crate::piece_table::table::PieceTable,
    pos: u64,
) -> crate::errors::EditorResult<u64> {
    let len = table.len();

    if pos >= len {
        return Ok(len);
    }

    let window = table.read(pos, STEP_WINDOW)?;

    if window.starts_with(b"\r\n") {
        return Ok(pos + 2);
    }

    let step = match window.utf8_chunks().next() {
        Some(chunk) if !chunk.valid().is_empty() => chunk
            .valid()
            .graphemes(true)
            .next()
            .map_or(1, str::len),
        Some(chunk) => chunk.invalid().len().max(1),
        None => 1,
    };

    Ok(pos + <usize as TryInto<u64>>::try_into(step)?)
}

/// Position one text unit before `pos`, or `0` at the start.
///
/// # Errors
///
/// Propagates table read errors.
pub fn prev_boundary(
    table: &crate::piece_table::table::PieceTable,
    pos: u64,
) -> crate::errors::EditorResult<u64> {
    let pos = pos.min(table.len());

    if pos == 0 {
        return Ok(0);
    }

    let start = pos.saturating_sub(STEP_WINDOW);
    let window = table.read(start, pos - start)?;

    if window.ends_with(b"\r\n") {
        return Ok(pos - 2);
    }

    let step = match window.utf8_chunks().last() {
        Some(chunk) if !chunk.invalid().is_empty() => chunk.invalid().len(),
        Some(chunk) => chunk
            .valid()
            .graphemes(true)
            .next_back()
            .map_or(1, str::len),
        None => 1,
    };

    Ok(pos - <usize as TryInto<u64>>::try_into(step)?)
}

/*

=============================
========= RUN SCANS =========
=============================

*/

/// First position at or after `pos` whose byte fails `pred`.
fn scan_forward(
    table: &crate::piece_table::table::PieceTable,
    mut pos: u64,
    pred: impl Fn(u8) -> bool,
) -> crate::errors::EditorResult<u64> {
    while pos < table.len() {
        let window = table.read(pos, SCAN_WINDOW)?;

        match window.iter().position(|&b| !pred(b)) {
            Some(idx) => return Ok(pos + <usize as TryInto<u64>>::try_into(idx)?),
            None => pos += <usize as TryInto<u64>>::try_into(window.len())?,
        }
    }

    Ok(table.len())
}

/// Smallest position `p <= pos` such that every byte in `p..pos` passes `pred`.
fn scan_backward(
    table: &crate::piece_table::table::PieceTable,
    mut pos: u64,
    pred: impl Fn(u8) -> bool,
) -> crate::errors::EditorResult<u64> {
    while pos > 0 {
        let start = pos.saturating_sub(SCAN_WINDOW);
        let window = table.read(start, pos - start)?;

        match window.iter().rposition(|&b| !pred(b)) {
            Some(idx) => return Ok(start + <usize as TryInto<u64>>::try_into(idx)? + 1),
            None => pos = start,
        }
    }

    Ok(0)
}

/*

=========================
========= WORDS =========
=========================

*/

/// Double-click unit at `pos`: the word run containing it or touching it
/// from the left, otherwise the run of spaces or punctuation under it. A
/// line terminator (`\r\n` included) is selected on its own. Empty only at
/// the end of the document after a non-word byte.
///
/// # Errors
///
/// Propagates table read errors.
pub fn word_range_at(
    table: &crate::piece_table::table::PieceTable,
    pos: u64,
) -> crate::errors::EditorResult<std::ops::Range<u64>> {
    let pos = pos.min(table.len());
    let here = table.byte_at(pos);
    let before = pos.checked_sub(1).and_then(|p| table.byte_at(p));

    let class = match (here.map(classify), before.map(classify)) {
        (Some(CharClass::Word), _) | (_, Some(CharClass::Word)) => CharClass::Word,
        (Some(class), _) => class,
        (None, _) => return Ok(pos..pos),
    };

    if class == CharClass::Newline {
        let range = match (before, here, table.byte_at(pos + 1)) {
            (Some(b'\r'), Some(b'\n'), _) => pos - 1..pos + 1,
            (_, Some(b'\r'), Some(b'\n')) => pos..pos + 2,
            _ => pos..pos + 1,
        };

        return Ok(range);
    }

    let same = |b: u8| classify(b) == class;

    Ok(scan_backward(table, pos, same)?..scan_forward(table, pos, same)?)
}

/// Ctrl+Right: skips whitespace, then one run of the next byte's class.
/// A line terminator is its own stop.
///
/// # Errors
///
/// Propagates table read errors.
pub fn move_word_right(
    table: &crate::piece_table::table::PieceTable,
    pos: u64,
) -> crate::errors::EditorResult<u64> {
    let Some(b) = table.byte_at(pos) else {
        return Ok(table.len());
    };

    if is_newline_byte(b) {
        return next_boundary(table, pos);
    }

    let pos = scan_forward(table, pos, is_space_byte)?;

    match table.byte_at(pos).map(classify) {
        Some(CharClass::Word) => scan_forward(table, pos, is_word_byte),
        Some(CharClass::Punct) => scan_forward(table, pos, |b| classify(b) == CharClass::Punct),
        _ => Ok(pos),
    }
}

/// Ctrl+Left: mirror of [`move_word_right`].
///
/// # Errors
///
/// Propagates table read errors.
pub fn move_word_left(
    table: &crate::piece_table::table::PieceTable,
    pos: u64,
) -> crate::errors::EditorResult<u64> {
    let pos = pos.min(table.len());

    if pos == 0 {
        return Ok(0);
    }

    if table.byte_at(pos - 1).is_some_and(is_newline_byte) {
        return prev_boundary(table, pos);
    }

    let pos = scan_backward(table, pos, is_space_byte)?;

    if pos == 0 {
        return Ok(0);
    }

    match table.byte_at(pos - 1).map(classify) {
        Some(CharClass::Word) => scan_backward(table, pos, is_word_byte),
        Some(CharClass::Punct) => scan_backward(table, pos, |b| classify(b) == CharClass::Punct),
        _ => Ok(pos),
    }
}

/// Upper/lower-cases `bytes`. Valid UTF-8 gets full Unicode mapping;
/// anything else is mapped byte-wise over ASCII only.
#[must_use]
pub fn convert_case(bytes: &[u8], conversion: crate::enums::CaseConversion) -> Vec<u8> {
    match (std::str::from_utf8(bytes), conversion) {
        (Ok(s), crate::enums::CaseConversion::Upper) => s.to_uppercase().into_bytes(),
        (Ok(s), crate::enums::CaseConversion::Lower) => s.to_lowercase().into_bytes(),
        (Err(_), crate::enums::CaseConversion::Upper) => bytes.to_ascii_uppercase(),
        (Err(_), crate::enums::CaseConversion::Lower) => bytes.to_ascii_lowercase(),
    }
}
