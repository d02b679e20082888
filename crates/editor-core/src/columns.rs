//! Visual column ↔ byte offset mapping within a single line.
//!
//! The document only ever hands line *content* (terminator stripped) to a
//! [`ColumnMetrics`] implementation.

use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

pub const DEFAULT_TAB_WIDTH: u32 = 4;

/// Maps between byte offsets and visual columns of one line.
///
/// Implementations must be monotonic: a larger offset never maps to a
/// smaller column, and a larger column never maps to a smaller offset.
pub trait ColumnMetrics: std::fmt::Debug {
    /// Visual column at which the byte `offset` of `line` starts.
    fn column_of(&self, line: &[u8], offset: usize) -> u32;

    /// Byte offset within `line` for the visual `column`. Columns past the
    /// end of the line resolve to `line.len()`.
    fn offset_of(&self, line: &[u8], column: u32) -> usize;

    /// Total visual width of `line`.
    fn width(&self, line: &[u8]) -> u32 {
        self.column_of(line, line.len())
    }
}

/// Terminal-style metrics: every cluster is as wide as `unicode-width` says,
/// tabs advance to the next multiple of `tab_width`, invalid bytes are one
/// column each.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonospaceColumns {
    tab_width: u32,
}

impl Default for MonospaceColumns {
    fn default() -> Self {
        Self::new(DEFAULT_TAB_WIDTH)
    }
}

impl MonospaceColumns {
    #[must_use]
    pub fn new(tab_width: u32) -> Self {
        Self {
            tab_width: tab_width.max(1),
        }
    }

    #[inline]
    #[must_use]
    pub fn tab_width(&self) -> u32 {
        self.tab_width
    }

    fn cluster_width(&self, cluster: &str, display_col: u32) -> u32 {
        if cluster == "\t" {
            return self.tab_width - display_col % self.tab_width;
        }

        u32::try_from(cluster.width()).unwrap_or(u32::MAX)
    }

    /// Calls `f(offset, len, width)` for each cluster of `line` until it
    /// returns `Some`.
    fn walk<T>(&self, line: &[u8], mut f: impl FnMut(usize, usize, u32) -> Option<T>) -> Option<T> {
        let mut offset = 0usize;
        let mut display_col = 0u32;

        for chunk in line.utf8_chunks() {
            for cluster in chunk.valid().graphemes(true) {
                let w = self.cluster_width(cluster, display_col);

                if let Some(found) = f(offset, cluster.len(), w) {
                    return Some(found);
                }

                offset += cluster.len();
                display_col = display_col.saturating_add(w);
            }

            for _ in chunk.invalid() {
                if let Some(found) = f(offset, 1, 1) {
                    return Some(found);
                }

                offset += 1;
                display_col = display_col.saturating_add(1);
            }
        }

        None
    }
}

impl ColumnMetrics for MonospaceColumns {
    fn column_of(&self, line: &[u8], offset: usize) -> u32 {
        let mut display_col = 0u32;

        self.walk(line, |start, _, w| {
            if start >= offset {
                return Some(());
            }

            display_col = display_col.saturating_add(w);

            None
        });

        display_col
    }

    fn offset_of(&self, line: &[u8], column: u32) -> usize {
        let mut display_col = 0u32;

        // Inside a wide cluster: the left half snaps to its start, the rest to its end.
        self.walk(line, |start, len, w| {
            if display_col + w / 2 >= column {
                return Some(start);
            }

            if display_col + w > column {
                return Some(start + len);
            }

            display_col = display_col.saturating_add(w);

            None
        })
        .unwrap_or(line.len())
    }
}
