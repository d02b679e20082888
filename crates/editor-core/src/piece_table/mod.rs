/// # Piece Table Module.
///
/// The document is an ordered list of [`piece::Piece`]s, each pointing into
/// either the immutable original bytes or the append-only add buffer.
pub mod piece;
pub mod table;

/// Initial capacity of the add buffer, and the size it shrinks back to after
/// a save collapses the table.
pub const BASELINE_CAPACITY: usize = 64 * 1024;
