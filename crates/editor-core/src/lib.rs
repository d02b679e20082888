//! Text-editing core for large files.
//!
//! The document lives in a [`piece_table::table::PieceTable`]; everything
//! else in this crate is either derived from it ([`line_index`]), describes
//! positions inside it ([`cursor`]), records changes to it ([`history`]) or
//! scans it ([`search`], [`text`]).
pub mod columns;
pub mod cursor;
pub mod enums;
pub mod errors;
pub mod history;
pub mod line_index;
pub mod piece_table;
pub mod search;
pub mod text;
