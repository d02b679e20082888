//! Byte sources and sinks for the editing engine.
//!
//! - [`mmap`] maps an on-disk file read-only.
//! - [`source`] wraps either a mapping or owned bytes in a cheaply clonable,
//!   reference-counted handle that the piece table keeps as its original buffer.
//! - [`save`] streams chunks to a temporary file and atomically renames it over
//!   the target.
pub mod mmap;
pub mod save;
pub mod source;
