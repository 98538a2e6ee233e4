//! Small text helpers shared by the DOM and range crates.

pub mod chars;

pub use chars::{byte_offset, char_len, delete_chars, insert_chars, slice_chars, split_chars};
