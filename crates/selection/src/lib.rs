//! Selection state on top of host selections.
//!
//! A [`Selection`] mirrors the host selection of one browsing context as
//! [`range::Range`] values; the [`SelectionRegistry`] owns one per context.
//! The `markers` functions checkpoint a selection in the document itself so
//! it survives structural edits.
mod markers;
mod registry;
mod selection;

pub use crate::markers::{
    MARKER_CLASS, MarkerInfo, SavedSelection, remove_markers, restore_selection, save_selection,
};
pub use crate::registry::SelectionRegistry;
pub use crate::selection::{SavedRanges, Selection, SyncState};
