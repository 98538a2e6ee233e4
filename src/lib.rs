//! Rich-text editing support: ranges and selections over an HTML document,
//! and a whitelist sanitizer for the content that goes in.
//!
//! [`EditorSession`] is the entry point for an editing widget. The member
//! crates are re-exported for callers that need the lower layers directly.
pub mod content;
mod editor;

pub use crate::editor::EditorSession;
pub use core_types::{ContextId, Direction};
pub use dom::{BoundaryPoint, Document, DomError, DomResult, NodeId};
pub use range::{Engine, EngineConfig, Features, Host, Range, RangeLike};
pub use selection::{SavedSelection, Selection, SelectionRegistry};

pub use dom;
pub use html;
pub use range;
pub use selection;
