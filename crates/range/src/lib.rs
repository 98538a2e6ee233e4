//! Boundary-point ranges over the arena document, and the adapters that put
//! them on top of whatever range primitive a host offers.
//!
//! [`Range`] is the generic implementation: every algorithm (content
//! removal, cloning, insertion, comparison, bookmarks) runs against the
//! [`dom::Document`] directly. [`WrappedRange`] keeps a host range in step
//! with one, and the `legacy` functions translate to and from hosts that
//! only have opaque text ranges. [`Engine`] probes the host once and picks.
mod bookmark;
mod boundaries;
mod contents;
mod engine;
mod features;
mod host;
mod iterator;
mod legacy;
mod query;
mod range;
mod range_like;
mod wrapped;

#[cfg(any(test, feature = "sim"))]
pub mod sim;

pub use crate::bookmark::Bookmark;
pub use crate::engine::{Engine, EngineConfig};
pub use crate::features::{Features, Implementation};
pub use crate::host::{EndPoints, Host, NativeRange, NativeSelection, TextRange};
pub use crate::legacy::{range_to_text_range, text_range_to_range};
pub use crate::query::NodePosition;
pub use crate::range::{Boundaries, How, MAX_SUBTREE_DEPTH, Range};
pub use crate::range_like::RangeLike;
pub use crate::wrapped::WrappedRange;
