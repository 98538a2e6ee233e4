//! Arena document model and the node algorithms ranges are built on.
//!
//! Nodes are addressed by [`NodeId`] handles into a [`Document`]; nothing in
//! this crate or above it holds references into the tree across calls.
mod document;
mod dom_builder;
pub mod dom_utils;
mod error;
mod serialize;
pub mod traverse;
mod types;

pub use crate::document::{Ancestors, Document};
pub use crate::error::{DomError, DomResult};
pub use crate::types::{BoundaryPoint, DocumentId, NodeId, NodeKind, NodeType};
