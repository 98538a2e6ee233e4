use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Handle to a node inside one [`Document`](crate::Document) arena.
///
/// Handles are only meaningful together with the document that created them;
/// ranges and selections carry the [`DocumentId`] alongside.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Process-unique document identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DocumentId(u64);

impl DocumentId {
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        DocumentId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Document,
    DocumentFragment,
    DocumentType { name: String },
    Element {
        name: String,
        attributes: Vec<(String, String)>,
    },
    Text(String),
    Comment(String),
    ProcessingInstruction { target: String, data: String },
    Notation { name: String },
    Entity { name: String },
}

/// Payload-free node kind, numbered like the DOM `nodeType` constants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum NodeType {
    Element = 1,
    Text = 3,
    Entity = 6,
    ProcessingInstruction = 7,
    Comment = 8,
    Document = 9,
    DocumentType = 10,
    DocumentFragment = 11,
    Notation = 12,
}

impl NodeKind {
    /// Text, comment and processing instruction nodes.
    #[inline]
    pub fn is_character_data(&self) -> bool {
        matches!(
            self,
            NodeKind::Text(_) | NodeKind::Comment(_) | NodeKind::ProcessingInstruction { .. }
        )
    }

    /// Document type, notation and entity nodes, which can never hold a boundary.
    #[inline]
    pub fn is_forbidden_container(&self) -> bool {
        matches!(
            self,
            NodeKind::DocumentType { .. } | NodeKind::Notation { .. } | NodeKind::Entity { .. }
        )
    }

    #[inline]
    pub fn can_have_children(&self) -> bool {
        matches!(
            self,
            NodeKind::Document | NodeKind::DocumentFragment | NodeKind::Element { .. }
        )
    }

    pub fn character_data(&self) -> Option<&str> {
        match self {
            NodeKind::Text(data)
            | NodeKind::Comment(data)
            | NodeKind::ProcessingInstruction { data, .. } => Some(data),
            _ => None,
        }
    }

    pub fn node_type(&self) -> NodeType {
        match self {
            NodeKind::Document => NodeType::Document,
            NodeKind::DocumentFragment => NodeType::DocumentFragment,
            NodeKind::DocumentType { .. } => NodeType::DocumentType,
            NodeKind::Element { .. } => NodeType::Element,
            NodeKind::Text(_) => NodeType::Text,
            NodeKind::Comment(_) => NodeType::Comment,
            NodeKind::ProcessingInstruction { .. } => NodeType::ProcessingInstruction,
            NodeKind::Notation { .. } => NodeType::Notation,
            NodeKind::Entity { .. } => NodeType::Entity,
        }
    }

    pub fn node_name(&self) -> &str {
        match self {
            NodeKind::Document => "#document",
            NodeKind::DocumentFragment => "#document-fragment",
            NodeKind::DocumentType { name }
            | NodeKind::Notation { name }
            | NodeKind::Entity { name } => name,
            NodeKind::Element { name, .. } => name,
            NodeKind::Text(_) => "#text",
            NodeKind::Comment(_) => "#comment",
            NodeKind::ProcessingInstruction { target, .. } => target,
        }
    }
}

/// A `(container, offset)` position in a tree.
///
/// `offset` counts children for container nodes and characters for
/// character data.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BoundaryPoint {
    pub node: NodeId,
    pub offset: usize,
}

impl BoundaryPoint {
    #[inline]
    pub fn new(node: NodeId, offset: usize) -> Self {
        Self { node, offset }
    }
}

impl From<(NodeId, usize)> for BoundaryPoint {
    fn from((node, offset): (NodeId, usize)) -> Self {
        Self { node, offset }
    }
}
