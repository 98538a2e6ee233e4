//! Node algorithms shared by ranges and selections.
//!
//! Everything here is a free function over a borrowed [`Document`]; only
//! [`split_data_node`] mutates the tree.
use crate::document::Document;
use crate::error::{DomError, DomResult};
use crate::types::{BoundaryPoint, NodeId, NodeKind};
use std::cmp::Ordering;
use tools::{char_len, slice_chars};

/// Position of `node` among its siblings; 0 for a parentless node.
pub fn node_index(doc: &Document, node: NodeId) -> usize {
    doc.index_in_parent(node).unwrap_or(0)
}

/// Character count for character data, 0 for document types, notations and
/// entities, child count otherwise.
pub fn node_length(doc: &Document, node: NodeId) -> usize {
    match doc.kind(node) {
        kind if kind.is_forbidden_container() => 0,
        kind => match kind.character_data() {
            Some(data) => char_len(data),
            None => doc.child_count(node),
        },
    }
}

#[inline]
pub fn is_character_data(doc: &Document, node: NodeId) -> bool {
    doc.kind(node).is_character_data()
}

pub fn is_ancestor_of(
    doc: &Document,
    ancestor: NodeId,
    descendant: NodeId,
    self_is_ancestor: bool,
) -> bool {
    if ancestor == descendant {
        return self_is_ancestor;
    }
    doc.ancestors(descendant).any(|n| n == ancestor)
}

#[inline]
pub fn is_or_is_ancestor_of(doc: &Document, ancestor: NodeId, descendant: NodeId) -> bool {
    is_ancestor_of(doc, ancestor, descendant, true)
}

/// The ancestor of `node` (or `node` itself when `self_is_ancestor`) whose
/// parent is `ancestor`.
pub fn get_closest_ancestor_in(
    doc: &Document,
    node: NodeId,
    ancestor: NodeId,
    self_is_ancestor: bool,
) -> Option<NodeId> {
    let mut current = if self_is_ancestor {
        Some(node)
    } else {
        doc.parent(node)
    };
    while let Some(n) = current {
        let parent = doc.parent(n);
        if parent == Some(ancestor) {
            return Some(n);
        }
        current = parent;
    }
    None
}

/// Deepest node that is an inclusive ancestor of both `a` and `b`.
pub fn get_common_ancestor(doc: &Document, a: NodeId, b: NodeId) -> Option<NodeId> {
    let chain: Vec<NodeId> = std::iter::once(a).chain(doc.ancestors(a)).collect();
    std::iter::once(b)
        .chain(doc.ancestors(b))
        .find(|n| chain.contains(n))
}

pub fn get_root(doc: &Document, node: NodeId) -> NodeId {
    doc.ancestors(node).last().unwrap_or(node)
}

/// Whether `node`'s tree is rooted somewhere other than a document or fragment.
pub fn is_orphan(doc: &Document, node: NodeId) -> bool {
    get_document_or_fragment_container(doc, node).is_none()
}

/// The root of `node`'s tree when it is a document or document fragment.
pub fn get_document_or_fragment_container(doc: &Document, node: NodeId) -> Option<NodeId> {
    let root = get_root(doc, node);
    matches!(
        doc.kind(root),
        NodeKind::Document | NodeKind::DocumentFragment
    )
    .then_some(root)
}

/// Nearest inclusive ancestor that is a document type, notation or entity.
pub fn has_forbidden_ancestor(doc: &Document, node: NodeId) -> Option<NodeId> {
    std::iter::once(node)
        .chain(doc.ancestors(node))
        .find(|n| doc.kind(*n).is_forbidden_container())
}

pub fn get_boundary_before(doc: &Document, node: NodeId) -> DomResult<BoundaryPoint> {
    let parent = doc.parent(node).ok_or(DomError::NotFound)?;
    Ok(BoundaryPoint::new(parent, node_index(doc, node)))
}

pub fn get_boundary_after(doc: &Document, node: NodeId) -> DomResult<BoundaryPoint> {
    let parent = doc.parent(node).ok_or(DomError::NotFound)?;
    Ok(BoundaryPoint::new(parent, node_index(doc, node) + 1))
}

/// Total document order over boundary points.
///
/// Fails with [`DomError::WrongDocument`] when the points are in disjoint trees.
pub fn compare_boundary_points(
    doc: &Document,
    a: BoundaryPoint,
    b: BoundaryPoint,
) -> DomResult<Ordering> {
    if a.node == b.node {
        return Ok(a.offset.cmp(&b.offset));
    }
    // b's container (or an ancestor of it) is a child of a's container.
    if let Some(child) = get_closest_ancestor_in(doc, b.node, a.node, true) {
        return Ok(if a.offset <= node_index(doc, child) {
            Ordering::Less
        } else {
            Ordering::Greater
        });
    }
    // And the mirror case.
    if let Some(child) = get_closest_ancestor_in(doc, a.node, b.node, true) {
        return Ok(if node_index(doc, child) < b.offset {
            Ordering::Less
        } else {
            Ordering::Greater
        });
    }
    let root = get_common_ancestor(doc, a.node, b.node).ok_or(DomError::WrongDocument)?;
    let child_a = get_closest_ancestor_in(doc, a.node, root, true);
    let child_b = get_closest_ancestor_in(doc, b.node, root, true);
    match (child_a, child_b) {
        (Some(child_a), Some(child_b)) if child_a != child_b => {
            Ok(node_index(doc, child_a).cmp(&node_index(doc, child_b)))
        }
        _ => Err(DomError::invalid_state(
            "boundary comparison reached sibling case with a shared child",
        )),
    }
}

/// Splits a character data node at `index`, inserting the suffix as a new
/// next sibling.
///
/// `positions` are patched atomically: points inside `node` past the split
/// move to the new node, and points in the parent after `node` shift by one.
pub fn split_data_node(
    doc: &mut Document,
    node: NodeId,
    index: usize,
    positions: &mut [&mut BoundaryPoint],
) -> DomResult<NodeId> {
    let data = doc.data(node).ok_or(DomError::InvalidNodeType)?;
    let length = char_len(data);
    if index > length {
        return Err(DomError::IndexSize);
    }
    let parent = doc.parent(node).ok_or(DomError::NotFound)?;
    if doc.is_read_only(node) {
        return Err(DomError::NoModificationAllowed);
    }
    let suffix = slice_chars(data, index, length).to_string();
    let node_position = node_index(doc, node);

    let new_node = doc.clone_node(node, false);
    doc.set_data(new_node, &suffix)?;
    doc.delete_data(node, index, length - index)?;
    doc.insert_after(new_node, node)?;

    for position in positions.iter_mut() {
        if position.node == node && position.offset > index {
            position.node = new_node;
            position.offset -= index;
        } else if position.node == parent && position.offset > node_position {
            position.offset += 1;
        }
    }
    log::trace!(target: "dom", "split {node} at {index} into {new_node}");
    Ok(new_node)
}

/// Short human-readable description of a node for diagnostics.
pub fn inspect_node(doc: &Document, node: NodeId) -> String {
    if let Some(data) = doc.data(node) {
        return format!("{data:?}");
    }
    match doc.kind(node) {
        NodeKind::Element { name, .. } => {
            let id = doc
                .get_attribute(node, "id")
                .filter(|id| !id.is_empty())
                .map(|id| format!(r#" id="{id}""#))
                .unwrap_or_default();
            let inner: String = doc.inner_html(node).chars().take(25).collect();
            format!(
                "<{name}{id}>[index:{},length:{}][{inner}]",
                node_index(doc, node),
                doc.child_count(node)
            )
        }
        other => other.node_name().to_string(),
    }
}
