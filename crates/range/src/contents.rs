//! Clone, extract, delete and insert over the nodes a range covers.
//!
//! All of these share [`RangeIterator`]: fully selected nodes are handled
//! whole, partially selected containers are recursed into with the range
//! narrowed to the container, and boundary character data is sliced.
use crate::iterator::{RangeIterator, is_non_text_partially_selected};
use crate::range::Range;
use dom::dom_utils::{
    get_boundary_after, get_closest_ancestor_in, is_character_data, is_or_is_ancestor_of,
    node_index, node_length, split_data_node,
};
use dom::traverse::descendants;
use dom::{BoundaryPoint, Document, DomError, DomResult, NodeId, NodeKind, NodeType};
use tools::slice_chars;

/// Calls `visit` with every node the range touches, in document order. A
/// partially selected container is visited before its selected descendants;
/// boundary character data comes with its selected span. `visit` returning
/// false stops the walk, which is then reported as `Ok(false)`.
fn iterate_subtree(
    doc: &Document,
    it: &mut RangeIterator,
    visit: &mut dyn FnMut(NodeId, Option<(usize, usize)>) -> bool,
) -> DomResult<bool> {
    while let Some(node) = it.next(doc) {
        if !visit(node, it.partial_span(doc)) {
            return Ok(false);
        }
        if it.is_partially_selected_subtree(doc) {
            let mut sub = it.sub_iterator(doc)?;
            if !iterate_subtree(doc, &mut sub, visit)? {
                return Ok(false);
            }
        } else {
            for descendant in descendants(doc, node) {
                if !visit(descendant, None) {
                    return Ok(false);
                }
            }
        }
    }
    Ok(true)
}

fn delete_subtree(doc: &mut Document, it: &mut RangeIterator) -> DomResult<()> {
    while it.next(doc).is_some() {
        if it.is_partially_selected_subtree(doc) {
            let mut sub = it.sub_iterator(doc)?;
            delete_subtree(doc, &mut sub)?;
        } else {
            it.remove(doc)?;
        }
    }
    Ok(())
}

fn extract_subtree(doc: &mut Document, it: &mut RangeIterator) -> DomResult<NodeId> {
    let fragment = doc.create_fragment();
    while let Some(node) = it.next(doc) {
        if matches!(doc.kind(node), NodeKind::DocumentType { .. }) {
            return Err(DomError::HierarchyRequest);
        }
        let piece = if it.is_partially_selected_subtree(doc) {
            let shell = doc.clone_node(node, false);
            let mut sub = it.sub_iterator(doc)?;
            let inner = extract_subtree(doc, &mut sub)?;
            doc.append_child(shell, inner)?;
            shell
        } else if let Some((from, to)) = it.partial_span(doc) {
            let copy = sliced_copy(doc, node, from, to)?;
            it.remove(doc)?;
            copy
        } else {
            it.remove(doc)?;
            node
        };
        doc.append_child(fragment, piece)?;
    }
    Ok(fragment)
}

fn clone_subtree(doc: &mut Document, it: &mut RangeIterator) -> DomResult<NodeId> {
    let fragment = doc.create_fragment();
    while let Some(node) = it.next(doc) {
        if matches!(doc.kind(node), NodeKind::DocumentType { .. }) {
            return Err(DomError::HierarchyRequest);
        }
        let copy = if it.is_partially_selected_subtree(doc) {
            let shell = doc.clone_node(node, false);
            let mut sub = it.sub_iterator(doc)?;
            let inner = clone_subtree(doc, &mut sub)?;
            doc.append_child(shell, inner)?;
            shell
        } else if let Some((from, to)) = it.partial_span(doc) {
            sliced_copy(doc, node, from, to)?
        } else {
            doc.clone_node(node, true)
        };
        doc.append_child(fragment, copy)?;
    }
    Ok(fragment)
}

/// Detached copy of a character data node holding only `from..to`.
fn sliced_copy(doc: &mut Document, node: NodeId, from: usize, to: usize) -> DomResult<NodeId> {
    let data = doc.substring_data(node, from, to - from)?;
    let copy = doc.clone_node(node, false);
    doc.set_data(copy, &data)?;
    Ok(copy)
}

/// Inserts `node` at `at`, splitting character data when `at` falls inside
/// it. `end` is kept pointing at the same position.
fn insert_at_position(
    doc: &mut Document,
    node: NodeId,
    at: BoundaryPoint,
    end: &mut BoundaryPoint,
) -> DomResult<()> {
    let count = match doc.kind(node) {
        NodeKind::DocumentFragment => doc.child_count(node),
        _ => 1,
    };
    let (parent, index) = if is_character_data(doc, at.node) {
        let parent = doc.parent(at.node).ok_or(DomError::HierarchyRequest)?;
        let index = node_index(doc, at.node);
        if at.offset == 0 {
            (parent, index)
        } else if at.offset >= node_length(doc, at.node) {
            (parent, index + 1)
        } else {
            split_data_node(doc, at.node, at.offset, &mut [&mut *end])?;
            (parent, index + 1)
        }
    } else {
        (at.node, at.offset.min(doc.child_count(at.node)))
    };
    doc.insert_at(parent, node, index)?;
    if end.node == parent && end.offset > index {
        end.offset += count;
    }
    log::trace!(target: "range", "inserted {node} into {parent} at {index}");
    Ok(())
}

impl Range {
    /// Concatenated text node data inside the range.
    pub fn text(&self, doc: &Document) -> DomResult<String> {
        self.ensure_valid(doc)?;
        if self.start.node == self.end.node && is_character_data(doc, self.start.node) {
            return Ok(match doc.kind(self.start.node) {
                NodeKind::Text(data) => {
                    slice_chars(data, self.start.offset, self.end.offset).to_string()
                }
                _ => String::new(),
            });
        }
        let mut out = String::new();
        let mut it = RangeIterator::new(doc, self);
        iterate_subtree(doc, &mut it, &mut |node, span| {
            if let NodeKind::Text(data) = doc.kind(node) {
                match span {
                    Some((from, to)) => out.push_str(slice_chars(data, from, to)),
                    None => out.push_str(data),
                }
            }
            true
        })?;
        Ok(out)
    }

    /// Nodes in the range accepted by `filter`, in document order.
    ///
    /// A boundary character data node is skipped when the range holds none of
    /// its characters.
    pub fn get_nodes(
        &self,
        doc: &Document,
        mut filter: impl FnMut(&Document, NodeId) -> bool,
    ) -> DomResult<Vec<NodeId>> {
        self.ensure_valid(doc)?;
        let (start, end) = (self.start, self.end);
        let mut nodes = Vec::new();
        let mut it = RangeIterator::new(doc, self);
        iterate_subtree(doc, &mut it, &mut |node, _| {
            let empty_start = node == start.node
                && is_character_data(doc, node)
                && start.offset == node_length(doc, node);
            let empty_end = node == end.node && is_character_data(doc, node) && end.offset == 0;
            if !empty_start && !empty_end && filter(doc, node) {
                nodes.push(node);
            }
            true
        })?;
        Ok(nodes)
    }

    /// [`get_nodes`](Self::get_nodes) restricted to `types`.
    pub fn get_nodes_of_type(&self, doc: &Document, types: &[NodeType]) -> DomResult<Vec<NodeId>> {
        self.get_nodes(doc, |doc, node| types.contains(&doc.kind(node).node_type()))
    }

    /// Copies the range's contents into a new detached fragment.
    pub fn clone_contents(&self, doc: &mut Document) -> DomResult<NodeId> {
        self.ensure_valid(doc)?;
        if self.collapsed() {
            return Ok(doc.create_fragment());
        }
        if self.start.node == self.end.node && is_character_data(doc, self.start.node) {
            let copy = sliced_copy(doc, self.start.node, self.start.offset, self.end.offset)?;
            let fragment = doc.create_fragment();
            doc.append_child(fragment, copy)?;
            return Ok(fragment);
        }
        let mut it = RangeIterator::new(doc, self);
        clone_subtree(doc, &mut it)
    }

    /// Moves the range's contents into a new detached fragment and collapses
    /// the range where they were.
    pub fn extract_contents(&mut self, doc: &mut Document) -> DomResult<NodeId> {
        self.remove_contents(doc, extract_subtree)
    }

    pub fn delete_contents(&mut self, doc: &mut Document) -> DomResult<()> {
        self.remove_contents(doc, delete_subtree)
    }

    /// Shared driver for delete and extract. Read-only nodes are looked for
    /// before anything is touched.
    fn remove_contents<T>(
        &mut self,
        doc: &mut Document,
        remover: fn(&mut Document, &mut RangeIterator) -> DomResult<T>,
    ) -> DomResult<T> {
        self.ensure_valid(doc)?;
        let root = self.common_ancestor();
        let mut collapse_to = self.start;
        if self.start.node != root {
            let top = get_closest_ancestor_in(doc, self.start.node, root, true)
                .ok_or_else(|| {
                    DomError::invalid_state("start container is outside the range root")
                })?;
            collapse_to = get_boundary_after(doc, top)?;
        }
        let mut it = RangeIterator::new(doc, self);
        let mut read_only = None;
        iterate_subtree(doc, &mut it, &mut |node, _| {
            if doc.is_read_only(node) {
                read_only = Some(node);
                return false;
            }
            true
        })?;
        if let Some(node) = read_only {
            log::debug!(target: "range", "refusing to modify read-only {node}");
            return Err(DomError::NoModificationAllowed);
        }
        it.reset();
        let result = remover(doc, &mut it)?;
        self.update_boundaries(doc, collapse_to, collapse_to);
        Ok(result)
    }

    /// Inserts `node` at the start of the range.
    ///
    /// Character data under the start boundary is split first. The range then
    /// starts right before the first inserted node.
    pub fn insert_node(&mut self, doc: &mut Document, node: NodeId) -> DomResult<()> {
        self.ensure_valid(doc)?;
        self.check_node(doc, node)?;
        if matches!(
            doc.kind(node),
            NodeKind::Document | NodeKind::Notation { .. } | NodeKind::Entity { .. }
        ) {
            return Err(DomError::InvalidNodeType);
        }
        if doc.is_read_only(self.start.node) {
            return Err(DomError::NoModificationAllowed);
        }
        if is_or_is_ancestor_of(doc, node, self.start.node) {
            return Err(DomError::HierarchyRequest);
        }
        let first_inserted = match doc.kind(node) {
            NodeKind::DocumentFragment => doc.first_child(node),
            _ => Some(node),
        };
        let start = self.start;
        let mut end = self.end;
        insert_at_position(doc, node, start, &mut end)?;
        self.update_boundaries(doc, start, end);
        match first_inserted {
            Some(first) => self.set_start_before(doc, first),
            None => Ok(()),
        }
    }

    /// Moves the range's contents into `new_parent` and puts `new_parent`
    /// where they were. The range ends up selecting `new_parent`.
    pub fn surround_contents(&mut self, doc: &mut Document, new_parent: NodeId) -> DomResult<()> {
        self.ensure_valid(doc)?;
        self.check_node(doc, new_parent)?;
        if !matches!(doc.kind(new_parent), NodeKind::Element { .. }) {
            return Err(DomError::InvalidNodeType);
        }
        if doc.is_read_only(self.start.node) {
            return Err(DomError::NoModificationAllowed);
        }
        if is_or_is_ancestor_of(doc, new_parent, self.start.node) {
            return Err(DomError::HierarchyRequest);
        }
        let it = RangeIterator::new(doc, self);
        let partial = |node: Option<NodeId>| {
            node.is_some_and(|n| is_non_text_partially_selected(doc, n, self.start, self.end))
        };
        if partial(it.first()) || partial(it.last()) {
            return Err(DomError::invalid_state(
                "range partially selects a non-text node",
            ));
        }
        let contents = self.extract_contents(doc)?;
        doc.clear_children(new_parent);
        let start = self.start;
        let mut end = self.end;
        insert_at_position(doc, new_parent, start, &mut end)?;
        doc.append_child(new_parent, contents)?;
        self.select_node(doc, new_parent)
    }

    /// Markup of a copy of the range's contents.
    pub fn to_html(&self, doc: &mut Document) -> DomResult<String> {
        let fragment = self.clone_contents(doc)?;
        Ok(doc.inner_html(fragment))
    }

    /// Parses `markup` into a detached fragment of the range's document.
    pub fn create_contextual_fragment(
        &self,
        doc: &mut Document,
        markup: &str,
    ) -> DomResult<NodeId> {
        self.ensure_valid(doc)?;
        Ok(doc.parse_fragment(markup)?)
    }
}
