use crate::error::{DomError, DomResult};
use crate::types::{DocumentId, NodeId, NodeKind};
use tools::{char_len, delete_chars, insert_chars, slice_chars};

#[derive(Clone, Debug)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    read_only: bool,
}

/// Arena-backed document tree.
///
/// Nodes are never freed: a removed node is only detached, so stale handles
/// stay valid for queries and ranges can notice that their containers left the
/// tree. Index 0 is the document node itself.
///
/// A clone is a separate document with its own id, so ranges made for one
/// are rejected by the other.
#[derive(Debug)]
pub struct Document {
    id: DocumentId,
    nodes: Vec<NodeData>,
}

impl Clone for Document {
    fn clone(&self) -> Self {
        Self {
            id: DocumentId::next(),
            nodes: self.nodes.clone(),
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Self {
            id: DocumentId::next(),
            nodes: vec![NodeData {
                kind: NodeKind::Document,
                parent: None,
                children: Vec::new(),
                read_only: false,
            }],
        }
    }

    #[inline]
    pub fn id(&self) -> DocumentId {
        self.id
    }

    /// The document node.
    #[inline]
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Whether `node` was allocated by this document.
    #[inline]
    pub fn contains(&self, node: NodeId) -> bool {
        node.index() < self.nodes.len()
    }

    #[inline]
    fn data_of(&self, node: NodeId) -> &NodeData {
        &self.nodes[node.index()]
    }

    #[inline]
    fn data_of_mut(&mut self, node: NodeId) -> &mut NodeData {
        &mut self.nodes[node.index()]
    }

    fn alloc(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(NodeData {
            kind,
            parent: None,
            children: Vec::new(),
            read_only: false,
        });
        id
    }

    pub fn create_element(&mut self, name: &str) -> NodeId {
        self.alloc(NodeKind::Element {
            name: name.to_ascii_lowercase(),
            attributes: Vec::new(),
        })
    }

    pub fn create_element_with(&mut self, name: &str, attributes: &[(&str, &str)]) -> NodeId {
        self.alloc(NodeKind::Element {
            name: name.to_ascii_lowercase(),
            attributes: attributes
                .iter()
                .map(|(k, v)| (k.to_ascii_lowercase(), v.to_string()))
                .collect(),
        })
    }

    pub fn create_text(&mut self, data: &str) -> NodeId {
        self.alloc(NodeKind::Text(data.to_string()))
    }

    pub fn create_comment(&mut self, data: &str) -> NodeId {
        self.alloc(NodeKind::Comment(data.to_string()))
    }

    pub fn create_fragment(&mut self) -> NodeId {
        self.alloc(NodeKind::DocumentFragment)
    }

    pub fn create_doctype(&mut self, name: &str) -> NodeId {
        self.alloc(NodeKind::DocumentType {
            name: name.to_string(),
        })
    }

    pub fn create_processing_instruction(&mut self, target: &str, data: &str) -> NodeId {
        self.alloc(NodeKind::ProcessingInstruction {
            target: target.to_string(),
            data: data.to_string(),
        })
    }

    pub fn create_notation(&mut self, name: &str) -> NodeId {
        self.alloc(NodeKind::Notation {
            name: name.to_string(),
        })
    }

    pub fn create_entity(&mut self, name: &str) -> NodeId {
        self.alloc(NodeKind::Entity {
            name: name.to_string(),
        })
    }

    // ---- structure ----

    #[inline]
    pub fn kind(&self, node: NodeId) -> &NodeKind {
        &self.data_of(node).kind
    }

    #[inline]
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.data_of(node).parent
    }

    #[inline]
    pub fn children(&self, node: NodeId) -> &[NodeId] {
        &self.data_of(node).children
    }

    #[inline]
    pub fn child_count(&self, node: NodeId) -> usize {
        self.data_of(node).children.len()
    }

    pub fn child_at(&self, node: NodeId, index: usize) -> Option<NodeId> {
        self.data_of(node).children.get(index).copied()
    }

    pub fn first_child(&self, node: NodeId) -> Option<NodeId> {
        self.data_of(node).children.first().copied()
    }

    pub fn last_child(&self, node: NodeId) -> Option<NodeId> {
        self.data_of(node).children.last().copied()
    }

    /// Position of `node` among its parent's children.
    pub fn index_in_parent(&self, node: NodeId) -> Option<usize> {
        let parent = self.parent(node)?;
        self.children(parent).iter().position(|c| *c == node)
    }

    pub fn previous_sibling(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.parent(node)?;
        let index = self.index_in_parent(node)?;
        index.checked_sub(1).and_then(|i| self.child_at(parent, i))
    }

    pub fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.parent(node)?;
        let index = self.index_in_parent(node)?;
        self.child_at(parent, index + 1)
    }

    /// Ancestors of `node`, nearest first, excluding `node` itself.
    pub fn ancestors(&self, node: NodeId) -> Ancestors<'_> {
        Ancestors {
            doc: self,
            next: self.parent(node),
        }
    }

    /// Whether `node` is attached to this document's tree.
    pub fn is_connected(&self, node: NodeId) -> bool {
        node == self.root() || self.ancestors(node).any(|a| a == self.root())
    }

    fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        ancestor == node || self.ancestors(node).any(|a| a == ancestor)
    }

    fn ensure_insertable(&self, parent: NodeId, child: NodeId) -> DomResult<()> {
        if !self.kind(parent).can_have_children() || matches!(self.kind(child), NodeKind::Document)
        {
            return Err(DomError::HierarchyRequest);
        }
        if self.is_inclusive_ancestor(child, parent) {
            return Err(DomError::HierarchyRequest);
        }
        if self.is_read_only(parent) {
            return Err(DomError::NoModificationAllowed);
        }
        Ok(())
    }

    /// Inserts `child` before `reference` (or last when `None`).
    ///
    /// A fragment moves its children in and is left empty. `child` is detached
    /// from its current parent first.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> DomResult<()> {
        self.ensure_insertable(parent, child)?;
        if let Some(reference) = reference {
            if self.parent(reference) != Some(parent) {
                return Err(DomError::NotFound);
            }
        }
        let reference = if reference == Some(child) {
            self.next_sibling(child)
        } else {
            reference
        };
        let moving = match self.kind(child) {
            NodeKind::DocumentFragment => self.data_of(child).children.clone(),
            _ => vec![child],
        };
        for node in &moving {
            self.detach(*node);
        }
        let mut index = match reference {
            Some(reference) => self
                .index_in_parent(reference)
                .ok_or(DomError::NotFound)?,
            None => self.child_count(parent),
        };
        for node in moving {
            self.data_of_mut(parent).children.insert(index, node);
            self.data_of_mut(node).parent = Some(parent);
            index += 1;
        }
        Ok(())
    }

    /// Appends a freshly created node without hierarchy checks.
    pub(crate) fn push_child(&mut self, parent: NodeId, child: NodeId) {
        debug_assert!(self.parent(child).is_none());
        self.data_of_mut(parent).children.push(child);
        self.data_of_mut(child).parent = Some(parent);
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<()> {
        self.insert_before(parent, child, None)
    }

    /// Inserts `node` immediately after `preceding`.
    pub fn insert_after(&mut self, node: NodeId, preceding: NodeId) -> DomResult<()> {
        let parent = self.parent(preceding).ok_or(DomError::NotFound)?;
        let next = self.next_sibling(preceding);
        self.insert_before(parent, node, next)
    }

    /// Inserts `child` before the node currently at `index` among `parent`'s
    /// children, or appends it when `index` is past the end. A `child` that
    /// is already an earlier sibling ends up at `index - 1`.
    pub fn insert_at(&mut self, parent: NodeId, child: NodeId, index: usize) -> DomResult<()> {
        let reference = self.child_at(parent, index);
        self.insert_before(parent, child, reference)
    }

    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<()> {
        if self.parent(child) != Some(parent) {
            return Err(DomError::NotFound);
        }
        self.detach(child);
        Ok(())
    }

    /// Removes `node` from its parent, if it has one.
    pub fn detach(&mut self, node: NodeId) {
        let Some(parent) = self.data_of_mut(node).parent.take() else {
            return;
        };
        self.data_of_mut(parent).children.retain(|c| *c != node);
    }

    /// Detaches every child of `node`.
    pub fn clear_children(&mut self, node: NodeId) {
        let children = std::mem::take(&mut self.data_of_mut(node).children);
        for child in children {
            self.data_of_mut(child).parent = None;
        }
    }

    /// Copies `node` (and with `deep`, its subtree) into new detached nodes.
    pub fn clone_node(&mut self, node: NodeId, deep: bool) -> NodeId {
        let copy = self.alloc(self.kind(node).clone());
        if deep {
            let children = self.data_of(node).children.clone();
            for child in children {
                let child_copy = self.clone_node(child, true);
                self.data_of_mut(child_copy).parent = Some(copy);
                self.data_of_mut(copy).children.push(child_copy);
            }
        }
        copy
    }

    // ---- character data ----

    pub fn data(&self, node: NodeId) -> Option<&str> {
        self.kind(node).character_data()
    }

    fn data_mut(&mut self, node: NodeId) -> DomResult<&mut String> {
        if self.is_read_only(node) {
            return Err(DomError::NoModificationAllowed);
        }
        match &mut self.data_of_mut(node).kind {
            NodeKind::Text(data)
            | NodeKind::Comment(data)
            | NodeKind::ProcessingInstruction { data, .. } => Ok(data),
            _ => Err(DomError::InvalidNodeType),
        }
    }

    pub fn set_data(&mut self, node: NodeId, value: &str) -> DomResult<()> {
        let data = self.data_mut(node)?;
        data.clear();
        data.push_str(value);
        Ok(())
    }

    pub fn insert_data(&mut self, node: NodeId, offset: usize, value: &str) -> DomResult<()> {
        let data = self.data_mut(node)?;
        if offset > char_len(data) {
            return Err(DomError::IndexSize);
        }
        insert_chars(data, offset, value);
        Ok(())
    }

    pub fn append_data(&mut self, node: NodeId, value: &str) -> DomResult<()> {
        self.data_mut(node)?.push_str(value);
        Ok(())
    }

    /// Deletes up to `count` characters from `offset`.
    pub fn delete_data(&mut self, node: NodeId, offset: usize, count: usize) -> DomResult<()> {
        let data = self.data_mut(node)?;
        if offset > char_len(data) {
            return Err(DomError::IndexSize);
        }
        delete_chars(data, offset, count);
        Ok(())
    }

    pub fn substring_data(&self, node: NodeId, offset: usize, count: usize) -> DomResult<String> {
        let data = self.data(node).ok_or(DomError::InvalidNodeType)?;
        if offset > char_len(data) {
            return Err(DomError::IndexSize);
        }
        Ok(slice_chars(data, offset, offset.saturating_add(count)).to_string())
    }

    // ---- elements ----

    pub fn element_name(&self, node: NodeId) -> Option<&str> {
        match self.kind(node) {
            NodeKind::Element { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn is_element_named(&self, node: NodeId, name: &str) -> bool {
        self.element_name(node)
            .is_some_and(|n| n.eq_ignore_ascii_case(name))
    }

    pub fn attributes(&self, node: NodeId) -> &[(String, String)] {
        match self.kind(node) {
            NodeKind::Element { attributes, .. } => attributes,
            _ => &[],
        }
    }

    pub fn get_attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.attributes(node)
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> DomResult<()> {
        if self.is_read_only(node) {
            return Err(DomError::NoModificationAllowed);
        }
        let NodeKind::Element { attributes, .. } = &mut self.data_of_mut(node).kind else {
            return Err(DomError::InvalidNodeType);
        };
        let name = name.to_ascii_lowercase();
        match attributes.iter_mut().find(|(k, _)| *k == name) {
            Some((_, existing)) => *existing = value.to_string(),
            None => attributes.push((name, value.to_string())),
        }
        Ok(())
    }

    /// Returns whether the attribute was present.
    pub fn remove_attribute(&mut self, node: NodeId, name: &str) -> DomResult<bool> {
        if self.is_read_only(node) {
            return Err(DomError::NoModificationAllowed);
        }
        let NodeKind::Element { attributes, .. } = &mut self.data_of_mut(node).kind else {
            return Err(DomError::InvalidNodeType);
        };
        let before = attributes.len();
        attributes.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        Ok(attributes.len() != before)
    }

    /// First connected element whose `id` attribute equals `id`, in document order.
    pub fn element_by_id(&self, id: &str) -> Option<NodeId> {
        crate::traverse::descendants(self, self.root())
            .find(|node| self.get_attribute(*node, "id") == Some(id))
    }

    /// Concatenated text of `node`: its own data for character data, the
    /// descendant text nodes otherwise.
    pub fn text_content(&self, node: NodeId) -> String {
        match self.kind(node) {
            NodeKind::Text(data)
            | NodeKind::Comment(data)
            | NodeKind::ProcessingInstruction { data, .. } => data.clone(),
            _ => {
                let mut out = String::new();
                for descendant in crate::traverse::descendants(self, node) {
                    if let NodeKind::Text(data) = self.kind(descendant) {
                        out.push_str(data);
                    }
                }
                out
            }
        }
    }

    // ---- read-only ----

    pub fn set_read_only(&mut self, node: NodeId, read_only: bool) {
        self.data_of_mut(node).read_only = read_only;
    }

    /// A node is read-only if it or an ancestor is flagged, or is a document
    /// type, notation or entity.
    pub fn is_read_only(&self, node: NodeId) -> bool {
        std::iter::once(node)
            .chain(self.ancestors(node))
            .any(|n| self.data_of(n).read_only || self.kind(n).is_forbidden_container())
    }

    /// Merges adjacent text nodes and drops empty ones below `node`.
    pub fn normalize(&mut self, node: NodeId) {
        let children = self.data_of(node).children.clone();
        let mut previous_text: Option<NodeId> = None;
        for child in children {
            let NodeKind::Text(data) = self.kind(child) else {
                previous_text = None;
                self.normalize(child);
                continue;
            };
            if data.is_empty() {
                self.detach(child);
                continue;
            }
            match previous_text {
                Some(previous) => {
                    let data = data.clone();
                    if let NodeKind::Text(existing) = &mut self.data_of_mut(previous).kind {
                        existing.push_str(&data);
                    }
                    self.detach(child);
                }
                None => previous_text = Some(child),
            }
        }
    }
}

pub struct Ancestors<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.doc.parent(current);
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc_with_div() -> (Document, NodeId) {
        let mut doc = Document::new();
        let div = doc.create_element("DIV");
        doc.append_child(doc.root(), div).unwrap();
        (doc, div)
    }

    #[test]
    fn append_and_insert_keep_sibling_order() {
        let (mut doc, div) = doc_with_div();
        let a = doc.create_text("a");
        let b = doc.create_text("b");
        let c = doc.create_text("c");
        doc.append_child(div, c).unwrap();
        doc.insert_before(div, a, Some(c)).unwrap();
        doc.insert_after(b, a).unwrap();
        assert_eq!(doc.children(div), &[a, b, c]);
        assert_eq!(doc.index_in_parent(b), Some(1));
        assert_eq!(doc.previous_sibling(b), Some(a));
        assert_eq!(doc.next_sibling(b), Some(c));
        assert_eq!(doc.element_name(div), Some("div"));
    }

    #[test]
    fn clone_is_a_separate_document() {
        let (doc, div) = doc_with_div();
        let copy = doc.clone();
        assert_ne!(copy.id(), doc.id());
        assert_eq!(copy.element_name(div), Some("div"));
        assert_eq!(copy.outer_html(div), doc.outer_html(div));
    }

    #[test]
    fn moving_a_node_detaches_it_first() {
        let (mut doc, div) = doc_with_div();
        let a = doc.create_text("a");
        let b = doc.create_text("b");
        doc.append_child(div, a).unwrap();
        doc.append_child(div, b).unwrap();
        doc.append_child(div, a).unwrap();
        assert_eq!(doc.children(div), &[b, a]);
        doc.insert_before(div, a, Some(a)).unwrap();
        assert_eq!(doc.children(div), &[b, a]);
    }

    #[test]
    fn fragment_insertion_moves_children() {
        let (mut doc, div) = doc_with_div();
        let frag = doc.create_fragment();
        let a = doc.create_text("a");
        let b = doc.create_element("b");
        doc.append_child(frag, a).unwrap();
        doc.append_child(frag, b).unwrap();
        doc.append_child(div, frag).unwrap();
        assert_eq!(doc.children(div), &[a, b]);
        assert!(doc.children(frag).is_empty());
        assert_eq!(doc.parent(frag), None);
    }

    #[test]
    fn cyclic_and_illegal_insertions_fail() {
        let (mut doc, div) = doc_with_div();
        let span = doc.create_element("span");
        doc.append_child(div, span).unwrap();
        assert_eq!(doc.append_child(span, div), Err(DomError::HierarchyRequest));
        assert_eq!(doc.append_child(div, div), Err(DomError::HierarchyRequest));
        let text = doc.create_text("t");
        let other = doc.create_text("u");
        assert_eq!(doc.append_child(text, other), Err(DomError::HierarchyRequest));
        let stray = doc.create_element("p");
        assert_eq!(
            doc.insert_before(div, other, Some(stray)),
            Err(DomError::NotFound)
        );
    }

    #[test]
    fn character_data_counts_scalars() {
        let mut doc = Document::new();
        let t = doc.create_text("a€c");
        doc.insert_data(t, 1, "b").unwrap();
        assert_eq!(doc.data(t), Some("ab€c"));
        doc.delete_data(t, 2, 1).unwrap();
        assert_eq!(doc.data(t), Some("abc"));
        assert_eq!(doc.substring_data(t, 1, 10).unwrap(), "bc");
        assert_eq!(doc.insert_data(t, 4, "x"), Err(DomError::IndexSize));
        let el = doc.create_element("p");
        assert_eq!(doc.set_data(el, "x"), Err(DomError::InvalidNodeType));
    }

    #[test]
    fn deep_clone_copies_subtree_detached() {
        let (mut doc, div) = doc_with_div();
        let t = doc.create_text("hi");
        doc.append_child(div, t).unwrap();
        doc.set_attribute(div, "id", "x").unwrap();
        let copy = doc.clone_node(div, true);
        assert_eq!(doc.parent(copy), None);
        assert_eq!(doc.get_attribute(copy, "id"), Some("x"));
        assert_eq!(doc.text_content(copy), "hi");
        assert_ne!(doc.children(copy)[0], t);
        let shallow = doc.clone_node(div, false);
        assert!(doc.children(shallow).is_empty());
    }

    #[test]
    fn read_only_is_inherited() {
        let (mut doc, div) = doc_with_div();
        let t = doc.create_text("x");
        doc.append_child(div, t).unwrap();
        doc.set_read_only(div, true);
        assert!(doc.is_read_only(t));
        assert_eq!(doc.append_data(t, "y"), Err(DomError::NoModificationAllowed));
        let p = doc.create_element("p");
        assert_eq!(doc.append_child(div, p), Err(DomError::NoModificationAllowed));
        let dt = doc.create_doctype("html");
        assert!(doc.is_read_only(dt));
    }

    #[test]
    fn normalize_merges_and_drops_text() {
        let (mut doc, div) = doc_with_div();
        let a = doc.create_text("a");
        let empty = doc.create_text("");
        let b = doc.create_text("b");
        let em = doc.create_element("em");
        let c = doc.create_text("c");
        for n in [a, empty, b, em, c] {
            doc.append_child(div, n).unwrap();
        }
        doc.normalize(div);
        assert_eq!(doc.children(div), &[a, em, c]);
        assert_eq!(doc.data(a), Some("ab"));
    }

    #[test]
    fn element_by_id_ignores_detached_nodes() {
        let (mut doc, div) = doc_with_div();
        doc.set_attribute(div, "id", "main").unwrap();
        let loose = doc.create_element_with("p", &[("id", "loose")]);
        assert_eq!(doc.element_by_id("main"), Some(div));
        assert_eq!(doc.element_by_id("loose"), None);
        assert!(!doc.is_connected(loose));
    }
}
