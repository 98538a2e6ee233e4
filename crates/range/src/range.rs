use dom::dom_utils::{
    compare_boundary_points, get_common_ancestor, get_root, has_forbidden_ancestor,
    inspect_node, is_orphan, node_index, node_length,
};
use dom::{BoundaryPoint, Document, DocumentId, DomError, DomResult, NodeId, NodeKind};
use std::cmp::Ordering;

/// Deepest partially selected subtree the content algorithms will descend into.
pub const MAX_SUBTREE_DEPTH: usize = 1024;

/// Which pair of boundaries [`Range::compare_boundary_points`] compares.
///
/// The names follow the DOM constants: `StartToEnd` compares this range's
/// end with the other range's start.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum How {
    StartToStart,
    StartToEnd,
    EndToEnd,
    EndToStart,
}

impl How {
    /// Host numbering of the selector.
    pub fn raw(self) -> u16 {
        match self {
            How::StartToStart => 0,
            How::StartToEnd => 1,
            How::EndToEnd => 2,
            How::EndToStart => 3,
        }
    }

    pub fn from_raw(raw: u16) -> Option<How> {
        match raw {
            0 => Some(How::StartToStart),
            1 => Some(How::StartToEnd),
            2 => Some(How::EndToEnd),
            3 => Some(How::EndToStart),
            _ => None,
        }
    }

    /// `StartToEnd` and `EndToStart` exchanged.
    pub fn swapped(self) -> How {
        match self {
            How::StartToEnd => How::EndToStart,
            How::EndToStart => How::StartToEnd,
            other => other,
        }
    }

    /// (this range uses its start, other range uses its start)
    fn sides(self) -> (bool, bool) {
        match self {
            How::StartToStart => (true, true),
            How::StartToEnd => (false, true),
            How::EndToEnd => (false, false),
            How::EndToStart => (true, false),
        }
    }
}

/// Argument forms accepted by [`Range::set_start_and_end`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Boundaries {
    /// Both boundaries at one point.
    Point(NodeId, usize),
    /// Start and end offsets in one container.
    Shared(NodeId, usize, usize),
    Full(BoundaryPoint, BoundaryPoint),
}

impl Boundaries {
    fn points(self) -> (BoundaryPoint, BoundaryPoint) {
        match self {
            Boundaries::Point(node, offset) => {
                let p = BoundaryPoint::new(node, offset);
                (p, p)
            }
            Boundaries::Shared(node, start, end) => {
                (BoundaryPoint::new(node, start), BoundaryPoint::new(node, end))
            }
            Boundaries::Full(start, end) => (start, end),
        }
    }
}

impl From<(NodeId, usize)> for Boundaries {
    fn from((node, offset): (NodeId, usize)) -> Self {
        Boundaries::Point(node, offset)
    }
}

impl From<(NodeId, usize, usize)> for Boundaries {
    fn from((node, start, end): (NodeId, usize, usize)) -> Self {
        Boundaries::Shared(node, start, end)
    }
}

impl From<(NodeId, usize, NodeId, usize)> for Boundaries {
    fn from((sc, so, ec, eo): (NodeId, usize, NodeId, usize)) -> Self {
        Boundaries::Full(BoundaryPoint::new(sc, so), BoundaryPoint::new(ec, eo))
    }
}

impl From<(BoundaryPoint, BoundaryPoint)> for Boundaries {
    fn from((start, end): (BoundaryPoint, BoundaryPoint)) -> Self {
        Boundaries::Full(start, end)
    }
}

/// A pair of boundary points in one [`Document`].
///
/// The range only stores node handles; every operation borrows the document
/// explicitly. Validity is checked lazily: an operation on a range whose
/// containers were moved out of one tree, or whose offsets no longer fit,
/// fails with [`DomError::InvalidRange`] instead of guessing.
#[derive(Clone, Debug)]
pub struct Range {
    pub(crate) doc: DocumentId,
    pub(crate) start: BoundaryPoint,
    pub(crate) end: BoundaryPoint,
    collapsed: bool,
    common_ancestor: NodeId,
    pub(crate) max_depth: usize,
}

impl Range {
    /// A collapsed range at the start of the document.
    pub fn new(doc: &Document) -> Self {
        let origin = BoundaryPoint::new(doc.root(), 0);
        Self {
            doc: doc.id(),
            start: origin,
            end: origin,
            collapsed: true,
            common_ancestor: doc.root(),
            max_depth: MAX_SUBTREE_DEPTH,
        }
    }

    pub fn from_points(
        doc: &Document,
        start: BoundaryPoint,
        end: BoundaryPoint,
    ) -> DomResult<Self> {
        let mut range = Range::new(doc);
        range.set_start_and_end(doc, (start, end))?;
        Ok(range)
    }

    /// Overrides the subtree depth limit used by the content operations.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    #[inline]
    pub fn document_id(&self) -> DocumentId {
        self.doc
    }

    #[inline]
    pub fn start(&self) -> BoundaryPoint {
        self.start
    }

    #[inline]
    pub fn end(&self) -> BoundaryPoint {
        self.end
    }

    #[inline]
    pub fn start_container(&self) -> NodeId {
        self.start.node
    }

    #[inline]
    pub fn start_offset(&self) -> usize {
        self.start.offset
    }

    #[inline]
    pub fn end_container(&self) -> NodeId {
        self.end.node
    }

    #[inline]
    pub fn end_offset(&self) -> usize {
        self.end.offset
    }

    #[inline]
    pub fn collapsed(&self) -> bool {
        self.collapsed
    }

    #[inline]
    pub fn common_ancestor(&self) -> NodeId {
        self.common_ancestor
    }

    /// Every boundary change ends here so the derived fields never go stale.
    pub(crate) fn update_boundaries(
        &mut self,
        doc: &Document,
        start: BoundaryPoint,
        end: BoundaryPoint,
    ) {
        self.start = start;
        self.end = end;
        self.collapsed = start == end;
        self.common_ancestor = get_common_ancestor(doc, start.node, end.node).unwrap_or(start.node);
        log::trace!(
            target: "range",
            "boundaries {}:{} .. {}:{}",
            start.node,
            start.offset,
            end.node,
            end.offset
        );
    }

    // ---- validation ----

    pub(crate) fn check_document(&self, doc: &Document) -> DomResult<()> {
        if doc.id() != self.doc {
            return Err(DomError::WrongDocument);
        }
        Ok(())
    }

    pub(crate) fn check_node(&self, doc: &Document, node: NodeId) -> DomResult<()> {
        self.check_document(doc)?;
        if !doc.contains(node) {
            return Err(DomError::WrongDocument);
        }
        Ok(())
    }

    fn invalid_reason(&self, doc: &Document) -> Option<String> {
        for (label, point) in [("start", self.start), ("end", self.end)] {
            if !doc.contains(point.node) {
                return Some(format!("{label} container {} is not in this document", point.node));
            }
            if is_orphan(doc, point.node) {
                return Some(format!(
                    "{label} container {} is not inside a document or fragment",
                    point.node
                ));
            }
            let length = node_length(doc, point.node);
            if point.offset > length {
                return Some(format!(
                    "{label} offset {} exceeds length {length} of {}",
                    point.offset, point.node
                ));
            }
        }
        if get_root(doc, self.start.node) != get_root(doc, self.end.node) {
            return Some("boundaries are in different trees".to_string());
        }
        None
    }

    pub fn is_valid(&self, doc: &Document) -> bool {
        doc.id() == self.doc && self.invalid_reason(doc).is_none()
    }

    pub fn ensure_valid(&self, doc: &Document) -> DomResult<()> {
        self.check_document(doc)?;
        match self.invalid_reason(doc) {
            Some(reason) => {
                log::debug!(target: "range", "invalid range: {reason}");
                Err(DomError::InvalidRange(reason))
            }
            None => Ok(()),
        }
    }

    // ---- boundary setters ----

    pub fn set_start(&mut self, doc: &Document, node: NodeId, offset: usize) -> DomResult<()> {
        self.check_node(doc, node)?;
        check_container(doc, node, offset)?;
        let start = BoundaryPoint::new(node, offset);
        let end = if is_after(doc, start, self.end) {
            start
        } else {
            self.end
        };
        self.update_boundaries(doc, start, end);
        Ok(())
    }

    pub fn set_end(&mut self, doc: &Document, node: NodeId, offset: usize) -> DomResult<()> {
        self.check_node(doc, node)?;
        check_container(doc, node, offset)?;
        let end = BoundaryPoint::new(node, offset);
        let start = if is_after(doc, self.start, end) {
            end
        } else {
            self.start
        };
        self.update_boundaries(doc, start, end);
        Ok(())
    }

    pub fn set_start_before(&mut self, doc: &Document, node: NodeId) -> DomResult<()> {
        self.check_node(doc, node)?;
        let parent = before_after_parent(doc, node)?;
        self.set_start(doc, parent, node_index(doc, node))
    }

    pub fn set_start_after(&mut self, doc: &Document, node: NodeId) -> DomResult<()> {
        self.check_node(doc, node)?;
        let parent = before_after_parent(doc, node)?;
        self.set_start(doc, parent, node_index(doc, node) + 1)
    }

    pub fn set_end_before(&mut self, doc: &Document, node: NodeId) -> DomResult<()> {
        self.check_node(doc, node)?;
        let parent = before_after_parent(doc, node)?;
        self.set_end(doc, parent, node_index(doc, node))
    }

    pub fn set_end_after(&mut self, doc: &Document, node: NodeId) -> DomResult<()> {
        self.check_node(doc, node)?;
        let parent = before_after_parent(doc, node)?;
        self.set_end(doc, parent, node_index(doc, node) + 1)
    }

    /// Sets both boundaries at once from a 2-, 3- or 4-part tuple.
    ///
    /// An end before the start collapses the range to the end, as calling
    /// `set_start` then `set_end` would.
    pub fn set_start_and_end(
        &mut self,
        doc: &Document,
        boundaries: impl Into<Boundaries>,
    ) -> DomResult<()> {
        let (start, end) = boundaries.into().points();
        for point in [start, end] {
            self.check_node(doc, point.node)?;
            check_container(doc, point.node, point.offset)?;
        }
        let start = if is_after(doc, start, end) { end } else { start };
        self.update_boundaries(doc, start, end);
        Ok(())
    }

    pub fn select_node(&mut self, doc: &Document, node: NodeId) -> DomResult<()> {
        self.check_node(doc, node)?;
        let parent = before_after_parent(doc, node)?;
        let index = node_index(doc, node);
        self.update_boundaries(
            doc,
            BoundaryPoint::new(parent, index),
            BoundaryPoint::new(parent, index + 1),
        );
        Ok(())
    }

    pub fn select_node_contents(&mut self, doc: &Document, node: NodeId) -> DomResult<()> {
        self.check_node(doc, node)?;
        if has_forbidden_ancestor(doc, node).is_some() {
            return Err(DomError::InvalidNodeType);
        }
        self.update_boundaries(
            doc,
            BoundaryPoint::new(node, 0),
            BoundaryPoint::new(node, node_length(doc, node)),
        );
        Ok(())
    }

    pub fn collapse(&mut self, doc: &Document, to_start: bool) {
        let point = if to_start { self.start } else { self.end };
        self.update_boundaries(doc, point, point);
    }

    pub fn collapse_to_point(
        &mut self,
        doc: &Document,
        node: NodeId,
        offset: usize,
    ) -> DomResult<()> {
        self.set_start_and_end(doc, (node, offset))
    }

    pub fn collapse_before(&mut self, doc: &Document, node: NodeId) -> DomResult<()> {
        self.set_end_before(doc, node)?;
        self.collapse(doc, false);
        Ok(())
    }

    pub fn collapse_after(&mut self, doc: &Document, node: NodeId) -> DomResult<()> {
        self.set_start_after(doc, node)?;
        self.collapse(doc, true);
        Ok(())
    }

    // ---- comparison ----

    pub fn compare_boundary_points(
        &self,
        doc: &Document,
        how: How,
        other: &Range,
    ) -> DomResult<Ordering> {
        self.ensure_valid(doc)?;
        other.ensure_valid(doc)?;
        if get_root(doc, self.start.node) != get_root(doc, other.start.node) {
            return Err(DomError::WrongDocument);
        }
        let (mine, theirs) = how.sides();
        let a = if mine { self.start } else { self.end };
        let b = if theirs { other.start } else { other.end };
        compare_boundary_points(doc, a, b)
    }

    /// Same boundaries as `other`.
    pub fn equals(&self, other: &Range) -> bool {
        self.doc == other.doc && self.start == other.start && self.end == other.end
    }

    pub fn inspect(&self, doc: &Document) -> String {
        format!(
            "[DomRange({}:{}, {}:{})]",
            inspect_node(doc, self.start.node),
            self.start.offset,
            inspect_node(doc, self.end.node),
            self.end.offset
        )
    }
}

/// Offset and container checks shared by every boundary setter.
fn check_container(doc: &Document, node: NodeId, offset: usize) -> DomResult<()> {
    if has_forbidden_ancestor(doc, node).is_some() {
        return Err(DomError::InvalidNodeType);
    }
    if offset > node_length(doc, node) {
        return Err(DomError::IndexSize);
    }
    Ok(())
}

/// Parent of a node used as a before/after reference.
fn before_after_parent(doc: &Document, node: NodeId) -> DomResult<NodeId> {
    let root = get_root(doc, node);
    if !matches!(
        doc.kind(root),
        NodeKind::Document | NodeKind::DocumentFragment
    ) {
        return Err(DomError::InvalidNodeType);
    }
    match doc.kind(node) {
        NodeKind::Document
        | NodeKind::DocumentFragment
        | NodeKind::Notation { .. }
        | NodeKind::Entity { .. } => Err(DomError::InvalidNodeType),
        _ => doc.parent(node).ok_or(DomError::InvalidNodeType),
    }
}

/// Whether `a` lies after `b`, counting points in different trees as after.
pub(crate) fn is_after(doc: &Document, a: BoundaryPoint, b: BoundaryPoint) -> bool {
    if get_root(doc, a.node) != get_root(doc, b.node) {
        return true;
    }
    compare_boundary_points(doc, a, b).map_or(true, |o| o == Ordering::Greater)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// `<div id="d"><p>abc</p><p>de<b>f</b></p></div>`
    fn fixture() -> (Document, NodeId) {
        let doc = Document::parse_html(r#"<div id="d"><p>abc</p><p>de<b>f</b></p></div>"#).unwrap();
        let div = doc.element_by_id("d").unwrap();
        (doc, div)
    }

    fn text_of(doc: &Document, p: NodeId) -> NodeId {
        doc.first_child(p).unwrap()
    }

    #[test]
    fn new_range_is_collapsed_at_document_start() {
        let doc = Document::new();
        let range = Range::new(&doc);
        assert!(range.collapsed());
        assert_eq!(range.start(), BoundaryPoint::new(doc.root(), 0));
        assert_eq!(range.common_ancestor(), doc.root());
        assert!(range.is_valid(&doc));
    }

    #[test]
    fn set_start_and_end_updates_derived_state() {
        let (doc, div) = fixture();
        let p1 = doc.child_at(div, 0).unwrap();
        let p2 = doc.child_at(div, 1).unwrap();
        let mut range = Range::new(&doc);
        range.set_start(&doc, text_of(&doc, p1), 1).unwrap();
        range.set_end(&doc, text_of(&doc, p2), 1).unwrap();
        assert!(!range.collapsed());
        assert_eq!(range.common_ancestor(), div);

        range.set_end(&doc, text_of(&doc, p1), 2).unwrap();
        assert_eq!(range.common_ancestor(), text_of(&doc, p1));
    }

    #[test]
    fn offsets_past_node_length_are_index_size_errors() {
        let (doc, div) = fixture();
        let p1 = doc.child_at(div, 0).unwrap();
        let t1 = text_of(&doc, p1);
        let mut range = Range::new(&doc);
        assert_eq!(range.set_start(&doc, t1, 4), Err(DomError::IndexSize));
        assert_eq!(range.set_end(&doc, div, 3), Err(DomError::IndexSize));
        assert_eq!(range.set_start_and_end(&doc, (t1, 0, 9)), Err(DomError::IndexSize));
        // A failed call leaves the range untouched.
        assert_eq!(range.start(), BoundaryPoint::new(doc.root(), 0));
        for offset in 0..=3 {
            assert!(range.set_start(&doc, t1, offset).is_ok());
        }
    }

    #[test]
    fn forbidden_containers_are_rejected() {
        let mut doc = Document::new();
        let doctype = doc.create_doctype("html");
        doc.append_child(doc.root(), doctype).unwrap();
        let mut range = Range::new(&doc);
        assert_eq!(range.set_start(&doc, doctype, 0), Err(DomError::InvalidNodeType));
        assert_eq!(range.select_node_contents(&doc, doctype), Err(DomError::InvalidNodeType));
    }

    #[test]
    fn crossing_boundaries_collapse() {
        let (doc, div) = fixture();
        let p1 = doc.child_at(div, 0).unwrap();
        let p2 = doc.child_at(div, 1).unwrap();
        let mut range = Range::new(&doc);
        range.set_start_and_end(&doc, (p1, 0, 1)).unwrap();
        range.set_start(&doc, p2, 0).unwrap();
        assert!(range.collapsed());
        assert_eq!(range.end(), BoundaryPoint::new(p2, 0));

        range.set_start_and_end(&doc, (p2, 0, 2)).unwrap();
        range.set_end(&doc, p1, 0).unwrap();
        assert!(range.collapsed());
        assert_eq!(range.start(), BoundaryPoint::new(p1, 0));
    }

    #[test]
    fn reversed_set_start_and_end_collapses_to_end() {
        let (doc, div) = fixture();
        let t1 = text_of(&doc, doc.child_at(div, 0).unwrap());
        let mut range = Range::new(&doc);
        range.set_start_and_end(&doc, (t1, 3, 1)).unwrap();
        assert!(range.collapsed());
        assert_eq!(range.start(), BoundaryPoint::new(t1, 1));
    }

    #[test]
    fn start_in_other_tree_collapses() {
        let (mut doc, div) = fixture();
        let frag = doc.create_fragment();
        let t = doc.create_text("xyz");
        doc.append_child(frag, t).unwrap();
        let mut range = Range::new(&doc);
        range.select_node_contents(&doc, div).unwrap();
        range.set_start(&doc, t, 1).unwrap();
        assert!(range.collapsed());
        assert_eq!(range.end(), BoundaryPoint::new(t, 1));
    }

    #[test]
    fn before_after_setters_and_select_node() {
        let (doc, div) = fixture();
        let p2 = doc.child_at(div, 1).unwrap();
        let mut range = Range::new(&doc);
        range.select_node(&doc, p2).unwrap();
        assert_eq!(range.start(), BoundaryPoint::new(div, 1));
        assert_eq!(range.end(), BoundaryPoint::new(div, 2));

        range.set_start_before(&doc, doc.child_at(div, 0).unwrap()).unwrap();
        assert_eq!(range.start(), BoundaryPoint::new(div, 0));
        range.collapse_after(&doc, p2).unwrap();
        assert!(range.collapsed());
        assert_eq!(range.start(), BoundaryPoint::new(div, 2));
        range.collapse_before(&doc, p2).unwrap();
        assert_eq!(range.end(), BoundaryPoint::new(div, 1));

        assert_eq!(range.select_node(&doc, doc.root()), Err(DomError::InvalidNodeType));
    }

    #[test]
    fn before_after_requires_document_or_fragment_root() {
        let mut doc = Document::new();
        let orphan = doc.create_element("p");
        let child = doc.create_text("x");
        doc.append_child(orphan, child).unwrap();
        let mut range = Range::new(&doc);
        assert_eq!(range.set_start_before(&doc, child), Err(DomError::InvalidNodeType));
        assert_eq!(range.select_node(&doc, child), Err(DomError::InvalidNodeType));
    }

    #[test]
    fn compare_boundary_points_uses_dom_prefixes() {
        let mut doc = Document::new();
        let t = doc.create_text("test");
        doc.append_child(doc.root(), t).unwrap();
        let a = Range::from_points(&doc, (t, 0).into(), (t, 3).into()).unwrap();
        let b = Range::from_points(&doc, (t, 2).into(), (t, 4).into()).unwrap();
        let cmp = |how| a.compare_boundary_points(&doc, how, &b).unwrap();
        assert_eq!(cmp(How::StartToStart), Ordering::Less);
        assert_eq!(cmp(How::StartToEnd), Ordering::Greater);
        assert_eq!(cmp(How::EndToStart), Ordering::Less);
        assert_eq!(cmp(How::EndToEnd), Ordering::Less);
        assert_eq!(How::from_raw(How::EndToStart.raw()), Some(How::EndToStart));
        assert_eq!(How::StartToEnd.swapped(), How::EndToStart);
    }

    #[test]
    fn detached_containers_make_the_range_invalid() {
        let (mut doc, div) = fixture();
        let p1 = doc.child_at(div, 0).unwrap();
        let t1 = text_of(&doc, p1);
        let mut range = Range::new(&doc);
        range.set_start_and_end(&doc, (t1, 1, 3)).unwrap();
        assert!(range.is_valid(&doc));
        let copy = doc.clone();
        assert_eq!(range.ensure_valid(&copy), Err(DomError::WrongDocument));
        doc.detach(p1);
        assert!(!range.is_valid(&doc));
        assert!(matches!(range.ensure_valid(&doc), Err(DomError::InvalidRange(_))));

        let other = Document::new();
        assert_eq!(range.ensure_valid(&other), Err(DomError::WrongDocument));
    }

    #[test]
    fn shrunk_container_invalidates_offsets() {
        let (mut doc, div) = fixture();
        let t1 = text_of(&doc, doc.child_at(div, 0).unwrap());
        let mut range = Range::new(&doc);
        range.set_start_and_end(&doc, (t1, 1, 3)).unwrap();
        doc.set_data(t1, "a").unwrap();
        let err = range.ensure_valid(&doc).unwrap_err();
        assert!(
            matches!(err, DomError::InvalidRange(ref m) if m.contains("end offset 3")),
            "{err:?}"
        );
    }

    #[test]
    fn inspect_names_both_boundaries() {
        let (doc, div) = fixture();
        let t1 = text_of(&doc, doc.child_at(div, 0).unwrap());
        let mut range = Range::new(&doc);
        range.set_start_and_end(&doc, (t1, 1, 2)).unwrap();
        assert_eq!(range.inspect(&doc), r#"[DomRange("abc":1, "abc":2)]"#);
    }
}
