use crate::bookmark::Bookmark;
use crate::range::{Boundaries, How, Range};
use dom::{BoundaryPoint, Document, DocumentId, DomResult, NodeId};
use std::cmp::Ordering;
use std::fmt;

/// Behaviour shared by the plain [`Range`] and host-backed ranges.
///
/// Implementors keep a [`Range`] describing their current boundaries and
/// accept new boundaries through [`set_boundaries`](Self::set_boundaries).
/// Every provided edit runs on a copy of that range and then commits the
/// resulting boundaries, so a host-backed range only has to know how to
/// move its own boundaries.
pub trait RangeLike: fmt::Debug {
    fn range(&self) -> &Range;

    fn set_boundaries(
        &mut self,
        doc: &Document,
        start: BoundaryPoint,
        end: BoundaryPoint,
    ) -> DomResult<()>;

    fn delete_contents(&mut self, doc: &mut Document) -> DomResult<()>;

    fn extract_contents(&mut self, doc: &mut Document) -> DomResult<NodeId>;

    fn compare_boundary_points(&self, doc: &Document, how: How, other: &Range)
    -> DomResult<Ordering>;

    fn inspect(&self, doc: &Document) -> String;

    fn document_id(&self) -> DocumentId {
        self.range().document_id()
    }

    fn start(&self) -> BoundaryPoint {
        self.range().start()
    }

    fn end(&self) -> BoundaryPoint {
        self.range().end()
    }

    fn collapsed(&self) -> bool {
        self.range().collapsed()
    }

    fn common_ancestor(&self) -> NodeId {
        self.range().common_ancestor()
    }

    /// Independent copy of the current boundaries.
    fn to_range(&self) -> Range {
        self.range().clone()
    }

    fn set_start(&mut self, doc: &Document, node: NodeId, offset: usize) -> DomResult<()> {
        commit(self, doc, |r, doc| r.set_start(doc, node, offset))
    }

    fn set_end(&mut self, doc: &Document, node: NodeId, offset: usize) -> DomResult<()> {
        commit(self, doc, |r, doc| r.set_end(doc, node, offset))
    }

    fn set_start_before(&mut self, doc: &Document, node: NodeId) -> DomResult<()> {
        commit(self, doc, |r, doc| r.set_start_before(doc, node))
    }

    fn set_start_after(&mut self, doc: &Document, node: NodeId) -> DomResult<()> {
        commit(self, doc, |r, doc| r.set_start_after(doc, node))
    }

    fn set_end_before(&mut self, doc: &Document, node: NodeId) -> DomResult<()> {
        commit(self, doc, |r, doc| r.set_end_before(doc, node))
    }

    fn set_end_after(&mut self, doc: &Document, node: NodeId) -> DomResult<()> {
        commit(self, doc, |r, doc| r.set_end_after(doc, node))
    }

    fn set_start_and_end(&mut self, doc: &Document, boundaries: Boundaries) -> DomResult<()> {
        commit(self, doc, |r, doc| r.set_start_and_end(doc, boundaries))
    }

    fn select_node(&mut self, doc: &Document, node: NodeId) -> DomResult<()> {
        commit(self, doc, |r, doc| r.select_node(doc, node))
    }

    fn select_node_contents(&mut self, doc: &Document, node: NodeId) -> DomResult<()> {
        commit(self, doc, |r, doc| r.select_node_contents(doc, node))
    }

    fn collapse(&mut self, doc: &Document, to_start: bool) -> DomResult<()> {
        commit(self, doc, |r, doc| {
            r.collapse(doc, to_start);
            Ok(())
        })
    }

    fn collapse_to_point(&mut self, doc: &Document, node: NodeId, offset: usize) -> DomResult<()> {
        commit(self, doc, |r, doc| r.collapse_to_point(doc, node, offset))
    }

    fn select_characters(
        &mut self,
        doc: &Document,
        container: NodeId,
        start: usize,
        end: usize,
    ) -> DomResult<()> {
        commit(self, doc, |r, doc| r.select_characters(doc, container, start, end))
    }

    fn move_to_bookmark(&mut self, doc: &Document, bookmark: &Bookmark) -> DomResult<()> {
        commit(self, doc, |r, doc| r.move_to_bookmark(doc, bookmark))
    }

    fn get_bookmark(&self, doc: &Document, container: NodeId) -> DomResult<Bookmark> {
        self.range().get_bookmark(doc, container)
    }

    fn text(&self, doc: &Document) -> DomResult<String> {
        self.range().text(doc)
    }

    fn clone_contents(&self, doc: &mut Document) -> DomResult<NodeId> {
        self.range().clone_contents(doc)
    }

    fn to_html(&self, doc: &mut Document) -> DomResult<String> {
        self.range().to_html(doc)
    }

    fn insert_node(&mut self, doc: &mut Document, node: NodeId) -> DomResult<()> {
        commit_mut(self, doc, |r, doc| r.insert_node(doc, node))
    }

    fn surround_contents(&mut self, doc: &mut Document, new_parent: NodeId) -> DomResult<()> {
        commit_mut(self, doc, |r, doc| r.surround_contents(doc, new_parent))
    }

    fn split_boundaries(&mut self, doc: &mut Document) -> DomResult<()> {
        commit_mut(self, doc, |r, doc| r.split_boundaries(doc))
    }

    fn normalize_boundaries(&mut self, doc: &mut Document) -> DomResult<()> {
        commit_mut(self, doc, |r, doc| r.normalize_boundaries(doc))
    }
}

fn commit<R: RangeLike + ?Sized>(
    this: &mut R,
    doc: &Document,
    edit: impl FnOnce(&mut Range, &Document) -> DomResult<()>,
) -> DomResult<()> {
    let mut scratch = this.range().clone();
    edit(&mut scratch, doc)?;
    this.set_boundaries(doc, scratch.start(), scratch.end())
}

fn commit_mut<R: RangeLike + ?Sized, T>(
    this: &mut R,
    doc: &mut Document,
    edit: impl FnOnce(&mut Range, &mut Document) -> DomResult<T>,
) -> DomResult<T> {
    let mut scratch = this.range().clone();
    let out = edit(&mut scratch, doc)?;
    this.set_boundaries(doc, scratch.start(), scratch.end())?;
    Ok(out)
}

impl RangeLike for Range {
    fn range(&self) -> &Range {
        self
    }

    fn set_boundaries(
        &mut self,
        doc: &Document,
        start: BoundaryPoint,
        end: BoundaryPoint,
    ) -> DomResult<()> {
        Range::set_start_and_end(self, doc, (start, end))
    }

    fn delete_contents(&mut self, doc: &mut Document) -> DomResult<()> {
        Range::delete_contents(self, doc)
    }

    fn extract_contents(&mut self, doc: &mut Document) -> DomResult<NodeId> {
        Range::extract_contents(self, doc)
    }

    fn compare_boundary_points(
        &self,
        doc: &Document,
        how: How,
        other: &Range,
    ) -> DomResult<Ordering> {
        Range::compare_boundary_points(self, doc, how, other)
    }

    fn inspect(&self, doc: &Document) -> String {
        Range::inspect(self, doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trait_object_edits_reach_the_range() {
        let mut doc = Document::parse_html(r#"<p id="p">abcdef</p>"#).unwrap();
        let p = doc.element_by_id("p").unwrap();
        let t = doc.first_child(p).unwrap();
        let mut boxed: Box<dyn RangeLike> = Box::new(Range::new(&doc));
        boxed.set_start_and_end(&doc, (t, 1, 4).into()).unwrap();
        assert_eq!(boxed.text(&doc).unwrap(), "bcd");

        let b = doc.create_element("b");
        boxed.surround_contents(&mut doc, b).unwrap();
        assert_eq!(doc.inner_html(p), "a<b>bcd</b>ef");
        assert_eq!(boxed.start(), BoundaryPoint::new(p, 1));
        assert_eq!(boxed.end(), BoundaryPoint::new(p, 2));

        boxed.collapse(&doc, false).unwrap();
        assert!(boxed.collapsed());
        assert_eq!(boxed.to_range().start(), BoundaryPoint::new(p, 2));
    }

    #[test]
    fn failed_edit_leaves_boundaries_alone() {
        let doc = Document::parse_html("<p>abc</p>").unwrap();
        let t = doc.first_child(doc.first_child(doc.root()).unwrap()).unwrap();
        let mut range = Range::new(&doc);
        range.set_start_and_end(&doc, (t, 0, 2)).unwrap();
        let like: &mut dyn RangeLike = &mut range;
        assert!(like.set_end(&doc, t, 9).is_err());
        assert_eq!(like.end(), BoundaryPoint::new(t, 2));
    }
}
