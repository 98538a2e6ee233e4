use crate::range::Range;
use dom::dom_utils::{compare_boundary_points, get_root, node_index, node_length};
use dom::{BoundaryPoint, Document, DomError, DomResult, NodeId, NodeType};
use std::cmp::Ordering;

/// Position of a node relative to a range, as reported by
/// [`Range::compare_node`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodePosition {
    /// Starts before the range and ends inside or at it.
    Before,
    /// Starts inside the range and ends after it.
    After,
    /// Starts before and ends after the range.
    BeforeAndAfter,
    Inside,
}

impl Range {
    fn same_tree(&self, doc: &Document, node: NodeId) -> bool {
        get_root(doc, node) == get_root(doc, self.start.node)
    }

    /// `Less` before the range, `Equal` inside it (boundaries included),
    /// `Greater` after it.
    pub fn compare_point(
        &self,
        doc: &Document,
        node: NodeId,
        offset: usize,
    ) -> DomResult<Ordering> {
        self.ensure_valid(doc)?;
        self.check_node(doc, node)?;
        if !self.same_tree(doc, node) {
            return Err(DomError::WrongDocument);
        }
        if offset > node_length(doc, node) {
            return Err(DomError::IndexSize);
        }
        let point = BoundaryPoint::new(node, offset);
        if compare_boundary_points(doc, point, self.start)? == Ordering::Less {
            return Ok(Ordering::Less);
        }
        if compare_boundary_points(doc, point, self.end)? == Ordering::Greater {
            return Ok(Ordering::Greater);
        }
        Ok(Ordering::Equal)
    }

    /// Points in another tree are never in the range.
    pub fn is_point_in_range(
        &self,
        doc: &Document,
        node: NodeId,
        offset: usize,
    ) -> DomResult<bool> {
        self.ensure_valid(doc)?;
        self.check_node(doc, node)?;
        if !self.same_tree(doc, node) {
            return Ok(false);
        }
        Ok(self.compare_point(doc, node, offset)? == Ordering::Equal)
    }

    pub fn compare_node(&self, doc: &Document, node: NodeId) -> DomResult<NodePosition> {
        self.ensure_valid(doc)?;
        self.check_node(doc, node)?;
        let parent = doc.parent(node).ok_or(DomError::NotFound)?;
        let index = node_index(doc, node);
        let starts = self.compare_point(doc, parent, index)?;
        let ends = self.compare_point(doc, parent, index + 1)?;
        Ok(match (starts == Ordering::Less, ends == Ordering::Greater) {
            (true, true) => NodePosition::BeforeAndAfter,
            (true, false) => NodePosition::Before,
            (false, true) => NodePosition::After,
            (false, false) => NodePosition::Inside,
        })
    }

    /// Whether any part of `node` lies in the range. With `touching`, a node
    /// that only shares a boundary with the range counts too.
    pub fn intersects_node(&self, doc: &Document, node: NodeId, touching: bool) -> DomResult<bool> {
        self.ensure_valid(doc)?;
        self.check_node(doc, node)?;
        if !self.same_tree(doc, node) {
            return Ok(false);
        }
        let Some(parent) = doc.parent(node) else {
            return Ok(true);
        };
        let index = node_index(doc, node);
        let starts = compare_boundary_points(doc, BoundaryPoint::new(parent, index), self.end)?;
        let ends = compare_boundary_points(doc, BoundaryPoint::new(parent, index + 1), self.start)?;
        Ok(if touching {
            starts != Ordering::Greater && ends != Ordering::Less
        } else {
            starts == Ordering::Less && ends == Ordering::Greater
        })
    }

    /// Whether `node` lies wholly in the range, or with `allow_partial` any
    /// part of it.
    pub fn contains_node(
        &self,
        doc: &Document,
        node: NodeId,
        allow_partial: bool,
    ) -> DomResult<bool> {
        if allow_partial {
            self.intersects_node(doc, node, false)
        } else {
            Ok(self.compare_node(doc, node)? == NodePosition::Inside)
        }
    }

    pub fn contains_node_contents(&self, doc: &Document, node: NodeId) -> DomResult<bool> {
        Ok(self.compare_point(doc, node, 0)? != Ordering::Less
            && self.compare_point(doc, node, node_length(doc, node))? != Ordering::Greater)
    }

    /// Whether all of the text inside `node` is in the range. Without text,
    /// falls back to [`contains_node_contents`](Self::contains_node_contents).
    pub fn contains_node_text(&self, doc: &Document, node: NodeId) -> DomResult<bool> {
        let mut node_range = self.clone();
        node_range.select_node(doc, node)?;
        let texts = node_range.get_nodes_of_type(doc, &[NodeType::Text])?;
        match (texts.first(), texts.last()) {
            (Some(&first), Some(&last)) => {
                node_range.set_start(doc, first, 0)?;
                node_range.set_end(doc, last, node_length(doc, last))?;
                self.contains_range(doc, &node_range)
            }
            _ => self.contains_node_contents(doc, node),
        }
    }

    pub fn contains_range(&self, doc: &Document, other: &Range) -> DomResult<bool> {
        Ok(self
            .intersection(doc, other)?
            .is_some_and(|common| other.equals(&common)))
    }

    fn intersects(&self, doc: &Document, other: &Range, touching: bool) -> DomResult<bool> {
        self.ensure_valid(doc)?;
        other.ensure_valid(doc)?;
        if get_root(doc, self.start.node) != get_root(doc, other.start.node) {
            return Err(DomError::WrongDocument);
        }
        let starts = compare_boundary_points(doc, self.start, other.end)?;
        let ends = compare_boundary_points(doc, self.end, other.start)?;
        Ok(if touching {
            starts != Ordering::Greater && ends != Ordering::Less
        } else {
            starts == Ordering::Less && ends == Ordering::Greater
        })
    }

    pub fn intersects_range(&self, doc: &Document, other: &Range) -> DomResult<bool> {
        self.intersects(doc, other, false)
    }

    pub fn intersects_or_touches_range(&self, doc: &Document, other: &Range) -> DomResult<bool> {
        self.intersects(doc, other, true)
    }

    /// The overlap of two ranges, `None` when they do not intersect.
    pub fn intersection(&self, doc: &Document, other: &Range) -> DomResult<Option<Range>> {
        if !self.intersects_range(doc, other)? {
            return Ok(None);
        }
        let mut common = self.clone();
        if compare_boundary_points(doc, self.start, other.start)? == Ordering::Less {
            common.set_start(doc, other.start.node, other.start.offset)?;
        }
        if compare_boundary_points(doc, self.end, other.end)? == Ordering::Greater {
            common.set_end(doc, other.end.node, other.end.offset)?;
        }
        Ok(Some(common))
    }

    /// The smallest range covering both. Fails when they neither intersect
    /// nor touch.
    pub fn union(&self, doc: &Document, other: &Range) -> DomResult<Range> {
        if !self.intersects_or_touches_range(doc, other)? {
            return Err(DomError::invalid_state("ranges do not intersect"));
        }
        let mut covering = self.clone();
        if compare_boundary_points(doc, other.start, self.start)? == Ordering::Less {
            covering.set_start(doc, other.start.node, other.start.offset)?;
        }
        if compare_boundary_points(doc, other.end, self.end)? == Ordering::Greater {
            covering.set_end(doc, other.end.node, other.end.offset)?;
        }
        Ok(covering)
    }
}
