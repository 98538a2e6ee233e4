//! Cursor over the top-level nodes a range touches.
//!
//! The iterator never borrows the document between calls, so callers may
//! mutate the tree while walking it: the successor of a node is read when the
//! node itself is returned.
use crate::range::Range;
use dom::dom_utils::{
    get_closest_ancestor_in, get_common_ancestor, is_character_data, is_or_is_ancestor_of,
    node_length,
};
use dom::{BoundaryPoint, Document, DomError, DomResult, NodeId};

#[derive(Debug)]
pub(crate) struct RangeIterator {
    start: BoundaryPoint,
    end: BoundaryPoint,
    first: Option<NodeId>,
    last: Option<NodeId>,
    next: Option<NodeId>,
    current: Option<NodeId>,
    depth: usize,
    max_depth: usize,
}

impl RangeIterator {
    pub(crate) fn new(doc: &Document, range: &Range) -> Self {
        Self::over(
            doc,
            range.start(),
            range.end(),
            range.common_ancestor(),
            0,
            range.max_depth,
        )
    }

    fn over(
        doc: &Document,
        start: BoundaryPoint,
        end: BoundaryPoint,
        root: NodeId,
        depth: usize,
        max_depth: usize,
    ) -> Self {
        let mut it = Self {
            start,
            end,
            first: None,
            last: None,
            next: None,
            current: None,
            depth,
            max_depth,
        };
        if start == end {
            return it;
        }
        if start.node == end.node && is_character_data(doc, start.node) {
            it.first = Some(start.node);
            it.last = Some(start.node);
        } else {
            it.first = if start.node == root && !is_character_data(doc, start.node) {
                doc.child_at(start.node, start.offset)
            } else {
                get_closest_ancestor_in(doc, start.node, root, true)
            };
            it.last = if end.node == root && !is_character_data(doc, end.node) {
                end.offset
                    .checked_sub(1)
                    .and_then(|i| doc.child_at(end.node, i))
            } else {
                get_closest_ancestor_in(doc, end.node, root, true)
            };
        }
        it.next = it.first;
        it
    }

    pub(crate) fn first(&self) -> Option<NodeId> {
        self.first
    }

    pub(crate) fn last(&self) -> Option<NodeId> {
        self.last
    }

    pub(crate) fn reset(&mut self) {
        self.current = None;
        self.next = self.first;
    }

    pub(crate) fn next(&mut self, doc: &Document) -> Option<NodeId> {
        self.current = self.next;
        let current = self.current?;
        self.next = if Some(current) != self.last {
            doc.next_sibling(current)
        } else {
            None
        };
        Some(current)
    }

    /// Selected character span of the current node when it is a character
    /// data node holding one of the boundaries.
    pub(crate) fn partial_span(&self, doc: &Document) -> Option<(usize, usize)> {
        let current = self.current?;
        if !is_character_data(doc, current)
            || (current != self.start.node && current != self.end.node)
        {
            return None;
        }
        let from = if current == self.start.node {
            self.start.offset
        } else {
            0
        };
        let to = if current == self.end.node {
            self.end.offset
        } else {
            node_length(doc, current)
        };
        Some((from, to.max(from)))
    }

    /// Whether the current node is a container one of the boundaries lies in.
    pub(crate) fn is_partially_selected_subtree(&self, doc: &Document) -> bool {
        self.current
            .is_some_and(|node| is_non_text_partially_selected(doc, node, self.start, self.end))
    }

    /// Iterator over the current node's share of the range.
    pub(crate) fn sub_iterator(&self, doc: &Document) -> DomResult<RangeIterator> {
        let current = self
            .current
            .ok_or_else(|| DomError::invalid_state("range iterator has no current node"))?;
        if self.depth + 1 > self.max_depth {
            return Err(DomError::invalid_state(format!(
                "range subtree is deeper than {} levels",
                self.max_depth
            )));
        }
        let start = if is_or_is_ancestor_of(doc, current, self.start.node) {
            self.start
        } else {
            BoundaryPoint::new(current, 0)
        };
        let end = if is_or_is_ancestor_of(doc, current, self.end.node) {
            self.end
        } else {
            BoundaryPoint::new(current, node_length(doc, current))
        };
        let root = get_common_ancestor(doc, start.node, end.node).unwrap_or(current);
        Ok(Self::over(doc, start, end, root, self.depth + 1, self.max_depth))
    }

    /// Removes the current node, or just its selected characters.
    pub(crate) fn remove(&mut self, doc: &mut Document) -> DomResult<()> {
        let Some(current) = self.current else {
            return Ok(());
        };
        match self.partial_span(doc) {
            Some((from, to)) if from != to => doc.delete_data(current, from, to - from),
            Some(_) => Ok(()),
            None => {
                doc.detach(current);
                Ok(())
            }
        }
    }
}

pub(crate) fn is_non_text_partially_selected(
    doc: &Document,
    node: NodeId,
    start: BoundaryPoint,
    end: BoundaryPoint,
) -> bool {
    !is_character_data(doc, node)
        && (is_or_is_ancestor_of(doc, node, start.node)
            || is_or_is_ancestor_of(doc, node, end.node))
}
