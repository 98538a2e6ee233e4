//! Interfaces a host environment implements to expose its native range,
//! selection and legacy text range primitives.
//!
//! Hosts differ in which primitives exist and in how faithfully they follow
//! the DOM; [`Features::probe`](crate::Features::probe) measures that once and
//! the adapters in this crate work around what it finds.
use core_types::ContextId;
use dom::{BoundaryPoint, Document, DomResult, NodeId};
use std::cmp::Ordering;
use std::fmt;

/// A host's structural range.
pub trait NativeRange: fmt::Debug {
    fn start(&self) -> BoundaryPoint;

    fn end(&self) -> BoundaryPoint;

    fn set_start(&mut self, doc: &Document, point: BoundaryPoint) -> DomResult<()>;

    fn set_end(&mut self, doc: &Document, point: BoundaryPoint) -> DomResult<()>;

    /// Compares against another pair of boundaries using the host's own
    /// numbering of the comparison selector, which may not match
    /// [`How::raw`](crate::How::raw).
    fn compare_boundary_points(
        &self,
        doc: &Document,
        how_raw: u16,
        other_start: BoundaryPoint,
        other_end: BoundaryPoint,
    ) -> DomResult<Ordering>;

    fn delete_contents(&mut self, doc: &mut Document) -> DomResult<()>;

    fn extract_contents(&mut self, doc: &mut Document) -> DomResult<NodeId>;
}

/// End point pair for [`TextRange::compare_end_points`] and
/// [`TextRange::set_end_point`]. The first word names this range's end.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EndPoints {
    StartToStart,
    StartToEnd,
    EndToStart,
    EndToEnd,
}

impl EndPoints {
    fn sides(self) -> (bool, bool) {
        match self {
            EndPoints::StartToStart => (true, true),
            EndPoints::StartToEnd => (true, false),
            EndPoints::EndToStart => (false, true),
            EndPoints::EndToEnd => (false, false),
        }
    }
}

/// The legacy opaque text range.
///
/// Positions are opaque unit counts along the host's flattened text. A
/// carriage return and line feed pair counts as one unit, which is why
/// [`text`](Self::text) may disagree with the unit count.
pub trait TextRange: fmt::Debug {
    fn duplicate(&self) -> Box<dyn TextRange>;

    /// Unit position of the start (`true`) or end (`false`).
    fn position(&self, start: bool) -> usize;

    fn set_position(&mut self, start: bool, position: usize);

    /// Spans the text of `element`. Fails for nodes that cannot hold text.
    fn move_to_element_text(&mut self, doc: &Document, element: NodeId) -> DomResult<()>;

    /// Moves the start by `units`, returning how far it actually moved.
    fn move_start(&mut self, doc: &Document, units: isize) -> isize;

    fn move_end(&mut self, doc: &Document, units: isize) -> isize;

    fn text(&self, doc: &Document) -> String;

    /// Deepest element containing the whole range.
    fn parent_element(&self, doc: &Document) -> Option<NodeId>;

    fn collapse(&mut self, to_start: bool) {
        let point = self.position(to_start);
        self.set_position(!to_start, point);
    }

    fn is_collapsed(&self) -> bool {
        self.position(true) == self.position(false)
    }

    fn compare_end_points(&self, how: EndPoints, other: &dyn TextRange) -> Ordering {
        let (mine, theirs) = how.sides();
        self.position(mine).cmp(&other.position(theirs))
    }

    /// Moves one end of this range onto one end of `other`.
    fn set_end_point(&mut self, how: EndPoints, other: &dyn TextRange) {
        let (mine, theirs) = how.sides();
        let point = other.position(theirs);
        self.set_position(mine, point);
        if self.position(true) > self.position(false) {
            self.set_position(!mine, point);
        }
    }
}

/// A host's live selection in one context.
pub trait NativeSelection: fmt::Debug {
    fn range_count(&self) -> usize;

    fn range_at(&self, index: usize) -> Option<(BoundaryPoint, BoundaryPoint)>;

    fn anchor(&self) -> Option<BoundaryPoint>;

    fn focus(&self) -> Option<BoundaryPoint>;

    fn add_range(&mut self, start: BoundaryPoint, end: BoundaryPoint);

    fn remove_all_ranges(&mut self);

    fn has_extend(&self) -> bool;

    /// Moves the focus, keeping the anchor.
    fn extend(&mut self, doc: &Document, focus: BoundaryPoint) -> DomResult<()>;

    /// Selected elements when the selection is a control selection.
    fn control_elements(&self) -> Option<Vec<NodeId>> {
        None
    }

    /// Replaces the selection with a control selection. Returns `false` when
    /// the host has no control selections.
    fn set_control_elements(&mut self, _elements: &[NodeId]) -> bool {
        false
    }

    /// The selection as a legacy text range, on hosts that only have those.
    fn text_range(&self) -> Option<Box<dyn TextRange>> {
        None
    }

    fn select_text_range(&mut self, _range: &dyn TextRange) {}
}

/// Entry point into a host environment.
pub trait Host {
    fn create_native_range(&self, doc: &Document) -> Option<Box<dyn NativeRange>>;

    fn create_text_range(&self, doc: &Document) -> Option<Box<dyn TextRange>>;

    fn selection(&mut self, context: ContextId) -> Option<&mut dyn NativeSelection>;
}
