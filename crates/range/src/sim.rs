//! In-process host used by tests.
//!
//! [`SimHost`] implements the host traits over the arena document and can be
//! told to misbehave the way real hosts do, so the feature probe and the
//! adapters can be exercised against every combination.
use crate::host::{Host, NativeRange, NativeSelection, TextRange};
use crate::legacy::{chars_for_units, unit_len};
use crate::range::{How, Range};
use core_types::ContextId;
use dom::dom_utils::{compare_boundary_points, get_common_ancestor, is_character_data, node_length};
use dom::traverse::{descendants, text_nodes};
use dom::{BoundaryPoint, Document, DomError, DomResult, NodeId, NodeKind};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Deviations from the DOM a [`SimHost`] reproduces.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Quirks {
    pub structural_range: bool,
    pub legacy_text_range: bool,
    pub multi_range: bool,
    pub extend: bool,
    /// `StartToEnd` and `EndToStart` mean each other.
    pub swapped_compare_constants: bool,
    /// Native delete and extract take one character too many at the end.
    pub off_by_one_delete: bool,
    /// Setting the start past the end fails instead of collapsing.
    pub throws_start_past_end: bool,
    /// Text range `text()` drops a trailing line break.
    pub trim_trailing_crlf: bool,
    pub control_selection: bool,
}

impl Default for Quirks {
    fn default() -> Self {
        Self {
            structural_range: true,
            legacy_text_range: false,
            multi_range: true,
            extend: true,
            swapped_compare_constants: false,
            off_by_one_delete: false,
            throws_start_past_end: false,
            trim_trailing_crlf: false,
            control_selection: false,
        }
    }
}

impl Quirks {
    /// A host with only legacy text ranges and control selections.
    pub fn legacy() -> Self {
        Self {
            structural_range: false,
            legacy_text_range: true,
            multi_range: false,
            extend: false,
            trim_trailing_crlf: true,
            control_selection: true,
            ..Self::default()
        }
    }

    /// Neither range primitive.
    pub fn bare() -> Self {
        Self {
            structural_range: false,
            legacy_text_range: false,
            ..Self::default()
        }
    }
}

#[derive(Debug)]
pub struct SimHost {
    pub quirks: Quirks,
    selections: HashMap<ContextId, SimSelection>,
}

impl SimHost {
    /// A host with the main context open.
    pub fn new(quirks: Quirks) -> Self {
        let mut host = Self {
            quirks,
            selections: HashMap::new(),
        };
        host.open_context(ContextId::MAIN);
        host
    }

    pub fn open_context(&mut self, context: ContextId) {
        let quirks = self.quirks;
        self.selections
            .entry(context)
            .or_insert_with(|| SimSelection::new(quirks));
    }

    pub fn close_context(&mut self, context: ContextId) {
        self.selections.remove(&context);
    }
}

impl Host for SimHost {
    fn create_native_range(&self, doc: &Document) -> Option<Box<dyn NativeRange>> {
        self.quirks.structural_range.then(|| {
            Box::new(SimRange {
                range: Range::new(doc),
                quirks: self.quirks,
            }) as Box<dyn NativeRange>
        })
    }

    fn create_text_range(&self, _doc: &Document) -> Option<Box<dyn TextRange>> {
        self.quirks.legacy_text_range.then(|| {
            Box::new(SimTextRange {
                start: 0,
                end: 0,
                trim_trailing_crlf: self.quirks.trim_trailing_crlf,
            }) as Box<dyn TextRange>
        })
    }

    fn selection(&mut self, context: ContextId) -> Option<&mut dyn NativeSelection> {
        self.selections
            .get_mut(&context)
            .map(|s| s as &mut dyn NativeSelection)
    }
}

#[derive(Debug)]
pub struct SimRange {
    range: Range,
    quirks: Quirks,
}

impl SimRange {
    /// Widens the end by one character when the off-by-one quirk is on.
    fn overreach(&mut self, doc: &Document) -> DomResult<()> {
        let end = self.range.end();
        if self.quirks.off_by_one_delete
            && is_character_data(doc, end.node)
            && end.offset < node_length(doc, end.node)
        {
            self.range.set_end(doc, end.node, end.offset + 1)?;
        }
        Ok(())
    }
}

impl NativeRange for SimRange {
    fn start(&self) -> BoundaryPoint {
        self.range.start()
    }

    fn end(&self) -> BoundaryPoint {
        self.range.end()
    }

    fn set_start(&mut self, doc: &Document, point: BoundaryPoint) -> DomResult<()> {
        if self.quirks.throws_start_past_end
            && compare_boundary_points(doc, point, self.range.end())? == Ordering::Greater
        {
            return Err(DomError::IndexSize);
        }
        self.range.set_start(doc, point.node, point.offset)
    }

    fn set_end(&mut self, doc: &Document, point: BoundaryPoint) -> DomResult<()> {
        self.range.set_end(doc, point.node, point.offset)
    }

    fn compare_boundary_points(
        &self,
        doc: &Document,
        how_raw: u16,
        other_start: BoundaryPoint,
        other_end: BoundaryPoint,
    ) -> DomResult<Ordering> {
        let mut how = How::from_raw(how_raw)
            .ok_or_else(|| DomError::invalid_state(format!("unknown comparison {how_raw}")))?;
        if self.quirks.swapped_compare_constants {
            how = how.swapped();
        }
        let other = Range::from_points(doc, other_start, other_end)?;
        self.range.compare_boundary_points(doc, how, &other)
    }

    fn delete_contents(&mut self, doc: &mut Document) -> DomResult<()> {
        self.overreach(doc)?;
        self.range.delete_contents(doc)
    }

    fn extract_contents(&mut self, doc: &mut Document) -> DomResult<NodeId> {
        self.overreach(doc)?;
        self.range.extract_contents(doc)
    }
}

#[derive(Debug)]
pub struct SimSelection {
    quirks: Quirks,
    ranges: Vec<(BoundaryPoint, BoundaryPoint)>,
    backward: bool,
    control: Option<Vec<NodeId>>,
    text: Option<(usize, usize)>,
}

impl SimSelection {
    fn new(quirks: Quirks) -> Self {
        Self {
            quirks,
            ranges: Vec::new(),
            backward: false,
            control: None,
            text: None,
        }
    }
}

impl NativeSelection for SimSelection {
    fn range_count(&self) -> usize {
        if let Some(control) = &self.control {
            return control.len();
        }
        if self.text.is_some() {
            return 1;
        }
        self.ranges.len()
    }

    fn range_at(&self, index: usize) -> Option<(BoundaryPoint, BoundaryPoint)> {
        self.ranges.get(index).copied()
    }

    fn anchor(&self) -> Option<BoundaryPoint> {
        let (start, end) = *self.ranges.last()?;
        Some(if self.backward { end } else { start })
    }

    fn focus(&self) -> Option<BoundaryPoint> {
        let (start, end) = *self.ranges.last()?;
        Some(if self.backward { start } else { end })
    }

    fn add_range(&mut self, start: BoundaryPoint, end: BoundaryPoint) {
        self.control = None;
        self.text = None;
        if !self.quirks.multi_range && !self.ranges.is_empty() {
            log::trace!(target: "range.sim", "ignoring additional range");
            return;
        }
        self.backward = false;
        self.ranges.push((start, end));
    }

    fn remove_all_ranges(&mut self) {
        self.ranges.clear();
        self.control = None;
        self.text = None;
        self.backward = false;
    }

    fn has_extend(&self) -> bool {
        self.quirks.extend
    }

    fn extend(&mut self, doc: &Document, focus: BoundaryPoint) -> DomResult<()> {
        if !self.quirks.extend {
            return Err(DomError::invalid_state("extend is not supported"));
        }
        let anchor = self
            .anchor()
            .ok_or_else(|| DomError::invalid_state("selection has no ranges"))?;
        let backward = compare_boundary_points(doc, focus, anchor)? == Ordering::Less;
        let range = if backward {
            (focus, anchor)
        } else {
            (anchor, focus)
        };
        self.ranges.clear();
        self.ranges.push(range);
        self.backward = backward;
        Ok(())
    }

    fn control_elements(&self) -> Option<Vec<NodeId>> {
        self.control.clone()
    }

    fn set_control_elements(&mut self, elements: &[NodeId]) -> bool {
        if !self.quirks.control_selection {
            return false;
        }
        self.ranges.clear();
        self.text = None;
        self.control = Some(elements.to_vec());
        true
    }

    fn text_range(&self) -> Option<Box<dyn TextRange>> {
        let (start, end) = self.text?;
        Some(Box::new(SimTextRange {
            start,
            end,
            trim_trailing_crlf: self.quirks.trim_trailing_crlf,
        }))
    }

    fn select_text_range(&mut self, range: &dyn TextRange) {
        self.ranges.clear();
        self.control = None;
        self.text = Some((range.position(true), range.position(false)));
    }
}

/// Text node runs in document order with their unit offsets.
struct Runs {
    runs: Vec<(NodeId, usize, usize)>,
}

impl Runs {
    fn of(doc: &Document) -> Self {
        let mut at = 0;
        let runs = text_nodes(doc, doc.root())
            .map(|node| {
                let units = doc.data(node).map_or(0, unit_len);
                let run = (node, at, at + units);
                at += units;
                run
            })
            .collect();
        Self { runs }
    }

    fn total(&self) -> usize {
        self.runs.last().map_or(0, |r| r.2)
    }

    /// Text node holding `position`; at a run edge `later` picks the
    /// following run.
    fn locate(&self, position: usize, later: bool) -> Option<NodeId> {
        let hit = |&&(_, from, to): &&(NodeId, usize, usize)| {
            if later {
                from <= position && position < to
            } else {
                from < position && position <= to
            }
        };
        self.runs
            .iter()
            .find(hit)
            .or_else(|| self.runs.iter().find(|r| r.1 <= position && position <= r.2))
            .map(|r| r.0)
    }
}

#[derive(Clone, Debug)]
pub struct SimTextRange {
    start: usize,
    end: usize,
    trim_trailing_crlf: bool,
}

impl TextRange for SimTextRange {
    fn duplicate(&self) -> Box<dyn TextRange> {
        Box::new(self.clone())
    }

    fn position(&self, start: bool) -> usize {
        if start { self.start } else { self.end }
    }

    fn set_position(&mut self, start: bool, position: usize) {
        if start {
            self.start = position;
        } else {
            self.end = position;
        }
    }

    fn move_to_element_text(&mut self, doc: &Document, element: NodeId) -> DomResult<()> {
        if !matches!(doc.kind(element), NodeKind::Element { .. } | NodeKind::Document) {
            return Err(DomError::InvalidNodeType);
        }
        let mut at = 0;
        let mut start = None;
        let mut inside = 0;
        let in_element = |node: NodeId| doc.ancestors(node).any(|a| a == element);
        if element == doc.root() {
            start = Some(0);
        }
        for node in descendants(doc, doc.root()) {
            if node == element {
                start = Some(at);
            }
            if let NodeKind::Text(data) = doc.kind(node) {
                let units = unit_len(data);
                if in_element(node) {
                    inside += units;
                }
                at += units;
            }
        }
        let start = start.ok_or(DomError::NotFound)?;
        self.start = start;
        self.end = start + inside;
        Ok(())
    }

    fn move_start(&mut self, doc: &Document, units: isize) -> isize {
        let total = Runs::of(doc).total();
        let target = self.start.saturating_add_signed(units).min(total);
        let moved = target as isize - self.start as isize;
        self.start = target;
        if self.start > self.end {
            self.end = self.start;
        }
        moved
    }

    fn move_end(&mut self, doc: &Document, units: isize) -> isize {
        let total = Runs::of(doc).total();
        let target = self.end.saturating_add_signed(units).min(total);
        let moved = target as isize - self.end as isize;
        self.end = target;
        if self.end < self.start {
            self.start = self.end;
        }
        moved
    }

    fn text(&self, doc: &Document) -> String {
        let mut out = String::new();
        for (node, from, to) in Runs::of(doc).runs {
            if to <= self.start || from >= self.end {
                continue;
            }
            let data = doc.data(node).unwrap_or_default();
            let skip = chars_for_units(data, self.start.saturating_sub(from));
            let take = chars_for_units(data, self.end.min(to) - from);
            out.extend(data.chars().skip(skip).take(take - skip));
        }
        if self.trim_trailing_crlf {
            let trimmed = out.trim_end_matches(['\r', '\n']).len();
            out.truncate(trimmed);
        }
        out
    }

    fn parent_element(&self, doc: &Document) -> Option<NodeId> {
        let runs = Runs::of(doc);
        let start = runs.locate(self.start, true);
        let end = if self.is_collapsed() {
            start
        } else {
            runs.locate(self.end, false)
        };
        let common = match (start, end) {
            (Some(a), Some(b)) => get_common_ancestor(doc, a, b)?,
            _ => return Some(doc.root()),
        };
        std::iter::once(common)
            .chain(doc.ancestors(common))
            .find(|n| matches!(doc.kind(*n), NodeKind::Element { .. } | NodeKind::Document))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_range_units_count_crlf_once() {
        let doc = Document::parse_html("<p>ab\r\ncd</p><p>ef</p>").unwrap();
        let p1 = doc.first_child(doc.root()).unwrap();
        let mut tr = SimTextRange {
            start: 0,
            end: 0,
            trim_trailing_crlf: false,
        };
        tr.move_to_element_text(&doc, p1).unwrap();
        assert_eq!((tr.start, tr.end), (0, 5));
        assert_eq!(tr.text(&doc), "ab\r\ncd");

        tr.move_start(&doc, 2);
        tr.move_end(&doc, -2);
        assert_eq!(tr.text(&doc), "\r\n");
        tr.trim_trailing_crlf = true;
        assert_eq!(tr.text(&doc), "");
        assert_eq!(tr.parent_element(&doc), Some(p1));
    }

    #[test]
    fn single_range_host_ignores_additional_ranges() {
        let doc = Document::parse_html("<p>abc</p>").unwrap();
        let t = doc.first_child(doc.first_child(doc.root()).unwrap()).unwrap();
        let mut host = SimHost::new(Quirks {
            multi_range: false,
            ..Quirks::default()
        });
        let selection = host.selection(ContextId::MAIN).unwrap();
        selection.add_range(BoundaryPoint::new(t, 0), BoundaryPoint::new(t, 1));
        selection.add_range(BoundaryPoint::new(t, 2), BoundaryPoint::new(t, 3));
        assert_eq!(selection.range_count(), 1);
        assert!(host.selection(ContextId(7)).is_none());
    }

    #[test]
    fn extend_backwards_swaps_anchor_and_focus() {
        let doc = Document::parse_html("<p>abcdef</p>").unwrap();
        let t = doc.first_child(doc.first_child(doc.root()).unwrap()).unwrap();
        let mut host = SimHost::new(Quirks::default());
        let selection = host.selection(ContextId::MAIN).unwrap();
        selection.add_range(BoundaryPoint::new(t, 3), BoundaryPoint::new(t, 3));
        selection.extend(&doc, BoundaryPoint::new(t, 1)).unwrap();
        assert_eq!(selection.anchor(), Some(BoundaryPoint::new(t, 3)));
        assert_eq!(selection.focus(), Some(BoundaryPoint::new(t, 1)));
        assert_eq!(
            selection.range_at(0),
            Some((BoundaryPoint::new(t, 1), BoundaryPoint::new(t, 3)))
        );
    }
}
